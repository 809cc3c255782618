//! Values that can be "nil" for [`assert_nil`](crate::assert_nil).

use core::fmt;

/// A value that is either absent, or present and printable.
///
/// `None` and `Ok(_)` are absent. `Some(value)` and `Err(error)` are present,
/// and the check prints them with [`Debug`](fmt::Debug) before terminating.
///
/// # Examples
///
/// ```
/// use hardstop::Nullable;
///
/// assert!(None::<u8>.non_null().is_none());
/// assert!(Ok::<u8, &str>(3).non_null().is_none());
/// assert_eq!(format!("{:?}", Err::<u8, &str>("disk full").non_null().unwrap()), "\"disk full\"");
/// ```
pub trait Nullable {
    /// The present value, or `None` when `self` is nil.
    fn non_null(&self) -> Option<&dyn fmt::Debug>;
}

impl<T: fmt::Debug> Nullable for Option<T> {
    fn non_null(&self) -> Option<&dyn fmt::Debug> {
        self.as_ref().map(|value| value as &dyn fmt::Debug)
    }
}

/// An `Ok` value is nil: only the error is reported.
impl<T, E: fmt::Debug> Nullable for Result<T, E> {
    fn non_null(&self) -> Option<&dyn fmt::Debug> {
        self.as_ref().err().map(|error| error as &dyn fmt::Debug)
    }
}

impl<N: Nullable + ?Sized> Nullable for &N {
    fn non_null(&self) -> Option<&dyn fmt::Debug> {
        (**self).non_null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static_assertions::assert_obj_safe!(Nullable);

    #[test]
    fn test_option() {
        assert!(None::<String>.non_null().is_none());
        let present = Some(vec![1, 2]);
        assert_eq!(format!("{:?}", present.non_null().unwrap()), "[1, 2]");
    }

    #[test]
    fn test_result() {
        let ok: Result<(), std::io::Error> = Ok(());
        assert!(ok.non_null().is_none());

        let err: Result<(), &str> = Err("disk full");
        assert_eq!(format!("{:?}", err.non_null().unwrap()), "\"disk full\"");
    }

    #[test]
    fn test_reference() {
        let value = Some(7u32);
        assert_eq!(format!("{:?}", (&value).non_null().unwrap()), "7");
        assert!((&None::<u32>).non_null().is_none());
    }
}
