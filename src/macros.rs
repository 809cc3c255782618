/// Terminates the process if the condition is false.
///
/// Unlike [`assert`](crate::assert), the condition is not evaluated at all
/// when the `remove-asserts` feature is enabled. It is still type-checked.
///
/// # Examples
///
/// ```
/// use hardstop::hard_assert;
///
/// fn checksum(bytes: &[u8]) -> u8 {
///     bytes.iter().fold(0, |acc, b| acc.wrapping_add(*b))
/// }
///
/// let payload = [1u8, 2, 3];
/// hard_assert!(checksum(&payload) == 6);
/// ```
#[macro_export]
macro_rules! hard_assert {
    ($cond:expr $(,)?) => {
        if $crate::ENABLED {
            $crate::assert($cond)
        }
    };
}

/// Terminates the process if the value is not nil, printing it first.
///
/// The value is not evaluated when the `remove-asserts` feature is enabled.
///
/// # Examples
///
/// ```
/// use hardstop::hard_assert_nil;
///
/// let leftover: Option<&str> = None;
/// hard_assert_nil!(leftover);
/// ```
#[macro_export]
macro_rules! hard_assert_nil {
    ($value:expr $(,)?) => {
        if $crate::ENABLED {
            $crate::assert_nil($value)
        }
    };
}

/// Terminates the process unless the error is in at least one of the listed
/// categories.
///
/// The error is borrowed. Neither the error nor the categories are evaluated
/// when the `remove-asserts` feature is enabled.
///
/// # Examples
///
/// ```
/// use std::io;
///
/// use hardstop::{classify::kind, hard_assert_err_is};
///
/// let error = io::Error::new(io::ErrorKind::TimedOut, "upstream");
/// hard_assert_err_is!(error, kind(io::ErrorKind::TimedOut), kind(io::ErrorKind::Interrupted));
/// ```
#[macro_export]
macro_rules! hard_assert_err_is {
    ($actual:expr, $($target:expr),+ $(,)?) => {
        if $crate::ENABLED {
            $crate::assert_err_is(
                &$actual,
                &[$(&$target as &dyn $crate::classify::ErrorCategory),+],
            )
        }
    };
}

/// Terminates the process if the error is in any of the listed categories.
///
/// The error is borrowed. Neither the error nor the categories are evaluated
/// when the `remove-asserts` feature is enabled.
#[macro_export]
macro_rules! hard_assert_err_is_not {
    ($actual:expr, $($target:expr),+ $(,)?) => {
        if $crate::ENABLED {
            $crate::assert_err_is_not(
                &$actual,
                &[$(&$target as &dyn $crate::classify::ErrorCategory),+],
            )
        }
    };
}

/// Terminates with `reached unreachable code`, in every build.
#[macro_export]
macro_rules! hard_unreachable {
    () => {
        $crate::unreachable()
    };
}

/// Terminates with `reached unimplemented code`, in every build.
#[macro_export]
macro_rules! hard_unimplemented {
    () => {
        $crate::unimplemented()
    };
}
