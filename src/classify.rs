//! Error classification for [`assert_err_is`] and [`assert_err_is_not`].
//!
//! An error *is* in a category when the error itself, or any error reachable
//! through [`Error::source`], matches the category. This mirrors how wrapped
//! errors carry their cause: a `RequestError` caused by `StoreError::NotFound`
//! is a `StoreError::NotFound` as far as these checks are concerned.
//!
//! Categories come in four flavours:
//!
//! - **Sentinel values**: any `E: Error + PartialEq` matches an equal value.
//! - **Types**: [`of::<E>()`](of) matches any error of type `E`.
//! - **I/O kinds**: [`kind(io::ErrorKind::NotFound)`](kind) matches an
//!   [`io::Error`] of that kind.
//! - **Predicates**: [`predicate(|e| ...)`](predicate) for everything else.
//!
//! ```
//! use std::io;
//!
//! use hardstop::classify::{self, kind, of};
//!
//! let error = io::Error::new(io::ErrorKind::NotFound, "config.toml");
//! assert!(classify::is(&error, &kind(io::ErrorKind::NotFound)));
//! assert!(classify::is(&error, &of::<io::Error>()));
//! assert!(!classify::is(&error, &kind(io::ErrorKind::PermissionDenied)));
//! ```
//!
//! [`assert_err_is`]: crate::assert_err_is
//! [`assert_err_is_not`]: crate::assert_err_is_not

use core::{error::Error, fmt, iter::FusedIterator, marker::PhantomData};
use std::io;

/// A class of errors that a check can expect or forbid.
pub trait ErrorCategory {
    /// Whether `error` itself belongs to this category.
    ///
    /// Only the given error is inspected. Source chains are walked by
    /// [`is`].
    fn matches(&self, error: &(dyn Error + 'static)) -> bool;
}

/// Sentinel errors: equal values match.
impl<E> ErrorCategory for E
where
    E: Error + PartialEq + 'static,
{
    fn matches(&self, error: &(dyn Error + 'static)) -> bool {
        error.downcast_ref::<E>() == Some(self)
    }
}

/// Category matching every error of type `E`. Created by [`of`].
pub struct TypeCategory<E: ?Sized> {
    _error: PhantomData<fn() -> *const E>,
}

impl<E: ?Sized> Clone for TypeCategory<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: ?Sized> Copy for TypeCategory<E> {}

impl<E: ?Sized> fmt::Debug for TypeCategory<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeCategory<{}>", core::any::type_name::<E>())
    }
}

impl<E: Error + 'static> ErrorCategory for TypeCategory<E> {
    fn matches(&self, error: &(dyn Error + 'static)) -> bool {
        error.is::<E>()
    }
}

/// Creates a category matching every error of type `E`.
///
/// # Examples
///
/// ```
/// use std::num::ParseIntError;
///
/// use hardstop::classify::{self, of};
///
/// let error = "twelve".parse::<u32>().unwrap_err();
/// assert!(classify::is(&error, &of::<ParseIntError>()));
/// ```
pub const fn of<E: Error + 'static>() -> TypeCategory<E> {
    TypeCategory {
        _error: PhantomData,
    }
}

/// Category matching [`io::Error`]s of one [`io::ErrorKind`]. Created by
/// [`kind`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Kind(pub io::ErrorKind);

impl ErrorCategory for Kind {
    fn matches(&self, error: &(dyn Error + 'static)) -> bool {
        error
            .downcast_ref::<io::Error>()
            .is_some_and(|error| error.kind() == self.0)
    }
}

/// Creates a category matching [`io::Error`]s of the given kind.
pub const fn kind(kind: io::ErrorKind) -> Kind {
    Kind(kind)
}

/// Category defined by a closure. Created by [`predicate`].
#[derive(Copy, Clone)]
pub struct Predicate<F>(F);

impl<F> fmt::Debug for Predicate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate")
    }
}

impl<F> ErrorCategory for Predicate<F>
where
    F: Fn(&(dyn Error + 'static)) -> bool,
{
    fn matches(&self, error: &(dyn Error + 'static)) -> bool {
        (self.0)(error)
    }
}

/// Creates a category from a closure that inspects one error of the chain.
///
/// # Examples
///
/// ```
/// use hardstop::classify::{self, predicate};
///
/// let error = "99999".parse::<u8>().unwrap_err();
/// let overflow = predicate(|e| e.to_string().contains("too large"));
/// assert!(classify::is(&error, &overflow));
/// ```
pub fn predicate<F>(f: F) -> Predicate<F>
where
    F: Fn(&(dyn Error + 'static)) -> bool,
{
    Predicate(f)
}

/// Whether `actual`, or any error in its source chain, belongs to `category`.
pub fn is(actual: &(dyn Error + 'static), category: &dyn ErrorCategory) -> bool {
    chain(actual).any(|error| category.matches(error))
}

/// Iterates over an error and its transitive sources, outermost first.
pub fn chain<'a>(error: &'a (dyn Error + 'static)) -> Chain<'a> {
    Chain { next: Some(error) }
}

/// Iterator returned by [`chain`].
#[derive(Clone, Debug)]
#[must_use]
pub struct Chain<'a> {
    next: Option<&'a (dyn Error + 'static)>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a (dyn Error + 'static);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.source();
        Some(current)
    }
}

impl FusedIterator for Chain<'_> {}

/// Conversion to a `'static` error trait object.
///
/// Implemented for every sized `Error + 'static` type and for the common
/// `dyn Error` object types, so checks accept both concrete errors and
/// `&*boxed_error`.
pub trait AsError {
    /// Returns `self` as an error trait object.
    fn as_error(&self) -> &(dyn Error + 'static);
}

impl<E: Error + 'static> AsError for E {
    fn as_error(&self) -> &(dyn Error + 'static) {
        self
    }
}

impl AsError for dyn Error + 'static {
    fn as_error(&self) -> &(dyn Error + 'static) {
        self
    }
}

impl AsError for dyn Error + Send + 'static {
    fn as_error(&self) -> &(dyn Error + 'static) {
        self
    }
}

impl AsError for dyn Error + Send + Sync + 'static {
    fn as_error(&self) -> &(dyn Error + 'static) {
        self
    }
}

/// Displays an error followed by one `caused by:` line per source.
#[derive(Copy, Clone)]
#[cfg_attr(feature = "remove-asserts", allow(dead_code))]
pub(crate) struct DisplayChain<'a>(pub(crate) &'a (dyn Error + 'static));

impl fmt::Display for DisplayChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut errors = chain(self.0);
        if let Some(outermost) = errors.next() {
            write!(f, "{outermost}")?;
        }
        for source in errors {
            write!(f, "\ncaused by: {source}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, thiserror::Error)]
    enum StoreError {
        #[error("key not found")]
        NotFound,
        #[error("store is read-only")]
        ReadOnly,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("request failed")]
    struct RequestError {
        #[source]
        source: StoreError,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("handler failed")]
    struct HandlerError(#[from] RequestError);

    #[derive(Debug, thiserror::Error)]
    #[error("could not load settings")]
    struct LoadError(#[source] io::Error);

    fn handler_error() -> HandlerError {
        HandlerError(RequestError {
            source: StoreError::NotFound,
        })
    }

    static_assertions::assert_impl_all!(TypeCategory<io::Error>: Copy, Send, Sync);
    static_assertions::assert_impl_all!(Kind: Copy, Send, Sync);
    static_assertions::assert_obj_safe!(ErrorCategory);

    #[test]
    fn test_sentinel_matches_through_wrapping() {
        let error = handler_error();
        assert!(is(&error, &StoreError::NotFound));
        assert!(!is(&error, &StoreError::ReadOnly));
        assert!(is(&StoreError::ReadOnly, &StoreError::ReadOnly));
    }

    #[test]
    fn test_type_category() {
        let error = handler_error();
        assert!(is(&error, &of::<HandlerError>()));
        assert!(is(&error, &of::<RequestError>()));
        assert!(is(&error, &of::<StoreError>()));
        assert!(!is(&error, &of::<io::Error>()));
    }

    #[test]
    fn test_kind_category() {
        let error = io::Error::new(io::ErrorKind::NotFound, "config.toml");
        assert!(is(&error, &kind(io::ErrorKind::NotFound)));
        assert!(!is(&error, &kind(io::ErrorKind::TimedOut)));
        assert!(!is(&handler_error(), &kind(io::ErrorKind::NotFound)));

        let wrapped = LoadError(io::Error::new(io::ErrorKind::TimedOut, "socket"));
        assert!(is(&wrapped, &kind(io::ErrorKind::TimedOut)));
        assert!(!is(&wrapped, &kind(io::ErrorKind::NotFound)));
    }

    #[test]
    fn test_predicate_category() {
        let error = handler_error();
        assert!(is(&error, &predicate(|e| e.to_string() == "key not found")));
        assert!(!is(&error, &predicate(|e| e.to_string().is_empty())));
    }

    #[test]
    fn test_chain() {
        let error = handler_error();
        let messages: Vec<_> = chain(&error).map(|e| e.to_string()).collect();
        assert_eq!(messages, ["handler failed", "request failed", "key not found"]);

        let mut single = chain(&StoreError::ReadOnly);
        assert!(single.next().is_some());
        assert!(single.next().is_none());
        assert!(single.next().is_none());
    }

    #[test]
    fn test_display_chain() {
        let error = handler_error();
        assert_eq!(
            DisplayChain(&error).to_string(),
            "handler failed\ncaused by: request failed\ncaused by: key not found"
        );
        assert_eq!(DisplayChain(&StoreError::ReadOnly).to_string(), "store is read-only");
    }

    #[test]
    fn test_as_error() {
        let boxed: Box<dyn Error + Send + Sync> = Box::new(handler_error());
        assert!(is((*boxed).as_error(), &StoreError::NotFound));
        assert!(is(handler_error().as_error(), &of::<RequestError>()));
    }
}
