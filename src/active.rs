//! Checks compiled in: every failure ends the process.

use hardstop_backtrace::terminate;

use crate::{
    Nullable,
    classify::{self, AsError, DisplayChain, ErrorCategory},
};

/// Terminates the process if `cond` is false.
///
/// Prefer [`assert_nil`] over `assert(x.is_none())`: it prints the value that
/// was present.
///
/// # Examples
///
/// ```
/// let queue = vec![1, 2, 3];
/// hardstop::assert(queue.len() <= 16);
/// ```
#[inline]
#[track_caller]
pub fn assert(cond: bool) {
    if !cond {
        terminate(0, None)
    }
}

/// Terminates the process if `value` is not nil, printing the value first.
///
/// See [`Nullable`] for what counts as nil.
///
/// # Examples
///
/// ```
/// let pending: Option<u32> = None;
/// hardstop::assert_nil(pending);
///
/// let flushed: Result<(), std::io::Error> = Ok(());
/// hardstop::assert_nil(flushed);
/// ```
#[inline]
#[track_caller]
pub fn assert_nil<N: Nullable>(value: N) {
    if let Some(present) = value.non_null() {
        terminate(0, Some(&format_args!("{present:?}")))
    }
}

/// Terminates the process unless `actual` is in at least one of `targets`.
///
/// `targets` must not be empty. See [`classify`](crate::classify) for how
/// errors are matched against categories.
///
/// # Examples
///
/// ```
/// use std::io;
///
/// use hardstop::classify::kind;
///
/// let error = io::Error::new(io::ErrorKind::WouldBlock, "retry later");
/// hardstop::assert_err_is(
///     &error,
///     &[&kind(io::ErrorKind::WouldBlock), &kind(io::ErrorKind::Interrupted)],
/// );
/// ```
#[track_caller]
pub fn assert_err_is<E>(actual: &E, targets: &[&dyn ErrorCategory])
where
    E: AsError + ?Sized,
{
    assert(!targets.is_empty());

    let actual = actual.as_error();
    if !targets.iter().any(|target| classify::is(actual, *target)) {
        terminate(0, Some(&DisplayChain(actual)))
    }
}

/// Terminates the process if `actual` is in any of `targets`.
///
/// `targets` must not be empty.
///
/// # Examples
///
/// ```
/// use std::io;
///
/// use hardstop::classify::kind;
///
/// let error = io::Error::new(io::ErrorKind::WouldBlock, "retry later");
/// hardstop::assert_err_is_not(&error, &[&kind(io::ErrorKind::PermissionDenied)]);
/// ```
#[track_caller]
pub fn assert_err_is_not<E>(actual: &E, targets: &[&dyn ErrorCategory])
where
    E: AsError + ?Sized,
{
    assert(!targets.is_empty());

    let actual = actual.as_error();
    for target in targets {
        if classify::is(actual, *target) {
            terminate(0, Some(&DisplayChain(actual)))
        }
    }
}

/// Documents that `cond` is sometimes true and sometimes false.
///
/// Never fails. Use it to mark interesting branches for readers and
/// reviewers.
#[inline(always)]
pub fn maybe(cond: bool) {
    let _ = cond;
}

/// Calls `check` and terminates the process if it returns false.
///
/// Use this for validation that is too expensive to leave in builds with the
/// `remove-asserts` feature: there `check` is never called.
///
/// # Examples
///
/// ```
/// let sorted = vec![1, 3, 7, 9];
/// hardstop::x_assert(|| sorted.windows(2).all(|pair| pair[0] <= pair[1]));
/// ```
#[inline]
#[track_caller]
pub fn x_assert<F>(check: F)
where
    F: FnOnce() -> bool,
{
    assert(check())
}

/// Calls `produce` and terminates the process if the result is not nil.
#[inline]
#[track_caller]
pub fn x_assert_nil<N, F>(produce: F)
where
    N: Nullable,
    F: FnOnce() -> N,
{
    assert_nil(produce())
}

/// Calls `produce` and terminates the process unless the error is in at least
/// one of `targets`.
///
/// The target list is checked before `produce` runs.
#[track_caller]
pub fn x_assert_err_is<E, F>(produce: F, targets: &[&dyn ErrorCategory])
where
    E: AsError,
    F: FnOnce() -> E,
{
    assert(!targets.is_empty());
    assert_err_is(&produce(), targets)
}

/// Calls `produce` and terminates the process if the error is in any of
/// `targets`.
///
/// The target list is checked before `produce` runs.
#[track_caller]
pub fn x_assert_err_is_not<E, F>(produce: F, targets: &[&dyn ErrorCategory])
where
    E: AsError,
    F: FnOnce() -> E,
{
    assert(!targets.is_empty());
    assert_err_is_not(&produce(), targets)
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;
    use std::io;

    use super::*;
    use crate::classify::{kind, of, predicate};

    #[derive(Debug, PartialEq, derive_more::Display, derive_more::Error)]
    enum QueueError {
        #[display("queue is full")]
        Full,
        #[display("queue is closed")]
        Closed,
    }

    #[derive(Debug, derive_more::Display, derive_more::Error)]
    #[display("push failed")]
    struct PushError {
        source: QueueError,
    }

    #[test]
    fn test_passing_checks_return() {
        assert(true);
        assert(1 + 1 == 2);
        assert_nil(None::<String>);
        assert_nil(Ok::<_, io::Error>(12));
        maybe(true);
        maybe(false);
    }

    #[test]
    fn test_err_is_matching_target_returns() {
        let error = PushError {
            source: QueueError::Full,
        };
        assert_err_is(&error, &[&QueueError::Full]);
        assert_err_is(&error, &[&QueueError::Closed, &of::<PushError>()]);
        assert_err_is_not(&error, &[&QueueError::Closed]);
        assert_err_is_not(&error, &[&kind(io::ErrorKind::NotFound)]);
    }

    #[test]
    fn test_err_is_accepts_trait_objects() {
        let boxed: Box<dyn core::error::Error + Send + Sync> = Box::new(QueueError::Closed);
        assert_err_is(&*boxed, &[&QueueError::Closed]);
        assert_err_is_not(&*boxed, &[&predicate(|e| e.to_string().contains("full"))]);
    }

    #[test]
    fn test_lazy_checks_call_producer_once() {
        let calls = Cell::new(0);

        x_assert(|| {
            calls.set(calls.get() + 1);
            true
        });
        x_assert_nil(|| {
            calls.set(calls.get() + 1);
            None::<u8>
        });
        x_assert_err_is(
            || {
                calls.set(calls.get() + 1);
                QueueError::Full
            },
            &[&QueueError::Full],
        );
        x_assert_err_is_not(
            || {
                calls.set(calls.get() + 1);
                QueueError::Full
            },
            &[&QueueError::Closed],
        );

        assert_eq!(calls.get(), 4);
    }
}
