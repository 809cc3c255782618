//! Checks compiled out by the `remove-asserts` feature.
//!
//! Same signatures as the active checks, with empty bodies. Producers passed
//! to the `x_` variants are dropped without being called.

use crate::{
    Nullable,
    classify::{AsError, ErrorCategory},
};

/// Does nothing: checks are disabled by the `remove-asserts` feature.
#[inline(always)]
pub fn assert(_cond: bool) {}

/// Does nothing: checks are disabled by the `remove-asserts` feature.
#[inline(always)]
pub fn assert_nil<N: Nullable>(_value: N) {}

/// Does nothing: checks are disabled by the `remove-asserts` feature.
#[inline(always)]
pub fn assert_err_is<E>(_actual: &E, _targets: &[&dyn ErrorCategory])
where
    E: AsError + ?Sized,
{
}

/// Does nothing: checks are disabled by the `remove-asserts` feature.
#[inline(always)]
pub fn assert_err_is_not<E>(_actual: &E, _targets: &[&dyn ErrorCategory])
where
    E: AsError + ?Sized,
{
}

/// Does nothing, as in every build.
#[inline(always)]
pub fn maybe(_cond: bool) {}

/// Does nothing: `check` is never called.
#[inline(always)]
pub fn x_assert<F>(_check: F)
where
    F: FnOnce() -> bool,
{
}

/// Does nothing: `produce` is never called.
#[inline(always)]
pub fn x_assert_nil<N, F>(_produce: F)
where
    N: Nullable,
    F: FnOnce() -> N,
{
}

/// Does nothing: `produce` is never called.
#[inline(always)]
pub fn x_assert_err_is<E, F>(_produce: F, _targets: &[&dyn ErrorCategory])
where
    E: AsError,
    F: FnOnce() -> E,
{
}

/// Does nothing: `produce` is never called.
#[inline(always)]
pub fn x_assert_err_is_not<E, F>(_produce: F, _targets: &[&dyn ErrorCategory])
where
    E: AsError,
    F: FnOnce() -> E,
{
}
