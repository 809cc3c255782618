#![deny(
    missing_docs,
    unsafe_code,
    clippy::std_instead_of_core,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Assertions that end the process instead of panicking.
//!
//! ## Overview
//!
//! A failed `assert!` in Rust panics. A panic can be caught with
//! [`catch_unwind`](std::panic::catch_unwind), swallowed by a thread boundary,
//! or redirected by a panic hook. For conditions that must never happen that
//! is the wrong tool: the program has already left the states it was written
//! for, and the safest thing left to do is stop.
//!
//! The checks in this crate print what failed together with a stack trace that
//! shows the *line of source code* of every frame, then exit the process with
//! status `1`. Nothing can intercept that, and no destructors run.
//!
//! ## Quick Example
//!
//! ```no_run
//! fn withdraw(balance: u64, amount: u64) -> u64 {
//!     hardstop::assert(amount <= balance);
//!     balance - amount
//! }
//!
//! withdraw(10, 20);
//! ```
//!
//! prints
//!
//! ```text
//! src/main.rs:2
//!     hardstop::assert(amount <= balance);
//!
//! src/main.rs:6
//!     withdraw(10, 20);
//!
//! ```
//!
//! and the process exits with status `1`.
//!
//! ## Checks
//!
//! | Check | Fails when |
//! |---|---|
//! | [`assert`] | the condition is false |
//! | [`assert_nil`] | the value is `Some(_)` or `Err(_)`; the value is printed |
//! | [`assert_err_is`] | the error is in none of the given [categories](classify) |
//! | [`assert_err_is_not`] | the error is in one of the given categories |
//! | [`maybe`] | never; documents a condition that goes both ways |
//!
//! The `x_` variants ([`x_assert`], [`x_assert_nil`], [`x_assert_err_is`],
//! [`x_assert_err_is_not`]) take a closure instead of a value, so expensive
//! validation is skipped entirely when checks are compiled out.
//!
//! [`unreachable`], [`unimplemented`] and [`panic_always`] always terminate.
//!
//! ## Compiling checks out
//!
//! With the `remove-asserts` feature every check becomes an empty inline
//! function and the closures of the `x_` variants are never called. The
//! macros ([`hard_assert!`] and friends) go further and do not evaluate their
//! arguments at all. [`ENABLED`] tells which variant was compiled in.
//!
//! ```toml
//! [features]
//! production = ["hardstop/remove-asserts"]
//! ```
//!
//! ## Ecosystem
//!
//! The stack trace machinery lives in [`hardstop-backtrace`], which can be
//! used on its own to print source-annotated traces or to terminate with a
//! custom message.
//!
//! [`hardstop-backtrace`]: hardstop_backtrace

#[macro_use]
mod macros;

pub mod classify;
mod fatal;
mod nullable;

#[cfg(not(feature = "remove-asserts"))]
#[path = "active.rs"]
mod checks;
#[cfg(feature = "remove-asserts")]
#[path = "stripped.rs"]
mod checks;

pub use hardstop_backtrace::terminate;

pub use self::{
    checks::{
        assert, assert_err_is, assert_err_is_not, assert_nil, maybe, x_assert, x_assert_err_is,
        x_assert_err_is_not, x_assert_nil,
    },
    classify::ErrorCategory,
    fatal::{panic_always, unimplemented, unreachable},
    nullable::Nullable,
};

/// Whether checks are compiled in.
///
/// `false` when the `remove-asserts` feature is enabled.
pub const ENABLED: bool = cfg!(not(feature = "remove-asserts"));

#[cfg(test)]
mod tests {
    #[test]
    fn test_enabled_matches_feature() {
        assert_eq!(super::ENABLED, !cfg!(feature = "remove-asserts"));
    }

    #[test]
    #[cfg(not(feature = "remove-asserts"))]
    fn test_macros_pass() {
        use std::io;

        use crate::classify::{kind, of};

        let error = io::Error::new(io::ErrorKind::TimedOut, "upstream");
        hard_assert!(1 < 2);
        hard_assert_nil!(None::<u8>);
        hard_assert_nil!(Ok::<(), &str>(()));
        hard_assert_err_is!(error, kind(io::ErrorKind::TimedOut));
        hard_assert_err_is!(error, of::<core::fmt::Error>(), of::<io::Error>(),);
        hard_assert_err_is_not!(error, kind(io::ErrorKind::NotFound));
    }
}
