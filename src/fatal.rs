//! Markers that terminate in every build, including with `remove-asserts`.

use core::fmt;

use hardstop_backtrace::terminate;

/// Prints `panic: <message>` and a stack trace, then exits with status `1`.
///
/// Unlike [`panic!`], this cannot be caught by
/// [`catch_unwind`](std::panic::catch_unwind) and does not run destructors.
///
/// # Examples
///
/// ```no_run
/// let free_blocks = 0;
/// if free_blocks == 0 {
///     hardstop::panic_always(format_args!("allocator exhausted after {} blocks", 4096));
/// }
/// ```
#[cold]
#[track_caller]
pub fn panic_always(message: impl fmt::Display) -> ! {
    terminate(0, Some(&format_args!("panic: {message}\n")))
}

/// Marks code that can never run. Terminates with `reached unreachable code`.
///
/// # Examples
///
/// ```no_run
/// fn parity(n: u32) -> &'static str {
///     match n % 2 {
///         0 => "even",
///         1 => "odd",
///         _ => hardstop::unreachable(),
///     }
/// }
/// ```
#[cold]
#[track_caller]
pub fn unreachable() -> ! {
    panic_always("reached unreachable code")
}

/// Marks code that is not written yet. Terminates with
/// `reached unimplemented code`.
#[cold]
#[track_caller]
pub fn unimplemented() -> ! {
    panic_always("reached unimplemented code")
}
