#![deny(
    missing_docs,
    unsafe_code,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]

//! Source-annotated stack traces and unconditional process termination.
//!
//! This crate is the leaf of the hardstop assertion library. It walks the
//! current call stack, resolves every frame to a file and line, re-reads that
//! line from disk and prints it, then ends the process with exit status `1`.
//!
//! # Quick Start
//!
//! ```no_run
//! fn check_invariant(len: usize) {
//!     if len > 16 {
//!         hardstop_backtrace::terminate(0, Some(&"buffer overflowed"));
//!     }
//! }
//! # check_invariant(32);
//! ```
//!
//! This prints something similar to:
//! ```text
//! buffer overflowed
//! /build/src/main.rs:3
//!     hardstop_backtrace::terminate(0, Some(&"buffer overflowed"));
//!
//! /build/src/main.rs:7
//!     check_invariant(32);
//!
//! ```
//!
//! # Why not `panic!`
//!
//! A panic can be caught with [`std::panic::catch_unwind`], redirected by a
//! panic hook, or turned into destructor runs while unwinding. [`terminate`]
//! does none of that: it writes the trace to standard error and calls
//! [`std::process::exit`]. Destructors of values on the stack do not run.
//!
//! # Debugging symbols in release builds
//!
//! Frames can only be resolved when debug information is present. Enable it
//! in release builds if you want traces there too:
//!
//! ```toml
//! [profile.release]
//! strip = false
//! # "line-tables-only" is enough for file and line information
//! debug = "line-tables-only"
//! ```
//!
//! When no frame can be resolved the location of the failing call (as
//! captured by `#[track_caller]`) is printed instead, so the output always
//! names at least one `file:line`.
//!
//! # Filtering
//!
//! ```rust
//! use hardstop_backtrace::{Backtrace, TraceFilter};
//!
//! let filter = TraceFilter {
//!     max_entry_count: 10,
//!     resolve_source_lines: false,
//!     ..TraceFilter::DEFAULT
//! };
//! let backtrace = Backtrace::capture(&filter);
//! ```

use std::{
    borrow::Cow,
    fmt,
    fs::File,
    io::{self, BufRead, BufReader, Write},
    panic::Location,
    path::Path,
    sync::OnceLock,
};

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;

/// Stack backtrace information.
///
/// Contains the resolved frames of the call stack at the point where the
/// capture happened.
///
/// # Examples
///
/// ```rust
/// use hardstop_backtrace::{Backtrace, TraceFilter};
///
/// if let Some(mut backtrace) = Backtrace::capture(&TraceFilter::DEFAULT) {
///     backtrace.resolve_source_lines();
///     eprint!("{backtrace}");
/// }
/// ```
#[derive(Debug)]
pub struct Backtrace {
    /// The frames in the backtrace, ordered from most recent to oldest.
    pub frames: Vec<Frame>,
    /// Total number of frames that were omitted due to filtering.
    pub total_omitted_frames: usize,
}

/// A single resolved stack frame.
#[derive(Debug)]
pub struct Frame {
    /// The demangled symbol name for this frame, without the hash suffix.
    pub sym_demangled: String,
    /// File path information for this frame.
    pub frame_path: FramePath,
    /// Line number in the source file, if available.
    pub lineno: Option<u32>,
    /// The trimmed text of the source line, once
    /// [`Backtrace::resolve_source_lines`] has found it.
    pub source_line: Option<String>,
}

/// File path information for a stack frame.
#[derive(Debug)]
pub struct FramePath {
    /// The file path from the debug information.
    pub raw_path: String,
    /// The crate the frame belongs to, with `-` normalized to `_`.
    ///
    /// Detected from well-known path layouts (the Rust standard library
    /// sources, the cargo registry) and otherwise from the leading segment of
    /// the symbol name.
    pub crate_name: Option<Cow<'static, str>>,
}

/// Configuration for which frames end up in a [`Backtrace`].
///
/// # Examples
///
/// ```rust
/// use hardstop_backtrace::TraceFilter;
///
/// let filter = TraceFilter {
///     // Keep the frames of the assertion library itself
///     skipped_initial_crates: &["backtrace", "hardstop_backtrace"],
///     ..TraceFilter::DEFAULT
/// };
/// ```
#[derive(Copy, Clone, Debug)]
pub struct TraceFilter {
    /// Crates whose frames are hidden while they appear at the beginning of
    /// a backtrace.
    pub skipped_initial_crates: &'static [&'static str],
    /// Crates whose frames are hidden while they appear at the end of a
    /// backtrace.
    pub skipped_final_crates: &'static [&'static str],
    /// Maximum number of frames to include in the backtrace.
    pub max_entry_count: usize,
    /// Whether [`terminate_with_filter`] re-reads source files to label each
    /// frame with the line of code it was executing.
    pub resolve_source_lines: bool,
}

impl TraceFilter {
    /// Default filter settings.
    ///
    /// Hides the capture machinery and the assertion library at the start of
    /// the trace and the runtime start-up frames at its end, keeping at most
    /// 50 frames.
    pub const DEFAULT: Self = Self {
        skipped_initial_crates: &[
            "backtrace",
            "hardstop_backtrace",
            "hardstop",
            "core",
            "std",
            "alloc",
        ],
        skipped_final_crates: &["std", "core", "alloc"],
        max_entry_count: 50,
        resolve_source_lines: true,
    };

    /// Keeps every resolvable frame.
    pub const UNFILTERED: Self = Self {
        skipped_initial_crates: &[],
        skipped_final_crates: &[],
        max_entry_count: usize::MAX,
        resolve_source_lines: true,
    };
}

impl Default for TraceFilter {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Error returned when a source line cannot be shown for a frame.
#[derive(Debug, thiserror::Error)]
pub enum SourceLineError {
    /// Line numbers are 1-based; line `0` never exists.
    #[error("line numbers start at 1")]
    InvalidLine,
    /// The source file could not be opened.
    #[error("could not open {path}")]
    Open {
        /// The file that was opened.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Reading the source file failed before the requested line.
    #[error("could not read {path}")]
    Read {
        /// The file that was read.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The file ended before the requested line.
    #[error("{path} has {line_count} line(s), line {lineno} does not exist")]
    PastEnd {
        /// The file that was read.
        path: String,
        /// Number of lines in the file.
        line_count: usize,
        /// The requested line.
        lineno: u32,
    },
    /// An earlier lookup in the same trace already failed to open the file.
    #[error("{path} could not be opened earlier in this trace")]
    Unavailable {
        /// The file that could not be loaded.
        path: String,
    },
}

/// Reads line `lineno` (1-based) of the file at `path`, trimmed of
/// surrounding whitespace.
///
/// # Examples
///
/// ```rust
/// use hardstop_backtrace::{SourceLineError, source_line};
///
/// let error = source_line("/definitely/not/here.rs", 1).unwrap_err();
/// assert!(matches!(error, SourceLineError::Open { .. }));
/// ```
pub fn source_line(path: impl AsRef<Path>, lineno: u32) -> Result<String, SourceLineError> {
    let path = path.as_ref().to_string_lossy();
    SourceCache::default().line(&path, lineno)
}

/// A source file read forward one line at a time, as far as lookups need.
struct SourceFile {
    /// `None` once the end of the file was reached or reading failed.
    reader: Option<BufReader<File>>,
    /// Trimmed lines read so far.
    lines: Vec<String>,
}

impl SourceFile {
    fn open(path: &str) -> Result<Self, SourceLineError> {
        let file = File::open(path).map_err(|source| SourceLineError::Open {
            path: path.to_owned(),
            source,
        })?;
        Ok(Self {
            reader: Some(BufReader::new(file)),
            lines: Vec::new(),
        })
    }

    /// Reads until `count` lines are buffered or the file ends. Lines are
    /// decoded lossily, so invalid UTF-8 only garbles the line it is on.
    fn read_to(&mut self, path: &str, count: usize) -> Result<(), SourceLineError> {
        let mut buf = Vec::new();
        while self.lines.len() < count {
            let Some(reader) = &mut self.reader else {
                break;
            };
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => self.reader = None,
                Ok(_) => self
                    .lines
                    .push(String::from_utf8_lossy(&buf).trim().to_owned()),
                Err(source) => {
                    self.reader = None;
                    return Err(SourceLineError::Read {
                        path: path.to_owned(),
                        source,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Source files read while rendering one trace.
///
/// Recursive or repeated call sites hit the same file many times; each file
/// is opened at most once and read no further than the deepest line asked
/// for. A file that failed to open stays failed.
#[derive(Default)]
struct SourceCache {
    files: HashMap<String, Option<SourceFile>, FxBuildHasher>,
}

impl SourceCache {
    fn line(&mut self, path: &str, lineno: u32) -> Result<String, SourceLineError> {
        let index = lineno.checked_sub(1).ok_or(SourceLineError::InvalidLine)? as usize;

        if !self.files.contains_key(path) {
            match SourceFile::open(path) {
                Ok(file) => {
                    self.files.insert(path.to_owned(), Some(file));
                }
                Err(error) => {
                    self.files.insert(path.to_owned(), None);
                    return Err(error);
                }
            }
        }

        let Some(Some(file)) = self.files.get_mut(path) else {
            return Err(SourceLineError::Unavailable {
                path: path.to_owned(),
            });
        };

        file.read_to(path, index + 1)?;
        file.lines
            .get(index)
            .cloned()
            .ok_or_else(|| SourceLineError::PastEnd {
                path: path.to_owned(),
                line_count: file.lines.len(),
                lineno,
            })
    }
}

/// Reduces a demangled symbol to the name of the function it refers to.
///
/// Module paths, `<T as Trait>` qualifications and generic arguments are
/// dropped. Closures keep their `{{closure}}` marker.
///
/// # Examples
///
/// ```rust
/// use hardstop_backtrace::function_name;
///
/// assert_eq!(function_name("app::config::load"), "load");
/// assert_eq!(function_name("<T as app::Check>::check"), "check");
/// assert_eq!(function_name("app::main::{{closure}}"), "{{closure}}");
/// ```
pub fn function_name(symbol: &str) -> &str {
    let mut angle_depth = 0usize;
    let mut curly_depth = 0usize;
    let mut word_start: Option<usize> = None;
    let mut last_word = 0..symbol.len();
    let mut prev = '\0';

    for (i, c) in symbol.char_indices() {
        let top_level = angle_depth == 0 && curly_depth == 0;
        if top_level && unicode_ident::is_xid_continue(c) {
            word_start.get_or_insert(i);
        } else {
            if top_level && let Some(start) = word_start.take() {
                last_word = start..i;
            }
            match c {
                '<' => angle_depth += 1,
                // `->` inside generic arguments is not a closing bracket
                '>' if prev != '-' => angle_depth = angle_depth.saturating_sub(1),
                '{' => {
                    if top_level {
                        word_start = Some(i);
                    }
                    curly_depth += 1;
                }
                '}' => {
                    curly_depth = curly_depth.saturating_sub(1);
                    if curly_depth == 0
                        && angle_depth == 0
                        && let Some(start) = word_start.take()
                    {
                        last_word = start..i + 1;
                    }
                }
                _ => {}
            }
        }
        prev = c;
    }

    if let Some(start) = word_start {
        last_word = start..symbol.len();
    }
    &symbol[last_word]
}

impl Frame {
    /// Builds an unlabelled frame from resolved symbol information.
    ///
    /// Frames without a symbol name, a file or a line number have no
    /// `<file>:<line>` to show and yield `None`.
    fn resolved(
        sym_demangled: Option<String>,
        raw_path: Option<String>,
        lineno: Option<u32>,
    ) -> Option<Self> {
        let (Some(sym_demangled), Some(raw_path), Some(lineno)) = (sym_demangled, raw_path, lineno)
        else {
            return None;
        };
        let frame_path = FramePath::new(raw_path, &sym_demangled);
        Some(Self {
            sym_demangled,
            frame_path,
            lineno: Some(lineno),
            source_line: None,
        })
    }

    /// The text shown under the frame's location: the source line if it was
    /// resolved, otherwise the bare function name.
    pub fn label(&self) -> &str {
        match &self.source_line {
            Some(line) if !line.is_empty() => line,
            _ => function_name(&self.sym_demangled),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.frame_path.raw_path)?;
        if let Some(lineno) = self.lineno {
            write!(f, ":{lineno}")?;
        }
        write!(f, "\n\t{}\n\n", self.label())
    }
}

impl fmt::Display for Backtrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in &self.frames {
            write!(f, "{frame}")?;
        }
        Ok(())
    }
}

/// Applies a [`TraceFilter`] to frames as they are resolved, innermost first.
struct FrameSieve<'a> {
    filter: &'a TraceFilter,
    initial_filtering: bool,
    remaining_skips: usize,
    frames: Vec<Frame>,
    total_omitted_frames: usize,
}

impl<'a> FrameSieve<'a> {
    fn new(filter: &'a TraceFilter, skip_frames: usize) -> Self {
        Self {
            filter,
            initial_filtering: !filter.skipped_initial_crates.is_empty(),
            remaining_skips: skip_frames,
            frames: Vec::new(),
            total_omitted_frames: 0,
        }
    }

    fn is_full(&self) -> bool {
        self.frames.len() >= self.filter.max_entry_count
    }

    fn offer(&mut self, frame: Frame) {
        if self.is_full() {
            self.total_omitted_frames += 1;
            return;
        }

        if self.initial_filtering {
            if let Some(crate_name) = &frame.frame_path.crate_name
                && self.filter.skipped_initial_crates.contains(&&**crate_name)
            {
                self.total_omitted_frames += 1;
                return;
            }
            self.initial_filtering = false;
        }

        if self.remaining_skips > 0 {
            self.remaining_skips -= 1;
            self.total_omitted_frames += 1;
            return;
        }

        self.frames.push(frame);
    }

    fn finish(mut self) -> Option<Backtrace> {
        // A full sieve stopped short of the runtime start-up frames.
        let reached_end = !self.is_full();
        while reached_end && let Some(last) = self.frames.last() {
            let runtime_crate = last
                .frame_path
                .crate_name
                .as_deref()
                .is_some_and(|crate_name| self.filter.skipped_final_crates.contains(&crate_name));
            let libc_start = matches!(
                last.sym_demangled.as_str(),
                "__libc_start_call_main" | "__libc_start_main_impl" | "_start"
            );
            if !(runtime_crate || libc_start) {
                break;
            }
            self.frames.pop();
            self.total_omitted_frames += 1;
        }

        if self.frames.is_empty() && self.total_omitted_frames == 0 {
            None
        } else {
            Some(Backtrace {
                frames: self.frames,
                total_omitted_frames: self.total_omitted_frames,
            })
        }
    }
}

impl Backtrace {
    /// Captures the current stack backtrace, applying filtering.
    ///
    /// Source lines are not resolved; call
    /// [`resolve_source_lines`](Self::resolve_source_lines) for that.
    pub fn capture(filter: &TraceFilter) -> Option<Self> {
        Self::capture_skipping(filter, 0)
    }

    /// Captures the current stack backtrace, dropping `skip_frames` frames
    /// after the initially skipped crates.
    pub fn capture_skipping(filter: &TraceFilter, skip_frames: usize) -> Option<Self> {
        let mut sieve = FrameSieve::new(filter, skip_frames);

        backtrace::trace(|frame| {
            backtrace::resolve_frame(frame, |symbol| {
                let resolved = Frame::resolved(
                    symbol.name().map(|sym| format!("{sym:#}")),
                    symbol
                        .filename_raw()
                        .map(|filename| filename.to_str_lossy().into_owned()),
                    symbol.lineno(),
                );
                match resolved {
                    Some(frame) => sieve.offer(frame),
                    None => sieve.total_omitted_frames += 1,
                }
            });

            // Frames past the cap would only be counted, never shown.
            !sieve.is_full()
        });

        let backtrace = sieve.finish();
        if let Some(backtrace) = &backtrace {
            tracing::trace!(
                frames = backtrace.frames.len(),
                omitted = backtrace.total_omitted_frames,
                "captured backtrace"
            );
        }
        backtrace
    }

    /// Re-reads the source file of every frame that has a line number and
    /// stores the trimmed line in [`Frame::source_line`].
    ///
    /// Failures leave the frame unlabelled, so it falls back to its function
    /// name when displayed.
    pub fn resolve_source_lines(&mut self) {
        let mut cache = SourceCache::default();
        for frame in &mut self.frames {
            let Some(lineno) = frame.lineno else {
                continue;
            };
            match cache.line(&frame.frame_path.raw_path, lineno) {
                Ok(line) => frame.source_line = Some(line),
                Err(error) => {
                    tracing::debug!(
                        path = %frame.frame_path.raw_path,
                        lineno,
                        %error,
                        "source line unavailable, using symbol name"
                    );
                }
            }
        }
    }
}

impl FramePath {
    /// Builds path information for a frame, detecting the crate it belongs to.
    pub fn new(raw_path: String, sym_demangled: &str) -> Self {
        static REGEXES: OnceLock<[regex::Regex; 2]> = OnceLock::new();
        let [std_regex, registry_regex] = REGEXES.get_or_init(|| {
            [
                // Matches Rust standard library paths:
                // - /lib/rustlib/src/rust/library/{std|core|alloc}/src/...
                // - /rustc/{40-char-hash}/library/{std|core|alloc}/src/...
                regex::Regex::new(
                    r"(?:/lib/rustlib/src/rust|^/rustc/[0-9a-f]{40})/library/(std|core|alloc)/src/",
                )
                .expect("built-in regex pattern for std library paths should be valid"),
                // Matches Cargo registry paths:
                // - /.cargo/registry/src/{index}-{16-char-hash}/{crate}-{version}/src/...
                regex::Regex::new(
                    r"/\.cargo/registry/src/[^/]+-[0-9a-f]{16}/([^./]+)-[0-9]+\.[^/]*/src/",
                )
                .expect("built-in regex pattern for cargo registry paths should be valid"),
            ]
        });

        let from_path = std_regex
            .captures(&raw_path)
            .or_else(|| registry_regex.captures(&raw_path))
            .and_then(|captures| captures.get(1))
            .map(|crate_capture| -> Cow<'static, str> {
                match crate_capture.as_str() {
                    "std" => Cow::Borrowed("std"),
                    "core" => Cow::Borrowed("core"),
                    "alloc" => Cow::Borrowed("alloc"),
                    other => Cow::Owned(other.replace('-', "_")),
                }
            });

        let crate_name =
            from_path.or_else(|| symbol_crate(sym_demangled).map(|name| Cow::Owned(name.to_owned())));

        Self {
            raw_path,
            crate_name,
        }
    }
}

/// The crate named by the first path segment of a demangled symbol.
fn symbol_crate(sym_demangled: &str) -> Option<&str> {
    let path = sym_demangled.trim_start_matches('<');
    let end = path
        .char_indices()
        .find(|&(_, c)| !unicode_ident::is_xid_continue(c))
        .map_or(path.len(), |(i, _)| i);
    let (crate_name, rest) = path.split_at(end);
    (!crate_name.is_empty() && rest.starts_with("::")).then_some(crate_name)
}

/// The `#[track_caller]` location of a failing call, rendered like a frame.
///
/// Used when debug information yields no frames at all.
struct CallerBlock(&'static Location<'static>);

impl fmt::Display for CallerBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = self.0;
        let label = source_line(location.file(), location.line())
            .unwrap_or_else(|_| format!("column {}", location.column()));
        write!(f, "{}:{}\n\t{label}\n\n", location.file(), location.line())
    }
}

/// Prints `message` and a source-annotated stack trace to standard error,
/// then exits the process with status `1`.
///
/// Frames of the capture machinery and of the assertion library are dropped
/// from the start of the trace, then `skip_frames` more frames are dropped, so
/// the trace starts at the code that called the failing check.
///
/// This never returns and never unwinds: panic hooks do not run,
/// [`std::panic::catch_unwind`] cannot intercept it, and destructors of
/// values on the stack are not called.
///
/// # Examples
///
/// ```no_run
/// let config: Option<&str> = None;
/// if config.is_none() {
///     hardstop_backtrace::terminate(0, Some(&"configuration was never loaded"));
/// }
/// ```
#[cold]
#[track_caller]
pub fn terminate(skip_frames: usize, message: Option<&dyn fmt::Display>) -> ! {
    terminate_with_filter(&TraceFilter::DEFAULT, skip_frames, message)
}

/// Like [`terminate`], with a custom [`TraceFilter`].
#[cold]
#[track_caller]
pub fn terminate_with_filter(
    filter: &TraceFilter,
    skip_frames: usize,
    message: Option<&dyn fmt::Display>,
) -> ! {
    let caller = Location::caller();
    let mut stderr = io::stderr().lock();

    // Write errors are ignored: the process exits either way.
    if let Some(message) = message {
        let _ = writeln!(stderr, "{message}");
    }

    match Backtrace::capture_skipping(filter, skip_frames) {
        Some(mut backtrace) if !backtrace.frames.is_empty() => {
            if filter.resolve_source_lines {
                backtrace.resolve_source_lines();
            }
            let _ = write!(stderr, "{backtrace}");
        }
        _ => {
            let _ = write!(stderr, "{}", CallerBlock(caller));
        }
    }

    let _ = stderr.flush();
    drop(stderr);
    std::process::exit(1)
}
