//! Observational tracing of engine decisions.
//!
//! Tracing never changes an outcome. Lines go to the configured output
//! closure, or to stderr when none is set.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::Location;
use std::rc::Rc;

/// Level used by the engine's own hooks (`one`, `do_`, subroutine calls, branches)
pub const ENGINE_TRACE_LEVEL: u8 = 3;

/// Width of the right-aligned source location column
const LOCATION_WIDTH: usize = 40;

const RESET: &str = "\x1b[0m";

/// Output closure for trace lines
pub type TraceOut = Rc<dyn Fn(&str)>;

/// Trace settings carried on a parser's configuration
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TraceConfig {
    /// 0 disables tracing; a line is emitted when its level is at most this
    pub level: u8,

    /// Wrap lines in ANSI colors
    pub color: bool,

    /// Where lines go; stderr when unset
    #[serde(skip)]
    pub out: Option<TraceOut>,
}

impl TraceConfig {
    /// Tracing at `level`, uncolored, to stderr
    pub fn new(level: u8) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    /// Enable or disable ANSI colors
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Send lines to a closure
    pub fn with_out(mut self, out: impl Fn(&str) + 'static) -> Self {
        self.out = Some(Rc::new(out));
        self
    }

    /// Whether a line at `level` would be emitted
    #[inline]
    pub fn enabled(&self, level: u8) -> bool {
        level > 0 && level <= self.level
    }

    /// Emit `msg` at `level` if enabled
    pub fn emit(&self, level: u8, location: Option<&Location<'_>>, msg: &str) {
        if !self.enabled(level) {
            return;
        }
        emit_line(level, self.color, self.out.as_ref(), location, msg);
    }
}

impl fmt::Debug for TraceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceConfig")
            .field("level", &self.level)
            .field("color", &self.color)
            .field("out", &self.out.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Format one trace line.
///
/// With a location: `"{level} {file:>40}:{line:04}   {msg}"`. Without one the
/// short form `"{level}: {msg}"` is used.
pub fn format_line(level: u8, location: Option<&Location<'_>>, msg: &str) -> String {
    match location {
        Some(loc) => format!(
            "{} {:>width$}:{:04}   {}",
            level,
            short_file(loc.file()),
            loc.line(),
            msg,
            width = LOCATION_WIDTH
        ),
        None => format!("{}: {}", level, msg),
    }
}

/// Format, color and write one line regardless of the configured level
pub fn emit_line(
    level: u8,
    color: bool,
    out: Option<&TraceOut>,
    location: Option<&Location<'_>>,
    msg: &str,
) {
    let mut line = format_line(level, location, msg);
    if color {
        line = format!("{}{}{}", level_color(level), line, RESET);
    }
    match out {
        Some(out) => out(&line),
        None => eprintln!("{}", line),
    }
}

fn level_color(level: u8) -> &'static str {
    match level {
        1 => "\x1b[1;33m",
        2 => "\x1b[36m",
        3 => "\x1b[90m",
        _ => "\x1b[35m",
    }
}

// Keep the tail of long paths so the column stays aligned
fn short_file(file: &str) -> &str {
    let n = file.chars().count();
    if n <= LOCATION_WIDTH {
        return file;
    }
    let skip = n - LOCATION_WIDTH;
    match file.char_indices().nth(skip) {
        Some((i, _)) => &file[i..],
        None => file,
    }
}
