//! Hard errors and contextual error rendering.
//!
//! Structural parse failures are not errors: they travel as `Fail`/`End`/`Back`
//! outcomes through a chain. The types here cover the second tier, raised
//! when a match is mandatory, an accumulation target rejects a value, or a
//! quantifier loops past its ceiling.
//!
//! # Example Output
//!
//! ```text
//! Expected a value at: {"a": 1} e̲xtra
//! ```

use super::parser::Parser;
use std::fmt;
use std::rc::Rc;

/// Default number of characters shown on each side of an error position
pub const DEFAULT_CONTEXT_SIZE: usize = 10;

/// Combining low line, placed after the character an error points at
pub const MARK: char = '\u{0332}';

/// Error type for engine operations
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A mandatory match failed (`err`, `nomatch`, grammar subroutines)
    Syntax {
        /// Human readable message
        message: String,
        /// Rendered input window around the failure position
        context: String,
    },

    /// A quantifier exceeded the configured iteration ceiling
    IterationLimit {
        /// The ceiling that was exceeded
        limit: usize,
        /// Rendered input window around the position where it tripped
        context: String,
    },

    /// A dynamic quantifier name that the recognizer rejected
    UnknownQuantifier {
        /// The rejected name
        name: String,
    },

    /// A fallible callable sink reported an error
    Accumulation {
        /// Name of the callable
        target: String,
        /// Error reported by the callable
        reason: String,
    },

    /// A value could not be merged into a mapping sink
    DictUpdate {
        /// Why the merge failed
        reason: String,
    },

    /// `pop_pos`/`copy` referred to a position that was never saved
    PositionNotFound {
        /// The missing key
        key: String,
    },

    /// A scalar box operation was applied to a value of the wrong type
    Value {
        /// Error message describing the mismatch
        message: String,
    },
}

impl ParseError {
    /// Create a syntax error with an already rendered context
    pub fn syntax(message: impl Into<String>, context: impl Into<String>) -> Self {
        ParseError::Syntax {
            message: message.into(),
            context: context.into(),
        }
    }

    /// Create a value error
    pub fn value(message: impl Into<String>) -> Self {
        ParseError::Value {
            message: message.into(),
        }
    }

    /// The message without the trailing input context.
    ///
    /// This is what an [`OnErr::Handler`] receives.
    pub fn message(&self) -> String {
        match self {
            ParseError::Syntax { message, .. } => message.clone(),
            ParseError::IterationLimit { .. } => "Infinite loop or input too long".to_string(),
            ParseError::Value { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Syntax { message, context } => {
                write!(f, "{} at: {}", message, context)
            }
            ParseError::IterationLimit { limit, context } => {
                write!(
                    f,
                    "Infinite loop or input too long (limit {}) at: {}",
                    limit, context
                )
            }
            ParseError::UnknownQuantifier { name } => {
                write!(f, "no such member: '{}'", name)
            }
            ParseError::Accumulation { target, reason } => {
                write!(f, "Accumulation failed while calling {}: {}", target, reason)
            }
            ParseError::DictUpdate { reason } => {
                write!(f, "Dictionary update failed: {}", reason)
            }
            ParseError::PositionNotFound { key } => {
                write!(f, "Position '{}' not found", key)
            }
            ParseError::Value { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for ParseError {}

/// What to do when a mandatory step fails.
#[derive(Clone, Default)]
pub enum OnErr {
    /// Fail gracefully without raising
    None,
    /// Raise a [`ParseError::Syntax`] with context
    #[default]
    Raise,
    /// Call the handler with the parser and the bare message, then fail
    /// gracefully
    Handler(Rc<dyn Fn(&mut Parser, &str)>),
}

impl OnErr {
    /// Wrap a closure as a handler
    pub fn handler(f: impl Fn(&mut Parser, &str) + 'static) -> Self {
        OnErr::Handler(Rc::new(f))
    }
}

impl fmt::Debug for OnErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnErr::None => write!(f, "None"),
            OnErr::Raise => write!(f, "Raise"),
            OnErr::Handler(_) => write!(f, "Handler(..)"),
        }
    }
}

/// What `one` does when its pattern does not match.
#[derive(Clone)]
pub enum Nomatch {
    /// Raise a [`ParseError::Syntax`] with this message
    Err(String),
    /// Call back with the parser, then fail
    Call(Rc<dyn Fn(&mut Parser)>),
}

impl Nomatch {
    /// Wrap a closure as a nomatch callback
    pub fn call(f: impl Fn(&mut Parser) + 'static) -> Self {
        Nomatch::Call(Rc::new(f))
    }
}

impl From<&str> for Nomatch {
    fn from(msg: &str) -> Self {
        Nomatch::Err(msg.to_string())
    }
}

impl From<String> for Nomatch {
    fn from(msg: String) -> Self {
        Nomatch::Err(msg)
    }
}

impl fmt::Debug for Nomatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Nomatch::Err(msg) => write!(f, "Err({:?})", msg),
            Nomatch::Call(_) => write!(f, "Call(..)"),
        }
    }
}

/// Render a window of `s` around index `i`, marking the character at `i`.
///
/// The window spans `size` characters on either side. Truncated sides get an
/// ellipsis (`…`, or `...` when `unicode` is false). An index at or past the
/// end marks the last character.
///
/// # Example
///
/// ```
/// use parsek::engine::str_context;
///
/// assert_eq!(str_context("abc", 0, 10, true), "a\u{332}bc");
/// ```
pub fn str_context(s: &str, i: usize, size: usize, unicode: bool) -> String {
    let chars: Vec<char> = s.chars().collect();
    chars_context(&chars, i, size, unicode)
}

pub(crate) fn chars_context(chars: &[char], i: usize, size: usize, unicode: bool) -> String {
    if chars.is_empty() {
        return String::new();
    }
    let i = i.min(chars.len() - 1);
    let start = i.saturating_sub(size);
    let end = (i + size + 1).min(chars.len());
    let ellipsis = if unicode { "…" } else { "..." };

    let mut out = String::with_capacity((end - start) * 2 + 8);
    if start > 0 {
        out.push_str(ellipsis);
    }
    for (k, c) in chars[start..end].iter().enumerate() {
        out.push(*c);
        if start + k == i {
            out.push(MARK);
        }
    }
    if end < chars.len() {
        out.push_str(ellipsis);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_marks_position() {
        assert_eq!(str_context("hello world", 6, 10, true), "hello w\u{332}orld");
        assert_eq!(str_context("abc", 0, 10, true), "a\u{332}bc");
    }

    #[test]
    fn test_context_truncation() {
        let s = "0123456789abcdefghij0123456789";
        let ctx = str_context(s, 15, 3, true);
        assert_eq!(ctx, "…cdef\u{332}ghi…");
        let ctx = str_context(s, 15, 3, false);
        assert_eq!(ctx, "...cdef\u{332}ghi...");
    }

    #[test]
    fn test_context_clamps_index() {
        assert_eq!(str_context("ab", 9, 10, true), "ab\u{332}");
        assert_eq!(str_context("", 0, 10, true), "");
    }

    #[test]
    fn test_display() {
        let e = ParseError::syntax("TestError", str_context("hello world", 6, 10, true));
        assert_eq!(e.to_string(), "TestError at: hello w\u{332}orld");
        assert_eq!(e.message(), "TestError");

        let e = ParseError::PositionNotFound { key: "x".into() };
        assert_eq!(e.to_string(), "Position 'x' not found");

        let e = ParseError::IterationLimit {
            limit: 3,
            context: String::new(),
        };
        assert!(e.to_string().starts_with("Infinite loop or input too long"));
    }
}
