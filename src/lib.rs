//! Parsek - Fluent Recursive-Descent Parsing
//!
//! Parsers are written as chains of match operations on a cursor. Each step
//! either advances and delivers what it matched to a sink, or fails and turns
//! the rest of the chain into a no-op. Lookahead blocks (`if_`/`elif_`/
//! `else_`/`endif`, `lookahead`/`alt`/`merge`) restore the cursor on failure,
//! and subroutines make grammars reusable and recursive.
//!
//! It provides:
//! - A cursor with single-step predicates, `chars()` classes and quantifiers
//! - Lookahead, alternation and backtracking blocks with an explicit stack
//! - An accumulation protocol into shared boxes, lists, sets and dicts
//! - Ready-made grammar pieces: numbers, identifiers, strings, collections
//! - A Python source minifier built on the engine
//!
//! ## Quick Start
//!
//! ```rust
//! use parsek::prelude::*;
//!
//! let key = Val::new();
//! let value = Val::new();
//! let mut p = Parser::new("answer = 42");
//! let ok = p
//!     .one(identifier(), &key)
//!     .one(ws(), ())
//!     .one('=', ())
//!     .one(ws(), ())
//!     .one(decimal(), &value)
//!     .one(end(), ())
//!     .is_ok();
//! assert!(ok);
//! assert_eq!(key.text(), "answer");
//! assert_eq!(value.value(), Value::Int(42));
//! ```
//!
//! ## Alternatives
//!
//! ```rust
//! use parsek::prelude::*;
//!
//! let kind = Val::new();
//! let mut p = Parser::new("0x1f");
//! let ok = p
//!     .if_().one("0x", ()).one_or_more(chars("0-9a-f"), ()).accumulate(&kind, "hex")
//!     .else_().one_or_more(Pattern::digit(), ()).accumulate(&kind, "dec")
//!     .endif()
//!     .is_ok();
//! assert!(ok);
//! assert_eq!(kind.text(), "hex");
//! ```
//!
//! ## Feature Flags
//!
//! - `logging` - Enable debug logging using the `log` crate

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all)]
#![allow(clippy::new_without_default)]
#![allow(clippy::module_inception)]
#![allow(clippy::redundant_closure)]

// Debug logging, compiled out unless the `logging` feature is on
#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

// Prelude module for convenient imports
pub mod prelude;

pub mod engine;
pub mod grammar;
pub mod minify;

/// Re-export commonly used types for convenience
pub use engine::{
    chars, end, new_dict, new_list, new_set, Branch, Nomatch, OnErr, OneCtx, Outcome, ParseError,
    Parser, ParserConfig, Pattern, Quantifier, Sink, Subroutine, TraceConfig, Val, Value,
};
pub use minify::minify;
