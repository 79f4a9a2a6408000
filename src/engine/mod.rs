//! The parsing engine
//!
//! A cursor over a string, driven by chained match operations that either
//! advance the cursor and deliver what they matched to a sink, or fail and
//! make the rest of the chain a no-op.
//!
//! # Module Organization
//!
//! ## Cursor and Chains
//! - [`Parser`] - Input, position, saved positions and configuration
//! - [`Branch`] - A chain in progress; lookahead blocks and backtracking
//! - [`Outcome`] - Detached result of a chain
//!
//! ## Matching
//! - [`Pattern`] - What a single match step tests
//! - [`chars()`] - Bracket-class compiler
//! - [`Quantifier`] - Bounded repetition, also by name
//! - [`Subroutine`] - Reusable and recursive parse routines
//!
//! ## Accumulation
//! - [`Sink`] - Where matched values go
//! - [`Val`] - Shared scalar box
//! - [`Value`] - Dynamic value
//!
//! ## Errors and Tracing
//! - [`ParseError`] - Hard errors with rendered context
//! - [`TraceConfig`] - Leveled trace output

// ============================================================================
// Module Declarations
// ============================================================================

pub mod branch;
pub mod char_spec;
pub mod error;
pub mod parser;
pub mod pattern;
pub mod quantifier;
pub mod sink;
pub mod subroutine;
pub mod trace;
pub mod val;
pub mod value;

// ============================================================================
// Re-exports
// ============================================================================

pub use branch::{Branch, Outcome};
pub use char_spec::{chars, chars_cache_size, clear_chars_cache, MAX_EXPANDED_RANGE};
pub use error::{str_context, Nomatch, OnErr, ParseError, DEFAULT_CONTEXT_SIZE, MARK};
pub use parser::{OneCtx, Parser, ParserConfig, DEFAULT_PARSE_LIMIT};
pub use pattern::{end, Pattern, PatternKind};
pub use quantifier::{clear_quantifier_cache, quantifier_cache_size, Quantifier};
pub use sink::{new_dict, new_list, new_set, Combine, Dict, Key, List, Set, Sink};
pub use subroutine::Subroutine;
pub use trace::{TraceConfig, TraceOut, ENGINE_TRACE_LEVEL};
pub use val::{Combiner, Val};
pub use value::Value;
