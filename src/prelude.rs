//! Prelude module for convenient imports
//!
//! This module re-exports the types used in almost every grammar:
//!
//! ```
//! use parsek::prelude::*;
//! ```
//!
//! # Re-exported Items
//!
//! ## Core Types
//! - [`Parser`] - The cursor; every chain starts here
//! - [`Branch`] - A chain in progress
//! - [`Outcome`] - Result returned by subroutines and `do_` closures
//! - [`ParserConfig`] - Iteration ceiling, context rendering, tracing
//!
//! ## Matching
//! - [`Pattern`] - Single-step predicate
//! - [`chars()`] - Bracket-class compiler
//! - [`end()`] - Matches at the end of input
//! - [`Quantifier`] - Bounded repetition
//! - [`Subroutine`] - Reusable parse routine
//!
//! ## Accumulation
//! - [`Sink`], [`Val`], [`Value`], [`new_list()`], [`new_set()`], [`new_dict()`]
//!
//! ## Error Handling
//! - [`ParseError`], [`OnErr`], [`Nomatch`]
//!
//! ## Grammar
//! - [`ws()`], [`uint()`], [`int_()`], [`decimal()`], [`identifier()`],
//!   [`string()`], [`collection()`]

// ============================================================================
// Core Types
// ============================================================================

pub use crate::engine::{Branch, OneCtx, Outcome, Parser, ParserConfig};

// ============================================================================
// Matching
// ============================================================================

pub use crate::engine::{chars, end, Pattern, Quantifier, Subroutine};

// ============================================================================
// Accumulation
// ============================================================================

pub use crate::engine::{new_dict, new_list, new_set, Combine, Sink, Val, Value};

// ============================================================================
// Error Handling
// ============================================================================

pub use crate::engine::{Nomatch, OnErr, ParseError};

// ============================================================================
// Grammar
// ============================================================================

pub use crate::grammar::{
    collection, decimal, identifier, int_, string, string_with, uint, ws, Escapes, StringOpts,
};
