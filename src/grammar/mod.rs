//! Ready-made subroutines built on the engine
//!
//! Each item here is an ordinary [`Subroutine`](crate::engine::Subroutine)
//! client of `one`, the quantifiers and the accumulation protocol. They
//! receive the caller's sink and deliver one decoded value per match.
//!
//! - [`ws`] - optional whitespace
//! - [`uint`], [`int_`], [`decimal`] - numbers
//! - [`identifier`] - names
//! - [`string()`] and [`StringOpts`] - quoted strings with escapes
//! - [`collection()`] - delimited, separated item lists

pub mod collection;
pub mod identifier;
pub mod numbers;
pub mod string;

pub use collection::{collection, Collection, EmptyItem};
pub use identifier::identifier;
pub use numbers::{decimal, int_, uint, ws};
pub use string::{string, string_with, Escapes, StringOpts};
