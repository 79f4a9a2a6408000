//! Bounded repetition and dynamically named quantifiers.
//!
//! Names come in three forms:
//!
//! - fixed: `zero_or_one`, `zero_or_more`, `one_or_more`
//! - compact: `x3`, `x2_5`, `x2_` (unbounded), with a trailing `i` for
//!   case-insensitive matching (`x0_1i`)
//! - spelled: `two`, `two_to_five`, `two_to_more`, `three_or_more`, using the
//!   words zero to twelve or digits
//!
//! Fixed and spelled names take an `_ic` suffix. Names other than the fixed
//! ones are read by a small grammar on the engine itself, and the result is
//! memoized per thread.

use super::error::ParseError;
use super::parser::{OneCtx, Parser, Step};
use super::pattern::{end, Pattern};
use super::sink::Sink;
use super::subroutine::Subroutine;
use super::val::Val;
use super::value::Value;
use hashbrown::HashMap;
use std::cell::RefCell;
use std::str::FromStr;

const NUMBER_WORDS: [&str; 13] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve",
];

thread_local! {
    /// Thread-local cache of recognized quantifier names
    static QUANTIFIER_CACHE: RefCell<HashMap<String, Quantifier>> = RefCell::new(HashMap::new());
}

/// Iteration bounds plus case sensitivity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Quantifier {
    /// Minimum number of iterations
    pub min: usize,
    /// Maximum number of iterations; `None` is unbounded
    pub max: Option<usize>,
    /// Match case-insensitively
    pub ic: bool,
}

impl Quantifier {
    /// Case-sensitive bounds
    pub fn new(min: usize, max: Option<usize>) -> Self {
        Self {
            min,
            max,
            ic: false,
        }
    }

    /// The same bounds, case-insensitive
    pub fn ic(mut self) -> Self {
        self.ic = true;
        self
    }

    /// Parse a quantifier name, reusing a previous result for the same name.
    ///
    /// # Example
    ///
    /// ```
    /// use parsek::engine::Quantifier;
    ///
    /// let q = Quantifier::lookup("two_to_five_ic").unwrap();
    /// assert_eq!((q.min, q.max, q.ic), (2, Some(5), true));
    /// assert_eq!(Quantifier::lookup("x2_").unwrap().max, None);
    /// assert!(Quantifier::lookup("two_or_five").is_err());
    /// ```
    pub fn lookup(name: &str) -> Result<Quantifier, ParseError> {
        if let Some(q) = QUANTIFIER_CACHE.with(|c| c.borrow().get(name).copied()) {
            return Ok(q);
        }
        let q = recognize(name).ok_or_else(|| ParseError::UnknownQuantifier {
            name: name.to_string(),
        })?;
        QUANTIFIER_CACHE.with(|c| c.borrow_mut().insert(name.to_string(), q));
        Ok(q)
    }
}

impl FromStr for Quantifier {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quantifier::lookup(s)
    }
}

/// Clear the quantifier name cache
pub fn clear_quantifier_cache() {
    QUANTIFIER_CACHE.with(|c| c.borrow_mut().clear());
}

/// Number of cached quantifier names
pub fn quantifier_cache_size() -> usize {
    QUANTIFIER_CACHE.with(|c| c.borrow().len())
}

fn recognize(name: &str) -> Option<Quantifier> {
    let q = match name {
        "zero_or_one" => Quantifier::new(0, Some(1)),
        "zero_or_more" => Quantifier::new(0, None),
        "one_or_more" => Quantifier::new(1, None),
        "zero_or_one_ic" => Quantifier::new(0, Some(1)).ic(),
        "zero_or_more_ic" => Quantifier::new(0, None).ic(),
        "one_or_more_ic" => Quantifier::new(1, None).ic(),
        _ if name.starts_with('x') => compact(name)?,
        _ => spelled(name)?,
    };
    match q.max {
        Some(max) if q.min > max => None,
        _ => Some(q),
    }
}

fn count(v: &Val) -> Option<usize> {
    match v.value() {
        Value::Int(n) => usize::try_from(n).ok(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

// a number word or a run of digits
fn number() -> Subroutine {
    Subroutine::new(|p, out| {
        let words = NUMBER_WORDS.iter().enumerate().map(|(n, w)| (*w, n));
        p.lookahead()
            .one(Pattern::map(words), out)
        .alt()
            .one_or_more(Pattern::digit(), out)
        .merge()
        .into()
    })
    .named("count")
}

// `x3`, `x2_5`, `x2_`, each with an optional trailing `i`
fn compact(name: &str) -> Option<Quantifier> {
    let (lo, sep, hi, ic) = (Val::new(), Val::new(), Val::new(), Val::new());
    let mut p = Parser::new(name);
    let ok = p
        .one('x', ())
        .one_or_more(Pattern::digit(), &lo)
        .zero_or_one('_', &sep)
        .zero_or_more(Pattern::digit(), &hi)
        .zero_or_one('i', &ic)
        .one(end(), ())
        .is_ok();
    if !ok {
        return None;
    }
    let min = count(&lo)?;
    let max = match (sep.text().is_empty(), hi.text().is_empty()) {
        (true, _) => Some(min),
        (false, true) => None,
        (false, false) => Some(count(&hi)?),
    };
    Some(Quantifier {
        min,
        max,
        ic: !ic.text().is_empty(),
    })
}

// `two`, `two_to_five`, `two_to_more`, `two_or_more`, each with an optional `_ic`
fn spelled(name: &str) -> Option<Quantifier> {
    let (lo, hi, open, ic) = (Val::new(), Val::new(), Val::new(), Val::new());
    let number = number();
    let mut p = Parser::new(name);
    let ok = p
        .one(&number, &lo)
        .lookahead()
            .one("_to_", ())
            .lookahead()
                .one("more", &open)
            .alt()
                .one(&number, &hi)
            .merge()
        .alt()
            .one("_or_more", &open)
        .alt()
            // exact count
        .merge()
        .zero_or_one("_ic", &ic)
        .one(end(), ())
        .is_ok();
    if !ok {
        return None;
    }
    let min = count(&lo)?;
    let max = match (open.text().is_empty(), hi.text().is_empty()) {
        (false, _) => None,
        (true, true) => Some(min),
        (true, false) => Some(count(&hi)?),
    };
    Some(Quantifier {
        min,
        max,
        ic: !ic.text().is_empty(),
    })
}

impl Parser {
    /// Run `pat` under quantifier `q`.
    ///
    /// A failed iteration leaves the cursor where that iteration started.
    /// Below the minimum the whole run is undone.
    pub(crate) fn repeat_step(
        &mut self,
        q: &Quantifier,
        pat: &Pattern,
        sink: &Sink,
        acc: &Sink,
    ) -> Step {
        let start = self.pos;
        let ctx = OneCtx {
            ic: q.ic,
            ..OneCtx::default()
        };
        let mut count = 0usize;
        while q.max.map_or(true, |max| count < max) {
            let before = self.pos;
            match self.one_step(pat, sink, &ctx) {
                Step::Ok => {
                    count += 1;
                    if count > self.config.parse_limit {
                        let err = ParseError::IterationLimit {
                            limit: self.config.parse_limit,
                            context: self.context(),
                        };
                        self.raise(err);
                        return Step::Fail;
                    }
                }
                Step::End => return Step::End,
                Step::Fail => {
                    if self.error.is_some() {
                        return Step::Fail;
                    }
                    self.pos = before;
                    break;
                }
            }
        }
        log_debug!("repeat {:?}: {} iterations from {}", q, count, start);

        if count >= q.min {
            if count > 0 && !acc.is_none() {
                let text = self.matched_text(start, self.pos);
                if !self.deliver(acc, text.into()) {
                    return Step::Fail;
                }
            }
            Step::Ok
        } else {
            self.pos = start;
            Step::Fail
        }
    }
}
