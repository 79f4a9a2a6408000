//! The cursor and the single-match primitive.
//!
//! A [`Parser`] owns the input as a sequence of code points and a position
//! into it. Positions at and one past the end read as the end sentinel,
//! which [`Parser::ch`] reports as `None`. Every chained operation is a
//! method on [`Branch`](super::branch::Branch); calling one on the parser
//! starts a fresh chain.

use super::branch::Frame;
use super::error::{chars_context, Nomatch, ParseError, DEFAULT_CONTEXT_SIZE};
use super::pattern::{fold_eq, Pattern, PatternKind};
use super::sink::Sink;
use super::trace::{TraceConfig, TraceOut, ENGINE_TRACE_LEVEL};
use super::value::Value;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::Location;

/// Default quantifier iteration ceiling
pub const DEFAULT_PARSE_LIMIT: usize = 1_000_000;

/// Parser configuration
///
/// # Example
///
/// ```
/// use parsek::engine::{Parser, ParserConfig};
///
/// let config = ParserConfig::new().with_parse_limit(10).with_context_size(4);
/// let p = Parser::with_config("abc", config);
/// assert_eq!(p.config().parse_limit, 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Quantifier iteration ceiling
    pub parse_limit: usize,

    /// Characters shown on each side of an error position
    pub context_size: usize,

    /// Use `…` rather than `...` for truncated error context
    pub unicode_context: bool,

    /// Panic on precondition violations such as an empty lookahead stack
    pub debug_checks: bool,

    /// Trace settings
    pub trace: TraceConfig,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            parse_limit: DEFAULT_PARSE_LIMIT,
            context_size: DEFAULT_CONTEXT_SIZE,
            unicode_context: true,
            debug_checks: cfg!(debug_assertions),
            trace: TraceConfig::default(),
        }
    }
}

impl ParserConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the quantifier iteration ceiling
    pub fn with_parse_limit(mut self, limit: usize) -> Self {
        self.parse_limit = limit;
        self
    }

    /// Set the error context window
    pub fn with_context_size(mut self, size: usize) -> Self {
        self.context_size = size;
        self
    }

    /// Choose between `…` and `...` in error context
    pub fn with_unicode_context(mut self, unicode: bool) -> Self {
        self.unicode_context = unicode;
        self
    }

    /// Enable or disable precondition panics
    pub fn with_debug_checks(mut self, on: bool) -> Self {
        self.debug_checks = on;
        self
    }

    /// Set the trace settings
    pub fn with_trace(mut self, trace: TraceConfig) -> Self {
        self.trace = trace;
        self
    }

    /// Serialize the plain fields to JSON
    pub fn to_json(&self) -> Result<String, ParseError> {
        serde_json::to_string(self).map_err(|e| ParseError::value(e.to_string()))
    }

    /// Read a config from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        serde_json::from_str(json).map_err(|e| ParseError::value(e.to_string()))
    }
}

/// Options for a single match.
///
/// Built once and reused, like a compiled call site.
///
/// # Example
///
/// ```
/// use parsek::engine::{OneCtx, Parser, Val};
///
/// let word = Val::of("");
/// let ctx = OneCtx::new().ic().acc(&word);
/// let mut p = Parser::new("ABC");
/// assert!(p.one_with("abc", (), &ctx).is_ok());
/// assert_eq!(word.text(), "ABC");
/// ```
#[derive(Clone, Default, Debug)]
pub struct OneCtx {
    /// Case-insensitive comparison
    pub ic: bool,
    /// What to do on a miss
    pub nomatch: Option<Nomatch>,
    /// Receives the whole consumed slice on a match
    pub acc: Sink,
}

impl OneCtx {
    /// Case-sensitive, no nomatch action, no acc sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare case-insensitively
    pub fn ic(mut self) -> Self {
        self.ic = true;
        self
    }

    /// Set the nomatch action
    pub fn nomatch(mut self, nomatch: impl Into<Nomatch>) -> Self {
        self.nomatch = Some(nomatch.into());
        self
    }

    /// Set the slice sink
    pub fn acc(mut self, acc: impl Into<Sink>) -> Self {
        self.acc = acc.into();
        self
    }
}

/// Result of the single-match primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Ok,
    Fail,
    End,
}

/// A successful match before it is applied to the cursor
pub(crate) struct Hit {
    /// Position after the match
    pub end: usize,
    /// Value handed to sinks
    pub value: Value,
    /// Whether the positional sink receives `value`
    pub deliver: bool,
}

/// The cursor driving one parse
pub struct Parser {
    pub(crate) src: Vec<char>,
    pub(crate) pos: usize,
    saved: HashMap<String, usize>,
    skip: bool,
    state: Value,
    pub(crate) end_state: bool,
    pub(crate) frames: Vec<Frame>,
    pub(crate) error: Option<ParseError>,
    pub(crate) config: ParserConfig,
    reversed: bool,
}

impl Parser {
    /// Create a parser with the default configuration
    pub fn new(src: &str) -> Self {
        Self::with_config(src, ParserConfig::default())
    }

    /// Create a parser with a custom configuration
    pub fn with_config(src: &str, config: ParserConfig) -> Self {
        Self::from_chars(src.chars().collect(), config, false)
    }

    fn from_chars(src: Vec<char>, config: ParserConfig, reversed: bool) -> Self {
        Self {
            src,
            pos: 0,
            saved: HashMap::new(),
            skip: false,
            state: Value::Nil,
            end_state: false,
            frames: Vec::new(),
            error: None,
            config,
            reversed,
        }
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// The configuration
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Mutable configuration
    pub fn config_mut(&mut self) -> &mut ParserConfig {
        &mut self.config
    }

    /// Replace the trace settings, returning the previous `(level, color, out)`
    pub fn set_trace(
        &mut self,
        level: u8,
        color: bool,
        out: Option<TraceOut>,
    ) -> (u8, bool, Option<TraceOut>) {
        let prev = std::mem::replace(&mut self.config.trace, TraceConfig { level, color, out });
        (prev.level, prev.color, prev.out)
    }

    /// Emit a trace line at the caller's location
    #[track_caller]
    pub(crate) fn trace_with(&self, level: u8, msg: impl FnOnce() -> String) {
        if self.config.trace.enabled(level) {
            self.config.trace.emit(level, Some(Location::caller()), &msg());
        }
    }

    // ========================================================================
    // Cursor state
    // ========================================================================

    /// Current position
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Move to `pos`, clamped to one past the end
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.src.len() + 1);
    }

    /// Number of code points in the input
    #[inline]
    pub fn len(&self) -> usize {
        self.src.len()
    }

    /// True for empty input
    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }

    /// The input as a string
    pub fn source(&self) -> String {
        self.src.iter().collect()
    }

    /// The character at the cursor; `None` at or past the end
    #[inline]
    pub fn ch(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    /// At or past the end
    #[inline]
    pub fn is_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    /// One past the end
    #[inline]
    pub fn is_past_end(&self) -> bool {
        self.pos > self.src.len()
    }

    /// The parse was ended with `end`
    pub fn is_end_state(&self) -> bool {
        self.end_state
    }

    /// Neither ended nor holding an error
    pub fn is_active(&self) -> bool {
        !self.end_state && self.error.is_none()
    }

    /// A lookahead frame is open
    pub fn is_backtrackable(&self) -> bool {
        !self.frames.is_empty()
    }

    /// Saved positions of the open lookahead frames, outermost first
    pub fn lookahead_stack(&self) -> Vec<usize> {
        self.frames.iter().map(|f| f.pos).collect()
    }

    /// The pending hard error, if any
    pub fn error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }

    /// Take the pending hard error, making the parser usable again.
    /// The error unwound every open block, so their frames are dropped too.
    pub fn take_error(&mut self) -> Option<ParseError> {
        let err = self.error.take();
        if err.is_some() {
            self.frames.clear();
        }
        err
    }

    /// Rendered input window around the cursor
    pub fn context(&self) -> String {
        self.context_at(self.pos)
    }

    pub(crate) fn context_at(&self, pos: usize) -> String {
        chars_context(
            &self.src,
            pos,
            self.config.context_size,
            self.config.unicode_context,
        )
    }

    // ========================================================================
    // Movement
    // ========================================================================

    /// Advance `n` characters, clamped to one past the end.
    ///
    /// A pending skip swallows this advance and clears itself.
    pub fn next(&mut self, n: usize) -> &mut Self {
        if self.skip {
            self.skip = false;
        } else {
            self.pos = (self.pos + n).min(self.src.len() + 1);
        }
        self
    }

    /// Suppress the next advance
    pub fn skip(&mut self) -> &mut Self {
        self.skip = true;
        self
    }

    /// Switch the user state and suppress the next advance
    pub fn skip_to(&mut self, state: impl Into<Value>) -> &mut Self {
        self.state = state.into();
        self.skip = true;
        self
    }

    /// Switch the user state, cancelling any pending skip
    pub fn goto(&mut self, state: impl Into<Value>) -> &mut Self {
        self.state = state.into();
        self.skip = false;
        self
    }

    /// A skip is pending
    pub fn is_skipping(&self) -> bool {
        self.skip
    }

    /// The user state slot
    pub fn state(&self) -> &Value {
        &self.state
    }

    /// Replace the user state slot
    pub fn set_state(&mut self, state: impl Into<Value>) {
        self.state = state.into();
    }

    // ========================================================================
    // Saved positions and slices
    // ========================================================================

    /// Remember the current position under `key`
    pub fn save_pos(&mut self, key: &str) -> &mut Self {
        self.saved.insert(key.to_string(), self.pos);
        self
    }

    /// Remove and return a saved position
    pub fn pop_pos(&mut self, key: &str) -> Option<usize> {
        self.saved.remove(key)
    }

    /// Saved position without removing it
    pub fn saved_pos(&self, key: &str) -> Option<usize> {
        self.saved.get(key).copied()
    }

    /// Remove a saved position and return the text from it to the cursor.
    ///
    /// `offset` shifts the start and the end of the slice.
    pub fn slice_from_saved(&mut self, key: &str, offset: (isize, isize)) -> Option<String> {
        let start = self.saved.remove(key)?;
        let a = shift(start, offset.0);
        let b = shift(self.pos, offset.1);
        Some(self.span(a, b))
    }

    /// Up to `n` characters ahead of the cursor
    pub fn slice(&self, n: usize) -> String {
        self.span(self.pos, self.pos.saturating_add(n))
    }

    /// Up to `n` characters behind the cursor
    pub fn slice_behind(&self, n: usize) -> String {
        self.span(self.pos.saturating_sub(n), self.pos)
    }

    /// Text from `start` to the cursor
    pub fn slice_from(&self, start: usize) -> String {
        self.span(start, self.pos)
    }

    fn span(&self, a: usize, b: usize) -> String {
        let b = b.min(self.src.len());
        let a = a.min(b);
        self.src[a..b].iter().collect()
    }

    /// Matched text between two positions, in reading order
    pub(crate) fn matched_text(&self, a: usize, b: usize) -> String {
        let b = b.min(self.src.len());
        let a = a.min(b);
        if self.reversed {
            self.src[a..b].iter().rev().collect()
        } else {
            self.src[a..b].iter().collect()
        }
    }

    // ========================================================================
    // Lookbehind
    // ========================================================================

    /// A reversed view of the input before the cursor.
    ///
    /// The view reads backwards: its position 0 is the character just before
    /// this parser's cursor. Past the end the view is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use parsek::engine::Parser;
    ///
    /// let mut p = Parser::new("abcdef");
    /// p.set_pos(2);
    /// let b = p.lookbehind();
    /// assert_eq!(b.source(), "ba");
    /// assert_eq!(b.ch(), Some('b'));
    /// ```
    pub fn lookbehind(&self) -> Parser {
        let end = if self.pos > self.src.len() { 0 } else { self.pos };
        let src = self.src[..end].iter().rev().copied().collect();
        Parser::from_chars(src, self.config.clone(), !self.reversed)
    }

    // ========================================================================
    // Errors
    // ========================================================================

    /// Store a hard error; the first one wins
    pub(crate) fn raise(&mut self, err: ParseError) {
        log_debug!("raise: {}", err);
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// Syntax error with context at the cursor
    pub(crate) fn syntax_error(&self, message: impl Into<String>) -> ParseError {
        ParseError::syntax(message, self.context())
    }

    /// Deliver `value`, converting a sink error into a raised error
    pub(crate) fn deliver(&mut self, sink: &Sink, value: Value) -> bool {
        match sink.accumulate(value) {
            Ok(()) => true,
            Err(e) => {
                self.raise(e);
                false
            }
        }
    }

    // ========================================================================
    // Matching
    // ========================================================================

    /// Match `pat` at the cursor and apply the result
    #[track_caller]
    pub(crate) fn one_step(&mut self, pat: &Pattern, sink: &Sink, ctx: &OneCtx) -> Step {
        if self.end_state {
            return Step::End;
        }
        self.trace_with(ENGINE_TRACE_LEVEL, || {
            format!("one {} at {}", pat, self.context())
        });

        let start = self.pos;
        let hit = self.try_match(pat, ctx.ic, sink);
        if self.error.is_some() {
            return Step::Fail;
        }
        match hit {
            Some(hit) => {
                self.pos = hit.end;
                let slice = match pat.kind() {
                    PatternKind::Sub(_) => Value::String(self.matched_text(start, hit.end)),
                    _ => hit.value.clone(),
                };
                if hit.deliver && !self.deliver(sink, hit.value) {
                    return Step::Fail;
                }
                if !ctx.acc.is_none() && !self.deliver(&ctx.acc, slice) {
                    return Step::Fail;
                }
                if self.end_state {
                    Step::End
                } else {
                    Step::Ok
                }
            }
            None => {
                if self.end_state {
                    return Step::End;
                }
                self.on_nomatch(ctx.nomatch.as_ref());
                Step::Fail
            }
        }
    }

    /// Match `pat` behind the cursor without moving it
    #[track_caller]
    pub(crate) fn behind_step(&mut self, pat: &Pattern, sink: &Sink, ctx: &OneCtx) -> Step {
        if self.end_state {
            return Step::End;
        }
        let mut view = self.lookbehind();
        let hit = view.try_match(pat, ctx.ic, sink);
        if let Some(err) = view.error.take() {
            self.raise(err);
            return Step::Fail;
        }
        match hit {
            Some(hit) => {
                let slice = Value::String(view.matched_text(0, hit.end));
                let value = match pat.kind() {
                    PatternKind::Sub(_) => slice.clone(),
                    _ => hit.value,
                };
                if hit.deliver && !self.deliver(sink, value.clone()) {
                    return Step::Fail;
                }
                let acc_value = match pat.kind() {
                    PatternKind::Sub(_) => slice,
                    _ => value,
                };
                if !ctx.acc.is_none() && !self.deliver(&ctx.acc, acc_value) {
                    return Step::Fail;
                }
                Step::Ok
            }
            None => {
                self.on_nomatch(ctx.nomatch.as_ref());
                Step::Fail
            }
        }
    }

    fn on_nomatch(&mut self, nomatch: Option<&Nomatch>) {
        match nomatch {
            Some(Nomatch::Err(msg)) => {
                let err = self.syntax_error(msg.as_str());
                self.raise(err);
            }
            Some(Nomatch::Call(f)) => {
                let f = f.clone();
                f(self);
            }
            None => {}
        }
    }

    /// Test `pat` at the cursor.
    ///
    /// Only subroutines move the cursor; everything else reports where the
    /// match would end. A missed alternative restores the cursor.
    pub(crate) fn try_match(&mut self, pat: &Pattern, ic: bool, out: &Sink) -> Option<Hit> {
        let i = self.pos;
        let len = self.src.len();
        match pat.kind() {
            PatternKind::Lit(s) => self.lit_hit(i, s, ic),
            PatternKind::End => (i >= len).then(|| Hit {
                end: len + 1,
                value: Value::String(String::new()),
                deliver: true,
            }),
            PatternKind::In { chars, end } => match self.src.get(i) {
                Some(&c) => {
                    let found = if ic {
                        chars.chars().any(|x| fold_eq(x, c))
                    } else {
                        chars.contains(c)
                    };
                    found.then(|| self.char_hit(i, c))
                }
                None => end.then(|| Hit {
                    end: len + 1,
                    value: Value::String(String::new()),
                    deliver: true,
                }),
            },
            PatternKind::Range(lo, hi) => {
                let c = *self.src.get(i)?;
                let inside = |x: char| (*lo..=*hi).contains(&x);
                let found = inside(c)
                    || (ic && (c.to_lowercase().any(inside) || c.to_uppercase().any(inside)));
                found.then(|| self.char_hit(i, c))
            }
            PatternKind::Test(f) => {
                let c = *self.src.get(i)?;
                let found = f(c)
                    || (ic && (c.to_lowercase().any(|x| f(x)) || c.to_uppercase().any(|x| f(x))));
                found.then(|| self.char_hit(i, c))
            }
            PatternKind::Map(pairs) => pairs.iter().find_map(|(key, value)| {
                self.lit_end(i, key, ic).map(|end| Hit {
                    end,
                    value: value.clone(),
                    deliver: true,
                })
            }),
            PatternKind::Val(v) => {
                let text = v.text();
                self.lit_hit(i, &text, ic)
            }
            PatternKind::Alt(items) => {
                for item in items {
                    if let Some(hit) = self.try_match(item, ic, out) {
                        return Some(hit);
                    }
                    if self.error.is_some() || self.end_state {
                        return None;
                    }
                    self.pos = i;
                }
                None
            }
            PatternKind::Sub(routine) => {
                let outcome = routine.invoke(self, out);
                if self.error.is_some() {
                    return None;
                }
                (outcome.is_ok() || self.end_state).then(|| Hit {
                    end: self.pos,
                    value: Value::String(self.matched_text(i, self.pos)),
                    deliver: false,
                })
            }
            PatternKind::Not(inner) => {
                let any = matches!(inner.kind(), PatternKind::Lit(s) if s.is_empty());
                if !any {
                    let hit = self.try_match(inner, ic, out);
                    self.pos = i;
                    if hit.is_some() || self.error.is_some() {
                        return None;
                    }
                }
                match self.src.get(i) {
                    Some(&c) => Some(Hit {
                        end: i + 1,
                        value: Value::String(c.to_string()),
                        deliver: !inner.has_sub(),
                    }),
                    None => Some(Hit {
                        end: (i + 1).min(len + 1),
                        value: Value::String(String::new()),
                        deliver: !inner.has_sub(),
                    }),
                }
            }
        }
    }

    fn char_hit(&self, i: usize, c: char) -> Hit {
        Hit {
            end: i + 1,
            value: Value::String(c.to_string()),
            deliver: true,
        }
    }

    fn lit_hit(&self, i: usize, s: &str, ic: bool) -> Option<Hit> {
        let end = self.lit_end(i, s, ic)?;
        Some(Hit {
            end,
            value: Value::String(self.matched_text(i, end)),
            deliver: true,
        })
    }

    /// End position if literal `s` matches at `i`. The empty literal matches
    /// anywhere, including past the end.
    fn lit_end(&self, i: usize, s: &str, ic: bool) -> Option<usize> {
        let mut k = i;
        let eq = |a: char, b: char| if ic { fold_eq(a, b) } else { a == b };
        if self.reversed {
            for want in s.chars().rev() {
                let got = *self.src.get(k)?;
                if !eq(want, got) {
                    return None;
                }
                k += 1;
            }
        } else {
            for want in s.chars() {
                let got = *self.src.get(k)?;
                if !eq(want, got) {
                    return None;
                }
                k += 1;
            }
        }
        Some(k)
    }
}

fn shift(pos: usize, by: isize) -> usize {
    if by < 0 {
        pos.saturating_sub(by.unsigned_abs())
    } else {
        pos.saturating_add(by as usize)
    }
}

impl fmt::Display for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parser(pos={}:'{}')", self.pos, self.context())
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
