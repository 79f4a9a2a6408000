//! Fluent chaining and the lookahead/backtrack state machine.
//!
//! Every chained operation returns a [`Branch`]: a borrow of the parser plus
//! the outcome of the chain so far. Once a chain has failed or ended, further
//! operations are absorbed without touching the cursor or any sink.
//!
//! Open blocks (`if_`, `lookahead`) push a [`Frame`] with the position to
//! restore. While a chain is not live, nested block openers only count depth
//! so that the matching closer resolves the right frame.
//!
//! # Example
//!
//! ```
//! use parsek::engine::{new_list, Parser, Sink};
//!
//! let l = new_list();
//! let mut p = Parser::new("c.!");
//! let ok = p
//!     .lookahead().one('a', &l)
//!     .alt()
//!         .lookahead().one('b', &l)
//!         .alt().one('c', &l)
//!         .merge()
//!     .merge()
//!     .is_ok();
//! assert!(ok);
//! assert_eq!(p.pos(), 1);
//! assert!(p.lookahead_stack().is_empty());
//! ```

use super::error::{Nomatch, OnErr, ParseError};
use super::parser::{OneCtx, Parser, Step};
use super::pattern::Pattern;
use super::quantifier::Quantifier;
use super::sink::Sink;
use super::trace::ENGINE_TRACE_LEVEL;
use super::val::Val;
use super::value::Value;
use std::fmt;
use std::panic::Location;

/// One open lookahead block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Frame {
    /// Position restored on backtrack
    pub pos: usize,
    /// The block has entered its `else_` branch
    pub else_taken: bool,
}

/// Chain state. `depth` counts blocks opened while the chain was not live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    Ok,
    Fail { depth: usize },
    Taken { depth: usize },
    Back { depth: usize, ok: bool, commit: bool },
    End,
}

/// The result of a chain, detached from the parser borrow.
///
/// Subroutine bodies and `do_` closures return this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Matched
    Ok,
    /// Did not match
    Fail,
    /// The parse was ended
    End,
    /// Explicit backtrack (`back`) or commit (`break_`), reporting not-ok
    Back {
        /// Keep the position instead of restoring it
        commit: bool,
    },
    /// Explicit backtrack (`back_ok`) or commit (`continue_`), reporting ok
    BackOk {
        /// Keep the position instead of restoring it
        commit: bool,
    },
}

impl Outcome {
    /// Whether this outcome counts as success
    pub fn is_ok(self) -> bool {
        matches!(self, Outcome::Ok | Outcome::End | Outcome::BackOk { .. })
    }
}

impl From<bool> for Outcome {
    fn from(ok: bool) -> Self {
        if ok {
            Outcome::Ok
        } else {
            Outcome::Fail
        }
    }
}

impl From<()> for Outcome {
    fn from(_: ()) -> Self {
        Outcome::Ok
    }
}

impl From<Branch<'_>> for Outcome {
    fn from(b: Branch<'_>) -> Self {
        b.outcome()
    }
}

/// A chain in progress
pub struct Branch<'p> {
    p: &'p mut Parser,
    state: State,
}

impl<'p> Branch<'p> {
    /// Start a chain: live, or ended if the parser is in end state
    pub fn new(p: &'p mut Parser) -> Self {
        let state = if p.end_state { State::End } else { State::Ok };
        Branch { p, state }
    }

    #[inline]
    fn live(&self) -> bool {
        self.state == State::Ok && self.p.error.is_none()
    }

    fn apply(mut self, step: Step) -> Self {
        self.state = match step {
            Step::Ok => State::Ok,
            Step::Fail => State::Fail { depth: 0 },
            Step::End => State::End,
        };
        self
    }

    fn failed(mut self) -> Self {
        self.state = State::Fail { depth: 0 };
        self
    }

    fn require_frame(&self) {
        if self.p.config.debug_checks && self.p.frames.is_empty() {
            panic!("Lookahead stack is empty");
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Whether the chain succeeded so far
    pub fn is_ok(&self) -> bool {
        if self.p.error.is_some() {
            return false;
        }
        match self.state {
            State::Ok | State::Taken { .. } | State::End => true,
            State::Fail { .. } => false,
            State::Back { ok, .. } => ok,
        }
    }

    /// Whether further operations would run
    pub fn is_active(&self) -> bool {
        self.live()
    }

    /// The chain's outcome
    pub fn outcome(&self) -> Outcome {
        if self.p.error.is_some() {
            return Outcome::Fail;
        }
        match self.state {
            State::Ok | State::Taken { .. } => Outcome::Ok,
            State::Fail { .. } => Outcome::Fail,
            State::End => Outcome::End,
            State::Back { ok: false, commit, .. } => Outcome::Back { commit },
            State::Back { ok: true, commit, .. } => Outcome::BackOk { commit },
        }
    }

    /// Finish the chain: the pending hard error, or whether it succeeded
    pub fn result(self) -> Result<bool, ParseError> {
        let ok = self.is_ok();
        match self.p.take_error() {
            Some(err) => Err(err),
            None => Ok(ok),
        }
    }

    /// The parser behind this chain
    pub fn parser(&self) -> &Parser {
        self.p
    }

    /// Mutable access to the parser behind this chain
    pub fn parser_mut(&mut self) -> &mut Parser {
        self.p
    }

    /// Cursor position
    pub fn pos(&self) -> usize {
        self.p.pos
    }

    // ========================================================================
    // Matching
    // ========================================================================

    /// Match `pat` and deliver the match to `sink`
    #[track_caller]
    pub fn one(self, pat: impl Into<Pattern>, sink: impl Into<Sink>) -> Self {
        self.one_with(pat, sink, &OneCtx::default())
    }

    /// Case-insensitive [`one`](Self::one)
    #[track_caller]
    pub fn one_ic(self, pat: impl Into<Pattern>, sink: impl Into<Sink>) -> Self {
        self.one_with(pat, sink, &OneCtx::new().ic())
    }

    /// [`one`](Self::one) with an action on a miss: a message raises, a
    /// callback is invoked before failing
    #[track_caller]
    pub fn one_or(
        self,
        pat: impl Into<Pattern>,
        sink: impl Into<Sink>,
        nomatch: impl Into<Nomatch>,
    ) -> Self {
        self.one_with(pat, sink, &OneCtx::new().nomatch(nomatch))
    }

    /// [`one`](Self::one) with full options
    #[track_caller]
    pub fn one_with(self, pat: impl Into<Pattern>, sink: impl Into<Sink>, ctx: &OneCtx) -> Self {
        if !self.live() {
            return self;
        }
        let (pat, sink) = (pat.into(), sink.into());
        let step = self.p.one_step(&pat, &sink, ctx);
        self.apply(step)
    }

    /// Match and deliver like [`one`](Self::one), then restore the position.
    ///
    /// A subroutine that ended the parse keeps its position.
    #[track_caller]
    pub fn peek(self, pat: impl Into<Pattern>, sink: impl Into<Sink>) -> Self {
        if !self.live() {
            return self;
        }
        let (pat, sink) = (pat.into(), sink.into());
        let start = self.p.pos;
        let step = self.p.one_step(&pat, &sink, &OneCtx::default());
        if !self.p.end_state {
            self.p.pos = start;
        }
        self.apply(step)
    }

    /// Match `pat` against the text just before the cursor, without moving
    #[track_caller]
    pub fn behind(self, pat: impl Into<Pattern>, sink: impl Into<Sink>) -> Self {
        self.behind_with(pat, sink, &OneCtx::default())
    }

    /// Case-insensitive [`behind`](Self::behind)
    #[track_caller]
    pub fn behind_ic(self, pat: impl Into<Pattern>, sink: impl Into<Sink>) -> Self {
        self.behind_with(pat, sink, &OneCtx::new().ic())
    }

    /// [`behind`](Self::behind) with full options
    #[track_caller]
    pub fn behind_with(
        self,
        pat: impl Into<Pattern>,
        sink: impl Into<Sink>,
        ctx: &OneCtx,
    ) -> Self {
        if !self.live() {
            return self;
        }
        let (pat, sink) = (pat.into(), sink.into());
        let step = self.p.behind_step(&pat, &sink, ctx);
        self.apply(step)
    }

    // ========================================================================
    // Quantifiers
    // ========================================================================

    /// Match `pat` between `min` and `max` times (`None` for unbounded)
    pub fn repeat(
        self,
        min: usize,
        max: impl Into<Option<usize>>,
        pat: impl Into<Pattern>,
        sink: impl Into<Sink>,
    ) -> Self {
        self.quantify(Quantifier::new(min, max.into()), pat, sink, ())
    }

    /// Case-insensitive [`repeat`](Self::repeat)
    pub fn repeat_ic(
        self,
        min: usize,
        max: impl Into<Option<usize>>,
        pat: impl Into<Pattern>,
        sink: impl Into<Sink>,
    ) -> Self {
        self.quantify(Quantifier::new(min, max.into()).ic(), pat, sink, ())
    }

    /// Run a quantifier. `sink` receives every iteration; `acc` receives the
    /// whole consumed slice once, on success with at least one iteration.
    pub fn quantify(
        self,
        q: Quantifier,
        pat: impl Into<Pattern>,
        sink: impl Into<Sink>,
        acc: impl Into<Sink>,
    ) -> Self {
        if !self.live() {
            return self;
        }
        let (pat, sink, acc) = (pat.into(), sink.into(), acc.into());
        let step = self.p.repeat_step(&q, &pat, &sink, &acc);
        self.apply(step)
    }

    /// Run the quantifier named like `"two_to_five_ic"` or `"x2_3i"`.
    ///
    /// An unrecognized name raises [`ParseError::UnknownQuantifier`].
    pub fn times(self, name: &str, pat: impl Into<Pattern>, sink: impl Into<Sink>) -> Self {
        self.times_into(name, pat, sink, ())
    }

    /// [`times`](Self::times) with a block sink
    pub fn times_into(
        self,
        name: &str,
        pat: impl Into<Pattern>,
        sink: impl Into<Sink>,
        acc: impl Into<Sink>,
    ) -> Self {
        if !self.live() {
            return self;
        }
        match Quantifier::lookup(name) {
            Ok(q) => self.quantify(q, pat, sink, acc),
            Err(e) => {
                self.p.raise(e);
                self.failed()
            }
        }
    }

    /// Zero or one
    pub fn zero_or_one(self, pat: impl Into<Pattern>, sink: impl Into<Sink>) -> Self {
        self.repeat(0, 1, pat, sink)
    }

    /// Zero or one, case-insensitive
    pub fn zero_or_one_ic(self, pat: impl Into<Pattern>, sink: impl Into<Sink>) -> Self {
        self.repeat_ic(0, 1, pat, sink)
    }

    /// Zero or more
    pub fn zero_or_more(self, pat: impl Into<Pattern>, sink: impl Into<Sink>) -> Self {
        self.repeat(0, None, pat, sink)
    }

    /// Zero or more, case-insensitive
    pub fn zero_or_more_ic(self, pat: impl Into<Pattern>, sink: impl Into<Sink>) -> Self {
        self.repeat_ic(0, None, pat, sink)
    }

    /// One or more
    pub fn one_or_more(self, pat: impl Into<Pattern>, sink: impl Into<Sink>) -> Self {
        self.repeat(1, None, pat, sink)
    }

    /// One or more, case-insensitive
    pub fn one_or_more_ic(self, pat: impl Into<Pattern>, sink: impl Into<Sink>) -> Self {
        self.repeat_ic(1, None, pat, sink)
    }

    /// At least `n`
    pub fn at_least(self, n: usize, pat: impl Into<Pattern>, sink: impl Into<Sink>) -> Self {
        self.repeat(n, None, pat, sink)
    }

    /// At least `n`, case-insensitive
    pub fn at_least_ic(self, n: usize, pat: impl Into<Pattern>, sink: impl Into<Sink>) -> Self {
        self.repeat_ic(n, None, pat, sink)
    }

    /// At most `n`
    pub fn at_most(self, n: usize, pat: impl Into<Pattern>, sink: impl Into<Sink>) -> Self {
        self.repeat(0, n, pat, sink)
    }

    /// At most `n`, case-insensitive
    pub fn at_most_ic(self, n: usize, pat: impl Into<Pattern>, sink: impl Into<Sink>) -> Self {
        self.repeat_ic(0, n, pat, sink)
    }

    /// Exactly `n`
    pub fn exactly(self, n: usize, pat: impl Into<Pattern>, sink: impl Into<Sink>) -> Self {
        self.repeat(n, n, pat, sink)
    }

    /// Exactly `n`, case-insensitive
    pub fn exactly_ic(self, n: usize, pat: impl Into<Pattern>, sink: impl Into<Sink>) -> Self {
        self.repeat_ic(n, n, pat, sink)
    }

    // ========================================================================
    // Blocks
    // ========================================================================

    fn open(mut self) -> Self {
        self.state = match self.state {
            State::Ok if self.p.error.is_none() => {
                let pos = self.p.pos;
                self.p.frames.push(Frame {
                    pos,
                    else_taken: false,
                });
                State::Ok
            }
            State::Fail { depth } => State::Fail { depth: depth + 1 },
            State::Taken { depth } => State::Taken { depth: depth + 1 },
            State::Back { depth, ok, commit } => State::Back {
                depth: depth + 1,
                ok,
                commit,
            },
            other => other,
        };
        self
    }

    fn next_branch(mut self, is_else: bool) -> Self {
        if self.p.error.is_some() {
            return self;
        }
        self.state = match self.state {
            State::Ok => State::Taken { depth: 0 },
            State::Fail { depth: 0 } => {
                self.require_frame();
                if let Some(frame) = self.p.frames.last_mut() {
                    frame.else_taken |= is_else;
                    self.p.pos = frame.pos;
                }
                State::Ok
            }
            other => other,
        };
        self
    }

    fn close(mut self, merging: bool) -> Self {
        if self.p.error.is_some() {
            return self;
        }
        self.state = match self.state {
            State::Ok | State::Taken { depth: 0 } => {
                self.require_frame();
                self.p.frames.pop();
                State::Ok
            }
            State::Taken { depth } => State::Taken { depth: depth - 1 },
            State::Fail { depth: 0 } => {
                self.require_frame();
                match self.p.frames.pop() {
                    Some(frame) if merging => {
                        self.p.pos = frame.pos;
                        State::Fail { depth: 0 }
                    }
                    Some(frame) if frame.else_taken => State::Fail { depth: 0 },
                    Some(frame) => {
                        self.p.pos = frame.pos;
                        State::Ok
                    }
                    None => State::Fail { depth: 0 },
                }
            }
            State::Fail { depth } => State::Fail { depth: depth - 1 },
            State::Back {
                depth: 0,
                ok,
                commit,
            } => {
                self.require_frame();
                if let Some(frame) = self.p.frames.pop() {
                    if !commit && !frame.else_taken {
                        self.p.pos = frame.pos;
                    }
                }
                State::Back {
                    depth: 0,
                    ok,
                    commit,
                }
            }
            State::Back { depth, ok, commit } => State::Back {
                depth: depth - 1,
                ok,
                commit,
            },
            State::End => State::End,
        };
        self
    }

    fn stop(mut self, ok: bool, commit: bool) -> Self {
        if self.live() {
            self.require_frame();
            self.state = State::Back {
                depth: 0,
                ok,
                commit,
            };
        }
        self
    }

    /// Open a conditional block
    #[track_caller]
    pub fn if_(self) -> Self {
        self.trace_branch("if_");
        self.open()
    }

    /// Try another condition if every previous branch failed
    #[track_caller]
    pub fn elif_(self) -> Self {
        self.trace_branch("elif_");
        self.next_branch(false)
    }

    /// Final branch; if it fails too the whole block fails
    #[track_caller]
    pub fn else_(self) -> Self {
        self.trace_branch("else_");
        self.next_branch(true)
    }

    /// Close a conditional block.
    ///
    /// With no matching branch and no `else_`, the block is a no-op that
    /// restores the position and reports success.
    #[track_caller]
    pub fn endif(self) -> Self {
        self.trace_branch("endif");
        self.close(false)
    }

    /// Open an alternation block
    #[track_caller]
    pub fn lookahead(self) -> Self {
        self.trace_branch("lookahead");
        self.open()
    }

    /// Next alternative, tried from the block start if the previous one failed
    #[track_caller]
    pub fn alt(self) -> Self {
        self.trace_branch("alt");
        self.next_branch(false)
    }

    /// Close an alternation block; fails if no alternative matched
    #[track_caller]
    pub fn merge(self) -> Self {
        self.trace_branch("merge");
        self.close(true)
    }

    /// Close the innermost block keeping the position
    pub fn commit(self) -> Self {
        if self.live() {
            self.require_frame();
            self.p.frames.pop();
        }
        self
    }

    /// Close the innermost block restoring its position
    pub fn backtrack(self) -> Self {
        if self.live() {
            self.require_frame();
            if let Some(frame) = self.p.frames.pop() {
                self.p.pos = frame.pos;
            }
        }
        self
    }

    /// Abandon the block: restore its position and report not-ok
    pub fn back(self) -> Self {
        self.stop(false, false)
    }

    /// Abandon the block: restore its position but report ok
    pub fn back_ok(self) -> Self {
        self.stop(true, false)
    }

    /// Leave the block keeping the position, reporting not-ok
    pub fn break_(self) -> Self {
        self.stop(false, true)
    }

    /// Leave the block keeping the position, reporting ok
    pub fn continue_(self) -> Self {
        self.stop(true, true)
    }

    // ========================================================================
    // Conditions and actions
    // ========================================================================

    /// Fail unconditionally
    pub fn fail(self) -> Self {
        if self.live() {
            self.failed()
        } else {
            self
        }
    }

    /// Fail if `cond` holds
    pub fn fail_if(self, cond: bool) -> Self {
        if self.live() && cond {
            self.failed()
        } else {
            self
        }
    }

    /// Fail if `f` returns true; `f` is not called on an inactive chain
    pub fn fail_when(self, f: impl FnOnce() -> bool) -> Self {
        if self.live() && f() {
            self.failed()
        } else {
            self
        }
    }

    /// Fail unless `f` returns true
    pub fn check(self, f: impl FnOnce() -> bool) -> Self {
        if self.live() && !f() {
            self.failed()
        } else {
            self
        }
    }

    /// Transform the box in place, then fail unless it is truthy
    pub fn check_val(self, val: &Val, f: impl FnOnce(Value) -> Value) -> Self {
        if !self.live() {
            return self;
        }
        val.apply(f);
        if val.is_truthy() {
            self
        } else {
            self.failed()
        }
    }

    /// Run `f` with the parser; its result decides how the chain continues
    #[track_caller]
    pub fn do_<R: Into<Outcome>>(mut self, f: impl FnOnce(&mut Parser) -> R) -> Self {
        if !self.live() {
            return self;
        }
        self.trace_branch("do");
        let outcome = f(&mut *self.p).into();
        if self.p.error.is_some() {
            return self.failed();
        }
        self.state = match outcome {
            Outcome::Ok => State::Ok,
            Outcome::Fail => State::Fail { depth: 0 },
            Outcome::End => {
                if self.p.end_state {
                    State::End
                } else {
                    State::Ok
                }
            }
            Outcome::Back { commit } => State::Back {
                depth: 0,
                ok: false,
                commit,
            },
            Outcome::BackOk { commit } => State::Back {
                depth: 0,
                ok: true,
                commit,
            },
        };
        self
    }

    /// [`do_`](Self::do_) if `cond` holds
    #[track_caller]
    pub fn do_if<R: Into<Outcome>>(self, cond: bool, f: impl FnOnce(&mut Parser) -> R) -> Self {
        if cond {
            self.do_(f)
        } else {
            self
        }
    }

    /// Deliver `value` to `sink`
    pub fn accumulate(self, sink: impl Into<Sink>, value: impl Into<Value>) -> Self {
        if !self.live() {
            return self;
        }
        let sink = sink.into();
        if self.p.deliver(&sink, value.into()) {
            self
        } else {
            self.failed()
        }
    }

    // ========================================================================
    // Errors
    // ========================================================================

    /// Raise a syntax error at the cursor
    pub fn err(self, msg: &str) -> Self {
        if !self.live() {
            return self;
        }
        let e = self.p.syntax_error(msg);
        self.p.raise(e);
        self.failed()
    }

    /// Call `f` with the parser, then fail
    pub fn err_call(self, f: impl FnOnce(&mut Parser)) -> Self {
        if !self.live() {
            return self;
        }
        f(&mut *self.p);
        self.failed()
    }

    /// Raise a syntax error at the cursor if `cond` holds
    pub fn err_if(self, cond: bool, msg: &str) -> Self {
        if cond {
            self.err(msg)
        } else {
            self
        }
    }

    /// Report `msg` through `on_err`: ignore it, raise it, or hand it to a
    /// callback. The chain fails in every case.
    pub fn on_err(self, on_err: &OnErr, msg: &str) -> Self {
        if !self.live() {
            return self;
        }
        match on_err {
            OnErr::None => self.failed(),
            OnErr::Raise => self.err(msg),
            OnErr::Handler(f) => {
                f(&mut *self.p, msg);
                self.failed()
            }
        }
    }

    // ========================================================================
    // Cursor
    // ========================================================================

    /// Enter the terminal End state and drop every open frame
    #[track_caller]
    pub fn end(mut self) -> Self {
        if self.live() {
            self.trace_branch("end");
            self.p.end_state = true;
            self.p.frames.clear();
            self.state = State::End;
        }
        self
    }

    /// Advance `n` characters (see [`Parser::next`])
    pub fn next(self, n: usize) -> Self {
        if self.live() {
            self.p.next(n);
        }
        self
    }

    /// Suppress the next advance
    pub fn skip(self) -> Self {
        if self.live() {
            self.p.skip();
        }
        self
    }

    /// Remember the position under `key`
    pub fn save_pos(self, key: &str) -> Self {
        if self.live() {
            self.p.save_pos(key);
        }
        self
    }

    /// Deliver the text from saved position `key` to the cursor.
    ///
    /// With `pop` the saved position is removed. A missing key is reported
    /// through `on_err` as [`ParseError::PositionNotFound`].
    pub fn copy(self, key: &str, sink: impl Into<Sink>, pop: bool, on_err: &OnErr) -> Self {
        if !self.live() {
            return self;
        }
        let start = if pop {
            self.p.pop_pos(key)
        } else {
            self.p.saved_pos(key)
        };
        match start {
            Some(start) => {
                let text = self.p.slice_from(start);
                self.accumulate(sink, text)
            }
            None => {
                let e = ParseError::PositionNotFound {
                    key: key.to_string(),
                };
                match on_err {
                    OnErr::None => self.failed(),
                    OnErr::Raise => {
                        self.p.raise(e);
                        self.failed()
                    }
                    OnErr::Handler(f) => {
                        f(&mut *self.p, &e.to_string());
                        self.failed()
                    }
                }
            }
        }
    }

    /// Emit a trace line at `level`
    #[track_caller]
    pub fn trace(self, level: u8, msg: &str) -> Self {
        if self.p.config.trace.enabled(level) {
            self.p
                .config
                .trace
                .emit(level, Some(Location::caller()), msg);
        }
        self
    }

    #[track_caller]
    fn trace_branch(&self, what: &str) {
        self.p.trace_with(ENGINE_TRACE_LEVEL, || {
            format!("{} {:?} at {}", what, self.state, self.p.pos)
        });
    }
}

impl fmt::Display for Branch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome() {
            Outcome::Ok => write!(f, "Ok({})", self.p),
            Outcome::Fail => write!(f, "Fail(parent={})", self.p),
            Outcome::End => write!(f, "End({})", self.p),
            Outcome::Back { .. } => write!(f, "Back({})", self.p),
            Outcome::BackOk { .. } => write!(f, "BackOk({})", self.p),
        }
    }
}

impl fmt::Debug for Branch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

// Every chained operation is also available on the parser, starting a fresh
// chain.
macro_rules! start_chain {
    ($( $(#[$meta:meta])* fn $name:ident $(<$g:ident: $bound:path>)? ( $($arg:ident : $ty:ty),* ); )*) => {
        impl Parser {
            $(
                $(#[$meta])*
                #[track_caller]
                pub fn $name $(<$g: $bound>)? (&mut self, $($arg: $ty),*) -> Branch<'_> {
                    Branch::new(self).$name($($arg),*)
                }
            )*
        }
    };
}

start_chain! {
    /// See [`Branch::one`]
    fn one(pat: impl Into<Pattern>, sink: impl Into<Sink>);
    /// See [`Branch::one_ic`]
    fn one_ic(pat: impl Into<Pattern>, sink: impl Into<Sink>);
    /// See [`Branch::one_or`]
    fn one_or(pat: impl Into<Pattern>, sink: impl Into<Sink>, nomatch: impl Into<Nomatch>);
    /// See [`Branch::one_with`]
    fn one_with(pat: impl Into<Pattern>, sink: impl Into<Sink>, ctx: &OneCtx);
    /// See [`Branch::peek`]
    fn peek(pat: impl Into<Pattern>, sink: impl Into<Sink>);
    /// See [`Branch::behind`]
    fn behind(pat: impl Into<Pattern>, sink: impl Into<Sink>);
    /// See [`Branch::behind_ic`]
    fn behind_ic(pat: impl Into<Pattern>, sink: impl Into<Sink>);
    /// See [`Branch::behind_with`]
    fn behind_with(pat: impl Into<Pattern>, sink: impl Into<Sink>, ctx: &OneCtx);
    /// See [`Branch::repeat`]
    fn repeat(min: usize, max: impl Into<Option<usize>>, pat: impl Into<Pattern>, sink: impl Into<Sink>);
    /// See [`Branch::repeat_ic`]
    fn repeat_ic(min: usize, max: impl Into<Option<usize>>, pat: impl Into<Pattern>, sink: impl Into<Sink>);
    /// See [`Branch::quantify`]
    fn quantify(q: Quantifier, pat: impl Into<Pattern>, sink: impl Into<Sink>, acc: impl Into<Sink>);
    /// See [`Branch::times`]
    fn times(name: &str, pat: impl Into<Pattern>, sink: impl Into<Sink>);
    /// See [`Branch::times_into`]
    fn times_into(name: &str, pat: impl Into<Pattern>, sink: impl Into<Sink>, acc: impl Into<Sink>);
    /// See [`Branch::zero_or_one`]
    fn zero_or_one(pat: impl Into<Pattern>, sink: impl Into<Sink>);
    /// See [`Branch::zero_or_one_ic`]
    fn zero_or_one_ic(pat: impl Into<Pattern>, sink: impl Into<Sink>);
    /// See [`Branch::zero_or_more`]
    fn zero_or_more(pat: impl Into<Pattern>, sink: impl Into<Sink>);
    /// See [`Branch::zero_or_more_ic`]
    fn zero_or_more_ic(pat: impl Into<Pattern>, sink: impl Into<Sink>);
    /// See [`Branch::one_or_more`]
    fn one_or_more(pat: impl Into<Pattern>, sink: impl Into<Sink>);
    /// See [`Branch::one_or_more_ic`]
    fn one_or_more_ic(pat: impl Into<Pattern>, sink: impl Into<Sink>);
    /// See [`Branch::at_least`]
    fn at_least(n: usize, pat: impl Into<Pattern>, sink: impl Into<Sink>);
    /// See [`Branch::at_least_ic`]
    fn at_least_ic(n: usize, pat: impl Into<Pattern>, sink: impl Into<Sink>);
    /// See [`Branch::at_most`]
    fn at_most(n: usize, pat: impl Into<Pattern>, sink: impl Into<Sink>);
    /// See [`Branch::at_most_ic`]
    fn at_most_ic(n: usize, pat: impl Into<Pattern>, sink: impl Into<Sink>);
    /// See [`Branch::exactly`]
    fn exactly(n: usize, pat: impl Into<Pattern>, sink: impl Into<Sink>);
    /// See [`Branch::exactly_ic`]
    fn exactly_ic(n: usize, pat: impl Into<Pattern>, sink: impl Into<Sink>);
    /// See [`Branch::if_`]
    fn if_();
    /// See [`Branch::elif_`]
    fn elif_();
    /// See [`Branch::else_`]
    fn else_();
    /// See [`Branch::endif`]
    fn endif();
    /// See [`Branch::lookahead`]
    fn lookahead();
    /// See [`Branch::alt`]
    fn alt();
    /// See [`Branch::merge`]
    fn merge();
    /// See [`Branch::commit`]
    fn commit();
    /// See [`Branch::backtrack`]
    fn backtrack();
    /// See [`Branch::back`]
    fn back();
    /// See [`Branch::back_ok`]
    fn back_ok();
    /// See [`Branch::break_`]
    fn break_();
    /// See [`Branch::continue_`]
    fn continue_();
    /// See [`Branch::fail`]
    fn fail();
    /// See [`Branch::fail_if`]
    fn fail_if(cond: bool);
    /// See [`Branch::fail_when`]
    fn fail_when(f: impl FnOnce() -> bool);
    /// See [`Branch::check`]
    fn check(f: impl FnOnce() -> bool);
    /// See [`Branch::check_val`]
    fn check_val(val: &Val, f: impl FnOnce(Value) -> Value);
    /// See [`Branch::do_`]
    fn do_<R: Into<Outcome>>(f: impl FnOnce(&mut Parser) -> R);
    /// See [`Branch::do_if`]
    fn do_if<R: Into<Outcome>>(cond: bool, f: impl FnOnce(&mut Parser) -> R);
    /// See [`Branch::accumulate`]
    fn accumulate(sink: impl Into<Sink>, value: impl Into<Value>);
    /// See [`Branch::err`]
    fn err(msg: &str);
    /// See [`Branch::err_call`]
    fn err_call(f: impl FnOnce(&mut Parser));
    /// See [`Branch::err_if`]
    fn err_if(cond: bool, msg: &str);
    /// See [`Branch::on_err`]
    fn on_err(on_err: &OnErr, msg: &str);
    /// See [`Branch::end`]
    fn end();
    /// See [`Branch::copy`]
    fn copy(key: &str, sink: impl Into<Sink>, pop: bool, on_err: &OnErr);
    /// See [`Branch::trace`]
    fn trace(level: u8, msg: &str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::sink::new_list;

    fn strings(l: &crate::engine::sink::List) -> Vec<String> {
        l.borrow().iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_if_without_match_is_noop() {
        let mut p = Parser::new("a3!");
        let l = new_list();
        let ok = p.if_().one('!', &l).endif().is_ok();
        assert!(ok);
        assert_eq!(p.pos(), 0);
        assert!(p.lookahead_stack().is_empty());
    }

    #[test]
    fn test_if_else_fails_when_nothing_matches() {
        let mut p = Parser::new("a3!");
        let l = new_list();
        let ok = p.if_().one('x', &l).else_().one('y', &l).endif().is_ok();
        assert!(!ok);
        assert_eq!(p.pos(), 0);
        assert!(strings(&l).is_empty());
        assert!(p.lookahead_stack().is_empty());
    }

    #[test]
    fn test_back_restores_through_levels() {
        let mut p = Parser::new("ab!");
        let l = new_list();
        let b = p.if_().one('a', &l).if_().one('b', &l).back().endif().endif();
        assert!(!b.is_ok());
        assert_eq!(p.pos(), 0);
        assert_eq!(strings(&l), vec!["a", "b"]);
        assert!(p.lookahead_stack().is_empty());
    }

    #[test]
    fn test_break_commits() {
        let mut p = Parser::new("ab!");
        let l = new_list();
        let b = p.if_().one('a', &l).if_().one('b', &l).break_().endif().endif();
        assert!(!b.is_ok());
        assert_eq!(p.pos(), 2);
        assert!(p.lookahead_stack().is_empty());
    }

    #[test]
    fn test_continue_after_nested_open() {
        let mut p = Parser::new("ab!");
        let b = p.if_().one('a', ()).continue_().if_().endif().endif();
        assert!(b.is_ok());
        assert_eq!(p.pos(), 1);
        assert!(p.lookahead_stack().is_empty());
    }

    #[test]
    fn test_alt_shunts_after_success() {
        let mut p = Parser::new("a3!");
        let l = new_list();
        let ok = p
            .lookahead()
            .one('a', &l)
            .alt()
            .do_(|_| -> bool { panic!("shunted branch must not run") })
            .merge()
            .is_ok();
        assert!(ok);
        assert_eq!(strings(&l), vec!["a"]);
        assert_eq!(p.pos(), 1);
    }

    #[test]
    fn test_lookahead_fail_keeps_frame() {
        let mut p = Parser::new("a3!");
        let ok = p.lookahead().one('x', ()).backtrack().is_ok();
        assert!(!ok);
        assert_eq!(p.lookahead_stack(), vec![0]);
        p.backtrack();
        assert!(p.lookahead_stack().is_empty());
    }

    #[test]
    fn test_end_absorbs() {
        let mut p = Parser::new("abc");
        assert!(p.one("abc", ()).end().is_ok());
        let b = p.one('x', ());
        assert!(b.is_ok());
        assert!(!b.is_active());
        assert_eq!(b.outcome(), Outcome::End);
        assert_eq!(p.back().outcome(), Outcome::End);
    }

    #[test]
    fn test_fail_display() {
        let mut p = Parser::new("abc");
        let b = p.one('b', ());
        assert_eq!(b.to_string(), "Fail(parent=Parser(pos=0:'a\u{332}bc'))");
    }

    #[test]
    fn test_do_outcomes() {
        let mut p = Parser::new("xy");
        p.lookahead().one('x', ());
        let b = p.do_(|_| Outcome::Back { commit: false }).endif();
        assert_eq!(b.outcome(), Outcome::Back { commit: false });
        assert_eq!(p.pos(), 0);
        assert!(p.lookahead_stack().is_empty());

        let mut p = Parser::new("x");
        assert!(!p.do_(|p| p.fail().outcome()).is_ok());
        assert!(p.do_(|_| ()).is_ok());
        assert!(!p.do_(|_| false).is_ok());
    }

    #[test]
    fn test_err_and_result() {
        let mut p = Parser::new("hello world");
        p.next(6);
        let r = p.err("TestError").result();
        match r {
            Err(e) => assert_eq!(e.to_string(), "TestError at: hello w\u{332}orld"),
            Ok(_) => panic!("expected an error"),
        }
        assert!(p.error().is_none());
    }

    #[test]
    fn test_error_absorbs_chain() {
        let mut p = Parser::new("abc");
        let l = new_list();
        let b = p.one_or('x', (), "nope").one('a', &l);
        assert!(!b.is_ok());
        assert!(strings(&l).is_empty());
        assert_eq!(
            p.take_error().map(|e| e.to_string()),
            Some("nope at: a\u{332}bc".to_string())
        );
        assert!(p.one('a', &l).is_ok());
    }

    #[test]
    fn test_on_err_handler_sees_parser() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let got = Rc::new(RefCell::new(Vec::new()));
        let sink = got.clone();
        let report = OnErr::handler(move |p, m| sink.borrow_mut().push(format!("{}@{}", m, p.pos())));
        let mut p = Parser::new("abc");
        assert!(!p.one('a', ()).one('b', ()).on_err(&report, "missing c").is_ok());
        assert!(p.error().is_none());
        assert_eq!(*got.borrow(), ["missing c@2"]);
    }

    #[test]
    fn test_error_inside_block_drops_frames() {
        let mut p = Parser::new("abc");
        let b = p.if_().one_or('x', (), "boom").endif();
        assert!(!b.is_ok());
        assert_eq!(p.lookahead_stack(), vec![0]);
        assert!(p.take_error().is_some());
        assert!(p.lookahead_stack().is_empty());
        assert!(!p.is_backtrackable());

        let mut p = Parser::new("abc");
        let err = p.lookahead().one('a', ()).err("bad").alt().merge().result();
        assert!(err.is_err());
        assert!(!p.is_backtrackable());
        p.set_pos(0);
        assert!(p.lookahead().one('a', ()).merge().is_ok());
        assert_eq!(p.pos(), 1);
    }

    #[test]
    #[should_panic(expected = "Lookahead stack is empty")]
    fn test_backtrack_after_taken_error_panics_with_checks() {
        let mut p = Parser::with_config(
            "abc",
            crate::engine::parser::ParserConfig::new().with_debug_checks(true),
        );
        let _ = p.if_().one_or('x', (), "boom").endif();
        let _ = p.take_error();
        let _ = p.one('x', ()).alt();
    }

    #[test]
    #[should_panic(expected = "Lookahead stack is empty")]
    fn test_alt_without_frame_panics_with_checks() {
        let mut p = Parser::with_config(
            "a",
            crate::engine::parser::ParserConfig::new().with_debug_checks(true),
        );
        let _ = p.one('x', ()).alt();
    }
}
