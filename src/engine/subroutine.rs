//! Named, reusable parse routines.
//!
//! A [`Subroutine`] is used as a [`Pattern`](super::pattern::Pattern): the
//! positional sink of the calling `one` is handed to the body, which decides
//! what to deliver. The `acc` sink of the call receives the consumed slice.

use super::branch::Outcome;
use super::parser::Parser;
use super::sink::Sink;
use super::trace::ENGINE_TRACE_LEVEL;
use std::fmt;
use std::rc::Rc;

type Body = Rc<dyn Fn(&mut Parser, &Sink, &Subroutine) -> Outcome>;

/// A parse routine
///
/// # Example
///
/// ```
/// use parsek::engine::{new_list, Parser, Subroutine};
///
/// let pair = Subroutine::new(|p, out| p.one('(', ()).one('a', out).one(')', ()).into());
/// let l = new_list();
/// let mut p = Parser::new("(a)");
/// assert!(p.one(&pair, &l).is_ok());
/// assert_eq!(l.borrow().len(), 1);
/// ```
#[derive(Clone)]
pub struct Subroutine {
    body: Body,
    isolated: bool,
    name: Rc<str>,
}

impl Subroutine {
    /// Wrap a routine
    pub fn new(f: impl Fn(&mut Parser, &Sink) -> Outcome + 'static) -> Self {
        Self::recursive(move |p, out, _| f(p, out))
    }

    /// Wrap a routine that receives itself, for recursive grammars
    pub fn recursive(f: impl Fn(&mut Parser, &Sink, &Subroutine) -> Outcome + 'static) -> Self {
        Self {
            body: Rc::new(f),
            isolated: false,
            name: Rc::from("sub"),
        }
    }

    /// Run with a fresh lookahead stack, restored afterwards
    pub fn isolated(mut self) -> Self {
        self.isolated = true;
        self
    }

    /// Set the name shown in traces and pattern displays
    pub fn named(mut self, name: &str) -> Self {
        self.name = Rc::from(name);
        self
    }

    /// The routine's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the routine runs with its own lookahead stack
    pub fn is_isolated(&self) -> bool {
        self.isolated
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Subroutine) -> bool {
        Rc::ptr_eq(&self.body, &other.body)
    }

    /// Run the routine at the cursor.
    ///
    /// A hard error raised inside puts the cursor back where the call began.
    #[track_caller]
    pub(crate) fn invoke(&self, p: &mut Parser, out: &Sink) -> Outcome {
        let start = p.pos;
        p.trace_with(ENGINE_TRACE_LEVEL, || {
            format!("sub {} at {}", self.name, p.context())
        });
        log_debug!("enter {} at {}", self.name, start);

        let outcome = if self.isolated {
            let saved = std::mem::take(&mut p.frames);
            let outcome = (self.body)(p, out, self);
            if !p.end_state {
                p.frames = saved;
            }
            outcome
        } else {
            (self.body)(p, out, self)
        };

        if p.error.is_some() {
            p.pos = start;
        }
        log_debug!("leave {} with {:?} at {}", self.name, outcome, p.pos);
        outcome
    }
}

impl fmt::Debug for Subroutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subroutine({})", self.name)
    }
}
