//! Delimited collections such as `[1, 2, 3]` or `{a: 1, b: 2}`.

use crate::engine::{OnErr, Outcome, Parser, Pattern, Sink, Subroutine, Value};
use crate::grammar::ws;
use std::fmt;
use std::rc::Rc;

const UNCLOSED: &str = "Unclosed collection";
const UNEXPECTED: &str = "Unexpected input for collection";

/// Produces the value for an empty slot; `true` for the slot before the
/// closer. Returning `None` skips the slot.
pub type EmptyItem = Rc<dyn Fn(bool) -> Option<Value>>;

/// Builder for a collection subroutine
///
/// Items are parsed with `one(item, out)`, so `item` decides what reaches
/// the sink. Whitespace around items and separators is skipped.
///
/// # Example
///
/// ```
/// use parsek::engine::{new_list, Parser, Value};
/// use parsek::grammar::{collection, decimal};
///
/// let l = new_list();
/// let mut p = Parser::new("[1, 2,3]");
/// assert!(p.one(collection(decimal()), &l).is_ok());
/// assert_eq!(*l.borrow(), vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
/// ```
#[derive(Clone)]
pub struct Collection {
    item: Pattern,
    brackets: Vec<(Option<Pattern>, Pattern)>,
    sep: Pattern,
    empty_item: Option<EmptyItem>,
    on_err: OnErr,
}

/// Start a collection of `item`s in `[` `]` separated by `,`
pub fn collection(item: impl Into<Pattern>) -> Collection {
    Collection {
        item: item.into(),
        brackets: vec![(Some(Pattern::from('[')), Pattern::from(']'))],
        sep: Pattern::from(','),
        empty_item: None,
        on_err: OnErr::Raise,
    }
}

impl Collection {
    /// Use a single pair of brackets
    pub fn brackets(mut self, open: impl Into<Pattern>, close: impl Into<Pattern>) -> Self {
        self.brackets = vec![(Some(open.into()), close.into())];
        self
    }

    /// Accept another pair of brackets
    pub fn add_brackets(mut self, open: impl Into<Pattern>, close: impl Into<Pattern>) -> Self {
        self.brackets.push((Some(open.into()), close.into()));
        self
    }

    /// No opener: it was consumed already, or the collection is bare and
    /// runs until `close`
    pub fn closer(mut self, close: impl Into<Pattern>) -> Self {
        self.brackets = vec![(None, close.into())];
        self
    }

    /// Item separator
    pub fn sep(mut self, sep: impl Into<Pattern>) -> Self {
        self.sep = sep.into();
        self
    }

    /// Value for empty slots
    pub fn empty_item(mut self, f: impl Fn(bool) -> Option<Value> + 'static) -> Self {
        self.empty_item = Some(Rc::new(f));
        self
    }

    /// Error handling for unclosed or malformed collections
    pub fn on_err(mut self, on_err: OnErr) -> Self {
        self.on_err = on_err;
        self
    }

    /// Compile into an isolated subroutine
    pub fn build(self) -> Subroutine {
        let spec = Rc::new(self);
        Subroutine::new(move |p, out| scan_collection(p, out, &spec))
            .isolated()
            .named("collection")
    }
}

impl From<Collection> for Pattern {
    fn from(c: Collection) -> Self {
        c.build().into()
    }
}

impl From<Collection> for Subroutine {
    fn from(c: Collection) -> Self {
        c.build()
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("item", &self.item)
            .field("sep", &self.sep)
            .field("on_err", &self.on_err)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    AfterOpener,
    AfterItem,
    AfterSep,
}

fn scan_collection(p: &mut Parser, out: &Sink, spec: &Collection) -> Outcome {
    let Some(close) = open(p, spec) else {
        return Outcome::Fail;
    };
    let mut slot = Slot::AfterOpener;
    loop {
        p.one(ws(), ());
        if p.one(&close, ()).is_ok() {
            if slot == Slot::AfterSep && !empty(p, out, spec, true) {
                return Outcome::Fail;
            }
            return Outcome::Ok;
        }
        if p.one(&spec.sep, ()).is_ok() {
            if slot != Slot::AfterItem && !empty(p, out, spec, false) {
                return Outcome::Fail;
            }
            slot = Slot::AfterSep;
            continue;
        }
        if p.is_end() {
            return p.on_err(&spec.on_err, UNCLOSED).into();
        }
        if slot == Slot::AfterItem {
            return p.on_err(&spec.on_err, UNEXPECTED).into();
        }
        if !p.one(&spec.item, out).is_ok() {
            if p.error().is_some() {
                return Outcome::Fail;
            }
            return p.on_err(&spec.on_err, UNEXPECTED).into();
        }
        slot = Slot::AfterItem;
    }
}

// Consume an opener, returning the matching closer
fn open(p: &mut Parser, spec: &Collection) -> Option<Pattern> {
    if p.is_past_end() {
        return None;
    }
    for (opener, close) in &spec.brackets {
        match opener {
            None => return Some(close.clone()),
            Some(opener) => {
                if p.one(opener, ()).is_ok() {
                    return Some(close.clone());
                }
            }
        }
    }
    None
}

fn empty(p: &mut Parser, out: &Sink, spec: &Collection, is_last: bool) -> bool {
    match spec.empty_item.as_ref().and_then(|f| f(is_last)) {
        Some(value) => p.accumulate(out, value).is_ok(),
        None => true,
    }
}
