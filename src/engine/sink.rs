//! Accumulation targets.
//!
//! Every primitive that matches something routes the matched value through
//! [`Sink::accumulate`]. The set of shapes is closed, so dispatch is a single
//! `match`.

use super::error::ParseError;
use super::val::Val;
use super::value::Value;
use ahash::AHashSet;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Shared growable sequence
pub type List = Rc<RefCell<Vec<Value>>>;

/// Shared set of matched strings
pub type Set = Rc<RefCell<AHashSet<String>>>;

/// Shared mapping
pub type Dict = Rc<RefCell<HashMap<String, Value>>>;

/// Create an empty shared list
pub fn new_list() -> List {
    Rc::new(RefCell::new(Vec::new()))
}

/// Create an empty shared set
pub fn new_set() -> Set {
    Rc::new(RefCell::new(AHashSet::new()))
}

/// Create an empty shared mapping
pub fn new_dict() -> Dict {
    Rc::new(RefCell::new(HashMap::new()))
}

/// Key of a mapping entry sink
#[derive(Debug, Clone)]
pub enum Key {
    /// Fixed key
    Str(String),
    /// Key read from a box at accumulation time
    Val(Val),
}

impl Key {
    fn resolve(&self) -> String {
        match self {
            Key::Str(s) => s.clone(),
            Key::Val(v) => v.text(),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl From<&Val> for Key {
    fn from(v: &Val) -> Self {
        Key::Val(v.clone())
    }
}

/// How a mapping entry folds a new value into the stored one
#[derive(Clone)]
pub enum Combine {
    /// Convert the new value, then apply the default combine rule
    Convert(Rc<dyn Fn(Value) -> Result<Value, ParseError>>),
    /// Binary combiner over `(old, new)`
    Reduce(Rc<dyn Fn(&Value, &Value) -> Value>),
}

impl Combine {
    /// Unary converter
    pub fn convert(f: impl Fn(Value) -> Value + 'static) -> Self {
        Combine::Convert(Rc::new(move |v| Ok(f(v))))
    }

    /// Unary converter that can reject a value
    pub fn try_convert(f: impl Fn(Value) -> Result<Value, ParseError> + 'static) -> Self {
        Combine::Convert(Rc::new(f))
    }

    /// Binary combiner
    pub fn reduce(f: impl Fn(&Value, &Value) -> Value + 'static) -> Self {
        Combine::Reduce(Rc::new(f))
    }

    /// Converter parsing the value as an integer; text that is not an
    /// integer is a [`ParseError::Value`]
    pub fn to_int() -> Self {
        Combine::try_convert(|v| match v {
            Value::String(s) => s.trim().parse().map(Value::Int).map_err(|_| {
                ParseError::value(format!("invalid literal for int: '{}'", s))
            }),
            Value::Float(f) => Ok(Value::Int(f as i64)),
            Value::Bool(b) => Ok(Value::Int(b as i64)),
            other => Ok(other),
        })
    }
}

/// An accumulation target
#[derive(Clone, Default)]
pub enum Sink {
    /// Discard
    #[default]
    None,
    /// Scalar box, folded with its combine rule
    Val(Val),
    /// Append to a list
    List(List),
    /// Insert the value's text into a set
    Set(Set),
    /// Merge `[key, value]` pairs, arrays of pairs or hashes into a mapping
    Dict(Dict),
    /// Fold into one mapping entry
    Entry {
        /// Target mapping
        dict: Dict,
        /// Entry key
        key: Key,
        /// Optional converter or combiner
        combine: Option<Combine>,
    },
    /// Fan out to every member
    All(Vec<Sink>),
    /// Call with the value
    Call(Rc<dyn Fn(&Value)>),
    /// Call with the value; an error becomes [`ParseError::Accumulation`]
    TryCall(String, Rc<dyn Fn(&Value) -> Result<(), String>>),
}

impl Sink {
    /// Sink calling `f` for every value
    pub fn call(f: impl Fn(&Value) + 'static) -> Self {
        Sink::Call(Rc::new(f))
    }

    /// Sink calling a fallible `f`, reported under `name` on error
    pub fn try_call(
        name: impl Into<String>,
        f: impl Fn(&Value) -> Result<(), String> + 'static,
    ) -> Self {
        Sink::TryCall(name.into(), Rc::new(f))
    }

    /// Entry `key` of `dict`, folded with the default rule
    pub fn entry_of(dict: &Dict, key: impl Into<Key>) -> Self {
        Sink::Entry {
            dict: dict.clone(),
            key: key.into(),
            combine: None,
        }
    }

    /// Entry `key` of `dict`, folded with `combine`
    pub fn entry_with(dict: &Dict, key: impl Into<Key>, combine: Combine) -> Self {
        Sink::Entry {
            dict: dict.clone(),
            key: key.into(),
            combine: Some(combine),
        }
    }

    /// Narrow a mapping sink to one of its entries.
    ///
    /// Composite sinks narrow every member; other shapes are returned as is.
    pub fn entry(&self, key: impl Into<Key>) -> Sink {
        let key = key.into();
        match self {
            Sink::Dict(d) => Sink::Entry {
                dict: d.clone(),
                key,
                combine: None,
            },
            Sink::All(items) => Sink::All(items.iter().map(|s| s.entry(key.clone())).collect()),
            other => other.clone(),
        }
    }

    /// True for [`Sink::None`] and empty composites
    pub fn is_none(&self) -> bool {
        match self {
            Sink::None => true,
            Sink::All(items) => items.iter().all(Sink::is_none),
            _ => false,
        }
    }

    /// Deliver `value` to this target.
    ///
    /// # Example
    ///
    /// ```
    /// use parsek::engine::{new_dict, Combine, Sink, Value};
    ///
    /// let d = new_dict();
    /// let num = Sink::entry_with(&d, "num", Combine::to_int());
    /// num.accumulate("5").unwrap();
    /// num.accumulate("7").unwrap();
    /// assert_eq!(d.borrow()["num"], Value::Int(12));
    /// ```
    pub fn accumulate(&self, value: impl Into<Value>) -> Result<(), ParseError> {
        self.deliver(value.into())
    }

    fn deliver(&self, value: Value) -> Result<(), ParseError> {
        match self {
            Sink::None => Ok(()),
            Sink::Val(v) => v.append(value).map(|_| ()),
            Sink::List(l) => {
                l.borrow_mut().push(value);
                Ok(())
            }
            Sink::Set(s) => {
                s.borrow_mut().insert(value.to_string());
                Ok(())
            }
            Sink::Dict(d) => merge_into(d, value),
            Sink::Entry { dict, key, combine } => {
                fold_entry(dict, key.resolve(), value, combine.as_ref())
            }
            Sink::All(items) => {
                for item in items {
                    item.deliver(value.clone())?;
                }
                Ok(())
            }
            Sink::Call(f) => {
                f(&value);
                Ok(())
            }
            Sink::TryCall(name, f) => f(&value).map_err(|reason| ParseError::Accumulation {
                target: name.clone(),
                reason,
            }),
        }
    }
}

fn fold_entry(
    dict: &Dict,
    key: String,
    value: Value,
    combine: Option<&Combine>,
) -> Result<(), ParseError> {
    let old = dict.borrow().get(&key).cloned().unwrap_or_default();
    let new = match combine {
        None => old.combine(value)?,
        Some(Combine::Convert(f)) => old.combine(f(value)?)?,
        Some(Combine::Reduce(f)) => f(&old, &value),
    };
    dict.borrow_mut().insert(key, new);
    Ok(())
}

fn as_pair(items: &[Value]) -> Option<(String, Value)> {
    match items {
        [Value::String(k), v] => Some((k.clone(), v.clone())),
        _ => None,
    }
}

fn merge_into(dict: &Dict, value: Value) -> Result<(), ParseError> {
    match value {
        Value::Hash(h) => {
            for (k, v) in h {
                fold_entry(dict, k, v, None)?;
            }
            Ok(())
        }
        Value::Array(items) => {
            if let Some((k, v)) = as_pair(&items) {
                return fold_entry(dict, k, v, None);
            }
            let mut pairs = Vec::with_capacity(items.len());
            for item in &items {
                match item.as_array().and_then(as_pair) {
                    Some(pair) => pairs.push(pair),
                    None => {
                        return Err(ParseError::DictUpdate {
                            reason: format!("expected a [key, value] pair, got {}", item),
                        })
                    }
                }
            }
            for (k, v) in pairs {
                fold_entry(dict, k, v, None)?;
            }
            Ok(())
        }
        other => Err(ParseError::DictUpdate {
            reason: format!("cannot merge '{}' into a mapping", other.type_name()),
        }),
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sink::None => write!(f, "None"),
            Sink::Val(v) => write!(f, "{:?}", v),
            Sink::List(l) => write!(f, "List({})", Value::Array(l.borrow().clone())),
            Sink::Set(s) => write!(f, "Set({} items)", s.borrow().len()),
            Sink::Dict(d) => write!(f, "Dict({} keys)", d.borrow().len()),
            Sink::Entry { key, .. } => write!(f, "Entry({:?})", key),
            Sink::All(items) => f.debug_list().entries(items).finish(),
            Sink::Call(_) => write!(f, "Call(..)"),
            Sink::TryCall(name, _) => write!(f, "TryCall({})", name),
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<()> for Sink {
    fn from(_: ()) -> Self {
        Sink::None
    }
}

impl From<&Sink> for Sink {
    fn from(s: &Sink) -> Self {
        s.clone()
    }
}

impl From<Val> for Sink {
    fn from(v: Val) -> Self {
        Sink::Val(v)
    }
}

impl From<&Val> for Sink {
    fn from(v: &Val) -> Self {
        Sink::Val(v.clone())
    }
}

impl From<&List> for Sink {
    fn from(l: &List) -> Self {
        Sink::List(l.clone())
    }
}

impl From<&Set> for Sink {
    fn from(s: &Set) -> Self {
        Sink::Set(s.clone())
    }
}

impl From<&Dict> for Sink {
    fn from(d: &Dict) -> Self {
        Sink::Dict(d.clone())
    }
}

impl From<Vec<Sink>> for Sink {
    fn from(items: Vec<Sink>) -> Self {
        Sink::All(items)
    }
}

impl<A: Into<Sink>, B: Into<Sink>> From<(A, B)> for Sink {
    fn from((a, b): (A, B)) -> Self {
        Sink::All(vec![a.into(), b.into()])
    }
}

impl<A: Into<Sink>, B: Into<Sink>, C: Into<Sink>> From<(A, B, C)> for Sink {
    fn from((a, b, c): (A, B, C)) -> Self {
        Sink::All(vec![a.into(), b.into(), c.into()])
    }
}
