//! The shared scalar box.
//!
//! A [`Val`] is a reference-counted cell: cloning it shares the same storage,
//! so a box handed to several chained steps observes every accumulation. An
//! optional combiner replaces the default combine rule on every append.

use super::error::ParseError;
use super::value::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Binary combiner: `(old, new) -> combined`
pub type Combiner = Rc<dyn Fn(&Value, &Value) -> Value>;

#[derive(Default)]
struct Slot {
    value: Value,
    combiner: Option<Combiner>,
}

/// Shared scalar accumulator
///
/// # Example
///
/// ```
/// use parsek::engine::{Val, Value};
///
/// let v = Val::new();
/// v.append("ab").unwrap().append("cd").unwrap();
/// assert_eq!(v.value(), Value::string("abcd"));
/// ```
#[derive(Clone, Default)]
pub struct Val(Rc<RefCell<Slot>>);

impl Val {
    /// Create an empty box
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a box holding `v`
    pub fn of(v: impl Into<Value>) -> Self {
        let val = Self::default();
        val.0.borrow_mut().value = v.into();
        val
    }

    /// Snapshot of the current value
    pub fn value(&self) -> Value {
        self.0.borrow().value.clone()
    }

    /// Borrow the current value
    pub fn with<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        f(&self.0.borrow().value)
    }

    /// The current value as text (`None` renders as the empty string)
    pub fn text(&self) -> String {
        self.with(|v| match v {
            Value::Nil => String::new(),
            other => other.to_string(),
        })
    }

    /// True if both handles share storage
    pub fn ptr_eq(&self, other: &Val) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Assign, converting to the type currently held. `Nil` clears by type.
    pub fn set(&self, v: impl Into<Value>) -> Result<&Self, ParseError> {
        let new = {
            let slot = self.0.borrow();
            slot.value.convert_like(v.into())?
        };
        self.0.borrow_mut().value = new;
        Ok(self)
    }

    /// Replace the value without conversion
    pub fn put(&self, v: impl Into<Value>) -> &Self {
        self.0.borrow_mut().value = v.into();
        self
    }

    /// Fold `v` into the box with the combiner, or with the default rule.
    pub fn append(&self, v: impl Into<Value>) -> Result<&Self, ParseError> {
        let new = v.into();
        let mut slot = self.0.borrow_mut();
        let combiner = slot.combiner.clone();
        let combined = match combiner {
            Some(f) => f(&slot.value, &new),
            None => std::mem::take(&mut slot.value).combine(new)?,
        };
        slot.value = combined;
        Ok(self)
    }

    /// Clear by type: `""`, `false`, `0`, `0.0`, empty containers. `Nil` stays.
    pub fn clear(&self) -> &Self {
        let mut slot = self.0.borrow_mut();
        slot.value = slot.value.cleared();
        drop(slot);
        self
    }

    /// Reset to `Nil`
    pub fn reset(&self) -> &Self {
        self.0.borrow_mut().value = Value::Nil;
        self
    }

    /// Install a binary combiner used by every subsequent append
    pub fn combine_with(&self, f: impl Fn(&Value, &Value) -> Value + 'static) -> &Self {
        self.0.borrow_mut().combiner = Some(Rc::new(f));
        self
    }

    /// Logical AND combiner
    pub fn reduce_and(old: &Value, new: &Value) -> Value {
        match old {
            Value::Nil => Value::Bool(new.is_truthy()),
            _ => Value::Bool(old.is_truthy() && new.is_truthy()),
        }
    }

    /// Logical OR combiner
    pub fn reduce_or(old: &Value, new: &Value) -> Value {
        Value::Bool(old.is_truthy() || new.is_truthy())
    }

    /// Logical XOR combiner
    pub fn reduce_xor(old: &Value, new: &Value) -> Value {
        Value::Bool(old.is_truthy() ^ new.is_truthy())
    }

    /// Increment by one
    pub fn inc(&self) -> Result<&Self, ParseError> {
        self.inc_by(1)
    }

    /// Decrement by one
    pub fn dec(&self) -> Result<&Self, ParseError> {
        self.inc_by(-1)
    }

    /// Decrement by `step`
    pub fn dec_by(&self, step: impl Into<Value>) -> Result<&Self, ParseError> {
        let step = match step.into() {
            Value::Int(n) => Value::Int(-n),
            Value::Float(f) => Value::Float(-f),
            other => other,
        };
        self.inc_by(step)
    }

    /// Increment by `step`.
    ///
    /// `Nil` becomes the step, an int promotes to float on a float step, and a
    /// bool becomes `true` on a positive step and `false` on a negative one.
    pub fn inc_by(&self, step: impl Into<Value>) -> Result<&Self, ParseError> {
        let step = step.into();
        let sign = match &step {
            Value::Int(n) => n.signum() as f64,
            Value::Float(f) if *f == 0.0 => 0.0,
            Value::Float(f) => f.signum(),
            other => {
                return Err(ParseError::value(format!(
                    "increment must be numeric, got '{}'",
                    other.type_name()
                )))
            }
        };
        let mut slot = self.0.borrow_mut();
        let next = match &slot.value {
            Value::Nil => step,
            Value::Bool(b) => Value::Bool(if sign > 0.0 {
                true
            } else if sign < 0.0 {
                false
            } else {
                *b
            }),
            Value::Int(_) | Value::Float(_) => slot.value.clone().combine(step)?,
            other => {
                return Err(ParseError::value(format!(
                    "cannot increment value of type '{}'",
                    other.type_name()
                )))
            }
        };
        slot.value = next;
        Ok(self)
    }

    fn map_str(&self, op: &str, f: impl FnOnce(&str) -> String) -> Result<&Self, ParseError> {
        let mut slot = self.0.borrow_mut();
        let next = match &slot.value {
            Value::Nil => return Ok(self),
            Value::String(s) => f(s),
            other => {
                return Err(ParseError::value(format!(
                    "{}() requires a string value, got '{}'",
                    op,
                    other.type_name()
                )))
            }
        };
        slot.value = Value::String(next);
        Ok(self)
    }

    /// Trim surrounding whitespace
    pub fn strip(&self) -> Result<&Self, ParseError> {
        self.map_str("strip", |s| s.trim().to_string())
    }

    /// Lowercase
    pub fn lower(&self) -> Result<&Self, ParseError> {
        self.map_str("lower", |s| s.to_lowercase())
    }

    /// Uppercase
    pub fn upper(&self) -> Result<&Self, ParseError> {
        self.map_str("upper", |s| s.to_uppercase())
    }

    /// Replace every occurrence of `old` with `new`
    pub fn replace(&self, old: &str, new: &str) -> Result<&Self, ParseError> {
        self.map_str("replace", |s| s.replace(old, new))
    }

    /// Apply several replacements in order
    pub fn replace_all(&self, pairs: &[(&str, &str)]) -> Result<&Self, ParseError> {
        self.map_str("replace", |s| {
            pairs
                .iter()
                .fold(s.to_string(), |acc, (old, new)| acc.replace(old, new))
        })
    }

    /// Transform the value in place
    pub fn apply(&self, f: impl FnOnce(Value) -> Value) -> &Self {
        let mut slot = self.0.borrow_mut();
        let current = std::mem::take(&mut slot.value);
        slot.value = f(current);
        drop(slot);
        self
    }

    /// Length of a string or container, zero otherwise
    pub fn len(&self) -> usize {
        self.with(Value::len)
    }

    /// True when [`len`](Self::len) is zero
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Holds `Nil`
    pub fn is_none(&self) -> bool {
        self.with(Value::is_nil)
    }

    /// Holds a bool
    pub fn is_bool(&self) -> bool {
        self.with(|v| matches!(v, Value::Bool(_)))
    }

    /// Holds an int (bools are not ints)
    pub fn is_int(&self) -> bool {
        self.with(|v| matches!(v, Value::Int(_)))
    }

    /// Holds a float
    pub fn is_float(&self) -> bool {
        self.with(|v| matches!(v, Value::Float(_)))
    }

    /// Holds a string
    pub fn is_str(&self) -> bool {
        self.with(|v| matches!(v, Value::String(_)))
    }

    /// Holds a bool, number or string
    pub fn is_scalar(&self) -> bool {
        self.with(|v| {
            matches!(
                v,
                Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::String(_)
            )
        })
    }

    /// Truthiness of the held value
    pub fn is_truthy(&self) -> bool {
        self.with(Value::is_truthy)
    }

    /// Non-empty string made only of whitespace
    pub fn isspace(&self) -> bool {
        self.with(|v| match v {
            Value::String(s) => !s.is_empty() && s.chars().all(char::is_whitespace),
            _ => false,
        })
    }
}

impl fmt::Debug for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Val({:?})", self.0.borrow().value)
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.borrow().value)
    }
}

impl PartialEq for Val {
    fn eq(&self, other: &Val) -> bool {
        self.ptr_eq(other) || self.value() == other.value()
    }
}

impl PartialEq<Value> for Val {
    fn eq(&self, other: &Value) -> bool {
        self.with(|v| v == other)
    }
}

macro_rules! val_eq {
    ($($t:ty),*) => {
        $(impl PartialEq<$t> for Val {
            fn eq(&self, other: &$t) -> bool {
                self.with(|v| *v == Value::from(other.clone()))
            }
        })*
    };
}

val_eq!(i64, i32, f64, bool, &str, String);
