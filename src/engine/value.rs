//! Dynamic values delivered to sinks.
//!
//! Matched text arrives as [`Value::String`]; grammar subroutines deliver
//! numbers, booleans and nested collections. The default combine rule used by
//! scalar boxes and mapping entries lives here so that every sink shape shares
//! one implementation.

use super::error::ParseError;
use std::collections::HashMap;
use std::fmt;

/// A value carried through the accumulation protocol
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Nil,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// String value
    String(String),
    /// Array of values
    Array(Vec<Value>),
    /// Hash/object of key-value pairs
    Hash(HashMap<String, Value>),
}

impl Value {
    /// Create a nil value
    pub fn nil() -> Self {
        Value::Nil
    }

    /// Create a boolean value
    pub fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    /// Create an integer value
    pub fn int(n: i64) -> Self {
        Value::Int(n)
    }

    /// Create a float value
    pub fn float(f: f64) -> Self {
        Value::Float(f)
    }

    /// Create a string value
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Create an array value
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(items)
    }

    /// Create a hash value
    pub fn hash(pairs: Vec<(impl Into<String>, Value)>) -> Self {
        let mut map = HashMap::new();
        for (k, v) in pairs {
            map.insert(k.into(), v);
        }
        Value::Hash(map)
    }

    /// Check if this is nil
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Get as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as array
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Get as hash
    pub fn as_hash(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Hash(h) => Some(h),
            _ => None,
        }
    }

    /// Get a hash value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Hash(h) => h.get(key),
            _ => None,
        }
    }

    /// Name of the variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "None",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "str",
            Value::Array(_) => "list",
            Value::Hash(_) => "dict",
        }
    }

    /// Truthiness: nil, false, zero and empty containers are falsy
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Hash(h) => !h.is_empty(),
        }
    }

    /// Length of strings (in chars) and containers; zero for scalars
    pub fn len(&self) -> usize {
        match self {
            Value::String(s) => s.chars().count(),
            Value::Array(a) => a.len(),
            Value::Hash(h) => h.len(),
            _ => 0,
        }
    }

    /// True when [`len`](Self::len) is zero
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The value this variant clears to: `""`, `false`, `0`, `0.0`, empty containers.
    pub fn cleared(&self) -> Value {
        match self {
            Value::Nil => Value::Nil,
            Value::Bool(_) => Value::Bool(false),
            Value::Int(_) => Value::Int(0),
            Value::Float(_) => Value::Float(0.0),
            Value::String(_) => Value::String(String::new()),
            Value::Array(_) => Value::Array(Vec::new()),
            Value::Hash(_) => Value::Hash(HashMap::new()),
        }
    }

    /// Numeric view used by addition; strings are parsed.
    fn to_number(&self) -> Result<Number, ParseError> {
        match self {
            Value::Bool(b) => Ok(Number::Int(*b as i64)),
            Value::Int(n) => Ok(Number::Int(*n)),
            Value::Float(f) => Ok(Number::Float(*f)),
            Value::String(s) => {
                let t = s.trim();
                if let Ok(n) = t.parse::<i64>() {
                    Ok(Number::Int(n))
                } else if let Ok(f) = t.parse::<f64>() {
                    Ok(Number::Float(f))
                } else {
                    Err(ParseError::value(format!(
                        "could not convert string to number: '{}'",
                        s
                    )))
                }
            }
            other => Err(ParseError::value(format!(
                "unsupported operand type for +: '{}'",
                other.type_name()
            ))),
        }
    }

    /// The default combine rule: how `new` is folded into `self`.
    ///
    /// Nil adopts the new value, strings concatenate, numbers add (int
    /// promotes to float on mixed addition), booleans OR, arrays append and
    /// hashes merge. A nil `new` leaves numbers unchanged.
    pub fn combine(self, new: Value) -> Result<Value, ParseError> {
        Ok(match self {
            Value::Nil => new,
            Value::String(mut s) => {
                s.push_str(&new.to_string());
                Value::String(s)
            }
            Value::Bool(b) => Value::Bool(b || new.is_truthy()),
            Value::Int(a) => {
                if new.is_nil() {
                    return Ok(Value::Int(a));
                }
                match new.to_number()? {
                    Number::Int(b) => match a.checked_add(b) {
                        Some(n) => Value::Int(n),
                        None => Value::Float(a as f64 + b as f64),
                    },
                    Number::Float(b) => Value::Float(a as f64 + b),
                }
            }
            Value::Float(a) => {
                if new.is_nil() {
                    return Ok(Value::Float(a));
                }
                match new.to_number()? {
                    Number::Int(b) => Value::Float(a + b as f64),
                    Number::Float(b) => Value::Float(a + b),
                }
            }
            Value::Array(mut items) => {
                items.push(new);
                Value::Array(items)
            }
            Value::Hash(mut h) => match new {
                Value::Hash(other) => {
                    h.extend(other);
                    Value::Hash(h)
                }
                other => other,
            },
        })
    }

    /// Convert `new` to the variant of `self`, as assignment into a typed box does.
    pub fn convert_like(&self, new: Value) -> Result<Value, ParseError> {
        if new.is_nil() {
            return Ok(self.cleared());
        }
        Ok(match self {
            Value::Nil => new,
            Value::String(_) => Value::String(new.to_string()),
            Value::Bool(_) => Value::Bool(new.is_truthy()),
            Value::Int(_) => match new {
                Value::Float(f) => Value::Int(f.trunc() as i64),
                other => match other.to_number()? {
                    Number::Int(n) => Value::Int(n),
                    Number::Float(_) => {
                        return Err(ParseError::value(format!(
                            "invalid literal for int(): '{}'",
                            other
                        )))
                    }
                },
            },
            Value::Float(_) => match new.to_number()? {
                Number::Int(n) => Value::Float(n as f64),
                Number::Float(f) => Value::Float(f),
            },
            Value::Array(_) | Value::Hash(_) => {
                if std::mem::discriminant(self) == std::mem::discriminant(&new) {
                    new
                } else {
                    return Err(ParseError::value(format!(
                        "cannot assign '{}' to '{}'",
                        new.type_name(),
                        self.type_name()
                    )));
                }
            }
        })
    }

    fn fmt_repr(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "'{}'", s),
            other => write!(f, "{}", other),
        }
    }
}

enum Number {
    Int(i64),
    Float(f64),
}

/// Float text the way a scripting language prints it: `2.5`, `2.0`, `1e+20`.
pub(crate) fn format_float(x: f64) -> String {
    if x.is_nan() {
        "nan".to_string()
    } else if x.is_infinite() {
        let s = if x > 0.0 { "inf" } else { "-inf" };
        s.to_string()
    } else if x.fract() == 0.0 && x.abs() < 1e16 {
        format!("{:.1}", x)
    } else {
        format!("{}", x)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(fl) => write!(f, "{}", format_float(*fl)),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(arr) => {
                write!(f, "[")?;
                for (i, v) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    v.fmt_repr(f)?;
                }
                write!(f, "]")
            }
            Value::Hash(h) => {
                let mut keys: Vec<&String> = h.keys().collect();
                keys.sort();
                write!(f, "{{")?;
                for (i, k) in keys.into_iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{}': ", k)?;
                    h[k].fmt_repr(f)?;
                }
                write!(f, "}}")
            }
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::String(c.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(h: HashMap<String, Value>) -> Self {
        Value::Hash(h)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Nil, Into::into)
    }
}
