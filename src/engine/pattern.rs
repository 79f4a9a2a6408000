//! Predicates matched by `one`, `peek`, `behind` and the quantifiers.
//!
//! A [`Pattern`] is a cheap, reference-counted handle over a closed set of
//! matcher shapes. Case-insensitivity is not part of the pattern; it is a
//! flag supplied at match time.

use super::subroutine::Subroutine;
use super::val::Val;
use super::value::Value;
use std::fmt;
use std::rc::Rc;

/// Matcher shapes
pub enum PatternKind {
    /// Literal text; the empty literal always matches with zero width
    Lit(String),
    /// The end-of-input sentinel
    End,
    /// One character from a set, optionally also accepting the sentinel
    In {
        /// Accepted characters
        chars: String,
        /// Whether the sentinel is part of the set
        end: bool,
    },
    /// One character in an inclusive range
    Range(char, char),
    /// One character (or the sentinel) where the inner pattern does not match
    Not(Pattern),
    /// First matching alternative
    Alt(Vec<Pattern>),
    /// First matching key; delivers the mapped value instead of the text
    Map(Vec<(String, Value)>),
    /// One character accepted by a host function
    Test(Rc<dyn Fn(char) -> bool>),
    /// A parse routine
    Sub(Subroutine),
    /// Literal equal to the current text of a box
    Val(Val),
}

/// Shared predicate handle
#[derive(Clone)]
pub struct Pattern(Rc<PatternKind>);

impl Pattern {
    /// Wrap a kind
    pub fn new(kind: PatternKind) -> Self {
        Pattern(Rc::new(kind))
    }

    /// The matcher shape
    pub fn kind(&self) -> &PatternKind {
        &self.0
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Pattern) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Literal text
    pub fn lit(s: impl Into<String>) -> Self {
        Self::new(PatternKind::Lit(s.into()))
    }

    /// Character set
    pub fn one_of(chars: impl Into<String>) -> Self {
        Self::new(PatternKind::In {
            chars: chars.into(),
            end: false,
        })
    }

    /// Character set that also accepts the end sentinel
    pub fn one_of_or_end(chars: impl Into<String>) -> Self {
        Self::new(PatternKind::In {
            chars: chars.into(),
            end: true,
        })
    }

    /// Inclusive range; bounds may be given in either order
    pub fn range(a: char, b: char) -> Self {
        Self::new(PatternKind::Range(a.min(b), a.max(b)))
    }

    /// Negate this pattern
    pub fn not(self) -> Self {
        Self::new(PatternKind::Not(self))
    }

    /// Ordered alternatives
    pub fn any<I, P>(items: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Pattern>,
    {
        Self::new(PatternKind::Alt(items.into_iter().map(Into::into).collect()))
    }

    /// Keyed mapping: the first matching key delivers its value
    pub fn map<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::new(PatternKind::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// Unary character test
    pub fn test(f: impl Fn(char) -> bool + 'static) -> Self {
        Self::new(PatternKind::Test(Rc::new(f)))
    }

    /// Alphabetic character
    pub fn alpha() -> Self {
        Self::test(char::is_alphabetic)
    }

    /// ASCII digit
    pub fn digit() -> Self {
        Self::test(|c| c.is_ascii_digit())
    }

    /// Alphanumeric character
    pub fn alnum() -> Self {
        Self::test(char::is_alphanumeric)
    }

    /// Whitespace character
    pub fn space() -> Self {
        Self::test(char::is_whitespace)
    }

    /// Split off a leading negation: `(negated, inner)`
    pub fn crack(&self) -> (bool, Pattern) {
        match self.kind() {
            PatternKind::Not(inner) => (true, inner.clone()),
            _ => (false, self.clone()),
        }
    }

    /// Whether a subroutine appears anywhere in this pattern
    pub fn has_sub(&self) -> bool {
        match self.kind() {
            PatternKind::Sub(_) => true,
            PatternKind::Not(inner) => inner.has_sub(),
            PatternKind::Alt(items) => items.iter().any(Pattern::has_sub),
            _ => false,
        }
    }

    /// Test a single character, as a plain predicate
    pub fn accepts(&self, c: char) -> bool {
        match self.kind() {
            PatternKind::Lit(s) => {
                let mut it = s.chars();
                it.next() == Some(c) && it.next().is_none()
            }
            PatternKind::In { chars, .. } => chars.contains(c),
            PatternKind::Range(lo, hi) => (*lo..=*hi).contains(&c),
            PatternKind::Not(inner) => !inner.accepts(c),
            PatternKind::Alt(items) => items.iter().any(|p| p.accepts(c)),
            PatternKind::Map(pairs) => pairs.iter().any(|(k, _)| {
                let mut it = k.chars();
                it.next() == Some(c) && it.next().is_none()
            }),
            PatternKind::Test(f) => f(c),
            PatternKind::End | PatternKind::Sub(_) | PatternKind::Val(_) => false,
        }
    }
}

/// The end-of-input sentinel pattern
pub fn end() -> Pattern {
    thread_local! {
        static END: Pattern = Pattern::new(PatternKind::End);
    }
    END.with(Pattern::clone)
}

/// Case-fold comparison of single characters
pub(crate) fn fold_eq(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

impl From<char> for Pattern {
    fn from(c: char) -> Self {
        Pattern::lit(c.to_string())
    }
}

impl From<&str> for Pattern {
    fn from(s: &str) -> Self {
        Pattern::lit(s)
    }
}

impl From<String> for Pattern {
    fn from(s: String) -> Self {
        Pattern::lit(s)
    }
}

impl From<&Pattern> for Pattern {
    fn from(p: &Pattern) -> Self {
        p.clone()
    }
}

impl From<Subroutine> for Pattern {
    fn from(s: Subroutine) -> Self {
        Pattern::new(PatternKind::Sub(s))
    }
}

impl From<&Subroutine> for Pattern {
    fn from(s: &Subroutine) -> Self {
        Pattern::new(PatternKind::Sub(s.clone()))
    }
}

impl From<&Val> for Pattern {
    fn from(v: &Val) -> Self {
        Pattern::new(PatternKind::Val(v.clone()))
    }
}

impl<A: Into<Pattern>, B: Into<Pattern>> From<(A, B)> for Pattern {
    fn from((a, b): (A, B)) -> Self {
        Pattern::new(PatternKind::Alt(vec![a.into(), b.into()]))
    }
}

impl<A: Into<Pattern>, B: Into<Pattern>, C: Into<Pattern>> From<(A, B, C)> for Pattern {
    fn from((a, b, c): (A, B, C)) -> Self {
        Pattern::new(PatternKind::Alt(vec![a.into(), b.into(), c.into()]))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            PatternKind::Lit(s) => write!(f, "'{}'", s),
            PatternKind::End => write!(f, "END"),
            PatternKind::In { chars, end: false } => write!(f, "In('{}')", chars),
            PatternKind::In { chars, end: true } => write!(f, "In('{}'+END)", chars),
            PatternKind::Range(lo, hi) => write!(f, "Range('{}', '{}')", lo, hi),
            PatternKind::Not(inner) => write!(f, "Not({})", inner),
            PatternKind::Alt(items) => {
                write!(f, "(")?;
                for (i, p) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ")")
            }
            PatternKind::Map(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{}': {}", k, v)?;
                }
                write!(f, "}}")
            }
            PatternKind::Test(_) => write!(f, "<test>"),
            PatternKind::Sub(s) => write!(f, "{}", s.name()),
            PatternKind::Val(v) => write!(f, "{:?}", v),
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
