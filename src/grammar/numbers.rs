//! Whitespace and numeric literals.

use crate::engine::{chars, Outcome, Parser, Pattern, Sink, Subroutine, Value};

thread_local! {
    static WS: Subroutine = Subroutine::new(|p, _| p.zero_or_more(Pattern::space(), ()).into())
        .named("ws");
    static UINT: Subroutine = Subroutine::new(|p, out| scan_integer(p, out, '+')).named("uint");
    static INT: Subroutine = Subroutine::new(|p, out| scan_integer(p, out, '-')).named("int_");
    static DECIMAL: Subroutine = Subroutine::new(scan_decimal).named("decimal");
}

/// Zero or more whitespace characters. Always matches.
pub fn ws() -> Subroutine {
    WS.with(Subroutine::clone)
}

/// Unsigned integer: optional `+`, then digits, delivered as [`Value::Int`]
pub fn uint() -> Subroutine {
    UINT.with(Subroutine::clone)
}

/// Signed integer: optional `+` or `-`, then digits, delivered as [`Value::Int`]
pub fn int_() -> Subroutine {
    INT.with(Subroutine::clone)
}

/// Decimal number with optional sign, fraction and exponent.
///
/// Delivers [`Value::Int`] when there is neither a fraction nor an exponent,
/// [`Value::Float`] otherwise. A failed scan leaves the cursor where it
/// stopped.
///
/// # Example
///
/// ```
/// use parsek::engine::{new_list, Parser, Value};
/// use parsek::grammar::{decimal, ws};
///
/// let l = new_list();
/// let mut p = Parser::new(" -1.5e2 7");
/// let ok = p.one(ws(), ()).one(decimal(), &l).one(ws(), ()).one(decimal(), &l).is_ok();
/// assert!(ok);
/// assert_eq!(*l.borrow(), vec![Value::Float(-150.0), Value::Int(7)]);
/// ```
pub fn decimal() -> Subroutine {
    DECIMAL.with(Subroutine::clone)
}

// `sign` is the extra sign accepted besides `+`
fn scan_integer(p: &mut Parser, out: &Sink, sign: char) -> Outcome {
    let start = p.pos();
    let signs = if sign == '+' { chars("+") } else { chars("+-") };
    if !p.zero_or_one(signs, ()).one_or_more(Pattern::digit(), ()).is_ok() {
        return Outcome::Fail;
    }
    let text = p.slice_from(start);
    p.accumulate(out, number(&text)).into()
}

fn scan_decimal(p: &mut Parser, out: &Sink) -> Outcome {
    let start = p.pos();
    let digit = Pattern::digit();
    let ok = p
        .zero_or_one(chars("+-"), ())
        .if_()
            .one_or_more(&digit, ())
            .if_().one('.', ()).zero_or_more(&digit, ()).endif()
        .else_()
            .one('.', ()).one_or_more(&digit, ())
        .endif()
        .do_(|p| match p.ch() {
            Some('e' | 'E') => p
                .lookahead()
                .one(chars("eE"), ())
                .zero_or_one(chars("+-"), ())
                .one_or_more(&digit, ())
                .merge()
                .outcome(),
            _ => Outcome::Ok,
        })
        .is_ok();
    if !ok {
        return Outcome::Fail;
    }
    let text = p.slice_from(start);
    p.accumulate(out, number(&text)).into()
}

// Integers that overflow fall back to floats
fn number(text: &str) -> Value {
    let integral = !text.contains(['.', 'e', 'E']);
    if integral {
        if let Ok(n) = text.parse::<i64>() {
            return Value::Int(n);
        }
    }
    match text.parse::<f64>() {
        Ok(f) => Value::Float(f),
        Err(_) => Value::Nil,
    }
}
