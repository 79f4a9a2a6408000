//! Quoted string literals.

use crate::engine::{OnErr, Outcome, Parser, Pattern, Sink, Subroutine};
use hashbrown::HashMap;
use std::rc::Rc;

const UNTERMINATED: &str = "String must end with a matching quote";
const UNEXPECTED_ESCAPE: &str = "Unexpected string escape sequence";

thread_local! {
    static STRING: Subroutine = StringOpts::new().build();
}

/// How backslash escapes are decoded
#[derive(Debug, Clone, Default)]
pub enum Escapes {
    /// `\n \t \r \b \f \v \a`, octal, `\xHH \uHHHH \UHHHHHHHH`, escaped
    /// quotes and backslashes, backslash-newline continuation
    #[default]
    Standard,
    /// Extra escapes consulted before the standard set
    Custom(HashMap<char, String>),
    /// Keep escapes verbatim; an escaped quote still does not close
    Raw,
}

/// Options for [`string_with`]
///
/// # Example
///
/// ```
/// use parsek::engine::{Parser, Val};
/// use parsek::grammar::StringOpts;
///
/// let s = Val::new();
/// let guillemets = StringOpts::new().quotes([('«', "»")]).build();
/// let mut p = Parser::new("«test»");
/// assert!(p.one(guillemets, &s).is_ok());
/// assert_eq!(s.text(), "test");
/// ```
#[derive(Debug, Clone)]
pub struct StringOpts {
    quotes: Vec<(char, Pattern)>,
    escapes: Escapes,
    replace: HashMap<char, String>,
    on_err: OnErr,
}

impl Default for StringOpts {
    fn default() -> Self {
        Self {
            quotes: vec![('"', Pattern::from('"')), ('\'', Pattern::from('\''))],
            escapes: Escapes::Standard,
            replace: HashMap::new(),
            on_err: OnErr::Raise,
        }
    }
}

impl StringOpts {
    /// Double and single quotes, standard escapes, raising errors
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the accepted quotes: opening character to closing pattern
    pub fn quotes<I, P>(mut self, quotes: I) -> Self
    where
        I: IntoIterator<Item = (char, P)>,
        P: Into<Pattern>,
    {
        self.quotes = quotes.into_iter().map(|(o, c)| (o, c.into())).collect();
        self
    }

    /// Accept one more quote
    pub fn quote(mut self, open: char, close: impl Into<Pattern>) -> Self {
        self.quotes.push((open, close.into()));
        self
    }

    /// Set the escape mode
    pub fn escapes(mut self, escapes: Escapes) -> Self {
        self.escapes = escapes;
        self
    }

    /// Add a custom escape `\c` decoding to `text`
    pub fn escape(mut self, c: char, text: impl Into<String>) -> Self {
        let mut map = match self.escapes {
            Escapes::Custom(map) => map,
            _ => HashMap::new(),
        };
        map.insert(c, text.into());
        self.escapes = Escapes::Custom(map);
        self
    }

    /// Replace unescaped `c` with `text`
    pub fn replace(mut self, c: char, text: impl Into<String>) -> Self {
        self.replace.insert(c, text.into());
        self
    }

    /// Error handling for malformed strings
    pub fn on_err(mut self, on_err: OnErr) -> Self {
        self.on_err = on_err;
        self
    }

    /// Compile into an isolated subroutine
    pub fn build(self) -> Subroutine {
        let opts = Rc::new(self);
        Subroutine::new(move |p, out| scan_string(p, out, &opts))
            .isolated()
            .named("string")
    }

    fn closer(&self, open: char) -> Option<&Pattern> {
        self.quotes
            .iter()
            .find(|(o, _)| *o == open)
            .map(|(_, close)| close)
    }
}

impl From<StringOpts> for Pattern {
    fn from(opts: StringOpts) -> Self {
        opts.build().into()
    }
}

/// Quoted string with double or single quotes and standard escapes.
///
/// Delivers the decoded text. A malformed string raises with the position
/// restored to the opening quote.
pub fn string() -> Subroutine {
    STRING.with(Subroutine::clone)
}

/// Quoted string with custom options
pub fn string_with(opts: StringOpts) -> Subroutine {
    opts.build()
}

fn advance(p: &mut Parser, n: usize) {
    p.set_pos(p.pos() + n);
}

fn scan_string(p: &mut Parser, out: &Sink, opts: &StringOpts) -> Outcome {
    let Some(close) = p.ch().and_then(|open| opts.closer(open)) else {
        return Outcome::Fail;
    };
    advance(p, 1);

    let mut text = String::new();
    loop {
        let at = p.pos();
        if p.one(close, ()).is_ok() {
            break;
        }
        if p.error().is_some() {
            return Outcome::Fail;
        }
        p.set_pos(at);

        let Some(c) = p.ch() else {
            return p.on_err(&opts.on_err, UNTERMINATED).into();
        };
        advance(p, 1);
        if c != '\\' {
            match opts.replace.get(&c) {
                Some(rep) => text.push_str(rep),
                None => text.push(c),
            }
            continue;
        }
        if let Err(msg) = scan_escape(p, opts, &mut text) {
            return p.on_err(&opts.on_err, &msg).into();
        }
    }
    p.accumulate(out, text).into()
}

// The cursor is just past the backslash
fn scan_escape(p: &mut Parser, opts: &StringOpts, text: &mut String) -> Result<(), String> {
    let Some(c) = p.ch() else {
        return Err(UNTERMINATED.to_string());
    };
    match &opts.escapes {
        Escapes::Raw => {
            text.push('\\');
            text.push(c);
            advance(p, 1);
            return Ok(());
        }
        Escapes::Custom(map) => {
            if let Some(rep) = map.get(&c) {
                text.push_str(rep);
                advance(p, 1);
                return Ok(());
            }
        }
        Escapes::Standard => {}
    }

    let decoded = match c {
        '\n' => None,
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        'b' => Some('\u{8}'),
        'f' => Some('\u{c}'),
        'v' => Some('\u{b}'),
        'a' => Some('\u{7}'),
        '\\' | '\'' | '"' => Some(c),
        '0'..='7' => {
            let digits: String = p.slice(3).chars().take_while(|d| d.is_digit(8)).collect();
            advance(p, digits.len());
            let code = u32::from_str_radix(&digits, 8).map_err(|e| e.to_string())?;
            text.extend(char::from_u32(code));
            return Ok(());
        }
        'x' | 'u' | 'U' => {
            advance(p, 1);
            let width = match c {
                'x' => 2,
                'u' => 4,
                _ => 8,
            };
            text.push(scan_hex(p, c, width)?);
            return Ok(());
        }
        _ => return Err(UNEXPECTED_ESCAPE.to_string()),
    };
    advance(p, 1);
    text.extend(decoded);
    Ok(())
}

fn scan_hex(p: &mut Parser, letter: char, width: usize) -> Result<char, String> {
    let digits = p.slice(width);
    if digits.chars().count() != width || !digits.chars().all(|d| d.is_ascii_hexdigit()) {
        return Err(format!(
            "Invalid escape sequence, expected exactly {} hex digits after \\{}",
            width, letter
        ));
    }
    let code = u32::from_str_radix(&digits, 16).map_err(|e| e.to_string())?;
    let decoded = char::from_u32(code).ok_or_else(|| UNEXPECTED_ESCAPE.to_string())?;
    advance(p, width);
    Ok(decoded)
}
