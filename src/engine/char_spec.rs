//! Bracket-class compiler with a thread-local cache.
//!
//! `chars("^a-z_$")` reads like the inside of a regex character class: a
//! leading `^` negates, a trailing unescaped `$` adds the end sentinel, `a-z`
//! is a range, and `\^ \$ \\ \-` escape the special characters.

use super::pattern::{end, Pattern, PatternKind};
use hashbrown::HashMap;
use std::cell::RefCell;

/// Ranges up to this many code points are expanded into the set
pub const MAX_EXPANDED_RANGE: u32 = 32;

thread_local! {
    /// Thread-local cache of compiled class specs
    static CHARS_CACHE: RefCell<HashMap<String, Pattern>> = RefCell::new(HashMap::new());
}

/// Compile a class spec, reusing the cached pattern for a spec seen before.
///
/// # Example
///
/// ```
/// use parsek::engine::chars;
///
/// let ident = chars("a-zA-Z_");
/// assert!(ident.accepts('q'));
/// assert!(chars("a-zA-Z_").ptr_eq(&ident));
/// assert_eq!(chars("^a").to_string(), "Not('a')");
/// ```
pub fn chars(spec: &str) -> Pattern {
    CHARS_CACHE.with(|cache| {
        if let Some(p) = cache.borrow().get(spec) {
            return p.clone();
        }
        let p = compile(spec);
        cache.borrow_mut().insert(spec.to_string(), p.clone());
        p
    })
}

/// Clear the class cache
pub fn clear_chars_cache() {
    CHARS_CACHE.with(|cache| cache.borrow_mut().clear());
}

/// Number of cached class specs
pub fn chars_cache_size() -> usize {
    CHARS_CACHE.with(|cache| cache.borrow().len())
}

fn compile(spec: &str) -> Pattern {
    let raw: Vec<char> = spec.chars().collect();
    let mut i = 0;
    let negate = raw.first() == Some(&'^');
    if negate {
        i = 1;
    }

    // (char, escaped)
    let mut items: Vec<(char, bool)> = Vec::with_capacity(raw.len());
    while i < raw.len() {
        if raw[i] == '\\' && i + 1 < raw.len() {
            items.push((raw[i + 1], true));
            i += 2;
        } else {
            items.push((raw[i], false));
            i += 1;
        }
    }

    let mut with_end = false;
    if items.last() == Some(&('$', false)) {
        with_end = true;
        items.pop();
    }

    let mut expanded = String::new();
    let mut literals = String::new();
    let mut wide: Vec<Pattern> = Vec::new();
    let mut k = 0;
    while k < items.len() {
        let (c, _) = items[k];
        if k + 2 < items.len() && items[k + 1] == ('-', false) {
            let (d, _) = items[k + 2];
            let (lo, hi) = (c.min(d), c.max(d));
            if (hi as u32) - (lo as u32) < MAX_EXPANDED_RANGE {
                expanded.extend(lo..=hi);
            } else {
                wide.push(Pattern::range(lo, hi));
            }
            k += 3;
        } else {
            literals.push(c);
            k += 1;
        }
    }
    expanded.push_str(&literals);

    let body = if wide.is_empty() {
        match (expanded.chars().count(), with_end) {
            (0, false) => Pattern::lit(""),
            (0, true) => end(),
            (1, false) => Pattern::lit(expanded),
            _ => Pattern::new(PatternKind::In {
                chars: expanded,
                end: with_end,
            }),
        }
    } else {
        if !expanded.is_empty() || with_end {
            wide.push(Pattern::new(PatternKind::In {
                chars: expanded,
                end: with_end,
            }));
        }
        if wide.len() == 1 {
            wide.remove(0)
        } else {
            Pattern::new(PatternKind::Alt(wide))
        }
    };

    if negate {
        body.not()
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shown(spec: &str) -> String {
        chars(spec).to_string()
    }

    #[test]
    fn test_degenerate_specs() {
        assert_eq!(shown("a"), "'a'");
        assert_eq!(shown(""), "''");
        assert_eq!(shown("^"), "Not('')");
        assert_eq!(shown("$"), "END");
        assert_eq!(shown("^$"), "Not(END)");
        assert_eq!(shown("\\^"), "'^'");
        assert_eq!(shown("^a"), "Not('a')");
    }

    #[test]
    fn test_sets() {
        assert_eq!(shown("\\^a"), "In('^a')");
        assert_eq!(shown("abc"), "In('abc')");
        assert_eq!(shown("^abc"), "Not(In('abc'))");
        assert_eq!(shown("^abc$"), "Not(In('abc'+END))");
        assert_eq!(shown("^abc$d"), "Not(In('abc$d'))");
        assert_eq!(shown("a-"), "In('a-')");
        assert_eq!(shown("-a"), "In('-a')");
    }

    #[test]
    fn test_ranges() {
        let az = "abcdefghijklmnopqrstuvwxyz";
        assert_eq!(shown("a-z"), format!("In('{}')", az));
        assert_eq!(shown("a-zA"), format!("In('{}A')", az));
        assert_eq!(shown("a-zA$"), format!("In('{}A'+END)", az));
        assert_eq!(shown("a-zA\\$"), format!("In('{}A$')", az));
        assert_eq!(shown("^a-zA$"), format!("Not(In('{}A'+END))", az));
        assert_eq!(shown("a-z1-9"), format!("In('{}123456789')", az));
        assert_eq!(shown("a-z-1-9"), format!("In('{}123456789-')", az));
        assert_eq!(shown("a-z-9"), format!("In('{}-9')", az));
    }

    #[test]
    fn test_wide_ranges_stay_ranges() {
        assert_eq!(shown("--z"), "Range('-', 'z')");
        assert_eq!(shown("a\\-z-9"), "(Range('9', 'z'), In('a-'))");
        assert!(chars("\u{100}-\u{1000}").accepts('\u{800}'));
    }

    #[test]
    fn test_cache_identity() {
        let c1 = chars("ab");
        let c2 = chars("ab");
        assert!(c1.ptr_eq(&c2));
        assert!(c1.accepts('a'));
        let n1 = chars("^ab");
        let (neg, inner) = n1.crack();
        assert!(neg);
        assert!(inner.accepts('a'));
        assert!(chars("^ab").ptr_eq(&n1));
        assert!(chars_cache_size() >= 2);
        clear_chars_cache();
        assert_eq!(chars_cache_size(), 0);
    }
}
