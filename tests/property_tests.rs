//! Property-based tests using proptest
//!
//! These tests check engine and grammar behavior across a wide range of
//! generated inputs.

use parsek::engine::{chars, end, new_list, Parser, Pattern, Val, Value};
use parsek::grammar::{collection, decimal, identifier, int_, string, ws};
use parsek::minify::minify;
use proptest::prelude::*;

// =============================================================================
// Character Classes
// =============================================================================

proptest! {
    /// A range class accepts exactly the characters inside the range
    #[test]
    fn test_range_class(c in any::<char>()) {
        prop_assert_eq!(chars("a-z").accepts(c), c.is_ascii_lowercase());
        prop_assert_eq!(chars("^a-z").accepts(c), !c.is_ascii_lowercase());
    }

    /// Wide ranges behave like narrow ones
    #[test]
    fn test_wide_range_class(c in any::<char>()) {
        prop_assert_eq!(chars("\u{100}-\u{2000}").accepts(c), ('\u{100}'..='\u{2000}').contains(&c));
    }
}

// =============================================================================
// Quantifiers
// =============================================================================

proptest! {
    /// repeat(min, max) consumes min(n, max) characters, or nothing below min
    #[test]
    fn test_repeat_bounds(n in 0usize..20, min in 0usize..10, extra in 0usize..10) {
        let max = min + extra;
        let src = format!("{}b", "a".repeat(n));
        let mut p = Parser::new(&src);
        let ok = p.repeat(min, max, 'a', ()).is_ok();
        prop_assert_eq!(ok, n >= min);
        prop_assert_eq!(p.pos(), if ok { n.min(max) } else { 0 });
    }

    /// A failed lookahead block leaves the cursor where the block opened
    #[test]
    fn test_lookahead_restores(src in "[ab]{0,8}", first in "[ab]{1,3}", second in "[ab]{1,3}") {
        let mut p = Parser::new(&src);
        let ok = p.lookahead().one(first.as_str(), ()).one(second.as_str(), ()).merge().is_ok();
        let joined = format!("{}{}", first, second);
        prop_assert_eq!(ok, src.starts_with(&joined));
        prop_assert_eq!(p.pos(), if ok { joined.len() } else { 0 });
        prop_assert!(p.lookahead_stack().is_empty());
    }
}

// =============================================================================
// Grammar
// =============================================================================

proptest! {
    /// Identifiers are delivered verbatim
    #[test]
    fn test_identifier(s in "[a-zA-Z_][a-zA-Z0-9_]{0,19}") {
        let v = Val::new();
        let mut p = Parser::new(&s);
        prop_assert!(p.one(identifier(), &v).one(end(), ()).is_ok());
        prop_assert_eq!(v.text(), s);
    }

    /// Formatted integers parse back to themselves
    #[test]
    fn test_int(n in any::<i64>()) {
        let v = Val::new();
        let mut p = Parser::new(&n.to_string());
        prop_assert!(p.one(int_(), &v).one(end(), ()).is_ok());
        prop_assert_eq!(v.value(), Value::Int(n));
    }

    /// Formatted floats parse back to the same number
    #[test]
    fn test_decimal(f in any::<f64>().prop_filter("finite", |f| f.is_finite())) {
        let v = Val::new();
        let mut p = Parser::new(&f.to_string());
        prop_assert!(p.one(decimal(), &v).one(end(), ()).is_ok());
        prop_assert_eq!(v.value().as_float(), Some(f));
    }

    /// Quoted text without escapes is delivered unchanged
    #[test]
    fn test_plain_string(s in "[^\"\\\\]{0,30}") {
        let v = Val::new();
        let src = format!("\"{}\"", s);
        let mut p = Parser::new(&src);
        prop_assert!(p.one(string(), &v).is_ok());
        prop_assert_eq!(v.text(), s);
    }

    /// Bracketed integer lists parse back to the same items
    #[test]
    fn test_int_collection(items in prop::collection::vec(any::<i32>(), 0..12)) {
        let body: Vec<String> = items.iter().map(|n| n.to_string()).collect();
        let src = format!(" [ {} ] ", body.join(" , "));
        let l = new_list();
        let mut p = Parser::new(&src);
        prop_assert!(p.one(ws(), ()).one(collection(int_()), &l).is_ok());
        let want: Vec<Value> = items.iter().map(|n| Value::Int(*n as i64)).collect();
        prop_assert_eq!(l.borrow().clone(), want);
    }

    /// Alternatives pick the first pattern that matches
    #[test]
    fn test_alternatives_in_order(s in "[abc]{1,4}") {
        let l = new_list();
        let mut p = Parser::new(&s);
        let alts = Pattern::any(["ab", "a", "b", "c"]);
        prop_assert!(p.one_or_more(&alts, &l).one(end(), ()).is_ok());
        let joined: String = l.borrow().iter().map(|v| v.to_string()).collect();
        prop_assert_eq!(joined, s.clone());
        if s.starts_with("ab") {
            prop_assert_eq!(l.borrow()[0].clone(), Value::from("ab"));
        }
    }
}

// =============================================================================
// Minifier
// =============================================================================

fn program() -> impl Strategy<Value = String> {
    let line = (
        "v_[a-z0-9_]{0,8}",
        0u32..1000,
        prop::option::of("[a-z ]{0,12}"),
        0usize..3,
    )
        .prop_map(|(name, value, comment, blanks)| {
            let mut line = format!("{} = {}", name, value);
            if let Some(c) = comment {
                line.push_str("  # ");
                line.push_str(&c);
            }
            line.push('\n');
            line.push_str(&"   \n".repeat(blanks));
            line
        });
    prop::collection::vec(line, 1..10).prop_map(|lines| lines.concat())
}

proptest! {
    /// Minified output has no comments or blank lines, and minifying again
    /// changes nothing
    #[test]
    fn test_minify_idempotent(src in program()) {
        let once = minify(&src).unwrap();
        prop_assert!(!once.contains('#'));
        prop_assert!(!once.contains("\n\n"));
        prop_assert!(once.lines().all(|l| l == l.trim_end()));
        prop_assert_eq!(minify(&once).unwrap(), once);
    }
}
