//! Integration tests for quantifiers
//!
//! These tests cover:
//! - Bounded repetition and its named shorthands
//! - Undoing a run that falls short of its minimum
//! - Per-iteration sinks versus the block sink
//! - The iteration ceiling

use parsek::engine::{
    new_list, List, ParseError, Parser, ParserConfig, Pattern, Quantifier, Val,
};

fn strings(l: &List) -> Vec<String> {
    l.borrow().iter().map(|v| v.to_string()).collect()
}

// ============================================================================
// Fixed Bounds
// ============================================================================

#[test]
fn test_repeat() {
    let r = new_list();
    let mut p = Parser::new("12345z");
    assert!(p.repeat(1, 3, Pattern::digit(), &r).is_ok());
    assert_eq!(strings(&r), ["1", "2", "3"]);
    assert!(p.repeat(1, 5, Pattern::digit(), &r).is_ok());
    assert_eq!(strings(&r), ["1", "2", "3", "4", "5"]);
    assert!(!p.repeat(1, 5, Pattern::digit(), &r).is_ok());
    assert_eq!(r.borrow().len(), 5);

    p.set_pos(p.len());
    assert!(p.one(parsek::end(), ()).end().is_ok());
    let b = p.repeat(1, 5, Pattern::digit(), &r);
    assert!(!b.is_active());
}

#[test]
fn test_at_least_and_at_most() {
    let r = new_list();
    let mut p = Parser::new("ABCDE_FGHIJ");
    assert!(p.at_least(3, Pattern::alpha(), &r).is_ok());
    assert_eq!(strings(&r), ["A", "B", "C", "D", "E"]);
    assert!(!p.at_least(1, Pattern::alpha(), &r).is_ok());
    assert!(p.at_least_ic(1, "_f", &r).is_ok());
    assert_eq!(strings(&r).last().map(String::as_str), Some("_F"));

    let r = new_list();
    let mut p = Parser::new("ABCDE_FGHIJ");
    assert!(p.at_most(3, Pattern::alpha(), &r).is_ok());
    assert!(p.at_most(5, Pattern::alpha(), &r).is_ok());
    assert!(p.at_most(1, Pattern::alpha(), &r).is_ok());
    assert_eq!(strings(&r), ["A", "B", "C", "D", "E"]);
    assert!(p.at_most_ic(1, "_f", &r).is_ok());
    assert_eq!(p.pos(), 7);
}

#[test]
fn test_exactly() {
    let r = new_list();
    let mut p = Parser::new("ABCDE_FGHIJ");
    assert!(p.exactly(3, Pattern::alpha(), &r).is_ok());
    assert!(p.exactly(2, Pattern::alpha(), &r).is_ok());
    assert!(!p.exactly(1, Pattern::alpha(), &r).is_ok());
    assert!(p.exactly_ic(1, "_f", &r).is_ok());
    assert_eq!(strings(&r), ["A", "B", "C", "D", "E", "_F"]);
}

#[test]
fn test_optional_and_unbounded() {
    let r = new_list();
    let mut p = Parser::new("12");
    assert!(p.zero_or_one(Pattern::digit(), &r).is_ok());
    assert!(p.zero_or_one(Pattern::alpha(), &r).is_ok());
    assert!(p.zero_or_one(Pattern::digit(), &r).is_ok());
    assert!(p.zero_or_one(Pattern::digit(), &r).is_ok());
    assert_eq!(strings(&r), ["1", "2"]);

    let r = new_list();
    let mut p = Parser::new("123abc");
    assert!(p.zero_or_more(Pattern::alpha(), &r).is_ok());
    assert!(p.one_or_more(Pattern::digit(), &r).is_ok());
    assert!(!p.one_or_more(Pattern::digit(), &r).is_ok());
    assert!(p.zero_or_more(Pattern::digit(), &r).is_ok());
    assert!(p.one_or_more(Pattern::alpha(), &r).is_ok());
    assert_eq!(strings(&r), ["1", "2", "3", "a", "b", "c"]);
    assert!(p.is_end());
}

// ============================================================================
// Named Quantifiers
// ============================================================================

#[test]
fn test_named_counts() {
    let r = Val::new();
    let mut p = Parser::new("aaaaaabb");
    assert!(p.times("zero_to_2", 'a', &r).is_ok());
    assert_eq!(r, "aa");
    r.reset();
    assert!(p.times("three", 'a', &r).is_ok());
    assert_eq!(r, "aaa");
    r.reset();
    assert!(!p.times_into("three", 'a', (), &r).is_ok());
    assert!(r.is_none());
    assert!(p.times_into("one_to_three", 'a', (), &r).is_ok());
    assert!(p.times_into("one_to_three", 'b', (), &r).is_ok());
    assert_eq!(r, "abb");
    r.reset();
    assert!(p.times_into("zero_to_three", 'b', (), &r).is_ok());
    assert!(r.is_none());
}

#[test]
fn test_compact_names_and_backtracking() {
    let mut p = Parser::new("AAB");
    assert!(p.times("x2_3", 'A', ()).is_ok());
    assert_eq!((p.pos(), p.ch()), (2, Some('B')));

    let mut p = Parser::new("AAAA");
    assert!(p.times("x2_", 'A', ()).is_ok());
    assert_eq!(p.pos(), 4);

    let mut p = Parser::new("AX");
    assert!(!p.times("x2", 'A', ()).is_ok());
    assert_eq!(p.pos(), 0);

    let mut p = Parser::new("A");
    assert!(!p.times("x2_3", 'A', ()).is_ok());
    assert_eq!(p.pos(), 0);
}

#[test]
fn test_block_sink_receives_one_slice() {
    let chars = Val::new();
    let block = Val::new();
    let mut p = Parser::new("AAAAAX");
    assert!(p.times_into("x2_3", 'A', &chars, &block).is_ok());
    assert_eq!(p.pos(), 3);
    assert_eq!(chars, "AAA");
    assert_eq!(block, "AAA");

    let l = new_list();
    let block = new_list();
    let mut p = Parser::new("AAAAAX");
    assert!(p.quantify(Quantifier::new(2, None), 'A', &l, &block).is_ok());
    assert_eq!(l.borrow().len(), 5);
    assert_eq!(strings(&block), ["AAAAA"]);
}

#[test]
fn test_block_sink_untouched_without_iterations() {
    let chars = Val::new();
    let block = Val::new();
    let mut p = Parser::new("BBB");
    assert!(p.times_into("zero_to_three", 'a', &chars, &block).is_ok());
    assert_eq!(p.pos(), 0);
    assert!(chars.is_none());
    assert!(block.is_none());
}

#[test]
fn test_case_insensitive_names_keep_casing() {
    let r = Val::new();
    let mut p = Parser::new("AaA!");
    assert!(p.times_into("three_ic", 'a', (), &r).is_ok());
    assert_eq!(r, "AaA");
    assert_eq!(p.ch(), Some('!'));

    let mut p = Parser::new("AaAX");
    assert!(p.times("x3i", 'a', ()).is_ok());
    assert_eq!(p.pos(), 3);
}

#[test]
fn test_mixed_spelled_and_numeric_names() {
    let r1 = Val::new();
    let r2 = Val::new();
    let mut p = Parser::new("AABBBX");
    assert!(p.times_into("one_to_three", 'A', (), &r1).is_ok());
    assert!(p.times_into("two_to_5", 'B', (), &r2).is_ok());
    assert_eq!(r1, "AA");
    assert_eq!(r2, "BBB");
    assert_eq!(p.ch(), Some('X'));
}

#[test]
fn test_unknown_name_raises() {
    let mut p = Parser::new("AAA");
    match p.times("two_or_five", 'A', ()).result() {
        Err(ParseError::UnknownQuantifier { name }) => assert_eq!(name, "two_or_five"),
        other => panic!("expected an unknown quantifier, got {:?}", other),
    }
    assert_eq!(p.pos(), 0);
}

// ============================================================================
// Iteration Ceiling
// ============================================================================

#[test]
fn test_iteration_ceiling() {
    let config = ParserConfig::new().with_parse_limit(3);
    for bounded in [true, false] {
        let r = new_list();
        let mut p = Parser::with_config("12345z", config.clone());
        let b = if bounded {
            p.repeat(1, 6, Pattern::digit(), &r)
        } else {
            p.zero_or_more(Pattern::digit(), &r)
        };
        match b.result() {
            Err(e @ ParseError::IterationLimit { limit: 3, .. }) => {
                assert!(e.to_string().starts_with("Infinite loop or input too long"));
            }
            other => panic!("expected the iteration ceiling, got {:?}", other),
        }
        assert_eq!(strings(&r), ["1", "2", "3", "4"]);
    }
}
