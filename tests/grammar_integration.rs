//! Integration tests for the ready-made grammar pieces
//!
//! These tests cover:
//! - A JSON-like document built from collections, strings and numbers
//! - A bare, end-terminated collection (CSV line)
//! - Mandatory end of input with a rendered error

use parsek::engine::{
    chars, end, new_dict, new_list, OnErr, ParseError, Parser, Pattern, Subroutine, Val, Value,
};
use parsek::grammar::{collection, decimal, identifier, int_, string, ws, StringOpts};
use std::collections::HashMap;

// ============================================================================
// JSON-like Documents
// ============================================================================

fn member(value: &Subroutine) -> Subroutine {
    let value = value.clone();
    Subroutine::new(move |p, out| {
        let key = Val::new();
        p.one(ws(), ())
            .one(string(), &key)
            .one(ws(), ())
            .one_or(':', (), "Expected ':'")
            .one(&value, out.entry(&key))
            .into()
    })
    .named("member")
}

fn json_value() -> Subroutine {
    Subroutine::recursive(|p, out, value| {
        let items = new_list();
        let fields = new_dict();
        let object = collection(member(value)).brackets('{', '}');
        p.one(ws(), ())
            .if_().one(string(), out)
            .elif_().one(decimal(), out)
            .elif_()
                .one(
                    Pattern::map([
                        ("true", Value::Bool(true)),
                        ("false", Value::Bool(false)),
                        ("null", Value::Nil),
                    ]),
                    out,
                )
            .elif_()
                .one(collection(value), &items)
                .do_(|p| p.accumulate(out, Value::Array(items.borrow().clone())).is_ok())
            .else_()
                .one(object, &fields)
                .do_(|p| p.accumulate(out, Value::Hash(fields.borrow().clone())).is_ok())
            .endif()
            .into()
    })
    .named("json")
}

fn parse_json(src: &str) -> Result<Option<Value>, ParseError> {
    let doc = Val::new();
    let mut p = Parser::new(src);
    let ok = p
        .one(json_value(), &doc)
        .one(ws(), ())
        .one_or(end(), (), "Unexpected trailing input")
        .result()?;
    Ok(ok.then(|| doc.value()))
}

#[test]
fn test_json_document() {
    let src = r#"
        {
            "name": "parsek",
            "tags": ["fluent", "parser"],
            "version": 3,
            "ratio": -2.5e-1,
            "stable": true,
            "license": null,
            "nested": {"deep": [1, [2, []], {}]}
        }
    "#;
    let doc = parse_json(src).unwrap().unwrap();
    assert_eq!(doc.get("name"), Some(&Value::from("parsek")));
    assert_eq!(
        doc.get("tags"),
        Some(&Value::Array(vec![Value::from("fluent"), Value::from("parser")]))
    );
    assert_eq!(doc.get("version"), Some(&Value::Int(3)));
    assert_eq!(doc.get("ratio"), Some(&Value::Float(-0.25)));
    assert_eq!(doc.get("stable"), Some(&Value::Bool(true)));
    assert_eq!(doc.get("license"), Some(&Value::Nil));

    let deep = doc.get("nested").and_then(|n| n.get("deep")).cloned();
    let want = Value::Array(vec![
        Value::Int(1),
        Value::Array(vec![Value::Int(2), Value::Array(Vec::new())]),
        Value::Hash(HashMap::new()),
    ]);
    assert_eq!(deep, Some(want));
}

#[test]
fn test_json_scalars() {
    assert_eq!(parse_json(" 42 ").unwrap(), Some(Value::Int(42)));
    assert_eq!(parse_json("\"a\\tb\"").unwrap(), Some(Value::from("a\tb")));
    assert_eq!(parse_json("[]").unwrap(), Some(Value::Array(Vec::new())));
    assert_eq!(parse_json("").unwrap(), None);
}

#[test]
fn test_json_trailing_input() {
    match parse_json("{\"a\": 1} extra...") {
        Err(e) => assert_eq!(
            e.to_string(),
            "Unexpected trailing input at: {\"a\": 1} e\u{332}xtra..."
        ),
        Ok(doc) => panic!("expected an error, got {:?}", doc),
    }
}

#[test]
fn test_json_errors_inside_collections() {
    match parse_json("{\"a\" 1}") {
        Err(ParseError::Syntax { message, .. }) => assert_eq!(message, "Expected ':'"),
        other => panic!("expected a syntax error, got {:?}", other),
    }
    match parse_json("[1, 2") {
        Err(ParseError::Syntax { message, .. }) => assert_eq!(message, "Unclosed collection"),
        other => panic!("expected a syntax error, got {:?}", other),
    }
    match parse_json("[\"abc]") {
        Err(ParseError::Syntax { message, .. }) => {
            assert_eq!(message, "String must end with a matching quote")
        }
        other => panic!("expected a syntax error, got {:?}", other),
    }
}

// ============================================================================
// Bare Collections
// ============================================================================

#[test]
fn test_csv_line() {
    let bare = Subroutine::new(|p, out| {
        let start = p.pos();
        if !p.one_or_more(chars("^,$"), ()).is_ok() {
            return parsek::engine::Outcome::Fail;
        }
        let text = p.slice_from(start);
        p.accumulate(out, text.trim_end()).into()
    });
    let line = collection((string(), bare))
        .closer(end())
        .empty_item(|_| Some(Value::from("")));

    let l = new_list();
    let mut p = Parser::new("a,\"b,c\", ,d e ,");
    assert!(p.one(line, &l).is_ok());
    let got: Vec<String> = l.borrow().iter().map(|v| v.to_string()).collect();
    assert_eq!(got, ["a", "b,c", "", "d e", ""]);
    assert!(p.is_past_end());
}

// ============================================================================
// Mixed Pieces
// ============================================================================

#[test]
fn test_assignment_statements() {
    let stmt = Subroutine::new(|p, out| {
        let name = Val::new();
        p.one(ws(), ())
            .one(identifier(), &name)
            .one(ws(), ())
            .one('=', ())
            .one(ws(), ())
            .one((int_(), string()), out.entry(&name))
            .one(ws(), ())
            .one_or(chars(";$"), (), "Expected ';'")
            .into()
    });
    let vars = new_dict();
    let mut p = Parser::new("x = -12; greeting = 'hi'; y = +3");
    assert!(p.one_or_more(&stmt, &vars).one(end(), ()).is_ok());
    let vars = vars.borrow();
    assert_eq!(vars["x"], Value::Int(-12));
    assert_eq!(vars["greeting"], Value::from("hi"));
    assert_eq!(vars["y"], Value::Int(3));
}

#[test]
fn test_quiet_string_errors() {
    let lenient = StringOpts::new().on_err(OnErr::None).build();
    let mut p = Parser::new("'open");
    assert!(!p.one(&lenient, ()).is_ok());
    assert!(p.error().is_none());
    p.set_pos(0);
    assert!(p.one(string(), ()).result().is_err());
}
