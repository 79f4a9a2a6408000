//! Engine benchmarks
//!
//! Three workloads are measured:
//! 1. Character scanning - compiled classes driven by quantifiers
//! 2. JSON-like documents - recursive collections of strings and numbers
//! 3. Minifier - a generated Python module
//!
//! Run with: cargo bench --bench engine

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use parsek::engine::{chars, end, new_dict, new_list, Parser, Pattern, Subroutine, Val, Value};
use parsek::grammar::{collection, decimal, identifier, string, ws};
use parsek::minify::minify;

// ============================================================================
// Character Scanning
// ============================================================================

fn words(n: usize) -> String {
    (0..n).map(|i| format!("word{} ", i)).collect()
}

fn scan_words(src: &str) -> usize {
    let l = new_list();
    let mut p = Parser::new(src);
    let _ = p
        .one_or_more(
            Subroutine::new(|p, out| {
                p.one(identifier(), out).zero_or_more(chars(" \t"), ()).into()
            }),
            &l,
        )
        .one(end(), ());
    let n = l.borrow().len();
    n
}

fn scan_class(src: &str) -> usize {
    let mut p = Parser::new(src);
    let _ = p.zero_or_more(chars("^\n$"), ());
    p.pos()
}

fn bench_scanning(c: &mut Criterion) {
    let mut g = c.benchmark_group("scanning");
    let small = words(100);
    let large = words(5_000);
    g.bench_function("class_small", |b| b.iter(|| scan_class(black_box(&small))));
    g.bench_function("class_large", |b| b.iter(|| scan_class(black_box(&large))));
    g.bench_function("identifiers_small", |b| {
        b.iter(|| scan_words(black_box(&small)))
    });
    g.bench_function("identifiers_large", |b| {
        b.iter(|| scan_words(black_box(&large)))
    });
    g.finish();
}

// ============================================================================
// JSON-like Documents
// ============================================================================

mod json {
    use super::*;

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
    }

    pub fn value() -> Subroutine {
        Subroutine::recursive(|p, out, value| {
            let items = new_list();
            let fields = new_dict();
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
                    .one(collection(member(value)).brackets('{', '}'), &fields)
                    .do_(|p| p.accumulate(out, Value::Hash(fields.borrow().clone())).is_ok())
                .endif()
                .into()
        })
        .named("json")
    }

    pub fn parse(grammar: &Subroutine, src: &str) -> Option<Value> {
        let doc = Val::new();
        let mut p = Parser::new(src);
        p.one(grammar, &doc)
            .one(ws(), ())
            .one(end(), ())
            .is_ok()
            .then(|| doc.value())
    }

    pub fn document(records: usize) -> String {
        let body: Vec<String> = (0..records)
            .map(|i| {
                format!(
                    r#"{{"id": {}, "name": "item {}", "price": {}.25, "tags": ["a", "b"], "live": true}}"#,
                    i, i, i
                )
            })
            .collect();
        format!("[{}]", body.join(",\n "))
    }
}

fn bench_json(c: &mut Criterion) {
    let mut g = c.benchmark_group("json");
    let grammar = json::value();
    g.bench_function("scalar", |b| {
        b.iter(|| json::parse(&grammar, black_box("42")))
    });
    let small = json::document(10);
    g.bench_function("records_10", |b| {
        b.iter(|| json::parse(&grammar, black_box(&small)))
    });
    let large = json::document(500);
    g.bench_function("records_500", |b| {
        b.iter(|| json::parse(&grammar, black_box(&large)))
    });
    g.finish();
}

// ============================================================================
// Minifier
// ============================================================================

fn module(functions: usize) -> String {
    let mut src = String::from("# generated module\nimport sys\n\n");
    for i in 0..functions {
        src.push_str(&format!(
            "\ndef f{i}(x):  # helper {i}\n    \"\"\"Docstring for f{i}.\"\"\"\n    if __debug__:\n        print('f{i}', x)\n    assert x is not None\n    return x + {i}\n\n"
        ));
    }
    src
}

fn bench_minify(c: &mut Criterion) {
    let mut g = c.benchmark_group("minify");
    let small = module(5);
    let large = module(200);
    g.bench_function("module_small", |b| b.iter(|| minify(black_box(&small))));
    g.bench_function("module_large", |b| b.iter(|| minify(black_box(&large))));
    g.finish();
}

criterion_group!(benches, bench_scanning, bench_json, bench_minify);
criterion_main!(benches);
