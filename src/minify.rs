//! Python source minifier built on the engine.
//!
//! Each pass is a small grammar driven in a loop until it reaches the end of
//! its input:
//!
//! 1. comments and statement-level triple-quoted strings
//! 2. blank lines
//! 3. trailing spaces
//! 4. `if __debug__:` blocks, promoting a paired `else:` block into place
//! 5. single-line `assert` statements
//! 6. blank lines and trailing spaces again
//!
//! A leading comment block, such as a license header, is kept.
//!
//! # Example
//!
//! ```
//! use parsek::minify::minify;
//!
//! let src = "# header\nx = 1  # one\n\n\nassert x\ny = 2\n";
//! assert_eq!(minify(src).unwrap(), "# header\nx = 1\ny = 2\n");
//! ```

use crate::engine::{
    chars, end, OneCtx, Outcome, ParseError, Parser, Pattern, Quantifier, Sink, Subroutine, Val,
};
use crate::grammar::{Escapes, StringOpts};
use std::path::{Path, PathBuf};

/// What the structural passes removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MinifyStats {
    /// `if __debug__:` blocks removed
    pub debug_blocks: usize,
    /// `else:` blocks promoted in place of a removed debug block
    pub promoted_else: usize,
    /// `assert` statements removed
    pub assertions: usize,
}

/// Minify Python source
pub fn minify(src: &str) -> Result<String, ParseError> {
    minify_with_stats(src).map(|(out, _)| out)
}

/// Minify Python source and report what was removed
pub fn minify_with_stats(src: &str) -> Result<(String, MinifyStats), ParseError> {
    let header = first_comment(src);
    let mut stats = MinifyStats::default();

    let out = remove_comments_and_triple_quotes(src)?;
    let out = remove_empty_lines(&out)?;
    let out = remove_trailing_ws(&out)?;
    let out = remove_debug(&out, &mut stats)?;
    let out = remove_assertions(&out, &mut stats)?;
    let out = remove_empty_lines(&out)?;
    let out = remove_trailing_ws(&out)?;

    log_debug!("minify: {:?}", stats);
    Ok((format!("{}{}", header.trim_end(), out), stats))
}

/// Output file name for `input` in the current directory.
///
/// `a.py` becomes `a_min.py` and `a` becomes `a_min`; any other suffix is
/// kept inside the name, so `a.txt` becomes `a.txt_min`.
pub fn derive_output_path(input: &Path) -> PathBuf {
    let name = |p: Option<&std::ffi::OsStr>| {
        p.map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
    };
    match input.extension() {
        None => PathBuf::from(format!("{}_min", name(input.file_stem()))),
        Some(ext) if ext == "py" => PathBuf::from(format!("{}_min.py", name(input.file_stem()))),
        Some(_) => PathBuf::from(format!("{}_min", name(input.file_name()))),
    }
}

/// The comment lines at the very top of `src`
pub fn first_comment(src: &str) -> String {
    let mut p = Parser::new(src);
    let out = Val::of("");
    let line = Subroutine::new(|p, _| {
        p.one('#', ())
            .zero_or_more(chars("^\n$"), ())
            .one('\n', ())
            .into()
    });
    p.quantify(Quantifier::new(0, None), &line, (), &out);
    out.text()
}

/// Drop comments and triple-quoted strings that stand as statements.
///
/// String literals are copied verbatim, so a `#` inside one is kept.
pub fn remove_comments_and_triple_quotes(src: &str) -> Result<String, ParseError> {
    let mut p = Parser::new(src);
    let out = Val::of("");
    let keep = OneCtx::new().acc(&out);
    let triple = triple_quoted();
    let quoted = StringOpts::new().escapes(Escapes::Raw).build();

    while p.is_active()
        && p.zero_or_more(chars("^'\"#$"), &out)
            .if_()
                .one('#', ())
                .zero_or_more(chars("^\n$"), ())
                .one(chars("\n$"), &out)
            .elif_()
                .check(|| at_line_start(&out))
                .one(&triple, ())
            .elif_()
                .one_with(&triple, (), &keep)
            .elif_()
                .one_with(&quoted, (), &keep)
            .else_()
                .one(end(), ())
                .end()
            .endif()
            .is_ok()
    {}
    finish(p, &out)
}

/// Drop lines that are empty or hold only spaces and tabs
pub fn remove_empty_lines(src: &str) -> Result<String, ParseError> {
    let mut p = Parser::new(src);
    let out = Val::of("");
    let blank = Subroutine::new(|p, _| {
        p.zero_or_more(chars("\t "), ()).one('\n', ()).into()
    });

    while p.is_active()
        && p.zero_or_more(chars("^\n$"), &out)
            .if_()
                .one('\n', &out)
                .zero_or_more(&blank, ())
            .else_()
                .one(end(), ())
                .end()
            .endif()
            .is_ok()
    {}
    finish(p, &out)
}

/// Drop spaces before line ends
pub fn remove_trailing_ws(src: &str) -> Result<String, ParseError> {
    let mut p = Parser::new(src);
    let out = Val::of("");

    while p.is_active()
        && p.zero_or_more(chars("^ $"), &out)
            .if_()
                .one(' ', ())
                .zero_or_more(' ', ())
                .one('\n', &out)
            .elif_()
                .one(' ', &out)
            .else_()
                .one(end(), ())
                .end()
            .endif()
            .is_ok()
    {}
    finish(p, &out)
}

/// Drop `if __debug__:` blocks.
///
/// A paired `else:` block replaces the removed block at its indentation.
pub fn remove_debug(src: &str, stats: &mut MinifyStats) -> Result<String, ParseError> {
    let mut p = Parser::new(src);
    let out = Val::of("");
    let removed = Val::of(0);
    let promoted = Val::of(0);
    let block = debug_block(removed.clone(), promoted.clone());

    while p.is_active()
        && p.zero_or_more(chars("^\n$"), &out)
            .if_()
                .one(&block, &out)
            .elif_()
                .one('\n', &out)
            .else_()
                .one(end(), ())
                .end()
            .endif()
            .is_ok()
    {}
    stats.debug_blocks += count(&removed);
    stats.promoted_else += count(&promoted);
    finish(p, &out)
}

/// Drop single-line `assert` statements
pub fn remove_assertions(src: &str, stats: &mut MinifyStats) -> Result<String, ParseError> {
    let mut p = Parser::new(src);
    let out = Val::of("");
    let removed = Val::of(0);

    while p.is_active()
        && p.zero_or_more(chars("^\n$"), &out)
            .if_()
                .one('\n', ())
                .zero_or_more(' ', ())
                .one("assert ", ())
                .one_or_more(chars("^\n$"), ())
                .do_(|_| removed.inc().is_ok())
            .elif_()
                .one('\n', &out)
            .else_()
                .one(end(), ())
                .end()
            .endif()
            .is_ok()
    {}
    stats.assertions += count(&removed);
    finish(p, &out)
}

fn finish(mut p: Parser, out: &Val) -> Result<String, ParseError> {
    if let Some(err) = p.take_error() {
        return Err(err);
    }
    if !p.is_end_state() {
        return Err(p.syntax_error("Unexpected input"));
    }
    Ok(out.text())
}

fn count(v: &Val) -> usize {
    v.value().as_int().map_or(0, |n| n.max(0) as usize)
}

// '''...''' or """...""", without escape handling
fn triple_quoted() -> Subroutine {
    Subroutine::new(|p, _| {
        let quote = Val::new();
        p.one(Pattern::any(["\"\"\"", "'''"]), &quote)
            .zero_or_more(Pattern::any([Pattern::from(&quote), end()]).not(), ())
            .one(&quote, ())
            .into()
    })
    .named("triple_quoted")
}

// Only indentation since the last emitted line break
fn at_line_start(out: &Val) -> bool {
    out.with(|v| {
        v.as_str()
            .and_then(|s| s.rsplit('\n').next())
            .map_or(true, |line| line.trim().is_empty())
    })
}

fn debug_block(removed: Val, promoted: Val) -> Subroutine {
    Subroutine::new(move |p, out| {
        let indent = Val::of("");
        let else_body = Val::of("");
        p.one('\n', ())
            .zero_or_more(' ', &indent)
            .one("if ", ())
            .zero_or_more(' ', ())
            .one(Pattern::any(["__debug__", "DEBUG"]), ())
            .zero_or_more(' ', ())
            .one(':', ())
            .zero_or_more(' ', ())
            .if_()
                .one_or_more(chars("^\n$"), ())
            .else_()
                .one('\n', ())
                .do_(|p| block_body(p, indent.len(), &Sink::None))
            .endif()
            .do_(|_| removed.inc().is_ok())
            .if_()
                .one('\n', ())
                .exactly(indent.len(), ' ', ())
                .one("else", ())
                .zero_or_more(' ', ())
                .one(':', ())
                .zero_or_more(' ', ())
                .accumulate(&else_body, "\n")
                .if_()
                    .one_or_more(chars("^\n$"), &else_body)
                .else_()
                    .one('\n', ())
                    .do_(|p| block_body(p, indent.len(), &Sink::from(&else_body)))
                .endif()
                .do_(|_| promoted.inc().is_ok())
                .do_(|p| {
                    let body = reindent(&dedent(&else_body.text()), &indent.text());
                    p.accumulate(out, body).outcome()
                })
            .endif()
            .into()
    })
    .isolated()
    .named("debug_block")
}

// Lines indented deeper than `indent`, starting just after a line break
fn block_body(p: &mut Parser, indent: usize, acc: &Sink) -> Outcome {
    let min = indent + 1;
    let line = Subroutine::new(move |p, _| {
        p.one('\n', ())
            .at_least(min, ' ', ())
            .one_or_more(chars("^\n$"), ())
            .into()
    });
    let start = p.pos();
    if !p
        .one(' ', ())
        .one_or_more(chars("^\n$"), ())
        .zero_or_more(&line, ())
        .is_ok()
    {
        return Outcome::Fail;
    }
    let text = p.slice_from(start);
    p.accumulate(acc, text).into()
}

fn dedent(text: &str) -> String {
    let margin = text
        .split('\n')
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);
    text.split('\n')
        .map(|l| if l.trim().is_empty() { "" } else { &l[margin..] })
        .collect::<Vec<_>>()
        .join("\n")
}

fn reindent(text: &str, prefix: &str) -> String {
    text.split('\n')
        .map(|l| {
            if l.trim().is_empty() {
                l.to_string()
            } else {
                format!("{}{}", prefix, l)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
