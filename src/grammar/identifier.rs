//! Identifiers.

use crate::engine::{Outcome, Parser, Pattern, Sink, Subroutine};

thread_local! {
    static IDENTIFIER: Subroutine = Subroutine::new(scan_identifier).named("identifier");
}

/// A letter or `_`, then letters, digits or `_`, delivered as a string
pub fn identifier() -> Subroutine {
    IDENTIFIER.with(Subroutine::clone)
}

fn scan_identifier(p: &mut Parser, out: &Sink) -> Outcome {
    let start = p.pos();
    let ok = p
        .one((Pattern::alpha(), '_'), ())
        .zero_or_more((Pattern::alnum(), '_'), ())
        .is_ok();
    if !ok {
        return Outcome::Fail;
    }
    let name = p.slice_from(start);
    p.accumulate(out, name).into()
}
