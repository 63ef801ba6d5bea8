//! Self-analysis of recorded grammars: nullability, FIRST sets, in-rule
//! follow sets and the lookahead of every decision point.

use grammar::{DecisionKind, Grammar, Vocabulary};
use thiserror::Error;

pub mod first;
mod check;
mod follow;
pub mod lookahead;

pub use lookahead::{
  AfterRepetition, DecisionKey, Lookahead, LookaheadTable, OccurrenceKey, Target,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("rule `{rule}` refers to undeclared rule `{target}`")]
  UnknownRule {
    rule: String,
    target: String,
  },
  #[error("rule `{rule}` uses {production} more than once")]
  DuplicateOccurrence {
    rule: String,
    production: String,
  },
  #[error("left recursion in rule `{rule}`: {}", path.join(" -> "))]
  LeftRecursion {
    rule: String,
    path: Vec<String>,
  },
  #[error("rule `{0}` can never consume a token")]
  NeverConsumes(String),
  #[error("body of {kind} #{idx} in rule `{rule}` can match without consuming input")]
  NullableBody {
    rule: String,
    kind: DecisionKind,
    idx: u32,
  },
}

/// Checks the grammar and computes its lookahead table. The result depends
/// only on `grammar` and `vocab`.
pub fn analyze(grammar: &Grammar, vocab: &Vocabulary) -> Result<LookaheadTable, Error> {
  check::check_references(grammar)?;
  check::check_occurrences(grammar, vocab)?;

  let first = first::compute(grammar);
  check::check_left_recursion(grammar, &first.nullable)?;
  check::check_consumption(grammar, &first)?;
  check::check_repetitions(grammar, &first)?;

  Ok(lookahead::build(grammar, vocab, &first))
}
