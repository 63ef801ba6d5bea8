use grammar::{DecisionKind, Grammar, Map, Production, RuleId, TokenId, TokenSet, Vocabulary};
use itertools::Itertools;
use crate::first::FirstAndNullable;
use crate::follow;

/// Tokens that can come first, and whether nothing needs to be consumed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Lookahead {
  pub set: TokenSet,
  pub nullable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DecisionKey {
  pub rule: RuleId,
  pub kind: DecisionKind,
  pub idx: u32,
}

/// A CONSUME or SUBRULE call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OccurrenceKey {
  pub rule: RuleId,
  pub target: Target,
  pub idx: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
  Token(TokenId),
  Rule(RuleId),
}

/// What directly follows a MANY inside its rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterRepetition {
  Terminal(TokenId, u32),
  EndOfRule,
  Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LookaheadTable {
  /// FIRST of every rule, indexed by `RuleId`.
  pub rules: Vec<Lookahead>,
  /// One entry per branch: the body of OPTION/MANY, or each OR alternative.
  pub decisions: Map<DecisionKey, Vec<Lookahead>>,
  pub follows: Map<OccurrenceKey, Lookahead>,
  pub after_repetition: Map<DecisionKey, AfterRepetition>,
}

impl Lookahead {
  /// Matches nothing but may be skipped.
  pub fn empty() -> Self {
    Self {
      set: TokenSet::new(),
      nullable: true,
    }
  }

  /// Matches nothing.
  pub fn none() -> Self {
    Self::default()
  }

  pub fn token(token: TokenId) -> Self {
    Self {
      set: TokenSet::of(token),
      nullable: false,
    }
  }

  /// Lookahead of `self` followed by `tail`.
  pub fn then(mut self, tail: &Lookahead) -> Self {
    if self.nullable {
      self.set.union_with(&tail.set);
      self.nullable = tail.nullable;
    }
    self
  }

  pub fn union_with(&mut self, other: &Lookahead) {
    self.set.union_with(&other.set);
    self.nullable |= other.nullable;
  }
}

impl LookaheadTable {
  pub fn decision(&self, key: &DecisionKey) -> Option<&[Lookahead]> {
    self.decisions.get(key).map(Vec::as_slice)
  }

  pub fn follow(&self, key: &OccurrenceKey) -> Option<&Lookahead> {
    self.follows.get(key)
  }

  pub fn after_repetition(&self, key: &DecisionKey) -> Option<AfterRepetition> {
    self.after_repetition.get(key).copied()
  }

  pub fn rule(&self, rule: RuleId) -> Option<&Lookahead> {
    self.rules.get(rule.index())
  }
}

pub(crate) fn build(
  grammar: &Grammar,
  vocab: &Vocabulary,
  first: &FirstAndNullable,
) -> LookaheadTable {
  let mut decisions = Map::default();
  for (rule, r) in grammar.iter() {
    collect_decisions(grammar, vocab, first, rule, &r.body, &mut decisions);
  }

  let follows = follow::compute(grammar, first);

  LookaheadTable {
    rules: grammar.iter().map(|(rule, _)| first.rule(rule)).collect(),
    decisions,
    follows: follows.occurrences,
    after_repetition: follows.after_repetition,
  }
}

fn collect_decisions(
  grammar: &Grammar,
  vocab: &Vocabulary,
  first: &FirstAndNullable,
  rule: RuleId,
  prods: &[Production],
  decisions: &mut Map<DecisionKey, Vec<Lookahead>>,
) {
  for prod in prods {
    match prod {
      Production::Option { idx, body } | Production::Many { idx, body } => {
        let kind = match prod {
          Production::Many { .. } => DecisionKind::Many,
          _ => DecisionKind::Option,
        };
        let key = DecisionKey { rule, kind, idx: *idx };
        decisions.insert(key, vec![first.of_seq(grammar, body)]);
        collect_decisions(grammar, vocab, first, rule, body, decisions);
      }
      Production::Or { idx, alts } => {
        let branches = alts.iter()
          .map(|alt| first.of_seq(grammar, alt))
          .collect::<Vec<_>>();
        log_overlaps(grammar, vocab, rule, *idx, &branches);

        let key = DecisionKey { rule, kind: DecisionKind::Or, idx: *idx };
        decisions.insert(key, branches);
        for alt in alts {
          collect_decisions(grammar, vocab, first, rule, alt, decisions);
        }
      }
      _ => {}
    }
  }
}

/// Overlapping alternatives are legal; the first listed one wins.
fn log_overlaps(
  grammar: &Grammar,
  vocab: &Vocabulary,
  rule: RuleId,
  idx: u32,
  branches: &[Lookahead],
) {
  for (i, j) in (0..branches.len()).tuple_combinations() {
    let common = branches[i].set.intersection(&branches[j].set);
    if !common.is_empty() {
      log::debug!(
        "alternatives {} and {} of OR #{} in rule `{}` both start with {}; alternative {} wins",
        i + 1,
        j + 1,
        idx,
        grammar.rule_name(rule),
        common.names(vocab).iter().join(", "),
        i + 1);
    }
  }
}
