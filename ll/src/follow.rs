//! In-rule follow sets of CONSUME/SUBRULE call sites.

use grammar::{DecisionKind, Grammar, Map, Production, RuleId};
use crate::first::FirstAndNullable;
use crate::lookahead::{AfterRepetition, DecisionKey, Lookahead, OccurrenceKey, Target};

#[derive(Debug, Default)]
pub(crate) struct Follows {
  pub occurrences: Map<OccurrenceKey, Lookahead>,
  pub after_repetition: Map<DecisionKey, AfterRepetition>,
}

pub(crate) fn compute(grammar: &Grammar, first: &FirstAndNullable) -> Follows {
  let mut follows = Follows::default();

  for (rule, r) in grammar.iter() {
    let mut walker = Walker {
      grammar,
      first,
      rule,
      follows: &mut follows,
    };
    walker.walk_seq(&r.body, Lookahead::empty(), AfterRepetition::EndOfRule);
  }

  follows
}

/// Walks a rule body right to left, carrying the lookahead of whatever
/// comes after the current production within the rule. A nullable tail
/// means the rule may end there.
struct Walker<'a> {
  grammar: &'a Grammar,
  first: &'a FirstAndNullable,
  rule: RuleId,
  follows: &'a mut Follows,
}

impl<'a> Walker<'a> {
  /// Returns the lookahead of `prods` followed by `tail`.
  fn walk_seq(
    &mut self,
    prods: &[Production],
    mut tail: Lookahead,
    mut next: AfterRepetition,
  ) -> Lookahead {
    for prod in prods.iter().rev() {
      tail = self.walk(prod, tail, next);
      next = match prod {
        Production::Terminal { token, idx } => AfterRepetition::Terminal(*token, *idx),
        _ => AfterRepetition::Other,
      };
    }
    tail
  }

  fn walk(&mut self, prod: &Production, tail: Lookahead, next: AfterRepetition) -> Lookahead {
    match prod {
      Production::Terminal { token, idx } => {
        self.record(Target::Token(*token), *idx, tail);
        Lookahead::token(*token)
      }
      Production::NonTerminal { rule, idx } => {
        let own = self.first.of(self.grammar, prod);
        if let Some(target) = self.grammar.rule_id(rule) {
          self.record(Target::Rule(target), *idx, tail.clone());
        }
        own.then(&tail)
      }
      Production::Option { body, .. } => {
        let mut la = self.walk_seq(body, tail.clone(), next);
        la.union_with(&tail);
        la
      }
      Production::Many { idx, body } => {
        let key = DecisionKey {
          rule: self.rule,
          kind: DecisionKind::Many,
          idx: *idx,
        };
        self.follows.after_repetition.insert(key, next);

        // the end of the body loops back to its own start
        let mut repeat = self.first.of_seq(self.grammar, body);
        repeat.set.union_with(&tail.set);
        repeat.nullable = tail.nullable;

        self.walk_seq(body, repeat.clone(), AfterRepetition::Other);
        repeat
      }
      Production::Or { alts, .. } => {
        let mut la = Lookahead::none();
        for alt in alts {
          let alt_la = self.walk_seq(alt, tail.clone(), next);
          la.union_with(&alt_la);
        }
        la
      }
    }
  }

  fn record(&mut self, target: Target, idx: u32, tail: Lookahead) {
    let key = OccurrenceKey {
      rule: self.rule,
      target,
      idx,
    };
    self.follows.occurrences.insert(key, tail);
  }
}
