//! compute FIRST and NULLABLE sets.

use bitvec::prelude::*;
use grammar::{Grammar, Production, RuleId, TokenSet};
use crate::Lookahead;

#[derive(Debug, Clone, PartialEq)]
pub struct FirstAndNullable {
  /// indexed by `RuleId`
  pub first: Vec<TokenSet>,
  pub nullable: BitVec,
}

pub fn compute(grammar: &Grammar) -> FirstAndNullable {
  let nullable = compute_nullable(grammar);
  let first = compute_first(grammar, &nullable);

  FirstAndNullable {
    first,
    nullable,
  }
}

impl FirstAndNullable {
  pub fn rule(&self, rule: RuleId) -> Lookahead {
    Lookahead {
      set: self.first.get(rule.index()).cloned().unwrap_or_default(),
      nullable: self.nullable.get(rule.index()).map_or(false, |bit| *bit),
    }
  }

  /// Lookahead of a single production.
  pub fn of(&self, grammar: &Grammar, prod: &Production) -> Lookahead {
    match prod {
      Production::Terminal { token, .. } => Lookahead::token(*token),
      Production::NonTerminal { rule, .. } => match grammar.rule_id(rule) {
        Some(rule) => self.rule(rule),
        None => Lookahead::none(),
      },
      Production::Option { body, .. } | Production::Many { body, .. } => {
        Lookahead {
          set: self.of_seq(grammar, body).set,
          nullable: true,
        }
      }
      Production::Or { alts, .. } => {
        let mut la = Lookahead::none();
        for alt in alts {
          la.union_with(&self.of_seq(grammar, alt));
        }
        la
      }
    }
  }

  pub fn of_seq(&self, grammar: &Grammar, prods: &[Production]) -> Lookahead {
    let mut la = Lookahead::empty();
    for prod in prods {
      la = la.then(&self.of(grammar, prod));
      if !la.nullable {
        break;
      }
    }
    la
  }
}

fn compute_first(grammar: &Grammar, nullable: &BitSlice) -> Vec<TokenSet> {
  let mut first = vec![None; grammar.len()];
  let mut visiting = bitvec![0; grammar.len()];

  for (rule, _) in grammar.iter() {
    compute_rule_first(grammar, nullable, &mut first, &mut visiting, rule);
  }

  first.into_iter().map(Option::unwrap_or_default).collect()
}

/// A rule reached again while its own FIRST set is being computed
/// contributes nothing on that path.
fn compute_rule_first(
  grammar: &Grammar,
  nullable: &BitSlice,
  first: &mut [Option<TokenSet>],
  visiting: &mut BitSlice,
  rule: RuleId,
) {
  let i = rule.index();
  if first[i].is_some() || visiting[i] {
    return;
  }

  visiting.set(i, true);
  let mut set = TokenSet::new();
  if let Some(r) = grammar.rule(rule) {
    collect_seq(grammar, nullable, first, visiting, &r.body, &mut set);
  }
  visiting.set(i, false);

  first[i] = Some(set);
}

/// Returns whether `prods` can match without consuming anything.
fn collect_seq(
  grammar: &Grammar,
  nullable: &BitSlice,
  first: &mut [Option<TokenSet>],
  visiting: &mut BitSlice,
  prods: &[Production],
  set: &mut TokenSet,
) -> bool {
  for prod in prods {
    if !collect(grammar, nullable, first, visiting, prod, set) {
      return false;
    }
  }
  true
}

fn collect(
  grammar: &Grammar,
  nullable: &BitSlice,
  first: &mut [Option<TokenSet>],
  visiting: &mut BitSlice,
  prod: &Production,
  set: &mut TokenSet,
) -> bool {
  match prod {
    Production::Terminal { token, .. } => {
      set.insert(*token);
      false
    }
    Production::NonTerminal { rule, .. } => match grammar.rule_id(rule) {
      Some(id) => {
        compute_rule_first(grammar, nullable, first, visiting, id);
        if let Some(rule_first) = &first[id.index()] {
          set.union_with(rule_first);
        }
        nullable[id.index()]
      }
      None => false,
    },
    Production::Option { body, .. } | Production::Many { body, .. } => {
      collect_seq(grammar, nullable, first, visiting, body, set);
      true
    }
    Production::Or { alts, .. } => {
      let mut any_nullable = false;
      for alt in alts {
        any_nullable |= collect_seq(grammar, nullable, first, visiting, alt, set);
      }
      any_nullable
    }
  }
}

fn compute_nullable(grammar: &Grammar) -> BitVec {
  let mut nullable = bitvec![0; grammar.len()];

  loop {
    let mut changed = false;

    for (rule, r) in grammar.iter() {
      if !nullable[rule.index()] && seq_nullable(grammar, &nullable, &r.body) {
        nullable.set(rule.index(), true);
        changed = true;
      }
    }

    if !changed {
      break;
    }
  }

  nullable
}

fn seq_nullable(grammar: &Grammar, nullable: &BitSlice, prods: &[Production]) -> bool {
  prods.iter().all(|prod| match prod {
    Production::Terminal { .. } => false,
    Production::NonTerminal { rule, .. } => grammar.rule_id(rule)
      .map_or(false, |id| nullable[id.index()]),
    Production::Option { .. } | Production::Many { .. } => true,
    Production::Or { alts, .. } => alts.iter()
      .any(|alt| seq_nullable(grammar, nullable, alt)),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use grammar::{TokenId, Vocabulary};
  use pretty_assertions::assert_eq;

  fn t(token: TokenId) -> Production {
    Production::Terminal { token, idx: 1 }
  }

  fn nt(rule: &str) -> Production {
    Production::NonTerminal { rule: rule.to_owned(), idx: 1 }
  }

  #[test]
  fn expression_grammar() {
    let mut builder = Vocabulary::builder();
    let plus = builder.token("Plus", r"\+");
    let lparen = builder.token("LParen", r"\(");
    let rparen = builder.token("RParen", r"\)");
    let num = builder.token("Num", r"\d+");
    let sign = builder.token("Sign", "-");
    let vocab = builder.build().unwrap();

    let mut grammar = Grammar::new();
    let expr = grammar.add_rule("expr", vec![
      nt("signed"),
      Production::Many { idx: 1, body: vec![t(plus), nt("signed")] },
    ]);
    let signed = grammar.add_rule("signed", vec![
      nt("sign"),
      nt("atom"),
    ]);
    let sign_rule = grammar.add_rule("sign", vec![
      Production::Option { idx: 1, body: vec![t(sign)] },
    ]);
    let atom = grammar.add_rule("atom", vec![
      Production::Or {
        idx: 1,
        alts: vec![
          vec![t(num)],
          vec![t(lparen), nt("expr"), t(rparen)],
        ],
      },
    ]);

    let result = compute(&grammar);

    assert_eq!(result.rule(sign_rule).nullable, true);
    assert_eq!(result.rule(signed).nullable, false);
    assert_eq!(result.rule(atom).set.names(&vocab), vec!["LParen", "Num"]);
    assert_eq!(result.rule(signed).set.names(&vocab), vec!["LParen", "Num", "Sign"]);
    assert_eq!(result.rule(expr).set, result.rule(signed).set);

    let many = &grammar.rules["expr"].body[1];
    let la = result.of(&grammar, many);
    assert_eq!(la.set.names(&vocab), vec!["Plus"]);
    assert!(la.nullable);
  }

  #[test]
  fn recursion_terminates() {
    let mut builder = Vocabulary::builder();
    let a = builder.token("A", "a");
    let b = builder.token("B", "b");
    let vocab = builder.build().unwrap();

    let mut grammar = Grammar::new();
    let x = grammar.add_rule("x", vec![
      Production::Or { idx: 1, alts: vec![vec![nt("y")], vec![t(a)]] },
    ]);
    grammar.add_rule("y", vec![
      Production::Or { idx: 1, alts: vec![vec![nt("x")], vec![t(b)]] },
    ]);

    let result = compute(&grammar);

    assert_eq!(result.rule(x).set.names(&vocab), vec!["A", "B"]);
  }
}
