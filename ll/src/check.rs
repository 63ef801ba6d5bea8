use std::iter;
use bitvec::prelude::*;
use grammar::{DecisionKind, Grammar, Production, RuleId, Set, TokenId, Vocabulary};
use crate::Error;
use crate::first::FirstAndNullable;

pub(crate) fn check_references(grammar: &Grammar) -> Result<(), Error> {
  for (_, rule) in grammar.iter() {
    check_seq_references(grammar, &rule.name, &rule.body)?;
  }
  Ok(())
}

fn check_seq_references(grammar: &Grammar, rule: &str, prods: &[Production]) -> Result<(), Error> {
  for prod in prods {
    match prod {
      Production::NonTerminal { rule: target, .. } => {
        if grammar.rule_id(target).is_none() {
          return Err(Error::UnknownRule {
            rule: rule.to_owned(),
            target: target.clone(),
          });
        }
      }
      Production::Option { body, .. } | Production::Many { body, .. } => {
        check_seq_references(grammar, rule, body)?;
      }
      Production::Or { alts, .. } => {
        for alt in alts {
          check_seq_references(grammar, rule, alt)?;
        }
      }
      Production::Terminal { .. } => {}
    }
  }
  Ok(())
}

#[derive(PartialEq, Eq, Hash)]
enum Occurrence<'g> {
  Terminal(TokenId, u32),
  NonTerminal(&'g str, u32),
  Decision(DecisionKind, u32),
}

/// Every call site must be distinguishable by its kind, target and index.
pub(crate) fn check_occurrences(grammar: &Grammar, vocab: &Vocabulary) -> Result<(), Error> {
  for (_, rule) in grammar.iter() {
    let mut seen = Set::default();
    collect_occurrences(vocab, &rule.name, &rule.body, &mut seen)?;
  }
  Ok(())
}

fn collect_occurrences<'g>(
  vocab: &Vocabulary,
  rule: &str,
  prods: &'g [Production],
  seen: &mut Set<Occurrence<'g>>,
) -> Result<(), Error> {
  for prod in prods {
    let (occurrence, production) = match prod {
      Production::Terminal { token, idx } => (
        Occurrence::Terminal(*token, *idx),
        format!("CONSUME #{} of `{}`", idx, vocab.name(*token)),
      ),
      Production::NonTerminal { rule: target, idx } => (
        Occurrence::NonTerminal(target, *idx),
        format!("SUBRULE #{} of `{}`", idx, target),
      ),
      Production::Option { idx, .. } => (
        Occurrence::Decision(DecisionKind::Option, *idx),
        format!("{} #{}", DecisionKind::Option, idx),
      ),
      Production::Many { idx, .. } => (
        Occurrence::Decision(DecisionKind::Many, *idx),
        format!("{} #{}", DecisionKind::Many, idx),
      ),
      Production::Or { idx, .. } => (
        Occurrence::Decision(DecisionKind::Or, *idx),
        format!("{} #{}", DecisionKind::Or, idx),
      ),
    };

    if !seen.insert(occurrence) {
      return Err(Error::DuplicateOccurrence {
        rule: rule.to_owned(),
        production,
      });
    }

    match prod {
      Production::Option { body, .. } | Production::Many { body, .. } => {
        collect_occurrences(vocab, rule, body, seen)?;
      }
      Production::Or { alts, .. } => {
        for alt in alts {
          collect_occurrences(vocab, rule, alt, seen)?;
        }
      }
      _ => {}
    }
  }
  Ok(())
}

pub(crate) fn check_left_recursion(grammar: &Grammar, nullable: &BitSlice) -> Result<(), Error> {
  let prefix_rules = grammar.iter()
    .map(|(_, rule)| {
      let mut rules = vec![];
      collect_prefix_rules(grammar, nullable, &rule.body, &mut rules);
      rules
    })
    .collect::<Vec<_>>();

  let mut done = bitvec![0; grammar.len()];
  let mut stack = vec![];
  for (rule, _) in grammar.iter() {
    find_prefix_cycles(grammar, rule, &prefix_rules, &mut done, &mut stack)?;
  }
  Ok(())
}

/// Collects the rules that can be invoked before anything is consumed.
/// Returns whether `prods` is nullable.
fn collect_prefix_rules(
  grammar: &Grammar,
  nullable: &BitSlice,
  prods: &[Production],
  rules: &mut Vec<RuleId>,
) -> bool {
  for prod in prods {
    let prod_nullable = match prod {
      Production::Terminal { .. } => false,
      Production::NonTerminal { rule, .. } => match grammar.rule_id(rule) {
        Some(id) => {
          if !rules.contains(&id) {
            rules.push(id);
          }
          nullable[id.index()]
        }
        None => false,
      },
      Production::Option { body, .. } | Production::Many { body, .. } => {
        collect_prefix_rules(grammar, nullable, body, rules);
        true
      }
      Production::Or { alts, .. } => {
        let mut any_nullable = false;
        for alt in alts {
          any_nullable |= collect_prefix_rules(grammar, nullable, alt, rules);
        }
        any_nullable
      }
    };

    if !prod_nullable {
      return false;
    }
  }
  true
}

fn find_prefix_cycles(
  grammar: &Grammar,
  rule: RuleId,
  prefix_rules: &[Vec<RuleId>],
  done: &mut BitSlice,
  stack: &mut Vec<RuleId>,
) -> Result<(), Error> {
  if let Some(start) = stack.iter().position(|&r| r == rule) {
    let path = stack[start..].iter()
      .chain(iter::once(&rule))
      .map(|&r| grammar.rule_name(r).to_owned())
      .collect();
    return Err(Error::LeftRecursion {
      rule: grammar.rule_name(rule).to_owned(),
      path,
    });
  }

  if done[rule.index()] {
    return Ok(());
  }

  stack.push(rule);
  for &next in &prefix_rules[rule.index()] {
    find_prefix_cycles(grammar, next, prefix_rules, done, stack)?;
  }
  stack.pop();
  done.set(rule.index(), true);

  Ok(())
}

pub(crate) fn check_consumption(grammar: &Grammar, first: &FirstAndNullable) -> Result<(), Error> {
  for (rule, r) in grammar.iter() {
    if first.rule(rule).set.is_empty() {
      return Err(Error::NeverConsumes(r.name.clone()));
    }
  }
  Ok(())
}

/// OPTION and MANY bodies must consume something when taken.
pub(crate) fn check_repetitions(grammar: &Grammar, first: &FirstAndNullable) -> Result<(), Error> {
  for (_, rule) in grammar.iter() {
    check_seq_repetitions(grammar, first, &rule.name, &rule.body)?;
  }
  Ok(())
}

fn check_seq_repetitions(
  grammar: &Grammar,
  first: &FirstAndNullable,
  rule: &str,
  prods: &[Production],
) -> Result<(), Error> {
  for prod in prods {
    match prod {
      Production::Option { idx, body } | Production::Many { idx, body } => {
        if first.of_seq(grammar, body).nullable {
          let kind = match prod {
            Production::Many { .. } => DecisionKind::Many,
            _ => DecisionKind::Option,
          };
          return Err(Error::NullableBody {
            rule: rule.to_owned(),
            kind,
            idx: *idx,
          });
        }
        check_seq_repetitions(grammar, first, rule, body)?;
      }
      Production::Or { alts, .. } => {
        for alt in alts {
          check_seq_repetitions(grammar, first, rule, alt)?;
        }
      }
      _ => {}
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::analyze;
  use pretty_assertions::assert_eq;

  fn vocab() -> (Vocabulary, TokenId, TokenId) {
    let mut builder = Vocabulary::builder();
    let a = builder.token("A", "a");
    let b = builder.token("B", "b");
    (builder.build().unwrap(), a, b)
  }

  fn t(token: TokenId, idx: u32) -> Production {
    Production::Terminal { token, idx }
  }

  fn nt(rule: &str, idx: u32) -> Production {
    Production::NonTerminal { rule: rule.to_owned(), idx }
  }

  #[test]
  fn direct_left_recursion() {
    let (vocab, a, b) = vocab();
    let mut grammar = Grammar::new();
    grammar.add_rule("list", vec![
      Production::Or {
        idx: 1,
        alts: vec![
          vec![nt("list", 1), t(a, 1)],
          vec![t(b, 1)],
        ],
      },
    ]);

    assert_eq!(analyze(&grammar, &vocab).unwrap_err(), Error::LeftRecursion {
      rule: "list".to_owned(),
      path: vec!["list".to_owned(), "list".to_owned()],
    });
  }

  #[test]
  fn left_recursion_through_nullable_prefix() {
    let (vocab, a, b) = vocab();
    let mut grammar = Grammar::new();
    grammar.add_rule("x", vec![
      Production::Option { idx: 1, body: vec![t(a, 1)] },
      nt("y", 1),
    ]);
    grammar.add_rule("y", vec![
      Production::Or {
        idx: 1,
        alts: vec![
          vec![nt("x", 1), t(b, 1)],
          vec![t(b, 2)],
        ],
      },
    ]);

    let err = analyze(&grammar, &vocab).unwrap_err();
    assert_eq!(err.to_string(), "left recursion in rule `x`: x -> y -> x");
  }

  #[test]
  fn recursion_after_consumption_is_fine() {
    let (vocab, a, b) = vocab();
    let mut grammar = Grammar::new();
    grammar.add_rule("nested", vec![
      Production::Or {
        idx: 1,
        alts: vec![
          vec![t(a, 1), nt("nested", 1)],
          vec![t(b, 1)],
        ],
      },
    ]);

    assert!(analyze(&grammar, &vocab).is_ok());
  }

  #[test]
  fn nullable_many_body() {
    let (vocab, a, _) = vocab();
    let mut grammar = Grammar::new();
    grammar.add_rule("opt", vec![
      Production::Option { idx: 1, body: vec![t(a, 1)] },
    ]);
    grammar.add_rule("list", vec![
      t(a, 1),
      Production::Many { idx: 1, body: vec![nt("opt", 1)] },
    ]);

    assert_eq!(analyze(&grammar, &vocab).unwrap_err(), Error::NullableBody {
      rule: "list".to_owned(),
      kind: DecisionKind::Many,
      idx: 1,
    });
  }

  #[test]
  fn duplicate_occurrence() {
    let (vocab, a, _) = vocab();
    let mut grammar = Grammar::new();
    grammar.add_rule("pair", vec![t(a, 1), t(a, 1)]);

    assert_eq!(analyze(&grammar, &vocab).unwrap_err(), Error::DuplicateOccurrence {
      rule: "pair".to_owned(),
      production: "CONSUME #1 of `A`".to_owned(),
    });
  }

  #[test]
  fn unknown_rule() {
    let (vocab, a, _) = vocab();
    let mut grammar = Grammar::new();
    grammar.add_rule("start", vec![t(a, 1), nt("missing", 1)]);

    assert_eq!(analyze(&grammar, &vocab).unwrap_err(), Error::UnknownRule {
      rule: "start".to_owned(),
      target: "missing".to_owned(),
    });
  }

  #[test]
  fn never_consumes() {
    let (vocab, _, _) = vocab();
    let mut grammar = Grammar::new();
    grammar.add_rule("nothing", vec![]);

    assert_eq!(
      analyze(&grammar, &vocab).unwrap_err(),
      Error::NeverConsumes("nothing".to_owned()));
  }
}
