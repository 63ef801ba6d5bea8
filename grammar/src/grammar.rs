use std::fmt::{self, Display, Formatter};
use crate::Map;
use crate::lexer::{TokenId, Vocabulary};

/// The structure of a language's rules, as recorded from their bodies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grammar {
  pub rules: Map<String, Rule>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
  pub name: String,
  pub body: Vec<Production>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Production {
  Terminal {
    token: TokenId,
    idx: u32,
  },
  NonTerminal {
    rule: String,
    idx: u32,
  },
  Option {
    idx: u32,
    body: Vec<Production>,
  },
  Many {
    idx: u32,
    body: Vec<Production>,
  },
  Or {
    idx: u32,
    alts: Vec<Vec<Production>>,
  },
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
pub enum DecisionKind {
  Option,
  Many,
  Or,
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
pub struct RuleId(u32);

impl RuleId {
  pub fn id(&self) -> u32 {
    self.0
  }

  pub fn index(self) -> usize {
    self.0 as usize
  }

  pub fn from_index(index: usize) -> Self {
    RuleId(index as u32)
  }
}

impl Grammar {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_rule(&mut self, name: &str, body: Vec<Production>) -> RuleId {
    let (index, _) = self.rules.insert_full(name.to_owned(), Rule {
      name: name.to_owned(),
      body,
    });
    RuleId::from_index(index)
  }

  pub fn len(&self) -> usize {
    self.rules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }

  pub fn rule_id(&self, name: &str) -> Option<RuleId> {
    self.rules.get_index_of(name).map(RuleId::from_index)
  }

  pub fn rule(&self, id: RuleId) -> Option<&Rule> {
    self.rules.get_index(id.index()).map(|(_, rule)| rule)
  }

  pub fn rule_name(&self, id: RuleId) -> &str {
    self.rule(id).map_or("<unknown>", |rule| rule.name.as_str())
  }

  pub fn iter(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
    self.rules.values()
      .enumerate()
      .map(|(i, rule)| (RuleId::from_index(i), rule))
  }

  /// Renders the rules in EBNF, one per line.
  pub fn display<'a>(&'a self, vocab: &'a Vocabulary) -> GrammarDisplay<'a> {
    GrammarDisplay {
      grammar: self,
      vocab,
    }
  }
}

impl Production {
  pub fn decision(&self) -> Option<(DecisionKind, u32)> {
    match self {
      Production::Option { idx, .. } => Some((DecisionKind::Option, *idx)),
      Production::Many { idx, .. } => Some((DecisionKind::Many, *idx)),
      Production::Or { idx, .. } => Some((DecisionKind::Or, *idx)),
      _ => None,
    }
  }
}

impl Display for DecisionKind {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    match self {
      DecisionKind::Option => write!(f, "OPTION"),
      DecisionKind::Many => write!(f, "MANY"),
      DecisionKind::Or => write!(f, "OR"),
    }
  }
}

pub struct GrammarDisplay<'a> {
  grammar: &'a Grammar,
  vocab: &'a Vocabulary,
}

impl<'a> GrammarDisplay<'a> {
  fn fmt_seq(&self, f: &mut Formatter, prods: &[Production]) -> fmt::Result {
    for (i, prod) in prods.iter().enumerate() {
      if i > 0 {
        write!(f, " ")?;
      }
      self.fmt_prod(f, prod)?;
    }
    Ok(())
  }

  fn fmt_prod(&self, f: &mut Formatter, prod: &Production) -> fmt::Result {
    match prod {
      Production::Terminal { token, .. } => write!(f, "{}", self.vocab.name(*token)),
      Production::NonTerminal { rule, .. } => write!(f, "{}", rule),
      Production::Option { body, .. } => {
        write!(f, "[")?;
        self.fmt_seq(f, body)?;
        write!(f, "]")
      }
      Production::Many { body, .. } => {
        write!(f, "(")?;
        self.fmt_seq(f, body)?;
        write!(f, ")*")
      }
      Production::Or { alts, .. } => {
        write!(f, "(")?;
        for (i, alt) in alts.iter().enumerate() {
          if i > 0 {
            write!(f, " | ")?;
          }
          self.fmt_seq(f, alt)?;
        }
        write!(f, ")")
      }
    }
  }
}

impl<'a> Display for GrammarDisplay<'a> {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    for rule in self.grammar.rules.values() {
      write!(f, "{} =", rule.name)?;
      if !rule.body.is_empty() {
        write!(f, " ")?;
        self.fmt_seq(f, &rule.body)?;
      }
      writeln!(f)?;
    }
    Ok(())
  }
}
