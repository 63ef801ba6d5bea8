//! Grammars built on the engine, bundled with their lexers.

use grammar::lexer;
use crate::{Language, Lexer, ParseOutput};

pub mod calc;
pub mod json;

pub struct Sample<V> {
  pub name: &'static str,
  pub lexer: Lexer,
  pub language: Language<V>,
  pub default_rule: &'static str,
}

#[derive(Debug)]
pub struct Outcome<V> {
  pub lex_errors: Vec<lexer::Error>,
  pub output: ParseOutput<V>,
}

impl<V: Default> Sample<V> {
  /// Lexes `input` and parses it from the default rule.
  pub fn run(&self, input: &str) -> Outcome<V> {
    self.run_rule(self.default_rule, input)
  }

  pub fn run_rule(&self, rule: &str, input: &str) -> Outcome<V> {
    let (tokens, lex_errors) = self.lexer.tokenize(input);
    let output = self.language.parse(rule, &tokens);

    Outcome {
      lex_errors,
      output,
    }
  }
}
