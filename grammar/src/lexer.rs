use regex::Regex;
use thiserror::Error;

pub use tokens::{Tokens, Error};
pub use vocabulary::{Vocabulary, VocabularyBuilder, TokenClass, TokenDecl};

mod build;
mod tokens;
mod vocabulary;

/// Matches token classes in declared order; the first class whose pattern
/// matches a non-empty prefix of the remaining input wins.
#[derive(Debug, Clone)]
pub struct Lexer {
  matchers: Vec<Matcher>,
}

#[derive(Debug, Clone)]
struct Matcher {
  kind: TokenId,
  regex: Regex,
  skip: bool,
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
pub struct TokenId(pub(crate) u32);

#[derive(Default)]
pub(crate) struct TokenIdGen(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'input> {
  pub kind: TokenId,
  pub text: &'input str,
  pub start: usize,
  pub end: usize,
  /// Set on tokens fabricated by error recovery.
  pub inserted: bool,
}

impl TokenIdGen {
  pub fn gen(&mut self) -> TokenId {
    let i = self.0;
    self.0 += 1;
    TokenId(i)
  }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexerError {
  #[error("token `{0}` is declared more than once")]
  DuplicateName(String),
  #[error("parent of token `{0}` must be declared before it")]
  UnknownParent(String),
  #[error("invalid pattern for token `{name}`: {source}")]
  InvalidPattern {
    name: String,
    #[source]
    source: regex::Error,
  },
  #[error("pattern of token `{0}` matches the empty string")]
  EmptyMatch(String),
  #[error("token category `{0}` has no pattern and no descendants")]
  EmptyCategory(String),
}

impl TokenId {
  pub fn id(&self) -> u32 {
    self.0
  }

  pub fn index(self) -> usize {
    self.0 as usize
  }
}

impl<'input> Token<'input> {
  /// An empty token of `kind` at `offset`, standing in for a missing one.
  pub fn inserted(kind: TokenId, offset: usize) -> Self {
    Self {
      kind,
      text: "",
      start: offset,
      end: offset,
      inserted: true,
    }
  }
}

impl Lexer {
  pub fn new(vocab: &Vocabulary) -> Self {
    let matchers = vocab.iter()
      .filter_map(|(kind, class)| {
        class.pattern.as_ref().map(|regex| Matcher {
          kind,
          regex: regex.clone(),
          skip: class.skip,
        })
      })
      .collect();

    Self { matchers }
  }

  pub fn lex<'lexer, 'input>(
    &'lexer self,
    input: &'input str
  ) -> Tokens<'lexer, 'input> {
    Tokens::new(self, input)
  }

  /// Splits the whole input, keeping tokens and unmatched fragments apart.
  pub fn tokenize<'input>(
    &self,
    input: &'input str
  ) -> (Vec<Token<'input>>, Vec<Error>) {
    let mut tokens = vec![];
    let mut errors = vec![];

    for result in self.lex(input) {
      match result {
        Ok(token) => tokens.push(token),
        Err(err) => errors.push(err),
      }
    }

    (tokens, errors)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use insta::assert_debug_snapshot;

  fn kinds<'a>(vocab: &'a Vocabulary, input: &str) -> Vec<(&'a str, String)> {
    let lexer = Lexer::new(vocab);
    lexer.lex(input)
      .map(|result| match result {
        Ok(token) => (vocab.name(token.kind), token.text.to_owned()),
        Err(err) => ("<error>", err.text),
      })
      .collect()
  }

  #[test]
  fn skip() {
    let mut builder = Vocabulary::builder();
    builder.declare(TokenDecl::new("INT", r"\d+"));
    builder.declare(TokenDecl::new("WS", r"[ \n]+").skip());
    builder.declare(TokenDecl::new("COMMENT", r"#[^\n]*").skip());
    let vocab = builder.build().unwrap();

    let tokens = kinds(&vocab, r"  123  456  # lorem ipsum
  0127401  #

 5768   ##dolorsitamet##
    #");

    assert_eq!(tokens, vec![
      ("INT", "123".to_owned()),
      ("INT", "456".to_owned()),
      ("INT", "0127401".to_owned()),
      ("INT", "5768".to_owned()),
    ]);
  }

  #[test]
  fn lex_expr() {
    let mut builder = Vocabulary::builder();
    builder.token("PLUS", r"\+");
    builder.token("MINUS", "-");
    builder.token("MUL", r"\*");
    builder.token("DIV", "/");
    builder.token("LPAREN", r"\(");
    builder.token("RPAREN", r"\)");
    builder.token("COMMA", ",");
    builder.token("NUMBER", r"\d+(\.\d*)?");
    builder.token("IDENT", r"[a-zA-Z][\w_]*");
    builder.declare(TokenDecl::new("WS", r"\s+").skip());
    let vocab = builder.build().unwrap();

    let lexer = Lexer::new(&vocab);
    let tokens = lexer.lex("(3.2 * 51 + Foo_1) / 20. -5  ,    ")
      .map(|t| t.map(|t| (vocab.name(t.kind), t.text, t.start, t.end)))
      .collect::<Vec<_>>();

    assert_debug_snapshot!(tokens, @r###"
    [
        Ok(
            (
                "LPAREN",
                "(",
                0,
                1,
            ),
        ),
        Ok(
            (
                "NUMBER",
                "3.2",
                1,
                4,
            ),
        ),
        Ok(
            (
                "MUL",
                "*",
                5,
                6,
            ),
        ),
        Ok(
            (
                "NUMBER",
                "51",
                7,
                9,
            ),
        ),
        Ok(
            (
                "PLUS",
                "+",
                10,
                11,
            ),
        ),
        Ok(
            (
                "IDENT",
                "Foo_1",
                12,
                17,
            ),
        ),
        Ok(
            (
                "RPAREN",
                ")",
                17,
                18,
            ),
        ),
        Ok(
            (
                "DIV",
                "/",
                19,
                20,
            ),
        ),
        Ok(
            (
                "NUMBER",
                "20.",
                21,
                24,
            ),
        ),
        Ok(
            (
                "MINUS",
                "-",
                25,
                26,
            ),
        ),
        Ok(
            (
                "NUMBER",
                "5",
                26,
                27,
            ),
        ),
        Ok(
            (
                "COMMA",
                ",",
                29,
                30,
            ),
        ),
    ]
    "###);
  }

  #[test]
  fn first_declared_wins() {
    let mut builder = Vocabulary::builder();
    builder.token("IN", "in");
    builder.token("INTEGER", "integer");
    builder.token("IDENT", "[a-z]+");
    let vocab = builder.build().unwrap();

    assert_eq!(kinds(&vocab, "integer"), vec![
      ("IN", "in".to_owned()),
      ("IDENT", "teger".to_owned()),
    ]);
  }

  #[test]
  fn unmatched_input_resumes() {
    let mut builder = Vocabulary::builder();
    builder.token("NUM", r"\d+");
    builder.token("PLUS", r"\+");
    builder.declare(TokenDecl::new("WS", " +").skip());
    let vocab = builder.build().unwrap();

    let lexer = Lexer::new(&vocab);
    let (tokens, errors) = lexer.tokenize("1 + @@1 + 1");

    assert_eq!(
      tokens.iter().map(|t| t.text).collect::<Vec<_>>(),
      vec!["1", "+", "1", "+", "1"]);
    assert_eq!(errors, vec![Error {
      text: "@@".to_owned(),
      start: 4,
      end: 6,
    }]);
  }

  #[test]
  fn unmatched_multibyte_input() {
    let mut builder = Vocabulary::builder();
    builder.token("A", "a");
    let vocab = builder.build().unwrap();

    let (tokens, errors) = Lexer::new(&vocab).tokenize("aλλa");

    assert_eq!(tokens.len(), 2);
    assert_eq!(errors, vec![Error {
      text: "λλ".to_owned(),
      start: 1,
      end: 5,
    }]);
  }

  #[test]
  fn hierarchy() {
    let mut builder = Vocabulary::builder();
    let op = builder.declare(TokenDecl::category("Operator"));
    let add = builder.declare(TokenDecl::category("AdditionOperator").parent(op));
    let plus = builder.declare(TokenDecl::new("Plus", r"\+").parent(add));
    let minus = builder.declare(TokenDecl::new("Minus", "-").parent(add));
    let vocab = builder.build().unwrap();

    assert!(vocab.is_abstract(op));
    assert!(vocab.is_abstract(add));
    assert!(!vocab.is_abstract(plus));
    assert!(vocab.is_a(plus, add));
    assert!(vocab.is_a(plus, op));
    assert!(vocab.is_a(minus, minus));
    assert!(!vocab.is_a(add, plus));
    assert!(!vocab.is_a(plus, minus));
    assert_eq!(vocab.ancestors(plus), &[plus, add, op]);

    let tokens = kinds(&vocab, "+-");
    assert_eq!(tokens, vec![
      ("Plus", "+".to_owned()),
      ("Minus", "-".to_owned()),
    ]);
  }

  #[test]
  fn reject_empty_match() {
    let mut builder = Vocabulary::builder();
    builder.token("DIGITS", r"\d*");

    assert_eq!(builder.build().unwrap_err(), LexerError::EmptyMatch("DIGITS".to_owned()));
  }

  #[test]
  fn reject_zero_width_patterns() {
    for pattern in &[r"\b", "$", "(?:x|)", r"(?m)^\s*"] {
      let mut builder = Vocabulary::builder();
      builder.token("X", "x");
      builder.token("W", pattern);

      assert_eq!(builder.build().unwrap_err(), LexerError::EmptyMatch("W".to_owned()),
        "pattern {:?}", pattern);
    }

    let mut builder = Vocabulary::builder();
    builder.token("WORD", r"\b\w+\b");
    assert!(builder.build().is_ok());
  }

  #[test]
  fn reject_empty_category() {
    let mut builder = Vocabulary::builder();
    builder.declare(TokenDecl::category("Keyword"));
    builder.token("IF", "if");

    assert_eq!(builder.build().unwrap_err(), LexerError::EmptyCategory("Keyword".to_owned()));
  }

  #[test]
  fn reject_duplicate_name() {
    let mut builder = Vocabulary::builder();
    builder.token("IF", "if");
    builder.token("IF", "IF");

    assert_eq!(builder.build().unwrap_err(), LexerError::DuplicateName("IF".to_owned()));
  }

  #[test]
  fn reject_invalid_pattern() {
    let mut builder = Vocabulary::builder();
    builder.token("BAD", "(a");

    assert!(matches!(
      builder.build().unwrap_err(),
      LexerError::InvalidPattern { name, .. } if name == "BAD"));
  }
}
