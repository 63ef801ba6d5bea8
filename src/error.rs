use std::ops::Range;
use thiserror::Error;

/// How the parser got past a syntax error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
  /// The unexpected token was dropped.
  Deleted,
  /// The expected token was fabricated.
  Inserted,
  /// Tokens were skipped up to one that can follow the failed construct.
  Resynced { skipped: usize },
  None,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
  #[error("expected {expected}, found {found}")]
  MismatchedToken {
    expected: String,
    found: String,
  },
  #[error("expected {}, found {found}", alternatives(.label, .expected))]
  NoViableAlt {
    /// What the decision chooses between, when the rule describes it.
    label: Option<String>,
    expected: Vec<String>,
    found: String,
  },
  #[error("expected end of input, found {found}")]
  NotAllInputParsed {
    found: String,
  },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} in rule `{rule}`")]
pub struct SyntaxError {
  pub kind: SyntaxErrorKind,
  pub rule: String,
  pub span: Range<usize>,
  pub recovery: Recovery,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FatalError {
  #[error("no rule named `{0}`")]
  UnknownRule(String),
  #[error("unrecoverable syntax error: {0}")]
  Unrecoverable(SyntaxError),
  #[error("MANY #{idx} in rule `{rule}` matched without consuming input")]
  NoProgress {
    rule: String,
    idx: u32,
  },
  #[error("{production} in rule `{rule}` was not seen while recording the rule")]
  UnrecordedProduction {
    rule: String,
    production: String,
  },
  #[error("rule `{rule}` is nested deeper than the limit of {limit}")]
  RecursionLimit {
    rule: String,
    limit: usize,
  },
  #[error("OR #{idx} in rule `{rule}` has no alternatives")]
  EmptyAlternatives {
    rule: String,
    idx: u32,
  },
}

/// The error type of every parsing primitive. Rule bodies propagate it
/// with `?`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
  #[error(transparent)]
  Syntax(SyntaxError),
  #[error(transparent)]
  Fatal(FatalError),
}

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Vocabulary(#[from] grammar::LexerError),
  #[error("rule `{0}` is declared more than once")]
  DuplicateRule(String),
  #[error("recording rule `{rule}` failed: {error}")]
  Recording {
    rule: String,
    error: ParseError,
  },
  #[error(transparent)]
  Analysis(#[from] ll::Error),
}

/// Result of parsing one token sequence. `value` is `None` exactly when
/// `fatal` is set.
#[derive(Debug)]
pub struct ParseOutput<V> {
  pub value: Option<V>,
  pub errors: Vec<SyntaxError>,
  pub fatal: Option<FatalError>,
}

fn alternatives(label: &Option<String>, expected: &[String]) -> String {
  match label {
    Some(label) => label.clone(),
    None => format!("one of {}", expected.join(", ")),
  }
}

impl SyntaxError {
  pub(crate) fn recovered(mut self, recovery: Recovery) -> Self {
    self.recovery = recovery;
    self
  }
}

impl<V> ParseOutput<V> {
  pub(crate) fn fatal(err: FatalError, errors: Vec<SyntaxError>) -> Self {
    Self {
      value: None,
      errors,
      fatal: Some(err),
    }
  }

  /// No syntax errors, recovered or not.
  pub fn is_ok(&self) -> bool {
    self.errors.is_empty() && self.fatal.is_none()
  }
}

impl From<SyntaxError> for ParseError {
  fn from(err: SyntaxError) -> Self {
    ParseError::Syntax(err)
  }
}

impl From<FatalError> for ParseError {
  fn from(err: FatalError) -> Self {
    ParseError::Fatal(err)
  }
}
