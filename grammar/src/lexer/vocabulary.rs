use regex::Regex;
use crate::BiMap;
use super::{build, LexerError, TokenId, TokenIdGen};

/// Declaration of a token class, before validation.
#[derive(Debug, Clone)]
pub struct TokenDecl {
  pub(super) name: String,
  pub(super) pattern: Option<String>,
  pub(super) parent: Option<TokenId>,
  pub(super) skip: bool,
}

/// A validated token class. Classes without a pattern are abstract
/// categories, matched only through their descendants.
#[derive(Debug, Clone)]
pub struct TokenClass {
  pub pattern: Option<Regex>,
  pub parent: Option<TokenId>,
  pub skip: bool,
}

/// The ordered set of token classes a lexer and a language share.
#[derive(Debug, Clone)]
pub struct Vocabulary {
  pub(super) names: BiMap<TokenId, String>,
  pub(super) classes: Vec<TokenClass>,
  /// `ancestors[i]` is the chain `i`, parent of `i`, ..., with a trailing
  /// entry for EOF.
  pub(super) ancestors: Vec<Vec<TokenId>>,
}

#[derive(Default)]
pub struct VocabularyBuilder {
  decls: Vec<TokenDecl>,
  ids: TokenIdGen,
}

impl TokenDecl {
  pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      pattern: Some(pattern.into()),
      parent: None,
      skip: false,
    }
  }

  pub fn category(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      pattern: None,
      parent: None,
      skip: false,
    }
  }

  pub fn parent(mut self, parent: TokenId) -> Self {
    self.parent = Some(parent);
    self
  }

  /// Matched input of this class is dropped by the lexer.
  pub fn skip(mut self) -> Self {
    self.skip = true;
    self
  }
}

impl TokenClass {
  pub fn is_abstract(&self) -> bool {
    self.pattern.is_none()
  }
}

impl VocabularyBuilder {
  pub fn declare(&mut self, decl: TokenDecl) -> TokenId {
    self.decls.push(decl);
    self.ids.gen()
  }

  pub fn token(&mut self, name: &str, pattern: &str) -> TokenId {
    self.declare(TokenDecl::new(name, pattern))
  }

  pub fn build(self) -> Result<Vocabulary, LexerError> {
    build::build(self.decls)
  }
}

impl Vocabulary {
  pub fn builder() -> VocabularyBuilder {
    VocabularyBuilder::default()
  }

  /// Number of declared classes, not counting EOF.
  pub fn len(&self) -> usize {
    self.classes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.classes.is_empty()
  }

  pub fn eof(&self) -> TokenId {
    TokenId(self.classes.len() as u32)
  }

  pub fn name(&self, id: TokenId) -> &str {
    if id == self.eof() {
      return "EOF";
    }
    self.names.get_by_left(&id).map_or("<unknown>", |name| name.as_str())
  }

  pub fn id(&self, name: &str) -> Option<TokenId> {
    self.names.get_by_right(name).copied()
  }

  pub fn class(&self, id: TokenId) -> Option<&TokenClass> {
    self.classes.get(id.index())
  }

  pub fn is_abstract(&self, id: TokenId) -> bool {
    self.class(id).map_or(false, TokenClass::is_abstract)
  }

  pub fn ancestors(&self, id: TokenId) -> &[TokenId] {
    self.ancestors.get(id.index()).map(Vec::as_slice).unwrap_or(&[])
  }

  /// Whether a token of `kind` is accepted where `class` is expected.
  pub fn is_a(&self, kind: TokenId, class: TokenId) -> bool {
    self.ancestors(kind).contains(&class)
  }

  pub fn iter(&self) -> impl Iterator<Item = (TokenId, &TokenClass)> {
    self.classes.iter()
      .enumerate()
      .map(|(i, class)| (TokenId(i as u32), class))
  }
}
