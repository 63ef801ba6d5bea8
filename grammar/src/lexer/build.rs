use regex::Regex;
use crate::{BiMap, Set};
use super::{LexerError, TokenId};
use super::vocabulary::{TokenClass, TokenDecl, Vocabulary};

pub fn build(decls: Vec<TokenDecl>) -> Result<Vocabulary, LexerError> {
  validate_decls(&decls)?;

  let mut names = BiMap::new();
  let mut classes = Vec::with_capacity(decls.len());
  let mut ancestors: Vec<Vec<TokenId>> = Vec::with_capacity(decls.len() + 1);

  for (i, decl) in decls.into_iter().enumerate() {
    let id = TokenId(i as u32);
    let pattern = match &decl.pattern {
      Some(pattern) => Some(compile(&decl.name, pattern)?),
      None => None,
    };

    let mut chain = vec![id];
    if let Some(parent) = decl.parent {
      chain.extend(ancestors[parent.index()].iter().copied());
    }
    ancestors.push(chain);

    names.insert(id, decl.name);
    classes.push(TokenClass {
      pattern,
      parent: decl.parent,
      skip: decl.skip,
    });
  }

  let eof = TokenId(classes.len() as u32);
  ancestors.push(vec![eof]);

  Ok(Vocabulary {
    names,
    classes,
    ancestors,
  })
}

fn validate_decls(decls: &[TokenDecl]) -> Result<(), LexerError> {
  let mut names = Set::default();

  for (i, decl) in decls.iter().enumerate() {
    if !names.insert(decl.name.as_str()) {
      return Err(LexerError::DuplicateName(decl.name.clone()));
    }

    if let Some(parent) = decl.parent {
      if parent.index() >= i {
        return Err(LexerError::UnknownParent(decl.name.clone()));
      }
    }
  }

  for (i, decl) in decls.iter().enumerate() {
    let has_children = decls.iter()
      .any(|child| child.parent.map_or(false, |p| p.index() == i));
    if decl.pattern.is_none() && !has_children {
      return Err(LexerError::EmptyCategory(decl.name.clone()));
    }
  }

  Ok(())
}

/// Anchors the pattern at the lexer cursor. Patterns that can match
/// nothing anywhere, zero-width assertions included, are rejected.
fn compile(name: &str, pattern: &str) -> Result<Regex, LexerError> {
  let regex = Regex::new(&format!("^(?:{})", pattern))
    .map_err(|source| LexerError::InvalidPattern {
      name: name.to_owned(),
      source,
    })?;

  let min_len = regex_syntax::parse(pattern)
    .ok()
    .and_then(|hir| hir.properties().minimum_len());
  if min_len == Some(0) {
    return Err(LexerError::EmptyMatch(name.to_owned()));
  }

  Ok(regex)
}
