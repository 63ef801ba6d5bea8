use std::fmt;
use bitvec::prelude::*;
use crate::lexer::{TokenId, Vocabulary};

/// A set of token classes. EOF is an ordinary member.
#[derive(Clone, Default)]
pub struct TokenSet(BitVec);

impl TokenSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn of(token: TokenId) -> Self {
    let mut set = Self::new();
    set.insert(token);
    set
  }

  pub fn insert(&mut self, token: TokenId) -> bool {
    let i = token.index();
    if i >= self.0.len() {
      self.0.resize(i + 1, false);
    }
    let present = self.0[i];
    self.0.set(i, true);
    !present
  }

  pub fn contains(&self, token: TokenId) -> bool {
    self.0.get(token.index()).map_or(false, |bit| *bit)
  }

  /// Whether a token of `kind`, or one of its ancestors, is in the set.
  pub fn matches(&self, vocab: &Vocabulary, kind: TokenId) -> bool {
    vocab.ancestors(kind).iter().any(|&id| self.contains(id))
  }

  pub fn union_with(&mut self, other: &TokenSet) {
    if other.0.len() > self.0.len() {
      self.0.resize(other.0.len(), false);
    }
    for i in other.0.iter_ones() {
      self.0.set(i, true);
    }
  }

  pub fn intersection(&self, other: &TokenSet) -> TokenSet {
    let mut set = TokenSet::new();
    for token in self.iter().filter(|&t| other.contains(t)) {
      set.insert(token);
    }
    set
  }

  pub fn is_empty(&self) -> bool {
    self.0.not_any()
  }

  pub fn len(&self) -> usize {
    self.0.count_ones()
  }

  pub fn iter(&self) -> impl Iterator<Item = TokenId> + '_ {
    self.0.iter_ones().map(|i| TokenId(i as u32))
  }

  pub fn names<'v>(&self, vocab: &'v Vocabulary) -> Vec<&'v str> {
    self.iter().map(|id| vocab.name(id)).collect()
  }
}

impl PartialEq for TokenSet {
  fn eq(&self, other: &Self) -> bool {
    self.iter().eq(other.iter())
  }
}

impl Eq for TokenSet {}

impl fmt::Debug for TokenSet {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_set().entries(self.iter().map(|id| id.id())).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn equality_ignores_capacity() {
    let mut a = TokenSet::new();
    a.insert(TokenId(1));
    a.insert(TokenId(70));
    let mut b = TokenSet::of(TokenId(1));
    b.union_with(&TokenSet::of(TokenId(70)));
    let c = TokenSet::of(TokenId(1));

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.intersection(&c), c);
    assert_eq!(a.len(), 2);
    assert!(TokenSet::of(TokenId(3)).intersection(&c).is_empty());
  }
}
