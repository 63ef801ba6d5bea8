use grammar::{Token, TokenId, TokenSet};
use ll::{AfterRepetition, DecisionKey, Lookahead, OccurrenceKey, Target};
use crate::{ParseError, ParseResult, Parser, Recovery, SyntaxError, SyntaxErrorKind};
use crate::parser::Frame;

/// Decides which token classes may be fabricated by insertion recovery.
/// Abstract classes are never inserted, whatever the policy says.
pub trait RecoveryPolicy: Send + Sync {
  fn can_insert(&self, token: TokenId) -> bool;
}

impl<F> RecoveryPolicy for F
where
  F: Fn(TokenId) -> bool + Send + Sync
{
  fn can_insert(&self, token: TokenId) -> bool {
    self(token)
  }
}

/// Allows inserting any concrete class.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsertAny;

impl RecoveryPolicy for InsertAny {
  fn can_insert(&self, _: TokenId) -> bool {
    true
  }
}

impl<'a, V: Default> Parser<'a, V> {
  /// Single-token deletion, then single-token insertion.
  pub(crate) fn recover_in_rule(&mut self, idx: u32, expected: TokenId) -> ParseResult<Token<'a>> {
    let err = self.mismatch(expected);
    if !self.language.config.recovery_enabled {
      return Err(err.into());
    }

    let vocab = self.vocabulary();
    if let Some(&token) = self.la(2) {
      if vocab.is_a(token.kind, expected) {
        log::debug!("{}: deleting {}", err, self.describe_la());
        self.pos += 2;
        self.errors.push(err.recovered(Recovery::Deleted));
        return Ok(token);
      }
    }

    if self.can_insert(idx, expected) {
      log::debug!("{}: inserting {}", err, vocab.name(expected));
      let offset = self.la_span().start;
      self.errors.push(err.recovered(Recovery::Inserted));
      return Ok(Token::inserted(expected, offset));
    }

    Err(err.into())
  }

  fn can_insert(&self, idx: u32, expected: TokenId) -> bool {
    let language = self.language;
    let vocab = &language.vocab;
    if vocab.is_abstract(expected) || !language.policy.can_insert(expected) {
      return false;
    }

    let key = OccurrenceKey {
      rule: self.current_rule(),
      target: Target::Token(expected),
      idx,
    };
    let follow = match language.table.follow(&key) {
      Some(follow) => follow,
      None => return false,
    };

    let next = self.la_kind(1);
    follow.set.matches(vocab, next)
      || (follow.nullable && self.resync_set().matches(vocab, next))
  }

  fn can_recover_in_rule(&self, idx: u32, expected: TokenId) -> bool {
    let vocab = self.vocabulary();
    vocab.is_a(self.la_kind(2), expected) || self.can_insert(idx, expected)
  }

  /// Union of what can follow every invocation on the stack.
  fn resync_set(&self) -> TokenSet {
    let mut set = TokenSet::new();
    for frame in &self.stack {
      set.union_with(&self.frame_follow(frame));
    }
    set
  }

  fn frame_follow(&self, frame: &Frame) -> TokenSet {
    let language = self.language;
    match &frame.call_site {
      Some(call_site) => language.table.follow(call_site)
        .map(|follow| follow.set.clone())
        .unwrap_or_default(),
      None => TokenSet::of(language.vocab.eof()),
    }
  }

  /// Position of the first token at or after the cursor that is in the
  /// resync set. EOF is always in it.
  fn find_resync_point(&self, set: &TokenSet) -> (usize, TokenId) {
    let vocab = self.vocabulary();
    let mut pos = self.pos;
    while let Some(token) = self.tokens.get(pos) {
      if set.matches(vocab, token.kind) {
        return (pos, token.kind);
      }
      pos += 1;
    }
    (pos, vocab.eof())
  }

  /// Called with the frame of the failed rule still on the stack. Either
  /// skips to a token that can follow this invocation and yields the
  /// hole value, or hands the error to the caller.
  pub(crate) fn resync(&mut self, err: SyntaxError) -> ParseResult<V> {
    if !self.language.config.recovery_enabled {
      return Err(err.into());
    }

    let vocab = self.vocabulary();
    let (target, kind) = self.find_resync_point(&self.resync_set());
    let current = match self.stack.last() {
      Some(frame) => self.frame_follow(frame),
      None => return Err(err.into()),
    };

    if !current.matches(vocab, kind) {
      return Err(ParseError::Syntax(err));
    }

    let skipped = target - self.pos;
    log::debug!("{}: resuming after `{}` at {}, skipped {} token(s)",
      err, self.rule_name(), vocab.name(kind), skipped);
    self.pos = target;
    self.errors.push(err.recovered(Recovery::Resynced { skipped }));

    Ok(V::default())
  }

  /// After a MANY loop stops, skips tokens when the next iteration can be
  /// found before anything that would end the repetition. Returns whether
  /// the loop should resume.
  pub(crate) fn recover_in_repetition(&mut self, key: &DecisionKey, branches: &[Lookahead]) -> bool {
    let language = self.language;
    if !language.config.recovery_enabled {
      return false;
    }

    let vocab = &language.vocab;
    let (expected, idx) = match language.table.after_repetition(key) {
      Some(AfterRepetition::Terminal(token, idx)) => (token, Some(idx)),
      Some(AfterRepetition::EndOfRule) if self.stack.len() == 1 => (vocab.eof(), None),
      _ => return false,
    };

    if vocab.is_a(self.la_kind(1), expected) {
      return false;
    }
    if let Some(idx) = idx {
      if self.can_recover_in_rule(idx, expected) {
        return false;
      }
    }

    let (_, resync_kind) = self.find_resync_point(&self.resync_set());
    let err = self.mismatch(expected);
    let start = self.pos;

    loop {
      let kind = self.la_kind(1);
      let resumes = branches.iter().any(|branch| branch.set.matches(vocab, kind));
      if vocab.is_a(kind, expected) || resumes {
        let skipped = self.pos - start;
        log::debug!("{}: skipped {} token(s) in MANY #{} of `{}`",
          err, skipped, key.idx, self.rule_name());
        self.errors.push(err.recovered(Recovery::Resynced { skipped }));
        return resumes;
      }

      if kind == resync_kind || kind == vocab.eof() {
        break;
      }
      self.pos += 1;
    }

    self.pos = start;
    false
  }

  fn mismatch(&self, expected: TokenId) -> SyntaxError {
    SyntaxError {
      kind: SyntaxErrorKind::MismatchedToken {
        expected: self.vocabulary().name(expected).to_owned(),
        found: self.describe_la(),
      },
      rule: self.rule_name(),
      span: self.la_span(),
      recovery: Recovery::None,
    }
  }
}
