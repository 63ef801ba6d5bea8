use thiserror::Error;
use super::{Lexer, Matcher, Token};

pub struct Tokens<'lexer, 'input> {
  lexer: &'lexer Lexer,
  input: &'input str,
  pos: usize,
}

/// A run of input no token class matches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized input `{text}` at {start}..{end}")]
pub struct Error {
  pub text: String,
  pub start: usize,
  pub end: usize,
}

impl<'lexer, 'input> Tokens<'lexer, 'input> {
  pub(super) fn new(lexer: &'lexer Lexer, input: &'input str) -> Self {
    Self {
      lexer,
      input,
      pos: 0,
    }
  }

  fn match_here(&self) -> Option<(&'lexer Matcher, usize)> {
    let rest = &self.input[self.pos..];
    self.lexer.matchers.iter()
      .find_map(|matcher| {
        matcher.regex.find(rest)
          .filter(|m| m.start() == 0 && m.end() > 0)
          .map(|m| (matcher, m.end()))
      })
  }

  fn advance(&mut self) {
    self.pos += 1;
    while !self.input.is_char_boundary(self.pos) {
      self.pos += 1;
    }
  }
}

impl<'lexer, 'input> Iterator for Tokens<'lexer, 'input> {
  type Item = Result<Token<'input>, Error>;

  fn next(&mut self) -> Option<Self::Item> {
    loop {
      if self.pos == self.input.len() {
        return None;
      }

      let start = self.pos;
      match self.match_here() {
        Some((matcher, len)) => {
          self.pos += len;
          if matcher.skip {
            continue;
          }

          return Some(Ok(Token {
            kind: matcher.kind,
            text: &self.input[start..self.pos],
            start,
            end: self.pos,
            inserted: false,
          }));
        }
        None => {
          self.advance();
          while self.pos < self.input.len() && self.match_here().is_none() {
            self.advance();
          }

          let text = &self.input[start..self.pos];
          log::debug!("no token matches {:?} at {}", text, start);

          return Some(Err(Error {
            text: text.to_owned(),
            start,
            end: self.pos,
          }));
        }
      }
    }
  }
}
