use std::ops::Range;
use grammar::{DecisionKind, Production, RuleId, Token, TokenId, Vocabulary};
use itertools::Itertools;
use ll::{DecisionKey, Lookahead, OccurrenceKey, Target};
use crate::{FatalError, Language, ParseError, ParseOutput, ParseResult, Recovery};
use crate::{SyntaxError, SyntaxErrorKind};

/// One alternative of an OR.
pub type Alt<'f, 'a, V, R> = &'f mut dyn FnMut(&mut Parser<'a, V>) -> ParseResult<R>;

/// The state of one parse: token cursor, rule invocation stack and the
/// errors recovered so far. Rule bodies drive it through the primitives
/// `consume`, `option`, `many`, `or` and `subrule`.
pub struct Parser<'a, V> {
  pub(crate) language: &'a Language<V>,
  pub(crate) tokens: &'a [Token<'a>],
  pub(crate) pos: usize,
  pub(crate) errors: Vec<SyntaxError>,
  pub(crate) stack: Vec<Frame>,
  recorder: Option<Recorder>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
  pub rule: RuleId,
  /// The call site this invocation came from; `None` for the start rule.
  pub call_site: Option<OccurrenceKey>,
}

/// Collects productions while a rule body runs in recording mode.
struct Recorder {
  seqs: Vec<Vec<Production>>,
}

impl Recorder {
  fn push(&mut self, prod: Production) {
    if let Some(seq) = self.seqs.last_mut() {
      seq.push(prod);
    }
  }

  fn open(&mut self) {
    self.seqs.push(vec![]);
  }

  fn close(&mut self) -> Vec<Production> {
    self.seqs.pop().unwrap_or_default()
  }
}

impl<'a, V: Default> Parser<'a, V> {
  pub(crate) fn new(language: &'a Language<V>, tokens: &'a [Token<'a>]) -> Self {
    Self {
      language,
      tokens,
      pos: 0,
      errors: vec![],
      stack: vec![],
      recorder: None,
    }
  }

  pub(crate) fn recording(language: &'a Language<V>, rule: RuleId) -> Self {
    let mut parser = Self::new(language, &[]);
    parser.stack.push(Frame {
      rule,
      call_site: None,
    });
    parser.recorder = Some(Recorder {
      seqs: vec![vec![]],
    });
    parser
  }

  pub(crate) fn finish_recording(mut self) -> Vec<Production> {
    self.recorder.as_mut().map(Recorder::close).unwrap_or_default()
  }

  /// Whether the rules are being recorded rather than run on input.
  /// Semantic actions may skip work while recording.
  pub fn is_recording(&self) -> bool {
    self.recorder.is_some()
  }

  pub fn vocabulary(&self) -> &'a Vocabulary {
    &self.language.vocab
  }

  /// The `k`-th upcoming token, starting at 1. `None` past the end.
  pub fn la(&self, k: usize) -> Option<&Token<'a>> {
    (self.pos + k).checked_sub(1).and_then(|i| self.tokens.get(i))
  }

  pub(crate) fn la_kind(&self, k: usize) -> TokenId {
    self.la(k).map_or(self.language.vocab.eof(), |token| token.kind)
  }

  pub fn errors(&self) -> &[SyntaxError] {
    &self.errors
  }

  pub fn consume(&mut self, idx: u32, token: TokenId) -> ParseResult<Token<'a>> {
    if let Some(recorder) = &mut self.recorder {
      recorder.push(Production::Terminal { token, idx });
      return Ok(Token::inserted(token, 0));
    }

    let vocab = self.vocabulary();
    if let Some(&next) = self.la(1) {
      if vocab.is_a(next.kind, token) {
        self.pos += 1;
        return Ok(next);
      }
    }

    self.recover_in_rule(idx, token)
  }

  pub fn subrule(&mut self, idx: u32, rule: &str) -> ParseResult<V> {
    if let Some(recorder) = &mut self.recorder {
      recorder.push(Production::NonTerminal {
        rule: rule.to_owned(),
        idx,
      });
      return Ok(V::default());
    }

    let language = self.language;
    let target = language.grammar.rule_id(rule)
      .ok_or_else(|| FatalError::UnknownRule(rule.to_owned()))?;
    let call_site = OccurrenceKey {
      rule: self.current_rule(),
      target: Target::Rule(target),
      idx,
    };

    self.invoke(target, Some(call_site))
  }

  /// Runs `body` if the next token can start it.
  pub fn option<R, F>(&mut self, idx: u32, body: F) -> ParseResult<Option<R>>
  where
    F: FnOnce(&mut Self) -> ParseResult<R>
  {
    if self.is_recording() {
      self.open_recording();
      let value = body(self)?;
      let body = self.close_recording();
      self.record(Production::Option { idx, body });
      return Ok(Some(value));
    }

    let key = self.decision_key(DecisionKind::Option, idx);
    let branches = self.decision(&key)?;
    if self.predicts(branches) {
      body(self).map(Some)
    } else {
      Ok(None)
    }
  }

  /// Runs `body` as long as the next token can start it.
  pub fn many<F>(&mut self, idx: u32, mut body: F) -> ParseResult<()>
  where
    F: FnMut(&mut Self) -> ParseResult<()>
  {
    if self.is_recording() {
      self.open_recording();
      body(self)?;
      let body = self.close_recording();
      self.record(Production::Many { idx, body });
      return Ok(());
    }

    let key = self.decision_key(DecisionKind::Many, idx);
    let branches = self.decision(&key)?;
    loop {
      while self.predicts(branches) {
        let start = self.pos;
        body(self)?;
        if self.pos == start {
          return Err(FatalError::NoProgress {
            rule: self.rule_name(),
            idx,
          }.into());
        }
      }

      if !self.recover_in_repetition(&key, branches) {
        return Ok(());
      }
    }
  }

  /// Takes the first alternative the next token can start, else the first
  /// one that can match nothing.
  pub fn or<R>(&mut self, idx: u32, alts: &mut [Alt<'_, 'a, V, R>]) -> ParseResult<R> {
    self.choose(idx, None, alts)
  }

  /// Like `or`, but a failed choice is reported as expecting `label`
  /// (e.g. "a value") instead of the tokens the alternatives start with.
  pub fn or_labeled<R>(
    &mut self,
    idx: u32,
    label: &str,
    alts: &mut [Alt<'_, 'a, V, R>],
  ) -> ParseResult<R> {
    self.choose(idx, Some(label), alts)
  }

  fn choose<R>(
    &mut self,
    idx: u32,
    label: Option<&str>,
    alts: &mut [Alt<'_, 'a, V, R>],
  ) -> ParseResult<R> {
    if self.is_recording() {
      let mut recorded = Vec::with_capacity(alts.len());
      let mut first = None;
      for alt in alts.iter_mut() {
        self.open_recording();
        let value = (**alt)(self)?;
        recorded.push(self.close_recording());
        if first.is_none() {
          first = Some(value);
        }
      }
      self.record(Production::Or { idx, alts: recorded });

      return first.ok_or_else(|| FatalError::EmptyAlternatives {
        rule: self.rule_name(),
        idx,
      }.into());
    }

    let key = self.decision_key(DecisionKind::Or, idx);
    let branches = self.decision(&key)?;
    let vocab = self.vocabulary();
    let next = self.la_kind(1);
    let chosen = branches.iter()
      .position(|branch| branch.set.matches(vocab, next))
      .or_else(|| branches.iter().position(|branch| branch.nullable));

    match chosen.and_then(|i| alts.get_mut(i)) {
      Some(alt) => (**alt)(self),
      None => Err(self.no_viable_alt(branches, label).into()),
    }
  }

  pub(crate) fn invoke(&mut self, rule: RuleId, call_site: Option<OccurrenceKey>) -> ParseResult<V> {
    let language = self.language;
    let def = match language.rules.get(rule.index()) {
      Some(def) => def,
      None => return Err(FatalError::UnknownRule(format!("#{}", rule.id())).into()),
    };

    let limit = language.config.max_depth;
    if self.stack.len() >= limit {
      log::debug!("`{}` at token {} exceeds the nesting limit", def.name, self.pos);
      return Err(FatalError::RecursionLimit {
        rule: def.name.clone(),
        limit,
      }.into());
    }

    log::trace!("enter `{}` at token {}", def.name, self.pos);
    self.stack.push(Frame { rule, call_site });

    let result = match (def.body)(self) {
      Err(ParseError::Syntax(err)) if self.stack.len() > 1 => self.resync(err),
      result => result,
    };

    self.stack.pop();
    result
  }

  pub(crate) fn finish(mut self, start: RuleId, result: ParseResult<V>) -> ParseOutput<V> {
    match result {
      Ok(value) => {
        if let Some(&extra) = self.la(1) {
          let err = SyntaxError {
            kind: SyntaxErrorKind::NotAllInputParsed {
              found: describe(&extra),
            },
            rule: self.language.rule_name(start).to_owned(),
            span: extra.start..extra.end,
            recovery: Recovery::None,
          };
          self.errors.push(err);
        }

        ParseOutput {
          value: Some(value),
          errors: self.errors,
          fatal: None,
        }
      }
      Err(ParseError::Syntax(err)) => {
        let skipped = self.tokens.len().saturating_sub(self.pos);
        let err = err.recovered(Recovery::Resynced { skipped });
        ParseOutput::fatal(FatalError::Unrecoverable(err), self.errors)
      }
      Err(ParseError::Fatal(err)) => ParseOutput::fatal(err, self.errors),
    }
  }

  pub(crate) fn current_rule(&self) -> RuleId {
    // `invoke` and `recording` push a frame before any rule body runs
    self.stack.last().map_or(RuleId::from_index(0), |frame| frame.rule)
  }

  pub(crate) fn rule_name(&self) -> String {
    self.language.rule_name(self.current_rule()).to_owned()
  }

  fn decision_key(&self, kind: DecisionKind, idx: u32) -> DecisionKey {
    DecisionKey {
      rule: self.current_rule(),
      kind,
      idx,
    }
  }

  fn decision(&self, key: &DecisionKey) -> ParseResult<&'a [Lookahead]> {
    let language = self.language;
    language.table.decision(key).ok_or_else(|| FatalError::UnrecordedProduction {
      rule: self.rule_name(),
      production: format!("{} #{}", key.kind, key.idx),
    }.into())
  }

  fn predicts(&self, branches: &[Lookahead]) -> bool {
    let vocab = self.vocabulary();
    let next = self.la_kind(1);
    branches.iter().any(|branch| branch.set.matches(vocab, next))
  }

  /// Span of the next token, or an empty span after the last one.
  pub(crate) fn la_span(&self) -> Range<usize> {
    match self.la(1) {
      Some(token) => token.start..token.end,
      None => {
        let end = self.tokens.last().map_or(0, |token| token.end);
        end..end
      }
    }
  }

  pub(crate) fn describe_la(&self) -> String {
    self.la(1).map_or_else(|| "end of input".to_owned(), describe)
  }

  fn no_viable_alt(&self, branches: &[Lookahead], label: Option<&str>) -> SyntaxError {
    let vocab = self.vocabulary();
    let expected = branches.iter()
      .flat_map(|branch| branch.set.iter())
      .unique()
      .map(|id| vocab.name(id).to_owned())
      .collect();

    SyntaxError {
      kind: SyntaxErrorKind::NoViableAlt {
        label: label.map(str::to_owned),
        expected,
        found: self.describe_la(),
      },
      rule: self.rule_name(),
      span: self.la_span(),
      recovery: Recovery::None,
    }
  }

  fn open_recording(&mut self) {
    if let Some(recorder) = &mut self.recorder {
      recorder.open();
    }
  }

  fn close_recording(&mut self) -> Vec<Production> {
    self.recorder.as_mut().map(Recorder::close).unwrap_or_default()
  }

  fn record(&mut self, prod: Production) {
    if let Some(recorder) = &mut self.recorder {
      recorder.push(prod);
    }
  }
}

fn describe(token: &Token) -> String {
  format!("'{}'", token.text)
}
