use grammar::{Grammar, Production, RuleId, Token, Vocabulary};
use ll::LookaheadTable;
use crate::{BuildError, ParseOutput, ParseResult, Parser};
use crate::recovery::{InsertAny, RecoveryPolicy};

pub(crate) type RuleFn<V> = Box<dyn for<'a> Fn(&mut Parser<'a, V>) -> ParseResult<V> + Send + Sync>;

pub(crate) struct RuleDef<V> {
  pub name: String,
  pub body: RuleFn<V>,
}

#[derive(Debug, Clone)]
pub struct Config {
  /// When off, the first syntax error ends the parse.
  pub recovery_enabled: bool,
  /// Deepest rule nesting a parse may reach before it is abandoned with
  /// `FatalError::RecursionLimit`.
  pub max_depth: usize,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      recovery_enabled: true,
      max_depth: 128,
    }
  }
}

/// Collects the rules of a language. Nothing can be parsed until `build`
/// has recorded the rules and computed their lookahead.
pub struct LanguageBuilder<V> {
  vocab: Vocabulary,
  rules: Vec<RuleDef<V>>,
  policy: Box<dyn RecoveryPolicy>,
  config: Config,
}

/// A fully analyzed set of rules, shareable between threads.
pub struct Language<V> {
  pub(crate) vocab: Vocabulary,
  pub(crate) rules: Vec<RuleDef<V>>,
  pub(crate) grammar: Grammar,
  pub(crate) table: LookaheadTable,
  pub(crate) policy: Box<dyn RecoveryPolicy>,
  pub(crate) config: Config,
}

impl<V: Default> LanguageBuilder<V> {
  pub fn new(vocab: Vocabulary) -> Self {
    Self {
      vocab,
      rules: vec![],
      policy: Box::new(InsertAny),
      config: Config::default(),
    }
  }

  pub fn rule<F>(&mut self, name: &str, body: F) -> &mut Self
  where
    F: for<'a> Fn(&mut Parser<'a, V>) -> ParseResult<V> + Send + Sync + 'static
  {
    self.rules.push(RuleDef {
      name: name.to_owned(),
      body: Box::new(body),
    });
    self
  }

  pub fn recovery_policy(&mut self, policy: impl RecoveryPolicy + 'static) -> &mut Self {
    self.policy = Box::new(policy);
    self
  }

  pub fn config(&mut self, config: Config) -> &mut Self {
    self.config = config;
    self
  }

  /// Records every rule body and runs the self-analysis.
  pub fn build(self) -> Result<Language<V>, BuildError> {
    let mut language = Language {
      vocab: self.vocab,
      rules: self.rules,
      grammar: Grammar::new(),
      table: LookaheadTable::default(),
      policy: self.policy,
      config: self.config,
    };

    let mut grammar = Grammar::new();
    for (i, def) in language.rules.iter().enumerate() {
      if grammar.rule_id(&def.name).is_some() {
        return Err(BuildError::DuplicateRule(def.name.clone()));
      }

      let body = record(&language, RuleId::from_index(i), def)?;
      grammar.add_rule(&def.name, body);
    }

    log::debug!("recorded grammar:\n{}", grammar.display(&language.vocab));

    language.table = ll::analyze(&grammar, &language.vocab)?;
    language.grammar = grammar;

    Ok(language)
  }
}

fn record<V: Default>(
  language: &Language<V>,
  rule: RuleId,
  def: &RuleDef<V>,
) -> Result<Vec<Production>, BuildError> {
  let mut parser = Parser::recording(language, rule);
  (def.body)(&mut parser)
    .map_err(|error| BuildError::Recording {
      rule: def.name.clone(),
      error,
    })?;
  Ok(parser.finish_recording())
}

impl<V: Default> Language<V> {
  /// Parses `tokens` starting from `rule`.
  pub fn parse(&self, rule: &str, tokens: &[Token<'_>]) -> ParseOutput<V> {
    let start = match self.grammar.rule_id(rule) {
      Some(start) => start,
      None => return ParseOutput::fatal(
        crate::FatalError::UnknownRule(rule.to_owned()), vec![]),
    };

    let mut parser = Parser::new(self, tokens);
    let result = parser.invoke(start, None);
    parser.finish(start, result)
  }
}

impl<V> Language<V> {
  pub fn vocabulary(&self) -> &Vocabulary {
    &self.vocab
  }

  pub fn grammar(&self) -> &Grammar {
    &self.grammar
  }

  pub fn lookahead(&self) -> &LookaheadTable {
    &self.table
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub(crate) fn rule_name(&self, rule: RuleId) -> &str {
    self.rules.get(rule.index()).map_or("<unknown>", |def| def.name.as_str())
  }
}
