use std::thread;
use descent::grammars::json::{self, Value};
use descent::{BuildError, Config, FatalError, Language, LanguageBuilder, ParseError};
use descent::{TokenId, Vocabulary};
use pretty_assertions::assert_eq;

fn vocab() -> (Vocabulary, TokenId, TokenId) {
  let mut builder = Vocabulary::builder();
  let a = builder.token("A", "a");
  let b = builder.token("B", "b");
  (builder.build().unwrap(), a, b)
}

#[test]
fn left_recursion_is_rejected() {
  let (vocab, a, _) = vocab();
  let mut builder = LanguageBuilder::<()>::new(vocab);
  builder.rule("list", move |p| {
    p.subrule(1, "list")?;
    p.consume(1, a)?;
    Ok(())
  });

  match builder.build() {
    Err(BuildError::Analysis(ll::Error::LeftRecursion { rule, path })) => {
      assert_eq!(rule, "list");
      assert_eq!(path, vec!["list".to_owned(), "list".to_owned()]);
    }
    Err(err) => panic!("unexpected {}", err),
    Ok(_) => panic!("left recursion accepted"),
  }
}

#[test]
fn unknown_subrule() {
  let (vocab, a, _) = vocab();
  let mut builder = LanguageBuilder::<()>::new(vocab);
  builder.rule("start", move |p| {
    p.consume(1, a)?;
    p.subrule(1, "missing")
  });

  let err = builder.build().err().unwrap();
  assert_eq!(err.to_string(), "rule `start` refers to undeclared rule `missing`");
}

#[test]
fn duplicate_rule() {
  let (vocab, a, b) = vocab();
  let mut builder = LanguageBuilder::<()>::new(vocab);
  builder.rule("start", move |p| p.consume(1, a).map(drop));
  builder.rule("start", move |p| p.consume(1, b).map(drop));

  assert!(matches!(builder.build(), Err(BuildError::DuplicateRule(name)) if name == "start"));
}

#[test]
fn empty_alternatives() {
  let (vocab, _, _) = vocab();
  let mut builder = LanguageBuilder::<()>::new(vocab);
  builder.rule("start", |p| p.or(1, &mut []));

  match builder.build() {
    Err(BuildError::Recording { rule, error }) => {
      assert_eq!(rule, "start");
      assert_eq!(error, ParseError::Fatal(FatalError::EmptyAlternatives {
        rule: "start".to_owned(),
        idx: 1,
      }));
    }
    Err(err) => panic!("unexpected {}", err),
    Ok(_) => panic!("empty OR accepted"),
  }
}

#[test]
fn nullable_repetition_is_rejected() {
  let (vocab, a, b) = vocab();
  let mut builder = LanguageBuilder::<()>::new(vocab);
  builder.rule("start", move |p| {
    p.consume(1, b)?;
    p.many(1, |p| p.option(1, |p| p.consume(1, a)).map(drop))
  });

  assert!(matches!(
    builder.build(),
    Err(BuildError::Analysis(ll::Error::NullableBody { idx: 1, .. }))));
}

#[test]
fn decisions_use_hierarchy() {
  let mut vocab = Vocabulary::builder();
  let operator = vocab.declare(descent::TokenDecl::category("Operator"));
  vocab.declare(descent::TokenDecl::new("Plus", r"\+").parent(operator));
  vocab.declare(descent::TokenDecl::new("Minus", "-").parent(operator));
  let num = vocab.token("Num", r"\d+");
  let vocab = vocab.build().unwrap();
  let lexer = descent::Lexer::new(&vocab);

  let mut builder = LanguageBuilder::<usize>::new(vocab);
  builder.rule("sum", move |p| {
    p.consume(1, num)?;
    let mut ops = 0;
    p.many(1, |p| {
      p.consume(1, operator)?;
      p.consume(2, num)?;
      ops += 1;
      Ok(())
    })?;
    Ok(ops)
  });
  let language = builder.build().unwrap();

  let (tokens, errors) = lexer.tokenize("1+2-3+4");
  assert!(errors.is_empty());
  let output = language.parse("sum", &tokens);
  assert!(output.is_ok());
  assert_eq!(output.value, Some(3));
}

#[test]
fn analysis_is_deterministic() {
  let sample = json::sample().unwrap();
  let language = &sample.language;

  let again = ll::analyze(language.grammar(), language.vocabulary()).unwrap();
  assert_eq!(&again, language.lookahead());

  let rebuilt = json::sample().unwrap();
  assert_eq!(rebuilt.language.lookahead(), language.lookahead());
}

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn parse_from_many_threads() {
  assert_send_sync::<Language<Value>>();

  let sample = json::sample().unwrap();
  let inputs = [r#"{"a": 1}"#, r#"{"b": [true, false]}"#, r#"{"c" "d"}"#, r#"{"e": {}}"#];

  let results = thread::scope(|s| {
    let handles = inputs.iter()
      .map(|input| {
        let sample = &sample;
        s.spawn(move || sample.run(input).output)
      })
      .collect::<Vec<_>>();

    handles.into_iter()
      .map(|handle| handle.join().unwrap())
      .collect::<Vec<_>>()
  });

  for (input, output) in inputs.iter().zip(&results) {
    assert_eq!(output.value, sample.run(input).output.value);
  }
  assert_eq!(results[2].errors.len(), 1);
}

fn nested_arrays(depth: usize) -> String {
  format!("{{\"a\": {}{}}}", "[".repeat(depth), "]".repeat(depth))
}

#[test]
fn deep_nesting_hits_the_limit() {
  let sample = json::sample().unwrap();
  assert_eq!(sample.language.config().max_depth, 128);

  let shallow = sample.run(&nested_arrays(50)).output;
  assert!(shallow.is_ok(), "{:?}", shallow);

  let deep = sample.run(&nested_arrays(200)).output;
  assert_eq!(deep.value, None);
  assert_eq!(deep.fatal, Some(FatalError::RecursionLimit {
    rule: "value".to_owned(),
    limit: 128,
  }));
}

#[test]
fn nesting_limit_is_configurable() {
  let (vocab, a, b) = vocab();
  let mut builder = LanguageBuilder::<usize>::new(vocab);
  builder.config(Config {
    max_depth: 4,
    ..Config::default()
  });
  builder.rule("nest", move |p| {
    p.or(1, &mut [
      &mut |p| {
        p.consume(1, a)?;
        Ok(p.subrule(1, "nest")? + 1)
      },
      &mut |p| p.consume(1, b).map(|_| 0),
    ])
  });
  let language = builder.build().unwrap();
  let lexer = descent::Lexer::new(language.vocabulary());

  let (tokens, _) = lexer.tokenize("aaab");
  assert_eq!(language.parse("nest", &tokens).value, Some(3));

  match language.parse("nest", &[]).fatal {
    Some(FatalError::Unrecoverable(err)) => {
      assert_eq!(err.kind.to_string(), "expected one of A, B, found end of input");
    }
    other => panic!("unexpected {:?}", other),
  }

  let (tokens, _) = lexer.tokenize("aaaab");
  let output = language.parse("nest", &tokens);
  assert_eq!(output.fatal, Some(FatalError::RecursionLimit {
    rule: "nest".to_owned(),
    limit: 4,
  }));
}
