//! Renders lexing and parsing errors against the source text.

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFile;
use codespan_reporting::term::{self, termcolor::NoColor};
use grammar::lexer;
use crate::{FatalError, ParseOutput, Recovery, SyntaxError};

pub fn report<V>(
  path: &str,
  input: &str,
  lex_errors: &[lexer::Error],
  output: &ParseOutput<V>,
) -> String {
  let file = SimpleFile::new(path, input);
  let config = term::Config::default();
  let mut writer = NoColor::new(Vec::new());

  for diagnostic in diagnostics(lex_errors, output) {
    if let Err(err) = term::emit(&mut writer, &config, &file, &diagnostic) {
      log::warn!("cannot render diagnostic: {}", err);
    }
  }

  String::from_utf8_lossy(&writer.into_inner()).into_owned()
}

pub fn diagnostics<V>(
  lex_errors: &[lexer::Error],
  output: &ParseOutput<V>,
) -> Vec<Diagnostic<()>> {
  let mut diagnostics = lex_errors.iter()
    .map(lex_diagnostic)
    .collect::<Vec<_>>();

  diagnostics.extend(output.errors.iter().map(syntax_diagnostic));
  diagnostics.extend(output.fatal.iter().map(fatal_diagnostic));
  diagnostics
}

fn lex_diagnostic(err: &lexer::Error) -> Diagnostic<()> {
  Diagnostic::error()
    .with_message("unrecognized input")
    .with_labels(vec![
      Label::primary((), err.start..err.end)
        .with_message(format!("no token matches `{}`", err.text)),
    ])
}

fn syntax_diagnostic(err: &SyntaxError) -> Diagnostic<()> {
  let recovery = match err.recovery {
    Recovery::Deleted => "skipped this token".to_owned(),
    Recovery::Inserted => "assumed the missing token here".to_owned(),
    Recovery::Resynced { skipped } => format!("skipped {} token(s) to resume", skipped),
    Recovery::None => "not recovered".to_owned(),
  };

  Diagnostic::error()
    .with_message(err.kind.to_string())
    .with_labels(vec![Label::primary((), err.span.clone()).with_message(recovery)])
    .with_notes(vec![format!("in rule `{}`", err.rule)])
}

fn fatal_diagnostic(err: &FatalError) -> Diagnostic<()> {
  match err {
    FatalError::Unrecoverable(err) => Diagnostic::error()
      .with_message(format!("parsing stopped: {}", err.kind))
      .with_labels(vec![Label::primary((), err.span.clone())])
      .with_notes(vec![format!("in rule `{}`", err.rule)]),
    FatalError::RecursionLimit { .. } => Diagnostic::error().with_message(err.to_string()),
    err => Diagnostic::bug().with_message(err.to_string()),
  }
}
