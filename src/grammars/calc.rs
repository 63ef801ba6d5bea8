use grammar::LexerError;
use crate::{BuildError, LanguageBuilder, Lexer, TokenDecl, TokenId, Vocabulary};
use super::Sample;

#[derive(Clone, Copy)]
struct Tokens {
  addition_operator: TokenId,
  plus: TokenId,
  multiplication_operator: TokenId,
  multi: TokenId,
  lparen: TokenId,
  rparen: TokenId,
  number: TokenId,
}

/// Arithmetic over `f64` with the usual precedence. Number literals are
/// never inserted during recovery.
pub fn sample() -> Result<Sample<f64>, BuildError> {
  let (vocab, t) = vocabulary()?;
  let lexer = Lexer::new(&vocab);

  let mut builder = LanguageBuilder::<f64>::new(vocab);
  builder.recovery_policy(move |token: TokenId| token != t.number);

  builder.rule("expression", |p| p.subrule(1, "additionExpression"));

  builder.rule("additionExpression", move |p| {
    let mut value = p.subrule(1, "multiplicationExpression")?;
    p.many(1, |p| {
      let op = p.consume(1, t.addition_operator)?;
      let rhs = p.subrule(2, "multiplicationExpression")?;
      if op.kind == t.plus {
        value += rhs;
      } else {
        value -= rhs;
      }
      Ok(())
    })?;
    Ok(value)
  });

  builder.rule("multiplicationExpression", move |p| {
    let mut value = p.subrule(1, "atomicExpression")?;
    p.many(1, |p| {
      let op = p.consume(1, t.multiplication_operator)?;
      let rhs = p.subrule(2, "atomicExpression")?;
      if op.kind == t.multi {
        value *= rhs;
      } else {
        value /= rhs;
      }
      Ok(())
    })?;
    Ok(value)
  });

  builder.rule("atomicExpression", move |p| {
    p.or_labeled(1, "a number or parenthesis expression", &mut [
      &mut |p| p.subrule(1, "parenthesisExpression"),
      &mut |p| Ok(p.consume(1, t.number)?.text.parse::<f64>().unwrap_or_default()),
    ])
  });

  builder.rule("parenthesisExpression", move |p| {
    p.consume(1, t.lparen)?;
    let value = p.subrule(1, "expression")?;
    p.consume(1, t.rparen)?;
    Ok(value)
  });

  Ok(Sample {
    name: "calc",
    lexer,
    language: builder.build()?,
    default_rule: "expression",
  })
}

fn vocabulary() -> Result<(Vocabulary, Tokens), LexerError> {
  let mut builder = Vocabulary::builder();

  let addition_operator = builder.declare(TokenDecl::category("AdditionOperator"));
  let plus = builder.declare(TokenDecl::new("Plus", r"\+").parent(addition_operator));
  builder.declare(TokenDecl::new("Minus", "-").parent(addition_operator));

  let multiplication_operator = builder.declare(TokenDecl::category("MultiplicationOperator"));
  let multi = builder.declare(TokenDecl::new("Multi", r"\*").parent(multiplication_operator));
  builder.declare(TokenDecl::new("Div", "/").parent(multiplication_operator));

  let lparen = builder.token("LParen", r"\(");
  let rparen = builder.token("RParen", r"\)");
  let number = builder.token("NumberLiteral", r"0|[1-9]\d*");
  builder.declare(TokenDecl::new("WhiteSpace", r"\s+").skip());

  let tokens = Tokens {
    addition_operator,
    plus,
    multiplication_operator,
    multi,
    lparen,
    rparen,
    number,
  };
  Ok((builder.build()?, tokens))
}
