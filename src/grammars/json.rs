use std::fmt::{self, Display, Formatter, Write};
use std::str::Chars;
use indexmap::IndexMap;
use grammar::LexerError;
use crate::{BuildError, LanguageBuilder, Lexer, TokenDecl, TokenId, Vocabulary};
use super::Sample;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
  #[default]
  Null,
  Bool(bool),
  Number(f64),
  String(String),
  Array(Vec<Value>),
  Object(IndexMap<String, Value>),
}

#[derive(Clone, Copy)]
struct Tokens {
  true_: TokenId,
  false_: TokenId,
  null: TokenId,
  lcurly: TokenId,
  rcurly: TokenId,
  lsquare: TokenId,
  rsquare: TokenId,
  comma: TokenId,
  colon: TokenId,
  string: TokenId,
  number: TokenId,
}

pub fn sample() -> Result<Sample<Value>, BuildError> {
  let (vocab, t) = vocabulary()?;
  let lexer = Lexer::new(&vocab);

  let mut builder = LanguageBuilder::<Value>::new(vocab);

  builder.rule("object", move |p| {
    let mut members = IndexMap::new();
    p.consume(1, t.lcurly)?;
    p.option(1, |p| {
      merge(&mut members, p.subrule(1, "objectItem")?);
      p.many(1, |p| {
        p.consume(1, t.comma)?;
        merge(&mut members, p.subrule(2, "objectItem")?);
        Ok(())
      })
    })?;
    p.consume(1, t.rcurly)?;
    Ok(Value::Object(members))
  });

  builder.rule("objectItem", move |p| {
    let key = p.consume(1, t.string)?;
    p.consume(1, t.colon)?;
    let value = p.subrule(1, "value")?;

    let mut member = IndexMap::new();
    member.insert(unescape(key.text), value);
    Ok(Value::Object(member))
  });

  builder.rule("array", move |p| {
    let mut items = vec![];
    p.consume(1, t.lsquare)?;
    p.option(1, |p| {
      items.push(p.subrule(1, "value")?);
      p.many(1, |p| {
        p.consume(1, t.comma)?;
        items.push(p.subrule(2, "value")?);
        Ok(())
      })
    })?;
    p.consume(1, t.rsquare)?;
    Ok(Value::Array(items))
  });

  builder.rule("value", move |p| {
    p.or_labeled(1, "a value", &mut [
      &mut |p| Ok(Value::String(unescape(p.consume(1, t.string)?.text))),
      &mut |p| Ok(Value::Number(p.consume(1, t.number)?.text.parse().unwrap_or_default())),
      &mut |p| p.subrule(1, "object"),
      &mut |p| p.subrule(1, "array"),
      &mut |p| {
        p.consume(1, t.true_)?;
        Ok(Value::Bool(true))
      },
      &mut |p| {
        p.consume(1, t.false_)?;
        Ok(Value::Bool(false))
      },
      &mut |p| {
        p.consume(1, t.null)?;
        Ok(Value::Null)
      },
    ])
  });

  Ok(Sample {
    name: "json",
    lexer,
    language: builder.build()?,
    default_rule: "object",
  })
}

fn vocabulary() -> Result<(Vocabulary, Tokens), LexerError> {
  let mut builder = Vocabulary::builder();
  let tokens = Tokens {
    true_: builder.token("True", "true"),
    false_: builder.token("False", "false"),
    null: builder.token("Null", "null"),
    lcurly: builder.token("LCurly", r"\{"),
    rcurly: builder.token("RCurly", r"\}"),
    lsquare: builder.token("LSquare", r"\["),
    rsquare: builder.token("RSquare", r"\]"),
    comma: builder.token("Comma", ","),
    colon: builder.token("Colon", ":"),
    string: builder.token("StringLiteral",
      r#""(?:[^\\"]|\\(?:[bfnrtv"\\/]|u[0-9a-fA-F]{4}))*""#),
    number: builder.token("NumberLiteral", r"-?(?:0|[1-9]\d*)(?:\.\d+)?(?:[eE][+-]?\d+)?"),
  };
  builder.declare(TokenDecl::new("WhiteSpace", r"\s+").skip());

  Ok((builder.build()?, tokens))
}

/// Members of a recovered item that is not an object are dropped.
fn merge(members: &mut IndexMap<String, Value>, item: Value) {
  if let Value::Object(item) = item {
    members.extend(item);
  }
}

/// Decodes a string literal, quotes included. Malformed escapes decode to
/// U+FFFD.
fn unescape(literal: &str) -> String {
  let inner = literal.strip_prefix('"')
    .and_then(|s| s.strip_suffix('"'))
    .unwrap_or(literal);

  let mut out = String::with_capacity(inner.len());
  let mut chars = inner.chars();
  while let Some(c) = chars.next() {
    if c != '\\' {
      out.push(c);
      continue;
    }

    match chars.next() {
      Some('b') => out.push('\u{8}'),
      Some('f') => out.push('\u{c}'),
      Some('n') => out.push('\n'),
      Some('r') => out.push('\r'),
      Some('t') => out.push('\t'),
      Some('v') => out.push('\u{b}'),
      Some('u') => {
        let c = match hex4(&mut chars) {
          Some(high @ 0xD800..=0xDBFF) if chars.as_str().starts_with("\\u") => {
            chars.next();
            chars.next();
            match hex4(&mut chars) {
              Some(low @ 0xDC00..=0xDFFF) => {
                char::from_u32(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))
              }
              _ => None,
            }
          }
          Some(code) => char::from_u32(code),
          None => None,
        };
        out.push(c.unwrap_or(char::REPLACEMENT_CHARACTER));
      }
      Some(c) => out.push(c),
      None => out.push('\\'),
    }
  }

  out
}

fn hex4(chars: &mut Chars) -> Option<u32> {
  let hex = (0..4).map(|_| chars.next()).collect::<Option<String>>()?;
  u32::from_str_radix(&hex, 16).ok()
}

impl Display for Value {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    match self {
      Value::Null => write!(f, "null"),
      Value::Bool(b) => write!(f, "{}", b),
      Value::Number(n) => write!(f, "{}", n),
      Value::String(s) => write_string(f, s),
      Value::Array(items) => {
        write!(f, "[")?;
        for (i, item) in items.iter().enumerate() {
          if i > 0 {
            write!(f, ",")?;
          }
          write!(f, "{}", item)?;
        }
        write!(f, "]")
      }
      Value::Object(members) => {
        write!(f, "{{")?;
        for (i, (key, value)) in members.iter().enumerate() {
          if i > 0 {
            write!(f, ",")?;
          }
          write_string(f, key)?;
          write!(f, ":{}", value)?;
        }
        write!(f, "}}")
      }
    }
  }
}

fn write_string(f: &mut Formatter, s: &str) -> fmt::Result {
  f.write_char('"')?;
  for c in s.chars() {
    match c {
      '"' => f.write_str("\\\"")?,
      '\\' => f.write_str("\\\\")?,
      '\n' => f.write_str("\\n")?,
      '\r' => f.write_str("\\r")?,
      '\t' => f.write_str("\\t")?,
      c if (c as u32) < 0x20 => write!(f, "\\u{:04x}", c as u32)?,
      c => f.write_char(c)?,
    }
  }
  f.write_char('"')
}
