//! A recursive-descent parsing engine. Rules are plain closures built from
//! the primitives CONSUME, OPTION, MANY, OR and SUBRULE; the rules are
//! recorded once to compute the lookahead of every decision, and syntax
//! errors are recovered by single-token deletion or insertion and by
//! resynchronizing at rule boundaries.

mod builder;
mod error;
mod parser;
mod recovery;
pub mod grammars;
pub mod report;

pub use builder::{Config, Language, LanguageBuilder};
pub use error::*;
pub use parser::{Alt, Parser};
pub use recovery::{InsertAny, RecoveryPolicy};
pub use grammar::{Lexer, Token, TokenDecl, TokenId, Vocabulary};
