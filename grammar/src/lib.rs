use fnv::FnvBuildHasher;

pub mod lexer;
pub mod grammar;
mod token_set;

pub use self::grammar::*;
pub use lexer::{Lexer, LexerError, Token, TokenId, TokenClass, TokenDecl, Vocabulary, VocabularyBuilder};
pub use token_set::TokenSet;

pub type Map<K, V> = indexmap::IndexMap<K, V, FnvBuildHasher>;
pub type Set<K> = indexmap::IndexSet<K, FnvBuildHasher>;
pub type BiMap<L, R> = bimap::BiMap<L, R>;
