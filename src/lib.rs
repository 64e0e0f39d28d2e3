pub mod automaton;
pub mod driver;
pub mod error;
pub mod grammar;
pub mod item;
pub mod lexer;
pub(crate) mod macros;
pub mod sets;
pub mod symbol;
pub mod table;
pub mod tree;

pub use automaton::{Automaton, State, StateId};
pub use driver::{Driver, Parsed, Parser, Phase};
pub use error::{GrammarError, ParseError};
pub use grammar::{Grammar, GrammarBuilder, ProdId, Production};
pub use item::{Item, ItemSet, LookaheadMode};
pub use lexer::{Lexer, Position, Token};
pub use symbol::{Symbol, SymbolId, SymbolKind};
pub use table::{Action, Conflict, Discipline, Table};
pub use tree::{Derivation, Node, NodeId, SyntaxTree};
