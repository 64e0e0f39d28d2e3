use crate::{
    ProdId, SymbolId,
    lexer::{Position, Token},
};

/// 构建文法时的错误, 出现之后不能再构建自动机和分析表.
#[derive(thiserror::Error, Debug, Eq, PartialEq)]
pub enum GrammarError {
    #[error("Error parsing productions, line: {line}, cause: {cause}.")]
    ParseProductionError {
        line: usize,
        cause: ParseProductionError,
    },
    #[error("Production references an undefined symbol: {0:?}.")]
    UndefinedSymbol(SymbolId),
    #[error("Symbol is already registered: {0}.")]
    DuplicateSymbol(String),
    #[error("Expected non-terminal, found: {0}.")]
    NotANonTerminal(String),
    #[error("Expected terminal, found: {0}.")]
    NotATerminal(String),
    #[error("Grammar has no start symbol.")]
    MissingStartSymbol,
    #[error("Malformed production {prod:?}: {reason}.")]
    MalformedProduction { prod: ProdId, reason: &'static str },
}

#[derive(thiserror::Error, Debug, Eq, PartialEq)]
pub enum ParseProductionError {
    #[error("No arrow in production line")]
    NoArrow,
    #[error("Production head is empty")]
    EmptyHead,
    #[error("Start symbol not found")]
    StartSymbolNotFound,
}

impl GrammarError {
    pub(crate) fn parse_production_error(line: usize, cause: ParseProductionError) -> Self {
        Self::ParseProductionError { line, cause }
    }
}

/// 一次语法分析的失败, 只结束当前这次分析.
#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum ParseError {
    #[error("Syntax error at {}: unexpected {:?}, expected one of: {}.", token.pos(), token.text(), expected.join(", "))]
    Syntax { token: Token, expected: Vec<String> },
    #[error("Unknown token at {}: kind {:?} is not a terminal of the grammar.", token.pos(), token.kind())]
    UnknownToken { token: Token },
    /// ε 归约在同一个前瞻符上反复出现, 分析不会再读入新的词法单元.
    #[error("Parse makes no progress at {}: reductions before {:?} never end.", token.pos(), token.text())]
    ReductionLoop { token: Token },
}

impl ParseError {
    #[must_use]
    pub fn token(&self) -> &Token {
        match self {
            Self::Syntax { token, .. }
            | Self::UnknownToken { token }
            | Self::ReductionLoop { token } => token,
        }
    }

    #[must_use]
    pub fn position(&self) -> Position {
        self.token().pos()
    }

    #[must_use]
    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax { .. })
    }
}
