use std::fmt::{Debug, Display};

use crate::index_type;

index_type! {
    /// 文法符号编号, 注册时按顺序分配, 之后不再改变.
    pub struct SymbolId("sym");
}

impl SymbolId {
    /// 空串 ε, 每个文法的 0 号符号.
    pub const EPSILON: SymbolId = SymbolId::new(0);
    /// 输入结束符, 每个文法的 1 号符号.
    pub const END_MARKER: SymbolId = SymbolId::new(1);
}

/// 文本文法中表示 ε 的写法.
pub const EPSILON_NAME: &str = "E";
/// 结束符的名字, 词法分析器以此为最后一个 token 的类型.
pub const END_MARKER_NAME: &str = "eof";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolKind {
    Terminal,
    NonTerminal,
    Epsilon,
    EndMarker,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol<'a> {
    id: SymbolId,
    kind: SymbolKind,
    name: &'a str,
}

impl Debug for Symbol<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.kind {
            SymbolKind::Terminal => "t",
            SymbolKind::NonTerminal => "nt",
            SymbolKind::Epsilon => "eps",
            SymbolKind::EndMarker => "end",
        };
        f.pad(&format!("{prefix}{:?}#{}", self.name, self.id))
    }
}

impl Display for Symbol<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.name)
    }
}

impl<'a> Symbol<'a> {
    #[must_use]
    pub(crate) fn new(id: SymbolId, kind: SymbolKind, name: &'a str) -> Self {
        Self { id, kind, name }
    }

    #[must_use]
    pub fn id(&self) -> SymbolId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    #[must_use]
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// 终结符或者结束符, 即 ACTION 表中有对应列的符号.
    #[must_use]
    pub fn is_term(&self) -> bool {
        matches!(self.kind, SymbolKind::Terminal | SymbolKind::EndMarker)
    }

    #[must_use]
    pub fn is_non_term(&self) -> bool {
        self.kind == SymbolKind::NonTerminal
    }

    #[must_use]
    pub fn is_epsilon(&self) -> bool {
        self.kind == SymbolKind::Epsilon
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn symbol_format() {
        let sym = Symbol::new(SymbolId::new(4), SymbolKind::NonTerminal, "stmt");
        assert_eq!(format!("{sym}"), "stmt");
        assert_eq!(format!("{sym:?}"), r##"nt"stmt"#4"##);
        assert_eq!(format!("{:?}", SymbolId::END_MARKER), "sym1");
        assert!(sym.is_non_term());
        assert!(!sym.is_term());
    }

    #[test]
    fn end_marker_is_term() {
        let sym = Symbol::new(SymbolId::END_MARKER, SymbolKind::EndMarker, END_MARKER_NAME);
        assert!(sym.is_term());
        assert!(!sym.is_epsilon());
    }
}
