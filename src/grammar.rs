use bumpalo::Bump;
use std::{
    collections::HashMap,
    fmt::{Debug, Display},
};
use tracing::debug;

use crate::{
    SymbolId, index_type,
    error::{GrammarError, ParseProductionError},
    sets::{FirstSets, FollowSets},
    symbol::{END_MARKER_NAME, EPSILON_NAME, Symbol, SymbolKind},
};

index_type! {
    /// 产生式编号, 即产生式在 [`Grammar::prods`] 中的下标.
    pub struct ProdId("p");
}

impl ProdId {
    /// 增广产生式 `S' -> S` 固定为 0 号产生式.
    pub const ACCEPT: ProdId = ProdId::new(0);
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Production {
    id: ProdId,
    // 产生式 `->` 左侧内容.
    head: SymbolId,
    // 产生式 `->` 右侧内容, 可能为空或者只有一个 [`SymbolId::EPSILON`].
    tail: Vec<SymbolId>,
    display: String,
}

impl Debug for Production {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Production")
            .field(&format_args!("{:?}: {}", self.id, self.display))
            .finish()
    }
}

impl Display for Production {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.display)
    }
}

impl Production {
    #[must_use]
    pub fn id(&self) -> ProdId {
        self.id
    }

    #[must_use]
    pub fn head(&self) -> SymbolId {
        self.head
    }

    #[must_use]
    pub fn tail(&self) -> &[SymbolId] {
        &self.tail
    }

    pub fn tail_without_eps(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.tail
            .iter()
            .copied()
            .filter(|&s| s != SymbolId::EPSILON)
    }

    /// 产生式尾部的符号数量, [`SymbolId::EPSILON`] 不算长度.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tail_without_eps().count()
    }

    /// 是否是 ε 产生式.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 加载期使用的文法构建器: 注册符号和产生式, 最后调用 [`GrammarBuilder::build`] 校验并增广.
#[derive(Debug)]
pub struct GrammarBuilder<'a> {
    bump: &'a Bump,
    symbols: Vec<Symbol<'a>>,
    names: HashMap<&'a str, SymbolId>,
    /// 用户注册的产生式, 下标 i 对应 ProdId(i + 1).
    prods: Vec<(SymbolId, Vec<SymbolId>)>,
    start: Option<SymbolId>,
}

impl<'a> GrammarBuilder<'a> {
    #[must_use]
    pub fn new(bump: &'a Bump) -> Self {
        let mut builder = Self {
            bump,
            symbols: Vec::new(),
            names: HashMap::new(),
            prods: Vec::new(),
            start: None,
        };
        builder.push_symbol(SymbolKind::Epsilon, EPSILON_NAME);
        builder.push_symbol(SymbolKind::EndMarker, END_MARKER_NAME);
        builder
    }

    fn push_symbol(&mut self, kind: SymbolKind, name: &'a str) -> SymbolId {
        let id = SymbolId::new(self.symbols.len());
        self.symbols.push(Symbol::new(id, kind, name));
        self.names.insert(name, id);
        id
    }

    fn register(&mut self, kind: SymbolKind, name: &'a str) -> Result<SymbolId, GrammarError> {
        match self.names.get(name) {
            None => Ok(self.push_symbol(kind, name)),
            Some(&id) => match (self.symbols[id.index()].kind(), kind) {
                (old, new) if old == new => Ok(id),
                (SymbolKind::NonTerminal, SymbolKind::Terminal) => {
                    Err(GrammarError::NotATerminal(name.to_string()))
                }
                (SymbolKind::Terminal, SymbolKind::NonTerminal) => {
                    Err(GrammarError::NotANonTerminal(name.to_string()))
                }
                // E 和 eof 是保留的名字.
                _ => Err(GrammarError::DuplicateSymbol(name.to_string())),
            },
        }
    }

    /// 注册终结符, 重复注册同名终结符返回已有的编号.
    pub fn terminal(&mut self, name: &'a str) -> Result<SymbolId, GrammarError> {
        self.register(SymbolKind::Terminal, name)
    }

    /// 注册非终结符, 重复注册同名非终结符返回已有的编号.
    pub fn non_terminal(&mut self, name: &'a str) -> Result<SymbolId, GrammarError> {
        self.register(SymbolKind::NonTerminal, name)
    }

    /// 注册产生式, 符号引用的合法性在 [`GrammarBuilder::build`] 时检查.
    pub fn production(
        &mut self,
        head: SymbolId,
        tail: impl IntoIterator<Item = SymbolId>,
    ) -> ProdId {
        self.prods.push((head, tail.into_iter().collect()));
        ProdId::new(self.prods.len())
    }

    pub fn start(&mut self, start: SymbolId) -> &mut Self {
        self.start = Some(start);
        self
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.names.get(name).copied()
    }

    fn kind_of(&self, id: SymbolId) -> Result<SymbolKind, GrammarError> {
        self.symbols
            .get(id.index())
            .map(Symbol::kind)
            .ok_or(GrammarError::UndefinedSymbol(id))
    }

    fn validate(&self) -> Result<SymbolId, GrammarError> {
        let start = self.start.ok_or(GrammarError::MissingStartSymbol)?;
        if self.kind_of(start)? != SymbolKind::NonTerminal {
            Err(GrammarError::NotANonTerminal(
                self.symbols[start.index()].name().to_string(),
            ))?
        }
        for (idx, (head, tail)) in self.prods.iter().enumerate() {
            let prod = ProdId::new(idx + 1);
            if self.kind_of(*head)? != SymbolKind::NonTerminal {
                Err(GrammarError::NotANonTerminal(
                    self.symbols[head.index()].name().to_string(),
                ))?
            }
            for &sym in tail {
                match self.kind_of(sym)? {
                    SymbolKind::EndMarker => Err(GrammarError::MalformedProduction {
                        prod,
                        reason: "end marker in right-hand side",
                    })?,
                    SymbolKind::Epsilon if tail.len() > 1 => {
                        Err(GrammarError::MalformedProduction {
                            prod,
                            reason: "epsilon mixed with other symbols",
                        })?
                    }
                    _ => {}
                }
            }
        }
        Ok(start)
    }

    /// 校验所有产生式, 增广文法 (`S' -> S` 为 0 号产生式) 并计算 FIRST / FOLLOW 集.
    pub fn build(mut self) -> Result<Grammar<'a>, GrammarError> {
        let user_start = self.validate()?;
        let mut new_start = format!("{}prime", self.symbols[user_start.index()].name());
        while self.names.contains_key(new_start.as_str()) {
            new_start.push_str("prime");
        }
        let new_start: &'a String = self.bump.alloc(new_start);
        let start = self.push_symbol(SymbolKind::NonTerminal, new_start.as_str());

        let symbols = self.symbols;
        let display = |head: SymbolId, tail: &[SymbolId]| {
            let tail = if tail.is_empty() {
                EPSILON_NAME.to_string()
            } else {
                tail.iter()
                    .map(|s| symbols[s.index()].name())
                    .collect::<Vec<_>>()
                    .join(" ")
            };
            format!("{} -> {}", symbols[head.index()].name(), tail)
        };
        let prods: Vec<Production> = std::iter::once((start, vec![user_start]))
            .chain(self.prods)
            .enumerate()
            .map(|(idx, (head, tail))| Production {
                id: ProdId::new(idx),
                display: display(head, &tail),
                head,
                tail,
            })
            .collect();

        let mut prods_of = vec![Vec::new(); symbols.len()];
        for prod in &prods {
            prods_of[prod.head.index()].push(prod.id);
        }
        // 结束符总是 ACTION 表的最后一列.
        let terms = symbols
            .iter()
            .filter(|s| s.kind() == SymbolKind::Terminal)
            .map(Symbol::id)
            .chain(Some(SymbolId::END_MARKER))
            .collect();
        let non_terms = symbols
            .iter()
            .filter(|s| s.is_non_term())
            .map(Symbol::id)
            .collect();

        let mut grammar = Grammar {
            symbols,
            names: self.names,
            prods,
            prods_of,
            terms,
            non_terms,
            start,
            user_start,
            first: FirstSets::default(),
            follow: FollowSets::default(),
        };
        grammar.first = grammar.compute_first();
        grammar.follow = grammar.compute_follow(&grammar.first);
        debug!(
            "grammar built: {} symbols, {} productions, start {}",
            grammar.symbols.len(),
            grammar.prods.len(),
            grammar.name(start)
        );
        Ok(grammar)
    }
}

#[derive(Debug, Clone)]
pub struct Grammar<'a> {
    symbols: Vec<Symbol<'a>>,
    names: HashMap<&'a str, SymbolId>,
    prods: Vec<Production>,
    /// 下标为非终结符编号, 值为以其为头部的产生式.
    prods_of: Vec<Vec<ProdId>>,
    /// ACTION 表中的终结符, 下标即为 ACTION 表中的列.
    terms: Vec<SymbolId>,
    /// GOTO 表中的非终结符, 下标即为 GOTO 表中的列.
    non_terms: Vec<SymbolId>,
    /// 增广之后的开始符号.
    start: SymbolId,
    user_start: SymbolId,
    first: FirstSets,
    follow: FollowSets,
}

impl PartialEq for Grammar<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.symbols == other.symbols && self.prods == other.prods && self.start == other.start
    }
}

impl Eq for Grammar<'_> {}

impl Display for Grammar<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for prod in &self.prods {
            writeln!(f, "{:>4} {}", prod.id(), prod)?;
        }
        Ok(())
    }
}

impl<'a> Grammar<'a> {
    /// 从文本形式的 CFG 构建文法.
    ///
    /// 每行一个 `head -> alt1 | alt2`, 所有出现在 `->` 左侧的符号都是非终结符, 其他符号都是终结符,
    /// `E` 表示空串. `start` 为 [`None`] 时使用第一条产生式的头部.
    pub fn from_cfg(s: &'a str, start: Option<&str>, bump: &'a Bump) -> Result<Self, GrammarError> {
        let mut builder = GrammarBuilder::new(bump);
        let mut splitted: Vec<(SymbolId, &str)> = Vec::new();
        // 找出所有的非终结符.
        for (line_num, line) in s
            .lines()
            .enumerate()
            .filter(|(_, s)| s.chars().any(|c| !c.is_whitespace()))
        {
            let parts = line.split_once("->").ok_or(GrammarError::parse_production_error(
                line_num,
                ParseProductionError::NoArrow,
            ))?;
            let head_ident = parts.0.trim();
            if head_ident.is_empty() {
                Err(GrammarError::parse_production_error(
                    line_num,
                    ParseProductionError::EmptyHead,
                ))?
            }
            splitted.push((builder.non_terminal(head_ident)?, parts.1));
        }
        // 验证是否有起始符.
        let start = match start {
            Some(name) => builder
                .lookup(name)
                .filter(|id| splitted.iter().any(|(head, _)| head == id)),
            None => splitted.first().map(|(head, _)| *head),
        }
        .ok_or(GrammarError::parse_production_error(
            0,
            ParseProductionError::StartSymbolNotFound,
        ))?;
        builder.start(start);
        // 解析所有产生式.
        for (head, tails) in splitted {
            for tail_s in tails.split('|') {
                let mut tail = Vec::new();
                for s in tail_s.split_ascii_whitespace() {
                    let sym = match builder.lookup(s) {
                        Some(sym) => sym,
                        None => builder.terminal(s)?,
                    };
                    tail.push(sym);
                }
                builder.production(head, tail);
            }
        }
        builder.build()
    }

    pub fn symbols(&self) -> &[Symbol<'a>] {
        &self.symbols
    }

    #[must_use]
    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol<'a>> {
        self.symbols.get(id.index())
    }

    /// 符号的名字, 不存在的编号显示为 `?`.
    #[must_use]
    pub fn name(&self, id: SymbolId) -> &'a str {
        self.symbol(id).map_or("?", Symbol::name)
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.names.get(name).copied()
    }

    /// 按名字查找终结符 (包括结束符), 词法单元的类型通过它映射到 ACTION 表的列.
    #[must_use]
    pub fn terminal(&self, name: &str) -> Option<SymbolId> {
        self.lookup(name).filter(|&id| self.is_term(id))
    }

    #[must_use]
    pub fn is_term(&self, id: SymbolId) -> bool {
        self.symbol(id).is_some_and(Symbol::is_term)
    }

    #[must_use]
    pub fn is_non_term(&self, id: SymbolId) -> bool {
        self.symbol(id).is_some_and(Symbol::is_non_term)
    }

    /// 按产生式编号遍历产生式.
    pub fn prods(&self) -> &[Production] {
        &self.prods
    }

    /// 获取产生式, 编号必须来自这个文法.
    #[must_use]
    pub fn prod(&self, id: ProdId) -> &Production {
        &self.prods[id.index()]
    }

    /// 获取以某个非终结符为头部的所有产生式, 结果可能为空.
    #[must_use]
    pub fn prods_of(&self, nt: SymbolId) -> &[ProdId] {
        self.prods_of.get(nt.index()).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn terms(&self) -> &[SymbolId] {
        &self.terms
    }

    #[must_use]
    pub fn non_terms(&self) -> &[SymbolId] {
        &self.non_terms
    }

    /// 增广之后的开始符号 `S'`.
    #[must_use]
    pub fn symbol_start(&self) -> SymbolId {
        self.start
    }

    /// 用户指定的开始符号 `S`.
    #[must_use]
    pub fn user_start(&self) -> SymbolId {
        self.user_start
    }

    #[must_use]
    pub fn first_sets(&self) -> &FirstSets {
        &self.first
    }

    #[must_use]
    pub fn follow_sets(&self) -> &FollowSets {
        &self.follow
    }

    #[must_use]
    pub fn nullable(&self, nt: SymbolId) -> bool {
        self.first.nullable(nt)
    }

    /// 重新完整计算 FIRST 集, 只依赖产生式集合.
    #[must_use]
    pub fn compute_first(&self) -> FirstSets {
        FirstSets::compute(self)
    }

    /// 基于给定的 FIRST 集重新完整计算 FOLLOW 集.
    #[must_use]
    pub fn compute_follow(&self, first: &FirstSets) -> FollowSets {
        FollowSets::compute(self, first)
    }
}

#[cfg(test)]
mod test {
    use bumpalo::Bump;
    use pretty_assertions::assert_eq;

    use crate::{
        Grammar, GrammarBuilder, ProdId, SymbolId,
        error::{GrammarError, ParseProductionError},
    };

    #[test]
    fn parse_productions() {
        let input = "
            program -> compoundstmt
            stmt -> ifstmt | whilestmt | assgstmt
            compoundstmt -> { stmts }
        ";
        let bump = Bump::new();
        let grammar = Grammar::from_cfg(input, Some("program"), &bump).unwrap();

        let prods: Vec<String> = grammar.prods().iter().map(|p| p.to_string()).collect();
        assert_eq!(
            prods,
            [
                "programprime -> program",
                "program -> compoundstmt",
                "stmt -> ifstmt",
                "stmt -> whilestmt",
                "stmt -> assgstmt",
                "compoundstmt -> { stmts }",
            ]
        );
        let names = |ids: &[SymbolId]| ids.iter().map(|&s| grammar.name(s)).collect::<Vec<_>>();
        assert_eq!(
            names(grammar.terms()),
            ["ifstmt", "whilestmt", "assgstmt", "{", "stmts", "}", "eof"]
        );
        assert_eq!(
            names(grammar.non_terms()),
            ["program", "stmt", "compoundstmt", "programprime"]
        );
        assert_eq!(grammar.name(grammar.symbol_start()), "programprime");
        assert_eq!(grammar.name(grammar.user_start()), "program");
        assert_eq!(grammar.prod(ProdId::ACCEPT).tail(), &[grammar.user_start()]);
        assert!(grammar.terminal("stmts").is_some());
        assert!(grammar.terminal("stmt").is_none());
        assert!(grammar.terminal("eof").is_some());
    }

    #[test]
    fn default_start_and_epsilon() {
        let bump = Bump::new();
        let grammar = Grammar::from_cfg("S -> A b\nA -> a | E", None, &bump).unwrap();
        assert_eq!(grammar.name(grammar.user_start()), "S");
        let a = grammar.lookup("A").unwrap();
        let eps = grammar.prod(grammar.prods_of(a)[1]);
        assert!(eps.is_empty());
        assert_eq!(eps.tail(), &[SymbolId::EPSILON]);
        assert_eq!(eps.to_string(), "A -> E");
        assert!(grammar.nullable(a));
    }

    #[test]
    fn parse_errors() {
        let bump = Bump::new();
        assert_eq!(
            Grammar::from_cfg("S -> a\nS a b", None, &bump),
            Err(GrammarError::ParseProductionError {
                line: 1,
                cause: ParseProductionError::NoArrow
            })
        );
        assert_eq!(
            Grammar::from_cfg("S -> a", Some("T"), &bump),
            Err(GrammarError::ParseProductionError {
                line: 0,
                cause: ParseProductionError::StartSymbolNotFound
            })
        );
        assert_eq!(
            Grammar::from_cfg(" -> a", None, &bump),
            Err(GrammarError::ParseProductionError {
                line: 0,
                cause: ParseProductionError::EmptyHead
            })
        );
    }

    #[test]
    fn builder_stable_ids() {
        let bump = Bump::new();
        let mut builder = GrammarBuilder::new(&bump);
        let s = builder.non_terminal("S").unwrap();
        let x = builder.terminal("x").unwrap();
        assert_eq!(builder.terminal("x"), Ok(x));
        let p1 = builder.production(s, [x, s]);
        let p2 = builder.production(s, [x]);
        builder.start(s);
        let grammar = builder.build().unwrap();
        assert_eq!(p1, ProdId::new(1));
        assert_eq!(p2, ProdId::new(2));
        assert_eq!(grammar.prod(p1).to_string(), "S -> x S");
        assert_eq!(grammar.prod(p2).head(), s);
        assert_eq!(grammar.lookup("x"), Some(x));
        assert_eq!(grammar.name(grammar.symbol_start()), "Sprime");
    }

    #[test]
    fn builder_errors() {
        let bump = Bump::new();
        let mut builder = GrammarBuilder::new(&bump);
        let s = builder.non_terminal("S").unwrap();
        assert_eq!(
            builder.terminal("S"),
            Err(GrammarError::NotATerminal("S".into()))
        );
        builder.terminal("y").unwrap();
        assert_eq!(
            builder.non_terminal("y"),
            Err(GrammarError::NotANonTerminal("y".into()))
        );
        assert_eq!(
            builder.non_terminal("eof"),
            Err(GrammarError::DuplicateSymbol("eof".into()))
        );
        assert_eq!(
            builder.terminal("E"),
            Err(GrammarError::DuplicateSymbol("E".into()))
        );
        builder.production(s, [SymbolId::new(42)]);
        builder.start(s);
        assert_eq!(
            builder.build(),
            Err(GrammarError::UndefinedSymbol(SymbolId::new(42)))
        );

        let mut builder = GrammarBuilder::new(&bump);
        let s = builder.non_terminal("S").unwrap();
        builder.production(s, [SymbolId::END_MARKER]);
        assert_eq!(builder.build(), Err(GrammarError::MissingStartSymbol));

        let mut builder = GrammarBuilder::new(&bump);
        let s = builder.non_terminal("S").unwrap();
        let x = builder.terminal("x").unwrap();
        builder.production(s, [SymbolId::END_MARKER]);
        builder.start(s);
        assert_eq!(
            builder.build(),
            Err(GrammarError::MalformedProduction {
                prod: ProdId::new(1),
                reason: "end marker in right-hand side"
            })
        );

        let mut builder = GrammarBuilder::new(&bump);
        let s = builder.non_terminal("S").unwrap();
        builder.production(x, [s]);
        builder.start(s);
        assert_eq!(
            builder.build(),
            Err(GrammarError::UndefinedSymbol(x))
        );
    }

    #[test]
    fn augmented_name_is_unique() {
        let bump = Bump::new();
        let grammar = Grammar::from_cfg("S -> Sprime\nSprime -> a", None, &bump).unwrap();
        assert_eq!(grammar.name(grammar.symbol_start()), "Sprimeprime");
    }
}
