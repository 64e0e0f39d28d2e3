//! 表驱动的移入-归约分析.
//!
//! ```text
//! 令 a 为 w$ 的第一个符号;
//! while (1) {
//!     令 s 是栈顶的状态;
//!     if (ACTION[s, a] = 移入 t) {
//!         将 t 压入栈中;
//!         令 a 为下一个输入符号;
//!     } else if (ACTION[s, a] = 归约 A -> beta) {
//!         从栈中弹出 | beta | 个符号;
//!         令 t 为当前的栈顶状态;
//!         将 GOTO[t, A] 压入栈中;
//!         输出产生式 A -> beta;
//!     } else if (ACTION[s, a] = 接受) break;
//!     else 报告语法错误;
//! }
//! ```
//!
//! 整个过程是显式的循环, 栈的深度不受调用栈限制.
//!
//! ε 归约优先于移入, 所以有的文法会在同一个前瞻符上无限地归约下去 (例如 `S -> A S | x`, `A -> E`).
//! 两次移入之间, 栈比上次移入时高出的层数不会超过状态数量, 归约的次数也有上限, 超出时以
//! [`ParseError::ReductionLoop`] 结束.

use tracing::{info, trace};

use crate::{
    Automaton, Grammar, ProdId, StateId, SymbolId,
    error::ParseError,
    lexer::{Position, Token},
    table::{Action, Discipline, Table},
    tree::{Derivation, Node, NodeId, SyntaxTree},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Parsing,
    Accepted,
    Error,
}

/// 分析成功的结果: 语法树和归约序列.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub tree: SyntaxTree,
    pub derivation: Derivation,
}

/// 一次分析的状态: 状态栈, 值栈和推导序列只属于这一次分析.
pub struct Driver<'p, I>
where
    I: Iterator<Item = Token>,
{
    grammar: &'p Grammar<'p>,
    table: &'p Table,
    tokens: I,
    /// 当前的前瞻符, 为 [`None`] 时下一步再从输入中读取.
    lookahead: Option<Token>,
    last_pos: Position,
    states: Vec<StateId>,
    values: Vec<NodeId>,
    nodes: Vec<Node>,
    derivation: Vec<ProdId>,
    root: Option<NodeId>,
    error: Option<ParseError>,
    /// 上次移入之后的状态栈深度和归约次数.
    depth_at_shift: usize,
    reductions: usize,
}

impl<'p, I> Driver<'p, I>
where
    I: Iterator<Item = Token>,
{
    /// `table` 必须是由 `grammar` 构建的, 所以只能通过 [`Parser::driver`] 创建.
    pub(crate) fn new(grammar: &'p Grammar<'p>, table: &'p Table, tokens: I) -> Self {
        Self {
            grammar,
            table,
            tokens,
            lookahead: None,
            last_pos: Position::default(),
            states: vec![StateId::INITIAL],
            values: Vec::new(),
            nodes: Vec::new(),
            derivation: Vec::new(),
            root: None,
            error: None,
            depth_at_shift: 1,
            reductions: 0,
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.root.is_some() {
            Phase::Accepted
        } else if self.error.is_some() {
            Phase::Error
        } else {
            Phase::Parsing
        }
    }

    /// 当前状态栈, 栈底为初始状态.
    #[must_use]
    pub fn states(&self) -> &[StateId] {
        &self.states
    }

    /// 到目前为止的归约序列.
    #[must_use]
    pub fn derivation(&self) -> &[ProdId] {
        &self.derivation
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(node);
        id
    }

    fn top(&self) -> StateId {
        // 归约弹出的状态数量和之前压入的相同, 初始状态不会被弹出.
        *self
            .states
            .last()
            .expect("state stack always holds the initial state")
    }

    fn fail(&mut self, error: ParseError) -> Result<Phase, ParseError> {
        self.error = Some(error.clone());
        Err(error)
    }

    /// 执行一个动作 (移入, 归约, 接受或者报错).
    ///
    /// 已经结束的分析再调用时不做任何事: 接受之后返回 [`Phase::Accepted`], 出错之后返回同一个错误.
    pub fn step(&mut self) -> Result<Phase, ParseError> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        if self.root.is_some() {
            return Ok(Phase::Accepted);
        }
        let token = match self.lookahead.take() {
            Some(token) => token,
            // 输入提前结束时补一个结束符.
            None => self
                .tokens
                .next()
                .unwrap_or_else(|| Token::end_marker(self.last_pos)),
        };
        self.last_pos = token.pos();
        // 只有不带字面值的结束符才是输入的结尾, 源码中的 `eof` 单词不是.
        let terminal = if token.is_end_marker() {
            Some(SymbolId::END_MARKER)
        } else {
            self.grammar
                .terminal(token.kind())
                .filter(|&t| t != SymbolId::END_MARKER)
        };
        let Some(terminal) = terminal else {
            return self.fail(ParseError::UnknownToken { token });
        };
        let top = self.top();
        let action = self.table.action(top, terminal).unwrap_or_default();
        trace!("top: I_{top}, lookahead: {token:?}, action: {action:?}");
        match action {
            Action::Shift(to) => {
                let leaf = self.push_node(Node::Terminal(token));
                self.values.push(leaf);
                self.states.push(to);
                self.depth_at_shift = self.states.len();
                self.reductions = 0;
            }
            Action::Reduce(prod_id) => {
                if self.is_looping() {
                    return self.fail(ParseError::ReductionLoop { token });
                }
                self.lookahead = Some(token);
                self.reduce(prod_id);
            }
            Action::Accept => {
                // 值栈中只剩下用户开始符号的节点, 用增广产生式包装成根节点.
                self.lookahead = Some(token);
                let children = std::mem::take(&mut self.values);
                let root = self.push_node(Node::NonTerminal {
                    prod: ProdId::ACCEPT,
                    children,
                });
                self.derivation.push(ProdId::ACCEPT);
                self.root = Some(root);
                info!("accepted after {} reductions", self.derivation.len());
                return Ok(Phase::Accepted);
            }
            Action::Error => {
                let expected = self
                    .table
                    .expected(top)
                    .into_iter()
                    .map(|t| self.grammar.name(t).to_string())
                    .collect();
                return self.fail(ParseError::Syntax { token, expected });
            }
        }
        Ok(Phase::Parsing)
    }

    /// 同一个前瞻符上的归约是否已经不会结束.
    ///
    /// 前瞻符不变时动作只取决于栈顶状态, 栈顶以上每一层第一次出现的状态如果重复,
    /// 之后就会一直重复; 所以栈高出上次移入时的层数超过状态数量就说明在循环.
    fn is_looping(&self) -> bool {
        let rows = self.table.rows();
        let limit = (self.depth_at_shift + rows) * self.grammar.prods().len();
        self.states.len() > self.depth_at_shift + rows || self.reductions >= limit
    }

    fn reduce(&mut self, prod_id: ProdId) {
        let prod = self.grammar.prod(prod_id);
        info!("reduce production: {prod}");
        let len = prod.len();
        // 去除状态栈中的 | beta | 个状态, 因为是从项 A -> ⋅ beta
        // 一路走到项 A -> beta ⋅ 进行了归约, 其中栈新增了 | beta | 个状态.
        self.states.truncate(self.states.len() - len);
        let mut children = self.values.split_off(self.values.len() - len);
        if children.is_empty() {
            children.push(self.push_node(Node::Epsilon));
        }
        let node = self.push_node(Node::NonTerminal {
            prod: prod_id,
            children,
        });
        self.values.push(node);
        let top = self.top();
        // 归约项 A -> ⋅ beta 所在的状态一定有 A 的出边.
        let to = self
            .table
            .goto(top, prod.head())
            .expect("goto entry exists for every reduced head");
        trace!("goto I_{top} --{}--> I_{to}", self.grammar.name(prod.head()));
        self.states.push(to);
        self.derivation.push(prod_id);
        self.reductions += 1;
    }

    /// 运行到接受或者出错.
    pub fn run(mut self) -> Result<Parsed, ParseError> {
        loop {
            self.step()?;
            if let Some(root) = self.root {
                return Ok(Parsed {
                    tree: SyntaxTree::new(self.nodes, root),
                    derivation: Derivation::new(self.derivation),
                });
            }
        }
    }
}

/// 一个文法在某种分析方法下的分析器, 构建之后只读, 可以被多次 (包括并发的) 分析共享.
#[derive(Debug)]
pub struct Parser<'g> {
    grammar: &'g Grammar<'g>,
    automaton: Automaton<'g>,
    table: Table,
}

impl<'g> Parser<'g> {
    #[must_use]
    pub fn new(grammar: &'g Grammar<'g>, discipline: Discipline) -> Self {
        let automaton = Automaton::build(grammar, discipline.mode());
        let table = discipline.build_table(&automaton);
        Self {
            grammar,
            automaton,
            table,
        }
    }

    #[must_use]
    pub fn grammar(&self) -> &'g Grammar<'g> {
        self.grammar
    }

    #[must_use]
    pub fn automaton(&self) -> &Automaton<'g> {
        &self.automaton
    }

    #[must_use]
    pub fn table(&self) -> &Table {
        &self.table
    }

    #[must_use]
    pub fn discipline(&self) -> Discipline {
        self.table.discipline()
    }

    /// 开始一次新的分析, 输入按需逐个读取.
    pub fn driver<T>(&self, tokens: T) -> Driver<'_, T::IntoIter>
    where
        T: IntoIterator<Item = Token>,
    {
        Driver::new(self.grammar, &self.table, tokens.into_iter())
    }

    pub fn parse<T>(&self, tokens: T) -> Result<Parsed, ParseError>
    where
        T: IntoIterator<Item = Token>,
    {
        self.driver(tokens).run()
    }
}
