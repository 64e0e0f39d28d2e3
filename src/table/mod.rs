//! ACTION / GOTO 表.
//!
//! 三种分析方法共用同一个填表外壳: 终结符出边填移入, 非终结符出边填 GOTO,
//! 增广项 `S' -> S ⋅` 在结束符上填接受; 它们只在归约项对哪些终结符归约上不同, 见 [`TableBuilder`].

pub mod lr0;
pub mod lr1;
pub mod slr;

use std::{collections::HashMap, fmt::Display};

use tracing::{debug, warn};

use crate::{
    Automaton, Grammar, ProdId, StateId, SymbolId,
    item::{Item, LookaheadMode},
};

pub use lr0::Lr0Builder;
pub use lr1::Lr1Builder;
pub use slr::SlrBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Action {
    /// 移入项集状态编号.
    Shift(StateId),
    /// 规约产生式编号.
    Reduce(ProdId),
    /// 接受
    Accept,
    #[default]
    Error,
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&match self {
            Self::Shift(s) => format!("s{s}"),
            Self::Reduce(r) => format!("r{r}"),
            Self::Accept => "acc".to_string(),
            Self::Error => "".to_string(),
        })
    }
}

impl Action {
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    /// 冲突时的优先级, 越小越优先:
    /// 接受 > ε 产生式归约 > 移入 > 其他归约, 同类归约中编号小的优先.
    fn rank(self, grammar: &Grammar<'_>) -> (u8, usize) {
        match self {
            Self::Accept => (0, 0),
            Self::Reduce(p) if grammar.prod(p).is_empty() => (1, p.index()),
            Self::Shift(_) => (2, 0),
            Self::Reduce(p) => (3, p.index()),
            Self::Error => (4, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
    AcceptReduce,
}

/// 填表时遇到的冲突, 已经按照固定的优先级解决, 只作为诊断信息.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conflict {
    state: StateId,
    terminal: SymbolId,
    kept: Action,
    discarded: Action,
}

impl Conflict {
    #[must_use]
    pub fn state(&self) -> StateId {
        self.state
    }

    #[must_use]
    pub fn terminal(&self) -> SymbolId {
        self.terminal
    }

    /// 留在表中的动作.
    #[must_use]
    pub fn kept(&self) -> Action {
        self.kept
    }

    #[must_use]
    pub fn discarded(&self) -> Action {
        self.discarded
    }

    #[must_use]
    pub fn kind(&self) -> ConflictKind {
        match (self.kept, self.discarded) {
            (Action::Shift(_), _) | (_, Action::Shift(_)) => ConflictKind::ShiftReduce,
            (Action::Accept, _) | (_, Action::Accept) => ConflictKind::AcceptReduce,
            _ => ConflictKind::ReduceReduce,
        }
    }

    #[must_use]
    pub fn describe(&self, grammar: &Grammar<'_>) -> String {
        let kind = match self.kind() {
            ConflictKind::ShiftReduce => "shift/reduce",
            ConflictKind::ReduceReduce => "reduce/reduce",
            ConflictKind::AcceptReduce => "accept/reduce",
        };
        format!(
            "{kind} conflict on I_{} with `{}`: kept {}, discarded {}",
            self.state,
            grammar.name(self.terminal),
            self.kept,
            self.discarded
        )
    }
}

/// 分析方法, 可以在运行时选择.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Discipline {
    Lr0,
    Slr1,
    Lr1,
}

impl Display for Discipline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Self::Lr0 => "LR(0)",
            Self::Slr1 => "SLR(1)",
            Self::Lr1 => "LR(1)",
        })
    }
}

impl Discipline {
    /// 构建自动机时项是否携带前瞻符.
    #[must_use]
    pub fn mode(self) -> LookaheadMode {
        match self {
            Self::Lr0 | Self::Slr1 => LookaheadMode::Lr0,
            Self::Lr1 => LookaheadMode::Lr1,
        }
    }

    #[must_use]
    pub fn build_table(self, automaton: &Automaton<'_>) -> Table {
        match self {
            Self::Lr0 => Table::build::<Lr0Builder>(automaton),
            Self::Slr1 => Table::build::<SlrBuilder>(automaton),
            Self::Lr1 => Table::build::<Lr1Builder>(automaton),
        }
    }
}

/// 一种分析方法的归约范围.
pub trait TableBuilder {
    const DISCIPLINE: Discipline;

    /// 归约项 `item` (dot 在末尾, 不是增广项) 应该在哪些终结符上归约.
    fn reduce_terminals(grammar: &Grammar<'_>, item: &Item) -> Vec<SymbolId>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    discipline: Discipline,
    /// ACTION 表
    action: Vec<Vec<Action>>,
    /// GOTO 表, 每个格子表示 GOTO 到的项集状态编号.
    goto: Vec<Vec<Option<StateId>>>,
    /// ACTION 表中的终结符, 下标即为 ACTION 表中的列.
    terms: Vec<SymbolId>,
    /// GOTO 表中的非终结符, 下标即为 GOTO 表中的列.
    non_terms: Vec<SymbolId>,
    term_idxes: HashMap<SymbolId, usize>,
    non_term_idxes: HashMap<SymbolId, usize>,
    conflicts: Vec<Conflict>,
}

impl Table {
    /// 使用分析方法 `B` 从项集族填表, 自动机的前瞻模式需要和 `B` 一致.
    #[must_use]
    pub fn build<B: TableBuilder>(automaton: &Automaton<'_>) -> Self {
        debug_assert_eq!(automaton.mode(), B::DISCIPLINE.mode());
        let grammar = automaton.grammar();
        let terms = grammar.terms().to_vec();
        let non_terms = grammar.non_terms().to_vec();
        let rows = automaton.len();
        let mut table = Self {
            discipline: B::DISCIPLINE,
            action: vec![vec![Action::Error; terms.len()]; rows],
            goto: vec![vec![None; non_terms.len()]; rows],
            term_idxes: terms.iter().enumerate().map(|(i, &t)| (t, i)).collect(),
            non_term_idxes: non_terms.iter().enumerate().map(|(i, &t)| (t, i)).collect(),
            terms,
            non_terms,
            conflicts: Vec::new(),
        };
        for state in automaton.states() {
            let row = state.id();
            for (sym, to) in state.transitions() {
                if let Some(&col) = table.non_term_idxes.get(&sym) {
                    table.goto[row.index()][col] = Some(to);
                } else {
                    table.place(grammar, row, sym, Action::Shift(to));
                }
            }
            for item in state.reductions(grammar) {
                if item.prod() == ProdId::ACCEPT {
                    table.place(grammar, row, SymbolId::END_MARKER, Action::Accept);
                    continue;
                }
                for t in B::reduce_terminals(grammar, item) {
                    table.place(grammar, row, t, Action::Reduce(item.prod()));
                }
            }
        }
        debug!(
            "{} table built: {} states, {} conflicts",
            B::DISCIPLINE,
            rows,
            table.conflicts.len()
        );
        table
    }

    /// 放入新的动作, 冲突时按 [`Action::rank`] 保留一个并记录冲突.
    fn place(&mut self, grammar: &Grammar<'_>, state: StateId, terminal: SymbolId, action: Action) {
        let Some(&col) = self.term_idxes.get(&terminal) else {
            return;
        };
        let cell = &mut self.action[state.index()][col];
        let old = *cell;
        if old == action {
            return;
        }
        if old.is_error() {
            *cell = action;
            return;
        }
        let (kept, discarded) = if action.rank(grammar) < old.rank(grammar) {
            (action, old)
        } else {
            (old, action)
        };
        *cell = kept;
        let conflict = Conflict {
            state,
            terminal,
            kept,
            discarded,
        };
        warn!("{}", conflict.describe(grammar));
        self.conflicts.push(conflict);
    }

    #[must_use]
    pub fn discipline(&self) -> Discipline {
        self.discipline
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.action.len()
    }

    #[must_use]
    pub fn action_cols(&self) -> usize {
        self.terms.len()
    }

    #[must_use]
    pub fn goto_cols(&self) -> usize {
        self.non_terms.len()
    }

    /// 填表过程中遇到的所有冲突, 按发现顺序.
    #[must_use]
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// 文法在当前分析方法下是否是冲突的.
    #[must_use]
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// 查询 ACTION 表, 获取状态在某个终结符下的动作.
    /// # Returns
    /// 如果没有这个状态或者这个终结符没有对应的列, 那么返回 [`None`].
    #[must_use]
    pub fn action(&self, state: StateId, terminal: SymbolId) -> Option<Action> {
        let col = *self.term_idxes.get(&terminal)?;
        self.action.get(state.index()).map(|row| row[col])
    }

    /// 遍历一个状态的所有非 [`Action::Error`] 动作.
    /// 如果这个状态不存在, 那么返回 [`None`].
    #[must_use]
    pub fn actions(&self, state: StateId) -> Option<impl Iterator<Item = (SymbolId, Action)> + '_> {
        let row = self.action.get(state.index())?;
        Some(
            row.iter()
                .enumerate()
                .filter(|(_, a)| !a.is_error())
                .map(|(i, &a)| (self.terms[i], a)),
        )
    }

    /// 一个状态下可以接受的终结符, 用于语法错误的提示.
    #[must_use]
    pub fn expected(&self, state: StateId) -> Vec<SymbolId> {
        self.actions(state)
            .into_iter()
            .flatten()
            .map(|(t, _)| t)
            .collect()
    }

    /// 查询 GOTO(state, non_term), 没有这条出边时返回 [`None`].
    #[must_use]
    pub fn goto(&self, state: StateId, non_term: SymbolId) -> Option<StateId> {
        let col = *self.non_term_idxes.get(&non_term)?;
        self.goto.get(state.index())?[col]
    }

    /// 使用 markdown 形式输出表格.
    #[must_use]
    pub fn to_markdown(&self, grammar: &Grammar<'_>) -> String {
        let mut header_line = "| |".to_string();
        header_line += &self
            .terms
            .iter()
            .chain(self.non_terms.iter())
            .map(|&t| format!(" `{}` |", grammar.name(t)))
            .collect::<String>();
        let sep_line: String = String::from("| - |")
            + &std::iter::repeat_n(" - |", self.terms.len() + self.non_terms.len())
                .collect::<String>();
        let mut data_lines = String::new();
        for (i, (action_row, goto_row)) in self.action.iter().zip(self.goto.iter()).enumerate() {
            let line = format!("| $I_{{{i}}}$ |")
                + &action_row
                    .iter()
                    .map(|act| format!(" {act} |"))
                    .chain(goto_row.iter().map(|to| match to {
                        Some(to) => format!(" {to} |"),
                        None => "  |".to_string(),
                    }))
                    .collect::<String>();
            data_lines += &line;
            data_lines += "\n";
        }
        format!("{header_line}\n{sep_line}\n{}", data_lines.trim_end())
    }
}
