use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::{
    Grammar, SymbolId, index_type,
    item::{Item, ItemSet, LookaheadMode},
};

index_type! {
    /// 项集状态编号, 按创建顺序分配.
    pub struct StateId("I_");
}

impl StateId {
    pub const INITIAL: StateId = StateId::new(0);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    id: StateId,
    items: ItemSet,
    /// GOTO(self, key) = value
    transitions: BTreeMap<SymbolId, StateId>,
}

impl State {
    #[must_use]
    pub fn id(&self) -> StateId {
        self.id
    }

    #[must_use]
    pub fn items(&self) -> &ItemSet {
        &self.items
    }

    /// 遍历出边 (转换符号, 到达状态), 按符号编号排序.
    pub fn transitions(&self) -> impl Iterator<Item = (SymbolId, StateId)> + '_ {
        self.transitions.iter().map(|(&sym, &to)| (sym, to))
    }

    #[must_use]
    pub fn transition(&self, sym: SymbolId) -> Option<StateId> {
        self.transitions.get(&sym).copied()
    }

    pub fn reductions<'s>(&'s self, grammar: &'s Grammar<'_>) -> impl Iterator<Item = &'s Item> {
        self.items.reductions(grammar)
    }
}

/// LR 项集族 (规范集合), 构建之后不再改变.
#[derive(Debug)]
pub struct Automaton<'g> {
    grammar: &'g Grammar<'g>,
    mode: LookaheadMode,
    states: Vec<State>,
}

impl<'g> Automaton<'g> {
    /// 从增广文法构建项集族.
    ///
    /// 按创建顺序处理状态, 每个状态的出边按符号编号顺序计算, 所以状态编号对固定的文法是确定的.
    /// LR(0) 项集按核心去重, LR(1) 项集要求前瞻符也相同 (不做 LALR 合并).
    #[must_use]
    pub fn build(grammar: &'g Grammar<'g>, mode: LookaheadMode) -> Self {
        let i0 = ItemSet::initial(grammar, mode);
        let mut index: HashMap<ItemSet, StateId> = HashMap::new();
        index.insert(i0.clone(), StateId::INITIAL);
        let mut states = vec![State {
            id: StateId::INITIAL,
            items: i0,
            transitions: BTreeMap::new(),
        }];
        let mut next = 0;
        while next < states.len() {
            let from = &states[next];
            let gotos: Vec<(SymbolId, ItemSet)> = from
                .items
                .expected_symbols(grammar)
                .into_iter()
                .filter_map(|sym| Some((sym, from.items.goto(grammar, sym)?)))
                .collect();
            for (sym, nis) in gotos {
                let to = match index.get(&nis) {
                    Some(&to) => to,
                    None => {
                        let to = StateId::new(states.len());
                        debug!(
                            "new state I_{to} = GOTO(I_{next}, {}), {} items",
                            grammar.name(sym),
                            nis.len()
                        );
                        index.insert(nis.clone(), to);
                        states.push(State {
                            id: to,
                            items: nis,
                            transitions: BTreeMap::new(),
                        });
                        to
                    }
                };
                states[next].transitions.insert(sym, to);
            }
            next += 1;
        }
        debug!("{mode:?} automaton built with {} states", states.len());
        Self {
            grammar,
            mode,
            states,
        }
    }

    #[must_use]
    pub fn grammar(&self) -> &'g Grammar<'g> {
        self.grammar
    }

    #[must_use]
    pub fn mode(&self) -> LookaheadMode {
        self.mode
    }

    /// 按照 I_i (i = 0, 1, 2, 3...) 顺序获取状态.
    #[must_use]
    pub fn states(&self) -> &[State] {
        &self.states
    }

    #[must_use]
    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id.index())
    }

    #[must_use]
    pub fn initial(&self) -> StateId {
        StateId::INITIAL
    }

    /// 遍历所有出边 (起始状态, 转换符号, 到达状态).
    pub fn transitions(&self) -> impl Iterator<Item = (StateId, SymbolId, StateId)> + '_ {
        self.states
            .iter()
            .flat_map(|s| s.transitions().map(move |(sym, to)| (s.id, sym, to)))
    }

    /// 获取状态数量.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
