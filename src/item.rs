use std::{
    collections::{BTreeMap, BTreeSet, VecDeque, btree_map::Entry},
    fmt::Display,
};

use crate::{Grammar, ProdId, SymbolId};

// 项集需要作为哈希表的键去重, 所以项和前瞻符都使用 BTreeSet 保存,
// 相等的项集无论构造顺序如何都有相同的遍历顺序和哈希值.

/// 项是否携带前瞻符.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookaheadMode {
    /// LR(0) 项, 用于 LR(0) 和 SLR(1) 分析.
    Lr0,
    /// 规范 LR(1) 项.
    Lr1,
}

/// LR 项: 产生式编号和 dot 位置, LR(1) 项另外携带前瞻符集合.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Item {
    prod: ProdId,
    /// dot 所处的位置, 在 `0..=prod.len()` 范围中, 产生式中的 epsilon 不算长度.
    dot: usize,
    look_aheads: Option<BTreeSet<SymbolId>>,
}

impl Item {
    #[must_use]
    pub fn new(prod: ProdId, dot: usize, look_aheads: Option<BTreeSet<SymbolId>>) -> Self {
        Self {
            prod,
            dot,
            look_aheads,
        }
    }

    #[must_use]
    pub fn initial(prod: ProdId, look_aheads: Option<BTreeSet<SymbolId>>) -> Self {
        Self::new(prod, 0, look_aheads)
    }

    #[must_use]
    pub fn prod(&self) -> ProdId {
        self.prod
    }

    #[must_use]
    pub fn dot(&self) -> usize {
        self.dot
    }

    #[must_use]
    pub fn look_aheads(&self) -> Option<&BTreeSet<SymbolId>> {
        self.look_aheads.as_ref()
    }

    /// 忽略前瞻符的核心, 核心相同的两个项 "core-equal".
    #[must_use]
    pub fn core(&self) -> (ProdId, usize) {
        (self.prod, self.dot)
    }

    /// dot 之后的符号, dot 在末尾时返回 [`None`].
    #[must_use]
    pub fn expected(&self, grammar: &Grammar<'_>) -> Option<SymbolId> {
        grammar.prod(self.prod).tail_without_eps().nth(self.dot)
    }

    /// dot 之后第一个符号之后的剩余序列.
    pub fn future_seq<'g>(&self, grammar: &'g Grammar<'_>) -> impl Iterator<Item = SymbolId> + 'g {
        grammar.prod(self.prod).tail_without_eps().skip(self.dot + 1)
    }

    #[must_use]
    pub fn is_reducible(&self, grammar: &Grammar<'_>) -> bool {
        self.dot >= grammar.prod(self.prod).len()
    }

    /// 越过符号 `sym` 之后的项, dot 之后不是 `sym` 时返回 [`None`]. 前瞻符不变.
    #[must_use]
    pub fn goto(&self, grammar: &Grammar<'_>, sym: SymbolId) -> Option<Self> {
        if self.expected(grammar)? != sym {
            None?
        }
        Some(Self {
            prod: self.prod,
            dot: self.dot + 1,
            look_aheads: self.look_aheads.clone(),
        })
    }

    #[must_use]
    pub fn display<'i>(&'i self, grammar: &'i Grammar<'i>) -> ItemDisplay<'i> {
        ItemDisplay { item: self, grammar }
    }
}

/// 以 `A -> α ⋅ β 〈a, b〉` 的形式输出项.
pub struct ItemDisplay<'i> {
    item: &'i Item,
    grammar: &'i Grammar<'i>,
}

impl Display for ItemDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prod = self.grammar.prod(self.item.prod);
        let mut parts: Vec<&str> = prod
            .tail_without_eps()
            .map(|s| self.grammar.name(s))
            .collect();
        parts.insert(self.item.dot.min(parts.len()), "⋅");
        let mut s = format!("{} -> {}", self.grammar.name(prod.head()), parts.join(" "));
        if let Some(look_aheads) = &self.item.look_aheads {
            let look_aheads: Vec<&str> = look_aheads.iter().map(|&t| self.grammar.name(t)).collect();
            s += &format!(" 〈{}〉", look_aheads.join(", "));
        }
        f.pad(&s)
    }
}

/// 去重的项集合, 同一个核心只出现一次 (LR(1) 项的前瞻符被合并).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemSet {
    items: BTreeSet<Item>,
}

impl FromIterator<Item> for ItemSet {
    fn from_iter<T: IntoIterator<Item = Item>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl ItemSet {
    /// 初始项集: 增广项 `S' -> ⋅ S` 的闭包, LR(1) 时前瞻符为结束符.
    #[must_use]
    pub fn initial(grammar: &Grammar<'_>, mode: LookaheadMode) -> Self {
        let look_aheads = match mode {
            LookaheadMode::Lr0 => None,
            LookaheadMode::Lr1 => Some([SymbolId::END_MARKER].into()),
        };
        Self::from_iter([Item::initial(ProdId::ACCEPT, look_aheads)]).closure(grammar)
    }

    /// 获取当前项集的闭包项集.
    ///
    /// 对每个 `[A -> α ⋅ B β, L]` 加入 `[B -> ⋅ γ, FIRST(β L)]`, 直到没有新的项或者新的前瞻符.
    #[must_use]
    pub fn closure(self, grammar: &Grammar<'_>) -> Self {
        let mut cores: BTreeMap<(ProdId, usize), Option<BTreeSet<SymbolId>>> = BTreeMap::new();
        for item in self.items {
            match cores.entry(item.core()) {
                Entry::Vacant(e) => {
                    e.insert(item.look_aheads);
                }
                Entry::Occupied(mut e) => {
                    if let (Some(old), Some(new)) = (e.get_mut(), item.look_aheads) {
                        old.extend(new);
                    }
                }
            }
        }
        let mut pending: VecDeque<(ProdId, usize)> = cores.keys().copied().collect();
        while let Some((prod, dot)) = pending.pop_front() {
            let item = Item::new(prod, dot, cores[&(prod, dot)].clone());
            let Some(nt) = item
                .expected(grammar)
                .filter(|&s| grammar.is_non_term(s))
            else {
                continue;
            };
            let look_aheads = item.look_aheads.as_ref().map(|la| {
                grammar.first_sets().of_seq_with_fallthrough(
                    grammar,
                    item.future_seq(grammar),
                    la.iter().copied(),
                )
            });
            for &prod in grammar.prods_of(nt) {
                let core = (prod, 0);
                match cores.entry(core) {
                    Entry::Vacant(e) => {
                        e.insert(look_aheads.clone());
                        pending.push_back(core);
                    }
                    Entry::Occupied(mut e) => {
                        if let (Some(old), Some(new)) = (e.get_mut(), &look_aheads) {
                            let before = old.len();
                            old.extend(new);
                            if old.len() != before {
                                pending.push_back(core);
                            }
                        }
                    }
                }
            }
        }
        cores
            .into_iter()
            .map(|((prod, dot), look_aheads)| Item::new(prod, dot, look_aheads))
            .collect()
    }

    /// GOTO(I, X): 越过 `sym` 的所有项的闭包, 没有这样的项时返回 [`None`].
    #[must_use]
    pub fn goto(&self, grammar: &Grammar<'_>, sym: SymbolId) -> Option<Self> {
        let items: ItemSet = self
            .items
            .iter()
            .filter_map(|i| i.goto(grammar, sym))
            .collect();
        if items.is_empty() {
            None
        } else {
            Some(items.closure(grammar))
        }
    }

    /// 出现在某个项的 dot 之后的所有符号, 按编号排序.
    #[must_use]
    pub fn expected_symbols(&self, grammar: &Grammar<'_>) -> BTreeSet<SymbolId> {
        self.items
            .iter()
            .filter_map(|i| i.expected(grammar))
            .collect()
    }

    /// dot 在末尾的项.
    pub fn reductions<'s>(&'s self, grammar: &'s Grammar<'_>) -> impl Iterator<Item = &'s Item> {
        self.items.iter().filter(move |i| i.is_reducible(grammar))
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    #[must_use]
    pub fn contains(&self, item: &Item) -> bool {
        self.items.contains(item)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
