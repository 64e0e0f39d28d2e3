//! FIRST / FOLLOW 集的不动点计算.
//!
//! 集合以 [`BTreeSet`] 保存, 遍历顺序只依赖符号编号, 保证输出的确定性.

use std::collections::{BTreeMap, BTreeSet};

use crate::{Grammar, SymbolId};

/// 每个非终结符的 FIRST 集, 元素为终结符编号, 可能包含 [`SymbolId::EPSILON`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirstSets {
    sets: BTreeMap<SymbolId, BTreeSet<SymbolId>>,
}

impl FirstSets {
    pub(crate) fn compute(grammar: &Grammar<'_>) -> Self {
        let mut sets: BTreeMap<SymbolId, BTreeSet<SymbolId>> = grammar
            .non_terms()
            .iter()
            .map(|&nt| (nt, BTreeSet::new()))
            .collect();
        // 值不再更新时结束, 集合单调增长且以终结符数量 + 1 为上界.
        let mut changed = true;
        while changed {
            changed = false;
            for prod in grammar.prods() {
                let mut added = BTreeSet::new();
                let mut nullable = true;
                for sym in prod.tail_without_eps() {
                    if grammar.is_term(sym) {
                        added.insert(sym);
                        nullable = false;
                        break;
                    }
                    let Some(first) = sets.get(&sym) else {
                        nullable = false;
                        break;
                    };
                    added.extend(first.iter().filter(|&&t| t != SymbolId::EPSILON));
                    if !first.contains(&SymbolId::EPSILON) {
                        nullable = false;
                        break;
                    }
                }
                if nullable {
                    added.insert(SymbolId::EPSILON);
                }
                let set = sets.entry(prod.head()).or_default();
                let before = set.len();
                set.extend(added);
                changed |= set.len() != before;
            }
        }
        Self { sets }
    }

    #[must_use]
    pub fn get(&self, nt: SymbolId) -> Option<&BTreeSet<SymbolId>> {
        self.sets.get(&nt)
    }

    /// 非终结符能否推导出空串.
    #[must_use]
    pub fn nullable(&self, nt: SymbolId) -> bool {
        self.sets
            .get(&nt)
            .is_some_and(|s| s.contains(&SymbolId::EPSILON))
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &BTreeSet<SymbolId>)> {
        self.sets.iter().map(|(&nt, s)| (nt, s))
    }

    /// 计算一个符号序列的 FIRST 集.
    ///
    /// 如果序列为空或者可以推导出空串, 结果中包含 [`SymbolId::EPSILON`].
    #[must_use]
    pub fn of_seq(
        &self,
        grammar: &Grammar<'_>,
        seq: impl IntoIterator<Item = SymbolId>,
    ) -> BTreeSet<SymbolId> {
        let mut first_set = BTreeSet::new();
        for sym in seq {
            if sym == SymbolId::EPSILON {
                continue;
            }
            if grammar.is_term(sym) {
                first_set.insert(sym);
                return first_set;
            }
            match self.sets.get(&sym) {
                Some(first) => {
                    first_set.extend(first.iter().filter(|&&t| t != SymbolId::EPSILON));
                    if !first.contains(&SymbolId::EPSILON) {
                        return first_set;
                    }
                }
                None => return first_set,
            }
        }
        first_set.insert(SymbolId::EPSILON);
        first_set
    }

    /// 计算 `FIRST(seq fallthrough)`: 序列可空时以 `fallthrough` 代替空串, 结果中不含空串.
    #[must_use]
    pub fn of_seq_with_fallthrough(
        &self,
        grammar: &Grammar<'_>,
        seq: impl IntoIterator<Item = SymbolId>,
        fallthrough: impl IntoIterator<Item = SymbolId>,
    ) -> BTreeSet<SymbolId> {
        let mut first_set = self.of_seq(grammar, seq);
        if first_set.remove(&SymbolId::EPSILON) {
            first_set.extend(fallthrough);
        }
        first_set
    }
}

/// 每个非终结符的 FOLLOW 集, 元素为终结符或者结束符.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowSets {
    sets: BTreeMap<SymbolId, BTreeSet<SymbolId>>,
}

impl FollowSets {
    pub(crate) fn compute(grammar: &Grammar<'_>, first: &FirstSets) -> Self {
        let mut sets: BTreeMap<SymbolId, BTreeSet<SymbolId>> = grammar
            .non_terms()
            .iter()
            .map(|&nt| (nt, BTreeSet::new()))
            .collect();
        sets.entry(grammar.symbol_start())
            .or_default()
            .insert(SymbolId::END_MARKER);
        let mut changed = true;
        while changed {
            changed = false;
            for prod in grammar.prods() {
                let tail: Vec<SymbolId> = prod.tail_without_eps().collect();
                for (idx, &sym) in tail.iter().enumerate() {
                    if !grammar.is_non_term(sym) {
                        continue;
                    }
                    let mut added = first.of_seq(grammar, tail[idx + 1..].iter().copied());
                    if added.remove(&SymbolId::EPSILON) {
                        added.extend(sets.get(&prod.head()).into_iter().flatten().copied());
                    }
                    let set = sets.entry(sym).or_default();
                    let before = set.len();
                    set.extend(added);
                    changed |= set.len() != before;
                }
            }
        }
        Self { sets }
    }

    #[must_use]
    pub fn get(&self, nt: SymbolId) -> Option<&BTreeSet<SymbolId>> {
        self.sets.get(&nt)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &BTreeSet<SymbolId>)> {
        self.sets.iter().map(|(&nt, s)| (nt, s))
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use bumpalo::Bump;
    use pretty_assertions::assert_eq;

    use crate::{Grammar, SymbolId};

    fn names<'a>(grammar: &Grammar<'a>, set: &BTreeSet<SymbolId>) -> BTreeSet<&'a str> {
        set.iter().map(|&s| grammar.name(s)).collect()
    }

    #[test]
    fn first() {
        let bump = Bump::new();
        let grammar = Grammar::from_cfg(
            "program -> stmts
            stmts -> { stmt stmts } | stmt | E | program",
            Some("program"),
            &bump,
        )
        .unwrap();
        let first = grammar.first_sets();
        let stmts = grammar.lookup("stmts").unwrap();
        assert_eq!(
            names(&grammar, first.get(stmts).unwrap()),
            ["{", "stmt", "E"].into()
        );
        assert_eq!(
            names(&grammar, first.get(grammar.symbol_start()).unwrap()),
            ["{", "stmt", "E"].into()
        );
    }

    #[test]
    fn first_and_follow_of_expression_grammar() {
        let bump = Bump::new();
        let grammar = Grammar::from_cfg(
            "E' -> T R
            R -> + T R | E
            T -> F Y
            Y -> * F Y | E
            F -> ( E' ) | id",
            None,
            &bump,
        )
        .unwrap();
        let nt = |n| grammar.lookup(n).unwrap();
        let first = grammar.first_sets();
        let follow = grammar.follow_sets();
        assert_eq!(names(&grammar, first.get(nt("E'")).unwrap()), ["(", "id"].into());
        assert_eq!(names(&grammar, first.get(nt("R")).unwrap()), ["+", "E"].into());
        assert_eq!(names(&grammar, first.get(nt("Y")).unwrap()), ["*", "E"].into());
        assert_eq!(names(&grammar, follow.get(nt("E'")).unwrap()), [")", "eof"].into());
        assert_eq!(names(&grammar, follow.get(nt("R")).unwrap()), [")", "eof"].into());
        assert_eq!(
            names(&grammar, follow.get(nt("T")).unwrap()),
            ["+", ")", "eof"].into()
        );
        assert_eq!(
            names(&grammar, follow.get(nt("F")).unwrap()),
            ["*", "+", ")", "eof"].into()
        );
    }

    #[test]
    fn seq_first_set() {
        let bump = Bump::new();
        let grammar = Grammar::from_cfg("S -> A B c\nA -> a | E\nB -> b | E", None, &bump).unwrap();
        let first = grammar.first_sets();
        let a = grammar.lookup("A").unwrap();
        let b = grammar.lookup("B").unwrap();
        let c = grammar.lookup("c").unwrap();
        assert_eq!(names(&grammar, &first.of_seq(&grammar, [a, b])), ["a", "b", "E"].into());
        assert_eq!(names(&grammar, &first.of_seq(&grammar, [a, b, c])), ["a", "b", "c"].into());
        assert_eq!(names(&grammar, &first.of_seq(&grammar, [])), ["E"].into());
        assert_eq!(
            names(
                &grammar,
                &first.of_seq_with_fallthrough(&grammar, [a, b], [SymbolId::END_MARKER])
            ),
            ["a", "b", "eof"].into()
        );
    }

    #[test]
    fn recompute_is_idempotent() {
        let bump = Bump::new();
        let grammar = Grammar::from_cfg(
            "S -> S a | A\nA -> b A | E",
            None,
            &bump,
        )
        .unwrap();
        let first = grammar.compute_first();
        assert_eq!(&first, grammar.first_sets());
        assert_eq!(first, grammar.compute_first());
        let follow = grammar.compute_follow(&first);
        assert_eq!(&follow, grammar.follow_sets());
        assert_eq!(follow, grammar.compute_follow(&grammar.compute_first()));
    }
}
