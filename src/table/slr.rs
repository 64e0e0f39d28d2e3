//! SLR(1): 归约项只在产生式头部的 FOLLOW 集上归约.

use crate::{Grammar, SymbolId, item::Item};

use super::{Discipline, TableBuilder};

pub struct SlrBuilder;

impl TableBuilder for SlrBuilder {
    const DISCIPLINE: Discipline = Discipline::Slr1;

    fn reduce_terminals(grammar: &Grammar<'_>, item: &Item) -> Vec<SymbolId> {
        let head = grammar.prod(item.prod()).head();
        grammar
            .follow_sets()
            .get(head)
            .into_iter()
            .flatten()
            .copied()
            .collect()
    }
}
