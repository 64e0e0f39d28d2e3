//! LR(0): 归约项在所有终结符上归约, 不区分前瞻符.

use crate::{Grammar, SymbolId, item::Item};

use super::{Discipline, TableBuilder};

pub struct Lr0Builder;

impl TableBuilder for Lr0Builder {
    const DISCIPLINE: Discipline = Discipline::Lr0;

    fn reduce_terminals(grammar: &Grammar<'_>, _item: &Item) -> Vec<SymbolId> {
        grammar.terms().to_vec()
    }
}
