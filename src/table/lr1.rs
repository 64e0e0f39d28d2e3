//! 规范 LR(1): 归约项只在自己的前瞻符上归约.

use crate::{Grammar, SymbolId, item::Item};

use super::{Discipline, TableBuilder};

pub struct Lr1Builder;

impl TableBuilder for Lr1Builder {
    const DISCIPLINE: Discipline = Discipline::Lr1;

    fn reduce_terminals(_grammar: &Grammar<'_>, item: &Item) -> Vec<SymbolId> {
        item.look_aheads().into_iter().flatten().copied().collect()
    }
}
