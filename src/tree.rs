//! 语法树和推导序列.
//!
//! 语法树的节点保存在一个 arena 中, 子节点以 [`NodeId`] 引用, 遍历和销毁都不需要递归.

use crate::{Grammar, ProdId, SymbolId, index_type, lexer::Token};

index_type! {
    pub struct NodeId("n");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// 按产生式归约得到的节点, 子节点按从左到右的顺序排列.
    NonTerminal { prod: ProdId, children: Vec<NodeId> },
    Terminal(Token),
    /// ε 产生式的唯一子节点.
    Epsilon,
}

impl Node {
    #[must_use]
    pub fn prod(&self) -> Option<ProdId> {
        match self {
            Self::NonTerminal { prod, .. } => Some(*prod),
            _ => None,
        }
    }

    #[must_use]
    pub fn token(&self) -> Option<&Token> {
        match self {
            Self::Terminal(token) => Some(token),
            _ => None,
        }
    }

    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        match self {
            Self::NonTerminal { children, .. } => children,
            _ => &[],
        }
    }

    #[must_use]
    pub fn is_epsilon(&self) -> bool {
        matches!(self, Self::Epsilon)
    }
}

/// 分析成功之后得到的具体语法树, 根节点是增广开始符号.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl SyntaxTree {
    pub(crate) fn new(nodes: Vec<Node>, root: NodeId) -> Self {
        Self { nodes, root }
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// 获取节点, 编号必须来自这棵树.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).children()
    }

    /// arena 中的节点数量.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 先序遍历, 产生 (深度, 节点编号).
    pub fn preorder(&self) -> impl Iterator<Item = (usize, NodeId)> + '_ {
        let mut stack = vec![(0, self.root)];
        std::iter::from_fn(move || {
            let (depth, id) = stack.pop()?;
            stack.extend(self.children(id).iter().rev().map(|&c| (depth + 1, c)));
            Some((depth, id))
        })
    }

    /// 从左到右的叶子词法单元.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> + '_ {
        self.preorder().filter_map(|(_, id)| self.node(id).token())
    }

    /// 节点对应的文法符号, ε 节点为 [`SymbolId::EPSILON`], 终结符节点按类型名查找.
    #[must_use]
    pub fn symbol(&self, grammar: &Grammar<'_>, id: NodeId) -> Option<SymbolId> {
        match self.node(id) {
            Node::NonTerminal { prod, .. } => Some(grammar.prod(*prod).head()),
            Node::Terminal(token) => grammar.terminal(token.kind()),
            Node::Epsilon => Some(SymbolId::EPSILON),
        }
    }

    /// 缩进形式输出整棵树.
    #[must_use]
    pub fn to_pretty(&self, grammar: &Grammar<'_>) -> String {
        let mut s = String::new();
        for (depth, id) in self.preorder() {
            let line = match self.node(id) {
                Node::NonTerminal { prod, .. } => {
                    format!("{} [{}]", grammar.name(grammar.prod(*prod).head()), prod)
                }
                Node::Terminal(token) => match token.value() {
                    Some(value) => format!("{} {value:?}", token.kind()),
                    None => token.kind().to_string(),
                },
                Node::Epsilon => "ε".to_string(),
            };
            s += &"  ".repeat(depth);
            s += &line;
            s += "\n";
        }
        s
    }
}

/// 按归约发生顺序记录的产生式编号.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Derivation {
    prods: Vec<ProdId>,
}

impl Derivation {
    pub(crate) fn new(prods: Vec<ProdId>) -> Self {
        Self { prods }
    }

    #[must_use]
    pub fn productions(&self) -> &[ProdId] {
        &self.prods
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.prods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prods.is_empty()
    }

    /// 由归约序列还原最右推导的各个句型.
    ///
    /// 逆序应用归约, 每一步展开句型中最右边的非终结符; 第一个句型是最后一次归约的头部.
    #[must_use]
    pub fn sentential_forms(&self, grammar: &Grammar<'_>) -> Vec<Vec<SymbolId>> {
        let Some(&last) = self.prods.last() else {
            return Vec::new();
        };
        let mut form = vec![grammar.prod(last).head()];
        let mut forms = vec![form.clone()];
        for &prod in self.prods.iter().rev() {
            let prod = grammar.prod(prod);
            let Some(at) = form.iter().rposition(|&s| grammar.is_non_term(s)) else {
                break;
            };
            if form[at] != prod.head() {
                break;
            }
            form.splice(at..=at, prod.tail_without_eps());
            forms.push(form.clone());
        }
        forms
    }
}

#[cfg(test)]
mod test {
    use bumpalo::Bump;
    use pretty_assertions::assert_eq;

    use crate::{
        Grammar, ProdId,
        lexer::{Position, Token},
        tree::{Derivation, Node, NodeId, SyntaxTree},
    };

    /// S' -> S, S -> a S | E, 输入 `a`.
    fn sample() -> (Vec<Node>, NodeId) {
        let nodes = vec![
            Node::Terminal(Token::new("a", Position::new(1, 1))),
            Node::Epsilon,
            Node::NonTerminal {
                prod: ProdId::new(2),
                children: vec![NodeId::new(1)],
            },
            Node::NonTerminal {
                prod: ProdId::new(1),
                children: vec![NodeId::new(0), NodeId::new(2)],
            },
            Node::NonTerminal {
                prod: ProdId::ACCEPT,
                children: vec![NodeId::new(3)],
            },
        ];
        (nodes, NodeId::new(4))
    }

    #[test]
    fn preorder_and_pretty() {
        let bump = Bump::new();
        let grammar = Grammar::from_cfg("S -> a S | E", None, &bump).unwrap();
        let (nodes, root) = sample();
        let tree = SyntaxTree::new(nodes, root);
        assert_eq!(
            tree.preorder().map(|(d, id)| (d, id.index())).collect::<Vec<_>>(),
            [(0, 4), (1, 3), (2, 0), (2, 2), (3, 1)]
        );
        assert_eq!(
            tree.to_pretty(&grammar),
            "Sprime [0]\n  S [1]\n    a\n    S [2]\n      ε\n"
        );
        assert_eq!(tree.tokens().map(|t| t.kind()).collect::<Vec<_>>(), ["a"]);
        assert_eq!(tree.symbol(&grammar, root), Some(grammar.symbol_start()));
    }

    #[test]
    fn rightmost_forms() {
        let bump = Bump::new();
        let grammar = Grammar::from_cfg("S -> a S | E", None, &bump).unwrap();
        let derivation = Derivation::new(vec![ProdId::new(2), ProdId::new(1), ProdId::ACCEPT]);
        let forms: Vec<String> = derivation
            .sentential_forms(&grammar)
            .iter()
            .map(|f| f.iter().map(|&s| grammar.name(s)).collect::<Vec<_>>().join(" "))
            .collect();
        assert_eq!(forms, ["Sprime", "S", "a S", "a"]);
        assert!(Derivation::default().sentential_forms(&grammar).is_empty());
    }
}
