//! 词法单元和一个按空白切分的简单扫描器.
//!
//! 分析驱动只依赖 [`Token`] 的类型名和位置, 任何产生 `Iterator<Item = Token>` 的扫描器都可以替换这里的 [`Lexer`].

use std::{
    fmt::{Debug, Display},
    iter::Peekable,
    str::Chars,
};

use crate::{Grammar, symbol::END_MARKER_NAME};

/// 源码位置, 行号和列号都从 1 开始.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Default for Position {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&format!("{}:{}", self.line, self.column))
    }
}

impl Position {
    #[must_use]
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// 带类型的词法单元: 类型名对应文法中的终结符, `value` 保存标识符和数字的字面值.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Token {
    kind: String,
    value: Option<String>,
    pos: Position,
}

impl Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Some(value) => f.pad(&format!("{}({value:?})@{}", self.kind, self.pos)),
            None => f.pad(&format!("{}@{}", self.kind, self.pos)),
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.text())
    }
}

impl Token {
    #[must_use]
    pub fn new(kind: impl Into<String>, pos: Position) -> Self {
        Self {
            kind: kind.into(),
            value: None,
            pos,
        }
    }

    #[must_use]
    pub fn with_value(kind: impl Into<String>, value: impl Into<String>, pos: Position) -> Self {
        Self {
            kind: kind.into(),
            value: Some(value.into()),
            pos,
        }
    }

    #[must_use]
    pub fn end_marker(pos: Position) -> Self {
        Self::new(END_MARKER_NAME, pos)
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    #[must_use]
    pub fn pos(&self) -> Position {
        self.pos
    }

    /// 源码中的文本: 有字面值时为字面值, 否则为类型名.
    #[must_use]
    pub fn text(&self) -> &str {
        self.value.as_deref().unwrap_or(&self.kind)
    }

    /// 结束符没有字面值, 源码中写出的 `eof` 单词带有字面值, 不是结束符.
    #[must_use]
    pub fn is_end_marker(&self) -> bool {
        self.kind == END_MARKER_NAME && self.value.is_none()
    }
}

/// 按空白切分的扫描器.
///
/// 和文法中某个终结符同名的单词以该终结符为类型, 全数字的单词为 `NUM`, 标识符为 `ID`,
/// 其他单词原样作为类型 (分析时会报告为未知的词法单元). 保留的 `eof` 单词保留字面值,
/// 同样会被报告为未知的词法单元. 输入结束时产生一个结束符, 之后不再产生.
pub struct Lexer<'s, 'g> {
    grammar: &'g Grammar<'g>,
    chars: Peekable<Chars<'s>>,
    pos: Position,
    finished: bool,
}

impl<'s, 'g> Lexer<'s, 'g> {
    pub const NUM: &'static str = "NUM";
    pub const ID: &'static str = "ID";

    #[must_use]
    pub fn new(src: &'s str, grammar: &'g Grammar<'g>) -> Self {
        Self {
            grammar,
            chars: src.chars().peekable(),
            pos: Position::default(),
            finished: false,
        }
    }

    fn bump(&mut self) {
        match self.chars.next() {
            Some('\n') => {
                self.pos.line += 1;
                self.pos.column = 1;
            }
            Some(_) => self.pos.column += 1,
            None => {}
        }
    }

    fn classify(&self, word: String, pos: Position) -> Token {
        if word == END_MARKER_NAME {
            return Token::with_value(END_MARKER_NAME, word, pos);
        }
        if self.grammar.terminal(&word).is_some() {
            return Token::new(word, pos);
        }
        let mut chars = word.chars();
        let is_ident = chars
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
            && chars.all(|c| c.is_alphanumeric() || c == '_');
        if word.chars().all(|c| c.is_ascii_digit()) {
            Token::with_value(Self::NUM, word, pos)
        } else if is_ident {
            Token::with_value(Self::ID, word, pos)
        } else {
            Token::new(word, pos)
        }
    }
}

impl Iterator for Lexer<'_, '_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.bump();
        }
        let start = self.pos;
        let mut word = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                break;
            }
            word.push(c);
            self.bump();
        }
        if word.is_empty() {
            self.finished = true;
            return Some(Token::end_marker(start));
        }
        Some(self.classify(word, start))
    }
}
