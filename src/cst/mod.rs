//! The concrete syntax tree produced by the YAFL grammar.
//!
//! Every node is either a grammar rule with a name, start/end pointers and a
//! list of children, or a token leaf. Hidden channel tokens never reach the
//! tree; structural punctuation tokens are kept as leaves so the tree mirrors
//! the grammar derivation exactly.

mod grammar;

#[cfg(test)]
mod __tests__;

pub use grammar::parse;

use crate::util::Source;
use crate::Token;
use ptree::TreeItem;
use std::fmt::Write;
use std::fmt::{Debug, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Grammar rule names of the YAFL parse tree.
pub enum Rule {
    Program,
    Block,
    Stmt,
    Expression,
    AtomExpression,
    Call,
    BracketCall,
    List,
    ListItem,
    ParenExpression,
    Function,
    Params,
    Annotation,
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::Program => "program",
            Rule::Block => "block",
            Rule::Stmt => "stmt",
            Rule::Expression => "expression",
            Rule::AtomExpression => "atom_expression",
            Rule::Call => "call",
            Rule::BracketCall => "bracket_call",
            Rule::List => "list",
            Rule::ListItem => "list_item",
            Rule::ParenExpression => "paren_expression",
            Rule::Function => "function",
            Rule::Params => "params",
            Rule::Annotation => "annotation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CstKind {
    Rule(Rule),
    Token(Token),
}

#[derive(Clone)]
/// A node of the parse tree.
pub struct CstNode {
    pub kind: CstKind,
    pub start: usize,
    pub end: usize,
    pub children: Vec<CstNode>,
}

impl CstNode {
    pub fn rule(rule: Rule, children: Vec<CstNode>) -> Self {
        let start = children.first().map_or(0, |c| c.start);
        let end = children.last().map_or(start, |c| c.end);
        Self {
            kind: CstKind::Rule(rule),
            start,
            end,
            children,
        }
    }

    pub fn leaf(token: Token, start: usize, end: usize) -> Self {
        Self {
            kind: CstKind::Token(token),
            start,
            end,
            children: Vec::with_capacity(0),
        }
    }

    pub fn is_rule(&self, rule: Rule) -> bool {
        self.kind == CstKind::Rule(rule)
    }

    pub fn is_token(&self, token: Token) -> bool {
        self.kind == CstKind::Token(token)
    }

    pub fn token(&self) -> Option<Token> {
        match self.kind {
            CstKind::Token(t) => Some(t),
            CstKind::Rule(_) => None,
        }
    }

    /// Children which are grammar rules, skipping token leaves.
    pub fn rule_children(&self) -> impl Iterator<Item = &CstNode> {
        self.children
            .iter()
            .filter(|c| matches!(c.kind, CstKind::Rule(_)))
    }

    /// Search through all nested children and return the first match node.
    pub fn find_tree<TF: Fn(&CstNode) -> bool>(&self, p: &TF) -> Option<&CstNode> {
        if p(self) {
            Some(self)
        } else {
            self.children.iter().find_map(|child| child.find_tree(p))
        }
    }

    pub fn contains(&self, rule: Rule) -> bool {
        self.find_tree(&|tree| tree.is_rule(rule)).is_some()
    }

    pub fn print(&self) -> Result<(), std::io::Error> {
        ptree::print_tree(self)
    }
}

impl Debug for CstNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut debug_struct = f.debug_struct("CstNode");
        debug_struct
            .field("kind", &self.kind)
            .field("start", &self.start)
            .field("end", &self.end);
        if self.children.len() > 0 {
            debug_struct.field("children", &self.children);
        }
        debug_struct.finish()
    }
}

impl TreeItem for CstNode {
    type Child = Self;

    fn write_self<W: std::io::Write>(&self, f: &mut W, _: &ptree::Style) -> std::io::Result<()> {
        match self.kind {
            CstKind::Rule(rule) => write!(f, "{} # {}-{}", rule.name(), self.start, self.end),
            CstKind::Token(token) => write!(f, "{:?} # {}-{}", token, self.start, self.end),
        }
    }

    fn children(&self) -> std::borrow::Cow<[Self::Child]> {
        std::borrow::Cow::from(&self.children)
    }
}

fn escape_json(text: &str, writer: &mut String) {
    for c in text.chars() {
        match c {
            '"' => writer.push_str("\\\""),
            '\\' => writer.push_str("\\\\"),
            '\n' => writer.push_str("\\n"),
            '\r' => writer.push_str("\\r"),
            '\t' => writer.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(writer, "\\u{:04x}", c as u32);
            }
            c => writer.push(c),
        }
    }
}

fn write_json(node: &CstNode, code: &Source, writer: &mut String) {
    match node.kind {
        CstKind::Rule(rule) => {
            let start = code.obtain_position(node.start);
            let end = code.obtain_position(node.end);
            let _ = write!(
                writer,
                "{{\"node-type\":\"rule\",\"rule\":\"{}\",\"start\":{{\"line\":{},\"column\":{}}},\"end\":{{\"line\":{},\"column\":{}}},\"children\":[",
                rule.name(),
                start.line,
                start.column,
                end.line,
                end.column
            );
            for (index, child) in node.children.iter().enumerate() {
                if index > 0 {
                    writer.push(',');
                }
                write_json(child, code, writer);
            }
            writer.push_str("]}");
        }
        CstKind::Token(token) => {
            let position = code.obtain_position(node.start);
            writer.push_str("{\"node-type\":\"token\",\"text\":\"");
            escape_json(code.text(node.start, node.end), writer);
            let _ = write!(
                writer,
                "\",\"token-type\":\"{:?}\",\"token-type-id\":{},\"channel\":{},\"line\":{},\"column\":{}}}",
                token,
                token as usize,
                token.channel(),
                position.line,
                position.column
            );
        }
    }
}

impl CstNode {
    /// Dump the parse tree in the JSON dictionary shape used by the debug tooling.
    pub fn to_json(&self, code: &Source) -> String {
        let mut writer = String::new();
        write_json(self, code, &mut writer);
        writer
    }
}
