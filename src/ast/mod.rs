//! The abstract syntax tree.
//!
//! Nodes live in an index arena owned by [Ast]; an [AstId] is a stable handle
//! into it. Every node keeps its parent id for the ancestor queries of the
//! later analyses, and the byte span plus line/column of its first parse tree
//! token for diagnostics.
//!
//! String literals never stay text: lowering expands them to a [List](AstKind::List)
//! of integer literal items, one per UTF-8 byte of the decoded string.

mod lower;

#[cfg(test)]
mod __tests__;

pub use lower::lower;

use crate::util::Position;
use std::fmt::Write;
use std::ops::Index;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
/// A wrapper to indicate the index of a node in the [Ast] arena.
pub struct AstId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Integer,
    Float,
    String,
    Boolean,
    Null,
}

#[derive(Debug, Clone)]
pub enum AstKind {
    Program {
        block: AstId,
    },
    Block {
        stmts: Vec<AstId>,
    },
    /// An expression statement with an optional binding target.
    Stmt {
        target: Option<AstId>,
        expr: AstId,
    },
    Identifier {
        name: String,
    },
    Literal {
        raw: String,
        literal: LiteralKind,
    },
    ListItem {
        key: Option<AstId>,
        value: AstId,
    },
    List {
        items: Vec<AstId>,
    },
    Function {
        params: AstId,
        ret: Option<AstId>,
        ann: Vec<AstId>,
        body: AstId,
    },
    Call {
        callee: AstId,
        arg: AstId,
    },
}

#[derive(Debug, Clone)]
pub struct AstNode {
    pub parent: Option<AstId>,
    pub start: usize,
    pub end: usize,
    pub position: Position,
    pub kind: AstKind,
}

/// The arena holding every node of one lowered program.
#[derive(Debug)]
pub struct Ast {
    nodes: Vec<AstNode>,
    root: AstId,
}

impl Index<AstId> for Ast {
    type Output = AstNode;

    fn index(&self, index: AstId) -> &Self::Output {
        &self.nodes[index.0]
    }
}

impl Ast {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: AstId(0),
        }
    }

    pub(crate) fn push(
        &mut self,
        kind: AstKind,
        start: usize,
        end: usize,
        position: Position,
    ) -> AstId {
        let id = AstId(self.nodes.len());
        self.nodes.push(AstNode {
            parent: None,
            start,
            end,
            position,
            kind,
        });
        id
    }

    pub(crate) fn adopt(&mut self, parent: AstId, child: AstId) {
        debug_assert!(self.nodes[child.0].parent.is_none());
        self.nodes[child.0].parent = Some(parent);
    }

    pub(crate) fn set_root(&mut self, root: AstId) {
        self.root = root;
    }

    /// The `Program` node.
    pub fn root(&self) -> AstId {
        self.root
    }

    /// The root block of the program.
    pub fn root_block(&self) -> AstId {
        match self[self.root].kind {
            AstKind::Program { block } => block,
            _ => panic!("root is not a program node"),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = AstId> {
        (0..self.nodes.len()).map(AstId)
    }

    pub fn parent(&self, id: AstId) -> Option<AstId> {
        self[id].parent
    }

    pub fn position(&self, id: AstId) -> Position {
        self[id].position
    }

    /// The name of an identifier node.
    pub fn name(&self, id: AstId) -> Option<&str> {
        match &self[id].kind {
            AstKind::Identifier { name } => Some(name),
            _ => None,
        }
    }

    pub fn is_identifier(&self, id: AstId) -> bool {
        matches!(self[id].kind, AstKind::Identifier { .. })
    }

    pub fn is_block(&self, id: AstId) -> bool {
        matches!(self[id].kind, AstKind::Block { .. })
    }

    pub fn is_function(&self, id: AstId) -> bool {
        matches!(self[id].kind, AstKind::Function { .. })
    }

    pub fn children(&self, id: AstId) -> Vec<AstId> {
        match &self[id].kind {
            AstKind::Program { block } => vec![*block],
            AstKind::Block { stmts } => stmts.clone(),
            AstKind::Stmt { target, expr } => {
                target.iter().copied().chain([*expr]).collect()
            }
            AstKind::Identifier { .. } | AstKind::Literal { .. } => Vec::new(),
            AstKind::ListItem { key, value } => {
                key.iter().copied().chain([*value]).collect()
            }
            AstKind::List { items } => items.clone(),
            AstKind::Function {
                params,
                ret,
                ann,
                body,
            } => {
                let mut children = vec![*params];
                children.extend(ret.iter().copied());
                children.extend(ann.iter().copied());
                children.push(*body);
                children
            }
            AstKind::Call { callee, arg } => vec![*callee, *arg],
        }
    }

    /// Whether `node` sits under `ancestor` (a node is within itself).
    pub fn is_within(&self, node: AstId, ancestor: AstId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self[id].parent;
        }
        false
    }

    /// Like [is_within](Ast::is_within), but the walk stops at the first
    /// `Function` boundary. Used by the closure and effect analyses so nodes
    /// of a nested function body are never attributed to the surrounding
    /// execution region.
    pub fn is_within_same_function(&self, node: AstId, outer: AstId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == outer {
                return true;
            }
            if self.is_function(id) {
                return false;
            }
            current = self[id].parent;
        }
        false
    }

    /// The nearest enclosing block, the node itself included.
    pub fn enclosing_block(&self, node: AstId) -> Option<AstId> {
        let mut current = Some(node);
        while let Some(id) = current {
            if self.is_block(id) {
                return Some(id);
            }
            current = self[id].parent;
        }
        None
    }

    /// Whether a function node carries an `!effect` / `effect!` annotation.
    pub fn has_effect_annotation(&self, function: AstId) -> bool {
        match &self[function].kind {
            AstKind::Function { ann, .. } => ann.iter().any(|a| {
                matches!(self.name(*a), Some("!effect") | Some("effect!"))
            }),
            _ => false,
        }
    }

    /// Render the tree with two space indentation for debugging.
    pub fn dump(&self) -> String {
        let mut writer = String::new();
        self.dump_node(self.root, 0, &mut writer);
        writer
    }

    fn dump_node(&self, id: AstId, level: usize, writer: &mut String) {
        let pad = "  ".repeat(level);
        let node = &self[id];
        let label = match &node.kind {
            AstKind::Program { .. } => "Program".to_string(),
            AstKind::Block { .. } => "Block".to_string(),
            AstKind::Stmt { .. } => "Stmt".to_string(),
            AstKind::Identifier { name } => format!("Identifier {}", name),
            AstKind::Literal { raw, literal } => format!("Literal {:?} {}", literal, raw),
            AstKind::ListItem { .. } => "ListItem".to_string(),
            AstKind::List { .. } => "List".to_string(),
            AstKind::Function { .. } => "Function".to_string(),
            AstKind::Call { .. } => "Call".to_string(),
        };
        let _ = writeln!(writer, "{}{} @ {}", pad, label, node.position);
        for child in self.children(id) {
            self.dump_node(child, level + 1, writer);
        }
    }
}
