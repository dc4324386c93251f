//! The binding/dependency graph: lexical scope resolution over the [Ast].
//!
//! The builder runs in phases so that forward references resolve correctly:
//! a global scan creating a `symbol` point for every indexed list item key,
//! the block tree with one `point` per statement target, the builtin
//! injection, and finally one [BindPhi] per identifier use recording every
//! visible definition point grouped by scope depth.
//!
//! Depth conventions: block depths start at 0 for the root block and grow
//! inward; builtins live at the sentinel depth −1 and global symbols at −2,
//! so any in-scope block definition shadows both under the innermost-wins
//! rule.

mod builder;
pub mod intr;

#[cfg(test)]
mod __tests__;

pub use builder::build_bdg;

use crate::ast::AstId;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
/// A wrapper to indicate the index of a [BlockInfo] in the [Bdg].
pub struct BlockId(pub(crate) usize);

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
/// A wrapper to indicate the index of a [Point] in the [Bdg].
pub struct PointId(pub(crate) usize);

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
/// A wrapper to indicate the index of a [BindPhi] in the [Bdg].
pub struct BindPhiId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointKind {
    /// A statement target, defined at its block depth.
    Point,
    /// An intrinsic name injected at depth −1.
    Builtin,
    /// An indexed list item key, visible everywhere at depth −2.
    Symbol,
}

#[derive(Debug)]
/// Scope bookkeeping of one `Block` node.
pub struct BlockInfo {
    pub id: BlockId,
    pub parent: Option<BlockId>,
    pub children: Vec<BlockId>,
    pub depth: i32,
    pub ast: AstId,
    /// Definition points owned by this block, in statement order.
    pub points: Vec<PointId>,
}

#[derive(Debug)]
/// A definition site for a name.
pub struct Point {
    pub id: PointId,
    pub name: String,
    pub kind: PointKind,
    pub block: Option<BlockId>,
    pub identifier: Option<AstId>,
    pub stmt: Option<AstId>,
    pub define_depth: i32,
}

#[derive(Debug)]
/// The resolution candidates of one identifier use, keyed by scope depth.
pub struct BindPhi {
    pub id: BindPhiId,
    pub name: String,
    pub entry: AstId,
    pub candidates: BTreeMap<i32, BTreeSet<PointId>>,
}

impl BindPhi {
    pub fn add(&mut self, point: PointId, depth: i32) {
        self.candidates.entry(depth).or_default().insert(point);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// What an identifier node stands for: exactly one of the two is assigned to
/// every identifier after scope resolution.
pub enum Binding {
    Point(PointId),
    Phi(BindPhiId),
}

/// The scope resolution output: block tree, point set and bindphi index.
#[derive(Debug)]
pub struct Bdg {
    blocks: Vec<BlockInfo>,
    points: Vec<Point>,
    bindphis: Vec<BindPhi>,
    bindings: HashMap<AstId, Binding>,
    block_of_ast: HashMap<AstId, BlockId>,
    builtin_scope: HashMap<String, Vec<PointId>>,
    symbol_scope: HashMap<String, Vec<PointId>>,
}

impl Bdg {
    pub(crate) fn new() -> Self {
        Self {
            blocks: Vec::new(),
            points: Vec::new(),
            bindphis: Vec::new(),
            bindings: HashMap::new(),
            block_of_ast: HashMap::new(),
            builtin_scope: HashMap::new(),
            symbol_scope: HashMap::new(),
        }
    }

    pub fn blocks(&self) -> &Vec<BlockInfo> {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> &BlockInfo {
        &self.blocks[id.0]
    }

    pub fn points(&self) -> &Vec<Point> {
        &self.points
    }

    pub fn point(&self, id: PointId) -> &Point {
        &self.points[id.0]
    }

    pub fn bindphis(&self) -> &Vec<BindPhi> {
        &self.bindphis
    }

    pub fn bindphi(&self, id: BindPhiId) -> &BindPhi {
        &self.bindphis[id.0]
    }

    /// The binding of an identifier node.
    pub fn binding(&self, identifier: AstId) -> Option<Binding> {
        self.bindings.get(&identifier).copied()
    }

    /// The [BlockInfo] of a `Block` node.
    pub fn block_of(&self, block_ast: AstId) -> Option<BlockId> {
        self.block_of_ast.get(&block_ast).copied()
    }

    /// Block ids ordered root first, by ascending depth.
    pub fn blocks_by_depth(&self) -> Vec<BlockId> {
        let mut ids: Vec<BlockId> = self.blocks.iter().map(|b| b.id).collect();
        ids.sort_by_key(|id| (self.blocks[id.0].depth, id.0));
        ids
    }

    pub(crate) fn push_block(&mut self, parent: Option<BlockId>, ast: AstId) -> BlockId {
        let depth = parent.map_or(0, |p| self.blocks[p.0].depth + 1);
        let id = BlockId(self.blocks.len());
        self.blocks.push(BlockInfo {
            id,
            parent,
            children: Vec::new(),
            depth,
            ast,
            points: Vec::new(),
        });
        if let Some(parent) = parent {
            self.blocks[parent.0].children.push(id);
        }
        self.block_of_ast.insert(ast, id);
        id
    }

    pub(crate) fn push_point(
        &mut self,
        name: String,
        kind: PointKind,
        block: Option<BlockId>,
        identifier: Option<AstId>,
        stmt: Option<AstId>,
        define_depth: i32,
    ) -> PointId {
        let id = PointId(self.points.len());
        self.points.push(Point {
            id,
            name: name.clone(),
            kind,
            block,
            identifier,
            stmt,
            define_depth,
        });
        if let Some(block) = block {
            self.blocks[block.0].points.push(id);
        }
        match kind {
            PointKind::Builtin => self.builtin_scope.entry(name).or_default().push(id),
            PointKind::Symbol => self.symbol_scope.entry(name).or_default().push(id),
            PointKind::Point => {}
        }
        id
    }

    pub(crate) fn push_bindphi(&mut self, name: String, entry: AstId) -> BindPhiId {
        let id = BindPhiId(self.bindphis.len());
        self.bindphis.push(BindPhi {
            id,
            name,
            entry,
            candidates: BTreeMap::new(),
        });
        id
    }

    pub(crate) fn bindphi_mut(&mut self, id: BindPhiId) -> &mut BindPhi {
        &mut self.bindphis[id.0]
    }

    pub(crate) fn bind(&mut self, identifier: AstId, binding: Binding) {
        debug_assert!(
            !self.bindings.contains_key(&identifier),
            "identifier is already bound"
        );
        self.bindings.insert(identifier, binding);
    }

    pub(crate) fn symbol_points(&self, name: &str) -> &[PointId] {
        self.symbol_scope.get(name).map_or(&[], |v| v.as_slice())
    }

    pub(crate) fn builtin_points(&self, name: &str) -> &[PointId] {
        self.builtin_scope.get(name).map_or(&[], |v| v.as_slice())
    }
}
