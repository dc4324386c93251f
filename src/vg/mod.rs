//! The value graph: an SSA like reification of the program expressions.
//!
//! Expressions become [ValueNode]s produced by typed [Edge]s (`call`,
//! `listdef`, `kvdef`, `fndef`). While the graph is under construction every
//! edge port is a [PhiNode] holding resolution candidates keyed by scope
//! depth; the resolver collapses each phi to its innermost candidate and the
//! ports become plain values, leaving a DAG.
//!
//! Identifier expressions start as transient placeholder values. After scope
//! connection they either resolve through their [BindPhi](crate::bdg::BindPhi)
//! or, for opaque names such as annotations, are materialized into permanent
//! identifier values. No placeholder survives resolution.

mod builder;
mod closure;
mod effects;
mod resolve;

#[cfg(test)]
mod __tests__;

pub use builder::build_value_graph;
pub use closure::convert_closures;
pub use effects::apply_effects;
pub use resolve::resolve_phis;

use crate::ast::AstId;
use crate::bdg::BindPhiId;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
/// A wrapper to indicate the index of a [ValueNode] in the graph.
pub struct ValueId(pub(crate) usize);

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
/// A wrapper to indicate the index of a [PhiNode] in the graph.
pub struct PhiId(pub(crate) usize);

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
/// A wrapper to indicate the index of an [Edge] in the graph.
pub struct EdgeId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Literal,
    /// A compile time symbol, e.g. a parameter name or a list key.
    Symbol,
    /// A function body, terminal in the expression graph.
    Block,
    /// A computed result. Unless it names a builtin or an opaque identifier,
    /// it is the output of exactly one edge.
    Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Call,
    ListDef,
    KvDef,
    FnDef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// An edge port: a phi while the graph is unresolved, a value afterwards.
pub enum Port {
    Phi(PhiId),
    Value(ValueId),
}

impl Port {
    pub fn value(&self) -> Option<ValueId> {
        match self {
            Port::Value(v) => Some(*v),
            Port::Phi(_) => None,
        }
    }

    pub fn expect_value(&self) -> ValueId {
        match self {
            Port::Value(v) => *v,
            Port::Phi(p) => panic!("port still holds phi {:?}", p),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValueNode {
    pub id: ValueId,
    pub kind: ValueKind,
    pub ast: Option<AstId>,
    /// The producing edge. Builtin and materialized identifier values have none.
    pub in_edge: Option<EdgeId>,
    /// Transient marker of an unresolved identifier value.
    pub placeholder: bool,
    /// The builtin name for intrinsic values.
    pub builtin: Option<String>,
}

impl ValueNode {
    pub fn is_builtin(&self) -> bool {
        self.builtin.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct PhiNode {
    pub id: PhiId,
    /// The identifier use this phi stands for, if any.
    pub ident: Option<AstId>,
    pub bindphi: Option<BindPhiId>,
    /// Candidate values keyed by scope depth.
    pub candidates: BTreeMap<i32, BTreeSet<ValueId>>,
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub id: EdgeId,
    pub kind: EdgeKind,
    pub output: ValueId,
    /// The applied value; present exactly for `call` edges.
    pub transform: Option<Port>,
    pub inputs: Vec<Port>,
    pub ast: AstId,
    pub is_effect: bool,
    pub effect_index: Option<usize>,
    /// The `Block` node owning this effect.
    pub effect_block: Option<AstId>,
}

/// The value graph of one program.
#[derive(Debug)]
pub struct ValueGraph {
    values: Vec<ValueNode>,
    phis: Vec<PhiNode>,
    edges: Vec<Edge>,
    value_of_ast: HashMap<AstId, ValueId>,
    pub(crate) phi_of_ident: HashMap<AstId, PhiId>,
}

impl ValueGraph {
    pub(crate) fn new() -> Self {
        Self {
            values: Vec::new(),
            phis: Vec::new(),
            edges: Vec::new(),
            value_of_ast: HashMap::new(),
            phi_of_ident: HashMap::new(),
        }
    }

    pub fn values(&self) -> &Vec<ValueNode> {
        &self.values
    }

    pub fn value(&self, id: ValueId) -> &ValueNode {
        &self.values[id.0]
    }

    pub fn phis(&self) -> &Vec<PhiNode> {
        &self.phis
    }

    pub fn phi(&self, id: PhiId) -> &PhiNode {
        &self.phis[id.0]
    }

    pub fn edges(&self) -> &Vec<Edge> {
        &self.edges
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0]
    }

    /// The value an expression node evaluates to.
    pub fn value_of(&self, ast: AstId) -> Option<ValueId> {
        self.value_of_ast.get(&ast).copied()
    }

    pub(crate) fn value_mut(&mut self, id: ValueId) -> &mut ValueNode {
        &mut self.values[id.0]
    }

    pub(crate) fn phi_mut(&mut self, id: PhiId) -> &mut PhiNode {
        &mut self.phis[id.0]
    }

    pub(crate) fn edge_mut(&mut self, id: EdgeId) -> &mut Edge {
        &mut self.edges[id.0]
    }

    pub(crate) fn push_value(
        &mut self,
        kind: ValueKind,
        ast: Option<AstId>,
        placeholder: bool,
        builtin: Option<String>,
    ) -> ValueId {
        let id = ValueId(self.values.len());
        self.values.push(ValueNode {
            id,
            kind,
            ast,
            in_edge: None,
            placeholder,
            builtin,
        });
        id
    }

    pub(crate) fn push_phi(
        &mut self,
        ident: Option<AstId>,
        bindphi: Option<BindPhiId>,
        candidates: BTreeMap<i32, BTreeSet<ValueId>>,
    ) -> PhiId {
        let id = PhiId(self.phis.len());
        self.phis.push(PhiNode {
            id,
            ident,
            bindphi,
            candidates,
        });
        id
    }

    pub(crate) fn push_edge(
        &mut self,
        kind: EdgeKind,
        output: ValueId,
        transform: Option<Port>,
        inputs: Vec<Port>,
        ast: AstId,
    ) -> EdgeId {
        debug_assert_eq!(self.values[output.0].kind, ValueKind::Expr);
        debug_assert!(self.values[output.0].in_edge.is_none());
        let id = EdgeId(self.edges.len());
        self.edges.push(Edge {
            id,
            kind,
            output,
            transform,
            inputs,
            ast,
            is_effect: false,
            effect_index: None,
            effect_block: None,
        });
        self.values[output.0].in_edge = Some(id);
        id
    }

    pub(crate) fn record_value(&mut self, ast: AstId, value: ValueId) {
        self.value_of_ast.insert(ast, value);
    }

    pub(crate) fn take_phis(&mut self) -> Vec<PhiNode> {
        self.phi_of_ident.clear();
        std::mem::take(&mut self.phis)
    }

    /// Drop the transient placeholder values and renumber the survivors.
    /// Every edge port must already be a value.
    pub(crate) fn compact(&mut self) {
        let mut remap: Vec<Option<ValueId>> = vec![None; self.values.len()];
        let mut kept: Vec<ValueNode> = Vec::with_capacity(self.values.len());
        for node in self.values.drain(..) {
            if node.placeholder {
                continue;
            }
            let id = ValueId(kept.len());
            remap[node.id.0] = Some(id);
            kept.push(ValueNode { id, ..node });
        }
        self.values = kept;

        let rewrite = |port: &mut Port, remap: &Vec<Option<ValueId>>| {
            if let Port::Value(v) = port {
                *port = Port::Value(remap[v.0].expect("placeholder survived into an edge port"));
            }
        };
        for edge in &mut self.edges {
            edge.output = remap[edge.output.0].expect("placeholder survived as an edge output");
            if let Some(transform) = &mut edge.transform {
                rewrite(transform, &remap);
            }
            for input in &mut edge.inputs {
                rewrite(input, &remap);
            }
        }
        self.value_of_ast.retain(|_, v| remap[v.0].is_some());
        for v in self.value_of_ast.values_mut() {
            *v = remap[v.0].expect("retained value");
        }
    }

    /// Render the resolved graph for debugging.
    pub fn dump(&self) -> String {
        let mut writer = String::new();
        for value in &self.values {
            let _ = writeln!(
                writer,
                "V{} {:?}{}{}",
                value.id.0,
                value.kind,
                value
                    .builtin
                    .as_ref()
                    .map_or(String::new(), |n| format!(" builtin {}", n)),
                value
                    .in_edge
                    .map_or(String::new(), |e| format!(" <- E{}", e.0)),
            );
        }
        for edge in &self.edges {
            let port = |p: &Port| match p {
                Port::Value(v) => format!("V{}", v.0),
                Port::Phi(p) => format!("P{}", p.0),
            };
            let _ = writeln!(
                writer,
                "E{} {:?} -> V{} transform [{}] inputs [{}]{}",
                edge.id.0,
                edge.kind,
                edge.output.0,
                edge.transform.as_ref().map_or(String::new(), &port),
                edge.inputs.iter().map(&port).collect::<Vec<_>>().join(", "),
                if edge.is_effect {
                    format!(" effect #{}", edge.effect_index.unwrap_or(0))
                } else {
                    String::new()
                },
            );
        }
        writer
    }
}
