//! Construction of the unresolved value graph from the annotated [Ast].

use super::{EdgeKind, Port, ValueGraph, ValueId, ValueKind};
use crate::ast::{Ast, AstId, AstKind};
use crate::bdg::{Bdg, BindPhi, Binding, PointKind};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Build the value graph of every block of the program, breadth first over
/// the block tree, and connect the identifier placeholders to their
/// resolution candidates.
pub fn build_value_graph(ast: &Ast, bdg: &Bdg) -> ValueGraph {
    let mut builder = GraphBuilder {
        ast,
        bdg,
        graph: ValueGraph::new(),
        builtin_values: HashMap::new(),
        symbol_values: HashMap::new(),
    };

    for block in bdg.blocks_by_depth() {
        let stmts = match &ast[bdg.block(block).ast].kind {
            AstKind::Block { stmts } => stmts.clone(),
            _ => continue,
        };
        for stmt in stmts {
            if let AstKind::Stmt { expr, .. } = ast[stmt].kind {
                builder.build_expr(expr);
            }
        }
    }

    builder.connect_identifiers();
    builder.graph
}

struct GraphBuilder<'g> {
    ast: &'g Ast,
    bdg: &'g Bdg,
    graph: ValueGraph,
    builtin_values: HashMap<String, ValueId>,
    symbol_values: HashMap<String, ValueId>,
}

impl<'g> GraphBuilder<'g> {
    /// Lower one expression to its value, reusing the value of an already
    /// visited node.
    fn build_expr(&mut self, expr: AstId) -> ValueId {
        if let Some(value) = self.graph.value_of(expr) {
            return value;
        }

        let value = match &self.ast[expr].kind {
            AstKind::Literal { .. } => {
                self.graph
                    .push_value(ValueKind::Literal, Some(expr), false, None)
            }
            AstKind::Identifier { .. } => {
                // resolution happens later; the placeholder keeps the port alive
                self.graph.push_value(ValueKind::Expr, Some(expr), true, None)
            }
            AstKind::Call { callee, arg } => {
                let (callee, arg) = (*callee, *arg);
                let callee_value = self.build_expr(callee);

                // a syntactic list argument spreads into one input per item
                let input_values = match &self.ast[arg].kind {
                    AstKind::List { items } => {
                        let items = items.clone();
                        items.into_iter().map(|item| self.build_item(item)).collect()
                    }
                    _ => vec![self.build_expr(arg)],
                };

                let output = self.graph.push_value(ValueKind::Expr, Some(expr), false, None);
                let transform = self.wrap_phi(callee_value);
                let inputs = input_values
                    .into_iter()
                    .map(|v| self.wrap_phi(v))
                    .collect();
                self.graph
                    .push_edge(EdgeKind::Call, output, Some(transform), inputs, expr);
                output
            }
            AstKind::List { items } => {
                let items = items.clone();
                let item_values: Vec<ValueId> =
                    items.into_iter().map(|item| self.build_item(item)).collect();
                let output = self.graph.push_value(ValueKind::Expr, Some(expr), false, None);
                let inputs = item_values
                    .into_iter()
                    .map(|v| self.wrap_phi(v))
                    .collect();
                self.graph
                    .push_edge(EdgeKind::ListDef, output, None, inputs, expr);
                output
            }
            AstKind::Function {
                params,
                ret,
                ann,
                body,
            } => {
                let (params, ret, ann, body) = (*params, *ret, ann.clone(), *body);
                let mut input_values = vec![self.build_expr(params)];
                if let Some(ret) = ret {
                    input_values.push(self.build_expr(ret));
                }
                for a in ann {
                    input_values.push(self.build_expr(a));
                }
                // the body is terminal here; its statements are built with
                // their own block
                let block_value = match self.graph.value_of(body) {
                    Some(value) => value,
                    None => {
                        let value =
                            self.graph.push_value(ValueKind::Block, Some(body), false, None);
                        self.graph.record_value(body, value);
                        value
                    }
                };
                input_values.push(block_value);

                let output = self.graph.push_value(ValueKind::Expr, Some(expr), false, None);
                let inputs = input_values
                    .into_iter()
                    .map(|v| self.wrap_phi(v))
                    .collect();
                self.graph
                    .push_edge(EdgeKind::FnDef, output, None, inputs, expr);
                output
            }
            kind => panic!("not an expression node: {:?}", kind),
        };

        self.graph.record_value(expr, value);
        value
    }

    /// A keyed item contributes its `kvdef` output, a plain item its value.
    fn build_item(&mut self, item: AstId) -> ValueId {
        if let Some(value) = self.graph.value_of(item) {
            return value;
        }
        let (key, value) = match &self.ast[item].kind {
            AstKind::ListItem { key, value } => (*key, *value),
            kind => panic!("not a list item node: {:?}", kind),
        };
        match key {
            None => self.build_expr(value),
            Some(key) => {
                let name = self.ast.name(key).unwrap_or_default().to_string();
                let key_value = self.symbol_value(name, key);
                let item_value = self.build_expr(value);
                let output = self.graph.push_value(ValueKind::Expr, Some(item), false, None);
                let inputs = vec![self.wrap_phi(key_value), self.wrap_phi(item_value)];
                self.graph
                    .push_edge(EdgeKind::KvDef, output, None, inputs, item);
                self.graph.record_value(item, output);
                output
            }
        }
    }

    /// Wrap a value as an edge port phi with a singleton candidate at depth 0.
    fn wrap_phi(&mut self, value: ValueId) -> Port {
        let node = self.graph.value(value);
        let ident = if node.placeholder { node.ast } else { None };
        let mut candidates = BTreeMap::new();
        candidates.insert(0, BTreeSet::from([value]));
        let phi = self.graph.push_phi(ident, None, candidates);
        if let Some(ident) = ident {
            let existing = self.graph.phi_of_ident.insert(ident, phi);
            debug_assert!(existing.is_none(), "identifier wrapped twice");
        }
        Port::Phi(phi)
    }

    /// Symbol values are cached by name so that every occurrence of a name
    /// is the same object; closure conversion depends on this identity.
    fn symbol_value(&mut self, name: String, identifier: AstId) -> ValueId {
        match self.symbol_values.get(&name) {
            Some(value) => *value,
            None => {
                let value =
                    self.graph
                        .push_value(ValueKind::Symbol, Some(identifier), false, None);
                self.symbol_values.insert(name, value);
                value
            }
        }
    }

    /// Builtin values are cached by name; they have no producing edge.
    fn builtin_value(&mut self, name: &str) -> ValueId {
        match self.builtin_values.get(name) {
            Some(value) => *value,
            None => {
                let value = self.graph.push_value(
                    ValueKind::Expr,
                    None,
                    false,
                    Some(name.to_string()),
                );
                self.builtin_values.insert(name.to_string(), value);
                value
            }
        }
    }

    /// Replace every placeholder phi whose identifier carries a
    /// [BindPhi](crate::bdg::BindPhi) with the candidate values of its
    /// definition points, and give unwrapped bound identifiers a phi of
    /// their own so the resolver sees every use.
    fn connect_identifiers(&mut self) {
        let mut index = 0;
        while index < self.graph.phis().len() {
            let ident = self.graph.phi(super::PhiId(index)).ident;
            if let Some(ident) = ident {
                if let Some(Binding::Phi(bindphi)) = self.bdg.binding(ident) {
                    let candidates = self.candidate_values(bindphi);
                    let phi = self.graph.phi_mut(super::PhiId(index));
                    phi.bindphi = Some(bindphi);
                    phi.candidates = candidates;
                }
            }
            index += 1;
        }

        // statement level identifiers are never edge ports; they still need
        // resolution for the statement value they stand for
        let mut pending = Vec::new();
        for value in self.graph.values() {
            if !value.placeholder {
                continue;
            }
            let ident = value.ast.expect("placeholder without identifier");
            if self.graph.phi_of_ident.contains_key(&ident) {
                continue;
            }
            if let Some(Binding::Phi(bindphi)) = self.bdg.binding(ident) {
                pending.push((ident, bindphi));
            }
        }
        for (ident, bindphi) in pending {
            let candidates = self.candidate_values(bindphi);
            let phi = self.graph.push_phi(Some(ident), Some(bindphi), candidates);
            self.graph.phi_of_ident.insert(ident, phi);
        }
    }

    fn candidate_values(&mut self, bindphi: crate::bdg::BindPhiId) -> BTreeMap<i32, BTreeSet<ValueId>> {
        let candidates: Vec<(i32, Vec<crate::bdg::PointId>)> = {
            let bindphi: &BindPhi = self.bdg.bindphi(bindphi);
            bindphi
                .candidates
                .iter()
                .map(|(depth, points)| (*depth, points.iter().copied().collect()))
                .collect()
        };

        let mut values: BTreeMap<i32, BTreeSet<ValueId>> = BTreeMap::new();
        for (depth, points) in candidates {
            for point_id in points {
                let (kind, name, identifier, stmt) = {
                    let point = self.bdg.point(point_id);
                    (
                        point.kind,
                        point.name.clone(),
                        point.identifier,
                        point.stmt,
                    )
                };
                let value = match kind {
                    PointKind::Point => {
                        let stmt = stmt.expect("statement point without statement");
                        let expr = match self.ast[stmt].kind {
                            AstKind::Stmt { expr, .. } => expr,
                            _ => continue,
                        };
                        match self.graph.value_of(expr) {
                            Some(value) => value,
                            None => self.build_expr(expr),
                        }
                    }
                    PointKind::Builtin => self.builtin_value(&name),
                    PointKind::Symbol => {
                        let identifier = identifier.expect("symbol point without identifier");
                        self.symbol_value(name, identifier)
                    }
                };
                values.entry(depth).or_default().insert(value);
            }
        }
        values
    }
}
