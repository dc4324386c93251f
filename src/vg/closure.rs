//! Closure conversion over the phi resolved graph.
//!
//! Values read inside a function body but defined outside of it are lifted
//! into the function definition inputs and prepended to every call of the
//! function. A captured value is the same object in the outer scope, the
//! `fndef` input list and the call site, which is what lets the call site
//! rewrite find a stable key. The pass iterates with a worklist: when a
//! function's capture set grows, calls to it inside other bodies make the
//! surrounding functions capture the same values.

use super::{EdgeId, EdgeKind, Port, ValueGraph, ValueId, ValueKind};
use crate::ast::{Ast, AstId, AstKind};
use crate::error::{CompileError, ErrorKind};
use std::collections::{BTreeSet, HashMap};

/// Lift the free values of every `fndef` into its inputs and rewrite the
/// call sites, then verify that no symbol is read inside a body without
/// being a function input.
pub fn convert_closures(ast: &Ast, graph: &mut ValueGraph) -> Result<(), CompileError> {
    let fndefs: Vec<EdgeId> = graph
        .edges()
        .iter()
        .filter(|e| e.kind == EdgeKind::FnDef)
        .map(|e| e.id)
        .collect();

    let fndef_by_output: HashMap<ValueId, EdgeId> = fndefs
        .iter()
        .map(|f| (graph.edge(*f).output, *f))
        .collect();

    let mut closure_params: HashMap<EdgeId, Vec<ValueId>> = HashMap::new();

    loop {
        let mut changed = false;

        for f in &fndefs {
            let fresh = fresh_captures(ast, graph, *f);
            if fresh.is_empty() {
                continue;
            }
            changed = true;
            let edge = graph.edge_mut(*f);
            for value in fresh.iter().rev() {
                edge.inputs.insert(0, Port::Value(*value));
            }
            let params = closure_params.entry(*f).or_default();
            for value in fresh.iter().rev() {
                params.insert(0, *value);
            }
        }

        // call site rewrite: a call to a converted function receives the
        // captured values it does not already pass
        for index in 0..graph.edges().len() {
            let edge_id = EdgeId(index);
            if graph.edge(edge_id).kind != EdgeKind::Call {
                continue;
            }
            let target = match graph.edge(edge_id).transform {
                Some(Port::Value(value)) => value,
                _ => continue,
            };
            let f = match fndef_by_output.get(&target) {
                Some(f) => *f,
                None => continue,
            };
            let params = match closure_params.get(&f) {
                Some(params) => params.clone(),
                None => continue,
            };
            let edge = graph.edge_mut(edge_id);
            let present: BTreeSet<ValueId> = edge
                .inputs
                .iter()
                .filter_map(|p| p.value())
                .collect();
            for value in params.iter().rev() {
                if !present.contains(value) {
                    edge.inputs.insert(0, Port::Value(*value));
                    changed = true;
                }
            }
        }

        if !changed {
            break;
        }
    }

    check_no_free_symbols(ast, graph, &fndefs)
}

fn body_block(graph: &ValueGraph, f: EdgeId) -> AstId {
    let body_port = graph
        .edge(f)
        .inputs
        .last()
        .expect("fndef edge without inputs");
    let body_value = body_port.expect_value();
    graph.value(body_value).ast.expect("body value without block")
}

/// The values read by the edges and statement results of a body, without
/// crossing into nested function bodies.
fn used_in_body(ast: &Ast, graph: &ValueGraph, body: AstId) -> (BTreeSet<ValueId>, BTreeSet<ValueId>) {
    let mut direct: BTreeSet<ValueId> = BTreeSet::new();

    for edge in graph.edges() {
        if !ast.is_within_same_function(edge.ast, body) {
            continue;
        }
        if let Some(Port::Value(value)) = edge.transform {
            direct.insert(value);
        }
        for input in &edge.inputs {
            if let Some(value) = input.value() {
                direct.insert(value);
            }
        }
    }

    if let AstKind::Block { stmts } = &ast[body].kind {
        for stmt in stmts {
            if let AstKind::Stmt { expr, .. } = ast[*stmt].kind {
                if let Some(value) = graph.value_of(expr) {
                    direct.insert(value);
                }
            }
        }
    }

    // transitive closure through the producing edges
    let mut transitive = direct.clone();
    let mut worklist: Vec<ValueId> = transitive.iter().copied().collect();
    while let Some(value) = worklist.pop() {
        let producer = match graph.value(value).in_edge {
            Some(edge) => edge,
            None => continue,
        };
        let edge = graph.edge(producer);
        // a function value is a closed unit; what its body needs reaches the
        // caller through the call site rewrite, not through its definition
        if edge.kind == EdgeKind::FnDef {
            continue;
        }
        let mut reach = |value: ValueId, transitive: &mut BTreeSet<ValueId>, worklist: &mut Vec<ValueId>| {
            if transitive.insert(value) {
                worklist.push(value);
            }
        };
        if let Some(Port::Value(value)) = edge.transform {
            reach(value, &mut transitive, &mut worklist);
        }
        for input in &edge.inputs {
            if let Some(value) = input.value() {
                reach(value, &mut transitive, &mut worklist);
            }
        }
    }

    (direct, transitive)
}

/// The values a function must newly capture: symbols reached by the body that
/// are not yet inputs, and directly read values defined outside the function.
fn fresh_captures(ast: &Ast, graph: &ValueGraph, f: EdgeId) -> Vec<ValueId> {
    let body = body_block(graph, f);
    let function_ast = graph.edge(f).ast;
    let (direct, transitive) = used_in_body(ast, graph, body);

    let formals: BTreeSet<ValueId> = graph
        .edge(f)
        .inputs
        .iter()
        .filter_map(|p| p.value())
        .collect();

    let mut fresh = Vec::new();
    for value in &transitive {
        let node = graph.value(*value);
        if formals.contains(value) || node.is_builtin() {
            continue;
        }
        let free = match node.kind {
            ValueKind::Symbol => true,
            _ => {
                direct.contains(value)
                    && node
                        .ast
                        .map_or(false, |a| !ast.is_within(a, function_ast))
            }
        };
        if free {
            fresh.push(*value);
        }
    }
    fresh
}

/// Post conversion invariant: every symbol read inside a body is an input of
/// the surrounding function definition.
fn check_no_free_symbols(
    ast: &Ast,
    graph: &ValueGraph,
    fndefs: &[EdgeId],
) -> Result<(), CompileError> {
    for f in fndefs {
        let body = body_block(graph, *f);
        let formals: BTreeSet<ValueId> = graph
            .edge(*f)
            .inputs
            .iter()
            .filter_map(|p| p.value())
            .collect();
        let (_, transitive) = used_in_body(ast, graph, body);
        for value in transitive {
            let node = graph.value(value);
            if node.kind == ValueKind::Symbol && !formals.contains(&value) {
                let name = node
                    .ast
                    .and_then(|a| ast.name(a))
                    .unwrap_or("<symbol>")
                    .to_string();
                let position = node
                    .ast
                    .map(|a| ast.position(a))
                    .unwrap_or_else(|| ast.position(graph.edge(*f).ast));
                return Err(CompileError::at(
                    ErrorKind::FreeSymbolInFunction,
                    position,
                    format!("free symbol `{}` in function", name),
                ));
            }
        }
    }
    Ok(())
}
