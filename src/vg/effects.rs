//! The effect analyzer: mark and order the side effecting calls of each block.
//!
//! A call is effectful when it invokes an effect builtin, a function
//! annotated `!effect`/`effect!`, a function value already known effectful
//! from a deeper block, or when one of its inputs is produced by an effectful
//! call of the same block. Blocks are analyzed bottom up; within a block the
//! effectful calls receive a contiguous `effect_index` ordering that follows
//! the statement source positions.

use super::{EdgeId, EdgeKind, Port, ValueGraph, ValueId};
use crate::ast::{Ast, AstId, AstKind};
use crate::bdg::{intr, Bdg};
use crate::error::{CompileError, ErrorKind};
use std::collections::{HashMap, HashSet};

/// Annotate every call edge with its effect flag and, when effectful, its
/// zero based index inside the owning block.
pub fn apply_effects(ast: &Ast, bdg: &Bdg, graph: &mut ValueGraph) -> Result<(), CompileError> {
    for index in 0..graph.edges().len() {
        let edge = graph.edge_mut(EdgeId(index));
        edge.is_effect = false;
        edge.effect_index = None;
        edge.effect_block = None;
    }
    if bdg.blocks().is_empty() {
        return Ok(());
    }

    let top_block = ast.root_block();

    // call edges grouped by the block that owns them syntactically
    let mut edges_by_block: HashMap<AstId, Vec<EdgeId>> = HashMap::new();
    for edge in graph.edges() {
        if edge.kind != EdgeKind::Call {
            continue;
        }
        let owner = ast.enclosing_block(edge.ast).unwrap_or(top_block);
        edges_by_block.entry(owner).or_default().push(edge.id);
    }

    // function definitions grouped by their body block
    let mut fndefs_by_block: HashMap<AstId, Vec<EdgeId>> = HashMap::new();
    for edge in graph.edges() {
        if edge.kind != EdgeKind::FnDef {
            continue;
        }
        if let Some(port) = edge.inputs.last() {
            if let Some(value) = port.value() {
                if let Some(block_ast) = graph.value(value).ast {
                    if ast.is_block(block_ast) {
                        fndefs_by_block.entry(block_ast).or_default().push(edge.id);
                    }
                }
            }
        }
    }

    // function values whose body turned out effectful, for the outer passes
    let mut effectful_functions: HashSet<ValueId> = HashSet::new();

    let mut blocks = bdg.blocks_by_depth();
    blocks.reverse();
    for block_id in blocks {
        let block_ast = bdg.block(block_id).ast;
        let call_edges: Vec<EdgeId> = edges_by_block
            .get(&block_ast)
            .cloned()
            .unwrap_or_default();
        let call_set: HashSet<EdgeId> = call_edges.iter().copied().collect();

        let mut effect_set: HashSet<EdgeId> = HashSet::new();

        // seed from the effect builtins
        for e in &call_edges {
            if let Some(value) = transform_value(graph, *e) {
                let node = graph.value(value);
                if node
                    .builtin
                    .as_deref()
                    .map_or(false, intr::is_effect_builtin)
                {
                    effect_set.insert(*e);
                }
            }
        }

        // seed from `!effect` annotations and functions already marked
        for e in &call_edges {
            if effect_set.contains(e) {
                continue;
            }
            let value = match transform_value(graph, *e) {
                Some(value) => value,
                None => continue,
            };
            let node = graph.value(value);
            if let Some(callee_ast) = node.ast {
                if ast.is_function(callee_ast) && ast.has_effect_annotation(callee_ast) {
                    effect_set.insert(*e);
                    continue;
                }
            }
            if let Some(producer) = node.in_edge {
                if graph.edge(producer).kind == EdgeKind::FnDef {
                    if ast.has_effect_annotation(graph.edge(producer).ast)
                        || effectful_functions.contains(&value)
                    {
                        effect_set.insert(*e);
                    }
                }
            }
        }

        // propagate through values produced by effectful calls of this block
        let mut changed = true;
        while changed {
            changed = false;
            for e in &call_edges {
                if effect_set.contains(e) {
                    continue;
                }
                let inputs = graph.edge(*e).inputs.clone();
                let caused = inputs.iter().filter_map(|p| p.value()).any(|value| {
                    match graph.value(value).in_edge {
                        Some(producer) => {
                            call_set.contains(&producer) && effect_set.contains(&producer)
                        }
                        None => false,
                    }
                });
                if caused {
                    effect_set.insert(*e);
                    changed = true;
                }
            }
        }

        // a function whose body has effects must say so
        if !effect_set.is_empty() {
            if let Some(fndefs) = fndefs_by_block.get(&block_ast) {
                for f in fndefs {
                    let f_ast = graph.edge(*f).ast;
                    if !ast.has_effect_annotation(f_ast) {
                        return Err(CompileError::at(
                            ErrorKind::MissingEffectAnnotation,
                            ast.position(f_ast),
                            "function whose block contains effectful operations is missing \
                             !effect annotation"
                                .to_string(),
                        ));
                    }
                    effectful_functions.insert(graph.edge(*f).output);
                }
            }
        }

        // order: statements by source position, calls inside a statement by
        // their own position, unmatched calls last by edge id
        let mut stmts: Vec<AstId> = match &ast[block_ast].kind {
            AstKind::Block { stmts } => stmts.clone(),
            _ => Vec::new(),
        };
        stmts.sort_by_key(|stmt| stmt_position_key(ast, *stmt));

        let mut matched: HashSet<EdgeId> = HashSet::new();
        let mut by_stmt: HashMap<AstId, Vec<EdgeId>> = HashMap::new();
        for e in &call_edges {
            if !effect_set.contains(e) {
                continue;
            }
            for stmt in &stmts {
                if stmt_contains_edge(ast, *stmt, graph.edge(*e).ast) {
                    by_stmt.entry(*stmt).or_default().push(*e);
                    matched.insert(*e);
                    break;
                }
            }
        }

        let mut ordered: Vec<EdgeId> = Vec::new();
        for stmt in &stmts {
            if let Some(edges) = by_stmt.get_mut(stmt) {
                edges.sort_by_key(|e| {
                    let position = ast.position(graph.edge(*e).ast);
                    (position.line, position.column)
                });
                ordered.extend(edges.iter().copied());
            }
        }
        let mut remaining: Vec<EdgeId> = call_edges
            .iter()
            .copied()
            .filter(|e| effect_set.contains(e) && !matched.contains(e))
            .collect();
        remaining.sort();
        ordered.extend(remaining);

        for (index, e) in ordered.iter().enumerate() {
            let edge = graph.edge_mut(*e);
            edge.is_effect = true;
            edge.effect_index = Some(index);
            edge.effect_block = Some(block_ast);
        }
    }

    // function definitions are never effectful
    for index in 0..graph.edges().len() {
        let edge = graph.edge_mut(EdgeId(index));
        if edge.kind == EdgeKind::FnDef {
            edge.is_effect = false;
            edge.effect_index = None;
            edge.effect_block = None;
        }
    }

    Ok(())
}

fn transform_value(graph: &ValueGraph, edge: EdgeId) -> Option<ValueId> {
    match graph.edge(edge).transform {
        Some(Port::Value(value)) => Some(value),
        _ => None,
    }
}

fn stmt_position_key(ast: &Ast, stmt: AstId) -> (usize, usize) {
    let expr = match ast[stmt].kind {
        AstKind::Stmt { expr, .. } => expr,
        _ => stmt,
    };
    let position = ast.position(expr);
    (position.line, position.column)
}

/// Does the edge sit inside the execution region of this statement? The
/// header of a function literal (params, return type, annotations) belongs
/// to the statement, its body does not.
fn stmt_contains_edge(ast: &Ast, stmt: AstId, edge_ast: AstId) -> bool {
    let expr = match ast[stmt].kind {
        AstKind::Stmt { expr, .. } => expr,
        _ => return false,
    };
    match &ast[expr].kind {
        AstKind::Function {
            params, ret, ann, ..
        } => {
            if ast.is_within_same_function(edge_ast, *params) {
                return true;
            }
            if let Some(ret) = ret {
                if ast.is_within_same_function(edge_ast, *ret) {
                    return true;
                }
            }
            ann.iter()
                .any(|a| ast.is_within_same_function(edge_ast, *a))
        }
        _ => ast.is_within_same_function(edge_ast, expr),
    }
}
