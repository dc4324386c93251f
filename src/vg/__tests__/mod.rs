
use crate::ast::{lower, Ast, AstKind};
use crate::bdg::build_bdg;
use crate::error::ErrorKind;
use crate::util::Source;
use crate::vg::{
    build_value_graph, resolve_phis, Edge, EdgeKind, ValueGraph, ValueKind,
};
use crate::Frontend;

/// Build and resolve the graph without closure conversion or effects.
pub(super) fn resolved(code: &str) -> (Ast, ValueGraph) {
    let source = Source::from(code);
    let cst = Frontend::new().parse(&source).unwrap();
    let ast = lower(&source, &cst).unwrap();
    let bdg = build_bdg(&ast).unwrap();
    let mut graph = build_value_graph(&ast, &bdg);
    resolve_phis(&ast, &mut graph).unwrap();
    (ast, graph)
}

pub(super) fn check_graph_invariants(graph: &ValueGraph) {
    assert!(graph.phis().is_empty(), "phis survived resolution");

    let mut outputs = std::collections::HashMap::new();
    for edge in graph.edges() {
        assert_eq!(graph.value(edge.output).kind, ValueKind::Expr);
        if let Some(previous) = outputs.insert(edge.output, edge.id) {
            panic!("{:?} produced by two edges {:?} {:?}", edge.output, previous, edge.id);
        }
        assert_eq!(graph.value(edge.output).in_edge, Some(edge.id));
        match edge.kind {
            EdgeKind::Call => assert!(edge.transform.is_some()),
            _ => assert!(edge.transform.is_none()),
        }
        assert!(edge.transform.iter().all(|p| p.value().is_some()));
        assert!(edge.inputs.iter().all(|p| p.value().is_some()));
    }

    for value in graph.values() {
        assert!(!value.placeholder, "placeholder survived resolution");
        match value.kind {
            ValueKind::Expr => {}
            _ => assert!(value.in_edge.is_none()),
        }
        if value.in_edge.is_none() && value.kind == ValueKind::Expr {
            // builtins and opaque identifier values are the only unproduced
            // expression values
            assert!(value.is_builtin() || value.ast.is_some());
        }
    }
}

fn edges_of_kind<'g>(graph: &'g ValueGraph, kind: EdgeKind) -> Vec<&'g Edge> {
    graph.edges().iter().filter(|e| e.kind == kind).collect()
}

#[test]
fn function_definition_and_call_shape() {
    let (ast, graph) = resolved("f := (a: i32) => !pure { +(a, 1) }; f(2)");
    check_graph_invariants(&graph);

    let fndefs = edges_of_kind(&graph, EdgeKind::FnDef);
    assert_eq!(fndefs.len(), 1);
    let fndef = fndefs[0];
    // params list first, body block last
    let first = graph.value(fndef.inputs.first().unwrap().expect_value());
    assert_eq!(
        graph.edge(first.in_edge.unwrap()).kind,
        EdgeKind::ListDef
    );
    let last = graph.value(fndef.inputs.last().unwrap().expect_value());
    assert_eq!(last.kind, ValueKind::Block);

    // the outer call applies the function value to the literal argument
    let outer_call = edges_of_kind(&graph, EdgeKind::Call)
        .into_iter()
        .find(|e| {
            graph
                .value(e.transform.unwrap().expect_value())
                .ast
                .map_or(false, |a| ast.is_function(a))
        })
        .expect("call of f");
    assert_eq!(outer_call.transform.unwrap().expect_value(), fndef.output);
    assert_eq!(outer_call.inputs.len(), 1);
    let argument = graph.value(outer_call.inputs[0].expect_value());
    assert_eq!(argument.kind, ValueKind::Literal);
}

#[test]
fn keyed_params_build_kvdef_edges() {
    let (_ast, graph) = resolved("f := (a: i32) => !pure { a }");
    check_graph_invariants(&graph);

    let kvdefs = edges_of_kind(&graph, EdgeKind::KvDef);
    assert_eq!(kvdefs.len(), 1);
    let key = graph.value(kvdefs[0].inputs[0].expect_value());
    assert_eq!(key.kind, ValueKind::Symbol);
    let value = graph.value(kvdefs[0].inputs[1].expect_value());
    assert!(value.is_builtin());
    assert_eq!(value.builtin.as_deref(), Some("i32"));
}

#[test]
fn statement_reference_shares_the_value() {
    let (ast, graph) = resolved("x := 1; y := x");
    check_graph_invariants(&graph);

    let stmts = match &ast[ast.root_block()].kind {
        AstKind::Block { stmts } => stmts.clone(),
        _ => unreachable!(),
    };
    let first_expr = match ast[stmts[0]].kind {
        AstKind::Stmt { expr, .. } => expr,
        _ => unreachable!(),
    };
    let second_expr = match ast[stmts[1]].kind {
        AstKind::Stmt { expr, .. } => expr,
        _ => unreachable!(),
    };
    // the use of x resolves to the very value of the defining statement
    assert_eq!(graph.value_of(first_expr), graph.value_of(second_expr));
}

#[test]
fn block_definitions_shadow_builtins() {
    let (ast, graph) = resolved("i32 := 3; t := i32");
    check_graph_invariants(&graph);

    let use_expr = ast
        .ids()
        .filter(|id| ast.name(*id) == Some("i32"))
        .last()
        .unwrap();
    let value = graph.value(graph.value_of(use_expr).unwrap());
    assert!(!value.is_builtin());
    assert_eq!(value.kind, ValueKind::Literal);
}

#[test]
fn annotations_materialize_as_identifier_values() {
    let (ast, graph) = resolved("f := () => !pure { f }");
    check_graph_invariants(&graph);

    let fndef = edges_of_kind(&graph, EdgeKind::FnDef)[0];
    // inputs are params, the annotation, the body
    assert_eq!(fndef.inputs.len(), 3);
    let annotation = graph.value(fndef.inputs[1].expect_value());
    assert_eq!(annotation.kind, ValueKind::Expr);
    assert!(annotation.in_edge.is_none());
    assert_eq!(ast.name(annotation.ast.unwrap()), Some("!pure"));
}

#[test]
fn unresolved_reference_fails() {
    let source = Source::from("y := zzz");
    let cst = Frontend::new().parse(&source).unwrap();
    let ast = lower(&source, &cst).unwrap();
    let bdg = build_bdg(&ast).unwrap();
    let mut graph = build_value_graph(&ast, &bdg);
    let err = resolve_phis(&ast, &mut graph).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnresolvedReference);
    assert_eq!(err.position.unwrap().column, 6);
    assert!(err.message.contains("zzz"));
}

#[test]
fn self_reference_is_unresolved() {
    let source = Source::from("a := a");
    let cst = Frontend::new().parse(&source).unwrap();
    let ast = lower(&source, &cst).unwrap();
    let bdg = build_bdg(&ast).unwrap();
    let mut graph = build_value_graph(&ast, &bdg);
    let err = resolve_phis(&ast, &mut graph).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnresolvedReference);
}

#[test]
fn bracket_call_keeps_a_single_input() {
    let (_ast, graph) = resolved("x := 2; y := [typeof!, x]");
    check_graph_invariants(&graph);

    let calls = edges_of_kind(&graph, EdgeKind::Call);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].inputs.len(), 1);
    let callee = graph.value(calls[0].transform.unwrap().expect_value());
    assert_eq!(callee.builtin.as_deref(), Some("typeof!"));
}

#[test]
fn list_literal_builds_listdef() {
    let (_ast, graph) = resolved("l := (a: 1, 2)");
    check_graph_invariants(&graph);

    let listdefs = edges_of_kind(&graph, EdgeKind::ListDef);
    assert_eq!(listdefs.len(), 1);
    assert_eq!(listdefs[0].inputs.len(), 2);
    let keyed = graph.value(listdefs[0].inputs[0].expect_value());
    assert_eq!(graph.edge(keyed.in_edge.unwrap()).kind, EdgeKind::KvDef);
}
