use crate::ast::{AstKind, LiteralKind};
use crate::bdg::{Binding, PointKind};
use crate::error::ErrorKind;
use crate::vg::{EdgeKind, ValueKind};
use crate::Frontend;

#[test]
fn forward_references_resolve() {
    let unit = Frontend::new().compile(b"y := x; x := 1").unwrap();
    let phi = &unit.bdg.bindphis()[0];
    assert_eq!(phi.name, "x");
    assert_eq!(phi.candidates[&0].len(), 1);
}

#[test]
fn binding_and_resolution_end_to_end() {
    let unit = Frontend::new().compile(b"x := 1; y := x").unwrap();

    // every identifier carries exactly one of point and bindphi
    for id in unit.ast.ids() {
        if unit.ast.is_identifier(id) {
            assert!(unit.bdg.binding(id).is_some());
        }
    }

    let uses: Vec<_> = unit
        .ast
        .ids()
        .filter(|id| matches!(unit.bdg.binding(*id), Some(Binding::Phi(_))))
        .collect();
    assert_eq!(uses.len(), 1);
}

#[test]
fn function_graph_end_to_end() {
    let unit = Frontend::new()
        .compile(b"f := (a: i32) => !pure { +(a, 1) }; f(2)")
        .unwrap();

    let fndef = unit
        .graph
        .edges()
        .iter()
        .find(|e| e.kind == EdgeKind::FnDef)
        .unwrap();
    // captured symbol first, body block last
    let last = unit.graph.value(fndef.inputs.last().unwrap().expect_value());
    assert_eq!(last.kind, ValueKind::Block);

    for edge in unit.graph.edges() {
        assert!(!edge.is_effect);
    }
}

#[test]
fn effect_pipeline_end_to_end() {
    let unit = Frontend::new()
        .compile(b"g := () => !effect { print!(\"hi\") }; g(())")
        .unwrap();
    let effects: Vec<_> = unit.graph.edges().iter().filter(|e| e.is_effect).collect();
    assert_eq!(effects.len(), 2);
    assert!(effects.iter().all(|e| e.kind == EdgeKind::Call));
    assert!(effects.iter().all(|e| e.effect_index == Some(0)));

    let err = Frontend::new()
        .compile(b"g := () => { print!(\"hi\") }; g(())")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::MissingEffectAnnotation);
    assert!(err.to_string().contains("MissingEffectAnnotation"));
}

#[test]
fn closure_pipeline_end_to_end() {
    let unit = Frontend::new()
        .compile(b"k := 3; h := () => !pure { k }; h(())")
        .unwrap();

    let fndef = unit
        .graph
        .edges()
        .iter()
        .find(|e| e.kind == EdgeKind::FnDef)
        .unwrap();
    let captured = unit.graph.value(fndef.inputs[0].expect_value());
    assert_eq!(captured.kind, ValueKind::Literal);

    let call = unit
        .graph
        .edges()
        .iter()
        .find(|e| {
            e.kind == EdgeKind::Call
                && e.transform.map(|p| p.expect_value()) == Some(fndef.output)
        })
        .unwrap();
    assert_eq!(call.inputs[0].expect_value(), captured.id);
}

#[test]
fn string_statement_end_to_end() {
    let unit = Frontend::new().compile(b"s := \"ab\"").unwrap();

    let stmts = match &unit.ast[unit.ast.root_block()].kind {
        AstKind::Block { stmts } => stmts.clone(),
        _ => unreachable!(),
    };
    let expr = match unit.ast[stmts[0]].kind {
        AstKind::Stmt { expr, .. } => expr,
        _ => unreachable!(),
    };
    let items = match &unit.ast[expr].kind {
        AstKind::List { items } => items.clone(),
        kind => panic!("string did not lower to a list: {:?}", kind),
    };
    let raws: Vec<String> = items
        .iter()
        .map(|item| match &unit.ast[*item].kind {
            AstKind::ListItem { value, .. } => match &unit.ast[*value].kind {
                AstKind::Literal { raw, literal } => {
                    assert_eq!(*literal, LiteralKind::Integer);
                    raw.clone()
                }
                _ => panic!("not an integer item"),
            },
            _ => panic!("not a list item"),
        })
        .collect();
    assert_eq!(raws, vec!["97".to_string(), "98".to_string()]);

    // the listdef edge carries one input per byte
    let listdef = unit
        .graph
        .edges()
        .iter()
        .find(|e| e.kind == EdgeKind::ListDef)
        .unwrap();
    assert_eq!(listdef.inputs.len(), 2);
}

#[test]
fn duplicate_definition_guard_end_to_end() {
    let err = Frontend::new().compile(b"x := 1; x := 2").unwrap_err();
    assert_eq!(err.kind, ErrorKind::AmbiguousReference);
}

#[test]
fn error_kinds_carry_positions() {
    let cases: Vec<(&[u8], ErrorKind)> = vec![
        (b"x := @", ErrorKind::Syntax),
        (b"x := ;", ErrorKind::Syntax),
        (b"s := \"\\q\"", ErrorKind::InvalidLiteral),
        (b"y := zzz", ErrorKind::UnresolvedReference),
        (b"g := () => { print!(\"x\") }; g(())", ErrorKind::MissingEffectAnnotation),
    ];
    for (code, kind) in cases {
        let err = Frontend::new().compile(code).unwrap_err();
        assert_eq!(err.kind, kind, "{}", String::from_utf8_lossy(code));
        assert!(err.position.is_some(), "{}", String::from_utf8_lossy(code));
    }
}

#[test]
fn point_invariants_hold() {
    let unit = Frontend::new()
        .compile(b"x := 1; l := (a: x); f := () => !pure { +(x, 1) }; f(())")
        .unwrap();
    for point in unit.bdg.points() {
        match point.kind {
            PointKind::Point => {
                assert!(point.block.is_some());
                assert!(point.identifier.is_some());
                assert!(point.stmt.is_some());
                assert!(point.define_depth >= 0);
            }
            PointKind::Builtin => {
                assert!(point.block.is_none());
                assert!(point.stmt.is_none());
                assert_eq!(point.define_depth, -1);
            }
            PointKind::Symbol => {
                assert!(point.block.is_none());
                assert!(point.stmt.is_none());
                assert!(point.identifier.is_some());
                assert_eq!(point.define_depth, -2);
            }
        }
    }
}

#[test]
fn compilation_exposes_every_stage() {
    let unit = Frontend::new().compile(b"x := 1; y := x").unwrap();
    assert!(unit.cst.is_rule(crate::cst::Rule::Program));
    assert!(unit.ast.len() > 0);
    assert!(!unit.bdg.blocks().is_empty());
    assert!(unit.graph.phis().is_empty());
    println!("{}", unit.graph.dump());
    println!("{}", unit.ast.dump());
}
