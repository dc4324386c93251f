use crate::ast::{lower, Ast, AstId};
use crate::bdg::{build_bdg, intr, Bdg, Binding, PointKind};
use crate::error::ErrorKind;
use crate::util::Source;
use crate::Frontend;

fn analyzed(code: &str) -> (Ast, Bdg) {
    let source = Source::from(code);
    let cst = Frontend::new().parse(&source).unwrap();
    let ast = lower(&source, &cst).unwrap();
    let bdg = build_bdg(&ast).unwrap();
    (ast, bdg)
}

fn identifiers(ast: &Ast) -> Vec<AstId> {
    ast.ids().filter(|id| ast.is_identifier(*id)).collect()
}

#[test]
fn use_resolves_to_the_defining_statement() {
    let (ast, bdg) = analyzed("x := 1; y := x");

    let use_of_x = identifiers(&ast)
        .into_iter()
        .find(|id| {
            ast.name(*id) == Some("x") && matches!(bdg.binding(*id), Some(Binding::Phi(_)))
        })
        .expect("a bindphi for the use of x");
    let phi = match bdg.binding(use_of_x) {
        Some(Binding::Phi(phi)) => bdg.bindphi(phi),
        _ => unreachable!(),
    };

    assert_eq!(phi.name, "x");
    assert_eq!(phi.candidates.len(), 1);
    let candidates = &phi.candidates[&0];
    assert_eq!(candidates.len(), 1);
    let point = bdg.point(*candidates.iter().next().unwrap());
    assert_eq!(point.kind, PointKind::Point);
    assert_eq!(point.define_depth, 0);
    assert!(point.stmt.is_some());
    assert!(point.block.is_some());
}

#[test]
fn every_identifier_has_exactly_one_binding() {
    let (ast, bdg) = analyzed("x := 1; f := (a: i32) => !pure { y := +(a, x); y }; f(2)");
    for id in identifiers(&ast) {
        // annotation names stay opaque, everything else is bound once
        if ast.name(id) == Some("!pure") {
            assert!(bdg.binding(id).is_none());
            continue;
        }
        assert!(
            bdg.binding(id).is_some(),
            "identifier `{}` has no binding",
            ast.name(id).unwrap_or_default()
        );
    }
}

#[test]
fn builtins_live_at_depth_minus_one() {
    let (ast, bdg) = analyzed("p := print!");
    let use_of_print = identifiers(&ast)
        .into_iter()
        .find(|id| ast.name(*id) == Some("print!"))
        .unwrap();
    let phi = match bdg.binding(use_of_print) {
        Some(Binding::Phi(phi)) => bdg.bindphi(phi),
        other => panic!("print! should be a use, got {:?}", other),
    };
    let candidates = &phi.candidates[&-1];
    let point = bdg.point(*candidates.iter().next().unwrap());
    assert_eq!(point.kind, PointKind::Builtin);
    assert_eq!(point.define_depth, -1);
    assert!(point.block.is_none());
    assert!(point.stmt.is_none());

    assert!(intr::is_intrinsic("print!"));
    assert!(intr::is_effect_builtin("print!"));
    assert!(!intr::is_effect_builtin("+"));
}

#[test]
fn list_keys_become_global_symbols() {
    let (ast, bdg) = analyzed("l := (a: 1); f := () => !pure { a }");
    let key = identifiers(&ast)
        .into_iter()
        .find(|id| {
            ast.name(*id) == Some("a") && matches!(bdg.binding(*id), Some(Binding::Point(_)))
        })
        .unwrap();
    let point = match bdg.binding(key) {
        Some(Binding::Point(point)) => bdg.point(point),
        _ => unreachable!(),
    };
    assert_eq!(point.kind, PointKind::Symbol);
    assert_eq!(point.define_depth, -2);
    assert!(point.block.is_none());
    assert!(point.stmt.is_none());
    assert!(point.identifier.is_some());

    // the use inside the nested function sees the key at depth −2
    let use_of_a = identifiers(&ast)
        .into_iter()
        .find(|id| {
            ast.name(*id) == Some("a") && matches!(bdg.binding(*id), Some(Binding::Phi(_)))
        })
        .unwrap();
    let phi = match bdg.binding(use_of_a) {
        Some(Binding::Phi(phi)) => bdg.bindphi(phi),
        _ => unreachable!(),
    };
    assert!(phi.candidates.contains_key(&-2));
}

#[test]
fn block_tree_depths() {
    let (_ast, bdg) = analyzed("x := 1; f := () => !pure { g := () => !pure { x }; g(()) }");
    let depths: Vec<i32> = bdg.blocks_by_depth().iter().map(|b| bdg.block(*b).depth).collect();
    assert_eq!(depths, vec![0, 1, 2]);

    let root = bdg.blocks_by_depth()[0];
    assert!(bdg.block(root).parent.is_none());
    for child in &bdg.block(root).children {
        assert_eq!(bdg.block(*child).parent, Some(root));
    }
}

#[test]
fn inner_definitions_shadow_outer_ones() {
    let (ast, bdg) = analyzed("x := 1; h := () => !pure { x := 2; y := x }");
    let use_of_x = identifiers(&ast)
        .into_iter()
        .filter(|id| ast.name(*id) == Some("x"))
        .find(|id| matches!(bdg.binding(*id), Some(Binding::Phi(_))))
        .unwrap();
    let phi = match bdg.binding(use_of_x) {
        Some(Binding::Phi(phi)) => bdg.bindphi(phi),
        _ => unreachable!(),
    };
    let depths: Vec<i32> = phi.candidates.keys().copied().collect();
    assert_eq!(depths, vec![0, 1]);
    // innermost-wins picks depth 1, verified by the resolver tests
}

#[test]
fn duplicate_target_in_one_block_is_rejected() {
    let source = Source::from("x := 1; x := 2");
    let cst = Frontend::new().parse(&source).unwrap();
    let ast = lower(&source, &cst).unwrap();
    let err = build_bdg(&ast).unwrap_err();
    assert_eq!(err.kind, ErrorKind::AmbiguousReference);
    assert_eq!(err.position.unwrap().column, 9);
}

#[test]
fn unknown_name_keeps_an_empty_bindphi() {
    let (ast, bdg) = analyzed("y := zzz");
    let use_of_z = identifiers(&ast)
        .into_iter()
        .find(|id| ast.name(*id) == Some("zzz"))
        .unwrap();
    let phi = match bdg.binding(use_of_z) {
        Some(Binding::Phi(phi)) => bdg.bindphi(phi),
        _ => unreachable!(),
    };
    assert!(phi.candidates.is_empty());
}
