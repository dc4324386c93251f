use crate::ast::lower::parse_string_literal;
use crate::ast::{lower, Ast, AstId, AstKind, LiteralKind};
use crate::cst::{CstNode, Rule};
use crate::error::ErrorKind;
use crate::util::{Position, Source};
use crate::{Frontend, Token};

fn lowered(code: &str) -> Ast {
    let source = Source::from(code);
    let cst = Frontend::new().parse(&source).unwrap();
    lower(&source, &cst).unwrap()
}

fn find<TF: Fn(&Ast, AstId) -> bool>(ast: &Ast, p: TF) -> Option<AstId> {
    ast.ids().find(|id| p(ast, *id))
}

#[test]
fn program_owns_a_root_block() {
    let ast = lowered("x := 1");
    let root = ast.root();
    assert!(matches!(ast[root].kind, AstKind::Program { .. }));
    let block = ast.root_block();
    match &ast[block].kind {
        AstKind::Block { stmts } => assert_eq!(stmts.len(), 1),
        kind => panic!("unexpected root block {:?}", kind),
    }
}

#[test]
fn every_node_is_parented() {
    let ast = lowered("f := (a: i32): i32 => !pure { +(a, [g, \"s\"]) }; f(2)");
    for id in ast.ids() {
        if id == ast.root() {
            assert!(ast.parent(id).is_none());
            continue;
        }
        let parent = ast.parent(id).expect("non root node has a parent");
        assert!(
            ast.children(parent).contains(&id),
            "{:?} is not a child of its parent",
            ast[id].kind
        );
    }
}

#[test]
fn paren_call_argument_becomes_one_item_list() {
    let ast = lowered("f(2)");
    let call = find(&ast, |a, id| matches!(a[id].kind, AstKind::Call { .. })).unwrap();
    let arg = match ast[call].kind {
        AstKind::Call { arg, .. } => arg,
        _ => unreachable!(),
    };
    match &ast[arg].kind {
        AstKind::List { items } => {
            assert_eq!(items.len(), 1);
            match ast[items[0]].kind {
                AstKind::ListItem { key, .. } => assert!(key.is_none()),
                _ => panic!("list without item"),
            }
        }
        kind => panic!("argument was not wrapped: {:?}", kind),
    }
}

#[test]
fn bracket_call_argument_stays_verbatim() {
    let ast = lowered("[f, x]");
    let call = find(&ast, |a, id| matches!(a[id].kind, AstKind::Call { .. })).unwrap();
    let arg = match ast[call].kind {
        AstKind::Call { arg, .. } => arg,
        _ => unreachable!(),
    };
    assert!(matches!(ast[arg].kind, AstKind::Identifier { .. }));
}

#[test]
fn string_literal_expands_to_byte_items() {
    let ast = lowered("s := \"ab\"");
    let list = find(&ast, |a, id| matches!(a[id].kind, AstKind::List { .. })).unwrap();
    let items = match &ast[list].kind {
        AstKind::List { items } => items.clone(),
        _ => unreachable!(),
    };
    let raws: Vec<&str> = items
        .iter()
        .map(|item| match &ast[*item].kind {
            AstKind::ListItem { value, .. } => match &ast[*value].kind {
                AstKind::Literal { raw, literal } => {
                    assert_eq!(*literal, LiteralKind::Integer);
                    raw.as_str()
                }
                kind => panic!("item value is not an integer literal: {:?}", kind),
            },
            _ => panic!("list child is not an item"),
        })
        .collect();
    assert_eq!(raws, vec!["97", "98"]);
}

#[test]
fn string_round_trips_through_the_byte_items() {
    let inputs: Vec<(&str, &[u8])> = vec![
        (r#""ab""#, b"ab"),
        (r#""a\nb""#, b"a\nb"),
        (r#""\x41B""#, b"AB"),
        (r#"'q"w'"#, b"q\"w"),
        ("`no \\n escape`", b"no \\n escape"),
        (r#""ÿ""#, "ÿ".as_bytes()),
    ];
    for (literal, expected) in inputs {
        let decoded = parse_string_literal(literal, Position::new(1, 1)).unwrap();
        assert_eq!(decoded, expected, "decoding {}", literal);

        let code = format!("s := {}", literal);
        let ast = lowered(&code);
        let list = find(&ast, |a, id| matches!(a[id].kind, AstKind::List { .. })).unwrap();
        let items = match &ast[list].kind {
            AstKind::List { items } => items.clone(),
            _ => unreachable!(),
        };
        let bytes: Vec<u8> = items
            .iter()
            .map(|item| match &ast[*item].kind {
                AstKind::ListItem { value, .. } => match &ast[*value].kind {
                    AstKind::Literal { raw, .. } => raw.parse::<u8>().unwrap(),
                    _ => panic!("not a literal"),
                },
                _ => panic!("not an item"),
            })
            .collect();
        assert_eq!(bytes, expected, "round trip of {}", literal);
    }
}

#[test]
fn invalid_escape_is_an_invalid_literal() {
    for literal in [r#""\q""#, r#""\x4""#, r#""\uD800""#] {
        let err = parse_string_literal(literal, Position::new(2, 7)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidLiteral, "{}", literal);
        assert_eq!(err.position, Some(Position::new(2, 7)));
    }
}

#[test]
fn function_lowering_keeps_the_header() {
    let ast = lowered("f := (a: i32): i32 => !pure { +(a, 1) }");
    let function = find(&ast, |a, id| matches!(a[id].kind, AstKind::Function { .. })).unwrap();
    match &ast[function].kind {
        AstKind::Function {
            params, ret, ann, ..
        } => {
            assert!(matches!(ast[*params].kind, AstKind::List { .. }));
            assert!(ret.is_some());
            assert_eq!(ann.len(), 1);
            assert_eq!(ast.name(ann[0]), Some("!pure"));
        }
        _ => unreachable!(),
    }
    assert!(ast.has_effect_annotation(function) == false);

    let ast = lowered("g := () => !effect { g }");
    let function = find(&ast, |a, id| matches!(a[id].kind, AstKind::Function { .. })).unwrap();
    assert!(ast.has_effect_annotation(function));
}

#[test]
fn structural_token_leak_is_rejected() {
    let source = Source::from(",");
    let cst = CstNode::rule(
        Rule::Program,
        vec![CstNode::rule(
            Rule::Stmt,
            vec![CstNode::rule(
                Rule::Expression,
                vec![CstNode::leaf(Token::Comma, 0, 1)],
            )],
        )],
    );
    let err = lower(&source, &cst).unwrap_err();
    assert_eq!(err.kind, ErrorKind::CstShape);
    assert!(err.message.contains("structural token leaked"));
}

#[test]
fn ancestor_queries_stop_at_function_boundaries() {
    let ast = lowered("f := () => !pure { k }; k := 1");
    let body = find(&ast, |a, id| {
        a.is_block(id) && id != a.root_block()
    })
    .unwrap();
    let inner_use = find(&ast, |a, id| a.name(id) == Some("k") && a.is_within(id, body)).unwrap();

    assert!(ast.is_within(inner_use, ast.root_block()));
    assert!(!ast.is_within_same_function(inner_use, ast.root_block()));
    assert!(ast.is_within_same_function(inner_use, body));
}
