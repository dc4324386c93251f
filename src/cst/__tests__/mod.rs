use crate::cst::{CstKind, CstNode, Rule};
use crate::util::Source;
use crate::{Frontend, Token};

fn parse(code: &str) -> CstNode {
    let source = Source::from(code);
    match Frontend::new().parse(&source) {
        Ok(tree) => tree,
        Err(err) => {
            println!("Failed part:{}", &code[err.pointer..]);
            panic!("{:?}", err);
        }
    }
}

#[test]
fn statement_with_target() {
    let tree = parse("x := 1; y := x");
    assert!(tree.is_rule(Rule::Program));
    let stmts: Vec<&CstNode> = tree.rule_children().collect();
    assert_eq!(stmts.len(), 2);
    assert!(stmts[0].children[0].is_token(Token::Identifier));
    assert!(stmts[0].children[1].is_token(Token::OpBind));
    assert!(stmts[0].children[2].is_rule(Rule::Expression));
}

#[test]
fn juxtaposed_call_wraps_paren_argument() {
    let tree = parse("f(2)");
    let call = tree.find_tree(&|n| n.is_rule(Rule::Call)).unwrap();
    assert!(call.children[1].is_rule(Rule::ParenExpression));
}

#[test]
fn call_with_list_argument() {
    let tree = parse("+(a, 1)");
    let call = tree.find_tree(&|n| n.is_rule(Rule::Call)).unwrap();
    assert!(call.children[0].is_rule(Rule::AtomExpression));
    assert!(call.children[1].is_rule(Rule::List));
    let items: Vec<&CstNode> = call.children[1].rule_children().collect();
    assert_eq!(items.len(), 2);
}

#[test]
fn bracket_call() {
    let tree = parse("[f, 2]");
    let call = tree.find_tree(&|n| n.is_rule(Rule::BracketCall)).unwrap();
    assert_eq!(call.rule_children().count(), 2);
}

#[test]
fn call_chain() {
    let tree = parse("f(1)(2)");
    let outer = tree.find_tree(&|n| n.is_rule(Rule::Call)).unwrap();
    assert!(outer.children[0].is_rule(Rule::Call));
}

#[test]
fn function_literal() {
    let tree = parse("f := (a: i32): i32 => !pure { +(a, 1) }");
    let function = tree.find_tree(&|n| n.is_rule(Rule::Function)).unwrap();
    assert!(function.children[0].is_rule(Rule::Params));
    assert!(function.children[0].children[0].is_rule(Rule::List));
    assert!(function.contains(Rule::Annotation));
    assert!(function.contains(Rule::Block));
    // the return type sits between the params and the arrow
    assert!(function.children[1].is_token(Token::Colon));
    assert!(function.children[2].is_rule(Rule::AtomExpression));
}

#[test]
fn lone_identifier_params() {
    let tree = parse("id := x => !pure { x }");
    let function = tree.find_tree(&|n| n.is_rule(Rule::Function)).unwrap();
    assert!(function.children[0].children[0].is_token(Token::Identifier));
}

#[test]
fn group_disambiguation() {
    let paren = parse("(x)");
    assert!(paren.contains(Rule::ParenExpression));
    assert!(!paren.contains(Rule::List));

    let trailing = parse("(x,)");
    assert!(trailing.contains(Rule::List));

    let keyed = parse("(a: 1)");
    assert!(keyed.contains(Rule::List));

    let empty = parse("()");
    assert!(empty.contains(Rule::List));
}

#[test]
fn empty_statements_are_tolerated() {
    let tree = parse(";; x := 1 ;");
    assert_eq!(tree.rule_children().count(), 1);
}

#[test]
fn syntax_error_reports_the_offending_token() {
    let source = Source::from("x := ;");
    let err = Frontend::new().parse(&source).unwrap_err();
    assert_eq!(err.pointer, 5);
    assert!(err.message.contains("Semicolon"));
}

#[test]
fn unclosed_block_fails() {
    let source = Source::from("f := () => { x := 1");
    assert!(Frontend::new().parse(&source).is_err());
}

#[test]
fn tree_dump_shape() {
    let code = "x := 1";
    let source = Source::from(code);
    let tree = parse(code);
    tree.print().unwrap();

    let dump: serde_json::Value = serde_json::from_str(&tree.to_json(&source)).unwrap();
    assert_eq!(dump["node-type"], "rule");
    assert_eq!(dump["rule"], "program");
    assert_eq!(dump["start"]["line"], 1);

    let stmt = &dump["children"][0];
    assert_eq!(stmt["rule"], "stmt");
    let target = &stmt["children"][0];
    assert_eq!(target["node-type"], "token");
    assert_eq!(target["text"], "x");
    assert_eq!(target["token-type"], "Identifier");
    assert_eq!(target["channel"], 0);
    assert_eq!(target["column"], 1);
}

#[test]
fn token_leaves_keep_kind() {
    let tree = parse("x := 1");
    let leak = tree.find_tree(&|n| matches!(n.kind, CstKind::Token(Token::OpBind)));
    assert!(leak.is_some());
}
