use crate::rewrite::rewrite_bind_tokens;
use crate::token::yafl_tokenizer;
use crate::util::Source;
use crate::Token;

fn rewritten_texts(code: &str) -> Vec<(Token, String)> {
    let source = Source::from(code);
    let lexed = yafl_tokenizer().tokenize(&source).unwrap();
    rewrite_bind_tokens(&source, lexed)
        .into_iter()
        .filter(|lex| lex.token.is_structural())
        .map(|lex| (lex.token, code[lex.start..lex.end].to_string()))
        .collect()
}

#[test]
fn block_level_bind_passes_through() {
    let tokens = rewritten_texts("x := 1");
    assert_eq!(
        tokens,
        vec![
            (Token::Identifier, "x".to_string()),
            (Token::OpBind, ":=".to_string()),
            (Token::Integer, "1".to_string()),
            (Token::EOF, "".to_string()),
        ]
    );
}

#[test]
fn paren_context_splits() {
    let tokens = rewritten_texts("(a := 1)");
    assert_eq!(
        tokens,
        vec![
            (Token::OpenParen, "(".to_string()),
            (Token::Identifier, "a".to_string()),
            (Token::Colon, ":".to_string()),
            (Token::Identifier, "=".to_string()),
            (Token::Integer, "1".to_string()),
            (Token::CloseParen, ")".to_string()),
            (Token::EOF, "".to_string()),
        ]
    );
}

#[test]
fn bracket_context_splits() {
    let tokens = rewritten_texts("[a := 1, b]");
    assert_eq!(tokens[2], (Token::Colon, ":".to_string()));
    assert_eq!(tokens[3], (Token::Identifier, "=".to_string()));
}

#[test]
fn adjacent_tokens_merge_greedily() {
    let tokens = rewritten_texts("(a :=1x2=)");
    assert_eq!(tokens[2], (Token::Colon, ":".to_string()));
    // `=`, the integer, the identifier and the literal `=` merge into one name
    assert_eq!(tokens[3], (Token::Identifier, "=1x2=".to_string()));
    assert_eq!(tokens[4], (Token::CloseParen, ")".to_string()));
}

#[test]
fn whitespace_terminates_the_merge() {
    let tokens = rewritten_texts("(a := 1)");
    assert_eq!(tokens[3], (Token::Identifier, "=".to_string()));
    assert_eq!(tokens[4], (Token::Integer, "1".to_string()));
}

#[test]
fn non_mergeable_token_terminates_the_merge() {
    let tokens = rewritten_texts("(a :=1+2)");
    assert_eq!(tokens[3], (Token::Identifier, "=1".to_string()));
    assert_eq!(tokens[4], (Token::Operator, "+".to_string()));
}

#[test]
fn close_paren_before_bind_splits() {
    let tokens = rewritten_texts("(x) := 2");
    assert_eq!(tokens[3], (Token::Colon, ":".to_string()));
    assert_eq!(tokens[4], (Token::Identifier, "=".to_string()));
}

#[test]
fn brace_inside_parens_restores_block_mode() {
    let tokens = rewritten_texts("((x) => { y := 1 })");
    assert!(tokens.contains(&(Token::OpBind, ":=".to_string())));
}

#[test]
fn nested_parens_keep_splitting() {
    let tokens = rewritten_texts("{ x := ((a := 1)) }");
    // the outer bind is at block level, the inner one inside two parens
    assert_eq!(tokens[2], (Token::OpBind, ":=".to_string()));
    assert!(tokens.contains(&(Token::Colon, ":".to_string())));
    assert!(tokens.contains(&(Token::Identifier, "=".to_string())));
}

#[test]
fn unbalanced_closers_never_underflow() {
    // stray closers pop down to the base block mode and stay there
    let tokens = rewritten_texts(") ) x := 1");
    assert!(tokens.contains(&(Token::OpBind, ":=".to_string())));
}
