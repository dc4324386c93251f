//! Syntax directed translation from the parse tree to the [Ast] arena.

use super::{Ast, AstId, AstKind, LiteralKind};
use crate::cst::{CstKind, CstNode, Rule};
use crate::error::{CompileError, ErrorKind};
use crate::util::{Position, Source};
use crate::Token;

/// Lower a `program` parse tree into an [Ast].
pub fn lower(code: &Source, cst: &CstNode) -> Result<Ast, CompileError> {
    let mut lowerer = Lowerer {
        code,
        ast: Ast::new(),
    };

    let block = lowerer.lower_block(cst)?;
    let program = lowerer.node(AstKind::Program { block }, cst);
    lowerer.ast.adopt(program, block);
    lowerer.ast.set_root(program);
    Ok(lowerer.ast)
}

struct Lowerer<'l> {
    code: &'l Source<'l>,
    ast: Ast,
}

impl<'l> Lowerer<'l> {
    fn position(&self, cst: &CstNode) -> Position {
        self.code.obtain_position(cst.start)
    }

    fn node(&mut self, kind: AstKind, cst: &CstNode) -> AstId {
        self.ast.push(kind, cst.start, cst.end, self.position(cst))
    }

    fn shape_error(&self, cst: &CstNode, message: String) -> CompileError {
        CompileError::at(ErrorKind::CstShape, self.position(cst), message)
    }

    /// A `program` or `block` rule node: lower the statement children.
    fn lower_block(&mut self, cst: &CstNode) -> Result<AstId, CompileError> {
        let mut stmts = Vec::new();
        for child in cst.rule_children() {
            if child.is_rule(Rule::Stmt) {
                stmts.push(self.lower_stmt(child)?);
            }
        }
        let block = self.node(AstKind::Block { stmts: stmts.clone() }, cst);
        for stmt in stmts {
            self.ast.adopt(block, stmt);
        }
        Ok(block)
    }

    fn lower_stmt(&mut self, cst: &CstNode) -> Result<AstId, CompileError> {
        let mut target = None;
        let expr_cst = match cst.children.first() {
            Some(first) if first.is_token(Token::Identifier) => {
                let name = self.code.text(first.start, first.end).to_string();
                target = Some(self.node(AstKind::Identifier { name }, first));
                cst.children.get(2).ok_or_else(|| {
                    self.shape_error(cst, "stmt rule lost its expression".to_string())
                })?
            }
            Some(first) => first,
            None => return Err(self.shape_error(cst, "empty stmt rule".to_string())),
        };

        let expr = self.lower_expr(expr_cst)?;
        let stmt = self.node(AstKind::Stmt { target, expr }, cst);
        if let Some(target) = target {
            self.ast.adopt(stmt, target);
        }
        self.ast.adopt(stmt, expr);
        Ok(stmt)
    }

    fn lower_expr(&mut self, cst: &CstNode) -> Result<AstId, CompileError> {
        match cst.kind {
            // glue rules unwrap their single child
            CstKind::Rule(Rule::Expression) | CstKind::Rule(Rule::AtomExpression) => {
                match cst.children.as_slice() {
                    [child] => self.lower_expr(child),
                    _ => Err(self.shape_error(cst, "glue rule is not single child".to_string())),
                }
            }
            // parenthesized subexpressions drop the outer parens
            CstKind::Rule(Rule::ParenExpression) => match cst.children.as_slice() {
                [_, inner, _] => self.lower_expr(inner),
                _ => Err(self.shape_error(cst, "malformed paren expression".to_string())),
            },
            CstKind::Token(token) => self.lower_token(cst, token),
            CstKind::Rule(Rule::Call) => self.lower_call(cst),
            CstKind::Rule(Rule::BracketCall) => self.lower_bracket_call(cst),
            CstKind::Rule(Rule::List) => self.lower_list(cst),
            CstKind::Rule(Rule::Function) => self.lower_function(cst),
            CstKind::Rule(rule) => Err(self.shape_error(
                cst,
                format!("unexpected {} rule in expression position", rule.name()),
            )),
        }
    }

    fn lower_token(&mut self, cst: &CstNode, token: Token) -> Result<AstId, CompileError> {
        let text = self.code.text(cst.start, cst.end);
        match token {
            Token::Identifier | Token::Operator => {
                let name = text.to_string();
                Ok(self.node(AstKind::Identifier { name }, cst))
            }
            Token::Integer => Ok(self.literal(cst, text, LiteralKind::Integer)),
            Token::Float => Ok(self.literal(cst, text, LiteralKind::Float)),
            Token::True | Token::False => Ok(self.literal(cst, text, LiteralKind::Boolean)),
            Token::Null => Ok(self.literal(cst, text, LiteralKind::Null)),
            Token::String | Token::RawString => self.expand_string(cst, text),
            _ => Err(self.shape_error(
                cst,
                format!("structural token leaked: {:?} `{}`", token, text),
            )),
        }
    }

    fn literal(&mut self, cst: &CstNode, raw: &str, literal: LiteralKind) -> AstId {
        self.node(
            AstKind::Literal {
                raw: raw.to_string(),
                literal,
            },
            cst,
        )
    }

    /// A string literal becomes a list of integer literal items, one per
    /// UTF-8 byte of the decoded string.
    fn expand_string(&mut self, cst: &CstNode, text: &str) -> Result<AstId, CompileError> {
        let bytes = parse_string_literal(text, self.position(cst))?;

        let mut items = Vec::with_capacity(bytes.len());
        for byte in bytes {
            let value = self.literal(cst, &byte.to_string(), LiteralKind::Integer);
            let item = self.node(AstKind::ListItem { key: None, value }, cst);
            self.ast.adopt(item, value);
            items.push(item);
        }
        let list = self.node(AstKind::List { items: items.clone() }, cst);
        for item in items {
            self.ast.adopt(list, item);
        }
        Ok(list)
    }

    fn lower_call(&mut self, cst: &CstNode) -> Result<AstId, CompileError> {
        let (callee_cst, arg_cst) = match cst.children.as_slice() {
            [callee, arg] => (callee, arg),
            _ => return Err(self.shape_error(cst, "malformed call rule".to_string())),
        };
        let callee = self.lower_expr(callee_cst)?;

        // a parenthesized argument is wrapped as a one item unindexed list,
        // a syntactic list is preserved verbatim
        let arg = match arg_cst.kind {
            CstKind::Rule(Rule::ParenExpression) => {
                let inner_cst = arg_cst.children.get(1).ok_or_else(|| {
                    self.shape_error(arg_cst, "malformed paren expression".to_string())
                })?;
                let value = self.lower_expr(inner_cst)?;
                let item = self.node(AstKind::ListItem { key: None, value }, arg_cst);
                self.ast.adopt(item, value);
                let list = self.node(AstKind::List { items: vec![item] }, arg_cst);
                self.ast.adopt(list, item);
                list
            }
            CstKind::Rule(Rule::List) => self.lower_list(arg_cst)?,
            _ => return Err(self.shape_error(arg_cst, "malformed call argument".to_string())),
        };

        let call = self.node(AstKind::Call { callee, arg }, cst);
        self.ast.adopt(call, callee);
        self.ast.adopt(call, arg);
        Ok(call)
    }

    /// `[f, x]` — explicit argument passing: the argument is kept verbatim.
    fn lower_bracket_call(&mut self, cst: &CstNode) -> Result<AstId, CompileError> {
        let (callee_cst, arg_cst) = match cst.children.as_slice() {
            [_, callee, _, arg, _] => (callee, arg),
            _ => return Err(self.shape_error(cst, "malformed bracket call".to_string())),
        };
        let callee = self.lower_expr(callee_cst)?;
        let arg = self.lower_expr(arg_cst)?;
        let call = self.node(AstKind::Call { callee, arg }, cst);
        self.ast.adopt(call, callee);
        self.ast.adopt(call, arg);
        Ok(call)
    }

    fn lower_list(&mut self, cst: &CstNode) -> Result<AstId, CompileError> {
        let mut items = Vec::new();
        for item_cst in cst.rule_children() {
            if !item_cst.is_rule(Rule::ListItem) {
                return Err(self.shape_error(item_cst, "unexpected rule in list".to_string()));
            }
            let (key, value_cst) = match item_cst.children.as_slice() {
                [key_cst, _, value] if key_cst.is_token(Token::Identifier) => {
                    let name = self.code.text(key_cst.start, key_cst.end).to_string();
                    (Some(self.node(AstKind::Identifier { name }, key_cst)), value)
                }
                [value] => (None, value),
                _ => return Err(self.shape_error(item_cst, "malformed list item".to_string())),
            };
            let value = self.lower_expr(value_cst)?;
            let item = self.node(AstKind::ListItem { key, value }, item_cst);
            if let Some(key) = key {
                self.ast.adopt(item, key);
            }
            self.ast.adopt(item, value);
            items.push(item);
        }
        let list = self.node(AstKind::List { items: items.clone() }, cst);
        for item in items {
            self.ast.adopt(list, item);
        }
        Ok(list)
    }

    fn lower_function(&mut self, cst: &CstNode) -> Result<AstId, CompileError> {
        let params_cst = match cst.children.first() {
            Some(params) if params.is_rule(Rule::Params) => params,
            _ => return Err(self.shape_error(cst, "function rule lost its params".to_string())),
        };
        let params = match params_cst.children.as_slice() {
            [single] => self.lower_expr(single)?,
            _ => return Err(self.shape_error(params_cst, "malformed params".to_string())),
        };

        let mut ret = None;
        if let (Some(colon), Some(ret_cst)) = (cst.children.get(1), cst.children.get(2)) {
            if colon.is_token(Token::Colon) {
                ret = Some(self.lower_expr(ret_cst)?);
            }
        }

        let mut ann = Vec::new();
        let mut body = None;
        for child in &cst.children {
            if child.is_rule(Rule::Annotation) {
                let atom = child.children.first().ok_or_else(|| {
                    self.shape_error(child, "empty annotation".to_string())
                })?;
                ann.push(self.lower_expr(atom)?);
            } else if child.is_rule(Rule::Block) {
                body = Some(self.lower_block(child)?);
            }
        }
        let body =
            body.ok_or_else(|| self.shape_error(cst, "function rule lost its body".to_string()))?;

        let function = self.node(
            AstKind::Function {
                params,
                ret,
                ann: ann.clone(),
                body,
            },
            cst,
        );
        self.ast.adopt(function, params);
        if let Some(ret) = ret {
            self.ast.adopt(function, ret);
        }
        for a in ann {
            self.ast.adopt(function, a);
        }
        self.ast.adopt(function, body);
        Ok(function)
    }
}

/// Decode a complete string literal, quotes included, to its UTF-8 bytes.
///
/// Back-ticked strings are raw; single and double quoted strings process the
/// Python style escapes `\n \t \r \0 \a \b \f \v \\ \' \" \xHH \uHHHH \UHHHHHHHH`.
pub fn parse_string_literal(text: &str, position: Position) -> Result<Vec<u8>, CompileError> {
    let invalid =
        |message: String| CompileError::at(ErrorKind::InvalidLiteral, position, message);

    let mut chars = text.chars();
    let quote = match chars.next() {
        Some(q) => q,
        None => return Err(invalid("empty string literal".to_string())),
    };

    if quote == '`' {
        if text.len() < 2 || !text.ends_with('`') {
            return Err(invalid("unterminated backtick string".to_string()));
        }
        return Ok(text[1..text.len() - 1].as_bytes().to_vec());
    }

    if quote != '"' && quote != '\'' {
        return Err(invalid(format!("unknown string delimiter: {}", quote)));
    }
    if text.len() < 2 || !text.ends_with(quote) {
        return Err(invalid("unterminated string literal".to_string()));
    }

    let inner = &text[1..text.len() - 1];
    let mut decoded = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            decoded.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => decoded.push('\n'),
            Some('t') => decoded.push('\t'),
            Some('r') => decoded.push('\r'),
            Some('0') => decoded.push('\0'),
            Some('a') => decoded.push('\x07'),
            Some('b') => decoded.push('\x08'),
            Some('f') => decoded.push('\x0c'),
            Some('v') => decoded.push('\x0b'),
            Some('\\') => decoded.push('\\'),
            Some('\'') => decoded.push('\''),
            Some('"') => decoded.push('"'),
            Some('x') => decoded.push(hex_escape(&mut chars, 2, position)?),
            Some('u') => decoded.push(hex_escape(&mut chars, 4, position)?),
            Some('U') => decoded.push(hex_escape(&mut chars, 8, position)?),
            Some(other) => {
                return Err(invalid(format!("invalid escape sequence `\\{}`", other)))
            }
            None => return Err(invalid("trailing backslash in string literal".to_string())),
        }
    }

    Ok(decoded.into_bytes())
}

fn hex_escape(
    chars: &mut std::str::Chars,
    digits: usize,
    position: Position,
) -> Result<char, CompileError> {
    let mut value: u32 = 0;
    for _ in 0..digits {
        let digit = chars
            .next()
            .and_then(|c| c.to_digit(16))
            .ok_or_else(|| {
                CompileError::at(
                    ErrorKind::InvalidLiteral,
                    position,
                    format!("expected {} hex digits in escape sequence", digits),
                )
            })?;
        value = value * 16 + digit;
    }
    char::from_u32(value).ok_or_else(|| {
        CompileError::at(
            ErrorKind::InvalidLiteral,
            position,
            format!("\\u{:04x} is not a valid character", value),
        )
    })
}
