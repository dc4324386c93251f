//! The YAFL grammar as a hand written recursive descent over the structural
//! token stream. Function literals are recognized speculatively: a parameter
//! prefix commits only when the `=>` token is reached, otherwise the parser
//! rewinds and re-reads the tokens as a call expression.

use super::{CstNode, Rule};
use crate::error::ParseError;
use crate::util::Source;
use crate::{FltrPtr, Lex, Token, TokenStream};

/// Parse a structural token stream into the `program` parse tree.
pub fn parse(code: &Source, stream: &TokenStream) -> Result<CstNode, ParseError> {
    let mut parser = Parser {
        code,
        stream,
        index: 0,
    };
    parser.program()
}

struct Parser<'p, 'lex> {
    code: &'p Source<'p>,
    stream: &'p TokenStream<'lex>,
    index: usize,
}

impl<'p, 'lex> Parser<'p, 'lex> {
    fn lex_at(&self, index: usize) -> Lex {
        let last = self.stream.length() - 1;
        self.stream[FltrPtr(index.min(last))]
    }

    fn peek(&self) -> Lex {
        self.lex_at(self.index)
    }

    fn peek_next(&self) -> Lex {
        self.lex_at(self.index + 1)
    }

    fn bump(&mut self) -> CstNode {
        let lex = self.peek();
        self.index += 1;
        CstNode::leaf(lex.token, lex.start, lex.end)
    }

    fn unexpected(&self) -> ParseError {
        let lex = self.peek();
        ParseError::new(
            lex.start,
            format!(
                "Unexpected {:?} token `{}` at {}",
                lex.token,
                self.code.text(lex.start, lex.end),
                self.code.obtain_position(lex.start)
            ),
        )
    }

    fn expect(&mut self, token: Token) -> Result<CstNode, ParseError> {
        if self.peek().token == token {
            Ok(self.bump())
        } else {
            Err(self.unexpected())
        }
    }

    fn program(&mut self) -> Result<CstNode, ParseError> {
        let mut children = Vec::new();
        self.stmt_list(&mut children, Token::EOF)?;
        children.push(self.expect(Token::EOF)?);
        Ok(CstNode::rule(Rule::Program, children))
    }

    fn block(&mut self) -> Result<CstNode, ParseError> {
        let mut children = vec![self.expect(Token::OpenBrace)?];
        self.stmt_list(&mut children, Token::CloseBrace)?;
        children.push(self.expect(Token::CloseBrace)?);
        Ok(CstNode::rule(Rule::Block, children))
    }

    fn stmt_list(
        &mut self,
        children: &mut Vec<CstNode>,
        terminator: Token,
    ) -> Result<(), ParseError> {
        loop {
            while self.peek().token == Token::Semicolon {
                children.push(self.bump());
            }
            if self.peek().token == terminator {
                break Ok(());
            }
            children.push(self.stmt()?);
            if self.peek().token != Token::Semicolon {
                // the terminator is verified by the caller
                break Ok(());
            }
        }
    }

    fn stmt(&mut self) -> Result<CstNode, ParseError> {
        if self.peek().token == Token::Identifier && self.peek_next().token == Token::OpBind {
            let target = self.bump();
            let op = self.bump();
            let expr = self.expression()?;
            Ok(CstNode::rule(Rule::Stmt, vec![target, op, expr]))
        } else {
            let expr = self.expression()?;
            Ok(CstNode::rule(Rule::Stmt, vec![expr]))
        }
    }

    fn expression(&mut self) -> Result<CstNode, ParseError> {
        if let Some(function) = self.try_function()? {
            return Ok(CstNode::rule(Rule::Expression, vec![function]));
        }
        let expr = self.call_expression()?;
        Ok(CstNode::rule(Rule::Expression, vec![expr]))
    }

    /// Speculative function literal: `params (':' atom)? '=>' annotation* block`.
    fn try_function(&mut self) -> Result<Option<CstNode>, ParseError> {
        let saved = self.index;

        let params = match self.peek().token {
            Token::Identifier => CstNode::rule(Rule::Params, vec![self.bump()]),
            Token::OpenParen => match self.group() {
                Ok(group) => CstNode::rule(Rule::Params, vec![group]),
                Err(_) => {
                    self.index = saved;
                    return Ok(None);
                }
            },
            _ => return Ok(None),
        };

        let mut children = vec![params];
        if self.peek().token == Token::Colon {
            let colon = self.bump();
            match self.atom_expression() {
                Ok(ret) => {
                    children.push(colon);
                    children.push(ret);
                }
                Err(_) => {
                    self.index = saved;
                    return Ok(None);
                }
            }
        }

        if self.peek().token != Token::Arrow {
            self.index = saved;
            return Ok(None);
        }
        children.push(self.bump());

        while self.peek().token != Token::OpenBrace && self.peek().token != Token::EOF {
            let atom = self.atom_expression()?;
            children.push(CstNode::rule(Rule::Annotation, vec![atom]));
        }
        children.push(self.block()?);

        Ok(Some(CstNode::rule(Rule::Function, children)))
    }

    fn call_expression(&mut self) -> Result<CstNode, ParseError> {
        let mut node = self.atom_expression()?;
        while self.peek().token == Token::OpenParen {
            let arg = self.group()?;
            node = CstNode::rule(Rule::Call, vec![node, arg]);
        }
        Ok(node)
    }

    fn atom_expression(&mut self) -> Result<CstNode, ParseError> {
        let lex = self.peek();
        let child = match lex.token {
            token if token.is_literal() => self.bump(),
            Token::Identifier | Token::Operator => self.bump(),
            Token::OpenParen => self.group()?,
            Token::OpenBracket => self.bracket_call()?,
            _ => return Err(self.unexpected()),
        };
        Ok(CstNode::rule(Rule::AtomExpression, vec![child]))
    }

    /// `'[' expression ',' expression ']'` — a call with explicit argument passing.
    fn bracket_call(&mut self) -> Result<CstNode, ParseError> {
        let open = self.expect(Token::OpenBracket)?;
        let target = self.expression()?;
        let comma = self.expect(Token::Comma)?;
        let arg = self.expression()?;
        let close = self.expect(Token::CloseBracket)?;
        Ok(CstNode::rule(
            Rule::BracketCall,
            vec![open, target, comma, arg, close],
        ))
    }

    /// A parenthesized group: a `paren_expression` when it holds exactly one
    /// un-keyed item without a trailing comma, a `list` otherwise.
    fn group(&mut self) -> Result<CstNode, ParseError> {
        let mut children = vec![self.expect(Token::OpenParen)?];
        let mut item_count = 0;
        let mut keyed = false;
        let mut trailing_comma = false;

        if self.peek().token != Token::CloseParen {
            loop {
                let item = self.list_item()?;
                keyed |= item.children.len() > 1;
                item_count += 1;
                children.push(item);

                if self.peek().token != Token::Comma {
                    break;
                }
                children.push(self.bump());
                if self.peek().token == Token::CloseParen {
                    trailing_comma = true;
                    break;
                }
            }
        }
        children.push(self.expect(Token::CloseParen)?);

        if item_count == 1 && !keyed && !trailing_comma {
            let item = children.remove(1);
            let expr = item
                .children
                .into_iter()
                .next()
                .expect("list item holds its expression");
            children.insert(1, expr);
            Ok(CstNode::rule(Rule::ParenExpression, children))
        } else {
            Ok(CstNode::rule(Rule::List, children))
        }
    }

    fn list_item(&mut self) -> Result<CstNode, ParseError> {
        if self.peek().token == Token::Identifier && self.peek_next().token == Token::Colon {
            let key = self.bump();
            let colon = self.bump();
            let value = self.expression()?;
            Ok(CstNode::rule(Rule::ListItem, vec![key, colon, value]))
        } else {
            let value = self.expression()?;
            Ok(CstNode::rule(Rule::ListItem, vec![value]))
        }
    }
}
