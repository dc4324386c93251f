//! The frontend pipeline driver.

#[cfg(test)]
mod __tests__;

use crate::ast::{lower, Ast};
use crate::bdg::{build_bdg, Bdg};
use crate::cst::{self, CstNode};
use crate::error::{CompileError, ErrorKind, ParseError};
use crate::rewrite::rewrite_bind_tokens;
use crate::token::yafl_tokenizer;
use crate::util::Source;
use crate::vg::{apply_effects, build_value_graph, convert_closures, resolve_phis, ValueGraph};
use crate::{Lex, TokenStream, Tokenizer};

/// The complete frontend output of one compilation unit: the parse tree, the
/// annotated [Ast], the scope resolution indexes and the resolved, closure
/// converted, effect annotated [ValueGraph].
#[derive(Debug)]
pub struct Compilation {
    pub cst: CstNode,
    pub ast: Ast,
    pub bdg: Bdg,
    pub graph: ValueGraph,
}

/// The YAFL compiler frontend.
///
/// # Example
/// ```
/// use yafl_frontend::Frontend;
///
/// let frontend = Frontend::new();
/// let unit = frontend
///     .compile(b"g := () => !effect { print!(\"hi\") }; g()")
///     .unwrap();
///
/// let effects: Vec<_> = unit
///     .graph
///     .edges()
///     .iter()
///     .filter(|e| e.is_effect)
///     .collect();
/// assert_eq!(effects.len(), 2);
/// ```
pub struct Frontend {
    tokenizer: Tokenizer,
}

impl Frontend {
    pub fn new() -> Self {
        Self {
            tokenizer: yafl_tokenizer(),
        }
    }

    /// Tokenize and rewrite the bind tokens of the source.
    pub fn tokenize(&self, code: &Source) -> Result<Vec<Lex>, ParseError> {
        let lexed = self.tokenizer.tokenize(code)?;
        Ok(rewrite_bind_tokens(code, lexed))
    }

    /// Produce the parse tree of the source.
    pub fn parse(&self, code: &Source) -> Result<CstNode, ParseError> {
        let rewritten = self.tokenize(code)?;
        let stream = TokenStream::from(&rewritten);
        cst::parse(code, &stream)
    }

    /// Run the whole pipeline over one compilation unit.
    pub fn compile(&self, text: &[u8]) -> Result<Compilation, CompileError> {
        let code = Source::new(text);

        let cst = self.parse(&code).map_err(|err| {
            CompileError::at(
                ErrorKind::Syntax,
                code.obtain_position(err.pointer),
                err.message,
            )
        })?;

        let ast = lower(&code, &cst)?;
        let bdg = build_bdg(&ast)?;

        let mut graph = build_value_graph(&ast, &bdg);
        resolve_phis(&ast, &mut graph)?;
        convert_closures(&ast, &mut graph)?;
        apply_effects(&ast, &bdg, &mut graph)?;

        Ok(Compilation {
            cst,
            ast,
            bdg,
            graph,
        })
    }
}

impl Default for Frontend {
    fn default() -> Self {
        Self::new()
    }
}
