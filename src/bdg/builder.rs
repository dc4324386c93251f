//! The phased construction of the [Bdg].

use super::{Bdg, Binding, BlockId, PointKind};
use crate::ast::{Ast, AstId, AstKind};
use crate::bdg::intr::INTRINSIC;
use crate::error::{CompileError, ErrorKind};

/// Build the binding/dependency graph of a lowered program.
pub fn build_bdg(ast: &Ast) -> Result<Bdg, CompileError> {
    let mut builder = BdgBuilder {
        ast,
        bdg: Bdg::new(),
    };

    builder.scan_symbols();
    builder.visit_block(ast.root_block(), None)?;
    builder.inject_builtins();
    builder.resolve_identifiers();

    Ok(builder.bdg)
}

struct BdgBuilder<'b> {
    ast: &'b Ast,
    bdg: Bdg,
}

impl<'b> BdgBuilder<'b> {
    /// Phase 0 — every indexed list item key becomes a `symbol` point,
    /// visible everywhere at depth −2.
    fn scan_symbols(&mut self) {
        for id in self.ast.ids() {
            if let AstKind::ListItem { key: Some(key), .. } = &self.ast[id].kind {
                let name = self.ast.name(*key).unwrap_or_default().to_string();
                let point =
                    self.bdg
                        .push_point(name, PointKind::Symbol, None, Some(*key), None, -2);
                self.bdg.bind(*key, Binding::Point(point));
            }
        }
    }

    /// Phase 1 — the block tree and one `point` per statement target.
    fn visit_block(
        &mut self,
        block_ast: AstId,
        parent: Option<BlockId>,
    ) -> Result<(), CompileError> {
        let block = self.bdg.push_block(parent, block_ast);

        let stmts = match &self.ast[block_ast].kind {
            AstKind::Block { stmts } => stmts.clone(),
            _ => return Ok(()),
        };

        // statement targets bind simultaneously, before any right hand side
        for stmt in &stmts {
            if let AstKind::Stmt {
                target: Some(target),
                ..
            } = self.ast[*stmt].kind
            {
                let name = self.ast.name(target).unwrap_or_default().to_string();
                let duplicate = self
                    .bdg
                    .block(block)
                    .points
                    .iter()
                    .any(|p| self.bdg.point(*p).name == name);
                if duplicate {
                    return Err(CompileError::at(
                        ErrorKind::AmbiguousReference,
                        self.ast.position(target),
                        format!("duplicate definition of `{}` in one block", name),
                    ));
                }
                let depth = self.bdg.block(block).depth;
                let point = self.bdg.push_point(
                    name,
                    PointKind::Point,
                    Some(block),
                    Some(target),
                    Some(*stmt),
                    depth,
                );
                self.bdg.bind(target, Binding::Point(point));
            }
        }

        for stmt in &stmts {
            if let AstKind::Stmt { expr, .. } = self.ast[*stmt].kind {
                self.visit_expr_blocks(expr, block)?;
            }
        }
        Ok(())
    }

    fn visit_expr_blocks(&mut self, expr: AstId, block: BlockId) -> Result<(), CompileError> {
        match &self.ast[expr].kind {
            AstKind::Call { callee, arg } => {
                self.visit_expr_blocks(*callee, block)?;
                self.visit_expr_blocks(*arg, block)?;
            }
            AstKind::List { items } => {
                for item in items.clone() {
                    if let AstKind::ListItem { value, .. } = self.ast[item].kind {
                        self.visit_expr_blocks(value, block)?;
                    }
                }
            }
            AstKind::Function {
                params, ret, body, ..
            } => {
                // params and the return type live in the enclosing block,
                // the body opens a new one
                let (params, ret, body) = (*params, *ret, *body);
                self.visit_expr_blocks(params, block)?;
                self.visit_block(body, Some(block))?;
                if let Some(ret) = ret {
                    self.visit_expr_blocks(ret, block)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Phase 2 — builtin points at depth −1.
    fn inject_builtins(&mut self) {
        for name in INTRINSIC {
            self.bdg
                .push_point(name.to_string(), PointKind::Builtin, None, None, None, -1);
        }
    }

    /// Phase 3 — a [BindPhi](super::BindPhi) per identifier use. Blocks are
    /// processed in depth ascending order so that expressions referring to
    /// nested block targets see them resolved.
    fn resolve_identifiers(&mut self) {
        for block in self.bdg.blocks_by_depth() {
            let stmts = match &self.ast[self.bdg.block(block).ast].kind {
                AstKind::Block { stmts } => stmts.clone(),
                _ => continue,
            };
            for stmt in stmts {
                if let AstKind::Stmt { expr, .. } = self.ast[stmt].kind {
                    self.resolve_expr(expr, block);
                }
            }
        }
    }

    fn resolve_expr(&mut self, expr: AstId, block: BlockId) {
        match &self.ast[expr].kind {
            AstKind::Identifier { name } => {
                if self.bdg.binding(expr).is_some() {
                    return;
                }
                let name = name.clone();
                let phi = self.bdg.push_bindphi(name.clone(), expr);

                for point in self.bdg.symbol_points(&name).to_vec() {
                    self.bdg.bindphi_mut(phi).add(point, -2);
                }

                let mut current = Some(block);
                while let Some(id) = current {
                    let info = self.bdg.block(id);
                    let depth = info.depth;
                    let matches: Vec<_> = info
                        .points
                        .iter()
                        .copied()
                        .filter(|p| self.bdg.point(*p).name == name)
                        .collect();
                    current = info.parent;
                    for point in matches {
                        self.bdg.bindphi_mut(phi).add(point, depth);
                    }
                }

                for point in self.bdg.builtin_points(&name).to_vec() {
                    self.bdg.bindphi_mut(phi).add(point, -1);
                }

                self.bdg.bind(expr, Binding::Phi(phi));
            }
            AstKind::Call { callee, arg } => {
                let (callee, arg) = (*callee, *arg);
                self.resolve_expr(callee, block);
                self.resolve_expr(arg, block);
            }
            AstKind::List { items } => {
                for item in items.clone() {
                    if let AstKind::ListItem { value, .. } = self.ast[item].kind {
                        self.resolve_expr(value, block);
                    }
                }
            }
            AstKind::Function { params, ret, .. } => {
                // annotations are opaque names, the body is resolved with its
                // own block
                let (params, ret) = (*params, *ret);
                self.resolve_expr(params, block);
                if let Some(ret) = ret {
                    self.resolve_expr(ret, block);
                }
            }
            _ => {}
        }
    }
}
