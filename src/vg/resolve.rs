//! The phi resolver: collapse every phi to its innermost scope candidate.

use super::{EdgeId, PhiId, Port, ValueGraph, ValueId};
use crate::ast::Ast;
use crate::error::{CompileError, ErrorKind};

/// Resolve every phi with the innermost-wins rule, rewrite the edge ports to
/// plain values and drop the phi store together with the transient
/// placeholder values. The graph becomes a DAG of values and typed edges.
///
/// A phi without candidates is an unresolved reference; a phi whose deepest
/// candidate set holds more than one value is an ambiguous reference. Both
/// abort the compilation with the location of the offending identifier.
pub fn resolve_phis(ast: &Ast, graph: &mut ValueGraph) -> Result<(), CompileError> {
    let phi_count = graph.phis().len();
    let mut resolver = Resolver {
        ast,
        graph,
        winners: vec![None; phi_count],
        states: vec![State::Unvisited; phi_count],
    };

    for index in 0..resolver.graph.phis().len() {
        resolver.winner_of(PhiId(index))?;
    }

    // rewrite every port to its winning value
    for index in 0..resolver.graph.edges().len() {
        let edge_id = EdgeId(index);
        let transform = resolver.graph.edge(edge_id).transform;
        if let Some(Port::Phi(phi)) = transform {
            let winner = resolver.winners[phi.0].expect("resolved phi");
            resolver.graph.edge_mut(edge_id).transform = Some(Port::Value(winner));
        }
        let inputs = resolver.graph.edge(edge_id).inputs.clone();
        let rewritten: Vec<Port> = inputs
            .into_iter()
            .map(|port| match port {
                Port::Phi(phi) => Port::Value(resolver.winners[phi.0].expect("resolved phi")),
                value => value,
            })
            .collect();
        resolver.graph.edge_mut(edge_id).inputs = rewritten;
    }

    // statement values of identifier expressions follow their winners
    let identifier_values: Vec<(crate::ast::AstId, PhiId)> = resolver
        .graph
        .phi_of_ident
        .iter()
        .map(|(ast_id, phi)| (*ast_id, *phi))
        .collect();
    for (ast_id, phi) in identifier_values {
        let winner = resolver.winners[phi.0].expect("resolved phi");
        resolver.graph.record_value(ast_id, winner);
    }

    resolver.graph.take_phis();
    resolver.graph.compact();
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Unvisited,
    InProgress,
    Done,
}

struct Resolver<'r> {
    ast: &'r Ast,
    graph: &'r mut ValueGraph,
    winners: Vec<Option<ValueId>>,
    states: Vec<State>,
}

impl<'r> Resolver<'r> {
    fn error(&self, kind: ErrorKind, phi: PhiId, message: String) -> CompileError {
        let position = self
            .graph
            .phi(phi)
            .ident
            .map(|ident| self.ast.position(ident));
        CompileError::new(kind, position, message)
    }

    fn name_of(&self, phi: PhiId) -> String {
        self.graph
            .phi(phi)
            .ident
            .and_then(|ident| self.ast.name(ident))
            .unwrap_or("<value>")
            .to_string()
    }

    fn winner_of(&mut self, phi: PhiId) -> Result<ValueId, CompileError> {
        if let Some(winner) = self.winners[phi.0] {
            return Ok(winner);
        }
        if self.states[phi.0] == State::InProgress {
            return Err(self.error(
                ErrorKind::UnresolvedReference,
                phi,
                format!("circular reference through `{}`", self.name_of(phi)),
            ));
        }
        self.states[phi.0] = State::InProgress;

        let (set_len, candidate) = {
            let node = self.graph.phi(phi);
            match node.candidates.iter().next_back() {
                Some((_, set)) => (
                    set.len(),
                    set.iter().next().copied().expect("non empty candidate set"),
                ),
                None => {
                    return Err(self.error(
                        ErrorKind::UnresolvedReference,
                        phi,
                        format!("unresolved reference `{}`", self.name_of(phi)),
                    ))
                }
            }
        };
        if set_len > 1 {
            return Err(self.error(
                ErrorKind::AmbiguousReference,
                phi,
                format!(
                    "ambiguous reference `{}`: {} candidates in the innermost scope",
                    self.name_of(phi),
                    set_len
                ),
            ));
        }

        // an identifier candidate resolves through its own phi; an opaque
        // name without a bindphi is materialized into a permanent identifier
        // value
        let winner = if self.graph.value(candidate).placeholder {
            let ident = self.graph.value(candidate).ast.expect("identifier value");
            match self.graph.phi_of_ident.get(&ident).copied() {
                Some(next) if next != phi => self.winner_of(next)?,
                _ if self.graph.phi(phi).bindphi.is_some() => {
                    return Err(self.error(
                        ErrorKind::UnresolvedReference,
                        phi,
                        format!("circular reference through `{}`", self.name_of(phi)),
                    ));
                }
                _ => {
                    self.graph.value_mut(candidate).placeholder = false;
                    candidate
                }
            }
        } else {
            candidate
        };

        self.states[phi.0] = State::Done;
        self.winners[phi.0] = Some(winner);
        Ok(winner)
    }
}
