//! The recursive visiting machinery behind [`Session::traverse`].

use std::collections::{HashSet, VecDeque};

use tracing::{trace, warn};

use crate::ast::{Child, Field, NodeId};
use crate::error::{Result, TraverseError};
use crate::path::{Key, PathId};
use crate::session::Session;

use super::VisitorTable;

/// Pending work for one `visit_single` / `visit_multiple` call. Requeued
/// paths land in the frame that last visited them.
#[derive(Debug)]
pub(crate) struct Frame {
    pub(crate) id: u64,
    pub(crate) queue: VecDeque<PathId>,
}

#[derive(Clone, Copy)]
enum Phase {
    Enter,
    Exit,
}

/// State of one traversal: the visitor table, the current nesting depth
/// and how many visits were made. Every `visit*` method returns `true`
/// when the traversal has been stopped.
pub(crate) struct TraversalContext<'t, 'v> {
    table: &'t mut VisitorTable<'v>,
    depth: usize,
    pub(crate) visited: usize,
}

impl<'t, 'v> TraversalContext<'t, 'v> {
    pub(crate) fn new(table: &'t mut VisitorTable<'v>) -> Self {
        Self { table, depth: 0, visited: 0 }
    }

    fn with_frame(
        &mut self,
        session: &mut Session,
        body: impl FnOnce(&mut Self, &mut Session) -> Result<bool>,
    ) -> Result<bool> {
        let id = session.next_frame_id;
        session.next_frame_id += 1;
        session.frames.push(Frame { id, queue: VecDeque::new() });
        let result = body(self, session);
        session.frames.retain(|frame| frame.id != id);
        result
    }

    pub(crate) fn visit_single(&mut self, session: &mut Session, path: PathId) -> Result<bool> {
        if session.node(path).is_none() {
            return Ok(false);
        }
        self.with_frame(session, |ctx, session| Ok(ctx.visit(session, path, false)? || ctx.drain(session)?))
    }

    /// Walk a list field. The length is re-read on every step and the
    /// cursor follows the visited path's key, so insertions after the
    /// cursor are visited and insertions before it are not.
    pub(crate) fn visit_multiple(&mut self, session: &mut Session, parent: PathId, field: Field) -> Result<bool> {
        let Some(parent_node) = session.node(parent) else {
            return Ok(false);
        };
        self.with_frame(session, |ctx, session| {
            let mut seen: HashSet<NodeId> = HashSet::new();
            let mut index = 0;
            loop {
                if session.node(parent) != Some(parent_node) || index >= session.list_len(parent_node, field) {
                    return Ok(false);
                }
                let path = session.get_index(parent, field, index);
                let Some(node) = session.node(path) else {
                    return Ok(false);
                };
                if !seen.insert(node) {
                    index += 1;
                    continue;
                }
                if ctx.visit(session, path, false)? || ctx.drain(session)? {
                    return Ok(true);
                }
                session.resync(path);
                if !session.is_removed(path) {
                    if let Key::Index(key) = session.key(path) {
                        index = key + 1;
                    }
                }
            }
        })
    }

    /// Visit requeued paths of the innermost frame, oldest first.
    fn drain(&mut self, session: &mut Session) -> Result<bool> {
        loop {
            let Some(path) = session.frames.last_mut().and_then(|frame| frame.queue.pop_front()) else {
                return Ok(false);
            };
            session.resync(path);
            if session.is_removed(path) {
                continue;
            }
            let max_requeues = session.config.max_requeues;
            let data = session.data_mut(path);
            data.requeues += 1;
            if data.requeues > max_requeues {
                let node_type = session.node_type(path).unwrap_or(crate::ast::NodeType::Program);
                warn!(%node_type, max_requeues, "requeue limit reached, aborting traversal");
                return Err(TraverseError::RequeueLimit { node_type, max_requeues });
            }
            if self.visit(session, path, true)? {
                return Ok(true);
            }
        }
    }

    /// Enter the node at `path`, walk its children and exit it.
    fn visit(&mut self, session: &mut Session, path: PathId, requeued: bool) -> Result<bool> {
        if session.stopping {
            return Ok(true);
        }
        let Some(node) = session.node(path) else {
            return Ok(false);
        };
        if session.is_removed(path) {
            return Ok(false);
        }
        let node_type = session.ast.node_type(node);
        if self.table.blacklist.contains(&node_type) {
            return Ok(false);
        }
        let max_depth = session.config.max_depth;
        if self.depth >= max_depth {
            warn!(%node_type, max_depth, "depth limit reached, aborting traversal");
            return Err(TraverseError::DepthLimit { max_depth });
        }

        let frame = session.frames.last().map(|frame| frame.id);
        let data = session.data_mut(path);
        data.frame = frame;
        data.should_skip = false;
        data.should_stop = false;
        if !requeued {
            data.requeues = 0;
        }
        self.visited += 1;

        trace!(%node_type, depth = self.depth, "enter");
        if self.call(session, path, node, Phase::Enter)? {
            return Ok(session.should_stop(path) || session.stopping);
        }

        self.depth += 1;
        let stopped = self.traverse_children(session, path, node);
        self.depth -= 1;
        if stopped? {
            return Ok(true);
        }
        // A descendant replaced or removed this node; the new node was
        // requeued and gets its own visit.
        if session.is_removed(path) || session.node(path) != Some(node) {
            return Ok(session.should_stop(path) || session.stopping);
        }

        trace!(%node_type, depth = self.depth, "exit");
        self.call(session, path, node, Phase::Exit)?;
        Ok(session.should_stop(path) || session.stopping)
    }

    /// Visit every child field of `node` in visitor-key order, giving up
    /// as soon as `path` no longer holds `node`.
    pub(crate) fn traverse_children(&mut self, session: &mut Session, path: PathId, node: NodeId) -> Result<bool> {
        for &field in session.ast.node_type(node).visitor_keys() {
            if session.node(path) != Some(node) {
                break;
            }
            let stopped = match session.ast.kind(node).child(field) {
                Some(Child::List(_)) => self.visit_multiple(session, path, field)?,
                Some(Child::Node(Some(_))) => {
                    let child = session.get(path, field);
                    self.visit_single(session, child)?
                }
                _ => false,
            };
            if stopped {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Run the handlers registered for this node's kind: catch-all first,
    /// then the kind's own, then aliases. Returns `true` when the chain was
    /// interrupted by a replacement, removal, skip or stop.
    fn call(&mut self, session: &mut Session, path: PathId, node: NodeId, phase: Phase) -> Result<bool> {
        let node_type = session.ast.node_type(node);
        let table = &mut *self.table;
        let (any, typed, aliased) = match phase {
            Phase::Enter => (&mut table.enter_any, table.enter.get_mut(&node_type), &mut table.enter_alias),
            Phase::Exit => (&mut table.exit_any, table.exit.get_mut(&node_type), &mut table.exit_alias),
        };
        let aliased = aliased
            .iter_mut()
            .filter(|(alias, _)| node_type.is_alias(*alias))
            .map(|(_, handler)| handler);

        let interrupted = |s: &Session| {
            s.is_removed(path) || s.node(path) != Some(node) || s.should_skip(path) || s.should_stop(path) || s.stopping
        };
        for handler in any.iter_mut().chain(typed.into_iter().flatten()).chain(aliased) {
            if interrupted(session) {
                return Ok(true);
            }
            handler(session, path)?;
        }
        Ok(interrupted(session))
    }
}
