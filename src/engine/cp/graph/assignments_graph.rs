//! The graph-variable store: one [`GraphRepresentation`] per posted graph
//! variable, each a kernel/envelope pair over nodes and a kernel/envelope
//! pair over arcs.

use std::cell::RefCell;
use std::rc::Rc;

use crate::basic_types::{Inconsistency, ModelError, PropagationStatusCP};
use crate::conjunction;
use crate::engine::cp::graph::graph_events::GraphDomainEvent;
use crate::engine::cp::graph::GraphId;
use crate::engine::cp::graph::neighborhood::Neighborhood;
use crate::engine::cp::reversible::{ReversibleBitSet, ReversibleSparseSet, Trail};

/// A single posted graph variable's node and arc kernel/envelope sets.
struct GraphRepresentation {
    directed: bool,
    num_nodes: usize,
    node_envelope: ReversibleSparseSet,
    node_kernel: ReversibleBitSet,
    /// `arcs[u]` is node `u`'s outgoing-neighbor kernel/envelope pair. For
    /// undirected graphs arcs are mirrored on both endpoints at write time
    /// so a single query side suffices for either direction.
    arcs: Vec<Neighborhood>,
}

/// What a [`GraphChange`] happened to: a single node, or an arc endpoint
/// pair. Carried alongside the event so a propagator replaying the log
/// doesn't have to rediscover which node or arc moved by rescanning.
#[derive(Debug, Clone, Copy)]
pub enum GraphChangeDetail {
    Node(usize),
    Arc(usize, usize),
}

/// A change recorded against a graph variable, the graph-domain analogue of
/// `assignments_integer::DomainChange`.
#[derive(Debug, Clone, Copy)]
pub struct GraphChange {
    pub id: GraphId,
    pub event: GraphDomainEvent,
    pub detail: GraphChangeDetail,
}

pub struct AssignmentsGraph {
    trail: Rc<Trail>,
    graphs: Vec<GraphRepresentation>,
    pending_events: RefCell<Vec<GraphChange>>,
    /// Append-only replay log consulted by propagators that maintain
    /// incremental state across calls. Entries are popped on backtrack via
    /// the trail, in the same style as `Reversible<T>`'s lazy per-world
    /// undo.
    event_log: Rc<RefCell<Vec<GraphChange>>>,
}

impl AssignmentsGraph {
    pub fn new(trail: &Rc<Trail>) -> Self {
        AssignmentsGraph {
            trail: Rc::clone(trail),
            graphs: Vec::new(),
            pending_events: RefCell::new(Vec::new()),
            event_log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Entries appended to the replay log since `since`; clamp `since` to
    /// `event_log_len()` first, since a backtrack may have shrunk the log
    /// below a propagator's previously remembered cursor.
    pub fn event_log_since(&self, since: usize) -> Vec<GraphChange> {
        let log = self.event_log.borrow();
        log[since.min(log.len())..].to_vec()
    }

    pub fn event_log_len(&self) -> usize {
        self.event_log.borrow().len()
    }

    pub fn num_graphs(&self) -> usize {
        self.graphs.len()
    }

    pub fn grow(&mut self, directed: bool, num_nodes: usize) -> Result<GraphId, ModelError> {
        if num_nodes == 0 {
            return Err(ModelError::EmptyGraph);
        }
        let id = GraphId::new(self.graphs.len() as u32);
        let arcs = (0..num_nodes)
            .map(|_| Neighborhood::new(&self.trail, num_nodes))
            .collect();
        self.graphs.push(GraphRepresentation {
            directed,
            num_nodes,
            node_envelope: ReversibleSparseSet::new_full(&self.trail, 0, num_nodes as i32 - 1),
            node_kernel: ReversibleBitSet::new(&self.trail, num_nodes),
            arcs,
        });
        Ok(id)
    }

    fn repr(&self, id: GraphId) -> &GraphRepresentation {
        &self.graphs[id.index()]
    }

    fn repr_mut(&mut self, id: GraphId) -> &mut GraphRepresentation {
        &mut self.graphs[id.index()]
    }

    pub fn num_nodes(&self, id: GraphId) -> usize {
        self.repr(id).num_nodes
    }

    pub fn is_directed(&self, id: GraphId) -> bool {
        self.repr(id).directed
    }

    pub fn node_in_envelope(&self, id: GraphId, node: usize) -> bool {
        self.repr(id).node_envelope.contains(node as i32)
    }

    pub fn node_in_kernel(&self, id: GraphId, node: usize) -> bool {
        self.repr(id).node_kernel.contains(node)
    }

    pub fn envelope_nodes(&self, id: GraphId) -> impl Iterator<Item = usize> + '_ {
        self.repr(id).node_envelope.iter().map(|v| v as usize)
    }

    pub fn kernel_nodes(&self, id: GraphId) -> impl Iterator<Item = usize> + '_ {
        self.repr(id).node_kernel.iter()
    }

    pub fn arc_in_envelope(&self, id: GraphId, from: usize, to: usize) -> bool {
        self.repr(id).arcs[from].envelope_contains(to)
    }

    pub fn arc_in_kernel(&self, id: GraphId, from: usize, to: usize) -> bool {
        self.repr(id).arcs[from].kernel_contains(to)
    }

    pub fn envelope_successors(&self, id: GraphId, from: usize) -> impl Iterator<Item = usize> + '_ {
        self.repr(id).arcs[from].envelope_iter()
    }

    pub fn kernel_successors(&self, id: GraphId, from: usize) -> impl Iterator<Item = usize> + '_ {
        self.repr(id).arcs[from].kernel_iter()
    }

    /// Removes `node` from the envelope. Removing a node some other
    /// propagator already made mandatory is an ordinary contradiction,
    /// recoverable by backtracking — not the fatal `KernelEnvelopeDivergence`
    /// case, which only covers the engine itself ever letting K ⊄ E slip
    /// through.
    pub fn remove_node(&mut self, id: GraphId, node: usize) -> PropagationStatusCP {
        if self.node_in_kernel(id, node) {
            return Err(Inconsistency::new(conjunction!()));
        }
        if self.repr_mut(id).node_envelope.remove(node as i32) {
            self.record(id, GraphDomainEvent::RemoveNode, GraphChangeDetail::Node(node));
            let num_nodes = self.num_nodes(id);
            for other in 0..num_nodes {
                if other != node {
                    let _ = self.repr_mut(id).arcs[other].remove_from_envelope(node);
                }
            }
        }
        Ok(())
    }

    /// Moves `node` into the kernel. Activating a node some other
    /// propagator already excluded from the envelope is the symmetric
    /// contradiction to [`Self::remove_node`]'s.
    pub fn activate_node(&mut self, id: GraphId, node: usize) -> PropagationStatusCP {
        if !self.node_in_envelope(id, node) {
            return Err(Inconsistency::new(conjunction!()));
        }
        if self.repr_mut(id).node_kernel.set(node) {
            self.record(id, GraphDomainEvent::ActivateNode, GraphChangeDetail::Node(node));
        }
        Ok(())
    }

    /// Removes the arc `from -> to` from the envelope; mirrored for
    /// undirected graphs. Removing an arc some other propagator already
    /// enforced is a contradiction, not an invariant violation.
    pub fn remove_arc(&mut self, id: GraphId, from: usize, to: usize) -> PropagationStatusCP {
        if self.arc_in_kernel(id, from, to) {
            return Err(Inconsistency::new(conjunction!()));
        }
        let directed = self.is_directed(id);
        if self.repr_mut(id).arcs[from].remove_from_envelope(to) {
            self.record(id, GraphDomainEvent::RemoveArc, GraphChangeDetail::Arc(from, to));
        }
        if !directed && from != to {
            if self.repr_mut(id).arcs[to].remove_from_envelope(from) {
                self.record(id, GraphDomainEvent::RemoveArc, GraphChangeDetail::Arc(to, from));
            }
        }
        Ok(())
    }

    /// Moves the arc `from -> to` into the kernel; mirrored for undirected
    /// graphs. Enforcing an arc some other propagator already removed is a
    /// contradiction, e.g. enforcing an arc already removed.
    pub fn add_arc(&mut self, id: GraphId, from: usize, to: usize) -> PropagationStatusCP {
        if !self.arc_in_envelope(id, from, to) {
            return Err(Inconsistency::new(conjunction!()));
        }
        let directed = self.is_directed(id);
        if self.repr_mut(id).arcs[from].add_to_kernel(to) {
            self.record(id, GraphDomainEvent::AddArc, GraphChangeDetail::Arc(from, to));
        }
        if !directed && from != to {
            if self.repr_mut(id).arcs[to].add_to_kernel(from) {
                self.record(id, GraphDomainEvent::AddArc, GraphChangeDetail::Arc(to, from));
            }
        }
        Ok(())
    }

    fn record(&self, id: GraphId, event: GraphDomainEvent, detail: GraphChangeDetail) {
        let change = GraphChange { id, event, detail };
        self.pending_events.borrow_mut().push(change);
        self.event_log.borrow_mut().push(change);
        let log = Rc::clone(&self.event_log);
        self.trail.push_undo(move || {
            let _ = log.borrow_mut().pop();
        });
    }

    pub fn drain_events(&self) -> Vec<GraphChange> {
        self.pending_events.borrow_mut().drain(..).collect()
    }
}
