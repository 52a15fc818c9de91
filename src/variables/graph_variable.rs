use crate::engine::cp::graph::assignments_graph::AssignmentsGraph;
use crate::engine::cp::graph::GraphId;

/// A handle to a posted graph variable: a node set and an arc set, each a
/// kernel (mandatory, monotonically growing) / envelope (possible,
/// monotonically shrinking) pair over `0..num_nodes`.
///
/// Unlike [`crate::variables::IntegerVariable`], graph variables have no
/// view layer in this crate — propagators read and mutate them through
/// [`AssignmentsGraph`] directly via this handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphVariable {
    id: GraphId,
    num_nodes: usize,
}

impl GraphVariable {
    pub(crate) fn new(id: GraphId, num_nodes: usize) -> Self {
        GraphVariable { id, num_nodes }
    }

    pub fn id(&self) -> GraphId {
        self.id
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn node_in_envelope(&self, graph: &AssignmentsGraph, node: usize) -> bool {
        graph.node_in_envelope(self.id, node)
    }

    pub fn node_in_kernel(&self, graph: &AssignmentsGraph, node: usize) -> bool {
        graph.node_in_kernel(self.id, node)
    }

    pub fn arc_in_envelope(&self, graph: &AssignmentsGraph, from: usize, to: usize) -> bool {
        graph.arc_in_envelope(self.id, from, to)
    }

    pub fn arc_in_kernel(&self, graph: &AssignmentsGraph, from: usize, to: usize) -> bool {
        graph.arc_in_kernel(self.id, from, to)
    }

    pub fn envelope_nodes<'a>(&self, graph: &'a AssignmentsGraph) -> impl Iterator<Item = usize> + 'a {
        graph.envelope_nodes(self.id)
    }

    pub fn kernel_nodes<'a>(&self, graph: &'a AssignmentsGraph) -> impl Iterator<Item = usize> + 'a {
        graph.kernel_nodes(self.id)
    }

    pub fn envelope_successors<'a>(&self, graph: &'a AssignmentsGraph, from: usize) -> impl Iterator<Item = usize> + 'a {
        graph.envelope_successors(self.id, from)
    }

    pub fn kernel_successors<'a>(&self, graph: &'a AssignmentsGraph, from: usize) -> impl Iterator<Item = usize> + 'a {
        graph.kernel_successors(self.id, from)
    }

    pub fn is_fixed(&self, graph: &AssignmentsGraph) -> bool {
        (0..self.num_nodes).all(|n| self.node_in_envelope(graph, n) == self.node_in_kernel(graph, n))
    }
}
