//! The closed event set produced by graph-domain changes (spec §3.1).

use enumset::{EnumSet, EnumSetType};

#[derive(EnumSetType, Debug)]
pub enum GraphDomainEvent {
    /// An arc was added to the kernel (made mandatory).
    AddArc,
    /// An arc was removed from the envelope (made impossible).
    RemoveArc,
    /// A node was added to the kernel (made mandatory).
    ActivateNode,
    /// A node was removed from the envelope.
    RemoveNode,
}

pub type GraphEventSet = EnumSet<GraphDomainEvent>;

pub struct GraphEvents;

impl GraphEvents {
    pub const ANY: GraphEventSet = enumset::enum_set!(
        GraphDomainEvent::AddArc
            | GraphDomainEvent::RemoveArc
            | GraphDomainEvent::ActivateNode
            | GraphDomainEvent::RemoveNode
    );
    pub const ARCS: GraphEventSet =
        enumset::enum_set!(GraphDomainEvent::AddArc | GraphDomainEvent::RemoveArc);
    pub const NODES: GraphEventSet =
        enumset::enum_set!(GraphDomainEvent::ActivateNode | GraphDomainEvent::RemoveNode);
}
