//! The closed event set produced by integer domain changes, and the
//! subscription masks propagators register against.

use enumset::{EnumSet, EnumSetType};

/// One kind of integer-domain change. Each variant implicitly subsumes the
/// weaker ones it is listed after here, e.g. `Instantiate` subsumes
/// `IncLow` and `DecUpp`.
#[derive(EnumSetType, Debug)]
pub enum IntDomainEvent {
    /// The domain was reduced to a single value.
    Instantiate,
    /// The lower bound increased.
    IncLow,
    /// The upper bound decreased.
    DecUpp,
    /// Either bound moved, without becoming instantiated.
    Bound,
    /// An interior value was removed without moving either bound.
    Remove,
}

/// A subscription mask: the set of [`IntDomainEvent`]s a propagator reacts
/// to for one of its variables.
pub type DomainEventSet = EnumSet<IntDomainEvent>;

/// Named constructors for the masks propagators commonly register, mirroring
/// the conventions used throughout the propagator implementations.
pub struct DomainEvents;

impl DomainEvents {
    /// React only when the variable becomes fixed.
    pub const ASSIGN: DomainEventSet = enumset::enum_set!(IntDomainEvent::Instantiate);

    /// React to every kind of domain change.
    pub const ANY_INT: DomainEventSet = enumset::enum_set!(
        IntDomainEvent::Instantiate
            | IntDomainEvent::IncLow
            | IntDomainEvent::DecUpp
            | IntDomainEvent::Bound
            | IntDomainEvent::Remove
    );

    /// React to lower-bound tightenings (and instantiation).
    pub const LOWER_BOUND: DomainEventSet =
        enumset::enum_set!(IntDomainEvent::IncLow | IntDomainEvent::Bound | IntDomainEvent::Instantiate);

    /// React to upper-bound tightenings (and instantiation).
    pub const UPPER_BOUND: DomainEventSet =
        enumset::enum_set!(IntDomainEvent::DecUpp | IntDomainEvent::Bound | IntDomainEvent::Instantiate);

    /// React to any bound movement, instantiated or not.
    pub const BOUNDS: DomainEventSet = enumset::enum_set!(
        IntDomainEvent::IncLow | IntDomainEvent::DecUpp | IntDomainEvent::Bound | IntDomainEvent::Instantiate
    );

    /// React to interior removals only (enumerated domains).
    pub const REMOVAL: DomainEventSet = enumset::enum_set!(IntDomainEvent::Remove | IntDomainEvent::Instantiate);
}

/// Determines the weakest event that accurately describes a domain change,
/// upgrading to `Instantiate` if the change completed instantiation.
pub fn classify_change(
    lb_changed: bool,
    ub_changed: bool,
    interior_removed: bool,
    became_instantiated: bool,
) -> IntDomainEvent {
    if became_instantiated {
        return IntDomainEvent::Instantiate;
    }
    match (lb_changed, ub_changed, interior_removed) {
        (true, true, _) => IntDomainEvent::Bound,
        (true, false, _) => IntDomainEvent::IncLow,
        (false, true, _) => IntDomainEvent::DecUpp,
        (false, false, true) => IntDomainEvent::Remove,
        (false, false, false) => unreachable!("classify_change called with no actual change"),
    }
}
