use enum_map::Enum;
use enumset::enum_set;
use enumset::EnumSet;
use enumset::EnumSetType;

/// The classification of a single committed domain mutation.
///
/// Mutations are promoted to the strongest kind which describes them: removing the current lower
/// bound is a [`DomainEvent::LowerBound`] event, and any mutation which leaves a single value is a
/// [`DomainEvent::Instantiate`] event.
#[derive(Debug, Enum, EnumSetType, Hash)]
pub enum DomainEvent {
    /// The domain now contains exactly one value.
    Instantiate,
    /// The lower bound was raised.
    LowerBound,
    /// The upper bound was lowered.
    UpperBound,
    /// A value strictly between the bounds was removed.
    Removal,
}

impl DomainEvent {
    /// The set of event kinds which are implied by this event.
    ///
    /// A propagator which waits for removals also has to be woken up when a bound moves or the
    /// domain is instantiated, since those mutations remove values as well. Pending events for the
    /// same propagator are coalesced by or-ing their strengthened masks.
    pub fn strengthened_mask(self) -> EnumSet<DomainEvent> {
        match self {
            DomainEvent::Instantiate => EnumSet::all(),
            DomainEvent::LowerBound => DomainEvent::LowerBound | DomainEvent::Removal,
            DomainEvent::UpperBound => DomainEvent::UpperBound | DomainEvent::Removal,
            DomainEvent::Removal => enum_set!(DomainEvent::Removal),
        }
    }
}

/// Commonly used propagation conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainEvents {
    events: EnumSet<DomainEvent>,
}

impl DomainEvents {
    /// Any change to the domain.
    pub const ANY: DomainEvents = DomainEvents::new(enum_set!(
        DomainEvent::Instantiate
            | DomainEvent::LowerBound
            | DomainEvent::UpperBound
            | DomainEvent::Removal
    ));
    /// Changes to either bound (including instantiation).
    pub const BOUNDS: DomainEvents = DomainEvents::new(enum_set!(
        DomainEvent::Instantiate | DomainEvent::LowerBound | DomainEvent::UpperBound
    ));
    /// Only the lower bound.
    pub const LOWER_BOUND: DomainEvents =
        DomainEvents::new(enum_set!(DomainEvent::Instantiate | DomainEvent::LowerBound));
    /// Only the upper bound.
    pub const UPPER_BOUND: DomainEvents =
        DomainEvents::new(enum_set!(DomainEvent::Instantiate | DomainEvent::UpperBound));
    /// Only instantiation.
    pub const INSTANTIATE: DomainEvents = DomainEvents::new(enum_set!(DomainEvent::Instantiate));
    /// Any value removal; since every event removes values this is equivalent to [`Self::ANY`]
    /// once strengthened.
    pub const REMOVAL: DomainEvents = DomainEvents::new(enum_set!(DomainEvent::Removal));

    pub const fn new(events: EnumSet<DomainEvent>) -> DomainEvents {
        DomainEvents { events }
    }

    pub fn events(self) -> EnumSet<DomainEvent> {
        self.events
    }
}

impl From<DomainEvents> for EnumSet<DomainEvent> {
    fn from(value: DomainEvents) -> Self {
        value.events
    }
}

/// The reason a propagator is scheduled for coarse-grained propagation.
#[derive(Debug, Enum, EnumSetType, Hash)]
pub enum PropagatorEvent {
    /// A propagator-specific request, e.g. a pass deferred from fine-grained propagation.
    Custom,
    /// A full propagation from scratch, e.g. after posting or backtracking.
    Full,
}

impl PropagatorEvent {
    pub fn strengthened_mask(self) -> EnumSet<PropagatorEvent> {
        match self {
            PropagatorEvent::Custom => enum_set!(PropagatorEvent::Custom),
            PropagatorEvent::Full => PropagatorEvent::Custom | PropagatorEvent::Full,
        }
    }
}
