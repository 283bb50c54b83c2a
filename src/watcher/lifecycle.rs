use std::fmt;

/// What happens to a watcher after it matches a transition.
///
/// The distinction belongs to the registration surface: a blocking read or
/// take waiter is satisfied by one match, an event registration keeps firing
/// until it is cancelled or its lease runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryPolicy {
    /// Stays registered and is reported for every matching transition
    #[default]
    Repeat,
    /// Reported for at most one transition, then deregistered
    OneShot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WatcherState {
    Active = 0,
    /// One-shot watcher claimed by a transition
    Delivered = 1,
    Cancelled = 2,
    Expired = 3,
}

impl WatcherState {
    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => WatcherState::Active,
            1 => WatcherState::Delivered,
            2 => WatcherState::Cancelled,
            _ => WatcherState::Expired,
        }
    }
}

/// Why a watcher left every template group it belonged to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalCause {
    Delivered,
    Cancelled,
    Expired,
}

impl RemovalCause {
    pub(crate) fn terminal_state(self) -> WatcherState {
        match self {
            RemovalCause::Delivered => WatcherState::Delivered,
            RemovalCause::Cancelled => WatcherState::Cancelled,
            RemovalCause::Expired => WatcherState::Expired,
        }
    }
}

impl fmt::Display for RemovalCause {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let s = match self {
            RemovalCause::Delivered => "delivered",
            RemovalCause::Cancelled => "cancelled",
            RemovalCause::Expired => "expired",
        };
        f.write_str(s)
    }
}
