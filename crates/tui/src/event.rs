//! Key handling outcome shared by the widgets.

/// Whether a widget used a key event.
///
/// The composer gets first look at every key; anything it reports as
/// `NotConsumed` falls through to the stage table and the detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Consumed,
    NotConsumed,
}

impl EventStatus {
    pub fn is_consumed(self) -> bool {
        self == EventStatus::Consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_consumed() {
        assert!(EventStatus::Consumed.is_consumed());
        assert!(!EventStatus::NotConsumed.is_consumed());
    }
}
