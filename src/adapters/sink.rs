use crate::domain::events::SimEvent;
use crate::domain::ports::EventSink;
use std::sync::{Mutex, PoisonError};

/// Forwards events to `tracing`, one line each with a `kind` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: SimEvent) {
        if event.is_verbose() {
            tracing::debug!(kind = event.kind(), "{}", event);
        } else {
            tracing::info!(kind = event.kind(), "{}", event);
        }
    }
}

/// Keeps every event in memory. Used by tests and by callers that want to
/// inspect a run after the fact.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SimEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SimEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, predicate: impl Fn(&SimEvent) -> bool) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|event| predicate(event))
            .count()
    }

    pub fn lines(&self) -> Vec<String> {
        self.events().iter().map(ToString::to_string).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: SimEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{PortId, ShipId};

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.emit(SimEvent::PortActive { port: PortId(1) });
        sink.emit(SimEvent::TunnelExited { ship: ShipId(2) });

        assert_eq!(
            sink.lines(),
            vec!["Port: 1 is active".to_string(), "Ship: 2 has exited the tunnel".to_string()]
        );
        assert_eq!(sink.count(|e| matches!(e, SimEvent::TunnelExited { .. })), 1);
    }
}
