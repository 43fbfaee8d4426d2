//! Holds structural events that arrive before a validator exists.

use verity_core::Event;
use verity_grammar::EventSink;

/// FIFO of events awaiting replay.
#[derive(Debug, Default)]
pub struct EventBuffer {
    events: Vec<Event>,
}

impl EventBuffer {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one event.
    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Events waiting.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Deliver every queued event to `sink` in arrival order and empty the
    /// buffer. Returns the number delivered.
    pub fn drain_into(&mut self, sink: &mut dyn EventSink) -> usize {
        let count = self.events.len();
        for event in self.events.drain(..) {
            sink.event(&event);
        }
        count
    }

    /// Drop everything queued. Returns the number dropped.
    pub fn discard(&mut self) -> usize {
        let count = self.events.len();
        self.events.clear();
        count
    }
}
