//! Event delivery
//!
//! The simulation pushes every [`GameEvent`] into a sink handed to it at
//! construction. [`EventQueue`] buffers them until the view drains the queue.

use std::collections::VecDeque;

use crate::types::GameEvent;

pub trait EventSink {
    fn emit(&mut self, event: GameEvent);
}

impl EventSink for Vec<GameEvent> {
    fn emit(&mut self, event: GameEvent) {
        self.push(event);
    }
}

/// FIFO of pending events
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: VecDeque<GameEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pop(&mut self) -> Option<GameEvent> {
        self.events.pop_front()
    }

    /// Take everything queued so far, oldest first
    pub fn drain(&mut self) -> Vec<GameEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }
}

impl EventSink for EventQueue {
    fn emit(&mut self, event: GameEvent) {
        self.events.push_back(event);
    }
}
