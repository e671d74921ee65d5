//! Inbound/outbound message queues shared between the server and the simulation

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use crate::protocol::Message;

/// Two FIFO queues: messages received from clients, and messages waiting to be
/// broadcast to them.
///
/// The simulation drains inbound once per tick; the server pushes inbound as
/// lines arrive and drains outbound on its flush interval.
#[derive(Debug, Default)]
pub struct MessageQueue {
    inbound: Mutex<VecDeque<Message>>,
    outbound: Mutex<VecDeque<Message>>,
}

// A panicked holder can't leave a VecDeque half-mutated, so poisoned locks are reused.
fn lock(queue: &Mutex<VecDeque<Message>>) -> MutexGuard<'_, VecDeque<Message>> {
    queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message received from a client
    pub fn push_inbound(&self, msg: Message) {
        lock(&self.inbound).push_back(msg);
    }

    /// Take every pending inbound message in arrival order
    pub fn drain_inbound(&self) -> Vec<Message> {
        lock(&self.inbound).drain(..).collect()
    }

    /// Queue a message for broadcast to every connected client
    pub fn send(&self, msg: Message) {
        lock(&self.outbound).push_back(msg);
    }

    /// Take every pending outbound message in send order
    pub fn drain_outbound(&self) -> Vec<Message> {
        lock(&self.outbound).drain(..).collect()
    }

    pub fn inbound_len(&self) -> usize {
        lock(&self.inbound).len()
    }

    pub fn outbound_len(&self) -> usize {
        lock(&self.outbound).len()
    }
}
