//! Pending write coalescing.
//!
//! Rapid UI interactions (a temperature slider drag, say) can submit many
//! writes for the same field before the bus gives us a transmit window.
//! Only the newest request per field is worth sending; superseded ones are
//! dropped, which keeps the half-duplex bus from being flooded.

use std::collections::VecDeque;

use navien_protocol::WriteRequest;
use tracing::debug;

/// FIFO of pending write requests with last-write-wins coalescing per
/// field. Once a request is popped for transmission it can no longer be
/// superseded.
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: VecDeque<WriteRequest>,
}

impl CommandQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        CommandQueue::default()
    }

    /// Queue a request, replacing any pending request for the same field.
    /// Returns `true` if an older request was superseded.
    pub fn push(&mut self, request: WriteRequest) -> bool {
        let field = request.field();
        let before = self.pending.len();
        self.pending.retain(|r| r.field() != field);
        let superseded = self.pending.len() != before;
        if superseded {
            debug!(%field, "superseding pending write");
        }
        self.pending.push_back(request);
        superseded
    }

    /// Take the oldest pending request for transmission.
    pub fn pop(&mut self) -> Option<WriteRequest> {
        self.pending.pop_front()
    }

    /// Number of pending requests.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
