//! Cross-modal communication log.
//!
//! Messages are recorded, not delivered: there is no queue, no retry and no
//! acknowledgement. Receivers poll [`CommunicationLog::inbox`].

use modal_kernel::CrossModalMessage;

use crate::history::BoundedLog;

#[derive(Debug, Clone)]
pub struct CommunicationLog {
    log: BoundedLog<CrossModalMessage>,
    total: u64,
}

impl CommunicationLog {
    pub fn new(history_limit: usize) -> Self {
        Self {
            log: BoundedLog::new(history_limit),
            total: 0,
        }
    }

    pub fn record(&mut self, message: CrossModalMessage) {
        tracing::debug!(
            sender = %message.sender_id,
            receiver = %message.receiver_id,
            requires_response = message.requires_response,
            "cross-modal message"
        );
        self.total += 1;
        self.log.push(message);
    }

    pub fn set_history_limit(&mut self, limit: usize) {
        self.log.set_capacity(limit);
    }

    pub fn messages(&self) -> Vec<CrossModalMessage> {
        self.log.to_vec()
    }

    /// Retained messages addressed to `receiver_id`, oldest first.
    pub fn inbox(&self, receiver_id: &str) -> Vec<CrossModalMessage> {
        self.log
            .iter()
            .filter(|m| m.receiver_id == receiver_id)
            .cloned()
            .collect()
    }

    /// Retained messages sent by `sender_id`, oldest first.
    pub fn outbox(&self, sender_id: &str) -> Vec<CrossModalMessage> {
        self.log
            .iter()
            .filter(|m| m.sender_id == sender_id)
            .cloned()
            .collect()
    }

    /// Messages recorded since construction, including trimmed ones.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}
