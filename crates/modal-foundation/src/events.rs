//! Engine event hub: bounded log, broadcast fan-out and tracing mirror.

use std::collections::BTreeMap;

use modal_kernel::{EventSeverity, ModalEvent, ModalEventKind};
use tokio::sync::broadcast;

use crate::history::BoundedLog;

/// Default broadcast buffer per subscriber.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Owns the event log of one engine.
///
/// Publishing never fails: a broadcast with no live receivers is dropped,
/// and lagging receivers lose the oldest events (see
/// [`broadcast::error::RecvError::Lagged`]).
#[derive(Debug)]
pub struct EventHub {
    log: BoundedLog<ModalEvent>,
    counts: BTreeMap<ModalEventKind, u64>,
    sender: broadcast::Sender<ModalEvent>,
}

impl EventHub {
    pub fn new(history_limit: usize) -> Self {
        Self::with_channel_capacity(history_limit, DEFAULT_EVENT_CHANNEL_CAPACITY)
    }

    pub fn with_channel_capacity(history_limit: usize, channel_capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(channel_capacity.max(1));
        Self {
            log: BoundedLog::new(history_limit),
            counts: BTreeMap::new(),
            sender,
        }
    }

    pub fn publish(&mut self, event: ModalEvent) {
        mirror_to_tracing(&event);
        *self.counts.entry(event.kind).or_default() += 1;
        self.log.push(event.clone());
        // Err only means nobody is listening right now
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ModalEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn set_history_limit(&mut self, limit: usize) {
        self.log.set_capacity(limit);
    }

    pub fn events(&self) -> Vec<ModalEvent> {
        self.log.to_vec()
    }

    pub fn recent(&self, n: usize) -> Vec<ModalEvent> {
        self.log.recent(n)
    }

    pub fn events_for(&self, modal_id: &str) -> Vec<ModalEvent> {
        self.log
            .iter()
            .filter(|e| e.modal_id.as_deref() == Some(modal_id))
            .cloned()
            .collect()
    }

    pub fn events_of_kind(&self, kind: ModalEventKind) -> Vec<ModalEvent> {
        self.log.iter().filter(|e| e.kind == kind).cloned().collect()
    }

    /// Events published since construction, by kind. Not trimmed with the log.
    pub fn counts(&self) -> &BTreeMap<ModalEventKind, u64> {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}

fn mirror_to_tracing(event: &ModalEvent) {
    let modal_id = event.modal_id.as_deref().unwrap_or("-");
    match event.severity {
        EventSeverity::Info => tracing::info!(
            kind = %event.kind,
            modal_id = %modal_id,
            "{}",
            event.message
        ),
        EventSeverity::Warning => tracing::warn!(
            kind = %event.kind,
            modal_id = %modal_id,
            "{}",
            event.message
        ),
        EventSeverity::Error => tracing::error!(
            kind = %event.kind,
            modal_id = %modal_id,
            "{}",
            event.message
        ),
    }
}
