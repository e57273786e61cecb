// Copyright 2026 The Tagstream Project
// SPDX-License-Identifier: Apache-2.0

use tokio::sync::mpsc;

use super::types::SessionEvent;

/// Receives session lifecycle events. Called inline from the drive loop.
pub trait SessionObserver: Send + Sync {
    fn notify(&self, event: &SessionEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl SessionObserver for NullObserver {
    fn notify(&self, _event: &SessionEvent) {}
}

/// Forwards events into an unbounded channel.
///
/// Events sent after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SessionObserver for ChannelObserver {
    fn notify(&self, event: &SessionEvent) {
        let _ = self.tx.send(event.clone());
    }
}
