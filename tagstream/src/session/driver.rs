// Copyright 2026 The Tagstream Project
// SPDX-License-Identifier: Apache-2.0

// Drive loop
//
// One session per request. The pull from the chunk source is the only
// suspension point; every chunk is processed to completion before the
// next pull.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::context::RequestContext;
use crate::diagnostics::{DiagnosticEvent, Diagnostics, RenderStage, TracingDiagnostics};
use crate::plugin::PluginSet;
use crate::render::Placeholder;
use crate::scanner::{AbandonReason, ScanEvent, ScanState, Scanner};
use crate::transport::{ChunkSource, Transport, TransportError};

use super::normalizer::ChunkNormalizer;
use super::observer::{NullObserver, SessionObserver};
use super::types::{
    CancelHandle, OutputMessage, SessionError, SessionEvent, SessionOutcome, SessionSettings,
    SessionStatus,
};

/// Consumes one response stream into an `OutputMessage`.
pub struct Session {
    id: Uuid,
    plugins: Arc<PluginSet>,
    settings: SessionSettings,
    observer: Arc<dyn SessionObserver>,
    diagnostics: Arc<dyn Diagnostics>,
    cancel: CancelHandle,
    normalizer: ChunkNormalizer,
    scan: ScanState,
    /// Placeholder of the block currently open, if its renderer gave one.
    placeholder: Option<Placeholder>,
    message: Option<OutputMessage>,
}

impl Session {
    pub fn new(plugins: Arc<PluginSet>, settings: SessionSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            normalizer: ChunkNormalizer::new(settings.mode),
            plugins,
            settings,
            observer: Arc::new(NullObserver),
            diagnostics: Arc::new(TracingDiagnostics),
            cancel: CancelHandle::new(),
            scan: ScanState::new(),
            placeholder: None,
            message: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Use an existing handle, so the caller can cancel before the session exists.
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The message built so far. `None` until visible content arrives.
    pub fn message(&self) -> Option<&OutputMessage> {
        self.message.as_ref()
    }

    pub fn into_message(self) -> Option<OutputMessage> {
        self.message
    }

    // -----------------------------------------------------------------------
    // Drive loop
    // -----------------------------------------------------------------------

    /// Open a chunk source through `transport` and drive it to the end.
    pub async fn start(
        self,
        transport: &dyn Transport,
        request: &str,
        context: &RequestContext,
    ) -> Result<SessionOutcome, SessionError> {
        self.notify_started();
        let token = self.cancel.token().clone();

        let opened = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            opened = transport.open(request, context) => Some(opened),
        };

        match opened {
            None => Ok(self.stop_cancelled()),
            Some(Ok(mut source)) => self.run(source.as_mut()).await,
            Some(Err(error)) => Err(self.fail(error)),
        }
    }

    /// Drive an already-open source to the end.
    pub async fn drive(self, source: &mut dyn ChunkSource) -> Result<SessionOutcome, SessionError> {
        self.notify_started();
        self.run(source).await
    }

    async fn run(mut self, source: &mut dyn ChunkSource) -> Result<SessionOutcome, SessionError> {
        let token = self.cancel.token().clone();
        loop {
            if token.is_cancelled() {
                return Ok(self.stop_cancelled());
            }

            let pulled = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                pulled = source.next_chunk() => Some(pulled),
            };

            match pulled {
                None => return Ok(self.stop_cancelled()),
                Some(Ok(Some(raw))) => self.on_chunk(&raw),
                Some(Ok(None)) => {
                    self.finish();
                    return Ok(self.complete());
                }
                Some(Err(error)) => return Err(self.fail(error)),
            }
        }
    }

    // -----------------------------------------------------------------------
    // Chunk processing
    // -----------------------------------------------------------------------

    /// Process one raw chunk. Ignored once cancelled.
    pub fn on_chunk(&mut self, raw: &str) {
        if self.is_cancelled() {
            return;
        }
        let delta = self.normalizer.normalize(raw, self.diagnostics.as_ref());
        if delta.is_empty() {
            return;
        }
        let plugins = Arc::clone(&self.plugins);
        let events = Scanner::new(plugins.registry())
            .with_block_limit(self.settings.max_block_bytes)
            .step(&mut self.scan, &delta);
        self.apply(&plugins, events);
    }

    /// End of stream: flush retained text, then any open block verbatim.
    pub fn finish(&mut self) {
        if self.is_cancelled() {
            return;
        }
        let plugins = Arc::clone(&self.plugins);
        let events = Scanner::new(plugins.registry())
            .with_block_limit(self.settings.max_block_bytes)
            .finish(&mut self.scan);
        self.apply(&plugins, events);
    }

    fn apply(&mut self, plugins: &PluginSet, events: Vec<ScanEvent>) {
        for event in events {
            match event {
                ScanEvent::Text(text) => {
                    let output = plugins.hooks().apply(&text, self.diagnostics.as_ref());
                    self.append(&output.text, output.markup);
                }
                ScanEvent::BlockOpened { index } => self.open_block(plugins, index),
                ScanEvent::BlockClosed { index, content } => {
                    self.close_block(plugins, index, &content)
                }
                ScanEvent::BlockAbandoned { index, raw, reason } => {
                    self.abandon_block(plugins, index, &raw, reason)
                }
            }
        }
    }

    fn open_block(&mut self, plugins: &PluginSet, index: usize) {
        let Some((descriptor, renderer)) = plugins.block(index) else {
            return;
        };
        match renderer.render_placeholder(&descriptor.name) {
            Ok(Some(inner)) if !inner.is_empty() => {
                let placeholder = Placeholder::wrap(&inner);
                self.append(placeholder.markup(), true);
                self.placeholder = Some(placeholder);
            }
            Ok(_) => {}
            Err(error) => self.diagnostics.record(DiagnosticEvent::RendererFailed {
                block: descriptor.name.clone(),
                stage: RenderStage::Placeholder,
                error: error.to_string(),
            }),
        }
    }

    fn close_block(&mut self, plugins: &PluginSet, index: usize, content: &str) {
        let Some((descriptor, renderer)) = plugins.block(index) else {
            return;
        };
        let markup = match renderer.render_resolved(&descriptor.name, content) {
            Ok(markup) if markup.is_empty() => {
                self.diagnostics.record(DiagnosticEvent::EmptyRender {
                    block: descriptor.name.clone(),
                });
                markup
            }
            Ok(markup) => markup,
            Err(error) => {
                self.diagnostics.record(DiagnosticEvent::RendererFailed {
                    block: descriptor.name.clone(),
                    stage: RenderStage::Resolved,
                    error: error.to_string(),
                });
                String::new()
            }
        };
        self.settle_block(&markup, true);
    }

    fn abandon_block(&mut self, plugins: &PluginSet, index: usize, raw: &str, reason: AbandonReason) {
        let block = plugins
            .registry()
            .get(index)
            .map(|d| d.name.clone())
            .unwrap_or_default();
        let event = match reason {
            AbandonReason::EndOfStream => DiagnosticEvent::UnclosedBlock {
                block,
                bytes: raw.len(),
            },
            AbandonReason::Overflow => DiagnosticEvent::BlockOverflow {
                block,
                limit: self.settings.max_block_bytes.unwrap_or_default(),
            },
        };
        self.diagnostics.record(event);
        self.settle_block(raw, false);
    }

    /// Put a finished block's output where its placeholder is, or at the end.
    fn settle_block(&mut self, text: &str, html: bool) {
        let Some(placeholder) = self.placeholder.take() else {
            self.append(text, html);
            return;
        };
        let replaced = match self.message.as_mut() {
            Some(message) => message.replace_once(placeholder.markup(), text),
            None => false,
        };
        if replaced {
            self.notify_updated();
        } else {
            self.append(text, html);
        }
    }

    fn append(&mut self, text: &str, html: bool) {
        if text.is_empty() {
            return;
        }
        let started = self.message.is_none();
        let message = self.message.get_or_insert_with(OutputMessage::new);
        message.append(text, html);
        let message_id = message.id();

        if started {
            tracing::debug!(session_id = %self.id, %message_id, "first content received");
            self.observer
                .notify(&SessionEvent::MessageStarted { message_id });
        }
        self.notify_updated();
    }

    // -----------------------------------------------------------------------
    // Termination
    // -----------------------------------------------------------------------

    fn complete(self) -> SessionOutcome {
        let message_id = self.message.as_ref().map(OutputMessage::id);
        tracing::debug!(session_id = %self.id, has_content = message_id.is_some(), "session completed");
        self.observer.notify(&SessionEvent::Ended { message_id });
        SessionOutcome {
            status: SessionStatus::Completed,
            message: self.message,
        }
    }

    /// Scanner state is dropped without a flush: no raw markers reach the message.
    fn stop_cancelled(mut self) -> SessionOutcome {
        self.scan.discard();
        self.placeholder = None;
        tracing::debug!(session_id = %self.id, "session cancelled");
        self.observer.notify(&SessionEvent::Cancelled);
        SessionOutcome {
            status: SessionStatus::Cancelled,
            message: self.message,
        }
    }

    /// Everything received before the failure is kept: held-back text is
    /// flushed and an open block is emitted verbatim, as at end of stream.
    fn fail(mut self, error: TransportError) -> SessionError {
        self.finish();
        self.placeholder = None;
        tracing::warn!(session_id = %self.id, %error, "session failed");
        self.observer.notify(&SessionEvent::Failed {
            error: error.to_string(),
        });
        SessionError::Transport {
            source: error,
            partial: self.message,
        }
    }

    fn notify_started(&self) {
        tracing::debug!(session_id = %self.id, mode = %self.settings.mode, "session started");
        self.observer.notify(&SessionEvent::Started {
            session_id: self.id,
        });
    }

    fn notify_updated(&self) {
        if let Some(message) = &self.message {
            self.observer.notify(&SessionEvent::MessageUpdated {
                message_id: message.id(),
                content: message.content().to_string(),
            });
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("settings", &self.settings)
            .field("cancelled", &self.is_cancelled())
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}
