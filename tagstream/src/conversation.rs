// Copyright 2026 The Tagstream Project
// SPDX-License-Identifier: Apache-2.0

// Conversation
//
// Owns the state that outlives a single request: history, metadata,
// selected modules, pending uploads and the session in flight. Every
// `send` starts a fresh session; a newer request cancels the older one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use crate::config::Config;
use crate::context::{ContextBuilder, ConversationState};
use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::message::{FileDescriptor, Message, Role};
use crate::plugin::PluginSet;
use crate::registry::RegistryError;
use crate::session::{
    CancelHandle, NullObserver, Session, SessionError, SessionObserver, SessionOutcome,
    SessionSettings,
};
use crate::transport::Transport;

pub struct Conversation {
    plugins: Arc<PluginSet>,
    transport: Arc<dyn Transport>,
    observer: Arc<dyn SessionObserver>,
    diagnostics: Arc<dyn Diagnostics>,
    settings: SessionSettings,
    max_messages: Option<usize>,
    state: Mutex<ConversationState>,
    /// Session in flight, keyed by session id.
    active: Mutex<Option<(Uuid, CancelHandle)>>,
}

impl Conversation {
    pub fn new(plugins: Arc<PluginSet>, transport: Arc<dyn Transport>) -> Self {
        Self {
            plugins,
            transport,
            observer: Arc::new(NullObserver),
            diagnostics: Arc::new(TracingDiagnostics),
            settings: SessionSettings::default(),
            max_messages: None,
            state: Mutex::new(ConversationState::default()),
            active: Mutex::new(None),
        }
    }

    /// Build from loaded config: blocks, hooks, session settings, history
    /// limit and initial metadata.
    pub fn from_config(config: &Config, transport: Arc<dyn Transport>) -> Result<Self, RegistryError> {
        let plugins = Arc::new(config.plugin_set()?);
        let conversation = Self::new(plugins, transport)
            .with_settings(config.session.clone())
            .with_max_messages(config.history.max_messages);
        conversation.state().metadata = config.metadata.clone();
        Ok(conversation)
    }

    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_max_messages(mut self, max_messages: Option<usize>) -> Self {
        self.max_messages = max_messages;
        self
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    /// Send a user message and stream the reply.
    ///
    /// Whatever the outcome, the reply built so far joins the history right
    /// after this request's user message. Pending uploads are cleared unless
    /// a newer request has superseded this one.
    pub async fn send(&self, text: &str) -> Result<SessionOutcome, SessionError> {
        let session = Session::new(Arc::clone(&self.plugins), self.settings.clone())
            .with_observer(Arc::clone(&self.observer))
            .with_diagnostics(Arc::clone(&self.diagnostics));
        let session_id = session.id();

        if let Some((previous, handle)) = self.active().replace((session_id, session.cancel_handle())) {
            tracing::debug!(%previous, "cancelling session superseded by a new request");
            handle.cancel();
        }

        let user_message = Message::new(Role::User, text);
        let (context, user_index) = {
            let mut state = self.state();
            state.history.push(user_message.clone());
            let context = ContextBuilder::new(&state)
                .with_max_messages(self.max_messages)
                .build();
            (context, state.history.len() - 1)
        };

        let result = session.start(self.transport.as_ref(), text, &context).await;

        let reply = match &result {
            Ok(outcome) => outcome.message.clone(),
            Err(error) => error.partial().cloned(),
        };

        // Lock order is active, then state, so no newer request can push its
        // user message between the check and the insert.
        let mut active = self.active();
        let mut state = self.state();
        if matches!(*active, Some((id, _)) if id == session_id) {
            *active = None;
            if let Some(reply) = reply {
                state.history.push(reply.into_message());
            }
            state.uploads.clear();
        } else if let Some(reply) = reply {
            // Superseded: the reply still belongs right after its own request.
            let position = state
                .history
                .iter()
                .skip(user_index)
                .position(|m| *m == user_message)
                .map_or(state.history.len(), |offset| user_index + offset + 1);
            tracing::debug!(%session_id, position, "superseded reply kept with its request");
            state.history.insert(position, reply.into_message());
        }
        drop(state);
        drop(active);

        result
    }

    /// Cancel the session in flight, if any. Idempotent.
    pub fn cancel(&self) {
        if let Some((_, handle)) = self.active().as_ref() {
            handle.cancel();
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.active().is_some()
    }

    // -----------------------------------------------------------------------
    // State between requests
    // -----------------------------------------------------------------------

    /// Reference an uploaded file in the next request.
    pub fn attach_file(&self, file: FileDescriptor) {
        self.state().uploads.push(file);
    }

    /// Add a module to the selection. Already-selected modules are ignored.
    pub fn select_module(&self, module: impl Into<String>) {
        let module = module.into();
        let mut state = self.state();
        if !state.selected_modules.contains(&module) {
            state.selected_modules.push(module);
        }
    }

    pub fn deselect_module(&self, module: &str) {
        self.state().selected_modules.retain(|m| m != module);
    }

    pub fn set_metadata(&self, key: impl Into<String>, value: impl Into<String>) {
        self.state().metadata.insert(key.into(), value.into());
    }

    pub fn set_thread(&self, thread_id: Option<String>) {
        self.state().thread_id = thread_id;
    }

    pub fn history(&self) -> Vec<Message> {
        self.state().history.clone()
    }

    /// Copy of the full conversation state.
    pub fn snapshot(&self) -> ConversationState {
        self.state().clone()
    }

    fn state(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn active(&self) -> MutexGuard<'_, Option<(Uuid, CancelHandle)>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Conversation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversation")
            .field("plugins", &self.plugins)
            .field("settings", &self.settings)
            .field("max_messages", &self.max_messages)
            .finish_non_exhaustive()
    }
}
