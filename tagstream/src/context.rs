// Copyright 2026 The Tagstream Project
// SPDX-License-Identifier: Apache-2.0

// Context builder
//
// Assembles the request context handed to the transport when a request
// is issued. Pure: reads conversation state, performs no I/O.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::message::{FileDescriptor, Message};

/// Conversation state read by the context builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    pub thread_id: Option<String>,
    pub history: Vec<Message>,
    pub metadata: BTreeMap<String, String>,
    pub selected_modules: Vec<String>,
    /// Files uploaded since the last completed request.
    pub uploads: Vec<FileDescriptor>,
}

/// Everything the transport needs to issue one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestContext {
    pub thread_id: Option<String>,
    pub messages: Vec<Message>,
    pub metadata: BTreeMap<String, String>,
    pub selected_modules: Vec<String>,
    pub files: Vec<FileDescriptor>,
}

/// Builds a `RequestContext` from conversation state.
#[derive(Debug, Clone, Copy)]
pub struct ContextBuilder<'a> {
    state: &'a ConversationState,
    max_messages: Option<usize>,
}

impl<'a> ContextBuilder<'a> {
    pub fn new(state: &'a ConversationState) -> Self {
        Self {
            state,
            max_messages: None,
        }
    }

    /// Keep only the most recent `max` history messages.
    pub fn with_max_messages(mut self, max: Option<usize>) -> Self {
        self.max_messages = max;
        self
    }

    pub fn build(&self) -> RequestContext {
        let history = &self.state.history;
        let skip = match self.max_messages {
            Some(max) => history.len().saturating_sub(max),
            None => 0,
        };

        RequestContext {
            thread_id: self.state.thread_id.clone(),
            messages: history[skip..].to_vec(),
            metadata: self.state.metadata.clone(),
            selected_modules: self.state.selected_modules.clone(),
            files: self.state.uploads.clone(),
        }
    }
}
