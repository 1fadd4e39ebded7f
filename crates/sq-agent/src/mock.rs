//! Scripted test doubles for the oracle and classifier seams.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use sq_evidence::FieldCatalog;
use sq_protocol::{Classification, Turn};

use crate::classifier::IntentClassifier;
use crate::error::OracleError;
use crate::oracle::AnswerOracle;

/// Replays canned replies in order and records every request.
/// Fails with `OracleError::Transport` once the script runs out.
#[derive(Default)]
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<Vec<Turn>>>,
}

impl ScriptedOracle {
    pub fn new<S: Into<String>>(replies: impl IntoIterator<Item = S>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of requests received so far.
    pub fn calls(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Conversation sent with the `n`th request (0-based); empty if none.
    pub fn request(&self, n: usize) -> Vec<Turn> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(n)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl AnswerOracle for ScriptedOracle {
    async fn respond(
        &self,
        _system_prompt: &str,
        conversation: &[Turn],
    ) -> Result<String, OracleError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(conversation.to_vec());
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| OracleError::Transport("scripted oracle exhausted".into()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Returns the same classification for every question.
pub struct FixedClassifier(pub Classification);

#[async_trait]
impl IntentClassifier for FixedClassifier {
    async fn classify(&self, question: &str, _catalog: &FieldCatalog) -> Classification {
        let mut classification = self.0.clone();
        if classification.error.is_some() && classification.original_query.is_none() {
            classification.original_query = Some(question.to_string());
        }
        classification
    }
}
