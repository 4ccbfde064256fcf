//! Request formatting: turns a classified turn into what the backend eats.

use compass_core::{DeploymentMode, GenerationConfig, Message};
use serde::Serialize;

pub const STEP_BY_STEP_SUFFIX: &str = "\n\nPlease think about this step-by-step before answering.";

const LONG_QUERY_WORDS: usize = 20;

/// A fully prepared backend request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum FormattedRequest {
    /// An ordered chat transcript plus sampling parameters.
    Direct {
        model: String,
        messages: Vec<Message>,
        generation: GenerationConfig,
    },
    /// The raw query for the retrieval index. The index owns its own
    /// generation parameters.
    Retrieval {
        query: String,
        system_instruction: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        model_override: Option<String>,
    },
}

impl FormattedRequest {
    pub fn mode(&self) -> DeploymentMode {
        match self {
            Self::Direct { .. } => DeploymentMode::Direct,
            Self::Retrieval { .. } => DeploymentMode::Retrieval,
        }
    }
}

/// Whether a query looks complex enough to ask for explicit reasoning.
/// Runs on the query as the caller wrote it.
pub fn needs_step_by_step(query: &str) -> bool {
    query.split_whitespace().count() > LONG_QUERY_WORDS || query.contains('?')
}

/// The user turn, with the step-by-step nudge when warranted.
pub fn user_prompt(query: &str) -> String {
    if needs_step_by_step(query) {
        format!("{query}{STEP_BY_STEP_SUFFIX}")
    } else {
        query.to_string()
    }
}

/// `[system, ...history, user]`. History is copied verbatim.
pub fn direct(
    instruction: String,
    history: &[Message],
    query: &str,
    model: String,
    generation: GenerationConfig,
) -> FormattedRequest {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(instruction));
    messages.extend(history.iter().cloned());
    messages.push(Message::user(user_prompt(query)));

    FormattedRequest::Direct {
        model,
        messages,
        generation,
    }
}

/// Retrieval requests carry the query untouched; the index does its own
/// prompt assembly around the retrieved context.
pub fn retrieval(
    instruction: String,
    query: &str,
    model_override: Option<String>,
) -> FormattedRequest {
    FormattedRequest::Retrieval {
        query: query.to_string(),
        system_instruction: instruction,
        model_override,
    }
}
