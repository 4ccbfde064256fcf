//! The request pipeline: everything between an inbound chat request and
//! the backend call.
//!
//! For each request the pipeline runs, in order:
//!
//! 1. **Classify** the query (and profile) into a [`ContextLabel`]
//! 2. **Synthesize** a system instruction for that context and profile
//! 3. **Select** generation parameters (direct mode only)
//! 4. **Format** a message list or a retrieval query
//! 5. **Produce** the answer through the injected [`AnswerProducer`]
//!
//! Any failure along the way is returned to the caller as data
//! ([`ChatOutcome::Failed`]), never as a transport error.
//!
//! [`ContextLabel`]: compass_core::ContextLabel

pub mod classifier;
pub mod formatter;
pub mod index_cell;
pub mod orchestrator;
pub mod params;
pub mod producer;
pub mod prompt;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use classifier::{ContextScore, classify, score};
pub use formatter::FormattedRequest;
pub use index_cell::{IndexCell, IndexState};
pub use orchestrator::{ChatOutcome, ChatTurn, Orchestrator, RequestPlan, build_from_config};
pub use params::select;
pub use producer::{AnswerProducer, DirectChatProducer, RetrievalProducer};
pub use prompt::synthesize;
