//! # Compass Core
//!
//! Domain types, traits, and error definitions for the Compass chat
//! orchestrator. This crate has **no framework dependencies**: it defines
//! the vocabulary every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Every backend the orchestrator talks to is defined as a trait here.
//! Implementations live in their respective crates. This enables:
//! - Swapping the generation backend via configuration
//! - Testing the pipeline with mock providers and mock index loaders
//! - A clean dependency graph (all crates depend inward on core)

pub mod context;
pub mod error;
pub mod message;
pub mod profile;
pub mod provider;
pub mod retrieval;

// Re-export key types at crate root for ergonomics
pub use context::{ContextLabel, DeploymentMode, GenerationConfig};
pub use error::{Error, IndexError, ProviderError, Result};
pub use message::{Message, Role};
pub use profile::Profile;
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use retrieval::{IndexLoader, RetrievalIndex};
