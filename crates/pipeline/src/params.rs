//! Generation parameters per context.

use compass_core::{ContextLabel, GenerationConfig};

/// Pick sampling parameters for a context.
///
/// Academic requests run cooler with a longer budget; professional ones
/// keep the default temperature with a shorter budget.
pub fn select(label: ContextLabel) -> GenerationConfig {
    let base = GenerationConfig::default();
    match label {
        ContextLabel::Default => base,
        ContextLabel::Academic => GenerationConfig {
            temperature: 0.6,
            max_tokens: 2500,
            ..base
        },
        ContextLabel::Professional => GenerationConfig {
            temperature: 0.7,
            max_tokens: 1500,
            ..base
        },
    }
}
