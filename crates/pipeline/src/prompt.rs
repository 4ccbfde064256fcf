//! System instruction synthesis.
//!
//! Each context has a fixed base template. Every template tells the model
//! it may reason inside a `<think>…</think>` block before the final answer;
//! clients strip that block, so the tag must stay exactly as written.
//!
//! When the profile carries a name, a short personalization preamble is
//! placed ahead of the template, separated by a blank line.

use compass_core::{ContextLabel, Profile};

pub const DEFAULT_TEMPLATE: &str = "You are a friendly AI assistant. Provide clear, helpful, concise, and accurate responses.\n\
    Always format your responses in a readable way. If the question is unclear, ask for clarification.\n\
    When thinking about complex questions, use the <think> tag to show your thinking process, then provide a clean answer after.\n\
    Example:\n\
    <think>\n\
    Let me think through this step by step...\n\
    [Your reasoning process here]\n\
    </think>\n\
    [Your final clean answer here]";

pub const ACADEMIC_TEMPLATE: &str = "You are an academic assistant helping with educational queries.\n\
    Provide detailed explanations with references where appropriate. Break down complex concepts into\n\
    understandable parts. Use examples to illustrate points.\n\
    When thinking about complex academic questions, use the <think> tag to show your thinking process, then provide a clean answer after.\n\
    For mathematical or scientific content, explain the underlying principles.";

pub const PROFESSIONAL_TEMPLATE: &str = "You are a professional assistant helping with work-related queries.\n\
    Keep responses concise and focused on practical solutions. Prioritize actionable advice.\n\
    For business or technical questions, consider both short-term solutions and long-term implications.\n\
    When analyzing complex scenarios, use the <think> tag to outline considerations, then provide clear recommendations.";

/// The unpersonalized instruction for a context.
pub fn base_template(label: ContextLabel) -> &'static str {
    match label {
        ContextLabel::Default => DEFAULT_TEMPLATE,
        ContextLabel::Academic => ACADEMIC_TEMPLATE,
        ContextLabel::Professional => PROFESSIONAL_TEMPLATE,
    }
}

/// Build the personalization preamble, or `None` when the profile has no name.
///
/// Order is fixed: name, then institution / standing / major, then
/// courses, then graduate-school intent. Everything after the name is
/// only added for academic requests from a caller with an institution.
pub fn personalization(label: ContextLabel, profile: &Profile) -> Option<String> {
    let name = profile.name()?;
    let mut preamble = format!("The user you are assisting is {name}.");

    if label != ContextLabel::Academic {
        return Some(preamble);
    }
    let Some(university) = profile.university() else {
        return Some(preamble);
    };

    preamble.push_str(&format!(" They attend {university}"));
    if let Some(year) = profile.current_year() {
        preamble.push_str(&format!(" as a {year}"));
    }
    if let Some(major) = profile.major() {
        preamble.push_str(&format!(" studying {major}"));
    }
    preamble.push('.');

    if let Some(courses) = profile.courses() {
        preamble.push_str(&format!(" They have taken courses in: {courses}."));
    }
    if profile.plans_graduate_school() {
        preamble.push_str(" They are planning to apply to graduate school.");
    }

    Some(preamble)
}

/// Assemble the system instruction for one request.
pub fn synthesize(label: ContextLabel, profile: Option<&Profile>) -> String {
    let template = base_template(label);
    match profile.and_then(|p| personalization(label, p)) {
        Some(preamble) => format!("{preamble}\n\n{template}"),
        None => template.to_string(),
    }
}
