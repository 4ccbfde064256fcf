//! Caller profile: free-form, untrusted attributes about the end user.
//!
//! The profile is never validated against a schema. Each recognised field
//! is looked up by its wire name and treated as *present* only when it
//! carries a meaningful value: a non-empty string, `true`, a non-zero
//! number, or a non-empty array/object. Everything else counts as absent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire names of the profile fields the pipeline understands.
pub mod fields {
    pub const NAME: &str = "name";
    pub const UNIVERSITY: &str = "university";
    pub const CURRENT_YEAR: &str = "currentYear";
    pub const MAJOR: &str = "major";
    pub const COURSES: &str = "courses";
    pub const GRADUATE_SCHOOL: &str = "graduateSchool";
    pub const WORK: &str = "work";
}

/// A caller-supplied profile, kept as the raw JSON object it arrived as.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile(Map<String, Value>);

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter, mostly useful in tests and the CLI.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Raw access to a field, present or not.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether the field is present and meaningful.
    pub fn flag(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(is_truthy)
    }

    /// The field rendered as display text, if present.
    pub fn text(&self, key: &str) -> Option<String> {
        self.0.get(key).filter(|v| is_truthy(v)).map(render)
    }

    pub fn name(&self) -> Option<String> {
        self.text(fields::NAME)
    }

    pub fn university(&self) -> Option<String> {
        self.text(fields::UNIVERSITY)
    }

    pub fn current_year(&self) -> Option<String> {
        self.text(fields::CURRENT_YEAR)
    }

    pub fn major(&self) -> Option<String> {
        self.text(fields::MAJOR)
    }

    pub fn courses(&self) -> Option<String> {
        self.text(fields::COURSES)
    }

    pub fn plans_graduate_school(&self) -> bool {
        self.flag(fields::GRADUATE_SCHOOL)
    }

    pub fn plans_to_work(&self) -> bool {
        self.flag(fields::WORK)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Profile {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}
