//! Context classifier: weighted keyword scoring over the query and profile.
//!
//! Each keyword contributes at most one point regardless of how often it
//! appears, and matching is by substring on the lower-cased query. Profile
//! bonuses are added on top. The higher score wins; a tie, including 0–0,
//! is `Default`.

use compass_core::{ContextLabel, Profile};
use serde::Serialize;

pub const ACADEMIC_KEYWORDS: &[&str] = &[
    "university",
    "homework",
    "assignment",
    "study",
    "research",
    "thesis",
    "paper",
    "exam",
    "class",
    "course",
    "professor",
    "student",
];

pub const PROFESSIONAL_KEYWORDS: &[&str] = &[
    "work",
    "business",
    "client",
    "meeting",
    "project",
    "company",
    "team",
    "manager",
    "report",
    "presentation",
    "deadline",
];

/// Class-standing values that mark the caller as an enrolled student.
pub const CLASS_STANDINGS: &[&str] = &["Freshman", "Sophomore", "Junior", "Senior"];

const STUDENT_BONUS: u32 = 2;
const GRADUATE_SCHOOL_BONUS: u32 = 1;
const WORK_BONUS: u32 = 1;

/// Per-context scores behind a classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContextScore {
    pub academic: u32,
    pub professional: u32,
}

impl ContextScore {
    /// Resolve the scores to a label. Ties go to `Default`.
    pub fn label(&self) -> ContextLabel {
        use std::cmp::Ordering;

        match self.academic.cmp(&self.professional) {
            Ordering::Greater => ContextLabel::Academic,
            Ordering::Less => ContextLabel::Professional,
            Ordering::Equal => ContextLabel::Default,
        }
    }
}

fn keyword_hits(query_lower: &str, keywords: &[&str]) -> u32 {
    keywords.iter().filter(|k| query_lower.contains(*k)).count() as u32
}

/// Score a query and optional profile against both keyword sets.
pub fn score(query: &str, profile: Option<&Profile>) -> ContextScore {
    let query_lower = query.to_lowercase();
    let mut score = ContextScore {
        academic: keyword_hits(&query_lower, ACADEMIC_KEYWORDS),
        professional: keyword_hits(&query_lower, PROFESSIONAL_KEYWORDS),
    };

    if let Some(profile) = profile {
        let enrolled = profile.university().is_some()
            || profile.courses().is_some()
            || profile
                .current_year()
                .is_some_and(|year| CLASS_STANDINGS.contains(&year.as_str()));

        if enrolled {
            score.academic += STUDENT_BONUS;
        }
        if profile.plans_graduate_school() {
            score.academic += GRADUATE_SCHOOL_BONUS;
        }
        if profile.plans_to_work() {
            score.professional += WORK_BONUS;
        }
    }

    score
}

/// Classify a query into a usage context.
pub fn classify(query: &str, profile: Option<&Profile>) -> ContextLabel {
    score(query, profile).label()
}
