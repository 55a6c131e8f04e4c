//! Student result computation.
//!
//! Pipeline, leaves first: stage profile → term aggregation → annual pursuit
//! → exemption → decision points → makeup → status. Every stage is a pure
//! function of the previous stage's output.

use serde::Serialize;

pub mod class;
pub mod decision;
pub mod engine;
pub mod exemption;
pub mod fingerprint;
pub mod grade;
pub mod makeup;
pub mod policy;
pub mod profile;
pub mod pursuit;
pub mod record;
pub mod status;
pub mod terms;

pub use class::{compute_class, StudentInput};
pub use engine::compute_student_result;
pub use policy::{PolicyOverride, SchoolPolicy};
pub use profile::{StageProfile, StageProfiles};
pub use record::parse_subjects;

#[derive(Debug, Clone, Serialize)]
pub struct CalcError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl CalcError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}
