use serde::Serialize;
use std::collections::BTreeMap;

use super::engine::{compute_for_profile, StudentComputation};
use super::policy::{PolicyOverride, SchoolPolicy};
use super::profile::{StageProfile, StageProfiles};
use super::record::SubjectInput;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentInput {
    pub student_id: String,
    pub subjects: Vec<SubjectInput>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentOutcome {
    pub student_id: String,
    #[serde(flatten)]
    pub computation: StudentComputation,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassComputation {
    pub profile: StageProfile,
    pub students: Vec<StudentOutcome>,
    pub status_counts: BTreeMap<&'static str, usize>,
    pub decision_points_spent: u32,
}

/// One class shares a stage, a policy and an override; each student still
/// gets the full budget.
pub fn compute_class(
    students: &[StudentInput],
    stage: &str,
    profiles: &StageProfiles,
    policy: &SchoolPolicy,
    overrides: Option<&PolicyOverride>,
) -> ClassComputation {
    let profile = profiles.resolve(stage);
    let effective = policy.effective(profile, overrides);

    let mut status_counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut decision_points_spent = 0_u32;
    let mut out: Vec<StudentOutcome> = Vec::with_capacity(students.len());
    for s in students {
        let computation = compute_for_profile(profile, &s.subjects, &effective);
        *status_counts
            .entry(computation.result.status.as_str())
            .or_insert(0) += 1;
        decision_points_spent += computation.result.decision_points_spent;
        out.push(StudentOutcome {
            student_id: s.student_id.clone(),
            computation,
        });
    }

    ClassComputation {
        profile,
        students: out,
        status_counts,
        decision_points_spent,
    }
}
