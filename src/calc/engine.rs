use serde::Serialize;

use super::decision::{allocate, Candidate};
use super::exemption::{first_attempt_grade, is_exempt};
use super::grade::GradeValue;
use super::makeup::{second_attempt_grade, second_round_status};
use super::policy::{EffectivePolicy, PolicyOverride, SchoolPolicy};
use super::profile::{StageProfile, StageProfiles};
use super::pursuit::annual_pursuit;
use super::record::SubjectInput;
use super::status::{classify, StatusLabel, SubjectOutcome};
use super::terms::term_grades;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedGrade {
    pub term1: GradeValue,
    pub term2: GradeValue,
    pub annual_pursuit: GradeValue,
    pub final_grade_1st: GradeValue,
    /// For ministerial stages this is the pursuit after decision points.
    pub final_grade_with_decision: GradeValue,
    pub decision_points_applied: u32,
    pub final_grade_2nd: GradeValue,
    pub is_exempt: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectResult {
    pub subject_id: String,
    #[serde(flatten)]
    pub grade: CalculatedGrade,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentResult {
    pub status: StatusLabel,
    pub failing_subjects: Vec<String>,
    pub pending_subjects: Vec<String>,
    pub decision_points_spent: u32,
    pub second_round_status: Option<StatusLabel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentComputation {
    pub profile: StageProfile,
    pub per_subject: Vec<SubjectResult>,
    pub result: StudentResult,
}

/// Resolves the stage, applies the class override and runs the pipeline.
pub fn compute_student_result(
    subjects: &[SubjectInput],
    stage: &str,
    profiles: &StageProfiles,
    policy: &SchoolPolicy,
    overrides: Option<&PolicyOverride>,
) -> StudentComputation {
    let profile = profiles.resolve(stage);
    let effective = policy.effective(profile, overrides);
    compute_for_profile(profile, subjects, &effective)
}

pub fn compute_for_profile(
    profile: StageProfile,
    subjects: &[SubjectInput],
    policy: &EffectivePolicy,
) -> StudentComputation {
    let mut grades: Vec<CalculatedGrade> = Vec::with_capacity(subjects.len());
    let mut candidates: Vec<Candidate> = Vec::with_capacity(subjects.len());

    for s in subjects {
        let terms = term_grades(&s.record);
        let pursuit = annual_pursuit(profile, &terms, s.record.mid_year());
        let exempt = is_exempt(profile, pursuit, policy.exemption_threshold);
        let (final_1st, decisive) = match profile {
            StageProfile::Ministerial => (GradeValue::NotSet, pursuit),
            StageProfile::Primary1to4 => (GradeValue::NotSet, GradeValue::NotSet),
            _ => {
                let g = first_attempt_grade(pursuit, s.record.final_exam(), exempt);
                (g, g)
            }
        };
        let (term1, term2) = if profile == StageProfile::Primary1to4 {
            (GradeValue::NotSet, GradeValue::NotSet)
        } else {
            (terms.term1, terms.term2)
        };
        grades.push(CalculatedGrade {
            term1,
            term2,
            annual_pursuit: pursuit,
            final_grade_1st: final_1st,
            final_grade_with_decision: decisive,
            is_exempt: exempt,
            ..CalculatedGrade::default()
        });
        candidates.push(Candidate {
            grade: decisive,
            exempt,
        });
    }

    let budget = if profile == StageProfile::Primary1to4 {
        0
    } else {
        policy.budget
    };
    let plan = allocate(&candidates, budget, policy.near_miss_cap);
    for (g, a) in grades.iter_mut().zip(&plan.per_subject) {
        g.final_grade_with_decision = a.with_decision;
        g.decision_points_applied = a.points;
    }

    let outcomes: Vec<SubjectOutcome<'_>> = subjects
        .iter()
        .zip(&grades)
        .map(|(s, g)| SubjectOutcome {
            subject_id: &s.subject_id,
            grade: g.final_grade_with_decision,
            exempt: g.is_exempt,
        })
        .collect();
    let classification = classify(profile, &outcomes, policy.allowance, plan.spent);

    let mut second_round = None;
    if classification.status == StatusLabel::Supplementary {
        let mut makeup_grades = Vec::with_capacity(classification.failing.len());
        for (s, g) in subjects.iter().zip(grades.iter_mut()) {
            if !classification.failing.contains(&s.subject_id) {
                continue;
            }
            g.final_grade_2nd =
                second_attempt_grade(g.annual_pursuit, s.record.second_attempt_exam());
            makeup_grades.push(g.final_grade_2nd);
        }
        second_round = second_round_status(&makeup_grades);
    }

    let per_subject = subjects
        .iter()
        .zip(grades)
        .map(|(s, grade)| SubjectResult {
            subject_id: s.subject_id.clone(),
            grade,
        })
        .collect();

    StudentComputation {
        profile,
        per_subject,
        result: StudentResult {
            status: classification.status,
            failing_subjects: classification.failing,
            pending_subjects: classification.pending,
            decision_points_spent: plan.spent,
            second_round_status: second_round,
        },
    }
}
