use serde::Serialize;

use super::grade::{GradeValue, PASS_MARK};
use super::profile::StageProfile;

/// Overall result label. Promotion stages use `Pass | Supplementary | Fail`,
/// ministerial stages `Qualified | QualifiedByDecision | NotQualified`.
/// `NotApplicable` and `Incomplete` mark "no status computed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusLabel {
    Pass,
    Supplementary,
    Fail,
    Qualified,
    QualifiedByDecision,
    NotQualified,
    NotApplicable,
    Incomplete,
}

impl StatusLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusLabel::Pass => "pass",
            StatusLabel::Supplementary => "supplementary",
            StatusLabel::Fail => "fail",
            StatusLabel::Qualified => "qualified",
            StatusLabel::QualifiedByDecision => "qualifiedByDecision",
            StatusLabel::NotQualified => "notQualified",
            StatusLabel::NotApplicable => "notApplicable",
            StatusLabel::Incomplete => "incomplete",
        }
    }
}

/// A subject's decisive grade after decision points.
#[derive(Debug, Clone, Copy)]
pub struct SubjectOutcome<'a> {
    pub subject_id: &'a str,
    pub grade: GradeValue,
    pub exempt: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: StatusLabel,
    pub failing: Vec<String>,
    pub pending: Vec<String>,
}

fn split_outcomes(outcomes: &[SubjectOutcome<'_>]) -> (Vec<String>, Vec<String>) {
    let mut failing = Vec::new();
    let mut pending = Vec::new();
    for o in outcomes {
        if o.exempt {
            continue;
        }
        match o.grade {
            GradeValue::Real(g) if g < PASS_MARK => failing.push(o.subject_id.to_string()),
            GradeValue::Absent => failing.push(o.subject_id.to_string()),
            GradeValue::NotSet => pending.push(o.subject_id.to_string()),
            GradeValue::Real(_) | GradeValue::Waived => {}
        }
    }
    (failing, pending)
}

pub fn classify(
    profile: StageProfile,
    outcomes: &[SubjectOutcome<'_>],
    allowance: u32,
    decision_points_spent: u32,
) -> Classification {
    if profile == StageProfile::Primary1to4 {
        return Classification {
            status: StatusLabel::NotApplicable,
            failing: Vec::new(),
            pending: Vec::new(),
        };
    }

    let (failing, pending) = split_outcomes(outcomes);
    let status = if profile == StageProfile::Ministerial {
        if !failing.is_empty() {
            StatusLabel::NotQualified
        } else if !pending.is_empty() || outcomes.is_empty() {
            StatusLabel::Incomplete
        } else if decision_points_spent > 0 {
            StatusLabel::QualifiedByDecision
        } else {
            StatusLabel::Qualified
        }
    } else if failing.len() > allowance as usize {
        // Pending subjects cannot rescue a student already over the allowance.
        StatusLabel::Fail
    } else if !pending.is_empty() || outcomes.is_empty() {
        StatusLabel::Incomplete
    } else if failing.is_empty() {
        StatusLabel::Pass
    } else {
        StatusLabel::Supplementary
    };

    Classification {
        status,
        failing,
        pending,
    }
}
