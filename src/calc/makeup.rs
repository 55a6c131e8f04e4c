use super::grade::{rounded_mean, GradeValue};
use super::status::StatusLabel;

/// Second-attempt final grade. Decision points are not reapplied here.
pub fn second_attempt_grade(pursuit: GradeValue, exam: GradeValue) -> GradeValue {
    match exam {
        GradeValue::Real(_) => rounded_mean([pursuit, exam]),
        GradeValue::Absent => GradeValue::Absent,
        GradeValue::Waived => GradeValue::Waived,
        GradeValue::NotSet => GradeValue::NotSet,
    }
}

/// Outcome of the makeup round, once every makeup subject is resolved.
/// A waived or unentered makeup exam keeps the round open.
pub fn second_round_status(makeup_grades: &[GradeValue]) -> Option<StatusLabel> {
    if makeup_grades.is_empty() {
        return None;
    }
    let resolved = makeup_grades
        .iter()
        .all(|g| matches!(g, GradeValue::Real(_) | GradeValue::Absent));
    if !resolved {
        return None;
    }
    if makeup_grades.iter().all(|g| g.is_passing()) {
        Some(StatusLabel::Pass)
    } else {
        Some(StatusLabel::Fail)
    }
}
