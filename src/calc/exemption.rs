use super::grade::{rounded_mean, GradeValue};
use super::profile::StageProfile;

/// Exemption from the final exam is a `Standard`-stage policy only.
pub fn is_exempt(profile: StageProfile, pursuit: GradeValue, threshold: Option<i32>) -> bool {
    if profile != StageProfile::Standard {
        return false;
    }
    match (pursuit, threshold) {
        (GradeValue::Real(p), Some(t)) => p >= t,
        _ => false,
    }
}

/// First-attempt final grade from pursuit and the final exam.
///
/// An exempt subject takes its pursuit as-is. Otherwise an absent exam
/// stays absent (and fails), a waived exam falls back to pursuit, and an
/// unentered exam leaves the grade pending.
pub fn first_attempt_grade(pursuit: GradeValue, final_exam: GradeValue, exempt: bool) -> GradeValue {
    if exempt {
        return pursuit;
    }
    match final_exam {
        GradeValue::Absent => GradeValue::Absent,
        GradeValue::Waived => match pursuit {
            GradeValue::Real(_) => pursuit,
            _ => GradeValue::Waived,
        },
        GradeValue::Real(_) => rounded_mean([pursuit, final_exam]),
        GradeValue::NotSet => GradeValue::NotSet,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::grade::GradeValue::*;

    #[test]
    fn threshold_applies_to_standard_only() {
        assert!(is_exempt(StageProfile::Standard, Real(85), Some(85)));
        assert!(!is_exempt(StageProfile::Standard, Real(84), Some(85)));
        assert!(!is_exempt(StageProfile::Primary5, Real(99), Some(85)));
        assert!(!is_exempt(StageProfile::Ministerial, Real(99), Some(85)));
    }

    #[test]
    fn no_pursuit_or_disabled_threshold_never_exempts() {
        assert!(!is_exempt(StageProfile::Standard, NotSet, Some(0)));
        assert!(!is_exempt(StageProfile::Standard, Real(100), None));
    }

    #[test]
    fn exempt_ignores_final_exam() {
        assert_eq!(first_attempt_grade(Real(90), Absent, true), Real(90));
        assert_eq!(first_attempt_grade(Real(90), Real(10), true), Real(90));
    }

    #[test]
    fn final_exam_cases() {
        assert_eq!(first_attempt_grade(Real(60), Real(41), false), Real(51));
        assert_eq!(first_attempt_grade(Real(60), Absent, false), Absent);
        assert_eq!(first_attempt_grade(Real(60), Waived, false), Real(60));
        assert_eq!(first_attempt_grade(NotSet, Waived, false), Waived);
        assert_eq!(first_attempt_grade(Real(60), NotSet, false), NotSet);
        assert_eq!(first_attempt_grade(NotSet, Real(47), false), Real(47));
    }
}
