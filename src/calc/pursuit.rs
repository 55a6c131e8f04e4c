use super::grade::{rounded_mean, GradeValue};
use super::profile::StageProfile;
use super::terms::TermGrades;

/// Annual pursuit: the rounded mean of whichever of term 1, mid-year and
/// term 2 are present. Not computed when none are, and never for the
/// lower primary stages.
pub fn annual_pursuit(profile: StageProfile, terms: &TermGrades, mid_year: GradeValue) -> GradeValue {
    if profile == StageProfile::Primary1to4 {
        return GradeValue::NotSet;
    }
    rounded_mean([terms.term1, mid_year, terms.term2])
}
