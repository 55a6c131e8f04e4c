use serde_json::{Map, Value};

use super::grade::{parse_grade_value, GradeValue};
use super::profile::StageProfile;
use super::CalcError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonthlyGrades {
    pub oct: GradeValue,
    pub nov: GradeValue,
    pub dec: GradeValue,
    pub jan: GradeValue,
    pub feb: GradeValue,
    pub mar: GradeValue,
    pub apr: GradeValue,
}

/// `Standard` and `Ministerial` input. Ministerial classes never carry the
/// two exam fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TermRecord {
    pub term1: GradeValue,
    pub mid_year: GradeValue,
    pub term2: GradeValue,
    pub final_exam: GradeValue,
    pub second_attempt_exam: GradeValue,
}

/// `Primary5` / `Primary6` input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonthlyRecord {
    pub months: MonthlyGrades,
    pub mid_year: GradeValue,
    pub final_exam: GradeValue,
    pub second_attempt_exam: GradeValue,
}

/// `Primary1to4` input on the 0..=10 scale. Range-checked on entry; nothing
/// is derived from it.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LowerPrimaryRecord {
    pub first_semester: GradeValue,
    pub second_semester: GradeValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectGradeRecord {
    Term(TermRecord),
    Monthly(MonthlyRecord),
    LowerPrimary(LowerPrimaryRecord),
}

impl SubjectGradeRecord {
    pub fn mid_year(&self) -> GradeValue {
        match self {
            SubjectGradeRecord::Term(r) => r.mid_year,
            SubjectGradeRecord::Monthly(r) => r.mid_year,
            SubjectGradeRecord::LowerPrimary(_) => GradeValue::NotSet,
        }
    }

    pub fn final_exam(&self) -> GradeValue {
        match self {
            SubjectGradeRecord::Term(r) => r.final_exam,
            SubjectGradeRecord::Monthly(r) => r.final_exam,
            SubjectGradeRecord::LowerPrimary(_) => GradeValue::NotSet,
        }
    }

    pub fn second_attempt_exam(&self) -> GradeValue {
        match self {
            SubjectGradeRecord::Term(r) => r.second_attempt_exam,
            SubjectGradeRecord::Monthly(r) => r.second_attempt_exam,
            SubjectGradeRecord::LowerPrimary(_) => GradeValue::NotSet,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectInput {
    pub subject_id: String,
    pub record: SubjectGradeRecord,
}

/// Raw field names accepted for a profile, in wire spelling.
pub fn record_fields(profile: StageProfile) -> &'static [&'static str] {
    match profile {
        StageProfile::Standard => &["term1", "midYear", "term2", "finalExam", "secondAttemptExam"],
        StageProfile::Ministerial => &["term1", "midYear", "term2"],
        StageProfile::Primary5 | StageProfile::Primary6 => &[
            "oct",
            "nov",
            "dec",
            "jan",
            "feb",
            "mar",
            "apr",
            "midYear",
            "finalExam",
            "secondAttemptExam",
        ],
        StageProfile::Primary1to4 => &["firstSemester", "secondSemester"],
    }
}

fn grade_field(
    obj: &Map<String, Value>,
    key: &str,
    profile: StageProfile,
    subject_id: &str,
) -> Result<GradeValue, CalcError> {
    let Some(raw) = obj.get(key) else {
        return Ok(GradeValue::NotSet);
    };
    let value = parse_grade_value(raw).map_err(|msg| {
        CalcError::new("bad_params", format!("{}.{}: {}", subject_id, key, msg))
    })?;
    if let GradeValue::Real(n) = value {
        let range = profile.grade_range();
        if !range.contains(&n) {
            return Err(CalcError::new(
                "bad_params",
                format!(
                    "{}.{} must be in {}..={}",
                    subject_id,
                    key,
                    range.start(),
                    range.end()
                ),
            ));
        }
    }
    Ok(value)
}

pub fn parse_subject_record(
    profile: StageProfile,
    subject_id: &str,
    raw: &Value,
) -> Result<SubjectGradeRecord, CalcError> {
    let Some(obj) = raw.as_object() else {
        return Err(CalcError::new(
            "bad_params",
            format!("{}.grades must be an object", subject_id),
        ));
    };
    let allowed = record_fields(profile);
    for k in obj.keys() {
        if !allowed.contains(&k.as_str()) {
            return Err(CalcError::new(
                "bad_params",
                format!(
                    "{}.{} is not a {} grade field",
                    subject_id,
                    k,
                    profile.as_str()
                ),
            ));
        }
    }
    let g = |key: &str| grade_field(obj, key, profile, subject_id);

    let record = match profile {
        StageProfile::Standard | StageProfile::Ministerial => {
            SubjectGradeRecord::Term(TermRecord {
                term1: g("term1")?,
                mid_year: g("midYear")?,
                term2: g("term2")?,
                final_exam: g("finalExam")?,
                second_attempt_exam: g("secondAttemptExam")?,
            })
        }
        StageProfile::Primary5 | StageProfile::Primary6 => {
            SubjectGradeRecord::Monthly(MonthlyRecord {
                months: MonthlyGrades {
                    oct: g("oct")?,
                    nov: g("nov")?,
                    dec: g("dec")?,
                    jan: g("jan")?,
                    feb: g("feb")?,
                    mar: g("mar")?,
                    apr: g("apr")?,
                },
                mid_year: g("midYear")?,
                final_exam: g("finalExam")?,
                second_attempt_exam: g("secondAttemptExam")?,
            })
        }
        StageProfile::Primary1to4 => SubjectGradeRecord::LowerPrimary(LowerPrimaryRecord {
            first_semester: g("firstSemester")?,
            second_semester: g("secondSemester")?,
        }),
    };
    Ok(record)
}

/// Parses `[{ subjectId, grades: {...} }, ...]`, keeping declared order.
pub fn parse_subjects(profile: StageProfile, raw: &Value) -> Result<Vec<SubjectInput>, CalcError> {
    let Some(items) = raw.as_array() else {
        return Err(CalcError::new("bad_params", "subjects must be an array"));
    };
    let mut out: Vec<SubjectInput> = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let Some(subject_id) = item
            .get("subjectId")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else {
            return Err(CalcError::new(
                "bad_params",
                format!("subjects[{}].subjectId must be a non-empty string", i),
            ));
        };
        if out.iter().any(|s| s.subject_id == subject_id) {
            return Err(CalcError::new(
                "bad_params",
                format!("duplicate subjectId: {}", subject_id),
            ));
        }
        let empty = Value::Object(Map::new());
        let grades = item.get("grades").unwrap_or(&empty);
        let record = parse_subject_record(profile, subject_id, grades)?;
        out.push(SubjectInput {
            subject_id: subject_id.to_string(),
            record,
        });
    }
    Ok(out)
}
