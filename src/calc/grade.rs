use serde::{Serialize, Serializer};
use serde_json::Value;

/// Minimum passing grade on the 0..=100 scale.
pub const PASS_MARK: i32 = 50;

/// One grade cell, raw or derived.
///
/// `NotSet` means "nothing entered" for raw cells and "not computed" for
/// derived ones. Only `Real` values ever take part in arithmetic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GradeValue {
    Real(i32),
    Absent,
    Waived,
    #[default]
    NotSet,
}

impl GradeValue {
    pub fn is_passing(self) -> bool {
        matches!(self, GradeValue::Real(v) if v >= PASS_MARK)
    }
}

impl Serialize for GradeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            GradeValue::Real(v) => serializer.serialize_i32(*v),
            GradeValue::Absent => serializer.serialize_str("absent"),
            GradeValue::Waived => serializer.serialize_str("waived"),
            GradeValue::NotSet => serializer.serialize_none(),
        }
    }
}

/// Wire form accepted from collaborators: integer, `"absent"`, `"waived"`,
/// `null`, or the legacy numeric codes `-1` (absent) and `-2` (waived).
pub fn parse_grade_value(raw: &Value) -> Result<GradeValue, String> {
    if raw.is_null() {
        return Ok(GradeValue::NotSet);
    }
    if let Some(s) = raw.as_str() {
        let t = s.trim();
        return if t.is_empty() {
            Ok(GradeValue::NotSet)
        } else if t.eq_ignore_ascii_case("absent") {
            Ok(GradeValue::Absent)
        } else if t.eq_ignore_ascii_case("waived") {
            Ok(GradeValue::Waived)
        } else {
            Err(format!("unknown grade code: {}", t))
        };
    }
    let Some(n) = raw.as_i64() else {
        return Err("grade must be an integer, \"absent\", \"waived\" or null".into());
    };
    match n {
        -1 => Ok(GradeValue::Absent),
        -2 => Ok(GradeValue::Waived),
        n => i32::try_from(n)
            .map(GradeValue::Real)
            .map_err(|_| format!("grade out of range: {}", n)),
    }
}

/// `floor(sum / count + 0.5)` in integer arithmetic. `count` must be positive.
pub fn round_half_up(sum: i64, count: i64) -> i32 {
    (2 * sum + count).div_euclid(2 * count) as i32
}

/// Rounded arithmetic mean of the `Real` values, skipping sentinels and unset
/// cells. Returns `NotSet` when nothing contributes.
pub fn rounded_mean<I>(values: I) -> GradeValue
where
    I: IntoIterator<Item = GradeValue>,
{
    let mut sum: i64 = 0;
    let mut count: i64 = 0;
    for v in values {
        if let GradeValue::Real(n) = v {
            sum += i64::from(n);
            count += 1;
        }
    }
    if count == 0 {
        return GradeValue::NotSet;
    }
    GradeValue::Real(round_half_up(sum, count))
}
