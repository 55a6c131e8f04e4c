use super::grade::{rounded_mean, GradeValue};
use super::record::{MonthlyGrades, SubjectGradeRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TermGrades {
    pub term1: GradeValue,
    pub term2: GradeValue,
}

/// First term is October..January, second term February..April.
pub fn aggregate_monthly(m: &MonthlyGrades) -> TermGrades {
    TermGrades {
        term1: rounded_mean([m.oct, m.nov, m.dec, m.jan]),
        term2: rounded_mean([m.feb, m.mar, m.apr]),
    }
}

/// Term-level grades for any record shape. Term records pass straight
/// through; lower-primary records have no terms.
pub fn term_grades(record: &SubjectGradeRecord) -> TermGrades {
    match record {
        SubjectGradeRecord::Term(r) => TermGrades {
            term1: r.term1,
            term2: r.term2,
        },
        SubjectGradeRecord::Monthly(r) => aggregate_monthly(&r.months),
        SubjectGradeRecord::LowerPrimary(_) => TermGrades::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::record::TermRecord;
    use crate::calc::grade::GradeValue::*;

    #[test]
    fn missing_month_is_excluded_not_zeroed() {
        let t = aggregate_monthly(&MonthlyGrades {
            oct: Real(60),
            nov: Real(70),
            dec: NotSet,
            jan: Real(80),
            ..MonthlyGrades::default()
        });
        assert_eq!(t.term1, Real(70));
        assert_eq!(t.term2, NotSet);
    }

    #[test]
    fn sentinel_months_are_skipped() {
        let t = aggregate_monthly(&MonthlyGrades {
            feb: Absent,
            mar: Real(55),
            apr: Waived,
            ..MonthlyGrades::default()
        });
        assert_eq!(t.term2, Real(55));
    }

    #[test]
    fn rounds_half_up() {
        let t = aggregate_monthly(&MonthlyGrades {
            feb: Real(50),
            mar: Real(51),
            ..MonthlyGrades::default()
        });
        assert_eq!(t.term2, Real(51));
    }

    #[test]
    fn term_records_pass_through() {
        let r = SubjectGradeRecord::Term(TermRecord {
            term1: Absent,
            term2: Real(70),
            ..TermRecord::default()
        });
        assert_eq!(
            term_grades(&r),
            TermGrades {
                term1: Absent,
                term2: Real(70)
            }
        );
    }
}
