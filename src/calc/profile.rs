use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::RangeInclusive;

use super::CalcError;

/// Curriculum category of a stage. Fixes which raw fields exist and which
/// derived fields are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StageProfile {
    Primary1to4,
    Primary5,
    Primary6,
    Ministerial,
    Standard,
}

impl StageProfile {
    pub fn as_str(self) -> &'static str {
        match self {
            StageProfile::Primary1to4 => "primary1to4",
            StageProfile::Primary5 => "primary5",
            StageProfile::Primary6 => "primary6",
            StageProfile::Ministerial => "ministerial",
            StageProfile::Standard => "standard",
        }
    }

    pub fn grade_range(self) -> RangeInclusive<i32> {
        match self {
            StageProfile::Primary1to4 => 0..=10,
            _ => 0..=100,
        }
    }
}

/// Stage-name membership lists; the single source of truth for profile
/// resolution. Stages not listed anywhere resolve to `Standard`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StageProfiles {
    pub primary1to4: Vec<String>,
    pub primary5: Vec<String>,
    pub primary6: Vec<String>,
    pub ministerial: Vec<String>,
}

impl Default for StageProfiles {
    fn default() -> Self {
        let names = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            primary1to4: names(&[
                "الأول الابتدائي",
                "الثاني الابتدائي",
                "الثالث الابتدائي",
                "الرابع الابتدائي",
            ]),
            primary5: names(&["الخامس الابتدائي"]),
            // The 6th-primary stage is listed here only, not under ministerial.
            primary6: names(&["السادس الابتدائي"]),
            ministerial: names(&[
                "الثالث المتوسط",
                "السادس الإعدادي",
                "السادس العلمي",
                "السادس الأدبي",
            ]),
        }
    }
}

impl StageProfiles {
    fn lists(&self) -> [(StageProfile, &Vec<String>); 4] {
        [
            (StageProfile::Primary1to4, &self.primary1to4),
            (StageProfile::Primary5, &self.primary5),
            (StageProfile::Primary6, &self.primary6),
            (StageProfile::Ministerial, &self.ministerial),
        ]
    }

    pub fn resolve(&self, stage: &str) -> StageProfile {
        let key = normalize_stage_name(stage);
        if key.is_empty() {
            return StageProfile::Standard;
        }
        for (profile, names) in self.lists() {
            if names.iter().any(|n| normalize_stage_name(n) == key) {
                return profile;
            }
        }
        StageProfile::Standard
    }

    /// Rejects a stage name claimed by two profiles.
    pub fn validate(&self) -> Result<(), CalcError> {
        let mut seen: HashMap<String, StageProfile> = HashMap::new();
        for (profile, names) in self.lists() {
            for name in names {
                let key = normalize_stage_name(name);
                if key.is_empty() {
                    return Err(CalcError::new(
                        "bad_params",
                        format!("empty stage name under {}", profile.as_str()),
                    ));
                }
                if let Some(prev) = seen.insert(key, profile) {
                    if prev != profile {
                        return Err(CalcError::new(
                            "stage_conflict",
                            format!(
                                "stage '{}' is listed under both {} and {}",
                                name.trim(),
                                prev.as_str(),
                                profile.as_str()
                            ),
                        )
                        .with_details(serde_json::json!({
                            "stage": name.trim(),
                            "profiles": [prev.as_str(), profile.as_str()],
                        })));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Trims, collapses whitespace and folds the hamza/madda alef forms so that
/// "الاول" and "الأول" name the same stage.
pub fn normalize_stage_name(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .map(|c| match c {
            'أ' | 'إ' | 'آ' => 'ا',
            c => c,
        })
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_default_stage_lists() {
        let p = StageProfiles::default();
        assert_eq!(p.resolve("الثاني الابتدائي"), StageProfile::Primary1to4);
        assert_eq!(p.resolve("الخامس الابتدائي"), StageProfile::Primary5);
        assert_eq!(p.resolve("السادس الابتدائي"), StageProfile::Primary6);
        assert_eq!(p.resolve("الثالث المتوسط"), StageProfile::Ministerial);
        assert_eq!(p.resolve("الأول المتوسط"), StageProfile::Standard);
    }

    #[test]
    fn resolution_ignores_spacing_and_alef_forms() {
        let p = StageProfiles::default();
        assert_eq!(p.resolve("  الاول   الابتدائي "), StageProfile::Primary1to4);
        assert_eq!(p.resolve("السادس الاعدادي"), StageProfile::Ministerial);
    }

    #[test]
    fn unknown_and_empty_fall_back_to_standard() {
        let p = StageProfiles::default();
        assert_eq!(p.resolve("Grade 9"), StageProfile::Standard);
        assert_eq!(p.resolve("   "), StageProfile::Standard);
    }

    #[test]
    fn validate_rejects_stage_in_two_profiles() {
        let mut p = StageProfiles::default();
        p.ministerial.push("السادس الابتدائي".into());
        let e = p.validate().expect_err("conflict");
        assert_eq!(e.code, "stage_conflict");
        assert!(StageProfiles::default().validate().is_ok());
    }

    #[test]
    fn custom_lists_drive_resolution() {
        let p = StageProfiles {
            primary1to4: vec![],
            primary5: vec!["Year 5".into()],
            primary6: vec![],
            ministerial: vec!["Year 12".into()],
        };
        assert_eq!(p.resolve("year 5"), StageProfile::Primary5);
        assert_eq!(p.resolve("Year 12"), StageProfile::Ministerial);
        assert_eq!(p.resolve("الخامس الابتدائي"), StageProfile::Standard);
    }
}
