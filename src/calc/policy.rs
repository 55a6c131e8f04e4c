use serde::{Deserialize, Serialize};

use super::profile::StageProfile;

pub const DEFAULT_DECISION_POINT_BUDGET: u32 = 5;
pub const DEFAULT_SUPPLEMENTARY_ALLOWANCE: u32 = 2;
pub const DEFAULT_EXEMPTION_THRESHOLD: i32 = 85;
pub const DEFAULT_NEAR_MISS_CAP: u32 = 10;

/// School-wide grading policy. Missing fields take the defaults above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchoolPolicy {
    pub decision_point_budget: u32,
    pub supplementary_allowance: u32,
    /// `None` turns exemption off.
    pub exemption_threshold: Option<i32>,
    /// Largest shortfall below the pass mark a decision may cover.
    pub near_miss_cap: u32,
}

impl Default for SchoolPolicy {
    fn default() -> Self {
        Self {
            decision_point_budget: DEFAULT_DECISION_POINT_BUDGET,
            supplementary_allowance: DEFAULT_SUPPLEMENTARY_ALLOWANCE,
            exemption_threshold: Some(DEFAULT_EXEMPTION_THRESHOLD),
            near_miss_cap: DEFAULT_NEAR_MISS_CAP,
        }
    }
}

/// Per-class pair that replaces the school policy for ministerial classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyOverride {
    pub ministerial_decision_points: Option<u32>,
    pub ministerial_supplementary_subjects: Option<u32>,
}

/// Policy after the class override (if any) has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectivePolicy {
    pub budget: u32,
    pub allowance: u32,
    pub exemption_threshold: Option<i32>,
    pub near_miss_cap: u32,
}

impl SchoolPolicy {
    pub fn effective(
        &self,
        profile: StageProfile,
        overrides: Option<&PolicyOverride>,
    ) -> EffectivePolicy {
        let mut budget = self.decision_point_budget;
        let mut allowance = self.supplementary_allowance;
        if profile == StageProfile::Ministerial {
            if let Some(o) = overrides {
                budget = o.ministerial_decision_points.unwrap_or(budget);
                allowance = o.ministerial_supplementary_subjects.unwrap_or(allowance);
            }
        }
        EffectivePolicy {
            budget,
            allowance,
            exemption_threshold: self.exemption_threshold,
            near_miss_cap: self.near_miss_cap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let p: SchoolPolicy =
            serde_json::from_value(json!({ "decisionPointBudget": 8 })).expect("policy");
        assert_eq!(p.decision_point_budget, 8);
        assert_eq!(p.supplementary_allowance, 2);
        assert_eq!(p.exemption_threshold, Some(85));
        assert_eq!(p.near_miss_cap, 10);

        let off: SchoolPolicy =
            serde_json::from_value(json!({ "exemptionThreshold": null })).expect("policy");
        assert_eq!(off.exemption_threshold, None);
    }

    #[test]
    fn override_applies_to_ministerial_only() {
        let policy = SchoolPolicy::default();
        let o = PolicyOverride {
            ministerial_decision_points: Some(9),
            ministerial_supplementary_subjects: None,
        };

        let m = policy.effective(StageProfile::Ministerial, Some(&o));
        assert_eq!(m.budget, 9);
        assert_eq!(m.allowance, 2);

        let s = policy.effective(StageProfile::Standard, Some(&o));
        assert_eq!(s.budget, 5);
    }
}
