use crate::calc::policy::{
    DEFAULT_DECISION_POINT_BUDGET, DEFAULT_EXEMPTION_THRESHOLD, DEFAULT_NEAR_MISS_CAP,
    DEFAULT_SUPPLEMENTARY_ALLOWANCE,
};
use crate::calc::{CalcError, SchoolPolicy, StageProfiles};
use crate::db;
use crate::ipc::error::{calc_err, err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Map, Value};

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum SetupSection {
    Policy,
    Stages,
}

impl SetupSection {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "policy" => Some(Self::Policy),
            "stages" => Some(Self::Stages),
            _ => None,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Policy => "setup.policy",
            Self::Stages => "setup.stages",
        }
    }
}

fn default_section(section: SetupSection) -> Value {
    match section {
        SetupSection::Policy => json!({
            "decisionPointBudget": DEFAULT_DECISION_POINT_BUDGET,
            "supplementaryAllowance": DEFAULT_SUPPLEMENTARY_ALLOWANCE,
            "exemptionThreshold": DEFAULT_EXEMPTION_THRESHOLD,
            "nearMissCap": DEFAULT_NEAR_MISS_CAP
        }),
        SetupSection::Stages => {
            let d = StageProfiles::default();
            json!({
                "primary1to4": d.primary1to4,
                "primary5": d.primary5,
                "primary6": d.primary6,
                "ministerial": d.ministerial
            })
        }
    }
}

fn as_object_mut(value: &mut Value) -> Result<&mut Map<String, Value>, String> {
    value
        .as_object_mut()
        .ok_or_else(|| "internal setup object must be a JSON object".to_string())
}

pub fn parse_i64_range(v: &Value, key: &str, min: i64, max: i64) -> Result<i64, String> {
    let n = v
        .as_i64()
        .ok_or_else(|| format!("{} must be integer", key))?;
    if !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}

fn parse_nullable_i64_range(v: &Value, key: &str, min: i64, max: i64) -> Result<Value, String> {
    if v.is_null() {
        return Ok(Value::Null);
    }
    Ok(Value::from(parse_i64_range(v, key, min, max)?))
}

fn parse_stage_names(v: &Value, key: &str) -> Result<Value, String> {
    let items = v
        .as_array()
        .ok_or_else(|| format!("{} must be an array of stage names", key))?;
    let mut names: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let s = item
            .as_str()
            .ok_or_else(|| format!("{} entries must be strings", key))?
            .trim();
        if s.is_empty() {
            return Err(format!("{} entries must not be empty", key));
        }
        if s.chars().count() > 80 {
            return Err(format!("{} entries length must be <= 80", key));
        }
        if !names.iter().any(|n| n == s) {
            names.push(s.to_string());
        }
    }
    Ok(json!(names))
}

fn merge_section_patch(
    section: SetupSection,
    current: &mut Value,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    let obj = as_object_mut(current)?;
    for (k, v) in patch {
        match section {
            SetupSection::Policy => match k.as_str() {
                "decisionPointBudget" => {
                    obj.insert(k.clone(), Value::from(parse_i64_range(v, k, 0, 100)?));
                }
                "supplementaryAllowance" => {
                    obj.insert(k.clone(), Value::from(parse_i64_range(v, k, 0, 20)?));
                }
                "exemptionThreshold" => {
                    obj.insert(k.clone(), parse_nullable_i64_range(v, k, 50, 100)?);
                }
                "nearMissCap" => {
                    obj.insert(k.clone(), Value::from(parse_i64_range(v, k, 0, 50)?));
                }
                _ => return Err(format!("unknown policy field: {}", k)),
            },
            SetupSection::Stages => match k.as_str() {
                "primary1to4" | "primary5" | "primary6" | "ministerial" => {
                    obj.insert(k.clone(), parse_stage_names(v, k)?);
                }
                _ => return Err(format!("unknown stages field: {}", k)),
            },
        }
    }
    Ok(())
}

fn load_section(conn: Option<&rusqlite::Connection>, section: SetupSection) -> anyhow::Result<Value> {
    let mut current = default_section(section);
    let Some(conn) = conn else {
        return Ok(current);
    };
    if let Some(saved) = db::settings_get_json(conn, section.key())? {
        if let Some(saved_obj) = saved.as_object() {
            // Best-effort apply: malformed historical values should not block computation.
            if let Err(e) = merge_section_patch(section, &mut current, saved_obj) {
                tracing::warn!(key = section.key(), error = %e, "ignoring saved setup value");
            }
        }
    }
    Ok(current)
}

fn policy_from_value(v: Value) -> Result<SchoolPolicy, CalcError> {
    serde_json::from_value(v).map_err(|e| CalcError::new("bad_params", e.to_string()))
}

fn stages_from_value(v: Value) -> Result<StageProfiles, CalcError> {
    let profiles: StageProfiles =
        serde_json::from_value(v).map_err(|e| CalcError::new("bad_params", e.to_string()))?;
    profiles.validate()?;
    Ok(profiles)
}

/// Workspace policy (or defaults), with an optional per-request patch on top.
pub fn resolve_policy(state: &AppState, patch: Option<&Value>) -> Result<SchoolPolicy, CalcError> {
    let mut current = load_section(state.db.as_ref(), SetupSection::Policy)
        .map_err(|e| CalcError::new("db_query_failed", e.to_string()))?;
    match patch {
        None => {}
        Some(v) if v.is_null() => {}
        Some(v) => {
            let Some(patch_obj) = v.as_object() else {
                return Err(CalcError::new("bad_params", "policy must be an object"));
            };
            merge_section_patch(SetupSection::Policy, &mut current, patch_obj)
                .map_err(|msg| CalcError::new("bad_params", msg))?;
        }
    }
    policy_from_value(current)
}

pub fn resolve_stage_profiles(state: &AppState) -> Result<StageProfiles, CalcError> {
    let current = load_section(state.db.as_ref(), SetupSection::Stages)
        .map_err(|e| CalcError::new("db_query_failed", e.to_string()))?;
    match stages_from_value(current) {
        Ok(p) => Ok(p),
        Err(e) => {
            // A conflicting saved list must not take resolution down with it.
            tracing::warn!(error = %e.message, "saved stage lists invalid; using defaults");
            Ok(StageProfiles::default())
        }
    }
}

fn handle_setup_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let policy = match load_section(Some(conn), SetupSection::Policy) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let stages = match load_section(Some(conn), SetupSection::Stages) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    ok(
        &req.id,
        json!({
            "policy": policy,
            "stages": stages
        }),
    )
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(section_raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing section", None);
    };
    let Some(section) = SetupSection::parse(section_raw) else {
        return err(&req.id, "bad_params", "unknown section", None);
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let mut current = match load_section(Some(conn), section) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if let Err(msg) = merge_section_patch(section, &mut current, patch_obj) {
        return err(&req.id, "bad_params", msg, None);
    }
    if section == SetupSection::Stages {
        if let Err(e) = stages_from_value(current.clone()) {
            return calc_err(&req.id, e);
        }
    }
    if let Err(e) = db::settings_set_json(conn, section.key(), &current) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    tracing::info!(key = section.key(), "setup section updated");
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(handle_setup_get(state, req)),
        "setup.update" => Some(handle_setup_update(state, req)),
        _ => None,
    }
}
