use crate::calc::fingerprint::result_hash;
use crate::calc::record::record_fields;
use crate::calc::{
    compute_class, compute_student_result, parse_subjects, CalcError, PolicyOverride,
    StageProfile, StudentInput,
};
use crate::ipc::error::{calc_err, err, ok};
use crate::ipc::handlers::setup::{parse_i64_range, resolve_policy, resolve_stage_profiles};
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Value};

fn required_stage(params: &Value) -> Result<&str, CalcError> {
    params
        .get("stage")
        .and_then(|v| v.as_str())
        .ok_or_else(|| CalcError::new("bad_params", "missing params.stage"))
}

fn parse_class_overrides(raw: Option<&Value>) -> Result<Option<PolicyOverride>, CalcError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    if raw.is_null() {
        return Ok(None);
    }
    let Some(obj) = raw.as_object() else {
        return Err(CalcError::new("bad_params", "classOverrides must be an object"));
    };
    let mut out = PolicyOverride::default();
    for (k, v) in obj {
        let slot = match k.as_str() {
            "ministerialDecisionPoints" => &mut out.ministerial_decision_points,
            "ministerialSupplementarySubjects" => &mut out.ministerial_supplementary_subjects,
            _ => {
                return Err(CalcError::new(
                    "bad_params",
                    format!("unknown classOverrides field: {}", k),
                ))
            }
        };
        if v.is_null() {
            continue;
        }
        let n = parse_i64_range(v, k, 0, 100).map_err(|msg| CalcError::new("bad_params", msg))?;
        *slot = Some(n as u32);
    }
    Ok(Some(out))
}

fn handle_stages_resolve(state: &mut AppState, req: &Request) -> serde_json::Value {
    let stage = match required_stage(&req.params) {
        Ok(s) => s,
        Err(e) => return calc_err(&req.id, e),
    };
    let profiles = match resolve_stage_profiles(state) {
        Ok(p) => p,
        Err(e) => return calc_err(&req.id, e),
    };
    let profile = profiles.resolve(stage);
    let range = profile.grade_range();
    ok(
        &req.id,
        json!({
            "stage": stage,
            "profile": profile,
            "gradeRange": { "min": range.start(), "max": range.end() },
            "fields": record_fields(profile),
        }),
    )
}

fn handle_results_compute(state: &mut AppState, req: &Request) -> serde_json::Value {
    let stage = match required_stage(&req.params) {
        Ok(s) => s,
        Err(e) => return calc_err(&req.id, e),
    };
    let profiles = match resolve_stage_profiles(state) {
        Ok(p) => p,
        Err(e) => return calc_err(&req.id, e),
    };
    let policy = match resolve_policy(state, req.params.get("policy")) {
        Ok(p) => p,
        Err(e) => return calc_err(&req.id, e),
    };
    let overrides = match parse_class_overrides(req.params.get("classOverrides")) {
        Ok(o) => o,
        Err(e) => return calc_err(&req.id, e),
    };
    let profile = profiles.resolve(stage);
    let subjects_raw = req.params.get("subjects").cloned().unwrap_or(json!([]));
    let subjects = match parse_subjects(profile, &subjects_raw) {
        Ok(s) => s,
        Err(e) => return calc_err(&req.id, e),
    };

    let computation =
        compute_student_result(&subjects, stage, &profiles, &policy, overrides.as_ref());
    tracing::debug!(
        profile = profile.as_str(),
        status = computation.result.status.as_str(),
        spent = computation.result.decision_points_spent,
        "student result computed"
    );

    let hash = match result_hash(&computation) {
        Ok(h) => h,
        Err(e) => return err(&req.id, "internal", e.to_string(), None),
    };
    let mut result = match serde_json::to_value(&computation) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "internal", e.to_string(), None),
    };
    result["resultHash"] = json!(hash);
    ok(&req.id, result)
}

fn parse_students(profile: StageProfile, raw: &Value) -> Result<Vec<StudentInput>, CalcError> {
    let Some(items) = raw.as_array() else {
        return Err(CalcError::new("bad_params", "students must be an array"));
    };
    let mut out: Vec<StudentInput> = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let Some(student_id) = item
            .get("studentId")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else {
            return Err(CalcError::new(
                "bad_params",
                format!("students[{}].studentId must be a non-empty string", i),
            ));
        };
        if out.iter().any(|s| s.student_id == student_id) {
            return Err(CalcError::new(
                "bad_params",
                format!("duplicate studentId: {}", student_id),
            ));
        }
        let subjects_raw = item.get("subjects").cloned().unwrap_or(json!([]));
        let subjects = parse_subjects(profile, &subjects_raw).map_err(|mut e| {
            e.message = format!("{}: {}", student_id, e.message);
            e
        })?;
        out.push(StudentInput {
            student_id: student_id.to_string(),
            subjects,
        });
    }
    Ok(out)
}

fn handle_results_compute_class(state: &mut AppState, req: &Request) -> serde_json::Value {
    let stage = match required_stage(&req.params) {
        Ok(s) => s,
        Err(e) => return calc_err(&req.id, e),
    };
    let profiles = match resolve_stage_profiles(state) {
        Ok(p) => p,
        Err(e) => return calc_err(&req.id, e),
    };
    let policy = match resolve_policy(state, req.params.get("policy")) {
        Ok(p) => p,
        Err(e) => return calc_err(&req.id, e),
    };
    let overrides = match parse_class_overrides(req.params.get("classOverrides")) {
        Ok(o) => o,
        Err(e) => return calc_err(&req.id, e),
    };
    let profile = profiles.resolve(stage);
    let students_raw = req.params.get("students").cloned().unwrap_or(json!([]));
    let students = match parse_students(profile, &students_raw) {
        Ok(s) => s,
        Err(e) => return calc_err(&req.id, e),
    };

    let class = compute_class(&students, stage, &profiles, &policy, overrides.as_ref());
    tracing::debug!(
        profile = profile.as_str(),
        students = class.students.len(),
        spent = class.decision_points_spent,
        "class results computed"
    );

    let hash = match result_hash(&class) {
        Ok(h) => h,
        Err(e) => return err(&req.id, "internal", e.to_string(), None),
    };
    let mut result = match serde_json::to_value(&class) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "internal", e.to_string(), None),
    };
    result["resultHash"] = json!(hash);
    ok(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "stages.resolve" => Some(handle_stages_resolve(state, req)),
        "results.compute" => Some(handle_results_compute(state, req)),
        "results.computeClass" => Some(handle_results_compute_class(state, req)),
        _ => None,
    }
}
