use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_resultsd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn resultsd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn near_miss_params() -> serde_json::Value {
    let subjects: Vec<serde_json::Value> = [46, 48, 70, 38]
        .iter()
        .enumerate()
        .map(|(i, g)| {
            json!({
                "subjectId": format!("subj{}", i),
                "grades": { "term1": g, "midYear": g, "term2": g, "finalExam": g }
            })
        })
        .collect();
    json!({ "stage": "", "subjects": subjects })
}

#[test]
fn saved_policy_drives_results_and_survives_restart() {
    let workspace = temp_dir("resultsd-setup-policy");

    {
        let (mut child, mut stdin, mut reader) = spawn_sidecar();
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        );

        let before = request_ok(&mut stdin, &mut reader, "2", "results.compute", near_miss_params());
        assert_eq!(before["result"]["status"], "supplementary");

        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "3",
            "setup.update",
            json!({ "section": "policy", "patch": { "decisionPointBudget": 0 } }),
        );
        let after = request_ok(&mut stdin, &mut reader, "4", "results.compute", near_miss_params());
        assert_eq!(after["result"]["status"], "fail");
        assert_ne!(before["resultHash"], after["resultHash"]);

        let bad = request(
            &mut stdin,
            &mut reader,
            "5",
            "setup.update",
            json!({ "section": "policy", "patch": { "decisionPointBudget": -4 } }),
        );
        assert_eq!(bad["error"]["code"], "bad_params");

        let _ = child.kill();
    }

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let setup = request_ok(&mut stdin, &mut reader, "2", "setup.get", json!({}));
    assert_eq!(setup["policy"]["decisionPointBudget"], 0);
    assert_eq!(setup["policy"]["supplementaryAllowance"], 2);

    let reloaded = request_ok(&mut stdin, &mut reader, "3", "results.compute", near_miss_params());
    assert_eq!(reloaded["result"]["status"], "fail");

    // A per-request patch sits on top of the saved policy without replacing it.
    let mut params = near_miss_params();
    params["policy"] = json!({ "decisionPointBudget": 5 });
    let patched = request_ok(&mut stdin, &mut reader, "4", "results.compute", params);
    assert_eq!(patched["result"]["status"], "supplementary");
    let setup = request_ok(&mut stdin, &mut reader, "5", "setup.get", json!({}));
    assert_eq!(setup["policy"]["decisionPointBudget"], 0);

    let _ = child.kill();
}

#[test]
fn exemption_can_be_disabled() {
    let workspace = temp_dir("resultsd-setup-exemption");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let params = json!({
        "stage": "",
        "subjects": [{
            "subjectId": "top",
            "grades": { "term1": 95, "midYear": 95, "term2": 95, "finalExam": "absent" }
        }]
    });

    let exempt = request_ok(&mut stdin, &mut reader, "2", "results.compute", params.clone());
    assert_eq!(exempt["perSubject"][0]["isExempt"], true);
    assert_eq!(exempt["result"]["status"], "pass");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "setup.update",
        json!({ "section": "policy", "patch": { "exemptionThreshold": null } }),
    );
    let setup = request_ok(&mut stdin, &mut reader, "4", "setup.get", json!({}));
    assert!(setup["policy"]["exemptionThreshold"].is_null());

    let not_exempt = request_ok(&mut stdin, &mut reader, "5", "results.compute", params);
    assert_eq!(not_exempt["perSubject"][0]["isExempt"], false);
    assert_eq!(not_exempt["perSubject"][0]["finalGrade1st"], "absent");
    assert_eq!(not_exempt["result"]["status"], "supplementary");

    let _ = child.kill();
}

#[test]
fn stage_lists_are_configurable_and_conflicts_rejected() {
    let workspace = temp_dir("resultsd-setup-stages");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let no_ws = request(
        &mut stdin,
        &mut reader,
        "1",
        "setup.update",
        json!({ "section": "stages", "patch": { "primary5": ["Year 5"] } }),
    );
    assert_eq!(no_ws["error"]["code"], "no_workspace");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let before = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "stages.resolve",
        json!({ "stage": "Year 5" }),
    );
    assert_eq!(before["profile"], "standard");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "setup.update",
        json!({ "section": "stages", "patch": { "primary5": ["الخامس الابتدائي", " Year 5 "] } }),
    );
    let after = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "stages.resolve",
        json!({ "stage": "  year   5" }),
    );
    assert_eq!(after["profile"], "primary5");
    assert_eq!(after["fields"][0], "oct");

    let conflict = request(
        &mut stdin,
        &mut reader,
        "6",
        "setup.update",
        json!({ "section": "stages", "patch": { "ministerial": ["year 5"] } }),
    );
    assert_eq!(conflict["ok"], false);
    assert_eq!(conflict["error"]["code"], "stage_conflict");
    assert_eq!(
        conflict["error"]["details"]["profiles"],
        json!(["primary5", "ministerial"])
    );

    // The rejected update left the saved lists alone.
    let setup = request_ok(&mut stdin, &mut reader, "7", "setup.get", json!({}));
    assert_eq!(setup["stages"]["primary5"], json!(["الخامس الابتدائي", "Year 5"]));
    assert!(setup["stages"]["ministerial"]
        .as_array()
        .expect("ministerial list")
        .iter()
        .all(|n| n != "year 5"));

    let lower = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "stages.resolve",
        json!({ "stage": "الاول الابتدائي" }),
    );
    assert_eq!(lower["profile"], "primary1to4");
    assert_eq!(lower["gradeRange"], json!({ "min": 0, "max": 10 }));

    let _ = child.kill();
}
