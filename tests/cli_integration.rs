use std::io::Write;
use std::process::Command;

fn run_fcalc(args: &[&str]) -> Result<(String, String, i32), Box<dyn std::error::Error>> {
    let output = Command::new(env!("CARGO_BIN_EXE_fcalc"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("FORMCALC_LOG")
        .output()?;

    let stdout = String::from_utf8(output.stdout)?;
    let stderr = String::from_utf8(output.stderr)?;
    let exit_code = output.status.code().unwrap_or(-1);

    Ok((stdout.trim().to_string(), stderr.trim().to_string(), exit_code))
}

fn temp_json(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_cli_basic_arithmetic() {
    let (stdout, _stderr, code) = run_fcalc(&["=2 + 3 * 4"]).unwrap();
    assert_eq!(code, 0);
    assert_eq!(stdout, "14");
}

#[test]
fn test_cli_with_field_assignments() {
    let (stdout, _stderr, code) = run_fcalc(&["COUNT('yes')", "q1=yes", "q2=no", "q3=yes"]).unwrap();
    assert_eq!(code, 0);
    assert_eq!(stdout, "2");

    let (stdout, _stderr, code) = run_fcalc(&["=price * quantity", "price=2.5", "quantity=3"]).unwrap();
    assert_eq!(code, 0);
    assert_eq!(stdout, "7.5");
}

#[test]
fn test_cli_formula_after_flags_and_assignments() {
    let (stdout, _stderr, code) = run_fcalc(&["--output-json", "=1+2"]).unwrap();
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["value"], serde_json::json!(3.0));

    let (stdout, _stderr, code) = run_fcalc(&["q1=yes", "q2=yes", "COUNT('yes')"]).unwrap();
    assert_eq!(code, 0);
    assert_eq!(stdout, "2");

    let (stdout, _stderr, code) = run_fcalc(&["--json", r#"{"x": 4}"#, "=x * 2"]).unwrap();
    assert_eq!(code, 0);
    assert_eq!(stdout, "8");
}

#[test]
fn test_cli_with_json_context() {
    let (stdout, _stderr, code) =
        run_fcalc(&["=IF(x > 2, \"High\", \"Low\")", "--json", r#"{"formData": {"x": 3}}"#]).unwrap();
    assert_eq!(code, 0);
    assert_eq!(stdout, "High");
}

#[test]
fn test_cli_output_json() {
    let (stdout, _stderr, code) = run_fcalc(&["FIELD('a') + FIELD('b')", "a=2", "b=5", "--output-json"]).unwrap();
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["value"], serde_json::json!(7.0));
    assert_eq!(parsed["type"], "number");
    assert!(parsed["execution_time"].as_str().unwrap().ends_with(" ms"));
}

#[test]
fn test_cli_error_result() {
    let (stdout, stderr, code) = run_fcalc(&["=1/0"]).unwrap();
    assert_eq!(code, 2);
    assert!(stdout.is_empty());
    assert!(stderr.contains("Division by zero"), "stderr: {}", stderr);
}

#[test]
fn test_cli_context_file() {
    let file = temp_json(r#"{"q1": "yes", "q2": 3, "q3": 2, "q4": 3, "q5": "no"}"#);
    let path = file.path().to_str().unwrap();
    let (stdout, _stderr, code) = run_fcalc(&["FIELD('q2')+FIELD('q3')+FIELD('q4')", "--context-file", path]).unwrap();
    assert_eq!(code, 0);
    assert_eq!(stdout, "8");

    // Assignments override file values
    let (stdout, _stderr, code) = run_fcalc(&["FIELD('q2')", "--context-file", path, "q2=10"]).unwrap();
    assert_eq!(code, 0);
    assert_eq!(stdout, "10");
}

#[test]
fn test_cli_form_recalculation() {
    let form = temp_json(
        r#"{"fields": [
            {"name": "q1"},
            {"name": "yesCount", "formula": "COUNT('yes')", "calculated": true},
            {"name": "double", "formula": "=yesCount * 2", "calculated": true}
        ]}"#,
    );
    let (stdout, _stderr, code) =
        run_fcalc(&["--form", form.path().to_str().unwrap(), "q1=yes", "q2=yes"]).unwrap();
    assert_eq!(code, 0);
    assert_eq!(stdout, "yesCount = 2\ndouble = 4");
}

#[test]
fn test_cli_usage_errors() {
    let (_stdout, stderr, code) = run_fcalc(&[]).unwrap();
    assert_eq!(code, 1);
    assert!(stderr.contains("Usage: fcalc"));

    let (_stdout, stderr, code) = run_fcalc(&["=1", "--json"]).unwrap();
    assert_eq!(code, 1);
    assert!(stderr.contains("--json flag requires an argument"));

    let (_stdout, stderr, code) = run_fcalc(&["=1", "not-an-assignment"]).unwrap();
    assert_eq!(code, 1);
    assert!(stderr.contains("Invalid field assignment"));

    let (_stdout, _stderr, code) = run_fcalc(&["=1", "--json", "[1, 2]"]).unwrap();
    assert_eq!(code, 1);
}
