use formcalc::types::format_number;
use formcalc::{fields_from_definition, recalculate_all, FormulaCalculator, FormulaContext, ResultValue};
use serde_json::{json, Value as Json};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn usage() -> ! {
    eprintln!("Usage: fcalc \"formula\" [options] [field=value ...]");
    eprintln!("       fcalc --form FORM.json [options] [field=value ...]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --json JSON           Field values as a JSON object (formData wrapper allowed)");
    eprintln!("  --context-file PATH   Read field values from a JSON file");
    eprintln!("  --form PATH           Recalculate every calculated field of a form definition");
    eprintln!("  --output-json         Print the result as JSON with type and timing");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  FORMCALC_LOG          Log filter (falls back to RUST_LOG, default warn)");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  fcalc \"=2 + 3 * 4\"");
    eprintln!("  fcalc \"COUNT('yes')\" q1=yes q2=no q3=yes");
    eprintln!("  fcalc \"=ROUND(FIELD(score) / 3, 1)\" --json '{{\"score\": 10}}' --output-json");
    eprintln!("  fcalc --form form.json --context-file submission.json");
    std::process::exit(1);
}

fn fail(message: String) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

/// `name=value` with a plain field name; anything else (such as `=1+2`) is a formula.
fn field_assignment(arg: &str) -> Option<(&str, &str)> {
    let (name, raw) = arg.split_once('=')?;
    let plain = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    plain.then_some((name, raw))
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("FORMCALC_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() {
    init_logging();
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        usage();
    }

    let mut formula: Option<String> = None;
    let mut json_input: Option<String> = None;
    let mut context_file: Option<String> = None;
    let mut form_file: Option<String> = None;
    let mut output_json = false;
    let mut assignments: Vec<(String, Json)> = Vec::new();
    let mut i = 0;

    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "--json" | "--context-file" | "--form" => {
                let Some(value) = args.get(i + 1) else {
                    fail(format!("{} flag requires an argument", arg));
                };
                match arg {
                    "--json" => json_input = Some(value.clone()),
                    "--context-file" => context_file = Some(value.clone()),
                    _ => form_file = Some(value.clone()),
                }
                i += 1;
            }
            "--output-json" => output_json = true,
            "-h" | "--help" => usage(),
            _ => match field_assignment(arg) {
                Some((name, raw)) => assignments.push((name.to_string(), parse_value(raw))),
                None if formula.is_none() => formula = Some(arg.to_string()),
                None => fail(format!("Invalid field assignment: '{}'. Use format: field=value", arg)),
            },
        }
        i += 1;
    }

    let mut context = match &context_file {
        Some(path) => {
            let text = std::fs::read_to_string(path).unwrap_or_else(|e| fail(format!("cannot read {}: {}", path, e)));
            FormulaContext::from_json_str(&text).unwrap_or_else(|e| fail(e.to_string()))
        }
        None => FormulaContext::new(),
    };
    if let Some(text) = &json_input {
        let extra = FormulaContext::from_json_str(text).unwrap_or_else(|e| fail(e.to_string()));
        for (name, value) in extra.fields() {
            context.insert(name.clone(), value.clone());
        }
    }
    for (name, value) in assignments {
        context.insert(name, value);
    }

    let mut calc = FormulaCalculator::with_context(context);

    if let Some(path) = form_file {
        let text = std::fs::read_to_string(&path).unwrap_or_else(|e| fail(format!("cannot read {}: {}", path, e)));
        let definition: Json = serde_json::from_str(&text).unwrap_or_else(|e| fail(format!("Invalid JSON: {}", e)));
        let fields = fields_from_definition(&definition).unwrap_or_else(|e| fail(e.to_string()));
        let report = recalculate_all(&mut calc, &fields);
        if output_json {
            let output = json!({ "context": calc.context().clone().into_json(), "fields": report });
            println!("{}", serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string()));
        } else {
            for outcome in &report.outcomes {
                println!("{} = {}", outcome.name, render(&outcome.result.value));
            }
        }
        if report.errors().next().is_some() {
            std::process::exit(2);
        }
        return;
    }

    let Some(formula) = formula else { usage() };
    let start_time = Instant::now();
    let result = calc.evaluate(&formula);
    let execution_time_ms = start_time.elapsed().as_secs_f64() * 1000.0;

    if output_json {
        let mut output = serde_json::to_value(&result).unwrap_or_else(|_| json!({}));
        if let Json::Object(map) = &mut output {
            map.insert("execution_time".into(), json!(format!("{:.2} ms", execution_time_ms)));
        }
        println!("{}", serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string()));
    } else if let Some(err) = &result.error {
        eprintln!("Error: {}", err);
    } else {
        println!("{}", render(&result.value));
    }
    if result.is_error() {
        std::process::exit(2);
    }
}

fn render(value: &ResultValue) -> String {
    match value {
        ResultValue::Number(n) => format_number(*n),
        ResultValue::Boolean(b) => b.to_string(),
        ResultValue::String(s) => s.clone(),
    }
}

fn parse_value(s: &str) -> Json {
    if s.len() >= 2 && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\''))) {
        return Json::String(s[1..s.len() - 1].to_string());
    }

    match s.to_lowercase().as_str() {
        "true" => return Json::Bool(true),
        "false" => return Json::Bool(false),
        "null" => return Json::Null,
        _ => {}
    }

    // Basic [1,2,3] lists
    if s.starts_with('[') && s.ends_with(']') {
        let inner = &s[1..s.len() - 1];
        if inner.trim().is_empty() {
            return Json::Array(vec![]);
        }
        return Json::Array(inner.split(',').map(|item| parse_value(item.trim())).collect());
    }

    if let Ok(num) = s.parse::<f64>() {
        if num.is_finite() {
            return json!(num);
        }
    }

    Json::String(s.to_string())
}
