use formcalc::{
    fields_from_definition, recalculate, recompute_batch, CalculatedField, FormulaCalculator, FormulaContext,
    FormulaResult, ResultType,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn audit_definition() -> serde_json::Value {
    json!({
        "title": "Site audit",
        "fields": [
            {"name": "q1", "type": "radio", "options": ["yes", "no", "na"]},
            {"name": "q2", "type": "radio", "options": ["yes", "no", "na"]},
            {"name": "q3", "type": "radio", "options": ["yes", "no", "na"]},
            {"name": "yesCount", "type": "number", "formula": "COUNT('yes')", "calculated": true, "autoRefresh": true},
            {"name": "noCount", "type": "number", "formula": "COUNT('no')", "calculated": true},
            {"name": "score", "type": "number", "formula": "=ROUND(yesCount / (yesCount + noCount) * 100, 1)", "calculated": true},
            {"name": "rating", "type": "text", "formula": "=IF(score >= 60, \"Pass\", \"Fail\")", "calculated": true}
        ]
    })
}

#[test]
fn definition_parsing_keeps_only_calculated_fields() {
    let fields = fields_from_definition(&audit_definition()).unwrap();
    let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["yesCount", "noCount", "score", "rating"]);
    assert!(fields.iter().all(|f| f.auto_refresh));
}

#[test]
fn recalculation_chains_fields() {
    let fields = fields_from_definition(&audit_definition()).unwrap();
    let ctx = FormulaContext::from_value(json!({"formData": {"q1": "yes", "q2": "yes", "q3": "no"}})).unwrap();
    let mut calc = FormulaCalculator::with_context(ctx);
    let report = recalculate(&mut calc, &fields);

    assert_eq!(report.get("yesCount"), Some(&FormulaResult::number(2.0)));
    assert_eq!(report.get("noCount"), Some(&FormulaResult::number(1.0)));
    assert_eq!(report.get("score"), Some(&FormulaResult::number(66.7)));
    assert_eq!(report.get("rating"), Some(&FormulaResult::string("Pass")));
    assert_eq!(report.errors().count(), 0);

    let json = calc.into_context().into_json();
    assert_eq!(json["formData"]["rating"], json!("Pass"));
    assert_eq!(json["formData"]["score"], json!(66.7));
}

#[test]
fn erroring_field_displays_zero() {
    let fields = vec![
        CalculatedField::new("ratio", "=total / count"),
        CalculatedField::new("label", "=\"Ratio: \" & ratio"),
    ];
    let ctx = FormulaContext::from_value(json!({"total": 5, "count": 0})).unwrap();
    let mut calc = FormulaCalculator::with_context(ctx);
    let report = recalculate(&mut calc, &fields);
    assert_eq!(report.get("ratio").map(|r| r.kind), Some(ResultType::Error));
    assert_eq!(report.get("label"), Some(&FormulaResult::string("Ratio: 0")));
}

#[test]
fn missing_formula_is_skipped() {
    let def = json!([{"name": "x", "calculated": true}, {"name": "y", "formula": "=2", "calculated": true}]);
    let fields = fields_from_definition(&def).unwrap();
    let mut calc = FormulaCalculator::new();
    let report = recalculate(&mut calc, &fields);
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].name, "y");
}

#[test]
fn batch_recompute_of_submissions() {
    let fields = fields_from_definition(&audit_definition()).unwrap();
    let submissions = vec![
        json!({"q1": "yes", "q2": "yes", "q3": "yes"}),
        json!({"q1": "no", "q2": "no", "q3": "yes"}),
        json!({"formData": {"q1": "na", "q2": "yes", "q3": "no"}}),
    ];
    let contexts = submissions
        .into_iter()
        .map(|s| FormulaContext::from_value(s).unwrap())
        .collect();
    let outcomes = recompute_batch(&FormulaCalculator::new(), &fields, contexts, 2).unwrap();

    let ratings: Vec<Option<FormulaResult>> = outcomes.iter().map(|o| o.report.get("rating").cloned()).collect();
    assert_eq!(
        ratings,
        vec![
            Some(FormulaResult::string("Pass")),
            Some(FormulaResult::string("Fail")),
            Some(FormulaResult::string("Fail")),
        ]
    );
    assert_eq!(outcomes[0].context.get("score"), Some(&json!(100.0)));
    assert_eq!(outcomes[2].context.get("score"), Some(&json!(50.0)));
}
