//! Timesheet helpers for weekly hour forms.

use crate::error::Error;
use crate::runtime::evaluation::Scope;
use crate::runtime::utils::round_half_up;
use crate::types::Value;
use chrono::NaiveTime;

pub const WEEKDAYS: [&str; 7] = [
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

/// Weekly hours beyond which time counts as overtime.
pub const OVERTIME_THRESHOLD: f64 = 40.0;

pub fn exec_timesheet(name: &str, args: &[Value], scope: Scope<'_>) -> Result<Value, Error> {
    match name {
        "CALC_HOURS" => {
            let start = args.first().and_then(parse_time);
            let end = args.get(1).and_then(parse_time);
            let break_minutes = args.get(2).map(Value::number_or_zero).unwrap_or(0.0);
            let hours = match (start, end) {
                (Some(s), Some(e)) => shift_hours(s, e, break_minutes),
                _ => 0.0,
            };
            Ok(Value::Number(hours))
        }
        "SUM_DAILY_HOURS" => Ok(Value::Number(weekly_total(scope))),
        "CALC_OVERTIME" => {
            let total = match args.first() {
                Some(v) => v.number_or_zero(),
                None => weekly_total(scope),
            };
            let threshold = args.get(1).map(Value::number_or_zero).unwrap_or(OVERTIME_THRESHOLD);
            Ok(Value::Number((total - threshold).max(0.0)))
        }
        _ => Err(Error::UnknownFunction(name.to_string())),
    }
}

fn parse_time(v: &Value) -> Option<NaiveTime> {
    let text = v.as_str()?.trim();
    NaiveTime::parse_from_str(text, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
        .ok()
}

/// Hours worked between two clock times; an end before the start wraps past midnight.
fn shift_hours(start: NaiveTime, end: NaiveTime, break_minutes: f64) -> f64 {
    let mut minutes = (end - start).num_seconds() as f64 / 60.0;
    if minutes < 0.0 {
        minutes += 24.0 * 60.0;
    }
    let worked = (minutes - break_minutes).max(0.0);
    round_half_up(worked / 60.0, 2)
}

fn weekly_total(scope: Scope<'_>) -> f64 {
    WEEKDAYS
        .iter()
        .map(|day| scope.context.resolve_field(&format!("{}TotalHours", day)).number_or_zero())
        .sum()
}
