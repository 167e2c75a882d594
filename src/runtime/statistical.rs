use crate::error::Error;
use crate::runtime::evaluation::Scope;
use crate::runtime::utils::{for_each_scalar, is_blank, matches_criteria, numeric_values};
use crate::types::Value;

pub fn exec_statistical(name: &str, args: &[Value], scope: Scope<'_>) -> Result<Value, Error> {
    match name {
        "COUNT" => {
            let mut count = 0usize;
            for_each_scalar(args, &mut |v| {
                if !is_blank(v) {
                    count += 1;
                }
            });
            Ok(Value::Number(count as f64))
        }
        "COUNTIF" => {
            // A text range stands for the whole form
            let range = match args.first() {
                Some(Value::Array(items)) => items.clone(),
                Some(Value::String(_)) => scope.context.values(),
                Some(other) => vec![other.clone()],
                None => Vec::new(),
            };
            let criteria = args.get(1).cloned().unwrap_or(Value::Null);
            let count = range.iter().filter(|v| matches_criteria(v, &criteria)).count();
            Ok(Value::Number(count as f64))
        }
        "MEDIAN" => {
            let mut nums = numeric_values(args);
            if nums.is_empty() {
                return Ok(Value::Number(0.0));
            }
            nums.sort_by(|a, b| a.total_cmp(b));
            let len = nums.len();
            Ok(Value::Number(if len % 2 == 0 {
                (nums[len / 2 - 1] + nums[len / 2]) / 2.0
            } else {
                nums[len / 2]
            }))
        }
        "MODE" => {
            let nums = numeric_values(args);
            // Ties go to the value that reached the winning count first
            let mut counts: Vec<(f64, usize)> = Vec::new();
            let mut mode = 0.0;
            let mut best = 0usize;
            for n in nums {
                let count = match counts.iter_mut().find(|(v, _)| *v == n) {
                    Some(entry) => {
                        entry.1 += 1;
                        entry.1
                    }
                    None => {
                        counts.push((n, 1));
                        1
                    }
                };
                if count > best {
                    best = count;
                    mode = n;
                }
            }
            Ok(Value::Number(mode))
        }
        _ => Err(Error::UnknownFunction(name.to_string())),
    }
}
