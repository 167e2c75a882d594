use crate::error::Error;
use crate::runtime::utils::{arg_number, as_list, numeric_values, round_half_up};
use crate::types::Value;

pub fn exec_arithmetic(name: &str, args: &[Value]) -> Result<Value, Error> {
    match name {
        "SUM" => {
            let mut acc = 0.0;
            fn sum_value(v: &Value, acc: &mut f64) {
                match v {
                    Value::Array(items) => {
                        for it in items {
                            sum_value(it, acc);
                        }
                    }
                    other => *acc += other.number_or_zero(),
                }
            }
            for a in args {
                sum_value(a, &mut acc);
            }
            Ok(Value::Number(acc))
        }
        "AVG" | "AVERAGE" => {
            let nums = numeric_values(args);
            let avg = if nums.is_empty() { 0.0 } else { nums.iter().sum::<f64>() / nums.len() as f64 };
            Ok(Value::Number(avg))
        }
        "ROUND" => {
            let n = arg_number(args, 0);
            let decimals = arg_number(args, 1).trunc() as i32;
            Ok(Value::Number(round_half_up(n, decimals)))
        }
        "MIN" => {
            let nums = numeric_values(args);
            Ok(Value::Number(nums.into_iter().reduce(f64::min).unwrap_or(0.0)))
        }
        "MAX" => {
            let nums = numeric_values(args);
            Ok(Value::Number(nums.into_iter().reduce(f64::max).unwrap_or(0.0)))
        }
        "ABS" => Ok(Value::Number(arg_number(args, 0).abs())),
        "SQRT" => Ok(Value::Number(arg_number(args, 0).sqrt())),
        "POW" | "POWER" => Ok(Value::Number(arg_number(args, 0).powf(arg_number(args, 1)))),
        "SUMPRODUCT" => {
            let a = as_list(args.first());
            let b = as_list(args.get(1));
            let total = a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| x.number_or_zero() * y.number_or_zero())
                .sum();
            Ok(Value::Number(total))
        }
        _ => Err(Error::UnknownFunction(name.to_string())),
    }
}
