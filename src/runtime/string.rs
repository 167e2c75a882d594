use crate::error::Error;
use crate::types::Value;

pub fn exec_string(name: &str, args: &[Value]) -> Result<Value, Error> {
    match name {
        "CONCAT" | "CONCATENATE" => {
            let out: String = args.iter().map(Value::display).collect();
            Ok(Value::String(out))
        }
        "LEN" => {
            let len = args.first().map(|v| v.display().chars().count()).unwrap_or(0);
            Ok(Value::Number(len as f64))
        }
        "UPPER" => Ok(Value::String(args.first().map(|v| v.display().to_uppercase()).unwrap_or_default())),
        "LOWER" => Ok(Value::String(args.first().map(|v| v.display().to_lowercase()).unwrap_or_default())),
        _ => Err(Error::UnknownFunction(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(x: &str) -> Value {
        Value::String(x.into())
    }

    #[test]
    fn concatenate_joins_without_separator() {
        assert_eq!(
            exec_string("CONCATENATE", &[s("Score: "), Value::Number(87.5), s("%")]).unwrap(),
            s("Score: 87.5%")
        );
    }

    #[test]
    fn len_upper_lower() {
        assert_eq!(exec_string("LEN", &[s("héllo")]).unwrap(), Value::Number(5.0));
        assert_eq!(exec_string("LEN", &[Value::Number(123.0)]).unwrap(), Value::Number(3.0));
        assert_eq!(exec_string("LEN", &[]).unwrap(), Value::Number(0.0));
        assert_eq!(exec_string("UPPER", &[s("pass")]).unwrap(), s("PASS"));
        assert_eq!(exec_string("LOWER", &[]).unwrap(), s(""));
    }
}
