use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::animator::StepMode;

/// Per-key configuration for one counter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CounterSettings {
    pub target: u64,
    pub step_mode: StepMode,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TargetError {
    #[error("no target value set")]
    Missing,

    #[error("target is not a whole number: {0:?}")]
    NotANumber(String),

    #[error("target must not be negative: {0}")]
    Negative(i64),
}

/// Read a counter's settings from the key's settings object.
///
/// `ceil` holds the target, either as a JSON number or as numeric text.
/// Leaving it out (or blank) is an error unless `missingAsZero` is set;
/// anything non-numeric is always an error.
pub fn parse_settings(v: &Map<String, Value>) -> Result<CounterSettings, TargetError> {
    let missing_as_zero = v
        .get("missingAsZero")
        .and_then(|b| b.as_bool())
        .unwrap_or(false);

    let target = match parse_target(v.get("ceil")) {
        Err(TargetError::Missing) if missing_as_zero => 0,
        other => other?,
    };

    Ok(CounterSettings {
        target,
        step_mode: get_step_mode(v),
    })
}

fn parse_target(raw: Option<&Value>) -> Result<u64, TargetError> {
    match raw {
        None | Some(Value::Null) => Err(TargetError::Missing),
        Some(Value::Number(n)) => {
            if let Some(u) = n.as_u64() {
                Ok(u)
            } else if let Some(i) = n.as_i64() {
                Err(TargetError::Negative(i))
            } else {
                from_float(n.as_f64(), &n.to_string())
            }
        }
        Some(Value::String(s)) => {
            let t = s.trim();
            if t.is_empty() {
                return Err(TargetError::Missing);
            }
            if let Ok(u) = t.parse::<u64>() {
                return Ok(u);
            }
            if let Ok(i) = t.parse::<i64>() {
                // "-0" is still zero
                return if i == 0 { Ok(0) } else { Err(TargetError::Negative(i)) };
            }
            from_float(t.parse::<f64>().ok(), t)
        }
        Some(other) => Err(TargetError::NotANumber(other.to_string())),
    }
}

// "1e3" and 250.0 are whole numbers; 2.5, NaN and out-of-range values are not.
fn from_float(f: Option<f64>, raw: &str) -> Result<u64, TargetError> {
    match f {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f < 0.0 => {
            Err(TargetError::Negative(f.max(i64::MIN as f64) as i64))
        }
        Some(f) if f.is_finite() && f.fract() == 0.0 && f < u64::MAX as f64 => Ok(f as u64),
        _ => Err(TargetError::NotANumber(raw.to_string())),
    }
}

fn get_step_mode(v: &Map<String, Value>) -> StepMode {
    match v.get("stepMode") {
        None | Some(Value::Null) => StepMode::default(),
        Some(raw) => serde_json::from_value(raw.clone()).unwrap_or_else(|_| {
            warn!(step_mode = %raw, "unknown step mode, using ceil");
            StepMode::default()
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn settings(v: Value) -> Result<CounterSettings, TargetError> {
        match v {
            Value::Object(m) => parse_settings(&m),
            _ => panic!("settings must be an object"),
        }
    }

    #[test]
    fn reads_number_and_numeric_text() {
        assert_eq!(settings(json!({ "ceil": 1200 })).unwrap().target, 1200);
        assert_eq!(settings(json!({ "ceil": " 450 " })).unwrap().target, 450);
        assert_eq!(settings(json!({ "ceil": 250.0 })).unwrap().target, 250);
        assert_eq!(settings(json!({ "ceil": "1e3" })).unwrap().target, 1000);
    }

    #[test]
    fn missing_target_is_an_error_by_default() {
        assert_eq!(settings(json!({})), Err(TargetError::Missing));
        assert_eq!(settings(json!({ "ceil": null })), Err(TargetError::Missing));
        assert_eq!(settings(json!({ "ceil": "  " })), Err(TargetError::Missing));
    }

    #[test]
    fn missing_as_zero_only_covers_missing() {
        let s = settings(json!({ "missingAsZero": true })).unwrap();
        assert_eq!(s.target, 0);

        assert_eq!(
            settings(json!({ "ceil": "lots", "missingAsZero": true })),
            Err(TargetError::NotANumber("lots".into()))
        );
    }

    #[test]
    fn rejects_non_numbers_and_negatives() {
        assert_eq!(
            settings(json!({ "ceil": "12abc" })),
            Err(TargetError::NotANumber("12abc".into()))
        );
        assert_eq!(
            settings(json!({ "ceil": "NaN" })),
            Err(TargetError::NotANumber("NaN".into()))
        );
        assert!(matches!(
            settings(json!({ "ceil": 2.5 })),
            Err(TargetError::NotANumber(_))
        ));
        assert!(matches!(
            settings(json!({ "ceil": true })),
            Err(TargetError::NotANumber(_))
        ));
        assert_eq!(settings(json!({ "ceil": -5 })), Err(TargetError::Negative(-5)));
        assert_eq!(settings(json!({ "ceil": "-40" })), Err(TargetError::Negative(-40)));
    }

    #[test]
    fn negative_zero_is_zero() {
        assert_eq!(settings(json!({ "ceil": "-0" })).unwrap().target, 0);
        assert_eq!(settings(json!({ "ceil": " -0 " })).unwrap().target, 0);
        assert_eq!(settings(json!({ "ceil": -0.0 })).unwrap().target, 0);
        assert_eq!(settings(json!({ "ceil": "-0.0" })).unwrap().target, 0);
    }

    #[test]
    fn step_mode_defaults_to_ceil() {
        assert_eq!(settings(json!({ "ceil": 9 })).unwrap().step_mode, StepMode::Ceil);
        assert_eq!(
            settings(json!({ "ceil": 9, "stepMode": "exact" })).unwrap().step_mode,
            StepMode::Exact
        );
        assert_eq!(
            settings(json!({ "ceil": 9, "stepMode": "bouncy" })).unwrap().step_mode,
            StepMode::Ceil
        );
    }

    #[test]
    fn errors_read_well() {
        assert_eq!(TargetError::Missing.to_string(), "no target value set");
        assert_eq!(
            TargetError::Negative(-3).to_string(),
            "target must not be negative: -3"
        );
    }
}
