use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Reads an optional metric the way the trends API actually sends it.
///
/// Numbers pass through, numeric strings are parsed, and everything else
/// (booleans, objects, unparseable text, values outside the `f64` range)
/// reads as missing. Input never fails on a bad metric.
pub fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(number_from_value(&value))
}

fn number_from_value(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => {
            number.as_f64().or_else(|| number.to_string().parse::<f64>().ok())
        }
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|number| number.is_finite())
}
