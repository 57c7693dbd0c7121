use serde_json::{Map, Number, Value};

/// Rewrites canonical extended-JSON number wrappers into plain numbers.
/// Object ids and dates keep their wrapper form.
pub fn relax(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(relax).collect()),
        Value::Object(map) => relax_object(map),
        other => other,
    }
}

fn relax_object(map: Map<String, Value>) -> Value {
    if map.len() == 1 {
        if let Some((key, Value::String(raw))) = map.iter().next() {
            let number = match key.as_str() {
                "$numberInt" | "$numberLong" => raw.parse::<i64>().ok().map(Number::from),
                "$numberDouble" => raw.parse::<f64>().ok().and_then(Number::from_f64),
                _ => None,
            };
            if let Some(number) = number {
                return Value::Number(number);
            }
        }
    }
    Value::Object(
        map.into_iter()
            .map(|(key, value)| (key, relax(value)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unwraps_numbers_recursively() {
        let raw = json!({
            "_id": {"$oid": "64b7f0c2a1b2c3d4e5f60718"},
            "estimatedPopulation": {"$numberInt": "1200"},
            "nested": [{"$numberLong": "9000000000"}, {"$numberDouble": "1.5"}]
        });
        let relaxed = relax(raw);
        assert_eq!(relaxed["estimatedPopulation"], json!(1200));
        assert_eq!(relaxed["nested"], json!([9000000000i64, 1.5]));
        assert_eq!(relaxed["_id"], json!({"$oid": "64b7f0c2a1b2c3d4e5f60718"}));
    }

    #[test]
    fn leaves_non_finite_doubles_wrapped() {
        let raw = json!({"$numberDouble": "NaN"});
        assert_eq!(relax(raw.clone()), raw);
    }
}
