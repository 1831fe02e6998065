use serde_json::Value;

/// Answer fields in order of priority, searched in the result and then in
/// its nested summary objects.
const PRIORITY_KEYS: [&str; 9] = [
    "interest_saved",
    "monthly_savings",
    "scheduled_payment",
    "time_to_payoff",
    "payment",
    "max_principal",
    "contribution",
    "final_balance",
    "message",
];

const NESTED_KEYS: [&str; 3] = ["summary", "estimate", "with_extra"];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let Value::Object(map) = result else {
        println!("{}", format_minimal(result));
        return;
    };

    let scopes = std::iter::once(map).chain(
        NESTED_KEYS
            .iter()
            .filter_map(|k| map.get(*k))
            .filter_map(Value::as_object),
    );
    let scopes: Vec<_> = scopes.collect();

    for key in PRIORITY_KEYS {
        for scope in &scopes {
            if let Some(val) = scope.get(key).filter(|v| !v.is_null()) {
                println!("{}", format_minimal(val));
                return;
            }
        }
    }

    if let Some((key, val)) = map.iter().next() {
        println!("{}: {}", key, format_minimal(val));
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
