use serde_json::{Map, Value};

const LENGTH_AT_LEAST: &str = "lengthAtLeast";
const CONTAINS_AT_LEAST: &str = "containsAtLeast";
const SHOULD_CONTAIN: &str = "shouldContain";
const IDENTICAL_CHARS: &str = "identicalChars";

/// Flattens the password policy returned as `description` by the sign up endpoint into a single
/// message listing the rules the password failed. Verified rules are skipped.
pub(crate) fn flatten(description: &Map<String, Value>) -> String {
    let Some(rules) = description.get("rules").and_then(Value::as_array) else {
        return String::new();
    };

    rules
        .iter()
        .filter_map(Value::as_object)
        .filter(|rule| !rule.get("verified").and_then(Value::as_bool).unwrap_or(false))
        .filter_map(describe_rule)
        .collect::<Vec<_>>()
        .join("; ")
}

fn describe_rule(rule: &Map<String, Value>) -> Option<String> {
    let message = rule.get("message").and_then(Value::as_str).unwrap_or_default();
    let format = rule
        .get("format")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    match rule.get("code").and_then(Value::as_str)? {
        LENGTH_AT_LEAST | IDENTICAL_CHARS => Some(fill(message, format)),
        CONTAINS_AT_LEAST | SHOULD_CONTAIN => {
            let items = rule
                .get("items")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item.get("message").and_then(Value::as_str))
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            Some(format!("{} {}", fill(message, format), items))
        }
        _ => None,
    }
}

/// Replaces every `%d` and `%s` placeholder with the next format argument.
fn fill(message: &str, args: &[Value]) -> String {
    let mut args = args.iter();
    let mut filled = String::with_capacity(message.len());
    let mut rest = message;
    while let Some(pos) = rest.find('%') {
        filled.push_str(&rest[..pos]);
        let placeholder = &rest[pos..];
        if placeholder.starts_with("%d") || placeholder.starts_with("%s") {
            match args.next() {
                Some(Value::String(s)) => filled.push_str(s),
                Some(Value::Number(n)) => match n.as_i64() {
                    Some(int) => filled.push_str(&int.to_string()),
                    None => filled.push_str(&n.to_string()),
                },
                Some(other) => filled.push_str(&other.to_string()),
                None => filled.push_str(&placeholder[..2]),
            }
            rest = &placeholder[2..];
        } else {
            filled.push('%');
            rest = &placeholder[1..];
        }
    }
    filled.push_str(rest);
    filled
}
