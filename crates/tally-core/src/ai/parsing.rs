//! Parsing helpers for provider responses
//!
//! Models often wrap their answer in prose or markdown code fences. These
//! helpers dig out the part we need: a JSON object, the first integer, or the
//! first currency-like amount.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use super::ProviderError;

fn integer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("valid regex"))
}

fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$?\d+\.?\d*").expect("valid regex"))
}

/// Truncate long text for log and error messages
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}

/// Remove a surrounding markdown code fence (```json ... ```), if present
pub fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening line.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// Extract the JSON object embedded in a provider response
pub fn extract_json_object(response: &str) -> Result<Map<String, Value>, ProviderError> {
    let response = strip_code_fences(response);

    let start = response.find('{');
    let end = response.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => {
            let json_str = &response[s..=e];
            match serde_json::from_str::<Value>(json_str) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(_) => Err(ProviderError::InvalidResponse(format!(
                    "Expected a JSON object | Raw: {}",
                    truncate(json_str, 200)
                ))),
                Err(e) => Err(ProviderError::InvalidResponse(format!(
                    "Invalid JSON from provider: {} | Raw: {}",
                    e,
                    truncate(json_str, 200)
                ))),
            }
        }
        _ => Err(ProviderError::InvalidResponse(format!(
            "No JSON found in provider response | Raw: {}",
            truncate(response, 200)
        ))),
    }
}

/// First run of digits in the text
pub fn first_integer(text: &str) -> Option<i64> {
    integer_re()
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
}

/// First currency-like token (`$12`, `12.50`, `7.`) in the text
pub fn first_amount(text: &str) -> Option<Decimal> {
    let token = amount_re().find(text)?.as_str();
    parse_amount(token)
}

/// Parse an amount string, tolerating a leading `$` and a trailing `.`
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned = raw.trim().trim_start_matches('$').trim_end_matches('.');
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(cleaned).ok()
}

/// Amount from a JSON value: a number, a numeric string, or null
pub fn amount_from_value(value: &Value) -> Option<Decimal> {
    match value {
        // Go through the decimal text so 12.3 stays 12.3
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok())),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

/// Integer from a JSON value: a number or a string containing one
pub fn integer_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => first_integer(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_extract_json_with_surrounding_text() {
        let response = "Here you go:\n```json\n{\"amount\": 12.5, \"description\": \"Lunch\"}\n```\nDone!";
        let map = extract_json_object(response).unwrap();
        assert_eq!(map["description"], "Lunch");
    }

    #[test]
    fn test_extract_json_failures() {
        assert!(matches!(
            extract_json_object("no json here"),
            Err(ProviderError::InvalidResponse(_))
        ));
        assert!(extract_json_object("{not valid}").is_err());
        assert!(extract_json_object("} backwards {").is_err());
    }

    #[test]
    fn test_first_integer() {
        assert_eq!(first_integer("The answer is 3."), Some(3));
        assert_eq!(first_integer("10"), Some(10));
        assert_eq!(first_integer("none"), None);
    }

    #[test]
    fn test_first_amount() {
        assert_eq!(first_amount("$25 coffee"), Some(Decimal::from(25)));
        assert_eq!(
            first_amount("lunch 12.75 at noon"),
            Some(Decimal::from_str("12.75").unwrap())
        );
        assert_eq!(first_amount("paid 7. dollars"), Some(Decimal::from(7)));
        assert_eq!(first_amount("coffee"), None);
    }

    #[test]
    fn test_amount_from_value() {
        assert_eq!(
            amount_from_value(&json!(12.3)),
            Some(Decimal::from_str("12.3").unwrap())
        );
        assert_eq!(amount_from_value(&json!("$8.50")), Some(Decimal::from_str("8.50").unwrap()));
        assert_eq!(amount_from_value(&json!(null)), None);
        assert_eq!(amount_from_value(&json!("cheap")), None);
    }

    #[test]
    fn test_integer_from_value() {
        assert_eq!(integer_from_value(&json!(4)), Some(4));
        assert_eq!(integer_from_value(&json!("category 7")), Some(7));
        assert_eq!(integer_from_value(&json!(true)), None);
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("ñandú", 2), "ña...");
        assert_eq!(truncate("short", 10), "short");
    }
}
