use std::collections::HashSet;
use std::hash::Hash;

use serde_json::Value;

/// The closed set of shapes a list-like input field can arrive in.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput<'a> {
    Absent,
    List(&'a [Value]),
    Csv(&'a str),
    Unsupported,
}

impl<'a> FieldInput<'a> {
    pub fn from_value(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => FieldInput::Absent,
            Some(Value::Array(items)) => FieldInput::List(items),
            Some(Value::String(s)) => FieldInput::Csv(s),
            Some(_) => FieldInput::Unsupported,
        }
    }

    /// Raw trimmed, non-empty entries in input order.
    fn entries(&self) -> Vec<String> {
        match self {
            FieldInput::Absent | FieldInput::Unsupported => Vec::new(),
            FieldInput::List(items) => items.iter().filter_map(scalar_to_trimmed).collect(),
            FieldInput::Csv(s) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

/// Coerces a list / CSV / absent field into an ordered set of strings.
/// Casing is preserved; matching code lower-cases on its own.
pub fn normalize_list_field(value: FieldInput<'_>) -> Vec<String> {
    dedup_preserving_order(value.entries())
}

/// Coerces a list / CSV / absent field into ascending unique `YYYY-MM-DD`
/// strings. Timestamps are cut at the `T`. Shape is checked, the calendar is
/// not: `2024-02-30` survives here and is dropped later by scoring.
pub fn normalize_date_list(value: FieldInput<'_>) -> Vec<String> {
    let mut dates: Vec<String> = value
        .entries()
        .into_iter()
        .map(|s| match s.split_once('T') {
            Some((date, _)) => date.trim().to_string(),
            None => s,
        })
        .filter(|s| is_iso_date_shaped(s))
        .collect();
    dates.sort();
    dates.dedup();
    dates
}

fn is_iso_date_shaped(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Stringifies a JSON scalar and trims it. Nulls, arrays and objects yield
/// nothing, as do blank strings.
pub fn scalar_to_trimmed(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    (!s.is_empty()).then_some(s)
}

/// Keeps the first occurrence of every item.
pub fn dedup_preserving_order<T: Eq + Hash + Clone>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
