//! Binding resolver
//!
//! Test fields are templates: a string wrapped in parentheses is an expression,
//! anything else is taken literally.
//!
//! Expression grammar:
//! - `$name` followed by any number of `.field` or `[index]` accessors
//! - `'text'` for a quoted literal
//!
//! Example:
//! ```
//! use common::{template, Bindings};
//! use serde_json::json;
//!
//! let bindings = Bindings::new().register("test", json!({"id": 3}));
//! assert_eq!(template::convert_string("($test.id)", &bindings).unwrap(), "3");
//! assert_eq!(template::convert_string("plain", &bindings).unwrap(), "plain");
//! ```

use crate::bindings::Bindings;
use serde_json::{Map, Value};
use thiserror::Error;

/// Template resolution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("malformed expression '{0}'")]
    Malformed(String),

    #[error("variable not defined: ${0}")]
    Undefined(String),

    #[error("'{path}' not found while evaluating '{expr}'")]
    MissingField { expr: String, path: String },

    #[error("expression '{0}' did not resolve to a string")]
    NotAString(String),
}

/// Return the inner expression if `template` is of the form `( ... )`
pub fn expression(template: &str) -> Option<&str> {
    let trimmed = template.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('(') && trimmed.ends_with(')') {
        Some(trimmed[1..trimmed.len() - 1].trim())
    } else {
        None
    }
}

enum Accessor<'a> {
    Field(&'a str),
    Index(usize),
}

/// Evaluate a bare expression (without the surrounding parentheses)
pub fn resolve(expr: &str, bindings: &Bindings) -> Result<Value, TemplateError> {
    let expr = expr.trim();
    let malformed = || TemplateError::Malformed(expr.to_string());

    if expr.len() >= 2 && expr.starts_with('\'') && expr.ends_with('\'') {
        return Ok(Value::String(expr[1..expr.len() - 1].to_string()));
    }

    let rest = expr.strip_prefix('$').ok_or_else(malformed)?;
    let name_end = rest
        .find(|c: char| c == '.' || c == '[')
        .unwrap_or(rest.len());
    let (name, mut rest) = rest.split_at(name_end);
    crate::bindings::check_name(name).map_err(|_| malformed())?;

    let mut accessors = Vec::new();
    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix('.') {
            let end = tail
                .find(|c: char| c == '.' || c == '[')
                .unwrap_or(tail.len());
            if end == 0 {
                return Err(malformed());
            }
            accessors.push(Accessor::Field(&tail[..end]));
            rest = &tail[end..];
        } else if let Some(tail) = rest.strip_prefix('[') {
            let end = tail.find(']').ok_or_else(malformed)?;
            let index = tail[..end].trim().parse::<usize>().map_err(|_| malformed())?;
            accessors.push(Accessor::Index(index));
            rest = &tail[end + 1..];
        } else {
            return Err(malformed());
        }
    }

    let mut current = bindings
        .get(name)
        .ok_or_else(|| TemplateError::Undefined(name.to_string()))?;
    let mut path = format!("${}", name);
    for accessor in accessors {
        let next = match accessor {
            Accessor::Field(field) => {
                path.push('.');
                path.push_str(field);
                current.get(field)
            }
            Accessor::Index(index) => {
                path.push_str(&format!("[{}]", index));
                current.get(index)
            }
        };
        current = next.ok_or_else(|| TemplateError::MissingField {
            expr: expr.to_string(),
            path: path.clone(),
        })?;
    }

    Ok(current.clone())
}

/// Resolve a templated field to a literal string
pub fn convert_string(template: &str, bindings: &Bindings) -> Result<String, TemplateError> {
    let Some(expr) = expression(template) else {
        return Ok(template.to_string());
    };
    match resolve(expr, bindings)? {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(TemplateError::NotAString(expr.to_string())),
    }
}

/// Resolve every templated string (values and keys) in a JSON document
pub fn convert_value(value: &Value, bindings: &Bindings) -> Result<Value, TemplateError> {
    match value {
        Value::String(s) => match expression(s) {
            Some(expr) => resolve(expr, bindings),
            None => Ok(value.clone()),
        },
        Value::Array(items) => items
            .iter()
            .map(|item| convert_value(item, bindings))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(fields) => {
            let mut out = Map::with_capacity(fields.len());
            for (key, field) in fields {
                out.insert(
                    convert_string(key, bindings)?,
                    convert_value(field, bindings)?,
                );
            }
            Ok(Value::Object(out))
        }
        _ => Ok(value.clone()),
    }
}

/// Deep merge `overlay` into `base`; objects merge key by key, anything else is replaced
pub fn merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            let mut out = base.clone();
            for (key, value) in overlay {
                let merged = match out.get(key) {
                    Some(existing) => merge(existing, value),
                    None => value.clone(),
                };
                out.insert(key.clone(), merged);
            }
            Value::Object(out)
        }
        (_, overlay) => overlay.clone(),
    }
}
