//! Request validation from form schemas.

use crate::error::FieldErrors;
use crate::model::as_flag;
use crate::resource::{FormField, FormSchema, InputType, Widget};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use validator::ValidateEmail;

static TEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+]*[(]{0,1}[0-9]{1,4}[)]{0,1}[-\s\./0-9]*$").expect("Invalid regex"));

pub struct FormValidator;

impl FormValidator {
    /// Validate a full submission. Returns the normalized values of the form's
    /// fields; keys outside the form are dropped. Nothing is returned on error.
    pub fn validate(form: &FormSchema, body: &Map<String, Value>) -> Result<Map<String, Value>, FieldErrors> {
        let mut out = Map::new();
        let mut errors = FieldErrors::new();
        for field in &form.fields {
            let raw = body.get(&field.name);
            if raw.is_none() && field.widget != Widget::Toggle && !field.required {
                continue;
            }
            match validate_field(field, raw) {
                Ok(v) => {
                    out.insert(field.name.clone(), v);
                }
                Err(msg) => errors.add(&field.name, msg),
            }
        }
        errors.into_result().map(|_| out)
    }

    /// Validate only the fields present in body (inline edits). Required is
    /// enforced for present fields but not for missing ones.
    pub fn validate_partial(form: &FormSchema, body: &Map<String, Value>) -> Result<Map<String, Value>, FieldErrors> {
        let mut out = Map::new();
        let mut errors = FieldErrors::new();
        for (name, raw) in body {
            let Some(field) = form.field(name) else { continue };
            match validate_field(field, Some(raw)) {
                Ok(v) => {
                    out.insert(name.clone(), v);
                }
                Err(msg) => errors.add(name, msg),
            }
        }
        errors.into_result().map(|_| out)
    }
}

/// Trim strings; blank strings count as missing.
fn normalize(v: Option<&Value>) -> Value {
    match v {
        None => Value::Null,
        Some(Value::String(s)) => {
            let t = s.trim();
            if t.is_empty() {
                Value::Null
            } else {
                Value::String(t.to_string())
            }
        }
        Some(other) => other.clone(),
    }
}

fn validate_field(field: &FormField, raw: Option<&Value>) -> Result<Value, String> {
    let label = &field.label;
    let v = normalize(raw);

    // An untouched switch is off.
    if field.widget == Widget::Toggle {
        if v.is_null() {
            return Ok(Value::Bool(false));
        }
        return as_flag(&v)
            .map(Value::Bool)
            .ok_or_else(|| format!("{} must be true or false", label));
    }

    if v.is_null() {
        if field.required {
            return Err(format!("{} is required", label));
        }
        return Ok(Value::Null);
    }

    if field.input_type == Some(InputType::Numeric) {
        return match &v {
            Value::Number(n) if n.is_i64() => Ok(v.clone()),
            Value::String(s) => s
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| format!("{} must be a number", label)),
            _ => Err(format!("{} must be a number", label)),
        };
    }

    let s = match &v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return Err(format!("{} must be a string", label)),
    };

    if let Some(max) = field.max_length {
        if s.chars().count() > max {
            return Err(format!("{} may not be greater than {} characters", label, max));
        }
    }

    if field.widget == Widget::Select && !field.has_option(&s) {
        return Err(format!("The selected {} is invalid", label));
    }

    match field.input_type {
        Some(InputType::Email) if !s.validate_email() => {
            Err(format!("{} must be a valid email address", label))
        }
        Some(InputType::Tel) if !TEL_RE.is_match(&s) => Err(format!("{} format is invalid", label)),
        _ => Ok(Value::String(s)),
    }
}
