//! Request body validation.
//!
//! A body type describes its fields with [`FieldSpec`]s and is parsed through
//! [`Schema`]; the [`Validated`] extractor runs that step before a handler
//! sees the request and answers `422` with a per-field error list otherwise.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Float,
}

/// A required body field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub loc: Vec<Value>,
    pub msg: String,
    pub input: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctx: Option<Value>,
}

impl FieldError {
    fn new(kind: &'static str, loc: Vec<Value>, msg: impl Into<String>, input: Value) -> Self {
        Self {
            kind,
            loc,
            msg: msg.into(),
            input,
            ctx: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationErrors {
    pub detail: Vec<FieldError>,
}

impl ValidationErrors {
    fn single(error: FieldError) -> Self {
        Self {
            detail: vec![error],
        }
    }

    fn missing_body() -> Self {
        Self::single(FieldError::new(
            "missing",
            vec![json!("body")],
            "Field required",
            Value::Null,
        ))
    }
}

impl IntoResponse for ValidationErrors {
    fn into_response(self) -> Response {
        (StatusCode::UNPROCESSABLE_ENTITY, Json(self)).into_response()
    }
}

pub trait Schema: Sized + Send {
    fn fields() -> &'static [FieldSpec];

    fn from_value(body: &Value) -> Result<Self, ValidationErrors>;

    fn from_bytes(body: &[u8]) -> Result<Self, ValidationErrors> {
        if body.is_empty() {
            return Err(ValidationErrors::missing_body());
        }

        let value: Value = serde_json::from_slice(body).map_err(|e| {
            let offset = if e.is_eof() {
                body.len()
            } else {
                byte_offset(body, e.line(), e.column())
            };
            let mut error = FieldError::new(
                "json_invalid",
                vec![json!("body"), json!(offset)],
                "JSON decode error",
                json!({}),
            );
            error.ctx = Some(json!({ "error": e.to_string() }));
            ValidationErrors::single(error)
        })?;

        Self::from_value(&value)
    }

    /// Validates a body that was not sent as JSON. It is never decoded, so
    /// any content fails as a non-object.
    fn from_raw(body: &[u8]) -> Result<Self, ValidationErrors> {
        if body.is_empty() {
            return Err(ValidationErrors::missing_body());
        }
        Self::from_value(&Value::String(String::from_utf8_lossy(body).into_owned()))
    }
}

/// Checks every field of `fields` against `body` and returns the parsed
/// values in declaration order. All failures are collected.
pub fn validate_fields(body: &Value, fields: &[FieldSpec]) -> Result<Vec<f64>, ValidationErrors> {
    let Some(object) = body.as_object() else {
        return Err(ValidationErrors::single(FieldError::new(
            "model_attributes_type",
            vec![json!("body")],
            "Input should be a valid dictionary or object to extract fields from",
            body.clone(),
        )));
    };

    let mut values = Vec::with_capacity(fields.len());
    let mut errors = Vec::new();

    for field in fields {
        let loc = vec![json!("body"), json!(field.name)];
        match object.get(field.name) {
            None => errors.push(FieldError::new(
                "missing",
                loc,
                "Field required",
                body.clone(),
            )),
            Some(raw) => match field.kind {
                FieldKind::Float => match parse_float(raw) {
                    Ok(value) => values.push(value),
                    Err((kind, msg)) => errors.push(FieldError::new(kind, loc, msg, raw.clone())),
                },
            },
        }
    }

    if errors.is_empty() {
        Ok(values)
    } else {
        Err(ValidationErrors { detail: errors })
    }
}

fn parse_float(raw: &Value) -> Result<f64, (&'static str, &'static str)> {
    match raw {
        Value::Number(number) => number
            .as_f64()
            .ok_or(("float_type", "Input should be a valid number")),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
            (
                "float_parsing",
                "Input should be a valid number, unable to parse string as a number",
            )
        }),
        _ => Err(("float_type", "Input should be a valid number")),
    }
}

// serde_json reports 1-based lines and columns.
fn byte_offset(body: &[u8], line: usize, column: usize) -> usize {
    let preceding: usize = body
        .split(|b| *b == b'\n')
        .take(line.saturating_sub(1))
        .map(|l| l.len() + 1)
        .sum();
    (preceding + column.saturating_sub(1)).min(body.len())
}

/// A missing content type counts as JSON, as do `application/json` and
/// `application/*+json`.
fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(header::CONTENT_TYPE) else {
        return true;
    };
    let Ok(value) = value.to_str() else {
        return false;
    };
    let essence = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

/// Extractor that parses and validates a JSON body against `T`'s schema.
#[derive(Debug, Clone)]
pub struct Validated<T>(pub T);

impl<S, T> FromRequest<S> for Validated<T>
where
    S: Send + Sync,
    T: Schema,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let json = is_json_content_type(req.headers());
        let body = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let parsed = if json {
            T::from_bytes(&body)
        } else {
            T::from_raw(&body)
        };

        parsed
            .map(Validated)
            .map_err(IntoResponse::into_response)
    }
}
