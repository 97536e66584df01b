//! JSON request bodies and query strings.
//!
//! Every field is optional so that missing values surface as per-field validation
//! messages instead of a generic deserialization failure.

use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize, Debug, Default)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct LogoutRequest {
    pub username: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct CreateMemeRequest {
    // Raw value so "7" and 7 are both accepted and anything else is a field error
    pub template: Option<Value>,
    pub top_text: Option<String>,
    pub bottom_text: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct CreateTemplateRequest {
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub default_top_text: Option<String>,
    pub default_bottom_text: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct RateMemeRequest {
    pub score: Option<Value>,
}

#[derive(Deserialize, Debug, Default)]
pub struct MemeListQuery {
    pub page: Option<String>,
    pub ordering: Option<String>,
}

/// Reads an integer that may arrive as a JSON number or a numeric string.
pub fn integer_field(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
