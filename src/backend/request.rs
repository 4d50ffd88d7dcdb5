use std::collections::HashMap;

use hyper::Method;
use serde_json::{Map, Value};

use crate::error::BackendError;

/// An intercepted call as the router sees it.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub body: Option<String>,
}

impl RouteRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: HashMap::new(),
            body: None,
        }
    }

    #[cfg(test)]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[cfg(test)]
    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.insert(key.to_string(), value.to_string());
        self
    }

    /// The body as a JSON object. A missing, blank or `null` body is an
    /// empty object; unparseable JSON is `MalformedBody`.
    pub fn json_object(&self, entity: &'static str) -> Result<Map<String, Value>, BackendError> {
        let Some(raw) = self.body.as_deref().filter(|b| !b.trim().is_empty()) else {
            return Ok(Map::new());
        };
        match serde_json::from_str::<Value>(raw).map_err(BackendError::MalformedBody)? {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Map::new()),
            other => Err(BackendError::InvalidRecord {
                entity,
                reason: format!("expected a JSON object, got {}", json_kind(&other)),
            }),
        }
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Target id: trailing path segment, then `?id=`, then `id` in the body.
    pub fn target_id(&self, tail: Option<&str>, body: &Map<String, Value>) -> Option<String> {
        if let Some(tail) = tail.filter(|t| !t.is_empty()) {
            return Some(tail.to_string());
        }
        if let Some(id) = self.query_param("id") {
            return Some(id.to_string());
        }
        match body.get("id") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
