use crate::{
    error::SyncError,
    types::{header_json, DynamicSettings, Header, HttpMethod},
};
use log::{debug, info};
use reqwest::blocking::Client;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct SyncRequest {
    pub endpoint: String,
    pub method: HttpMethod,
    pub headers: Vec<Header>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSync {
    pub endpoint: String,
    pub method: HttpMethod,
    pub headers: Map<String, Value>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncedResponse {
    pub status: u16,
    pub reason: String,
    pub raw: String,
    pub display: String,
}

impl SyncRequest {
    pub fn from_settings(settings: &DynamicSettings) -> Self {
        let body = if settings.request_json.is_null() {
            String::new()
        } else {
            serde_json::to_string_pretty(&settings.request_json).unwrap_or_default()
        };
        Self {
            endpoint: settings.endpoint.clone(),
            method: settings.http_method,
            headers: settings.headers(),
            body,
        }
    }

    pub fn prepare(&self) -> Result<PreparedSync, SyncError> {
        if self.endpoint.trim().is_empty() {
            return Err(SyncError::Validation(
                "Please provide an endpoint URL.".to_string(),
            ));
        }
        let body = if self.method.has_body() {
            let parsed = if self.body.trim().is_empty() {
                Value::Object(Map::new())
            } else {
                serde_json::from_str(&self.body).map_err(|e| {
                    debug!("Request body rejected: {}", e);
                    SyncError::Validation(
                        "Request JSON is invalid. Please fix it before syncing.".to_string(),
                    )
                })?
            };
            Some(parsed)
        } else {
            None
        };
        Ok(PreparedSync {
            endpoint: self.endpoint.clone(),
            method: self.method,
            headers: header_json(&self.headers),
            body,
        })
    }
}

pub fn sync(http: &Client, request: &SyncRequest) -> Result<SyncedResponse, SyncError> {
    let prepared = request.prepare()?;
    info!("{} {}", prepared.method.as_str(), prepared.endpoint);
    let mut builder = http.request(prepared.method.into(), &prepared.endpoint);
    for (k, v) in &prepared.headers {
        if let Some(v) = v.as_str() {
            builder = builder.header(k.as_str(), v);
        }
    }
    if let Some(body) = &prepared.body {
        builder = builder.json(body);
    }
    let response = builder.send()?;
    let status = response.status();
    let raw = response.text()?;
    classify(status.as_u16(), status.canonical_reason(), raw)
}

pub fn classify(status: u16, reason: Option<&str>, raw: String) -> Result<SyncedResponse, SyncError> {
    if !(200..300).contains(&status) {
        let body = if !raw.is_empty() {
            raw
        } else {
            reason.unwrap_or("Unknown error").to_string()
        };
        return Err(SyncError::Status { status, body });
    }
    let display = match serde_json::from_str::<Value>(&raw) {
        Ok(Value::String(s)) => s,
        Ok(v) => serde_json::to_string_pretty(&v).unwrap_or_else(|_| raw.clone()),
        Err(_) => raw.clone(),
    };
    Ok(SyncedResponse {
        status,
        reason: reason.unwrap_or("OK").to_string(),
        raw,
        display,
    })
}
