// API client module: a small blocking HTTP client bound to one endpoint
// and bearer token, plus the record shape the endpoint accepts.

use std::fmt;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Serialize;

use crate::error::ApiError;
use crate::upload::RecordSink;

/// Resource path, relative to the endpoint, of the bulk upsert call.
pub const PUT_MANY_PATH: &str = "passfaildrop/many";

/// Academic term. Serialized as `FALL`, `SPRING` or `SUMMER`.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Semester {
    Fall,
    Spring,
    Summer,
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Semester::Fall => "FALL",
            Semester::Spring => "SPRING",
            Semester::Summer => "SUMMER",
        };
        f.write_str(name)
    }
}

/// One course section's pass/fail/drop counts for a term. This is the
/// unit the endpoint upserts; field names mirror the backend's JSON.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PassFailDrop {
    pub course_subject: String,
    pub course_crse: String,
    pub year: i32,
    pub semester: Semester,
    pub section: String,
    pub failed: u32,
    pub dropped: u32,
    pub total: u32,
}

/// Where to upload and how to authenticate. Collected at runtime.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub endpoint: String,
    pub token: String,
}

/// Blocking client holding a reqwest client with the Authorization header
/// preset, and the endpoint all paths are resolved against.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    endpoint: String,
}

impl ApiClient {
    /// Build a client for `credentials`. Neither value is validated here
    /// beyond the token being usable as a header; a bad endpoint or token
    /// shows up on the first request.
    pub fn new(credentials: &Credentials) -> Result<Self, ApiError> {
        let client = Client::builder()
            .default_headers(auth_headers(&credentials.token)?)
            .build()
            .map_err(ApiError::Client)?;
        Ok(ApiClient {
            client,
            endpoint: credentials.endpoint.clone(),
        })
    }

    /// The endpoint this client talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// PUT every record in one request to `<endpoint>/passfaildrop/many`.
    /// The response body is only read to report a failure.
    pub fn put_many_pass_fail_drop(&self, records: &[PassFailDrop]) -> Result<(), ApiError> {
        let url = resolve_url(&self.endpoint, PUT_MANY_PATH);
        log::debug!("PUT {} ({} records)", url, records.len());
        let res = self.client.put(&url).json(records).send()?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

impl RecordSink for ApiClient {
    fn put_many(&mut self, records: &[PassFailDrop]) -> Result<(), ApiError> {
        self.put_many_pass_fail_drop(records)
    }
}

/// Join `path` onto `endpoint` with exactly one slash between them.
pub fn resolve_url(endpoint: &str, path: &str) -> String {
    format!(
        "{}/{}",
        endpoint.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn auth_headers(token: &str) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    let mut value =
        HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| ApiError::InvalidToken)?;
    value.set_sensitive(true);
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}
