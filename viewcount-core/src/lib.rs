pub use {
    http::StatusCode,
    crate::item::{AttributeValue, CounterRecord, Item, NumberError, RecordError, count_from_number},
};

use {
    std::collections::{BTreeMap, HashMap},
    serde::{Serialize, Deserialize},
};

mod item;

pub const ROOT_PATH: &str = "/";

pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Invocation payload delivered by a function url runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionUrlEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_query_string: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_context: Option<RequestContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl FunctionUrlEvent {
    pub fn new() -> Self {
        Self {
            version: Some("2.0".to_owned()),
            ..Self::default()
        }
    }

    pub fn with_raw_path(mut self, raw_path: impl Into<String>) -> Self {
        self.raw_path = Some(raw_path.into());
        self
    }

    pub fn with_raw_query_string(mut self, raw_query_string: impl Into<String>) -> Self {
        self.raw_query_string = Some(raw_query_string.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        let context = self.request_context.get_or_insert_with(RequestContext::default);
        context.http.get_or_insert_with(RequestContextHttp::default).method = Some(method.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Request path, `/` when the runtime did not provide one.
    pub fn path(&self) -> &str {
        self.raw_path.as_deref().unwrap_or(ROOT_PATH)
    }

    pub fn method(&self) -> Option<&str> {
        self.request_context.as_ref()
            .and_then(|v| v.http.as_ref())
            .and_then(|v| v.method.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<RequestContextHttp>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContextHttp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<String>,
}

/// Result of an invocation, turned into an http response by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionUrlResponse {
    #[serde(with = "http_serde::status_code")]
    pub status_code: StatusCode,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: String,
}

impl FunctionUrlResponse {
    pub fn new(status_code: StatusCode) -> Self {
        Self {
            status_code,
            headers: BTreeMap::new(),
            body: String::new(),
        }
    }

    pub fn no_content() -> Self {
        Self::new(StatusCode::NO_CONTENT)
    }

    /// Json body with headers that allow the response to be read from any origin.
    pub fn json(status_code: StatusCode, body: impl Into<String>) -> Self {
        Self::new(status_code)
            .with_header(HEADER_CONTENT_TYPE, CONTENT_TYPE_JSON)
            .with_header(HEADER_ALLOW_ORIGIN, "*")
            .with_body(body)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewCountBody {
    pub view_count: u64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}
