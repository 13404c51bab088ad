//! Response and error envelopes handed back to the transport.

use serde_json::{json, Map, Value as Json};

use crate::error::ApiError;
use crate::id::RequestId;
use crate::query::Page;

/// Field carrying the correlation id on success.
pub const REQUEST_ID_FIELD: &str = "requestId";
/// Field carrying the continuation token.
pub const NEXT_TOKEN_FIELD: &str = "nextToken";

/// Body a handler returns; field names follow the target API.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseBody {
    fields: Map<String, Json>,
}

impl ResponseBody {
    /// Creates an empty body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Json>) -> Option<Json> {
        self.fields.insert(key.into(), value.into())
    }

    /// Builder-style [`ResponseBody::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Json>) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds a page of items under `items_key`, plus `nextToken` when more
    /// records remain.
    #[must_use]
    pub fn with_page(mut self, items_key: impl Into<String>, page: Page<Json>) -> Self {
        self.insert(items_key, Json::Array(page.items));
        if let Some(token) = page.next_token {
            self.insert(NEXT_TOKEN_FIELD, token);
        }
        self
    }

    /// Field `key`, if set.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Json> {
        self.fields.get(key)
    }

    /// Body as a JSON object.
    #[must_use]
    pub fn into_json(self) -> Json {
        Json::Object(self.fields)
    }
}

/// Successful dispatch result.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionResponse {
    /// Id of the request that produced this response.
    pub request_id: RequestId,
    /// Action-specific fields.
    pub body: ResponseBody,
}

impl ActionResponse {
    /// Body fields plus `requestId`.
    #[must_use]
    pub fn to_json(&self) -> Json {
        let mut fields = self.body.fields.clone();
        fields.insert(REQUEST_ID_FIELD.to_string(), Json::String(self.request_id.to_string()));
        Json::Object(fields)
    }
}

/// Error envelope: `{"Errors": {"Error": {"Code", "Message"}}, "RequestID"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Id of the failed request.
    pub request_id: RequestId,
    /// HTTP status.
    pub status: u16,
    /// Wire error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl ErrorResponse {
    /// Renders `error` for request `request_id`.
    #[must_use]
    pub fn new(error: &ApiError, request_id: RequestId) -> Self {
        Self {
            request_id,
            status: error.http_status(),
            code: error.code(),
            message: error.to_string(),
        }
    }

    /// Wire envelope: `Errors.Error.{Code,Message}` plus `RequestID`.
    #[must_use]
    pub fn to_json(&self) -> Json {
        json!({
            "Errors": {
                "Error": {
                    "Code": self.code,
                    "Message": self.message,
                }
            },
            "RequestID": self.request_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::IdAllocator;
    use crate::resource::ResourceKind;

    #[test]
    fn test_with_page_token_only_when_present() {
        let last = Page {
            items: vec![json!({"id": 1})],
            next_token: None,
        };
        let body = ResponseBody::new().with_page("items", last);
        assert_eq!(body.get("items"), Some(&json!([{"id": 1}])));
        assert!(body.get(NEXT_TOKEN_FIELD).is_none());

        let more = Page {
            items: vec![],
            next_token: Some("5".to_string()),
        };
        let body = ResponseBody::new().with_page("items", more);
        assert_eq!(body.get(NEXT_TOKEN_FIELD), Some(&json!("5")));
    }

    #[test]
    fn test_action_response_carries_request_id() {
        let request_id = IdAllocator::seeded(1).allocate_request_id();
        let response = ActionResponse {
            request_id,
            body: ResponseBody::new().with("return", true),
        };
        let json = response.to_json();
        assert_eq!(json["return"], json!(true));
        assert_eq!(json[REQUEST_ID_FIELD], json!(request_id.to_string()));
    }

    #[test]
    fn test_error_envelope() {
        let request_id = IdAllocator::seeded(2).allocate_request_id();
        let err = ApiError::not_found(ResourceKind::Snapshot, "snap-1");
        let envelope = ErrorResponse::new(&err, request_id);
        assert_eq!(envelope.status, 400);

        let json = envelope.to_json();
        assert_eq!(json["Errors"]["Error"]["Code"], json!("InvalidSnapshot.NotFound"));
        assert!(json["Errors"]["Error"]["Message"]
            .as_str()
            .unwrap()
            .contains("snap-1"));
        assert_eq!(json["RequestID"], json!(request_id.to_string()));
    }
}
