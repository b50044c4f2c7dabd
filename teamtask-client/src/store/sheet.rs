//! HTTP implementation of the remote store protocol
//!
//! Every operation is a POST to one configured endpoint URL with a JSON
//! envelope:
//!
//! ```text
//! { "action": "READ" | "CREATE" | "UPDATE", "sheet": "Users" | "Tasks", ... }
//! ```
//!
//! and every response is a JSON envelope:
//!
//! ```text
//! { "status": "success" | "error", "data": [...]?, "message": "..."? }
//! ```
//!
//! The request content type is `text/plain;charset=utf-8`: the
//! spreadsheet gateway only accepts simple requests, and that MIME type
//! avoids a CORS preflight.

use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use teamtask_shared::models::{Task, User};
use uuid::Uuid;

use super::{RecordStore, Sheet, StoreError, StoreResult, TaskUpdate, UserUpdate};

/// Content type the spreadsheet gateway accepts without a preflight
const CONTENT_TYPE: &str = "text/plain;charset=utf-8";

/// Checklist appended to setup-probe failures
const TROUBLESHOOTING: &str = "Check that:
  1. the web app deployment permits access by \"Anyone\" (the most common cause)
  2. the URL ends in /exec
  3. you are not connecting through a private-browsing profile that strips the request";

/// Setup probe error types
///
/// Probe failures are shown to the user verbatim, so each variant
/// carries the troubleshooting checklist.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// URL is not plausibly an HTTP endpoint
    #[error("endpoint URL must start with http:// or https://")]
    InvalidUrl,

    /// The request never produced a response body
    #[error("could not reach the endpoint: {source}\n{TROUBLESHOOTING}")]
    Unreachable {
        /// Underlying transport failure
        #[source]
        source: reqwest::Error,
    },

    /// The response body was not JSON (typically an HTML error or
    /// sign-in page)
    #[error("endpoint returned non-JSON content ({detail}); this is usually an HTML error page\n{TROUBLESHOOTING}")]
    NotJson {
        /// First bytes of the offending body
        detail: String,
    },

    /// The body parsed as JSON but carries no recognizable status field
    #[error("endpoint response has no recognizable status field; is the endpoint script correct?\n{TROUBLESHOOTING}")]
    UnrecognizedEnvelope,
}

/// Response envelope returned by the endpoint
#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
    /// "success" or "error"
    status: String,

    /// Record array for READ operations; absent means empty
    #[serde(default)]
    data: Option<JsonValue>,

    /// Human-readable failure message when status is "error"
    #[serde(default)]
    message: Option<String>,
}

/// Remote store over the single-endpoint spreadsheet protocol
#[derive(Debug, Clone)]
pub struct SheetStore {
    client: reqwest::Client,
    endpoint: String,
}

impl SheetStore {
    /// Creates a store bound to `endpoint`
    pub fn new(endpoint: String) -> Self {
        SheetStore {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// The configured endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends one envelope and parses the response envelope
    ///
    /// Does not interpret the `status` field; [`Self::call`] does.
    async fn send(&self, body: JsonValue) -> StoreResult<ResponseEnvelope> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .body(body.to_string())
            .send()
            .await?;

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|_| StoreError::InvalidResponse(truncate(&text, 200)))
    }

    /// Sends one envelope and maps an error status into `StoreError`
    async fn call(&self, action: &str, sheet: Sheet, mut body: JsonValue) -> StoreResult<ResponseEnvelope> {
        body["action"] = json!(action);
        body["sheet"] = json!(sheet.as_str());

        let envelope = self.send(body).await?;
        match envelope.status.as_str() {
            "success" => Ok(envelope),
            "error" => Err(StoreError::Remote(
                envelope
                    .message
                    .unwrap_or_else(|| "unknown endpoint error".to_string()),
            )),
            other => Err(StoreError::InvalidResponse(format!(
                "unexpected status {:?}",
                other
            ))),
        }
    }

    /// Reads the full record array of one collection
    async fn read<T: serde::de::DeserializeOwned>(&self, sheet: Sheet) -> StoreResult<Vec<T>> {
        let envelope = self.call("READ", sheet, json!({})).await?;
        match envelope.data {
            // Absent data means an empty collection.
            None | Some(JsonValue::Null) => Ok(Vec::new()),
            Some(data) => serde_json::from_value(data)
                .map_err(|e| StoreError::InvalidResponse(format!("malformed {} record: {}", sheet.as_str(), e))),
        }
    }

    /// Appends one record to a collection
    async fn create<T: serde::Serialize>(&self, sheet: Sheet, item: &T) -> StoreResult<()> {
        self.call("CREATE", sheet, json!({ "item": item })).await?;
        Ok(())
    }

    /// Overwrites the named fields of the record matching `id`
    async fn update<T: serde::Serialize>(&self, sheet: Sheet, id: Uuid, updates: &T) -> StoreResult<()> {
        self.call("UPDATE", sheet, json!({ "id": id, "updates": updates }))
            .await?;
        Ok(())
    }

    /// Verifies that `endpoint` hosts a live copy of the store script
    ///
    /// Issues `READ Users` and accepts any recognizable envelope: a
    /// `status` of `"error"` still proves the script is reachable and
    /// running (the sheet may simply not exist yet). Anything else is
    /// rejected with a diagnostic enumerating the common
    /// misconfiguration causes.
    pub async fn probe(&self) -> Result<(), ProbeError> {
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ProbeError::InvalidUrl);
        }

        let body = json!({ "action": "READ", "sheet": Sheet::Users.as_str() });
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .body(body.to_string())
            .send()
            .await
            .map_err(|source| ProbeError::Unreachable { source })?;

        let text = response
            .text()
            .await
            .map_err(|source| ProbeError::Unreachable { source })?;

        let envelope: ResponseEnvelope = serde_json::from_str(&text)
            .map_err(|_| ProbeError::NotJson { detail: truncate(&text, 120) })?;

        match envelope.status.as_str() {
            "success" | "error" => Ok(()),
            _ => Err(ProbeError::UnrecognizedEnvelope),
        }
    }
}

#[async_trait::async_trait]
impl RecordStore for SheetStore {
    async fn read_users(&self) -> StoreResult<Vec<User>> {
        self.read(Sheet::Users).await
    }

    async fn create_user(&self, user: &User) -> StoreResult<()> {
        self.create(Sheet::Users, user).await
    }

    async fn update_user(&self, id: Uuid, updates: UserUpdate) -> StoreResult<()> {
        self.update(Sheet::Users, id, &updates).await
    }

    async fn read_tasks(&self) -> StoreResult<Vec<Task>> {
        self.read(Sheet::Tasks).await
    }

    async fn create_task(&self, task: &Task) -> StoreResult<()> {
        self.create(Sheet::Tasks, task).await
    }

    async fn update_task(&self, id: Uuid, updates: TaskUpdate) -> StoreResult<()> {
        self.update(Sheet::Tasks, id, &updates).await
    }
}

/// Clips a response body for inclusion in an error message
fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        text.to_string()
    } else {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &text[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_parsing() {
        let envelope: ResponseEnvelope =
            serde_json::from_str(r#"{"status":"success","data":[]}"#).unwrap();
        assert_eq!(envelope.status, "success");
        assert!(envelope.message.is_none());

        let envelope: ResponseEnvelope =
            serde_json::from_str(r#"{"status":"error","message":"Sheet not found"}"#).unwrap();
        assert_eq!(envelope.status, "error");
        assert_eq!(envelope.message.as_deref(), Some("Sheet not found"));

        // Missing data is fine; READ treats it as an empty collection.
        let envelope: ResponseEnvelope = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 200), "short");
        let clipped = truncate("héllo wörld", 6);
        assert!(clipped.ends_with('…'));
        assert!(clipped.len() <= 6 + '…'.len_utf8());
    }

    #[tokio::test]
    async fn test_probe_rejects_non_http_url() {
        // Probe short-circuits on the URL check before any IO.
        let store = SheetStore::new("ftp://example.com/exec".to_string());
        let err = store.probe().await.unwrap_err();
        assert!(matches!(err, ProbeError::InvalidUrl));
    }
}
