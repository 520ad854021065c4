//! SiYuan kernel HTTP API client.
//!
//! Every kernel endpoint is a JSON POST answered with a `{code, msg, data}` envelope;
//! `code != 0` is an application error. File downloads (`/api/file/getFile`) answer with
//! raw bytes on success and a JSON envelope otherwise.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{AudioBlob, AudioSource, BlockInfo, BlockStore, HostError, Notifier, Severity};

/// Default kernel address of a local SiYuan installation.
pub const DEFAULT_KERNEL_URL: &str = "http://127.0.0.1:6806";

/// How long pushed notifications stay on screen, in milliseconds.
const NOTIFY_TIMEOUT_MS: u64 = 7000;

#[derive(Debug, Deserialize)]
struct KernelEnvelope<T> {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct DomData {
    dom: String,
}

#[derive(Debug, Deserialize)]
struct KramdownData {
    kramdown: String,
}

#[derive(Debug, Serialize)]
struct InsertBlockRequest<'a> {
    #[serde(rename = "dataType")]
    data_type: &'a str,
    data: &'a str,
    #[serde(rename = "nextID", skip_serializing_if = "Option::is_none")]
    next_id: Option<&'a str>,
    #[serde(rename = "previousID", skip_serializing_if = "Option::is_none")]
    previous_id: Option<&'a str>,
    #[serde(rename = "parentID", skip_serializing_if = "Option::is_none")]
    parent_id: Option<&'a str>,
}

/// Client for a running SiYuan kernel.
#[derive(Debug, Clone)]
pub struct KernelClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl KernelClient {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        let base_url = match base_url.trim().trim_end_matches('/') {
            "" => DEFAULT_KERNEL_URL.to_string(),
            url => url.to_string(),
        };
        Self {
            client: reqwest::Client::new(),
            base_url,
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    fn post(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let request = self.client.post(format!("{}{endpoint}", self.base_url));
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Token {token}")),
            None => request,
        }
    }

    /// Calls a JSON endpoint and unwraps the envelope's `data`.
    async fn call<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<Option<T>, HostError> {
        tracing::debug!("Kernel call: POST {}", endpoint);

        let response = self.post(endpoint).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HostError::Api {
                code: i64::from(status.as_u16()),
                msg: format!("{endpoint} returned HTTP {status}"),
            });
        }

        let envelope: KernelEnvelope<T> = response
            .json()
            .await
            .map_err(|e| HostError::Decode(format!("{endpoint}: {e}")))?;
        if envelope.code != 0 {
            return Err(HostError::Api {
                code: envelope.code,
                msg: envelope.msg,
            });
        }
        Ok(envelope.data)
    }
}

/// Checks that `id` looks like a SiYuan block id (`20240101120000-abc1234`).
///
/// Ids end up inside SQL statements, so anything else is rejected outright.
pub fn validate_block_id(id: &str) -> Result<(), HostError> {
    static BLOCK_ID: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = BLOCK_ID
        .get_or_init(|| Regex::new(r"^[0-9]{14}-[0-9a-z]{7}$").ok())
        .as_ref();
    match pattern {
        Some(re) if re.is_match(id) => Ok(()),
        _ => Err(HostError::InvalidBlockId(id.to_string())),
    }
}

/// Maps an asset reference to the workspace path `getFile` expects.
///
/// `/assets/a.wav` and `assets/a.wav` live under `/data/assets/`; percent-encoding from
/// URL-derived references is decoded.
fn workspace_path(reference: &str) -> String {
    let decoded = urlencoding::decode(reference)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| reference.to_string());

    if decoded.starts_with("/assets/") {
        format!("/data{decoded}")
    } else if decoded.starts_with("assets/") {
        format!("/data/{decoded}")
    } else {
        decoded
    }
}

#[async_trait]
impl AudioSource for KernelClient {
    async fn fetch(&self, path: &str) -> Result<Option<AudioBlob>, HostError> {
        let workspace_path = workspace_path(path);
        tracing::debug!("Fetching audio {} (workspace path {})", path, workspace_path);

        let response = self
            .post("/api/file/getFile")
            .json(&json!({ "path": workspace_path }))
            .send()
            .await?;

        // getFile reports failures with 202 and a JSON envelope.
        if response.status() != reqwest::StatusCode::OK {
            tracing::warn!(
                "getFile for {} returned status {}",
                workspace_path,
                response.status()
            );
            return Ok(None);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let bytes = response.bytes().await?.to_vec();

        let looks_like_json = content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("application/json"));
        if looks_like_json {
            if let Ok(envelope) = serde_json::from_slice::<KernelEnvelope<serde_json::Value>>(&bytes)
            {
                if envelope.code != 0 {
                    tracing::warn!(
                        "getFile for {} failed: {} ({})",
                        workspace_path,
                        envelope.msg,
                        envelope.code
                    );
                    return Ok(None);
                }
            }
        }

        if bytes.is_empty() {
            return Ok(None);
        }

        Ok(Some(AudioBlob {
            bytes,
            content_type,
        }))
    }
}

#[async_trait]
impl BlockStore for KernelClient {
    async fn block_dom(&self, id: &str) -> Result<String, HostError> {
        let data: Option<DomData> = self
            .call("/api/block/getBlockDOM", &json!({ "id": id }))
            .await?;
        data.map(|d| d.dom)
            .ok_or_else(|| HostError::Decode(format!("no DOM for block {id}")))
    }

    async fn block_kramdown(&self, id: &str) -> Result<String, HostError> {
        let data: Option<KramdownData> = self
            .call("/api/block/getBlockKramdown", &json!({ "id": id }))
            .await?;
        data.map(|d| d.kramdown)
            .ok_or_else(|| HostError::Decode(format!("no kramdown for block {id}")))
    }

    async fn block_info(&self, id: &str) -> Result<Option<BlockInfo>, HostError> {
        validate_block_id(id)?;
        let stmt = format!("SELECT id, parent_id, root_id FROM blocks WHERE id = '{id}'");
        let rows: Option<Vec<BlockInfo>> = self
            .call("/api/query/sql", &json!({ "stmt": stmt }))
            .await?;
        Ok(rows.and_then(|rows| rows.into_iter().next()))
    }

    async fn insert_block(
        &self,
        kind: &str,
        content: &str,
        next_id: Option<&str>,
        previous_id: Option<&str>,
        parent_id: Option<&str>,
    ) -> Result<(), HostError> {
        let request = InsertBlockRequest {
            data_type: kind,
            data: content,
            next_id,
            previous_id,
            parent_id,
        };
        self.call::<serde_json::Value, _>("/api/block/insertBlock", &request)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for KernelClient {
    async fn notify(&self, message: &str, severity: Severity) -> Result<(), HostError> {
        let endpoint = match severity {
            Severity::Info => "/api/notification/pushMsg",
            Severity::Error => "/api/notification/pushErrMsg",
        };
        self.call::<serde_json::Value, _>(
            endpoint,
            &json!({ "msg": message, "timeout": NOTIFY_TIMEOUT_MS }),
        )
        .await?;
        Ok(())
    }
}
