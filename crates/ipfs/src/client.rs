//! Blocking client for the kubo HTTP RPC API

use crate::api;
use mirror_core::{BlockFormat, BlockStore, ContentId, MirrorError, Result};
use reqwest::blocking::{multipart, Client, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Reply of `block/put`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlockPutReply {
    pub key: String,
    pub size: u64,
}

/// Reply of `object/patch/add-link`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PatchReply {
    pub hash: String,
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiError {
    pub message: String,
    #[serde(default)]
    pub code: i64,
    #[serde(default, rename = "Type")]
    pub kind: String,
}

/// Handle on an IPFS node's RPC endpoint
#[derive(Debug, Clone)]
pub struct IpfsClient {
    http: Client,
    base: String,
}

impl IpfsClient {
    /// Connect to `base` (e.g. `http://127.0.0.1:5001`)
    pub fn new(base: &str, timeout: Duration) -> Result<Self> {
        Url::parse(base).map_err(|e| MirrorError::store(format!("invalid API URL '{}': {}", base, e)))?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MirrorError::store(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    /// Connect to the configured endpoint, or discover the local node's
    pub fn discover(configured: Option<&str>, timeout: Duration) -> Result<Self> {
        let base = api::discover_api_url(configured);
        debug!("IPFS API endpoint: {}", base);
        Self::new(&base, timeout)
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// Build `<base>/api/v0/<command>?<params>`
    pub fn endpoint(&self, command: &str, params: &[(&str, &str)]) -> Result<Url> {
        let url = format!("{}/api/v0/{}", self.base, command);
        Url::parse_with_params(&url, params)
            .map_err(|e| MirrorError::store(format!("invalid request URL '{}': {}", url, e)))
    }

    fn send(&self, command: &str, request: reqwest::blocking::RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .map_err(|e| MirrorError::store(format!("{} failed: {}", command, e)))?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().unwrap_or_default();
        Err(MirrorError::store(format!(
            "{} failed ({}): {}",
            command,
            status,
            error_message(&body)
        )))
    }

    fn json<T: DeserializeOwned>(command: &str, response: Response) -> Result<T> {
        let body = response
            .text()
            .map_err(|e| MirrorError::store(format!("{}: cannot read reply: {}", command, e)))?;
        parse_reply(command, &body)
    }
}

impl BlockStore for IpfsClient {
    fn get_block(&self, id: &ContentId) -> Result<Vec<u8>> {
        let cid = id.to_string();
        let url = self.endpoint("block/get", &[("arg", &cid)])?;
        let response = self.send("block/get", self.http.post(url))?;
        let bytes = response
            .bytes()
            .map_err(|e| MirrorError::store(format!("block/get: cannot read reply: {}", e)))?;
        Ok(bytes.to_vec())
    }

    fn put_block(&self, data: &[u8], format: BlockFormat) -> Result<ContentId> {
        let url = self.endpoint(
            "block/put",
            &[
                ("cid-codec", format.codec),
                ("mhtype", format.hash_function),
                ("mhlen", "-1"),
            ],
        )?;
        let part = multipart::Part::bytes(data.to_vec()).file_name("block");
        let form = multipart::Form::new().part("file", part);

        let response = self.send("block/put", self.http.post(url).multipart(form))?;
        let reply: BlockPutReply = Self::json("block/put", response)?;
        if reply.size != data.len() as u64 {
            debug!(
                "block/put reported {} bytes for a {} byte block",
                reply.size,
                data.len()
            );
        }
        ContentId::parse(&reply.key)
    }

    fn patch_link(
        &self,
        root: &ContentId,
        path: &str,
        child: &ContentId,
        create_intermediate: bool,
    ) -> Result<ContentId> {
        let root = root.to_string();
        let child = child.to_string();
        let create = if create_intermediate { "true" } else { "false" };
        let url = self.endpoint(
            "object/patch/add-link",
            &[("arg", &root), ("arg", path), ("arg", &child), ("create", create)],
        )?;

        let response = self.send("object/patch/add-link", self.http.post(url))?;
        let reply: PatchReply = Self::json("object/patch/add-link", response)?;
        ContentId::parse(&reply.hash)
    }
}

/// Decode a JSON reply body
pub fn parse_reply<T: DeserializeOwned>(command: &str, body: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| MirrorError::store(format!("{}: unexpected reply '{}': {}", command, body.trim(), e)))
}

/// Human-readable message from an error body, falling back to the raw text
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiError>(body) {
        Ok(err) => err.message,
        Err(_) => body.trim().to_string(),
    }
}
