use async_trait::async_trait;
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, Request};
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use tracing::{error, info};

use super::ObjectStore;

/// Path segment between the storage base URL and `<bucket>/<path>` in public
/// object URLs.
pub const PUBLIC_OBJECT_PREFIX: &str = "/storage/v1/object/public/";

const OBJECT_PREFIX: &str = "/storage/v1/object/";

/// Characters escaped in object paths; `/` keeps separating folders.
const PATH_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Clone, Debug)]
pub struct StorageClient {
    http_client: Client,
    pub(crate) base_url: String,
    service_key: Secret<String>,
}

#[derive(Debug, Serialize)]
struct RemoveObjectsRequest<'a> {
    prefixes: &'a [String],
}

impl StorageClient {
    pub fn new(base_url: String, service_key: Secret<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
        }
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}{}{}/{}",
            self.base_url,
            OBJECT_PREFIX,
            bucket,
            utf8_percent_encode(path, PATH_SET)
        )
    }

    async fn execute(&self, request: Request) -> anyhow::Result<()> {
        if let Ok(curl_command) = request_to_curl(&request) {
            tracing::debug!("storage request CURL: {}", curl_command);
        }

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(describe_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Object store rejected request");
            anyhow::bail!("Object store responded with {}: {}", status, body);
        }

        Ok(())
    }
}

#[async_trait]
impl ObjectStore for StorageClient {
    #[tracing::instrument(name = "storage_upload", skip(self, data), fields(size = data.len()))]
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> anyhow::Result<()> {
        let key = self.service_key.expose_secret();
        let request = self
            .http_client
            .post(self.object_url(bucket, path))
            .bearer_auth(key)
            .header("apikey", key)
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(data)
            .build()
            .map_err(|err| {
                error!("Failed to build upload request: {:?}", err);
                describe_request_error(err)
            })?;

        self.execute(request).await?;
        info!("Stored object {}/{}", bucket, path);
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}{}{}/{}",
            self.base_url,
            PUBLIC_OBJECT_PREFIX,
            bucket,
            utf8_percent_encode(path, PATH_SET)
        )
    }

    #[tracing::instrument(name = "storage_remove", skip(self))]
    async fn remove(&self, bucket: &str, paths: &[String]) -> anyhow::Result<()> {
        let key = self.service_key.expose_secret();
        let request = self
            .http_client
            .delete(format!("{}{}{}", self.base_url, OBJECT_PREFIX, bucket))
            .bearer_auth(key)
            .header("apikey", key)
            .json(&RemoveObjectsRequest { prefixes: paths })
            .build()
            .map_err(|err| {
                error!("Failed to build remove request: {:?}", err);
                describe_request_error(err)
            })?;

        self.execute(request).await?;
        info!("Removed {} object(s) from {}", paths.len(), bucket);
        Ok(())
    }
}

fn describe_request_error(err: reqwest::Error) -> anyhow::Error {
    let mut context_parts = Vec::new();

    if let Some(url) = err.url() {
        context_parts.push(format!("URL: {}", url));
    }

    if let Some(status) = err.status() {
        context_parts.push(format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown Status")
        ));
    }

    let error_type = match &err {
        e if e.is_timeout() => "Request Timeout",
        e if e.is_connect() => "Connection Failed",
        e if e.is_decode() => "Response Decode Failed",
        e if e.is_request() => "Invalid Request",
        e if e.is_body() => "Request Body Error",
        _ => "Unknown HTTP Error",
    };
    context_parts.push(format!("Type: {}", error_type));

    error!(
        error = %err,
        url = ?err.url(),
        is_timeout = err.is_timeout(),
        is_connect = err.is_connect(),
        "Object store request failed"
    );

    anyhow::Error::new(err).context(format!(
        "Object store request failed - {}",
        context_parts.join(", ")
    ))
}

fn request_to_curl(request: &Request) -> Result<String, reqwest::Error> {
    let mut command = format!("curl -X {} '{}'", request.method(), request.url());

    for (name, value) in request.headers().iter() {
        let lowered = name.as_str().to_lowercase();
        if lowered == "authorization" || lowered == "apikey" {
            command.push_str(&format!(" -H '{}: [REDACTED]'", name.as_str()));
        } else if let Ok(val_str) = value.to_str() {
            command.push_str(&format!(" -H '{}: {}'", name.as_str(), val_str));
        } else {
            command.push_str(&format!(" -H '{}: <binary>'", name.as_str()));
        }
    }

    if let Some(body) = request.body() {
        match body.as_bytes() {
            Some(bytes) if bytes.len() <= 1024 => match std::str::from_utf8(bytes) {
                Ok(body_str) => command.push_str(&format!(" -d '{}'", body_str)),
                Err(_) => command.push_str(" --data-binary '<binary body>'"),
            },
            Some(bytes) => command.push_str(&format!(" --data-binary '<{} bytes>'", bytes.len())),
            None => command.push_str(" -d '<streaming body not shown>'"),
        }
    }

    Ok(command)
}
