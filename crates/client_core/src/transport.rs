use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{LedgerEntry, PointsKey, PointsRecord},
    error::{ApiError, ErrorCode},
    protocol::{ChangeHolderRequest, RecordPointsRequest, TxReceipt},
};
use tracing::debug;
use url::Url;

use crate::{
    error::ClientError,
    types::{HolderForm, PointsForm},
};

/// The four calls the UI makes, answering with raw bodies the way the
/// legacy routes produce them.
#[async_trait]
pub trait PointsApi: Send + Sync {
    async fn query_all_points(&self) -> Result<Vec<LedgerEntry>, ClientError>;
    async fn query_points(&self, id: &str) -> Result<String, ClientError>;
    async fn record_points(&self, form: &PointsForm) -> Result<String, ClientError>;
    async fn change_holder(&self, form: &HolderForm) -> Result<String, ClientError>;
}

#[derive(Clone)]
pub struct HttpPointsClient {
    http: Client,
    base: Url,
}

impl HttpPointsClient {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        let base =
            Url::parse(server_url).map_err(|_| ClientError::InvalidServerUrl(server_url.into()))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidServerUrl(server_url.into()));
        }
        Ok(Self {
            http: Client::new(),
            base,
        })
    }

    /// Appends each segment percent-encoded, so hyphens, commas and spaces
    /// inside a segment reach the server intact.
    pub fn url_for(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidServerUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Raw body of a 2xx answer. Any other status becomes
    /// [`ClientError::Api`], so sentinel bodies (sent with 200) still reach
    /// the caller as text.
    async fn get_text(&self, url: Url) -> Result<String, ClientError> {
        debug!(%url, "legacy GET");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(api_failure(status, body));
        }
        Ok(body)
    }

    pub async fn list_points(&self) -> Result<Vec<LedgerEntry>, ClientError> {
        let url = self.url_for(&["api", "v1", "points"])?;
        decode_json(self.http.get(url).send().await?).await
    }

    /// `Ok(None)` when the ledger has no record under `id`.
    pub async fn fetch_points(&self, id: &PointsKey) -> Result<Option<PointsRecord>, ClientError> {
        let url = self.url_for(&["api", "v1", "points", id.as_str()])?;
        match decode_json(self.http.get(url).send().await?).await {
            Ok(record) => Ok(Some(record)),
            Err(ClientError::Api { error, .. }) if error.code == ErrorCode::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn submit_points(
        &self,
        request: &RecordPointsRequest,
    ) -> Result<TxReceipt, ClientError> {
        let url = self.url_for(&["api", "v1", "points"])?;
        decode_json(self.http.post(url).json(request).send().await?).await
    }

    pub async fn transfer_points(
        &self,
        id: &PointsKey,
        holder: &str,
    ) -> Result<TxReceipt, ClientError> {
        let url = self.url_for(&["api", "v1", "points", id.as_str(), "holder"])?;
        let request = ChangeHolderRequest {
            holder: holder.to_string(),
        };
        decode_json(self.http.put(url).json(&request).send().await?).await
    }
}

#[async_trait]
impl PointsApi for HttpPointsClient {
    async fn query_all_points(&self) -> Result<Vec<LedgerEntry>, ClientError> {
        // Trailing empty segment keeps the `/get_all_points/` form.
        let url = self.url_for(&["get_all_points", ""])?;
        let body = self.get_text(url).await?;
        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn query_points(&self, id: &str) -> Result<String, ClientError> {
        let url = self.url_for(&["get_points", id])?;
        self.get_text(url).await
    }

    async fn record_points(&self, form: &PointsForm) -> Result<String, ClientError> {
        let segment = form.to_segment().encode();
        let url = self.url_for(&["add_points", &segment])?;
        self.get_text(url).await
    }

    async fn change_holder(&self, form: &HolderForm) -> Result<String, ClientError> {
        let segment = form.to_segment().encode();
        let url = self.url_for(&["change_holder", &segment])?;
        self.get_text(url).await
    }
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(api_failure(status, body));
    }
    serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
}

/// Non-2xx answer as a structured error. Plain-text bodies are wrapped with
/// a code derived from the status.
fn api_failure(status: StatusCode, body: String) -> ClientError {
    let error = serde_json::from_str::<ApiError>(&body).unwrap_or_else(|_| {
        let code = match status {
            StatusCode::NOT_FOUND => ErrorCode::NotFound,
            s if s.is_client_error() => ErrorCode::Validation,
            _ => ErrorCode::Internal,
        };
        ApiError::new(code, body)
    });
    ClientError::Api {
        status: status.as_u16(),
        error,
    }
}
