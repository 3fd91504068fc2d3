use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::domain::model::id::ResourceId;
use crate::domain::model::resource::Resource;
use crate::domain::repository::{ApiClient, Listing, RemoteFailure};

/// サーバーのエラーボディ。どちらのキーも任意。
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl std::fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let detail = self
            .message
            .as_deref()
            .or(self.error.as_deref())
            .unwrap_or("no detail");
        f.write_str(detail)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HttpApiError {
    #[error("HTTP {status}: {body}")]
    Server { status: u16, body: ErrorBody },

    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    #[error("decode: {0}")]
    Decode(String),
}

impl RemoteFailure for HttpApiError {
    fn message(&self) -> Option<&str> {
        match self {
            Self::Server { body, .. } => body.message.as_deref(),
            _ => None,
        }
    }

    fn error_detail(&self) -> Option<&str> {
        match self {
            Self::Server { body, .. } => body.error.as_deref(),
            _ => None,
        }
    }

    fn is_not_found(&self) -> bool {
        matches!(self, Self::Server { status: 404, .. })
    }
}

/// REST APIに対する `ApiClient` 実装。
///
/// パスは `{base_url}{R::BASE_PATH}` と `{base_url}{R::BASE_PATH}/{id}`。
pub struct HttpApiClient<R: Resource> {
    http: reqwest::Client,
    base_url: String,
    _phantom: PhantomData<fn() -> R>,
}

impl<R: Resource> HttpApiClient<R> {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// 複数リソースで接続プールを共有する場合に使う。
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            _phantom: PhantomData,
        }
    }

    fn collection_url(&self) -> String {
        format!("{}{}", self.base_url, R::BASE_PATH)
    }

    fn item_url(&self, id: ResourceId) -> String {
        format!("{}/{}", self.collection_url(), id)
    }

    /// 非2xxを `HttpApiError::Server` に変換する。
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, HttpApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let text = resp.text().await.unwrap_or_default();
        let body = serde_json::from_str::<ErrorBody>(&text).unwrap_or_default();
        Err(HttpApiError::Server {
            status: status.as_u16(),
            body,
        })
    }

    async fn json_body(resp: reqwest::Response) -> Result<serde_json::Value, HttpApiError> {
        let resp = Self::check(resp).await?;
        resp.json::<serde_json::Value>()
            .await
            .map_err(|e| HttpApiError::Decode(format!("response body: {e}")))
    }

    /// 書き込み系の2xx応答。ボディが空やJSONでなくても成功として扱う。
    async fn write_ack(resp: reqwest::Response) -> Result<Option<R>, HttpApiError> {
        let resp = Self::check(resp).await?;
        let text = resp.text().await?;
        let record = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(parse_record::<R>);
        if record.is_none() {
            tracing::warn!(resource = R::NOUN, "write acknowledged without a readable record");
        }
        Ok(record)
    }
}

/// `{ data: [...] }` から一覧を取り出す。`data` が配列でなければ `Malformed`。
pub fn parse_listing<R: DeserializeOwned>(body: serde_json::Value) -> Result<Listing<R>, HttpApiError> {
    let serde_json::Value::Object(mut map) = body else {
        return Ok(Listing::Malformed);
    };
    match map.remove("data") {
        Some(data @ serde_json::Value::Array(_)) => serde_json::from_value::<Vec<R>>(data)
            .map(Listing::Items)
            .map_err(|e| HttpApiError::Decode(format!("listing item: {e}"))),
        _ => Ok(Listing::Malformed),
    }
}

/// 単体レコードの応答。素のレコードと `{ data: {...} }` の両方を受け付ける。
/// どちらでもなければ `None`（確認メッセージだけの応答など）。
pub fn parse_record<R: DeserializeOwned>(body: serde_json::Value) -> Option<R> {
    if let Ok(record) = serde_json::from_value::<R>(body.clone()) {
        return Some(record);
    }
    body.get("data")
        .and_then(|inner| serde_json::from_value::<R>(inner.clone()).ok())
}

#[async_trait::async_trait]
impl<R: Resource> ApiClient<R> for HttpApiClient<R> {
    type Error = HttpApiError;

    async fn list(&self) -> Result<Listing<R>, HttpApiError> {
        let url = self.collection_url();
        tracing::debug!(%url, "GET");
        let resp = self.http.get(&url).send().await?;
        parse_listing(Self::json_body(resp).await?)
    }

    async fn create(&self, payload: &R::Payload) -> Result<Option<R>, HttpApiError> {
        let url = self.collection_url();
        tracing::debug!(%url, "POST");
        let resp = self.http.post(&url).json(payload).send().await?;
        Self::write_ack(resp).await
    }

    async fn update(
        &self,
        id: ResourceId,
        payload: &R::Payload,
    ) -> Result<Option<R>, HttpApiError> {
        let url = self.item_url(id);
        tracing::debug!(%url, "PUT");
        let resp = self.http.put(&url).json(payload).send().await?;
        Self::write_ack(resp).await
    }

    async fn delete(&self, id: ResourceId) -> Result<(), HttpApiError> {
        let url = self.item_url(id);
        tracing::debug!(%url, "DELETE");
        let resp = self.http.delete(&url).send().await?;
        Self::check(resp).await?;
        Ok(())
    }
}
