use super::model::id::ResourceId;
use super::model::resource::Resource;

/// 一覧取得の結果。`data` が配列でない応答は `Malformed` になる。
#[derive(Debug, Clone, PartialEq)]
pub enum Listing<R> {
    Items(Vec<R>),
    Malformed,
}

/// リモート呼び出しの失敗。サーバーが返したメッセージを取り出せる。
pub trait RemoteFailure: std::error::Error + Send + Sync + 'static {
    /// 応答ボディの `message`
    fn message(&self) -> Option<&str>;

    /// 応答ボディの `error`
    fn error_detail(&self) -> Option<&str> {
        None
    }

    /// 対象がサーバー側に存在しない（既に削除済みなど）
    fn is_not_found(&self) -> bool {
        false
    }
}

/// リソース1種類分のREST APIの抽象。Infra層が実装する。
///
/// `create` / `update` は2xxなら成功。応答ボディがレコードとして読めない場合は
/// `Ok(None)` を返す（書き込み自体は確定している）。
#[async_trait::async_trait]
pub trait ApiClient<R: Resource>: Send + Sync {
    type Error: RemoteFailure;

    async fn list(&self) -> Result<Listing<R>, Self::Error>;
    async fn create(&self, payload: &R::Payload) -> Result<Option<R>, Self::Error>;
    async fn update(
        &self,
        id: ResourceId,
        payload: &R::Payload,
    ) -> Result<Option<R>, Self::Error>;
    async fn delete(&self, id: ResourceId) -> Result<(), Self::Error>;
}
