use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::domain::collection::Collection;
use crate::domain::model::id::ResourceId;
use crate::domain::model::resource::{DraftForm, Resource};
use crate::domain::repository::{ApiClient, Listing, RemoteFailure};

use super::error::AppError;
use super::notify::Notifier;

/// 確認待ちの削除。ネットワーク呼び出しはまだ行っていない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub id: ResourceId,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// 一覧を置き換えた（件数）
    Replaced(usize),
    /// `data` が配列でなかったため空一覧として扱った
    Malformed,
    /// 応答到着前にコントローラが破棄された
    Discarded,
}

#[derive(Debug)]
struct Status {
    alive: AtomicBool,
    submitting: AtomicBool,
}

/// コントローラの生存フラグと送信中フラグへの共有ハンドル。
///
/// 表示層はこれを保持し、ビュー破棄時に `deactivate` を呼ぶ。
/// 以降に届いた応答は状態に反映されない。
#[derive(Debug, Clone)]
pub struct StatusHandle(Arc<Status>);

impl StatusHandle {
    fn new() -> Self {
        Self(Arc::new(Status {
            alive: AtomicBool::new(true),
            submitting: AtomicBool::new(false),
        }))
    }

    pub fn is_alive(&self) -> bool {
        self.0.alive.load(Ordering::SeqCst)
    }

    pub fn is_submitting(&self) -> bool {
        self.0.submitting.load(Ordering::SeqCst)
    }

    pub fn deactivate(&self) {
        self.0.alive.store(false, Ordering::SeqCst);
    }
}

/// `submit` の間だけ送信中フラグを立てる。drop で必ず戻る。
struct SubmitGuard<'a>(&'a AtomicBool);

impl<'a> SubmitGuard<'a> {
    fn engage(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// リソース一覧ページのユースケース。
///
/// 変更系の操作はサーバーの確定を待ってから一覧を全件再取得する
/// (refresh-after-write)。ローカルでの楽観的な追加・削除は行わない。
///
/// 変更系メソッドは `&mut self` を取るため、同一インスタンスで
/// `submit` / `refresh` が並行して走ることはない。
pub struct ResourceListController<R, C, N>
where
    R: Resource,
    C: ApiClient<R>,
    N: Notifier,
{
    api: C,
    notifier: N,
    collection: Collection<R>,
    draft: R::Draft,
    editing_id: Option<ResourceId>,
    form_open: bool,
    selected_for_detail: Option<R>,
    pending_delete: Option<PendingDelete>,
    status: StatusHandle,
}

impl<R, C, N> ResourceListController<R, C, N>
where
    R: Resource,
    C: ApiClient<R>,
    N: Notifier,
{
    pub fn new(api: C, notifier: N) -> Self {
        Self {
            api,
            notifier,
            collection: Collection::new(),
            draft: R::Draft::default(),
            editing_id: None,
            form_open: false,
            selected_for_detail: None,
            pending_delete: None,
            status: StatusHandle::new(),
        }
    }

    // --- 読み取り ---

    pub fn collection(&self) -> &Collection<R> {
        &self.collection
    }

    pub fn draft(&self) -> &R::Draft {
        &self.draft
    }

    pub fn editing_id(&self) -> Option<ResourceId> {
        self.editing_id
    }

    pub fn is_form_open(&self) -> bool {
        self.form_open
    }

    pub fn is_submitting(&self) -> bool {
        self.status.is_submitting()
    }

    pub fn selected_for_detail(&self) -> Option<&R> {
        self.selected_for_detail.as_ref()
    }

    pub fn pending_delete(&self) -> Option<&PendingDelete> {
        self.pending_delete.as_ref()
    }

    pub fn status_handle(&self) -> StatusHandle {
        self.status.clone()
    }

    pub fn api(&self) -> &C {
        &self.api
    }

    // --- 一覧同期 ---

    /// ビュー表示時の初回取得。
    pub async fn activate(&mut self) -> Result<RefreshOutcome, AppError> {
        self.refresh().await
    }

    /// 全件取得して一覧を置き換える。失敗時は既存の一覧を保持する。
    pub async fn refresh(&mut self) -> Result<RefreshOutcome, AppError> {
        self.ensure_alive()?;
        tracing::debug!(resource = R::NOUN, "refresh");

        let result = self.api.list().await;
        if !self.status.is_alive() {
            tracing::debug!(resource = R::NOUN, "refresh result discarded after deactivate");
            return Ok(RefreshOutcome::Discarded);
        }

        match result {
            Ok(Listing::Items(items)) => {
                self.collection = Collection::from_remote(items);
                Ok(RefreshOutcome::Replaced(self.collection.len()))
            }
            Ok(Listing::Malformed) => {
                tracing::warn!(resource = R::NOUN, "listing is not a sequence, treated as empty");
                self.collection = Collection::new();
                Ok(RefreshOutcome::Malformed)
            }
            Err(e) => {
                tracing::warn!(resource = R::NOUN, error = %e, "refresh failed");
                self.notifier
                    .notify_failure(&format!("Gagal memuat data {}.", R::NOUN));
                Err(AppError::FetchFailed(Box::new(e)))
            }
        }
    }

    // --- フォーム ---

    /// 新規作成モードでフォームを開く。
    pub fn begin_create(&mut self) {
        if !self.status.is_alive() {
            return;
        }
        self.reset_form();
        self.form_open = true;
    }

    /// 既存レコードの値（id以外）をフォームへ写し、編集モードで開く。
    pub fn begin_edit(&mut self, resource: &R) {
        if !self.status.is_alive() {
            return;
        }
        self.draft = resource.to_draft();
        self.editing_id = Some(resource.id());
        self.form_open = true;
    }

    /// 入力値をそのまま代入する。数値の検証は送信時まで行わない。
    pub fn update_draft_field(&mut self, name: &str, value: impl Into<String>) -> Result<(), AppError> {
        self.ensure_alive()?;
        self.draft.set_field(name, value.into())?;
        Ok(())
    }

    /// 入力を破棄してフォームを閉じる。
    pub fn cancel_form(&mut self) {
        if !self.status.is_alive() {
            return;
        }
        self.reset_form();
        self.form_open = false;
    }

    /// 編集中なら update、そうでなければ create を送信する。
    ///
    /// 成功時は一覧を再取得し、フォームを閉じて成功通知を出す。
    /// サーバーが保存後のレコードを返さなかった場合も成功で、戻り値は `None`。
    /// 失敗時はフォームの内容と表示状態を保持したまま失敗通知を出す。
    pub async fn submit(&mut self) -> Result<Option<R>, AppError> {
        self.ensure_alive()?;
        let status = self.status.clone();
        let _submitting = SubmitGuard::engage(&status.0.submitting);

        let payload = match self.draft.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                self.notifier.notify_failure(&e.to_string());
                return Err(e.into());
            }
        };

        let editing = self.editing_id;
        tracing::debug!(resource = R::NOUN, editing = ?editing, "submit");
        let result = match editing {
            Some(id) => self.api.update(id, &payload).await,
            None => self.api.create(&payload).await,
        };

        match result {
            Ok(saved) => {
                if !status.is_alive() {
                    return Ok(saved);
                }
                // サーバー確定後の一覧を正とする。取得失敗は refresh 内で通知済み。
                let _ = self.refresh().await;
                if !status.is_alive() {
                    return Ok(saved);
                }
                self.reset_form();
                self.form_open = false;
                let verb = if editing.is_some() {
                    "diperbarui"
                } else {
                    "ditambahkan"
                };
                self.notifier
                    .notify_success(&format!("{} berhasil {}!", R::DISPLAY_NAME, verb));
                Ok(saved)
            }
            Err(e) => {
                let message = e
                    .message()
                    .filter(|m| !m.is_empty())
                    .or_else(|| e.error_detail().filter(|m| !m.is_empty()))
                    .map(str::to_owned)
                    .unwrap_or_else(|| format!("Gagal menyimpan {}. Coba lagi.", R::NOUN));
                tracing::warn!(resource = R::NOUN, error = %e, "submit failed");
                if status.is_alive() {
                    self.notifier.notify_failure(&message);
                }
                Err(AppError::MutationFailed {
                    message,
                    source: Box::new(e),
                })
            }
        }
    }

    // --- 削除 ---

    /// 削除対象を確認待ちにする。ネットワーク呼び出しは行わない。
    pub fn request_delete(&mut self, resource: &R) {
        if !self.status.is_alive() {
            return;
        }
        self.pending_delete = Some(PendingDelete {
            id: resource.id(),
            label: resource.label(),
        });
    }

    /// 確認待ちの削除を実行する。
    ///
    /// 確認状態は呼び出し前に解除するため、同じ削除を二重に確定できない。
    pub async fn confirm_delete(&mut self) -> Result<(), AppError> {
        self.ensure_alive()?;
        let pending = self
            .pending_delete
            .take()
            .ok_or(AppError::NoPendingDelete)?;
        tracing::debug!(resource = R::NOUN, id = %pending.id, "delete");

        let result = self.api.delete(pending.id).await;
        let alive = self.status.is_alive();

        match result {
            Ok(()) => {
                if alive {
                    self.notifier
                        .notify_success(&format!("{} berhasil dihapus!", R::DISPLAY_NAME));
                    let _ = self.refresh().await;
                }
                Ok(())
            }
            Err(e) => {
                let generic = format!("Gagal menghapus {}.", R::NOUN);
                let message = if e.is_not_found() {
                    generic
                } else {
                    e.message()
                        .filter(|m| !m.is_empty())
                        .map(str::to_owned)
                        .unwrap_or(generic)
                };
                tracing::warn!(resource = R::NOUN, id = %pending.id, error = %e, "delete failed");
                if alive {
                    self.notifier.notify_failure(&message);
                }
                Err(AppError::MutationFailed {
                    message,
                    source: Box::new(e),
                })
            }
        }
    }

    pub fn cancel_delete(&mut self) {
        if !self.status.is_alive() {
            return;
        }
        self.pending_delete = None;
    }

    // --- 詳細表示 ---

    pub fn view_detail(&mut self, resource: &R) {
        if !self.status.is_alive() {
            return;
        }
        self.selected_for_detail = Some(resource.clone());
    }

    pub fn close_detail(&mut self) {
        if !self.status.is_alive() {
            return;
        }
        self.selected_for_detail = None;
    }

    // --- private ---

    fn reset_form(&mut self) {
        self.draft = R::Draft::default();
        self.editing_id = None;
    }

    fn ensure_alive(&self) -> Result<(), AppError> {
        if self.status.is_alive() {
            Ok(())
        } else {
            Err(AppError::Deactivated)
        }
    }
}
