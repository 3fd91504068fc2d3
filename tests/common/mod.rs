//! Shared test harness for integration tests.

#![allow(dead_code)]

use std::sync::Mutex;

use perpustakaan_console::application::controller::{ResourceListController, StatusHandle};
use perpustakaan_console::application::notify::{Notification, NotificationLog};
use perpustakaan_console::domain::model::book::Book;
use perpustakaan_console::domain::model::category::Category;
use perpustakaan_console::domain::model::id::ResourceId;
use perpustakaan_console::domain::model::resource::Resource;
use perpustakaan_console::domain::repository::{ApiClient, Listing, RemoteFailure};

// =============================================================================
// FakeApi — テスト用のインメモリAPI
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    List,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    Create,
    Update(ResourceId),
    Delete(ResourceId),
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("fake api failure (HTTP {status})")]
pub struct FakeError {
    pub status: u16,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl FakeError {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            message: None,
            error: None,
        }
    }

    pub fn with_message(status: u16, message: &str) -> Self {
        Self {
            status,
            message: Some(message.to_string()),
            error: None,
        }
    }

    pub fn with_error(status: u16, error: &str) -> Self {
        Self {
            status,
            message: None,
            error: Some(error.to_string()),
        }
    }
}

impl RemoteFailure for FakeError {
    fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    fn error_detail(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

struct FakeState<R> {
    records: Vec<R>,
    next_id: u64,
    calls: Vec<Call>,
    failures: Vec<(Op, FakeError)>,
    malformed_list: bool,
    ack_only: bool,
    deactivate_on_call: Option<StatusHandle>,
    watched: Option<StatusHandle>,
    submitting_seen: Vec<(Call, bool)>,
}

/// サーバーに忠実なインメモリAPI。呼び出しを記録し、失敗を注入できる。
pub struct FakeApi<R> {
    state: Mutex<FakeState<R>>,
}

impl<R: Resource> FakeApi<R> {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<R>) -> Self {
        let next_id = records.iter().map(|r| r.id().get()).max().unwrap_or(0) + 1;
        Self {
            state: Mutex::new(FakeState {
                records,
                next_id,
                calls: Vec::new(),
                failures: Vec::new(),
                malformed_list: false,
                ack_only: false,
                deactivate_on_call: None,
                watched: None,
                submitting_seen: Vec::new(),
            }),
        }
    }

    pub fn set_next_id(&self, id: u64) {
        self.state.lock().unwrap().next_id = id;
    }

    /// 次の `op` 呼び出しを失敗させる。
    pub fn fail_next(&self, op: Op, err: FakeError) {
        self.state.lock().unwrap().failures.push((op, err));
    }

    pub fn set_malformed_list(&self, malformed: bool) {
        self.state.lock().unwrap().malformed_list = malformed;
    }

    /// create / update が保存後のレコードを返さず、確認だけを返すようにする。
    pub fn set_ack_only(&self, ack_only: bool) {
        self.state.lock().unwrap().ack_only = ack_only;
    }

    /// 各呼び出しの時点での送信中フラグを記録する。
    pub fn watch(&self, handle: StatusHandle) {
        self.state.lock().unwrap().watched = Some(handle);
    }

    pub fn submitting_seen(&self) -> Vec<(Call, bool)> {
        self.state.lock().unwrap().submitting_seen.clone()
    }

    /// 次の呼び出しの最中にコントローラを破棄したことにする。
    pub fn deactivate_during_next_call(&self, handle: StatusHandle) {
        self.state.lock().unwrap().deactivate_on_call = Some(handle);
    }

    /// サーバー側だけでレコードを消す（並行削除の再現）。
    pub fn remove_remotely(&self, id: ResourceId) {
        self.state.lock().unwrap().records.retain(|r| r.id() != id);
    }

    pub fn records(&self) -> Vec<R> {
        self.state.lock().unwrap().records.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    fn enter(&self, op: Op, call: Call) -> Result<(), FakeError> {
        let mut state = self.state.lock().unwrap();
        if let Some(submitting) = state.watched.as_ref().map(StatusHandle::is_submitting) {
            state.submitting_seen.push((call.clone(), submitting));
        }
        state.calls.push(call);
        if let Some(handle) = state.deactivate_on_call.take() {
            handle.deactivate();
        }
        match state.failures.iter().position(|(o, _)| *o == op) {
            Some(pos) => Err(state.failures.remove(pos).1),
            None => Ok(()),
        }
    }

    fn materialize(id: ResourceId, payload: &R::Payload) -> R {
        let mut value = serde_json::to_value(payload).unwrap();
        value
            .as_object_mut()
            .unwrap()
            .insert("id".to_string(), serde_json::json!(id.get()));
        serde_json::from_value(value).unwrap()
    }
}

#[async_trait::async_trait]
impl<R: Resource> ApiClient<R> for FakeApi<R> {
    type Error = FakeError;

    async fn list(&self) -> Result<Listing<R>, FakeError> {
        self.enter(Op::List, Call::List)?;
        let state = self.state.lock().unwrap();
        if state.malformed_list {
            return Ok(Listing::Malformed);
        }
        Ok(Listing::Items(state.records.clone()))
    }

    async fn create(&self, payload: &R::Payload) -> Result<Option<R>, FakeError> {
        self.enter(Op::Create, Call::Create)?;
        let mut state = self.state.lock().unwrap();
        let id = ResourceId::new(state.next_id);
        state.next_id += 1;
        let record = Self::materialize(id, payload);
        state.records.push(record.clone());
        Ok((!state.ack_only).then_some(record))
    }

    async fn update(&self, id: ResourceId, payload: &R::Payload) -> Result<Option<R>, FakeError> {
        self.enter(Op::Update, Call::Update(id))?;
        let mut state = self.state.lock().unwrap();
        let ack_only = state.ack_only;
        let record = Self::materialize(id, payload);
        match state.records.iter_mut().find(|r| r.id() == id) {
            Some(slot) => {
                *slot = record.clone();
                Ok((!ack_only).then_some(record))
            }
            None => Err(FakeError::with_message(404, "Data tidak ditemukan")),
        }
    }

    async fn delete(&self, id: ResourceId) -> Result<(), FakeError> {
        self.enter(Op::Delete, Call::Delete(id))?;
        let mut state = self.state.lock().unwrap();
        let before = state.records.len();
        state.records.retain(|r| r.id() != id);
        if state.records.len() == before {
            return Err(FakeError::status(404));
        }
        Ok(())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub type Controller<R> = ResourceListController<R, FakeApi<R>, NotificationLog>;

pub fn book(id: u64, judul: &str, stok: u32) -> Book {
    Book {
        id: ResourceId::new(id),
        judul: judul.to_string(),
        penulis: "Penulis".to_string(),
        penerbit: "Penerbit".to_string(),
        tahun_terbit: 2020,
        stok,
    }
}

pub fn category(id: u64, nama: &str) -> Category {
    Category {
        id: ResourceId::new(id),
        nama: nama.to_string(),
    }
}

/// 標準的な蔵書一覧:
/// ```text
/// #1 Bumi Manusia   stok 3
/// #2 Laskar Pelangi stok 0
/// #3 Ronggeng Dukuh Paruk stok 12
/// ```
pub fn standard_books() -> Vec<Book> {
    vec![
        book(1, "Bumi Manusia", 3),
        book(2, "Laskar Pelangi", 0),
        book(3, "Ronggeng Dukuh Paruk", 12),
    ]
}

/// コントローラを作り、初回取得まで済ませる。
pub async fn activated<R: Resource>(records: Vec<R>) -> (Controller<R>, NotificationLog) {
    let log = NotificationLog::new();
    let mut ctrl = ResourceListController::new(FakeApi::with_records(records), log.clone());
    ctrl.activate().await.unwrap();
    log.drain();
    (ctrl, log)
}

pub fn successes(log: &NotificationLog) -> Vec<String> {
    log.snapshot()
        .into_iter()
        .filter(|n| !n.is_failure())
        .map(|n| n.message().to_string())
        .collect()
}

pub fn failures(log: &NotificationLog) -> Vec<String> {
    log.snapshot()
        .into_iter()
        .filter(Notification::is_failure)
        .map(|n| n.message().to_string())
        .collect()
}

/// 並び順を無視して比較するためのソート済みコピー
pub fn sorted_by_id<R: Resource>(items: &[R]) -> Vec<R> {
    let mut v = items.to_vec();
    v.sort_by_key(|r| r.id());
    v
}
