use std::sync::{Arc, Mutex};

/// 利用者向け通知の出口。戻り値は使わない（fire-and-forget）。
pub trait Notifier: Send + Sync {
    fn notify_success(&self, message: &str);
    fn notify_failure(&self, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Failure(String),
}

impl Notification {
    pub fn message(&self) -> &str {
        match self {
            Self::Success(m) | Self::Failure(m) => m,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

/// 通知を溜めておき、表示層がまとめて取り出す実装。
/// clone は同じバッファを共有する。
#[derive(Debug, Clone, Default)]
pub struct NotificationLog {
    entries: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 溜まった通知を古い順に取り出して空にする。
    pub fn drain(&self) -> Vec<Notification> {
        match self.entries.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        match self.entries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn push(&self, n: Notification) {
        match self.entries.lock() {
            Ok(mut guard) => guard.push(n),
            Err(poisoned) => poisoned.into_inner().push(n),
        }
    }
}

impl Notifier for NotificationLog {
    fn notify_success(&self, message: &str) {
        tracing::info!(notification = message, "success");
        self.push(Notification::Success(message.to_string()));
    }

    fn notify_failure(&self, message: &str) {
        tracing::warn!(notification = message, "failure");
        self.push(Notification::Failure(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_buffer_and_drain_empties() {
        let log = NotificationLog::new();
        let other = log.clone();
        other.notify_success("Buku berhasil ditambahkan!");
        log.notify_failure("Gagal menghapus buku.");

        let drained = log.drain();
        assert_eq!(
            drained,
            vec![
                Notification::Success("Buku berhasil ditambahkan!".into()),
                Notification::Failure("Gagal menghapus buku.".into()),
            ]
        );
        assert!(other.drain().is_empty());
    }
}
