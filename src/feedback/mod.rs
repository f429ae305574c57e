use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use futures::future::BoxFuture;
use futures_timer::Delay;
use serde::Serialize;
use tracing::debug;

pub const DEFAULT_AUTO_HIDE: Duration = Duration::from_millis(6_000);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub struct NoticeId(pub u64);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Notice {
    pub id: Option<NoticeId>,
    pub message: String,
    pub kind: NoticeKind,
    pub auto_hide: Option<Duration>,
    pub closable: bool,
}

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            id: None,
            message: message.into(),
            kind: NoticeKind::Info,
            auto_hide: Some(DEFAULT_AUTO_HIDE),
            closable: true,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message).kind(NoticeKind::Success)
    }

    pub fn kind(mut self, value: NoticeKind) -> Self {
        self.kind = value;
        self
    }

    pub fn auto_hide(mut self, value: Option<Duration>) -> Self {
        self.auto_hide = value;
        self
    }

    pub fn closable(mut self, value: bool) -> Self {
        self.closable = value;
        self
    }
}

/// Resolves once the notice's auto-hide delay has elapsed and the notice has
/// been removed; `true` if it was still on display.
pub type AutoDismiss = BoxFuture<'static, bool>;

/// Transient notices shown over the form, newest last.
#[derive(Clone)]
pub struct NotificationCenter {
    next_id: Arc<AtomicU64>,
    max_visible: usize,
    state: Arc<RwLock<VecDeque<Notice>>>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(1)
    }
}

impl NotificationCenter {
    pub fn new(max_visible: usize) -> Self {
        Self {
            next_id: Arc::new(AtomicU64::new(0)),
            max_visible: max_visible.max(1),
            state: Arc::new(RwLock::new(VecDeque::new())),
        }
    }

    pub fn show(&self, mut notice: Notice) -> NoticeId {
        let id = NoticeId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        notice.id = Some(id);
        debug!(notice = id.0, message = %notice.message, "showing notice");

        let mut queue = self.write_queue();
        queue.push_back(notice);
        while queue.len() > self.max_visible {
            queue.pop_front();
        }
        id
    }

    /// Timer future for `id`, or `None` if the notice is gone or has no
    /// auto-hide delay.
    pub fn auto_dismiss(&self, id: NoticeId) -> Option<AutoDismiss> {
        let delay = self
            .read_queue()
            .iter()
            .find(|notice| notice.id == Some(id))
            .and_then(|notice| notice.auto_hide)?;
        let center = self.clone();
        Some(Box::pin(async move {
            Delay::new(delay).await;
            center.dismiss(id)
        }))
    }

    pub fn dismiss(&self, id: NoticeId) -> bool {
        let mut queue = self.write_queue();
        match queue.iter().position(|notice| notice.id == Some(id)) {
            Some(index) => {
                queue.remove(index);
                debug!(notice = id.0, "notice dismissed");
                true
            }
            None => false,
        }
    }

    pub fn dismiss_all(&self) {
        self.write_queue().clear();
    }

    pub fn current(&self) -> Option<Notice> {
        self.read_queue().back().cloned()
    }

    pub fn list(&self) -> Vec<Notice> {
        self.read_queue().iter().cloned().collect()
    }

    fn read_queue(&self) -> RwLockReadGuard<'_, VecDeque<Notice>> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_queue(&self) -> RwLockWriteGuard<'_, VecDeque<Notice>> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn center_keeps_only_latest_notice_by_default() {
        let center = NotificationCenter::default();
        center.show(Notice::success("first"));
        let second = center.show(Notice::success("second"));

        let visible = center.list();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].message, "second");
        assert_eq!(center.current().and_then(|notice| notice.id), Some(second));
    }

    #[test]
    fn success_notice_defaults_to_six_seconds() {
        let notice = Notice::success("Form submitted successfully");
        assert_eq!(notice.kind, NoticeKind::Success);
        assert_eq!(notice.auto_hide, Some(Duration::from_secs(6)));
        assert!(notice.closable);
    }

    #[test]
    fn auto_dismiss_removes_notice_after_delay() {
        let center = NotificationCenter::default();
        let id = center.show(Notice::success("done").auto_hide(Some(Duration::from_millis(5))));
        let timer = center.auto_dismiss(id).expect("timer for auto-hiding notice");
        assert!(center.current().is_some());

        assert!(block_on(timer));
        assert!(center.current().is_none());
    }

    #[test]
    fn explicit_dismiss_wins_over_timer() {
        let center = NotificationCenter::default();
        let id = center.show(Notice::success("done").auto_hide(Some(Duration::from_millis(5))));
        let timer = center.auto_dismiss(id).expect("timer");

        assert!(center.dismiss(id));
        assert!(!block_on(timer));
        assert!(!center.dismiss(id));
    }

    #[test]
    fn sticky_notice_has_no_timer() {
        let center = NotificationCenter::new(3);
        let id = center.show(Notice::new("sticky").auto_hide(None));
        assert!(center.auto_dismiss(id).is_none());
        center.dismiss_all();
        assert!(center.list().is_empty());
    }
}
