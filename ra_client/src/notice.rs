use ra::Level;
use tracing::{error, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NoticeId(u64);

/// A message for the user.
///
/// Transient notices are meant to disappear on their own, persistent ones
/// stay until they are dismissed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub id: NoticeId,
    pub level: Level,
    pub message: String,
    pub persistent: bool,
}

/// Queue of notices not yet shown to the user, plus the persistent notices
/// that are still active.
#[derive(Debug, Default)]
pub struct Notices {
    next_id: u64,
    pending: Vec<Notice>,
    active: Vec<NoticeId>,
}

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: Level, message: impl Into<String>) -> NoticeId {
        self.insert(level, message.into(), false)
    }

    pub fn push_persistent(&mut self, level: Level, message: impl Into<String>) -> NoticeId {
        self.insert(level, message.into(), true)
    }

    fn insert(&mut self, level: Level, message: String, persistent: bool) -> NoticeId {
        match level {
            Level::Error => error!(persistent, "{}", message),
            Level::Warning => warn!(persistent, "{}", message),
            Level::Info | Level::Success => info!(persistent, "{}", message),
        }
        let id = NoticeId(self.next_id);
        self.next_id += 1;
        if persistent {
            self.active.push(id);
        }
        self.pending.push(Notice {
            id,
            level,
            message,
            persistent,
        });
        id
    }

    /// Dismisses a notice. Returns false if it was not active or still pending.
    pub fn dismiss(&mut self, id: NoticeId) -> bool {
        let before = self.active.len() + self.pending.len();
        self.active.retain(|&active| active != id);
        self.pending.retain(|notice| notice.id != id);
        before != self.active.len() + self.pending.len()
    }

    /// Whether a persistent notice is still shown.
    pub fn is_active(&self, id: NoticeId) -> bool {
        self.active.contains(&id)
    }

    pub fn pending(&self) -> &[Notice] {
        &self.pending
    }

    /// Takes the notices that have not been shown yet.
    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistent_notices_stay_active_until_dismissed() {
        let mut notices = Notices::new();
        let id = notices.push_persistent(Level::Error, "Disconnected");
        notices.push(Level::Info, "hello");
        assert_eq!(notices.drain().len(), 2);
        assert!(notices.is_active(id));
        assert!(notices.dismiss(id));
        assert!(!notices.is_active(id));
        assert!(!notices.dismiss(id));
    }

    #[test]
    fn dismissing_a_pending_notice_removes_it() {
        let mut notices = Notices::new();
        let id = notices.push(Level::Warning, "Invalid game id.");
        assert!(notices.dismiss(id));
        assert!(notices.pending().is_empty());
    }
}
