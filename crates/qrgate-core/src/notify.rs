//! One-shot, dismissible user notifications.

use std::collections::VecDeque;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoticeId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: NoticeId,
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Pending notifications, oldest first.
#[derive(Debug, Default)]
pub struct Notifications {
    next: u64,
    pending: VecDeque<Notice>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&mut self, message: impl Into<String>) -> NoticeId {
        self.push(NoticeKind::Success, message.into())
    }

    pub fn error(&mut self, message: impl Into<String>) -> NoticeId {
        self.push(NoticeKind::Error, message.into())
    }

    fn push(&mut self, kind: NoticeKind, message: String) -> NoticeId {
        let id = NoticeId(self.next);
        self.next = self.next.wrapping_add(1);
        self.pending.push_back(Notice { id, kind, message });
        id
    }

    pub fn get(&self, id: NoticeId) -> Option<&Notice> {
        self.pending.iter().find(|n| n.id == id)
    }

    /// Removes a notice. Returns false if it was already dismissed.
    pub fn dismiss(&mut self, id: NoticeId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|n| n.id != id);
        self.pending.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.pending.iter()
    }

    /// Takes every pending notice; each is shown exactly once.
    pub fn drain(&mut self) -> Vec<Notice> {
        self.pending.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
