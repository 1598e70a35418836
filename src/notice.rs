use std::collections::VecDeque;
use std::fmt;

use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// A user-facing message, the portal's equivalent of a modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.text)
    }
}

/// Shared sink every panel reports into. The front-end drains it after each
/// command or sync event.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    queue: VecDeque<Notice>,
}

impl NoticeBoard {
    pub fn post(&mut self, notice: Notice) {
        match notice.kind {
            NoticeKind::Error => tracing::warn!(text = %notice.text, "error notice"),
            _ => tracing::debug!(kind = %notice.kind, text = %notice.text, "notice"),
        }
        self.queue.push_back(notice);
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        self.queue.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
