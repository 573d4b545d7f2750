//! User-facing notices.
//!
//! Failures that are not fatal to an interaction are reported as notices
//! alongside a safe default value. Every notice is mirrored to `tracing`.

use schemars::JsonSchema;
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Notices collected during one interaction, in emission order.
#[derive(Debug, Clone, Default)]
pub struct Notices(Vec<Notice>);

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(notice = %message, "User notice");
        self.push(NoticeLevel::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(notice = %message, "User warning");
        self.push(NoticeLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!(notice = %message, "User error");
        self.push(NoticeLevel::Error, message);
    }

    fn push(&mut self, level: NoticeLevel, message: String) {
        self.0.push(Notice { level, message });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.0.iter()
    }

    /// Whether any warning or error was recorded.
    pub fn has_problems(&self) -> bool {
        self.0.iter().any(|n| n.level != NoticeLevel::Info)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<Notice> {
        self.0
    }
}
