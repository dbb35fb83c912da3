use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Progress,
    Success,
    Error,
}

/// Outcome of the last user action, as shown on the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub level: StatusLevel,
    pub message: String,
}

impl Status {
    pub fn new(level: StatusLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Info, message)
    }

    pub fn progress(message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Progress, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Error, message)
    }

    pub fn is_error(&self) -> bool {
        self.level == StatusLevel::Error
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Receives every status the coordinator reports.
pub trait StatusSink: Send + Sync {
    fn report(&self, status: &Status);
}

/// Forwards statuses to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl StatusSink for TracingSink {
    fn report(&self, status: &Status) {
        match status.level {
            StatusLevel::Error => tracing::warn!("{}", status.message),
            StatusLevel::Progress => tracing::debug!("{}", status.message),
            StatusLevel::Info | StatusLevel::Success => tracing::info!("{}", status.message),
        }
    }
}
