//! Conversation state carried between requests

/// Remembers the last job name referenced in this session.
///
/// Owned by one conversation and mutated through `&mut`; a server hosting
/// several conversations keeps one of these per session id.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionMemory {
    last_job_name: Option<String>,
}

impl SessionMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored job name
    pub fn remember(&mut self, job_name: impl Into<String>) {
        self.last_job_name = Some(job_name.into());
    }

    /// The stored job name, if one was ever remembered
    pub fn recall(&self) -> Option<&str> {
        self.last_job_name.as_deref()
    }
}
