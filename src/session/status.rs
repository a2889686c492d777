use std::sync::Arc;

use crate::session::model::{ExportResult, SessionId};

/// Status surface for the UI layer.
#[derive(Clone, Debug, PartialEq)]
pub enum ExportStatus {
    /// The session was accepted and is acquiring resources.
    Pending,
    /// Frames are being recorded.
    Exporting,
    /// The export finished.
    Ready(ExportResult),
    /// Nothing was exported, without anything being wrong (e.g. no images).
    Warning(String),
    /// A fatal error ended the export.
    Error(String),
    /// A newer export replaced this one.
    Superseded,
}

/// Callback receiving every status change of every session a manager starts.
pub type StatusObserver = Arc<dyn Fn(SessionId, &ExportStatus) + Send + Sync>;

#[derive(Clone)]
pub(crate) struct StatusReporter {
    id: SessionId,
    observer: Option<StatusObserver>,
}

impl StatusReporter {
    pub(crate) fn new(id: SessionId, observer: Option<StatusObserver>) -> Self {
        Self { id, observer }
    }

    pub(crate) fn emit(&self, status: ExportStatus) {
        match &status {
            ExportStatus::Warning(msg) => tracing::warn!(session = %self.id, "{msg}"),
            ExportStatus::Error(msg) => tracing::error!(session = %self.id, "{msg}"),
            ExportStatus::Ready(res) => tracing::info!(
                session = %self.id,
                frames = res.frames,
                chunks = res.chunk_count,
                bytes = res.payload.len(),
                "export ready"
            ),
            other => tracing::info!(session = %self.id, status = ?other, "export status"),
        }
        if let Some(observer) = self.observer.as_ref() {
            observer(self.id, &status);
        }
    }
}
