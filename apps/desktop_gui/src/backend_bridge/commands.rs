//! Backend commands queued from UI to backend worker.

use shared::domain::ViewId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    Click { view_id: ViewId },
    Advance,
    Restart,
    Shutdown,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Click { .. } => "click",
            BackendCommand::Advance => "advance",
            BackendCommand::Restart => "restart",
            BackendCommand::Shutdown => "shutdown",
        }
    }
}
