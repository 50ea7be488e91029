//! Folds backend events into the state the window draws from.

use scenes_core::RenderedItem;

use crate::controller::events::{UiError, UiEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Starting,
    Ready,
    Failed,
}

#[derive(Debug, Clone)]
pub struct SlideshowState {
    pub phase: Phase,
    pub items: Vec<RenderedItem>,
    pub status: String,
    pub last_error: Option<UiError>,
    /// A command is in flight; clicks are ignored until the backend answers.
    pub busy: bool,
    /// The backend follows a failed command with a render of the unchanged
    /// list; that render must not clear the error it came with.
    error_awaiting_render: bool,
}

impl Default for SlideshowState {
    fn default() -> Self {
        Self {
            phase: Phase::Starting,
            items: Vec::new(),
            status: "Loading scenes...".to_string(),
            last_error: None,
            busy: true,
            error_awaiting_render: false,
        }
    }
}

impl SlideshowState {
    pub fn current(&self) -> Option<&RenderedItem> {
        self.items.last()
    }

    pub fn reduce(&mut self, event: UiEvent) {
        match event {
            UiEvent::Ready(items) => {
                self.phase = Phase::Ready;
                self.status = describe(&items);
                self.items = items;
                self.last_error = None;
                self.error_awaiting_render = false;
                self.busy = false;
            }
            UiEvent::Rendered(items) => {
                self.items = items;
                self.busy = false;
                if std::mem::take(&mut self.error_awaiting_render) {
                    return;
                }
                self.status = describe(&self.items);
                self.last_error = None;
            }
            UiEvent::Info(message) => self.status = message,
            UiEvent::Error(err) => {
                if err.requires_restart() {
                    self.phase = Phase::Failed;
                }
                self.status = err.message().to_string();
                self.last_error = Some(err);
                self.error_awaiting_render = true;
                self.busy = false;
            }
        }
    }
}

fn describe(items: &[RenderedItem]) -> String {
    match items.last() {
        Some(item) => format!("Scene {}", item.scene.scene_number),
        None => "No scene mounted".to_string(),
    }
}
