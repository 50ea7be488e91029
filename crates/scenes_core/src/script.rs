use serde::{Deserialize, Serialize};
use shared::domain::NewScene;

pub const DEFAULT_SCRIPT: [&str; 3] = ["Welcome to Git Neat!", "How are you?", "I am fine."];

/// The fixed instruction lines the slideshow walks through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script {
    lines: Vec<String>,
}

impl Script {
    pub fn new(lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn line(&self, scene_number: u32) -> Option<&str> {
        self.lines
            .get(usize::try_from(scene_number).ok()?)
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn img_class(scene_number: u32) -> String {
        format!("img{scene_number}")
    }

    pub fn opening_scene(&self) -> NewScene {
        self.scene_at(0)
    }

    /// Attributes of the frame that follows `scene_number`. Past the end of
    /// the script the instructions are left empty.
    pub fn next_scene(&self, scene_number: u32) -> NewScene {
        self.scene_at(scene_number.saturating_add(1))
    }

    fn scene_at(&self, scene_number: u32) -> NewScene {
        NewScene::new()
            .instructions(self.line(scene_number))
            .img_class(Self::img_class(scene_number))
            .scene_number(scene_number)
    }
}

impl Default for Script {
    fn default() -> Self {
        Self::new(DEFAULT_SCRIPT)
    }
}
