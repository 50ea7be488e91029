use serde::{Deserialize, Serialize};

use crate::{
    domain::{Scene, SceneId},
    error::ErrorReport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Add,
    Remove,
    Reset,
    Change,
    Destroy,
    Sync,
    Error,
}

/// Notifications published by a scene collection. Model-level events
/// (`Change`, `Destroy`) carry the scene they concern so per-model observers
/// can filter on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SceneEvent {
    Add { scene: Scene },
    Remove { scene: Scene },
    Reset { scenes: Vec<Scene> },
    Change { scene: Scene },
    Destroy { scene: Scene },
    Sync { scene_id: SceneId },
    Error(ErrorReport),
}

impl SceneEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SceneEvent::Add { .. } => EventKind::Add,
            SceneEvent::Remove { .. } => EventKind::Remove,
            SceneEvent::Reset { .. } => EventKind::Reset,
            SceneEvent::Change { .. } => EventKind::Change,
            SceneEvent::Destroy { .. } => EventKind::Destroy,
            SceneEvent::Sync { .. } => EventKind::Sync,
            SceneEvent::Error(_) => EventKind::Error,
        }
    }

    /// The single scene an event is about, if any.
    pub fn scene_id(&self) -> Option<SceneId> {
        match self {
            SceneEvent::Add { scene }
            | SceneEvent::Remove { scene }
            | SceneEvent::Change { scene }
            | SceneEvent::Destroy { scene } => Some(scene.id),
            SceneEvent::Sync { scene_id } => Some(*scene_id),
            SceneEvent::Reset { .. } | SceneEvent::Error(_) => None,
        }
    }
}

/// Which events a subscriber wants. An empty `kinds` list is the wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    kinds: Vec<EventKind>,
    scene: Option<SceneId>,
}

impl EventFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn kinds(kinds: impl IntoIterator<Item = EventKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
            scene: None,
        }
    }

    pub fn for_scene(mut self, scene_id: SceneId) -> Self {
        self.scene = Some(scene_id);
        self
    }

    pub fn matches(&self, event: &SceneEvent) -> bool {
        if !self.kinds.is_empty() && !self.kinds.contains(&event.kind()) {
            return false;
        }
        match self.scene {
            Some(scene_id) => event.scene_id() == Some(scene_id),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewScene;

    fn scene() -> Scene {
        NewScene::new()
            .instructions(Some("Welcome to Git Neat!"))
            .img_class("img0")
            .into_scene(SceneId::new(), 1)
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let value = serde_json::to_value(SceneEvent::Sync {
            scene_id: scene().id,
        })
        .expect("serialize");
        assert_eq!(value["type"], "sync");
        assert!(value["payload"]["scene_id"].is_string());
    }

    #[test]
    fn scene_filter_ignores_other_scenes() {
        let mine = scene();
        let other = scene();
        let filter =
            EventFilter::kinds([EventKind::Change, EventKind::Destroy]).for_scene(mine.id);

        assert!(filter.matches(&SceneEvent::Change {
            scene: mine.clone()
        }));
        assert!(!filter.matches(&SceneEvent::Change { scene: other }));
        assert!(!filter.matches(&SceneEvent::Add { scene: mine }));
    }

    #[test]
    fn wildcard_filter_matches_everything() {
        let filter = EventFilter::all();
        assert!(filter.matches(&SceneEvent::Reset { scenes: vec![] }));
        assert!(filter.matches(&SceneEvent::Add { scene: scene() }));
    }
}
