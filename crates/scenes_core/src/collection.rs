use anyhow::{anyhow, Result};
use shared::{
    domain::{NewScene, Scene, SceneId},
    error::SceneException,
    events::{EventFilter, SceneEvent},
};
use storage::SceneStore;
use tracing::{debug, info};

use crate::{
    error::error_report,
    observer::{EventHub, Subscription, DEFAULT_EVENT_CAPACITY},
};

/// Scenes kept sorted by `order`, persisted through a [`SceneStore`].
pub struct SceneCollection<S> {
    store: S,
    scenes: Vec<Scene>,
    hub: EventHub,
}

impl<S: SceneStore> SceneCollection<S> {
    pub fn new(store: S) -> Self {
        Self::with_event_capacity(store, DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_event_capacity(store: S, capacity: usize) -> Self {
        Self {
            store,
            scenes: Vec::new(),
            hub: EventHub::new(capacity),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn hub(&self) -> &EventHub {
        &self.hub
    }

    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.hub.subscribe(filter)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.iter()
    }

    pub fn get(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|scene| scene.id == id)
    }

    pub fn first(&self) -> Option<&Scene> {
        self.scenes.first()
    }

    pub fn last(&self) -> Option<&Scene> {
        self.scenes.last()
    }

    /// Order for the next created scene; fails once the last order is `u64::MAX`.
    pub fn next_order(&self) -> Result<u64> {
        match self.last() {
            Some(scene) => scene.order.checked_add(1).ok_or_else(|| {
                anyhow!(SceneException::validation(format!(
                    "order of scene {} leaves no room for another scene",
                    scene.id
                )))
            }),
            None => Ok(1),
        }
    }

    pub async fn create(&mut self, attrs: NewScene) -> Result<Scene> {
        let scene = attrs.into_scene(SceneId::new(), self.next_order()?);
        if let Err(err) = self.store.create(&scene).await {
            return Err(self.storage_failure(err, format!("failed to persist scene {}", scene.id)));
        }

        self.insert_sorted(scene.clone());
        info!(
            scene_id = %scene.id,
            scene_number = scene.scene_number,
            order = scene.order,
            "scene created"
        );
        self.hub.notify(SceneEvent::Add {
            scene: scene.clone(),
        });
        self.hub.notify(SceneEvent::Sync { scene_id: scene.id });
        Ok(scene)
    }

    /// Replaces the contents with whatever the store holds and announces a reset.
    pub async fn fetch(&mut self) -> Result<usize> {
        let mut scenes = match self.store.find_all().await {
            Ok(scenes) => scenes,
            Err(err) => return Err(self.storage_failure(err, "failed to load scenes")),
        };
        scenes.sort_by_key(|scene| scene.order);
        self.scenes = scenes;

        info!(count = self.scenes.len(), "scenes fetched");
        self.hub.notify(SceneEvent::Reset {
            scenes: self.scenes.clone(),
        });
        Ok(self.scenes.len())
    }

    pub async fn save(&mut self, scene: Scene) -> Result<Scene> {
        let Some(position) = self.position(scene.id) else {
            return Err(anyhow!(SceneException::not_found(format!(
                "cannot save unknown scene {}",
                scene.id
            ))));
        };
        if let Err(err) = self.store.update(&scene).await {
            return Err(self.storage_failure(err, format!("failed to save scene {}", scene.id)));
        }

        let reordered = self.scenes[position].order != scene.order;
        self.scenes[position] = scene.clone();
        if reordered {
            self.scenes.sort_by_key(|scene| scene.order);
        }

        debug!(scene_id = %scene.id, "scene saved");
        self.hub.notify(SceneEvent::Change {
            scene: scene.clone(),
        });
        self.hub.notify(SceneEvent::Sync { scene_id: scene.id });
        Ok(scene)
    }

    pub async fn destroy(&mut self, id: SceneId) -> Result<Scene> {
        let Some(position) = self.position(id) else {
            return Err(anyhow!(SceneException::not_found(format!(
                "cannot destroy unknown scene {id}"
            ))));
        };
        if let Err(err) = self.store.destroy(id).await {
            return Err(self.storage_failure(err, format!("failed to destroy scene {id}")));
        }

        let scene = self.scenes.remove(position);
        info!(scene_id = %id, scene_number = scene.scene_number, "scene destroyed");
        self.hub.notify(SceneEvent::Destroy {
            scene: scene.clone(),
        });
        self.hub.notify(SceneEvent::Remove {
            scene: scene.clone(),
        });
        Ok(scene)
    }

    fn position(&self, id: SceneId) -> Option<usize> {
        self.scenes.iter().position(|scene| scene.id == id)
    }

    fn insert_sorted(&mut self, scene: Scene) {
        let index = self
            .scenes
            .partition_point(|existing| existing.order <= scene.order);
        self.scenes.insert(index, scene);
    }

    fn storage_failure(&self, err: anyhow::Error, message: impl Into<String>) -> anyhow::Error {
        let err = err.context(SceneException::storage(message));
        self.hub.notify(SceneEvent::Error(error_report(&err)));
        err
    }
}

#[cfg(test)]
#[path = "tests/collection_tests.rs"]
mod tests;
