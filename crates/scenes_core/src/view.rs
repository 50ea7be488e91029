use std::sync::Arc;

use anyhow::Result;
use shared::{
    domain::{Scene, ViewId},
    events::{EventFilter, EventKind, SceneEvent},
};
use storage::SceneStore;
use tracing::{debug, warn};

use crate::{
    collection::SceneCollection,
    observer::{EventHub, Observer, Subscription},
    script::Script,
    template::ItemTemplate,
};

/// Something that produces a markup fragment.
pub trait Render {
    fn render(&mut self) -> &mut Self;

    fn html(&self) -> &str;
}

/// `<li>` element bound one-to-one to a scene.
pub struct ItemView {
    id: ViewId,
    scene: Scene,
    template: Arc<ItemTemplate>,
    subscription: Option<Subscription>,
    inner_html: String,
    render_count: u64,
}

impl ItemView {
    pub fn new(scene: Scene, template: Arc<ItemTemplate>, hub: &EventHub) -> Self {
        let subscription = hub.subscribe(
            EventFilter::kinds([EventKind::Change, EventKind::Destroy]).for_scene(scene.id),
        );
        Self {
            id: ViewId::new(),
            scene,
            template,
            subscription: Some(subscription),
            inner_html: String::new(),
            render_count: 0,
        }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    pub fn is_detached(&self) -> bool {
        self.subscription.is_none()
    }

    /// The full element, empty once detached.
    pub fn element(&self) -> String {
        if self.is_detached() {
            return String::new();
        }
        format!("<li>{}</li>", self.inner_html)
    }

    /// Removes the view from the page and stops listening to its scene.
    pub fn detach(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
            self.inner_html.clear();
            debug!(view_id = %self.id, scene_id = %self.scene.id, "item view detached");
        }
    }

    pub fn take_lagged(&mut self) -> bool {
        self.subscription
            .as_mut()
            .is_some_and(Subscription::take_lagged)
    }

    /// Rebinds to a newer snapshot of the same scene, re-rendering if it differs.
    pub fn refresh(&mut self, scene: &Scene) {
        if self.is_detached() || self.scene == *scene {
            return;
        }
        self.scene = scene.clone();
        self.render();
    }

    /// Destroys the bound scene.
    pub async fn clear<S: SceneStore>(&self, collection: &mut SceneCollection<S>) -> Result<Scene> {
        collection.destroy(self.scene.id).await
    }

    /// Replaces the bound scene with the next frame of the script.
    pub async fn clicked_instructions<S: SceneStore>(
        &mut self,
        collection: &mut SceneCollection<S>,
        script: &Script,
    ) -> Result<Scene> {
        let current = self.scene.scene_number;
        let next = script.next_scene(current);
        if script.line(current.saturating_add(1)).is_none() {
            warn!(
                scene_number = current,
                script_len = script.len(),
                "script exhausted, next scene has no instructions"
            );
        }

        self.clear(collection).await?;
        self.detach();
        collection.create(next).await
    }
}

impl Render for ItemView {
    fn render(&mut self) -> &mut Self {
        self.inner_html = self.template.render(&self.scene.to_json());
        self.render_count += 1;
        self
    }

    fn html(&self) -> &str {
        &self.inner_html
    }
}

impl Observer for ItemView {
    fn subscription_mut(&mut self) -> Option<&mut Subscription> {
        self.subscription.as_mut()
    }

    fn on_event(&mut self, event: &SceneEvent) {
        if self.is_detached() {
            return;
        }
        match event {
            SceneEvent::Change { scene } => {
                self.scene = scene.clone();
                self.render();
            }
            SceneEvent::Destroy { .. } => self.detach(),
            _ => {}
        }
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
