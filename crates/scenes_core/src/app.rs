//! App shell and the application context that owns it.

use std::{collections::HashSet, sync::Arc};

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use shared::{
    domain::{Scene, SceneId, ViewId},
    error::SceneException,
    events::{EventFilter, SceneEvent},
};
use storage::{LocalStorage, SceneStore, Storage};
use tracing::{debug, info, warn};

use crate::{
    collection::SceneCollection,
    observer::{EventHub, Observer, Subscription, MIN_EVENT_CAPACITY},
    script::Script,
    settings::{normalize_database_url, Settings},
    template::ItemTemplate,
    view::{ItemView, Render},
};

/// One mounted list entry as the host displays it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedItem {
    pub view_id: ViewId,
    pub scene: Scene,
    pub html: String,
}

/// Top-level coordinator: mounts an item view per scene the collection announces.
pub struct AppView {
    hub: EventHub,
    template: Arc<ItemTemplate>,
    subscription: Option<Subscription>,
    views: Vec<ItemView>,
    render_count: u64,
}

impl AppView {
    pub fn new(hub: EventHub, template: Arc<ItemTemplate>) -> Self {
        Self {
            hub,
            template,
            subscription: None,
            views: Vec::new(),
            render_count: 0,
        }
    }

    /// Starts listening to the collection and loads whatever is persisted.
    pub async fn initialize<S: SceneStore>(
        &mut self,
        collection: &mut SceneCollection<S>,
    ) -> Result<usize> {
        self.subscription = Some(collection.subscribe(EventFilter::all()));
        collection.fetch().await
    }

    pub fn add_one(&mut self, scene: Scene) -> ViewId {
        let mut view = ItemView::new(scene, Arc::clone(&self.template), &self.hub);
        view.render();
        let view_id = view.id();
        debug!(%view_id, scene_id = %view.scene().id, "item view mounted");
        self.views.push(view);
        view_id
    }

    pub fn add_all(&mut self, scenes: &[Scene]) {
        for scene in scenes {
            self.add_one(scene.clone());
        }
    }

    /// Counts passes; the shell itself has nothing to redraw.
    pub fn render(&mut self) {
        self.render_count += 1;
    }

    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    pub fn views(&self) -> &[ItemView] {
        &self.views
    }

    pub fn view_mut(&mut self, view_id: ViewId) -> Option<&mut ItemView> {
        self.views
            .iter_mut()
            .find(|view| view.id() == view_id && !view.is_detached())
    }

    pub fn current_view(&self) -> Option<&ItemView> {
        self.views.iter().rev().find(|view| !view.is_detached())
    }

    /// Delivers pending events to the shell, then to every mounted item view.
    /// If any subscription lost events, the views are rebuilt from `scenes`.
    pub fn dispatch(&mut self, scenes: &[Scene]) -> usize {
        let mut delivered = self.pump();
        let mut lagged = self
            .subscription
            .as_mut()
            .is_some_and(Subscription::take_lagged);
        for view in &mut self.views {
            delivered += view.pump();
            lagged |= view.take_lagged();
        }
        if lagged {
            self.resync(scenes);
        }
        let before = self.views.len();
        self.views.retain(|view| !view.is_detached());
        let pruned = before - self.views.len();
        if pruned > 0 {
            debug!(pruned, "detached item views released");
        }
        delivered
    }

    /// Mounts exactly one view per scene in `scenes`, detaching the rest.
    pub fn resync(&mut self, scenes: &[Scene]) {
        let mut mounted = HashSet::new();
        for view in &mut self.views {
            if view.is_detached() {
                continue;
            }
            let scene_id = view.scene().id;
            match scenes.iter().find(|scene| scene.id == scene_id) {
                Some(scene) if mounted.insert(scene_id) => view.refresh(scene),
                _ => view.detach(),
            }
        }
        let missing: Vec<Scene> = scenes
            .iter()
            .filter(|scene| !mounted.contains(&scene.id))
            .cloned()
            .collect();
        warn!(
            kept = mounted.len(),
            added = missing.len(),
            "events were lost, item views rebuilt from the collection"
        );
        self.add_all(&missing);
        self.views
            .sort_by_key(|view| scenes.iter().position(|scene| scene.id == view.scene().id));
        self.render();
    }

    pub fn rendered(&self) -> Vec<RenderedItem> {
        self.views
            .iter()
            .filter(|view| !view.is_detached())
            .map(|view| RenderedItem {
                view_id: view.id(),
                scene: view.scene().clone(),
                html: view.element(),
            })
            .collect()
    }

    pub fn teardown(&mut self) {
        for view in &mut self.views {
            view.detach();
        }
        self.views.clear();
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

impl Observer for AppView {
    fn subscription_mut(&mut self) -> Option<&mut Subscription> {
        self.subscription.as_mut()
    }

    fn on_event(&mut self, event: &SceneEvent) {
        match event {
            SceneEvent::Add { scene } => {
                self.add_one(scene.clone());
            }
            SceneEvent::Reset { scenes } => self.add_all(scenes),
            _ => {}
        }
        self.render();
    }
}

/// Owns the collection, the shell and the script for one running slideshow.
pub struct AppContext<S> {
    collection: SceneCollection<S>,
    app: AppView,
    script: Script,
}

impl AppContext<LocalStorage> {
    /// Opens the configured SQLite database and namespace.
    pub async fn open(settings: &Settings) -> Result<Self> {
        let database_url = normalize_database_url(&settings.database_url);
        let storage = Storage::new(&database_url)
            .await
            .with_context(|| format!("failed to open scene storage at '{database_url}'"))?;
        let store = LocalStorage::new(storage, settings.namespace.clone());
        Self::initialize(store, settings).await
    }
}

impl<S: SceneStore> AppContext<S> {
    pub async fn initialize(store: S, settings: &Settings) -> Result<Self> {
        if settings.event_capacity < MIN_EVENT_CAPACITY {
            return Err(anyhow!(SceneException::validation(format!(
                "event_capacity {} is below the minimum of {MIN_EVENT_CAPACITY}",
                settings.event_capacity
            ))));
        }
        let template = ItemTemplate::compile(&settings.item_template)
            .map_err(|err| anyhow!(SceneException::template(err.to_string())))
            .context("invalid item template")?;
        let collection = SceneCollection::with_event_capacity(store, settings.event_capacity);
        let app = AppView::new(collection.hub().clone(), Arc::new(template));

        let mut context = Self {
            collection,
            app,
            script: settings.script.clone(),
        };
        let loaded = context.app.initialize(&mut context.collection).await?;
        context.dispatch();
        info!(loaded, script_len = context.script.len(), "scenes app initialized");
        Ok(context)
    }

    pub fn collection(&self) -> &SceneCollection<S> {
        &self.collection
    }

    pub fn app(&self) -> &AppView {
        &self.app
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    /// Clears every frame left from an earlier run and shows the opening scene.
    pub async fn start(&mut self) -> Result<Scene> {
        let mounted: Vec<SceneId> = self
            .app
            .views()
            .iter()
            .map(|view| view.scene().id)
            .collect();
        for scene_id in mounted {
            if self.collection.get(scene_id).is_some() {
                self.collection.destroy(scene_id).await?;
                self.dispatch();
            }
        }

        let opening = self.collection.create(self.script.opening_scene()).await;
        self.dispatch();
        opening
    }

    pub async fn click(&mut self, view_id: ViewId) -> Result<Scene> {
        let view = self.app.view_mut(view_id).ok_or_else(|| {
            anyhow!(SceneException::not_found(format!(
                "no mounted view {view_id}"
            )))
        })?;
        let result = view
            .clicked_instructions(&mut self.collection, &self.script)
            .await;
        self.dispatch();
        result
    }

    /// Clicks the most recently mounted view.
    pub async fn advance(&mut self) -> Result<Scene> {
        let view_id = self
            .app
            .current_view()
            .map(ItemView::id)
            .ok_or_else(|| anyhow!(SceneException::not_found("no scene is mounted")))?;
        self.click(view_id).await
    }

    pub fn dispatch(&mut self) -> usize {
        self.app.dispatch(self.collection.scenes())
    }

    pub fn rendered(&self) -> Vec<RenderedItem> {
        self.app.rendered()
    }

    pub fn current(&self) -> Option<RenderedItem> {
        self.app.rendered().pop()
    }

    pub fn shutdown(mut self) {
        self.app.teardown();
        info!(
            subscribers = self.collection.hub().subscriber_count(),
            "scenes app shut down"
        );
    }
}

#[cfg(test)]
#[path = "tests/app_tests.rs"]
mod tests;
