use super::*;
use shared::{domain::NewScene, error::ErrorCode};
use storage::DEFAULT_NAMESPACE;

use crate::error::error_report;

async fn memory_store() -> LocalStorage {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    LocalStorage::new(storage, DEFAULT_NAMESPACE)
}

async fn started() -> AppContext<LocalStorage> {
    let mut context = AppContext::initialize(memory_store().await, &Settings::default())
        .await
        .expect("initialize");
    context.start().await.expect("start");
    context
}

#[tokio::test]
async fn start_mounts_opening_scene() {
    let context = started().await;

    let rendered = context.rendered();
    assert_eq!(rendered.len(), 1);
    let item = &rendered[0];
    assert_eq!(item.scene.scene_number, 0);
    assert_eq!(item.scene.img_class, "img0");
    assert_eq!(item.scene.order, 1);
    assert_eq!(
        item.html,
        r#"<li><div class="view img0"><label>Welcome to Git Neat!</label></div></li>"#
    );
    assert_eq!(context.collection().len(), 1);
}

#[tokio::test]
async fn click_advances_to_next_frame() {
    let mut context = started().await;
    let first = context.current().expect("opening view");

    let next = context.click(first.view_id).await.expect("click");

    assert_eq!(next.scene_number, 1);
    assert_eq!(next.img_class, "img1");
    assert_eq!(next.instructions.as_deref(), Some("How are you?"));
    assert!(context.collection().get(first.scene.id).is_none());

    let rendered = context.rendered();
    assert_eq!(rendered.len(), 1);
    assert_eq!(rendered[0].scene, next);
    assert_ne!(rendered[0].view_id, first.view_id);
    assert_eq!(context.app().views().len(), 1);
}

#[tokio::test]
async fn advancing_past_the_script_leaves_instructions_empty() {
    let mut context = started().await;
    context.advance().await.expect("to scene 1");
    let third = context.advance().await.expect("to scene 2");
    assert_eq!(third.instructions.as_deref(), Some("I am fine."));

    let beyond = context.advance().await.expect("to scene 3");
    assert_eq!(beyond.scene_number, 3);
    assert_eq!(beyond.img_class, "img3");
    assert_eq!(beyond.instructions, None);

    let current = context.current().expect("mounted");
    assert_eq!(
        current.html,
        r#"<li><div class="view img3"><label></label></div></li>"#
    );
}

#[tokio::test]
async fn destroyed_views_are_released() {
    let mut context = started().await;
    for _ in 0..5 {
        context.advance().await.expect("advance");
    }
    assert_eq!(context.app().views().len(), 1);
    // app view plus the current item view
    assert_eq!(context.collection().hub().subscriber_count(), 2);
}

#[tokio::test]
async fn clicking_unknown_view_is_not_found() {
    let mut context = started().await;
    let err = context
        .click(ViewId::new())
        .await
        .expect_err("unknown view");
    assert_eq!(error_report(&err).code, ErrorCode::NotFound);
    assert_eq!(context.rendered().len(), 1);
}

#[tokio::test]
async fn advance_without_views_is_not_found() {
    let mut context = AppContext::initialize(memory_store().await, &Settings::default())
        .await
        .expect("initialize");
    let err = context.advance().await.expect_err("nothing mounted");
    assert_eq!(error_report(&err).code, ErrorCode::NotFound);
}

#[tokio::test]
async fn initialize_mounts_persisted_scenes_and_start_replaces_them() {
    let store = memory_store().await;
    {
        let mut seed = SceneCollection::new(store.clone());
        seed.create(NewScene::new().instructions(Some("left over")).scene_number(4))
            .await
            .expect("seed");
        seed.create(NewScene::new().scene_number(5))
            .await
            .expect("seed");
    }

    let mut context = AppContext::initialize(store.clone(), &Settings::default())
        .await
        .expect("initialize");
    let numbers: Vec<u32> = context
        .rendered()
        .iter()
        .map(|item| item.scene.scene_number)
        .collect();
    assert_eq!(numbers, vec![4, 5]);
    assert!(context.app().render_count() >= 1);

    let opening = context.start().await.expect("start");
    assert_eq!(opening.scene_number, 0);
    assert_eq!(opening.order, 1);
    assert_eq!(context.rendered().len(), 1);
    assert_eq!(store.find_all().await.expect("find all"), vec![opening]);
}

#[tokio::test]
async fn change_rerenders_mounted_view() {
    let mut context = started().await;
    let current = context.current().expect("mounted");

    let mut edited = current.scene.clone();
    edited.instructions = Some("Edited".to_string());
    context
        .collection
        .save(edited.clone())
        .await
        .expect("save");
    context.dispatch();

    let after = context.current().expect("still mounted");
    assert_eq!(after.view_id, current.view_id);
    assert_eq!(after.scene, edited);
    assert_eq!(
        after.html,
        format!(
            "<li>{}</li>",
            ItemTemplate::default().render(&edited.to_json())
        )
    );
}

#[tokio::test]
async fn invalid_template_is_rejected() {
    let settings = Settings {
        item_template: "{{nope}}".to_string(),
        ..Settings::default()
    };
    let err = AppContext::initialize(memory_store().await, &settings)
        .await
        .err()
        .expect("template error");
    assert_eq!(error_report(&err).code, ErrorCode::Template);
}

#[tokio::test]
async fn custom_script_drives_frames() {
    let settings = Settings {
        script: Script::new(["first", "second"]),
        ..Settings::default()
    };
    let mut context = AppContext::initialize(memory_store().await, &settings)
        .await
        .expect("initialize");
    let opening = context.start().await.expect("start");
    assert_eq!(opening.instructions.as_deref(), Some("first"));
    let next = context.advance().await.expect("advance");
    assert_eq!(next.instructions.as_deref(), Some("second"));
}

#[tokio::test]
async fn shutdown_drops_every_subscription() {
    let context = started().await;
    let hub = context.collection().hub().clone();
    assert!(hub.subscriber_count() > 0);
    context.shutdown();
    assert_eq!(hub.subscriber_count(), 0);
}

fn mounted_ids(context: &AppContext<LocalStorage>) -> Vec<SceneId> {
    context
        .rendered()
        .iter()
        .map(|item| item.scene.id)
        .collect()
}

fn collection_ids(context: &AppContext<LocalStorage>) -> Vec<SceneId> {
    context.collection().iter().map(|scene| scene.id).collect()
}

#[tokio::test]
async fn start_clears_more_persisted_scenes_than_the_event_buffer_holds() {
    let store = memory_store().await;
    {
        let mut seed = SceneCollection::new(store.clone());
        for number in 0..200 {
            seed.create(NewScene::new().scene_number(number))
                .await
                .expect("seed");
        }
    }

    let mut context = AppContext::initialize(store.clone(), &Settings::default())
        .await
        .expect("initialize");
    assert_eq!(context.rendered().len(), 200);

    let opening = context.start().await.expect("start");
    assert_eq!(store.find_all().await.expect("find all"), vec![opening.clone()]);
    assert_eq!(context.app().views().len(), 1);
    assert_eq!(mounted_ids(&context), vec![opening.id]);
}

#[tokio::test]
async fn lost_events_rebuild_views_from_the_collection() {
    let settings = Settings {
        event_capacity: MIN_EVENT_CAPACITY,
        ..Settings::default()
    };
    let mut context = AppContext::initialize(memory_store().await, &settings)
        .await
        .expect("initialize");
    context.start().await.expect("start");

    for number in 1..6 {
        context
            .collection
            .create(NewScene::new().scene_number(number))
            .await
            .expect("create");
    }
    context.dispatch();
    assert_eq!(context.rendered().len(), 6);
    assert_eq!(mounted_ids(&context), collection_ids(&context));

    let doomed: Vec<SceneId> = collection_ids(&context).into_iter().take(4).collect();
    for scene_id in doomed {
        context.collection.destroy(scene_id).await.expect("destroy");
    }
    context.dispatch();
    assert_eq!(context.app().views().len(), 2);
    assert_eq!(mounted_ids(&context), collection_ids(&context));

    let next = context.advance().await.expect("advance");
    assert_eq!(mounted_ids(&context).last(), Some(&next.id));
}

#[tokio::test]
async fn event_capacity_below_one_click_is_rejected() {
    let settings = Settings {
        event_capacity: 1,
        ..Settings::default()
    };
    let err = AppContext::initialize(memory_store().await, &settings)
        .await
        .err()
        .expect("capacity error");
    assert_eq!(error_report(&err).code, ErrorCode::Validation);
}
