use super::*;
use shared::domain::NewScene;
use storage::{LocalStorage, Storage, DEFAULT_NAMESPACE};

async fn collection() -> SceneCollection<LocalStorage> {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    SceneCollection::new(LocalStorage::new(storage, DEFAULT_NAMESPACE))
}

async fn opening_view(collection: &mut SceneCollection<LocalStorage>) -> ItemView {
    let scene = collection
        .create(Script::default().opening_scene())
        .await
        .expect("create");
    let mut view = ItemView::new(scene, Arc::new(ItemTemplate::default()), collection.hub());
    view.render();
    view
}

#[tokio::test]
async fn render_wraps_template_output_in_list_item() {
    let mut collection = collection().await;
    let view = opening_view(&mut collection).await;

    assert_eq!(
        view.html(),
        r#"<div class="view img0"><label>Welcome to Git Neat!</label></div>"#
    );
    assert_eq!(view.element(), format!("<li>{}</li>", view.html()));
    assert_eq!(view.render_count(), 1);
}

#[tokio::test]
async fn render_is_idempotent_without_changes() {
    let mut collection = collection().await;
    let mut view = opening_view(&mut collection).await;

    let first = view.html().to_string();
    let second = view.render().render().html().to_string();
    assert_eq!(first, second);
    assert_eq!(view.render_count(), 3);
}

#[tokio::test]
async fn change_event_rerenders_with_current_attributes() {
    let mut collection = collection().await;
    let mut view = opening_view(&mut collection).await;

    let mut edited = view.scene().clone();
    edited.instructions = Some("Edited <text>".to_string());
    collection.save(edited.clone()).await.expect("save");

    assert_eq!(view.pump(), 1);
    assert_eq!(view.scene(), &edited);
    assert_eq!(
        view.html(),
        ItemTemplate::default().render(&edited.to_json())
    );
    assert!(view.html().contains("Edited &lt;text&gt;"));
}

#[tokio::test]
async fn changes_to_other_scenes_are_ignored() {
    let mut collection = collection().await;
    let mut view = opening_view(&mut collection).await;
    let other = collection
        .create(NewScene::new().scene_number(7))
        .await
        .expect("create");

    let mut edited = other.clone();
    edited.img_class = "elsewhere".to_string();
    collection.save(edited).await.expect("save");

    assert_eq!(view.pump(), 0);
    assert_eq!(view.render_count(), 1);
}

#[tokio::test]
async fn destroy_event_detaches_view() {
    let mut collection = collection().await;
    let mut view = opening_view(&mut collection).await;

    view.clear(&mut collection).await.expect("clear");
    assert!(!view.is_detached());
    view.pump();

    assert!(view.is_detached());
    assert_eq!(view.element(), "");
    assert!(collection.is_empty());
}

#[tokio::test]
async fn click_replaces_scene_with_next_frame() {
    let mut collection = collection().await;
    let mut view = opening_view(&mut collection).await;
    let original = view.scene().id;

    let next = view
        .clicked_instructions(&mut collection, &Script::default())
        .await
        .expect("click");

    assert!(view.is_detached());
    assert!(collection.get(original).is_none());
    assert_eq!(collection.len(), 1);
    assert_eq!(next.scene_number, 1);
    assert_eq!(next.img_class, "img1");
    assert_eq!(next.instructions.as_deref(), Some("How are you?"));
    assert_eq!(collection.hub().subscriber_count(), 0);
}
