use matahari_server::entity::user::Role;
use matahari_server::entity::{file, history, video};
use reqwest::multipart::Form;
use sea_orm::{EntityTrait, PaginatorTrait};

use crate::common::{TestApp, file_part, routes};

fn entry_form(product_id: i32, user_id: i32) -> Form {
    Form::new()
        .text("title", "Harbour lighting")
        .text("description", "Replaced 120 fixtures")
        .text("start_date", "2023-04")
        .text("end_date", "2023-09")
        .text("product_id", product_id.to_string())
        .text("user_id", user_id.to_string())
        .text("video_title", "Walkthrough")
        .text("embed", "https://www.youtube.com/embed/abc123")
        .part("file", file_part("harbour.jpg", b"harbour"))
}

async fn seeded(app: &TestApp, token: &str) -> (i32, i32) {
    let category_id = app.create_category(token, "Lighting").await;
    let product_id = app.create_product(token, "LED Panel", category_id, 0).await;
    let user_id = app
        .insert_user("Budi Santoso", "budi@example.com", Role::Customer)
        .await;
    (product_id, user_id)
}

#[tokio::test]
async fn entry_with_video_resolves_every_relation() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let (product_id, user_id) = seeded(&app, &token).await;

    let res = app
        .post_form(routes::HISTORY, entry_form(product_id, user_id), &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["message"], "History saved successfully");

    let id = app.latest::<history::Entity>(history::Column::Id).await.id;
    let res = app.get(&routes::history(id)).await;
    assert_eq!(res.status, 200);
    let data = &res.body["data"];
    assert_eq!(data["product_name"], "LED Panel");
    assert_eq!(data["category_name"], "Lighting");
    assert_eq!(data["user"], "Budi Santoso");
    assert_eq!(data["video_title"], "Walkthrough");
    assert_eq!(data["embed"], "https://www.youtube.com/embed/abc123");
    assert_eq!(data["start_date"], "2023-04");
    assert!(data["path_file"].as_str().unwrap().starts_with("/public/"));

    let res = app.get(routes::VIDEO_ALL).await;
    assert_eq!(res.body["data"].as_array().unwrap().len(), 1);

    let res = app.get(&format!("/api/history/product/{product_id}")).await;
    assert_eq!(res.body["data"][0]["history_id"], id);
}

#[tokio::test]
async fn entry_without_video_fields_has_no_video() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let (product_id, _) = seeded(&app, &token).await;

    let form = Form::new()
        .text("title", "Warehouse")
        .text("description", "High bay lights")
        .text("product_id", product_id.to_string())
        .part("file", file_part("w.png", b"w"));
    let res = app.post_form(routes::HISTORY, form, &token).await;
    assert_eq!(res.status, 200, "{}", res.text);

    assert_eq!(video::Entity::find().count(&app.db).await.unwrap(), 0);
    let entry = app.latest::<history::Entity>(history::Column::Id).await;
    assert_eq!(entry.video_id, None);
    assert_eq!(entry.user_id, None);
}

#[tokio::test]
async fn missing_fields_are_reported_together() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let form = Form::new().text("user_id", "abc");
    let res = app.post_form(routes::HISTORY, form, &token).await;
    assert_eq!(res.status, 400);
    let error = &res.body["error"];
    for field in ["title", "description", "product_id", "file", "user_id"] {
        assert!(error[field].is_array(), "missing error for {field}: {}", res.text);
    }
}

#[tokio::test]
async fn portfolio_cards_carry_the_customer() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let (product_id, user_id) = seeded(&app, &token).await;
    app.post_form(routes::HISTORY, entry_form(product_id, user_id), &token)
        .await;

    let res = app.get("/api/history/user").await;
    assert_eq!(res.status, 200, "{}", res.text);
    let cards = res.body["data"].as_array().unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0]["title"], "Harbour lighting");
    assert_eq!(cards[0]["user"]["full_name"], "Budi Santoso");
    assert_eq!(cards[0]["user"]["path_file_user"], "");
}

#[tokio::test]
async fn update_edits_the_linked_video() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let (product_id, user_id) = seeded(&app, &token).await;
    app.post_form(routes::HISTORY, entry_form(product_id, user_id), &token)
        .await;
    let id = app.latest::<history::Entity>(history::Column::Id).await.id;

    let form = Form::new()
        .text("title", "Harbour lighting, phase 2")
        .text("video_title", "Night walkthrough");
    let res = app.put_form(&routes::history(id), form, &token).await;
    assert_eq!(res.status, 200, "{}", res.text);

    let data = app.get(&routes::history(id)).await.body["data"].clone();
    assert_eq!(data["title"], "Harbour lighting, phase 2");
    assert_eq!(data["video_title"], "Night walkthrough");
    assert_eq!(data["embed"], "https://www.youtube.com/embed/abc123");
    assert_eq!(video::Entity::find().count(&app.db).await.unwrap(), 1);
}

#[tokio::test]
async fn delete_removes_video_and_cover() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let (product_id, user_id) = seeded(&app, &token).await;
    app.post_form(routes::HISTORY, entry_form(product_id, user_id), &token)
        .await;
    let entry = app.latest::<history::Entity>(history::Column::Id).await;
    let cover = app.get(&routes::history(entry.id)).await.body["data"]["path_file"]
        .as_str()
        .unwrap()
        .to_string();
    let files_before = file::Entity::find().count(&app.db).await.unwrap();

    let res = app.delete(&routes::history(entry.id), &token).await;
    assert_eq!(res.status, 200, "{}", res.text);

    assert_eq!(app.get(&routes::history(entry.id)).await.status, 404);
    assert_eq!(video::Entity::find().count(&app.db).await.unwrap(), 0);
    assert_eq!(
        file::Entity::find().count(&app.db).await.unwrap(),
        files_before - 1
    );
    assert!(!app.blob_on_disk(&cover));
}

#[tokio::test]
async fn deleting_the_customer_keeps_the_entry() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let (product_id, user_id) = seeded(&app, &token).await;
    app.post_form(routes::HISTORY, entry_form(product_id, user_id), &token)
        .await;
    let id = app.latest::<history::Entity>(history::Column::Id).await.id;

    let res = app
        .delete(&format!("{}?id={user_id}", routes::USER), &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let data = app.get(&routes::history(id)).await.body["data"].clone();
    assert_eq!(data["user_id"], serde_json::Value::Null);
    assert_eq!(data["user"], "");

    let res = app
        .delete(&format!("{}?id={product_id}", routes::PRODUCT), &token)
        .await;
    assert_eq!(res.status, 400);
}
