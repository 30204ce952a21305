use matahari_server::entity::user::{self, Role};
use matahari_server::entity::file;
use reqwest::multipart::Form;
use sea_orm::{EntityTrait, PaginatorTrait};

use crate::common::{PASSWORD, TestApp, file_part, routes};

fn user_form(email: &str) -> Form {
    Form::new()
        .text("full_name", "Sari Wulandari")
        .text("username", "sari")
        .text("phone_number", "081234567890")
        .text("email", email.to_string())
        .text("password", PASSWORD)
        .text("address", "Jl. Merdeka 1")
        .text("role", "Admin")
}

#[tokio::test]
async fn created_user_has_avatar_and_can_log_in() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let form = user_form("sari@example.com").part("file", file_part("sari.png", b"avatar"));
    let res = app.post_form(routes::USER, form, &token).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["message"], "User saved successfully");

    let id = app.latest::<user::Entity>(user::Column::Id).await.id;
    let res = app.get(&format!("{}?id={id}", routes::USER)).await;
    assert_eq!(res.status, 200);
    let data = &res.body["data"];
    assert_eq!(data["role"], "Admin");
    assert_eq!(data["address"], "Jl. Merdeka 1");
    assert!(data.get("password").is_none());
    let avatar = data["path_file"].as_str().unwrap();
    assert_eq!(app.fetch_public(avatar).await.as_deref(), Some(&b"avatar"[..]));

    let res = app.login("sari@example.com", PASSWORD).await;
    assert_eq!(res.status, 200, "{}", res.text);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let res = app
        .post_form(routes::USER, user_form("admin@example.com"), &token)
        .await;
    assert_eq!(res.status, 409);
    assert_eq!(res.body["message"], "Email is already registered");
    assert_eq!(file::Entity::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn only_super_admin_grants_super_admin() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let root = app.token_for("root@example.com", Role::SuperAdmin).await;

    let form = user_form("boss@example.com").text("role", "SuperAdmin");
    let res = app.post_form(routes::USER, form, &admin).await;
    assert_eq!(res.status, 400);
    assert!(res.body["error"]["role"].is_array());

    let form = user_form("boss@example.com").text("role", "SuperAdmin");
    let res = app.post_form(routes::USER, form, &root).await;
    assert_eq!(res.status, 200, "{}", res.text);
}

#[tokio::test]
async fn update_keeps_password_when_blank() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let id = app
        .insert_user("Budi Santoso", "budi@example.com", Role::Customer)
        .await;

    let form = Form::new()
        .text("full_name", "Budi S.")
        .text("password", "")
        .part("file", file_part("budi.jpg", b"budi"));
    let res = app.put_form(&format!("{}/{id}", routes::USER), form, &token).await;
    assert_eq!(res.status, 200, "{}", res.text);

    let res = app.get(&format!("{}?id={id}", routes::USER)).await;
    assert_eq!(res.body["data"]["full_name"], "Budi S.");
    assert!(res.body["data"]["path_file"].as_str().unwrap().ends_with(".jpg"));
    assert_eq!(app.login("budi@example.com", PASSWORD).await.status, 200);
}

#[tokio::test]
async fn failed_update_keeps_the_old_avatar() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let form = user_form("sari@example.com").part("file", file_part("sari.png", b"avatar"));
    app.post_form(routes::USER, form, &token).await;
    let id = app.latest::<user::Entity>(user::Column::Id).await.id;
    let avatar = app.get(&format!("{}?id={id}", routes::USER)).await.body["data"]["path_file"]
        .as_str()
        .unwrap()
        .to_string();

    let form = Form::new()
        .text("email", "admin@example.com")
        .part("file", file_part("new.png", b"replacement"));
    let res = app.put_form(&format!("{}/{id}", routes::USER), form, &token).await;
    assert_eq!(res.status, 409, "{}", res.text);

    let res = app.get(&format!("{}?id={id}", routes::USER)).await;
    assert_eq!(res.body["data"]["path_file"], avatar.as_str());
    assert!(app.blob_on_disk(&avatar));
    assert_eq!(app.fetch_public(&avatar).await.as_deref(), Some(&b"avatar"[..]));
    assert_eq!(file::Entity::find().count(&app.db).await.unwrap(), 1);
}

#[tokio::test]
async fn delete_removes_avatar_row_and_blob() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let form = user_form("sari@example.com").part("file", file_part("sari.png", b"avatar"));
    app.post_form(routes::USER, form, &token).await;
    let id = app.latest::<user::Entity>(user::Column::Id).await.id;
    let avatar = app.get(&format!("{}?id={id}", routes::USER)).await.body["data"]["path_file"]
        .as_str()
        .unwrap()
        .to_string();

    let res = app.delete(&format!("{}?id={id}", routes::USER), &token).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(app.get(&format!("{}?id={id}", routes::USER)).await.status, 404);
    assert_eq!(file::Entity::find().count(&app.db).await.unwrap(), 0);
    assert!(!app.blob_on_disk(&avatar));
}

#[tokio::test]
async fn admin_cannot_delete_themselves() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let me = app.latest::<user::Entity>(user::Column::Id).await.id;

    let res = app.delete(&format!("{}?id={me}", routes::USER), &token).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["message"], "You cannot delete your own account");
}
