use matahari_server::entity::user::Role;
use matahari_server::entity::{contract, contract_product};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{Value, json};

use crate::common::{TestApp, routes};

struct Fixture {
    app: TestApp,
    token: String,
    client_id: i32,
    panel: i32,
    strip: i32,
}

async fn fixture() -> Fixture {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let client_id = app
        .insert_user("Budi Santoso", "budi@example.com", Role::Customer)
        .await;
    let category_id = app.create_category(&token, "Lighting").await;
    let panel = app.create_product(&token, "LED Panel", category_id, 0).await;
    let strip = app.create_product(&token, "LED Strip", category_id, 0).await;
    Fixture {
        app,
        token,
        client_id,
        panel,
        strip,
    }
}

fn payload(user_id: i32, product_ids: &[i32]) -> Value {
    json!({
        "title": "Street lighting",
        "description": "Phase 2",
        "start_date": "2024-01-15",
        "end_date": "2024-06-30",
        "user_id": user_id,
        "product_ids": product_ids,
    })
}

#[tokio::test]
async fn contract_lists_owner_and_product_names() {
    let f = fixture().await;

    let res = f
        .app
        .post_json(
            routes::CONTRACT,
            &payload(f.client_id, &[f.strip, f.panel]),
            Some(&f.token),
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["message"], "Contract saved successfully");

    let id = f.app.latest::<contract::Entity>(contract::Column::Id).await.id;
    let res = f.app.get(&routes::contract(id)).await;
    assert_eq!(res.status, 200);
    let data = &res.body["data"];
    assert_eq!(data["user_name"], "Budi Santoso");
    assert_eq!(data["start_date"], "2024-01-15");
    assert_eq!(
        data["product_names"],
        json!([
            {"id": f.panel, "name": "LED Panel"},
            {"id": f.strip, "name": "LED Strip"},
        ])
    );

    let res = f
        .app
        .get(&format!("/api/contract/datatable?user_id={}", f.client_id))
        .await;
    assert_eq!(res.body["data"]["total"], 1);
    let res = f
        .app
        .get(&format!("/api/contract/datatable?user_id={}", f.client_id + 100))
        .await;
    assert_eq!(res.body["data"]["total"], 0);
}

#[tokio::test]
async fn unknown_product_writes_nothing() {
    let f = fixture().await;

    let res = f
        .app
        .post_json(
            routes::CONTRACT,
            &payload(f.client_id, &[f.panel, 999]),
            Some(&f.token),
        )
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["error"]["product_ids"][0], "Product 999 does not exist");
    assert_eq!(contract::Entity::find().count(&f.app.db).await.unwrap(), 0);
    assert_eq!(
        contract_product::Entity::find().count(&f.app.db).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn unknown_owner_is_not_found() {
    let f = fixture().await;

    let res = f
        .app
        .post_json(routes::CONTRACT, &payload(9999, &[f.panel]), Some(&f.token))
        .await;
    assert_eq!(res.status, 404);
    assert_eq!(res.body["message"], "User not found");
}

#[tokio::test]
async fn end_before_start_is_rejected() {
    let f = fixture().await;
    let mut body = payload(f.client_id, &[f.panel]);
    body["end_date"] = json!("2023-12-31");

    let res = f.app.post_json(routes::CONTRACT, &body, Some(&f.token)).await;
    assert_eq!(res.status, 400);
    assert!(res.body["error"]["end_date"].is_array());
}

#[tokio::test]
async fn update_replaces_product_links() {
    let f = fixture().await;
    f.app
        .post_json(
            routes::CONTRACT,
            &payload(f.client_id, &[f.panel, f.strip]),
            Some(&f.token),
        )
        .await;
    let id = f.app.latest::<contract::Entity>(contract::Column::Id).await.id;

    let res = f
        .app
        .put_json(&routes::contract(id), &payload(f.client_id, &[f.strip]), &f.token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let res = f.app.get(&routes::contract(id)).await;
    assert_eq!(
        res.body["data"]["product_names"],
        json!([{"id": f.strip, "name": "LED Strip"}])
    );
    assert_eq!(
        contract_product::Entity::find().count(&f.app.db).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn owner_with_contracts_cannot_be_deleted_until_contract_is_gone() {
    let f = fixture().await;
    f.app
        .post_json(
            routes::CONTRACT,
            &payload(f.client_id, &[f.panel]),
            Some(&f.token),
        )
        .await;
    let id = f.app.latest::<contract::Entity>(contract::Column::Id).await.id;
    let delete_user = format!("{}?id={}", routes::USER, f.client_id);

    let res = f.app.delete(&delete_user, &f.token).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["message"], "User still owns 1 contracts");

    let res = f.app.delete(&routes::contract(id), &f.token).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(
        contract_product::Entity::find().count(&f.app.db).await.unwrap(),
        0
    );

    let res = f.app.delete(&delete_user, &f.token).await;
    assert_eq!(res.status, 200, "{}", res.text);
}
