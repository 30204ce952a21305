use matahari_server::entity::user::Role;

use crate::common::{TestApp, routes};

/// Admin plus twelve customers, thirteen users in id order.
async fn thirteen_users() -> TestApp {
    let app = TestApp::spawn().await;
    app.admin_token().await;
    for i in 1..=12 {
        app.insert_user(
            &format!("Customer {i:02}"),
            &format!("customer{i:02}@example.com"),
            Role::Customer,
        )
        .await;
    }
    app
}

#[tokio::test]
async fn second_page_links_to_its_neighbours() {
    let app = thirteen_users().await;

    let res = app
        .get(&format!("{}?page=2&limit=5", routes::USER_DATATABLE))
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let table = &res.body["data"];
    assert_eq!(table["current_page"], 2);
    assert_eq!(table["total"], 13);
    assert_eq!(table["from"], 6);
    assert_eq!(table["to"], 10);
    assert_eq!(table["last_page"], 3);
    assert_eq!(table["next_page_url"], "/api/user/datatable?page=3&limit=5");
    assert_eq!(table["prev_page_url"], "/api/user/datatable?page=1&limit=5");
    assert_eq!(table["last_page_url"], "/api/user/datatable?page=3&limit=5");
    let rows = table["data"].as_array().unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0]["full_name"], "Customer 05");
    assert!(rows.iter().all(|r| r.get("password").is_none()));
}

#[tokio::test]
async fn last_page_is_partial() {
    let app = thirteen_users().await;

    let res = app
        .get(&format!("{}?page=3&limit=5", routes::USER_DATATABLE))
        .await;
    let table = &res.body["data"];
    assert_eq!(table["from"], 11);
    assert_eq!(table["to"], 13);
    assert_eq!(table["next_page_url"], "");
    assert_eq!(table["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn malformed_paging_falls_back_to_defaults() {
    let app = thirteen_users().await;

    let res = app
        .get(&format!("{}?page=zero&limit=-4", routes::USER_DATATABLE))
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let table = &res.body["data"];
    assert_eq!(table["current_page"], 1);
    assert_eq!(table["data"].as_array().unwrap().len(), 10);
    assert_eq!(table["last_page"], 2);
}

#[tokio::test]
async fn sorting_descending_by_name() {
    let app = thirteen_users().await;

    let res = app
        .get(&format!(
            "{}?sort_by=full_name&sort=desc&limit=3",
            routes::USER_DATATABLE
        ))
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let names: Vec<&str> = res.body["data"]["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["full_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Customer 12", "Customer 11", "Customer 10"]);
}

#[tokio::test]
async fn unknown_sort_column_is_rejected() {
    let app = thirteen_users().await;

    let res = app
        .get(&format!("{}?sort_by=password", routes::USER_DATATABLE))
        .await;
    assert_eq!(res.status, 400);
    assert!(
        res.body["message"]
            .as_str()
            .unwrap()
            .starts_with("sort_by must be one of:")
    );
}

#[tokio::test]
async fn search_matches_any_searchable_column() {
    let app = thirteen_users().await;

    let res = app
        .get(&format!("{}?search=customer1", routes::USER_DATATABLE))
        .await;
    let table = &res.body["data"];
    assert_eq!(table["total"], 3);

    let res = app
        .get(&format!("{}?search=%25", routes::USER_DATATABLE))
        .await;
    assert_eq!(res.body["data"]["total"], 0);
}

#[tokio::test]
async fn next_link_keeps_the_search() {
    let app = thirteen_users().await;

    let res = app
        .get(&format!("{}?search=customer0&limit=5", routes::USER_DATATABLE))
        .await;
    let table = &res.body["data"];
    assert_eq!(table["total"], 9);
    let next = table["next_page_url"].as_str().unwrap().to_string();
    assert_eq!(next, "/api/user/datatable?search=customer0&page=2&limit=5");

    let res = app.get(&next).await;
    assert_eq!(res.status, 200, "{}", res.text);
    let table = &res.body["data"];
    assert_eq!(table["total"], 9);
    assert_eq!(table["from"], 6);
    assert_eq!(table["data"].as_array().unwrap().len(), 4);
    assert_eq!(table["next_page_url"], "");
}

#[tokio::test]
async fn enormous_page_number_is_an_empty_page() {
    let app = thirteen_users().await;

    let res = app
        .get(&format!(
            "{}?page=9223372036854775807&limit=100",
            routes::USER_DATATABLE
        ))
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let table = &res.body["data"];
    assert_eq!(table["total"], 13);
    assert_eq!(table["data"].as_array().unwrap().len(), 0);
    assert_eq!(table["next_page_url"], "");
}
