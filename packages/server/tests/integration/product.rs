use matahari_server::entity::{contract_product, file, gallery, product};
use reqwest::multipart::Form;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use crate::common::{TestApp, file_part, routes};

mod create {
    use super::*;

    #[tokio::test]
    async fn product_with_cover_and_gallery() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let category_id = app.create_category(&token, "Lighting").await;

        let form = Form::new()
            .text("title", "LED Panel")
            .text("description", "Slim panel")
            .text("specification", "12W")
            .text("category_id", category_id.to_string())
            .part("file", file_part("panel.png", b"cover"))
            .part("gallery[]", file_part("a.jpg", b"first"))
            .part("gallery[]", file_part("b.jpg", b"second"));
        let res = app.post_form(routes::PRODUCT, form, &token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "Product saved successfully");

        let id = app.latest::<product::Entity>(product::Column::Id).await.id;
        let res = app.get(&routes::product(id)).await;
        assert_eq!(res.status, 200);
        let data = &res.body["data"];
        assert_eq!(data["title"], "LED Panel");
        assert_eq!(data["category"], "Lighting");
        let path = data["path_file"].as_str().unwrap().to_string();
        assert!(path.starts_with("/public/"));
        assert!(path.ends_with(".png"));
        assert_eq!(app.fetch_public(&path).await.as_deref(), Some(&b"cover"[..]));

        let res = app.get(&routes::gallery(id)).await;
        assert_eq!(res.status, 200);
        let images = res.body["data"].as_array().unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0]["gallery_name"], "a.jpg");
        assert_eq!(images[1]["size"], 6);
    }

    #[tokio::test]
    async fn name_is_accepted_as_title() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let category_id = app.create_category(&token, "Lighting").await;

        let form = Form::new()
            .text("name", "Flood Light")
            .text("category_id", category_id.to_string())
            .part("file", file_part("flood.png", b"x"));
        let res = app.post_form(routes::PRODUCT, form, &token).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app.get("/api/product/all").await;
        assert_eq!(res.body["data"][0]["title"], "Flood Light");
    }

    #[tokio::test]
    async fn missing_file_and_title_are_field_errors() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let form = Form::new().text("category_id", "1");
        let res = app.post_form(routes::PRODUCT, form, &token).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["error"]["file"][0], "The file field is required");
        assert_eq!(res.body["error"]["title"][0], "The title field is required");
        assert_eq!(file::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_category_stores_nothing() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let form = Form::new()
            .text("title", "Orphan")
            .text("category_id", "999")
            .part("file", file_part("x.png", b"x"));
        let res = app.post_form(routes::PRODUCT, form, &token).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["message"], "Category not found");
        assert_eq!(product::Entity::find().count(&app.db).await.unwrap(), 0);
        assert_eq!(file::Entity::find().count(&app.db).await.unwrap(), 0);
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn new_cover_replaces_the_old_one() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let category_id = app.create_category(&token, "Lighting").await;
        let id = app.create_product(&token, "LED Panel", category_id, 0).await;

        let old_path = app.get(&routes::product(id)).await.body["data"]["path_file"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(app.blob_on_disk(&old_path));

        let form = Form::new()
            .text("title", "LED Panel v2")
            .part("file", file_part("v2.webp", b"new-cover"));
        let res = app.put_form(&routes::product(id), form, &token).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let data = app.get(&routes::product(id)).await.body["data"].clone();
        assert_eq!(data["title"], "LED Panel v2");
        assert_eq!(data["description"], "Energy efficient");
        let new_path = data["path_file"].as_str().unwrap();
        assert_ne!(new_path, old_path);
        assert!(new_path.ends_with(".webp"));
        assert!(app.blob_on_disk(new_path));
        assert!(!app.blob_on_disk(&old_path));
        assert!(app.fetch_public(&old_path).await.is_none());
        assert_eq!(file::Entity::find().count(&app.db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let form = Form::new().text("title", "Ghost");
        let res = app.put_form(&routes::product(42), form, &token).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["message"], "Product not found");
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn removes_gallery_links_and_blobs() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let category_id = app.create_category(&token, "Lighting").await;
        let id = app.create_product(&token, "LED Panel", category_id, 2).await;
        let cover = app.get(&routes::product(id)).await.body["data"]["path_file"]
            .as_str()
            .unwrap()
            .to_string();
        let images: Vec<String> = gallery::Entity::find()
            .all(&app.db)
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.path)
            .collect();
        assert_eq!(images.len(), 2);

        let res = app.delete(&format!("{}?id={id}", routes::PRODUCT), &token).await;
        assert_eq!(res.status, 200, "{}", res.text);

        assert_eq!(app.get(&routes::product(id)).await.status, 404);
        assert!(!app.blob_on_disk(&cover));
        for path in &images {
            assert!(!app.blob_on_disk(path));
        }
        assert_eq!(file::Entity::find().count(&app.db).await.unwrap(), 0);
        assert_eq!(gallery::Entity::find().count(&app.db).await.unwrap(), 0);
        assert_eq!(
            contract_product::Entity::find()
                .filter(contract_product::Column::ProductId.eq(id))
                .count(&app.db)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn missing_or_malformed_id_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app.delete(routes::PRODUCT, &token).await;
        assert_eq!(res.status, 400);
        let res = app.delete(&format!("{}?id=abc", routes::PRODUCT), &token).await;
        assert_eq!(res.status, 400);
        let res = app.delete(&format!("{}?id=7", routes::PRODUCT), &token).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn gallery_item_can_be_removed_alone() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let category_id = app.create_category(&token, "Lighting").await;
        let id = app.create_product(&token, "LED Panel", category_id, 2).await;

        let first = app.get(&routes::gallery(id)).await.body["data"][0].clone();
        let gallery_id = first["gallery_id"].as_i64().unwrap();
        let res = app
            .delete(&format!("/api/gallery/item/{gallery_id}"), &token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert!(!app.blob_on_disk(first["path"].as_str().unwrap()));

        let remaining = app.get(&routes::gallery(id)).await;
        assert_eq!(remaining.body["data"].as_array().unwrap().len(), 1);
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn datatable_filters_by_category_and_renames_title() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let lighting = app.create_category(&token, "Lighting").await;
        let solar = app.create_category(&token, "Solar").await;
        app.create_product(&token, "LED Panel", lighting, 0).await;
        app.create_product(&token, "Solar Cell", solar, 0).await;
        app.create_product(&token, "LED Strip", lighting, 0).await;

        let res = app
            .get(&format!(
                "{}?category_id={lighting}&sort_by=title&sort=desc",
                routes::PRODUCT_DATATABLE
            ))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let table = &res.body["data"];
        assert_eq!(table["total"], 2);
        assert_eq!(table["data"][0]["name"], "LED Strip");
        assert_eq!(table["data"][1]["name"], "LED Panel");
        assert_eq!(table["data"][0]["category"], "Lighting");

        let res = app
            .get(&format!("{}?category_id=abc", routes::PRODUCT_DATATABLE))
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn page_links_keep_the_category_filter() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let lighting = app.create_category(&token, "Lighting").await;
        let solar = app.create_category(&token, "Solar").await;
        app.create_product(&token, "LED Panel", lighting, 0).await;
        app.create_product(&token, "Solar Cell", solar, 0).await;
        app.create_product(&token, "LED Strip", lighting, 0).await;

        let res = app
            .get(&format!(
                "{}?category_id={lighting}&limit=1",
                routes::PRODUCT_DATATABLE
            ))
            .await;
        let next = res.body["data"]["next_page_url"].as_str().unwrap().to_string();
        assert_eq!(
            next,
            format!("{}?category_id={lighting}&page=2&limit=1", routes::PRODUCT_DATATABLE)
        );

        let res = app.get(&next).await;
        assert_eq!(res.status, 200, "{}", res.text);
        let table = &res.body["data"];
        assert_eq!(table["total"], 2);
        assert_eq!(table["last_page"], 2);
        assert_eq!(table["data"][0]["category"], "Lighting");
        assert_eq!(table["next_page_url"], "");
    }

    #[tokio::test]
    async fn labels_are_value_label_pairs() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let category_id = app.create_category(&token, "Lighting").await;
        let id = app.create_product(&token, "LED Panel", category_id, 0).await;

        let res = app.get("/api/product/label").await;
        assert_eq!(res.body["data"], json!([{"value": id, "label": "LED Panel"}]));
        assert_eq!(app.get("/api/product/count").await.body["data"], 1);
    }
}
