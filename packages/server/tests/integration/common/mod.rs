use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, Set};
use serde_json::Value;
use tempfile::TempDir;

use matahari_server::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ServerConfig, StorageConfig,
};
use matahari_server::entity::user::{self, Role};
use matahari_server::entity::{category, product};
use matahari_server::state::AppState;
use matahari_server::utils::hash;

pub const PASSWORD: &str = "password123";

pub mod routes {
    pub const LOGIN: &str = "/api/auth/login";
    pub const REGISTER: &str = "/api/auth/register";
    pub const PROFILE: &str = "/api/auth/profile";
    pub const DASHBOARD: &str = "/api/dashboard";
    pub const USER: &str = "/api/user";
    pub const USER_DATATABLE: &str = "/api/user/datatable";
    pub const PRODUCT: &str = "/api/product";
    pub const PRODUCT_DATATABLE: &str = "/api/product/datatable";
    pub const CATEGORY: &str = "/api/category";
    pub const TAG: &str = "/api/tag";
    pub const CONTRACT: &str = "/api/contract";
    pub const HISTORY: &str = "/api/history";
    pub const VIDEO_ALL: &str = "/api/video/all";

    pub fn product(id: i32) -> String {
        format!("/api/product/{id}")
    }

    pub fn category(id: i32) -> String {
        format!("/api/category/{id}")
    }

    pub fn contract(id: i32) -> String {
        format!("/api/contract/{id}")
    }

    pub fn history(id: i32) -> String {
        format!("/api/history/{id}")
    }

    pub fn gallery(product_id: i32) -> String {
        format!("/api/gallery/{product_id}")
    }
}

/// A running test server backed by a throwaway SQLite file and public directory.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub public_dir: PathBuf,
    _dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

/// One file part for a multipart form.
pub fn file_part(name: &str, bytes: &[u8]) -> Part {
    Part::bytes(bytes.to_vec()).file_name(name.to_string())
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let public_dir = dir.path().join("public");

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec!["*".to_string()],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display()),
                max_connections: 5,
                min_connections: 1,
                connect_timeout_secs: 10,
                sqlx_logging: false,
            },
            auth: AuthConfig {
                jwt_secret: "test-secret-for-integration-tests".to_string(),
                token_ttl_hours: 1,
                admin_email: None,
                admin_password: None,
                admin_name: None,
            },
            storage: StorageConfig {
                public_dir: public_dir.display().to_string(),
                url_prefix: "/public".to_string(),
                max_upload_size: 1024 * 1024,
                max_gallery_files: 5,
            },
        };

        let db = matahari_server::database::init_db(&config.database)
            .await
            .expect("Failed to initialize test database");
        let files = matahari_server::build_file_store(&config)
            .await
            .expect("Failed to open public directory");

        let state = AppState {
            db: db.clone(),
            config: Arc::new(config),
            files,
        };
        let app = matahari_server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            public_dir,
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        build: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    ) -> TestResponse {
        let mut req = self.client.request(method.clone(), self.url(path));
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        let res = build(req)
            .send()
            .await
            .unwrap_or_else(|e| panic!("Failed to send {method} {path}: {e}"));
        TestResponse::from_response(res).await
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(Method::GET, path, None, |r| r).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        self.send(Method::GET, path, Some(token), |r| r).await
    }

    pub async fn post_json(&self, path: &str, body: &Value, token: Option<&str>) -> TestResponse {
        self.send(Method::POST, path, token, |r| r.json(body)).await
    }

    /// POST a raw body labelled as JSON, for malformed-payload tests.
    pub async fn send_raw_json(&self, path: &str, body: &'static str) -> TestResponse {
        self.send(Method::POST, path, None, |r| {
            r.header("Content-Type", "application/json").body(body)
        })
        .await
    }

    pub async fn put_json(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        self.send(Method::PUT, path, Some(token), |r| r.json(body)).await
    }

    pub async fn post_form(&self, path: &str, form: Form, token: &str) -> TestResponse {
        self.send(Method::POST, path, Some(token), |r| r.multipart(form))
            .await
    }

    pub async fn put_form(&self, path: &str, form: Form, token: &str) -> TestResponse {
        self.send(Method::PUT, path, Some(token), |r| r.multipart(form))
            .await
    }

    pub async fn delete(&self, path: &str, token: &str) -> TestResponse {
        self.send(Method::DELETE, path, Some(token), |r| r).await
    }

    /// Raw bytes served at a public path, or `None` on 404.
    pub async fn fetch_public(&self, path: &str) -> Option<Vec<u8>> {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to fetch public file");
        if res.status() == reqwest::StatusCode::NOT_FOUND {
            return None;
        }
        assert!(res.status().is_success(), "unexpected status {}", res.status());
        Some(res.bytes().await.unwrap().to_vec())
    }

    /// Whether the blob behind a `/public/...` path is on disk.
    pub fn blob_on_disk(&self, path: &str) -> bool {
        let name = path.strip_prefix("/public/").expect("not a public path");
        self.public_dir.join(name).is_file()
    }

    /// Insert a user straight into the database and return its id.
    pub async fn insert_user(&self, full_name: &str, email: &str, role: Role) -> i32 {
        let now = chrono::Utc::now();
        let model = user::ActiveModel {
            full_name: Set(full_name.to_string()),
            username: Set(email.split('@').next().unwrap().to_string()),
            phone_number: Set("0800000000".to_string()),
            email: Set(email.to_string()),
            password: Set(hash::hash_password(PASSWORD).unwrap()),
            address: Set(None),
            role: Set(role),
            file_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        user::Entity::insert(model)
            .exec(&self.db)
            .await
            .expect("Failed to insert user")
            .last_insert_id
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.post_json(
            routes::LOGIN,
            &serde_json::json!({"email": email, "password": password}),
            None,
        )
        .await
    }

    /// Create a user with `role` and return a token for it.
    pub async fn token_for(&self, email: &str, role: Role) -> String {
        self.insert_user(email, email, role).await;
        let res = self.login(email, PASSWORD).await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);
        res.body["data"]["access_token"]
            .as_str()
            .expect("Login response should contain an access token")
            .to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.token_for("admin@example.com", Role::Admin).await
    }

    /// Most recently inserted row of `E`, ordered by its `id` column.
    pub async fn latest<E: EntityTrait>(&self, id: E::Column) -> E::Model {
        E::find()
            .order_by_desc(id)
            .one(&self.db)
            .await
            .expect("DB query failed")
            .expect("no rows")
    }

    pub async fn create_category(&self, token: &str, name: &str) -> i32 {
        let res = self
            .post_json(
                routes::CATEGORY,
                &serde_json::json!({"category": name, "tag_ids": []}),
                Some(token),
            )
            .await;
        assert_eq!(res.status, 200, "create_category failed: {}", res.text);
        self.latest::<category::Entity>(category::Column::Id)
            .await
            .id
    }

    /// Create a product with a cover file and `gallery` images; returns its id.
    pub async fn create_product(
        &self,
        token: &str,
        title: &str,
        category_id: i32,
        gallery: usize,
    ) -> i32 {
        let mut form = Form::new()
            .text("title", title.to_string())
            .text("description", "Energy efficient")
            .text("specification", "12W")
            .text("category_id", category_id.to_string())
            .part("file", file_part("cover.png", b"cover-bytes"));
        for i in 0..gallery {
            form = form.part(
                "gallery[]",
                file_part(&format!("g{i}.jpg"), format!("gallery-{i}").as_bytes()),
            );
        }
        let res = self.post_form(routes::PRODUCT, form, token).await;
        assert_eq!(res.status, 200, "create_product failed: {}", res.text);
        self.latest::<product::Entity>(product::Column::Id)
            .await
            .id
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }
}
