// tests/api_tests.rs

use engagement::{
    config::{Config, EngineSettings},
    db, routes,
    state::AppState,
    utils::jwt::sign_jwt,
};
use sqlx::SqlitePool;

const SECRET: &str = "test_secret_for_integration_tests";

struct TestApp {
    address: String,
    pool: SqlitePool,
    client: reqwest::Client,
}

/// Helper function to spawn the app on a random port for testing.
async fn spawn_app() -> TestApp {
    // 1. Create an isolated in-memory database with migrations applied
    let pool = db::connect_in_memory()
        .await
        .expect("Failed to create in-memory database");

    // 2. Create test configuration and state
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: SECRET.to_string(),
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        engine: EngineSettings::default(),
    };

    let state = AppState::new(pool.clone(), config);

    // 3. Create the router with the app state
    let app = routes::create_router(state);

    // 4. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // 5. Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        pool,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    /// Inserts a user and returns (id, bearer header value).
    async fn user(&self) -> (i64, String) {
        let name = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);
        let id: i64 = sqlx::query_scalar("INSERT INTO users (username) VALUES ($1) RETURNING id")
            .bind(&name)
            .fetch_one(&self.pool)
            .await
            .unwrap();
        let token = sign_jwt(id, SECRET, 600).unwrap();
        (id, format!("Bearer {}", token))
    }

    async fn post(&self, owner: i64) -> i64 {
        sqlx::query_scalar("INSERT INTO posts (user_id, title) VALUES ($1, 'Hello') RETURNING id")
            .bind(owner)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    async fn comment(
        &self,
        auth: &str,
        post_id: i64,
        body: serde_json::Value,
    ) -> reqwest::Response {
        self.client
            .post(format!("{}/api/posts/{}/comments", self.address, post_id))
            .header("Authorization", auth)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    async fn stats(&self, post_id: i64) -> serde_json::Value {
        self.client
            .get(format!("{}/api/posts/{}/stats", self.address, post_id))
            .send()
            .await
            .expect("Failed to execute request")
            .json()
            .await
            .expect("Failed to parse stats json")
    }
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app
        .client
        .get(format!("{}/random_path_that_does_not_exist", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn health_reports_ok() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn comment_thread_flow() {
    // Arrange
    let app = spawn_app().await;
    let (owner, owner_auth) = app.user().await;
    let (_, alice_auth) = app.user().await;
    let post = app.post(owner).await;

    // 1. Root comment
    let response = app
        .comment(&alice_auth, post, serde_json::json!({ "content": "first!" }))
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let root = response.json::<serde_json::Value>().await.unwrap()["id"]
        .as_i64()
        .expect("id not found");

    // 2. Reply
    let response = app
        .comment(
            &owner_auth,
            post,
            serde_json::json!({ "content": "thanks", "reply_id": root }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);

    // 3. Anonymous listing of the root's children
    let listing: serde_json::Value = app
        .client
        .get(format!(
            "{}/api/posts/{}/comments?parent_id={}",
            app.address, post, root
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing["total"], 1);
    assert_eq!(listing["items"][0]["depth"], 1);
    assert_eq!(listing["items"][0]["root_id"], root);

    let stats = app.stats(post).await;
    assert_eq!(stats["comment_count"], 2);

    // 4. Delete the root: the reply goes with it
    let response = app
        .client
        .delete(format!("{}/api/comments/{}", app.address, root))
        .header("Authorization", &alice_auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let stats = app.stats(post).await;
    assert_eq!(stats["comment_count"], 0);
    assert_eq!(stats["heat"], 0);
}

#[tokio::test]
async fn writes_require_identity() {
    let app = spawn_app().await;
    let (owner, _) = app.user().await;
    let post = app.post(owner).await;

    let anonymous = app
        .client
        .post(format!("{}/api/posts/{}/comments", app.address, post))
        .json(&serde_json::json!({ "content": "hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status().as_u16(), 401);

    let forged = app.comment("Bearer not-a-token", post, serde_json::json!({ "content": "hi" })).await;
    assert_eq!(forged.status().as_u16(), 401);

    let like = app
        .client
        .post(format!("{}/api/likes/post/{}", app.address, post))
        .send()
        .await
        .unwrap();
    assert_eq!(like.status().as_u16(), 401);
}

#[tokio::test]
async fn bad_requests_are_rejected() {
    let app = spawn_app().await;
    let (owner, auth) = app.user().await;
    let post = app.post(owner).await;

    let empty = app.comment(&auth, post, serde_json::json!({ "content": "" })).await;
    assert_eq!(empty.status().as_u16(), 400);

    let bad_order = app
        .client
        .get(format!(
            "{}/api/posts/{}/comments?order_by=content",
            app.address, post
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_order.status().as_u16(), 400);

    let bad_kind = app
        .client
        .post(format!("{}/api/likes/page/{}", app.address, post))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(bad_kind.status().as_u16(), 400);

    let missing_post = app
        .comment(&auth, 9999, serde_json::json!({ "content": "hello?" }))
        .await;
    assert_eq!(missing_post.status().as_u16(), 400);

    let missing_parent = app
        .comment(&auth, post, serde_json::json!({ "content": "hello?", "reply_id": 9999 }))
        .await;
    assert_eq!(missing_parent.status().as_u16(), 404);
}

#[tokio::test]
async fn strangers_cannot_edit_or_delete() {
    let app = spawn_app().await;
    let (owner, owner_auth) = app.user().await;
    let (_, alice_auth) = app.user().await;
    let post = app.post(owner).await;

    let id = app
        .comment(&alice_auth, post, serde_json::json!({ "content": "mine" }))
        .await
        .json::<serde_json::Value>()
        .await
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    let edit = app
        .client
        .put(format!("{}/api/comments/{}", app.address, id))
        .header("Authorization", &owner_auth)
        .json(&serde_json::json!({
            "content": "edited", "is_private": false, "show_client_info": true
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(edit.status().as_u16(), 403);

    let delete = app
        .client
        .delete(format!("{}/api/comments/{}", app.address, id))
        .header("Authorization", &owner_auth)
        .send()
        .await
        .unwrap();
    assert_eq!(delete.status().as_u16(), 403);

    let own_edit = app
        .client
        .put(format!("{}/api/comments/{}", app.address, id))
        .header("Authorization", &alice_auth)
        .json(&serde_json::json!({
            "content": "edited", "is_private": false, "show_client_info": true
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(own_edit.status().as_u16(), 204);

    let missing = app
        .client
        .delete(format!("{}/api/comments/{}", app.address, 424242))
        .header("Authorization", &alice_auth)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn private_comment_is_hidden_from_strangers() {
    let app = spawn_app().await;
    let (owner, owner_auth) = app.user().await;
    let (_, alice_auth) = app.user().await;
    let (_, bob_auth) = app.user().await;
    let post = app.post(owner).await;

    let id = app
        .comment(
            &alice_auth,
            post,
            serde_json::json!({ "content": "psst", "is_private": true }),
        )
        .await
        .json::<serde_json::Value>()
        .await
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    let url = format!("{}/api/comments/{}", app.address, id);
    let anonymous = app.client.get(&url).send().await.unwrap();
    assert_eq!(anonymous.status().as_u16(), 404);

    let bob = app
        .client
        .get(&url)
        .header("Authorization", &bob_auth)
        .send()
        .await
        .unwrap();
    assert_eq!(bob.status().as_u16(), 404);

    for auth in [&owner_auth, &alice_auth] {
        let response = app
            .client
            .get(&url)
            .header("Authorization", auth)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["is_private"], true);
    }
}

#[tokio::test]
async fn deep_reply_is_rejected() {
    let app = spawn_app().await;
    let (owner, auth) = app.user().await;
    let post = app.post(owner).await;
    let max_depth = EngineSettings::default().max_reply_depth;

    let mut parent: Option<i64> = None;
    for _ in 0..=max_depth {
        let response = app
            .comment(
                &auth,
                post,
                serde_json::json!({ "content": "down we go", "reply_id": parent }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);
        parent = response.json::<serde_json::Value>().await.unwrap()["id"].as_i64();
    }

    let response = app
        .comment(
            &auth,
            post,
            serde_json::json!({ "content": "one too many", "reply_id": parent }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);

    let stats = app.stats(post).await;
    assert_eq!(stats["comment_count"], max_depth + 1);
}

#[tokio::test]
async fn like_toggle_flow() {
    let app = spawn_app().await;
    let (owner, _) = app.user().await;
    let (fan, fan_auth) = app.user().await;
    let post = app.post(owner).await;
    let url = format!("{}/api/likes/post/{}", app.address, post);

    let first: serde_json::Value = app
        .client
        .post(&url)
        .header("Authorization", &fan_auth)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["liked"], true);
    assert_eq!(app.stats(post).await["like_count"], 1);

    let status: serde_json::Value = app
        .client
        .get(&url)
        .header("Authorization", &fan_auth)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["liked"], true);

    let users: Vec<serde_json::Value> = app
        .client
        .get(format!("{}/users?limit=5", url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["id"], fan);

    let second: serde_json::Value = app
        .client
        .post(&url)
        .header("Authorization", &fan_auth)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["liked"], false);
    let stats = app.stats(post).await;
    assert_eq!(stats["like_count"], 0);
    assert_eq!(stats["heat"], 0);
}

#[tokio::test]
async fn views_are_counted() {
    let app = spawn_app().await;
    let (owner, _) = app.user().await;
    let post = app.post(owner).await;

    let response = app
        .client
        .post(format!("{}/api/posts/{}/views", app.address, post))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let counters: serde_json::Value = response.json().await.unwrap();
    assert_eq!(counters["view_count"], 1);
    assert_eq!(counters["heat"], 1);
}
