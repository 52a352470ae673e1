//! Integration tests for the GLV backend.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::auth::issue_token;
use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::{create_router, AppState};

const SECRET: &str = "integration-test-secret";

async fn test_state(temp_dir: &TempDir) -> AppState {
    let db_path = temp_dir.path().join("test.sqlite");
    let pool = init_database(&db_path).await.expect("Failed to init DB");

    let config = Config {
        jwt_secret: SECRET.to_string(),
        db_path,
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        log_level: "warn".to_string(),
        token_ttl: Duration::from_secs(3600),
    };

    AppState {
        repo: Arc::new(Repository::new(pool)),
        config: Arc::new(config),
    }
}

fn token(user: &str, admin: bool) -> String {
    issue_token(SECRET, user, admin, Duration::from_secs(3600)).unwrap()
}

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    admin_token: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let app = create_router(test_state(&temp_dir).await);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            admin_token: token("admin-1", true),
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn as_admin(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.admin_token)
    }

    fn as_user(&self, request: RequestBuilder, user: &str) -> RequestBuilder {
        request.bearer_auth(token(user, false))
    }

    async fn create_game(&self, body: Value) -> reqwest::Response {
        self.as_admin(self.client.post(self.url("/api/games")))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn create_post(&self, user: &str, body: Value) -> Value {
        let resp = self
            .as_user(self.client.post(self.url("/api/posts")), user)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        resp.json().await.unwrap()
    }

    async fn list_games(&self) -> Vec<Value> {
        let body: Value = self
            .client
            .get(self.url("/api/games"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        body["data"].as_array().unwrap().clone()
    }
}

fn ps4_version(code: &str) -> Value {
    json!({
        "platform": "PS4",
        "code": code,
        "voiceLanguages": ["English"],
        "subtitlesLanguages": ["English"]
    })
}

fn beta_post(code: &str) -> Value {
    json!({
        "gameName": "Beta",
        "platform": "PS5",
        "code": code,
        "voiceLanguages": ["English"],
        "subtitlesLanguages": ["English", "French (France)"]
    })
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_reads_are_public() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/games"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], json!([]));
    assert!(body["revisionId"].is_number());
    assert!(body.get("warnings").is_none());
}

#[tokio::test]
async fn test_mutations_require_token() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/posts"))
        .json(&beta_post("PPSA_00001"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let resp = fixture
        .client
        .post(fixture.url("/api/posts"))
        .bearer_auth("not-a-token")
        .json(&beta_post("PPSA_00001"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_legacy_token_header_accepted() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/posts"))
        .header("x-auth-token", token("u1", false))
        .json(&beta_post("PPSA_00001"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_admin_routes_forbid_regular_users() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .as_user(fixture.client.post(fixture.url("/api/games")), "u1")
        .json(&json!({ "name": "Alpha", "versions": [ps4_version("CUSA_00001")] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    assert!(fixture.list_games().await.is_empty());
}

#[tokio::test]
async fn test_create_game_normalizes_fields() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .create_game(json!({
            "name": "  Alpha ",
            "versions": [{
                "platform": "ps5",
                "code": "abcd 12345",
                "voiceLanguages": ["German", "English", "German"],
                "subtitlesLanguages": ["English"]
            }]
        }))
        .await;
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    let game = &body["data"];
    assert_eq!(game["name"], "Alpha");
    let version = &game["versions"][0];
    assert_eq!(version["platform"], "PS5");
    assert_eq!(version["code"], "ABCD_12345");
    assert_eq!(version["voiceLanguages"], json!(["English", "German"]));
    assert_eq!(version["isOfficial"], true);
    assert_eq!(version["createdBy"], "admin-1");
}

#[tokio::test]
async fn test_create_game_drops_duplicate_codes_with_warning() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .create_game(json!({
            "name": "Alpha",
            "versions": [ps4_version("CUSA_00001"), ps4_version("cusa 00001")]
        }))
        .await;
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["versions"].as_array().unwrap().len(), 1);
    assert_eq!(
        body["warnings"],
        json!(["Duplicated version CUSA_00001 was removed"])
    );
}

#[tokio::test]
async fn test_validation_lists_every_field() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .create_game(json!({
            "name": "A",
            "versions": [{
                "platform": "N64",
                "code": "123",
                "voiceLanguages": [],
                "subtitlesLanguages": ["Klingon"]
            }]
        }))
        .await;
    assert_eq!(resp.status(), 400);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    let fields: Vec<&str> = body["error"]["details"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(
        fields,
        vec![
            "name",
            "versions[0].platform",
            "versions[0].code",
            "versions[0].voiceLanguages",
            "versions[0].subtitlesLanguages[0]",
        ]
    );
}

#[tokio::test]
async fn test_malformed_bodies_get_error_envelope() {
    let fixture = TestFixture::new().await;

    // Languages sent as a bare string instead of a list
    let mut post = beta_post("CUSA-00001");
    post["voiceLanguages"] = json!("English");
    let resp = fixture
        .as_user(fixture.client.post(fixture.url("/api/posts")), "user-1")
        .json(&post)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert!(resp.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/json"));

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"]["fields"][0]["field"], "voiceLanguages");
    assert!(body["revisionId"].is_i64());

    // Not JSON at all
    let resp = fixture
        .as_admin(fixture.client.post(fixture.url("/api/games")))
        .header("content-type", "application/json")
        .body("{\"name\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    // JSON without the content type
    let resp = fixture
        .as_user(fixture.client.put(fixture.url("/api/me/favorites")), "user-1")
        .body(r#"{"gameID":"g","versionID":"v"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    // Nothing was written
    assert!(fixture.list_games().await.is_empty());
}

#[tokio::test]
async fn test_upsert_merges_and_rejects_duplicate_codes() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .create_game(json!({ "name": "Alpha", "versions": [ps4_version("ABCD_12345")] }))
        .await;
    assert_eq!(resp.status(), 200);

    // Same code again: conflict naming the field.
    let resp = fixture
        .as_user(fixture.client.post(fixture.url("/api/games/upsert")), "u1")
        .json(&json!({ "name": "Alpha", "version": ps4_version("abcd_12345") }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "CONFLICT");
    assert_eq!(body["error"]["details"]["field"], "code");

    // Different case, new code: merges into the existing game.
    let resp = fixture
        .as_user(fixture.client.post(fixture.url("/api/games/upsert")), "u1")
        .json(&json!({ "name": "alpha", "version": ps4_version("ABCD_54321") }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["name"], "Alpha");
    assert_eq!(body["data"]["versions"][1]["isOfficial"], false);

    let games = fixture.list_games().await;
    assert_eq!(games.len(), 1);
    assert_eq!(games[0]["versions"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_find_game_by_name_ignores_case() {
    let fixture = TestFixture::new().await;
    fixture
        .create_game(json!({ "name": "Gran Turismo", "versions": [ps4_version("CUSA_00001")] }))
        .await;

    let resp = fixture
        .client
        .get(fixture.url("/api/games/by-name"))
        .query(&[("name", "gran turismo")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["name"], "Gran Turismo");

    let resp = fixture
        .client
        .get(fixture.url("/api/games/by-name"))
        .query(&[("name", "Unknown")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_removing_only_version_deletes_game() {
    let fixture = TestFixture::new().await;
    let body: Value = fixture
        .create_game(json!({ "name": "Alpha", "versions": [ps4_version("CUSA_00001")] }))
        .await
        .json()
        .await
        .unwrap();
    let game_id = body["data"]["id"].as_str().unwrap().to_string();
    let version_id = body["data"]["versions"][0]["id"].as_str().unwrap().to_string();

    let resp = fixture
        .as_admin(fixture.client.delete(fixture.url(&format!(
            "/api/games/{}/versions/{}",
            game_id, version_id
        ))))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "gameDeleted");
    assert_eq!(body["data"]["gameId"], game_id);

    assert!(fixture.list_games().await.is_empty());

    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/games/{}", game_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_post_edit_is_limited_to_author_and_admin() {
    let fixture = TestFixture::new().await;
    let body = fixture.create_post("author", beta_post("PPSA_00001")).await;
    let post_id = body["data"]["id"].as_str().unwrap().to_string();
    let post_url = fixture.url(&format!("/api/posts/{}", post_id));

    let resp = fixture
        .as_user(fixture.client.put(&post_url), "stranger")
        .json(&beta_post("PPSA_00002"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = fixture
        .as_user(fixture.client.put(&post_url), "author")
        .json(&beta_post("PPSA_00002"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["code"], "PPSA_00002");

    let resp = fixture
        .as_user(fixture.client.delete(&post_url), "stranger")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = fixture
        .as_admin(fixture.client.delete(&post_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture.client.get(&post_url).send().await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_reaction_toggle_over_http() {
    let fixture = TestFixture::new().await;
    let body = fixture.create_post("author", beta_post("PPSA_00001")).await;
    let post_id = body["data"]["id"].as_str().unwrap().to_string();
    let url = fixture.url(&format!("/api/posts/{}/reactions", post_id));

    let like = |user: &'static str| {
        fixture
            .as_user(fixture.client.post(&url), user)
            .json(&json!({ "reactionType": "like" }))
    };

    let body: Value = like("u1").send().await.unwrap().json().await.unwrap();
    assert_eq!(body["data"]["likes"], 1);
    assert_eq!(body["data"]["userReaction"], "like");

    let body: Value = like("u1").send().await.unwrap().json().await.unwrap();
    assert_eq!(body["data"]["likes"], 0);
    assert_eq!(body["data"]["userReaction"], Value::Null);

    like("u2").send().await.unwrap();
    let resp = fixture
        .as_user(fixture.client.post(&url), "u1")
        .json(&json!({ "reactionType": "dislike" }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["likes"], 1);
    assert_eq!(body["data"]["dislikes"], 1);
    assert_eq!(body["data"]["userReaction"], "dislike");

    // Anonymous read has counts but no personal reaction.
    let body: Value = fixture
        .client
        .get(&url)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["likes"], 1);
    assert_eq!(body["data"]["userReaction"], Value::Null);

    let body: Value = fixture
        .client
        .get(format!("{}/stats", url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let resp = fixture
        .as_user(fixture.client.post(&url), "u1")
        .json(&json!({ "reactionType": "love" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_release_post_into_catalog() {
    let fixture = TestFixture::new().await;
    let body = fixture.create_post("author", beta_post("ppsa 00009")).await;
    let post_id = body["data"]["id"].as_str().unwrap().to_string();
    let release_url = fixture.url(&format!("/api/posts/{}/release", post_id));

    let resp = fixture
        .as_user(fixture.client.post(&release_url), "author")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = fixture
        .as_admin(fixture.client.post(&release_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["postId"], post_id);
    assert_eq!(body["data"]["game"]["name"], "Beta");
    assert_eq!(body["data"]["game"]["versions"][0]["code"], "PPSA_00009");

    let posts: Value = fixture
        .client
        .get(fixture.url("/api/posts"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(posts["data"], json!([]));

    let games = fixture.list_games().await;
    assert_eq!(games.len(), 1);
    assert_eq!(games[0]["name"], "Beta");

    let resp = fixture
        .as_admin(fixture.client.post(&release_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_favorites_are_per_user_toggles() {
    let fixture = TestFixture::new().await;
    let url = fixture.url("/api/me/favorites");
    let pair = json!({ "gameID": "g1", "versionID": "v1" });

    let resp = fixture.client.get(&url).send().await.unwrap();
    assert_eq!(resp.status(), 401);

    let body: Value = fixture
        .as_user(fixture.client.put(&url), "u1")
        .json(&pair)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["favorited"], true);

    let body: Value = fixture
        .as_user(fixture.client.get(&url), "u1")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"][0]["gameID"], "g1");

    let body: Value = fixture
        .as_user(fixture.client.get(&url), "u2")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"], json!([]));

    let body: Value = fixture
        .as_user(fixture.client.put(&url), "u1")
        .json(&pair)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["favorited"], false);

    // Removing something absent is not an error.
    let resp = fixture
        .as_user(fixture.client.delete(format!("{}/g1/v1", url)), "u1")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_revision_advances_on_writes() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_router(test_state(&temp_dir).await);

    let revision = |app: axum::Router| async move {
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/catalog/revision")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        body["data"]["revisionId"].as_i64().unwrap()
    };

    let before = revision(app.clone()).await;

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/games")
                .header("authorization", format!("Bearer {}", token("admin-1", true)))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "name": "Alpha", "versions": [ps4_version("CUSA_00001")] })
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    assert_eq!(revision(app).await, before + 1);
}
