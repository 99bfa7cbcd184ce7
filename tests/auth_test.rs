//! Integration tests for the auth flow: register, login, token issuance,
//! and the bearer-token guard on mutating endpoints.

use serde_json::json;
use tokio::net::TcpListener;

/// Helper: start the server on a random port and return the base URL.
/// The TempDir guard is returned so the data directory outlives the test.
async fn start_test_server() -> (String, tempfile::TempDir) {
    let tmp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let data_dir = tmp_dir.path().to_str().unwrap().to_string();

    let db = landing_server::db::init_db(&data_dir).expect("Failed to init DB");
    let jwt_secret = landing_server::auth::jwt::load_or_generate_jwt_secret(&data_dir)
        .expect("Failed to generate JWT secret");

    let state = landing_server::state::AppState {
        db,
        jwt_secret,
        data_dir,
    };
    let app = landing_server::routes::build_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), tmp_dir)
}

#[tokio::test]
async fn test_health_check() {
    let (base_url, _tmp) = start_test_server().await;

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("{}/health", base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_register_and_login_flow() {
    let (base_url, _tmp) = start_test_server().await;
    let client = reqwest::Client::new();

    // Register
    let register_resp = client
        .post(format!("{}/api/auth/register", base_url))
        .json(&json!({ "email": "admin@example.com", "password": "hunter2hunter2" }))
        .send()
        .await
        .unwrap();

    assert_eq!(register_resp.status(), 201, "Registration failed");
    let register_body: serde_json::Value = register_resp.json().await.unwrap();
    assert_eq!(register_body["email"].as_str().unwrap(), "admin@example.com");
    assert!(!register_body["userId"].as_str().unwrap().is_empty());

    // Login
    let login_resp = client
        .post(format!("{}/api/auth/login", base_url))
        .json(&json!({ "email": "admin@example.com", "password": "hunter2hunter2" }))
        .send()
        .await
        .unwrap();

    assert_eq!(login_resp.status(), 200, "Login failed");
    let login_body: serde_json::Value = login_resp.json().await.unwrap();
    assert_eq!(login_body["email"].as_str().unwrap(), "admin@example.com");
    let token = login_body["token"].as_str().unwrap().to_string();
    assert!(!token.is_empty());

    // The token authorizes a mutation
    let form = reqwest::multipart::Form::new()
        .text("slug", "welcome")
        .text("title", "Welcome");
    let create_resp = client
        .post(format!("{}/api/landing-pages", base_url))
        .header("Authorization", format!("Bearer {}", token))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(create_resp.status(), 201, "Authorized create failed");
}

#[tokio::test]
async fn test_register_requires_email_and_password() {
    let (base_url, _tmp) = start_test_server().await;
    let client = reqwest::Client::new();

    for body in [
        json!({ "email": "admin@example.com" }),
        json!({ "password": "hunter2hunter2" }),
        json!({ "email": "  ", "password": "hunter2hunter2" }),
        json!({}),
    ] {
        let resp = client
            .post(format!("{}/api/auth/register", base_url))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "Expected 400 for {}", body);
    }
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let (base_url, _tmp) = start_test_server().await;
    let client = reqwest::Client::new();

    let body = json!({ "email": "admin@example.com", "password": "hunter2hunter2" });
    let first = client
        .post(format!("{}/api/auth/register", base_url))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 201);

    let second = client
        .post(format!("{}/api/auth/register", base_url))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 409);
}

#[tokio::test]
async fn test_invalid_credentials_are_indistinguishable() {
    let (base_url, _tmp) = start_test_server().await;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/api/auth/register", base_url))
        .json(&json!({ "email": "admin@example.com", "password": "hunter2hunter2" }))
        .send()
        .await
        .unwrap();

    // Wrong password for a real account
    let wrong_password = client
        .post(format!("{}/api/auth/login", base_url))
        .json(&json!({ "email": "admin@example.com", "password": "not-the-password" }))
        .send()
        .await
        .unwrap();
    let wrong_password_status = wrong_password.status();
    let wrong_password_body = wrong_password.text().await.unwrap();

    // Account that does not exist
    let unknown_email = client
        .post(format!("{}/api/auth/login", base_url))
        .json(&json!({ "email": "nobody@example.com", "password": "hunter2hunter2" }))
        .send()
        .await
        .unwrap();
    let unknown_email_status = unknown_email.status();
    let unknown_email_body = unknown_email.text().await.unwrap();

    assert_eq!(wrong_password_status, 401);
    assert_eq!(unknown_email_status, 401);
    // Byte-identical bodies: the response must not leak which check failed.
    assert_eq!(wrong_password_body, unknown_email_body);
}

#[tokio::test]
async fn test_login_requires_email_and_password() {
    let (base_url, _tmp) = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/auth/login", base_url))
        .json(&json!({ "email": "admin@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_mutations_require_valid_token() {
    let (base_url, tmp) = start_test_server().await;
    let client = reqwest::Client::new();

    // No credential at all
    let no_token = client
        .post(format!("{}/api/landing-pages", base_url))
        .multipart(
            reqwest::multipart::Form::new()
                .text("slug", "s")
                .text("title", "t"),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(no_token.status(), 401);

    // Garbage credential
    let bad_token = client
        .delete(format!("{}/api/landing-pages/some-id", base_url))
        .header("Authorization", "Bearer not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(bad_token.status(), 403);

    // Expired credential, signed with the server's real key
    let secret = std::fs::read(tmp.path().join("jwt_secret")).unwrap();
    let now = chrono::Utc::now().timestamp();
    let expired_claims = landing_server::auth::middleware::Claims {
        sub: "some-user".to_string(),
        email: "admin@example.com".to_string(),
        iat: now - 7200,
        exp: now - 3600,
    };
    let expired_token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &expired_claims,
        &jsonwebtoken::EncodingKey::from_secret(&secret),
    )
    .unwrap();

    let expired = client
        .delete(format!("{}/api/landing-pages/some-id", base_url))
        .header("Authorization", format!("Bearer {}", expired_token))
        .send()
        .await
        .unwrap();
    assert_eq!(expired.status(), 403);

    // Reads stay public
    let list = client
        .get(format!("{}/api/landing-pages", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(list.status(), 200);
}
