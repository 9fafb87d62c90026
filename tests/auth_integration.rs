mod common;

use common::{spawn_app, spawn_app_with, token, PASSWORD};
use serde_json::{json, Value};

// --- Registration Tests ---

#[tokio::test]
async fn register_returns_201_without_password_digest() {
    let app = spawn_app();

    let response = app
        .post(
            "/register",
            &json!({ "name": "A", "email": "a@x.com", "password": "Passw0rd1" }),
        )
        .await;

    assert_eq!(201, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], true);

    let data = &body["data"];
    assert!(data["accessToken"].is_string());
    assert!(data["refreshToken"].is_string());
    assert_eq!(data["user"]["email"], "a@x.com");
    assert_eq!(data["user"]["role"], "user");

    let user = data["user"].as_object().unwrap();
    assert!(!user.contains_key("password"));
    assert!(!user.contains_key("passwordHash"));
    assert!(!user.contains_key("refreshTokens"));
}

#[tokio::test]
async fn registered_refresh_token_is_usable() {
    let app = spawn_app();
    let data = app.register("A", "a@x.com", None).await;

    let response = app
        .post("/refresh", &json!({ "refreshToken": token(&data, "refreshToken") }))
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert!(body["data"]["accessToken"].is_string());
}

#[tokio::test]
async fn register_returns_400_for_invalid_email() {
    let app = spawn_app();

    for invalid_email in ["notanemail", "user@", "@example.com", "user@@example.com"] {
        let response = app
            .post(
                "/register",
                &json!({ "name": "Test User", "email": invalid_email, "password": PASSWORD }),
            )
            .await;

        assert_eq!(400, response.status().as_u16(),
            "Should reject invalid email: {}", invalid_email);
    }
}

#[tokio::test]
async fn register_returns_400_for_weak_password() {
    let app = spawn_app();

    let long_password = "Aa1".repeat(50);
    let weak_passwords = vec![
        ("Sh0rt", "password too short"),
        ("nouppercase123", "no uppercase"),
        ("NOLOWERCASE123", "no lowercase"),
        ("NoDigitsHere", "no digits"),
        (long_password.as_str(), "password too long"),
    ];

    for (weak_password, reason) in weak_passwords {
        let response = app
            .post(
                "/register",
                &json!({ "name": "Test User", "email": "test@example.com", "password": weak_password }),
            )
            .await;

        assert_eq!(400, response.status().as_u16(),
            "Should reject weak password: {}", reason);
    }
}

#[tokio::test]
async fn register_lists_every_violation() {
    let app = spawn_app();

    let response = app
        .post("/register", &json!({ "email": "bad", "password": "abc" }))
        .await;

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    // name missing, email invalid, password too short / no uppercase / no digit
    assert_eq!(body["errors"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn register_returns_400_for_missing_fields() {
    let app = spawn_app();

    let test_cases = vec![
        (json!({"email": "test@example.com", "password": PASSWORD}), "missing name"),
        (json!({"name": "Test", "password": PASSWORD}), "missing email"),
        (json!({"name": "Test", "email": "test@example.com"}), "missing password"),
        (json!({}), "missing all fields"),
    ];

    for (body, reason) in test_cases {
        let response = app.post("/register", &body).await;
        assert_eq!(400, response.status().as_u16(),
            "Should reject request: {}", reason);
    }
}

#[tokio::test]
async fn register_returns_400_for_malformed_json() {
    let app = spawn_app();

    let response = app
        .client
        .post(app.url("/register"))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn register_returns_409_for_duplicate_email_in_any_case() {
    let app = spawn_app();
    app.register("John Doe", "john@example.com", None).await;

    let response = app
        .post(
            "/register",
            &json!({ "name": "John Again", "email": "JOHN@Example.com", "password": PASSWORD }),
        )
        .await;

    assert_eq!(409, response.status().as_u16(),
        "Should reject duplicate email with 409 Conflict");
}

#[tokio::test]
async fn concurrent_registrations_with_same_email_have_one_winner() {
    let app = spawn_app();
    let body = json!({ "name": "Racer", "email": "race@x.com", "password": PASSWORD });

    let (first, second) = tokio::join!(app.post("/register", &body), app.post("/register", &body));
    let mut statuses = vec![first.status().as_u16(), second.status().as_u16()];
    statuses.sort();

    assert_eq!(statuses, vec![201, 409]);
}

// --- Login Tests ---

#[tokio::test]
async fn login_returns_200_for_valid_credentials() {
    let app = spawn_app();
    app.register("John Doe", "john@example.com", None).await;

    let response = app
        .post("/login", &json!({ "email": "john@example.com", "password": PASSWORD }))
        .await;

    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["data"]["accessToken"].is_string());
    assert!(body["data"]["refreshToken"].is_string());
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = spawn_app();
    app.register("John Doe", "john@example.com", None).await;

    let unknown = app
        .post("/login", &json!({ "email": "nope@x.com", "password": "anything" }))
        .await;
    let wrong = app
        .post("/login", &json!({ "email": "john@example.com", "password": "wrongpass" }))
        .await;

    assert_eq!(401, unknown.status().as_u16());
    assert_eq!(401, wrong.status().as_u16());

    let unknown: Value = unknown.json().await.unwrap();
    let wrong: Value = wrong.json().await.unwrap();
    assert_eq!(unknown["message"], wrong["message"]);
    assert_eq!(unknown["code"], wrong["code"]);
}

#[tokio::test]
async fn login_returns_400_for_missing_fields() {
    let app = spawn_app();

    let test_cases = vec![
        (json!({"email": "test@example.com"}), "missing password"),
        (json!({"password": PASSWORD}), "missing email"),
        (json!({}), "missing all fields"),
    ];

    for (body, reason) in test_cases {
        let response = app.post("/login", &body).await;
        assert_eq!(400, response.status().as_u16(),
            "Should reject request: {}", reason);
    }
}

// --- Refresh / Logout Tests ---

#[tokio::test]
async fn refresh_returns_access_token_for_original_user() {
    let app = spawn_app();
    let data = app.register("Mod", "mod@x.com", Some("moderator")).await;

    let response = app
        .post("/refresh", &json!({ "refreshToken": token(&data, "refreshToken") }))
        .await;
    let body: Value = response.json().await.unwrap();
    let access_token = body["data"]["accessToken"].as_str().unwrap();

    // without rotation the refresh token is not reissued
    assert!(body["data"].get("refreshToken").is_none());

    let profile = app.get_authed("/profile", access_token).await;
    assert_eq!(200, profile.status().as_u16());
    let profile: Value = profile.json().await.unwrap();
    assert_eq!(profile["data"]["id"], data["user"]["id"]);
    assert_eq!(profile["data"]["role"], "moderator");
}

#[tokio::test]
async fn refresh_returns_400_without_token() {
    let app = spawn_app();

    let response = app.post("/refresh", &json!({})).await;
    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn refresh_returns_401_for_garbage_and_access_tokens() {
    let app = spawn_app();
    let data = app.register("A", "a@x.com", None).await;

    for bad in ["invalid.token.here".to_string(), token(&data, "accessToken")] {
        let response = app.post("/refresh", &json!({ "refreshToken": bad })).await;
        assert_eq!(401, response.status().as_u16());
    }
}

#[tokio::test]
async fn logout_revokes_refresh_token() {
    let app = spawn_app();
    let data = app.register("A", "a@x.com", None).await;
    let access_token = token(&data, "accessToken");
    let refresh_token = token(&data, "refreshToken");

    let response = app
        .post_authed("/logout", &access_token, &json!({ "refreshToken": refresh_token }))
        .await;
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert!(body["data"].is_null());

    let response = app
        .post("/refresh", &json!({ "refreshToken": refresh_token }))
        .await;
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn logout_requires_authentication() {
    let app = spawn_app();
    let data = app.register("A", "a@x.com", None).await;

    let response = app
        .post("/logout", &json!({ "refreshToken": token(&data, "refreshToken") }))
        .await;

    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "NO_TOKEN");
}

#[tokio::test]
async fn logout_returns_400_without_refresh_token() {
    let app = spawn_app();
    let data = app.register("A", "a@x.com", None).await;

    let response = app
        .post_authed("/logout", &token(&data, "accessToken"), &json!({}))
        .await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn rotation_replaces_refresh_token() {
    let app = spawn_app_with(|settings| settings.jwt.rotate_refresh_tokens = true);
    let data = app.register("A", "a@x.com", None).await;
    let original = token(&data, "refreshToken");

    let response = app.post("/refresh", &json!({ "refreshToken": original })).await;
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    let rotated = token(&body["data"], "refreshToken");

    let reuse = app.post("/refresh", &json!({ "refreshToken": original })).await;
    assert_eq!(401, reuse.status().as_u16());

    let next = app.post("/refresh", &json!({ "refresh_token": rotated })).await;
    assert_eq!(200, next.status().as_u16());
}
