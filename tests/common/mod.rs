#![allow(dead_code)]

use reqwest::Response;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::Arc;
use user_api::configuration::{get_configuration, Settings};
use user_api::startup::run;
use user_api::store::InMemoryUserStore;

pub const PASSWORD: &str = "Passw0rd1";

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(|_| {})
}

/// Start the server on a random port with a fresh in-memory store.
pub fn spawn_app_with(configure: impl FnOnce(&mut Settings)) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.password.hash_cost = 4;
    configure(&mut configuration);

    let server = run(listener, Arc::new(InMemoryUserStore::new()), configuration)
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/users{}", self.address, path)
    }

    pub async fn post(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_authed(&self, path: &str, token: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_authed(&self, path: &str, token: &str) -> Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Register a user and return the `data` object of the response.
    pub async fn register(&self, name: &str, email: &str, role: Option<&str>) -> Value {
        let mut body = json!({ "name": name, "email": email, "password": PASSWORD });
        if let Some(role) = role {
            body["role"] = json!(role);
        }

        let response = self.post("/register", &body).await;
        assert_eq!(201, response.status().as_u16());
        let body: Value = response.json().await.expect("Failed to parse response");
        body["data"].clone()
    }
}

pub fn token(data: &Value, field: &str) -> String {
    data[field]
        .as_str()
        .unwrap_or_else(|| panic!("No {} in response", field))
        .to_string()
}
