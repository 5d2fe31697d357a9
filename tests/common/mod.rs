#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use coursehub::config::AppConfig;
use coursehub::{build_router, AppState, InMemoryCatalogStore};

pub struct TestApp {
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::new(AppConfig::default(), InMemoryCatalogStore::new());
        Self {
            router: build_router(state),
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        user: Option<Uuid>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-user-id", user.to_string());
        }
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn get_as(&self, uri: &str, user: Uuid) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, Some(user)).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body), None).await
    }

    pub async fn post_as(&self, uri: &str, body: Value, user: Uuid) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body), Some(user)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(body), None).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body), None).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None, None).await
    }

    pub async fn delete_as(&self, uri: &str, user: Uuid) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None, Some(user)).await
    }

    /// Returns the created instructor view.
    pub async fn seed_instructor(&self, username: &str) -> Value {
        let (status, body) = self
            .post(
                "/courses/instructors/",
                json!({
                    "user": {"username": username, "email": format!("{}@example.com", username)},
                    "bio": "Teaches things",
                    "expertise": "Software"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"].clone()
    }

    pub async fn seed_category(&self, name: &str) -> Value {
        let (status, body) = self
            .post("/courses/categories/", json!({"name": name, "description": "", "icon": "code"}))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"].clone()
    }

    /// Instructor and category ids to hang courses on.
    pub async fn seed_catalog(&self) -> (String, String) {
        let instructor = self.seed_instructor("aziz").await;
        let category = self.seed_category("Programming").await;
        (id_of(&instructor), id_of(&category))
    }

    pub async fn create_course(&self, body: Value) -> Value {
        let (status, response) = self.post("/courses/", body).await;
        assert_eq!(status, StatusCode::CREATED, "{}", response);
        response["data"].clone()
    }

    pub async fn create_section(&self, course_id: &str, title: &str) -> Value {
        let (status, body) = self
            .post(&format!("/courses/{}/sections/", course_id), json!({"title": title}))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"].clone()
    }

    pub async fn create_lesson(&self, section_id: &str, title: &str) -> Value {
        let (status, body) = self
            .post(
                &format!("/sections/{}/lessons/", section_id),
                json!({"title": title, "duration_minutes": 10}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"].clone()
    }
}

pub fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}

pub fn course_body(title: &str, instructor: &str, category: &str) -> Value {
    json!({
        "title": title,
        "description": "A practical course that walks through the topic from first principles.",
        "instructor": instructor,
        "category": category,
        "price": "100.00",
        "discount_percentage": 0,
        "level": "beginner",
        "status": "published",
        "duration_hours": "10"
    })
}

pub fn priced(mut body: Value, price: &str, discount: i64) -> Value {
    body["price"] = json!(price);
    body["discount_percentage"] = json!(discount);
    body
}
