use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use recycling_tracker::{
    app::build_app,
    auth::JwtKeys,
    policy::{ADMIN_ROLE, USER_ROLE},
    state::AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

struct TestApp {
    state: AppState,
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let state = AppState::fake();
        let router = build_app(state.clone());
        Self { state, router }
    }

    /// Creates an account directly in the directory and returns its id and
    /// an access token.
    async fn account(&self, email: &str, roles: &[&str]) -> (Uuid, String) {
        let user = self
            .state
            .users
            .create(email, "not-a-real-hash")
            .await
            .unwrap();
        let roles: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
        if !roles.is_empty() {
            self.state.users.add_to_roles(user.id, &roles).await.unwrap();
        }
        let token = JwtKeys::from_config(&self.state.config.jwt)
            .sign_access(user.id)
            .unwrap();
        (user.id, token)
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    async fn submit(&self, token: &str, appliance_type: &str) -> Value {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/v1/appliances",
                Some(token),
                Some(submission(appliance_type)),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["appliance"].clone()
    }
}

fn submission(appliance_type: &str) -> Value {
    json!({
        "appliance_type": appliance_type,
        "brand": "Whirlpool",
        "condition": "NotWorking",
        "status": "Pending",
        "weight": "61.25",
        "collection_address": "456 Oak Ave, Chicago, IL 60601",
        "customer_name": "Linda Miller",
        "customer_email": "linda.miller@example.com"
    })
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));
}

#[tokio::test]
async fn register_login_and_me() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "email": " Alice@Example.com ", "password": "s3cure-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["user"]["email"], "alice@example.com");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": "s3cure-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let access = body["access_token"].as_str().unwrap().to_string();
    let refresh = body["refresh_token"].as_str().unwrap().to_string();

    let (status, me) = app.send(Method::GET, "/api/v1/me", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["roles"], json!([USER_ROLE]));

    // A refresh token cannot be used as a bearer token.
    let (status, _) = app.send(Method::GET, "/api/v1/me", Some(&refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/refresh",
            None,
            Some(json!({ "refresh_token": refresh })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());
}

#[tokio::test]
async fn register_rejects_duplicates_and_bad_input() {
    let app = TestApp::new();
    let body = json!({ "email": "bob@example.com", "password": "password-1" });
    let (status, _) = app
        .send(Method::POST, "/api/v1/auth/register", None, Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .send(Method::POST, "/api/v1/auth/register", None, Some(body))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "email": "bob", "password": "short" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["email"].is_array());
    assert!(body["fields"]["password"].is_array());

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "bob@example.com", "password": "nope-nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn appliances_require_authentication() {
    let app = TestApp::new();
    let (status, _) = app.send(Method::GET, "/api/v1/appliances", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app
        .send(Method::GET, "/api/v1/appliances", Some("garbage"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_assigns_owner_and_round_trips() {
    let app = TestApp::new();
    let (user_id, token) = app.account("owner@example.com", &[USER_ROLE]).await;

    let mut payload = submission("Dryer");
    payload["user_id"] = json!(Uuid::new_v4());
    let (status, body) = app
        .send(Method::POST, "/api/v1/appliances", Some(&token), Some(payload))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body["message"],
        "Appliance collection request submitted successfully!"
    );
    let created = &body["appliance"];
    assert_eq!(created["user_id"], json!(user_id));
    assert_eq!(created["collection_fee"], "50");
    assert_eq!(created["recycling_status"], "NotProcessed");

    let uri = format!("/api/v1/appliances/{}", created["id"]);
    let (status, fetched) = app.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&fetched, created);
    assert_eq!(fetched["weight"], "61.25");
}

#[tokio::test]
async fn foreign_records_are_forbidden_for_users_but_not_admins() {
    let app = TestApp::new();
    let (_, owner) = app.account("owner@example.com", &[USER_ROLE]).await;
    let (_, other) = app.account("other@example.com", &[USER_ROLE]).await;
    let (_, admin) = app.account("admin@example.com", &[ADMIN_ROLE]).await;

    let created = app.submit(&owner, "Oven").await;
    let uri = format!("/api/v1/appliances/{}", created["id"]);

    let (status, _) = app.send(Method::GET, &uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.send(Method::DELETE, &uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send(Method::GET, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(Method::GET, "/api/v1/appliances/9999", Some(&other), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_is_scoped_and_paginated() {
    let app = TestApp::new();
    let (_, alice) = app.account("alice@example.com", &[USER_ROLE]).await;
    let (_, bob) = app.account("bob@example.com", &[USER_ROLE]).await;
    let (_, admin) = app.account("admin@example.com", &[ADMIN_ROLE]).await;

    for i in 0..25 {
        app.submit(&alice, &format!("Freezer {}", i)).await;
    }
    app.submit(&bob, "Toaster").await;

    let (status, page) = app
        .send(Method::GET, "/api/v1/appliances?page=3", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["items"].as_array().unwrap().len(), 5);
    assert_eq!(page["total_items"], 25);
    assert_eq!(page["total_pages"], 3);
    assert_eq!(page["page_size"], 10);

    let (_, page) = app
        .send(Method::GET, "/api/v1/appliances?page=4", Some(&alice), None)
        .await;
    assert!(page["items"].as_array().unwrap().is_empty());

    let (_, page) = app
        .send(Method::GET, "/api/v1/appliances", Some(&bob), None)
        .await;
    assert_eq!(page["total_items"], 1);
    assert_eq!(page["items"][0]["appliance_type"], "Toaster");

    let (_, page) = app
        .send(Method::GET, "/api/v1/appliances?page=0", Some(&admin), None)
        .await;
    assert_eq!(page["page"], 1);
    assert_eq!(page["total_items"], 26);
    // Newest first: Bob's toaster was submitted last.
    assert_eq!(page["items"][0]["appliance_type"], "Toaster");
}

#[tokio::test]
async fn invalid_submission_is_rejected_with_field_errors() {
    let app = TestApp::new();
    let (_, token) = app.account("u@example.com", &[USER_ROLE]).await;

    let mut payload = submission("Stove");
    payload["customer_email"] = json!("not-an-email");
    payload["brand"] = json!("B".repeat(51));
    let (status, body) = app
        .send(Method::POST, "/api/v1/appliances", Some(&token), Some(payload))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["customer_email"].is_array());
    assert!(body["fields"]["brand"].is_array());

    let (_, page) = app
        .send(Method::GET, "/api/v1/appliances", Some(&token), None)
        .await;
    assert_eq!(page["total_items"], 0);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new();
    let (_, token) = app.account("u@example.com", &[USER_ROLE]).await;
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/appliances")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_checks_ids_and_persists_changes() {
    let app = TestApp::new();
    let (_, token) = app.account("u@example.com", &[USER_ROLE]).await;
    let created = app.submit(&token, "Blender").await;
    let id = created["id"].as_i64().unwrap();
    let uri = format!("/api/v1/appliances/{}", id);

    let mut edit = created.clone();
    edit["id"] = json!(id + 1);
    edit["brand"] = json!("Changed");
    let (status, _) = app.send(Method::PUT, &uri, Some(&token), Some(edit)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, unchanged) = app.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(unchanged["brand"], "Whirlpool");

    let mut edit = created.clone();
    edit["status"] = json!("Collected");
    edit["recycling_comment"] = json!("Compressor removed");
    let (status, updated) = app.send(Method::PUT, &uri, Some(&token), Some(edit)).await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["status"], "Collected");
    assert_eq!(updated["recycling_comment"], "Compressor removed");
    assert!(updated["last_updated"].is_string());
    assert_eq!(updated["date_submitted"], created["date_submitted"]);
}

#[tokio::test]
async fn delete_is_idempotent() {
    let app = TestApp::new();
    let (_, token) = app.account("u@example.com", &[USER_ROLE]).await;
    let created = app.submit(&token, "Microwave").await;
    let uri = format!("/api/v1/appliances/{}", created["id"]);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn recycling_centers_are_public() {
    let app = TestApp::new();
    let (status, body) = app
        .send(Method::GET, "/api/v1/recycling-centers", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["center_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Eco Appliance Solutions", "Green Tech Recycling"]);

    let (status, body) = app
        .send(Method::GET, "/api/v1/recycling-centers/1", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["zip_code"], "62701");

    let (status, _) = app
        .send(Method::GET, "/api/v1/recycling-centers/42", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_area_requires_admin_role() {
    let app = TestApp::new();
    let (_, user) = app.account("u@example.com", &[USER_ROLE]).await;
    let (status, _) = app
        .send(Method::GET, "/api/v1/admin/users", Some(&user), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.send(Method::GET, "/api/v1/admin/roles", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_manages_roles() {
    let app = TestApp::new();
    let (_, admin) = app.account("admin@example.com", &[ADMIN_ROLE]).await;

    let (status, role) = app
        .send(
            Method::POST,
            "/api/v1/admin/roles",
            Some(&admin),
            Some(json!({ "name": "Dispatcher" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/v1/admin/roles/{}", role["id"].as_str().unwrap());

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/admin/roles",
            Some(&admin),
            Some(json!({ "name": "Dispatcher" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"][0].as_str().unwrap().contains("Dispatcher"));

    let (status, renamed) = app
        .send(
            Method::PUT,
            &uri,
            Some(&admin),
            Some(json!({ "id": role["id"], "name": "Driver" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "Driver");

    let (_, roles) = app
        .send(Method::GET, "/api/v1/admin/roles", Some(&admin), None)
        .await;
    assert_eq!(roles.as_array().unwrap().len(), 3);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.send(Method::GET, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_edits_user_roles_by_reconciliation() {
    let app = TestApp::new();
    let (_, admin) = app.account("admin@example.com", &[ADMIN_ROLE]).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/admin/users",
            Some(&admin),
            Some(json!({
                "email": "clerk@example.com",
                "password": "abc123",
                "confirm_password": "abc124"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["confirm_password"].is_array());

    let (status, created) = app
        .send(
            Method::POST,
            "/api/v1/admin/users",
            Some(&admin),
            Some(json!({
                "email": "clerk@example.com",
                "password": "abc123",
                "confirm_password": "abc123"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["roles"], json!([]));
    let uri = format!("/api/v1/admin/users/{}", created["id"].as_str().unwrap());

    let (status, edited) = app
        .send(
            Method::PUT,
            &uri,
            Some(&admin),
            Some(json!({ "email": "clerk2@example.com", "roles": [ADMIN_ROLE, USER_ROLE] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", edited);
    assert_eq!(edited["roles"], json!([ADMIN_ROLE, USER_ROLE]));

    let (_, edited) = app
        .send(
            Method::PUT,
            &uri,
            Some(&admin),
            Some(json!({ "email": "clerk2@example.com", "roles": [USER_ROLE] })),
        )
        .await;
    assert_eq!(edited["roles"], json!([USER_ROLE]));

    let (status, details) = app.send(Method::GET, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["email"], "clerk2@example.com");
    assert_eq!(details["available_roles"], json!([ADMIN_ROLE, USER_ROLE]));

    let (status, body) = app
        .send(
            Method::PUT,
            &uri,
            Some(&admin),
            Some(json!({ "email": "clerk2@example.com", "roles": ["Ghost"] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"].is_array());

    let (status, _) = app.send(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, users) = app
        .send(Method::GET, "/api/v1/admin/users", Some(&admin), None)
        .await;
    assert_eq!(users.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn rejected_user_edit_leaves_email_and_roles_untouched() {
    let app = TestApp::new();
    let (_, admin) = app.account("admin@example.com", &[ADMIN_ROLE]).await;
    let (clerk, _) = app.account("clerk@example.com", &[USER_ROLE]).await;
    let uri = format!("/api/v1/admin/users/{}", clerk);

    let (status, body) = app
        .send(
            Method::PUT,
            &uri,
            Some(&admin),
            Some(json!({ "email": "changed@example.com", "roles": ["Ghost"] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"][0].as_str().unwrap().contains("Ghost"));

    let user = app.state.users.find_by_id(clerk).await.unwrap().unwrap();
    assert_eq!(user.email, "clerk@example.com");
    assert_eq!(
        app.state.users.roles_of(clerk).await.unwrap(),
        vec![USER_ROLE.to_string()]
    );
}

#[tokio::test]
async fn role_changes_apply_without_new_token() {
    let app = TestApp::new();
    let (user_id, token) = app.account("promoted@example.com", &[USER_ROLE]).await;
    let (status, _) = app
        .send(Method::GET, "/api/v1/admin/roles", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    app.state
        .users
        .add_to_roles(user_id, &[ADMIN_ROLE.to_string()])
        .await
        .unwrap();
    let (status, _) = app
        .send(Method::GET, "/api/v1/admin/roles", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}
