use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{
    app, app_with_state, seeded_db, ADMIN_PASSWORD, ADMIN_USERNAME, SEEDED_WEBSITE_ID,
};
use serde_json::Value;
use tower::ServiceExt;

const BROWSER: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0";

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn authed_get(uri: &str, token: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .body(String::new())
        .unwrap()
}

fn send_request(user_agent: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri("/api/send")
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(http::header::USER_AGENT, user_agent)
        .body(body.to_string())
        .unwrap()
}

fn credentials() -> String {
    format!(r#"{{"username":"{ADMIN_USERNAME}","password":"{ADMIN_PASSWORD}"}}"#)
}

fn event_body(website: &str) -> String {
    format!(
        r#"{{"type":"event","payload":{{"hostname":"example.com","website":"{website}",
            "url":"/","title":"Home","language":"en-US","referrer":"","screen":"1920x1080"}}}}"#
    )
}

// --- auth ---

#[tokio::test]
async fn login_returns_token_and_user() {
    let resp = app()
        .oneshot(json_request("/api/auth/login", &credentials()))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["username"], ADMIN_USERNAME);
    assert_eq!(body["user"]["isAdmin"], true);
}

#[tokio::test]
async fn login_wrong_password_returns_401() {
    let resp = app()
        .oneshot(json_request(
            "/api/auth/login",
            r#"{"username":"admin","password":"nope"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn verify_without_token_returns_401() {
    let resp = app()
        .oneshot(json_request("/api/auth/verify", ""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn websites_require_known_token() {
    let resp = app()
        .oneshot(authed_get("/api/websites", "made-up"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn heartbeat_answers_get_and_post() {
    let resp = app()
        .oneshot(Request::builder().uri("/api/heartbeat").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app()
        .oneshot(json_request("/api/heartbeat", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// --- collect ---

#[tokio::test]
async fn send_from_browser_is_recorded() {
    let db = seeded_db();
    let resp = app_with_state(db.clone())
        .oneshot(send_request(BROWSER, &event_body(SEEDED_WEBSITE_ID)))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!body_bytes(resp).await.is_empty());
    let state = db.read().await;
    assert_eq!(state.events.len(), 1);
    assert!(state.events[0].is_page_view());
    assert_eq!(state.events[0].website(), Some(SEEDED_WEBSITE_ID));
}

#[tokio::test]
async fn send_from_bot_is_dropped() {
    let db = seeded_db();
    let resp = app_with_state(db.clone())
        .oneshot(send_request("Umami-Client v0.1.0 / Rust / linux", &event_body(SEEDED_WEBSITE_ID)))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["beep"], "boop");
    assert!(db.read().await.events.is_empty());
}

#[tokio::test]
async fn send_for_unknown_website_returns_400() {
    let resp = app()
        .oneshot(send_request(BROWSER, &event_body("not-a-website")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn send_wrong_type_returns_400() {
    let body = event_body(SEEDED_WEBSITE_ID).replace(r#""type":"event""#, r#""type":"identify""#);
    let resp = app().oneshot(send_request(BROWSER, &body)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- full session ---

#[tokio::test]
async fn login_then_read_everything() {
    use tower::Service;

    let mut app = app().into_service();

    // login
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("/api/auth/login", &credentials()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let token = body_json(resp).await["token"].as_str().unwrap().to_string();

    // websites
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed_get("/api/websites", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["id"], SEEDED_WEBSITE_ID);

    // send a page view with an IP override
    let with_ip = event_body(SEEDED_WEBSITE_ID).replace(r#""url":"/""#, r#""url":"/","ip":"10.0.0.1""#);
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(send_request(BROWSER, &with_ip))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // stats without a range — 400
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed_get(
            &format!("/api/websites/{SEEDED_WEBSITE_ID}/stats"),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // stats
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed_get(
            &format!("/api/websites/{SEEDED_WEBSITE_ID}/stats?startAt=0&endAt=1"),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["pageviews"]["value"], 1);
    assert_eq!(body["visitors"]["value"], 1);

    // active users
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed_get(
            &format!("/api/websites/{SEEDED_WEBSITE_ID}/active"),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["x"], 1);

    // unknown website — 404
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed_get("/api/websites/missing/active", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
