//! In-memory imitation of the Umami HTTP API.
//!
//! Serves the routes the client talks to from a shared `MockState`: one
//! seeded admin account, a list of websites, the bearer tokens handed out by
//! login, and every event accepted by the collect endpoint. Tests hold on
//! to the `Db` handle to inspect what was collected.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "umami";
pub const ADMIN_ID: &str = "41e2b680-648e-4b09-bcd7-3e2b10c06264";
pub const SEEDED_WEBSITE_ID: &str = "978435e2-7ba1-4337-9860-ec31ece2db60";
pub const SEEDED_WEBSITE_DOMAIN: &str = "example.com";
const CREATED_AT: &str = "2024-01-01T00:00:00.000Z";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Website {
    pub id: String,
    pub name: Option<String>,
    pub domain: String,
    pub user_id: String,
    pub created_at: String,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Fields the collect endpoint needs; anything else in the payload is kept
/// verbatim in `CollectedEvent::payload`.
#[derive(Deserialize)]
pub struct SendBody {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: Map<String, Value>,
}

#[derive(Clone, Debug)]
pub struct CollectedEvent {
    pub user_agent: String,
    pub authorization: Option<String>,
    pub payload: Map<String, Value>,
}

impl CollectedEvent {
    pub fn website(&self) -> Option<&str> {
        self.payload.get("website").and_then(Value::as_str)
    }

    pub fn is_page_view(&self) -> bool {
        !self.payload.contains_key("name")
    }
}

#[derive(Debug, Default)]
pub struct MockState {
    pub websites: Vec<Website>,
    pub tokens: HashSet<String>,
    pub events: Vec<CollectedEvent>,
}

impl MockState {
    /// State with the admin account's single website.
    pub fn seeded() -> Self {
        MockState {
            websites: vec![Website {
                id: SEEDED_WEBSITE_ID.to_string(),
                name: Some("Example".to_string()),
                domain: SEEDED_WEBSITE_DOMAIN.to_string(),
                user_id: ADMIN_ID.to_string(),
                created_at: CREATED_AT.to_string(),
            }],
            ..MockState::default()
        }
    }
}

pub type Db = Arc<RwLock<MockState>>;

pub fn seeded_db() -> Db {
    Arc::new(RwLock::new(MockState::seeded()))
}

pub fn app() -> Router {
    app_with_state(seeded_db())
}

pub fn app_with_state(db: Db) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/verify", post(verify))
        .route("/api/heartbeat", get(heartbeat).post(heartbeat))
        .route("/api/websites", get(list_websites))
        .route("/api/websites/{id}/stats", get(website_stats))
        .route("/api/websites/{id}/active", get(active_users))
        .route("/api/send", post(collect))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, seeded_db()).await
}

pub async fn run_with_state(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(db)).await
}

fn admin_user() -> Value {
    json!({
        "id": ADMIN_ID,
        "username": ADMIN_USERNAME,
        "role": "admin",
        "createdAt": CREATED_AT,
        "isAdmin": true,
    })
}

/// Rejects requests without a bearer token issued by `login`.
async fn authorize(db: &Db, headers: &HeaderMap) -> Result<(), StatusCode> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if db.read().await.tokens.contains(token) {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

/// Rough stand-in for the real server's bot detection.
fn looks_like_browser(user_agent: &str) -> bool {
    user_agent.starts_with("Mozilla/")
        && !user_agent.to_ascii_lowercase().contains("bot")
}

async fn login(
    State(db): State<Db>,
    Json(input): Json<Credentials>,
) -> Result<Json<Value>, StatusCode> {
    if input.username != ADMIN_USERNAME || input.password != ADMIN_PASSWORD {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let token = Uuid::new_v4().to_string();
    db.write().await.tokens.insert(token.clone());
    Ok(Json(json!({ "token": token, "user": admin_user() })))
}

async fn verify(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    authorize(&db, &headers).await?;
    Ok(Json(admin_user()))
}

async fn heartbeat() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn list_websites(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    authorize(&db, &headers).await?;
    let state = db.read().await;
    let data: Vec<Value> = state
        .websites
        .iter()
        .map(|site| {
            json!({
                "id": site.id,
                "name": site.name,
                "domain": site.domain,
                "shareId": null,
                "resetAt": null,
                "userId": site.user_id,
                "createdAt": site.created_at,
                "updatedAt": site.created_at,
                "deletedAt": null,
                "teamWebsite": [],
                "user": { "id": ADMIN_ID, "username": ADMIN_USERNAME },
            })
        })
        .collect();
    Ok(Json(json!({
        "data": data,
        "count": state.websites.len(),
        "page": 1,
        "pageSize": 10,
    })))
}

/// Counts collected events for the website. Only the `url` filter is
/// applied; the time range is required but not enforced.
async fn website_stats(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    authorize(&db, &headers).await?;
    for key in ["startAt", "endAt"] {
        params
            .get(key)
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or(StatusCode::BAD_REQUEST)?;
    }

    let state = db.read().await;
    if !state.websites.iter().any(|site| site.id == id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let url_filter = params.get("url");
    let events: Vec<&CollectedEvent> = state
        .events
        .iter()
        .filter(|event| event.website() == Some(id.as_str()))
        .filter(|event| {
            url_filter.map_or(true, |url| {
                event.payload.get("url").and_then(Value::as_str) == Some(url.as_str())
            })
        })
        .collect();
    let pageviews = events.iter().filter(|e| e.is_page_view()).count();
    let visitors = distinct_visitors(&events);

    Ok(Json(json!({
        "pageviews": { "value": pageviews, "prev": 0 },
        "visitors": { "value": visitors, "prev": 0 },
        "visits": { "value": events.len(), "prev": 0 },
        "bounces": { "value": 0, "prev": 0 },
        "totaltime": { "value": 0, "prev": 0 },
    })))
}

async fn active_users(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    authorize(&db, &headers).await?;
    let state = db.read().await;
    if !state.websites.iter().any(|site| site.id == id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let events: Vec<&CollectedEvent> = state
        .events
        .iter()
        .filter(|event| event.website() == Some(id.as_str()))
        .collect();
    Ok(Json(json!({ "x": distinct_visitors(&events) })))
}

/// Visitors are told apart by the `ip` override; events without one count
/// as a single anonymous visitor.
fn distinct_visitors(events: &[&CollectedEvent]) -> usize {
    events
        .iter()
        .map(|event| event.payload.get("ip").and_then(Value::as_str).unwrap_or(""))
        .collect::<HashSet<_>>()
        .len()
}

async fn collect(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(body): Json<SendBody>,
) -> Result<String, StatusCode> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !looks_like_browser(&user_agent) {
        // The real server answers bots with a 200 and drops the event.
        return Ok(json!({ "beep": "boop" }).to_string());
    }
    if body.kind != "event" {
        return Err(StatusCode::BAD_REQUEST);
    }
    for field in ["hostname", "website", "url"] {
        if !body.payload.get(field).is_some_and(Value::is_string) {
            return Err(StatusCode::BAD_REQUEST);
        }
    }

    let mut state = db.write().await;
    let website = body.payload.get("website").and_then(Value::as_str);
    if !state.websites.iter().any(|site| Some(site.id.as_str()) == website) {
        return Err(StatusCode::BAD_REQUEST);
    }
    state.events.push(CollectedEvent {
        user_agent,
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        payload: body.payload,
    });
    Ok(Uuid::new_v4().to_string())
}
