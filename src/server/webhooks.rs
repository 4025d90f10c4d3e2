use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::{
    post::Priority,
    store::CreatedPost,
    webhook::{
        article::ArticlePayload, iso_timestamp, matches::MatchPayload,
        transfers::TransferPayload, viral::ViralPayload, viral::ENGAGEMENT_THRESHOLD, Outcome,
        Prepared,
    },
};

use super::{activity::ActivityNote, error::ApiError, AppState};

fn with_note(body: Value, note: ActivityNote) -> Response {
    let mut response = Json(body).into_response();
    response.extensions_mut().insert(note);
    response
}

fn file_path(created: &CreatedPost) -> String {
    format!("content/posts/{}", created.filename)
}

/// Writes a prepared article and schedules a rebuild.
pub(super) async fn publish(state: &AppState, prepared: Prepared) -> Result<CreatedPost, ApiError> {
    let article = prepared.article;
    let created = state.with_store(move |store| store.create(&article)).await?;
    state.rebuild.request();
    Ok(created)
}

fn typed_response(kind: &str, title: &str, priority: Option<Priority>, created: CreatedPost) -> Response {
    let mut body = json!({
        "success": true,
        "message": format!("{kind} article created: {title}"),
        "slug": created.id,
        "file_path": file_path(&created),
    });
    if let Some(priority) = priority {
        body["priority"] = json!(priority);
    }
    with_note(body, ActivityNote::Created(created.id))
}

pub(crate) async fn create_article(
    State(state): State<AppState>,
    payload: Result<Json<ArticlePayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    let prepared = payload.prepare(Utc::now())?;
    let created = publish(&state, prepared).await?;
    let body = json!({
        "success": true,
        "postId": created.id,
        "message": "Post created successfully",
        "filePath": file_path(&created),
    });
    Ok(with_note(body, ActivityNote::Created(created.id)))
}

fn article_description() -> Value {
    json!({
        "message": "Football Feed Club Webhook Endpoint",
        "status": "active",
        "timestamp": iso_timestamp(Utc::now()),
    })
}

pub(crate) async fn describe_article() -> Json<Value> {
    Json(article_description())
}

/// Every webhook path with its GET description, in dashboard order.
pub(super) const ENDPOINTS: &[(&str, fn() -> Value)] = &[
    ("/api/webhook", article_description),
    ("/api/matches", match_description),
    ("/api/transfers", transfer_description),
    ("/api/viral", viral_description),
];

pub(crate) async fn create_match(
    State(state): State<AppState>,
    payload: Result<Json<MatchPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    let prepared = payload.prepare(Utc::now())?;
    let title = prepared.title.clone();
    let kind = format!("Match {}", payload.status.as_str());
    let created = publish(&state, prepared).await?;
    Ok(typed_response(&kind, &title, None, created))
}

fn match_description() -> Value {
    json!({
        "message": "Match Data Webhook Endpoint",
        "supported_methods": ["POST"],
        "expected_format": {
            "home_team": "string",
            "away_team": "string",
            "league": "string",
            "date": "ISO date string",
            "time": "string",
            "venue": "string (optional)",
            "status": "scheduled | finished (live is not published)",
            "score": { "home": "number", "away": "number" },
            "events": [{
                "minute": "number",
                "type": "goal | card | substitution",
                "player": "string",
                "team": "string"
            }]
        }
    })
}

pub(crate) async fn describe_match() -> Json<Value> {
    Json(match_description())
}

pub(crate) async fn create_transfer(
    State(state): State<AppState>,
    payload: Result<Json<TransferPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    let prepared = payload.prepare(Utc::now())?;
    let (title, priority) = (prepared.title.clone(), prepared.priority);
    let kind = format!("Transfer {}", payload.status.as_str());
    let created = publish(&state, prepared).await?;
    Ok(typed_response(&kind, &title, priority, created))
}

fn transfer_description() -> Value {
    json!({
        "message": "Transfer News Webhook Endpoint",
        "supported_methods": ["POST"],
        "expected_format": {
            "player": "string (required)",
            "from_club": "string (required)",
            "to_club": "string (required)",
            "status": "rumor | confirmed | completed (required)",
            "fee": "string (optional)",
            "position": "string (optional)",
            "age": "number (optional)",
            "contract_length": "string (optional)",
            "league": "string (optional)",
            "source_reliability": "low | medium | high (optional)",
            "announcement_date": "ISO date string (optional)"
        },
        "examples": {
            "rumor": {
                "player": "Kylian Mbappe",
                "from_club": "PSG",
                "to_club": "Real Madrid",
                "status": "rumor",
                "fee": "€180 million",
                "position": "Forward",
                "source_reliability": "high"
            },
            "confirmed": {
                "player": "Erling Haaland",
                "from_club": "Borussia Dortmund",
                "to_club": "Manchester City",
                "status": "confirmed",
                "fee": "€75 million",
                "contract_length": "5 years"
            }
        }
    })
}

pub(crate) async fn describe_transfer() -> Json<Value> {
    Json(transfer_description())
}

pub(crate) async fn create_viral(
    State(state): State<AppState>,
    payload: Result<Json<ViralPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    match payload.prepare(Utc::now())? {
        Outcome::Skip(skipped) => {
            let note = ActivityNote::Skipped(skipped.message.clone());
            let mut body = json!(skipped);
            body["success"] = json!(false);
            Ok(with_note(body, note))
        }
        Outcome::Publish(prepared) => {
            let (title, priority) = (prepared.title.clone(), prepared.priority);
            let created = publish(&state, prepared).await?;
            Ok(typed_response("Viral content", &title, priority, created))
        }
    }
}

fn viral_description() -> Value {
    json!({
        "message": "Viral Content Detection Webhook Endpoint",
        "supported_methods": ["POST"],
        "engagement_threshold": ENGAGEMENT_THRESHOLD,
        "expected_format": {
            "title": "string (required)",
            "description": "string (required)",
            "source_url": "string (required)",
            "engagement_score": "number 0-100 (required)",
            "platform": "twitter | instagram | tiktok | youtube | reddit | facebook (required)",
            "content_type": "video | image | text | meme (required)",
            "trending_keywords": "string[] (required)",
            "related_teams": "string[] (optional)",
            "related_players": "string[] (optional)",
            "viral_metrics": {
                "views": "number (optional)",
                "shares": "number (optional)",
                "likes": "number (optional)",
                "comments": "number (optional)"
            },
            "detected_at": "ISO date string (required)"
        },
        "example": {
            "title": "Messi Incredible Free Kick Goal",
            "description": "Lionel Messi scores an unbelievable free kick that has football fans going crazy!",
            "source_url": "https://twitter.com/example/status/123",
            "engagement_score": 95,
            "platform": "twitter",
            "content_type": "video",
            "trending_keywords": ["Messi", "FreekickGoal", "GOAT"],
            "related_teams": ["Inter Miami", "Argentina"],
            "related_players": ["Lionel Messi"],
            "viral_metrics": { "views": 2500000, "likes": 180000, "shares": 45000, "comments": 12000 },
            "detected_at": iso_timestamp(Utc::now())
        }
    })
}

pub(crate) async fn describe_viral() -> Json<Value> {
    Json(viral_description())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::server::testing::*;

    #[tokio::test]
    async fn article_webhook_requires_secret() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        let body = json!({"title": "T", "content": "C", "category": "news"});

        let response = send(&state, json_request("POST", "/api/webhook", None, body.clone())).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let response = send(
            &state,
            json_request("POST", "/api/webhook", Some("Bearer wrong"), body),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(state.ctx.store.list_visible().unwrap().is_empty());

        let activity = state.activity.snapshot();
        assert_eq!(activity.len(), 2);
        assert_eq!(activity[0].status, 401);
    }

    #[tokio::test]
    async fn article_webhook_creates_post() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        let body = json!({
            "title": "Arsenal complete signing",
            "content": "Full story here.",
            "category": "news",
            "tags": ["Arsenal"]
        });
        let response = send(&state, json_request("POST", "/api/webhook", Some(&bearer()), body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        let id = json["postId"].as_str().unwrap().to_string();
        assert!(id.starts_with("arsenal-complete-signing-"));
        assert_eq!(json["filePath"], format!("content/posts/{id}.md"));

        let post = state.ctx.store.get(&id).unwrap();
        assert_eq!(post.title, "Arsenal complete signing");
        assert_eq!(post.author, "Football Feed Bot");

        let activity = state.activity.snapshot();
        assert_eq!(activity[0].created.as_deref(), Some(id.as_str()));
    }

    #[tokio::test]
    async fn article_webhook_rejects_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        let body = json!({"title": "", "content": null, "category": "news"});
        let response = send(&state, json_request("POST", "/api/webhook", Some(&bearer()), body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Missing required fields: title, content, category");
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/api/transfers")
            .header("content-type", "application/json")
            .header("authorization", bearer())
            .body(axum::body::Body::from("{\"player\": "))
            .unwrap();
        let response = send(&state, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Invalid JSON payload");
    }

    #[tokio::test]
    async fn match_webhook_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        let body = json!({
            "home_team": "Liverpool",
            "away_team": "Everton",
            "league": "Premier League",
            "date": "2025-02-12",
            "time": "19:30",
            "status": "finished",
            "score": {"home": 2, "away": 2}
        });
        let response = send(&state, json_request("POST", "/api/matches", Some(&bearer()), body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["slug"], "liverpool-vs-everton-2025-02-12");
        assert_eq!(
            json["message"],
            "Match finished article created: Liverpool 2-2 Everton - Match Report"
        );
        let post = state.ctx.store.get("liverpool-vs-everton-2025-02-12").unwrap();
        assert!(post.body.contains("drew with"));
        assert!(post.featured);
    }

    #[tokio::test]
    async fn transfer_webhook_reports_priority() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        let body = json!({
            "player": "Erling Haaland",
            "from_club": "Borussia Dortmund",
            "to_club": "Manchester City",
            "status": "completed"
        });
        let response = send(&state, json_request("POST", "/api/transfers", Some(&bearer()), body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["priority"], "urgent");
        assert_eq!(
            json["slug"],
            "erling-haaland-borussia-dortmund-to-manchester-city-completed"
        );
    }

    #[tokio::test]
    async fn viral_webhook_skips_low_engagement() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        let body = json!({
            "title": "Meh clip",
            "description": "Not much",
            "source_url": "https://example.test/1",
            "engagement_score": 40,
            "platform": "reddit",
            "content_type": "meme",
            "trending_keywords": [],
            "detected_at": "2025-01-15T10:00:00Z"
        });
        let response = send(&state, json_request("POST", "/api/viral", Some(&bearer()), body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["threshold"], 70.0);
        assert!(state.ctx.store.list_visible().unwrap().is_empty());
    }

    #[tokio::test]
    async fn viral_webhook_accepts_fractional_score() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        let body = json!({
            "title": "Bicycle kick from the halfway line",
            "description": "Unreal",
            "source_url": "https://example.test/2",
            "engagement_score": 85.5,
            "platform": "tiktok",
            "content_type": "video",
            "detected_at": "2025-01-15T10:00:00Z"
        });
        let response = send(&state, json_request("POST", "/api/viral", Some(&bearer()), body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["priority"], "high");
        assert_eq!(state.ctx.store.list_visible().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn descriptions_are_public() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        for uri in ["/api/webhook", "/api/matches", "/api/transfers", "/api/viral"] {
            let request = axum::http::Request::builder()
                .uri(uri)
                .body(axum::body::Body::empty())
                .unwrap();
            let response = send(&state, request).await;
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
        }
        assert!(state.activity.snapshot().is_empty());
    }
}
