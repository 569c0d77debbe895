use std::net::SocketAddr;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::clock::stamp;
use crate::state::AppState;
use crate::{cafe, events, orders, ratings, reports, rights};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(rights::router())
                .merge(orders::router())
                .merge(ratings::handlers::rating_routes())
                .merge(reports::handlers::report_routes())
                .merge(cafe::router())
                .merge(events::router())
                .route("/health", get(health)),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let timestamp =
        stamp::serialize(&state.clock.now_utc(), serde_json::value::Serializer).unwrap_or(Value::Null);
    Json(json!({ "status": "ok", "timestamp": timestamp }))
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use time::macros::date;
    use tower::ServiceExt;

    async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn order_body(phone: &str, device: &str) -> Value {
        json!({
            "guestName": "Mehmet",
            "phone": phone,
            "deviceId": device,
            "item": "Latte",
            "fcmToken": "tok",
            "deviceModel": "Pixel 8",
            "os": "Android 15"
        })
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (state, _) = AppState::fake(date!(2025 - 01 - 16), 12).await;
        let (status, body) = call(build_app(state), get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["timestamp"], "2025-01-16T09:00:00.000000+00:00");
    }

    #[tokio::test]
    async fn place_then_complete_over_http() {
        let (state, _) = AppState::fake(date!(2025 - 01 - 16), 12).await;
        let app = build_app(state);

        let (status, placed) = call(app.clone(), post_json("/api/orders", order_body("5551234567", "dev-1"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(placed["orderNumber"], 1);
        assert_eq!(placed["slot"], "Open Order");

        let (_, active) = call(app.clone(), get("/api/active-orders")).await;
        assert_eq!(active[0]["deviceInfo"]["deviceModel"], "Pixel 8");
        assert_eq!(active[0]["pushToken"], "tok");
        assert_eq!(active[0]["date"], "2025-01-16");

        let (status, denied) = call(app.clone(), post_json("/api/orders", order_body("5551234567", "dev-1"))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(denied["error"].as_str().unwrap().contains("18:00"));

        let id = placed["orderId"].as_str().unwrap();
        let (status, summary) = call(app.clone(), post_json(&format!("/api/orders/{id}/complete"), json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["guestName"], "Mehmet");

        let (status, _) = call(app.clone(), post_json(&format!("/api/orders/{id}/complete"), json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, report) = call(app, get("/api/reports?filter=daily")).await;
        assert_eq!(report["stats"]["completed"], 1);
        assert_eq!(report["itemCounts"]["Latte"], 1);
    }

    #[tokio::test]
    async fn rights_and_slots_endpoints() {
        let (state, _) = AppState::fake(date!(2025 - 01 - 16), 19).await;
        let app = build_app(state);

        let (status, rights) =
            call(app.clone(), get("/api/order-rights?phone=5551234567&deviceId=dev-1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rights["canOrder"], true);
        assert_eq!(rights["slot"], "18:00-20:00");
        assert_eq!(rights["orderCount"], 0);

        let (_, slots) = call(app.clone(), get("/api/order-slots")).await;
        assert_eq!(slots[1]["available"], true);
        assert_eq!(slots[0]["timeRange"], "Anytime");

        let (status, _) = call(app, get("/api/order-rights?phone=abc&deviceId=dev-1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn bad_input_is_rejected() {
        let (state, _) = AppState::fake(date!(2025 - 01 - 16), 12).await;
        let app = build_app(state);

        let mut body = order_body("5551234567", "dev-1");
        body["guestName"] = json!("  ");
        let (status, err) = call(app.clone(), post_json("/api/orders", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "guestName is required");

        let (status, _) = call(app.clone(), get("/api/reports?filter=yearly")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = call(app, get("/api/completed-orders?date=16.01.2025")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn closing_the_cafe_blocks_orders() {
        let (state, _) = AppState::fake(date!(2025 - 01 - 16), 12).await;
        let app = build_app(state);

        let req = Request::put("/api/cafe-status")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "isOpen": false, "closureReason": "manual" }).to_string()))
            .unwrap();
        let (status, cafe) = call(app.clone(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cafe["isOpen"], false);

        let (status, _) = call(app, post_json("/api/orders", order_body("5551234567", "dev-1"))).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn missing_required_field_is_a_json_400() {
        let (state, _) = AppState::fake(date!(2025 - 01 - 16), 12).await;
        let app = build_app(state);

        let body = json!({ "phone": "5551234567", "deviceId": "d", "item": "Latte" });
        let (status, err) = call(app.clone(), post_json("/api/orders", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "guestName is required");

        let req = Request::post("/api/orders")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, err) = call(app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(err["error"].is_string());
    }

    #[tokio::test]
    async fn fractional_rating_does_not_block_the_order() {
        let (state, _) = AppState::fake(date!(2025 - 01 - 16), 12).await;
        let app = build_app(state);

        let mut body = order_body("5551234567", "dev-1");
        body["rating"] = json!(4.5);
        let (status, _) = call(app.clone(), post_json("/api/orders", body)).await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, ratings) = call(app, get("/api/item-ratings")).await;
        assert_eq!(ratings, json!({}));
    }

    #[tokio::test]
    async fn ready_board_fills_on_completion_and_empties_on_pickup() {
        let (state, _) = AppState::fake(date!(2025 - 01 - 16), 12).await;
        let app = build_app(state);

        let (_, placed) = call(app.clone(), post_json("/api/orders", order_body("5551234567", "dev-1"))).await;
        let id = placed["orderId"].as_str().unwrap().to_string();
        let (_, board) = call(app.clone(), get("/api/ready-orders")).await;
        assert_eq!(board, json!([]));

        call(app.clone(), post_json(&format!("/api/orders/{id}/complete"), json!({}))).await;
        let (_, board) = call(app.clone(), get("/api/ready-orders")).await;
        assert_eq!(
            board,
            json!([{ "id": id, "orderNumber": 1, "guestName": "Mehmet", "item": "Latte" }])
        );

        let (status, _) = call(app.clone(), post_json(&format!("/api/ready-orders/{id}/pickup"), json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        let (_, board) = call(app.clone(), get("/api/ready-orders")).await;
        assert_eq!(board, json!([]));

        let (status, _) = call(app, post_json(&format!("/api/ready-orders/{id}/pickup"), json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
