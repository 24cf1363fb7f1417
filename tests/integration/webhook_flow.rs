//! Signed LINE deliveries driven through the full router.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Days;
use secrecy::SecretString;
use std::sync::Arc;
use tower::ServiceExt;

use weatherbot::bot::WeatherBot;
use weatherbot::config::AppConfig;
use weatherbot::line::signature::{sign, SIGNATURE_HEADER};
use weatherbot::line::ELLIPSIS;
use weatherbot::server::build_router;
use weatherbot::server::routes::BotState;
use weatherbot::types::Dataset;
use weatherbot::weather::report::APOLOGY;

use crate::mock_source::*;

const SECRET: &str = "integration-secret";

struct Harness {
    source: Arc<StaticSource>,
    replier: Arc<RecordingReplier>,
    router: axum::Router,
}

fn harness(source: StaticSource, replier: RecordingReplier, max_reply_chars: usize) -> Harness {
    let source = Arc::new(source);
    let replier = Arc::new(replier);
    let bot = WeatherBot::new(source.clone(), &AppConfig::default()).unwrap();
    let state = Arc::new(BotState {
        bot,
        replier: replier.clone(),
        channel_secret: SecretString::new(SECRET.into()),
        max_reply_chars,
    });
    Harness {
        source,
        replier,
        router: build_router(state, "/webhook"),
    }
}

fn healthy_source() -> StaticSource {
    let now = now_local();
    StaticSource::new(
        Some(near_term_payload(now)),
        Some(five_day_payload(now.date_naive())),
    )
}

fn delivery(text: &str, reply_token: &str) -> String {
    serde_json::json!({
        "destination": "Ubot",
        "events": [{
            "type": "message",
            "mode": "active",
            "timestamp": 1_700_000_000_000i64,
            "replyToken": reply_token,
            "source": {"type": "user", "userId": "Uuser"},
            "message": {"id": "1", "type": "text", "text": text}
        }]
    })
    .to_string()
}

fn signed(body: String) -> Request<Body> {
    let sig = sign(SECRET, body.as_bytes());
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header(SIGNATURE_HEADER, sig)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_weather_request_produces_full_report() {
    let h = harness(healthy_source(), RecordingReplier::default(), 5000);

    let resp = h
        .router
        .oneshot(signed(delivery("今天天氣如何", "token-e2e")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let sent = h.replier.sent();
    assert_eq!(sent.len(), 1);
    let (token, reply) = &sent[0];
    assert_eq!(token, "token-e2e");

    assert!(reply.starts_with("📍 宜蘭縣天氣總覽"));
    assert!(reply.contains("🌡 目前氣溫：18°C ~ 22°C"), "{reply}");
    assert!(reply.contains("☁️ 天氣：多雲"), "{reply}");
    assert!(reply.contains("☔ 降雨機率：30%"), "{reply}");
    assert!(reply.contains("🌡 平均氣溫：20.0°C"), "{reply}");
    assert!(reply.contains("🕒 未來 6 小時（每 2 小時）"), "{reply}");
    assert!(reply.contains("📅 未來 5 天"), "{reply}");
    assert!(reply.ends_with("資料來源：中央氣象署"));
    assert!(!reply.contains(APOLOGY));

    let today = now_local().date_naive();
    for d in 0..5u64 {
        let date = today.checked_add_days(Days::new(d)).unwrap();
        let (min, max, rain) = day_values(d);
        let line = format!("{} 晴 {max}°/{min}° ☔{rain}%", date.format("%m/%d"));
        assert!(reply.contains(&line), "missing `{line}` in:\n{reply}");
    }

    let mut datasets: Vec<Dataset> = h.source.calls().iter().map(|(d, _)| *d).collect();
    datasets.sort_by_key(|d| d.to_string());
    assert_eq!(datasets, vec![Dataset::FiveDay, Dataset::NearTerm]);
    assert!(h.source.calls().iter().all(|(_, region)| region == "宜蘭縣"));
}

#[tokio::test]
async fn test_five_day_outage_keeps_near_term_section() {
    let now = now_local();
    let source = StaticSource::new(Some(near_term_payload(now)), None);
    let h = harness(source, RecordingReplier::default(), 5000);

    let resp = h.router.oneshot(signed(delivery("天氣", "t1"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let (_, reply) = &h.replier.sent()[0];
    assert!(reply.contains("☁️ 天氣：多雲"));
    assert!(reply.contains(&format!("📅 未來 5 天\n{APOLOGY}")));
}

#[tokio::test]
async fn test_total_outage_replies_with_apology_only() {
    let h = harness(StaticSource::new(None, None), RecordingReplier::default(), 5000);

    let resp = h.router.oneshot(signed(delivery("天氣", "t1"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(h.replier.sent(), vec![("t1".to_string(), APOLOGY.to_string())]);
}

#[tokio::test]
async fn test_long_reply_is_truncated() {
    let h = harness(healthy_source(), RecordingReplier::default(), 40);

    h.router.oneshot(signed(delivery("天氣", "t1"))).await.unwrap();

    let (_, reply) = &h.replier.sent()[0];
    assert_eq!(reply.chars().count(), 41);
    assert!(reply.ends_with(ELLIPSIS));
    assert!(reply.starts_with("📍 宜蘭縣天氣總覽"));
}

#[tokio::test]
async fn test_unrelated_message_is_ignored() {
    let h = harness(healthy_source(), RecordingReplier::default(), 5000);

    let resp = h.router.oneshot(signed(delivery("早安", "t1"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(h.replier.sent().is_empty());
    assert!(h.source.calls().is_empty());
}

#[tokio::test]
async fn test_forged_signature_is_rejected_before_any_work() {
    let h = harness(healthy_source(), RecordingReplier::default(), 5000);

    let body = delivery("天氣", "t1");
    let req = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header(SIGNATURE_HEADER, sign("not-the-secret", body.as_bytes()))
        .body(Body::from(body))
        .unwrap();

    let resp = h.router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(h.source.calls().is_empty());
    assert!(h.replier.sent().is_empty());
}

#[tokio::test]
async fn test_reply_rejection_still_acknowledges_delivery() {
    let h = harness(healthy_source(), RecordingReplier::failing(), 5000);

    let resp = h.router.oneshot(signed(delivery("天氣", "expired"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(h.replier.sent().len(), 1);
}

#[tokio::test]
async fn test_multiple_events_in_one_delivery() {
    let h = harness(healthy_source(), RecordingReplier::default(), 5000);

    let body = serde_json::json!({
        "events": [
            {"type": "message", "replyToken": "a",
             "message": {"type": "text", "text": "天氣"}},
            {"type": "message", "replyToken": "b",
             "message": {"type": "sticker", "packageId": "1"}},
            {"type": "follow", "replyToken": "c"},
            {"type": "message", "replyToken": "d",
             "message": {"type": "text", "text": "明天天氣？"}}
        ]
    })
    .to_string();

    let resp = h.router.oneshot(signed(body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let mut tokens: Vec<String> = h.replier.sent().into_iter().map(|(t, _)| t).collect();
    tokens.sort();
    assert_eq!(tokens, vec!["a".to_string(), "d".to_string()]);
}
