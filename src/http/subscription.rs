//! Telegram channel-subscription probe.
//!
//! A thin pass-through to the Bot API `getChatMember` call. Telegram-side
//! failures (unknown user, bot not admin) report `isSubscribed: false`
//! with a 200 so the client treats them as "not subscribed" rather than
//! an outage.

use actix_web::{get, web, HttpResponse, Responder};
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::json;
use std::env;

static HTTP: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

#[derive(Deserialize)]
struct ChatMemberResponse {
    ok: bool,
    result: Option<ChatMember>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct ChatMember {
    status: String,
}

fn counts_as_subscribed(status: &str) -> bool {
    matches!(status, "creator" | "administrator" | "member")
}

/// GET /api/check-subscription/{user_id}
#[get("/check-subscription/{user_id}")]
pub async fn check_subscription(path: web::Path<i64>) -> impl Responder {
    let user_id = path.into_inner();

    let (token, channel) = match (
        env::var("TELEGRAM_BOT_TOKEN"),
        env::var("TELEGRAM_CHANNEL_ID"),
    ) {
        (Ok(t), Ok(c)) => (t, c),
        _ => {
            log::warn!("subscription check skipped: bot token or channel id not configured");
            return HttpResponse::Ok().json(json!({
                "status": "success",
                "isSubscribed": false,
                "error": "subscription check not configured",
            }));
        }
    };

    let url = format!(
        "https://api.telegram.org/bot{token}/getChatMember?chat_id={channel}&user_id={user_id}"
    );

    let reply = match HTTP.get(&url).send().await {
        Ok(resp) => resp.json::<ChatMemberResponse>().await,
        Err(e) => Err(e),
    };

    match reply {
        Ok(data) if data.ok => {
            let status = data.result.map(|m| m.status).unwrap_or_default();
            let subscribed = counts_as_subscribed(&status);
            HttpResponse::Ok().json(json!({
                "status": "success",
                "isSubscribed": subscribed,
                "subscriptionStatus": status,
            }))
        }
        Ok(data) => HttpResponse::Ok().json(json!({
            "status": "success",
            "isSubscribed": false,
            "error": data.description,
        })),
        Err(e) => {
            log::error!("subscription check for {user_id} failed: {e}");
            HttpResponse::InternalServerError().json(json!({
                "status": "error",
                "message": "Subscription check failed",
                "error": e.to_string(),
            }))
        }
    }
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(check_subscription);
}

#[cfg(test)]
mod tests {
    use super::counts_as_subscribed;

    #[test]
    fn member_statuses() {
        assert!(counts_as_subscribed("member"));
        assert!(counts_as_subscribed("creator"));
        assert!(counts_as_subscribed("administrator"));
        assert!(!counts_as_subscribed("left"));
        assert!(!counts_as_subscribed("kicked"));
        assert!(!counts_as_subscribed(""));
    }
}
