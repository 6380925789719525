/// Friend links and direct messages.
/// Message handlers purge expired messages before they read or write anything.

use super::{present, AppState};
use crate::db::models::*;
use crate::db::Database;
use crate::error::ApiError;
use actix_web::{web, HttpResponse};
use chrono::Utc;

/// Link two users in both directions
/// POST /api/add_friend
pub async fn add_friend(
    state: web::Data<AppState>,
    req: web::Json<AddFriendRequest>,
) -> Result<HttpResponse, ApiError> {
    let (Some(user_id), Some(friend_id)) = (present(&req.user_id), present(&req.friend_id)) else {
        return Err(ApiError::MissingFields("User ID and friend ID required"));
    };

    Database::add_friend(&state.pool, user_id, friend_id).await?;

    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}

/// Send a message to a friend
/// POST /api/send_message
pub async fn send_message(
    state: web::Data<AppState>,
    req: web::Json<SendMessageRequest>,
) -> Result<HttpResponse, ApiError> {
    let (Some(sender_id), Some(receiver_id), Some(body)) = (
        present(&req.sender_id),
        present(&req.receiver_id),
        present(&req.message),
    ) else {
        return Err(ApiError::MissingFields("Sender, receiver, and message required"));
    };

    state.retention.enforce(&state.pool).await?;

    if !Database::are_friends(&state.pool, sender_id, receiver_id).await? {
        return Err(ApiError::NotFriends);
    }

    Database::store_message(&state.pool, sender_id, receiver_id, body).await?;

    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}

/// Conversation between two users, oldest first
/// POST /api/messages
pub async fn conversation(
    state: web::Data<AppState>,
    req: web::Json<ConversationRequest>,
) -> Result<HttpResponse, ApiError> {
    let (Some(user_id), Some(friend_id)) = (present(&req.user_id), present(&req.friend_id)) else {
        return Err(ApiError::MissingFields("User ID and friend ID required"));
    };

    state.retention.enforce(&state.pool).await?;

    let since = state.retention.cutoff(Utc::now());
    let messages: Vec<MessageView> = Database::conversation(&state.pool, user_id, friend_id, since)
        .await?
        .into_iter()
        .map(MessageView::from)
        .collect();

    Ok(HttpResponse::Ok().json(messages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BanKeyKind;
    use crate::handlers::json_config;
    use crate::handlers::test_support::state;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    macro_rules! messaging_app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data($state.clone())
                    .app_data(json_config())
                    .route("/api/add_friend", web::post().to(add_friend))
                    .route("/api/send_message", web::post().to(send_message))
                    .route("/api/messages", web::post().to(conversation)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_add_friend_twice_keeps_one_edge_each_way() {
        let state = state(BanKeyKind::Device);
        let app = messaging_app!(state);

        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri("/api/add_friend")
                .set_json(json!({"user_id": "u1", "friend_id": "u2"}))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert!(resp.status().is_success());
        }

        assert_eq!(
            Database::list_friends(&state.pool, "u1").await.expect("Query failed"),
            vec!["u2".to_string()]
        );
        assert_eq!(
            Database::list_friends(&state.pool, "u2").await.expect("Query failed"),
            vec!["u1".to_string()]
        );
    }

    #[actix_web::test]
    async fn test_add_friend_missing_field() {
        let state = state(BanKeyKind::Device);
        let app = messaging_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/add_friend")
            .set_json(json!({"user_id": "u1"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_send_to_stranger_is_rejected_without_write() {
        let state = state(BanKeyKind::Device);
        let app = messaging_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/send_message")
            .set_json(json!({"sender_id": "u1", "receiver_id": "u9", "message": "hey"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 403);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Users are not friends");

        let stored = Database::all_messages(&state.pool, chrono::DateTime::<Utc>::MIN_UTC)
            .await
            .expect("Query failed");
        assert!(stored.is_empty());
    }

    #[actix_web::test]
    async fn test_send_and_read_both_directions() {
        let state = state(BanKeyKind::Device);
        let app = messaging_app!(state);
        Database::add_friend(&state.pool, "u1", "u2").await.expect("Add failed");

        for (from, to, text) in [("u1", "u2", "hi"), ("u2", "u1", "hello back")] {
            let req = test::TestRequest::post()
                .uri("/api/send_message")
                .set_json(json!({"sender_id": from, "receiver_id": to, "message": text}))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert!(resp.status().is_success());
        }

        let req = test::TestRequest::post()
            .uri("/api/messages")
            .set_json(json!({"user_id": "u2", "friend_id": "u1"}))
            .to_request();
        let messages: Vec<MessageView> = test::call_and_read_body_json(&app, req).await;

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, "u1");
        assert_eq!(messages[0].message, "hi");
        assert_eq!(messages[1].sender, "u2");
        assert_eq!(messages[1].message, "hello back");
    }

    #[actix_web::test]
    async fn test_expired_messages_are_not_returned() {
        let state = state(BanKeyKind::Device);
        let app = messaging_app!(state);
        Database::store_message_at(
            &state.pool,
            "u1",
            "u2",
            "ancient",
            Utc::now() - chrono::Duration::hours(25),
        )
        .await
        .expect("Failed to store");

        let req = test::TestRequest::post()
            .uri("/api/messages")
            .set_json(json!({"user_id": "u1", "friend_id": "u2"}))
            .to_request();
        let messages: Vec<MessageView> = test::call_and_read_body_json(&app, req).await;
        assert!(messages.is_empty());

        // The read also purged the row
        let stored = Database::all_messages(&state.pool, chrono::DateTime::<Utc>::MIN_UTC)
            .await
            .expect("Query failed");
        assert!(stored.is_empty());
    }

    #[actix_web::test]
    async fn test_send_message_missing_body() {
        let state = state(BanKeyKind::Device);
        let app = messaging_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/send_message")
            .set_json(json!({"sender_id": "u1", "receiver_id": "u2", "message": ""}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }
}
