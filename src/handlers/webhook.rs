use actix_web::{post, web::{self, Bytes}, HttpRequest, HttpResponse};
use chrono::Utc;

use crate::{
    errors::ActionError,
    models::enrollment::activate_enrollment,
    payments::{verify_webhook_signature, WebhookEvent},
    schema::ApiResponse,
    GlobalState,
};

const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Stripe event sink. Only a completed checkout changes state: the enrollment
/// named in the session metadata becomes active.
#[post("/stripe")]
async fn stripe_webhook(data:web::Data<GlobalState>, req:HttpRequest, body:Bytes) -> Result<HttpResponse, ActionError>{

    let signature = req.headers()
        .get("Stripe-Signature")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ActionError::invalid("Missing signature"))?;

    verify_webhook_signature(&body, signature, &data.config.stripe_webhook_secret, Utc::now().timestamp())
        .map_err(|e| {
            tracing::warn!(error = %e, "webhook signature rejected");
            ActionError::invalid("Invalid signature")
        })?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|_| ActionError::invalid("Invalid data"))?;

    if event.kind == CHECKOUT_COMPLETED {
        let enrollment_id = event.data.object.metadata.enrollment_id
            .ok_or_else(|| ActionError::invalid("Missing enrollment reference"))?;

        let activated = activate_enrollment(&data.pool, enrollment_id).await
            .map_err(|e| e.or_message("Failed to activate enrollment"))?;

        if !activated {
            return Err(ActionError::not_found("Enrollment not found"));
        }

        tracing::info!(enrollment = %enrollment_id, "enrollment activated");
    } else {
        tracing::debug!(kind = %event.kind, "ignored webhook event");
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success("Webhook received")))
}

#[cfg(test)]
mod tests{
    use actix_web::{http::StatusCode, test};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    use uuid::Uuid;

    use crate::{
        models::{
            course::CourseStatus,
            enrollment::{get_user_enrollments, upsert_pending, EnrollmentStatus},
            user::Role,
        },
        schema::Status,
        test_init_app::{cleanup_user, init, seed_course, seed_user},
    };

    use super::*;

    fn sign(payload: &str, secret: &str) -> String {
        let ts = Utc::now().timestamp();
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{ts}.{payload}").as_bytes());
        format!("t={ts},v1={}", hex::encode(mac.finalize().into_bytes()))
    }

    const OTHER_EVENT: &str = r#"{"type":"customer.created","data":{"object":{"id":"cus_1"}}}"#;

    #[actix_web::test]
    async fn test_missing_signature_is_rejected(){
        let (app, _state) = init().await;

        let res = test::TestRequest::post()
        .set_payload(OTHER_EVENT)
        .uri("/api/v1/webhooks/stripe")
        .send_request(&app)
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let res_body:ApiResponse = test::read_body_json(res).await;
        assert_eq!(res_body.message, "Missing signature");
    }

    #[actix_web::test]
    async fn test_wrong_secret_is_rejected(){
        let (app, _state) = init().await;

        let res = test::TestRequest::post()
        .append_header(("Stripe-Signature", sign(OTHER_EVENT, "whsec_other")))
        .set_payload(OTHER_EVENT)
        .uri("/api/v1/webhooks/stripe")
        .send_request(&app)
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let res_body:ApiResponse = test::read_body_json(res).await;
        assert_eq!(res_body.message, "Invalid signature");
    }

    #[actix_web::test]
    async fn test_unrelated_event_is_acknowledged(){
        let (app, state) = init().await;

        let res = test::TestRequest::post()
        .append_header(("Stripe-Signature", sign(OTHER_EVENT, &state.config.stripe_webhook_secret)))
        .set_payload(OTHER_EVENT)
        .uri("/api/v1/webhooks/stripe")
        .send_request(&app)
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let res_body:ApiResponse = test::read_body_json(res).await;
        assert_eq!(res_body.status, Status::Success);
        assert_eq!(res_body.message, "Webhook received");
    }

    #[actix_web::test]
    async fn test_checkout_without_reference_is_rejected(){
        let (app, state) = init().await;
        let payload = r#"{"type":"checkout.session.completed","data":{"object":{"metadata":{}}}}"#;

        let res = test::TestRequest::post()
        .append_header(("Stripe-Signature", sign(payload, &state.config.stripe_webhook_secret)))
        .set_payload(payload)
        .uri("/api/v1/webhooks/stripe")
        .send_request(&app)
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    fn checkout_completed(enrollment_id: Uuid) -> String {
        format!(r#"{{"type":"checkout.session.completed","data":{{"object":{{"metadata":{{"enrollmentId":"{enrollment_id}"}}}}}}}}"#)
    }

    #[actix_web::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_completed_checkout_activates_enrollment(){
        let (app, state) = init().await;
        let pool = &state.pool;
        sqlx::migrate!("./migrations").run(pool).await.unwrap();

        let owner = seed_user(pool, Role::Admin).await;
        let course = seed_course(pool, owner.id, "Webhook Course", CourseStatus::Published).await;
        let buyer = seed_user(pool, Role::User).await;

        let mut conn = pool.acquire().await.unwrap();
        let enrollment = upsert_pending(&mut conn, buyer.id, course.id, course.price).await.unwrap();
        drop(conn);
        assert_eq!(enrollment.status, EnrollmentStatus::Pending);

        let payload = checkout_completed(enrollment.id);
        let res = test::TestRequest::post()
        .append_header(("Stripe-Signature", sign(&payload, &state.config.stripe_webhook_secret)))
        .set_payload(payload)
        .uri("/api/v1/webhooks/stripe")
        .send_request(&app)
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let res_body:ApiResponse = test::read_body_json(res).await;
        assert_eq!(res_body.message, "Webhook received");

        let enrollments = get_user_enrollments(pool, buyer.id).await.unwrap();
        assert_eq!(enrollments.len(), 1);
        assert_eq!(enrollments[0].status, EnrollmentStatus::Active);

        let payload = checkout_completed(Uuid::new_v4());
        let res = test::TestRequest::post()
        .append_header(("Stripe-Signature", sign(&payload, &state.config.stripe_webhook_secret)))
        .set_payload(payload)
        .uri("/api/v1/webhooks/stripe")
        .send_request(&app)
        .await;

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let res_body:ApiResponse = test::read_body_json(res).await;
        assert_eq!(res_body.message, "Enrollment not found");

        cleanup_user(pool, buyer.id).await;
        cleanup_user(pool, owner.id).await;
    }
}
