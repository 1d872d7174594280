pub mod admin;
pub mod course;
pub mod structure;
pub mod upload;
pub mod user;
pub mod webhook;

use actix_web::{get, middleware::from_fn, web::{self, scope}, HttpMessage, HttpRequest, Responder};

use crate::{errors::ActionError, middlewares, schema::SessionUser};

#[get("/health")]
pub async fn health() -> impl Responder{
    "ok"
}

/// The caller placed in the extensions by the auth middlewares.
pub(crate) fn session_user(req:&HttpRequest) -> Result<SessionUser, ActionError>{
    req.extensions()
        .get::<SessionUser>()
        .cloned()
        .ok_or_else(|| ActionError::Unauthorized("Not signed in".to_string()))
}

pub fn routes(cfg: &mut web::ServiceConfig){
    cfg.service(
        scope("/api/v1")
        .app_data(web::JsonConfig::default().error_handler(|err, _req| {
            tracing::debug!(error = %err, "rejected json body");
            ActionError::invalid("Invalid data").into()
        }))
        .app_data(web::PathConfig::default().error_handler(|err, _req| {
            tracing::debug!(error = %err, "rejected path parameter");
            ActionError::invalid("Invalid data").into()
        }))
        .service(health)
        // place this before /user, else the public scope matches first
        .service(
            scope("/user/enrollments")
            .wrap(from_fn(middlewares::user::user_middleware))
            .service(user::user_enrollments)
        )
        .service(
            scope("/user")
            .service(user::signup_user)
            .service(user::signin_user)
        )
        .service(
            scope("/webhooks")
            .service(webhook::stripe_webhook)
        )
        .service(
            scope("/admin")
            .wrap(from_fn(middlewares::admin::admin_middleware))
            .service(admin::get_admin_courses_handler)
            .service(admin::create_course_handler)
            .service(admin::get_course_handler)
            .service(admin::update_course_handler)
            .service(admin::delete_course_handler)
            .service(structure::create_chapter_handler)
            .service(structure::reorder_chapters_handler)
            .service(structure::delete_chapter_handler)
            .service(structure::create_lesson_handler)
            .service(structure::reorder_lessons_handler)
            .service(structure::delete_lesson_handler)
            .service(admin::get_lesson_handler)
            .service(admin::update_lesson_handler)
            .service(upload::presign_upload_handler)
            .service(upload::delete_object_handler)
        )
        .service(
            scope("/courses")
            .service(course::get_published_courses_handler)
            .service(course::get_course_by_slug_handler)
            .service(course::enroll_handler)
        )
    );
}

#[cfg(test)]
mod tests{
    use actix_web::{http::StatusCode, test::{self, TestRequest}};

    use crate::{models::user::Role, schema::{ApiResponse, Status}, test_init_app::{init, token_for}};

    #[actix_web::test]
    async fn test_health(){
        let (app, _state) = crate::test_init_app::init().await;

        let req = TestRequest::get().uri("/api/v1/health").to_request();
        let res = test::call_service(&app, req).await;

        let body_bytes = test::read_body(res).await;
        let body_str = std::str::from_utf8(&body_bytes).unwrap();

        assert_eq!(body_str, "ok");
    }

    #[actix_web::test]
    async fn test_malformed_path_ids_use_uniform_error(){
        let (app, _state) = init().await;

        let res = TestRequest::delete()
        .append_header(("Authorization", token_for(Role::Admin)))
        .uri("/api/v1/admin/courses/not-a-uuid/chapters/also-bad")
        .send_request(&app)
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let res_body:ApiResponse = test::read_body_json(res).await;
        assert_eq!(res_body.status, Status::Error);
        assert_eq!(res_body.message, "Invalid data");

        let res = TestRequest::post()
        .append_header(("Authorization", token_for(Role::User)))
        .uri("/api/v1/courses/not-a-uuid/enroll")
        .send_request(&app)
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let res_body:ApiResponse = test::read_body_json(res).await;
        assert_eq!(res_body.message, "Invalid data");
    }
}
