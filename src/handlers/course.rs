use actix_web::{get, http::header, post, web, HttpRequest, HttpResponse};
use uuid::Uuid;

use crate::{
    errors::ActionError,
    gateway::ENROLL,
    handlers::session_user,
    models::{
        course::{get_course_by_id, get_published_course_by_slug, get_published_courses},
        enrollment::{find_enrollment_for_update, next_step, upsert_pending, EnrollStep},
        structure::{get_course_chapters, get_course_lessons},
        user::{get_user_by_id, set_stripe_customer_id},
    },
    payments::{CheckoutRefs, PaymentError},
    schema::{course::CourseDetail, ApiResponse},
    GlobalState,
};

#[get("")]
pub async fn get_published_courses_handler(data:web::Data<GlobalState>) -> Result<HttpResponse, ActionError> {

    let courses = get_published_courses(&data.pool).await
        .map_err(|e| e.or_message("Error while fetching all the courses"))?;

    Ok(HttpResponse::Ok().json(courses))
}

#[get("/{slug}")]
pub async fn get_course_by_slug_handler(data:web::Data<GlobalState>, path:web::Path<String>) -> Result<HttpResponse, ActionError> {

    let pool = &data.pool;
    let slug = path.into_inner();

    let detail = async {
        let course = get_published_course_by_slug(pool, &slug).await?;
        let chapters = get_course_chapters(pool, course.id).await?;
        let lessons = get_course_lessons(pool, course.id).await?;
        Ok::<_, ActionError>(CourseDetail::assemble(course, chapters, lessons))
    }
    .await
    .map_err(|e| e.or_message("Error while fetching the course"))?;

    Ok(HttpResponse::Ok().json(detail))
}

fn payment_failure(e: PaymentError) -> ActionError {
    tracing::error!(error = %e, "payment provider call failed");
    ActionError::ExternalService("Payment system error. Please try again later.".to_string())
}

/// Checkout URL for a new pending enrollment, or `None` when the user already owns the course.
async fn start_checkout(data:&GlobalState, user_id:Uuid, course_id:Uuid) -> Result<Option<String>, ActionError> {

    let course = get_course_by_id(&data.pool, course_id).await?;
    let user = get_user_by_id(&data.pool, user_id).await?;

    // the customer outlives a failed checkout, so it is stored outside the transaction
    let customer_id = match user.stripe_customer_id {
        Some(customer_id) => customer_id,
        None => {
            let customer_id = data.stripe.create_customer(&user.email, &user.name, user.id).await
                .map_err(payment_failure)?;
            let mut conn = data.pool.acquire().await?;
            set_stripe_customer_id(&mut conn, user.id, &customer_id).await?;
            customer_id
        }
    };

    // the enrollment row stays locked until the checkout session exists
    let mut tx = data.pool.begin().await?;

    let existing = find_enrollment_for_update(&mut tx, user.id, course.id).await?;
    match next_step(existing.as_ref()) {
        EnrollStep::AlreadyEnrolled => return Ok(None),
        EnrollStep::Reopen(id) => tracing::debug!(enrollment = %id, "reopening enrollment"),
        EnrollStep::Create => {}
    }

    let enrollment = upsert_pending(&mut tx, user.id, course.id, course.price).await?;

    let refs = CheckoutRefs{
        user_id: user.id,
        course_id: course.id,
        enrollment_id: enrollment.id,
    };
    let checkout_url = data.stripe.create_checkout_session(&customer_id, &refs).await
        .map_err(payment_failure)?;

    tx.commit().await?;

    tracing::info!(enrollment = %enrollment.id, course = %course.id, user = %user.id, "checkout started");
    Ok(Some(checkout_url))
}

#[post("/{course_id}/enroll", wrap = "actix_web::middleware::from_fn(crate::middlewares::user::user_middleware)")]
pub async fn enroll_handler(data:web::Data<GlobalState>, path:web::Path<Uuid>, req:HttpRequest) -> Result<HttpResponse, ActionError> {

    let session = session_user(&req)?;

    data.gateway.protect(ENROLL, &req, &session.id.to_string()).into_result()?;

    let course_id = path.into_inner();

    let checkout = start_checkout(&data, session.id, course_id).await
        .map_err(|e| e.or_message("Failed to enroll in course"))?;

    match checkout {
        Some(url) => Ok(HttpResponse::SeeOther().insert_header((header::LOCATION, url)).finish()),
        None => Ok(HttpResponse::Ok().json(ApiResponse::success("You're already enrolled in this course"))),
    }
}
