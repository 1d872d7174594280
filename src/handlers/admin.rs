use actix_web::{delete, get, post, put, web::{self, Json}, HttpRequest, HttpResponse};
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::ActionError,
    gateway::{COURSE_DELETE, COURSE_WRITE},
    handlers::session_user,
    models::{
        course::{create_course, delete_course, get_course_by_id, get_user_courses, update_course},
        structure::{get_course_chapters, get_course_lessons, get_lesson, update_lesson},
    },
    schema::{course::{validate_slug, CourseDetail, CourseInput, LessonInput}, ApiResponse},
    utils::slugify,
    GlobalState,
};

/// Explicit slug when given, else one derived from the title.
fn course_slug(course:&CourseInput) -> Result<String, ActionError>{
    let slug = match &course.slug {
        Some(slug) => slug.clone(),
        None => slugify(&course.title),
    };

    validate_slug(&slug).map_err(|_| ActionError::invalid("Invalid data"))?;
    Ok(slug)
}

#[get("/courses")]
async fn get_admin_courses_handler(data:web::Data<GlobalState>, req:HttpRequest) -> Result<HttpResponse, ActionError>{

    let session = session_user(&req)?;

    let courses = get_user_courses(&data.pool, session.id).await
        .map_err(|e| e.or_message("Error while fetching all the courses"))?;

    Ok(HttpResponse::Ok().json(courses))
}

#[post("/courses")]
async fn create_course_handler(data:web::Data<GlobalState>, course:Json<CourseInput>, req:HttpRequest) -> Result<HttpResponse, ActionError>{

    let session = session_user(&req)?;

    data.gateway.protect(COURSE_WRITE, &req, &session.id.to_string()).into_result()?;

    course.validate()?;
    let slug = course_slug(&course)?;

    let created = create_course(&data.pool, session.id, &course, &slug).await?;

    tracing::info!(course = %created.id, %slug, user = %session.id, "course created");
    Ok(HttpResponse::Ok().json(ApiResponse::success("Course created successfully")))
}

#[get("/courses/{course_id}")]
async fn get_course_handler(data:web::Data<GlobalState>, path:web::Path<Uuid>) -> Result<HttpResponse, ActionError>{

    let pool = &data.pool;
    let course_id = path.into_inner();

    let detail = async {
        let course = get_course_by_id(pool, course_id).await?;
        let chapters = get_course_chapters(pool, course_id).await?;
        let lessons = get_course_lessons(pool, course_id).await?;
        Ok::<_, ActionError>(CourseDetail::assemble(course, chapters, lessons))
    }
    .await
    .map_err(|e| e.or_message("Error while fetching the course"))?;

    Ok(HttpResponse::Ok().json(detail))
}

#[put("/courses/{course_id}")]
async fn update_course_handler(data:web::Data<GlobalState>, path:web::Path<Uuid>, course:Json<CourseInput>, req:HttpRequest) -> Result<HttpResponse, ActionError>{

    let session = session_user(&req)?;

    data.gateway.protect(COURSE_WRITE, &req, &session.id.to_string()).into_result()?;

    course.validate()?;
    let slug = course_slug(&course)?;

    let course_id = path.into_inner();
    update_course(&data.pool, course_id, session.id, &course, &slug).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Course edited successfully")))
}

#[delete("/courses/{course_id}")]
async fn delete_course_handler(data:web::Data<GlobalState>, path:web::Path<Uuid>, req:HttpRequest) -> Result<HttpResponse, ActionError>{

    let session = session_user(&req)?;

    data.gateway.protect(COURSE_DELETE, &req, &session.id.to_string()).into_result()?;

    let course_id = path.into_inner();
    delete_course(&data.pool, course_id).await
        .map_err(|e| e.or_message("Failed to delete course"))?;

    tracing::info!(course = %course_id, user = %session.id, "course deleted");
    Ok(HttpResponse::Ok().json(ApiResponse::success("Course deleted successfully")))
}

#[get("/lessons/{lesson_id}")]
async fn get_lesson_handler(data:web::Data<GlobalState>, path:web::Path<Uuid>) -> Result<HttpResponse, ActionError>{

    let lesson = get_lesson(&data.pool, path.into_inner()).await
        .map_err(|e| e.or_message("Error while fetching the lesson"))?;

    Ok(HttpResponse::Ok().json(lesson))
}

#[put("/lessons/{lesson_id}")]
async fn update_lesson_handler(data:web::Data<GlobalState>, path:web::Path<Uuid>, lesson:Json<LessonInput>) -> Result<HttpResponse, ActionError>{

    lesson.validate()?;

    update_lesson(&data.pool, path.into_inner(), &lesson).await
        .map_err(|e| e.or_message("Failed to update lesson"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Lesson updated successfully")))
}
