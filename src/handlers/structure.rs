//! Chapter and lesson endpoints. Every structural change goes through the
//! position reconciler in `models::structure`.

use actix_web::{delete, post, put, web::{self, Json}, HttpResponse};
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::ActionError,
    models::structure::{append_chapter, append_lesson, delete_sibling, reorder_siblings, Parent},
    positions::{PositionError, SiblingKind},
    schema::{course::{CreateChapter, LessonInput, ReorderInput}, ApiResponse},
    GlobalState,
};

#[post("/courses/{course_id}/chapters")]
async fn create_chapter_handler(data:web::Data<GlobalState>, path:web::Path<Uuid>, chapter:Json<CreateChapter>) -> Result<HttpResponse, ActionError>{

    chapter.validate()?;

    let chapter = append_chapter(&data.pool, path.into_inner(), &chapter.title).await
        .map_err(|e| e.or_message("Failed to create chapter"))?;

    tracing::info!(chapter = %chapter.id, position = chapter.position, "chapter created");
    Ok(HttpResponse::Ok().json(ApiResponse::success("Chapter was successfully created")))
}

#[put("/courses/{course_id}/chapters/order")]
async fn reorder_chapters_handler(data:web::Data<GlobalState>, path:web::Path<Uuid>, order:Json<ReorderInput>) -> Result<HttpResponse, ActionError>{

    if order.ids.is_empty() {
        return Err(PositionError::Empty(SiblingKind::Chapter).into());
    }

    reorder_siblings(&data.pool, Parent::course(path.into_inner()), &order.ids).await
        .map_err(|e| e.or_message("Failed to update chapters"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Chapters reordered successfully")))
}

#[delete("/courses/{course_id}/chapters/{chapter_id}")]
async fn delete_chapter_handler(data:web::Data<GlobalState>, path:web::Path<(Uuid, Uuid)>) -> Result<HttpResponse, ActionError>{

    let (course_id, chapter_id) = path.into_inner();

    delete_sibling(&data.pool, Parent::course(course_id), chapter_id).await
        .map_err(|e| e.or_message("Failed to delete chapter"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Deleted chapter successfully")))
}

#[post("/courses/{course_id}/chapters/{chapter_id}/lessons")]
async fn create_lesson_handler(data:web::Data<GlobalState>, path:web::Path<(Uuid, Uuid)>, lesson:Json<LessonInput>) -> Result<HttpResponse, ActionError>{

    lesson.validate()?;

    let (course_id, chapter_id) = path.into_inner();

    let lesson = append_lesson(&data.pool, course_id, chapter_id, &lesson).await
        .map_err(|e| e.or_message("Failed to create lesson"))?;

    tracing::info!(lesson = %lesson.id, position = lesson.position, "lesson created");
    Ok(HttpResponse::Ok().json(ApiResponse::success("Lesson was successfully created")))
}

#[put("/courses/{course_id}/chapters/{chapter_id}/lessons/order")]
async fn reorder_lessons_handler(data:web::Data<GlobalState>, path:web::Path<(Uuid, Uuid)>, order:Json<ReorderInput>) -> Result<HttpResponse, ActionError>{

    if order.ids.is_empty() {
        return Err(PositionError::Empty(SiblingKind::Lesson).into());
    }

    let (course_id, chapter_id) = path.into_inner();

    reorder_siblings(&data.pool, Parent::chapter(course_id, chapter_id), &order.ids).await
        .map_err(|e| e.or_message("Failed to update lessons"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Lessons reordered successfully")))
}

#[delete("/courses/{course_id}/chapters/{chapter_id}/lessons/{lesson_id}")]
async fn delete_lesson_handler(data:web::Data<GlobalState>, path:web::Path<(Uuid, Uuid, Uuid)>) -> Result<HttpResponse, ActionError>{

    let (course_id, chapter_id, lesson_id) = path.into_inner();

    delete_sibling(&data.pool, Parent::chapter(course_id, chapter_id), lesson_id).await
        .map_err(|e| e.or_message("Failed to delete lesson"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Deleted lesson successfully")))
}
