use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{errors::{is_unique_violation, ActionError}, schema::course::CourseInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "course_status")]
pub enum CourseStatus{
    Draft,
    Published,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Course{
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub small_description: String,
    pub description: String,
    pub file_key: String,
    pub price: i32,
    pub duration: i32,
    pub level: String,
    pub category: String,
    pub status: CourseStatus,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn slug_conflict(e: sqlx::Error, fallback: &str) -> ActionError {
    if is_unique_violation(&e) {
        ActionError::invalid("A course with this slug already exists")
    } else {
        ActionError::from(e).or_message(fallback)
    }
}

pub async fn create_course(pool:&Pool<Postgres>, user_id:Uuid, course:&CourseInput, slug:&str) -> Result<Course, ActionError>{

    sqlx::query_as::<_, Course>(
        r#"
            INSERT INTO course_table
                (title, slug, small_description, description, file_key, price, duration, level, category, status, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
        "#,
    )
    .bind(&course.title)
    .bind(slug)
    .bind(&course.small_description)
    .bind(&course.description)
    .bind(&course.file_key)
    .bind(course.price)
    .bind(course.duration)
    .bind(course.level.as_str())
    .bind(&course.category)
    .bind(course.status)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .map_err(|e| slug_conflict(e, "Failed to create course"))
}

/// Edits a course owned by `user_id`.
pub async fn update_course(pool:&Pool<Postgres>, course_id:Uuid, user_id:Uuid, course:&CourseInput, slug:&str) -> Result<Course, ActionError>{

    sqlx::query_as::<_, Course>(
        r#"
            UPDATE course_table
            SET title = $1, slug = $2, small_description = $3, description = $4, file_key = $5,
                price = $6, duration = $7, level = $8, category = $9, status = $10, updated_at = now()
            WHERE id = $11 AND user_id = $12
            RETURNING *
        "#,
    )
    .bind(&course.title)
    .bind(slug)
    .bind(&course.small_description)
    .bind(&course.description)
    .bind(&course.file_key)
    .bind(course.price)
    .bind(course.duration)
    .bind(course.level.as_str())
    .bind(&course.category)
    .bind(course.status)
    .bind(course_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| slug_conflict(e, "Failed to edit course"))?
    .ok_or_else(|| ActionError::not_found("Course not found"))
}

/// Chapters, lessons and enrollments go with it through `ON DELETE CASCADE`.
pub async fn delete_course(pool:&Pool<Postgres>, course_id:Uuid) -> Result<(), ActionError>{

    let result = sqlx::query("DELETE FROM course_table WHERE id = $1")
        .bind(course_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ActionError::not_found("Course not found"));
    }

    Ok(())
}

pub async fn get_course_by_id(pool:&Pool<Postgres>, id:Uuid) -> Result<Course, ActionError>{

    sqlx::query_as::<_, Course>(
        r#"
            SELECT * FROM course_table
            WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ActionError::not_found("Course not found"))
}

pub async fn get_published_course_by_slug(pool:&Pool<Postgres>, slug:&str) -> Result<Course, ActionError>{

    sqlx::query_as::<_, Course>(
        r#"
            SELECT * FROM course_table
            WHERE slug = $1 AND status = $2
        "#,
    )
    .bind(slug)
    .bind(CourseStatus::Published)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ActionError::not_found("Course not found"))
}

/// Courses authored by `user_id`, newest first.
pub async fn get_user_courses(pool:&Pool<Postgres>, user_id:Uuid) -> Result<Vec<Course>, ActionError>{

    let courses = sqlx::query_as::<_, Course>(
        r#"
            SELECT * FROM course_table
            WHERE user_id = $1
            ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(courses)
}

pub async fn get_published_courses(pool:&Pool<Postgres>) -> Result<Vec<Course>, ActionError>{

    let courses = sqlx::query_as::<_, Course>(
        r#"
            SELECT * FROM course_table
            WHERE status = $1
            ORDER BY created_at DESC
        "#,
    )
    .bind(CourseStatus::Published)
    .fetch_all(pool)
    .await?;

    Ok(courses)
}
