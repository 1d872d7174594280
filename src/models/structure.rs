//! Chapters and lessons, and the transactional side of the position reconciler.

use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::{
    errors::ActionError,
    positions::{next_position, plan_delete, plan_reorder, PositionUpdate, Sibling, SiblingKind},
    schema::course::LessonInput,
};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Chapter{
    pub id: Uuid,
    pub title: String,
    pub position: i32,
    pub course_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lesson{
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_key: Option<String>,
    pub video_key: Option<String>,
    pub position: i32,
    pub chapter_id: Uuid,
}

/// The row whose children are being ordered.
///
/// For chapters `id == course_id`; for lessons `id` is the chapter, which must
/// belong to `course_id`.
#[derive(Debug, Clone, Copy)]
pub struct Parent{
    pub kind: SiblingKind,
    pub id: Uuid,
    pub course_id: Uuid,
}

impl Parent {
    pub fn course(course_id: Uuid) -> Self {
        Parent { kind: SiblingKind::Chapter, id: course_id, course_id }
    }

    pub fn chapter(course_id: Uuid, chapter_id: Uuid) -> Self {
        Parent { kind: SiblingKind::Lesson, id: chapter_id, course_id }
    }
}

/// Locks the parent row for the rest of the transaction so structural changes
/// on the same sibling set run one after another. `NO KEY UPDATE` leaves the
/// key-share locks of foreign-key inserts (enrollments, new children) unblocked.
async fn lock_parent(conn: &mut PgConnection, parent: Parent) -> Result<(), ActionError> {
    let locked = match parent.kind {
        SiblingKind::Chapter => {
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM course_table WHERE id = $1 FOR NO KEY UPDATE")
                .bind(parent.id)
                .fetch_optional(&mut *conn)
                .await?
        }
        SiblingKind::Lesson => {
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM chapter_table WHERE id = $1 AND course_id = $2 FOR NO KEY UPDATE")
                .bind(parent.id)
                .bind(parent.course_id)
                .fetch_optional(&mut *conn)
                .await?
        }
    };

    locked
        .map(|_| ())
        .ok_or_else(|| ActionError::not_found(format!("{} not found", parent.kind.parent())))
}

async fn max_position(conn: &mut PgConnection, parent: Parent) -> Result<Option<i32>, ActionError> {
    let query = format!(
        "SELECT MAX(position) FROM {} WHERE {} = $1",
        parent.kind.table(),
        parent.kind.parent_column()
    );

    let max = sqlx::query_scalar::<_, Option<i32>>(&query)
        .bind(parent.id)
        .fetch_one(&mut *conn)
        .await?;

    Ok(max)
}

async fn siblings(conn: &mut PgConnection, parent: Parent) -> Result<Vec<Sibling>, ActionError> {
    let query = format!(
        "SELECT id, position FROM {} WHERE {} = $1 ORDER BY position ASC",
        parent.kind.table(),
        parent.kind.parent_column()
    );

    let rows = sqlx::query_as::<_, Sibling>(&query)
        .bind(parent.id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows)
}

async fn apply_positions(conn: &mut PgConnection, parent: Parent, updates: &[PositionUpdate]) -> Result<(), ActionError> {
    let query = format!(
        "UPDATE {} SET position = $1 WHERE id = $2 AND {} = $3",
        parent.kind.table(),
        parent.kind.parent_column()
    );

    for update in updates {
        sqlx::query(&query)
            .bind(update.position)
            .bind(update.id)
            .bind(parent.id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

pub async fn append_chapter(pool:&Pool<Postgres>, course_id:Uuid, title:&str) -> Result<Chapter, ActionError>{
    let parent = Parent::course(course_id);
    let mut tx = pool.begin().await?;

    lock_parent(&mut tx, parent).await?;
    let position = next_position(max_position(&mut tx, parent).await?);

    let chapter = sqlx::query_as::<_, Chapter>(
        r#"
            INSERT INTO chapter_table (title, position, course_id)
            VALUES ($1, $2, $3)
            RETURNING id, title, position, course_id
        "#,
    )
    .bind(title)
    .bind(position)
    .bind(course_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(chapter)
}

pub async fn append_lesson(pool:&Pool<Postgres>, course_id:Uuid, chapter_id:Uuid, lesson:&LessonInput) -> Result<Lesson, ActionError>{
    let parent = Parent::chapter(course_id, chapter_id);
    let mut tx = pool.begin().await?;

    lock_parent(&mut tx, parent).await?;
    let position = next_position(max_position(&mut tx, parent).await?);

    let lesson = sqlx::query_as::<_, Lesson>(
        r#"
            INSERT INTO lesson_table (title, description, thumbnail_key, video_key, position, chapter_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, thumbnail_key, video_key, position, chapter_id
        "#,
    )
    .bind(&lesson.title)
    .bind(&lesson.description)
    .bind(&lesson.thumbnail_key)
    .bind(&lesson.video_key)
    .bind(position)
    .bind(chapter_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(lesson)
}

/// Removes one child and closes the gap it leaves, in one transaction.
pub async fn delete_sibling(pool:&Pool<Postgres>, parent:Parent, id:Uuid) -> Result<(), ActionError>{
    let mut tx = pool.begin().await?;

    lock_parent(&mut tx, parent).await?;
    let current = siblings(&mut tx, parent).await?;
    let updates = plan_delete(parent.kind, &current, id)?;

    let query = format!(
        "DELETE FROM {} WHERE id = $1 AND {} = $2",
        parent.kind.table(),
        parent.kind.parent_column()
    );
    sqlx::query(&query)
        .bind(id)
        .bind(parent.id)
        .execute(&mut *tx)
        .await?;

    apply_positions(&mut tx, parent, &updates).await?;

    tx.commit().await?;
    tracing::info!(kind = %parent.kind, %id, parent = %parent.id, shifted = updates.len(), "deleted");
    Ok(())
}

/// Rewrites every child position from `ordered`, in one transaction.
pub async fn reorder_siblings(pool:&Pool<Postgres>, parent:Parent, ordered:&[Uuid]) -> Result<(), ActionError>{
    let mut tx = pool.begin().await?;

    lock_parent(&mut tx, parent).await?;
    let current = siblings(&mut tx, parent).await?;
    let updates = plan_reorder(parent.kind, &current, ordered)?;

    apply_positions(&mut tx, parent, &updates).await?;

    tx.commit().await?;
    tracing::info!(kind = %parent.kind, parent = %parent.id, count = updates.len(), "reordered");
    Ok(())
}

pub async fn get_course_chapters(pool:&Pool<Postgres>, course_id:Uuid) -> Result<Vec<Chapter>, ActionError>{

    let chapters = sqlx::query_as::<_, Chapter>(
        r#"
            SELECT id, title, position, course_id FROM chapter_table
            WHERE course_id = $1
            ORDER BY position ASC
        "#,
    )
    .bind(course_id)
    .fetch_all(pool)
    .await?;

    Ok(chapters)
}

/// All lessons of a course, ordered by chapter position then lesson position.
pub async fn get_course_lessons(pool:&Pool<Postgres>, course_id:Uuid) -> Result<Vec<Lesson>, ActionError>{

    let lessons = sqlx::query_as::<_, Lesson>(
        r#"
            SELECT l.id, l.title, l.description, l.thumbnail_key, l.video_key, l.position, l.chapter_id
            FROM lesson_table l
            JOIN chapter_table c ON c.id = l.chapter_id
            WHERE c.course_id = $1
            ORDER BY c.position ASC, l.position ASC
        "#,
    )
    .bind(course_id)
    .fetch_all(pool)
    .await?;

    Ok(lessons)
}

pub async fn get_lesson(pool:&Pool<Postgres>, id:Uuid) -> Result<Lesson, ActionError>{

    sqlx::query_as::<_, Lesson>(
        r#"
            SELECT id, title, description, thumbnail_key, video_key, position, chapter_id FROM lesson_table
            WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ActionError::not_found("Lesson not found"))
}

/// Content edit only; position is owned by the reconciler.
pub async fn update_lesson(pool:&Pool<Postgres>, id:Uuid, lesson:&LessonInput) -> Result<Lesson, ActionError>{

    sqlx::query_as::<_, Lesson>(
        r#"
            UPDATE lesson_table
            SET title = $1, description = $2, thumbnail_key = $3, video_key = $4
            WHERE id = $5
            RETURNING id, title, description, thumbnail_key, video_key, position, chapter_id
        "#,
    )
    .bind(&lesson.title)
    .bind(&lesson.description)
    .bind(&lesson.thumbnail_key)
    .bind(&lesson.video_key)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ActionError::not_found("Lesson not found"))
}
