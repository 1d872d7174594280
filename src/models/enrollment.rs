use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::errors::ActionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "enrollment_status")]
pub enum EnrollmentStatus{
    Pending,
    Active,
    Cancelled,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Enrollment{
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub amount: i32,
    pub status: EnrollmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What `enroll` has to do given the caller's current enrollment row, if any.
#[derive(Debug, PartialEq, Eq)]
pub enum EnrollStep{
    AlreadyEnrolled,
    Reopen(Uuid),
    Create,
}

pub fn next_step(existing: Option<&Enrollment>) -> EnrollStep {
    match existing {
        Some(enrollment) if enrollment.status == EnrollmentStatus::Active => EnrollStep::AlreadyEnrolled,
        Some(enrollment) => EnrollStep::Reopen(enrollment.id),
        None => EnrollStep::Create,
    }
}

pub async fn find_enrollment_for_update(conn:&mut PgConnection, user_id:Uuid, course_id:Uuid) -> Result<Option<Enrollment>, ActionError>{

    let enrollment = sqlx::query_as::<_, Enrollment>(
        r#"
            SELECT * FROM enrollment_table
            WHERE user_id = $1 AND course_id = $2
            FOR UPDATE
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(enrollment)
}

/// Inserts a pending row, or resets an existing one back to pending at `amount`.
pub async fn upsert_pending(conn:&mut PgConnection, user_id:Uuid, course_id:Uuid, amount:i32) -> Result<Enrollment, ActionError>{

    let enrollment = sqlx::query_as::<_, Enrollment>(
        r#"
            INSERT INTO enrollment_table (user_id, course_id, amount, status)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, course_id)
            DO UPDATE SET amount = EXCLUDED.amount, status = EXCLUDED.status, updated_at = now()
            RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .bind(amount)
    .bind(EnrollmentStatus::Pending)
    .fetch_one(&mut *conn)
    .await?;

    Ok(enrollment)
}

/// Returns `false` when no enrollment has that id.
pub async fn activate_enrollment(pool:&Pool<Postgres>, id:Uuid) -> Result<bool, ActionError>{

    let result = sqlx::query(
        r#"
            UPDATE enrollment_table SET status = $1, updated_at = now()
            WHERE id = $2
        "#,
    )
    .bind(EnrollmentStatus::Active)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn get_user_enrollments(pool:&Pool<Postgres>, user_id:Uuid) -> Result<Vec<Enrollment>, ActionError>{

    let enrollments = sqlx::query_as::<_, Enrollment>(
        r#"
            SELECT * FROM enrollment_table
            WHERE user_id = $1
            ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(enrollments)
}
