use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::errors::{is_unique_violation, ActionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role{
    User,
    Admin,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct User{
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: Role,
    pub stripe_customer_id: Option<String>,
}

pub async fn create_user(pool:&Pool<Postgres>, name:&str, email:&str, password_hash:&str, role:Role) -> Result<Uuid, ActionError>{

    let result = sqlx::query_scalar::<_, Uuid>(
        r#"
            INSERT INTO user_table (name, email, password, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await;

    match result {
        Ok(id) => Ok(id),
        Err(e) if is_unique_violation(&e) => Err(ActionError::invalid("User exists already with this email")),
        Err(e) => Err(ActionError::from(e).or_message("Error while creating user")),
    }
}

pub async fn find_user_by_email(pool:&Pool<Postgres>, email:&str) -> Result<Option<User>, ActionError>{

    let user = sqlx::query_as::<_, User>(
        r#"
            SELECT id, name, email, password, role, stripe_customer_id FROM user_table
            WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .map_err(|e| ActionError::from(e).or_message("Error while fetching user by email"))?;

    Ok(user)
}

pub async fn get_user_by_id(pool:&Pool<Postgres>, id:Uuid) -> Result<User, ActionError>{

    sqlx::query_as::<_, User>(
        r#"
            SELECT id, name, email, password, role, stripe_customer_id FROM user_table
            WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| ActionError::from(e).or_message("Error while fetching user"))?
    .ok_or_else(|| ActionError::not_found("User not found"))
}

pub async fn set_stripe_customer_id(conn:&mut PgConnection, id:Uuid, customer_id:&str) -> Result<(), ActionError>{

    sqlx::query(
        r#"
            UPDATE user_table SET stripe_customer_id = $1
            WHERE id = $2
        "#,
    )
    .bind(customer_id)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
