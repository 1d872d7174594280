use actix_web::{get, post, web::{self, Json}, HttpRequest, HttpResponse};
use validator::Validate;

use crate::{errors::ActionError, handlers::session_user, models::{enrollment::get_user_enrollments, user::{create_user, find_user_by_email, Role}}, schema::{user::{CreateUser, EmailAndPassword}, SigninResponse, SignupResponse}, utils::{hash_password, issue_token, verify_password}, GlobalState};

#[post("/signup")]
async fn signup_user(data:web::Data<GlobalState>, user:Json<CreateUser>) -> Result<HttpResponse, ActionError>{

    user.validate()?;

    let password_hash = hash_password(&user.password)
        .map_err(|_e| ActionError::Unknown("Something went wrong !".to_string()))?;

    let email = user.email.trim().to_lowercase();
    let role = if data.config.is_admin_email(&email) { Role::Admin } else { Role::User };

    let id = create_user(&data.pool, &user.name, &email, &password_hash, role).await?;

    tracing::info!(user = %id, ?role, "signed up");
    Ok(HttpResponse::Ok().json(SignupResponse{message:String::from("Signed up successfully"), id}))
}

#[post("/signin")]
async fn signin_user(data:web::Data<GlobalState>, user_data:Json<EmailAndPassword>) -> Result<HttpResponse, ActionError> {

    let email = user_data.email.trim().to_lowercase();

    // throw when user not found
    let user = find_user_by_email(&data.pool, &email).await?
        .ok_or_else(|| ActionError::invalid("Signup first"))?;

    if verify_password(&user_data.password, &user.password).is_err() {
        return Err(ActionError::invalid("Enter Valid Password"));
    }

    let token = issue_token(&user, &data.config.jwt_secret)
        .map_err(|_| ActionError::Unknown("Internal Error".to_string()))?;

    Ok(HttpResponse::Ok().json(SigninResponse{message:String::from("Signed in Successfully"), token}))
}

#[get("")]
async fn user_enrollments(data:web::Data<GlobalState>, req:HttpRequest) -> Result<HttpResponse, ActionError>{

    let session = session_user(&req)?;

    let enrollments = get_user_enrollments(&data.pool, session.id).await
        .map_err(|e| e.or_message("Error while fetching enrollments"))?;

    Ok(HttpResponse::Ok().json(enrollments))
}

#[cfg(test)]
mod tests{
    use actix_web::{http::StatusCode, test};

    use crate::{schema::{ApiResponse, Status}, test_init_app::{init, test_user}};

    use super::*;

    #[actix_web::test]
    async fn test_signup_rejects_short_password(){
        let (app, _state) = init().await;

        let user = CreateUser{
            email: String::from("vk@gmail.com"),
            name: String::from("Iron Man"),
            password: String::from("short"),
        };

        let res = test::TestRequest::post()
        .set_json(user)
        .uri("/api/v1/user/signup")
        .send_request(&app)
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res_body:ApiResponse = test::read_body_json(res).await;
        assert_eq!(res_body.status, Status::Error);
        assert_eq!(res_body.message, "Invalid data");
    }

    #[actix_web::test]
    async fn test_malformed_body_uses_uniform_error(){
        let (app, _state) = init().await;

        let res = test::TestRequest::post()
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{\"email\": 1}")
        .uri("/api/v1/user/signin")
        .send_request(&app)
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let res_body:ApiResponse = test::read_body_json(res).await;
        assert_eq!(res_body.message, "Invalid data");
    }

    #[actix_web::test]
    async fn test_enrollments_require_token(){
        let (app, _state) = init().await;

        let res = test::TestRequest::get()
        .uri("/api/v1/user/enrollments")
        .send_request(&app)
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let res_body:ApiResponse = test::read_body_json(res).await;
        assert_eq!(res_body.message, "Token Not found");
    }

    #[actix_web::test]
    async fn test_enrollments_reject_forged_token(){
        let (app, _state) = init().await;
        let forged = issue_token(&test_user(Role::User), "not-the-secret").unwrap();

        let res = test::TestRequest::get()
        .append_header(("Authorization", forged))
        .uri("/api/v1/user/enrollments")
        .send_request(&app)
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let res_body:ApiResponse = test::read_body_json(res).await;
        assert_eq!(res_body.message, "Invalid token");
    }

    #[actix_web::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_signup_then_signin(){
        let (app, state) = init().await;
        sqlx::migrate!("./migrations").run(&state.pool).await.unwrap();

        let user = CreateUser{
            email: String::from("signin_flow@test.com"),
            name: String::from("Iron Man"),
            password: String::from("THERIYATHU"),
        };

        let res = test::TestRequest::post()
        .set_json(&user)
        .uri("/api/v1/user/signup")
        .send_request(&app)
        .await;
        assert!(res.status().is_success());

        let res = test::TestRequest::post()
        .set_json(&user)
        .uri("/api/v1/user/signup")
        .send_request(&app)
        .await;
        let res_body:ApiResponse = test::read_body_json(res).await;
        assert_eq!(res_body.message, "User exists already with this email");

        let res = test::TestRequest::post()
        .set_json(EmailAndPassword{email: user.email.clone(), password: "IRONMAN".to_string()})
        .uri("/api/v1/user/signin")
        .send_request(&app)
        .await;
        let res_body:ApiResponse = test::read_body_json(res).await;
        assert_eq!(res_body.message, "Enter Valid Password");

        let res = test::TestRequest::post()
        .set_json(EmailAndPassword{email: user.email.clone(), password: user.password.clone()})
        .uri("/api/v1/user/signin")
        .send_request(&app)
        .await;
        let res_body:SigninResponse = test::read_body_json(res).await;
        assert_eq!(&res_body.message, "Signed in Successfully");

        sqlx::query("DELETE FROM user_table WHERE email = $1")
            .bind(&user.email)
            .execute(&state.pool)
            .await
            .unwrap();
    }
}
