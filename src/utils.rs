use argon2::{
    password_hash::{
        rand_core::OsRng, Error, PasswordHasher, SaltString
    }, Argon2, PasswordHash, PasswordVerifier
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{models::user::User, schema::JWTClaims};

pub fn hash_password(password:&str)->Result<String, Error>{

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2.hash_password(password.as_bytes(), salt.as_salt())?.to_string();
    Ok(password_hash)
}

pub fn verify_password(password:&str, hash:&str)->Result<(), Error>{

    let argon2 = Argon2::default();
    let parsed_hash = PasswordHash::new(hash)?;
    argon2.verify_password(password.as_bytes(), &parsed_hash)?;

    Ok(())
}

/// Signs a session token valid for one day.
pub fn issue_token(user:&User, secret:&str) -> Result<String, jsonwebtoken::errors::Error>{

    let tomorrow = Utc::now() + Duration::days(1);

    let claims = JWTClaims{
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role,
        exp: tomorrow.timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

pub fn decode_token(token:&str, secret:&str) -> Result<JWTClaims, jsonwebtoken::errors::Error>{

    let token = token.strip_prefix("Bearer ").unwrap_or(token);
    let decoded = decode::<JWTClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())?;

    Ok(decoded.claims)
}

/// Lowercase ASCII slug: runs of anything non-alphanumeric collapse to one `-`.
pub fn slugify(title:&str) -> String{

    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests{
    use uuid::Uuid;

    use super::*;
    use crate::models::user::Role;

    #[test]
    fn test_password_round_trip(){
        let hash = hash_password("THERIYATHU").unwrap();
        assert!(verify_password("THERIYATHU", &hash).is_ok());
        assert!(verify_password("IRONMAN", &hash).is_err());
    }

    #[test]
    fn test_token_carries_role(){
        let user = User{
            id: Uuid::new_v4(),
            name: "Iron Man".to_string(),
            email: "vk@gmail.com".to_string(),
            password: String::new(),
            role: Role::Admin,
            stripe_customer_id: None,
        };

        let token = issue_token(&user, "secret").unwrap();
        let claims = decode_token(&format!("Bearer {token}"), "secret").unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.role, Role::Admin);
        assert!(decode_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_slugify(){
        assert_eq!(slugify("Rust for the Web!"), "rust-for-the-web");
        assert_eq!(slugify("  --Hello,   World 2025--  "), "hello-world-2025");
        assert_eq!(slugify("Écoles"), "coles");
    }
}
