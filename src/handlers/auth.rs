// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::member::{LoginRequest, Member, SignupRequest},
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

/// Registers a new member.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the member object (excluding the password hash).
pub async fn register(
    State(pool): State<PgPool>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let email_taken: Option<(i64,)> = sqlx::query_as("SELECT id FROM members WHERE email = $1")
        .bind(&payload.email)
        .fetch_optional(&pool)
        .await?;

    if email_taken.is_some() {
        return Err(AppError::Conflict(
            "Email already in use. Please use a different email.".to_string(),
        ));
    }

    let hashed_password = hash_password(&payload.password)?;
    let role = payload.role.trim().to_lowercase();

    let member = sqlx::query_as::<_, Member>(
        r#"
        INSERT INTO members (first_name, last_name, email, phone, username, password, role)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, first_name, last_name, email, phone, username, password, role, created_at
        "#,
    )
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&payload.username)
    .bind(&hashed_password)
    .bind(&role)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        // Postgres error code for unique violation is 23505
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict(format!("Username '{}' already exists", payload.username))
        } else {
            tracing::error!("Failed to register member: {:?}", e);
            AppError::from(e)
        }
    })?;

    Ok((StatusCode::CREATED, Json(member)))
}

/// Authenticates a member and returns a JWT token.
///
/// The token carries the member id and role; handlers read both from the
/// request extensions after the auth middleware has verified the token.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let member = sqlx::query_as::<_, Member>(
        r#"
        SELECT id, first_name, last_name, email, phone, username, password, role, created_at
        FROM members
        WHERE username = $1
        "#,
    )
    .bind(&payload.username)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    // Same generic message whether the username or the password is wrong.
    let member = member.ok_or(AppError::AuthError("Invalid login".to_string()))?;

    let is_valid = verify_password(&payload.password, &member.password)?;

    if !is_valid {
        return Err(AppError::AuthError("Invalid login".to_string()));
    }

    let token = sign_jwt(
        member.id,
        &member.role,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "member_id": member.id,
        "first_name": member.first_name,
        "last_name": member.last_name,
        "role": member.role,
    })))
}
