use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::{jwt, password};
use crate::db::{self, models::User};
use crate::error::ApiError;
use crate::state::AppState;

// --- Request types ---

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub email: String,
    pub token: String,
}

// --- Handlers ---

/// POST /api/auth/register — Create a user account.
/// The password is stored only as an argon2 hash; hashing runs on the
/// blocking pool alongside the insert.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if req.email.trim().is_empty() || req.password.trim().is_empty() {
        return Err(ApiError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let db = state.db.clone();
    let email = req.email.clone();
    let password = req.password.clone();

    let user_id = tokio::task::spawn_blocking(move || {
        let password_hash = password::hash_password(&password)?;

        let conn = db
            .lock()
            .map_err(|_| ApiError::Storage("DB lock".to_string()))?;

        let user_id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO users (id, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![user_id, email, password_hash, now],
        )
        .map_err(|e| {
            if db::is_unique_violation(&e, "users.email") {
                ApiError::Duplicate("This email is already registered".to_string())
            } else {
                ApiError::Storage(format!("Insert user: {}", e))
            }
        })?;

        Ok::<_, ApiError>(user_id)
    })
    .await??;

    tracing::info!("User registered: {}", req.email);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "userId": user_id,
            "email": req.email,
        })),
    ))
}

/// POST /api/auth/login — Verify credentials and issue a session token.
/// An unknown email and a wrong password return the same generic error so
/// the response does not reveal which of the two failed.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if req.email.trim().is_empty() || req.password.trim().is_empty() {
        return Err(ApiError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let db = state.db.clone();
    let email = req.email.clone();
    let password = req.password.clone();

    let user = tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|_| ApiError::Storage("DB lock".to_string()))?;

        let user = conn
            .query_row(
                "SELECT id, email, password_hash, created_at FROM users WHERE email = ?1",
                [&email],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        password_hash: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => ApiError::InvalidCredentials,
                other => ApiError::Storage(format!("Select user: {}", other)),
            })?;

        if !password::verify_password(&password, &user.password_hash) {
            return Err(ApiError::InvalidCredentials);
        }

        Ok::<_, ApiError>(user)
    })
    .await??;

    let token = jwt::issue_token(&state.jwt_secret, &user.id, &user.email)
        .map_err(|e| ApiError::Storage(format!("Token issuance: {}", e)))?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        email: user.email,
        token,
    }))
}
