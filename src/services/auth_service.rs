use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    audit,
    config::JwtConfig,
    dto::auth::{
        Claims, LoginRequest, LoginResponse, RefreshRequest, RegisterRequest, TokenPair,
        TokenType, VerifyResponse,
    },
    entity::users::{
        ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::UserProfile,
    response::{ApiResponse, Meta},
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    let RegisterRequest {
        email,
        password,
        first_name,
        last_name,
        phone_number,
        address,
    } = payload;
    let email = email.trim().to_lowercase();

    if email.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(AppError::BadRequest("Email is not valid".to_string()));
    }

    let exists = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exists.is_some() {
        return Err(AppError::BadRequest("Email already exists".to_string()));
    }

    let password_hash = hash_password(&password)?;

    let active = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(password_hash),
        first_name: Set(first_name),
        last_name: Set(last_name),
        phone_number: Set(phone_number),
        address: Set(address),
        is_superuser: Set(false),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let user = active.insert(&state.orm).await?;

    tracing::info!(user_id = %user.id, "user registered");
    audit::record(&state.pool, user.id, "user_register").await;

    Ok(ApiResponse::success(
        "User created successfully",
        profile_from_entity(user),
        Some(Meta::empty()),
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let email = email.trim().to_lowercase();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let user = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into())),
    };

    if !verify_password(&password, &user.password_hash)? {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let tokens = issue_token_pair(&state.jwt, user.id, Utc::now())?;

    tracing::info!(user_id = %user.id, "user logged in");
    audit::record(&state.pool, user.id, "user_login").await;

    Ok(ApiResponse::success(
        "Login successful",
        LoginResponse {
            user: profile_from_entity(user),
            tokens,
        },
        Some(Meta::empty()),
    ))
}

/// Exchanges a refresh token for a new access token and a rotated refresh token.
pub async fn refresh_tokens(
    state: &AppState,
    payload: RefreshRequest,
) -> AppResult<ApiResponse<TokenPair>> {
    let user_id = decode_token(&state.jwt, payload.refresh.trim(), TokenType::Refresh)?;

    let user = Users::find_by_id(user_id).one(&state.orm).await?;
    if user.is_none() {
        return Err(AppError::Unauthorized("User no longer exists".into()));
    }

    let tokens = issue_token_pair(&state.jwt, user_id, Utc::now())?;
    Ok(ApiResponse::success("Token refreshed", tokens, Some(Meta::empty())))
}

pub async fn verify_user(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<VerifyResponse>> {
    let found = Users::find_by_id(user.user_id).one(&state.orm).await?;
    let found = match found {
        Some(u) => u,
        None => return Err(AppError::Unauthorized("User no longer exists".into())),
    };

    Ok(ApiResponse::success(
        "Token is valid",
        VerifyResponse {
            user: profile_from_entity(found),
        },
        Some(Meta::empty()),
    ))
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn issue_token(
    jwt: &JwtConfig,
    user_id: Uuid,
    token_type: TokenType,
    issued_at: DateTime<Utc>,
) -> AppResult<String> {
    let lifetime = match token_type {
        TokenType::Access => Duration::hours(jwt.access_ttl_hours),
        TokenType::Refresh => Duration::days(jwt.refresh_ttl_days),
    };
    let expiration = issued_at
        .checked_add_signed(lifetime)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        token_type,
        iat: issued_at.timestamp().max(0) as usize,
        exp: expiration.timestamp().max(0) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn issue_token_pair(
    jwt: &JwtConfig,
    user_id: Uuid,
    issued_at: DateTime<Utc>,
) -> AppResult<TokenPair> {
    Ok(TokenPair {
        access: issue_token(jwt, user_id, TokenType::Access, issued_at)?,
        refresh: issue_token(jwt, user_id, TokenType::Refresh, issued_at)?,
    })
}

/// Checks signature, expiry and token type, returning the user id.
pub fn decode_token(jwt: &JwtConfig, token: &str, expected: TokenType) -> AppResult<Uuid> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    if decoded.claims.token_type != expected {
        return Err(AppError::Unauthorized("Wrong token type".into()));
    }

    Uuid::parse_str(&decoded.claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))
}

fn profile_from_entity(model: UserModel) -> UserProfile {
    UserProfile {
        id: model.id,
        email: model.email,
        first_name: model.first_name,
        last_name: model.last_name,
        phone_number: model.phone_number,
        address: model.address,
        is_superuser: model.is_superuser,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
