use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{http, web, HttpMessage, HttpRequest, HttpResponse, Responder};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::{error, info};
use mongodb::bson::doc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::user::User;

pub const SESSION_COOKIE: &str = "session";
pub const NOT_AUTHENTICATED: &str = "Not authenticated";

const SESSION_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub error: Option<String>,
}

// JWT Creation
pub fn create_jwt(user_id: &str, secret: &str) -> String {
    let expiration = Utc::now() + Duration::hours(SESSION_HOURS);
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration.timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .unwrap()
}

// JWT Validation
pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::hours(SESSION_HOURS))
        .finish()
}

pub fn clear_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .finish();
    cookie.make_removal();
    cookie
}

/// Pulls the session token off a request: the session cookie first, then a
/// bearer token so API clients can skip the cookie jar.
pub fn session_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }
    let header = req.headers().get(http::header::AUTHORIZATION)?;
    let value = header.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

/// The user id the route gate stashed in request extensions. Handlers
/// re-check this on every call rather than trusting the gate alone.
pub fn current_user(req: &HttpRequest) -> Option<String> {
    req.extensions().get::<String>().cloned()
}

// Signup Endpoint
pub async fn signup(
    data: web::Data<AppState>,
    payload: web::Json<SignupRequest>,
) -> impl Responder {
    let users = data.mongodb.users();

    match users.find_one(doc! { "email": &payload.email }).await {
        Ok(Some(_)) => {
            return HttpResponse::Conflict().json(SessionResponse {
                user_id: None,
                error: Some("User already registered".to_string()),
            });
        }
        Ok(None) => {}
        Err(e) => {
            error!("Error checking for existing user: {}", e);
            return HttpResponse::InternalServerError().json(SessionResponse {
                user_id: None,
                error: Some(e.to_string()),
            });
        }
    }

    let hashed_password = match hash(&payload.password, DEFAULT_COST) {
        Ok(h) => h,
        Err(_) => {
            return HttpResponse::InternalServerError().json(SessionResponse {
                user_id: None,
                error: Some("Error hashing password".to_string()),
            });
        }
    };

    let new_user = User {
        user_id: Uuid::new_v4().to_string(),
        email: payload.email.clone(),
        password: hashed_password,
        created_at: Utc::now(),
    };

    match users.insert_one(&new_user).await {
        Ok(_) => {
            info!("User registered: {}", new_user.user_id);
            // A fresh signup is signed in immediately, same as login.
            let token = create_jwt(&new_user.user_id, &data.config.jwt_secret);
            HttpResponse::Ok()
                .cookie(session_cookie(token))
                .json(SessionResponse {
                    user_id: Some(new_user.user_id.clone()),
                    error: None,
                })
        }
        Err(e) => {
            error!("Error creating user: {}", e);
            HttpResponse::InternalServerError().json(SessionResponse {
                user_id: None,
                error: Some(e.to_string()),
            })
        }
    }
}

// Login Endpoint
pub async fn login(data: web::Data<AppState>, payload: web::Json<LoginRequest>) -> impl Responder {
    let users = data.mongodb.users();
    let user_doc = users.find_one(doc! { "email": &payload.email }).await;

    match user_doc {
        Ok(Some(user)) => {
            if verify(&payload.password, &user.password).unwrap_or(false) {
                let token = create_jwt(&user.user_id, &data.config.jwt_secret);
                HttpResponse::Ok()
                    .cookie(session_cookie(token))
                    .json(SessionResponse {
                        user_id: Some(user.user_id),
                        error: None,
                    })
            } else {
                // Wrong password and unknown email answer the same.
                HttpResponse::Unauthorized().json(SessionResponse {
                    user_id: None,
                    error: Some("Invalid credentials".to_string()),
                })
            }
        }
        Ok(None) => HttpResponse::Unauthorized().json(SessionResponse {
            user_id: None,
            error: Some("Invalid credentials".to_string()),
        }),
        Err(e) => {
            error!("Error logging in: {}", e);
            HttpResponse::InternalServerError().json(SessionResponse {
                user_id: None,
                error: Some(e.to_string()),
            })
        }
    }
}

// Logout Endpoint
pub async fn logout(req: HttpRequest, data: web::Data<AppState>) -> impl Responder {
    let valid = session_token(&req)
        .map(|token| validate_jwt(&token, &data.config.jwt_secret).is_ok())
        .unwrap_or(false);

    if !valid {
        // A second sign-out has no session left to terminate; report it
        // instead of crashing.
        return HttpResponse::Unauthorized().json(LogoutResponse {
            error: Some(NOT_AUTHENTICATED.to_string()),
        });
    }

    HttpResponse::Ok()
        .cookie(clear_session_cookie())
        .json(LogoutResponse { error: None })
}
