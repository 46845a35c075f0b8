use crate::{
    auth::{AuthenticatedUser, LoginRequest, RegisterRequest},
    error::AppError,
    response::ApiResponse,
    state::AppState,
};
use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

/// Register a new user
///
/// Creates the account, opens a session and returns its token.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let response = state.auth.register(register_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Login user
///
/// Authenticates a user and returns a token bound to a new session.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let response = state.auth.login(login_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Logout user
///
/// Ends the session behind the presented token. The token is refused from
/// then on, even though its signature remains valid.
#[post("")]
pub async fn logout(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    state.auth.logout(&caller).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("logout successful")))
}
