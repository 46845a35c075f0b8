use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;

/// The verified caller of a protected route.
///
/// `AuthMiddleware` places this in the request extensions once the token and
/// its session have both been checked. Handlers receive it as an argument.
///
/// If it is missing, the route was reached without passing through the
/// middleware, and the request is refused with `403 Forbidden`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    /// The `jti` of the token, i.e. the key of the live session.
    pub session_id: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>().cloned() {
            Some(user) => ready(Ok(user)),
            None => {
                log::error!(
                    "[AuthenticatedUser] no verified identity on request to {}",
                    req.path()
                );
                ready(Err(AppError::Forbidden("forbidden access".into()).into()))
            }
        }
    }
}
