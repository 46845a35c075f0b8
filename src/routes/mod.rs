pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::{error, web};

use crate::auth::{AuthMiddleware, Authenticator};
use crate::error::AppError;

/// Registers the versioned API. `/register` and `/login` are open; `/logout`
/// and everything under `/tasks` pass through [`AuthMiddleware`] first.
pub fn config(authenticator: Authenticator) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
            log::debug!("rejected request body: {}", err);
            AppError::BadRequest(err.to_string()).into()
        }))
        .app_data(web::PathConfig::default().error_handler(|_err: error::PathError, _req| {
            AppError::BadRequest("invalid path param id".into()).into()
        }))
        .app_data(web::QueryConfig::default().error_handler(|_err: error::QueryPayloadError, _req| {
            AppError::BadRequest("invalid query param request".into()).into()
        }))
        .service(auth::register)
        .service(auth::login)
        .service(
            web::scope("/logout")
                .wrap(AuthMiddleware::new(authenticator.clone()))
                .service(auth::logout),
        )
        .service(
            web::scope("/tasks")
                .wrap(AuthMiddleware::new(authenticator))
                .service(tasks::list_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        );
    }
}
