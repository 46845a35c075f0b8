use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{PageParams, TaskInput},
    repository::StoreError,
    response::{ApiResponse, PageMeta},
    state::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use validator::Validate;

/// Tasks are always looked up together with their owner, so a task that
/// belongs to someone else is indistinguishable from one that does not exist.
fn task_lookup_error(error: StoreError) -> AppError {
    match error {
        StoreError::NotFound => AppError::NotFound("task not found".into()),
        other => AppError::from(other),
    }
}

/// Retrieves one page of the authenticated user's tasks.
///
/// ## Query Parameters:
/// - `page` (optional, default 1): 1-based page number.
/// - `limit` (optional, default 10, max 100): page size.
///
/// ## Responses:
/// - `200 OK`: the tasks plus a `meta` object with `limit`, `page`,
///   `perPage`, `pageCount` and `total` (the caller's task count).
/// - `400 Bad Request`: non-numeric query parameters.
/// - `401 Unauthorized`: missing, invalid or revoked token.
/// - `422 Unprocessable Entity`: out-of-range `page` or `limit`.
#[get("")]
pub async fn list_tasks(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    query: web::Query<PageParams>,
) -> Result<impl Responder, AppError> {
    query.validate()?;

    let tasks = state.tasks.list_by_user(caller.user_id, &query).await?;
    let total = state.tasks.count_by_user(caller.user_id).await?;
    let meta = PageMeta::new(&query, tasks.len(), total);

    Ok(HttpResponse::Ok().json(ApiResponse::success("get data success", tasks).with_meta(meta)))
}

/// Creates a new task owned by the authenticated user.
///
/// `status` defaults to `"todo"` when omitted.
///
/// ## Responses:
/// - `201 Created`: the stored task.
/// - `400 Bad Request`: body is not valid JSON for a task.
/// - `401 Unauthorized`: missing, invalid or revoked token.
/// - `422 Unprocessable Entity`: empty or overlong fields.
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = state.tasks.create(caller.user_id, &task_data).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success("created success", task)))
}

/// Retrieves a single task by id. Answers `404` for tasks owned by another user.
#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let task = state
        .tasks
        .find_by_id(path.into_inner(), caller.user_id)
        .await
        .map_err(task_lookup_error)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("get data success", task)))
}

/// Replaces the title, description and status of a task. Bumps `updated_at`.
///
/// This is a full replacement: a body without `status` sets it back to
/// `"todo"`, the same default `create_task` applies.
#[put("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    path: web::Path<i64>,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = state
        .tasks
        .update(path.into_inner(), caller.user_id, &task_data)
        .await
        .map_err(task_lookup_error)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("update data success", task)))
}

#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let deleted = state
        .tasks
        .delete(path.into_inner(), caller.user_id)
        .await
        .map_err(task_lookup_error)?;

    if deleted == 0 {
        return Err(AppError::NotFound("task not found".into()));
    }
    Ok(HttpResponse::Ok().json(ApiResponse::message("delete data success")))
}
