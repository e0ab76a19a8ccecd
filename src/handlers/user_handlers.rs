use crate::error::AppError;
use crate::middleware::csrf::{get_or_create_csrf_token, validate_csrf_form_field};
use crate::models::{Role, SortDirection, User};
use crate::services::user_service::{CreateUserRequest, UpdateUserRequest, UserServiceError};
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Form, Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::str::FromStr;
use tower_sessions::Session;

#[derive(Template)]
#[template(path = "users/index.html")]
struct UsersIndexTemplate {
    users: Vec<User>,
    total_rows: i64,
    current_page: i64,
    page_size: i64,
    order_by: String,
    direction: String,
    total_pages: i64,
    has_prev: bool,
    has_next: bool,
    prev_page: i64,
    next_page: i64,
    id_dir: String,
    name_dir: String,
    email_dir: String,
    csrf_token: String,
}

#[derive(Template)]
#[template(path = "users/new.html")]
struct NewUserTemplate {
    error: String,
    name: String,
    email: String,
    role: String,
    csrf_token: String,
}

#[derive(Template)]
#[template(path = "users/edit.html")]
struct EditUserTemplate {
    error: String,
    id: i64,
    name: String,
    email: String,
    role: String,
    csrf_token: String,
}

fn default_page() -> i64 {
    1
}

fn default_size() -> i64 {
    10
}

fn default_order() -> String {
    "id".to_string()
}

fn default_direction() -> String {
    "asc".to_string()
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    page: i64,
    #[serde(default = "default_size")]
    size: i64,
    #[serde(default = "default_order")]
    order: String,
    #[serde(default = "default_direction")]
    direction: String,
}

#[derive(Deserialize)]
pub struct UserForm {
    name: String,
    email: String,
    password: String,
    role: String,
    csrf_token: String,
}

#[derive(Deserialize)]
pub struct DeleteForm {
    csrf_token: String,
}

fn render<T: Template>(template: T) -> Html<String> {
    Html(
        template
            .render()
            .unwrap_or_else(|_| "<html><body><h1>Template error</h1></body></html>".to_string()),
    )
}

/// Direction a column-header link should request: clicking the active
/// ascending column flips to descending, anything else starts ascending.
fn header_direction(column: &str, order_by: &str, direction: SortDirection) -> String {
    if order_by == column && direction == SortDirection::Asc {
        "desc".to_string()
    } else {
        "asc".to_string()
    }
}

pub async fn list_users(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, AppError> {
    let paged = state
        .user_service
        .get_users(query.page, query.size, &query.order, &query.direction)
        .await?;

    let csrf_token = get_or_create_csrf_token(&session)
        .await
        .unwrap_or_else(|_| String::from("error"));

    let order_by = paged.order_by.to_string();

    Ok(render(UsersIndexTemplate {
        total_rows: paged.total_rows,
        current_page: paged.current_page,
        page_size: paged.page_size,
        direction: paged.direction.to_string(),
        total_pages: paged.total_pages(),
        has_prev: paged.has_prev(),
        has_next: paged.has_next(),
        prev_page: paged.current_page - 1,
        next_page: paged.current_page + 1,
        id_dir: header_direction("id", &order_by, paged.direction),
        name_dir: header_direction("name", &order_by, paged.direction),
        email_dir: header_direction("email", &order_by, paged.direction),
        order_by,
        users: paged.data,
        csrf_token,
    }))
}

pub async fn new_user_page(session: Session) -> Html<String> {
    let csrf_token = get_or_create_csrf_token(&session)
        .await
        .unwrap_or_else(|_| String::from("error"));

    render(NewUserTemplate {
        error: String::new(),
        name: String::new(),
        email: String::new(),
        role: "guest".to_string(),
        csrf_token,
    })
}

async fn new_user_error(msg: &str, form: &UserForm, session: &Session) -> Html<String> {
    let csrf_token = get_or_create_csrf_token(session)
        .await
        .unwrap_or_else(|_| String::from("error"));

    render(NewUserTemplate {
        error: msg.to_string(),
        name: form.name.clone(),
        email: form.email.clone(),
        role: form.role.clone(),
        csrf_token,
    })
}

pub async fn create_user_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UserForm>,
) -> Result<Response, AppError> {
    if validate_csrf_form_field(&session, &form.csrf_token)
        .await
        .is_err()
    {
        return Ok(new_user_error(
            "Invalid security token. Please refresh the page and try again.",
            &form,
            &session,
        )
        .await
        .into_response());
    }

    let role = match Role::from_str(&form.role) {
        Ok(role) => role,
        Err(_) => {
            return Ok(new_user_error("Please choose a valid role", &form, &session)
                .await
                .into_response())
        }
    };

    let request = CreateUserRequest {
        name: form.name.clone(),
        email: form.email.clone(),
        password: form.password.clone(),
        role,
    };

    match state.user_service.create_user(request).await {
        Ok(_) => Ok(Redirect::to("/users").into_response()),
        Err(UserServiceError::EmailTaken) => Ok(new_user_error(
            "That email address is already registered",
            &form,
            &session,
        )
        .await
        .into_response()),
        Err(e) => Err(e.into()),
    }
}

pub async fn edit_user_page(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let user = state.user_service.get_user(id).await?.ok_or(AppError::NotFound)?;

    let csrf_token = get_or_create_csrf_token(&session)
        .await
        .unwrap_or_else(|_| String::from("error"));

    Ok(render(EditUserTemplate {
        error: String::new(),
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role.to_string(),
        csrf_token,
    }))
}

async fn edit_user_error(msg: &str, id: i64, form: &UserForm, session: &Session) -> Html<String> {
    let csrf_token = get_or_create_csrf_token(session)
        .await
        .unwrap_or_else(|_| String::from("error"));

    render(EditUserTemplate {
        error: msg.to_string(),
        id,
        name: form.name.clone(),
        email: form.email.clone(),
        role: form.role.clone(),
        csrf_token,
    })
}

pub async fn update_user_handler(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<UserForm>,
) -> Result<Response, AppError> {
    if validate_csrf_form_field(&session, &form.csrf_token)
        .await
        .is_err()
    {
        return Ok(edit_user_error(
            "Invalid security token. Please refresh the page and try again.",
            id,
            &form,
            &session,
        )
        .await
        .into_response());
    }

    let role = match Role::from_str(&form.role) {
        Ok(role) => role,
        Err(_) => {
            return Ok(
                edit_user_error("Please choose a valid role", id, &form, &session)
                    .await
                    .into_response(),
            )
        }
    };

    let request = UpdateUserRequest {
        id,
        name: form.name.clone(),
        email: form.email.clone(),
        password: form.password.clone(),
        role,
    };

    match state.user_service.update_user(request).await {
        Ok(_) => Ok(Redirect::to("/users").into_response()),
        Err(UserServiceError::EmailTaken) => Ok(edit_user_error(
            "That email address belongs to another account",
            id,
            &form,
            &session,
        )
        .await
        .into_response()),
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_user_handler(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<DeleteForm>,
) -> Result<Response, AppError> {
    if validate_csrf_form_field(&session, &form.csrf_token)
        .await
        .is_err()
    {
        return Ok(Redirect::to("/users").into_response());
    }

    let deleted = state.user_service.delete_user(id).await?;
    if !deleted {
        tracing::warn!(id, "delete requested for unknown user");
    }

    Ok(Redirect::to("/users").into_response())
}
