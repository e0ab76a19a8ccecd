use crate::auth::middleware::{SESSION_EMAIL_KEY, SESSION_ROLE_KEY, SESSION_USER_ID_KEY};
use crate::error::AppError;
use crate::middleware::csrf::{get_or_create_csrf_token, validate_csrf_form_field};
use crate::services::auth_service::{AuthServiceError, LoginRequest};
use crate::services::password_reset_service::PasswordResetError;
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Form, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    error: String,
    reset_success: bool,
    csrf_token: String,
}

#[derive(Template)]
#[template(path = "auth/forgot.html")]
struct ForgotTemplate {
    submitted: bool,
    csrf_token: String,
}

#[derive(Template)]
#[template(path = "auth/reset.html")]
struct ResetTemplate {
    error: String,
    email: String,
    token: String,
    csrf_token: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
    csrf_token: String,
}

#[derive(Deserialize)]
pub struct LoginQuery {
    reset: Option<String>,
}

#[derive(Deserialize)]
pub struct ForgotForm {
    email: String,
    csrf_token: String,
}

#[derive(Deserialize)]
pub struct ResetQuery {
    email: Option<String>,
    token: Option<String>,
}

#[derive(Deserialize)]
pub struct ResetForm {
    email: String,
    token: String,
    password: String,
    csrf_token: String,
}

fn render<T: Template>(template: T) -> Html<String> {
    Html(
        template
            .render()
            .unwrap_or_else(|_| "<html><body><h1>Template error</h1></body></html>".to_string()),
    )
}

pub async fn login_page(session: Session, Query(query): Query<LoginQuery>) -> Html<String> {
    let csrf_token = get_or_create_csrf_token(&session)
        .await
        .unwrap_or_else(|_| String::from("error"));

    render(LoginTemplate {
        error: String::new(),
        reset_success: query.reset.as_deref() == Some("success"),
        csrf_token,
    })
}

async fn login_error(msg: &str, session: &Session) -> Html<String> {
    let csrf_token = get_or_create_csrf_token(session)
        .await
        .unwrap_or_else(|_| String::from("error"));

    render(LoginTemplate {
        error: msg.to_string(),
        reset_success: false,
        csrf_token,
    })
}

pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    if validate_csrf_form_field(&session, &form.csrf_token)
        .await
        .is_err()
    {
        return login_error(
            "Invalid security token. Please refresh the page and try again.",
            &session,
        )
        .await
        .into_response();
    }

    let request = LoginRequest {
        email: form.email.clone(),
        password: form.password.clone(),
    };

    match state.auth_service.authenticate(request).await {
        Ok(user) => {
            if session.insert(SESSION_USER_ID_KEY, user.id).await.is_err()
                || session.insert(SESSION_EMAIL_KEY, user.email).await.is_err()
                || session.insert(SESSION_ROLE_KEY, user.role).await.is_err()
            {
                return login_error("Failed to create session", &session)
                    .await
                    .into_response();
            }

            Redirect::to("/users").into_response()
        }
        Err(err) => {
            let msg = match err {
                AuthServiceError::InvalidCredentials => "Invalid email or password",
                _ => "An error occurred. Please try again.",
            };
            login_error(msg, &session).await.into_response()
        }
    }
}

pub async fn logout_handler(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    Redirect::to("/login")
}

pub async fn forgot_page(session: Session) -> Html<String> {
    let csrf_token = get_or_create_csrf_token(&session)
        .await
        .unwrap_or_else(|_| String::from("error"));

    render(ForgotTemplate {
        submitted: false,
        csrf_token,
    })
}

/// The confirmation page is identical whether or not the email matched an
/// account, so the form cannot be used to enumerate registered addresses.
pub async fn forgot_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ForgotForm>,
) -> Result<Response, AppError> {
    if validate_csrf_form_field(&session, &form.csrf_token)
        .await
        .is_err()
    {
        return Ok(forgot_page(session).await.into_response());
    }

    if let Some(token) = state.password_reset_service.forgot_password(&form.email).await? {
        if let Err(e) = state
            .email_service
            .send_password_reset_email(&form.email, &token)
            .await
        {
            tracing::error!("Failed to send password reset email: {}", e);
        }
    }

    let csrf_token = get_or_create_csrf_token(&session)
        .await
        .unwrap_or_else(|_| String::from("error"));

    Ok(render(ForgotTemplate {
        submitted: true,
        csrf_token,
    })
    .into_response())
}

pub async fn reset_page(session: Session, Query(query): Query<ResetQuery>) -> Html<String> {
    let csrf_token = get_or_create_csrf_token(&session)
        .await
        .unwrap_or_else(|_| String::from("error"));

    render(ResetTemplate {
        error: String::new(),
        email: query.email.unwrap_or_default(),
        token: query.token.unwrap_or_default(),
        csrf_token,
    })
}

pub async fn reset_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ResetForm>,
) -> Result<Response, AppError> {
    if validate_csrf_form_field(&session, &form.csrf_token)
        .await
        .is_err()
    {
        return Ok(reset_error(
            "Invalid security token. Please refresh the page and try again.",
            &form,
            &session,
        )
        .await
        .into_response());
    }

    match state
        .password_reset_service
        .reset_password(&form.email, &form.token, &form.password)
        .await
    {
        Ok(_) => Ok(Redirect::to("/login?reset=success").into_response()),
        Err(PasswordResetError::InvalidToken) => Ok(reset_error(
            "This reset link is invalid or has expired. Request a new one.",
            &form,
            &session,
        )
        .await
        .into_response()),
        Err(e) => Err(e.into()),
    }
}

async fn reset_error(msg: &str, form: &ResetForm, session: &Session) -> Html<String> {
    let csrf_token = get_or_create_csrf_token(session)
        .await
        .unwrap_or_else(|_| String::from("error"));

    render(ResetTemplate {
        error: msg.to_string(),
        email: form.email.clone(),
        token: form.token.clone(),
        csrf_token,
    })
}
