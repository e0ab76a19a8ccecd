use crate::models::Role;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::collections::HashSet;
use std::str::FromStr;
use tower_sessions::Session;

pub const SESSION_USER_ID_KEY: &str = "user_id";
pub const SESSION_EMAIL_KEY: &str = "email";
pub const SESSION_ROLE_KEY: &str = "role";

pub async fn require_auth(session: Session, request: Request, next: Next) -> Response {
    if let Ok(Some(_user_id)) = session.get::<i64>(SESSION_USER_ID_KEY).await {
        next.run(request).await
    } else {
        Redirect::to("/login").into_response()
    }
}

/// A role requirement parsed from a comma-separated list such as
/// "admin,manager". Membership checks compare `Role` values, never raw
/// strings; the principal's role comes from the session, which only ever
/// holds roles the account service persisted.
#[derive(Debug, Clone)]
pub struct RolePolicy {
    allowed: HashSet<Role>,
}

impl RolePolicy {
    /// Panics on unknown role names: policies are wired at startup and a
    /// typo there is a configuration bug, not a runtime condition.
    pub fn require(roles: &str) -> Self {
        let allowed: HashSet<Role> = roles
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(|part| match Role::from_str(part) {
                Ok(role) => role,
                Err(e) => panic!("invalid role policy {roles:?}: {e}"),
            })
            .collect();

        if allowed.is_empty() {
            panic!("role policy {roles:?} names no roles");
        }

        RolePolicy { allowed }
    }

    pub fn allows(&self, role: Role) -> bool {
        self.allowed.contains(&role)
    }
}

/// Middleware enforcing a `RolePolicy`: anonymous requests go to the login
/// page, authenticated principals without a matching role get 403.
pub async fn require_role(
    State(policy): State<RolePolicy>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    match session.get::<Role>(SESSION_ROLE_KEY).await {
        Ok(Some(role)) if policy.allows(role) => next.run(request).await,
        Ok(Some(_)) => StatusCode::FORBIDDEN.into_response(),
        _ => Redirect::to("/login").into_response(),
    }
}
