use userdesk::{
    auth,
    auth::middleware::SESSION_USER_ID_KEY,
    config::session::{validate_production_config, SessionConfig},
    db, handlers,
    repositories::{SqliteResetTokenRepository, SqliteUserRepository},
    services::{
        auth_service::AuthService, create_email_service,
        password_reset_service::PasswordResetService, user_service::UserService,
    },
    AppState,
};

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tower_sessions::Session;
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "userdesk=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let pool = db::create_pool().await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Repositories
    let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
    let token_repository = Arc::new(SqliteResetTokenRepository::new(pool.clone()));

    // Services
    let user_service = Arc::new(UserService::new(user_repository.clone()));
    let auth_service = Arc::new(AuthService::new(user_repository.clone()));
    let password_reset_service = Arc::new(PasswordResetService::new(
        user_repository.clone(),
        token_repository.clone(),
    ));
    let email_service: Arc<dyn userdesk::services::email_service::EmailService> =
        Arc::from(create_email_service());

    let app_state = AppState {
        user_service,
        auth_service,
        password_reset_service,
        email_service,
        pool: pool.clone(),
    };

    // Session store
    validate_production_config();
    let session_store = SqliteStore::new(pool.clone())
        .with_table_name("sessions")
        .expect("Invalid session table name");
    session_store.migrate().await?;

    let session_layer = SessionConfig::from_env().create_layer(session_store);

    // User management is restricted to staff roles; the policy string is the
    // comma-separated form the authorization layer parses into Role values.
    let user_routes = Router::new()
        .route("/users", get(handlers::list_users))
        .route("/users/new", get(handlers::new_user_page))
        .route("/users", post(handlers::create_user_handler))
        .route("/users/{id}/edit", get(handlers::edit_user_page))
        .route("/users/{id}", post(handlers::update_user_handler))
        .route("/users/{id}/delete", post(handlers::delete_user_handler))
        .layer(middleware::from_fn_with_state(
            auth::RolePolicy::require("admin,manager"),
            auth::middleware::require_role,
        ))
        .layer(middleware::from_fn(auth::middleware::require_auth));

    let app = Router::new()
        .route("/", get(index_handler))
        .route(
            "/login",
            get(auth::handlers::login_page).post(auth::handlers::login_handler),
        )
        .route("/logout", get(auth::handlers::logout_handler))
        .route(
            "/forgot",
            get(auth::handlers::forgot_page).post(auth::handlers::forgot_handler),
        )
        .route(
            "/reset",
            get(auth::handlers::reset_page).post(auth::handlers::reset_handler),
        )
        .merge(user_routes)
        .layer(session_layer)
        .layer(middleware::from_fn(add_security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Start server
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse::<u16>()?;

    let addr = SocketAddr::from((host.parse::<std::net::IpAddr>()?, port));

    tracing::info!("Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn add_security_headers(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    if std::env::var("ENVIRONMENT")
        .map(|env| env == "production")
        .unwrap_or(false)
    {
        headers.insert(
            "Strict-Transport-Security",
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }

    response
}

async fn index_handler(session: Session) -> impl IntoResponse {
    match session.get::<i64>(SESSION_USER_ID_KEY).await {
        Ok(Some(_)) => Redirect::to("/users"),
        _ => Redirect::to("/login"),
    }
}
