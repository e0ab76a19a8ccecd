use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use std::str::FromStr;
use std::sync::Arc;
use userdesk::{
    db,
    models::Role,
    repositories::{SqliteResetTokenRepository, SqliteUserRepository},
    seed,
    services::password_reset_service::PasswordResetService,
    services::user_service::{CreateUserRequest, UpdateUserRequest, UserService},
};

#[derive(Parser)]
#[command(name = "userdesk-cli")]
#[command(about = "CLI tool for managing UserDesk accounts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// User management commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Seed the canonical demo accounts
    Seed,

    /// List the currently valid password-reset tokens (diagnostic)
    Tokens,
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a new user
    Create {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,

        /// Role: guest, manager or admin
        #[arg(short, long, default_value = "guest")]
        role: String,
    },

    /// List users, one page at a time
    List {
        /// Page number (1-based)
        #[arg(long, default_value_t = 1)]
        page: i64,

        /// Rows per page
        #[arg(short, long, default_value_t = 10)]
        size: i64,

        /// Sort column: id, name or email
        #[arg(short, long, default_value = "id")]
        order: String,

        /// Sort direction: asc or desc
        #[arg(short, long, default_value = "asc")]
        direction: String,
    },

    /// Delete a user
    Delete {
        /// Email address of the user to delete
        #[arg(short, long)]
        email: String,
    },

    /// Set a new password for a user
    SetPassword {
        /// Email address of the user
        #[arg(short, long)]
        email: String,

        /// New password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },
}

fn get_password(prompt: &str) -> anyhow::Result<String> {
    use std::io::{self, Write};
    print!("{}: ", prompt);
    io::stdout().flush()?;

    Ok(rpassword::read_password()?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "userdesk=info".into()),
        )
        .init();

    let pool = db::create_pool()
        .await
        .context("failed to open the database")?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
    let token_repository = Arc::new(SqliteResetTokenRepository::new(pool.clone()));
    let user_service = UserService::new(user_repository.clone());
    let reset_service = PasswordResetService::new(user_repository, token_repository);

    let cli = Cli::parse();

    match cli.command {
        Commands::User { command } => match command {
            UserCommands::Create {
                name,
                email,
                password,
                role,
            } => {
                let role = Role::from_str(&role)
                    .map_err(|e| anyhow!("{e} (expected guest, manager or admin)"))?;
                let password = match password {
                    Some(pw) => pw,
                    None => get_password("Password")?,
                };

                let user = user_service
                    .create_user(CreateUserRequest {
                        name,
                        email,
                        password,
                        role,
                    })
                    .await?;
                println!("Created user {} <{}> as {}", user.id, user.email, user.role);
            }

            UserCommands::List {
                page,
                size,
                order,
                direction,
            } => {
                let paged = user_service.get_users(page, size, &order, &direction).await?;
                println!(
                    "{} users total (page {} of {}, sorted by {} {})",
                    paged.total_rows,
                    paged.current_page,
                    paged.total_pages().max(1),
                    paged.order_by,
                    paged.direction,
                );
                for user in &paged.data {
                    println!("{:>6}  {:<24}  {:<32}  {}", user.id, user.name, user.email, user.role);
                }
            }

            UserCommands::Delete { email } => match user_service.get_user_by_email(&email).await? {
                Some(user) => {
                    if user_service.delete_user(user.id).await? {
                        println!("Deleted {}", email);
                    } else {
                        println!("No user with email {}", email);
                    }
                }
                None => println!("No user with email {}", email),
            },

            UserCommands::SetPassword { email, password } => {
                let user = user_service
                    .get_user_by_email(&email)
                    .await?
                    .ok_or_else(|| anyhow!("No user with email {}", email))?;

                let password = match password {
                    Some(pw) => pw,
                    None => get_password("New password")?,
                };

                user_service
                    .update_user(UpdateUserRequest {
                        id: user.id,
                        name: user.name,
                        email: user.email,
                        password,
                        role: user.role,
                    })
                    .await?;
                println!("Password updated for {}", email);
            }
        },

        Commands::Seed => {
            seed::seed(&user_service).await?;
            println!("Database seeded");
        }

        Commands::Tokens => {
            let tokens = reset_service.valid_tokens().await?;
            if tokens.is_empty() {
                println!("No valid reset tokens");
            } else {
                for token in tokens {
                    println!("{}", token);
                }
            }
        }
    }

    Ok(())
}
