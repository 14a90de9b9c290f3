use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use webcare::{
    config::AppConfig,
    db,
    repositories::{SqliteCheckInRepository, SqliteUserRepository},
    services::{
        create_email_service, CheckInService, Clock, EmailService, RegisterUserRequest,
        StalenessSweep, SystemClock, UserService,
    },
};

#[derive(Parser)]
#[command(name = "webcare-cli")]
#[command(about = "CLI tool for managing WebCare users and sweeps", long_about = None)]
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

    /// Run one staleness sweep now
    Sweep,
}

#[derive(Subcommand)]
enum UserCommands {
    /// Register a new user
    Create {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Emergency contact email address
        #[arg(short, long)]
        email: String,

        /// Hours without a check-in before warning (defaults to the configured value)
        #[arg(short, long)]
        interval: Option<String>,
    },

    /// List all users
    List,

    /// Record a check-in for a user
    Checkin {
        /// The user's access token
        #[arg(short, long)]
        token: String,
    },

    /// Change a user's warning interval
    SetInterval {
        /// The user's access token
        #[arg(short, long)]
        token: String,

        /// New interval in hours; invalid values fall back to the default
        #[arg(long)]
        hours: String,
    },
}

fn fail(message: String) -> ! {
    eprintln!("❌ {}", message);
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webcare=info".into()),
        )
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    let config = AppConfig::from_env().context("invalid configuration")?;

    // Connect to database
    let pool = db::create_pool(&config.database_url)
        .await
        .context("failed to open database")?;

    // Run migrations
    db::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    // Initialize services
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
    let user_service = UserService::new(
        user_repository.clone(),
        clock.clone(),
        config.default_warning_interval_hours,
    );

    match cli.command {
        Commands::User { command } => match command {
            UserCommands::Create {
                name,
                email,
                interval,
            } => {
                let request = RegisterUserRequest {
                    name,
                    emergency_email: email,
                    warning_interval_hours: interval,
                };

                match user_service.register_user(request).await {
                    Ok(user) => {
                        println!("✅ User registered successfully!");
                        println!("  ID: {}", user.id);
                        println!("  Name: {}", user.name);
                        println!("  Emergency contact: {}", user.emergency_email);
                        println!("  Interval: {}h", user.warning_interval_hours);
                        println!("  Token: {}", user.unique_user_token);
                        println!("  Link: {}", config.checkin_url(&user.unique_user_token));
                    }
                    Err(err) => fail(format!("Failed to register user: {}", err)),
                }
            }

            UserCommands::List => match user_service.list_users().await {
                Ok(users) => {
                    if users.is_empty() {
                        println!("No users found.");
                    } else {
                        println!(
                            "{:<5} {:<20} {:<32} {:<9} {:<20} {:<20}",
                            "ID", "Name", "Emergency contact", "Interval", "Last check-in",
                            "Last warning"
                        );
                        println!("{}", "-".repeat(110));
                        for user in users {
                            println!(
                                "{:<5} {:<20} {:<32} {:<9} {:<20} {:<20}",
                                user.id,
                                user.name,
                                user.emergency_email,
                                format!("{}h", user.warning_interval_hours),
                                user.last_checkin
                                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                                    .unwrap_or_else(|| "Never".to_string()),
                                user.last_warning_sent
                                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                                    .unwrap_or_else(|| "Never".to_string()),
                            );
                        }
                    }
                }
                Err(err) => fail(format!("Failed to list users: {}", err)),
            },

            UserCommands::Checkin { token } => match user_service.find_user_by_token(&token).await {
                Ok(Some(user)) => {
                    let checkin_repository = Arc::new(SqliteCheckInRepository::new(pool.clone()));
                    let checkin_service = CheckInService::new(checkin_repository, clock.clone());
                    match checkin_service.check_in(user.id).await {
                        Ok(checkin) => {
                            println!(
                                "✅ Checked in '{}' at {}",
                                user.name,
                                checkin.checkin_time.format("%Y-%m-%d %H:%M:%S UTC")
                            );
                        }
                        Err(err) => fail(format!("Failed to check in: {}", err)),
                    }
                }
                Ok(None) => fail("No user with that token".to_string()),
                Err(err) => fail(format!("Failed to find user: {}", err)),
            },

            UserCommands::SetInterval { token, hours } => {
                match user_service.find_user_by_token(&token).await {
                    Ok(Some(user)) => {
                        match user_service.update_warning_interval(user.id, &hours).await {
                            Ok(stored) => {
                                println!(
                                    "✅ Warning interval for '{}' set to {}h",
                                    user.name, stored
                                );
                            }
                            Err(err) => fail(format!("Failed to update interval: {}", err)),
                        }
                    }
                    Ok(None) => fail("No user with that token".to_string()),
                    Err(err) => fail(format!("Failed to find user: {}", err)),
                }
            }
        },

        Commands::Sweep => {
            let email_service: Arc<dyn EmailService> = create_email_service().into();
            let sweep = StalenessSweep::new(user_repository, email_service, clock);

            let report = sweep.run_once().await.context("sweep failed")?;
            println!("✅ Sweep finished");
            println!("  Evaluated: {}", report.evaluated);
            println!("  Notified: {}", report.notified);
            println!("  Failed: {}", report.failed);
            println!("  Cooling down: {}", report.cooling_down);
            println!("  Not stale: {}", report.not_stale);
            println!("  Never checked in: {}", report.never_checked_in);
        }
    }

    pool.close().await;
    Ok(())
}
