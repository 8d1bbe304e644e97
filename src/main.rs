use std::io::BufRead;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;

use tollgate::auth::{create_super_admin, seed_demo_data, SuperAdminRequest, DEMO_PASSWORD};
use tollgate::web::WebServer;
use tollgate::{Config, Database, KeyStore, TollgateError};

#[derive(Parser)]
#[command(name = "tollgate")]
#[command(about = "Authentication and role-based authorization service")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config.toml", env = "TOLLGATE_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve,

    /// Write a new RSA signing keypair
    GenerateKeys {
        /// Replace existing key files
        #[arg(long)]
        overwrite: bool,

        /// Private key output path (overrides config)
        #[arg(long)]
        private_key_path: Option<PathBuf>,

        /// Public key output path (overrides config)
        #[arg(long)]
        public_key_path: Option<PathBuf>,
    },

    /// Create an account with the super admin role.
    ///
    /// The password is read from TOLLGATE_ADMIN_PASSWORD or, if unset, from
    /// the first line of standard input.
    CreateSuperAdmin {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long, default_value = "System")]
        first_name: String,

        #[arg(long, default_value = "Admin")]
        last_name: String,
    },

    /// Create the demo roles and one demo user per role
    #[command(alias = "seed-dummy-data")]
    SeedDemoData,
}

fn load_config(path: &Path) -> tollgate::Result<Config> {
    let config = if path.exists() {
        Config::load_with_env(path)?
    } else {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    };
    config.validate()?;
    Ok(config)
}

fn read_admin_password() -> tollgate::Result<String> {
    if let Ok(password) = std::env::var("TOLLGATE_ADMIN_PASSWORD") {
        return Ok(password);
    }
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn run(cli: Cli, config: Config) -> tollgate::Result<()> {
    match cli.command {
        Command::Serve => {
            let db = Database::open(&config.database.path).await?;
            info!(
                "Server configured on {}:{}",
                config.server.host, config.server.port
            );
            WebServer::new(&config, db)?.run().await
        }
        Command::GenerateKeys {
            overwrite,
            private_key_path,
            public_key_path,
        } => {
            let private_key_path = private_key_path.unwrap_or(config.keys.private_key_path);
            let public_key_path = public_key_path.unwrap_or(config.keys.public_key_path);
            KeyStore::from_files(&private_key_path, &public_key_path)
                .generate(overwrite, config.keys.bits)?;
            println!("Private key written to {}", private_key_path.display());
            println!("Public key written to {}", public_key_path.display());
            Ok(())
        }
        Command::CreateSuperAdmin {
            username,
            email,
            first_name,
            last_name,
        } => {
            let password = read_admin_password()?;
            let db = Database::open(&config.database.path).await?;
            let mut request = SuperAdminRequest::new(username, email, password);
            request.first_name = first_name;
            request.last_name = last_name;
            let user = create_super_admin(&db, &config.roles, request).await?;
            db.close().await;
            println!("Super admin '{}' created (id {})", user.username, user.id);
            Ok(())
        }
        Command::SeedDemoData => {
            let db = Database::open(&config.database.path).await?;
            let report = seed_demo_data(&db, &config.roles).await?;
            db.close().await;
            println!(
                "Seeded {} roles and {} users (password: {DEMO_PASSWORD})",
                report.roles, report.users_created
            );
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", cli.config.display());
            std::process::exit(2);
        }
    };

    if matches!(cli.command, Command::Serve) {
        if let Err(e) = tollgate::logging::init(&config.logging) {
            eprintln!("Failed to initialize logging: {e}");
            tollgate::logging::init_console_only(&config.logging.level);
        }
        info!("Tollgate starting");
    } else {
        tollgate::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = run(cli, config).await {
        eprintln!("Error: {e}");
        let code = match e {
            TollgateError::Conflict(_) | TollgateError::Validation(_) => 2,
            _ => 1,
        };
        std::process::exit(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_command_accepts_dummy_alias() {
        for name in ["seed-demo-data", "seed-dummy-data"] {
            let cli = Cli::try_parse_from(["tollgate", name]).unwrap();
            assert!(matches!(cli.command, Command::SeedDemoData));
        }
    }
}
