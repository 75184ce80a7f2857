//! Command-line entry point for operators.
//!
//! # Responsibility
//! - Load `.env`, read configuration once and start logging.
//! - Open the shared database and run a single maintenance command.

use clap::{Parser, Subcommand};
use safehavens_core::db::open_db;
use safehavens_core::{
    default_log_level, init_logging, AdminBootstrap, AppConfig, Argon2Hasher, BootstrapOutcome,
    ReviewService, SqliteCredentialStore, SqliteReviewRepository, SqliteVenueRepository,
    VenueImporter, VenueService,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "safehavens-cli",
    version,
    about = "Maintenance commands for the Safe Havens venue directory"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the `admin` account when it is missing
    Bootstrap,
    /// Import a venue dataset (defaults to VENUES_JSON)
    Import {
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },
    /// List one page of venues
    Venues {
        /// 1-based page number
        #[arg(value_name = "PAGE")]
        page: Option<u32>,
    },
    /// List the reviews pointing at a venue
    Reviews {
        #[arg(value_name = "VENUE_ID")]
        venue_id: Uuid,
    },
    /// Print the effective configuration
    Config,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), Box<dyn Error>> {
    let config = AppConfig::from_env()?;
    if let Some(log_dir) = config.log_dir.as_ref() {
        let level = config.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, &log_dir.to_string_lossy(), config.debug)?;
    }

    match command {
        Command::Config => {
            println!("{config:#?}");
            println!("bind_address={}", config.bind_address());
        }
        Command::Bootstrap => {
            let conn = open_db(&config.db_path)?;
            let store = SqliteCredentialStore::try_new(&conn)?;
            let bootstrap = AdminBootstrap::new(store, Argon2Hasher::new(), config.admin.clone());
            match bootstrap.ensure_admin() {
                BootstrapOutcome::Created(account) => {
                    println!("created admin account {}", account.id)
                }
                BootstrapOutcome::AlreadyPresent => println!("admin account already present"),
                BootstrapOutcome::Failed(failure) => return Err(failure.into()),
            }
        }
        Command::Import { path } => {
            let path = path.unwrap_or_else(|| config.dataset_path.clone());
            let conn = open_db(&config.db_path)?;
            let venues = SqliteVenueRepository::with_categories(&conn, config.categories.clone())?;
            let inserted =
                VenueImporter::new(venues, config.categories.clone()).import_file(&path)?;
            println!("imported {inserted} venue(s) from {}", path.display());
        }
        Command::Venues { page } => {
            let conn = open_db(&config.db_path)?;
            let service = VenueService::new(
                SqliteVenueRepository::with_categories(&conn, config.categories.clone())?,
                SqliteReviewRepository::try_new(&conn)?,
            )
            .with_page_size(config.venues_per_page);
            let listed = service.list_venues(page.unwrap_or(1))?;
            for venue in &listed.items {
                println!(
                    "{}\t{}\t{}\t{}, {}",
                    venue.id,
                    venue.name,
                    venue.category.as_deref().unwrap_or("-"),
                    venue.city,
                    venue.country
                );
            }
            println!(
                "page={} prev={} next={}",
                listed.page,
                listed
                    .prev_page()
                    .map_or("-".to_string(), |page| page.to_string()),
                listed
                    .next_page()
                    .map_or("-".to_string(), |page| page.to_string())
            );
        }
        Command::Reviews { venue_id } => {
            let conn = open_db(&config.db_path)?;
            let service = ReviewService::new(SqliteReviewRepository::try_new(&conn)?);
            for review in service.list_for_venue(venue_id)? {
                let checked: Vec<&str> = review
                    .flags
                    .entries()
                    .filter(|(_, _, value)| *value)
                    .map(|(_, name, _)| name)
                    .collect();
                println!(
                    "{}\t{}\t[{}]\t{}",
                    review.id,
                    review.owner,
                    checked.join(","),
                    review.text
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_typed_arguments() {
        let cli = Cli::try_parse_from(["safehavens-cli", "venues", "3"])
            .expect("numeric page should parse");
        assert!(matches!(cli.command, Command::Venues { page: Some(3) }));

        let cli = Cli::try_parse_from(["safehavens-cli", "import"])
            .expect("import path should be optional");
        assert!(matches!(cli.command, Command::Import { path: None }));
    }

    #[test]
    fn rejects_malformed_arguments() {
        assert!(Cli::try_parse_from(["safehavens-cli", "venues", "two"]).is_err());
        assert!(Cli::try_parse_from(["safehavens-cli", "reviews", "not-a-uuid"]).is_err());
        assert!(Cli::try_parse_from(["safehavens-cli", "reviews"]).is_err());
    }
}
