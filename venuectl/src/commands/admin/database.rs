use crate::cli::DatabaseCommands;
use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use libvenue::{
    Database,
    seed::{self, SeedSummary},
};
use std::path::{Path, PathBuf};
use tracing::debug;

pub(crate) async fn handle_command(dbpath: PathBuf, command: DatabaseCommands) -> Result<()> {
    match command {
        DatabaseCommands::Init {
            admin_user,
            admin_email,
            passwordfile,
            venues,
        } => initialize_database(dbpath, admin_user, admin_email, passwordfile, venues).await,
        DatabaseCommands::Seed { file } => {
            let db = Database::open(&dbpath).await?;
            let summary = seed_database(&db, &file).await?;
            print_summary(&summary);
            Ok(())
        }
    }
}

async fn initialize_database(
    dest_path: PathBuf,
    admin_user: Option<String>,
    admin_email: Option<String>,
    passwordfile: Option<PathBuf>,
    venues: Option<PathBuf>,
) -> Result<()> {
    println!(
        "Attempting to initialize new venue database at '{}'...",
        dest_path.display()
    );
    if tokio::fs::try_exists(&dest_path).await? {
        if !(inquire::Confirm::new(&format!(
            "Overwrite existing database file '{}'",
            dest_path.display(),
        ))
        .with_default(false)
        .prompt()?)
        {
            return Err(anyhow!("Refusing to overwrite existing database file"));
        }
        tokio::fs::remove_file(&dest_path).await?;
    }
    if let Some(parent) = dest_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let db = Database::open(&dest_path).await?;
    let username = admin_user
        .or_else(|| inquire::Text::new("Administrator username:").prompt().ok())
        .ok_or_else(|| anyhow!("No Administrator username specified"))?;
    let email = admin_email.or_else(|| {
        inquire::Text::new("Administrator email address:")
            .prompt_skippable()
            .ok()
            .flatten()
            .filter(|e| !e.trim().is_empty())
    });
    let password = match passwordfile {
        Some(f) => tokio::fs::read_to_string(f).await?.trim().to_string(),
        None => inquire::Password::new("Administrator password:")
            .with_display_toggle_enabled()
            .with_display_mode(inquire::PasswordDisplayMode::Masked)
            .prompt()?,
    };
    let user = db.init(username, email, password).await?;
    println!("Added user to database:");
    println!("{}: {}", user.id, user.username);
    if let Some(venues) = venues {
        let summary = seed_database(&db, &venues).await?;
        print_summary(&summary);
    }
    Ok(())
}

/// Import the venues in `file` while showing a progress bar
async fn seed_database(db: &Database, file: &Path) -> Result<SeedSummary> {
    let contents = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Unable to read venue file '{}'", file.display()))?;
    let venues = seed::parse_venues(&contents)?;
    debug!(n = venues.len(), "Parsed venue file");
    let progress = ProgressBar::new(venues.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    let summary = db
        .seed(venues, |venue| {
            progress.set_message(venue.name.clone());
            progress.inc(1);
        })
        .await?;
    progress.finish_and_clear();
    Ok(summary)
}

fn print_summary(summary: &SeedSummary) {
    println!(
        "Added {} venues with {} events ({} venues were already present)",
        summary.venues_added, summary.events_added, summary.venues_skipped
    );
}
