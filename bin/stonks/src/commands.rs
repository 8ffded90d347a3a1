//! Command implementations.
//!
//! Commands read the score database directly; nothing here talks to the
//! platform.

use std::path::Path;

use eyre::{Result, WrapErr, bail};
use serde_json::json;
use stonks_engine::{LeaderboardPage, Settings, leaderboard_entries};
use stonks_primitives::UserId;
use stonks_storage::{RedbScoreStore, ScoreStore, Scores};
use tracing::info;

use crate::cli::{ConfigCommand, DataDirArgs, LeaderboardArgs, OutputArgs, UserArgs};

fn open_scores(datadir: &DataDirArgs) -> Result<Scores<RedbScoreStore>> {
    let path = datadir.db_file();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
    }
    let store = RedbScoreStore::open(&path)
        .wrap_err_with(|| format!("failed to open score database {}", path.display()))?;
    Ok(Scores::new(store))
}

fn load_settings(path: &Path) -> Result<Settings> {
    Settings::load_or_default(path)
        .wrap_err_with(|| format!("invalid settings in {}", path.display()))
}

pub(crate) fn leaderboard(datadir: &DataDirArgs, args: &LeaderboardArgs) -> Result<()> {
    let settings = load_settings(&datadir.settings_file())?;
    let scores = open_scores(datadir)?;

    let min_score = args.min_score.unwrap_or(settings.leaderboard_min_score);
    let entries = leaderboard_entries(&scores, min_score);
    let page = LeaderboardPage::paginate(&entries, args.page, settings.leaderboard_page_size);

    if args.output.json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    if page.entries.is_empty() {
        println!("No holders with at least {min_score} shares yet.");
    }
    for entry in &page.entries {
        println!("{:>4}  {:<24} {}", entry.rank, entry.display_name, entry.shares);
    }
    println!("page {}/{}", page.page, page.max_page);
    if let Some(url) = &settings.leaderboard_help_url {
        println!("help: {url}");
    }
    Ok(())
}

pub(crate) fn queue(datadir: &DataDirArgs, output: OutputArgs) -> Result<()> {
    let scores = open_scores(datadir)?;
    let entries = scores.store().queue_entries()?;

    if output.json {
        let rows: Vec<_> = entries
            .iter()
            .map(|(user, at)| json!({ "userId": user, "lastUpdated": at }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for (position, (user, at)) in entries.iter().enumerate() {
        println!("{:>4}  {:<24} {}", position + 1, user, at);
    }
    Ok(())
}

pub(crate) fn user(datadir: &DataDirArgs, args: &UserArgs) -> Result<()> {
    let scores = open_scores(datadir)?;
    let store = scores.store();
    let id = UserId::new(args.id.clone());

    let first_seen = store.first_seen(&id)?;
    let queued_at = store.queue_position(&id)?;
    let shares = store.shares(&id)?;
    let posts = store.tracked_posts(&id)?;

    if args.output.json {
        let value = json!({
            "userId": id,
            "firstSeen": first_seen,
            "queuedAt": queued_at,
            "shares": shares,
            "posts": posts,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let Some(first_seen) = first_seen else {
        println!("{id} is not tracked");
        return Ok(());
    };
    println!("user:       {id}");
    println!("first seen: {first_seen}");
    if let Some(at) = queued_at {
        println!("queued at:  {at}");
    }
    if let Some(record) = shares {
        println!("name:       {}", record.display_name);
        println!("shares:     {}", record.shares);
    }
    println!("posts:");
    for (post, score) in &posts {
        println!("  {post:<16} {score}");
    }
    Ok(())
}

pub(crate) fn config(datadir: &DataDirArgs, command: &ConfigCommand) -> Result<()> {
    let path = datadir.settings_file();
    match command {
        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                bail!("{} already exists, pass --force to overwrite", path.display());
            }
            Settings::default().save(&path)?;
            info!(path = %path.display(), "wrote default settings");
            println!("{}", path.display());
        }
        ConfigCommand::Show => {
            let settings = load_settings(&path)?;
            print!("{}", toml::to_string_pretty(&settings)?);
        }
        ConfigCommand::Validate => {
            load_settings(&path)?;
            println!("{} is valid", path.display());
        }
    }
    Ok(())
}
