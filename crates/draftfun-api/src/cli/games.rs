//! Game catalog CLI commands: list, show, delete.

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use uuid::Uuid;

use draftfun_core::repository::GameRepository;

use crate::state::AppState;

#[derive(Subcommand)]
pub enum GamesCommand {
    /// List published games, newest first.
    #[command(alias = "ls")]
    List {
        /// Zero-indexed page of the catalog.
        #[arg(long, default_value = "0")]
        page: u32,
    },

    /// Show details of a game, including its rating.
    Show {
        /// Game ID.
        id: Uuid,
    },

    /// Delete a game and its ratings.
    #[command(alias = "rm")]
    Delete {
        /// Game ID.
        id: Uuid,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },
}

pub async fn list_games(state: &AppState, page: u32, json: bool) -> Result<()> {
    let games = state.games.list(page).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&games)?);
        return Ok(());
    }

    if games.games.is_empty() {
        println!();
        println!(
            "  {} No games on page {}. Publish one with: {}",
            style("i").blue().bold(),
            page,
            style("draftfun generate --publish --name <NAME> <PROMPT>").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("ID").fg(Color::White),
        Cell::new("Author").fg(Color::White),
        Cell::new("Description").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for game in &games.games {
        let desc = game
            .description
            .as_deref()
            .map(|d| truncate_description(d, 50))
            .unwrap_or_default();

        table.add_row(vec![
            Cell::new(&game.name).fg(Color::Cyan),
            Cell::new(game.id).fg(Color::DarkGrey),
            Cell::new(&game.username),
            Cell::new(desc),
            Cell::new(game.created_at.format("%Y-%m-%d").to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  page {} of {} game{}{}",
        style(page).bold(),
        style(games.total_count).bold(),
        if games.total_count == 1 { "" } else { "s" },
        if games.has_more() {
            format!(" (more with --page {})", page + 1)
        } else {
            String::new()
        }
    );
    println!();

    Ok(())
}

/// Shorten a description to at most `max_chars` characters, counting
/// characters rather than bytes so multibyte text never splits.
fn truncate_description(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        short.push_str("...");
        short
    }
}

pub async fn show_game(state: &AppState, id: &Uuid, json: bool) -> Result<()> {
    let game = state
        .games
        .get(id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("game {id} not found"))?;
    let summary = state.games.rating_summary(id).await?;

    if json {
        let out = serde_json::json!({
            "game": game,
            "rating": summary,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("  {}  {}", style("Name:").bold(), style(&game.name).cyan());
    println!("  {}    {}", style("ID:").bold(), game.id);
    println!("  {} {}", style("Author:").bold(), game.username);
    if let Some(desc) = &game.description {
        println!("  {}  {}", style("About:").bold(), desc);
    }
    println!(
        "  {} {}",
        style("Created:").bold(),
        game.created_at.to_rfc3339()
    );
    if summary.count > 0 {
        println!(
            "  {} {:.1} ({} rating{})",
            style("Rating:").bold(),
            summary.average,
            summary.count,
            if summary.count == 1 { "" } else { "s" }
        );
    } else {
        println!("  {} unrated", style("Rating:").bold());
    }
    println!(
        "  {}   {} bytes of HTML",
        style("Code:").bold(),
        game.code.len()
    );
    println!();

    Ok(())
}

pub async fn delete_game(state: &AppState, id: &Uuid, force: bool, json: bool) -> Result<()> {
    let game = state
        .games
        .get(id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("game {id} not found"))?;

    if !force {
        eprintln!(
            "  {} This deletes '{}' and all its ratings. Re-run with --force to confirm.",
            style("!").yellow().bold(),
            game.name
        );
        return Ok(());
    }

    state.games.delete(id).await?;

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!(
            "  {} Deleted '{}'",
            style("✓").green(),
            style(&game.name).cyan()
        );
    }

    Ok(())
}
