//! `draftfun generate` command: one-shot generation from the terminal.

use std::time::Duration;

use anyhow::{Context, bail};
use indicatif::{ProgressBar, ProgressStyle};

use draftfun_core::repository::GameRepository;
use draftfun_core::session::{TurnOutcome, TurnUpdate};
use draftfun_types::game::NewGame;
use draftfun_types::llm::StreamEvent;
use draftfun_types::session::EngineVariant;

use crate::state::AppState;

#[allow(clippy::too_many_arguments)]
pub async fn run_generate(
    state: &AppState,
    prompt: &str,
    engine: &str,
    output: &str,
    show_reasoning: bool,
    publish: bool,
    name: Option<String>,
    description: Option<String>,
    username: &str,
    json: bool,
) -> anyhow::Result<()> {
    let variant: EngineVariant = engine
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown engine '{engine}' (expected classic or beta)"))?;

    if publish && name.is_none() {
        bail!("--publish requires --name");
    }

    let id = state.create_session(variant)?;
    let entry = state
        .session(&id)
        .context("session vanished before first turn")?;
    let session = entry
        .session
        .clone()
        .try_lock_owned()
        .map_err(|_| anyhow::anyhow!("session is busy"))?;

    let spinner = if json {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("  {spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(80));
        pb.set_message(format!("Generating with {variant} engine..."));
        pb
    };

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<TurnUpdate>();
    let user_prompt = prompt.to_string();
    let handle = tokio::spawn(async move {
        let mut session = session;
        session.submit(&user_prompt, Some(tx)).await
    });

    let mut received: usize = 0;
    while let Some(update) = rx.recv().await {
        match update {
            TurnUpdate::Frame(StreamEvent::TextDelta { text }) => {
                received += text.len();
                spinner.set_message(format!("Generating... {received} bytes"));
            }
            TurnUpdate::Frame(StreamEvent::ReasoningDelta { text }) => {
                if show_reasoning && !json {
                    spinner.suspend(|| {
                        print!("{}", console::style(text).dim());
                    });
                }
            }
            TurnUpdate::PlausiblyComplete => {
                spinner.set_message(format!("Finishing up... {received} bytes"));
            }
            TurnUpdate::Frame(StreamEvent::Connected) | TurnUpdate::Frame(StreamEvent::Done) => {}
        }
    }

    let outcome = handle.await.context("generation task panicked")??;
    let artifact = match outcome {
        TurnOutcome::Committed { artifact } => artifact,
        TurnOutcome::Failed { error } => {
            spinner.finish_and_clear();
            bail!("generation failed: {error}");
        }
        TurnOutcome::Cancelled => {
            spinner.finish_and_clear();
            bail!("generation was cancelled");
        }
    };
    spinner.finish_and_clear();

    tokio::fs::write(output, &artifact)
        .await
        .with_context(|| format!("failed to write {output}"))?;

    let published = if publish {
        let game = state
            .games
            .insert(&NewGame {
                // checked above
                name: name.unwrap_or_default(),
                description,
                code: artifact.clone(),
                username: username.to_string(),
            })
            .await?;
        Some(game)
    } else {
        None
    };

    state.remove_session(&id);

    if json {
        let out = serde_json::json!({
            "output": output,
            "bytes": artifact.len(),
            "engine": variant.to_string(),
            "published": published.as_ref().map(|g| g.id),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!();
        println!(
            "  {} Wrote {} ({} bytes)",
            console::style("✓").green(),
            console::style(output).cyan(),
            artifact.len()
        );
        if let Some(game) = &published {
            println!(
                "  {} Published as '{}' ({})",
                console::style("✓").green(),
                console::style(&game.name).cyan(),
                game.id
            );
        }
        println!();
    }

    Ok(())
}
