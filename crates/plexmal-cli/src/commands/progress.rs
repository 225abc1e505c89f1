use super::sync::{load_inputs, report_failure, SyncArgs};
use super::sync_ui::SyncUI;
use crate::output::{Output, OutputFormat};
use color_eyre::Result;
use media_sync_config::PathManager;
use media_sync_core::{ProgressResult, ProgressSync};
use media_sync_sources::{MalClient, PlexClient};
use serde_json::json;
use std::sync::Arc;

pub async fn run_progress(args: SyncArgs, output: &Output) -> Result<()> {
    tracing::debug!("Progress command started");

    let path_manager = PathManager::default();
    let (inputs, _) = load_inputs(args, &path_manager)?;
    let config = inputs.config;
    let user = config.mal.username.clone();

    let plex = PlexClient::new(&config.plex.server, &inputs.token)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create Plex client: {}", e))?;
    let mal = Arc::new(
        MalClient::new(&config.mal.base_url, user.clone(), inputs.password)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to create MyAnimeList client: {}", e))?,
    );

    let dry_run = config.sync.dry_run;
    tracing::info!(
        user = %user,
        server = plex.server_url(),
        sections = ?config.plex.sections,
        dry_run,
        "Starting progress sync"
    );

    let ui = SyncUI::new();
    let handler_ui = ui.clone();
    let mut progress = ProgressSync::new(Arc::new(plex), mal.clone(), mal)
        .with_dry_run(dry_run)
        .with_event_handler(move |event| handler_ui.handle_progress(event));

    let result = match progress.sync(&config.plex.sections).await {
        Ok(result) => {
            ui.finish();
            result
        }
        Err(e) => {
            ui.abandon();
            return Err(report_failure("Progress sync", &e, output));
        }
    };

    print_summary(&result, dry_run, output);
    Ok(())
}

fn print_summary(result: &ProgressResult, dry_run: bool, output: &Output) {
    match output.format() {
        OutputFormat::Human => {
            if dry_run {
                output.info(format!(
                    "Dry run: {} list change(s) would be sent",
                    result.planned
                ));
            }
            output.info(format!(
                "{} watched show(s): {} updated, {} added, {} up to date, {} unexpected response(s), {} without results, {} without a match",
                result.shows_fetched,
                result.updated,
                result.added,
                result.up_to_date,
                result.other_responses,
                result.no_results,
                result.no_match
            ));
            output.success(format!("Progress sync completed in {:?}", result.duration));
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "success": true,
                "dry_run": dry_run,
                "shows_fetched": result.shows_fetched,
                "updated": result.updated,
                "added": result.added,
                "up_to_date": result.up_to_date,
                "other_responses": result.other_responses,
                "no_results": result.no_results,
                "no_match": result.no_match,
                "planned": result.planned,
                "duration_seconds": result.duration.as_secs_f64(),
            }));
        }
    }
}
