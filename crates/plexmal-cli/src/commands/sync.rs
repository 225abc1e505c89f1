use super::prompts;
use super::sync_ui::SyncUI;
use crate::output::{Output, OutputFormat};
use clap::{ArgAction, Args};
use color_eyre::Result;
use media_sync_config::{parse_sections, Config, CredentialStore, PathManager};
use media_sync_core::{SyncError, SyncOrchestrator, SyncResult, SyncSession};
use media_sync_sources::{MalClient, PlexClient};
use serde_json::json;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    /// MyAnimeList username (default: config `mal.username`)
    #[arg(long)]
    pub user: Option<String>,

    /// MyAnimeList password (default: stored credentials, then a prompt)
    #[arg(long, env = "PLEXMAL_MAL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Plex server, `host:port` or a full URL (default: config `plex.server`)
    #[arg(long)]
    pub server: Option<String>,

    /// Plex access token (default: stored credentials)
    #[arg(long, env = "PLEXMAL_PLEX_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Comma-separated library section keys, e.g. "2,5" (default: config `plex.sections`)
    #[arg(long)]
    pub sections: Option<String>,

    /// Search and match only; nothing is added or recorded as processed
    #[arg(long, action = ArgAction::SetTrue)]
    pub dry_run: bool,
}

/// Everything a run needs, after flags, config and credentials are merged
pub(super) struct Inputs {
    pub(super) config: Config,
    pub(super) password: String,
    pub(super) token: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Flags win over the config file and the credential store
fn merge_inputs(
    args: SyncArgs,
    mut config: Config,
    credentials: &CredentialStore,
) -> Result<Inputs> {
    if let Some(user) = non_empty(args.user) {
        config.mal.username = user;
    }
    if let Some(server) = non_empty(args.server) {
        config.plex.server = server;
    }
    if let Some(raw) = args.sections {
        config.plex.sections = parse_sections(&raw);
    }
    if args.dry_run {
        config.sync.dry_run = true;
    }

    config
        .validate()
        .map_err(|e| color_eyre::eyre::eyre!("Invalid sync input: {}", e))?;

    let token = non_empty(args.token)
        .or_else(|| non_empty(credentials.get_plex_token().cloned()))
        .ok_or_else(|| {
            color_eyre::eyre::eyre!(
                "Invalid sync input: Plex token is required (use --token or 'plexmal config plex')"
            )
        })?;

    let password = match args
        .password
        .filter(|p| !p.is_empty())
        .or_else(|| credentials.get_mal_password().filter(|p| !p.is_empty()).cloned())
    {
        Some(password) => password,
        None if prompts::can_prompt() => {
            prompts::prompt_password(&format!("MyAnimeList password for {}", config.mal.username))?
        }
        None => {
            return Err(color_eyre::eyre::eyre!(
                "Invalid sync input: MyAnimeList password is required (use --password or 'plexmal config mal')"
            ))
        }
    };
    if password.is_empty() {
        return Err(color_eyre::eyre::eyre!(
            "Invalid sync input: MyAnimeList password is required"
        ));
    }

    Ok(Inputs {
        config,
        password,
        token,
    })
}

/// Load config and credentials, then merge them with the flags
pub(super) fn load_inputs(
    args: SyncArgs,
    path_manager: &PathManager,
) -> Result<(Inputs, CredentialStore)> {
    let config_file = path_manager.config_file();
    let config = Config::load_or_default(&config_file).map_err(|e| {
        color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e)
    })?;

    let credentials_file = path_manager.credentials_file();
    let mut cred_store = CredentialStore::new(credentials_file.clone());
    cred_store.load().map_err(|e| {
        color_eyre::eyre::eyre!(
            "Failed to load credentials from {}: {}",
            credentials_file.display(),
            e
        )
    })?;

    // Malformed inputs are reported before anything is contacted
    let inputs = merge_inputs(args, config, &cred_store)?;
    Ok((inputs, cred_store))
}

pub async fn run_sync(args: SyncArgs, output: &Output) -> Result<()> {
    tracing::debug!("Sync command started");

    let path_manager = PathManager::default();
    let (inputs, mut cred_store) = load_inputs(args, &path_manager)?;
    let config = inputs.config;
    let user = config.mal.username.clone();

    let session = SyncSession::new(
        &user,
        config.plex.sections.clone(),
        path_manager.processed_cache_file(&user),
    )
    .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let plex = PlexClient::new(&config.plex.server, &inputs.token)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create Plex client: {}", e))?;
    let mal = Arc::new(
        MalClient::new(&config.mal.base_url, user.clone(), inputs.password)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to create MyAnimeList client: {}", e))?,
    );

    tracing::info!(
        user = %user,
        server = plex.server_url(),
        sections = ?session.sections(),
        processed = %session.processed_path().display(),
        dry_run = config.sync.dry_run,
        "Starting sync"
    );

    let ui = SyncUI::new();
    let handler_ui = ui.clone();
    let dry_run = config.sync.dry_run;
    let mut orchestrator = SyncOrchestrator::new(Arc::new(plex), mal.clone(), mal)
        .with_options(config.sync)
        .with_event_handler(move |event| handler_ui.handle(event));

    let result = match orchestrator.sync(&session).await {
        Ok(result) => {
            ui.finish();
            result
        }
        Err(e) => {
            ui.abandon();
            return Err(report_failure("Sync", &e, output));
        }
    };

    if !dry_run {
        cred_store.set_last_sync(&user, chrono::Utc::now());
        if let Err(e) = cred_store.save() {
            tracing::warn!("Failed to save last sync time: {}", e);
        }
    }

    print_summary(&result, dry_run, output);
    Ok(())
}

/// Print the failure for the user and turn it into the command's error
pub(super) fn report_failure(
    operation: &str,
    error: &SyncError,
    output: &Output,
) -> color_eyre::Report {
    let message = format!("{} failed: {}", operation, error);
    output.error(&message);
    color_eyre::eyre::eyre!(message)
}

fn print_summary(result: &SyncResult, dry_run: bool, output: &Output) {
    match output.format() {
        OutputFormat::Human => {
            if dry_run {
                output.info(format!(
                    "Dry run: {} title(s) would be added to the list",
                    result.dry_run_matches
                ));
            }
            output.info(format!(
                "{} library title(s): {} already processed, {} unrecordable, {} added, {} already on list, {} unexpected response(s), {} without results, {} without a match",
                result.titles_fetched,
                result.skipped,
                result.unrecordable,
                result.added,
                result.already_present,
                result.other_responses,
                result.no_results,
                result.no_match
            ));
            output.success(format!(
                "Sync completed: {} title(s) recorded in {:?}",
                result.recorded(),
                result.duration
            ));
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "success": true,
                "dry_run": dry_run,
                "titles_fetched": result.titles_fetched,
                "skipped": result.skipped,
                "unrecordable": result.unrecordable,
                "added": result.added,
                "already_present": result.already_present,
                "other_responses": result.other_responses,
                "no_results": result.no_results,
                "no_match": result.no_match,
                "dry_run_matches": result.dry_run_matches,
                "recorded": result.recorded(),
                "duration_seconds": result.duration.as_secs_f64(),
            }));
        }
    }
}
