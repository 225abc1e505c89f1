use super::prompts;
use crate::output::{Output, OutputFormat};
use crate::ConfigCommands;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color, Table};
use media_sync_config::{parse_sections, Config, CredentialStore, PathManager};
use media_sync_sources::{MalClient, PlexClient};
use owo_colors::OwoColorize;
use serde_json::json;

pub async fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { full } => show_config(full, output),
        ConfigCommands::Plex {
            server,
            sections,
            token,
        } => configure_plex(server, sections, token, output).await,
        ConfigCommands::Mal { username, base_url } => {
            configure_mal(username, base_url, output).await
        }
        ConfigCommands::Sync { dry_run } => configure_sync(dry_run, output),
    }
}

fn load_stores(path_manager: &PathManager) -> Result<(Config, CredentialStore)> {
    let config_file = path_manager.config_file();
    let config = Config::load_or_default(&config_file).map_err(|e| {
        color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e)
    })?;

    let mut cred_store = CredentialStore::new(path_manager.credentials_file());
    cred_store
        .load()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load credentials: {}", e))?;

    Ok((config, cred_store))
}

fn save_config(config: &Config, path_manager: &PathManager) -> Result<()> {
    path_manager
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create configuration directories: {}", e))?;
    let config_file = path_manager.config_file();
    config.save_to_file(&config_file).map_err(|e| {
        color_eyre::eyre::eyre!("Failed to save config to {}: {}", config_file.display(), e)
    })
}

fn save_credentials(cred_store: &CredentialStore) -> Result<()> {
    cred_store
        .save()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save credentials: {}", e))
}

fn show_config(full: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();

    if !config_file.exists() {
        output.warn(format!("Configuration file not found at: {}", config_file.display()));
        output.info("Run 'plexmal config plex' and 'plexmal config mal' to create it.");
        return Ok(());
    }

    let (config, cred_store) = load_stores(&path_manager)?;
    let secret = |value: Option<&String>| match value {
        Some(v) if full => v.clone(),
        Some(v) => mask_string(v),
        None => "<not set>".to_string(),
    };
    let plex_token = secret(cred_store.get_plex_token());
    let mal_password = secret(cred_store.get_mal_password());
    let last_sync = cred_store
        .get_last_sync(&config.mal.username)
        .map(|t| t.to_rfc3339());

    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return Ok(());
            }

            println!("\n{}", "Configuration".bright_cyan().bold());
            println!("{} {}\n", "Config file:".bright_black(), config_file.display());

            let mut plex_table = section_table("Plex");
            plex_table.add_row(vec![Cell::new("Server"), Cell::new(or_not_set(&config.plex.server))]);
            plex_table.add_row(vec![
                Cell::new("Sections"),
                Cell::new(or_not_set(&config.plex.sections.join(", "))),
            ]);
            plex_table.add_row(vec![Cell::new("Token"), Cell::new(&plex_token)]);
            println!("{}\n", plex_table);

            let mut mal_table = section_table("MyAnimeList");
            mal_table.add_row(vec![Cell::new("Username"), Cell::new(or_not_set(&config.mal.username))]);
            mal_table.add_row(vec![Cell::new("Password"), Cell::new(&mal_password)]);
            mal_table.add_row(vec![Cell::new("API base URL"), Cell::new(&config.mal.base_url)]);
            println!("{}\n", mal_table);

            let mut sync_table = section_table("Sync");
            sync_table.add_row(vec![
                Cell::new("Dry run"),
                Cell::new(if config.sync.dry_run { "✓".green().to_string() } else { "✗".red().to_string() }),
            ]);
            sync_table.add_row(vec![Cell::new("List status"), Cell::new(config.sync.list_status.to_string())]);
            sync_table.add_row(vec![
                Cell::new("Last sync"),
                Cell::new(last_sync.as_deref().unwrap_or("never")),
            ]);
            if !config.mal.username.is_empty() {
                sync_table.add_row(vec![
                    Cell::new("Processed record"),
                    Cell::new(path_manager.processed_cache_file(&config.mal.username).display()),
                ]);
            }
            println!("{}", sync_table);
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "config_file": config_file.display().to_string(),
                "plex": {
                    "server": config.plex.server,
                    "sections": config.plex.sections,
                    "token": plex_token,
                },
                "mal": {
                    "username": config.mal.username,
                    "password": mal_password,
                    "base_url": config.mal.base_url,
                },
                "sync": {
                    "dry_run": config.sync.dry_run,
                    "list_status": config.sync.list_status,
                    "last_sync": last_sync,
                },
            }));
        }
    }

    Ok(())
}

async fn configure_plex(
    server_arg: Option<String>,
    sections_arg: Option<String>,
    token_arg: Option<String>,
    output: &Output,
) -> Result<()> {
    let path_manager = PathManager::default();
    let (mut config, mut cred_store) = load_stores(&path_manager)?;

    let server = match server_arg {
        Some(server) => server.trim().to_string(),
        None => prompts::prompt_string("Plex server (host:port or URL)", Some(&config.plex.server))?,
    };
    if server.is_empty() {
        return Err(color_eyre::eyre::eyre!("Plex server is required"));
    }

    let raw_sections = match sections_arg {
        Some(raw) => raw,
        None => prompts::prompt_string(
            "Library section keys (comma-separated)",
            Some(&config.plex.sections.join(",")),
        )?,
    };
    let sections = parse_sections(&raw_sections);
    if sections.is_empty() {
        return Err(color_eyre::eyre::eyre!("At least one library section is required"));
    }

    let token = match token_arg {
        Some(token) => token.trim().to_string(),
        None => prompts::prompt_password("Plex token")?,
    };
    if token.is_empty() {
        return Err(color_eyre::eyre::eyre!("Plex token is required"));
    }

    output.info(format!("Checking Plex server at {}...", server));
    PlexClient::new(&server, &token)
        .map_err(|e| color_eyre::eyre::eyre!("Invalid Plex settings: {}", e))?
        .verify()
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Could not reach Plex server {}: {}", server, e))?;

    config.plex.server = server;
    config.plex.sections = sections;
    cred_store.set_plex_token(token);

    save_config(&config, &path_manager)?;
    save_credentials(&cred_store)?;

    output.success(format!(
        "Plex configured: {} (sections {})",
        config.plex.server,
        config.plex.sections.join(", ")
    ));
    Ok(())
}

async fn configure_mal(
    username_arg: Option<String>,
    base_url_arg: Option<String>,
    output: &Output,
) -> Result<()> {
    let path_manager = PathManager::default();
    let (mut config, mut cred_store) = load_stores(&path_manager)?;

    let username = match username_arg {
        Some(user) => user.trim().to_string(),
        None => prompts::prompt_string("MyAnimeList username", Some(&config.mal.username))?,
    };
    if username.is_empty() {
        return Err(color_eyre::eyre::eyre!("Username is required"));
    }

    let password = prompts::prompt_password("MyAnimeList password")?;
    if password.is_empty() {
        return Err(color_eyre::eyre::eyre!("Password is required"));
    }

    if let Some(base_url) = base_url_arg.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
        config.mal.base_url = base_url;
    }

    output.info(format!("Verifying MyAnimeList credentials for {}...", username));
    MalClient::new(&config.mal.base_url, username.clone(), password.clone())
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create MyAnimeList client: {}", e))?
        .authenticate()
        .await
        .map_err(|e| color_eyre::eyre::eyre!("MyAnimeList login failed: {}", e))?;

    config.mal.username = username;
    cred_store.set_mal_password(password);

    save_config(&config, &path_manager)?;
    save_credentials(&cred_store)?;

    output.success(format!("MyAnimeList configured for {}", config.mal.username));
    Ok(())
}

fn configure_sync(dry_run: Option<bool>, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let (mut config, _) = load_stores(&path_manager)?;

    let Some(dry_run) = dry_run else {
        output.warn("No sync option specified. Use --dry-run <true|false>");
        return Ok(());
    };

    config.sync.dry_run = dry_run;
    save_config(&config, &path_manager)?;
    output.success(format!("Dry run {}", if dry_run { "enabled" } else { "disabled" }));
    Ok(())
}

fn section_table(title: &str) -> Table {
    let mut table = Table::new();
    table.set_header(vec![Cell::new(format!("{} Configuration", title))
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)]);
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}

fn or_not_set(value: &str) -> String {
    if value.is_empty() {
        "<not set>".to_string()
    } else {
        value.to_string()
    }
}

fn mask_string(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.is_empty() {
        return "<not set>".to_string();
    }
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}
