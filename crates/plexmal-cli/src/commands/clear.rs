use super::prompts;
use crate::output::Output;
use color_eyre::Result;
use media_sync_config::PathManager;
use std::fs;
use std::path::Path;

pub async fn run_clear(user: Option<String>, credentials: bool, all: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();

    if all {
        if prompts::can_prompt()
            && !prompts::prompt_yes_no(
                "Forget every processed title and stored credential?",
                false,
            )?
        {
            output.info("Nothing cleared");
            return Ok(());
        }
        let removed = clear_all_processed(path_manager.data_dir(), output)?;
        clear_credentials(&path_manager, output)?;
        output.success(format!(
            "Cleared {} processed record(s) and stored credentials",
            removed
        ));
        return Ok(());
    }

    let mut cleared_anything = false;

    if let Some(user) = user.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        clear_processed(&path_manager, user, output)?;
        cleared_anything = true;
    }

    if credentials {
        clear_credentials(&path_manager, output)?;
        cleared_anything = true;
    }

    if !cleared_anything {
        output.warn("No clear option specified. Use --user <USER>, --credentials, or --all");
        output.info("\nExample: plexmal clear --user john");
    }

    Ok(())
}

fn clear_processed(path_manager: &PathManager, user: &str, output: &Output) -> Result<()> {
    let record = path_manager.processed_cache_file(user);

    if record.exists() {
        fs::remove_file(&record).map_err(|e| {
            color_eyre::eyre::eyre!(
                "Failed to remove processed record at {}: {}",
                record.display(),
                e
            )
        })?;
        output.success(format!("Cleared processed titles for {}: {}", user, record.display()));
    } else {
        output.info(format!("No processed titles recorded for {}", user));
    }

    Ok(())
}

/// Remove every `AnimeProcessed_*.cache` file in `data_dir`
fn clear_all_processed(data_dir: &Path, output: &Output) -> Result<usize> {
    if !data_dir.exists() {
        output.info("No processed records found to clear");
        return Ok(0);
    }

    let entries = fs::read_dir(data_dir).map_err(|e| {
        color_eyre::eyre::eyre!("Failed to read data directory {}: {}", data_dir.display(), e)
    })?;

    let mut removed = 0;
    for entry in entries {
        let path = entry?.path();
        if !is_processed_record(&path) {
            continue;
        }
        fs::remove_file(&path).map_err(|e| {
            color_eyre::eyre::eyre!("Failed to remove {}: {}", path.display(), e)
        })?;
        tracing::debug!("Removed processed record {}", path.display());
        removed += 1;
    }

    Ok(removed)
}

fn is_processed_record(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with("AnimeProcessed_") && n.ends_with(".cache"))
        .unwrap_or(false)
}

fn clear_credentials(path_manager: &PathManager, output: &Output) -> Result<()> {
    let credentials_file = path_manager.credentials_file();

    if credentials_file.exists() {
        fs::remove_file(&credentials_file).map_err(|e| {
            color_eyre::eyre::eyre!(
                "Failed to remove credentials file at {}: {}",
                credentials_file.display(),
                e
            )
        })?;
        output.success(format!("Cleared credentials: {}", credentials_file.display()));
    } else {
        output.info("No credentials file found to clear");
    }

    Ok(())
}
