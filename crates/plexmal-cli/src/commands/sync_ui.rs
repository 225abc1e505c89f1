use indicatif::{ProgressBar, ProgressStyle};
use media_sync_core::{ProgressEvent, ProgressOutcome, SyncEvent, TitleOutcome};
use std::io::IsTerminal;

/// Progress over library titles, driven by orchestrator events.
///
/// Falls back to structured log lines when not attached to a terminal.
#[derive(Clone)]
pub struct SyncUI {
    bar: ProgressBar,
    interactive: bool,
}

impl SyncUI {
    pub fn new() -> Self {
        let interactive = is_interactive();

        let bar = if interactive {
            let bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
            {
                bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
            }
            bar.set_message("Fetching library titles...");
            bar.enable_steady_tick(std::time::Duration::from_millis(120));
            bar
        } else {
            tracing::info!(
                operation = "ui_init",
                mode = "non_interactive",
                "Running in non-interactive mode - progress bars disabled, using structured logging"
            );
            ProgressBar::hidden()
        };

        Self { bar, interactive }
    }

    pub fn handle(&self, event: &SyncEvent) {
        match event {
            SyncEvent::Fetched { total } => self.start_titles(*total),
            SyncEvent::Title {
                position,
                total,
                title,
                outcome,
            } => self.advance(*position, *total, title, describe(outcome)),
        }
    }

    pub fn handle_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Fetched { total } => self.start_titles(*total),
            ProgressEvent::Show {
                position,
                total,
                title,
                outcome,
            } => self.advance(*position, *total, title, describe_progress(outcome)),
        }
    }

    fn advance(&self, position: usize, total: usize, title: &str, outcome: &str) {
        if self.interactive {
            self.bar.set_position(position as u64);
            self.bar.set_message(format!("{} {}", outcome, title));
        } else {
            tracing::debug!(
                operation = "progress",
                current = position,
                total = total,
                title = %title,
                outcome = outcome,
                "Sync progress update"
            );
        }
    }

    fn start_titles(&self, total: usize) {
        if !self.interactive {
            return;
        }

        self.bar.set_length(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
        {
            self.bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
        }
        self.bar.set_message(format!("{} titles", total));
    }

    pub fn finish(&self) {
        if self.interactive {
            self.bar.finish_and_clear();
        }
    }

    pub fn abandon(&self) {
        if self.interactive {
            self.bar.abandon_with_message("Sync stopped");
        }
    }
}

fn describe(outcome: &TitleOutcome) -> &'static str {
    match outcome {
        TitleOutcome::Skipped => "skipped",
        TitleOutcome::Unrecordable => "unrecordable",
        TitleOutcome::NoResults => "no results",
        TitleOutcome::NoMatch => "no match",
        TitleOutcome::Added { .. } => "added",
        TitleOutcome::AlreadyPresent { .. } => "already on list",
        TitleOutcome::Other { .. } => "unexpected response",
        TitleOutcome::Matched { .. } => "matched",
    }
}

fn describe_progress(outcome: &ProgressOutcome) -> &'static str {
    match outcome {
        ProgressOutcome::UpToDate { .. } => "up to date",
        ProgressOutcome::Updated { .. } => "updated",
        ProgressOutcome::Added { .. } => "added",
        ProgressOutcome::NoResults => "no results",
        ProgressOutcome::NoMatch => "no match",
        ProgressOutcome::Planned { .. } => "planned",
        ProgressOutcome::Other { .. } => "unexpected response",
    }
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}
