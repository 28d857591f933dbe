//! Terminal progress for synchronization runs

use crate::display::{format_bytes, phase_label};
use console::style;
use ferrosync_sync::{FileAction, ProgressEvent};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

/// Renders [`ProgressEvent`]s as a spinner that turns into a bar once the
/// amount of work is known, printing one line per uploaded or deleted file
pub struct ProgressDisplay {
    progress_bar: Option<ProgressBar>,
}

impl ProgressDisplay {
    /// Create a display; nothing is drawn in quiet mode
    pub fn new(quiet: bool) -> Self {
        let progress_bar = if quiet {
            None
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            Some(pb)
        };

        Self { progress_bar }
    }

    /// Consume events until every sender is gone
    pub async fn run(mut self, mut events: UnboundedReceiver<ProgressEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(&event);
        }
        if let Some(pb) = self.progress_bar.take() {
            pb.finish_and_clear();
        }
    }

    fn handle(&self, event: &ProgressEvent) {
        let Some(pb) = &self.progress_bar else {
            return;
        };

        match event {
            ProgressEvent::PhaseChanged(phase) => pb.set_message(phase_label(*phase)),
            ProgressEvent::TotalsKnown { files, bytes } => {
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("{spinner:.green} {msg} [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("█▉▊▋▌▍▎▏  "),
                );
                pb.set_length(*files);
                pb.set_position(0);
                pb.println(format!(
                    "{} {} file operations, {} to upload",
                    style("→").green().bold(),
                    files,
                    format_bytes(*bytes)
                ));
            }
            ProgressEvent::FileStarted(path, action) => {
                pb.set_message(format!("{} {}", action_verb(*action), path));
            }
            ProgressEvent::FileCompleted(path, action, _) => {
                pb.inc(1);
                pb.println(file_line(path, *action));
            }
            ProgressEvent::Completed(_) => pb.finish_and_clear(),
            ProgressEvent::Failed(message) => {
                pb.abandon_with_message(format!("{} {}", style("Failed:").red(), message));
            }
        }
    }
}

fn action_verb(action: FileAction) -> &'static str {
    match action {
        FileAction::Upload => "Uploading",
        FileAction::Delete => "Deleting",
    }
}

/// `[+] path` for uploads, `[-] path` for deletes
pub fn file_line(path: &str, action: FileAction) -> String {
    match action {
        FileAction::Upload => format!("{} {}", style("[+]").green(), path),
        FileAction::Delete => format!("{} {}", style("[-]").red(), path),
    }
}
