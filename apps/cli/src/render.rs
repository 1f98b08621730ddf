//! Terminal rendering of upload events.

use indicatif::{ProgressBar, ProgressStyle};
use pushdeck_upload::UploadEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {msg}")
        .map(|style| style.progress_chars("=>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Draws a progress bar from the orchestrator's event stream until the
/// channel closes. Await the handle after dropping the orchestrator so
/// the last line is printed before the outcome.
pub fn spawn_renderer(mut events: mpsc::Receiver<UploadEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let bar = ProgressBar::new(0);
        bar.set_style(bar_style());

        while let Some(event) = events.recv().await {
            match event {
                UploadEvent::Progress(p) => {
                    if bar.length() != Some(p.total) {
                        bar.set_length(p.total);
                    }
                    bar.set_position(p.uploaded.min(p.total));
                }
                UploadEvent::Stage { unit, stage } => {
                    bar.set_message(format!("{unit}: {stage}"));
                }
                UploadEvent::UnitCompleted { unit } => {
                    bar.println(format!("uploaded {unit}"));
                }
                UploadEvent::UnitFailed(failure) => {
                    bar.println(format!("failed {}: {}", failure.unit, failure.message));
                }
            }
        }
        bar.finish_and_clear();
    })
}
