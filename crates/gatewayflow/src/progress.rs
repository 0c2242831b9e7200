use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

/// Spinner shown while a long-running operation is awaited
pub struct OperationProgress {
    progress_bar: Option<ProgressBar>,
}

impl OperationProgress {
    /// Starts a spinner when stdout is a terminal; otherwise does nothing
    pub fn start(enabled: bool, message: &str) -> Self {
        if !enabled || !std::io::stdout().is_terminal() {
            return Self { progress_bar: None };
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));

        Self {
            progress_bar: Some(pb),
        }
    }

    pub fn finish(&self) {
        if let Some(pb) = &self.progress_bar {
            pb.finish_and_clear();
        }
    }
}

impl Drop for OperationProgress {
    fn drop(&mut self) {
        self.finish();
    }
}
