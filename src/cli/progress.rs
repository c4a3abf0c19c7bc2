//! Progress bar and summary reporting for the CLI.

use indicatif::{ProgressBar, ProgressStyle};

use crate::cancel::{ProgressEvent, ProgressSink};
use crate::format::{format_bytes, format_duration, format_percent, format_speed};
use crate::{AnalysisResult, BatchSummary};

const SEPARATOR: &str = "────────────────────────────────────────────────────────────";

/// Creates the single progress bar shared by every stage.
pub fn make_progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::with_template(
        "{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {percent:>3}% - {msg}",
    )
    .map_or_else(|_| ProgressStyle::default_bar(), |s| s.progress_chars("━━╌"));
    bar.set_style(style);
    bar
}

/// Drives a [`ProgressBar`] from engine progress events.
pub struct BarSink {
    bar: ProgressBar,
}

impl BarSink {
    pub const fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl ProgressSink for BarSink {
    fn on_progress(&self, event: &ProgressEvent) {
        // scan events carry no total; keep the bar length from the last stage
        if event.total > 0 {
            self.bar.set_length(event.total);
        }
        self.bar.set_position(event.current);
        self.bar.set_message(event.message.clone());
    }
}

/// Prints what the analysis found.
pub fn print_analysis(analysis: &AnalysisResult) {
    println!("\n{SEPARATOR}");
    println!("Device contents");
    println!("{SEPARATOR}");
    if analysis.is_empty() {
        println!("  No photos or videos found.");
    } else {
        println!("  Photos:            {}", analysis.image_count());
        println!("  Videos:            {}", analysis.video_count());
        println!("  Total files:       {}", analysis.total_files());
        println!(
            "  Total size:        {}",
            format_bytes(analysis.total_size_bytes())
        );
    }
    println!("{SEPARATOR}\n");
}

/// Prints every record in the analysis.
pub fn print_file_list(analysis: &AnalysisResult) {
    for record in analysis.records() {
        println!("  {} ({})", record.path, format_bytes(record.size));
    }
}

/// Prints a summary of the batch.
pub fn print_summary(summary: &BatchSummary, interrupted: bool) {
    println!("\n{SEPARATOR}");
    if interrupted {
        println!("Download Summary (interrupted)");
    } else {
        println!("Download Summary");
    }
    println!("{SEPARATOR}");
    println!("  Succeeded:         {}", summary.succeeded);
    if summary.skipped > 0 {
        println!("  Transferred:       {}", summary.transferred());
        println!("  Already present:   {}", summary.skipped);
    }
    println!("  Failed:            {}", summary.failed);
    if summary.cancelled > 0 {
        println!("  Cancelled:         {}", summary.cancelled);
    }
    println!(
        "  Success rate:      {}",
        format_percent(summary.succeeded, summary.processed())
    );
    println!("  Written:           {}", format_bytes(summary.bytes));
    println!("  Total time:        {}", format_duration(summary.elapsed));
    if summary.bytes > 0 {
        println!(
            "  Average speed:     {}",
            format_speed(summary.average_speed())
        );
    }
    println!("{SEPARATOR}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_tracks_events() {
        let bar = ProgressBar::hidden();
        let sink = BarSink::new(bar.clone());

        sink.on_progress(&ProgressEvent {
            current: 3,
            total: 10,
            message: "Downloading: IMG_0001.JPG".to_string(),
        });
        assert_eq!(bar.length(), Some(10));
        assert_eq!(bar.position(), 3);
        assert_eq!(bar.message(), "Downloading: IMG_0001.JPG");

        sink.on_progress(&ProgressEvent {
            current: 20,
            total: 0,
            message: "Found 20 media files".to_string(),
        });
        assert_eq!(bar.length(), Some(10));
        assert_eq!(bar.position(), 20);
    }

    #[test]
    fn progress_bar_starts_empty() {
        let bar = make_progress_bar();
        assert_eq!(bar.length(), Some(0));
        assert_eq!(bar.position(), 0);
    }
}
