use std::io;
use std::sync::OnceLock;
use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use sweepr_core::sweep::SweepProgress;

static SPINNER: OnceLock<ProgressBar> = OnceLock::new();

pub fn start() {
    let spinner = SPINNER.get_or_init(init_spinner);
    spinner.set_message("waiting for the first block...");
}

pub fn update(progress: SweepProgress) {
    if let Some(spinner) = SPINNER.get() {
        spinner.set_message(format!(
            "{} blocks scanned, {} servers found",
            progress.blocks_scanned.to_string().bold(),
            progress.servers_found.to_string().green().bold()
        ));
    }
}

pub fn finish() {
    if let Some(spinner) = SPINNER.get() {
        spinner.finish_and_clear();
    }
}

fn init_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.blue} {msg}")
        .unwrap()
        .tick_strings(&[
            "▁▁▁▁▁",
            "▁▂▂▂▁",
            "▁▄▂▄▁",
            "▂▄▆▄▂",
            "▄▆█▆▄",
            "▂▄▆▄▂",
            "▁▄▂▄▁",
            "▁▂▂▂▁",
        ]);

    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Routes log lines above the spinner while it runs, straight to stderr
/// otherwise.
pub struct SpinnerWriter;

impl io::Write for SpinnerWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let msg = String::from_utf8_lossy(buf);
        let msg = msg.trim_end();
        match SPINNER.get() {
            Some(spinner) if !spinner.is_finished() => spinner.println(msg),
            _ => eprintln!("{msg}"),
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
