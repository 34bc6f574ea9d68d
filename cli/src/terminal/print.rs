use colored::*;

use sweepr_core::sweep::SweepReport;

pub const TOTAL_WIDTH: usize = 64;

pub fn header(msg: &str) {
    let formatted: String = format!("⟦ {} ⟧", msg);
    let msg_len: usize = formatted.chars().count();

    let dash_count: usize = TOTAL_WIDTH.saturating_sub(msg_len);
    let left: usize = dash_count / 2;
    let right: usize = dash_count - left;

    let line: ColoredString = format!(
        "{}{}{}",
        "─".repeat(left),
        formatted.to_uppercase().bright_green(),
        "─".repeat(right)
    )
    .bright_black();

    eprintln!("{line}");
}

pub fn summary(report: &SweepReport) {
    header("sweep complete");
    aligned_line("blocks scanned this run", report.blocks_scanned.to_string());
    aligned_line(
        "servers found this run",
        report.servers_found.to_string().green().bold().to_string(),
    );
    aligned_line(
        "blocks on record",
        report.blocks_claimed_total.to_string(),
    );
    aligned_line("workers exited", report.workers.to_string());
}

fn aligned_line(key: &str, value: String) {
    const KEY_WIDTH: usize = 26;
    let dots: String = ".".repeat(KEY_WIDTH.saturating_sub(key.len()));
    let prefix: ColoredString = ">".bright_black();
    eprintln!("{} {}{}: {}", prefix, key, dots.bright_black(), value);
}
