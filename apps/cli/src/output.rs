use std::time::{Duration, Instant};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

pub fn format_elapsed(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .expect("static spinner template"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Clears the spinner and prints a check line with the elapsed time.
pub fn finish(spinner: ProgressBar, msg: &str, started: Instant) {
    spinner.finish_with_message(format!(
        "{} {} {}",
        style("✓").green().bold(),
        msg,
        style(format!("[{}]", format_elapsed(started.elapsed()))).dim()
    ));
}

/// Clears the spinner and prints a failure line.
pub fn fail(spinner: ProgressBar, msg: &str) {
    spinner.finish_with_message(format!("{} {}", style("✗").red().bold(), msg));
}

pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

pub fn warning(msg: &str) {
    eprintln!("{} {}", style("!").yellow().bold(), style(msg).yellow());
}

pub fn rule() {
    println!("{}", style("─".repeat(60)).dim());
}

pub fn header(title: &str, subtitle: &str) {
    println!("\n{}  {}\n", style(title).cyan().bold(), style(subtitle).dim());
}
