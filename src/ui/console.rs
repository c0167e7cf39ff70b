// Terminal output for the CLI

use colored::Colorize;

use super::formatters::format_clock;
use super::labels::{Labels, ENERGY_SAVING, NOT_SUPPORTED};
use crate::core::config::{EffectiveSettings, SettingKey, Settings};
use crate::core::power::PowerPlan;
use crate::core::telemetry::metrics::MetricSnapshot;

/// Display a warning message
pub fn warn(message: &str) {
    println!("{}", format!("Warning: {}", message).yellow().bold());
}

/// Display an info message
pub fn info(message: &str) {
    println!("{}", message.cyan());
}

/// Display a success message
pub fn success(message: &str) {
    println!("{}", message.green().bold());
}

/// Display an error message
pub fn error(message: &str) {
    eprintln!("{}", message.red().bold());
}

fn value(text: &str) -> colored::ColoredString {
    match text {
        NOT_SUPPORTED => text.dimmed(),
        ENERGY_SAVING => text.yellow(),
        _ => text.white().bold(),
    }
}

fn bar(percent: u8) -> String {
    let filled = (percent as usize * 20) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(20 - filled))
}

pub fn print_labels(labels: &Labels) {
    let header = match labels.sequence {
        Some(seq) => format!("Snapshot #{}", seq),
        None => "Monitoring stopped".to_string(),
    };
    println!("\n{}", header.bold().bright_cyan());
    println!("{}", "=".repeat(60));

    println!("{} {}", "CPU".bold(), labels.cpu_name.dimmed());
    println!(
        "  {} {}  {}  {}  {}",
        bar(labels.cpu_usage_bar).cyan(),
        labels.cpu_usage,
        value(&labels.cpu_frequency),
        value(&labels.cpu_temperature),
        value(&labels.cpu_fan)
    );

    println!("{} {}", "GPU".bold(), labels.gpu_name.dimmed());
    println!(
        "  {} {}  {}  {}  {}  {}",
        bar(labels.gpu_usage_bar).cyan(),
        labels.gpu_usage,
        value(&labels.gpu_frequency),
        value(&labels.gpu_memory),
        value(&labels.gpu_temperature),
        value(&labels.gpu_fan)
    );

    println!("{} {}", bar(labels.ram_bar).green(), labels.ram);
    println!("{} {}", bar(labels.disk_bar).green(), labels.disk);
    if !labels.disk_info.is_empty() {
        println!("  {}", labels.disk_info.replace('\n', "  ").dimmed());
    }

    let battery = labels.battery_info.as_deref().unwrap_or("Battery");
    println!("{} {}", bar(labels.battery_bar.round() as u8).yellow(), battery);
}

/// Full, unrounded view of one snapshot.
pub fn print_snapshot(snapshot: &MetricSnapshot) {
    println!(
        "{} {}",
        format!("Snapshot #{}", snapshot.sequence).bold().bright_cyan(),
        format_clock(&snapshot.taken_at).dimmed()
    );

    fn line<T: std::fmt::Debug>(name: &str, result: &Result<T, crate::core::telemetry::ProviderError>) {
        match result {
            Ok(sample) => println!("  {} {:?}", format!("{:<8}", name).bold(), sample),
            Err(e) => println!("  {} {}", format!("{:<8}", name).bold(), e.to_string().yellow()),
        }
    }

    line("cpu", &snapshot.cpu);
    line("gpu", &snapshot.gpu);
    line("memory", &snapshot.memory);
    line("disk", &snapshot.disk);
    line("battery", &snapshot.battery);
}

pub fn print_plans(plans: &[PowerPlan]) {
    if plans.is_empty() {
        warn("No power plans reported");
        return;
    }

    println!("\n{}", "POWER PLANS".bold().bright_cyan());
    println!("{}", "=".repeat(60));
    for plan in plans {
        let marker = if plan.is_active { "*".green().bold() } else { " ".normal() };
        let padded = format!("{:<28}", plan.display_name);
        let name = if plan.is_active {
            padded.green().bold()
        } else {
            padded.white()
        };
        println!("{} {} {}", marker, name, plan.id.dimmed());
    }
}

pub fn print_settings(settings: &Settings, effective: &EffectiveSettings) {
    println!("\n{}", "SETTINGS".bold().bright_cyan());
    println!("{}", "=".repeat(60));

    for key in SettingKey::ALL {
        let shown = match key {
            SettingKey::Monitoring => effective.monitoring.to_string(),
            SettingKey::Interval => format!("{}s", effective.interval_seconds),
            SettingKey::FanProfile => format!(
                "{} ({})",
                effective.fan_profile.index(),
                effective.fan_profile
            ),
            SettingKey::StartUp => effective.start_up.to_string(),
            SettingKey::Drive => effective.drive.clone(),
        };
        let source = if settings.raw(key).is_some() { "" } else { " (default)" };
        println!(
            "  {} {}{}",
            format!("{:<12}", key.as_str()).bold(),
            shown,
            source.dimmed()
        );
    }
}
