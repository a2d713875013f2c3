//! Byte-count and percentage rendering for progress output.

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;

/// Render a `transferred/total` byte pair in binary units.
///
/// The smallest unit whose total fits is chosen, with precision depending on
/// the magnitude of the total:
///
/// - below 9.95 units: one decimal for both numbers (`3.2/9.9KB`)
/// - from 9.95 up to 10 units: integer transferred over a literal `10`, since
///   one decimal would round the total up to `10.0`
/// - up to 99 units: two-digit integers
/// - up to 999 units: three-digit integers
///
/// Totals past 999MB are always shown in GB with one decimal.
pub fn format_transfer(transferred: u64, total: u64) -> String {
    if let Some(text) = format_in_unit(transferred, total, KB, "KB") {
        return text;
    }
    if let Some(text) = format_in_unit(transferred, total, MB, "MB") {
        return text;
    }
    format!(
        "{:.1}/{:.1}GB",
        transferred as f64 / GB as f64,
        total as f64 / GB as f64
    )
}

fn format_in_unit(transferred: u64, total: u64, unit: u64, suffix: &str) -> Option<String> {
    let value = total as f64 / unit as f64;
    if value < 9.95 {
        return Some(format!(
            "{:.1}/{:.1}{}",
            transferred as f64 / unit as f64,
            value,
            suffix
        ));
    }
    if value < 10.0 {
        return Some(format!("{:>2}/10{}", transferred / unit, suffix));
    }
    if total <= 99 * unit {
        return Some(format!("{:>2}/{}{}", transferred / unit, total / unit, suffix));
    }
    if total <= 999 * unit {
        return Some(format!("{:>3}/{}{}", transferred / unit, total / unit, suffix));
    }
    None
}

/// Render a completion percentage as a fixed-width `NNN%` field, clamped to 0..=100.
pub fn format_percent(percent: i32) -> String {
    format!("{:>3}%", percent.clamp(0, 100))
}
