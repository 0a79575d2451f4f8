//! Plain-text tables for the terminal.

use std::fmt::Write as _;

use netinv_core::report::{ReportRow, RowStatus};
use netinv_core::{CollectionSummary, DeviceTarget, VendorProfile};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Width of the widest value in a column, at least the header width
fn column_width<'a>(header: &str, values: impl Iterator<Item = &'a str>) -> usize {
    values.map(str::len).max().unwrap_or(0).max(header.len())
}

/// Formats resolved targets as a table
#[must_use]
pub fn format_targets(targets: &[DeviceTarget]) -> String {
    if targets.is_empty() {
        return "No devices defined.".to_string();
    }

    let name_width = column_width("NAME", targets.iter().map(|t| t.id().as_str()));
    let host_width = column_width("HOST", targets.iter().map(DeviceTarget::host));
    let cred_width = column_width("CREDENTIAL", targets.iter().map(DeviceTarget::credential));
    let port_width = 5;
    let vendor_width = 10;

    let mut output = String::new();
    let _ = writeln!(
        output,
        "{:<name_width$}  {:<host_width$}  {:<port_width$}  {:<vendor_width$}  {:<cred_width$}",
        "NAME", "HOST", "PORT", "VENDOR", "CREDENTIAL"
    );
    let _ = writeln!(
        output,
        "{:-<name_width$}  {:-<host_width$}  {:-<port_width$}  {:-<vendor_width$}  {:-<cred_width$}",
        "", "", "", "", ""
    );
    for target in targets {
        let _ = writeln!(
            output,
            "{:<name_width$}  {:<host_width$}  {:<port_width$}  {:<vendor_width$}  {:<cred_width$}",
            target.id(),
            target.host(),
            target.port(),
            target.vendor().to_string(),
            target.credential()
        );
    }

    output.trim_end().to_string()
}

/// Formats report rows as a table, one line per device
///
/// Failed devices show the failure kind and stage in the model column and
/// the message in the last column.
#[must_use]
pub fn format_report(rows: &[ReportRow], color: bool) -> String {
    if rows.is_empty() {
        return "No devices collected.".to_string();
    }

    let cells: Vec<[String; 6]> = rows.iter().map(row_cells).collect();
    let headers = ["DEVICE", "STATUS", "VENDOR", "MODEL", "SERIAL", "FIRMWARE / DETAIL"];
    let widths: Vec<usize> = (0..5)
        .map(|col| column_width(headers[col], cells.iter().map(|c| c[col].as_str())))
        .collect();
    let (w0, w1, w2, w3, w4) = (widths[0], widths[1], widths[2], widths[3], widths[4]);

    let mut output = String::new();
    let _ = writeln!(
        output,
        "{:<w0$}  {:<w1$}  {:<w2$}  {:<w3$}  {:<w4$}  {}",
        headers[0], headers[1], headers[2], headers[3], headers[4], headers[5]
    );
    let _ = writeln!(
        output,
        "{:-<w0$}  {:-<w1$}  {:-<w2$}  {:-<w3$}  {:-<w4$}  {:-<17}",
        "", "", "", "", "", ""
    );
    for (row, cell) in rows.iter().zip(&cells) {
        let status = format!("{:<w1$}", cell[1]);
        let status = match (color, row.status) {
            (false, _) => status,
            (true, RowStatus::Success) => format!("{GREEN}{status}{RESET}"),
            (true, RowStatus::Failure) => format!("{RED}{status}{RESET}"),
        };
        let _ = writeln!(
            output,
            "{:<w0$}  {status}  {:<w2$}  {:<w3$}  {:<w4$}  {}",
            cell[0], cell[2], cell[3], cell[4], cell[5]
        );
    }

    output.trim_end().to_string()
}

fn row_cells(row: &ReportRow) -> [String; 6] {
    let dash = || "-".to_string();
    match row.status {
        RowStatus::Success => [
            row.device.to_string(),
            "ok".to_string(),
            row.vendor.map_or_else(dash, |v| v.to_string()),
            row.model.clone().unwrap_or_else(dash),
            row.serial.clone().unwrap_or_else(dash),
            row.firmware_version.clone().unwrap_or_else(dash),
        ],
        RowStatus::Failure => [
            row.device.to_string(),
            row.failure_kind.map_or_else(|| "failed".to_string(), |k| k.to_string()),
            row.vendor.map_or_else(dash, |v| v.to_string()),
            row.failure_stage.map_or_else(dash, |s| format!("at {s}")),
            dash(),
            row.message.clone().unwrap_or_default(),
        ],
    }
}

/// Formats the run summary block
#[must_use]
pub fn format_summary(summary: &CollectionSummary, cancelled: bool) -> String {
    let mut output = summary.summary_string();
    if cancelled {
        output.push_str(" [cancelled]");
    }
    for (kind, count) in &summary.by_failure {
        let _ = write!(output, "\n  {kind}: {count}");
    }
    let _ = write!(output, "\n  Elapsed: {:.1}s", summary.elapsed_ms as f64 / 1000.0);
    output
}

/// Formats vendor profiles as a table
#[must_use]
pub fn format_profiles(profiles: &[&VendorProfile]) -> String {
    let mut output = String::new();
    for profile in profiles {
        let _ = writeln!(output, "{} ({})", profile.vendor, profile.vendor.key());
        if !profile.setup_commands.is_empty() {
            let _ = writeln!(output, "  setup:   {}", profile.setup_commands.join("; "));
        }
        if let Some(enable) = &profile.enable_command {
            let _ = writeln!(output, "  enable:  {enable}");
        }
        if !profile.detect_patterns.is_empty() {
            let patterns: Vec<&str> = profile.detect_patterns.iter().map(|re| re.as_str()).collect();
            let _ = writeln!(output, "  detect:  {}", patterns.join(" | "));
        }
        let name_width = column_width("", profile.commands.iter().map(|c| c.name.as_str()));
        for spec in &profile.commands {
            let flag = if spec.required { "required" } else { "optional" };
            let _ = writeln!(
                output,
                "  {:<name_width$}  {flag:<8}  {}",
                spec.name, spec.command
            );
        }
        output.push('\n');
    }
    output.trim_end().to_string()
}
