//! JSON and CSV renderings of scan reports.

use crate::error::Result;
use crate::models::{DetectedModule, ScanReport};
use crate::payload::{DEVICE_ID_KEY, value_to_text};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Fixed leading CSV columns
pub const CSV_BASE_COLUMNS: [&str; 7] = [
    "Module ID",
    "QR Code Data",
    "Center X",
    "Center Y",
    "Width",
    "Height",
    "Device ID",
];

/// Placeholder for modules without a device id
pub const MISSING: &str = "N/A";

/// Serialize any report (or list of reports)
pub fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

/// One row per module.
///
/// After the base columns comes a `Device <Key>` column for every device-info
/// key other than `device_id`, in first-seen order over all modules. Cells a
/// module has no value for stay empty.
pub fn to_csv(report: &ScanReport) -> String {
    let extra_keys = extra_device_keys(&report.modules);

    let mut header: Vec<String> = CSV_BASE_COLUMNS.iter().map(|c| c.to_string()).collect();
    header.extend(extra_keys.iter().map(|k| format!("Device {}", title_case(k))));

    let mut out = String::new();
    push_row(&mut out, &header);
    for module in &report.modules {
        let pos = &module.position;
        let mut row = vec![
            module.module_id.to_string(),
            module.qr_code_data.clone(),
            pos.center.x.to_string(),
            pos.center.y.to_string(),
            pos.bounding_box.width.to_string(),
            pos.bounding_box.height.to_string(),
            module.device_id().unwrap_or_else(|| MISSING.to_string()),
        ];
        row.extend(extra_keys.iter().map(|key| {
            module
                .device_info
                .get(key.as_str())
                .map(value_to_text)
                .unwrap_or_default()
        }));
        push_row(&mut out, &row);
    }
    out
}

fn extra_device_keys(modules: &[DetectedModule]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for module in modules {
        for key in module.device_info.keys() {
            if key != DEVICE_ID_KEY && !keys.contains(key) {
                keys.push(key.clone());
            }
        }
    }
    keys
}

fn push_row(out: &mut String, cells: &[String]) {
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape_cell(cell));
    }
    out.push('\n');
}

fn escape_cell(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Uppercase the first letter of each alphabetic run, lowercase the rest
/// (`device_type` becomes `Device_Type`)
pub fn title_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut prev_alpha = false;
    for c in key.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

fn stamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// `qr_scan_results_<YYYYmmdd_HHMMSS>.json`
pub fn default_json_name() -> String {
    format!("qr_scan_results_{}.json", stamp())
}

/// `qr_modules_<YYYYmmdd_HHMMSS>.csv`
pub fn default_csv_name() -> String {
    format!("qr_modules_{}.csv", stamp())
}

/// Write JSON to `path`
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path, pretty: bool) -> Result<()> {
    fs::write(path, to_json(value, pretty)?)?;
    Ok(())
}

/// Write the module table to `path`
pub fn write_csv(report: &ScanReport, path: &Path) -> Result<()> {
    fs::write(path, to_csv(report))?;
    Ok(())
}

/// `path` itself, or a default-named file inside it when it is a directory
pub fn resolve_output(path: &Path, default_name: impl FnOnce() -> String) -> PathBuf {
    if path.is_dir() {
        path.join(default_name())
    } else {
        path.to_path_buf()
    }
}
