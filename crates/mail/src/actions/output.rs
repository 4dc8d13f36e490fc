//! Local side effects for retrieved messages: printing, JSON export
//! and attachment downloads.

use log::info;
use serde_json::{Map, Value};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::{MailError, Result};
use crate::models::ParsedMessage;

/// Printed in place of missing values
const NONE_PLACEHOLDER: &str = "None";

/// Render a message as an aligned key/value block
pub fn format_message(message: &ParsedMessage) -> String {
    let data = message.data();
    let attachments = data.attachments.to_string();
    let rows: [(&str, Option<&str>); 6] = [
        ("From", data.from.as_deref()),
        ("To", data.to.as_deref()),
        ("Subject", data.subject.as_deref()),
        ("Date", data.date.as_deref()),
        ("Body", data.body.as_deref()),
        ("Attachments", Some(attachments.as_str())),
    ];

    let pad = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0) + 1;
    rows.iter()
        .map(|(key, value)| {
            let value = (*value).filter(|v| !v.is_empty()).unwrap_or(NONE_PLACEHOLDER);
            format!("{:<pad$} {}", format!("{}:", key), value, pad = pad)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Line printed between messages
pub fn separator() -> String {
    format!("{}\n\n", "_".repeat(80))
}

/// Print every message followed by a separator line
pub fn print_messages(messages: &[ParsedMessage]) {
    println!("{} email(s) retrieved", messages.len());
    for message in messages {
        println!("{}", format_message(message));
        println!("{}", separator());
    }
}

/// Whether `path` can be written.
///
/// For a directory, checks that a file can be created in it. For a file,
/// checks its containing directory and then either that the existing file
/// opens for writing (`allow_overwrite`) or that it does not exist yet.
pub fn path_writable(path: &Path, allow_overwrite: bool) -> bool {
    if path.is_dir() {
        return dir_writable(path);
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !dir_writable(parent) {
        return false;
    }
    if !path.exists() {
        return true;
    }
    allow_overwrite && OpenOptions::new().write(true).open(path).is_ok()
}

/// Checked by creating an unnamed scratch file in `dir`
fn dir_writable(dir: &Path) -> bool {
    dir.is_dir() && tempfile::tempfile_in(dir).is_ok()
}

/// Write the data view of every message as a JSON object keyed by message id
pub fn store_messages(
    messages: &[ParsedMessage],
    output: &Path,
    allow_overwrite: bool,
    verbose: bool,
) -> Result<PathBuf> {
    let output = config::normalize_path(&output.to_string_lossy());
    if !path_writable(&output, allow_overwrite) {
        return Err(MailError::InvalidPath(output));
    }

    let mut object = Map::new();
    for message in messages {
        let data = serde_json::to_value(message.data())?;
        object.insert(message.id.clone(), data);
    }

    let content = serde_json::to_string(&Value::Object(object))?;
    fs::write(&output, content).map_err(|e| MailError::io(&output, e))?;

    info!("Stored {} message(s) in {}", messages.len(), output.display());
    if verbose {
        println!("Saved {} email(s) to {}", messages.len(), output.display());
    }
    Ok(output)
}

/// Write every attachment into `download_dir`, returning the filenames written.
///
/// Existing files are left alone unless `force` is set. The directory is
/// validated before anything is written.
pub fn download_attachments(
    messages: &[ParsedMessage],
    download_dir: &Path,
    force: bool,
    verbose: bool,
) -> Result<Vec<String>> {
    let download_dir = config::normalize_path(&download_dir.to_string_lossy());
    if !download_dir.is_dir() || !path_writable(&download_dir, true) {
        return Err(MailError::InvalidPath(download_dir));
    }

    let mut downloaded = Vec::new();
    for message in messages {
        for (filename, data) in message.attachments.iter() {
            // Attachment names come from the sender; keep only the final component
            let Some(name) = Path::new(filename).file_name() else {
                continue;
            };
            let path = download_dir.join(name);
            if !force && path.exists() {
                info!("Skipping existing {}", path.display());
                continue;
            }
            fs::write(&path, data).map_err(|e| MailError::io(&path, e))?;
            downloaded.push(filename.to_string());
        }
    }

    if verbose {
        if downloaded.is_empty() {
            println!("No attachments downloaded");
        } else {
            println!(
                "Downloaded:\n{}\ninto {}",
                downloaded.join("\n"),
                download_dir.display()
            );
        }
    }
    Ok(downloaded)
}
