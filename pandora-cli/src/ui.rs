//! Presentation helpers: turn repository data into terminal text.

use pandora_core::{PandoraError, Show};

pub const EMPTY_LIST: &str = "No shows yet. Add one with `pandora add <NAME>`.";

/// Numbered list of shows, or a hint when there are none.
pub fn render_show_list(shows: &[Show]) -> String {
    if shows.is_empty() {
        return EMPTY_LIST.to_string();
    }
    let width = shows.len().to_string().len();
    shows
        .iter()
        .enumerate()
        .map(|(i, show)| format!("{:>width$}. {}", i + 1, show.name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// New-show form validation: the name is required.
pub fn validate_new_show(input: &str) -> Result<String, PandoraError> {
    let name = input.trim();
    if name.is_empty() {
        return Err(PandoraError::InvalidShow("name is required".into()));
    }
    Ok(name.to_string())
}

pub fn render_update(name: &str, new_name: &str, changed: bool) -> String {
    if changed {
        format!("Updated \"{name}\" → \"{new_name}\"")
    } else {
        format!("No show named \"{name}\"; nothing changed")
    }
}

/// `key=value` pair from the command line.
pub fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got `{raw}`")),
    }
}
