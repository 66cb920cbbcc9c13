//! Input and parsing helpers shared by the note commands.

use std::io::{self, IsTerminal, Read};

use sealnote_core::Category;

use crate::errors::CliError;

/// Read note content from the argument, or from stdin when it is piped.
///
/// Empty content is allowed; a note may be blank.
pub fn read_content(content: Option<String>) -> anyhow::Result<String> {
    if let Some(value) = content {
        return Ok(value);
    }
    if io::stdin().is_terminal() {
        return Err(CliError::invalid_input(
            "No content given. Pass it as an argument or pipe it on stdin.",
        )
        .into());
    }
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|e| anyhow::anyhow!("Failed to read stdin: {}", e))?;
    Ok(buffer.trim_end_matches(['\r', '\n']).to_string())
}

/// Parse a `--category` filter. `all` means no filter.
pub fn parse_category_filter(value: &str) -> anyhow::Result<Option<Category>> {
    if value.trim().eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    value
        .parse::<Category>()
        .map(Some)
        .map_err(|e| CliError::invalid_input(e.to_string()).into())
}

/// First line of `content`, cut to `max` characters.
pub fn preview(content: &str, max: usize) -> String {
    let first_line = content.lines().next().unwrap_or("").trim();
    if first_line.chars().count() <= max {
        let more = content.trim_end().lines().count() > 1;
        return if more {
            format!("{}…", first_line)
        } else {
            first_line.to_string()
        };
    }
    let cut: String = first_line.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut)
}
