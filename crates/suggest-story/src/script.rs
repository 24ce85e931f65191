use anyhow::{Context as _, Result};
use serde::Deserialize;

/// One line of a replay script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScriptEvent {
    /// Types the text one character at a time.
    Type { text: String },
    Key {
        key: String,
        #[serde(default)]
        shift: bool,
    },
    Split,
    Backspace,
    /// Pointer selection of an overlay row.
    Click { index: usize },
    MoveTo { position: usize },
}

/// Parses a JSON-lines script. Blank lines and `#` comments are skipped.
pub fn parse_script(source: &str) -> Result<Vec<ScriptEvent>> {
    let mut events = Vec::new();
    for (ix, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event = serde_json::from_str(line)
            .with_context(|| format!("invalid script event on line {}", ix + 1))?;
        events.push(event);
    }
    Ok(events)
}
