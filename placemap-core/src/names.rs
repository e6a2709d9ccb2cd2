//! Display-name and message-text lookups.
//!
//! Thin dictionary substitution over the vendor name/text dumps. Misses are
//! never fatal: the raw type name (or message id) is used instead and the
//! miss is logged.

use std::collections::HashMap;

use tracing::debug;

/// Display-name dictionary plus the message texts used by location markers.
#[derive(Debug, Clone, Default)]
pub struct NameTables {
    names: HashMap<String, String>,
    location_marker_texts: HashMap<String, String>,
    dungeon_texts: HashMap<String, String>,
}

impl NameTables {
    pub fn new(
        names: HashMap<String, String>,
        location_marker_texts: HashMap<String, String>,
        dungeon_texts: HashMap<String, String>,
    ) -> Self {
        NameTables {
            names,
            location_marker_texts,
            dungeon_texts,
        }
    }

    /// Display name for a type, falling back to the raw name on a miss.
    pub fn display(&self, name: &str) -> String {
        match self.names.get(name) {
            Some(ui) => ui.clone(),
            None => {
                debug!(actor = name, "no display name, using raw type name");
                name.to_string()
            }
        }
    }

    /// Text for a message id, checking marker texts then dungeon texts.
    pub fn marker_text(&self, message_id: &str) -> Option<&str> {
        self.location_marker_texts
            .get(message_id)
            .or_else(|| self.dungeon_texts.get(message_id))
            .map(String::as_str)
    }

    /// The `{id}_sub` dungeon subtitle, if one exists.
    pub fn dungeon_sub(&self, message_id: &str) -> Option<&str> {
        self.dungeon_texts
            .get(&format!("{message_id}_sub"))
            .map(String::as_str)
    }

    /// Display name for a location-marker object: `Location: {text}`, with
    /// the dungeon subtitle appended when present. Falls back to the raw
    /// message id when no text is known.
    pub fn location_display(&self, message_id: &str) -> String {
        let text = match self.marker_text(message_id) {
            Some(text) => text,
            None => {
                debug!(message_id, "no marker text, using raw message id");
                message_id
            }
        };
        let mut out = format!("Location: {text}");
        if let Some(sub) = self.dungeon_sub(message_id) {
            out.push_str(" - ");
            out.push_str(sub);
        }
        out
    }
}
