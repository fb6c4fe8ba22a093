//! Render model handed to the chat transport
//!
//! A surface is display text plus rows of controls. Each control carries the
//! payload that comes back when it is pressed.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Control {
    pub label: String,
    pub payload: String,
}

impl Control {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Surface {
    /// HTML-formatted text
    pub text: String,
    pub rows: Vec<Vec<Control>>,
}

impl Surface {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, row: Vec<Control>) -> Self {
        if !row.is_empty() {
            self.rows.push(row);
        }
        self
    }

    /// Single-control row
    pub fn button(self, label: impl Into<String>, payload: impl Into<String>) -> Self {
        self.row(vec![Control::new(label, payload)])
    }

    /// All controls, row by row
    pub fn controls(&self) -> impl Iterator<Item = &Control> {
        self.rows.iter().flatten()
    }

    /// First control whose label equals `label`
    pub fn find(&self, label: &str) -> Option<&Control> {
        self.controls().find(|c| c.label == label)
    }
}

/// Where a surface is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTarget {
    pub chat_id: i64,
    /// Message to edit in place; a new message is sent when `None`
    pub message_id: Option<i64>,
}

impl RenderTarget {
    pub fn new_message(chat_id: i64) -> Self {
        Self {
            chat_id,
            message_id: None,
        }
    }

    pub fn edit(chat_id: i64, message_id: i64) -> Self {
        Self {
            chat_id,
            message_id: Some(message_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_rows_are_skipped() {
        let surface = Surface::new("Основное меню:")
            .row(vec![])
            .button("👈 Назад", "mnu");
        assert_eq!(surface.rows.len(), 1);
        assert_eq!(surface.find("👈 Назад").unwrap().payload, "mnu");
        assert!(surface.find("missing").is_none());
    }
}
