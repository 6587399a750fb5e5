use ratatui::{style::Style, text::Span};

use crate::ui::theme::Theme;

/// A keyboard hint consisting of a key and its action.
#[derive(Debug, Clone)]
pub struct KeyHint {
    pub key: String,
    pub action: String,
}

impl KeyHint {
    pub fn new(key: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            action: action.into(),
        }
    }
}

/// Converts a list of key hints into styled spans for rendering.
pub fn hints_to_spans(hints: &[KeyHint], theme: &Theme) -> Vec<Span<'static>> {
    let mut spans = Vec::new();

    for (i, hint) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(
            hint.key.clone(),
            Style::default().fg(theme.accent),
        ));
        spans.push(Span::raw(format!(" {}", hint.action)));
    }

    spans
}

pub fn hint_separator(theme: &Theme) -> Span<'static> {
    Span::styled("  │  ", Style::default().fg(theme.border))
}

/// Hint groups shared by every section.
pub mod common {
    use super::KeyHint;

    pub fn table_navigation() -> Vec<KeyHint> {
        vec![
            KeyHint::new("Tab", "section"),
            KeyHint::new("↑↓", "move"),
            KeyHint::new("Space", "select"),
            KeyHint::new("a", "all"),
            KeyHint::new("n/p", "page"),
            KeyHint::new("1-9", "sort"),
            KeyHint::new("r", "reload"),
        ]
    }

    pub fn form_editing() -> Vec<KeyHint> {
        vec![
            KeyHint::new("Tab", "next"),
            KeyHint::new("Space", "toggle"),
            KeyHint::new("Enter", "save"),
            KeyHint::new("Esc", "cancel"),
        ]
    }

    pub fn crud_operations() -> Vec<KeyHint> {
        vec![
            KeyHint::new("c", "create"),
            KeyHint::new("e", "edit"),
            KeyHint::new("d", "delete"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_alternate_key_and_action() {
        let theme = Theme::default();
        let hints = [KeyHint::new("c", "create"), KeyHint::new("d", "delete")];
        let spans = hints_to_spans(&hints, &theme);
        let text: String = spans.iter().map(|span| span.content.as_ref()).collect();
        assert_eq!(text, "c create  d delete");
        assert_eq!(spans[0].style.fg, Some(theme.accent));
    }
}
