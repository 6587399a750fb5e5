use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use datatable::{FieldKind, FilterValue};

use crate::{app::SectionState, ui::theme::Theme};

/// Filter form of the active section, docked to the left of the table.
pub fn render(
    frame: &mut Frame<'_>,
    area: Rect,
    section: &SectionState,
    focused: bool,
    theme: &Theme,
) {
    let form = &section.filters;
    let mut lines = Vec::new();

    for (index, field) in form.fields().iter().enumerate() {
        let is_focus = focused && index == form.focus();
        let label_style = if is_focus {
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.text_muted)
        };
        let marker = if is_focus { "› " } else { "  " };
        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(theme.accent)),
            Span::styled(field.label.clone(), label_style),
        ]));
        lines.push(Line::from(vec![
            Span::raw("    "),
            Span::styled(
                value_text(&field.kind, form.value(&field.name)),
                Style::default().fg(theme.text),
            ),
        ]));
    }

    if section.has_active_filters {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "● filters active",
            Style::default().fg(theme.warning),
        )));
    }

    let border = if focused { theme.accent } else { theme.border };
    let block = Block::default()
        .title("Filters")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn value_text(kind: &FieldKind, value: Option<&FilterValue>) -> String {
    match (kind, value) {
        (FieldKind::Toggle, Some(FilterValue::Bool(true))) => "[x]".to_string(),
        (FieldKind::Toggle, _) => "[ ]".to_string(),
        (FieldKind::Select(options), Some(value)) => {
            let raw = value.as_text();
            options
                .iter()
                .find(|option| option.value == raw)
                .map_or_else(|| "any".to_string(), |option| option.label.clone())
        }
        (_, Some(value)) => format!("{}_", value.as_text()),
        (_, None) => "_".to_string(),
    }
}
