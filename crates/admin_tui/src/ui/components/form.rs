use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use datatable::{Dialog, FieldKind, FormDialog, FormMode};

use crate::{
    app::SectionState,
    ui::{components::centered_rect, theme::Theme},
};

/// Create/edit modal of the active section, if open.
pub fn render(frame: &mut Frame<'_>, area: Rect, section: &SectionState, theme: &Theme) {
    let Dialog::Form(form) = section.crud.dialog() else {
        return;
    };

    let title = match form.mode() {
        FormMode::Create => format!("New {}", section.def.title),
        FormMode::Edit(id) => format!("Edit {} {id}", section.def.title),
    };
    let popup = centered_rect(60, 70, area);
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent));

    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(form_lines(form, theme)).block(block), popup);
}

fn form_lines(form: &FormDialog, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (index, field) in form.fields().iter().enumerate() {
        let is_focus = index == form.focus();
        let label_style = if is_focus {
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.text_muted)
        };
        let required = if field.required { "*" } else { "" };
        let input = form.input(&field.name);
        let value = match &field.kind {
            FieldKind::Toggle => {
                let on = matches!(input.to_ascii_lowercase().as_str(), "yes" | "true");
                let mark = if on { "[x]" } else { "[ ]" };
                mark.to_string()
            }
            FieldKind::Select(options) => options
                .iter()
                .find(|option| option.value == input)
                .map_or_else(|| format!("<{input}>"), |option| option.label.clone()),
            FieldKind::Computed(_) => "(computed)".to_string(),
            _ if is_focus => format!("{input}_"),
            _ => input.to_string(),
        };

        lines.push(Line::from(vec![
            Span::styled(if is_focus { "› " } else { "  " }, label_style),
            Span::styled(format!("{}{required}: ", field.label), label_style),
            Span::styled(value, Style::default().fg(theme.text)),
        ]));
        for err in form.field_errors(&field.name) {
            lines.push(Line::from(Span::styled(
                format!("    {err}"),
                Style::default().fg(theme.error),
            )));
        }
    }
    lines
}
