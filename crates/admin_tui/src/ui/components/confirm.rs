use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::Style,
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::{
    app::SectionState,
    ui::{
        components::{centered_rect, hints},
        theme::Theme,
    },
};

pub fn render(frame: &mut Frame<'_>, area: Rect, section: &SectionState, theme: &Theme) {
    let Some(prompt) = section.crud.dialog().confirm_prompt() else {
        return;
    };

    let popup = centered_rect(40, 20, area);
    let block = Block::default()
        .title("Confirm")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.error));
    let lines = vec![
        Line::from(prompt),
        Line::from(""),
        Line::from(hints::hints_to_spans(
            &[
                hints::KeyHint::new("y", "delete"),
                hints::KeyHint::new("n", "cancel"),
            ],
            theme,
        )),
    ];

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(block),
        popup,
    );
}
