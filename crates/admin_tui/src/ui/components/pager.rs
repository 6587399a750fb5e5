use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use datatable::{TableController, TableStatus};

use crate::{app::SectionState, ui::theme::Theme};

pub fn render(frame: &mut Frame<'_>, area: Rect, section: &SectionState, theme: &Theme) {
    let controller = section.table.controller();
    let mut spans = vec![Span::styled(
        pager_text(controller),
        Style::default().fg(theme.text_muted),
    )];
    if controller.is_stranded() {
        spans.push(Span::styled(
            "  past the last page, g to jump back",
            Style::default().fg(theme.warning),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// `Page 2/5 · rows 21-40 of 95`, with the page count never below one.
pub fn pager_text(controller: &TableController) -> String {
    if controller.status() == TableStatus::Loading {
        return " Loading…".to_string();
    }
    let page = controller.page();
    let current = controller.query().page_index.saturating_add(1);
    let count = controller.page_count().max(1);
    let rows = match page.row_range() {
        Some((first, last)) => format!("rows {first}-{last} of {}", page.total_count),
        None => format!("{} rows", page.total_count),
    };
    format!(" Page {current}/{count} · {rows}")
}
