use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
};

use datatable::{Align, ColumnDescriptor, QueryState, SortDirection, TableStatus};

use crate::{app::SectionState, ui::theme::Theme};

pub fn render(frame: &mut Frame<'_>, area: Rect, section: &SectionState, theme: &Theme) {
    let controller = section.table.controller();
    let block = Block::default()
        .title(section.def.title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border));

    if controller.rows().is_empty() {
        let message = match controller.status() {
            TableStatus::Idle | TableStatus::Loading => "Loading…",
            TableStatus::Loaded | TableStatus::Empty => "No rows.",
        };
        frame.render_widget(
            Paragraph::new(Line::from(message))
                .style(Style::default().fg(theme.text_muted))
                .alignment(Alignment::Center)
                .block(block),
            area,
        );
        return;
    }

    let columns = controller.columns();
    let header = Row::new(
        std::iter::once(Cell::from(select_all_mark(controller.all_visible_selected()))).chain(
            columns.iter().enumerate().map(|(index, column)| {
                Cell::from(aligned(
                    header_label(index, column, controller.query()),
                    column.align(),
                ))
            }),
        ),
    )
    .style(
        Style::default()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD),
    );

    let rows = controller.rows().iter().map(|row| {
        let mark = if controller.is_row_selected(row) {
            "[x]"
        } else {
            "[ ]"
        };
        Row::new(
            std::iter::once(Cell::from(mark)).chain(
                columns
                    .iter()
                    .map(|column| Cell::from(aligned(column.render(row), column.align()))),
            ),
        )
    });

    let widths = std::iter::once(Constraint::Length(3))
        .chain(columns.iter().map(|_| Constraint::Fill(1)))
        .collect::<Vec<_>>();

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .column_spacing(2)
        .row_highlight_style(Style::default().bg(theme.selected))
        .highlight_symbol("» ");

    let mut table_state = TableState::default();
    table_state.select(Some(section.cursor));
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn select_all_mark(all_selected: bool) -> &'static str {
    if all_selected { "[x]" } else { "[ ]" }
}

/// Column label with its sort key number and, when active, the direction.
fn header_label(index: usize, column: &ColumnDescriptor, query: &QueryState) -> String {
    let Some(key) = column.sort_key() else {
        return column.label().to_string();
    };
    let arrow = match &query.sort {
        Some(sort) if sort.key == key => match sort.direction {
            SortDirection::Asc => " ▲",
            SortDirection::Desc => " ▼",
        },
        _ => "",
    };
    if index < 9 {
        format!("{} {}{arrow}", index + 1, column.label())
    } else {
        format!("{}{arrow}", column.label())
    }
}

fn aligned(text: String, align: Align) -> Line<'static> {
    let alignment = match align {
        Align::Left => Alignment::Left,
        Align::Center => Alignment::Center,
        Align::Right => Alignment::Right,
    };
    Line::from(text).alignment(alignment)
}
