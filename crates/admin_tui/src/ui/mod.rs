pub mod components;
pub mod keymap;

mod terminal;
mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::{AppState, Mode};

use components::hints::{self, KeyHint};

pub use terminal::{AppTerminal as Terminal, restore_terminal, setup_terminal};
pub use theme::Theme;

const SIDEBAR_WIDTH: u16 = 34;

pub fn render(frame: &mut Frame<'_>, state: &AppState) {
    let area = frame.area();
    let theme = Theme::default();

    // Main layout: info bar, tabs, content, pager, bottom bar
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Info bar
            Constraint::Length(2), // Tab bar (label + underline)
            Constraint::Min(0),    // Sidebar + table
            Constraint::Length(1), // Pager
            Constraint::Length(1), // Bottom bar
        ])
        .split(area);

    render_info_bar(frame, layout[0], state, &theme);
    components::tabs::render_tabs(frame, layout[1], state, &theme);
    render_content(frame, layout[2], state, &theme);
    components::pager::render(frame, layout[3], state.section(), &theme);
    render_bottom_bar(frame, layout[4], state, &theme);

    let section = state.section();
    components::form::render(frame, area, section, &theme);
    components::confirm::render(frame, area, section, &theme);
    components::toast::render(frame, area, state.toast(), &theme);
}

fn render_content(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let section = state.section();
    if !section.sidebar_open {
        components::table::render(frame, area, section, theme);
        return;
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
        .split(area);
    let focused = state.mode() == Mode::Sidebar;
    components::sidebar::render(frame, columns[0], section, focused, theme);
    components::table::render(frame, columns[1], section, theme);
}

fn render_info_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let section = state.section();
    let scope = section.scope.as_deref().unwrap_or("All");
    let filters = if section.has_active_filters {
        "active"
    } else {
        "none"
    };
    let selected = section.table.controller().selection().len();

    let line = Line::from(vec![
        Span::styled("Backend", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {}  ", state.base_url)),
        Span::styled("Scope", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {scope}  ")),
        Span::styled("Filters", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {filters}  ")),
        Span::styled("Selected", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {selected}")),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn render_bottom_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let mut parts = hints::hints_to_spans(&context_hints(state), theme);
    parts.push(hints::hint_separator(theme));
    parts.extend(hints::hints_to_spans(&[KeyHint::new("Ctrl+C", "quit")], theme));
    frame.render_widget(Paragraph::new(Line::from(parts)), area);
}

/// Keyboard hints for whatever currently has the keyboard.
fn context_hints(state: &AppState) -> Vec<KeyHint> {
    let section = state.section();
    match state.mode() {
        Mode::Form => hints::common::form_editing(),
        Mode::Confirm => vec![
            KeyHint::new("y/Enter", "delete"),
            KeyHint::new("n/Esc", "cancel"),
        ],
        Mode::Sidebar => vec![
            KeyHint::new("Tab", "next"),
            KeyHint::new("Space", "toggle"),
            KeyHint::new("Enter", "apply"),
            KeyHint::new("Ctrl+R", "clear"),
            KeyHint::new("Esc", "table"),
        ],
        Mode::Table => {
            let mut hints = hints::common::table_navigation();
            hints.extend(hints::common::crud_operations());
            hints.push(KeyHint::new("f", "filters"));
            if section.def.drill_down.is_some() {
                hints.push(KeyHint::new("Enter", "open"));
            }
            if section.scope.is_some() {
                hints.push(KeyHint::new("x", "unscope"));
            }
            hints.push(KeyHint::new("q", "quit"));
            hints
        }
    }
}
