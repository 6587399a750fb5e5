use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEvent};
use datatable::{
    Backend, CrudOrchestrator, DataSource, DataTable, Dialog, FetchFailure, FieldKind,
    FilterForm, FilterPipeline, FilterValues, HttpBackend, JsonFileStore, Notice, NoticeLevel,
    Notices, TableController, TableHandle,
    store::{self, KeyValueStore},
};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::{
    config::AppConfig,
    error::{AppError, Result},
    resources::{self, ResourceDef},
    ui::{
        self,
        keymap::{self, AppAction},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Table,
    Sidebar,
}

/// What the keyboard currently drives, from the innermost overlay out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Table,
    Sidebar,
    Form,
    Confirm,
}

/// One entity tab: its table, dialogs and filter sidebar.
#[derive(Debug)]
pub struct SectionState {
    pub def: ResourceDef,
    pub table: DataTable<HttpBackend>,
    pub crud: CrudOrchestrator,
    pub filters: FilterForm,
    pub pipeline: FilterPipeline,
    pub has_active_filters: bool,
    pub sidebar_open: bool,
    pub cursor: usize,
    /// Human label of the drill-down scope, if any.
    pub scope: Option<String>,
    failures: mpsc::UnboundedReceiver<FetchFailure>,
    mounted: bool,
}

impl SectionState {
    fn new(
        def: ResourceDef,
        backend: &HttpBackend,
        page_size: u64,
        store: &dyn KeyValueStore,
    ) -> Result<Self> {
        let target = backend.endpoint(def.path)?;
        let controller = TableController::new(target, page_size, def.columns.clone())?;
        let mut source = DataSource::new(backend.clone());
        let failures = source.subscribe_failures();
        let filters = FilterForm::new(def.filter_fields.clone(), def.filter_defaults.clone());
        let pipeline = FilterPipeline::new(def.path, filters.defaults().clone());

        Ok(Self {
            table: DataTable::new(controller, source),
            crud: CrudOrchestrator::new(def.path, def.form_fields.clone()),
            sidebar_open: store::sidebar_open(store, def.key),
            filters,
            pipeline,
            has_active_filters: false,
            cursor: 0,
            scope: None,
            failures,
            mounted: false,
            def,
        })
    }

    pub fn mode(&self, focus: Focus) -> Mode {
        match self.crud.dialog() {
            Dialog::Form(_) => Mode::Form,
            Dialog::ConfirmDelete { .. } => Mode::Confirm,
            Dialog::None if focus == Focus::Sidebar && self.sidebar_open => Mode::Sidebar,
            Dialog::None => Mode::Table,
        }
    }

    async fn ensure_mounted(&mut self) {
        if !self.mounted {
            self.mounted = true;
            self.table.mount().await;
            self.clamp_cursor();
        }
    }

    async fn apply_filters(&mut self, values: FilterValues) {
        let applied = self.pipeline.apply(&mut self.table, &values).await;
        self.has_active_filters = applied.has_active_filters;
        self.mounted = true;
        self.clamp_cursor();
    }

    fn clamp_cursor(&mut self) {
        let len = self.table.controller().rows().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    fn cursor_down(&mut self) {
        let len = self.table.controller().rows().len();
        if len > 0 {
            self.cursor = (self.cursor + 1).min(len - 1);
        }
    }

    fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }
}

#[derive(Debug)]
pub struct AppState {
    pub sections: Vec<SectionState>,
    pub active: usize,
    pub focus: Focus,
    /// Notices that do not come from a mutation: fetch failures, filter
    /// validation, state persistence.
    pub notices: Notices,
    pub base_url: String,
}

impl AppState {
    pub fn section(&self) -> &SectionState {
        &self.sections[self.active]
    }

    pub fn section_mut(&mut self) -> &mut SectionState {
        &mut self.sections[self.active]
    }

    pub fn mode(&self) -> Mode {
        self.section().mode(self.focus)
    }

    /// Most recent live notice, whichever queue it sits in.
    pub fn toast(&self) -> Option<&Notice> {
        let own = self.notices.latest();
        let crud = self.section().crud.notices().latest();
        match (own, crud) {
            (Some(a), Some(b)) => Some(if a.expires_at >= b.expires_at { a } else { b }),
            (a, b) => a.or(b),
        }
    }
}

pub struct App {
    backend: HttpBackend,
    store: JsonFileStore,
    pub state: AppState,
    should_quit: bool,
}

impl App {
    pub fn new(config: AppConfig, store: JsonFileStore) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let backend = HttpBackend::new(&config.base_url)?
            .with_client(http)
            .with_token(store::auth_token(&store));

        let sections = resources::all()?
            .into_iter()
            .map(|def| SectionState::new(def, &backend, config.page_size, &store))
            .collect::<Result<Vec<_>>>()?;
        if sections.is_empty() {
            return Err(AppError::Terminal("no sections configured".to_string()));
        }

        let state = AppState {
            sections,
            active: 0,
            focus: Focus::Table,
            notices: Notices::default(),
            base_url: config.base_url.clone(),
        };

        Ok(Self {
            backend,
            store,
            state,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = ui::setup_terminal()?;
        let result = self.event_loop(&mut terminal).await;
        ui::restore_terminal(&mut terminal)?;
        result
    }

    async fn event_loop(&mut self, terminal: &mut ui::Terminal) -> Result<()> {
        let tick_rate = Duration::from_millis(200);
        self.state.section_mut().ensure_mounted().await;

        while !self.should_quit {
            self.tick();
            terminal
                .draw(|frame| ui::render(frame, &self.state))
                .map_err(|err| AppError::Terminal(err.to_string()))?;

            if event::poll(tick_rate)? {
                match event::read()? {
                    Event::Key(key) => self.handle_key(key).await,
                    Event::Resize(_, _) => {}
                    _ => {}
                }
            }
        }

        Ok(())
    }

    /// Turns fetch failures into notices and drops expired ones.
    fn tick(&mut self) {
        let now = Instant::now();
        for section in &mut self.state.sections {
            while let Ok(failure) = section.failures.try_recv() {
                self.state.notices.push(
                    NoticeLevel::Error,
                    format!("{}: {}", section.def.title, failure.message),
                );
            }
            section.crud.notices_mut().prune(now);
        }
        self.state.notices.prune(now);
    }

    async fn handle_key(&mut self, key: KeyEvent) {
        let action = keymap::map_key(key);
        if action == AppAction::Quit {
            self.should_quit = true;
            return;
        }

        match self.state.mode() {
            Mode::Table => self.handle_table_key(action).await,
            Mode::Sidebar => self.handle_sidebar_key(action).await,
            Mode::Form => self.handle_form_key(action).await,
            Mode::Confirm => self.handle_confirm_key(action).await,
        }
    }

    async fn handle_table_key(&mut self, action: AppAction) {
        match action {
            AppAction::NextField => {
                let next = (self.state.active + 1) % self.state.sections.len();
                self.switch_section(next).await;
            }
            AppAction::PrevField => {
                let len = self.state.sections.len();
                self.switch_section((self.state.active + len - 1) % len).await;
            }
            AppAction::Up => self.state.section_mut().cursor_up(),
            AppAction::Down => self.state.section_mut().cursor_down(),
            AppAction::Submit => self.drill_down().await,
            AppAction::Input(ch) => self.handle_table_char(ch).await,
            _ => {}
        }
    }

    async fn handle_table_char(&mut self, ch: char) {
        let section = self.state.section_mut();
        match ch {
            'q' => self.should_quit = true,
            'k' => section.cursor_up(),
            'j' => section.cursor_down(),
            ' ' => {
                let cursor = section.cursor;
                section.table.controller_mut().toggle_row_at(cursor);
            }
            'a' => {
                let controller = section.table.controller_mut();
                if controller.all_visible_selected() {
                    controller.select_none();
                } else {
                    controller.select_all();
                }
            }
            'n' => section.table.next_page().await,
            'p' => section.table.prev_page().await,
            'g' => section.table.go_to_last_page().await,
            'r' => section.table.reload(None).await,
            '1'..='9' => {
                let index = ch as usize - '1' as usize;
                section.table.header_click(index).await;
            }
            'c' => section.crud.open_create(),
            'e' => {
                if !section.crud.open_edit(&section.table) {
                    self.state
                        .notices
                        .push(NoticeLevel::Info, "Select exactly one row to edit.");
                }
            }
            'd' => {
                if !section.crud.open_delete(&section.table) {
                    self.state
                        .notices
                        .push(NoticeLevel::Info, "Select the rows to delete first.");
                }
            }
            'f' => {
                let open = !section.sidebar_open;
                self.set_sidebar(open);
            }
            '/' => {
                if !section.sidebar_open {
                    self.set_sidebar(true);
                }
                self.state.focus = Focus::Sidebar;
            }
            'x' => self.clear_scope().await,
            _ => {}
        }
        self.state.section_mut().clamp_cursor();
    }

    async fn handle_sidebar_key(&mut self, action: AppAction) {
        let section = self.state.section_mut();
        match action {
            AppAction::Cancel => self.state.focus = Focus::Table,
            AppAction::NextField | AppAction::Down => section.filters.focus_next(),
            AppAction::PrevField | AppAction::Up => section.filters.focus_prev(),
            AppAction::Backspace => section.filters.pop_char(),
            AppAction::Input(ch) => {
                let kind = section.filters.focused_field().map(|field| &field.kind);
                if ch == ' ' && is_choice(kind) {
                    section.filters.cycle_focused();
                } else {
                    section.filters.push_char(ch);
                }
            }
            AppAction::ClearFilters => {
                let values = section.filters.clear();
                section.apply_filters(values).await;
            }
            AppAction::Submit => {
                let errors = section.filters.validate();
                if let Some((name, err)) = errors.iter().next() {
                    let label = section
                        .filters
                        .fields()
                        .iter()
                        .find(|field| &field.name == name)
                        .map_or(name.as_str(), |field| field.label.as_str());
                    let message = format!("{label}: {err}");
                    self.state.notices.push(NoticeLevel::Error, message);
                    return;
                }
                let values = section.filters.submit();
                section.apply_filters(values).await;
                self.state.focus = Focus::Table;
            }
            _ => {}
        }
    }

    async fn handle_form_key(&mut self, action: AppAction) {
        let section = &mut self.state.sections[self.state.active];
        match action {
            AppAction::Cancel => section.crud.cancel(),
            AppAction::Submit => {
                section
                    .crud
                    .submit_form(&self.backend, &mut section.table)
                    .await;
                section.clamp_cursor();
            }
            action => {
                let Dialog::Form(form) = section.crud.dialog_mut() else {
                    return;
                };
                match action {
                    AppAction::NextField | AppAction::Down => form.focus_next(),
                    AppAction::PrevField | AppAction::Up => form.focus_prev(),
                    AppAction::Backspace => form.pop_char(),
                    AppAction::Input(ch) => {
                        let kind = form.focused_field().map(|field| &field.kind);
                        if ch == ' ' && is_choice(kind) {
                            form.cycle_focused();
                        } else {
                            form.push_char(ch);
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    async fn handle_confirm_key(&mut self, action: AppAction) {
        let section = &mut self.state.sections[self.state.active];
        match action {
            AppAction::Submit | AppAction::Input('y') => {
                section
                    .crud
                    .confirm_delete(&self.backend, &mut section.table)
                    .await;
                section.clamp_cursor();
            }
            AppAction::Cancel | AppAction::Input('n') => section.crud.cancel(),
            _ => {}
        }
    }

    async fn switch_section(&mut self, index: usize) {
        self.state.active = index;
        self.state.focus = Focus::Table;
        self.state.section_mut().ensure_mounted().await;
    }

    fn set_sidebar(&mut self, open: bool) {
        let section = &mut self.state.sections[self.state.active];
        section.sidebar_open = open;
        if !open {
            self.state.focus = Focus::Table;
        }
        if let Err(err) = store::set_sidebar_open(&mut self.store, section.def.key, open) {
            tracing::error!("failed to persist sidebar state: {err}");
            self.state
                .notices
                .push(NoticeLevel::Error, "Could not save the sidebar state.");
        }
    }

    /// Opens the linked section scoped to the row under the cursor.
    async fn drill_down(&mut self) {
        let section = self.state.section();
        let Some(link) = section.def.drill_down else {
            return;
        };
        let controller = section.table.controller();
        let Some(row) = controller.rows().get(section.cursor) else {
            return;
        };
        let Some(id) = controller.identity().identify(row) else {
            return;
        };
        let label = datatable::lookup(row, link.label_field)
            .and_then(Value::as_str)
            .map_or_else(|| id.to_string(), str::to_string);
        let Some(index) = self
            .state
            .sections
            .iter()
            .position(|candidate| candidate.def.key == link.target)
        else {
            tracing::warn!("drill-down target {} is not a section", link.target);
            return;
        };

        let scope_title = section.def.title;
        self.state.active = index;
        self.state.focus = Focus::Table;
        let target = self.state.section_mut();
        target.pipeline = FilterPipeline::new(target.def.path, target.filters.defaults().clone())
            .with_scope(link.param, id.as_str());
        target.scope = Some(format!("{scope_title}: {label}"));
        let values = target.filters.submit();
        target.apply_filters(values).await;
    }

    async fn clear_scope(&mut self) {
        let section = self.state.section_mut();
        if section.scope.take().is_none() {
            return;
        }
        section.pipeline =
            FilterPipeline::new(section.def.path, section.filters.defaults().clone());
        let values = section.filters.submit();
        section.apply_filters(values).await;
    }
}

/// Space cycles toggles and selects instead of typing.
fn is_choice(kind: Option<&FieldKind>) -> bool {
    matches!(kind, Some(FieldKind::Toggle | FieldKind::Select(_)))
}
