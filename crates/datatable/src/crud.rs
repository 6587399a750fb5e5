//! Create/edit/delete dialogs bound to a table.
use std::{
    collections::{BTreeMap, VecDeque},
    time::{Duration, Instant},
};

use futures::future::join_all;
use serde_json::{Map, Value};

use crate::{Backend, FieldKind, IdentityAccessor, RowId, TableHandle, lookup};

const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Transient notification shown after a mutation.
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub expires_at: Instant,
}

#[derive(Debug)]
pub struct Notices {
    items: VecDeque<Notice>,
    ttl: Duration,
}

impl Default for Notices {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_NOTICE_TTL)
    }
}

impl Notices {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            items: VecDeque::new(),
            ttl,
        }
    }

    pub fn push(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.items.push_back(Notice {
            level,
            message: message.into(),
            expires_at: Instant::now() + self.ttl,
        });
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.items.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drops notices that expired at `now`.
    pub fn prune(&mut self, now: Instant) {
        self.items.retain(|notice| notice.expires_at > now);
    }
}

/// One input of a create/edit form.
#[derive(Debug, Clone)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
}

impl FormField {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(RowId),
}

/// Open create/edit dialog: raw inputs plus field-level errors.
#[derive(Debug, Clone)]
pub struct FormDialog {
    mode: FormMode,
    fields: Vec<FormField>,
    inputs: BTreeMap<String, String>,
    errors: BTreeMap<String, Vec<String>>,
    focus: usize,
}

impl FormDialog {
    fn new(mode: FormMode, fields: Vec<FormField>, inputs: BTreeMap<String, String>) -> Self {
        let focus = fields
            .iter()
            .position(|field| field.kind.is_editable())
            .unwrap_or(0);
        Self {
            mode,
            fields,
            inputs,
            errors: BTreeMap::new(),
            focus,
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn input(&self, name: &str) -> &str {
        self.inputs.get(name).map(String::as_str).unwrap_or_default()
    }

    pub fn set_input(&mut self, name: &str, value: impl Into<String>) {
        self.inputs.insert(name.to_string(), value.into());
        self.errors.remove(name);
    }

    pub fn errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }

    pub fn field_errors(&self, name: &str) -> &[String] {
        self.errors.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn focused_field(&self) -> Option<&FormField> {
        self.fields.get(self.focus)
    }

    /// Moves to the next editable field, wrapping around.
    pub fn focus_next(&mut self) {
        self.step_focus(1);
    }

    pub fn focus_prev(&mut self) {
        self.step_focus(self.fields.len().saturating_sub(1));
    }

    fn step_focus(&mut self, step: usize) {
        let len = self.fields.len();
        for offset in 1..=len {
            let index = (self.focus + step * offset) % len;
            if self.fields[index].kind.is_editable() {
                self.focus = index;
                return;
            }
        }
    }

    pub fn push_char(&mut self, ch: char) {
        if let Some(name) = self.editable_focus() {
            let mut value = self.input(&name).to_string();
            value.push(ch);
            self.set_input(&name, value);
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(name) = self.editable_focus() {
            let mut value = self.input(&name).to_string();
            value.pop();
            self.set_input(&name, value);
        }
    }

    /// Flips a toggle or cycles a select on the focused field.
    pub fn cycle_focused(&mut self) {
        let Some(field) = self.fields.get(self.focus) else {
            return;
        };
        let name = field.name.clone();
        let next = match &field.kind {
            FieldKind::Toggle => {
                let on = matches!(field.kind.parse(self.input(&name)), Ok(Value::Bool(true)));
                let next = if on { "no" } else { "yes" };
                next.to_string()
            }
            FieldKind::Select(options) => {
                let current = self.input(&name);
                let position = options.iter().position(|option| option.value == current);
                let next = match position {
                    None => options.first(),
                    Some(index) => options.get(index + 1).or(options.first()),
                };
                next.map(|option| option.value.clone()).unwrap_or_default()
            }
            _ => return,
        };
        self.set_input(&name, next);
    }

    fn editable_focus(&self) -> Option<String> {
        let field = self.fields.get(self.focus)?;
        match field.kind {
            FieldKind::Text | FieldKind::Number | FieldKind::Date | FieldKind::File => {
                Some(field.name.clone())
            }
            _ => None,
        }
    }

    /// Parses every editable input by its kind. On failure the errors are
    /// recorded on the form and returned.
    pub fn payload(&mut self) -> Result<Value, BTreeMap<String, Vec<String>>> {
        let mut body = Map::new();
        let mut errors = BTreeMap::new();
        for field in self.fields.iter().filter(|field| field.kind.is_editable()) {
            let raw = self.inputs.get(&field.name).map(String::as_str).unwrap_or_default();
            match field.kind.parse(raw) {
                Ok(Value::Null) if field.required => {
                    errors.insert(field.name.clone(), vec!["required".to_string()]);
                }
                Ok(value) => {
                    body.insert(field.name.clone(), value);
                }
                Err(err) => {
                    errors.insert(field.name.clone(), vec![err]);
                }
            }
        }

        if errors.is_empty() {
            self.errors.clear();
            Ok(Value::Object(body))
        } else {
            self.errors = errors.clone();
            Err(errors)
        }
    }

    fn set_server_errors(&mut self, errors: BTreeMap<String, Vec<String>>) {
        self.errors = errors;
    }
}

#[derive(Debug, Clone)]
pub enum Dialog {
    None,
    Form(FormDialog),
    ConfirmDelete { ids: Vec<RowId> },
}

impl Dialog {
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Confirmation text stating how many rows go.
    pub fn confirm_prompt(&self) -> Option<String> {
        match self {
            Self::ConfirmDelete { ids } if ids.len() == 1 => {
                Some("Delete the selected row?".to_string())
            }
            Self::ConfirmDelete { ids } => Some(format!("Delete {} selected rows?", ids.len())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub succeeded: usize,
    pub failed: usize,
}

/// Create/edit/delete actions for one resource, driving a [`TableHandle`].
#[derive(Debug)]
pub struct CrudOrchestrator {
    resource: String,
    fields: Vec<FormField>,
    identity: IdentityAccessor,
    dialog: Dialog,
    notices: Notices,
}

impl CrudOrchestrator {
    pub fn new(resource: impl Into<String>, fields: Vec<FormField>) -> Self {
        Self {
            resource: resource.into(),
            fields,
            identity: IdentityAccessor::default(),
            dialog: Dialog::None,
            notices: Notices::default(),
        }
    }

    pub fn with_identity(mut self, identity: IdentityAccessor) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_notices(mut self, notices: Notices) -> Self {
        self.notices = notices;
        self
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn dialog(&self) -> &Dialog {
        &self.dialog
    }

    pub fn dialog_mut(&mut self) -> &mut Dialog {
        &mut self.dialog
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn notices_mut(&mut self) -> &mut Notices {
        &mut self.notices
    }

    pub fn can_edit<H: TableHandle>(&self, handle: &H) -> bool {
        handle.selection().len() == 1
    }

    pub fn can_delete<H: TableHandle>(&self, handle: &H) -> bool {
        !handle.selection().is_empty()
    }

    pub fn open_create(&mut self) {
        self.dialog = Dialog::Form(FormDialog::new(
            FormMode::Create,
            self.fields.clone(),
            BTreeMap::new(),
        ));
    }

    /// Opens the edit dialog pre-filled from the single selected row.
    /// Returns `false` unless exactly one row is selected.
    pub fn open_edit<H: TableHandle>(&mut self, handle: &H) -> bool {
        let selection = handle.selection();
        let [row] = selection.as_slice() else {
            return false;
        };
        let Some(id) = self.identity.identify(row) else {
            return false;
        };
        let inputs = self
            .fields
            .iter()
            .map(|field| {
                let text = field.kind.input_text(lookup(row, &field.name));
                (field.name.clone(), text)
            })
            .collect();
        self.dialog = Dialog::Form(FormDialog::new(
            FormMode::Edit(id),
            self.fields.clone(),
            inputs,
        ));
        true
    }

    /// Asks for confirmation of deleting every selected row. Returns `false`
    /// when nothing is selected.
    pub fn open_delete<H: TableHandle>(&mut self, handle: &H) -> bool {
        let ids: Vec<RowId> = handle
            .selection()
            .iter()
            .filter_map(|row| self.identity.identify(row))
            .collect();
        if ids.is_empty() {
            return false;
        }
        self.dialog = Dialog::ConfirmDelete { ids };
        true
    }

    pub fn cancel(&mut self) {
        self.dialog = Dialog::None;
    }

    /// Submits the open form. Returns whether the mutation went through.
    ///
    /// Structured field errors from the backend stay on the form; any other
    /// failure becomes one error notice. The dialog stays open on failure.
    pub async fn submit_form<B: Backend, H: TableHandle>(
        &mut self,
        backend: &B,
        handle: &mut H,
    ) -> bool {
        let Dialog::Form(form) = &mut self.dialog else {
            return false;
        };
        let Ok(body) = form.payload() else {
            return false;
        };
        let mode = form.mode().clone();

        let result = match &mode {
            FormMode::Create => backend.create(&self.resource, &body).await,
            FormMode::Edit(id) => backend.update(&self.resource, id, &body).await,
        };

        match result {
            Ok(()) => {
                self.dialog = Dialog::None;
                match mode {
                    FormMode::Create => {
                        tracing::info!("created {} record", self.resource);
                        self.notices.push(NoticeLevel::Success, "Created.");
                    }
                    FormMode::Edit(id) => {
                        tracing::info!("updated {} record {id}", self.resource);
                        handle.clear_selection();
                        self.notices.push(NoticeLevel::Success, "Saved.");
                    }
                }
                handle.reload(None).await;
                true
            }
            Err(err) => {
                tracing::warn!("{} mutation failed: {err}", self.resource);
                let field_errors = err
                    .body()
                    .filter(|body| body.has_field_errors())
                    .and_then(|body| body.errors.clone());
                match (field_errors, &mut self.dialog) {
                    (Some(errors), Dialog::Form(form)) => form.set_server_errors(errors),
                    _ => self.notices.push(NoticeLevel::Error, err.user_message()),
                }
                false
            }
        }
    }

    /// Deletes every row awaiting confirmation, all requests in flight at
    /// once. Successes are never rolled back; the selection is cleared only
    /// if every deletion succeeded, and the table is reloaded either way.
    pub async fn confirm_delete<B: Backend, H: TableHandle>(
        &mut self,
        backend: &B,
        handle: &mut H,
    ) -> DeleteOutcome {
        let Dialog::ConfirmDelete { ids } = std::mem::replace(&mut self.dialog, Dialog::None)
        else {
            return DeleteOutcome::default();
        };

        let results = join_all(ids.iter().map(|id| backend.delete(&self.resource, id))).await;
        let mut outcome = DeleteOutcome::default();
        for (id, result) in ids.iter().zip(results) {
            match result {
                Ok(()) => outcome.succeeded += 1,
                Err(err) => {
                    tracing::warn!("failed to delete {} record {id}: {err}", self.resource);
                    outcome.failed += 1;
                }
            }
        }

        if outcome.failed == 0 {
            tracing::info!("deleted {} {} records", outcome.succeeded, self.resource);
            handle.clear_selection();
            self.notices.push(
                NoticeLevel::Success,
                format!("Deleted {} rows.", outcome.succeeded),
            );
        } else {
            self.notices.push(
                NoticeLevel::Error,
                format!("{} failed, {} deleted.", outcome.failed, outcome.succeeded),
            );
        }
        handle.reload(None).await;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeSet, sync::Mutex};

    use api_types::{error::ApiErrorBody, page::PageResponse};
    use reqwest::Url;
    use serde_json::json;
    use tokio::sync::Barrier;

    use super::*;
    use crate::{ClientError, Row, SelectOption};

    #[derive(Default)]
    struct FakeBackend {
        failing: BTreeSet<String>,
        create_error: Mutex<Option<ClientError>>,
        calls: Mutex<Vec<String>>,
        barrier: Option<Barrier>,
    }

    impl Backend for FakeBackend {
        fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
            Url::parse("http://fake.local/")
                .and_then(|base| base.join(path))
                .map_err(|err| ClientError::InvalidUrl(err.to_string()))
        }

        async fn get_page(&self, _url: Url) -> Result<PageResponse<Row>, ClientError> {
            Ok(PageResponse {
                content: Some(Vec::new()),
                number: None,
                size: None,
                total_elements: None,
            })
        }

        async fn create(&self, resource: &str, body: &Value) -> Result<(), ClientError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("POST {resource} {body}"));
            match self.create_error.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        async fn update(
            &self,
            resource: &str,
            id: &RowId,
            body: &Value,
        ) -> Result<(), ClientError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("PUT {resource}/{id} {body}"));
            Ok(())
        }

        async fn delete(&self, resource: &str, id: &RowId) -> Result<(), ClientError> {
            if let Some(barrier) = &self.barrier {
                barrier.wait().await;
            }
            self.calls
                .lock()
                .unwrap()
                .push(format!("DELETE {resource}/{id}"));
            if self.failing.contains(id.as_str()) {
                return Err(ClientError::from_status(500, ApiErrorBody::default()));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingHandle {
        selected: Vec<Row>,
        reloads: Vec<Option<String>>,
        cleared: bool,
    }

    impl TableHandle for RecordingHandle {
        async fn reload(&mut self, target: Option<&str>) {
            self.reloads.push(target.map(str::to_string));
        }

        fn selection(&self) -> Vec<Row> {
            self.selected.clone()
        }

        fn clear_selection(&mut self) {
            self.cleared = true;
            self.selected.clear();
        }
    }

    fn fields() -> Vec<FormField> {
        vec![
            FormField::new("name", "Name", FieldKind::Text).required(),
            FormField::new(
                "kind",
                "Kind",
                FieldKind::Select(vec![
                    SelectOption::new("income", "Income"),
                    SelectOption::new("expense", "Expense"),
                ]),
            ),
            FormField::new("archived", "Archived", FieldKind::Toggle),
            FormField::new("label", "Label", FieldKind::computed(|_| String::new())),
        ]
    }

    fn handle_with(ids: &[u64]) -> RecordingHandle {
        RecordingHandle {
            selected: ids.iter().map(|id| json!({"id": id, "name": format!("row {id}")})).collect(),
            ..RecordingHandle::default()
        }
    }

    fn fill_create(crud: &mut CrudOrchestrator) {
        crud.open_create();
        let Dialog::Form(form) = crud.dialog_mut() else {
            panic!("form not open");
        };
        form.set_input("name", "Groceries");
        form.set_input("kind", "expense");
    }

    #[tokio::test]
    async fn create_success_reloads_without_target() {
        let backend = FakeBackend::default();
        let mut handle = RecordingHandle::default();
        let mut crud = CrudOrchestrator::new("categories", fields());
        fill_create(&mut crud);

        assert!(crud.submit_form(&backend, &mut handle).await);
        assert!(!crud.dialog().is_open());
        assert_eq!(handle.reloads, vec![None]);
        assert_eq!(crud.notices().latest().map(|n| n.level), Some(NoticeLevel::Success));
        let calls = backend.calls.lock().unwrap();
        assert_eq!(
            calls.as_slice(),
            [r#"POST categories {"archived":false,"kind":"expense","name":"Groceries"}"#]
        );
    }

    #[tokio::test]
    async fn local_validation_blocks_the_request() {
        let backend = FakeBackend::default();
        let mut handle = RecordingHandle::default();
        let mut crud = CrudOrchestrator::new("categories", fields());
        crud.open_create();
        if let Dialog::Form(form) = crud.dialog_mut() {
            form.set_input("kind", "gift");
        }

        assert!(!crud.submit_form(&backend, &mut handle).await);
        let Dialog::Form(form) = crud.dialog() else {
            panic!("form closed");
        };
        assert_eq!(form.field_errors("name"), ["required".to_string()]);
        assert!(!form.field_errors("kind").is_empty());
        assert!(backend.calls.lock().unwrap().is_empty());
        assert!(handle.reloads.is_empty());
    }

    #[tokio::test]
    async fn structured_server_errors_stay_on_the_form() {
        let mut errors = BTreeMap::new();
        errors.insert("name".to_string(), vec!["already exists".to_string()]);
        let backend = FakeBackend {
            create_error: Mutex::new(Some(ClientError::from_status(
                422,
                ApiErrorBody {
                    errors: Some(errors),
                    ..ApiErrorBody::default()
                },
            ))),
            ..FakeBackend::default()
        };
        let mut handle = RecordingHandle::default();
        let mut crud = CrudOrchestrator::new("categories", fields());
        fill_create(&mut crud);

        assert!(!crud.submit_form(&backend, &mut handle).await);
        let Dialog::Form(form) = crud.dialog() else {
            panic!("form closed");
        };
        assert_eq!(form.field_errors("name"), ["already exists".to_string()]);
        assert!(crud.notices().is_empty());
        assert!(handle.reloads.is_empty());
    }

    #[tokio::test]
    async fn unstructured_server_errors_become_a_notice() {
        let backend = FakeBackend {
            create_error: Mutex::new(Some(ClientError::from_status(
                409,
                ApiErrorBody {
                    detail: Some("duplicate category".to_string()),
                    ..ApiErrorBody::default()
                },
            ))),
            ..FakeBackend::default()
        };
        let mut handle = RecordingHandle::default();
        let mut crud = CrudOrchestrator::new("categories", fields());
        fill_create(&mut crud);

        assert!(!crud.submit_form(&backend, &mut handle).await);
        assert!(crud.dialog().is_open());
        let notice = crud.notices().latest().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "duplicate category");
    }

    #[tokio::test]
    async fn edit_requires_exactly_one_selected_row() {
        let backend = FakeBackend::default();
        let mut crud = CrudOrchestrator::new("categories", fields());
        assert!(!crud.open_edit(&handle_with(&[])));
        assert!(!crud.open_edit(&handle_with(&[1, 2])));

        let mut handle = handle_with(&[7]);
        assert!(crud.can_edit(&handle));
        assert!(crud.open_edit(&handle));
        let Dialog::Form(form) = crud.dialog() else {
            panic!("form not open");
        };
        assert_eq!(form.mode(), &FormMode::Edit(RowId::new("7")));
        assert_eq!(form.input("name"), "row 7");

        assert!(crud.submit_form(&backend, &mut handle).await);
        assert!(handle.cleared);
        assert_eq!(handle.reloads, vec![None]);
        let calls = backend.calls.lock().unwrap();
        assert!(calls[0].starts_with("PUT categories/7 "));
    }

    #[tokio::test]
    async fn partial_bulk_delete_reports_failures_and_keeps_selection() {
        let backend = FakeBackend {
            failing: BTreeSet::from(["2".to_string()]),
            ..FakeBackend::default()
        };
        let mut handle = handle_with(&[1, 2, 3]);
        let mut crud = CrudOrchestrator::new("categories", fields());
        assert!(crud.open_delete(&handle));
        assert_eq!(
            crud.dialog().confirm_prompt().as_deref(),
            Some("Delete 3 selected rows?")
        );

        let outcome = crud.confirm_delete(&backend, &mut handle).await;
        assert_eq!(outcome, DeleteOutcome { succeeded: 2, failed: 1 });
        let notice = crud.notices().latest().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.message.starts_with("1 failed"));
        assert!(!handle.cleared);
        assert_eq!(handle.selected.len(), 3);
        assert_eq!(handle.reloads, vec![None]);
        assert_eq!(backend.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn full_bulk_delete_clears_selection() {
        let backend = FakeBackend::default();
        let mut handle = handle_with(&[1, 2]);
        let mut crud = CrudOrchestrator::new("categories", fields());
        assert!(crud.open_delete(&handle));
        let outcome = crud.confirm_delete(&backend, &mut handle).await;
        assert_eq!(outcome.failed, 0);
        assert!(handle.cleared);
        assert_eq!(handle.reloads, vec![None]);
        assert!(!crud.dialog().is_open());
    }

    #[tokio::test]
    async fn deletions_run_concurrently() {
        let backend = FakeBackend {
            barrier: Some(Barrier::new(3)),
            ..FakeBackend::default()
        };
        let mut handle = handle_with(&[1, 2, 3]);
        let mut crud = CrudOrchestrator::new("categories", fields());
        crud.open_delete(&handle);
        let outcome = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            crud.confirm_delete(&backend, &mut handle),
        )
        .await
        .expect("deletions were issued one at a time");
        assert_eq!(outcome.succeeded, 3);
    }

    #[test]
    fn delete_needs_a_selection() {
        let mut crud = CrudOrchestrator::new("categories", fields());
        assert!(!crud.open_delete(&handle_with(&[])));
        assert!(!crud.can_delete(&handle_with(&[])));
        assert_eq!(crud.dialog().confirm_prompt(), None);
    }

    #[test]
    fn form_focus_skips_read_only_fields() {
        let mut crud = CrudOrchestrator::new("categories", fields());
        crud.open_create();
        let Dialog::Form(form) = crud.dialog_mut() else {
            panic!("form not open");
        };
        assert_eq!(form.focus(), 0);
        form.focus_next();
        form.focus_next();
        assert_eq!(form.focused_field().map(|f| f.name.as_str()), Some("archived"));
        form.cycle_focused();
        assert_eq!(form.input("archived"), "yes");
        form.focus_next();
        assert_eq!(form.focus(), 0);
        form.focus_prev();
        assert_eq!(form.focus(), 2);
        form.push_char('x');
        assert_eq!(form.input("archived"), "yes");
    }

    #[test]
    fn notices_expire() {
        let mut notices = Notices::with_ttl(Duration::from_millis(10));
        notices.push(NoticeLevel::Info, "hello");
        assert_eq!(notices.len(), 1);
        notices.prune(Instant::now() + Duration::from_secs(1));
        assert!(notices.is_empty());
    }
}
