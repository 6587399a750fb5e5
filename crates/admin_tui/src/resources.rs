//! Per-entity table definitions: what each section lists, filters and edits.
use api_types::{
    Currency,
    access_group::AccessGroupView,
    account::AccountView,
    category::CategoryKind,
    payment_method::PaymentMethodKind,
    transaction::{TransactionKind, TransactionView},
};
use datatable::{
    Align, ColumnDescriptor, FieldKind, FilterField, FilterValue, FilterValues, FormField, Row,
    SelectOption, TableError,
};
use serde::de::DeserializeOwned;

#[derive(Debug, Clone)]
pub struct ResourceDef {
    /// Stable key used for persisted per-table state.
    pub key: &'static str,
    pub title: &'static str,
    /// Resource path relative to the backend root.
    pub path: &'static str,
    pub columns: Vec<ColumnDescriptor>,
    pub filter_fields: Vec<FilterField>,
    pub filter_defaults: FilterValues,
    pub form_fields: Vec<FormField>,
    pub drill_down: Option<DrillDown>,
}

/// Opening a row shows another section scoped to that row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrillDown {
    /// Key of the section to open.
    pub target: &'static str,
    /// Scoping parameter carrying the row id.
    pub param: &'static str,
    /// Row field naming the scope in the info bar.
    pub label_field: &'static str,
}

pub fn all() -> Result<Vec<ResourceDef>, TableError> {
    Ok(vec![
        users()?,
        accounts()?,
        categories()?,
        payment_methods()?,
        transactions()?,
        access_groups()?,
    ])
}

pub fn users() -> Result<ResourceDef, TableError> {
    Ok(ResourceDef {
        key: "users",
        title: "Users",
        path: "users",
        columns: vec![
            ColumnDescriptor::field("Username", "username")
                .sortable()
                .build()?,
            ColumnDescriptor::field("Email", "email").sortable().build()?,
            ColumnDescriptor::field("Name", "full_name").build()?,
            ColumnDescriptor::field("Active", "active")
                .kind(FieldKind::Toggle)
                .align(Align::Center)
                .build()?,
            ColumnDescriptor::field("Created", "created_at")
                .kind(FieldKind::Date)
                .sortable()
                .build()?,
        ],
        filter_fields: vec![
            FilterField::text("q", "Search"),
            FilterField::toggle("active", "Active only"),
        ],
        filter_defaults: FilterValues::new(),
        form_fields: vec![
            FormField::new("username", "Username", FieldKind::Text).required(),
            FormField::new("email", "Email", FieldKind::Text).required(),
            FormField::new("full_name", "Full name", FieldKind::Text),
            FormField::new("active", "Active", FieldKind::Toggle),
        ],
        drill_down: None,
    })
}

pub fn accounts() -> Result<ResourceDef, TableError> {
    Ok(ResourceDef {
        key: "accounts",
        title: "Accounts",
        path: "accounts",
        columns: vec![
            ColumnDescriptor::field("Name", "name").sortable().build()?,
            ColumnDescriptor::field("Owner", "owner_id").build()?,
            ColumnDescriptor::computed("Balance", account_balance)
                .sort_key("balance_minor")
                .align(Align::Right)
                .build()?,
            ColumnDescriptor::field("Active", "active")
                .kind(FieldKind::Toggle)
                .align(Align::Center)
                .build()?,
        ],
        filter_fields: vec![
            FilterField::text("q", "Search"),
            FilterField::select("currency", "Currency", currency_options()),
            FilterField::toggle("active", "Active only"),
        ],
        filter_defaults: FilterValues::new(),
        form_fields: vec![
            FormField::new("name", "Name", FieldKind::Text).required(),
            FormField::new("owner_id", "Owner id", FieldKind::Text).required(),
            FormField::new("currency", "Currency", FieldKind::Select(currency_options()))
                .required(),
            FormField::new("active", "Active", FieldKind::Toggle),
        ],
        drill_down: Some(DrillDown {
            target: "transactions",
            param: "account_id",
            label_field: "name",
        }),
    })
}

pub fn categories() -> Result<ResourceDef, TableError> {
    let kinds = options(CategoryKind::ALL.map(|kind| (kind.code(), kind.label())));
    Ok(ResourceDef {
        key: "categories",
        title: "Categories",
        path: "categories",
        columns: vec![
            ColumnDescriptor::field("Name", "name").sortable().build()?,
            ColumnDescriptor::field("Kind", "kind")
                .kind(FieldKind::Select(kinds.clone()))
                .sortable()
                .build()?,
            ColumnDescriptor::field("Archived", "archived")
                .kind(FieldKind::Toggle)
                .align(Align::Center)
                .build()?,
        ],
        filter_fields: vec![
            FilterField::text("q", "Search"),
            FilterField::select("kind", "Kind", kinds.clone()),
            FilterField::toggle("archived", "Archived"),
        ],
        filter_defaults: FilterValues::new(),
        form_fields: vec![
            FormField::new("name", "Name", FieldKind::Text).required(),
            FormField::new("kind", "Kind", FieldKind::Select(kinds)).required(),
            FormField::new("archived", "Archived", FieldKind::Toggle),
        ],
        drill_down: None,
    })
}

pub fn payment_methods() -> Result<ResourceDef, TableError> {
    let kinds = options(PaymentMethodKind::ALL.map(|kind| (kind.code(), kind.label())));
    Ok(ResourceDef {
        key: "payment_methods",
        title: "Payment methods",
        path: "payment-methods",
        columns: vec![
            ColumnDescriptor::field("Name", "name").sortable().build()?,
            ColumnDescriptor::field("Kind", "kind")
                .kind(FieldKind::Select(kinds.clone()))
                .build()?,
            ColumnDescriptor::field("Active", "active")
                .kind(FieldKind::Toggle)
                .align(Align::Center)
                .build()?,
        ],
        filter_fields: vec![
            FilterField::text("q", "Search"),
            FilterField::select("kind", "Kind", kinds.clone()),
        ],
        filter_defaults: FilterValues::new(),
        form_fields: vec![
            FormField::new("name", "Name", FieldKind::Text).required(),
            FormField::new("kind", "Kind", FieldKind::Select(kinds)).required(),
            FormField::new("active", "Active", FieldKind::Toggle),
        ],
        drill_down: None,
    })
}

pub fn transactions() -> Result<ResourceDef, TableError> {
    let kinds = options(TransactionKind::ALL.map(|kind| (kind.code(), kind.label())));
    Ok(ResourceDef {
        key: "transactions",
        title: "Transactions",
        path: "transactions",
        columns: vec![
            ColumnDescriptor::field("When", "occurred_at")
                .kind(FieldKind::Date)
                .sortable()
                .build()?,
            ColumnDescriptor::field("Kind", "kind")
                .kind(FieldKind::Select(kinds.clone()))
                .build()?,
            ColumnDescriptor::computed("Amount", transaction_amount)
                .sort_key("amount_minor")
                .align(Align::Right)
                .build()?,
            ColumnDescriptor::field("Note", "note").build()?,
        ],
        filter_fields: vec![
            FilterField::select("kind", "Kind", kinds.clone()),
            FilterField::date("from", "From"),
            FilterField::date("to", "To"),
            FilterField::text("q", "Note"),
        ],
        filter_defaults: FilterValues::new(),
        form_fields: vec![
            FormField::new("account_id", "Account id", FieldKind::Text).required(),
            FormField::new("kind", "Kind", FieldKind::Select(kinds)).required(),
            FormField::new("amount_minor", "Amount (cents)", FieldKind::Number).required(),
            FormField::new("currency", "Currency", FieldKind::Select(currency_options()))
                .required(),
            FormField::new("occurred_at", "Date", FieldKind::Date).required(),
            FormField::new("category_id", "Category id", FieldKind::Text),
            FormField::new("payment_method_id", "Payment method id", FieldKind::Text),
            FormField::new("note", "Note", FieldKind::Text),
        ],
        drill_down: None,
    })
}

pub fn access_groups() -> Result<ResourceDef, TableError> {
    let mut filter_defaults = FilterValues::new();
    filter_defaults.insert("with_members".to_string(), FilterValue::Bool(false));
    Ok(ResourceDef {
        key: "access_groups",
        title: "Access groups",
        path: "access-groups",
        columns: vec![
            ColumnDescriptor::field("Name", "name").sortable().build()?,
            ColumnDescriptor::field("Description", "description").build()?,
            ColumnDescriptor::computed("Members", group_members)
                .align(Align::Right)
                .build()?,
            ColumnDescriptor::field("Permissions", "permissions").build()?,
        ],
        filter_fields: vec![
            FilterField::text("q", "Search"),
            FilterField::toggle("with_members", "With members"),
        ],
        filter_defaults,
        form_fields: vec![
            FormField::new("name", "Name", FieldKind::Text).required(),
            FormField::new("description", "Description", FieldKind::Text),
        ],
        drill_down: None,
    })
}

fn currency_options() -> Vec<SelectOption> {
    options(Currency::ALL.map(|currency| (currency.code(), currency.code())))
}

fn options<const N: usize>(pairs: [(&str, &str); N]) -> Vec<SelectOption> {
    pairs
        .into_iter()
        .map(|(value, label)| SelectOption::new(value, label))
        .collect()
}

fn decode<T: DeserializeOwned>(row: &Row) -> Option<T> {
    serde_json::from_value(row.clone()).ok()
}

fn account_balance(row: &Row) -> String {
    decode::<AccountView>(row)
        .map(|account| account.currency.format_minor(account.balance_minor))
        .unwrap_or_default()
}

fn transaction_amount(row: &Row) -> String {
    decode::<TransactionView>(row)
        .map(|tx| tx.currency.format_minor(tx.amount_minor))
        .unwrap_or_default()
}

fn group_members(row: &Row) -> String {
    decode::<AccessGroupView>(row)
        .map(|group| group.members.len().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn every_section_builds() {
        let defs = all().unwrap();
        let keys: Vec<&str> = defs.iter().map(|def| def.key).collect();
        assert_eq!(
            keys,
            [
                "users",
                "accounts",
                "categories",
                "payment_methods",
                "transactions",
                "access_groups"
            ]
        );
        assert!(defs.iter().all(|def| !def.columns.is_empty()));
    }

    #[test]
    fn kind_choices_use_wire_codes() {
        let def = payment_methods().unwrap();
        let kind = def.form_fields.iter().find(|field| field.name == "kind").unwrap();
        let FieldKind::Select(options) = &kind.kind else {
            panic!("kind should be a select field");
        };
        let values: Vec<&str> = options.iter().map(|option| option.value.as_str()).collect();
        assert_eq!(values, ["cash", "card", "bank_transfer", "other"]);
        assert_eq!(options[2].label, "Bank transfer");
    }

    #[test]
    fn balance_column_formats_minor_units() {
        let def = accounts().unwrap();
        let row = json!({
            "id": Uuid::nil(),
            "name": "Checking",
            "owner_id": Uuid::nil(),
            "currency": "USD",
            "balance_minor": -1250,
            "active": true,
        });
        let balance = &def.columns[2];
        assert_eq!(balance.render(&row), "-12.50 USD");
        assert_eq!(balance.sort_key(), Some("balance_minor"));
    }

    #[test]
    fn accounts_drill_into_transactions() {
        let defs = all().unwrap();
        let link = accounts().unwrap().drill_down.unwrap();
        assert!(defs.iter().any(|def| def.key == link.target));
        assert!(
            defs.iter()
                .filter(|def| def.key != "accounts")
                .all(|def| def.drill_down.is_none())
        );
    }

    #[test]
    fn computed_columns_tolerate_partial_rows() {
        let def = transactions().unwrap();
        assert_eq!(def.columns[2].render(&json!({"id": "t1"})), "");
    }

    #[test]
    fn member_count_is_computed_and_unsortable() {
        let def = access_groups().unwrap();
        let row = json!({
            "id": Uuid::nil(),
            "name": "admins",
            "description": null,
            "members": ["ann", "bob"],
            "permissions": ["users.read"],
        });
        assert_eq!(def.columns[2].render(&row), "2");
        assert!(!def.columns[2].is_sortable());
        assert!(!def.form_fields.iter().any(|field| field.name == "members"));
    }
}
