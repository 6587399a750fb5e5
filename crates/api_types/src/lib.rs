use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
    Usd,
    Gbp,
}

impl Currency {
    pub const ALL: [Self; 3] = [Self::Eur, Self::Usd, Self::Gbp];

    pub fn code(self) -> &'static str {
        match self {
            Self::Eur => "EUR",
            Self::Usd => "USD",
            Self::Gbp => "GBP",
        }
    }

    /// Renders an amount in minor units (cents) as `-12.34 EUR`.
    pub fn format_minor(self, amount_minor: i64) -> String {
        let sign = if amount_minor < 0 { "-" } else { "" };
        let abs = amount_minor.unsigned_abs();
        format!("{sign}{}.{:02} {}", abs / 100, abs % 100, self.code())
    }
}

pub mod page {
    use super::*;

    /// Page shape returned by every list endpoint.
    ///
    /// All fields are optional on the wire: the console falls back to the
    /// values it asked for when the backend omits them.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PageResponse<T> {
        pub content: Option<Vec<T>>,
        pub number: Option<u64>,
        pub size: Option<u64>,
        pub total_elements: Option<u64>,
    }
}

pub mod error {
    use std::collections::BTreeMap;

    use super::*;

    /// Error body returned by mutation endpoints.
    ///
    /// `errors` maps a form field to its validation messages; `detail` and
    /// `message` carry a single human readable reason.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ApiErrorBody {
        #[serde(default)]
        pub errors: Option<BTreeMap<String, Vec<String>>>,
        #[serde(default)]
        pub detail: Option<String>,
        #[serde(default)]
        pub message: Option<String>,
    }

    impl ApiErrorBody {
        /// Returns the most specific single message, `detail` first.
        pub fn summary(&self) -> Option<&str> {
            [self.detail.as_deref(), self.message.as_deref()]
                .into_iter()
                .flatten()
                .find(|msg| !msg.trim().is_empty())
        }

        pub fn has_field_errors(&self) -> bool {
            self.errors
                .as_ref()
                .is_some_and(|errors| errors.values().any(|msgs| !msgs.is_empty()))
        }
    }
}

pub mod account {
    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: Uuid,
        pub name: String,
        pub owner_id: Uuid,
        pub currency: Currency,
        pub balance_minor: i64,
        pub active: bool,
    }
}

pub mod category {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum CategoryKind {
        Income,
        Expense,
    }

    impl CategoryKind {
        pub const ALL: [Self; 2] = [Self::Income, Self::Expense];

        /// Wire value, as serialized.
        pub fn code(self) -> &'static str {
            match self {
                Self::Income => "income",
                Self::Expense => "expense",
            }
        }

        pub fn label(self) -> &'static str {
            match self {
                Self::Income => "Income",
                Self::Expense => "Expense",
            }
        }
    }
}

pub mod payment_method {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PaymentMethodKind {
        Cash,
        Card,
        BankTransfer,
        Other,
    }

    impl PaymentMethodKind {
        pub const ALL: [Self; 4] = [Self::Cash, Self::Card, Self::BankTransfer, Self::Other];

        pub fn code(self) -> &'static str {
            match self {
                Self::Cash => "cash",
                Self::Card => "card",
                Self::BankTransfer => "bank_transfer",
                Self::Other => "other",
            }
        }

        pub fn label(self) -> &'static str {
            match self {
                Self::Cash => "Cash",
                Self::Card => "Card",
                Self::BankTransfer => "Bank transfer",
                Self::Other => "Other",
            }
        }
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Income,
        Expense,
        Transfer,
    }

    impl TransactionKind {
        pub const ALL: [Self; 3] = [Self::Income, Self::Expense, Self::Transfer];

        pub fn code(self) -> &'static str {
            match self {
                Self::Income => "income",
                Self::Expense => "expense",
                Self::Transfer => "transfer",
            }
        }

        pub fn label(self) -> &'static str {
            match self {
                Self::Income => "Income",
                Self::Expense => "Expense",
                Self::Transfer => "Transfer",
            }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub account_id: Uuid,
        pub category_id: Option<Uuid>,
        pub payment_method_id: Option<Uuid>,
        pub kind: TransactionKind,
        /// Signed amount in minor units.
        pub amount_minor: i64,
        pub currency: Currency,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub occurred_at: DateTime<FixedOffset>,
        pub note: Option<String>,
    }
}

pub mod access_group {
    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct AccessGroupView {
        pub id: Uuid,
        pub name: String,
        pub description: Option<String>,
        #[serde(default)]
        pub members: Vec<String>,
        #[serde(default)]
        pub permissions: Vec<String>,
    }
}
