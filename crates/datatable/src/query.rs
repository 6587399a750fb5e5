use std::collections::BTreeMap;

use reqwest::Url;

/// Query parameters owned by the table itself; a filter can never set them.
pub(crate) const RESERVED_PARAMS: [&str; 3] = ["page", "size", "sort"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub key: String,
    pub direction: SortDirection,
}

impl Sort {
    /// Wire form of the sort parameter: `<key>,<asc|desc>`.
    pub fn param(&self) -> String {
        format!("{},{}", self.key, self.direction.as_str())
    }
}

/// Pagination, sort and filters driving the next fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    pub page_index: u64,
    pub page_size: u64,
    pub sort: Option<Sort>,
    pub filters: BTreeMap<String, String>,
}

impl QueryState {
    pub fn new(page_size: u64) -> Self {
        Self {
            page_index: 0,
            page_size,
            sort: None,
            filters: BTreeMap::new(),
        }
    }

    /// Header-click rule: the same key active in `asc` flips to `desc`,
    /// anything else starts over at `asc`.
    pub fn toggle_sort(&mut self, key: &str) {
        let direction = match &self.sort {
            Some(sort) if sort.key == key && sort.direction == SortDirection::Asc => {
                SortDirection::Desc
            }
            _ => SortDirection::Asc,
        };
        self.sort = Some(Sort {
            key: key.to_string(),
            direction,
        });
    }

    /// Query pairs in wire order: page, size, sort, then cleaned filters.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page_index.to_string()),
            ("size".to_string(), self.page_size.to_string()),
        ];
        if let Some(sort) = &self.sort {
            params.push(("sort".to_string(), sort.param()));
        }
        params.extend(
            self.filters
                .iter()
                .filter(|(key, value)| {
                    !RESERVED_PARAMS.contains(&key.as_str()) && !is_blank_param(value)
                })
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        params
    }

    /// Replaces whatever query string `target` carries with this state.
    pub fn apply_to(&self, target: &Url) -> Url {
        let mut url = target.clone();
        url.set_query(None);
        url.query_pairs_mut().extend_pairs(self.to_params());
        url
    }
}

/// Cleaning rule shared with the filter bridge: empty, `false` and `null`
/// values are not sent.
pub fn is_blank_param(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == "false" || value == "null"
}
