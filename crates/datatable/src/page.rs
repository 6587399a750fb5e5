use api_types::page::PageResponse;

use crate::{QueryState, Row};

/// Normalized result of one list fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageEnvelope {
    pub items: Vec<Row>,
    pub page_index: u64,
    pub page_size: u64,
    pub total_count: u64,
}

impl PageEnvelope {
    pub fn empty(page_index: u64, page_size: u64) -> Self {
        Self {
            items: Vec::new(),
            page_index,
            page_size,
            total_count: 0,
        }
    }

    /// Maps the backend page shape; every absent field falls back to what was
    /// requested, and a missing total counts as zero.
    pub fn from_response(response: PageResponse<Row>, query: &QueryState) -> Self {
        let page_size = response
            .size
            .filter(|size| *size > 0)
            .unwrap_or(query.page_size);
        let mut items = response.content.unwrap_or_default();
        let limit = usize::try_from(page_size).unwrap_or(usize::MAX);
        if items.len() > limit {
            tracing::warn!(
                "backend returned {} rows for a page of {page_size}, truncating",
                items.len()
            );
            items.truncate(limit);
        }

        Self {
            items,
            page_index: response.number.unwrap_or(query.page_index),
            page_size,
            total_count: response.total_elements.unwrap_or(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn page_count(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(self.page_size)
    }

    /// True when the page index lies past the last page of a non-empty result.
    pub fn is_out_of_range(&self) -> bool {
        self.total_count > 0 && self.page_index.saturating_mul(self.page_size) >= self.total_count
    }

    /// One-based `(first, last)` row numbers shown by this page, or `None`
    /// for an empty page or one whose numbers do not fit in a `u64`.
    pub fn row_range(&self) -> Option<(u64, u64)> {
        let shown = u64::try_from(self.items.len()).ok()?.checked_sub(1)?;
        let first = self
            .page_index
            .checked_mul(self.page_size)?
            .checked_add(1)?;
        Some((first, first.checked_add(shown)?))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn response(
        content: Option<Vec<Row>>,
        number: Option<u64>,
        size: Option<u64>,
        total: Option<u64>,
    ) -> PageResponse<Row> {
        PageResponse {
            content,
            number,
            size,
            total_elements: total,
        }
    }

    #[test]
    fn missing_fields_fall_back_to_request() {
        let mut query = QueryState::new(10);
        query.page_index = 4;
        let page = PageEnvelope::from_response(response(None, None, None, None), &query);
        assert_eq!(page, PageEnvelope::empty(4, 10));
    }

    #[test]
    fn oversized_content_is_truncated_to_page_size() {
        let query = QueryState::new(2);
        let rows = vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})];
        let page =
            PageEnvelope::from_response(response(Some(rows), Some(0), None, Some(3)), &query);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.page_size, 2);
    }

    #[test]
    fn page_count_and_ranges() {
        let page = PageEnvelope {
            items: vec![json!({"id": 5})],
            page_index: 2,
            page_size: 2,
            total_count: 5,
        };
        assert_eq!(page.page_count(), 3);
        assert_eq!(page.row_range(), Some((5, 5)));
        assert!(!page.is_out_of_range());

        let stranded = PageEnvelope {
            items: Vec::new(),
            page_index: 3,
            page_size: 2,
            total_count: 5,
        };
        assert!(stranded.is_out_of_range());
        assert_eq!(stranded.row_range(), None);
        assert!(!PageEnvelope::empty(0, 10).is_out_of_range());
    }

    #[test]
    fn absurd_page_number_has_no_row_range() {
        let query = QueryState::new(20);
        let page = PageEnvelope::from_response(
            response(Some(vec![json!({"id": 1})]), Some(u64::MAX / 2), Some(20), Some(1)),
            &query,
        );
        assert_eq!(page.row_range(), None);
        assert!(page.is_out_of_range());
    }
}
