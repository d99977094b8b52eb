//! List query parameters and the paginated response body.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query string accepted by every list endpoint.
///
/// `page` and `pageSize` stay raw strings so that garbage input falls back to defaults
/// instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub page_size: Option<String>,
    /// Case-insensitive name substring
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub team_id: Option<Uuid>,
}

/// Repository-level filter derived from a [`ListQuery`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub name_contains: Option<String>,
    pub team_id: Option<Uuid>,
}

impl ListQuery {
    pub fn filter(&self) -> ListFilter {
        ListFilter {
            name_contains: self
                .q
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string),
            team_id: self.team_id,
        }
    }
}

/// One page of a list endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}

impl<T: Serialize> Page<T> {
    pub fn map<U: Serialize>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total: self.total,
        }
    }
}
