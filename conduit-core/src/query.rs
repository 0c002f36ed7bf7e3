//! Query parameters and the generic list routine
//!
//! List endpoints accept `limit`, `page` (1-based), `sortBy`
//! (`createTime` or `name`), `ascending`, `labelSelector`, and arbitrary
//! field filters. Filters other than `name` are interpreted by the caller
//! before [`default_list`] runs (e.g. the pipeline `type` filter).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::domain::meta::{LabelSelector, Resource};

pub const PARAM_LIMIT: &str = "limit";
pub const PARAM_PAGE: &str = "page";
pub const PARAM_SORT_BY: &str = "sortBy";
pub const PARAM_ASCENDING: &str = "ascending";
pub const PARAM_LABEL_SELECTOR: &str = "labelSelector";

pub const FIELD_NAME: &str = "name";
pub const FIELD_TYPE: &str = "type";
pub const FIELD_CREATE_TIME: &str = "createTime";

/// A page of results plus the total before windowing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub total_items: usize,
}

impl<T> ListResult<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_items: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: usize,
    /// 1-based page number
    pub page: usize,
}

impl Pagination {
    /// Start and end offsets of this page within `total` items
    pub fn window(&self, total: usize) -> (usize, usize) {
        let start = self.limit.saturating_mul(self.page.saturating_sub(1)).min(total);
        let end = start.saturating_add(self.limit).min(total);
        (start, end)
    }
}

/// Parsed list query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// `None` returns every item
    pub pagination: Option<Pagination>,
    pub sort_by: String,
    pub ascending: bool,
    pub label_selector: LabelSelector,
    pub filters: BTreeMap<String, String>,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            pagination: None,
            sort_by: FIELD_CREATE_TIME.to_string(),
            ascending: false,
            label_selector: LabelSelector::everything(),
            filters: BTreeMap::new(),
        }
    }
}

impl Query {
    /// Builds a query from URL query pairs
    ///
    /// Unparseable numbers fall back to defaults; an invalid label selector
    /// is an error.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = Query::default();
        let mut limit = None;
        let mut page = 1;

        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                PARAM_LIMIT => limit = value.parse::<usize>().ok().filter(|l| *l > 0),
                PARAM_PAGE => page = value.parse::<usize>().ok().filter(|p| *p > 0).unwrap_or(1),
                PARAM_SORT_BY if !value.is_empty() => query.sort_by = value.to_string(),
                PARAM_ASCENDING => query.ascending = value.eq_ignore_ascii_case("true"),
                PARAM_LABEL_SELECTOR => query.label_selector = value.parse()?,
                _ if !value.is_empty() => {
                    query.filters.insert(key.to_string(), value.to_string());
                }
                _ => {}
            }
        }

        query.pagination = limit.map(|limit| Pagination { limit, page });
        Ok(query)
    }

    pub fn filter(&self, field: &str) -> Option<&str> {
        self.filters.get(field).map(String::as_str)
    }
}

/// Filters, sorts and windows `items` according to `query`
pub fn default_list<T: Resource>(items: Vec<T>, query: &Query) -> ListResult<T> {
    let mut filtered: Vec<T> = items
        .into_iter()
        .filter(|item| query.label_selector.matches(&item.meta().labels))
        .filter(|item| match query.filter(FIELD_NAME) {
            Some(name) => item.meta().name.contains(name),
            None => true,
        })
        .collect();

    filtered.sort_by(|a, b| {
        let ordering = compare(a, b, &query.sort_by);
        if query.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });

    let total_items = filtered.len();
    let items = match query.pagination {
        Some(pagination) => {
            let (start, end) = pagination.window(total_items);
            filtered.drain(start..end).collect()
        }
        None => filtered,
    };

    ListResult { items, total_items }
}

fn compare<T: Resource>(a: &T, b: &T, sort_by: &str) -> Ordering {
    let by_name = a.meta().name.cmp(&b.meta().name);
    match sort_by {
        FIELD_NAME => by_name,
        // createTime and anything unknown: creation time, then name
        _ => a
            .meta()
            .created_at
            .cmp(&b.meta().created_at)
            .then(by_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pipeline::Pipeline;
    use chrono::{Duration, Utc};

    fn pipelines(names: &[&str]) -> Vec<Pipeline> {
        let base = Utc::now();
        names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let mut p = Pipeline::new("ns", *name);
                p.metadata.created_at = Some(base + Duration::seconds(i as i64));
                p
            })
            .collect()
    }

    fn names(result: &ListResult<Pipeline>) -> Vec<&str> {
        result.items.iter().map(|p| p.metadata.name.as_str()).collect()
    }

    #[test]
    fn test_from_pairs() {
        let query = Query::from_pairs([
            ("limit", "10"),
            ("page", "2"),
            ("sortBy", "name"),
            ("ascending", "true"),
            ("labelSelector", "app=web"),
            ("type", "pipeline"),
            ("name", ""),
        ])
        .unwrap();

        assert_eq!(query.pagination, Some(Pagination { limit: 10, page: 2 }));
        assert_eq!(query.sort_by, "name");
        assert!(query.ascending);
        assert_eq!(query.filter("type"), Some("pipeline"));
        assert_eq!(query.filter("name"), None);
        assert!(!query.label_selector.is_empty());
    }

    #[test]
    fn test_from_pairs_defaults() {
        let query = Query::from_pairs([("limit", "x"), ("page", "0")]).unwrap();
        assert_eq!(query, Query::default());
    }

    #[test]
    fn test_default_sort_is_newest_first() {
        let result = default_list(pipelines(&["a", "b", "c"]), &Query::default());
        assert_eq!(names(&result), vec!["c", "b", "a"]);
        assert_eq!(result.total_items, 3);
    }

    #[test]
    fn test_name_filter_and_pagination() {
        let query = Query::from_pairs([
            ("name", "build"),
            ("sortBy", "name"),
            ("ascending", "true"),
            ("limit", "2"),
            ("page", "2"),
        ])
        .unwrap();
        let items = pipelines(&["build-c", "deploy", "build-a", "build-b"]);
        let result = default_list(items, &query);
        assert_eq!(result.total_items, 3);
        assert_eq!(names(&result), vec!["build-c"]);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let query = Query::from_pairs([("limit", "5"), ("page", "9")]).unwrap();
        let result = default_list(pipelines(&["a", "b"]), &query);
        assert!(result.items.is_empty());
        assert_eq!(result.total_items, 2);
    }

    #[test]
    fn test_label_selector() {
        let mut items = pipelines(&["a", "b"]);
        items[1]
            .metadata
            .labels
            .insert("app".to_string(), "web".to_string());
        let query = Query::from_pairs([("labelSelector", "app=web")]).unwrap();
        let result = default_list(items, &query);
        assert_eq!(names(&result), vec!["b"]);
    }
}
