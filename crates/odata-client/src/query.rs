//! Query-string construction for OData collection requests.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The system query options of one collection request.
///
/// Empty clauses and unset paging values are never emitted.
///
/// # Example
///
/// ```
/// use odata_client::query::QueryOptions;
///
/// let options = QueryOptions::new().top(10).skip(20);
/// assert_eq!(options.query_string().unwrap(), "%24top=10&%24skip=20");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Compiled `$filter` expression; empty means no filter.
    #[serde(default)]
    pub filter: String,

    /// Compiled `$orderby` expression; empty means server order.
    #[serde(default)]
    pub order_by: String,

    /// Page size (`$top`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<u32>,

    /// Rows to skip (`$skip`). Zero is the default and is omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,

    /// Whether to request `$count=true`.
    #[serde(default)]
    pub count: bool,

    /// Navigation properties to expand.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expand: Vec<String>,
}

impl QueryOptions {
    /// Creates options with every clause unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `$filter` clause.
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Sets the `$orderby` clause.
    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = order_by.into();
        self
    }

    /// Sets `$top`.
    pub fn top(mut self, top: u32) -> Self {
        self.top = Some(top);
        self
    }

    /// Sets `$skip`.
    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Requests the total count of matching rows.
    pub fn with_count(mut self, count: bool) -> Self {
        self.count = count;
        self
    }

    /// Adds a navigation property to `$expand`.
    pub fn expand(mut self, property: impl Into<String>) -> Self {
        self.expand.push(property.into());
        self
    }

    /// Returns the query parameters in emission order.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        let filter = self.filter.trim();
        if !filter.is_empty() {
            pairs.push(("$filter", filter.to_string()));
        }

        let order_by = self.order_by.trim();
        if !order_by.is_empty() {
            pairs.push(("$orderby", order_by.to_string()));
        }

        if let Some(top) = self.top {
            pairs.push(("$top", top.to_string()));
        }

        if let Some(skip) = self.skip.filter(|s| *s > 0) {
            pairs.push(("$skip", skip.to_string()));
        }

        if self.count {
            pairs.push(("$count", "true".to_string()));
        }

        let expand: Vec<&str> = self
            .expand
            .iter()
            .map(|e| e.trim())
            .filter(|e| !e.is_empty())
            .collect();
        if !expand.is_empty() {
            pairs.push(("$expand", expand.join(",")));
        }

        pairs
    }

    /// Returns the form-encoded query string (without the leading `?`).
    pub fn query_string(&self) -> Result<String> {
        serde_urlencoded::to_string(self.to_pairs()).map_err(|e| Error::InvalidUrl(e.to_string()))
    }
}

/// Joins `base` and `entity_set` with exactly one `/` and appends the query.
pub fn build_url(base: &str, entity_set: &str, options: &QueryOptions) -> Result<Url> {
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        entity_set.trim_start_matches('/')
    );
    let mut url = Url::parse(&joined).map_err(|e| Error::InvalidUrl(format!("{joined}: {e}")))?;

    let query = options.query_string()?;
    if query.is_empty() {
        url.set_query(None);
    } else {
        url.set_query(Some(&query));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paging_only() {
        let options = QueryOptions::new().top(10).skip(20);
        let url = build_url("https://api.example.com/odata", "Users", &options).unwrap();
        assert_eq!(url.query(), Some("%24top=10&%24skip=20"));
    }

    #[test]
    fn test_empty_options_have_no_query() {
        let url =
            build_url("https://api.example.com/odata/", "/Users", &QueryOptions::new()).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/odata/Users");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_blank_clauses_are_omitted() {
        let options = QueryOptions::new().filter("  ").order_by("").with_count(false);
        assert!(options.to_pairs().is_empty());
    }

    #[test]
    fn test_zero_skip_is_omitted() {
        let options = QueryOptions::new().top(5).skip(0);
        assert_eq!(options.to_pairs(), vec![("$top", "5".to_string())]);
    }

    #[test]
    fn test_full_parameter_order() {
        let options = QueryOptions::new()
            .filter("Age gt 3")
            .order_by("Name desc")
            .top(10)
            .skip(10)
            .with_count(true)
            .expand("Customer")
            .expand("Lines");
        let names: Vec<&str> = options.to_pairs().iter().map(|(k, _)| *k).collect();
        assert_eq!(
            names,
            vec!["$filter", "$orderby", "$top", "$skip", "$count", "$expand"]
        );
        assert_eq!(options.to_pairs()[5].1, "Customer,Lines");
    }

    #[test]
    fn test_filter_is_encoded() {
        let options = QueryOptions::new().filter("endswith(Email,'yahoo.com')");
        let url = build_url("http://localhost", "Users", &options).unwrap();
        let decoded: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            decoded,
            vec![(
                "$filter".to_string(),
                "endswith(Email,'yahoo.com')".to_string()
            )]
        );
    }

    #[test]
    fn test_invalid_base_is_rejected() {
        let result = build_url("not a url", "Users", &QueryOptions::new());
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }
}
