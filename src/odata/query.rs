//! OData query building
//!
//! Typed construction of `$select`/`$filter`/`$orderby`/`$top`/`$skip`
//! query strings and resource paths for the D365 Web API.

use super::filter::Filter;

/// A single `$orderby` clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderBy {
    Asc(String),
    Desc(String),
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self::Asc(field.into())
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::Desc(field.into())
    }

    fn to_odata_string(&self) -> String {
        match self {
            OrderBy::Asc(field) => format!("{} asc", field),
            OrderBy::Desc(field) => format!("{} desc", field),
        }
    }
}

/// Query options for OData requests
///
/// Each part is rendered only when present; a default `QueryOptions`
/// produces an empty query string.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub select: Option<Vec<String>>,
    pub filter: Option<Filter>,
    pub orderby: Vec<OrderBy>,
    pub top: Option<usize>,
    pub skip: Option<usize>,
    pub expand: Option<Vec<String>>,
    pub count: bool,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the returned attributes.
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Filter the result set.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Append an ordering clause. Call repeatedly for secondary sorts.
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.orderby.push(order);
        self
    }

    /// Limit the number of returned records.
    pub fn top(mut self, top: usize) -> Self {
        self.top = Some(top);
        self
    }

    /// Skip past the first `skip` records.
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Expand navigation properties inline.
    pub fn expand<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expand = Some(relations.into_iter().map(Into::into).collect());
        self
    }

    /// Ask for `@odata.count` in the response.
    pub fn with_count(mut self) -> Self {
        self.count = true;
        self
    }

    /// Build the query string from the present options.
    ///
    /// Returns an empty string when nothing is set, otherwise a leading-`?`
    /// string ready to append to a resource path.
    pub fn to_query_string(&self) -> String {
        let mut params = Vec::new();

        if let Some(ref select) = self.select {
            params.push(format!("$select={}", select.join(",")));
        }

        if let Some(ref filter) = self.filter {
            params.push(format!("$filter={}", filter.to_odata_string()));
        }

        if !self.orderby.is_empty() {
            let clauses: Vec<String> = self.orderby.iter().map(|o| o.to_odata_string()).collect();
            params.push(format!("$orderby={}", clauses.join(", ")));
        }

        if let Some(top) = self.top {
            params.push(format!("$top={}", top));
        }

        if let Some(skip) = self.skip {
            params.push(format!("$skip={}", skip));
        }

        if let Some(ref expand) = self.expand {
            params.push(format!("$expand={}", expand.join(",")));
        }

        if self.count {
            params.push("$count=true".to_string());
        }

        if params.is_empty() {
            String::new()
        } else {
            format!("?{}", params.join("&"))
        }
    }
}

/// Build the relative resource URL for a collection or a single record.
///
/// D365 record keys are GUIDs and appear unquoted in the key segment,
/// e.g. `contacts(3fa85f64-5717-4562-b3fc-2c963f66afa6)`.
pub fn resource_path(collection: &str, id: Option<&str>, options: &QueryOptions) -> String {
    let base = match id {
        Some(id) => format!("{}({})", collection, id),
        None => collection.to_string(),
    };
    format!("{}{}", base, options.to_query_string())
}
