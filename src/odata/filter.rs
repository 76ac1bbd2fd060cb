//! OData filter expressions
//!
//! Typed construction of `$filter` clauses. Values pass through
//! [`FilterValue`], which quotes and escapes string literals, so callers
//! never splice raw user input into a filter. [`Filter::Raw`] remains the
//! documented escape hatch and skips escaping entirely.

/// A `$filter` expression tree
#[derive(Debug, Clone)]
pub enum Filter {
    // Comparison operators
    Eq(String, FilterValue),
    Ne(String, FilterValue),
    Gt(String, FilterValue),
    Ge(String, FilterValue),
    Lt(String, FilterValue),
    Le(String, FilterValue),

    // String functions
    Contains(String, String),
    StartsWith(String, String),
    EndsWith(String, String),

    // Logical operators
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),

    /// Pre-built OData filter text, rendered verbatim. The caller is
    /// responsible for quoting; never build one from untrusted input.
    Raw(String),
}

/// A literal on the right-hand side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

/// Quote a string literal for OData, doubling embedded single quotes.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::Eq(field.into(), value.into())
    }

    pub fn ne(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::Ne(field.into(), value.into())
    }

    pub fn gt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::Gt(field.into(), value.into())
    }

    pub fn ge(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::Ge(field.into(), value.into())
    }

    pub fn lt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::Lt(field.into(), value.into())
    }

    pub fn le(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::Le(field.into(), value.into())
    }

    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Contains(field.into(), value.into())
    }

    pub fn starts_with(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::StartsWith(field.into(), value.into())
    }

    pub fn ends_with(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::EndsWith(field.into(), value.into())
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Self::And(filters)
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Self::Or(filters)
    }

    pub fn not(filter: Filter) -> Self {
        Self::Not(Box::new(filter))
    }

    pub fn raw(filter: impl Into<String>) -> Self {
        Self::Raw(filter.into())
    }

    /// Render the expression as OData filter text.
    pub fn to_odata_string(&self) -> String {
        match self {
            Filter::Eq(field, value) => format!("{} eq {}", field, value.to_odata_string()),
            Filter::Ne(field, value) => format!("{} ne {}", field, value.to_odata_string()),
            Filter::Gt(field, value) => format!("{} gt {}", field, value.to_odata_string()),
            Filter::Ge(field, value) => format!("{} ge {}", field, value.to_odata_string()),
            Filter::Lt(field, value) => format!("{} lt {}", field, value.to_odata_string()),
            Filter::Le(field, value) => format!("{} le {}", field, value.to_odata_string()),

            Filter::Contains(field, value) => format!("contains({}, {})", field, quote(value)),
            Filter::StartsWith(field, value) => format!("startswith({}, {})", field, quote(value)),
            Filter::EndsWith(field, value) => format!("endswith({}, {})", field, quote(value)),

            Filter::And(filters) => {
                let parts: Vec<String> = filters.iter().map(|f| f.to_odata_string()).collect();
                format!("({})", parts.join(" and "))
            }
            Filter::Or(filters) => {
                let parts: Vec<String> = filters.iter().map(|f| f.to_odata_string()).collect();
                format!("({})", parts.join(" or "))
            }
            Filter::Not(filter) => format!("not ({})", filter.to_odata_string()),

            Filter::Raw(raw) => raw.clone(),
        }
    }
}

impl FilterValue {
    pub fn to_odata_string(&self) -> String {
        match self {
            FilterValue::String(s) => quote(s),
            FilterValue::Int(i) => i.to_string(),
            FilterValue::Float(f) => f.to_string(),
            FilterValue::Bool(b) => b.to_string(),
            FilterValue::Null => "null".to_string(),
        }
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::String(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::String(value.to_string())
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Int(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Int(value as i64)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Float(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_filters() {
        assert_eq!(
            Filter::eq("statecode", 0).to_odata_string(),
            "statecode eq 0"
        );
        assert_eq!(
            Filter::ne("firstname", "John").to_odata_string(),
            "firstname ne 'John'"
        );
        assert_eq!(
            Filter::ge("numberofemployees", 50).to_odata_string(),
            "numberofemployees ge 50"
        );
        assert_eq!(
            Filter::lt("estimatedvalue", 1500.5).to_odata_string(),
            "estimatedvalue lt 1500.5"
        );
    }

    #[test]
    fn test_string_functions() {
        assert_eq!(
            Filter::contains("emailaddress1", "@contoso.com").to_odata_string(),
            "contains(emailaddress1, '@contoso.com')"
        );
        assert_eq!(
            Filter::starts_with("lastname", "Sm").to_odata_string(),
            "startswith(lastname, 'Sm')"
        );
        assert_eq!(
            Filter::ends_with("websiteurl", ".org").to_odata_string(),
            "endswith(websiteurl, '.org')"
        );
    }

    #[test]
    fn test_single_quotes_are_doubled() {
        // A name like O'Connor must not terminate the string literal.
        assert_eq!(
            Filter::eq("lastname", "O'Connor").to_odata_string(),
            "lastname eq 'O''Connor'"
        );
        assert_eq!(
            Filter::contains("lastname", "O'Con").to_odata_string(),
            "contains(lastname, 'O''Con')"
        );
        // An attempted breakout stays inside the literal.
        assert_eq!(
            Filter::eq("firstname", "x' or 1 eq 1").to_odata_string(),
            "firstname eq 'x'' or 1 eq 1'"
        );
    }

    #[test]
    fn test_logical_operators() {
        let filter = Filter::and(vec![
            Filter::eq("statecode", 0),
            Filter::contains("firstname", "John"),
        ]);
        assert_eq!(
            filter.to_odata_string(),
            "(statecode eq 0 and contains(firstname, 'John'))"
        );

        let filter = Filter::or(vec![
            Filter::eq("city", "Oslo"),
            Filter::eq("city", "Bergen"),
        ]);
        assert_eq!(
            filter.to_odata_string(),
            "(city eq 'Oslo' or city eq 'Bergen')"
        );

        let filter = Filter::not(Filter::eq("statecode", 1));
        assert_eq!(filter.to_odata_string(), "not (statecode eq 1)");
    }

    #[test]
    fn test_nested_logic() {
        let filter = Filter::and(vec![
            Filter::eq("statecode", 0),
            Filter::or(vec![
                Filter::starts_with("lastname", "A"),
                Filter::starts_with("lastname", "B"),
            ]),
        ]);
        assert_eq!(
            filter.to_odata_string(),
            "(statecode eq 0 and (startswith(lastname, 'A') or startswith(lastname, 'B')))"
        );
    }

    #[test]
    fn test_null_and_bool_values() {
        assert_eq!(
            Filter::ne("emailaddress1", FilterValue::Null).to_odata_string(),
            "emailaddress1 ne null"
        );
        assert_eq!(
            Filter::eq("donotemail", true).to_odata_string(),
            "donotemail eq true"
        );
    }

    #[test]
    fn test_raw_passes_through_untouched() {
        let filter = Filter::raw("Microsoft.Dynamics.CRM.LastXDays(PropertyName='createdon',PropertyValue=7)");
        assert_eq!(
            filter.to_odata_string(),
            "Microsoft.Dynamics.CRM.LastXDays(PropertyName='createdon',PropertyValue=7)"
        );
    }
}
