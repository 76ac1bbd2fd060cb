//! OData module
//!
//! HTTP client, query building and filter expressions for the D365 Web API

pub mod client;
pub mod filter;
pub mod query;

pub use client::{CrmClient, ODataPage, ProxyError};
pub use filter::{Filter, FilterValue};
pub use query::{OrderBy, QueryOptions};

/// Web API version the service root is pinned to.
pub const API_VERSION: &str = "v9.2";
