//! D365 CRM proxy library
//!
//! Access-token cache and OData request proxy for the Microsoft Dynamics
//! 365 Web API. Acquires app-only tokens via the OAuth2 client credentials
//! flow, builds typed OData queries and forwards CRUD requests to the
//! organization's Web API endpoint.

pub mod auth;
pub mod config;
pub mod entities;
pub mod odata;

pub use auth::{AuthError, StaticToken, TokenCache, TokenSource};
pub use config::{Config, ConfigError};
pub use entities::{Account, Contact, CrmEntity, Lead, Opportunity};
pub use odata::{CrmClient, Filter, FilterValue, ODataPage, OrderBy, ProxyError, QueryOptions};
