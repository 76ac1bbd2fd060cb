//! Typed CRM entities
//!
//! Application-facing record types for the common CRM tables. Each struct
//! owns the mapping between its field names and the D365 schema names
//! through serde attributes, so the same type serves create payloads,
//! partial updates and query results. Every field is optional; absent
//! fields stay out of serialized payloads.

mod account;
mod contact;
mod lead;
mod opportunity;

pub use account::Account;
pub use contact::Contact;
pub use lead::Lead;
pub use opportunity::Opportunity;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A record type bound to one D365 entity set.
pub trait CrmEntity: Serialize + DeserializeOwned {
    /// Entity set name in the Web API, e.g. `contacts`.
    const COLLECTION: &'static str;

    /// Primary key attribute, e.g. `contactid`.
    const ID_FIELD: &'static str;
}
