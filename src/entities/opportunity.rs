//! Opportunity entity

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::CrmEntity;

/// A sales opportunity in the `opportunities` entity set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    #[serde(rename = "opportunityid", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Estimated revenue in the record's currency.
    #[serde(rename = "estimatedvalue", skip_serializing_if = "Option::is_none")]
    pub estimated_value: Option<f64>,

    #[serde(rename = "estimatedclosedate", skip_serializing_if = "Option::is_none")]
    pub estimated_close_date: Option<NaiveDate>,

    /// Probability of closing, in percent.
    #[serde(rename = "closeprobability", skip_serializing_if = "Option::is_none")]
    pub close_probability: Option<i32>,
}

impl CrmEntity for Opportunity {
    const COLLECTION: &'static str = "opportunities";
    const ID_FIELD: &'static str = "opportunityid";
}
