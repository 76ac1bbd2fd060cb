//! Account entity

use serde::{Deserialize, Serialize};

use super::CrmEntity;

/// A company record in the `accounts` entity set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "accountid", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "accountnumber", skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,

    #[serde(rename = "emailaddress1", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(rename = "telephone1", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(rename = "websiteurl", skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// City of the primary address composite.
    #[serde(rename = "address1_city", skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(rename = "numberofemployees", skip_serializing_if = "Option::is_none")]
    pub number_of_employees: Option<i32>,
}

impl CrmEntity for Account {
    const COLLECTION: &'static str = "accounts";
    const ID_FIELD: &'static str = "accountid";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let account = Account {
            name: Some("Contoso".to_string()),
            website: Some("https://contoso.com".to_string()),
            city: Some("Oslo".to_string()),
            number_of_employees: Some(250),
            ..Default::default()
        };

        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["name"], "Contoso");
        assert_eq!(json["address1_city"], "Oslo");
        assert_eq!(json["numberofemployees"], 250);

        let back: Account = serde_json::from_value(json).unwrap();
        assert_eq!(back, account);
    }
}
