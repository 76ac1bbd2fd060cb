//! Contact entity

use serde::{Deserialize, Serialize};

use super::CrmEntity;

/// A person record in the `contacts` entity set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(rename = "contactid", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "firstname", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(rename = "lastname", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(rename = "emailaddress1", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(rename = "telephone1", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(rename = "jobtitle", skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,

    #[serde(rename = "companyname", skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl CrmEntity for Contact {
    const COLLECTION: &'static str = "contacts";
    const ID_FIELD: &'static str = "contactid";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_to_crm_attribute_names() {
        let contact = Contact {
            first_name: Some("Jane".to_string()),
            last_name: Some("Doe".to_string()),
            email: Some("jane.doe@contoso.com".to_string()),
            phone: Some("+47 555 0100".to_string()),
            job_title: Some("CTO".to_string()),
            company: Some("Contoso".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_value(&contact).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "firstname": "Jane",
                "lastname": "Doe",
                "emailaddress1": "jane.doe@contoso.com",
                "telephone1": "+47 555 0100",
                "jobtitle": "CTO",
                "companyname": "Contoso",
            })
        );
    }

    #[test]
    fn test_sparse_update_payload_omits_unset_fields() {
        let patch = Contact {
            phone: Some("+47 555 0199".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"telephone1": "+47 555 0199"}));
    }

    #[test]
    fn test_deserializes_from_web_api_response() {
        let json = r#"{
            "@odata.etag": "W/\"12345\"",
            "contactid": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
            "firstname": "Jane",
            "lastname": "Doe",
            "emailaddress1": "jane.doe@contoso.com",
            "telephone1": null
        }"#;

        let contact: Contact = serde_json::from_str(json).unwrap();
        assert_eq!(
            contact.id.as_deref(),
            Some("3fa85f64-5717-4562-b3fc-2c963f66afa6")
        );
        assert_eq!(contact.first_name.as_deref(), Some("Jane"));
        assert_eq!(contact.phone, None);
        // Fields not requested via $select stay None.
        assert_eq!(contact.job_title, None);
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let contact = Contact {
            id: Some("3fa85f64-5717-4562-b3fc-2c963f66afa6".to_string()),
            first_name: Some("Jane".to_string()),
            company: Some("Contoso".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_string(&contact).unwrap();
        let back: Contact = serde_json::from_str(&json).unwrap();
        assert_eq!(back, contact);
    }
}
