//! Lead entity

use serde::{Deserialize, Serialize};

use super::CrmEntity;

/// A sales lead in the `leads` entity set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    #[serde(rename = "leadid", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "subject", skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

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

impl CrmEntity for Lead {
    const COLLECTION: &'static str = "leads";
    const ID_FIELD: &'static str = "leadid";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_payload_is_exact() {
        let lead = Lead {
            first_name: Some("Ola".to_string()),
            last_name: Some("Nordmann".to_string()),
            email: Some("ola@example.no".to_string()),
            company: Some("Nordmann AS".to_string()),
            ..Default::default()
        };

        // The payload carries exactly the set fields under their CRM names.
        assert_eq!(
            serde_json::to_value(&lead).unwrap(),
            serde_json::json!({
                "firstname": "Ola",
                "lastname": "Nordmann",
                "emailaddress1": "ola@example.no",
                "companyname": "Nordmann AS",
            })
        );
    }

    #[test]
    fn test_deserializes_from_web_api_response() {
        let json = r#"{
            "leadid": "11111111-2222-3333-4444-555555555555",
            "subject": "Conference follow-up",
            "firstname": "Ola",
            "companyname": "Nordmann AS"
        }"#;

        let lead: Lead = serde_json::from_str(json).unwrap();
        assert_eq!(lead.subject.as_deref(), Some("Conference follow-up"));
        assert_eq!(lead.company.as_deref(), Some("Nordmann AS"));
        assert_eq!(lead.last_name, None);
    }
}
