//! Directory Record Types
//!
//! Flat records as exported from the upstream tables. Source files are
//! loosely typed (numbers may arrive as strings, blanks stand for missing
//! values), so optional fields are normalized while deserializing.

use serde::{Deserialize, Deserializer, Serialize};

/// An organization (school district, municipality, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agency {
    #[serde(deserialize_with = "trimmed")]
    pub id: String,
    #[serde(deserialize_with = "trimmed")]
    pub name: String,
    #[serde(default, deserialize_with = "trimmed")]
    pub state: String,
    #[serde(default, deserialize_with = "trimmed")]
    pub state_code: String,
    #[serde(rename = "type", default, deserialize_with = "trimmed")]
    pub agency_type: String,
    #[serde(default, deserialize_with = "loose_number", skip_serializing_if = "Option::is_none")]
    pub population: Option<f64>,
    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "loose_number", skip_serializing_if = "Option::is_none")]
    pub total_schools: Option<f64>,
    #[serde(default, deserialize_with = "loose_number", skip_serializing_if = "Option::is_none")]
    pub total_students: Option<f64>,
    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub mailing_address: Option<String>,
    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub grade_span: Option<String>,
    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub csa_cbsa: Option<String>,
    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub physical_address: Option<String>,
    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "loose_number", skip_serializing_if = "Option::is_none")]
    pub student_teacher_ratio: Option<f64>,
    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub supervisory_union: Option<String>,
    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// A person at an agency or firm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(deserialize_with = "trimmed")]
    pub id: String,
    #[serde(default, deserialize_with = "trimmed")]
    pub first_name: String,
    #[serde(default, deserialize_with = "trimmed")]
    pub last_name: String,
    #[serde(default, deserialize_with = "trimmed")]
    pub email: String,
    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub email_type: Option<String>,
    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub contact_form_url: Option<String>,
    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub agency_id: Option<String>,
    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub firm_id: Option<String>,
}

impl Contact {
    /// Key used to order the contacts listing
    pub fn sort_key(&self) -> String {
        format!("{}{}", self.first_name, self.last_name)
    }
}

/// Sort agencies into listing order (by name, ignoring case)
pub fn sort_agencies(agencies: &mut [Agency]) {
    agencies.sort_by_cached_key(|a| (a.name.to_lowercase(), a.id.clone()));
}

/// Sort contacts into listing order (first name, then last name, ignoring case)
pub fn sort_contacts(contacts: &mut [Contact]) {
    contacts.sort_by_cached_key(|c| (c.sort_key().to_lowercase(), c.id.clone()));
}

/// Scalar as it appears in source files
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Text(String),
    Number(f64),
    Bool(bool),
}

fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Loose>::deserialize(deserializer)?;
    Ok(match value {
        Some(Loose::Text(s)) => s.trim().to_string(),
        Some(Loose::Number(n)) => n.to_string(),
        Some(Loose::Bool(b)) => b.to_string(),
        None => String::new(),
    })
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = trimmed(deserializer)?;
    Ok(Some(value).filter(|s| !s.is_empty()))
}

fn loose_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Loose>::deserialize(deserializer)?;
    Ok(match value {
        Some(Loose::Number(n)) if n.is_finite() => Some(n),
        Some(Loose::Text(s)) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_contact_normalization() {
        let contact: Contact = serde_json::from_value(json!({
            "id": " c-1 ",
            "first_name": "Ada ",
            "last_name": "Lovelace",
            "email": "ada@example.org",
            "phone": "   ",
            "title": " Superintendent ",
            "agency_id": ""
        }))
        .unwrap();

        assert_eq!(contact.id, "c-1");
        assert_eq!(contact.first_name, "Ada");
        assert_eq!(contact.phone, None);
        assert_eq!(contact.title.as_deref(), Some("Superintendent"));
        assert_eq!(contact.agency_id, None);
        assert_eq!(contact.department, None);
    }

    #[test]
    fn test_agency_numbers_accept_strings() {
        let agency: Agency = serde_json::from_value(json!({
            "id": "a-1",
            "name": "Springfield USD",
            "state": "Illinois",
            "state_code": "IL",
            "type": "school_district",
            "population": "12000",
            "total_schools": 14,
            "total_students": "n/a",
            "student_teacher_ratio": "",
            "website": null
        }))
        .unwrap();

        assert_eq!(agency.population, Some(12000.0));
        assert_eq!(agency.total_schools, Some(14.0));
        assert_eq!(agency.total_students, None);
        assert_eq!(agency.student_teacher_ratio, None);
        assert_eq!(agency.website, None);
        assert_eq!(agency.agency_type, "school_district");
    }

    #[test]
    fn test_absent_optionals_are_not_serialized() {
        let contact: Contact = serde_json::from_value(json!({
            "id": "c-2",
            "first_name": "Grace",
            "last_name": "Hopper",
            "email": "grace@example.org"
        }))
        .unwrap();

        let value = serde_json::to_value(&contact).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 4);
        assert!(!object.contains_key("phone"));
    }

    #[test]
    fn test_sorting() {
        let mut contacts: Vec<Contact> = ["Zed Alpha", "Amy Zulu", "Amy Beta"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let (first, last) = name.split_once(' ').unwrap();
                serde_json::from_value(json!({
                    "id": i.to_string(),
                    "first_name": first,
                    "last_name": last,
                    "email": "x@example.org"
                }))
                .unwrap()
            })
            .collect();

        sort_contacts(&mut contacts);
        let names: Vec<String> = contacts.iter().map(Contact::sort_key).collect();
        assert_eq!(names, vec!["AmyBeta", "AmyZulu", "ZedAlpha"]);
    }

    fn contact(id: &str, first: &str, last: &str) -> Contact {
        serde_json::from_value(json!({
            "id": id,
            "first_name": first,
            "last_name": last,
            "email": "x@example.org"
        }))
        .unwrap()
    }

    fn agency(id: &str, name: &str) -> Agency {
        serde_json::from_value(json!({ "id": id, "name": name })).unwrap()
    }

    #[test]
    fn test_sorting_ignores_case() {
        let mut contacts = vec![
            contact("1", "Zoe", "Adams"),
            contact("2", "abe", "young"),
            contact("3", "ABE", "Young"),
        ];
        sort_contacts(&mut contacts);
        let ids: Vec<&str> = contacts.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3", "1"]);

        let mut agencies = vec![agency("a", "Zeta County"), agency("b", "alpha city")];
        sort_agencies(&mut agencies);
        assert_eq!(agencies[0].name, "alpha city");
        assert_eq!(agencies[1].name, "Zeta County");
    }
}
