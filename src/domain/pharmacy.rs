//! Pharmacy registrations.
//!
//! A user may hold at most one registration that is not `rejected`; the stores enforce it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PharmacyStatus {
    Pending,
    Approved,
    Rejected,
}

impl PharmacyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PharmacyStatus::Pending => "pending",
            PharmacyStatus::Approved => "approved",
            PharmacyStatus::Rejected => "rejected",
        }
    }

    /// Active registrations count towards the one-per-user limit.
    pub fn is_active(&self) -> bool {
        !matches!(self, PharmacyStatus::Rejected)
    }
}

impl fmt::Display for PharmacyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PharmacyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(PharmacyStatus::Pending),
            "approved" => Ok(PharmacyStatus::Approved),
            "rejected" => Ok(PharmacyStatus::Rejected),
            other => Err(format!("unknown pharmacy status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Pharmacy {
    pub id: Uuid,
    pub owner_user_id: String,
    pub name: String,
    pub license_number: String,
    pub address: String,
    pub city: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub status: PharmacyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration form as submitted.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct NewPharmacy {
    pub owner_user_id: String,
    pub name: String,
    pub license_number: String,
    pub address: String,
    pub city: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct PharmacyUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub status: Option<PharmacyStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PharmacyFilter {
    #[serde(default)]
    pub owner_user_id: Option<String>,
    #[serde(default)]
    pub status: Option<PharmacyStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl NewPharmacy {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        required(&mut errors, "owner_user_id", &self.owner_user_id);
        required(&mut errors, "name", &self.name);
        required(&mut errors, "license_number", &self.license_number);
        required(&mut errors, "address", &self.address);
        required(&mut errors, "city", &self.city);
        if let Some(phone) = self.phone.as_deref().filter(|p| !p.trim().is_empty()) {
            check_phone(&mut errors, phone);
        }
        if let Some(email) = self.email.as_deref().filter(|e| !e.trim().is_empty()) {
            check_email(&mut errors, email);
        }
        errors
    }

    pub fn into_pharmacy(self, now: DateTime<Utc>) -> Pharmacy {
        Pharmacy {
            id: Uuid::new_v4(),
            owner_user_id: self.owner_user_id.trim().to_string(),
            name: self.name.trim().to_string(),
            license_number: self.license_number.trim().to_string(),
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            phone: blank_to_none(self.phone),
            email: blank_to_none(self.email),
            status: PharmacyStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

impl PharmacyUpdate {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        for (field, value) in [
            ("name", &self.name),
            ("license_number", &self.license_number),
            ("address", &self.address),
            ("city", &self.city),
        ] {
            if let Some(v) = value {
                required(&mut errors, field, v);
            }
        }
        if let Some(phone) = self.phone.as_deref().filter(|p| !p.trim().is_empty()) {
            check_phone(&mut errors, phone);
        }
        if let Some(email) = self.email.as_deref().filter(|e| !e.trim().is_empty()) {
            check_email(&mut errors, email);
        }
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.license_number.is_none()
            && self.address.is_none()
            && self.city.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.status.is_none()
    }

    /// Applies the update. An empty `phone`/`email` clears the field.
    pub fn apply(self, pharmacy: &mut Pharmacy, now: DateTime<Utc>) {
        if let Some(v) = self.name {
            pharmacy.name = v.trim().to_string();
        }
        if let Some(v) = self.license_number {
            pharmacy.license_number = v.trim().to_string();
        }
        if let Some(v) = self.address {
            pharmacy.address = v.trim().to_string();
        }
        if let Some(v) = self.city {
            pharmacy.city = v.trim().to_string();
        }
        if self.phone.is_some() {
            pharmacy.phone = blank_to_none(self.phone);
        }
        if self.email.is_some() {
            pharmacy.email = blank_to_none(self.email);
        }
        if let Some(status) = self.status {
            pharmacy.status = status;
        }
        pharmacy.updated_at = now;
    }
}

impl PharmacyFilter {
    pub fn matches(&self, pharmacy: &Pharmacy) -> bool {
        self.owner_user_id
            .as_deref()
            .map_or(true, |owner| owner == pharmacy.owner_user_id)
            && self.status.map_or(true, |status| status == pharmacy.status)
    }
}

fn required(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "must not be blank"));
    }
}

fn check_email(errors: &mut Vec<FieldError>, email: &str) {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };
    if !valid {
        errors.push(FieldError::new("email", "must be a valid email address"));
    }
}

fn check_phone(errors: &mut Vec<FieldError>, phone: &str) {
    let phone = phone.trim();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' '));
    if !allowed || !(7..=20).contains(&phone.len()) {
        errors.push(FieldError::new(
            "phone",
            "must be 7-20 characters of digits, spaces, '+', '-', '(' or ')'",
        ));
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> NewPharmacy {
        NewPharmacy {
            owner_user_id: "user-1".into(),
            name: "Farmacia Central".into(),
            license_number: "LIC-0042".into(),
            address: "Av. Principal 12".into(),
            city: "Caracas".into(),
            phone: Some("+58 (212) 555-0101".into()),
            email: Some("central@example.com".into()),
        }
    }

    #[test]
    fn valid_form_has_no_errors() {
        assert!(form().validate().is_empty());
    }

    #[test]
    fn reports_every_bad_field() {
        let mut f = form();
        f.name = "  ".into();
        f.email = Some("nope@".into());
        f.phone = Some("call me".into());
        let fields: Vec<String> = f.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "phone", "email"]);
    }

    #[test]
    fn update_clears_optional_fields_with_blank() {
        let mut p = form().into_pharmacy(Utc::now());
        let update = PharmacyUpdate {
            email: Some(String::new()),
            status: Some(PharmacyStatus::Approved),
            ..Default::default()
        };
        assert!(update.validate().is_empty());
        update.apply(&mut p, Utc::now());
        assert_eq!(p.email, None);
        assert_eq!(p.status, PharmacyStatus::Approved);
        assert_eq!(p.phone.as_deref(), Some("+58 (212) 555-0101"));
    }

    #[test]
    fn phone_length_is_bounded_inclusively() {
        let phone_errors = |phone: &str| {
            let mut f = form();
            f.phone = Some(phone.to_string());
            f.validate().into_iter().filter(|e| e.field == "phone").count()
        };
        assert_eq!(phone_errors("555-010"), 0);
        assert_eq!(phone_errors("555010"), 1);
        assert_eq!(phone_errors("+58 (212) 555-010199"), 0);
        assert_eq!(phone_errors("+58 (212) 555-0101999"), 1);
        // Surrounding whitespace does not count towards the length.
        assert_eq!(phone_errors("  555010  "), 1);
    }
}
