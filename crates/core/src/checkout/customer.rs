//! Customer shipping and contact details.

use serde::{Deserialize, Serialize};

use crate::types::Email;

use super::error::Violation;

/// Shipping and contact details entered at checkout.
///
/// Every field deserializes with a default so that an incomplete form reaches
/// validation, which then names each missing field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerInfo {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address1: String,
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

/// Mandatory checkout fields, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerField {
    FullName,
    Email,
    Address1,
    City,
    State,
    ZipCode,
    Country,
}

impl CustomerField {
    /// All mandatory fields, in form order.
    pub const REQUIRED: [Self; 7] = [
        Self::FullName,
        Self::Email,
        Self::Address1,
        Self::City,
        Self::State,
        Self::ZipCode,
        Self::Country,
    ];

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FullName => "full name",
            Self::Email => "email",
            Self::Address1 => "address line 1",
            Self::City => "city",
            Self::State => "state",
            Self::ZipCode => "zip code",
            Self::Country => "country",
        }
    }
}

impl std::fmt::Display for CustomerField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl CustomerInfo {
    /// Value of a mandatory field.
    #[must_use]
    pub fn field(&self, field: CustomerField) -> &str {
        match field {
            CustomerField::FullName => &self.full_name,
            CustomerField::Email => &self.email,
            CustomerField::Address1 => &self.address1,
            CustomerField::City => &self.city,
            CustomerField::State => &self.state,
            CustomerField::ZipCode => &self.zip_code,
            CustomerField::Country => &self.country,
        }
    }

    /// Mandatory fields that are blank after trimming.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<CustomerField> {
        CustomerField::REQUIRED
            .into_iter()
            .filter(|&field| self.field(field).trim().is_empty())
            .collect()
    }

    /// Every rule these details break.
    ///
    /// Missing fields come first, in form order. A present email that does
    /// not look like an address is reported once as well.
    #[must_use]
    pub fn violations(&self) -> Vec<Violation> {
        let mut violations: Vec<Violation> = self
            .missing_fields()
            .into_iter()
            .map(Violation::MissingField)
            .collect();

        if !self.email.trim().is_empty() {
            if let Err(err) = Email::parse(&self.email) {
                violations.push(Violation::InvalidEmail(err));
            }
        }

        violations
    }
}
