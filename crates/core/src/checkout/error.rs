//! Checkout error types.

use thiserror::Error;

use crate::types::{CheckoutAction, CheckoutPhase, EmailError};

use super::customer::CustomerField;

/// A single broken checkout rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// There is nothing to pay for.
    EmptyCart,
    /// A mandatory customer field is blank.
    MissingField(CustomerField),
    /// The email is present but does not look like an address.
    InvalidEmail(EmailError),
}

impl Violation {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptyCart => "empty_cart",
            Self::MissingField(_) => "missing_field",
            Self::InvalidEmail(_) => "invalid_email",
        }
    }

    /// The customer field concerned, if any.
    #[must_use]
    pub const fn field(&self) -> Option<CustomerField> {
        match self {
            Self::EmptyCart => None,
            Self::MissingField(field) => Some(*field),
            Self::InvalidEmail(_) => Some(CustomerField::Email),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCart => write!(f, "cart is empty"),
            Self::MissingField(field) => write!(f, "{field} is required"),
            Self::InvalidEmail(err) => write!(f, "{err}"),
        }
    }
}

/// Checkout input was rejected. Carries every violation found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", format_violations(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    #[must_use]
    pub const fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// Names of the missing mandatory fields.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<CustomerField> {
        self.violations
            .iter()
            .filter_map(|v| match v {
                Violation::MissingField(field) => Some(*field),
                _ => None,
            })
            .collect()
    }
}

fn format_violations(violations: &[Violation]) -> String {
    if violations.is_empty() {
        return "invalid checkout".to_string();
    }
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors returned by the checkout state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// The customer or cart failed validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The action is not allowed in the current phase. Nothing was changed.
    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        phase: CheckoutPhase,
        action: CheckoutAction,
    },
}
