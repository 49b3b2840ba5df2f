//! Company model.

use super::{by_name, default_true, nullable, Entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use sqlx::FromRow;
use std::cmp::Ordering;
use uuid::Uuid;
use validator::Validate;

/// A client company whose staff eat on account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub code: Option<String>,
    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a company.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCompany {
    #[validate(length(min = 1, message = "Company name is required"))]
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Input for updating a company.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCompany {
    #[validate(length(min = 1, message = "Company name cannot be empty"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub code: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub contact_person: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub email: Option<Option<String>>,
    pub is_active: Option<bool>,
}

/// Filter parameters for listing companies.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListCompaniesFilter {
    #[serde(default)]
    pub active_only: bool,
}

impl Entity for Company {
    type Create = CreateCompany;
    type Update = UpdateCompany;
    type Filter = ListCompaniesFilter;

    const COLLECTION: &'static str = "companies";

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_create(input: CreateCompany, id: Uuid, now: DateTime<Utc>) -> Result<Self, AppError> {
        Ok(Self {
            id,
            name: input.name,
            code: input.code,
            address: input.address,
            contact_person: input.contact_person,
            phone: input.phone,
            email: input.email,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_update(&mut self, update: UpdateCompany, now: DateTime<Utc>) -> Result<(), AppError> {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(code) = update.code {
            self.code = code;
        }
        if let Some(address) = update.address {
            self.address = address;
        }
        if let Some(contact_person) = update.contact_person {
            self.contact_person = contact_person;
        }
        if let Some(phone) = update.phone {
            self.phone = phone;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
        self.updated_at = now;
        Ok(())
    }

    fn matches(&self, filter: &ListCompaniesFilter) -> bool {
        !filter.active_only || self.is_active
    }

    fn ordering(a: &Self, b: &Self) -> Ordering {
        by_name(&a.name, a.id, &b.name, b.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_input() -> CreateCompany {
        serde_json::from_str(r#"{"name": "Tech Solutions Pvt Ltd", "code": "TSP"}"#).unwrap()
    }

    #[test]
    fn test_create_defaults_to_active() {
        let input = create_input();
        assert!(input.is_active);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let input: CreateCompany = serde_json::from_str(r#"{"name": ""}"#).unwrap();
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_update_clears_nullable_field() {
        let now = Utc::now();
        let mut company = Company::from_create(create_input(), Uuid::new_v4(), now).unwrap();
        let patch: UpdateCompany = serde_json::from_str(r#"{"code": null}"#).unwrap();

        company.apply_update(patch, now).unwrap();

        assert_eq!(company.code, None);
        assert_eq!(company.name, "Tech Solutions Pvt Ltd");
    }
}
