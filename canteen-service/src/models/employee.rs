//! Employee model.

use super::{by_name, non_negative, nullable, Entity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use sqlx::FromRow;
use std::cmp::Ordering;
use uuid::Uuid;
use validator::Validate;

/// Employee status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
}

impl EmployeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeStatus::Active => "active",
            EmployeeStatus::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for EmployeeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An employee of a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub employee_code: Option<String>,
    pub phone: Option<String>,
    pub image_url: Option<String>,
    pub default_meal_price: Decimal,
    pub status: EmployeeStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an employee.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateEmployee {
    pub company_id: Uuid,
    #[validate(length(min = 1, message = "Employee name is required"))]
    pub name: String,
    #[serde(default)]
    pub employee_code: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "non_negative"))]
    pub default_meal_price: Decimal,
    #[serde(default)]
    pub status: EmployeeStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Input for updating an employee.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateEmployee {
    pub company_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Employee name cannot be empty"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub employee_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub image_url: Option<Option<String>>,
    #[validate(custom(function = "non_negative"))]
    pub default_meal_price: Option<Decimal>,
    pub status: Option<EmployeeStatus>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

/// Filter parameters for listing employees.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListEmployeesFilter {
    pub company_id: Option<Uuid>,
    pub status: Option<EmployeeStatus>,
}

impl Employee {
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }
}

impl Entity for Employee {
    type Create = CreateEmployee;
    type Update = UpdateEmployee;
    type Filter = ListEmployeesFilter;

    const COLLECTION: &'static str = "employees";

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_create(input: CreateEmployee, id: Uuid, now: DateTime<Utc>) -> Result<Self, AppError> {
        Ok(Self {
            id,
            company_id: input.company_id,
            name: input.name,
            employee_code: input.employee_code,
            phone: input.phone,
            image_url: input.image_url,
            default_meal_price: input.default_meal_price,
            status: input.status,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_update(&mut self, update: UpdateEmployee, now: DateTime<Utc>) -> Result<(), AppError> {
        if let Some(company_id) = update.company_id {
            self.company_id = company_id;
        }
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(employee_code) = update.employee_code {
            self.employee_code = employee_code;
        }
        if let Some(phone) = update.phone {
            self.phone = phone;
        }
        if let Some(image_url) = update.image_url {
            self.image_url = image_url;
        }
        if let Some(price) = update.default_meal_price {
            self.default_meal_price = price;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(notes) = update.notes {
            self.notes = notes;
        }
        self.updated_at = now;
        Ok(())
    }

    fn matches(&self, filter: &ListEmployeesFilter) -> bool {
        filter.company_id.map_or(true, |id| self.company_id == id)
            && filter.status.map_or(true, |s| self.status == s)
    }

    fn ordering(a: &Self, b: &Self) -> Ordering {
        by_name(&a.name, a.id, &b.name, b.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_defaults_to_active() {
        let input: CreateEmployee = serde_json::from_value(serde_json::json!({
            "company_id": Uuid::new_v4(),
            "name": "Rahul Sharma",
            "default_meal_price": "150"
        }))
        .unwrap();

        assert_eq!(input.status, EmployeeStatus::Active);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_negative_meal_price_is_rejected() {
        let input: CreateEmployee = serde_json::from_value(serde_json::json!({
            "company_id": Uuid::new_v4(),
            "name": "Rahul Sharma",
            "default_meal_price": "-5"
        }))
        .unwrap();

        assert!(input.validate().is_err());
    }

    #[test]
    fn test_filter_by_company_and_status() {
        let company_id = Uuid::new_v4();
        let input: CreateEmployee = serde_json::from_value(serde_json::json!({
            "company_id": company_id,
            "name": "Priya Patel",
            "status": "inactive"
        }))
        .unwrap();
        let employee = Employee::from_create(input, Uuid::new_v4(), Utc::now()).unwrap();

        let same_company = ListEmployeesFilter {
            company_id: Some(company_id),
            status: None,
        };
        let active_only = ListEmployeesFilter {
            company_id: None,
            status: Some(EmployeeStatus::Active),
        };

        assert!(employee.matches(&same_company));
        assert!(!employee.matches(&active_only));
    }
}
