//! Price override model.

use super::{non_negative, nullable, Entity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use sqlx::FromRow;
use std::cmp::Ordering;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Replaces a food item's default price for a company, an employee, or both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PriceOverride {
    pub id: Uuid,
    pub food_item_id: Uuid,
    pub company_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub price: Decimal,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a price override.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_scope"))]
pub struct CreatePriceOverride {
    pub food_item_id: Uuid,
    #[serde(default)]
    pub company_id: Option<Uuid>,
    #[serde(default)]
    pub employee_id: Option<Uuid>,
    #[validate(custom(function = "non_negative"))]
    pub price: Decimal,
    #[serde(default)]
    pub priority: i32,
}

/// Input for updating a price override.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePriceOverride {
    #[serde(default, deserialize_with = "nullable")]
    pub company_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    pub employee_id: Option<Option<Uuid>>,
    #[validate(custom(function = "non_negative"))]
    pub price: Option<Decimal>,
    pub priority: Option<i32>,
}

/// Filter parameters for listing price overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPriceOverridesFilter {
    pub food_item_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
}

fn validate_scope(input: &CreatePriceOverride) -> Result<(), ValidationError> {
    if input.company_id.is_none() && input.employee_id.is_none() {
        let mut err = ValidationError::new("unscoped_override");
        err.message = Some("A price override needs a company_id or an employee_id".into());
        return Err(err);
    }
    Ok(())
}

impl PriceOverride {
    /// An override must target a company, an employee, or both.
    pub fn is_scoped(&self) -> bool {
        self.company_id.is_some() || self.employee_id.is_some()
    }
}

impl Entity for PriceOverride {
    type Create = CreatePriceOverride;
    type Update = UpdatePriceOverride;
    type Filter = ListPriceOverridesFilter;

    const COLLECTION: &'static str = "price_overrides";

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_create(
        input: CreatePriceOverride,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            id,
            food_item_id: input.food_item_id,
            company_id: input.company_id,
            employee_id: input.employee_id,
            price: input.price,
            priority: input.priority,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_update(
        &mut self,
        update: UpdatePriceOverride,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if let Some(company_id) = update.company_id {
            self.company_id = company_id;
        }
        if let Some(employee_id) = update.employee_id {
            self.employee_id = employee_id;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if !self.is_scoped() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "A price override needs a company_id or an employee_id"
            )));
        }
        self.updated_at = now;
        Ok(())
    }

    fn matches(&self, filter: &ListPriceOverridesFilter) -> bool {
        filter.food_item_id.map_or(true, |id| self.food_item_id == id)
            && filter.company_id.map_or(true, |id| self.company_id == Some(id))
            && filter.employee_id.map_or(true, |id| self.employee_id == Some(id))
    }

    fn ordering(a: &Self, b: &Self) -> Ordering {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.updated_at.cmp(&a.updated_at))
            .then_with(|| a.id.cmp(&b.id))
    }
}
