//! Food transaction model: one line of meals eaten by an employee.

use super::{non_negative, nullable, within, Entity};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use sqlx::FromRow;
use std::cmp::Ordering;
use uuid::Uuid;
use validator::Validate;

/// A recorded meal purchase.
///
/// `total_amount` is fixed when the row is written and is never derived from
/// the current menu or override prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FoodTransaction {
    pub id: Uuid,
    pub date: NaiveDate,
    pub company_id: Uuid,
    pub employee_id: Uuid,
    pub food_item_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a transaction. The total is computed, never supplied.
#[derive(Debug, Clone)]
pub struct CreateFoodTransaction {
    pub date: NaiveDate,
    pub company_id: Uuid,
    pub employee_id: Uuid,
    pub food_item_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub notes: Option<String>,
}

/// Input for updating a transaction.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateFoodTransaction {
    pub date: Option<NaiveDate>,
    #[validate(range(min = 1, max = 1000, message = "Quantity must be between 1 and 1000"))]
    pub quantity: Option<i32>,
    #[validate(custom(function = "non_negative"))]
    pub unit_price: Option<Decimal>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

/// Filter parameters for listing transactions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTransactionsFilter {
    pub employee_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub food_item_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl FoodTransaction {
    /// Line total for a quantity at a unit price.
    pub fn line_total(quantity: i32, unit_price: Decimal) -> Result<Decimal, AppError> {
        Decimal::from(quantity)
            .checked_mul(unit_price)
            .ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!(
                    "Line total overflows: {} x {}",
                    quantity,
                    unit_price
                ))
            })
    }
}

impl Entity for FoodTransaction {
    type Create = CreateFoodTransaction;
    type Update = UpdateFoodTransaction;
    type Filter = ListTransactionsFilter;

    const COLLECTION: &'static str = "transactions";

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_create(
        input: CreateFoodTransaction,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            id,
            date: input.date,
            company_id: input.company_id,
            employee_id: input.employee_id,
            food_item_id: input.food_item_id,
            quantity: input.quantity,
            unit_price: input.unit_price,
            total_amount: Self::line_total(input.quantity, input.unit_price)?,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_update(
        &mut self,
        update: UpdateFoodTransaction,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if let Some(date) = update.date {
            self.date = date;
        }
        let repriced = update.quantity.is_some() || update.unit_price.is_some();
        if let Some(quantity) = update.quantity {
            self.quantity = quantity;
        }
        if let Some(unit_price) = update.unit_price {
            self.unit_price = unit_price;
        }
        if repriced {
            self.total_amount = Self::line_total(self.quantity, self.unit_price)?;
        }
        if let Some(notes) = update.notes {
            self.notes = notes;
        }
        self.updated_at = now;
        Ok(())
    }

    fn matches(&self, filter: &ListTransactionsFilter) -> bool {
        filter.employee_id.map_or(true, |id| self.employee_id == id)
            && filter.company_id.map_or(true, |id| self.company_id == id)
            && filter.food_item_id.map_or(true, |id| self.food_item_id == id)
            && within(self.date, filter.from, filter.to)
    }

    fn ordering(a: &Self, b: &Self) -> Ordering {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.id.cmp(&b.id))
    }
}
