//! Daily meal entry: record a batch of meals for one date.

use crate::models::{
    non_negative, CreateFoodTransaction, Employee, FoodItem, FoodTransaction,
    ListPriceOverridesFilter,
};
use crate::services::metrics::record_meals;
use crate::services::pricing::{resolve_price, PriceSource};
use crate::services::storage::Storage;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::collections::HashMap;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

fn default_quantity() -> i32 {
    1
}

/// One line of the batch. The company comes from the employee.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MealEntry {
    pub employee_id: Uuid,
    pub food_item_id: Uuid,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, max = 1000, message = "Quantity must be between 1 and 1000"))]
    pub quantity: i32,
    /// Explicit price; resolved from overrides and defaults when absent.
    #[validate(custom(function = "non_negative"))]
    pub unit_price: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordMeals {
    pub date: NaiveDate,
    #[validate(length(min = 1, message = "At least one entry is required"), nested)]
    pub entries: Vec<MealEntry>,
}

/// A written transaction plus where its unit price came from.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedMeal {
    #[serde(flatten)]
    pub transaction: FoodTransaction,
    pub price_source: Option<PriceSource>,
}

/// Record every entry as a transaction.
///
/// Every employee and food item is looked up, and every line priced, before
/// the first write, so an unknown id or an unpriceable line rejects the whole
/// batch.
#[instrument(skip(storage, batch), fields(date = %batch.date, entries = batch.entries.len()))]
pub async fn record(
    storage: &dyn Storage,
    batch: RecordMeals,
) -> Result<Vec<RecordedMeal>, AppError> {
    let mut employees: HashMap<Uuid, Employee> = HashMap::new();
    let mut food_items: HashMap<Uuid, FoodItem> = HashMap::new();

    for entry in &batch.entries {
        if !employees.contains_key(&entry.employee_id) {
            let employee = storage.employees().get(entry.employee_id).await?.ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!("Unknown employee {}", entry.employee_id))
            })?;
            employees.insert(employee.id, employee);
        }
        if !food_items.contains_key(&entry.food_item_id) {
            let item = storage.food_items().get(entry.food_item_id).await?.ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!("Unknown food item {}", entry.food_item_id))
            })?;
            food_items.insert(item.id, item);
        }
    }

    let overrides = if batch.entries.iter().any(|e| e.unit_price.is_none()) {
        storage
            .price_overrides()
            .list(&ListPriceOverridesFilter::default())
            .await?
    } else {
        Vec::new()
    };

    let mut priced = Vec::with_capacity(batch.entries.len());
    for entry in batch.entries {
        let employee = &employees[&entry.employee_id];
        let food_item = &food_items[&entry.food_item_id];

        let (unit_price, price_source) = match entry.unit_price {
            Some(price) => (price, None),
            None => {
                let resolved =
                    resolve_price(employee.id, employee.company_id, food_item, &overrides);
                (resolved.price, Some(resolved.source))
            }
        };
        FoodTransaction::line_total(entry.quantity, unit_price)?;

        let input = CreateFoodTransaction {
            date: batch.date,
            company_id: employee.company_id,
            employee_id: employee.id,
            food_item_id: food_item.id,
            quantity: entry.quantity,
            unit_price,
            notes: entry.notes,
        };
        priced.push((input, price_source));
    }

    let mut recorded = Vec::with_capacity(priced.len());
    for (input, price_source) in priced {
        let quantity = input.quantity;
        let transaction = storage.transactions().create(input).await?;

        record_meals(price_source.map_or("explicit", |s| s.as_str()), quantity);
        recorded.push(RecordedMeal {
            transaction,
            price_source,
        });
    }

    info!(date = %batch.date, count = recorded.len(), "Meals recorded");
    Ok(recorded)
}
