//! Price resolution for a meal: employee override, then company override,
//! then the food item's default price.

use crate::models::{Entity, FoodItem, ListPriceOverridesFilter, PriceOverride};
use crate::services::storage::Storage;
use rust_decimal::Decimal;
use serde::Serialize;
use service_core::error::AppError;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Which rule produced a resolved price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    EmployeeOverride,
    CompanyOverride,
    FoodItemDefault,
}

impl PriceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceSource::EmployeeOverride => "employee_override",
            PriceSource::CompanyOverride => "company_override",
            PriceSource::FoodItemDefault => "food_item_default",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPrice {
    pub price: Decimal,
    pub source: PriceSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_id: Option<Uuid>,
}

/// Pick the price for `food_item` eaten by `employee_id` of `company_id`.
///
/// `overrides` may contain rules for other food items; they are ignored.
/// Within a tier the override listed first by [`PriceOverride`]'s ordering
/// wins (highest priority, then most recently updated, then smallest id).
pub fn resolve_price(
    employee_id: Uuid,
    company_id: Uuid,
    food_item: &FoodItem,
    overrides: &[PriceOverride],
) -> ResolvedPrice {
    let for_item = || overrides.iter().filter(|o| o.food_item_id == food_item.id);

    let employee_tier = for_item()
        .filter(|o| o.employee_id == Some(employee_id))
        .filter(|o| o.company_id.map_or(true, |c| c == company_id))
        .min_by(|a, b| PriceOverride::ordering(a, b));
    if let Some(rule) = employee_tier {
        return ResolvedPrice {
            price: rule.price,
            source: PriceSource::EmployeeOverride,
            override_id: Some(rule.id),
        };
    }

    let company_tier = for_item()
        .filter(|o| o.employee_id.is_none() && o.company_id == Some(company_id))
        .min_by(|a, b| PriceOverride::ordering(a, b));
    if let Some(rule) = company_tier {
        return ResolvedPrice {
            price: rule.price,
            source: PriceSource::CompanyOverride,
            override_id: Some(rule.id),
        };
    }

    ResolvedPrice {
        price: food_item.default_price,
        source: PriceSource::FoodItemDefault,
        override_id: None,
    }
}

/// Resolve the current price of a food item for an employee from storage.
#[instrument(skip(storage))]
pub async fn resolve(
    storage: &dyn Storage,
    employee_id: Uuid,
    food_item_id: Uuid,
) -> Result<ResolvedPrice, AppError> {
    let employee = storage
        .employees()
        .get(employee_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Employee not found")))?;
    let food_item = storage
        .food_items()
        .get(food_item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Food item not found")))?;

    let overrides = storage
        .price_overrides()
        .list(&ListPriceOverridesFilter {
            food_item_id: Some(food_item_id),
            ..Default::default()
        })
        .await?;

    let resolved = resolve_price(employee.id, employee.company_id, &food_item, &overrides);
    debug!(
        employee_id = %employee_id,
        food_item_id = %food_item_id,
        source = resolved.source.as_str(),
        price = %resolved.price,
        "Price resolved"
    );
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn food_item(price: i64) -> FoodItem {
        let now = Utc::now();
        FoodItem {
            id: Uuid::new_v4(),
            name: "Veg Thali".to_string(),
            category: Some("Lunch".to_string()),
            default_price: Decimal::from(price),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn rule(
        item: &FoodItem,
        company_id: Option<Uuid>,
        employee_id: Option<Uuid>,
        price: i64,
        priority: i32,
    ) -> PriceOverride {
        let now = Utc::now();
        PriceOverride {
            id: Uuid::new_v4(),
            food_item_id: item.id,
            company_id,
            employee_id,
            price: Decimal::from(price),
            priority,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_falls_back_to_default_price() {
        let item = food_item(150);
        let resolved = resolve_price(Uuid::new_v4(), Uuid::new_v4(), &item, &[]);

        assert_eq!(resolved.price, Decimal::from(150));
        assert_eq!(resolved.source, PriceSource::FoodItemDefault);
        assert_eq!(resolved.override_id, None);
    }

    #[test]
    fn test_employee_override_beats_company_override() {
        let item = food_item(150);
        let (company, employee) = (Uuid::new_v4(), Uuid::new_v4());
        let company_rule = rule(&item, Some(company), None, 120, 100);
        let employee_rule = rule(&item, None, Some(employee), 100, 0);

        let rules = [company_rule, employee_rule.clone()];
        let resolved = resolve_price(employee, company, &item, &rules);

        assert_eq!(resolved.price, Decimal::from(100));
        assert_eq!(resolved.source, PriceSource::EmployeeOverride);
        assert_eq!(resolved.override_id, Some(employee_rule.id));
    }

    #[test]
    fn test_company_override_applies_to_its_employees_only() {
        let item = food_item(150);
        let company = Uuid::new_v4();
        let rules = vec![rule(&item, Some(company), None, 120, 0)];

        let member = resolve_price(Uuid::new_v4(), company, &item, &rules);
        let outsider = resolve_price(Uuid::new_v4(), Uuid::new_v4(), &item, &rules);

        assert_eq!(member.source, PriceSource::CompanyOverride);
        assert_eq!(member.price, Decimal::from(120));
        assert_eq!(outsider.source, PriceSource::FoodItemDefault);
    }

    #[test]
    fn test_employee_override_scoped_to_other_company_is_ignored() {
        let item = food_item(150);
        let employee = Uuid::new_v4();
        let rules = vec![rule(&item, Some(Uuid::new_v4()), Some(employee), 90, 0)];

        let resolved = resolve_price(employee, Uuid::new_v4(), &item, &rules);
        assert_eq!(resolved.source, PriceSource::FoodItemDefault);
    }

    #[test]
    fn test_highest_priority_wins_within_tier() {
        let item = food_item(150);
        let company = Uuid::new_v4();
        let low = rule(&item, Some(company), None, 130, 1);
        let high = rule(&item, Some(company), None, 110, 5);

        let resolved = resolve_price(Uuid::new_v4(), company, &item, &[low, high.clone()]);
        assert_eq!(resolved.override_id, Some(high.id));
    }

    #[test]
    fn test_priority_tie_goes_to_most_recent_update() {
        let item = food_item(150);
        let company = Uuid::new_v4();
        let mut older = rule(&item, Some(company), None, 130, 1);
        older.updated_at = older.updated_at - Duration::days(1);
        let newer = rule(&item, Some(company), None, 110, 1);

        let resolved = resolve_price(Uuid::new_v4(), company, &item, &[older, newer.clone()]);
        assert_eq!(resolved.override_id, Some(newer.id));
    }

    #[test]
    fn test_resolution_is_deterministic_regardless_of_input_order() {
        let item = food_item(150);
        let company = Uuid::new_v4();
        let mut a = rule(&item, Some(company), None, 130, 1);
        let mut b = rule(&item, Some(company), None, 110, 1);
        b.updated_at = a.updated_at;
        a.created_at = b.created_at;

        let forward = resolve_price(Uuid::new_v4(), company, &item, &[a.clone(), b.clone()]);
        let reverse = resolve_price(Uuid::new_v4(), company, &item, &[b, a]);
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_overrides_for_other_items_are_ignored() {
        let item = food_item(150);
        let other = food_item(60);
        let company = Uuid::new_v4();
        let rules = vec![rule(&other, Some(company), None, 10, 9)];

        let resolved = resolve_price(Uuid::new_v4(), company, &item, &rules);
        assert_eq!(resolved.price, Decimal::from(150));
    }
}
