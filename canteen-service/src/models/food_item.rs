//! Food item (menu) model.

use super::{by_name, default_true, non_negative, nullable, Entity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use sqlx::FromRow;
use std::cmp::Ordering;
use uuid::Uuid;
use validator::Validate;

/// A menu item with its default unit price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FoodItem {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub default_price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a food item.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFoodItem {
    #[validate(length(min = 1, message = "Food item name is required"))]
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[validate(custom(function = "non_negative"))]
    pub default_price: Decimal,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Input for updating a food item.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateFoodItem {
    #[validate(length(min = 1, message = "Food item name cannot be empty"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub category: Option<Option<String>>,
    #[validate(custom(function = "non_negative"))]
    pub default_price: Option<Decimal>,
    pub is_active: Option<bool>,
}

/// Filter parameters for listing food items.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListFoodItemsFilter {
    #[serde(default)]
    pub active_only: bool,
    pub category: Option<String>,
}

impl Entity for FoodItem {
    type Create = CreateFoodItem;
    type Update = UpdateFoodItem;
    type Filter = ListFoodItemsFilter;

    const COLLECTION: &'static str = "food_items";

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_create(input: CreateFoodItem, id: Uuid, now: DateTime<Utc>) -> Result<Self, AppError> {
        Ok(Self {
            id,
            name: input.name,
            category: input.category,
            default_price: input.default_price,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_update(&mut self, update: UpdateFoodItem, now: DateTime<Utc>) -> Result<(), AppError> {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(price) = update.default_price {
            self.default_price = price;
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
        self.updated_at = now;
        Ok(())
    }

    fn matches(&self, filter: &ListFoodItemsFilter) -> bool {
        (!filter.active_only || self.is_active)
            && filter
                .category
                .as_deref()
                .map_or(true, |c| self.category.as_deref() == Some(c))
    }

    fn ordering(a: &Self, b: &Self) -> Ordering {
        by_name(&a.name, a.id, &b.name, b.id)
    }
}
