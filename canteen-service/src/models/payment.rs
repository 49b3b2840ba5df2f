//! Company and employee payment models.

use super::{nullable, positive, within, Entity};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use sqlx::FromRow;
use std::cmp::Ordering;
use uuid::Uuid;
use validator::Validate;

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Upi,
    BankTransfer,
    Cheque,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Upi => "upi",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Cheque => "cheque",
            PaymentMethod::Other => "other",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A payment received from a company against its account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CompanyPayment {
    pub id: Uuid,
    pub company_id: Uuid,
    pub payment_date: NaiveDate,
    pub amount: Decimal,
    pub method: Option<PaymentMethod>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A payment received from an individual employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct EmployeePayment {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub company_id: Uuid,
    pub payment_date: NaiveDate,
    pub amount: Decimal,
    pub method: Option<PaymentMethod>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for recording a company payment.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCompanyPayment {
    pub company_id: Uuid,
    pub payment_date: NaiveDate,
    #[validate(custom(function = "positive"))]
    pub amount: Decimal,
    #[serde(default)]
    pub method: Option<PaymentMethod>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Input for recording an employee payment.
///
/// When `company_id` is omitted it is taken from the employee.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateEmployeePayment {
    pub employee_id: Uuid,
    #[serde(default)]
    pub company_id: Option<Uuid>,
    pub payment_date: NaiveDate,
    #[validate(custom(function = "positive"))]
    pub amount: Decimal,
    #[serde(default)]
    pub method: Option<PaymentMethod>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Input for updating a company payment.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCompanyPayment {
    pub payment_date: Option<NaiveDate>,
    #[validate(custom(function = "positive"))]
    pub amount: Option<Decimal>,
    #[serde(default, deserialize_with = "nullable")]
    pub method: Option<Option<PaymentMethod>>,
    #[serde(default, deserialize_with = "nullable")]
    pub reference: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

/// Input for updating an employee payment.
pub type UpdateEmployeePayment = UpdateCompanyPayment;

/// Filter parameters for listing company payments.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListCompanyPaymentsFilter {
    pub company_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Filter parameters for listing employee payments.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListEmployeePaymentsFilter {
    pub employee_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl Entity for CompanyPayment {
    type Create = CreateCompanyPayment;
    type Update = UpdateCompanyPayment;
    type Filter = ListCompanyPaymentsFilter;

    const COLLECTION: &'static str = "company_payments";

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_create(
        input: CreateCompanyPayment,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            id,
            company_id: input.company_id,
            payment_date: input.payment_date,
            amount: input.amount,
            method: input.method,
            reference: input.reference,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_update(
        &mut self,
        update: UpdateCompanyPayment,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if let Some(payment_date) = update.payment_date {
            self.payment_date = payment_date;
        }
        if let Some(amount) = update.amount {
            self.amount = amount;
        }
        if let Some(method) = update.method {
            self.method = method;
        }
        if let Some(reference) = update.reference {
            self.reference = reference;
        }
        if let Some(notes) = update.notes {
            self.notes = notes;
        }
        self.updated_at = now;
        Ok(())
    }

    fn matches(&self, filter: &ListCompanyPaymentsFilter) -> bool {
        filter.company_id.map_or(true, |id| self.company_id == id)
            && within(self.payment_date, filter.from, filter.to)
    }

    fn ordering(a: &Self, b: &Self) -> Ordering {
        b.payment_date
            .cmp(&a.payment_date)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// Employee payment creation with the owning company resolved.
#[derive(Debug, Clone)]
pub struct NewEmployeePayment {
    pub company_id: Uuid,
    pub input: CreateEmployeePayment,
}

impl Entity for EmployeePayment {
    type Create = NewEmployeePayment;
    type Update = UpdateEmployeePayment;
    type Filter = ListEmployeePaymentsFilter;

    const COLLECTION: &'static str = "employee_payments";

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_create(
        new: NewEmployeePayment,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        let input = new.input;
        Ok(Self {
            id,
            employee_id: input.employee_id,
            company_id: new.company_id,
            payment_date: input.payment_date,
            amount: input.amount,
            method: input.method,
            reference: input.reference,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_update(
        &mut self,
        update: UpdateEmployeePayment,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if let Some(payment_date) = update.payment_date {
            self.payment_date = payment_date;
        }
        if let Some(amount) = update.amount {
            self.amount = amount;
        }
        if let Some(method) = update.method {
            self.method = method;
        }
        if let Some(reference) = update.reference {
            self.reference = reference;
        }
        if let Some(notes) = update.notes {
            self.notes = notes;
        }
        self.updated_at = now;
        Ok(())
    }

    fn matches(&self, filter: &ListEmployeePaymentsFilter) -> bool {
        filter.employee_id.map_or(true, |id| self.employee_id == id)
            && filter.company_id.map_or(true, |id| self.company_id == id)
            && within(self.payment_date, filter.from, filter.to)
    }

    fn ordering(a: &Self, b: &Self) -> Ordering {
        b.payment_date
            .cmp(&a.payment_date)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.id.cmp(&b.id))
    }
}
