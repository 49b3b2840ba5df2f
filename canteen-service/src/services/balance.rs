//! Outstanding balances, always computed from the stored rows.
//!
//! Employee balance: that employee's transactions minus that employee's
//! payments. Company balance: transactions carrying the company id minus the
//! company's own payments and every employee payment carrying the company id.

use crate::models::{
    Company, CompanyPayment, Employee, EmployeePayment, FoodTransaction,
    ListCompanyPaymentsFilter, ListEmployeePaymentsFilter, ListTransactionsFilter,
};
use crate::services::storage::Storage;
use rust_decimal::Decimal;
use serde::Serialize;
use service_core::error::AppError;
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Balance {
    pub total_purchases: Decimal,
    pub total_payments: Decimal,
    pub outstanding: Decimal,
}

fn overflow() -> AppError {
    AppError::BadRequest(anyhow::anyhow!("Amount total is out of range"))
}

/// Sum amounts, failing instead of panicking when the total leaves the
/// representable range.
pub fn checked_sum<I>(amounts: I) -> Result<Decimal, AppError>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount).ok_or_else(overflow))
}

impl Balance {
    pub fn new(total_purchases: Decimal, total_payments: Decimal) -> Result<Self, AppError> {
        Ok(Self {
            total_purchases,
            total_payments,
            outstanding: total_purchases
                .checked_sub(total_payments)
                .ok_or_else(overflow)?,
        })
    }

    fn add_purchase(&mut self, amount: Decimal) -> Result<(), AppError> {
        let purchases = self.total_purchases.checked_add(amount).ok_or_else(overflow)?;
        *self = Self::new(purchases, self.total_payments)?;
        Ok(())
    }

    fn add_payment(&mut self, amount: Decimal) -> Result<(), AppError> {
        let payments = self.total_payments.checked_add(amount).ok_or_else(overflow)?;
        *self = Self::new(self.total_purchases, payments)?;
        Ok(())
    }
}

pub fn employee_balance(
    employee_id: Uuid,
    transactions: &[FoodTransaction],
    payments: &[EmployeePayment],
) -> Result<Balance, AppError> {
    let purchases = checked_sum(
        transactions
            .iter()
            .filter(|t| t.employee_id == employee_id)
            .map(|t| t.total_amount),
    )?;
    let paid = checked_sum(
        payments
            .iter()
            .filter(|p| p.employee_id == employee_id)
            .map(|p| p.amount),
    )?;
    Balance::new(purchases, paid)
}

pub fn company_balance(
    company_id: Uuid,
    transactions: &[FoodTransaction],
    company_payments: &[CompanyPayment],
    employee_payments: &[EmployeePayment],
) -> Result<Balance, AppError> {
    let purchases = checked_sum(
        transactions
            .iter()
            .filter(|t| t.company_id == company_id)
            .map(|t| t.total_amount),
    )?;
    let direct = company_payments
        .iter()
        .filter(|p| p.company_id == company_id)
        .map(|p| p.amount);
    let via_employees = employee_payments
        .iter()
        .filter(|p| p.company_id == company_id)
        .map(|p| p.amount);
    Balance::new(purchases, checked_sum(direct.chain(via_employees))?)
}

/// A company with its headcount and balance.
#[derive(Debug, Clone, Serialize)]
pub struct CompanySummary {
    #[serde(flatten)]
    pub company: Company,
    pub employee_count: usize,
    pub balance: Balance,
}

/// An employee with its company name and balance.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeSummary {
    #[serde(flatten)]
    pub employee: Employee,
    pub company_name: Option<String>,
    pub balance: Balance,
}

/// Balances for every company in one pass over each collection.
pub fn company_summaries(
    companies: Vec<Company>,
    employees: &[Employee],
    transactions: &[FoodTransaction],
    company_payments: &[CompanyPayment],
    employee_payments: &[EmployeePayment],
) -> Result<Vec<CompanySummary>, AppError> {
    let mut balances: HashMap<Uuid, Balance> = HashMap::new();
    let mut headcount: HashMap<Uuid, usize> = HashMap::new();

    for t in transactions {
        balances.entry(t.company_id).or_default().add_purchase(t.total_amount)?;
    }
    for p in company_payments {
        balances.entry(p.company_id).or_default().add_payment(p.amount)?;
    }
    for p in employee_payments {
        balances.entry(p.company_id).or_default().add_payment(p.amount)?;
    }
    for e in employees {
        *headcount.entry(e.company_id).or_default() += 1;
    }

    Ok(companies
        .into_iter()
        .map(|company| CompanySummary {
            employee_count: headcount.get(&company.id).copied().unwrap_or(0),
            balance: balances.get(&company.id).copied().unwrap_or_default(),
            company,
        })
        .collect())
}

/// Balances for every employee in one pass over each collection.
pub fn employee_summaries(
    employees: Vec<Employee>,
    companies: &[Company],
    transactions: &[FoodTransaction],
    employee_payments: &[EmployeePayment],
) -> Result<Vec<EmployeeSummary>, AppError> {
    let names: HashMap<Uuid, &str> = companies.iter().map(|c| (c.id, c.name.as_str())).collect();
    let mut balances: HashMap<Uuid, Balance> = HashMap::new();

    for t in transactions {
        balances.entry(t.employee_id).or_default().add_purchase(t.total_amount)?;
    }
    for p in employee_payments {
        balances.entry(p.employee_id).or_default().add_payment(p.amount)?;
    }

    Ok(employees
        .into_iter()
        .map(|employee| EmployeeSummary {
            company_name: names.get(&employee.company_id).map(|n| n.to_string()),
            balance: balances.get(&employee.id).copied().unwrap_or_default(),
            employee,
        })
        .collect())
}

/// Load and compute one employee's balance.
#[instrument(skip(storage))]
pub async fn load_employee_balance(
    storage: &dyn Storage,
    employee_id: Uuid,
) -> Result<Balance, AppError> {
    let transaction_filter = ListTransactionsFilter {
        employee_id: Some(employee_id),
        ..Default::default()
    };
    let payment_filter = ListEmployeePaymentsFilter {
        employee_id: Some(employee_id),
        ..Default::default()
    };

    let (transactions, payments) = futures::try_join!(
        storage.transactions().list(&transaction_filter),
        storage.employee_payments().list(&payment_filter),
    )?;
    employee_balance(employee_id, &transactions, &payments)
}

/// Load and compute one company's balance.
#[instrument(skip(storage))]
pub async fn load_company_balance(
    storage: &dyn Storage,
    company_id: Uuid,
) -> Result<Balance, AppError> {
    let transaction_filter = ListTransactionsFilter {
        company_id: Some(company_id),
        ..Default::default()
    };
    let company_payment_filter = ListCompanyPaymentsFilter {
        company_id: Some(company_id),
        ..Default::default()
    };
    let employee_payment_filter = ListEmployeePaymentsFilter {
        company_id: Some(company_id),
        ..Default::default()
    };

    let (transactions, company_payments, employee_payments) = futures::try_join!(
        storage.transactions().list(&transaction_filter),
        storage.company_payments().list(&company_payment_filter),
        storage.employee_payments().list(&employee_payment_filter),
    )?;
    company_balance(
        company_id,
        &transactions,
        &company_payments,
        &employee_payments,
    )
}
