//! Read-only reports: company statement, dashboard and outstanding list.

use crate::models::{
    within, Company, CompanyPayment, EmployeePayment, FoodTransaction, ListCompaniesFilter,
    ListCompanyPaymentsFilter, ListEmployeePaymentsFilter, ListEmployeesFilter,
    ListTransactionsFilter,
};
use crate::services::balance::{
    checked_sum, company_summaries, employee_summaries, CompanySummary, EmployeeSummary,
};
use crate::services::storage::Storage;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use service_core::error::AppError;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::instrument;
use uuid::Uuid;

const TOP_OUTSTANDING: usize = 5;
const RECENT_TRANSACTIONS: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub meals: i64,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmployeeTotal {
    pub employee_id: Uuid,
    pub employee_name: Option<String>,
    pub meals: i64,
    pub amount: Decimal,
}

/// Account statement of one company over `[from, to]`.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyStatement {
    pub company: Company,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub opening_balance: Decimal,
    pub period_charges: Decimal,
    pub payments_received: Decimal,
    pub closing_balance: Decimal,
    pub transactions: Vec<FoodTransaction>,
    pub company_payments: Vec<CompanyPayment>,
    pub employee_payments: Vec<EmployeePayment>,
    pub daily_totals: Vec<DailyTotal>,
    pub employee_breakdown: Vec<EmployeeTotal>,
}

#[instrument(skip(storage))]
pub async fn company_statement(
    storage: &dyn Storage,
    company_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<CompanyStatement, AppError> {
    if from > to {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Statement period starts after it ends"
        )));
    }

    let company = storage
        .companies()
        .get(company_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Company not found")))?;

    let employee_filter = ListEmployeesFilter {
        company_id: Some(company_id),
        ..Default::default()
    };
    let transaction_filter = ListTransactionsFilter {
        company_id: Some(company_id),
        to: Some(to),
        ..Default::default()
    };
    let company_payment_filter = ListCompanyPaymentsFilter {
        company_id: Some(company_id),
        to: Some(to),
        ..Default::default()
    };
    let employee_payment_filter = ListEmployeePaymentsFilter {
        company_id: Some(company_id),
        to: Some(to),
        ..Default::default()
    };

    let (employees, transactions, company_payments, employee_payments) = futures::try_join!(
        storage.employees().list(&employee_filter),
        storage.transactions().list(&transaction_filter),
        storage.company_payments().list(&company_payment_filter),
        storage.employee_payments().list(&employee_payment_filter),
    )?;

    // Everything dated before `from` folds into the opening balance.
    let charged_before = checked_sum(
        transactions
            .iter()
            .filter(|t| t.date < from)
            .map(|t| t.total_amount),
    )?;
    let paid_before = checked_sum(
        company_payments
            .iter()
            .filter(|p| p.payment_date < from)
            .map(|p| p.amount)
            .chain(
                employee_payments
                    .iter()
                    .filter(|p| p.payment_date < from)
                    .map(|p| p.amount),
            ),
    )?;
    let opening_balance = checked_sum([charged_before, -paid_before])?;

    let transactions: Vec<_> = transactions
        .into_iter()
        .filter(|t| within(t.date, Some(from), Some(to)))
        .collect();
    let company_payments: Vec<_> = company_payments
        .into_iter()
        .filter(|p| within(p.payment_date, Some(from), Some(to)))
        .collect();
    let employee_payments: Vec<_> = employee_payments
        .into_iter()
        .filter(|p| within(p.payment_date, Some(from), Some(to)))
        .collect();

    let period_charges = checked_sum(transactions.iter().map(|t| t.total_amount))?;
    let payments_received = checked_sum(
        company_payments
            .iter()
            .map(|p| p.amount)
            .chain(employee_payments.iter().map(|p| p.amount)),
    )?;
    let closing_balance = checked_sum([opening_balance, period_charges, -payments_received])?;

    let mut by_day: BTreeMap<NaiveDate, (i64, Decimal)> = BTreeMap::new();
    let mut by_employee: HashMap<Uuid, (i64, Decimal)> = HashMap::new();
    for t in &transactions {
        let day = by_day.entry(t.date).or_default();
        day.0 += i64::from(t.quantity);
        day.1 = checked_sum([day.1, t.total_amount])?;
        let person = by_employee.entry(t.employee_id).or_default();
        person.0 += i64::from(t.quantity);
        person.1 = checked_sum([person.1, t.total_amount])?;
    }

    let names: HashMap<Uuid, &str> = employees.iter().map(|e| (e.id, e.name.as_str())).collect();
    let mut employee_breakdown: Vec<EmployeeTotal> = by_employee
        .into_iter()
        .map(|(employee_id, (meals, amount))| EmployeeTotal {
            employee_id,
            employee_name: names.get(&employee_id).map(|n| n.to_string()),
            meals,
            amount,
        })
        .collect();
    employee_breakdown.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| a.employee_name.cmp(&b.employee_name))
            .then_with(|| a.employee_id.cmp(&b.employee_id))
    });

    Ok(CompanyStatement {
        company,
        from,
        to,
        opening_balance,
        period_charges,
        payments_received,
        closing_balance,
        transactions,
        company_payments,
        employee_payments,
        daily_totals: by_day
            .into_iter()
            .map(|(date, (meals, amount))| DailyTotal { date, meals, amount })
            .collect(),
        employee_breakdown,
    })
}

/// Every company with its balance, highest outstanding first.
#[instrument(skip(storage))]
pub async fn load_company_summaries(
    storage: &dyn Storage,
) -> Result<Vec<CompanySummary>, AppError> {
    let company_filter = ListCompaniesFilter::default();
    let employee_filter = ListEmployeesFilter::default();
    let transaction_filter = ListTransactionsFilter::default();
    let company_payment_filter = ListCompanyPaymentsFilter::default();
    let employee_payment_filter = ListEmployeePaymentsFilter::default();

    let (companies, employees, transactions, company_payments, employee_payments) =
        futures::try_join!(
            storage.companies().list(&company_filter),
            storage.employees().list(&employee_filter),
            storage.transactions().list(&transaction_filter),
            storage.company_payments().list(&company_payment_filter),
            storage.employee_payments().list(&employee_payment_filter),
        )?;

    let mut summaries = company_summaries(
        companies,
        &employees,
        &transactions,
        &company_payments,
        &employee_payments,
    )?;
    summaries.sort_by(|a, b| b.balance.outstanding.cmp(&a.balance.outstanding));
    Ok(summaries)
}

/// Employees with company name and balance, optionally limited to one
/// company.
///
/// Each balance covers every transaction and payment of the employee, even
/// those booked under a previous company.
#[instrument(skip(storage))]
pub async fn load_employee_summaries(
    storage: &dyn Storage,
    company_id: Option<Uuid>,
) -> Result<Vec<EmployeeSummary>, AppError> {
    let company_filter = ListCompaniesFilter::default();
    let employee_filter = ListEmployeesFilter {
        company_id,
        ..Default::default()
    };
    let transaction_filter = ListTransactionsFilter::default();
    let payment_filter = ListEmployeePaymentsFilter::default();

    let (companies, employees, transactions, payments) = futures::try_join!(
        storage.companies().list(&company_filter),
        storage.employees().list(&employee_filter),
        storage.transactions().list(&transaction_filter),
        storage.employee_payments().list(&payment_filter),
    )?;

    let staff: HashSet<Uuid> = employees.iter().map(|e| e.id).collect();
    let transactions: Vec<_> = transactions
        .into_iter()
        .filter(|t| staff.contains(&t.employee_id))
        .collect();
    let payments: Vec<_> = payments
        .into_iter()
        .filter(|p| staff.contains(&p.employee_id))
        .collect();

    employee_summaries(employees, &companies, &transactions, &payments)
}

/// Employees of one company with their balances.
pub async fn load_company_employees(
    storage: &dyn Storage,
    company_id: Uuid,
) -> Result<Vec<EmployeeSummary>, AppError> {
    storage
        .companies()
        .get(company_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Company not found")))?;

    load_employee_summaries(storage, Some(company_id)).await
}

#[derive(Debug, Clone, Serialize)]
pub struct OutstandingReport {
    pub total_outstanding: Decimal,
    pub companies: Vec<CompanySummary>,
}

pub async fn outstanding(storage: &dyn Storage) -> Result<OutstandingReport, AppError> {
    let companies = load_company_summaries(storage).await?;
    Ok(OutstandingReport {
        total_outstanding: checked_sum(companies.iter().map(|c| c.balance.outstanding))?,
        companies,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub date: NaiveDate,
    pub total_companies: usize,
    pub active_companies: usize,
    pub total_employees: usize,
    pub active_employees: usize,
    pub meals_today: i64,
    pub amount_today: Decimal,
    pub amount_month_to_date: Decimal,
    pub top_outstanding: Vec<CompanySummary>,
    pub recent_transactions: Vec<FoodTransaction>,
}

#[instrument(skip(storage))]
pub async fn dashboard(storage: &dyn Storage, date: NaiveDate) -> Result<Dashboard, AppError> {
    let company_filter = ListCompaniesFilter::default();
    let employee_filter = ListEmployeesFilter::default();
    let transaction_filter = ListTransactionsFilter::default();
    let company_payment_filter = ListCompanyPaymentsFilter::default();
    let employee_payment_filter = ListEmployeePaymentsFilter::default();

    let (companies, employees, transactions, company_payments, employee_payments) =
        futures::try_join!(
            storage.companies().list(&company_filter),
            storage.employees().list(&employee_filter),
            storage.transactions().list(&transaction_filter),
            storage.company_payments().list(&company_payment_filter),
            storage.employee_payments().list(&employee_payment_filter),
        )?;

    let month_start = date.with_day(1).unwrap_or(date);
    let meals_today: i64 = transactions
        .iter()
        .filter(|t| t.date == date)
        .map(|t| i64::from(t.quantity))
        .sum();
    let amount_today = checked_sum(
        transactions
            .iter()
            .filter(|t| t.date == date)
            .map(|t| t.total_amount),
    )?;
    let amount_month_to_date = checked_sum(
        transactions
            .iter()
            .filter(|t| within(t.date, Some(month_start), Some(date)))
            .map(|t| t.total_amount),
    )?;

    let total_companies = companies.len();
    let active_companies = companies.iter().filter(|c| c.is_active).count();
    let active_employees = employees.iter().filter(|e| e.is_active()).count();

    let mut top_outstanding: Vec<_> = company_summaries(
        companies,
        &employees,
        &transactions,
        &company_payments,
        &employee_payments,
    )?
    .into_iter()
    .filter(|s| s.balance.outstanding > Decimal::ZERO)
    .collect();
    top_outstanding.sort_by(|a, b| b.balance.outstanding.cmp(&a.balance.outstanding));
    top_outstanding.truncate(TOP_OUTSTANDING);

    Ok(Dashboard {
        date,
        total_companies,
        active_companies,
        total_employees: employees.len(),
        active_employees,
        meals_today,
        amount_today,
        amount_month_to_date,
        top_outstanding,
        recent_transactions: transactions.into_iter().take(RECENT_TRANSACTIONS).collect(),
    })
}
