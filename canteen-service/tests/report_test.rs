//! Statement, outstanding and dashboard integration tests.

mod common;

use common::{dec, TestApp};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn company_statement_for_period() {
    let app = TestApp::spawn().await;
    let company = app.create_company("Acme Corp").await;
    let rahul = app.create_employee(&company, "Rahul Sharma").await;
    let anita = app.create_employee(&company, "Anita Rao").await;
    let thali = app.create_food_item("Veg Thali", "100").await;

    // Before the period: 200 charged, 50 paid
    app.record_meal("2024-02-20", &rahul, &thali, 2).await;
    app.create(
        "/company-payments",
        json!({ "company_id": company, "payment_date": "2024-02-25", "amount": "50" }),
    )
    .await;

    // Inside the period: 500 charged, 300 paid
    app.record_meal("2024-03-03", &rahul, &thali, 3).await;
    app.record_meal("2024-03-04", &anita, &thali, 2).await;
    app.create(
        "/company-payments",
        json!({ "company_id": company, "payment_date": "2024-03-10", "amount": "200" }),
    )
    .await;
    app.create(
        "/employee-payments",
        json!({ "employee_id": anita, "payment_date": "2024-03-12", "amount": "100" }),
    )
    .await;

    // After the period
    app.record_meal("2024-04-01", &rahul, &thali, 1).await;

    let statement = app
        .get_json(&format!(
            "/companies/{}/statement?from=2024-03-01&to=2024-03-31",
            company
        ))
        .await;

    assert_eq!(statement["company"]["name"], "Acme Corp");
    assert_eq!(dec(&statement["opening_balance"]), Decimal::from(150));
    assert_eq!(dec(&statement["period_charges"]), Decimal::from(500));
    assert_eq!(dec(&statement["payments_received"]), Decimal::from(300));
    assert_eq!(dec(&statement["closing_balance"]), Decimal::from(350));
    assert_eq!(statement["transactions"].as_array().unwrap().len(), 2);
    assert_eq!(statement["company_payments"].as_array().unwrap().len(), 1);
    assert_eq!(statement["employee_payments"].as_array().unwrap().len(), 1);

    let days = statement["daily_totals"].as_array().unwrap();
    assert_eq!(days.len(), 2);
    assert_eq!(days[0]["date"], "2024-03-03");
    assert_eq!(days[0]["meals"], 3);

    let breakdown = statement["employee_breakdown"].as_array().unwrap();
    assert_eq!(breakdown[0]["employee_name"], "Rahul Sharma");
    assert_eq!(dec(&breakdown[0]["amount"]), Decimal::from(300));
    assert_eq!(breakdown[1]["employee_name"], "Anita Rao");
}

#[tokio::test]
async fn statement_rejects_inverted_period_and_unknown_company() {
    let app = TestApp::spawn().await;
    let company = app.create_company("Acme Corp").await;

    let response = app
        .get(&format!(
            "/companies/{}/statement?from=2024-03-31&to=2024-03-01",
            company
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .get(&format!(
            "/companies/{}/statement?from=2024-03-01&to=2024-03-31",
            Uuid::new_v4()
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn outstanding_report_orders_by_amount() {
    let app = TestApp::spawn().await;
    let acme = app.create_company("Acme Corp").await;
    let zenith = app.create_company("Zenith Labs").await;
    let rahul = app.create_employee(&acme, "Rahul Sharma").await;
    let vikram = app.create_employee(&zenith, "Vikram Singh").await;
    let thali = app.create_food_item("Veg Thali", "150").await;

    app.record_meal("2024-03-01", &rahul, &thali, 1).await;
    app.record_meal("2024-03-01", &vikram, &thali, 4).await;

    let report = app.get_json("/reports/outstanding").await;
    assert_eq!(dec(&report["total_outstanding"]), Decimal::from(750));

    let companies = report["companies"].as_array().unwrap();
    assert_eq!(companies[0]["name"], "Zenith Labs");
    assert_eq!(dec(&companies[0]["balance"]["outstanding"]), Decimal::from(600));
    assert_eq!(companies[0]["employee_count"], 1);
    assert_eq!(companies[1]["name"], "Acme Corp");
}

#[tokio::test]
async fn dashboard_totals_for_day_and_month() {
    let app = TestApp::spawn().await;
    let acme = app.create_company("Acme Corp").await;
    app.create(
        "/companies",
        json!({ "name": "Dormant Ltd", "is_active": false }),
    )
    .await;
    let rahul = app.create_employee(&acme, "Rahul Sharma").await;
    app.create(
        "/employees",
        json!({ "company_id": acme, "name": "Anita Rao", "status": "inactive" }),
    )
    .await;
    let thali = app.create_food_item("Veg Thali", "150").await;

    app.record_meal("2024-02-28", &rahul, &thali, 1).await;
    app.record_meal("2024-03-02", &rahul, &thali, 1).await;
    app.record_meal("2024-03-05", &rahul, &thali, 2).await;

    let dashboard = app.get_json("/dashboard?date=2024-03-05").await;

    assert_eq!(dashboard["date"], "2024-03-05");
    assert_eq!(dashboard["total_companies"], 2);
    assert_eq!(dashboard["active_companies"], 1);
    assert_eq!(dashboard["total_employees"], 2);
    assert_eq!(dashboard["active_employees"], 1);
    assert_eq!(dashboard["meals_today"], 2);
    assert_eq!(dec(&dashboard["amount_today"]), Decimal::from(300));
    assert_eq!(dec(&dashboard["amount_month_to_date"]), Decimal::from(450));
    assert_eq!(dashboard["top_outstanding"].as_array().unwrap().len(), 1);
    assert_eq!(dashboard["recent_transactions"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn dashboard_defaults_to_today() {
    let app = TestApp::spawn().await;

    let dashboard = app.get_json("/dashboard").await;
    assert_eq!(dashboard["meals_today"], 0);
    assert!(dashboard["top_outstanding"].as_array().unwrap().is_empty());
}
