//! Daily meal entry and price resolution integration tests.

mod common;

use common::{dec, TestApp};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

struct Fixture {
    company: String,
    employee: String,
    thali: String,
}

async fn seed(app: &TestApp) -> Fixture {
    let company = app.create_company("Acme Corp").await;
    let employee = app.create_employee(&company, "Rahul Sharma").await;
    let thali = app.create_food_item("Veg Thali", "150").await;
    Fixture {
        company,
        employee,
        thali,
    }
}

#[tokio::test]
async fn meal_is_priced_from_food_item_default() {
    let app = TestApp::spawn().await;
    let f = seed(&app).await;

    let txn = app.record_meal("2024-03-01", &f.employee, &f.thali, 3).await;

    assert_eq!(txn["company_id"].as_str(), Some(f.company.as_str()));
    assert_eq!(txn["quantity"], 3);
    assert_eq!(dec(&txn["unit_price"]), Decimal::from(150));
    assert_eq!(dec(&txn["total_amount"]), Decimal::from(450));
    assert_eq!(txn["price_source"], "food_item_default");

    let balance = app
        .get_json(&format!("/employees/{}/balance", f.employee))
        .await;
    assert_eq!(dec(&balance["total_purchases"]), Decimal::from(450));
    assert_eq!(dec(&balance["outstanding"]), Decimal::from(450));
}

#[tokio::test]
async fn employee_override_beats_company_override() {
    let app = TestApp::spawn().await;
    let f = seed(&app).await;

    app.create(
        "/price-overrides",
        json!({ "food_item_id": f.thali, "company_id": f.company, "price": "120" }),
    )
    .await;

    let resolved = app
        .get_json(&format!(
            "/pricing/resolve?employee_id={}&food_item_id={}",
            f.employee, f.thali
        ))
        .await;
    assert_eq!(dec(&resolved["price"]), Decimal::from(120));
    assert_eq!(resolved["source"], "company_override");

    let personal = app
        .create(
            "/price-overrides",
            json!({ "food_item_id": f.thali, "employee_id": f.employee, "price": "100" }),
        )
        .await;

    let resolved = app
        .get_json(&format!(
            "/pricing/resolve?employee_id={}&food_item_id={}",
            f.employee, f.thali
        ))
        .await;
    assert_eq!(dec(&resolved["price"]), Decimal::from(100));
    assert_eq!(resolved["source"], "employee_override");
    assert_eq!(resolved["override_id"], personal["id"]);

    let txn = app.record_meal("2024-03-01", &f.employee, &f.thali, 2).await;
    assert_eq!(dec(&txn["total_amount"]), Decimal::from(200));
}

#[tokio::test]
async fn company_override_does_not_leak_to_other_companies() {
    let app = TestApp::spawn().await;
    let f = seed(&app).await;
    let other_company = app.create_company("Zenith Labs").await;
    let outsider = app.create_employee(&other_company, "Vikram Singh").await;

    app.create(
        "/price-overrides",
        json!({ "food_item_id": f.thali, "company_id": f.company, "price": "120" }),
    )
    .await;

    let txn = app.record_meal("2024-03-01", &outsider, &f.thali, 1).await;
    assert_eq!(dec(&txn["unit_price"]), Decimal::from(150));
}

#[tokio::test]
async fn explicit_unit_price_wins() {
    let app = TestApp::spawn().await;
    let f = seed(&app).await;

    let recorded = app
        .create(
            "/transactions",
            json!({
                "date": "2024-03-01",
                "entries": [
                    { "employee_id": f.employee, "food_item_id": f.thali, "unit_price": "99.50", "quantity": 2 }
                ]
            }),
        )
        .await;

    assert_eq!(dec(&recorded[0]["total_amount"]), Decimal::new(19900, 2));
    assert!(recorded[0]["price_source"].is_null());
}

#[tokio::test]
async fn unscoped_override_is_rejected() {
    let app = TestApp::spawn().await;
    let f = seed(&app).await;

    let response = app
        .post(
            "/price-overrides",
            &json!({ "food_item_id": f.thali, "price": "90" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let rule = app
        .create(
            "/price-overrides",
            json!({ "food_item_id": f.thali, "company_id": f.company, "price": "120" }),
        )
        .await;
    let response = app
        .patch(
            &format!("/price-overrides/{}", rule["id"].as_str().unwrap()),
            &json!({ "company_id": null }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let stored = app
        .get_json(&format!("/price-overrides/{}", rule["id"].as_str().unwrap()))
        .await;
    assert_eq!(stored, rule);
}

#[tokio::test]
async fn batch_with_unknown_employee_writes_nothing() {
    let app = TestApp::spawn().await;
    let f = seed(&app).await;

    let response = app
        .post(
            "/transactions",
            &json!({
                "date": "2024-03-01",
                "entries": [
                    { "employee_id": f.employee, "food_item_id": f.thali },
                    { "employee_id": Uuid::new_v4(), "food_item_id": f.thali }
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let transactions = app.get_json("/transactions").await;
    assert!(transactions.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn zero_quantity_and_empty_batch_are_rejected() {
    let app = TestApp::spawn().await;
    let f = seed(&app).await;

    let response = app
        .post(
            "/transactions",
            &json!({
                "date": "2024-03-01",
                "entries": [{ "employee_id": f.employee, "food_item_id": f.thali, "quantity": 0 }]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .post("/transactions", &json!({ "date": "2024-03-01", "entries": [] }))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn transactions_filter_by_date_range() {
    let app = TestApp::spawn().await;
    let f = seed(&app).await;

    app.record_meal("2024-02-28", &f.employee, &f.thali, 1).await;
    app.record_meal("2024-03-01", &f.employee, &f.thali, 1).await;
    app.record_meal("2024-03-05", &f.employee, &f.thali, 1).await;

    let march = app
        .get_json("/transactions?from=2024-03-01&to=2024-03-31")
        .await;
    assert_eq!(march.as_array().unwrap().len(), 2);

    let by_employee = app
        .get_json(&format!("/transactions?employee_id={}", f.employee))
        .await;
    assert_eq!(by_employee.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn updating_quantity_recomputes_total() {
    let app = TestApp::spawn().await;
    let f = seed(&app).await;
    let txn = app.record_meal("2024-03-01", &f.employee, &f.thali, 1).await;
    let id = txn["id"].as_str().unwrap();

    let response = app
        .patch(&format!("/transactions/{}", id), &json!({ "quantity": 4 }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated: serde_json::Value = response.json().await.unwrap();
    assert_eq!(dec(&updated["total_amount"]), Decimal::from(600));

    let response = app.delete(&format!("/transactions/{}", id)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = app.get(&format!("/transactions/{}", id)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn resolve_for_unknown_ids_is_not_found() {
    let app = TestApp::spawn().await;
    let f = seed(&app).await;

    let response = app
        .get(&format!(
            "/pricing/resolve?employee_id={}&food_item_id={}",
            Uuid::new_v4(),
            f.thali
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn out_of_range_amounts_are_rejected_without_killing_the_request() {
    let app = TestApp::spawn().await;
    let f = seed(&app).await;

    for entry in [
        json!({
            "employee_id": f.employee,
            "food_item_id": f.thali,
            "quantity": 2,
            "unit_price": "79228162514264337593543950335"
        }),
        json!({ "employee_id": f.employee, "food_item_id": f.thali, "quantity": 1001 }),
        json!({ "employee_id": f.employee, "food_item_id": f.thali, "unit_price": "33.333" }),
    ] {
        let response = app
            .post(
                "/transactions",
                &json!({ "date": "2024-03-01", "entries": [entry] }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    let response = app
        .post(
            "/food-items",
            &json!({ "name": "Gold Thali", "default_price": "10000000000" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let transactions = app.get_json("/transactions").await;
    assert!(transactions.as_array().unwrap().is_empty());
    let dashboard = app.get_json("/dashboard?date=2024-03-01").await;
    assert_eq!(dec(&dashboard["amount_today"]), Decimal::ZERO);
}

#[tokio::test]
async fn largest_allowed_line_is_recorded_exactly() {
    let app = TestApp::spawn().await;
    let f = seed(&app).await;

    let response = app
        .post(
            "/transactions",
            &json!({
                "date": "2024-03-01",
                "entries": [{
                    "employee_id": f.employee,
                    "food_item_id": f.thali,
                    "quantity": 1000,
                    "unit_price": "9999999999.99"
                }]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let outstanding = app.get_json("/reports/outstanding").await;
    assert_eq!(
        dec(&outstanding["total_outstanding"]),
        "9999999999990".parse::<Decimal>().unwrap()
    );
}

#[tokio::test]
async fn malformed_query_gets_json_error() {
    let app = TestApp::spawn().await;

    let response = app.get("/transactions?employee_id=not-a-uuid").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}
