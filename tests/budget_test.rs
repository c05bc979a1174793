//! Integration tests for the monthly budget endpoints.

mod common;

use axum::http::StatusCode;
use common::TestClient;
use serde_json::json;

/// Assigning $100 shows up as amount = available = 10000 on read.
#[tokio::test]
async fn test_assign_then_read() {
    let client = TestClient::new();
    let token = client.signup("alice@example.com").await;
    let cat = client.create_category(&token, "Groceries").await;

    let item = client.assign(&token, "2024-01", cat, 10000).await;
    assert_eq!(item["categoryId"], cat);
    assert_eq!(item["amount"], 10000);

    let entry = client.budget_entry(&token, "2024-01", cat).await.unwrap();
    assert_eq!(entry["amount"], 10000);
    assert_eq!(entry["spent"], 0);
    assert_eq!(entry["available"], 10000);
    assert_eq!(entry["category"]["name"], "Groceries");
    assert_eq!(entry["category"]["group"], "Essentials");
}

/// Repeated assignments keep only the last value.
#[tokio::test]
async fn test_reassign_overwrites_amount() {
    let client = TestClient::new();
    let token = client.signup("alice@example.com").await;
    let cat = client.create_category(&token, "Groceries").await;

    client.assign(&token, "2024-01", cat, 10000).await;
    client.assign(&token, "2024-01", cat, 4000).await;
    client.assign(&token, "2024-01", cat, 4000).await;

    let (_, body) = client.get("/budget/2024-01", &token).await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["amount"], 4000);
    assert_eq!(entries[0]["available"], 4000);
}

/// Categories with no budget item in a month are omitted, not zero-filled.
#[tokio::test]
async fn test_read_omits_untouched_categories() {
    let client = TestClient::new();
    let token = client.signup("alice@example.com").await;
    let used = client.create_category(&token, "Rent").await;
    let unused = client.create_category(&token, "Travel").await;

    client.assign(&token, "2024-01", used, 90000).await;

    assert!(client.budget_entry(&token, "2024-01", used).await.is_some());
    assert!(client.budget_entry(&token, "2024-01", unused).await.is_none());

    let (status, body) = client.get("/budget/2031-07", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

/// A categorized outflow accumulates signed into spent and raises available.
#[tokio::test]
async fn test_outflow_accumulates_signed_spent() {
    let client = TestClient::new();
    let token = client.signup("alice@example.com").await;
    let cat = client.create_category(&token, "Groceries").await;
    let acct = client.create_account(&token, "Checking", 0).await;

    client.assign(&token, "2024-01", cat, 10000).await;
    client
        .post_transaction(&token, acct, Some(cat), -2500, "2024-01-15")
        .await;

    let entry = client.budget_entry(&token, "2024-01", cat).await.unwrap();
    assert_eq!(entry["amount"], 10000);
    assert_eq!(entry["spent"], -2500);
    assert_eq!(entry["available"], 12500);
}

/// Rolling over moves the positive available into the next month.
#[tokio::test]
async fn test_rollover_scenario() {
    let client = TestClient::new();
    let token = client.signup("alice@example.com").await;
    let cat = client.create_category(&token, "Groceries").await;
    let acct = client.create_account(&token, "Checking", 0).await;

    client.assign(&token, "2024-01", cat, 10000).await;
    client
        .post_transaction(&token, acct, Some(cat), -2500, "2024-01-15")
        .await;
    client.assign(&token, "2024-02", cat, 500).await;

    let (status, body) = client
        .post("/budget/2024-01/rollover", &token, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("2024-02"));
    assert_eq!(body["to"], "2024-02");
    assert_eq!(body["total"], 12500);

    let feb = client.budget_entry(&token, "2024-02", cat).await.unwrap();
    assert_eq!(feb["amount"], 500);
    assert_eq!(feb["available"], 500 + 12500);

    let jan = client.budget_entry(&token, "2024-01", cat).await.unwrap();
    assert_eq!(jan["available"], 12500);
}

/// Only positive balances move; overspent categories stay behind.
#[tokio::test]
async fn test_rollover_skips_non_positive_available() {
    let client = TestClient::new();
    let token = client.signup("alice@example.com").await;
    let food = client.create_category(&token, "Food").await;
    let fun = client.create_category(&token, "Fun").await;
    let zero = client.create_category(&token, "Zero").await;
    let acct = client.create_account(&token, "Checking", 0).await;

    client.assign(&token, "2024-03", food, 3000).await;
    client.assign(&token, "2024-03", fun, 1000).await;
    client
        .post_transaction(&token, acct, Some(fun), 1500, "2024-03-09")
        .await;
    client.assign(&token, "2024-03", zero, 0).await;

    let (status, body) = client
        .post("/budget/2024-03/rollover", &token, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3000);
    assert_eq!(body["carried"].as_array().unwrap().len(), 1);

    assert_eq!(
        client.budget_entry(&token, "2024-04", food).await.unwrap()["available"],
        3000
    );
    assert!(client.budget_entry(&token, "2024-04", fun).await.is_none());
    assert!(client.budget_entry(&token, "2024-04", zero).await.is_none());

    let fun_march = client.budget_entry(&token, "2024-03", fun).await.unwrap();
    assert_eq!(fun_march["available"], -500);
}

/// December rolls into January of the following year.
#[tokio::test]
async fn test_rollover_december() {
    let client = TestClient::new();
    let token = client.signup("alice@example.com").await;
    let cat = client.create_category(&token, "Gifts").await;

    client.assign(&token, "2023-12", cat, 2000).await;
    let (status, body) = client
        .post("/budget/2023-12/rollover", &token, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["to"], "2024-01");

    let jan = client.budget_entry(&token, "2024-01", cat).await.unwrap();
    assert_eq!(jan["available"], 2000);
}

/// Rolling over the same month twice carries the amount twice.
#[tokio::test]
async fn test_rollover_twice_doubles_destination() {
    let client = TestClient::new();
    let token = client.signup("alice@example.com").await;
    let cat = client.create_category(&token, "Groceries").await;

    client.assign(&token, "2024-01", cat, 12500).await;

    let (_, first) = client
        .post("/budget/2024-01/rollover", &token, json!({}))
        .await;
    let (status, second) = client
        .post("/budget/2024-01/rollover", &token, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["repeated"], false);
    assert_eq!(second["repeated"], true);

    let feb = client.budget_entry(&token, "2024-02", cat).await.unwrap();
    assert_eq!(feb["available"], 25000);
}

#[tokio::test]
async fn test_rollover_missing_month_is_404() {
    let client = TestClient::new();
    let token = client.signup("alice@example.com").await;

    let (status, body) = client
        .post("/budget/2024-01/rollover", &token, json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("2024-01"));
}

#[tokio::test]
async fn test_malformed_month_is_400() {
    let client = TestClient::new();
    let token = client.signup("alice@example.com").await;
    let cat = client.create_category(&token, "Groceries").await;

    for month in ["2024-13", "2024-1", "january", "2024-01-01"] {
        let (status, _) = client.get(&format!("/budget/{}", month), &token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "GET accepted {month}");

        let (status, _) = client
            .post(
                &format!("/budget/{}/categories/{}", month, cat),
                &token,
                json!({ "amount": 100 }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "assign accepted {month}");
    }
}

#[tokio::test]
async fn test_non_integer_amount_is_400() {
    let client = TestClient::new();
    let token = client.signup("alice@example.com").await;
    let cat = client.create_category(&token, "Groceries").await;
    let uri = format!("/budget/2024-01/categories/{}", cat);

    let (status, body) = client.post(&uri, &token, json!({ "amount": 12.5 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = client.post(&uri, &token, json!({ "amount": "100" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = client.post(&uri, &token, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(client.post_raw(&uri, &token, "{not json").await, StatusCode::BAD_REQUEST);

    assert!(client.budget_entry(&token, "2024-01", cat).await.is_none());
}

#[tokio::test]
async fn test_assign_unknown_category_is_404() {
    let client = TestClient::new();
    let token = client.signup("alice@example.com").await;

    let (status, _) = client
        .post("/budget/2024-01/categories/4242", &token, json!({ "amount": 100 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_assign_extreme_amount_is_400() {
    let client = TestClient::new();
    let token = client.signup("alice@example.com").await;
    let cat = client.create_category(&token, "Groceries").await;
    let uri = format!("/budget/2024-01/categories/{}", cat);

    for amount in [i64::MIN, i64::MAX] {
        let (status, _) = client.post(&uri, &token, json!({ "amount": amount })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {amount}");
    }
    assert!(client.budget_entry(&token, "2024-01", cat).await.is_none());
}

/// December 9999 has no following month that could ever be read back.
#[tokio::test]
async fn test_rollover_of_year_9999_is_400() {
    let client = TestClient::new();
    let token = client.signup("alice@example.com").await;
    let cat = client.create_category(&token, "Groceries").await;

    client.assign(&token, "9999-12", cat, 500).await;
    let (status, body) = client
        .post("/budget/9999-12/rollover", &token, json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("9999-12"));

    let entry = client.budget_entry(&token, "9999-12", cat).await.unwrap();
    assert_eq!(entry["available"], 500);
}
