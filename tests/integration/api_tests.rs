//! API integration tests against a running server
//!
//! Run with: cargo test -- --ignored

use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::support::{base_url, client, signed_in_user, unique_username};

#[tokio::test]
#[ignore]
async fn test_health_check() {
    let response = client()
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_visit_counter_counts_up_per_session() {
    let client = client();
    for expected in 1..=3 {
        let body: Value = client
            .get(format!("{}/catalog/", base_url()))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse response");
        assert_eq!(body["num_visits"], expected);
        assert_eq!(body["title_word"], "Warcraft");
    }

    // A fresh client is a fresh session
    let body: Value = self::client()
        .get(format!("{}/catalog/", base_url()))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(body["num_visits"], 1);
}

#[tokio::test]
#[ignore]
async fn test_book_list_is_paginated() {
    let response = client()
        .get(format!("{}/catalog/books/", base_url()))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].as_array().map(|a| a.len() <= 10).unwrap_or(false));

    let response = client()
        .get(format!("{}/catalog/books/?page=9999", base_url()))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_librarian_domain_grants_borrowed_list() {
    let (librarian, _) = signed_in_user("lib.com").await;
    let response = librarian
        .get(format!("{}/catalog/borrowed/", base_url()))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let (patron, _) = signed_in_user("example.org").await;
    let response = patron
        .get(format!("{}/catalog/borrowed/", base_url()))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = patron
        .get(format!("{}/catalog/mybooks/", base_url()))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["total"], 0);
}

#[tokio::test]
#[ignore]
async fn test_unknown_activation_is_not_found() {
    let response = client()
        .get(format!("{}/catalog/activate/{}", base_url(), Uuid::new_v4()))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_inactive_account_cannot_log_in() {
    let client = client();
    let username = unique_username("pending");
    let response = client
        .post(format!("{}/catalog/register/", base_url()))
        .json(&json!({
            "username": username,
            "email": "pending@example.org",
            "password1": "integration-pass-1",
            "password2": "integration-pass-1"
        }))
        .send()
        .await
        .expect("Failed to send registration");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .post(format!("{}/accounts/login/", base_url()))
        .json(&json!({ "username": username, "password": "integration-pass-1" }))
        .send()
        .await
        .expect("Failed to send login");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_author_create_then_delete() {
    let (librarian, _) = signed_in_user("lib.com").await;

    let response = librarian
        .post(format!("{}/catalog/author/create/", base_url()))
        .json(&json!({ "first_name": "Ursula", "last_name": "Le Guin", "date_of_birth": "1929-10-21" }))
        .send()
        .await
        .expect("Failed to create author");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let author_path = response.headers()["location"].to_str().unwrap().to_string();
    let author_id: i32 = author_path.rsplit('/').next().unwrap().parse().unwrap();

    let response = librarian
        .post(format!("{}/catalog/author/{}/delete/", base_url(), author_id))
        .send()
        .await
        .expect("Failed to delete author");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/catalog/authors/");

    let response = librarian
        .get(format!("{}{}", base_url(), author_path))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
