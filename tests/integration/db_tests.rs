//! Tests that seed rows directly and check them through the running server
//!
//! Run with: cargo test -- --ignored

use chrono::{Duration, Local};
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::support::{
    base_url, client, db, due_back, remove_book, seed_book, seed_loan, signed_in_user, user_id,
};

#[tokio::test]
#[ignore]
async fn test_my_borrowed_lists_only_own_loans() {
    let pool = db().await;
    let (holder, holder_name) = signed_in_user("example.org").await;
    let (other, _) = signed_in_user("example.org").await;

    let today = Local::now().date_naive();
    let book_id = seed_book(&pool, "Loan Visibility", None).await;
    let instance_id =
        seed_loan(&pool, book_id, user_id(&pool, &holder_name).await, today + Duration::days(5)).await;

    let body: Value = holder
        .get(format!("{}/catalog/mybooks/", base_url()))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["id"], instance_id.to_string());
    assert_eq!(body["items"][0]["is_overdue"], false);

    let body: Value = other
        .get(format!("{}/catalog/mybooks/", base_url()))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(body["total"], 0);

    // The public book page shows the copy but not who has it
    let body: Value = client()
        .get(format!("{}/catalog/book/{}", base_url(), book_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(body["instances"][0]["status"], "on_loan");
    assert!(body["instances"][0].get("borrower_id").is_none());

    remove_book(&pool, book_id).await;
}

#[tokio::test]
#[ignore]
async fn test_deleting_author_keeps_their_books() {
    let pool = db().await;
    let (librarian, _) = signed_in_user("lib.com").await;

    let author_id: i32 = sqlx::query_scalar(
        "INSERT INTO authors (first_name, last_name) VALUES ('Mary', 'Shelley') RETURNING id",
    )
    .fetch_one(&pool)
    .await
    .expect("Failed to insert author");
    let book_id = seed_book(&pool, "Frankenstein", Some(author_id)).await;

    let response = librarian
        .post(format!("{}/catalog/author/{}/delete/", base_url(), author_id))
        .send()
        .await
        .expect("Failed to delete author");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/catalog/authors/");

    let stored: Option<i32> = sqlx::query_scalar("SELECT author_id FROM books WHERE id = $1")
        .bind(book_id)
        .fetch_one(&pool)
        .await
        .expect("Book was deleted with its author");
    assert_eq!(stored, None);

    remove_book(&pool, book_id).await;
}

#[tokio::test]
#[ignore]
async fn test_renewal_stores_new_due_date() {
    let pool = db().await;
    let (librarian, _) = signed_in_user("lib.com").await;
    let (_, patron_name) = signed_in_user("example.org").await;

    let today = Local::now().date_naive();
    let first_due = today + Duration::days(2);
    let book_id = seed_book(&pool, "Renewal Target", None).await;
    let instance_id =
        seed_loan(&pool, book_id, user_id(&pool, &patron_name).await, first_due).await;
    let renew_url = format!("{}/catalog/book/{}/renew/", base_url(), instance_id);

    let too_far = today + Duration::days(29);
    let response = librarian
        .post(&renew_url)
        .json(&json!({ "renewal_date": too_far.format("%Y-%m-%d").to_string() }))
        .send()
        .await
        .expect("Failed to send renewal");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(due_back(&pool, instance_id).await, Some(first_due));

    let renewed = today + Duration::days(14);
    let response = librarian
        .post(&renew_url)
        .json(&json!({ "renewal_date": renewed.format("%Y-%m-%d").to_string() }))
        .send()
        .await
        .expect("Failed to send renewal");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/catalog/borrowed/");
    assert_eq!(due_back(&pool, instance_id).await, Some(renewed));

    remove_book(&pool, book_id).await;
}
