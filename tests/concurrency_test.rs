//! Concurrent writers against one on-disk database.
//!
//! Several threads post categorized transactions to the same budget item at
//! once. Every increment must land.

use std::thread;

use chrono::NaiveDate;
use envelope::config::SpentConvention;
use envelope::db::queries::{accounts, categories, users};
use envelope::db::{create_pool, migrations};
use envelope::models::{AccountType, NewAccount, NewCategory, NewTransaction, NewUser};
use envelope::month::YearMonth;
use envelope::services::{budget, posting};
use std::path::Path;

const THREADS: i64 = 6;
const POSTS_PER_THREAD: i64 = 20;

#[test]
fn test_concurrent_postings_do_not_lose_updates() {
    let dir = tempfile::tempdir().unwrap();
    let pool = create_pool(&dir.path().join("budget.db")).unwrap();

    let (user_id, category_id, account_id) = {
        let conn = pool.get().unwrap();
        migrations::run_migrations(&conn, Path::new("migrations")).unwrap();
        let user_id = users::create_user(
            &conn,
            &NewUser {
                email: "race@example.com".into(),
                password_hash: "x".into(),
                name: None,
            },
        )
        .unwrap();
        let category_id = categories::create_category(
            &conn,
            user_id,
            &NewCategory {
                name: "Groceries".into(),
                group: "Essentials".into(),
            },
        )
        .unwrap();
        let account_id = accounts::create_account(
            &conn,
            user_id,
            &NewAccount {
                name: "Checking".into(),
                account_type: AccountType::Checking,
                balance: 0,
            },
        )
        .unwrap();
        (user_id, category_id, account_id)
    };

    let date = NaiveDate::from_ymd_opt(2024, 8, 15).unwrap();
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let pool = pool.clone();
            thread::spawn(move || {
                let mut conn = pool.get().unwrap();
                for i in 0..POSTS_PER_THREAD {
                    let new_transaction = NewTransaction {
                        account_id,
                        category_id: Some(category_id),
                        amount: -(t * 100 + i + 1),
                        description: format!("thread {t} post {i}"),
                        date,
                    };
                    posting::post_transaction(
                        &mut conn,
                        user_id,
                        &new_transaction,
                        SpentConvention::Signed,
                    )
                    .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let expected: i64 = (0..THREADS)
        .flat_map(|t| (0..POSTS_PER_THREAD).map(move |i| -(t * 100 + i + 1)))
        .sum();

    let conn = pool.get().unwrap();
    let month = YearMonth::from_date(date);
    let figures = budget::resolve_item(&conn, user_id, month, category_id)
        .unwrap()
        .figures();
    assert_eq!(figures.spent, expected);
    assert_eq!(figures.available, -expected);

    let balance = accounts::get_account(&conn, account_id)
        .unwrap()
        .unwrap()
        .balance;
    assert_eq!(balance, expected);

    let months: i64 = conn
        .query_row("SELECT COUNT(*) FROM budget_months", [], |row| row.get(0))
        .unwrap();
    assert_eq!(months, 1);
}
