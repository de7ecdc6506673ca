mod common;

use chrono::Utc;
use rust_decimal::Decimal;

use tradelog::services::ledger::{self, CreateTradeRequest, UpdateTradeRequest};

fn d(v: i64) -> Decimal {
    Decimal::from(v)
}

fn new_trade(account_id: i64, returns: Option<Decimal>) -> CreateTradeRequest {
    CreateTradeRequest {
        account_id,
        symbol: "BTCUSD".into(),
        entry_date: Utc::now(),
        entry_price: Decimal::new(650005, 1),
        exit_price: None,
        size: Decimal::ONE,
        side: tradelog::models::Side::Buy,
        duration: None,
        returns,
        notes: None,
        setup_strategy_id: None,
        entry_type_id: None,
    }
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn test_create_and_delete_restores_balance() {
    let pool = common::setup_test_db().await;
    let user = common::seed_user(&pool, "ledger_user", "tok_ledger").await;
    let account = common::seed_account(&pool, user.id, "Main", d(1000)).await;

    let trade = ledger::create_trade(&pool, user.id, &new_trade(account.id, Some(d(50))))
        .await
        .unwrap();

    assert_eq!(common::account_balance(&pool, account.id).await, d(1050));
    assert_eq!(trade.current_balance_after_trade, Some(d(1050)));

    ledger::delete_trade(&pool, user.id, trade.id).await.unwrap();
    assert_eq!(common::account_balance(&pool, account.id).await, d(1000));
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn test_update_applies_returns_delta() {
    let pool = common::setup_test_db().await;
    let user = common::seed_user(&pool, "ledger_user2", "tok_ledger2").await;
    let account = common::seed_account(&pool, user.id, "Main", d(1000)).await;

    let trade = ledger::create_trade(&pool, user.id, &new_trade(account.id, Some(d(50))))
        .await
        .unwrap();
    assert_eq!(common::account_balance(&pool, account.id).await, d(1050));

    // 50 → -20 must move the balance by -70, not by -20.
    let update = UpdateTradeRequest {
        returns: Some(Some(d(-20))),
        ..Default::default()
    };
    ledger::update_trade(&pool, user.id, trade.id, &update)
        .await
        .unwrap();

    assert_eq!(common::account_balance(&pool, account.id).await, d(980));
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn test_open_trade_leaves_balance_untouched() {
    let pool = common::setup_test_db().await;
    let user = common::seed_user(&pool, "ledger_user3", "tok_ledger3").await;
    let account = common::seed_account(&pool, user.id, "Main", d(500)).await;

    let trade = ledger::create_trade(&pool, user.id, &new_trade(account.id, None))
        .await
        .unwrap();

    assert_eq!(common::account_balance(&pool, account.id).await, d(500));

    // Closing the trade applies the full P&L.
    let update = UpdateTradeRequest {
        returns: Some(Some(d(125))),
        ..Default::default()
    };
    ledger::update_trade(&pool, user.id, trade.id, &update)
        .await
        .unwrap();
    assert_eq!(common::account_balance(&pool, account.id).await, d(625));

    // Re-opening reverts it.
    let reopen = UpdateTradeRequest {
        returns: Some(None),
        ..Default::default()
    };
    ledger::update_trade(&pool, user.id, trade.id, &reopen)
        .await
        .unwrap();
    assert_eq!(common::account_balance(&pool, account.id).await, d(500));
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn test_balance_invariant_over_mixed_sequence() {
    let pool = common::setup_test_db().await;
    let user = common::seed_user(&pool, "ledger_user4", "tok_ledger4").await;
    let account = common::seed_account(&pool, user.id, "Main", d(2000)).await;

    let t1 = ledger::create_trade(&pool, user.id, &new_trade(account.id, Some(d(100))))
        .await
        .unwrap();
    let t2 = ledger::create_trade(&pool, user.id, &new_trade(account.id, Some(d(-40))))
        .await
        .unwrap();
    ledger::create_trade(&pool, user.id, &new_trade(account.id, Some(d(0))))
        .await
        .unwrap();

    assert_eq!(common::account_balance(&pool, account.id).await, d(2060));

    ledger::delete_trade(&pool, user.id, t2.id).await.unwrap();
    assert_eq!(common::account_balance(&pool, account.id).await, d(2100));

    let update = UpdateTradeRequest {
        returns: Some(Some(d(10))),
        ..Default::default()
    };
    ledger::update_trade(&pool, user.id, t1.id, &update)
        .await
        .unwrap();

    // initial 2000 + 10 + 0 = 2010
    assert_eq!(common::account_balance(&pool, account.id).await, d(2010));
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn test_foreign_account_reads_as_not_found() {
    let pool = common::setup_test_db().await;
    let owner = common::seed_user(&pool, "ledger_owner", "tok_owner").await;
    let intruder = common::seed_user(&pool, "ledger_intruder", "tok_intruder").await;
    let account = common::seed_account(&pool, owner.id, "Private", d(1000)).await;

    let err = ledger::create_trade(&pool, intruder.id, &new_trade(account.id, Some(d(5))))
        .await
        .unwrap_err();

    assert!(matches!(err, tradelog::errors::AppError::NotFound(_)));
    assert_eq!(common::account_balance(&pool, account.id).await, d(1000));
}
