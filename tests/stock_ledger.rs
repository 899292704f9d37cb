//! Livro-razão de estoque: cada movimentação ajusta o saldo e grava
//! saldo anterior/novo na mesma transação.

mod common;

use std::sync::Arc;

use atk_backend::common::error::AppError;
use atk_backend::config::NegativeStockPolicy;
use atk_backend::models::inventory::{NewStockTransaction, TransactionKind};
use atk_backend::services::inventory_service::REFERENCE_INITIAL;
use atk_backend::services::rbac_service::AllowAll;
use common::{count_transactions, current_stock, seed_item, test_state, test_state_with};
use sqlx::PgPool;
use uuid::Uuid;

fn movement(item_id: Uuid, kind: TransactionKind, quantity: i32) -> NewStockTransaction {
    NewStockTransaction {
        item_id,
        transaction_type: kind,
        quantity,
        reference_type: None,
        reference_id: None,
        notes: None,
        created_by: "gudang".to_string(),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn create_item_posts_initial_stock_as_in(pool: PgPool) {
    let state = test_state(pool.clone());
    let item = seed_item(&state, "ATK-001", 100).await;

    assert_eq!(item.stock, 100);

    let ledger = state.inventory_service.list_transactions(Some(item.id)).await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].transaction_type, TransactionKind::In);
    assert_eq!(ledger[0].previous_stock, 0);
    assert_eq!(ledger[0].new_stock, 100);
    assert_eq!(ledger[0].reference_type.as_deref(), Some(REFERENCE_INITIAL));
    assert_eq!(ledger[0].created_by, "seed");
}

#[sqlx::test(migrations = "./migrations")]
async fn create_item_without_stock_leaves_ledger_empty(pool: PgPool) {
    let state = test_state(pool.clone());
    let item = seed_item(&state, "ATK-002", 0).await;

    assert_eq!(item.stock, 0);
    assert_eq!(count_transactions(&pool, item.id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn in_and_out_move_the_balance(pool: PgPool) {
    let state = test_state(pool.clone());
    let item = seed_item(&state, "ATK-010", 10).await;

    let entry = state
        .inventory_service
        .record_transaction(&state.db_pool, &movement(item.id, TransactionKind::In, 5))
        .await
        .unwrap();
    assert_eq!((entry.previous_stock, entry.new_stock), (10, 15));

    let exit = state
        .inventory_service
        .record_transaction(&state.db_pool, &movement(item.id, TransactionKind::Out, 12))
        .await
        .unwrap();
    assert_eq!((exit.previous_stock, exit.new_stock), (15, 3));

    assert_eq!(current_stock(&pool, item.id).await, 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn adjustment_and_stocktake_set_the_balance(pool: PgPool) {
    let state = test_state(pool.clone());
    let item = seed_item(&state, "ATK-011", 40).await;

    let adjusted = state
        .inventory_service
        .record_transaction(&state.db_pool, &movement(item.id, TransactionKind::Adjustment, 25))
        .await
        .unwrap();
    assert_eq!((adjusted.previous_stock, adjusted.new_stock), (40, 25));

    let counted = state
        .inventory_service
        .record_transaction(&state.db_pool, &movement(item.id, TransactionKind::Stocktake, 0))
        .await
        .unwrap();
    assert_eq!((counted.previous_stock, counted.new_stock), (25, 0));

    assert_eq!(current_stock(&pool, item.id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn ledger_chains_previous_to_new(pool: PgPool) {
    let state = test_state(pool.clone());
    let item = seed_item(&state, "ATK-012", 20).await;

    for (kind, qty) in [
        (TransactionKind::Out, 3),
        (TransactionKind::In, 10),
        (TransactionKind::Adjustment, 7),
        (TransactionKind::Out, 2),
    ] {
        state
            .inventory_service
            .record_transaction(&state.db_pool, &movement(item.id, kind, qty))
            .await
            .unwrap();
    }

    // Mais recentes primeiro; invertendo, cada saldo novo é o anterior do próximo
    let mut ledger = state.inventory_service.list_transactions(Some(item.id)).await.unwrap();
    ledger.reverse();
    assert_eq!(ledger.len(), 5);
    for pair in ledger.windows(2) {
        assert_eq!(pair[0].new_stock, pair[1].previous_stock);
    }
    assert_eq!(ledger.last().unwrap().new_stock, current_stock(&pool, item.id).await);
    assert_eq!(current_stock(&pool, item.id).await, 5);
}

#[sqlx::test(migrations = "./migrations")]
async fn out_below_zero_is_recorded_under_warn_policy(pool: PgPool) {
    let state = test_state(pool.clone());
    let item = seed_item(&state, "ATK-020", 3).await;

    let exit = state
        .inventory_service
        .record_transaction(&state.db_pool, &movement(item.id, TransactionKind::Out, 5))
        .await
        .unwrap();

    assert_eq!((exit.previous_stock, exit.new_stock), (3, -2));
    assert_eq!(current_stock(&pool, item.id).await, -2);
}

#[sqlx::test(migrations = "./migrations")]
async fn out_below_zero_is_refused_under_reject_policy(pool: PgPool) {
    let state = test_state_with(pool.clone(), NegativeStockPolicy::Reject, Arc::new(AllowAll));
    let item = seed_item(&state, "ATK-021", 3).await;

    let err = state
        .inventory_service
        .record_transaction(&state.db_pool, &movement(item.id, TransactionKind::Out, 5))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InsufficientStock { available: 3, requested: 5, .. }));
    assert_eq!(current_stock(&pool, item.id).await, 3);
    assert_eq!(count_transactions(&pool, item.id).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn failed_ledger_insert_keeps_stock_untouched(pool: PgPool) {
    let state = test_state(pool.clone());
    let item = seed_item(&state, "ATK-030", 50).await;

    // created_by acima de VARCHAR(100): o UPDATE do saldo passa, o INSERT falha
    let mut input = movement(item.id, TransactionKind::Out, 10);
    input.created_by = "x".repeat(500);

    let err = state
        .inventory_service
        .record_transaction(&state.db_pool, &input)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::DatabaseError(_)));
    assert_eq!(current_stock(&pool, item.id).await, 50);
    assert_eq!(count_transactions(&pool, item.id).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn unknown_item_is_not_found(pool: PgPool) {
    let state = test_state(pool.clone());
    let missing = Uuid::new_v4();

    let err = state
        .inventory_service
        .record_transaction(&state.db_pool, &movement(missing, TransactionKind::In, 1))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ItemNotFound(id) if id == missing));
}

#[sqlx::test(migrations = "./migrations")]
async fn negative_quantity_is_invalid(pool: PgPool) {
    let state = test_state(pool.clone());
    let item = seed_item(&state, "ATK-031", 5).await;

    let err = state
        .inventory_service
        .record_transaction(&state.db_pool, &movement(item.id, TransactionKind::In, -1))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidQuantity(-1)));
    assert_eq!(count_transactions(&pool, item.id).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn low_stock_lists_active_items_at_or_below_minimum(pool: PgPool) {
    let state = test_state(pool.clone());
    let low = seed_item(&state, "ATK-040", 2).await;
    let at_min = seed_item(&state, "ATK-041", 5).await;
    seed_item(&state, "ATK-042", 50).await;

    let items = state.inventory_service.list_low_stock().await.unwrap();
    let ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();

    assert_eq!(ids, vec![low.id, at_min.id]);
    assert!(items.iter().all(|i| i.is_low_stock()));
}

#[sqlx::test(migrations = "./migrations")]
async fn item_with_movements_cannot_be_deleted(pool: PgPool) {
    let state = test_state(pool.clone());
    let used = seed_item(&state, "ATK-050", 10).await;
    let unused = seed_item(&state, "ATK-051", 0).await;

    let err = state
        .inventory_service
        .delete_item(&state.db_pool, used.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ItemInUse(_)));

    state.inventory_service.delete_item(&state.db_pool, unused.id).await.unwrap();
    assert!(matches!(
        state.inventory_service.get_item(&state.db_pool, unused.id).await,
        Err(AppError::ItemNotFound(_))
    ));
}

#[sqlx::test(migrations = "./migrations")]
async fn balance_beyond_i32_is_refused_without_writing(pool: PgPool) {
    let state = test_state(pool.clone());
    let item = seed_item(&state, "ATK-060", 10).await;

    let err = state
        .inventory_service
        .record_transaction(&state.db_pool, &movement(item.id, TransactionKind::In, i32::MAX))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::StockOutOfRange { previous: 10, quantity: i32::MAX, .. }
    ));
    assert_eq!(current_stock(&pool, item.id).await, 10);
    assert_eq!(count_transactions(&pool, item.id).await, 1);

    // Saldo negativo (política warn) e uma saída enorme: mesmo erro
    state
        .inventory_service
        .record_transaction(&state.db_pool, &movement(item.id, TransactionKind::Out, 12))
        .await
        .unwrap();
    let err = state
        .inventory_service
        .record_transaction(&state.db_pool, &movement(item.id, TransactionKind::Out, i32::MAX))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::StockOutOfRange { previous: -2, .. }));
    assert_eq!(current_stock(&pool, item.id).await, -2);
    assert_eq!(count_transactions(&pool, item.id).await, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_outs_serialize_on_the_item_row(pool: PgPool) {
    const WORKERS: i32 = 20;

    let state = test_state(pool.clone());
    let item = seed_item(&state, "ATK-070", 1000).await;

    let handles: Vec<_> = (0..WORKERS)
        .map(|_| {
            let state = state.clone();
            let input = movement(item.id, TransactionKind::Out, 1);
            tokio::spawn(async move {
                state.inventory_service.record_transaction(&state.db_pool, &input).await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(current_stock(&pool, item.id).await, 1000 - WORKERS);

    // now() é o início de cada transação, então a ordem vem do próprio saldo
    let mut outs: Vec<_> = state
        .inventory_service
        .list_transactions(Some(item.id))
        .await
        .unwrap()
        .into_iter()
        .filter(|t| t.transaction_type == TransactionKind::Out)
        .collect();
    outs.sort_by_key(|t| std::cmp::Reverse(t.previous_stock));

    assert_eq!(outs.len(), WORKERS as usize);
    let previous: Vec<i32> = outs.iter().map(|t| t.previous_stock).collect();
    assert_eq!(previous, (1000 - WORKERS + 1..=1000).rev().collect::<Vec<_>>());
    assert!(outs.iter().all(|t| t.new_stock == t.previous_stock - 1));
}
