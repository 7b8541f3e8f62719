//! Integration tests against a live Postgres.
//!
//! Point `DATABASE_URL` at a scratch database and run
//! `cargo test -p custodia-store -- --ignored`.

use alloy_primitives::keccak256;
use custodia_primitives::{DispatchStatus, KeyPair, OtxType};
use custodia_store::{NewOtx, Pg};
use std::collections::BTreeSet;
use uuid::Uuid;

async fn connect() -> Pg {
    let dsn = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a scratch db");
    Pg::connect(&dsn, 10).await.expect("connect and migrate")
}

fn new_otx(tracking_id: Uuid, account: alloy_primitives::Address, nonce: u64) -> NewOtx {
    NewOtx {
        tracking_id,
        otx_type: OtxType::TokenTransfer,
        signer_account: account,
        raw_tx: format!("0x02{nonce:062x}"),
        tx_hash: keccak256(format!("{tracking_id}:{account}:{nonce}")),
        nonce,
    }
}

#[tokio::test]
#[ignore = "requires a live postgres"]
async fn concurrent_nonce_acquires_are_gapless() {
    let store = connect().await;
    let account = KeyPair::generate().public_address;

    let mut handles = Vec::new();
    for _ in 0..50 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let mut tx = store.begin().await.unwrap();
            let nonce = store.acquire_nonce(&mut tx, account).await.unwrap();
            tx.commit().await.unwrap();
            nonce
        }));
    }

    let mut allocated = BTreeSet::new();
    for handle in handles {
        assert!(allocated.insert(handle.await.unwrap()), "duplicate nonce");
    }
    let expected: BTreeSet<u64> = (0..50).collect();
    assert_eq!(allocated, expected);
}

#[tokio::test]
#[ignore = "requires a live postgres"]
async fn aborted_transaction_releases_the_nonce() {
    let store = connect().await;
    let account = KeyPair::generate().public_address;

    let mut tx = store.begin().await.unwrap();
    assert_eq!(store.acquire_nonce(&mut tx, account).await.unwrap(), 0);
    drop(tx); // rollback

    let mut tx = store.begin().await.unwrap();
    assert_eq!(store.acquire_nonce(&mut tx, account).await.unwrap(), 0);
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    assert_eq!(store.peek_nonce(&mut tx, account).await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires a live postgres"]
async fn terminal_statuses_are_never_overwritten() {
    let store = connect().await;
    let account = KeyPair::generate().public_address;
    let tracking_id = Uuid::new_v4();

    let mut tx = store.begin().await.unwrap();
    let otx_id = store.insert_otx(&mut tx, &new_otx(tracking_id, account, 0)).await.unwrap();
    store.insert_dispatch(&mut tx, otx_id, DispatchStatus::Pending).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    assert!(store.update_dispatch(&mut tx, otx_id, DispatchStatus::Success).await.unwrap());
    // A redelivered confirmation is a no-op, not an error.
    assert!(!store.update_dispatch(&mut tx, otx_id, DispatchStatus::Success).await.unwrap());
    assert!(!store.update_dispatch(&mut tx, otx_id, DispatchStatus::Reverted).await.unwrap());
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let sequence = store.get_otx_by_tracking_id(&mut tx, tracking_id).await.unwrap();
    assert_eq!(sequence.len(), 1);
    assert_eq!(sequence[0].status, DispatchStatus::Success);
}

#[tokio::test]
#[ignore = "requires a live postgres"]
async fn one_live_otx_per_account_and_nonce() {
    let store = connect().await;
    let account = KeyPair::generate().public_address;
    let tracking_id = Uuid::new_v4();

    let mut tx = store.begin().await.unwrap();
    let first = store.insert_otx(&mut tx, &new_otx(tracking_id, account, 7)).await.unwrap();
    store.insert_dispatch(&mut tx, first, DispatchStatus::Pending).await.unwrap();
    tx.commit().await.unwrap();

    // Same (account, nonce) while the first is live: rejected.
    let mut tx = store.begin().await.unwrap();
    assert!(store.insert_otx(&mut tx, &new_otx(tracking_id, account, 7)).await.is_err());
    drop(tx);

    // After flagging the first replaced, the re-issue lands.
    let mut tx = store.begin().await.unwrap();
    store.mark_replaced(&mut tx, first).await.unwrap();
    let second = store.insert_otx(&mut tx, &new_otx(tracking_id, account, 7)).await.unwrap();
    store.insert_dispatch(&mut tx, second, DispatchStatus::Pending).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let sequence = store.get_otx_by_tracking_id(&mut tx, tracking_id).await.unwrap();
    assert_eq!(sequence.len(), 2);
    assert!(sequence.iter().any(|otx| otx.replaced));
}

#[tokio::test]
#[ignore = "requires a live postgres"]
async fn account_pagination_windows() {
    let store = connect().await;
    let account = KeyPair::generate().public_address;
    let tracking_id = Uuid::new_v4();

    let mut tx = store.begin().await.unwrap();
    let mut ids = Vec::new();
    for nonce in 0..5 {
        let id = store.insert_otx(&mut tx, &new_otx(tracking_id, account, nonce)).await.unwrap();
        store.insert_dispatch(&mut tx, id, DispatchStatus::Pending).await.unwrap();
        ids.push(id);
    }
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();

    // First page is the newest slice, descending.
    let first = store.get_otx_by_account(&mut tx, account, 2).await.unwrap();
    assert_eq!(first.iter().map(|o| o.id).collect::<Vec<_>>(), vec![ids[4], ids[3]]);

    // Next pages strictly below the cursor.
    let next = store.get_otx_by_account_next(&mut tx, account, ids[3], 2).await.unwrap();
    assert_eq!(next.iter().map(|o| o.id).collect::<Vec<_>>(), vec![ids[2], ids[1]]);

    // Previous windows strictly above the cursor, oldest first.
    let previous =
        store.get_otx_by_account_previous(&mut tx, account, ids[1], 2).await.unwrap();
    assert_eq!(previous.iter().map(|o| o.id).collect::<Vec<_>>(), vec![ids[2], ids[3]]);

    // The limit is clamped server-side.
    let clamped = store.get_otx_by_account(&mut tx, account, 1000).await.unwrap();
    assert_eq!(clamped.len(), 5);
}

#[tokio::test]
#[ignore = "requires a live postgres"]
async fn master_bootstrap_is_idempotent() {
    let store = connect().await;
    store.bootstrap().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let first = store.load_master_keypair(&mut tx).await.unwrap();
    tx.commit().await.unwrap();

    store.bootstrap().await.unwrap();
    let mut tx = store.begin().await.unwrap();
    let second = store.load_master_keypair(&mut tx).await.unwrap();
    assert_eq!(first.public_address, second.public_address);
}
