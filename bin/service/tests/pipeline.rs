//! Pipeline coherence tests against a live Postgres.
//!
//! Point `DATABASE_URL` at a scratch database and run
//! `cargo test -p custodiad -- --ignored`.

use alloy_primitives::keccak256;
use custodia_primitives::{DispatchStatus, KeyPair, OtxType};
use custodia_queue::{InsertOpts, Queue};
use custodia_store::{NewOtx, Pg};
use serde_json::json;
use uuid::Uuid;

async fn connect() -> (Pg, Queue) {
    let dsn = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a scratch db");
    let store = Pg::connect(&dsn, 10).await.expect("connect and migrate");
    let mut tx = store.begin().await.unwrap();
    Queue::migrate(&mut tx).await.unwrap();
    tx.commit().await.unwrap();
    (store.clone(), Queue::new(store.pool().clone()))
}

/// Ledger rows and the dispatch job of one intent step become visible
/// atomically or not at all.
#[tokio::test]
#[ignore = "requires a live postgres"]
async fn otx_dispatch_and_job_commit_together() {
    let (store, queue) = connect().await;
    let account = KeyPair::generate().public_address;
    let tracking_id = Uuid::new_v4();

    // Stage a full intent step, then abort before commit.
    {
        let mut tx = store.begin().await.unwrap();
        let nonce = store.acquire_nonce(&mut tx, account).await.unwrap();
        let otx_id = store
            .insert_otx(
                &mut tx,
                &NewOtx {
                    tracking_id,
                    otx_type: OtxType::TokenTransfer,
                    signer_account: account,
                    raw_tx: "0x02deadbeef".into(),
                    tx_hash: keccak256(tracking_id.as_bytes()),
                    nonce,
                },
            )
            .await
            .unwrap();
        store.insert_dispatch(&mut tx, otx_id, DispatchStatus::Pending).await.unwrap();
        queue
            .insert_tx(&mut tx, "DISPATCH", &json!({ "otxId": otx_id }), InsertOpts::default())
            .await
            .unwrap();
        drop(tx); // rollback
    }

    let mut tx = store.begin().await.unwrap();
    assert!(store.get_otx_by_tracking_id(&mut tx, tracking_id).await.unwrap().is_empty());
    assert_eq!(store.peek_nonce(&mut tx, account).await.unwrap(), 0);
    drop(tx);
    assert!(queue.fetch_next().await.unwrap().is_none());
}

/// Lower priorities drain first; ties drain in insertion order.
#[tokio::test]
#[ignore = "requires a live postgres"]
async fn queue_drains_by_priority_then_fifo() {
    let (store, queue) = connect().await;

    let mut tx = store.begin().await.unwrap();
    for (marker, priority) in [("late", 4), ("first", 1), ("second", 1), ("mid", 2)] {
        queue
            .insert_tx(
                &mut tx,
                "ORDERING_PROBE",
                &json!({ "marker": marker }),
                InsertOpts::priority(priority),
            )
            .await
            .unwrap();
    }
    tx.commit().await.unwrap();

    let mut drained = Vec::new();
    while let Some(job) = queue.fetch_next().await.unwrap() {
        // Other tests may share the scratch database; only track our probes.
        if job.kind == "ORDERING_PROBE" {
            drained.push(job.args["marker"].as_str().unwrap().to_string());
        }
        queue.complete_job(job.id).await.unwrap();
    }
    assert_eq!(drained, ["first", "second", "mid", "late"]);
}

/// A failed job retries with backoff until its attempt budget is spent.
#[tokio::test]
#[ignore = "requires a live postgres"]
async fn failed_jobs_retry_then_discard() {
    let (_store, queue) = connect().await;

    queue
        .insert("RETRY_PROBE", &json!({}), InsertOpts::default().max_attempts(2))
        .await
        .unwrap();

    let job = queue.fetch_next().await.unwrap().expect("first attempt");
    assert_eq!(job.attempt, 1);
    queue.retry_job(&job, "simulated failure").await.unwrap();

    // The retry is parked behind its backoff, not immediately fetchable.
    assert!(queue.fetch_next().await.unwrap().is_none());
}
