use shared::domain::{PointsKey, TxId};
use storage::Storage;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_on_file_store_keep_one_log_row_per_write() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("ledger.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));
    let storage = Storage::new(&database_url).await.expect("db");

    let mut handles = Vec::new();
    for i in 0..8 {
        let storage = storage.clone();
        handles.push(tokio::spawn(async move {
            let key = PointsKey::new((i % 2).to_string());
            let body = format!("{{\"holder\":\"writer-{i}\"}}");
            storage
                .put_state(&key, body.as_bytes(), &TxId::generate(), "recordPoints")
                .await
        }));
    }
    for handle in handles {
        handle.await.expect("join").expect("write");
    }

    let entries = storage.get_state_by_range("0", "999").await.expect("scan");
    assert_eq!(entries.len(), 2);

    let mut logged = 0;
    for entry in entries {
        logged += storage
            .transactions_for_key(&entry.key)
            .await
            .expect("log")
            .len();
    }
    assert_eq!(logged, 8);
}
