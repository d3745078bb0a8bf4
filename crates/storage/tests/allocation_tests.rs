// Allocation tests for the filesystem backend.
// Exercises sequential numbering and contention on the same slot sequence.

use bytes::Bytes;
use picstash_storage::{AssetStore, FilesystemBackend};
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;

async fn setup(directory_key: &str) -> (TempDir, Arc<FilesystemBackend>) {
    let temp_dir = TempDir::new().unwrap();
    let backend = FilesystemBackend::new(temp_dir.path()).await.unwrap();
    backend.ensure_directory(directory_key).await.unwrap();
    (temp_dir, Arc::new(backend))
}

#[tokio::test]
async fn test_allocation_follows_existing_sequence() {
    for existing in [0u64, 1, 5, 20] {
        let (_temp_dir, backend) = setup("77").await;
        let dir = backend.root().join("77");
        for n in 1..=existing {
            std::fs::write(dir.join(format!("77-{n}.png")), b"x").unwrap();
        }

        let reservation = backend.reserve("77", "77", "png", None).await.unwrap();
        assert_eq!(
            reservation.slot,
            existing + 1,
            "with {existing} existing files the next slot should be {}",
            existing + 1
        );
        assert_eq!(reservation.conflicts, existing);
    }
}

#[tokio::test]
async fn test_allocation_fills_first_gap() {
    let (_temp_dir, backend) = setup("8").await;
    let dir = backend.root().join("8");
    for n in [1, 2, 4] {
        std::fs::write(dir.join(format!("8-{n}.jpg")), b"x").unwrap();
    }

    let reservation = backend.reserve("8", "8", "jpg", None).await.unwrap();
    assert_eq!(reservation.filename, "8-3.jpg");
}

#[tokio::test]
async fn test_existing_files_are_never_overwritten() {
    let (_temp_dir, backend) = setup("12").await;
    let dir = backend.root().join("12");
    std::fs::write(dir.join("12-1.png"), b"original").unwrap();

    for _ in 0..3 {
        let reservation = backend.reserve("12", "12", "png", Some(1)).await.unwrap();
        backend
            .write(&reservation, Bytes::from_static(b"new"))
            .await
            .unwrap();
    }

    assert_eq!(std::fs::read(dir.join("12-1.png")).unwrap(), b"original");
    for n in 2..=4 {
        assert_eq!(std::fs::read(dir.join(format!("12-{n}.png"))).unwrap(), b"new");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_for_same_slot() {
    const REQUESTERS: usize = 16;
    const PREFERRED: u64 = 4;

    let (_temp_dir, backend) = setup("123").await;

    let handles: Vec<_> = (0..REQUESTERS)
        .map(|_| {
            let backend = backend.clone();
            tokio::spawn(async move {
                backend
                    .reserve("123", "123", "png", Some(PREFERRED))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let reservations: Vec<_> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let winners = reservations
        .iter()
        .filter(|r| r.slot == PREFERRED)
        .count();
    assert_eq!(winners, 1, "exactly one requester should get the preferred slot");

    assert!(
        reservations.iter().all(|r| r.slot >= PREFERRED),
        "no requester should be given a smaller slot"
    );

    let slots: HashSet<u64> = reservations.iter().map(|r| r.slot).collect();
    assert_eq!(slots.len(), REQUESTERS, "slots must be unique");

    // Contention only ever pushes forward, so the slots are contiguous.
    let expected: HashSet<u64> = (PREFERRED..PREFERRED + REQUESTERS as u64).collect();
    assert_eq!(slots, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sequential_allocation() {
    const REQUESTERS: u64 = 24;

    let (_temp_dir, backend) = setup("misc").await;

    let handles: Vec<_> = (0..REQUESTERS)
        .map(|i| {
            let backend = backend.clone();
            tokio::spawn(async move {
                let reservation = backend.reserve("misc", "abcd1234", "webp", None).await.unwrap();
                backend
                    .write(&reservation, Bytes::from(vec![i as u8; 8]))
                    .await
                    .unwrap();
                reservation.slot
            })
        })
        .collect();

    let slots: HashSet<u64> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(slots, (1..=REQUESTERS).collect::<HashSet<_>>());

    let files = std::fs::read_dir(backend.root().join("misc")).unwrap().count();
    assert_eq!(files as u64, REQUESTERS);
}

#[tokio::test]
async fn test_independent_backends_share_one_tree() {
    // Two backends over the same root stand in for two processes.
    let temp_dir = TempDir::new().unwrap();
    let first = FilesystemBackend::new(temp_dir.path()).await.unwrap();
    let second = FilesystemBackend::new(temp_dir.path()).await.unwrap();
    first.ensure_directory("31").await.unwrap();
    second.ensure_directory("31").await.unwrap();

    let a = first.reserve("31", "31", "png", Some(1)).await.unwrap();
    let b = second.reserve("31", "31", "png", Some(1)).await.unwrap();

    assert_eq!(a.slot, 1);
    assert_eq!(b.slot, 2);
}
