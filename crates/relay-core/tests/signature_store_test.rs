//! JSON 파일 시그니처 저장소 통합 테스트
//!
//! 여러 심볼(및 여러 저장소 인스턴스)이 하나의 파일을 공유할 때 레코드가 서로
//! 손상되지 않는지, 손상된 파일이 `PersistenceUnavailable`로 보고되는지 확인합니다.

use std::sync::Arc;

use relay_core::{JsonFileSignatureStore, RelayError, SignatureStore, NO_SIGNATURE};
use serde_json::Value;

// ============================================================================
// 테스트 헬퍼 함수
// ============================================================================

fn store_in(dir: &tempfile::TempDir) -> JsonFileSignatureStore {
    JsonFileSignatureStore::new(dir.path().join("signatures.json"))
}

#[tokio::test]
async fn test_missing_file_loads_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    assert_eq!(store.load("rb2410.SHFE").await.unwrap(), None);
    assert!(!store.path().exists());
}

#[tokio::test]
async fn test_save_then_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    store.save("rb2410.SHFE", 5).await.unwrap();
    assert_eq!(store.load("rb2410.SHFE").await.unwrap(), Some(5));

    // 재시작 시뮬레이션: 새 인스턴스로 같은 파일 읽기
    let reopened = store_in(&dir);
    assert_eq!(reopened.load("rb2410.SHFE").await.unwrap(), Some(5));

    reopened.save("rb2410.SHFE", NO_SIGNATURE).await.unwrap();
    assert_eq!(store.load("rb2410.SHFE").await.unwrap(), Some(NO_SIGNATURE));
}

#[tokio::test]
async fn test_other_symbols_and_fields_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("signatures.json");
    std::fs::write(
        &path,
        r#"{"IF2409.CFFEX": {"signature": 11, "note": "manual"}, "rb2410.SHFE": {"signature": 2}}"#,
    )
    .unwrap();

    let store = JsonFileSignatureStore::new(&path);
    store.save("rb2410.SHFE", 9).await.unwrap();

    let document: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(document["IF2409.CFFEX"]["signature"], 11);
    assert_eq!(document["IF2409.CFFEX"]["note"], "manual");
    assert_eq!(document["rb2410.SHFE"]["signature"], 9);
}

#[tokio::test]
async fn test_concurrent_saves_keep_every_symbol() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(store_in(&dir));

    let mut handles = Vec::new();
    for i in 0..16i64 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.save(&format!("SYM{}", i), i).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for i in 0..16i64 {
        assert_eq!(store.load(&format!("SYM{}", i)).await.unwrap(), Some(i));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_separate_stores_on_one_file_keep_both_symbols() {
    let dir = tempfile::tempdir().unwrap();
    // 종목별 프로세스처럼 각자 저장소 인스턴스를 가짐
    let first = Arc::new(store_in(&dir));
    let second = Arc::new(store_in(&dir));

    for round in 0..50i64 {
        let a = {
            let store = Arc::clone(&first);
            tokio::spawn(async move { store.save("rb2410.SHFE", round).await })
        };
        let b = {
            let store = Arc::clone(&second);
            tokio::spawn(async move { store.save("IF2409.CFFEX", round).await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        assert_eq!(second.load("rb2410.SHFE").await.unwrap(), Some(round));
        assert_eq!(first.load("IF2409.CFFEX").await.unwrap(), Some(round));
    }

    // 임시 파일이 남지 않음
    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["signatures.json", "signatures.json.lock"]);
}

#[tokio::test]
async fn test_corrupt_file_is_persistence_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("signatures.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = JsonFileSignatureStore::new(&path);
    let result = store.load("rb2410.SHFE").await;
    assert!(matches!(
        result,
        Err(RelayError::PersistenceUnavailable { ref symbol, .. }) if symbol == "rb2410.SHFE"
    ));

    // 저장도 같은 에러로 실패하며 파일은 건드리지 않음
    assert!(store.save("rb2410.SHFE", 1).await.is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
}

#[tokio::test]
async fn test_non_object_record_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("signatures.json");
    std::fs::write(&path, r#"{"rb2410.SHFE": 3}"#).unwrap();

    let store = JsonFileSignatureStore::new(&path);
    assert_eq!(store.load("rb2410.SHFE").await.unwrap(), None);

    store.save("rb2410.SHFE", 4).await.unwrap();
    assert_eq!(store.load("rb2410.SHFE").await.unwrap(), Some(4));
}
