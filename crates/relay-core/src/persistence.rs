//! 심볼별 시그니처 영속화.
//!
//! 재시작 후 이미 처리한 지시가 다시 실행되지 않도록, 마지막으로 수락한
//! 시그니처를 심볼 단위로 저장합니다. 여러 심볼의 컨트롤러가 하나의 파일을
//! 공유하므로 쓰기는 파일 잠금 아래에서 전체 읽기-수정-쓰기로 수행됩니다.
//!
//! # 파일 형식
//!
//! ```json
//! {
//!   "rb2410.SHFE": { "signature": 5 },
//!   "IF2409.CFFEX": { "signature": -1 }
//! }
//! ```

use std::{
    collections::HashMap,
    fs::{File, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::{RelayError, Result};

/// 진행 중인 지시가 없음을 나타내는 저장 값.
pub const NO_SIGNATURE: i64 = -1;

/// 레코드 내 시그니처 필드 이름.
const SIGNATURE_FIELD: &str = "signature";

/// 저장 값을 내부 표현으로 변환 (`-1` → `None`).
pub fn signature_from_raw(raw: i64) -> Option<i64> {
    (raw != NO_SIGNATURE).then_some(raw)
}

/// 내부 표현을 저장 값으로 변환 (`None` → `-1`).
pub fn signature_to_raw(signature: Option<i64>) -> i64 {
    signature.unwrap_or(NO_SIGNATURE)
}

/// 시그니처 저장소 trait.
///
/// 구현체는 `save` 호출 간 다른 심볼의 레코드를 손상시키지 않아야 합니다.
#[async_trait]
pub trait SignatureStore: Send + Sync {
    /// 심볼의 저장된 시그니처 조회. 레코드가 없으면 `None`.
    ///
    /// # Errors
    ///
    /// - `RelayError::PersistenceUnavailable`: 저장소 읽기/파싱 실패
    async fn load(&self, symbol: &str) -> Result<Option<i64>>;

    /// 심볼의 시그니처 저장 (`NO_SIGNATURE` 포함).
    ///
    /// # Errors
    ///
    /// - `RelayError::PersistenceUnavailable`: 저장소 읽기/쓰기 실패
    async fn save(&self, symbol: &str, signature: i64) -> Result<()>;
}

// =============================================================================
// JSON 파일 저장소
// =============================================================================

/// JSON 파일 기반 시그니처 저장소.
///
/// 같은 파일을 여러 프로세스(종목별 컨트롤러)가 공유할 수 있도록, 읽기-수정-쓰기
/// 구간은 옆에 둔 `<파일>.lock`에 대한 OS 파일 잠금 아래에서 수행됩니다.
/// 문서는 같은 디렉터리의 고유 임시 파일에 기록한 뒤 원자적으로 교체합니다.
#[derive(Debug)]
pub struct JsonFileSignatureStore {
    path: PathBuf,
    lock_path: PathBuf,
    /// 프로세스 내 직렬화
    lock: Mutex<()>,
}

impl JsonFileSignatureStore {
    /// 새 저장소 생성. 파일은 첫 저장 시 생성됩니다.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = sibling_with_suffix(&path, ".lock");
        Self {
            path,
            lock_path,
            lock: Mutex::new(()),
        }
    }

    /// 저장소 파일 경로.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 프로세스 간 잠금 파일 경로.
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }
}

#[async_trait]
impl SignatureStore for JsonFileSignatureStore {
    async fn load(&self, symbol: &str) -> Result<Option<i64>> {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        let lock_path = self.lock_path.clone();
        let owned = symbol.to_string();

        tokio::task::spawn_blocking(move || load_locked(&path, &lock_path, &owned))
            .await
            .map_err(|e| RelayError::persistence(symbol, e))?
    }

    async fn save(&self, symbol: &str, signature: i64) -> Result<()> {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        let lock_path = self.lock_path.clone();
        let owned = symbol.to_string();

        tokio::task::spawn_blocking(move || save_locked(&path, &lock_path, &owned, signature))
            .await
            .map_err(|e| RelayError::persistence(symbol, e))??;

        debug!(symbol, signature, path = %self.path.display(), "시그니처 저장 완료");
        Ok(())
    }
}

/// `path` 파일 이름 뒤에 접미사를 붙인 형제 경로.
fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// 저장소 파일이 놓인 디렉터리 (상대 경로 파일명이면 현재 디렉터리).
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn open_lock_file(lock_path: &Path) -> std::io::Result<fd_lock::RwLock<File>> {
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(lock_path)?;
    Ok(fd_lock::RwLock::new(file))
}

fn load_locked(path: &Path, lock_path: &Path, symbol: &str) -> Result<Option<i64>> {
    let lock = match open_lock_file(lock_path) {
        Ok(lock) => lock,
        // 디렉터리가 없으면 저장된 적도 없음
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(RelayError::persistence(symbol, e)),
    };
    let _shared = lock.read().map_err(|e| RelayError::persistence(symbol, e))?;

    let document = read_document(path, symbol)?;
    Ok(document
        .get(symbol)
        .and_then(|record| record.get(SIGNATURE_FIELD))
        .and_then(Value::as_i64))
}

fn save_locked(path: &Path, lock_path: &Path, symbol: &str, signature: i64) -> Result<()> {
    let mut lock = open_lock_file(lock_path).map_err(|e| RelayError::persistence(symbol, e))?;
    let _exclusive = lock.write().map_err(|e| RelayError::persistence(symbol, e))?;

    let mut document = read_document(path, symbol)?;
    let record = document
        .entry(symbol.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    // 객체가 아닌 레코드는 덮어씀
    if !record.is_object() {
        *record = Value::Object(Map::new());
    }
    if let Value::Object(fields) = record {
        fields.insert(SIGNATURE_FIELD.to_string(), Value::from(signature));
    }

    write_document(path, symbol, &document)
}

/// 전체 문서 읽기. 파일이 없으면 빈 객체.
fn read_document(path: &Path, symbol: &str) -> Result<Map<String, Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "시그니처 파일 없음, 빈 저장소로 시작");
            return Ok(Map::new());
        }
        Err(e) => return Err(RelayError::persistence(symbol, e)),
    };

    if content.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(RelayError::persistence(
            symbol,
            "최상위 값이 JSON 객체가 아닙니다",
        )),
        Err(e) => Err(RelayError::persistence(symbol, e)),
    }
}

/// 전체 문서 쓰기 (고유 임시 파일 기록 후 교체).
fn write_document(path: &Path, symbol: &str, document: &Map<String, Value>) -> Result<()> {
    let content =
        serde_json::to_vec_pretty(document).map_err(|e| RelayError::persistence(symbol, e))?;

    let mut temp = tempfile::NamedTempFile::new_in(parent_dir(path))
        .map_err(|e| RelayError::persistence(symbol, e))?;
    temp.write_all(&content)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| RelayError::persistence(symbol, e))?;
    temp.persist(path)
        .map_err(|e| RelayError::persistence(symbol, e))?;
    Ok(())
}

// =============================================================================
// 메모리 저장소
// =============================================================================

/// 메모리 기반 시그니처 저장소 (테스트/임시 실행용).
#[derive(Debug, Default)]
pub struct MemorySignatureStore {
    entries: RwLock<HashMap<String, i64>>,
}

impl MemorySignatureStore {
    /// 빈 저장소 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 초기 레코드와 함께 생성.
    pub fn with_entry(symbol: impl Into<String>, signature: i64) -> Self {
        let mut entries = HashMap::new();
        entries.insert(symbol.into(), signature);
        Self {
            entries: RwLock::new(entries),
        }
    }
}

#[async_trait]
impl SignatureStore for MemorySignatureStore {
    async fn load(&self, symbol: &str) -> Result<Option<i64>> {
        Ok(self.entries.read().await.get(symbol).copied())
    }

    async fn save(&self, symbol: &str, signature: i64) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(symbol.to_string(), signature);
        Ok(())
    }
}
