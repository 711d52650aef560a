//! SDK 디렉토리 - 설정 파일과 스토리지 네임스페이스 파일 위치
//!
//! - `<config_dir>/webex/`: 글로벌 `config.json`
//! - `<data_dir>/webex/`: `JsonFileAdapter`의 네임스페이스 파일
//! - `<project>/.webex/`: 프로젝트 `config.json`

use crate::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// SDK 하위 디렉토리 이름
const SDK_DIR: &str = "webex";

/// 프로젝트 설정 디렉토리 이름
const PROJECT_DIR: &str = ".webex";

/// JSON 문서를 담는 디렉토리 하나
#[derive(Debug, Clone)]
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// 글로벌 설정 디렉토리
    pub fn global() -> Result<Self> {
        dirs::config_dir()
            .map(|dir| Self::new(dir.join(SDK_DIR)))
            .ok_or_else(|| Error::Config("Cannot find config directory".into()))
    }

    /// 영속 스토리지 디렉토리
    pub fn data() -> Result<Self> {
        dirs::data_dir()
            .map(|dir| Self::new(dir.join(SDK_DIR)))
            .ok_or_else(|| Error::Storage("Cannot find data directory".into()))
    }

    /// 현재 디렉토리의 프로젝트 설정 디렉토리
    pub fn current_project() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| Error::Config(format!("Cannot get current directory: {}", e)))?;
        Ok(Self::new(cwd.join(PROJECT_DIR)))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// 문서 읽기. 파일이 없으면 `None`
    pub fn read<T: DeserializeOwned>(&self, filename: &str) -> Result<Option<T>> {
        let path = self.base_dir.join(filename);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Storage(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| Error::Storage(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// 문서 쓰기
    ///
    /// 임시 파일에 쓴 뒤 rename 하므로 중간에 실패해도 이전 내용이 남습니다.
    pub fn write<T: Serialize>(&self, filename: &str, data: &T) -> Result<()> {
        std::fs::create_dir_all(&self.base_dir).map_err(|e| {
            Error::Storage(format!(
                "Failed to create {}: {}",
                self.base_dir.display(),
                e
            ))
        })?;

        let path = self.base_dir.join(filename);
        let staged = self.base_dir.join(format!("{}.tmp", filename));
        let content = serde_json::to_vec_pretty(data)
            .map_err(|e| Error::Storage(format!("Failed to serialize {}: {}", filename, e)))?;

        std::fs::write(&staged, content)
            .and_then(|()| std::fs::rename(&staged, &path))
            .map_err(|e| Error::Storage(format!("Failed to write {}: {}", path.display(), e)))
    }

    /// 문서 삭제. 없으면 무시
    pub fn remove(&self, filename: &str) -> Result<()> {
        let path = self.base_dir.join(filename);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!(
                "Failed to remove {}: {}",
                path.display(),
                e
            ))),
        }
    }
}
