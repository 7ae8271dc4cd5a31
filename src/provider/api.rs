use crate::item::{BookBuilder, LibraryStatus};
use std::fmt;
use std::fmt::Formatter;
use tracing::warn;

pub mod aladin;
pub mod read365;

#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    InvalidBaseUrl,
    /// 전송 계층 실패(연결/타임아웃/HTTP 오류). 재시도 대상이다.
    RequestFailed(String),
    /// 원격 API가 명시적으로 돌려준 오류. 재시도 하지 않는다.
    ApiError(String),
    ResponseParseFailed(String),
}

impl ClientError {
    /// 재시도로 해소 될 가능성이 있는 오류인지 여부
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::RequestFailed(_))
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::InvalidBaseUrl => write!(f, "유효하지 않은 요청 URL"),
            ClientError::RequestFailed(message) => write!(f, "네트워크 오류: {}", message),
            ClientError::ApiError(message) => write!(f, "API 오류: {}", message),
            ClientError::ResponseParseFailed(message) => {
                write!(f, "응답 파싱 실패: {}", message)
            }
        }
    }
}

impl std::error::Error for ClientError {}

/// 메타데이터 조회 결과. 커버 이미지는 별도의 요청으로 받아와야 한다.
#[derive(Debug)]
pub struct Lookup {
    pub book: BookBuilder,
    pub cover_url: Option<String>,
}

/// ISBN 하나로 도서 메타데이터를 조회하는 클라이언트
pub trait MetadataProvider {
    /// 조회 결과가 없을 경우 `Ok(None)`을 반환한다. `Err`는 전송/파싱 실패에만 사용한다.
    fn lookup(&self, isbn: &str) -> Result<Option<Lookup>, ClientError>;

    fn download_cover(&self, url: &str) -> Result<Vec<u8>, ClientError>;
}

/// 교내 도서관 소장 여부를 조회하는 클라이언트
pub trait CatalogProvider {
    fn check(&self, isbn: &str) -> Result<LibraryStatus, ClientError>;
}

/// 일시적인 오류에 한해 최대 `max_attempts`번까지 요청을 반복한다.
pub fn with_retry<T, F>(max_attempts: u32, mut operation: F) -> Result<T, ClientError>
where
    F: FnMut() -> Result<T, ClientError>,
{
    let mut attempt = 1;
    loop {
        match operation() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < max_attempts => {
                warn!("요청에 실패하여 재시도해요 ({}/{}): {}", attempt, max_attempts, err);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
