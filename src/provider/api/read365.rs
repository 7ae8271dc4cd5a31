use crate::item::LibraryStatus;
use crate::provider::api::{CatalogProvider, ClientError};
use reqwest::blocking;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 독서로(read365) 통합 검색 API 엔드포인트 URL
const SEARCH_ENDPOINT: &str = "https://read365.edunet.net/alpasq/api/search";

/// 독서로 검색 요청 본문
#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    #[serde(rename = "searchKeyword")]
    search_keyword: &'a str,
    #[serde(rename = "neisCode")]
    neis_code: [&'a str; 1],
    #[serde(rename = "provCode")]
    prov_code: &'a str,
    #[serde(rename = "coverYn")]
    cover_yn: &'a str,
}

/// 독서로 검색 응답
///
/// 소장 여부 판단에 필요한 필드만 파싱한다. 응답 형식은 독서로 측 내부 계약이라
/// 언제든 바뀔 수 있으므로 모든 필드를 default로 둔다.
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: SearchData,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchData {
    #[serde(rename = "bookList", default)]
    pub book_list: Vec<HeldBook>,
}

#[derive(Debug, Deserialize)]
pub struct HeldBook {
    #[serde(default)]
    pub isbn: String,
    #[serde(rename = "bookKey", default)]
    pub book_key: i64,
    #[serde(rename = "speciesKey", default)]
    pub species_key: i64,
}

/// 독서로 학교 도서관 검색 클라이언트
pub struct Client {
    prov_code: String,
    neis_code: String,
    http: blocking::Client,
}

impl Client {
    pub fn new(prov_code: &str, neis_code: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::RequestFailed(format!("클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            prov_code: prov_code.to_owned(),
            neis_code: neis_code.to_owned(),
            http,
        })
    }
}

impl CatalogProvider for Client {
    fn check(&self, isbn: &str) -> Result<LibraryStatus, ClientError> {
        let payload = SearchRequest {
            search_keyword: isbn,
            neis_code: [self.neis_code.as_str()],
            prov_code: &self.prov_code,
            cover_yn: "N",
        };

        let response = self
            .http
            .post(SEARCH_ENDPOINT)
            .json(&payload)
            .send()
            .map_err(|err| ClientError::RequestFailed(err.to_string()))?;

        if !response.status().is_success() {
            return Err(ClientError::RequestFailed(format!(
                "HTTP 오류: {}",
                response.status()
            )));
        }

        let parsed = response
            .json::<SearchResponse>()
            .map_err(|err| ClientError::ResponseParseFailed(err.to_string()))?;

        Ok(resolve_status(&parsed, isbn))
    }
}

/// 검색 결과에서 요청한 ISBN과 정확히 일치하는 도서를 찾는다.
///
/// 검색은 키워드 기반이라 다른 판본이나 관련 도서도 함께 반환 되므로
/// ISBN 일치 여부로만 소장을 판정한다.
pub fn resolve_status(response: &SearchResponse, isbn: &str) -> LibraryStatus {
    for held in &response.data.book_list {
        if held.isbn == isbn {
            return LibraryStatus::Exists {
                book_key: held.book_key,
                species_key: held.species_key,
            };
        }
    }
    LibraryStatus::NotExists
}
