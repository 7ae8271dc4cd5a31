use crate::item::BookBuilder;
use crate::provider::api::{ClientError, Lookup, MetadataProvider};
use reqwest::{Url, blocking};
use serde::Deserialize;
use std::time::Duration;

/// 알라딘 ItemLookUp API 엔드포인트 URL
const ALADIN_API_ENDPOINT: &str = "http://www.aladin.co.kr/ttb/api/ItemLookUp.aspx";
/// ItemLookUp 요청 시 함께 받아올 부가 정보 목록
const OPT_RESULT: &str = "Story,categoryIdList,bestSellerRank,ratingInfo,reviewList";

/// 알라딘 ItemLookUp API 응답을 표현하는 구조체
#[derive(Debug, Deserialize)]
pub struct AladinResponse {
    /// 도서 아이템 목록. 오류 응답에는 포함 되지 않는다.
    #[serde(rename = "item", default)]
    pub items: Vec<BookItem>,

    /// 오류 응답의 메시지
    #[serde(rename = "errorMessage")]
    pub error_message: Option<String>,
}

/// 개별 도서 정보를 표현하는 구조체
#[derive(Debug, Deserialize)]
pub struct BookItem {
    /// 도서 제목
    #[serde(default)]
    pub title: String,
    /// 도서 상세 페이지 링크
    #[serde(default)]
    pub link: String,
    /// 저자 정보
    #[serde(default)]
    pub author: String,
    /// 출판일
    #[serde(rename = "pubDate", default)]
    pub pub_date: String,
    /// 도서 설명
    #[serde(default)]
    pub description: String,
    /// ISBN13 코드(13자리)
    #[serde(default)]
    pub isbn13: String,
    /// 정가
    #[serde(rename = "priceStandard", default)]
    pub price_standard: i32,
    /// 출판사
    #[serde(default)]
    pub publisher: String,
    /// 카테고리 경로
    #[serde(rename = "categoryName", default)]
    pub category_name: String,
    /// 판매지수
    #[serde(rename = "salesPoint", default)]
    pub sales_point: i32,
    /// 커버 이미지 URL
    #[serde(default)]
    pub cover: String,
    /// 부가 정보
    #[serde(rename = "subInfo", default)]
    pub sub_info: SubInfo,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubInfo {
    #[serde(rename = "ratingInfo", default)]
    pub rating_info: RatingInfo,
}

#[derive(Debug, Default, Deserialize)]
pub struct RatingInfo {
    /// 10점 만점 평점
    #[serde(rename = "ratingScore", default)]
    pub rating_score: f32,
    /// 평가 참여자 수
    #[serde(rename = "ratingCount", default)]
    pub rating_count: i32,
}

impl BookItem {
    fn into_lookup(self, requested_isbn: &str) -> Lookup {
        let cover_url = if self.cover.is_empty() {
            None
        } else {
            Some(self.cover.clone())
        };
        // 응답에 ISBN13이 빠져 있는 경우 요청한 ISBN을 그대로 사용한다.
        let isbn = if self.isbn13.is_empty() {
            requested_isbn.to_owned()
        } else {
            self.isbn13.clone()
        };

        let book = BookBuilder::new()
            .isbn(isbn)
            .title(self.title)
            .link(self.link)
            .author(self.author)
            .publisher(self.publisher)
            .standard_price(self.price_standard)
            .pub_date(self.pub_date)
            .description(self.description.trim().to_owned())
            .rating_score(self.sub_info.rating_info.rating_score)
            .rating_count(self.sub_info.rating_info.rating_count)
            .sales_point(self.sales_point)
            .category(self.category_name);

        Lookup { book, cover_url }
    }
}

/// 알라딘 API 클라이언트
pub struct Client {
    /// 알라딘 API TTB 키
    ttb_key: String,
    http: blocking::Client,
}

impl Client {
    pub fn new(ttb_key: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::RequestFailed(format!("클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            ttb_key: ttb_key.to_owned(),
            http,
        })
    }
}

impl MetadataProvider for Client {
    fn lookup(&self, isbn: &str) -> Result<Option<Lookup>, ClientError> {
        let url = build_lookup_url(&self.ttb_key, isbn)?;
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|err| ClientError::RequestFailed(err.to_string()))?;

        if !response.status().is_success() {
            return Err(ClientError::RequestFailed(format!(
                "HTTP 오류: {}",
                response.status()
            )));
        }

        let text = response
            .text()
            .map_err(|err| ClientError::RequestFailed(err.to_string()))?;

        response_to_lookup(&text, isbn)
    }

    fn download_cover(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|err| ClientError::RequestFailed(err.to_string()))?;

        if !response.status().is_success() {
            return Err(ClientError::RequestFailed(format!(
                "HTTP 오류: {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .map_err(|err| ClientError::RequestFailed(err.to_string()))?;

        Ok(bytes.to_vec())
    }
}

/// 응답 본문을 파싱해 첫 번째 아이템을 조회 결과로 변환한다.
///
/// 아이템 목록이 비어 있을 경우 조회 결과 없음으로 취급한다.
fn response_to_lookup(text: &str, isbn: &str) -> Result<Option<Lookup>, ClientError> {
    let parsed = serde_json::from_str::<AladinResponse>(text)
        .map_err(|err| ClientError::ResponseParseFailed(err.to_string()))?;

    if let Some(message) = parsed.error_message {
        return Err(ClientError::ApiError(message));
    }

    Ok(parsed
        .items
        .into_iter()
        .next()
        .map(|item| item.into_lookup(isbn)))
}

fn build_lookup_url(ttb_key: &str, isbn: &str) -> Result<Url, ClientError> {
    Url::parse(ALADIN_API_ENDPOINT)
        .map_err(|_| ClientError::InvalidBaseUrl)
        .map(|mut url| {
            url.query_pairs_mut()
                .append_pair("ttbkey", ttb_key)
                .append_pair("itemIdType", "ISBN")
                .append_pair("ItemId", isbn)
                .append_pair("output", "js")
                .append_pair("Version", "20131101")
                .append_pair("OptResult", OPT_RESULT);
            url
        })
}
