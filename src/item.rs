use regex::Regex;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::OnceLock;

/// Item 모듈에서 사용할 에러 열거
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemError {
    /// 필수 데이터가 입력 되지 않음
    RequireArgumentMissing(String),
}

impl Display for ItemError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ItemError::RequireArgumentMissing(name) => {
                write!(f, "필수 값 '{}'이(가) 입력되지 않았어요.", name)
            }
        }
    }
}

impl std::error::Error for ItemError {}

static ISBN13_PATTERN: OnceLock<Regex> = OnceLock::new();

/// 전달 받은 문자열이 13자리 숫자로만 이루어진 ISBN13인지 확인한다.
pub fn is_isbn13(value: &str) -> bool {
    let pattern = ISBN13_PATTERN.get_or_init(|| Regex::new(r"^\d{13}$").unwrap());
    pattern.is_match(value)
}

/// 교내 도서관의 소장 여부
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryStatus {
    /// 소장 중, 도서관 시스템 내부의 도서 키와 종 키를 함께 가진다.
    Exists { book_key: i64, species_key: i64 },
    NotExists,
    Unknown,
}

impl LibraryStatus {
    /// 보고서에 표시할 소장 여부 마크
    pub fn mark(&self) -> &'static str {
        match self {
            LibraryStatus::Exists { .. } => "O",
            LibraryStatus::NotExists => "X",
            LibraryStatus::Unknown => "?",
        }
    }
}

impl Display for LibraryStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mark())
    }
}

/// 도서
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    isbn: String,
    title: String,
    link: String,
    author: String,
    publisher: String,
    standard_price: i32,
    pub_date: Option<chrono::NaiveDate>,
    pub_date_raw: String,
    description: String,
    rating_score: f32,
    rating_count: i32,
    sales_point: i32,
    category: String,
    sheet_name: String,
    memo: String,
    cover: Option<Vec<u8>>,
    library_status: LibraryStatus,
}

impl Book {
    pub fn builder() -> BookBuilder {
        BookBuilder::new()
    }

    pub fn isbn(&self) -> &str {
        &self.isbn
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn publisher(&self) -> &str {
        &self.publisher
    }

    pub fn standard_price(&self) -> i32 {
        self.standard_price
    }

    pub fn pub_date(&self) -> Option<chrono::NaiveDate> {
        self.pub_date
    }

    /// 출판일 표시 문자열로 날짜 파싱에 실패 했을 경우 원본 문자열을 그대로 반환한다.
    pub fn pub_date_text(&self) -> String {
        self.pub_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| self.pub_date_raw.clone())
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn rating_score(&self) -> f32 {
        self.rating_score
    }

    pub fn rating_count(&self) -> i32 {
        self.rating_count
    }

    /// 평점 표시 문자열. 10점 만점의 평점을 5개의 별로 환산한다.
    pub fn rating_text(&self) -> String {
        let stars = ((self.rating_score / 2.0).round() as i32).clamp(0, 5) as usize;
        format!(
            "{:.1} {}{} ({})",
            self.rating_score,
            "★".repeat(stars),
            "☆".repeat(5 - stars),
            self.rating_count
        )
    }

    pub fn sales_point(&self) -> i32 {
        self.sales_point
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }

    pub fn cover(&self) -> Option<&[u8]> {
        self.cover.as_deref()
    }

    pub fn library_status(&self) -> &LibraryStatus {
        &self.library_status
    }
}

impl AsRef<Book> for Book {
    fn as_ref(&self) -> &Book {
        self
    }
}

/// Book 빌더
#[derive(Debug, Clone, PartialEq)]
pub struct BookBuilder {
    isbn: Option<String>,
    title: Option<String>,
    link: Option<String>,
    author: Option<String>,
    publisher: Option<String>,
    standard_price: Option<i32>,
    pub_date: Option<String>,
    description: Option<String>,
    rating_score: Option<f32>,
    rating_count: Option<i32>,
    sales_point: Option<i32>,
    category: Option<String>,
    sheet_name: Option<String>,
    memo: Option<String>,
    cover: Option<Vec<u8>>,
    library_status: Option<LibraryStatus>,
}

impl BookBuilder {
    pub fn new() -> Self {
        Self {
            isbn: None,
            title: None,
            link: None,
            author: None,
            publisher: None,
            standard_price: None,
            pub_date: None,
            description: None,
            rating_score: None,
            rating_count: None,
            sales_point: None,
            category: None,
            sheet_name: None,
            memo: None,
            cover: None,
            library_status: None,
        }
    }

    pub fn isbn<S: Into<String>>(mut self, isbn: S) -> Self {
        self.isbn = Some(isbn.into());
        self
    }

    pub fn title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn link<S: Into<String>>(mut self, link: S) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn author<S: Into<String>>(mut self, author: S) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn publisher<S: Into<String>>(mut self, publisher: S) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    pub fn standard_price(mut self, standard_price: i32) -> Self {
        self.standard_price = Some(standard_price);
        self
    }

    pub fn pub_date<S: Into<String>>(mut self, pub_date: S) -> Self {
        self.pub_date = Some(pub_date.into());
        self
    }

    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn rating_score(mut self, rating_score: f32) -> Self {
        self.rating_score = Some(rating_score);
        self
    }

    pub fn rating_count(mut self, rating_count: i32) -> Self {
        self.rating_count = Some(rating_count);
        self
    }

    pub fn sales_point(mut self, sales_point: i32) -> Self {
        self.sales_point = Some(sales_point);
        self
    }

    pub fn category<S: Into<String>>(mut self, category: S) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn sheet_name<S: Into<String>>(mut self, sheet_name: S) -> Self {
        self.sheet_name = Some(sheet_name.into());
        self
    }

    pub fn memo<S: Into<String>>(mut self, memo: S) -> Self {
        self.memo = Some(memo.into());
        self
    }

    pub fn cover(mut self, cover: Vec<u8>) -> Self {
        self.cover = Some(cover);
        self
    }

    pub fn library_status(mut self, library_status: LibraryStatus) -> Self {
        self.library_status = Some(library_status);
        self
    }

    pub fn build(self) -> Result<Book, ItemError> {
        let isbn = self
            .isbn
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ItemError::RequireArgumentMissing("isbn".to_owned()))?;
        let title = self
            .title
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ItemError::RequireArgumentMissing("title".to_owned()))?;

        let pub_date_raw = self.pub_date.unwrap_or_default();
        let pub_date = chrono::NaiveDate::parse_from_str(&pub_date_raw, "%Y-%m-%d").ok();

        Ok(Book {
            isbn,
            title,
            link: self.link.unwrap_or_default(),
            author: self.author.unwrap_or_default(),
            publisher: self.publisher.unwrap_or_default(),
            standard_price: self.standard_price.unwrap_or(0),
            pub_date,
            pub_date_raw,
            description: self.description.unwrap_or_default(),
            rating_score: self.rating_score.unwrap_or(0.0),
            rating_count: self.rating_count.unwrap_or(0),
            sales_point: self.sales_point.unwrap_or(0),
            category: self.category.unwrap_or_default(),
            sheet_name: self.sheet_name.unwrap_or_default(),
            memo: self.memo.unwrap_or_default(),
            cover: self.cover,
            library_status: self.library_status.unwrap_or(LibraryStatus::Unknown),
        })
    }
}

impl Default for BookBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 한 행의 처리가 실패한 사유
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    /// ISBN13 형식이 아니라서 조회를 시도하지 않음
    MalformedIsbn,
    /// 조회는 성공 했으나 결과가 없음
    NotFound,
    /// 재시도 한도까지 조회에 실패함
    FetchFailed(String),
}

impl RowError {
    /// 보고서의 도서 칸에 표시할 마커 문자열
    pub fn marker(&self) -> String {
        format!("({})", self)
    }
}

impl Display for RowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RowError::MalformedIsbn => write!(f, "잘못된 ISBN 형식"),
            RowError::NotFound => write!(f, "데이터를 찾을 수 없음"),
            RowError::FetchFailed(message) => write!(f, "조회 실패: {}", message),
        }
    }
}

/// 입력 한 행의 처리 결과
///
/// 조회에 실패한 행도 배치를 중단 시키지 않고 실패 사유와 함께 보고서까지 전달된다.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Enriched(Box<Book>),
    Degraded {
        isbn: String,
        sheet_name: String,
        memo: String,
        reason: RowError,
    },
}

impl RowOutcome {
    pub fn isbn(&self) -> &str {
        match self {
            RowOutcome::Enriched(book) => book.isbn(),
            RowOutcome::Degraded { isbn, .. } => isbn,
        }
    }

    pub fn sheet_name(&self) -> &str {
        match self {
            RowOutcome::Enriched(book) => book.sheet_name(),
            RowOutcome::Degraded { sheet_name, .. } => sheet_name,
        }
    }

    pub fn is_enriched(&self) -> bool {
        matches!(self, RowOutcome::Enriched(_))
    }
}
