use crate::item::{LibraryStatus, RowError, RowOutcome, is_isbn13};
use crate::provider::api::{self, CatalogProvider, MetadataProvider};
use tracing::{info, warn};

pub mod reader;
pub mod writer;

use reader::InputRow;

/// 입력 행 목록을 받아 행 단위로 메타데이터 조회와 소장 여부 확인을 수행하는 배치 잡
///
/// 행 하나의 실패는 해당 행의 결과만 격하 시키고 배치 전체는 계속 진행된다.
pub struct Job<M, C>
where
    M: MetadataProvider,
    C: CatalogProvider,
{
    metadata: M,
    catalog: C,
    max_attempts: u32,
}

impl<M, C> Job<M, C>
where
    M: MetadataProvider,
    C: CatalogProvider,
{
    pub fn new(metadata: M, catalog: C, max_attempts: u32) -> Self {
        Self {
            metadata,
            catalog,
            max_attempts,
        }
    }

    /// 모든 입력 행을 순서대로 처리한다. 입력 행 하나 당 결과 하나가 반환된다.
    pub fn run(&self, rows: &[InputRow]) -> Vec<RowOutcome> {
        rows.iter().map(|row| self.process(row)).collect()
    }

    fn process(&self, row: &InputRow) -> RowOutcome {
        if !is_isbn13(&row.isbn) {
            warn!("[입력] ISBN {}: 13자리 숫자 형식이 아니에요.", row.isbn);
            return degrade(row, RowError::MalformedIsbn);
        }

        let lookup = match api::with_retry(self.max_attempts, || self.metadata.lookup(&row.isbn)) {
            Ok(Some(lookup)) => lookup,
            Ok(None) => {
                warn!("[조회 실패][알라딘] ISBN {}: 데이터를 찾을 수 없어요.", row.isbn);
                return degrade(row, RowError::NotFound);
            }
            Err(err) => {
                warn!("[조회 실패][알라딘] ISBN {}: {}", row.isbn, err);
                return degrade(row, RowError::FetchFailed(err.to_string()));
            }
        };

        let mut builder = lookup
            .book
            .sheet_name(row.sheet_name.clone())
            .memo(row.memo.clone());

        // 커버 이미지 실패는 행을 격하 시키지 않고 이미지만 비워 둔다.
        if let Some(cover_url) = &lookup.cover_url {
            match api::with_retry(self.max_attempts, || self.metadata.download_cover(cover_url)) {
                Ok(bytes) => builder = builder.cover(bytes),
                Err(err) => {
                    warn!("[오류][알라딘] ISBN {} 커버 이미지를 가져오는 중 오류가 발생했어요: {}", row.isbn, err);
                }
            }
        }

        let status = match self.catalog.check(&row.isbn) {
            Ok(status) => status,
            Err(err) => {
                warn!("[조회 실패][도서관] ISBN {}: {}", row.isbn, err);
                LibraryStatus::Unknown
            }
        };

        match status {
            LibraryStatus::Exists { book_key, species_key } => {
                info!(
                    "[조회 성공][도서관] ISBN {}: 소장하고 있는 도서에요 ㅡ bookKey: {}, speciesKey: {}",
                    row.isbn, book_key, species_key
                );
            }
            LibraryStatus::NotExists => {
                info!("[조회 성공][도서관] ISBN {}: 소장하고 있지 않은 도서에요.", row.isbn);
            }
            LibraryStatus::Unknown => {}
        }
        builder = builder.library_status(status);

        match builder.build() {
            Ok(book) => {
                info!("[조회 성공][알라딘] ISBN {}: '{}' 정보를 가져왔어요.", row.isbn, book.title());
                RowOutcome::Enriched(Box::new(book))
            }
            Err(err) => {
                warn!("[조회 실패][알라딘] ISBN {}: 응답에 필수 값이 비어 있어요 - {}", row.isbn, err);
                degrade(row, RowError::FetchFailed(err.to_string()))
            }
        }
    }
}

fn degrade(row: &InputRow, reason: RowError) -> RowOutcome {
    RowOutcome::Degraded {
        isbn: row.isbn.clone(),
        sheet_name: row.sheet_name.clone(),
        memo: row.memo.clone(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::BookBuilder;
    use crate::provider::api::{ClientError, Lookup};
    use std::cell::Cell;

    const KNOWN_ISBN: &str = "9791191114768";

    struct StubMetadata {
        lookup_calls: Cell<u32>,
        fail_transport: bool,
    }

    impl StubMetadata {
        fn new() -> Self {
            Self {
                lookup_calls: Cell::new(0),
                fail_transport: false,
            }
        }

        fn failing() -> Self {
            Self {
                lookup_calls: Cell::new(0),
                fail_transport: true,
            }
        }
    }

    impl MetadataProvider for StubMetadata {
        fn lookup(&self, isbn: &str) -> Result<Option<Lookup>, ClientError> {
            self.lookup_calls.set(self.lookup_calls.get() + 1);
            if self.fail_transport {
                return Err(ClientError::RequestFailed("connection reset".to_owned()));
            }
            if isbn != KNOWN_ISBN {
                return Ok(None);
            }
            Ok(Some(Lookup {
                book: BookBuilder::new()
                    .isbn(isbn)
                    .title("미드나잇 라이브러리")
                    .publisher("인플루엔셜"),
                cover_url: None,
            }))
        }

        fn download_cover(&self, _url: &str) -> Result<Vec<u8>, ClientError> {
            Err(ClientError::RequestFailed("unexpected call".to_owned()))
        }
    }

    struct StubCatalog {
        result: Result<LibraryStatus, ClientError>,
    }

    impl CatalogProvider for StubCatalog {
        fn check(&self, _isbn: &str) -> Result<LibraryStatus, ClientError> {
            self.result.clone()
        }
    }

    fn input(isbn: &str, memo: &str) -> InputRow {
        InputRow {
            isbn: isbn.to_owned(),
            sheet_name: "신청 도서".to_owned(),
            memo: memo.to_owned(),
        }
    }

    #[test]
    fn known_isbn_yields_enriched_row() {
        let catalog = StubCatalog {
            result: Ok(LibraryStatus::Exists {
                book_key: 1,
                species_key: 2,
            }),
        };
        let job = Job::new(StubMetadata::new(), catalog, 3);

        let outcomes = job.run(&[input(KNOWN_ISBN, "student request")]);
        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            RowOutcome::Enriched(book) => {
                assert_eq!(book.isbn(), KNOWN_ISBN);
                assert_eq!(book.title(), "미드나잇 라이브러리");
                assert_eq!(book.memo(), "student request");
                assert_eq!(book.sheet_name(), "신청 도서");
                assert_eq!(book.library_status().mark(), "O");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn unknown_isbn_degrades_to_not_found_and_batch_continues() {
        let catalog = StubCatalog {
            result: Ok(LibraryStatus::NotExists),
        };
        let job = Job::new(StubMetadata::new(), catalog, 3);

        let outcomes = job.run(&[input("9788900000000", ""), input(KNOWN_ISBN, "")]);
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(
            &outcomes[0],
            RowOutcome::Degraded {
                reason: RowError::NotFound,
                ..
            }
        ));
        assert!(outcomes[1].is_enriched());
    }

    #[test]
    fn malformed_isbn_never_reaches_the_network() {
        let metadata = StubMetadata::new();
        let catalog = StubCatalog {
            result: Ok(LibraryStatus::NotExists),
        };
        let job = Job::new(metadata, catalog, 3);

        let outcomes = job.run(&[input("9791191114", "10자리")]);
        assert!(matches!(
            &outcomes[0],
            RowOutcome::Degraded {
                reason: RowError::MalformedIsbn,
                ..
            }
        ));
        assert_eq!(job.metadata.lookup_calls.get(), 0);
    }

    #[test]
    fn transport_failure_is_retried_then_degraded() {
        let metadata = StubMetadata::failing();
        let catalog = StubCatalog {
            result: Ok(LibraryStatus::NotExists),
        };
        let job = Job::new(metadata, catalog, 3);

        let outcomes = job.run(&[input(KNOWN_ISBN, "")]);
        assert!(matches!(
            &outcomes[0],
            RowOutcome::Degraded {
                reason: RowError::FetchFailed(_),
                ..
            }
        ));
        assert_eq!(job.metadata.lookup_calls.get(), 3);
    }

    #[test]
    fn catalog_failure_maps_to_unknown_status() {
        let catalog = StubCatalog {
            result: Err(ClientError::RequestFailed("timeout".to_owned())),
        };
        let job = Job::new(StubMetadata::new(), catalog, 3);

        let outcomes = job.run(&[input(KNOWN_ISBN, "")]);
        match &outcomes[0] {
            RowOutcome::Enriched(book) => {
                assert_eq!(book.library_status(), &LibraryStatus::Unknown);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
