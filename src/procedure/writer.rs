use crate::item::{Book, RowOutcome};
use rust_xlsxwriter::{Color, Format, FormatAlign, Image, Workbook, Worksheet, XlsxError};
use std::fmt;
use std::fmt::Formatter;
use std::path::Path;

/// 보고서의 기본 글자 크기(pt)
pub const DEFAULT_FONT_SIZE_PT: f64 = 11.0;

/// 보고서 컬럼 헤더. 첫 컬럼은 커버 이미지 전용이다.
const HEADERS: [&str; 13] = [
    "",
    "도서",
    "저자",
    "출판사",
    "ISBN13",
    "정가",
    "출판일",
    "설명",
    "평점",
    "판매지수",
    "카테고리",
    "교내 도서관 소장",
    "메모",
];

const COVER_COLUMN: u16 = 0;
/// 커버 이미지 컬럼의 고정 너비(문자 수 기준)
const COVER_COLUMN_WIDTH: f64 = 16.0;
/// 커버 이미지가 있는 행의 최소 높이(pt)
const COVER_ROW_HEIGHT: f64 = 84.0;
/// 텍스트 컬럼의 최대 너비
const MAX_COLUMN_WIDTH: f64 = 60.0;
/// 글자 크기 대비 한 줄의 높이 배율
const LINE_HEIGHT_RATIO: f64 = 1.7;

#[derive(Debug)]
pub enum WriteError {
    WriteFailed(String),
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::WriteFailed(message) => {
                write!(f, "엑셀 파일을 저장하는 중 오류가 발생했어요: {}", message)
            }
        }
    }
}

impl std::error::Error for WriteError {}

impl From<XlsxError> for WriteError {
    fn from(err: XlsxError) -> Self {
        WriteError::WriteFailed(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Center,
    Left,
    Price,
}

/// 보고서에서 사용하는 셀 서식 모음
struct Formats {
    header: Format,
    center: Format,
    left: Format,
    price: Format,
}

impl Formats {
    fn new(font_size_pt: f64) -> Self {
        let base = Format::new()
            .set_font_size(font_size_pt)
            .set_text_wrap()
            .set_align(FormatAlign::VerticalCenter);

        Self {
            header: base
                .clone()
                .set_bold()
                .set_background_color(Color::RGB(0xD3D3D3))
                .set_align(FormatAlign::Center),
            center: base.clone().set_align(FormatAlign::Center),
            left: base.clone().set_align(FormatAlign::Left),
            price: base
                .set_num_format("#,##0\"원\"")
                .set_align(FormatAlign::Center),
        }
    }

    fn get(&self, style: Style) -> &Format {
        match style {
            Style::Center => &self.center,
            Style::Left => &self.left,
            Style::Price => &self.price,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Price(i32),
}

impl Cell {
    /// 컬럼 너비와 행 높이 계산에 사용할 표시 문자열
    fn display_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(text) => text.clone(),
            Cell::Number(value) => format!("{}", *value as i64),
            Cell::Price(price) => format_krw(*price),
        }
    }
}

/// 처리 결과들을 시트 라벨 별로 묶어 보고서 파일로 저장한다.
///
/// 시트는 입력에 처음 등장한 순서대로 만들어지고, 격하된 행도 ISBN과
/// 실패 사유 마커를 달고 함께 기록된다. 기존 파일은 덮어쓴다.
pub fn write_report(
    outcomes: &[RowOutcome],
    path: &Path,
    font_size_pt: f64,
) -> Result<(), WriteError> {
    let mut workbook = Workbook::new();
    let formats = Formats::new(font_size_pt);

    for sheet_name in sheet_sequence(outcomes) {
        let group: Vec<&RowOutcome> = outcomes
            .iter()
            .filter(|o| o.sheet_name() == sheet_name)
            .collect();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet_name)?;
        write_sheet(worksheet, &group, &formats, font_size_pt)?;
    }

    workbook.save(path)?;
    Ok(())
}

fn write_sheet(
    worksheet: &mut Worksheet,
    outcomes: &[&RowOutcome],
    formats: &Formats,
    font_size_pt: f64,
) -> Result<(), XlsxError> {
    let rows: Vec<Vec<(Cell, Style)>> = outcomes.iter().map(|o| outcome_cells(o)).collect();

    // 컬럼 너비: 헤더와 모든 셀 내용 중 가장 넓은 값, 커버 컬럼은 고정
    let mut widths = [0.0f64; HEADERS.len()];
    widths[COVER_COLUMN as usize] = COVER_COLUMN_WIDTH;
    for (idx, header) in HEADERS.iter().enumerate().skip(1) {
        let mut width = text_width_chars(header) + 0.1;
        for cells in &rows {
            width = width.max(text_width_chars(&cells[idx].0.display_text()) + 0.1);
        }
        widths[idx] = width.min(MAX_COLUMN_WIDTH);
    }

    for (idx, width) in widths.iter().enumerate() {
        worksheet.set_column_width(idx as u16, *width)?;
        worksheet.write_string_with_format(0, idx as u16, HEADERS[idx], &formats.header)?;
    }
    worksheet.set_row_height(0, font_size_pt * LINE_HEIGHT_RATIO)?;

    for (r, (outcome, cells)) in outcomes.iter().zip(&rows).enumerate() {
        let row = (r + 1) as u32;

        let mut height = font_size_pt * LINE_HEIGHT_RATIO;
        if cover_of(outcome).is_some() {
            height = height.max(COVER_ROW_HEIGHT);
        }

        for (idx, (cell, style)) in cells.iter().enumerate() {
            let lines = cell.display_text().matches('\n').count() + 1;
            height = height.max(lines as f64 * font_size_pt * LINE_HEIGHT_RATIO);

            match cell {
                Cell::Empty => {}
                Cell::Text(text) => {
                    worksheet.write_string_with_format(row, idx as u16, text, formats.get(*style))?;
                }
                Cell::Number(value) => {
                    worksheet.write_number_with_format(
                        row,
                        idx as u16,
                        *value,
                        formats.get(*style),
                    )?;
                }
                Cell::Price(price) => {
                    worksheet.write_number_with_format(
                        row,
                        idx as u16,
                        *price as f64,
                        formats.get(Style::Price),
                    )?;
                }
            }
        }

        // 이미지 크기는 행 높이에 맞춰 조정 되므로 높이를 먼저 확정한다.
        worksheet.set_row_height(row, height)?;
        if let Some(cover) = cover_of(outcome) {
            let image = Image::new_from_buffer(cover)?;
            worksheet.insert_image_fit_to_cell(row, COVER_COLUMN, &image, true)?;
        }
    }

    Ok(())
}

fn cover_of<'a>(outcome: &'a RowOutcome) -> Option<&'a [u8]> {
    match outcome {
        RowOutcome::Enriched(book) => book.cover(),
        RowOutcome::Degraded { .. } => None,
    }
}

fn outcome_cells(outcome: &RowOutcome) -> Vec<(Cell, Style)> {
    match outcome {
        RowOutcome::Enriched(book) => book_cells(book),
        RowOutcome::Degraded {
            isbn,
            memo,
            reason,
            ..
        } => {
            let mut cells = vec![(Cell::Empty, Style::Center); HEADERS.len()];
            cells[1] = (Cell::Text(reason.marker()), Style::Center);
            cells[4] = (Cell::Text(isbn.clone()), Style::Center);
            cells[11] = (Cell::Text("?".to_owned()), Style::Center);
            cells[12] = (Cell::Text(memo.clone()), Style::Left);
            cells
        }
    }
}

fn book_cells(book: &Book) -> Vec<(Cell, Style)> {
    vec![
        (Cell::Empty, Style::Center),
        (Cell::Text(book.title().to_owned()), Style::Center),
        (Cell::Text(book.author().to_owned()), Style::Center),
        (Cell::Text(book.publisher().to_owned()), Style::Center),
        (Cell::Text(book.isbn().to_owned()), Style::Center),
        (Cell::Price(book.standard_price()), Style::Price),
        (Cell::Text(book.pub_date_text()), Style::Center),
        (Cell::Text(book.description().to_owned()), Style::Left),
        (Cell::Text(book.rating_text()), Style::Center),
        (Cell::Number(book.sales_point() as f64), Style::Center),
        (Cell::Text(book.category().to_owned()), Style::Left),
        (
            Cell::Text(book.library_status().mark().to_owned()),
            Style::Center,
        ),
        (Cell::Text(book.memo().to_owned()), Style::Left),
    ]
}

/// 시트 라벨들을 입력에 처음 등장한 순서대로 나열한다.
fn sheet_sequence(outcomes: &[RowOutcome]) -> Vec<String> {
    let mut sequence: Vec<String> = Vec::new();
    for outcome in outcomes {
        let name = outcome.sheet_name();
        if !sequence.iter().any(|s| s == name) {
            sequence.push(name.to_owned());
        }
    }
    sequence
}

/// 표시 문자열의 너비를 문자 수 기준으로 계산한다.
///
/// 한글 등 비 ASCII 문자는 두 칸으로 계산하고, 여러 줄일 경우 가장 긴 줄을 사용한다.
fn text_width_chars(text: &str) -> f64 {
    text.split('\n')
        .map(|line| {
            line.chars()
                .map(|c| if c.is_ascii() { 1.0 } else { 2.0 })
                .sum::<f64>()
        })
        .fold(0.0, f64::max)
}

/// 원화 표시 문자열. 컬럼 너비 계산에서 숫자 서식과 같은 폭을 가지도록 한다.
fn format_krw(price: i32) -> String {
    let digits = price.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if price < 0 {
        format!("-{}원", grouped)
    } else {
        format!("{}원", grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Book, LibraryStatus, RowError};
    use assert_fs::TempDir;
    use calamine::{Data, Reader, Xlsx, open_workbook};

    fn sample_book(isbn: &str, title: &str, sheet_name: &str) -> Book {
        Book::builder()
            .isbn(isbn)
            .title(title)
            .author("매트 헤이그 (지은이), 노진선 (옮긴이)")
            .publisher("인플루엔셜")
            .standard_price(15800)
            .pub_date("2021-04-28")
            .description("삶과 죽음 사이, 자정에만 열리는 도서관.")
            .rating_score(8.4)
            .rating_count(128)
            .sales_point(205490)
            .category("국내도서>소설/시/희곡>영미소설")
            .sheet_name(sheet_name)
            .memo("student request")
            .library_status(LibraryStatus::Exists {
                book_key: 1,
                species_key: 2,
            })
            .build()
            .unwrap()
    }

    #[test]
    fn text_width_doubles_wide_characters() {
        assert_eq!(text_width_chars("ISBN13"), 6.0);
        assert_eq!(text_width_chars("도서"), 4.0);
        assert_eq!(text_width_chars("짧음\n더 긴 줄입니다"), 13.0);
        assert_eq!(text_width_chars(""), 0.0);
    }

    #[test]
    fn krw_formatting_groups_thousands() {
        assert_eq!(format_krw(0), "0원");
        assert_eq!(format_krw(900), "900원");
        assert_eq!(format_krw(15800), "15,800원");
        assert_eq!(format_krw(1234567), "1,234,567원");
    }

    #[test]
    fn sheet_sequence_keeps_first_appearance_order() {
        let outcomes = vec![
            RowOutcome::Enriched(Box::new(sample_book("9791191114768", "가", "2학기"))),
            RowOutcome::Degraded {
                isbn: "123".to_owned(),
                sheet_name: "신청 도서".to_owned(),
                memo: String::new(),
                reason: RowError::MalformedIsbn,
            },
            RowOutcome::Enriched(Box::new(sample_book("9791161571188", "나", "2학기"))),
        ];

        assert_eq!(sheet_sequence(&outcomes), vec!["2학기", "신청 도서"]);
    }

    #[test]
    fn report_round_trips_with_header_and_one_row_per_outcome() {
        let outcomes = vec![
            RowOutcome::Enriched(Box::new(sample_book(
                "9791191114768",
                "미드나잇 라이브러리",
                "신청 도서",
            ))),
            RowOutcome::Enriched(Box::new(sample_book(
                "9791161571188",
                "불편한 편의점",
                "신청 도서",
            ))),
            RowOutcome::Degraded {
                isbn: "9788900000000".to_owned(),
                sheet_name: "신청 도서".to_owned(),
                memo: "절판 도서".to_owned(),
                reason: RowError::NotFound,
            },
        ];

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.xlsx");
        write_report(&outcomes, &path, DEFAULT_FONT_SIZE_PT).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["신청 도서"]);

        let range = workbook.worksheet_range("신청 도서").unwrap();
        let rows: Vec<_> = range.rows().collect();
        assert_eq!(rows.len(), outcomes.len() + 1);

        let header: Vec<String> = rows[0].iter().map(|c| c.to_string()).collect();
        assert_eq!(header, HEADERS.map(str::to_owned).to_vec());

        // 정상 행
        assert_eq!(rows[1][1], Data::String("미드나잇 라이브러리".to_owned()));
        assert_eq!(rows[1][4], Data::String("9791191114768".to_owned()));
        assert_eq!(rows[1][5], Data::Float(15800.0));
        assert_eq!(rows[1][11], Data::String("O".to_owned()));

        // 격하된 행은 마커와 함께 기록된다
        assert_eq!(
            rows[3][1],
            Data::String("(데이터를 찾을 수 없음)".to_owned())
        );
        assert_eq!(rows[3][4], Data::String("9788900000000".to_owned()));
        assert_eq!(rows[3][11], Data::String("?".to_owned()));
        assert_eq!(rows[3][12], Data::String("절판 도서".to_owned()));
    }

    #[test]
    fn sheets_are_split_by_label() {
        let outcomes = vec![
            RowOutcome::Enriched(Box::new(sample_book("9791191114768", "가", "1학기"))),
            RowOutcome::Enriched(Box::new(sample_book("9791161571188", "나", "2학기"))),
        ];

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.xlsx");
        write_report(&outcomes, &path, DEFAULT_FONT_SIZE_PT).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["1학기", "2학기"]);

        let range = workbook.worksheet_range("1학기").unwrap();
        assert_eq!(range.rows().count(), 2);
    }

    #[test]
    fn existing_file_is_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.xlsx");
        std::fs::write(&path, b"stale").unwrap();

        let outcomes = vec![RowOutcome::Enriched(Box::new(sample_book(
            "9791191114768",
            "미드나잇 라이브러리",
            "신청 도서",
        )))];
        write_report(&outcomes, &path, DEFAULT_FONT_SIZE_PT).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        let range = workbook.worksheet_range("신청 도서").unwrap();
        assert_eq!(range.rows().count(), 2);
    }
}
