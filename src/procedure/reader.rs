use calamine::{Data, Reader, Xlsx, open_workbook};
use std::fmt;
use std::fmt::Formatter;
use std::path::Path;

/// 시트 열이 비어 있는 행이 들어갈 기본 시트 이름
pub const DEFAULT_SHEET_NAME: &str = "목록";

#[derive(Debug)]
pub enum ReadError {
    /// 입력 파일이 존재하지 않음. 기본 템플릿이 생성 된 후 반환된다.
    FileMissing(String),
    OpenFailed(String),
    /// 엑셀 파일에 시트가 하나도 없음
    NoSheet(String),
    /// 헤더 밑에 처리할 행이 하나도 없음
    EmptyList(String),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::FileMissing(path) => write!(
                f,
                "'{}' 파일이 존재하지 않아 생성했어요. A열에 ISBN13, B열에 시트, C열에 메모를 입력해주세요.",
                path
            ),
            ReadError::OpenFailed(message) => {
                write!(f, "입력 파일을 읽는 중 오류가 발생했어요: {}", message)
            }
            ReadError::NoSheet(path) => {
                write!(f, "'{}' 파일에 읽을 수 있는 시트가 없어요.", path)
            }
            ReadError::EmptyList(path) => {
                write!(f, "'{}' 파일에 처리할 책 데이터가 없어요.", path)
            }
        }
    }
}

impl std::error::Error for ReadError {}

/// 입력 스프레드시트의 한 행
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRow {
    pub isbn: String,
    pub sheet_name: String,
    pub memo: String,
}

/// 입력 스프레드시트의 첫 번째 시트에서 (ISBN13, 시트, 메모) 행들을 읽는다.
///
/// 헤더 행은 건너뛰고, A열이 비어 있는 행은 무시한다. ISBN 형식 검증은
/// 여기서 하지 않고 행 처리 단계에서 격하로 처리한다.
pub fn read_rows(path: &Path) -> Result<Vec<InputRow>, ReadError> {
    let mut workbook: Xlsx<_> =
        open_workbook(path).map_err(|e: calamine::XlsxError| ReadError::OpenFailed(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ReadError::NoSheet(path.display().to_string()))?
        .map_err(|e| ReadError::OpenFailed(e.to_string()))?;

    let mut rows = Vec::new();
    for row in range.rows().skip(1) {
        let Some(isbn) = row.first().and_then(cell_text) else {
            continue;
        };
        let sheet_name = row
            .get(1)
            .and_then(cell_text)
            .unwrap_or_else(|| DEFAULT_SHEET_NAME.to_owned());
        let memo = row.get(2).and_then(cell_text).unwrap_or_default();

        rows.push(InputRow {
            isbn,
            sheet_name,
            memo,
        });
    }

    Ok(rows)
}

/// 셀 값을 문자열로 변환한다.
///
/// 스프레드시트 프로그램은 숫자만 입력된 ISBN을 숫자 셀로 저장 하므로
/// 숫자 셀도 받아들인다.
fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::String(s) => s.trim().to_owned(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format!("{:.0}", f),
        _ => return None,
    };

    if text.is_empty() { None } else { Some(text) }
}

/// 입력 템플릿 파일을 생성한다. 헤더 행만 가진 빈 엑셀 파일이 만들어진다.
pub fn write_template(path: &Path) -> Result<(), rust_xlsxwriter::XlsxError> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "ISBN13")?;
    worksheet.write_string(0, 1, "시트")?;
    worksheet.write_string(0, 2, "메모 (선택)")?;
    workbook.save(path)?;
    Ok(())
}
