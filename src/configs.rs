use serde::Deserialize;
use std::fmt;
use std::fmt::Formatter;
use std::path::Path;
use std::time::Duration;

pub mod log;

/// 네트워크 요청의 기본 타임아웃 시간(초)
const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
/// 일시적인 네트워크 오류 시 시도할 기본 요청 횟수
const DEFAULT_MAX_RETRIES: u32 = 3;

/// config.yml이 없을 때 생성할 기본 템플릿
const CONFIG_TEMPLATE: &str = "aladinKey: write here\n\
libraryLink: write here\n\
outputFileName: output.xlsx\n";

#[derive(Debug)]
pub enum ConfigError {
    /// 설정 파일이 존재하지 않음. 기본 템플릿이 생성 된 후 반환된다.
    FileMissing(String),
    LoadFailed(String),
    /// 필수 설정 값이 비어 있거나 템플릿 그대로임
    MissingValue(String),
    InvalidLibraryLink(String),
    LoggerInitFailed(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileMissing(path) => write!(
                f,
                "{} 파일이 존재하지 않아 기본 템플릿을 생성했어요. 값을 채워넣고 다시 실행해주세요.",
                path
            ),
            ConfigError::LoadFailed(message) => {
                write!(f, "콘피그 파일을 읽는 중 오류가 발생했어요: {}", message)
            }
            ConfigError::MissingValue(key) => {
                write!(f, "콘피그 파일에 '{}' 값이 비어 있어요.", key)
            }
            ConfigError::InvalidLibraryLink(_) => write!(
                f,
                "올바르지 않은 도서관 링크가 제공되었어요. 프로그램의 설명을 참고하여 올바른 링크를 입력해주세요."
            ),
            ConfigError::LoggerInitFailed(message) => {
                write!(f, "로깅 설정 중 오류가 발생했어요: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// 알라딘 Open API TTB 키
    #[serde(rename = "aladinKey", alias = "aladinkey", default)]
    aladin_key: String,

    /// 독서로(read365) 학교 도서관 검색 링크
    ///
    /// 쿼리 스트링에 schoolName, provCode, neisCode가 포함 되어 있어야 한다.
    #[serde(rename = "libraryLink", alias = "librarylink", default)]
    library_link: String,

    /// 보고서 출력 파일 경로
    #[serde(rename = "outputFileName", alias = "outputfilename", default)]
    output_file_name: String,

    #[serde(rename = "timeoutSeconds", alias = "timeoutseconds")]
    timeout_seconds: Option<u64>,

    #[serde(rename = "maxRetries", alias = "maxretries")]
    max_retries: Option<u32>,

    logger: Option<log::Config>,
}

impl AppConfig {
    pub fn aladin_key(&self) -> &str {
        &self.aladin_key
    }

    pub fn library_link(&self) -> &str {
        &self.library_link
    }

    pub fn output_file_name(&self) -> &str {
        &self.output_file_name
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES)
    }

    pub fn logger(&self) -> Option<&log::Config> {
        self.logger.as_ref()
    }
}

/// 설정 파일을 읽고 필수 값이 채워져 있는지 검증한다.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = config::Config::builder()
        .add_source(config::File::from(path))
        .build()
        .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

    let app: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

    let required = [
        ("aladinKey", &app.aladin_key),
        ("libraryLink", &app.library_link),
        ("outputFileName", &app.output_file_name),
    ];
    for (key, value) in required {
        if value.trim().is_empty() || value.trim() == "write here" {
            return Err(ConfigError::MissingValue(key.to_owned()));
        }
    }

    Ok(app)
}

/// 기본 설정 템플릿을 생성한다.
pub fn write_template(path: &Path) -> std::io::Result<()> {
    std::fs::write(path, CONFIG_TEMPLATE)
}

/// 도서관 링크에서 얻어온 학교 정보
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct School {
    name: String,
    prov_code: String,
    neis_code: String,
}

impl School {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prov_code(&self) -> &str {
        &self.prov_code
    }

    pub fn neis_code(&self) -> &str {
        &self.neis_code
    }
}

/// 도서관 검색 링크의 쿼리 스트링에서 학교 정보를 파싱한다.
pub fn parse_library_link(link: &str) -> Result<School, ConfigError> {
    let url =
        reqwest::Url::parse(link).map_err(|_| ConfigError::InvalidLibraryLink(link.to_owned()))?;

    let mut name = None;
    let mut prov_code = None;
    let mut neis_code = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "schoolName" => name = Some(value.into_owned()),
            "provCode" => prov_code = Some(value.into_owned()),
            "neisCode" => neis_code = Some(value.into_owned()),
            _ => {}
        }
    }

    match (name, prov_code, neis_code) {
        (Some(name), Some(prov_code), Some(neis_code)) => Ok(School {
            name,
            prov_code,
            neis_code,
        }),
        _ => Err(ConfigError::InvalidLibraryLink(link.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;

    #[test]
    fn parse_library_link_extracts_school_info() {
        let link = "https://read365.edunet.net/SchoolSearch?schoolName=%ED%95%9C%EA%B5%AD%EA%B3%A0&provCode=B10&neisCode=B100000123";
        let school = parse_library_link(link).unwrap();
        assert_eq!(school.name(), "한국고");
        assert_eq!(school.prov_code(), "B10");
        assert_eq!(school.neis_code(), "B100000123");
    }

    #[test]
    fn parse_library_link_rejects_missing_parameters() {
        let link = "https://read365.edunet.net/SchoolSearch?schoolName=한국고&provCode=B10";
        assert!(matches!(
            parse_library_link(link),
            Err(ConfigError::InvalidLibraryLink(_))
        ));

        assert!(matches!(
            parse_library_link("not a url"),
            Err(ConfigError::InvalidLibraryLink(_))
        ));
    }

    #[test]
    fn load_config_reads_yaml_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(
            &path,
            "aladinKey: ttbtest1234\n\
             libraryLink: \"https://read365.edunet.net/SchoolSearch?schoolName=a&provCode=b&neisCode=c\"\n\
             outputFileName: report.xlsx\n\
             timeoutSeconds: 3\n\
             maxRetries: 5\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.aladin_key(), "ttbtest1234");
        assert_eq!(config.output_file_name(), "report.xlsx");
        assert_eq!(config.timeout(), Duration::from_secs(3));
        assert_eq!(config.max_retries(), 5);
        assert!(config.logger().is_none());
    }

    #[test]
    fn load_config_rejects_template_placeholder() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        write_template(&path).unwrap();

        match load_config(&path) {
            Err(ConfigError::MissingValue(key)) => assert_eq!(key, "aladinKey"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn load_config_defaults_timeout_and_retries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(
            &path,
            "aladinKey: k\nlibraryLink: l\noutputFileName: o.xlsx\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.max_retries(), 3);
    }
}
