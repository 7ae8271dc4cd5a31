use serde::Deserialize;
use time::macros::format_description;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use super::ConfigError;

#[derive(Debug, Deserialize)]
pub struct Config {
    dir: String,
    name: String,

    /// 최대 로그 파일 개수로 로그 파일이 설정한 개수보다 커질 경우 기존의 로그파일들은 삭제 된다.
    /// 설정 되지 않을 시 로그 파일은 삭제 되지 않는다.
    keep: Option<usize>,

    /// 파일과 stdout에 출력할 로그의 레벨로 지정된 로그 레벨 이상만 로깅된다.
    /// 설정하지 않을시 기본값은 INFO로 설정 된다.
    level: Option<String>,

    /// 로깅 파일이 분리 되는 기간으로 .log 파일 하나 당 설정된 기간 동안 로그가 기록 된다.
    /// 설정 되지 않을시 기본값은 DAILY로 설정된다.
    rotation: Option<String>,
}

/// 파일과 stdout에 JSON 로그를 기록하도록 전역 로깅을 설정한다.
///
/// 반환된 [`WorkerGuard`]는 프로그램이 종료될 때까지 유지 되어야 한다.
/// 가드가 먼저 해제 되면 파일에 기록 중이던 로그가 유실 될 수 있다.
pub fn set_global_logging_config(c: &Config) -> Result<WorkerGuard, ConfigError> {
    let mut file_appender = rolling::RollingFileAppender::builder()
        .filename_prefix(c.name.clone())
        .filename_suffix("log");

    match &c.rotation {
        Some(rotation) => file_appender = file_appender.rotation(parse_rotation(rotation)?),
        None => file_appender = file_appender.rotation(rolling::Rotation::DAILY),
    }

    if let Some(keep) = c.keep {
        file_appender = file_appender.max_log_files(keep);
    }

    let file_appender = file_appender
        .build(c.dir.clone())
        .map_err(|e| ConfigError::LoggerInitFailed(e.to_string()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let writer = std::io::stdout.and(non_blocking);

    let level = match &c.level {
        Some(level) => parse_level(level)?,
        None => tracing::Level::INFO,
    };

    tracing_subscriber::fmt()
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_timer(LocalTime::new(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"
        )))
        .with_writer(writer)
        .with_max_level(level)
        .init();

    Ok(guard)
}

/// 로깅 섹션이 설정 되지 않았을 때 사용하는 stdout 로깅
pub fn set_stdout_logging() {
    tracing_subscriber::fmt()
        .with_timer(LocalTime::new(format_description!(
            "[hour]:[minute]:[second]"
        )))
        .with_target(false)
        .with_max_level(tracing::Level::INFO)
        .init();
}

fn parse_rotation(s: &str) -> Result<rolling::Rotation, ConfigError> {
    match s {
        "DAILY" => Ok(rolling::Rotation::DAILY),
        "HOURLY" => Ok(rolling::Rotation::HOURLY),
        "MINUTELY" => Ok(rolling::Rotation::MINUTELY),
        "NEVER" => Ok(rolling::Rotation::NEVER),
        _ => Err(ConfigError::LoggerInitFailed(format!(
            "로깅 파일 로테이션(rotation)은 \"DAILY\", \"HOURLY\", \"MINUTELY\", \"NEVER\"만 가능 합니다: {}",
            s
        ))),
    }
}

fn parse_level(l: &str) -> Result<tracing::Level, ConfigError> {
    match l {
        "TRACE" => Ok(tracing::Level::TRACE),
        "DEBUG" => Ok(tracing::Level::DEBUG),
        "INFO" => Ok(tracing::Level::INFO),
        "WARN" => Ok(tracing::Level::WARN),
        "ERROR" => Ok(tracing::Level::ERROR),
        _ => Err(ConfigError::LoggerInitFailed(format!(
            "로그 레벨(level)은 \"TRACE\", \"DEBUG\", \"INFO\", \"WARN\", \"ERROR\"만 가능 합니다: {}",
            l
        ))),
    }
}
