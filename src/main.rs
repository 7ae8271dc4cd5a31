use book_report_rust::procedure::{reader, writer};
use book_report_rust::{configs, create_report_job};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

/// 신청 도서 목록에 알라딘 메타데이터와 교내 도서관 소장 여부를 채워 엑셀 보고서를 만든다.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// 설정 파일 경로
    #[arg(long, default_value = "config.yml")]
    config: PathBuf,

    /// 입력 목록 파일 경로
    #[arg(long, default_value = "list.xlsx")]
    input: PathBuf,

    /// 출력 파일 경로. 지정 시 설정의 outputFileName 대신 사용된다.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    if !args.config.exists() {
        configs::write_template(&args.config)?;
        return Err(Box::new(configs::ConfigError::FileMissing(
            args.config.display().to_string(),
        )));
    }

    let config = configs::load_config(&args.config)?;

    // 파일 로깅의 가드는 프로그램 종료까지 유지 되어야 한다.
    let _logging_guard = match config.logger() {
        Some(logger) => Some(configs::log::set_global_logging_config(logger)?),
        None => {
            configs::log::set_stdout_logging();
            None
        }
    };

    let school = configs::parse_library_link(config.library_link())?;
    info!(
        "@@@@@ 학교 정보를 로딩했어요: {} (교육청 코드: {}, 나이스 코드: {})",
        school.name(),
        school.prov_code(),
        school.neis_code()
    );

    if !args.input.exists() {
        reader::write_template(&args.input)?;
        return Err(Box::new(reader::ReadError::FileMissing(
            args.input.display().to_string(),
        )));
    }

    let rows = reader::read_rows(&args.input)?;
    if rows.is_empty() {
        return Err(Box::new(reader::ReadError::EmptyList(
            args.input.display().to_string(),
        )));
    }

    let job = create_report_job(&config, &school)?;
    let outcomes = job.run(&rows);

    let enriched = outcomes.iter().filter(|o| o.is_enriched()).count();
    info!(
        "@@@@@ 총 {}권의 책 정보를 성공적으로 가져왔어요. (전체 {}행)",
        enriched,
        outcomes.len()
    );

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(config.output_file_name()));
    writer::write_report(&outcomes, &output, writer::DEFAULT_FONT_SIZE_PT)?;
    info!("@@@@@ 엑셀 파일({})을 저장했어요.", output.display());

    Ok(())
}
