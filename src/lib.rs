use crate::configs::{AppConfig, School};
use crate::provider::api::ClientError;
use crate::provider::api::aladin;
use crate::provider::api::read365;

pub mod configs;
pub mod item;
pub mod procedure;
pub mod provider;

/// 설정과 학교 정보로 보고서 생성 잡을 구성한다.
pub fn create_report_job(
    config: &AppConfig,
    school: &School,
) -> Result<procedure::Job<aladin::Client, read365::Client>, ClientError> {
    let metadata = aladin::Client::new(config.aladin_key(), config.timeout())?;
    let catalog = read365::Client::new(school.prov_code(), school.neis_code(), config.timeout())?;

    Ok(procedure::Job::new(metadata, catalog, config.max_retries()))
}
