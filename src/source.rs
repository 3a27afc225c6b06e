use async_trait::async_trait;

use crate::stats::StatisticsRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub include_languages: bool,
    pub language_count: usize,
}

/// Where statistics come from.
///
/// `Ok(None)` means the handle does not exist. Any other failure is returned
/// as an error and is not retried by the caller.
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn fetch_statistics(
        &self,
        handle: &str,
        options: FetchOptions,
    ) -> anyhow::Result<Option<StatisticsRecord>>;
}
