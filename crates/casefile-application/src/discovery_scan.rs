//! Cancellable discovery scan with per-file progress.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use casefile_core::CaseError;
use casefile_core::case::Allegation;
use casefile_core::discovery::{
    DISCOVERY_SERVICE, DiscoveredFile, DiscoveredItem, DiscoveryService, ScanFilter,
};
use casefile_core::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanProgress {
    pub processed: usize,
    pub total: usize,
}

/// A file that could not be fetched or classified.
#[derive(Debug, Clone)]
pub struct ScanFailure {
    pub file_id: String,
    pub file_name: String,
    pub error: CaseError,
}

#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Relevant files, in scan order.
    pub items: Vec<DiscoveredItem>,
    pub failures: Vec<ScanFailure>,
    pub processed: usize,
    pub total: usize,
    pub cancelled: bool,
}

pub struct DiscoveryScanner {
    service: Arc<dyn DiscoveryService>,
}

impl DiscoveryScanner {
    pub fn new(service: Arc<dyn DiscoveryService>) -> Self {
        Self { service }
    }

    /// Lists matching files, then fetches and classifies them one at a time.
    ///
    /// A failing file is recorded and skipped. Cancellation stops the scan
    /// before the next file, or aborts the file in progress; whatever was
    /// found so far is returned. Only a failed listing is an error.
    pub async fn run(
        &self,
        filter: &ScanFilter,
        allegations: &[Allegation],
        cancel: CancellationToken,
        progress: Option<mpsc::UnboundedSender<ScanProgress>>,
    ) -> Result<ScanReport> {
        let mut files = self.service.scan(filter).await.map_err(|e| match e {
            CaseError::ServiceFailure { .. } => e,
            other => CaseError::service(DISCOVERY_SERVICE, other.to_string()),
        })?;
        if let Some(max) = filter.max_files {
            files.truncate(max);
        }

        let mut report = ScanReport {
            total: files.len(),
            ..Default::default()
        };
        tracing::info!(total = report.total, "Discovery scan started");

        for file in &files {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let outcome = tokio::select! {
                _ = cancel.cancelled() => {
                    report.cancelled = true;
                    break;
                }
                outcome = self.process(file, allegations) => outcome,
            };

            match outcome {
                Ok(Some(item)) => report.items.push(item),
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(file_id = %file.id, error = %error, "Discovery failed for file");
                    report.failures.push(ScanFailure {
                        file_id: file.id.clone(),
                        file_name: file.name.clone(),
                        error,
                    });
                }
            }

            report.processed += 1;
            if let Some(tx) = &progress {
                let _ = tx.send(ScanProgress {
                    processed: report.processed,
                    total: report.total,
                });
            }
        }

        tracing::info!(
            processed = report.processed,
            relevant = report.items.len(),
            failed = report.failures.len(),
            cancelled = report.cancelled,
            "Discovery scan finished"
        );
        Ok(report)
    }

    async fn process(
        &self,
        file: &DiscoveredFile,
        allegations: &[Allegation],
    ) -> Result<Option<DiscoveredItem>> {
        let content = self.service.fetch(file).await?;
        let classification = self.service.classify(&content, allegations).await?;
        Ok(classification
            .filter(|c| c.is_relevant)
            .map(|c| DiscoveredItem::from_classification(file, content, c)))
    }
}
