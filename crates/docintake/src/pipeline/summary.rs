use serde::Serialize;

use crate::worker::FileReport;

/// Counters and per-file reports of one batch run.
///
/// Counts follow the processing outcome: a successfully extracted file whose
/// move failed still counts as a success and is also counted in
/// `routing_failures`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub successes: usize,
    pub errors: usize,
    pub total: usize,
    pub routing_failures: usize,
    pub reports: Vec<FileReport>,
}

impl BatchSummary {
    pub fn from_reports(reports: Vec<FileReport>) -> Self {
        let mut summary = Self::default();
        for report in reports {
            summary.record(report);
        }
        summary
    }

    pub fn record(&mut self, report: FileReport) {
        if report.success {
            self.successes += 1;
        } else {
            self.errors += 1;
        }
        if report.route_failed() {
            self.routing_failures += 1;
        }
        self.total += 1;
        self.reports.push(report);
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
