use std::collections::VecDeque;

use tracing::{info, warn};

use super::sinks::EmailTransport;
use super::{EmailDedupeLog, EmailJob};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FlushReport {
    pub sent: usize,
    pub failed: usize,
}

/// Emails waiting to be handed to the transport. Drained once per refresh,
/// after every budget has been computed.
#[derive(Debug, Default)]
pub(crate) struct EmailOutbox {
    pending: VecDeque<EmailJob>,
}

impl EmailOutbox {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a job unless one for the same category, template and day is
    /// already waiting. Returns whether it was queued.
    pub(crate) fn enqueue(&mut self, job: EmailJob) -> bool {
        if self.pending.iter().any(|p| p.key() == job.key()) {
            return false;
        }
        self.pending.push_back(job);
        true
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    /// Send everything queued. Only confirmed sends are recorded in `log`;
    /// failures are logged and dropped so the next refresh can retry them.
    pub(crate) fn flush(
        &mut self,
        transport: &dyn EmailTransport,
        log: &mut EmailDedupeLog,
    ) -> FlushReport {
        let mut report = FlushReport::default();
        while let Some(job) = self.pending.pop_front() {
            let template = job.request.template.as_str();
            match transport.send(&job.request) {
                Ok(true) => {
                    log.mark_sent(job.category_id, job.request.template, job.day);
                    info!(template, budget = %job.request.data.budget_name, "Budget email sent");
                    report.sent += 1;
                }
                Ok(false) => {
                    warn!(template, budget = %job.request.data.budget_name, "Email transport rejected budget email");
                    report.failed += 1;
                }
                Err(e) => {
                    warn!(template, budget = %job.request.data.budget_name, error = %e, "Failed to send budget email");
                    report.failed += 1;
                }
            }
        }
        report
    }
}
