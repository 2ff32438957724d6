use loan_config::Config;
use loan_core::{Clock, OverdueMonitor};
use loan_domain::{Loan, LoanId, NotificationState, OverdueNotification};
use loan_storage_json::NotificationStateFile;
use tracing::{debug, info};

use crate::errors::AppResult;

/// Tracks which overdue reminders the user has dismissed during a session.
///
/// Every dismissal is written through to the state file right away.
pub struct NotificationSession<C: Clock> {
    file: NotificationStateFile,
    state: NotificationState,
    clock: C,
}

impl<C: Clock> NotificationSession<C> {
    /// Loads the saved state, or starts from an empty one when
    /// `reset_dismissed` is set.
    pub fn start(file: NotificationStateFile, clock: C, reset_dismissed: bool) -> AppResult<Self> {
        let state = if reset_dismissed {
            let state = NotificationState::new();
            file.save(&state)?;
            info!("cleared dismissed notifications for new session");
            state
        } else {
            file.load()?
        };
        Ok(Self { file, state, clock })
    }

    pub fn from_config(file: NotificationStateFile, clock: C, config: &Config) -> AppResult<Self> {
        Self::start(file, clock, config.reset_dismissed_on_session_start)
    }

    /// Overdue, undismissed loans as of the session clock's today.
    pub fn active(&self, loans: &[Loan]) -> Vec<OverdueNotification> {
        OverdueMonitor::active_notifications(loans, &self.state, self.clock.today())
    }

    pub fn dismiss(&mut self, loan_id: LoanId) -> AppResult<()> {
        let next = OverdueMonitor::dismiss(loan_id, self.state.clone());
        self.file.save(&next)?;
        self.state = next;
        debug!(loan = %loan_id, "dismissed overdue notification");
        Ok(())
    }

    pub fn state(&self) -> &NotificationState {
        &self.state
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
