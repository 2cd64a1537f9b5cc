use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use loan_eligibility::workflows::eligibility::{
    CompletionOutcome, FlowController, SubmissionClient, SubmissionTicket,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// The one applicant session served by this process. The controller lock is
/// never held while a request is in flight, so submissions may overlap.
pub(crate) struct PortalSession<C> {
    controller: Mutex<FlowController>,
    client: Arc<C>,
}

impl<C> PortalSession<C> {
    pub(crate) fn new(controller: FlowController, client: Arc<C>) -> Self {
        Self {
            controller: Mutex::new(controller),
            client,
        }
    }

    /// A panic in another handler must not lock the applicant out; the
    /// controller stays consistent because every mutation completes under the lock.
    pub(crate) fn controller(&self) -> MutexGuard<'_, FlowController> {
        self.controller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C> PortalSession<C>
where
    C: SubmissionClient + 'static,
{
    /// Await the request for `ticket` and apply its outcome. If the caller
    /// drops this future first (client disconnect), the ticket is abandoned.
    pub(crate) async fn resolve(&self, ticket: SubmissionTicket) -> CompletionOutcome {
        let mut in_flight = InFlight {
            session: self,
            ticket: &ticket,
            armed: true,
        };
        let outcome = self.client.submit(&ticket.payload).await;
        in_flight.armed = false;
        self.controller().complete(&ticket, outcome)
    }
}

struct InFlight<'a, C> {
    session: &'a PortalSession<C>,
    ticket: &'a SubmissionTicket,
    armed: bool,
}

impl<C> Drop for InFlight<'_, C> {
    fn drop(&mut self) {
        if self.armed {
            self.session.controller().abandon(self.ticket);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use loan_eligibility::workflows::eligibility::{
        EligibilityResult, FlowPhase, SubmissionError, SubmissionPayload,
    };
    use std::time::Duration;

    /// Never answers the first request; answers every later one as not eligible.
    #[derive(Default)]
    struct StallingClient {
        calls: Mutex<usize>,
    }

    fn not_eligible() -> EligibilityResult {
        EligibilityResult {
            eligible: false,
            cibil_score: 480,
            predicted_amount: 35_000,
            reason: None,
            loans: Vec::new(),
        }
    }

    #[async_trait]
    impl SubmissionClient for StallingClient {
        async fn submit(
            &self,
            _payload: &SubmissionPayload,
        ) -> Result<EligibilityResult, SubmissionError> {
            let call = {
                let mut calls = self.calls.lock().expect("call counter");
                *calls += 1;
                *calls
            };
            if call == 1 {
                std::future::pending::<()>().await;
            }
            Ok(not_eligible())
        }
    }

    #[tokio::test]
    async fn dropped_request_does_not_leave_the_session_submitting() {
        let session = PortalSession::new(
            FlowController::default(),
            Arc::new(StallingClient::default()),
        );

        let stalled = session.controller().begin_eligibility_check();
        let timed_out =
            tokio::time::timeout(Duration::from_millis(20), session.resolve(stalled)).await;
        assert!(timed_out.is_err());
        assert_eq!(session.controller().pending_count(), 0);
        assert_eq!(session.controller().phase(), FlowPhase::Idle);

        let retry = session.controller().begin_eligibility_check();
        assert_eq!(session.resolve(retry).await, CompletionOutcome::Applied);

        let controller = session.controller();
        assert_eq!(controller.phase(), FlowPhase::NotEligible);
        assert_eq!(controller.pending_count(), 0);
    }

    #[test]
    fn poisoned_lock_still_serves_the_session() {
        let session = PortalSession::new(
            FlowController::default(),
            Arc::new(StallingClient::default()),
        );

        let panicked = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = session.controller();
            panic!("handler panicked while holding the session");
        }));
        assert!(panicked.is_err());

        let mut controller = session.controller();
        assert_eq!(controller.phase(), FlowPhase::Idle);
        controller.begin_eligibility_check();
        assert_eq!(controller.phase(), FlowPhase::Submitting);
    }
}
