use std::sync::Arc;

use crate::directory::UserDirectory;
use crate::rate_limit::{UsageLedger, now_secs};

// Why a request was turned away before reaching the AI service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    Unauthorized,
    Forbidden,
    // quota for the trailing window is used up
    RateLimited { retry_after: u64 },
}

impl Denial {
    pub fn reason(&self) -> &'static str {
        match self {
            Denial::Unauthorized => "unauthorized",
            Denial::Forbidden => "forbidden",
            Denial::RateLimited { .. } => "rate_limited",
        }
    }
}

// Authorization followed by quota admission, short-circuiting on the
// first failing gate. Only premium users ever touch the ledger.
pub struct AdmissionController {
    directory: Arc<dyn UserDirectory>,
    ledger: Arc<UsageLedger>,
}

impl AdmissionController {
    pub fn new(directory: Arc<dyn UserDirectory>, ledger: Arc<UsageLedger>) -> Self {
        Self { directory, ledger }
    }

    pub fn ledger(&self) -> &Arc<UsageLedger> {
        &self.ledger
    }

    pub fn admit(&self, username: &str) -> Result<(), Denial> {
        self.admit_at(username, now_secs())
    }

    pub fn admit_at(&self, username: &str, now: f64) -> Result<(), Denial> {
        let user = self.directory.lookup(username).ok_or(Denial::Unauthorized)?;

        if !user.premium {
            return Err(Denial::Forbidden);
        }

        self.ledger
            .try_record(&user.username, now)
            .map_err(|retry_after| Denial::RateLimited { retry_after })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::StaticDirectory;
    use std::time::Duration;

    fn controller() -> AdmissionController {
        let directory = StaticDirectory::new([("aditya", true), ("guest", false)]);
        AdmissionController::new(
            Arc::new(directory),
            Arc::new(UsageLedger::new(5, Duration::from_secs(60))),
        )
    }

    #[test]
    fn unknown_user_is_unauthorized_regardless_of_history() {
        let admission = controller();
        for i in 0..10 {
            assert_eq!(
                admission.admit_at("nobody", 1000.0 + i as f64),
                Err(Denial::Unauthorized)
            );
        }
        assert_eq!(admission.ledger().tracked_users(), 0);
    }

    #[test]
    fn non_premium_user_is_forbidden_without_prior_usage() {
        let admission = controller();
        assert_eq!(admission.admit_at("guest", 1000.0), Err(Denial::Forbidden));
        assert_eq!(admission.ledger().usage("guest"), 0);
    }

    #[test]
    fn premium_user_under_quota_is_admitted_and_recorded() {
        let admission = controller();
        assert_eq!(admission.admit_at("aditya", 1000.0), Ok(()));
        assert_eq!(admission.ledger().usage("aditya"), 1);
    }

    #[test]
    fn sixth_request_in_window_is_rate_limited() {
        let admission = controller();
        for i in 0..5 {
            assert_eq!(admission.admit_at("aditya", 1000.0 + i as f64), Ok(()));
        }
        assert_eq!(
            admission.admit_at("aditya", 1010.0),
            Err(Denial::RateLimited { retry_after: 50 })
        );
        assert_eq!(admission.ledger().usage("aditya"), 5);
    }

    #[test]
    fn admission_resumes_after_window_slides() {
        let admission = controller();
        for i in 0..5 {
            admission.admit_at("aditya", 1000.0 + i as f64).unwrap();
        }
        assert!(admission.admit_at("aditya", 1030.0).is_err());
        assert_eq!(admission.admit_at("aditya", 1060.5), Ok(()));
    }

    #[test]
    fn denial_reasons_are_stable_labels() {
        assert_eq!(Denial::Unauthorized.reason(), "unauthorized");
        assert_eq!(Denial::Forbidden.reason(), "forbidden");
        assert_eq!(Denial::RateLimited { retry_after: 1 }.reason(), "rate_limited");
    }
}
