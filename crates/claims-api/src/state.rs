//! Application state.

use database::Database;
use verification::VerificationService;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub service: VerificationService,
    /// Owner assigned to claims created without a `user_id`.
    pub default_claim_owner_id: i64,
}

impl AppState {
    pub fn new(db: Database, service: VerificationService, default_claim_owner_id: i64) -> Self {
        Self {
            db,
            service,
            default_claim_owner_id,
        }
    }
}
