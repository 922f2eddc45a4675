//! The account aggregate: one ledger, the active tasks, and at most one
//! running adventure.
//!
//! Everything the remote store persists for an account lives here. The
//! aggregate is plain data; mutations go through the module functions and
//! the progression facade, which treat each operation as a critical
//! section (callers sharing an aggregate across threads wrap it in a
//! single mutex).

use serde::{Deserialize, Serialize};

use crate::adventure::Adventure;
use crate::ledger::Ledger;
use crate::roster::TaskRoster;

/// In-memory state of one user account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    pub ledger: Ledger,
    pub tasks: TaskRoster,
    pub adventure: Option<Adventure>,
}

impl AccountState {
    /// A brand-new account: empty roster, default ledger, no adventure.
    #[must_use]
    pub fn fresh() -> Self {
        Self::default()
    }
}
