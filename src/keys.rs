//! Key schema
//!
//! Maps ledger coordinates onto the store's key namespace. The layout is
//! shared with existing stored data and must stay byte-for-byte stable:
//!
//! ```text
//! org:<org>:eu:<eu>:settlement-id:<settlement>:tills
//! org:<org>:eu:<eu>:settlement-id:<settlement>:till:<t>:tenders
//! org:<org>:eu:<eu>:settlement-id:<settlement>:till:<t>:tender:<d>
//! org:<org>:eu:<eu>:settlement-id:<settlement>:till:<t>:tender:<d>:denominations
//! org:<org>:eu:<eu>:settlement-id:<settlement>:till:<t>:tender:<d>:denomination:<n>
//! org:<org>:eu:<eu>:settlement-id:<settlement>:journal
//! org:<org>:eu:<eu>:settlement-id:<settlement>:journal:seq
//! ```

use crate::domain::LedgerAddress;

/// Hash field holding a denomination's running count
pub const COUNT_FIELD: &str = "count";

/// Hash field holding a denomination's running amount
pub const AMOUNT_FIELD: &str = "amount";

/// Key builder for one ledger.
#[derive(Debug, Clone)]
pub struct KeySchema {
    base: String,
}

impl KeySchema {
    pub fn new(address: &LedgerAddress) -> Self {
        Self {
            base: format!(
                "org:{}:eu:{}:settlement-id:{}",
                address.organization(),
                address.enterprise_unit(),
                address.settlement_doc_id()
            ),
        }
    }

    /// Set of till IDs
    pub fn tills_set(&self) -> String {
        format!("{}:tills", self.base)
    }

    /// Set of tender IDs held by a till
    pub fn tenders_set(&self, till: &str) -> String {
        format!("{}:till:{}:tenders", self.base, till)
    }

    /// Scalar decimal balance of one tender
    pub fn tender_balance(&self, till: &str, tender: &str) -> String {
        format!("{}:till:{}:tender:{}", self.base, till, tender)
    }

    /// Set of denomination names of one tender
    pub fn denominations_set(&self, till: &str, tender: &str) -> String {
        format!("{}:till:{}:tender:{}:denominations", self.base, till, tender)
    }

    /// Hash with `count` and `amount` fields
    pub fn denomination_record(&self, till: &str, tender: &str, denomination: &str) -> String {
        format!(
            "{}:till:{}:tender:{}:denomination:{}",
            self.base, till, tender, denomination
        )
    }

    /// List of serialized journal entries
    pub fn journal(&self) -> String {
        format!("{}:journal", self.base)
    }

    /// Counter handing out journal sequence numbers
    pub fn journal_sequence(&self) -> String {
        format!("{}:journal:seq", self.base)
    }
}
