//! Operator registry: the set of identities trusted to broker escrows.
//!
//! Membership is checked at call time, so removing an operator takes effect
//! on the very next release or cancel they attempt.

use std::collections::BTreeSet;

use tradevault_types::AccountId;

#[derive(Debug, Default)]
pub struct OperatorRegistry {
    operators: BTreeSet<AccountId>,
}

impl OperatorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `operator`. Returns `false` if it was already trusted.
    pub fn add(&mut self, operator: AccountId) -> bool {
        self.operators.insert(operator)
    }

    /// Remove `operator`. Returns `false` if it was not trusted.
    pub fn remove(&mut self, operator: &AccountId) -> bool {
        self.operators.remove(operator)
    }

    #[must_use]
    pub fn contains(&self, account: &AccountId) -> bool {
        self.operators.contains(account)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operators.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccountId> {
        self.operators.iter()
    }
}
