// 📖 Library
// Catalog of publications with progressive ids + loan ledger
//
// Loan windows come from LibraryConfig at insertion time, so a catalog built
// with a 21-day book policy keeps lending books for 21 days.

use crate::config::LibraryConfig;
use crate::error::{RegistryError, RegistryResult, StateError};
use crate::records::publication::{Catalog, LoanSummary, Publication, PublicationDetails, PublicationType};
use crate::registry::Record;
use crate::session::{SessionLedger, SessionOf};
use crate::validation::require_non_empty;
use chrono::NaiveDate;

pub type Loan = SessionOf<Publication>;

#[derive(Debug, Clone)]
pub struct Library {
    name: String,
    policy: LibraryConfig,
    catalog: Catalog,
    loans: SessionLedger<Publication>,
}

impl Library {
    pub fn new(name: &str, policy: LibraryConfig) -> RegistryResult<Self> {
        require_non_empty("name", name)?;
        Ok(Library {
            name: name.to_string(),
            policy,
            catalog: Catalog::new(),
            loans: SessionLedger::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn policy(&self) -> &LibraryConfig {
        &self.policy
    }

    // ========================================================================
    // CATALOG
    // ========================================================================

    pub fn add_book(&mut self, details: PublicationDetails, isbn: &str, author: &str) -> RegistryResult<&Publication> {
        let loan_days = self.policy.book_loan_days;
        self.catalog
            .add_with(|id| Publication::book(id, details, isbn, author, loan_days))
    }

    pub fn add_magazine(
        &mut self,
        details: PublicationDetails,
        issue: u32,
        frequency: &str,
    ) -> RegistryResult<&Publication> {
        let loan_days = self.policy.magazine_loan_days;
        self.catalog
            .add_with(|id| Publication::magazine(id, details, issue, frequency, loan_days))
    }

    /// Remove a publication that is not on loan
    pub fn remove(&mut self, id: u64) -> RegistryResult<Publication> {
        if !self.loans.is_available(&id) {
            return Err(StateError::NotAllowed {
                operation: "remove publication".to_string(),
                reason: format!("publication {} is on loan", id),
            }
            .into());
        }
        self.catalog
            .remove(&id)
            .ok_or_else(|| RegistryError::not_found(Publication::KIND, id))
    }

    pub fn find(&self, id: u64) -> Option<&Publication> {
        self.catalog.find(&id)
    }

    pub fn books(&self) -> Vec<&Publication> {
        self.catalog.books()
    }

    pub fn magazines(&self) -> Vec<&Publication> {
        self.catalog.magazines()
    }

    pub fn count(&self, publication_type: PublicationType) -> usize {
        self.catalog.count_variant(publication_type)
    }

    // ========================================================================
    // LOANS
    // ========================================================================

    pub fn lend(&mut self, id: u64, borrower: &str, start: NaiveDate) -> RegistryResult<&Loan> {
        self.loans.open(&self.catalog, &id, borrower, start)
    }

    /// Close a loan, returning due date and overdue days
    pub fn return_loan(&mut self, loan_id: &str, returned_on: NaiveDate) -> RegistryResult<LoanSummary> {
        self.loans.close(&self.catalog, loan_id, returned_on, ()).copied()
    }

    /// Close whichever loan currently holds this publication
    pub fn return_publication(&mut self, id: u64, returned_on: NaiveDate) -> RegistryResult<LoanSummary> {
        let loan_id = match self.loans.open_session_for(&id) {
            Some(loan) => loan.id().to_string(),
            None if self.catalog.contains(&id) => {
                return Err(StateError::NotAllowed {
                    operation: "return publication".to_string(),
                    reason: format!("publication {} is not on loan", id),
                }
                .into())
            }
            None => return Err(RegistryError::not_found(Publication::KIND, id)),
        };
        self.return_loan(&loan_id, returned_on)
    }

    /// Due date of an open loan
    pub fn due_date(&self, loan_id: &str) -> RegistryResult<NaiveDate> {
        let loan = self.loans.get(loan_id)?;
        if !loan.is_open() {
            return Err(StateError::AlreadyClosed {
                session: loan_id.to_string(),
            }
            .into());
        }
        let publication = self.catalog.get(loan.record())?;
        Ok(publication.due_date(loan.opened_on())?)
    }

    /// Open loans whose due date precedes `today`
    pub fn overdue(&self, today: NaiveDate) -> Vec<&Loan> {
        self.loans
            .active()
            .into_iter()
            .filter(|loan| {
                self.catalog
                    .find(loan.record())
                    .and_then(|p| p.due_date(loan.opened_on()).ok())
                    .map_or(false, |due| due < today)
            })
            .collect()
    }

    pub fn on_loan(&self) -> Vec<&Publication> {
        self.catalog.filter(|p| !self.loans.is_available(p.key()))
    }

    pub fn available(&self) -> Vec<&Publication> {
        self.catalog.filter(|p| self.loans.is_available(p.key()))
    }

    pub fn active_loans(&self) -> Vec<&Loan> {
        self.loans.active()
    }

    pub fn loan(&self, loan_id: &str) -> RegistryResult<&Loan> {
        self.loans.get(loan_id)
    }
}
