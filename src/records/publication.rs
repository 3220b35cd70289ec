// 📚 Publication Records - library catalog
//
// Books and magazines share title / date / pages and differ in their loan
// window. The due date is the only compute operation:
//   due_on = loan start + loan_days
// Loan windows are capped at MAX_LOAN_DAYS and a due date past the end of
// the calendar is an error, never a panic.

use crate::error::ValidationError;
use crate::registry::{Record, Registry};
use crate::session::{Period, Settle};
use crate::validation::{require_at_most, require_non_empty, require_positive_int};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

pub const BOOK_LOAN_DAYS: u32 = 30;
pub const MAGAZINE_LOAN_DAYS: u32 = 7;
pub const MAX_LOAN_DAYS: u32 = 3650;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PublicationType {
    Book,
    Magazine,
}

impl PublicationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicationType::Book => "Book",
            PublicationType::Magazine => "Magazine",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PublicationKind {
    Book { isbn: String, author: String },
    Magazine { issue: u32, frequency: String },
}

/// Catalog attributes common to every publication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationDetails {
    pub title: String,
    pub published_on: NaiveDate,
    pub pages: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Publication {
    id: u64,
    details: PublicationDetails,
    loan_days: u32,
    kind: PublicationKind,
}

/// Outcome of a returned loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub due_on: NaiveDate,
    pub returned_on: NaiveDate,
    pub days_held: i64,
    pub days_overdue: i64,
}

impl LoanSummary {
    pub fn is_overdue(&self) -> bool {
        self.days_overdue > 0
    }
}

impl Publication {
    pub fn new(
        id: u64,
        details: PublicationDetails,
        loan_days: u32,
        kind: PublicationKind,
    ) -> Result<Self, ValidationError> {
        if id == 0 {
            return Err(ValidationError::invalid("id", "ids start at 1"));
        }
        require_non_empty("title", &details.title)?;
        require_positive_int("pages", details.pages)?;
        require_positive_int("loan_days", loan_days)?;
        require_at_most("loan_days", loan_days.into(), MAX_LOAN_DAYS.into())?;

        match &kind {
            PublicationKind::Book { isbn, author } => {
                require_non_empty("isbn", isbn)?;
                require_non_empty("author", author)?;
            }
            PublicationKind::Magazine { issue, frequency } => {
                require_positive_int("issue", *issue)?;
                require_non_empty("frequency", frequency)?;
            }
        }

        Ok(Publication {
            id,
            details,
            loan_days,
            kind,
        })
    }

    pub fn book(
        id: u64,
        details: PublicationDetails,
        isbn: &str,
        author: &str,
        loan_days: u32,
    ) -> Result<Self, ValidationError> {
        Self::new(
            id,
            details,
            loan_days,
            PublicationKind::Book {
                isbn: isbn.to_string(),
                author: author.to_string(),
            },
        )
    }

    pub fn magazine(
        id: u64,
        details: PublicationDetails,
        issue: u32,
        frequency: &str,
        loan_days: u32,
    ) -> Result<Self, ValidationError> {
        Self::new(
            id,
            details,
            loan_days,
            PublicationKind::Magazine {
                issue,
                frequency: frequency.to_string(),
            },
        )
    }

    /// Loan start + loan window
    pub fn due_date(&self, start: NaiveDate) -> Result<NaiveDate, ValidationError> {
        start
            .checked_add_days(Days::new(self.loan_days.into()))
            .ok_or_else(|| ValidationError::invalid("due_date", format!("{} + {} days is out of range", start, self.loan_days)))
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.details.title
    }

    pub fn published_on(&self) -> NaiveDate {
        self.details.published_on
    }

    pub fn pages(&self) -> u32 {
        self.details.pages
    }

    pub fn loan_days(&self) -> u32 {
        self.loan_days
    }

    pub fn details(&self) -> &PublicationDetails {
        &self.details
    }

    pub fn kind(&self) -> &PublicationKind {
        &self.kind
    }

    pub fn publication_type(&self) -> PublicationType {
        match self.kind {
            PublicationKind::Book { .. } => PublicationType::Book,
            PublicationKind::Magazine { .. } => PublicationType::Magazine,
        }
    }

    pub fn author(&self) -> Option<&str> {
        match &self.kind {
            PublicationKind::Book { author, .. } => Some(author),
            PublicationKind::Magazine { .. } => None,
        }
    }

    pub fn summary(&self) -> String {
        let detail = match &self.kind {
            PublicationKind::Book { isbn, author } => format!("{} (ISBN {})", author, isbn),
            PublicationKind::Magazine { issue, frequency } => format!("issue {} - {}", issue, frequency),
        };
        format!(
            "{} #{} \"{}\" {} - {} pages, {} - {}-day loan",
            self.publication_type().as_str(),
            self.id,
            self.details.title,
            self.details.published_on,
            self.details.pages,
            detail,
            self.loan_days
        )
    }
}

impl Record for Publication {
    type Key = u64;
    type Variant = PublicationType;
    const KIND: &'static str = "publication";

    fn key(&self) -> &u64 {
        &self.id
    }

    fn variant(&self) -> PublicationType {
        self.publication_type()
    }
}

impl Settle for Publication {
    type Usage = ();
    type Outcome = LoanSummary;

    fn check_usage(&self, _usage: &()) -> Result<(), ValidationError> {
        Ok(())
    }

    fn settle(&self, period: &Period, _usage: &()) -> Result<LoanSummary, ValidationError> {
        let due_on = self.due_date(period.start)?;
        Ok(LoanSummary {
            due_on,
            returned_on: period.end,
            days_held: period.elapsed_days(),
            days_overdue: (period.end - due_on).num_days().max(0),
        })
    }
}

pub type Catalog = Registry<Publication>;

impl Registry<Publication> {
    pub fn books(&self) -> Vec<&Publication> {
        self.by_variant(PublicationType::Book)
    }

    pub fn magazines(&self) -> Vec<&Publication> {
        self.by_variant(PublicationType::Magazine)
    }

    /// Case-insensitive substring match on the title
    pub fn search_title(&self, needle: &str) -> Vec<&Publication> {
        let needle = needle.to_lowercase();
        self.filter(|p| p.title().to_lowercase().contains(&needle))
    }

    pub fn by_author(&self, author: &str) -> Vec<&Publication> {
        self.filter(|p| p.author().map_or(false, |a| a.eq_ignore_ascii_case(author)))
    }
}
