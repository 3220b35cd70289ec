// 🧾 Expense Records - spending report
//
// Every statistic follows the registry's empty-case convention: totals and
// averages are 0, extremes and "winning" groups are None.
// Categories and payment methods compare case-insensitively everywhere;
// a group is reported under the first spelling seen.

use crate::error::ValidationError;
use crate::registry::{Aggregation, Record, Registry};
use crate::validation::{require_non_empty, require_positive};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expense {
    id: u64,
    category: String,
    date: Option<NaiveDate>,
    amount: f64,
    payment_method: String,
}

impl Expense {
    pub fn new(
        id: u64,
        category: &str,
        date: Option<NaiveDate>,
        amount: f64,
        payment_method: &str,
    ) -> Result<Self, ValidationError> {
        require_non_empty("category", category)?;
        require_positive("amount", amount)?;
        require_non_empty("payment_method", payment_method)?;

        Ok(Expense {
            id,
            category: category.trim().to_string(),
            date,
            amount,
            payment_method: payment_method.trim().to_string(),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }
}

impl Record for Expense {
    type Key = u64;
    type Variant = ();
    const KIND: &'static str = "expense";

    fn key(&self) -> &u64 {
        &self.id
    }

    fn variant(&self) {}
}

/// Snapshot of every spending statistic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseReport {
    pub count: usize,
    pub total: f64,
    pub average: f64,
    pub max: Option<f64>,
    pub min: Option<f64>,
    pub top_category: Option<String>,
    pub bottom_category: Option<String>,
    pub top_method: Option<String>,
    pub bottom_method: Option<String>,
}

/// Grouping label, equal ignoring ASCII case
#[derive(Debug, Clone)]
struct Label(String);

impl Label {
    fn of(value: &str) -> Self {
        Label(value.to_string())
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

pub type Ledger = Registry<Expense>;

impl Registry<Expense> {
    pub fn record_expense(
        &mut self,
        category: &str,
        date: Option<NaiveDate>,
        amount: f64,
        payment_method: &str,
    ) -> crate::error::RegistryResult<&Expense> {
        self.add_with(|id| Expense::new(id, category, date, amount, payment_method))
    }

    pub fn total_spent(&self) -> f64 {
        self.sum(Expense::amount)
    }

    pub fn average_expense(&self) -> f64 {
        self.average(Expense::amount)
    }

    pub fn largest_expense(&self) -> Option<&Expense> {
        self.max_by(Expense::amount)
    }

    pub fn smallest_expense(&self) -> Option<&Expense> {
        self.min_by(Expense::amount)
    }

    /// Category with the highest average amount
    pub fn top_category(&self) -> Option<String> {
        self.group_max_by(|e| Label::of(e.category()), Expense::amount, Aggregation::Average)
            .map(|Label(label)| label)
    }

    /// Category with the lowest average amount
    pub fn bottom_category(&self) -> Option<String> {
        self.group_min_by(|e| Label::of(e.category()), Expense::amount, Aggregation::Average)
            .map(|Label(label)| label)
    }

    /// Payment method with the highest total
    pub fn top_payment_method(&self) -> Option<String> {
        self.group_max_by(|e| Label::of(e.payment_method()), Expense::amount, Aggregation::Sum)
            .map(|Label(label)| label)
    }

    /// Payment method with the lowest total
    pub fn bottom_payment_method(&self) -> Option<String> {
        self.group_min_by(|e| Label::of(e.payment_method()), Expense::amount, Aggregation::Sum)
            .map(|Label(label)| label)
    }

    pub fn in_category(&self, category: &str) -> Vec<&Expense> {
        self.filter(|e| e.category().eq_ignore_ascii_case(category))
    }

    pub fn report(&self) -> ExpenseReport {
        ExpenseReport {
            count: self.len(),
            total: self.total_spent(),
            average: self.average_expense(),
            max: self.max(Expense::amount),
            min: self.min(Expense::amount),
            top_category: self.top_category(),
            bottom_category: self.bottom_category(),
            top_method: self.top_payment_method(),
            bottom_method: self.bottom_payment_method(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.record_expense("food", None, 10.0, "cash").unwrap();
        ledger.record_expense("food", None, 30.0, "card").unwrap();
        ledger.record_expense("travel", None, 100.0, "card").unwrap();
        ledger.record_expense("books", None, 5.0, "cash").unwrap();
        ledger
    }

    #[test]
    fn test_report_statistics() {
        let report = ledger().report();

        assert_eq!(report.count, 4);
        assert_eq!(report.total, 145.0);
        assert_eq!(report.average, 36.25);
        assert_eq!(report.max, Some(100.0));
        assert_eq!(report.min, Some(5.0));
        assert_eq!(report.top_category.as_deref(), Some("travel"));
        assert_eq!(report.bottom_category.as_deref(), Some("books"));
        assert_eq!(report.top_method.as_deref(), Some("card"));
        assert_eq!(report.bottom_method.as_deref(), Some("cash"));
    }

    #[test]
    fn test_empty_report() {
        let report = Ledger::new().report();

        assert_eq!(report.total, 0.0);
        assert!(report.total.is_sign_positive());
        assert_eq!(format!("{:.2}", report.total), "0.00");
        assert_eq!(report.average, 0.0);
        assert_eq!(report.max, None);
        assert_eq!(report.min, None);
        assert_eq!(report.top_category, None);
        assert_eq!(report.bottom_method, None);
    }

    #[test]
    fn test_ties_go_to_first_group() {
        let mut ledger = Ledger::new();
        ledger.record_expense("a", None, 20.0, "cash").unwrap();
        ledger.record_expense("b", None, 20.0, "card").unwrap();

        assert_eq!(ledger.top_category().as_deref(), Some("a"));
        assert_eq!(ledger.bottom_category().as_deref(), Some("a"));
        assert_eq!(ledger.top_payment_method().as_deref(), Some("cash"));
    }

    #[test]
    fn test_grouping_ignores_case() {
        let mut ledger = Ledger::new();
        ledger.record_expense("Food", None, 10.0, "Card").unwrap();
        ledger.record_expense("travel", None, 25.0, "cash").unwrap();
        ledger.record_expense("food", None, 50.0, "CARD").unwrap();

        // Food averages 30, travel 25
        assert_eq!(ledger.top_category().as_deref(), Some("Food"));
        assert_eq!(ledger.bottom_category().as_deref(), Some("travel"));
        assert_eq!(ledger.in_category("FOOD").len(), 2);
        // Card totals 60
        assert_eq!(ledger.top_payment_method().as_deref(), Some("Card"));
        assert_eq!(ledger.bottom_payment_method().as_deref(), Some("cash"));
    }

    #[test]
    fn test_progressive_ids_and_rejections() {
        let mut ledger = ledger();
        assert!(ledger.record_expense("food", None, 0.0, "cash").is_err());
        assert!(ledger.record_expense(" ", None, 1.0, "cash").is_err());

        let next = ledger.record_expense("food", None, 1.0, "cash").unwrap();
        assert_eq!(next.id(), 5);
        assert_eq!(ledger.in_category("FOOD").len(), 3);
    }

    proptest! {
        #[test]
        fn prop_average_within_bounds(amounts in prop::collection::vec(0.01f64..10_000.0, 1..40)) {
            let mut ledger = Ledger::new();
            for amount in &amounts {
                ledger.record_expense("misc", None, *amount, "cash").unwrap();
            }

            let report = ledger.report();
            let min = report.min.unwrap();
            let max = report.max.unwrap();
            prop_assert!(report.average >= min - 1e-9);
            prop_assert!(report.average <= max + 1e-9);
        }
    }
}
