// 💳 Payment Methods
//
// Commission is the only compute operation:
//   CreditCard / PremiumCard → amount × rate
//   BankTransfer            → flat fee
// A method authorizes any strictly positive amount.

use crate::error::{RegistryError, RegistryResult, ValidationError};
use crate::registry::{Record, Registry};
use crate::validation::{require_non_empty, require_non_negative, require_positive, require_range};
use serde::{Deserialize, Serialize};

pub const CARD_RATE: f64 = 0.02;
pub const PREMIUM_CARD_RATE: f64 = 0.015;
pub const TRANSFER_FEE: f64 = 2.50;

// ============================================================================
// PAYMENT METHOD
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentType {
    CreditCard,
    PremiumCard,
    BankTransfer,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::CreditCard => "Credit Card",
            PaymentType::PremiumCard => "Premium Card",
            PaymentType::BankTransfer => "Bank Transfer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PaymentKind {
    CreditCard { number: String, expiry: String, rate: f64 },
    PremiumCard { number: String, expiry: String, rate: f64 },
    BankTransfer { iban: String, fee: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentMethod {
    id: String,
    amount: f64,
    kind: PaymentKind,
}

/// Result of a charge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub method: String,
    pub payment_type: PaymentType,
    pub amount: f64,
    pub commission: f64,
    pub total: f64,
}

impl PaymentMethod {
    pub fn new(id: &str, amount: f64, kind: PaymentKind) -> Result<Self, ValidationError> {
        require_non_empty("id", id)?;
        require_non_negative("amount", amount)?;

        match &kind {
            PaymentKind::CreditCard { number, expiry, rate } | PaymentKind::PremiumCard { number, expiry, rate } => {
                require_non_empty("number", number)?;
                require_non_empty("expiry", expiry)?;
                require_range("rate", *rate, 0.0, 1.0)?;
            }
            PaymentKind::BankTransfer { iban, fee } => {
                require_non_empty("iban", iban)?;
                require_non_negative("fee", *fee)?;
            }
        }

        Ok(PaymentMethod {
            id: id.to_string(),
            amount,
            kind,
        })
    }

    pub fn credit_card(id: &str, amount: f64, number: &str, expiry: &str, rate: f64) -> Result<Self, ValidationError> {
        Self::new(
            id,
            amount,
            PaymentKind::CreditCard {
                number: number.to_string(),
                expiry: expiry.to_string(),
                rate,
            },
        )
    }

    pub fn premium_card(id: &str, amount: f64, number: &str, expiry: &str, rate: f64) -> Result<Self, ValidationError> {
        Self::new(
            id,
            amount,
            PaymentKind::PremiumCard {
                number: number.to_string(),
                expiry: expiry.to_string(),
                rate,
            },
        )
    }

    pub fn bank_transfer(id: &str, amount: f64, iban: &str, fee: f64) -> Result<Self, ValidationError> {
        Self::new(
            id,
            amount,
            PaymentKind::BankTransfer {
                iban: iban.to_string(),
                fee,
            },
        )
    }

    /// Commission due on `amount`
    pub fn commission_on(&self, amount: f64) -> f64 {
        match &self.kind {
            PaymentKind::CreditCard { rate, .. } | PaymentKind::PremiumCard { rate, .. } => amount * rate,
            PaymentKind::BankTransfer { fee, .. } => *fee,
        }
    }

    /// Commission on the current amount
    pub fn commission(&self) -> f64 {
        self.commission_on(self.amount)
    }

    /// Amount + commission
    pub fn total(&self) -> f64 {
        self.amount + self.commission()
    }

    pub fn authorize(&self) -> bool {
        self.amount > 0.0
    }

    pub fn set_amount(&mut self, amount: f64) -> Result<(), ValidationError> {
        self.amount = require_non_negative("amount", amount)?;
        Ok(())
    }

    /// Set the amount, authorize it and issue a receipt
    pub fn charge(&mut self, amount: f64) -> Result<Receipt, ValidationError> {
        require_positive("amount", amount)?;
        self.set_amount(amount)?;

        let commission = self.commission();
        tracing::debug!(method = %self.id, amount, commission, "payment charged");

        Ok(Receipt {
            method: self.id.clone(),
            payment_type: self.payment_type(),
            amount,
            commission,
            total: amount + commission,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn kind(&self) -> &PaymentKind {
        &self.kind
    }

    pub fn payment_type(&self) -> PaymentType {
        match self.kind {
            PaymentKind::CreditCard { .. } => PaymentType::CreditCard,
            PaymentKind::PremiumCard { .. } => PaymentType::PremiumCard,
            PaymentKind::BankTransfer { .. } => PaymentType::BankTransfer,
        }
    }

    /// Card number with all but the last four digits hidden
    pub fn masked_reference(&self) -> String {
        let reference = match &self.kind {
            PaymentKind::CreditCard { number, .. } | PaymentKind::PremiumCard { number, .. } => number,
            PaymentKind::BankTransfer { iban, .. } => iban,
        };
        let visible: String = reference.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
        format!("****{}", visible)
    }
}

impl Record for PaymentMethod {
    type Key = String;
    type Variant = PaymentType;
    const KIND: &'static str = "payment method";

    fn key(&self) -> &String {
        &self.id
    }

    fn variant(&self) -> PaymentType {
        self.payment_type()
    }
}

pub type Wallet = Registry<PaymentMethod>;

// ============================================================================
// PAYER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payer {
    user_id: String,
    name: String,
    preferred: Option<String>,
}

impl Payer {
    pub fn new(user_id: &str, name: &str, preferred: Option<&str>) -> Result<Self, ValidationError> {
        require_non_empty("user_id", user_id)?;
        require_non_empty("name", name)?;
        if let Some(method) = preferred {
            require_non_empty("preferred_method", method)?;
        }

        Ok(Payer {
            user_id: user_id.to_string(),
            name: name.to_string(),
            preferred: preferred.map(str::to_string),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn preferred_method(&self) -> Option<&str> {
        self.preferred.as_deref()
    }

    pub fn set_preferred_method(&mut self, method: Option<&str>) -> Result<(), ValidationError> {
        if let Some(method) = method {
            require_non_empty("preferred_method", method)?;
        }
        self.preferred = method.map(str::to_string);
        Ok(())
    }
}

/// Charge a payer with `method` if given, else with their preferred one
pub fn charge_payer(
    wallet: &mut Wallet,
    payer: &Payer,
    amount: f64,
    method: Option<&str>,
) -> RegistryResult<Receipt> {
    let key = method
        .or_else(|| payer.preferred_method())
        .ok_or_else(|| ValidationError::invalid("preferred_method", format!("{} has no payment method", payer.user_id())))?;

    let instrument = wallet.get_mut(&key.to_string())?;
    let receipt = instrument.charge(amount)?;
    tracing::info!(payer = %payer.user_id(), method = key, total = receipt.total, "payer charged");
    Ok(receipt)
}

/// Charge every payer with a preferred method; payers without one are skipped
pub fn charge_all(wallet: &mut Wallet, payers: &[Payer], amount: f64) -> Vec<(String, RegistryResult<Receipt>)> {
    payers
        .iter()
        .filter(|p| p.preferred_method().is_some())
        .map(|p| (p.user_id().to_string(), charge_payer(wallet, p, amount, None)))
        .collect()
}

/// Missing payer lookup helper for callers keeping payers in a slice
pub fn find_payer<'a>(payers: &'a [Payer], user_id: &str) -> RegistryResult<&'a Payer> {
    payers
        .iter()
        .find(|p| p.user_id() == user_id)
        .ok_or_else(|| RegistryError::not_found("payer", user_id))
}
