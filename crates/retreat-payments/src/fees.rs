//! Processor Fees and Installments
//!
//! Card payments are grossed up so the organizers net the base price after
//! the processor takes its cut.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Registration price used for the installment table
pub const REGISTRATION_PRICE: Decimal = dec!(299.90);

/// Interest added per installment beyond the first
pub const INSTALLMENT_INTEREST: Decimal = dec!(0.04);

/// Most installments offered on card
pub const MAX_INSTALLMENTS: u8 = 12;

/// Fixed plus percentage processor fee
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeSchedule {
    pub fixed: Decimal,
    pub percentage: Decimal,
}

impl FeeSchedule {
    /// Stripe Brazil domestic cards: R$ 0,30 + 2,99%
    pub const STRIPE_BR: Self = Self {
        fixed: dec!(0.30),
        percentage: dec!(0.0299),
    };

    /// Amount to charge so that `base` is left after fees, to the cent
    pub fn gross_up(&self, base: Decimal) -> Decimal {
        let total = (base + self.fixed) / (Decimal::ONE - self.percentage);
        round_cents(total)
    }

    /// What the processor keeps when charging `base` grossed up
    pub fn fee_for(&self, base: Decimal) -> Decimal {
        self.gross_up(base) - base
    }

    /// What is left of `gross` after the processor's cut
    pub fn net_of(&self, gross: Decimal) -> Decimal {
        round_cents(gross - gross * self.percentage - self.fixed)
    }
}

fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// One row of the installment table
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentOption {
    pub installments: u8,
    pub per_installment: Decimal,
    pub total: Decimal,
    pub interest: Decimal,
}

/// Cost of paying `price` in `installments` parts
pub fn installment(price: Decimal, installments: u8) -> InstallmentOption {
    let installments = installments.clamp(1, MAX_INSTALLMENTS);
    let extra = Decimal::from(installments - 1);
    let interest = round_cents(price * INSTALLMENT_INTEREST * extra);
    let total = price + interest;
    InstallmentOption {
        installments,
        per_installment: round_cents(total / Decimal::from(installments)),
        total,
        interest,
    }
}

/// Full table from 1 to [`MAX_INSTALLMENTS`] for the registration price
pub fn installment_plan() -> Vec<InstallmentOption> {
    (1..=MAX_INSTALLMENTS)
        .map(|n| installment(REGISTRATION_PRICE, n))
        .collect()
}
