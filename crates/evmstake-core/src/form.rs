//! Amount / percentage form state kept in sync against a reference balance.

use alloy_primitives::{U256, U512};
use thiserror::Error;

use crate::amount::{AmountError, format_amount, parse_amount, sanitize_amount_input};
use crate::types::{Balance, NATIVE_DECIMALS};

/// Which side of the delegation a form drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormKind {
    #[default]
    Stake,
    Undelegate,
}

impl FormKind {
    pub fn label(&self) -> &'static str {
        match self {
            FormKind::Stake => "Stake",
            FormKind::Undelegate => "Undelegate",
        }
    }
}

/// Why the form cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("a transaction is already in progress")]
    InFlight,
    #[error("enter an amount")]
    Empty,
    #[error("invalid amount: {0}")]
    InvalidInput(#[from] AmountError),
    #[error("amount must be greater than zero")]
    NonPositive,
    #[error("amount exceeds available balance")]
    InsufficientBalance,
}

/// Free-text amount plus 0..=100 slider, kept consistent with `balance`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AmountForm {
    kind: FormKind,
    decimals: u8,
    amount: String,
    percentage: f64,
    balance: Balance,
}

impl AmountForm {
    pub fn new(kind: FormKind) -> Self {
        Self::with_decimals(kind, NATIVE_DECIMALS)
    }

    pub fn with_decimals(kind: FormKind, decimals: u8) -> Self {
        Self {
            kind,
            decimals,
            ..Default::default()
        }
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    pub fn balance(&self) -> Balance {
        self.balance
    }

    /// Update the reference balance. Inputs are left untouched.
    pub fn set_balance(&mut self, balance: Balance) {
        self.balance = balance;
    }

    /// Text entry. Recomputes the percentage from the sanitized amount.
    pub fn set_amount_text(&mut self, raw: &str) {
        self.amount = sanitize_amount_input(raw);
        self.percentage = match parse_amount(&self.amount, self.decimals) {
            Ok(value) => percentage_of(value, self.balance),
            Err(_) => 0.0,
        };
    }

    /// Append a typed character to the amount.
    pub fn push_char(&mut self, c: char) {
        let mut next = self.amount.clone();
        next.push(c);
        self.set_amount_text(&next);
    }

    /// Remove the last character of the amount.
    pub fn pop_char(&mut self) {
        let mut next = self.amount.clone();
        next.pop();
        self.set_amount_text(&next);
    }

    /// Slider move. With a zero balance the slider stays at 0 and the
    /// amount is left alone.
    pub fn set_percentage(&mut self, percentage: u8) {
        if self.balance.is_zero() {
            self.percentage = 0.0;
            return;
        }
        let percentage = percentage.min(100);
        self.percentage = f64::from(percentage);
        let value = U512::from(self.balance) * U512::from(percentage) / U512::from(100u8);
        let value = <U256 as alloy_primitives::ruint::UintTryFrom<U512>>::uint_try_from(value).unwrap_or(self.balance);
        self.amount = format_amount(value, self.decimals);
    }

    /// Move the slider by `delta` whole percent.
    pub fn step_percentage(&mut self, delta: i16) {
        let current = self.percentage.round() as i16;
        let next = (current + delta).clamp(0, 100) as u8;
        self.set_percentage(next);
    }

    /// Exact balance, no rounding.
    pub fn set_max(&mut self) {
        self.amount = format_amount(self.balance, self.decimals);
        self.percentage = 100.0;
    }

    pub fn clear(&mut self) {
        self.amount.clear();
        self.percentage = 0.0;
    }

    /// Amount in sub-units, or `None` if the text does not parse.
    pub fn parsed_amount(&self) -> Option<U256> {
        parse_amount(&self.amount, self.decimals).ok()
    }

    /// True when the typed amount is larger than the reference balance.
    pub fn exceeds_balance(&self) -> bool {
        self.parsed_amount()
            .is_some_and(|value| value > self.balance)
    }

    /// Check the form and return the amount to submit in sub-units.
    pub fn validate(&self, in_flight: bool) -> Result<U256, FormError> {
        if in_flight {
            return Err(FormError::InFlight);
        }
        if self.amount.is_empty() {
            return Err(FormError::Empty);
        }
        let value = parse_amount(&self.amount, self.decimals)?;
        if value.is_zero() {
            return Err(FormError::NonPositive);
        }
        if value > self.balance {
            return Err(FormError::InsufficientBalance);
        }
        Ok(value)
    }

    pub fn can_submit(&self, in_flight: bool) -> bool {
        self.validate(in_flight).is_ok()
    }

    /// Max and the slider are only usable with something to allocate.
    pub fn controls_enabled(&self, in_flight: bool) -> bool {
        !in_flight && !self.balance.is_zero()
    }
}

/// `min(100, 100 * amount / balance)` with two decimals of precision.
///
/// Zero when the balance is zero.
pub fn percentage_of(amount: U256, balance: U256) -> f64 {
    if balance.is_zero() {
        return 0.0;
    }
    if amount >= balance {
        return 100.0;
    }
    let basis_points = U512::from(amount) * U512::from(10_000u32) / U512::from(balance);
    let basis_points = u64::try_from(basis_points).unwrap_or(10_000);
    (basis_points as f64 / 100.0).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const ONE: u128 = 1_000_000_000_000_000_000;

    fn form_with_balance(balance: u128) -> AmountForm {
        let mut form = AmountForm::new(FormKind::Stake);
        form.set_balance(U256::from(balance));
        form
    }

    #[test]
    fn test_text_entry_sets_percentage() {
        let mut form = form_with_balance(2 * ONE);
        form.set_amount_text("0.5");
        assert_eq!(form.amount(), "0.5");
        assert_abs_diff_eq!(form.percentage(), 25.0, epsilon = 0.01);
    }

    #[test]
    fn test_text_entry_clamps_percentage() {
        let mut form = form_with_balance(ONE);
        form.set_amount_text("5");
        assert_eq!(form.percentage(), 100.0);
        assert!(form.exceeds_balance());
        assert_eq!(form.validate(false), Err(FormError::InsufficientBalance));
    }

    #[test]
    fn test_text_entry_sanitizes() {
        let mut form = form_with_balance(ONE);
        form.set_amount_text("0.2abc");
        assert_eq!(form.amount(), "0.2");
        assert_abs_diff_eq!(form.percentage(), 20.0, epsilon = 0.01);
    }

    #[test]
    fn test_unparsable_or_zero_balance_gives_zero_percentage() {
        let mut form = form_with_balance(ONE);
        form.set_amount_text(".");
        assert_eq!(form.percentage(), 0.0);

        let mut empty = form_with_balance(0);
        empty.set_amount_text("1");
        assert_eq!(empty.percentage(), 0.0);
    }

    #[test]
    fn test_slider_sets_amount() {
        let mut form = form_with_balance(ONE);
        form.set_percentage(50);
        assert_eq!(form.amount(), "0.5");
        form.set_percentage(100);
        assert_eq!(form.amount(), "1");
        form.set_percentage(0);
        assert_eq!(form.amount(), "0");
    }

    #[test]
    fn test_slider_with_zero_balance_keeps_amount() {
        let mut form = form_with_balance(0);
        form.set_amount_text("3");
        form.set_percentage(40);
        assert_eq!(form.amount(), "3");
        assert_eq!(form.percentage(), 0.0);
        form.step_percentage(10);
        assert_eq!(form.percentage(), 0.0);
    }

    #[test]
    fn test_slider_on_max_balance() {
        let mut form = form_with_balance(0);
        form.set_balance(U256::MAX);
        form.set_percentage(100);
        assert_eq!(form.parsed_amount(), Some(U256::MAX));
        form.set_percentage(50);
        assert_eq!(form.parsed_amount(), Some(U256::MAX / U256::from(2u8)));
    }

    #[test]
    fn test_slider_round_trip() {
        for p in [0u8, 1, 50, 99, 100] {
            let mut form = form_with_balance(ONE);
            form.set_percentage(p);
            let amount = form.amount().to_string();
            form.set_amount_text(&amount);
            assert_abs_diff_eq!(form.percentage(), f64::from(p), epsilon = 0.01);
        }
    }

    #[test]
    fn test_step_percentage_clamps() {
        let mut form = form_with_balance(ONE);
        form.step_percentage(-5);
        assert_eq!(form.percentage(), 0.0);
        form.step_percentage(10);
        assert_eq!(form.percentage(), 10.0);
        form.step_percentage(200);
        assert_eq!(form.percentage(), 100.0);
        assert_eq!(form.amount(), "1");
    }

    #[test]
    fn test_max_is_exact() {
        let balance = 3_333_333_333_333_333_333u128;
        let mut form = form_with_balance(balance);
        form.set_max();
        assert_eq!(form.amount(), "3.333333333333333333");
        assert_eq!(form.percentage(), 100.0);
        assert_eq!(form.validate(false), Ok(U256::from(balance)));
    }

    #[test]
    fn test_validate_rules() {
        let mut form = form_with_balance(ONE);
        assert_eq!(form.validate(false), Err(FormError::Empty));

        form.set_amount_text("0");
        assert_eq!(form.validate(false), Err(FormError::NonPositive));

        form.set_amount_text("0.25");
        assert_eq!(form.validate(true), Err(FormError::InFlight));
        assert_eq!(form.validate(false), Ok(U256::from(ONE / 4)));
        assert!(form.can_submit(false));
    }

    #[test]
    fn test_validate_rejects_over_precise_input() {
        let mut form = form_with_balance(ONE);
        form.set_amount_text("0.0000000000000000001");
        assert!(matches!(
            form.validate(false),
            Err(FormError::InvalidInput(AmountError::TooPrecise(18)))
        ));
    }

    #[test]
    fn test_over_balance_by_one_wei() {
        let mut form = form_with_balance(ONE);
        form.set_amount_text("1.000000000000000001");
        assert_eq!(form.validate(false), Err(FormError::InsufficientBalance));
    }

    #[test]
    fn test_push_and_pop_char() {
        let mut form = form_with_balance(ONE);
        for c in "0.5x".chars() {
            form.push_char(c);
        }
        assert_eq!(form.amount(), "0.5");
        form.pop_char();
        assert_eq!(form.amount(), "0.");
        assert_eq!(form.percentage(), 0.0);
    }

    #[test]
    fn test_clear() {
        let mut form = form_with_balance(ONE);
        form.set_percentage(30);
        form.clear();
        assert_eq!(form.amount(), "");
        assert_eq!(form.percentage(), 0.0);
    }

    #[test]
    fn test_controls_enabled() {
        let form = form_with_balance(0);
        assert!(!form.controls_enabled(false));
        let form = form_with_balance(ONE);
        assert!(form.controls_enabled(false));
        assert!(!form.controls_enabled(true));
    }

    #[test]
    fn test_percentage_of() {
        assert_eq!(percentage_of(U256::from(1u8), U256::ZERO), 0.0);
        assert_eq!(percentage_of(U256::from(3u8), U256::from(2u8)), 100.0);
        assert_abs_diff_eq!(
            percentage_of(U256::from(1u8), U256::from(3u8)),
            33.33,
            epsilon = 0.001
        );
    }
}
