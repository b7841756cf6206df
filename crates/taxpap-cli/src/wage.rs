//! Wage-tax front end for the `wage` subcommand.
//!
//! Builds the input table a wage-tax procedure expects from an annual or
//! periodic gross income and a tax class, and condenses the outputs into the
//! figures a payslip shows.

use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive, Zero};
use clap::ValueEnum;
use serde::Serialize;
use taxpap_core::{Namespace, Procedure, Value};
use taxpap_interp::{Inputs, Outputs};

/// Payment period of the income (`LZZ`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PaymentPeriod {
    Year,
    Month,
    Week,
    Day,
}

impl PaymentPeriod {
    pub fn code(self) -> i64 {
        match self {
            PaymentPeriod::Year => 1,
            PaymentPeriod::Month => 2,
            PaymentPeriod::Week => 3,
            PaymentPeriod::Day => 4,
        }
    }
}

/// Inputs that default to zero unless the caller knows better.
const ZERO_INPUTS: &[&str] = &[
    "JFREIB", "JHINZU", "JRE4", "JRE4ENT", "JVBEZ", "VBEZM", "VBEZS", "VBS", "VKAPA", "VMT",
    "SONSTB", "SONSTENT", "STERBE", "af", "R", "AJAHR", "ALTER1", "KRV", "KVZ", "PVS", "PVZ",
    "PKV", "PVA", "ZKF", "VBEZ", "VJAHR", "PKPV",
];

#[derive(Debug, Clone)]
pub struct WageRequest {
    /// Gross income for the period, in euros.
    pub income: BigDecimal,
    /// Tax class 1 to 6 (`STKL`).
    pub tax_class: u8,
    pub period: PaymentPeriod,
}

impl WageRequest {
    /// Builds the procedure inputs.
    ///
    /// `LZZ`, `RE4` (in cents) and `STKL` are always set. The supplementary
    /// inputs are only set when the procedure declares them: twelve months of
    /// employment (`ZMVB`), a factor `f` of 1 and zero for everything else.
    pub fn to_inputs(&self, procedure: &Procedure) -> Result<Inputs, String> {
        if self.income < BigDecimal::zero() {
            return Err(format!("income must not be negative, got {}", self.income));
        }
        let cents = (&self.income * BigDecimal::from(100))
            .with_scale_round(0, RoundingMode::HalfUp)
            .to_i64()
            .ok_or_else(|| format!("income {} is out of range", self.income))?;

        let mut inputs = Inputs::new();
        inputs.insert("LZZ".to_string(), Value::Integer(self.period.code()));
        inputs.insert("RE4".to_string(), Value::Integer(cents));
        inputs.insert("STKL".to_string(), Value::Integer(i64::from(self.tax_class)));

        let supplementary = ZERO_INPUTS
            .iter()
            .map(|name| (*name, Value::Integer(0)))
            .chain([
                ("ZMVB", Value::Integer(12)),
                ("f", Value::Decimal(BigDecimal::from(1))),
            ]);
        for (name, value) in supplementary {
            if procedure.declaration(Namespace::Inputs, name).is_some() {
                inputs.insert(name.to_string(), value);
            }
        }

        tracing::debug!(re4 = cents, stkl = self.tax_class, lzz = self.period.code(), "wage inputs built");
        Ok(inputs)
    }
}

/// Tax figures for one wage calculation, in euros.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxSummary {
    pub income: BigDecimal,
    pub income_tax: BigDecimal,
    pub solidarity_surcharge: BigDecimal,
    pub total_tax: BigDecimal,
    pub net_income: BigDecimal,
    /// Total tax as a percentage of income.
    pub effective_rate: BigDecimal,
}

impl TaxSummary {
    /// Reads `LSTLZZ` and `SOLZLZZ` (cents) from the outputs. A missing output
    /// counts as zero.
    pub fn from_outputs(income: &BigDecimal, outputs: &Outputs) -> Self {
        let euros = |name: &str| match outputs.get(name).and_then(Value::as_decimal) {
            Some(cents) => cents / BigDecimal::from(100),
            None => {
                tracing::warn!(output = name, "procedure produced no value; counting it as zero");
                BigDecimal::zero()
            }
        };
        let money = |amount: BigDecimal| amount.with_scale_round(2, RoundingMode::HalfUp);

        let income_tax = euros("LSTLZZ");
        let solidarity_surcharge = euros("SOLZLZZ");
        let total_tax = &income_tax + &solidarity_surcharge;
        let effective_rate = if income.is_zero() {
            BigDecimal::zero()
        } else {
            &total_tax * BigDecimal::from(100) / income
        };

        TaxSummary {
            income: money(income.clone()),
            net_income: money(income - &total_tax),
            income_tax: money(income_tax),
            solidarity_surcharge: money(solidarity_surcharge),
            total_tax: money(total_tax),
            effective_rate: money(effective_rate),
        }
    }
}
