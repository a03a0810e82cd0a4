// ABOUTME: Financial projection tools - compound growth, net present value, ROI.
// ABOUTME: Amounts keep the unit of their inputs; results are rounded to cents.

use async_trait::async_trait;

use crate::error::ToolError;
use crate::tool::{Arguments, Tool, ToolValue};
use crate::unit::{Quantity, Unit, common_unit};

/// Longest projection horizon the tools accept.
pub const MAX_YEARS: u32 = 1000;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Reject results that overflowed or divided by zero instead of reporting them.
fn finite(value: f64, what: &str) -> Result<f64, ToolError> {
    if value.is_finite() {
        Ok(round2(value))
    } else {
        Err(ToolError::InvalidParams(format!(
            "{} is not a finite number; check rate and years",
            what
        )))
    }
}

/// A growth or discount rate as a fraction. Percent-tagged rates are divided by 100;
/// any other non-scalar tag is a mismatch.
fn rate(q: &Quantity) -> Result<f64, ToolError> {
    match q.unit {
        Unit::Scalar => Ok(q.value),
        Unit::Percent => Ok(q.value / 100.0),
        _ => Err(ToolError::UnitMismatch {
            expected: Unit::Scalar,
            actual: q.unit.clone(),
        }),
    }
}

/// A whole number of periods, at most `MAX_YEARS`.
fn periods(q: &Quantity) -> Result<u32, ToolError> {
    if q.unit != Unit::Scalar {
        return Err(ToolError::UnitMismatch {
            expected: Unit::Scalar,
            actual: q.unit.clone(),
        });
    }
    if q.value < 0.0 || q.value.fract() != 0.0 {
        return Err(ToolError::InvalidParams(format!(
            "years must be a non-negative whole number, got {}",
            q.value
        )));
    }
    if q.value > f64::from(MAX_YEARS) {
        return Err(ToolError::InvalidParams(format!(
            "years must be at most {}, got {}",
            MAX_YEARS, q.value
        )));
    }
    Ok(q.value as u32)
}

fn amount(q: &Quantity) -> Result<&Quantity, ToolError> {
    if q.unit.is_dimensionless() {
        return Err(ToolError::InvalidParams(format!(
            "expected an amount, got a {} value",
            q.unit
        )));
    }
    Ok(q)
}

/// Benefits must share the unit of the initial investment.
fn benefits<'a>(initial: &Quantity, list: Vec<&'a Quantity>) -> Result<Vec<&'a Quantity>, ToolError> {
    if list.is_empty() {
        return Err(ToolError::InvalidParams("benefits must not be empty".into()));
    }
    common_unit(std::iter::once(initial).chain(list.iter().copied()))
        .map_err(|(expected, actual)| ToolError::UnitMismatch { expected, actual })?;
    Ok(list)
}

/// `initial × (1 + rate)^years`.
pub struct CompoundGrowthTool;

#[async_trait]
impl Tool for CompoundGrowthTool {
    fn name(&self) -> &str {
        "compound_growth"
    }

    fn description(&self) -> &str {
        "Project an amount forward: initial * (1 + rate)^years. Result keeps the unit of initial."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "initial": { "type": "object", "description": "Starting amount with unit" },
                "rate": { "type": "object", "description": "Annual rate, scalar fraction or percent" },
                "years": { "type": "object", "description": "Whole number of years, scalar" }
            },
            "required": ["initial", "rate", "years"]
        })
    }

    async fn execute(&self, args: &Arguments) -> Result<ToolValue, ToolError> {
        let initial = amount(args.quantity("initial")?)?;
        let rate = rate(args.quantity("rate")?)?;
        let years = periods(args.quantity("years")?)?;

        let value = finite(initial.value * (1.0 + rate).powi(years as i32), "projected value")?;
        Ok(ToolValue::Quantity(Quantity::new(value, initial.unit.clone())))
    }
}

/// `-initial + Σ benefit_y / (1 + rate)^y` for y in 1..=years.
///
/// When `years` exceeds the number of benefits the last benefit repeats.
pub struct NetPresentValueTool;

#[async_trait]
impl Tool for NetPresentValueTool {
    fn name(&self) -> &str {
        "net_present_value"
    }

    fn description(&self) -> &str {
        "Net present value of an investment: -initial + sum(benefit_y / (1 + rate)^y). \
         Benefits must share the unit of initial."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "initial": { "type": "object" },
                "benefits": { "type": "array", "items": { "type": "object" } },
                "discount_rate": { "type": "object" },
                "years": { "type": "object", "description": "Defaults to the number of benefits" }
            },
            "required": ["initial", "benefits", "discount_rate"]
        })
    }

    async fn execute(&self, args: &Arguments) -> Result<ToolValue, ToolError> {
        let initial = amount(args.quantity("initial")?)?;
        let benefits = benefits(initial, args.quantity_list("benefits")?)?;
        let rate = rate(args.quantity("discount_rate")?)?;
        let years = match args.get("years") {
            Some(_) => periods(args.quantity("years")?)?,
            None => benefits.len() as u32,
        };

        let mut npv = -initial.value;
        for year in 1..=years {
            let index = (year as usize - 1).min(benefits.len() - 1);
            npv += benefits[index].value / (1.0 + rate).powi(year as i32);
        }
        let npv = finite(npv, "net present value")?;
        Ok(ToolValue::Quantity(Quantity::new(npv, initial.unit.clone())))
    }
}

/// `(Σ benefits − initial) / initial × 100`, as a percent.
pub struct ReturnOnInvestmentTool;

#[async_trait]
impl Tool for ReturnOnInvestmentTool {
    fn name(&self) -> &str {
        "return_on_investment"
    }

    fn description(&self) -> &str {
        "Return on investment in percent: (sum(benefits) - initial) / initial * 100."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "initial": { "type": "object" },
                "benefits": { "type": "array", "items": { "type": "object" } }
            },
            "required": ["initial", "benefits"]
        })
    }

    async fn execute(&self, args: &Arguments) -> Result<ToolValue, ToolError> {
        let initial = amount(args.quantity("initial")?)?;
        let benefits = benefits(initial, args.quantity_list("benefits")?)?;
        if initial.value == 0.0 {
            return Err(ToolError::InvalidParams("initial must not be zero".into()));
        }

        let total: f64 = benefits.iter().map(|b| b.value).sum();
        let roi = (total - initial.value) / initial.value * 100.0;
        Ok(ToolValue::Quantity(Quantity::new(round2(roi), Unit::Percent)))
    }
}
