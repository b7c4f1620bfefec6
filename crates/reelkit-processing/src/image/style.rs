//! Filter preset + adjustment stack -> composite filter expression.

use reelkit_core::models::{AdjustmentStack, FilterPreset};
use reelkit_core::PipelineError;

/// Sepia strength at temperature +/-100.
const TEMPERATURE_SEPIA: f64 = 0.3;
/// Hue shift at full warmth, in degrees.
const WARM_HUE_DEGREES: f64 = -20.0;
/// Hue shift at full coolness; rotates the sepia tint into blue.
const COOL_HUE_DEGREES: f64 = 180.0;

/// Rendered, composited filter for one asset.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterStyle {
    /// CSS-equivalent filter expression, whitespace-normalised.
    pub expression: String,
    /// Fade approximation in `[0, 1]`.
    pub opacity: f64,
}

impl FilterStyle {
    pub fn is_identity(&self) -> bool {
        self.opacity >= 1.0
            && parse_filter_expression(&self.expression)
                .map(|ops| ops.iter().all(FilterOp::is_identity))
                .unwrap_or(false)
    }
}

/// Format a number the way the expression table writes them: shortest
/// representation, at most three decimals.
fn fmt_number(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        // Avoid "-0".
        return "0".to_string();
    }
    format!("{}", rounded)
}

fn temperature_terms(temperature: i32) -> String {
    if temperature == 0 {
        return String::new();
    }
    let strength = temperature.unsigned_abs() as f64 / 100.0;
    let sepia = fmt_number(strength * TEMPERATURE_SEPIA);
    let hue = if temperature > 0 {
        strength * WARM_HUE_DEGREES
    } else {
        strength * COOL_HUE_DEGREES
    };
    format!("sepia({}) hue-rotate({}deg)", sepia, fmt_number(hue))
}

/// Deterministic mapping from a preset and adjustment stack to a composite
/// filter expression and an opacity multiplier.
///
/// Stored value `v` of brightness, contrast and saturation maps to
/// `100 + v` percent; temperature becomes a sepia + hue-rotate pair whose
/// direction follows its sign; fade becomes opacity `(100 - fade) / 100`.
pub fn render_filter_style(filter: FilterPreset, adjustments: &AdjustmentStack) -> FilterStyle {
    let tone = format!(
        "brightness({}%) contrast({}%) saturate({}%)",
        100 + adjustments.brightness(),
        100 + adjustments.contrast(),
        100 + adjustments.saturation()
    );
    let raw = format!(
        "{} {} {}",
        filter.base_expression(),
        tone,
        temperature_terms(adjustments.temperature())
    );
    let expression = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let opacity = (100 - adjustments.fade()).clamp(0, 100) as f64 / 100.0;

    FilterStyle {
        expression,
        opacity,
    }
}

/// One step of a filter expression. Amounts are multipliers (1.0 = 100%),
/// hue rotation is in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOp {
    Brightness(f32),
    Contrast(f32),
    Saturate(f32),
    Sepia(f32),
    Grayscale(f32),
    HueRotate(f32),
}

impl FilterOp {
    pub fn is_identity(&self) -> bool {
        match *self {
            FilterOp::Brightness(a) | FilterOp::Contrast(a) | FilterOp::Saturate(a) => a == 1.0,
            FilterOp::Sepia(a) | FilterOp::Grayscale(a) => a == 0.0,
            FilterOp::HueRotate(deg) => deg % 360.0 == 0.0,
        }
    }
}

fn parse_amount(function: &str, arg: &str) -> Result<f32, PipelineError> {
    let (number, divisor) = match arg.strip_suffix('%') {
        Some(number) => (number, 100.0),
        None => (arg, 1.0),
    };
    let value: f32 = number.trim().parse().map_err(|_| {
        PipelineError::InvalidInput(format!("Invalid amount '{}' for {}()", arg, function))
    })?;
    if value < 0.0 {
        return Err(PipelineError::InvalidInput(format!(
            "Negative amount for {}(): {}",
            function, arg
        )));
    }
    Ok(value / divisor)
}

fn parse_angle(arg: &str) -> Result<f32, PipelineError> {
    let (number, factor) = if let Some(n) = arg.strip_suffix("deg") {
        (n, 1.0)
    } else if let Some(n) = arg.strip_suffix("turn") {
        (n, 360.0)
    } else if arg.trim() == "0" {
        ("0", 1.0)
    } else {
        return Err(PipelineError::InvalidInput(format!(
            "hue-rotate() needs a degree angle, got '{}'",
            arg
        )));
    };
    let value: f32 = number
        .trim()
        .parse()
        .map_err(|_| PipelineError::InvalidInput(format!("Invalid angle '{}'", arg)))?;
    Ok(value * factor)
}

/// Parse a composite expression into the ops a rasteriser applies, in order.
/// The empty expression yields no ops.
pub fn parse_filter_expression(expression: &str) -> Result<Vec<FilterOp>, PipelineError> {
    let mut ops = Vec::new();
    let mut rest = expression.trim();

    while !rest.is_empty() {
        let open = rest.find('(').ok_or_else(|| {
            PipelineError::InvalidInput(format!("Malformed filter expression near '{}'", rest))
        })?;
        let close = rest[open..].find(')').map(|i| open + i).ok_or_else(|| {
            PipelineError::InvalidInput(format!("Unclosed filter function near '{}'", rest))
        })?;
        let function = rest[..open].trim();
        let arg = rest[open + 1..close].trim();

        let op = match function {
            "brightness" => FilterOp::Brightness(parse_amount(function, arg)?),
            "contrast" => FilterOp::Contrast(parse_amount(function, arg)?),
            "saturate" => FilterOp::Saturate(parse_amount(function, arg)?),
            "sepia" => FilterOp::Sepia(parse_amount(function, arg)?.min(1.0)),
            "grayscale" => FilterOp::Grayscale(parse_amount(function, arg)?.min(1.0)),
            "hue-rotate" => FilterOp::HueRotate(parse_angle(arg)?),
            other => {
                return Err(PipelineError::InvalidInput(format!(
                    "Unsupported filter function: {}",
                    other
                )))
            }
        };
        ops.push(op);
        rest = rest[close + 1..].trim_start();
    }

    Ok(ops)
}
