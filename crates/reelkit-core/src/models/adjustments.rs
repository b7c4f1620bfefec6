use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// User-tunable adjustment sliders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Adjustment {
    Brightness,
    Contrast,
    Saturation,
    Temperature,
    Fade,
}

impl Adjustment {
    pub const ALL: [Adjustment; 5] = [
        Adjustment::Brightness,
        Adjustment::Contrast,
        Adjustment::Saturation,
        Adjustment::Temperature,
        Adjustment::Fade,
    ];

    /// Declared slider range
    pub fn range(self) -> RangeInclusive<i32> {
        match self {
            Adjustment::Fade => 0..=100,
            _ => -100..=100,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "brightness" => Some(Adjustment::Brightness),
            "contrast" => Some(Adjustment::Contrast),
            "saturation" => Some(Adjustment::Saturation),
            "temperature" => Some(Adjustment::Temperature),
            "fade" => Some(Adjustment::Fade),
            _ => None,
        }
    }
}

/// Non-destructive adjustment values, each 0 by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdjustmentStack {
    brightness: i32,
    contrast: i32,
    saturation: i32,
    temperature: i32,
    fade: i32,
}

impl AdjustmentStack {
    pub fn get(&self, adjustment: Adjustment) -> i32 {
        match adjustment {
            Adjustment::Brightness => self.brightness,
            Adjustment::Contrast => self.contrast,
            Adjustment::Saturation => self.saturation,
            Adjustment::Temperature => self.temperature,
            Adjustment::Fade => self.fade,
        }
    }

    /// Store `value` clamped into the adjustment's range and return what was
    /// stored.
    pub fn set(&mut self, adjustment: Adjustment, value: i32) -> i32 {
        let range = adjustment.range();
        let clamped = value.clamp(*range.start(), *range.end());
        let slot = match adjustment {
            Adjustment::Brightness => &mut self.brightness,
            Adjustment::Contrast => &mut self.contrast,
            Adjustment::Saturation => &mut self.saturation,
            Adjustment::Temperature => &mut self.temperature,
            Adjustment::Fade => &mut self.fade,
        };
        *slot = clamped;
        clamped
    }

    /// Builder-style variant of [`AdjustmentStack::set`].
    pub fn with(mut self, adjustment: Adjustment, value: i32) -> Self {
        self.set(adjustment, value);
        self
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }

    pub fn brightness(&self) -> i32 {
        self.brightness
    }

    pub fn contrast(&self) -> i32 {
        self.contrast
    }

    pub fn saturation(&self) -> i32 {
        self.saturation
    }

    pub fn temperature(&self) -> i32 {
        self.temperature
    }

    pub fn fade(&self) -> i32 {
        self.fade
    }
}
