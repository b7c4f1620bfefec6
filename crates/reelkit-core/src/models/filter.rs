use serde::{Deserialize, Serialize};

/// Named filter presets. Each maps to a fixed base filter expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterPreset {
    #[default]
    Normal,
    Clarendon,
    Gingham,
    Moon,
    Lark,
    Reyes,
    Juno,
    Slumber,
    Crema,
    Ludwig,
    Aden,
    Perpetua,
}

impl FilterPreset {
    pub const ALL: [FilterPreset; 12] = [
        FilterPreset::Normal,
        FilterPreset::Clarendon,
        FilterPreset::Gingham,
        FilterPreset::Moon,
        FilterPreset::Lark,
        FilterPreset::Reyes,
        FilterPreset::Juno,
        FilterPreset::Slumber,
        FilterPreset::Crema,
        FilterPreset::Ludwig,
        FilterPreset::Aden,
        FilterPreset::Perpetua,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FilterPreset::Normal => "Normal",
            FilterPreset::Clarendon => "Clarendon",
            FilterPreset::Gingham => "Gingham",
            FilterPreset::Moon => "Moon",
            FilterPreset::Lark => "Lark",
            FilterPreset::Reyes => "Reyes",
            FilterPreset::Juno => "Juno",
            FilterPreset::Slumber => "Slumber",
            FilterPreset::Crema => "Crema",
            FilterPreset::Ludwig => "Ludwig",
            FilterPreset::Aden => "Aden",
            FilterPreset::Perpetua => "Perpetua",
        }
    }

    /// Base filter expression of the preset; empty for `Normal`.
    pub fn base_expression(self) -> &'static str {
        match self {
            FilterPreset::Normal => "",
            FilterPreset::Clarendon => "contrast(1.2) saturate(1.25)",
            FilterPreset::Gingham => "brightness(1.05) hue-rotate(-10deg)",
            FilterPreset::Moon => "grayscale(1) contrast(1.1) brightness(1.1)",
            FilterPreset::Lark => "contrast(0.9) brightness(1.1) saturate(1.1)",
            FilterPreset::Reyes => "sepia(0.22) brightness(1.1) contrast(0.85) saturate(0.75)",
            FilterPreset::Juno => "contrast(1.15) saturate(1.8) sepia(0.05)",
            FilterPreset::Slumber => "saturate(0.66) brightness(1.05)",
            FilterPreset::Crema => "sepia(0.5) contrast(0.9) saturate(0.9)",
            FilterPreset::Ludwig => "brightness(1.05) saturate(1.2) contrast(1.05)",
            FilterPreset::Aden => "hue-rotate(-20deg) contrast(0.9) saturate(0.85) brightness(1.2)",
            FilterPreset::Perpetua => "contrast(1.1) brightness(1.25) saturate(1.1)",
        }
    }

    /// Case-insensitive lookup by preset name
    pub fn parse(name: &str) -> Option<Self> {
        let wanted = name.trim();
        Self::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(wanted))
    }
}

impl std::fmt::Display for FilterPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(FilterPreset::parse("clarendon"), Some(FilterPreset::Clarendon));
        assert_eq!(FilterPreset::parse(" MOON "), Some(FilterPreset::Moon));
        assert_eq!(FilterPreset::parse("Valencia"), None);
    }

    #[test]
    fn test_names_round_trip_through_parse() {
        for preset in FilterPreset::ALL {
            assert_eq!(FilterPreset::parse(preset.name()), Some(preset));
        }
    }

    #[test]
    fn test_only_normal_has_empty_expression() {
        for preset in FilterPreset::ALL {
            assert_eq!(
                preset.base_expression().is_empty(),
                preset == FilterPreset::Normal
            );
        }
    }
}
