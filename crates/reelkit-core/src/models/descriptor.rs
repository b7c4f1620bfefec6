//! Per-asset metadata handed to the post-submission collaborator alongside
//! the uploaded bytes.

use serde::{Deserialize, Serialize};

use super::adjustments::AdjustmentStack;
use super::asset::{EditSnapshot, TrimWindow};
use super::filter::FilterPreset;
use super::media::MediaKind;

const LABEL_TOLERANCE: f64 = 0.01;

/// Crop aspect reduced to the fixed label set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatioLabel {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:5")]
    Portrait,
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Vertical,
    #[serde(rename = "custom")]
    Custom,
    #[serde(rename = "original")]
    Original,
}

impl AspectRatioLabel {
    const FIXED: [(AspectRatioLabel, f64); 4] = [
        (AspectRatioLabel::Square, 1.0),
        (AspectRatioLabel::Portrait, 4.0 / 5.0),
        (AspectRatioLabel::Landscape, 16.0 / 9.0),
        (AspectRatioLabel::Vertical, 9.0 / 16.0),
    ];

    /// Fixed ratios win over "original" so a square source cropped square is
    /// still reported as `1:1`.
    pub fn from_aspect(target_aspect: f64, native_aspect: f64) -> Self {
        if let Some((label, _)) = Self::FIXED
            .iter()
            .find(|(_, ratio)| (target_aspect - ratio).abs() < LABEL_TOLERANCE)
        {
            return *label;
        }
        if (target_aspect - native_aspect).abs() < LABEL_TOLERANCE {
            AspectRatioLabel::Original
        } else {
            AspectRatioLabel::Custom
        }
    }

    /// Numeric ratio of a fixed label
    pub fn ratio(self) -> Option<f64> {
        Self::FIXED
            .iter()
            .find(|(label, _)| *label == self)
            .map(|(_, ratio)| *ratio)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatioLabel::Square => "1:1",
            AspectRatioLabel::Portrait => "4:5",
            AspectRatioLabel::Landscape => "16:9",
            AspectRatioLabel::Vertical => "9:16",
            AspectRatioLabel::Custom => "custom",
            AspectRatioLabel::Original => "original",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "1:1" | "square" => Some(AspectRatioLabel::Square),
            "4:5" | "portrait" => Some(AspectRatioLabel::Portrait),
            "16:9" | "landscape" => Some(AspectRatioLabel::Landscape),
            "9:16" | "vertical" => Some(AspectRatioLabel::Vertical),
            "custom" => Some(AspectRatioLabel::Custom),
            "original" => Some(AspectRatioLabel::Original),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropDescriptor {
    pub mode: String,
    pub aspect_ratio_label: AspectRatioLabel,
    pub zoom: f64,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingDescriptor {
    pub start: f64,
    pub end: f64,
}

impl From<TrimWindow> for TimingDescriptor {
    fn from(trim: TrimWindow) -> Self {
        Self {
            start: trim.start,
            end: trim.end,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDescriptor {
    pub name: String,
    pub css: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub crop: CropDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimingDescriptor>,
    pub filter: FilterDescriptor,
    pub adjustments: AdjustmentStack,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound_enabled: Option<bool>,
}

impl AssetDescriptor {
    /// Build a descriptor from an edit snapshot. `css` is the composite filter
    /// expression already rendered for the snapshot's filter and adjustments.
    pub fn from_snapshot(
        kind: MediaKind,
        native_aspect: f64,
        snapshot: &EditSnapshot,
        css: String,
    ) -> Self {
        let filter: FilterPreset = snapshot.filter;
        Self {
            kind,
            crop: CropDescriptor {
                mode: "original".to_string(),
                aspect_ratio_label: AspectRatioLabel::from_aspect(
                    snapshot.target_aspect,
                    native_aspect,
                ),
                zoom: snapshot.zoom_factor,
                x: snapshot.crop_offset.x,
                y: snapshot.crop_offset.y,
            },
            timing: match kind {
                MediaKind::Video => snapshot.trim.map(TimingDescriptor::from),
                MediaKind::Image => None,
            },
            filter: FilterDescriptor {
                name: filter.name().to_string(),
                css,
            },
            adjustments: snapshot.adjustments,
            sound_enabled: match kind {
                MediaKind::Video => Some(snapshot.sound_enabled),
                MediaKind::Image => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Adjustment, CropOffset};

    fn snapshot(target_aspect: f64) -> EditSnapshot {
        EditSnapshot {
            target_aspect,
            crop_offset: CropOffset { x: -12.5, y: 4.0 },
            zoom_factor: 1.5,
            crop_region: None,
            filter: FilterPreset::Juno,
            adjustments: AdjustmentStack::default().with(Adjustment::Fade, 40),
            trim: Some(TrimWindow::new(2.0, 7.0)),
            sound_enabled: false,
        }
    }

    #[test]
    fn test_label_from_aspect() {
        let native = 4000.0 / 3000.0;
        assert_eq!(AspectRatioLabel::from_aspect(1.0, native), AspectRatioLabel::Square);
        assert_eq!(AspectRatioLabel::from_aspect(0.8, native), AspectRatioLabel::Portrait);
        assert_eq!(
            AspectRatioLabel::from_aspect(1920.0 / 1080.0, native),
            AspectRatioLabel::Landscape
        );
        assert_eq!(AspectRatioLabel::from_aspect(0.5625, native), AspectRatioLabel::Vertical);
        assert_eq!(AspectRatioLabel::from_aspect(native, native), AspectRatioLabel::Original);
        assert_eq!(AspectRatioLabel::from_aspect(2.35, native), AspectRatioLabel::Custom);
    }

    #[test]
    fn test_label_serializes_as_ratio_text() {
        for label in [
            AspectRatioLabel::Square,
            AspectRatioLabel::Portrait,
            AspectRatioLabel::Landscape,
            AspectRatioLabel::Vertical,
            AspectRatioLabel::Custom,
            AspectRatioLabel::Original,
        ] {
            let json = serde_json::to_string(&label).unwrap();
            assert_eq!(json, format!("\"{}\"", label.as_str()));
            assert_eq!(AspectRatioLabel::parse(label.as_str()), Some(label));
        }
    }

    #[test]
    fn test_video_descriptor_json_shape() {
        let descriptor = AssetDescriptor::from_snapshot(
            MediaKind::Video,
            16.0 / 9.0,
            &snapshot(9.0 / 16.0),
            "contrast(1.15)".to_string(),
        );
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["type"], "video");
        assert_eq!(json["crop"]["mode"], "original");
        assert_eq!(json["crop"]["aspect_ratio_label"], "9:16");
        assert!(json["crop"].get("aspect_ratio").is_none());
        assert_eq!(json["crop"]["zoom"], 1.5);
        assert_eq!(json["timing"]["start"], 2.0);
        assert_eq!(json["timing"]["end"], 7.0);
        assert_eq!(json["filter"]["name"], "Juno");
        assert_eq!(json["adjustments"]["fade"], 40);
        assert_eq!(json["sound_enabled"], false);
    }

    #[test]
    fn test_image_descriptor_omits_video_fields() {
        let descriptor = AssetDescriptor::from_snapshot(
            MediaKind::Image,
            1.0,
            &snapshot(1.0),
            String::new(),
        );
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["type"], "image");
        assert!(json.get("timing").is_none());
        assert!(json.get("sound_enabled").is_none());
    }
}
