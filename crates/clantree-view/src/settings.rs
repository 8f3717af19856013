use crate::controller::{ControllerConfig, ScaleExtent};
use crate::easing::Easing;
use anyhow::{Context, Result};
use clantree_core::LayoutDirection;
use clantree_graph::{NodeSpacing, Separation, TidyTreeLayouter, Vec2};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunables for layout, viewport behaviour and node cards.
///
/// Every field has a default, so a settings file only needs the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    pub node_spacing: NodeSpacing,
    pub separation: Separation,
    pub layout_direction: LayoutDirection,

    pub min_scale: f32,
    pub max_scale: f32,
    pub focus_scale: f32,
    pub focus_duration_ms: u64,
    pub focus_easing: Easing,

    pub initial_scale: f32,
    pub initial_offset_y: f32,

    /// Pointer travel in pixels below which a press-release is a click.
    pub click_threshold: f32,
    pub zoom_step: f32,

    pub node_card: CardSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardSize {
    pub width: f32,
    pub height: f32,
}

impl Default for CardSize {
    fn default() -> Self {
        Self {
            width: 140.0,
            height: 160.0,
        }
    }
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            node_spacing: NodeSpacing::default(),
            separation: Separation::default(),
            layout_direction: LayoutDirection::default(),
            min_scale: 0.1,
            max_scale: 2.0,
            focus_scale: 1.0,
            focus_duration_ms: 750,
            focus_easing: Easing::default(),
            initial_scale: 0.85,
            initial_offset_y: 100.0,
            click_threshold: 3.0,
            zoom_step: 1.2,
            node_card: CardSize::default(),
        }
    }
}

impl ViewSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("parsing settings in {}", path.display()))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: ViewSettings = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Replace out-of-range values with something usable.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let positive = |v: f32, fallback: f32| {
            if v.is_finite() && v > 0.0 { v } else { fallback }
        };

        let min_scale = positive(self.min_scale, defaults.min_scale);
        let max_scale = positive(self.max_scale, defaults.max_scale).max(min_scale);
        let zoom_step = if self.zoom_step.is_finite() && self.zoom_step > 1.0 {
            self.zoom_step
        } else {
            defaults.zoom_step
        };

        Self {
            node_spacing: NodeSpacing::new(
                positive(self.node_spacing.width, defaults.node_spacing.width),
                positive(self.node_spacing.height, defaults.node_spacing.height),
            ),
            separation: self.separation.sanitized(),
            min_scale,
            max_scale,
            focus_scale: positive(self.focus_scale, defaults.focus_scale)
                .clamp(min_scale, max_scale),
            initial_scale: positive(self.initial_scale, defaults.initial_scale)
                .clamp(min_scale, max_scale),
            initial_offset_y: if self.initial_offset_y.is_finite() {
                self.initial_offset_y
            } else {
                defaults.initial_offset_y
            },
            click_threshold: if self.click_threshold.is_finite() && self.click_threshold >= 0.0 {
                self.click_threshold
            } else {
                defaults.click_threshold
            },
            zoom_step,
            node_card: CardSize {
                width: positive(self.node_card.width, defaults.node_card.width),
                height: positive(self.node_card.height, defaults.node_card.height),
            },
            ..self
        }
    }

    pub fn layouter(&self) -> TidyTreeLayouter {
        TidyTreeLayouter::new(self.node_spacing)
            .with_separation(self.separation)
            .with_direction(self.layout_direction)
    }

    pub fn card_size(&self) -> Vec2 {
        Vec2::new(self.node_card.width, self.node_card.height)
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            scale_extent: ScaleExtent::new(self.min_scale, self.max_scale),
            focus_scale: self.focus_scale,
            focus_duration: Duration::from_millis(self.focus_duration_ms),
            easing: self.focus_easing,
            initial_scale: self.initial_scale,
            initial_offset_y: self.initial_offset_y,
            click_threshold: self.click_threshold,
            zoom_step: self.zoom_step,
        }
    }
}
