//! Scene configuration.
//!
//! Everything tunable about the tree lives in [`SceneConfig`], which can be
//! written to and read from JSON. Missing fields fall back to their defaults,
//! so a config file only needs the values it changes.

use crate::error::ConfigError;
use crate::foliage::FoliageParams;
use crate::particle::GroupLayout;
use crate::spawn::hex_color;
use crate::transition::{InstanceShape, TransitionParams};
use crate::Vec3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete scene configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    pub tree: TreeConfig,
    pub foliage: FoliageConfig,
    pub ornaments: OrnamentsConfig,
    pub effects: EffectsConfig,
    pub gesture: GestureConfig,
    pub camera: CameraConfig,
    pub storage: StorageConfig,
    /// Fixed generation seed. Unset means a different layout each run.
    pub seed: Option<u64>,
}

/// Tree silhouette and group placement.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TreeConfig {
    pub height: f32,
    pub radius: f32,
    /// Vertical offset of the whole tree group.
    pub group_offset_y: f32,
    /// Per-second rate at which the group rotation follows its target.
    pub rotation_rate: f32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            height: 18.0,
            radius: 6.0,
            group_offset_y: -5.0,
            rotation_rate: 3.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FoliageConfig {
    pub count: u32,
    pub scatter_radius: f32,
    pub smoothing_rate: f32,
    pub size_min: f32,
    pub size_span: f32,
    pub breathe_threshold: f32,
}

impl Default for FoliageConfig {
    fn default() -> Self {
        Self {
            count: 15_000,
            scatter_radius: 30.0,
            smoothing_rate: 2.5,
            size_min: 0.1,
            size_span: 0.4,
            breathe_threshold: 0.8,
        }
    }
}

/// One instanced ornament group.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OrnamentGroupConfig {
    pub name: String,
    pub shape: InstanceShape,
    pub count: u32,
    pub scale_base: f32,
    /// Fraction of particles that become gifts.
    #[serde(default)]
    pub gift_ratio: f32,
    /// Cone radius relative to the tree radius.
    #[serde(default = "default_radius_factor")]
    pub radius_factor: f32,
    /// Decorative color as `#RRGGBB`.
    pub color: String,
}

fn default_radius_factor() -> f32 {
    0.9
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrnamentsConfig {
    pub scatter_radius: f32,
    pub smoothing_rate: f32,
    pub groups: Vec<OrnamentGroupConfig>,
}

impl Default for OrnamentsConfig {
    fn default() -> Self {
        Self {
            scatter_radius: 35.0,
            smoothing_rate: 2.0,
            groups: vec![
                OrnamentGroupConfig {
                    name: "gifts".into(),
                    shape: InstanceShape::Box,
                    count: 100,
                    scale_base: 0.8,
                    gift_ratio: 0.3,
                    radius_factor: 0.9,
                    color: "#8B0000".into(),
                },
                OrnamentGroupConfig {
                    name: "baubles".into(),
                    shape: InstanceShape::Sphere,
                    count: 200,
                    scale_base: 0.5,
                    gift_ratio: 0.0,
                    radius_factor: 0.9,
                    color: "#F9E4B7".into(),
                },
            ],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EffectsConfig {
    pub spiral_count: u32,
    pub snow_count: u32,
    pub snow_area: f32,
    pub snow_speed: f32,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            spiral_count: 600,
            snow_count: 600,
            snow_area: 60.0,
            snow_speed: 1.2,
        }
    }
}

/// Gesture debouncing and landmark thresholds.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GestureConfig {
    /// Minimum gap between fist/palm actions.
    pub discrete_cooldown_ms: u64,
    /// Minimum gap between pinch actions.
    pub pinch_cooldown_ms: u64,
    /// Recognizer confidence a label needs to count.
    pub min_score: f32,
    /// Thumb-to-index distance (normalized image units) that counts as a pinch.
    pub pinch_distance: f32,
    /// Multiplier from wrist-to-knuckle X offset to target rotation.
    pub rotation_gain: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            discrete_cooldown_ms: 1000,
            pinch_cooldown_ms: 500,
            min_score: 0.6,
            pinch_distance: 0.08,
            rotation_gain: -8.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub fov_deg: f32,
    /// Orbit speed while auto-rotating, radians per second.
    pub auto_rotate_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 4.0, 25.0],
            fov_deg: 45.0,
            auto_rotate_speed: 0.5,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Namespace key of the memory collection.
    pub key: String,
    pub quota_bytes: usize,
    /// Directory of the file store. Unset means `.arix` in the working directory.
    pub dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            key: "arix-memories".into(),
            quota_bytes: 5 * 1024 * 1024,
            dir: None,
        }
    }
}

/// Parse `#RRGGBB` (leading `#` optional).
pub fn parse_hex_color(s: &str) -> Result<u32, ConfigError> {
    let digits = s.trim().trim_start_matches('#');
    if digits.len() != 6 {
        return Err(ConfigError::Invalid(format!("color '{s}' is not #RRGGBB")));
    }
    u32::from_str_radix(digits, 16)
        .map_err(|_| ConfigError::Invalid(format!("color '{s}' is not #RRGGBB")))
}

impl SceneConfig {
    /// Save the configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject non-positive sizes and ratios outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("tree.height", self.tree.height),
            ("tree.radius", self.tree.radius),
            ("tree.rotation_rate", self.tree.rotation_rate),
            ("foliage.scatter_radius", self.foliage.scatter_radius),
            ("foliage.smoothing_rate", self.foliage.smoothing_rate),
            ("foliage.size_min", self.foliage.size_min),
            ("ornaments.scatter_radius", self.ornaments.scatter_radius),
            ("ornaments.smoothing_rate", self.ornaments.smoothing_rate),
            ("effects.snow_area", self.effects.snow_area),
            ("gesture.pinch_distance", self.gesture.pinch_distance),
            ("camera.fov_deg", self.camera.fov_deg),
        ];
        for (name, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }
        let ratios = [
            ("foliage.breathe_threshold", self.foliage.breathe_threshold),
            ("gesture.min_score", self.gesture.min_score),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!("{name} must be within [0, 1], got {value}")));
            }
        }
        for group in &self.ornaments.groups {
            if group.scale_base.is_nan()
                || group.scale_base <= 0.0
                || group.radius_factor.is_nan()
                || group.radius_factor <= 0.0
            {
                return Err(ConfigError::Invalid(format!(
                    "group '{}' needs a positive scale_base and radius_factor",
                    group.name
                )));
            }
            if !(0.0..=1.0).contains(&group.gift_ratio) {
                return Err(ConfigError::Invalid(format!(
                    "group '{}' gift_ratio must be within [0, 1], got {}",
                    group.name, group.gift_ratio
                )));
            }
            parse_hex_color(&group.color)?;
        }
        if self.storage.key.is_empty() {
            return Err(ConfigError::Invalid("storage.key must not be empty".into()));
        }
        Ok(())
    }

    pub fn foliage_params(&self) -> FoliageParams {
        FoliageParams {
            count: self.foliage.count,
            scatter_radius: self.foliage.scatter_radius,
            tree_height: self.tree.height,
            tree_radius: self.tree.radius,
            smoothing_rate: self.foliage.smoothing_rate,
            size_min: self.foliage.size_min,
            size_span: self.foliage.size_span,
            breathe_threshold: self.foliage.breathe_threshold,
        }
    }

    /// Particle layout of one ornament group.
    pub fn group_layout(&self, group: &OrnamentGroupConfig) -> Result<GroupLayout, ConfigError> {
        Ok(GroupLayout {
            scatter_radius: self.ornaments.scatter_radius,
            tree_height: self.tree.height,
            tree_radius: self.tree.radius * group.radius_factor,
            gift_ratio: group.gift_ratio,
            base_color: hex_color(parse_hex_color(&group.color)?),
        })
    }

    pub fn transition_params(&self, group: &OrnamentGroupConfig) -> TransitionParams {
        TransitionParams {
            smoothing_rate: self.ornaments.smoothing_rate,
            scale_base: group.scale_base,
            shape: group.shape,
        }
    }

    pub fn camera_position(&self) -> Vec3 {
        Vec3::from(self.camera.position)
    }
}
