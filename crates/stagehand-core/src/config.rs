use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{StageError, StageResult};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub fps: f64,
    /// Emit tween frames between settled steps, not just one frame per step.
    pub emit_intermediate_frames: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            fps: 30.0,
            emit_intermediate_frames: false,
        }
    }
}

/// Defaults for the reference grid drawn behind a scene.
///
/// A scene that asks for a grid without giving its dimensions gets these.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GridConfig {
    pub rows: usize,
    pub columns: usize,
    pub width: f64,
    pub height: f64,
    /// Decimal places tick values are rounded to.
    pub number_decimals: u32,
    pub label_buff: f64,
    pub label_size: f64,
    pub grid_color: Color,
    pub grid_stroke: f64,
    pub axis_color: Color,
    pub axis_stroke: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 8,
            columns: 14,
            width: 14.0,
            height: 8.0,
            number_decimals: 2,
            label_buff: 0.0,
            label_size: 0.25,
            grid_color: Color::WHITE,
            grid_stroke: 0.5,
            axis_color: Color::RED,
            axis_stroke: 2.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StyleConfig {
    pub stroke_color: Color,
    pub stroke_width: f64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            stroke_color: Color::WHITE,
            stroke_width: 4.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct StageConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub style: StyleConfig,
}

impl StageConfig {
    pub fn from_toml_str(contents: &str) -> StageResult<Self> {
        let config: StageConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &std::path::Path) -> StageResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn save_to_file(&self, path: &std::path::Path) -> StageResult<()> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| StageError::Config(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> StageResult<()> {
        if !(self.playback.fps.is_finite() && self.playback.fps > 0.0) {
            return Err(StageError::Config(format!(
                "playback.fps must be positive, got {}",
                self.playback.fps
            )));
        }
        if !(self.grid.width.is_finite() && self.grid.width > 0.0)
            || !(self.grid.height.is_finite() && self.grid.height > 0.0)
        {
            return Err(StageError::Config(
                "grid width and height must be positive".into(),
            ));
        }
        let strokes = [
            ("style.stroke_width", self.style.stroke_width),
            ("grid.grid_stroke", self.grid.grid_stroke),
            ("grid.axis_stroke", self.grid.axis_stroke),
        ];
        for (key, width) in strokes {
            if !(width.is_finite() && width >= 0.0) {
                return Err(StageError::Config(format!(
                    "{} must be a non-negative number, got {}",
                    key, width
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config = StageConfig::from_toml_str("").unwrap();
        assert!((config.playback.fps - 30.0).abs() < 1e-9);
        assert!(!config.playback.emit_intermediate_frames);
        assert_eq!(config.grid.rows, 8);
        assert_eq!(config.grid.columns, 14);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = StageConfig::from_toml_str(
            r##"
[playback]
emit_intermediate_frames = true

[style]
stroke_color = "#FF0000"
"##,
        )
        .unwrap();
        assert!(config.playback.emit_intermediate_frames);
        assert!((config.playback.fps - 30.0).abs() < 1e-9);
        assert_eq!(config.style.stroke_color.to_rgba8(), [255, 0, 0, 255]);
        assert!((config.style.stroke_width - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_zero_fps() {
        let err = StageConfig::from_toml_str("[playback]\nfps = 0.0\n").unwrap_err();
        assert!(matches!(err, StageError::Config(_)));
    }

    #[test]
    fn test_rejects_nan_and_negative_strokes() {
        for toml in [
            "[style]\nstroke_width = nan\n",
            "[style]\nstroke_width = -1.0\n",
            "[grid]\naxis_stroke = inf\n",
            "[grid]\ngrid_stroke = -0.5\n",
        ] {
            let err = StageConfig::from_toml_str(toml).unwrap_err();
            assert!(matches!(err, StageError::Config(_)), "{toml}");
        }
    }

    #[test]
    fn test_grid_styles_from_toml() {
        let config = StageConfig::from_toml_str(
            r##"
[grid]
grid_color = "#00ff00"
axis_stroke = 3.0
"##,
        )
        .unwrap();
        assert_eq!(config.grid.grid_color.to_rgba8(), [0, 255, 0, 255]);
        assert!((config.grid.grid_stroke - 0.5).abs() < 1e-9);
        assert_eq!(config.grid.axis_color, Color::RED);
        assert!((config.grid.axis_stroke - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_malformed_toml_is_reported() {
        let err = StageConfig::from_toml_str("[playback\n").unwrap_err();
        assert!(matches!(err, StageError::Toml(_)));
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!(
            "stagehand-config-{}.toml",
            std::process::id()
        ));
        let mut config = StageConfig::default();
        config.grid.rows = 4;
        config.save_to_file(&path).unwrap();
        let loaded = StageConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.grid.rows, 4);
    }
}
