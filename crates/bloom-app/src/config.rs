use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use bloom_crate_tools::resource::BloomPath;

/// 指定配置文件路径的环境变量
pub const CONFIG_ENV: &str = "BLOOM_CONFIG";
/// 默认配置文件，位于工作区根目录
pub const DEFAULT_CONFIG_FILE: &str = "bloom.toml";

/// 启动配置，所有字段都有默认值
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BloomConfig {
    pub window: WindowConfig,
    pub bloom: BloomParams,
    pub scene: SceneConfig,
    pub assets: AssetsConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// false 时优先使用 MAILBOX
    pub vsync: bool,
}
impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Vulkan Example - Bloom".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BloomParams {
    pub enabled: bool,
    pub blur_scale: f32,
    pub blur_strength: f32,
    /// 数字键盘 +/- 每次的增量
    pub blur_scale_step: f32,
}
impl Default for BloomParams {
    fn default() -> Self {
        Self {
            enabled: true,
            blur_scale: 1.0,
            blur_strength: 1.5,
            blur_scale_step: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    pub zoom: f32,
    /// 角度制
    pub rotation: [f32; 3],
    pub timer_speed: f32,
    pub paused: bool,
}
impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            zoom: -10.25,
            rotation: [7.5, -343.0, 0.0],
            timer_speed: 0.125,
            paused: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    pub dir: PathBuf,
    pub shader_dir: PathBuf,
}
impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("assets"),
            shader_dir: PathBuf::from("shaders/bloom"),
        }
    }
}
impl AssetsConfig {
    /// 资源路径，相对于 `dir`
    pub fn asset_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        BloomPath::resolve(&self.dir).join(relative)
    }

    /// 编译后的 SPIR-V，例如 `shader_path("skybox.vert")`
    pub fn shader_path(&self, name: &str) -> PathBuf {
        BloomPath::shader_path(&self.shader_dir, name)
    }
}

impl BloomConfig {
    /// 优先使用环境变量指定的文件，其次是工作区根目录下的 `bloom.toml`；
    /// 文件不存在时使用默认配置
    pub fn load() -> anyhow::Result<Self> {
        let path = match std::env::var_os(CONFIG_ENV) {
            Some(path) => BloomPath::resolve(PathBuf::from(path)),
            None => BloomPath::workspace_path().join(DEFAULT_CONFIG_FILE),
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            log::info!("config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::from_toml_str(&text).with_context(|| format!("failed to parse config {}", path.display()))?;
        log::info!("config loaded from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BloomConfig::default();
        assert_eq!(config.window.title, "Vulkan Example - Bloom");
        assert!(config.bloom.enabled);
        assert_eq!(config.bloom.blur_scale, 1.0);
        assert_eq!(config.bloom.blur_strength, 1.5);
        assert_eq!(config.bloom.blur_scale_step, 0.25);
        assert_eq!(config.scene.zoom, -10.25);
        assert_eq!(config.scene.rotation, [7.5, -343.0, 0.0]);
        assert_eq!(config.scene.timer_speed, 0.125);
        assert!(!config.scene.paused);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(BloomConfig::from_toml_str("").unwrap(), BloomConfig::default());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = BloomConfig::from_toml_str(
            r#"
            [bloom]
            enabled = false
            blur_scale = 1.5

            [window]
            width = 800
            "#,
        )
        .unwrap();
        assert!(!config.bloom.enabled);
        assert_eq!(config.bloom.blur_scale, 1.5);
        assert_eq!(config.bloom.blur_strength, 1.5);
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.scene, SceneConfig::default());
    }

    #[test]
    fn test_malformed_toml_is_error() {
        assert!(BloomConfig::from_toml_str("[bloom\nenabled = ").is_err());
        assert!(BloomConfig::from_toml_str("[bloom]\nenabled = \"yes\"").is_err());
        assert!(BloomConfig::from_toml_str("[bloom]\nblur_scael = 2.0").is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = BloomPath::workspace_path().join("no-such-dir").join("bloom.toml");
        assert_eq!(BloomConfig::load_from(&path).unwrap(), BloomConfig::default());
    }

    #[test]
    fn test_shader_path() {
        let path = AssetsConfig::default().shader_path("gaussblur.frag");
        assert!(path.ends_with("shaders/bloom/gaussblur.frag.spv"));
    }
}
