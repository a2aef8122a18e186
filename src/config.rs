use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// 色テーブルで扱える最大関節数 (6グループ x 4)
pub const MAX_JOINTS: usize = 24;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub kalman: KalmanConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// ONNXモデルのパス
    #[serde(default = "default_model_path")]
    pub path: String,
    /// モデル入力画像 (= 処理フレーム) の一辺
    #[serde(default = "default_input_size")]
    pub input_size: usize,
    /// モデル出力ヒートマップの一辺 (出力がこのサイズでなければエラー)
    #[serde(default = "default_heatmap_size")]
    pub heatmap_size: usize,
    /// センターマップのガウシアン半径
    #[serde(default = "default_center_map_radius")]
    pub center_map_radius: f32,
    #[serde(default = "default_joints")]
    pub joints: usize,
    #[serde(default = "default_image_input_name")]
    pub image_input_name: String,
    #[serde(default = "default_center_map_input_name")]
    pub center_map_input_name: String,
    /// CPM 最終ステージの出力名
    #[serde(default = "default_heatmap_output_name")]
    pub heatmap_output_name: String,
}

fn default_model_path() -> String { "models/cpm_hand.onnx".to_string() }
fn default_input_size() -> usize { 368 }
fn default_heatmap_size() -> usize { 46 }
fn default_center_map_radius() -> f32 { 21.0 }
fn default_joints() -> usize { 21 }
fn default_image_input_name() -> String { "input_image".to_string() }
fn default_center_map_input_name() -> String { "center_map".to_string() }
fn default_heatmap_output_name() -> String { "stage_heatmap".to_string() }

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
            input_size: default_input_size(),
            heatmap_size: default_heatmap_size(),
            center_map_radius: default_center_map_radius(),
            joints: default_joints(),
            image_input_name: default_image_input_name(),
            center_map_input_name: default_center_map_input_name(),
            heatmap_output_name: default_heatmap_output_name(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CameraConfig {
    /// Webカメラのデバイス番号
    #[serde(default)]
    pub index: i32,
    #[serde(default = "default_capture_width")]
    pub width: u32,
    #[serde(default = "default_capture_height")]
    pub height: u32,
    /// OpenNI2 の深度ストリームも開く
    #[serde(default = "default_depth_enabled")]
    pub depth: bool,
    /// 手とみなす深度の範囲 (センサー単位、両端含む)
    #[serde(default = "default_hand_near")]
    pub hand_near: u16,
    #[serde(default = "default_hand_far")]
    pub hand_far: u16,
}

fn default_capture_width() -> u32 { 640 }
fn default_capture_height() -> u32 { 480 }
fn default_depth_enabled() -> bool { true }
fn default_hand_near() -> u16 { 2000 }
fn default_hand_far() -> u16 { 8000 }

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: default_capture_width(),
            height: default_capture_height(),
            depth: default_depth_enabled(),
            hand_near: default_hand_near(),
            hand_far: default_hand_far(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct KalmanConfig {
    #[serde(default = "default_kalman_enabled")]
    pub enabled: bool,
    /// プロセスノイズ係数 (状態4次元すべてに適用)
    #[serde(default = "default_kalman_noise")]
    pub noise: f32,
}

fn default_kalman_enabled() -> bool { true }
fn default_kalman_noise() -> f32 { 3e-2 }

impl Default for KalmanConfig {
    fn default() -> Self {
        Self {
            enabled: default_kalman_enabled(),
            noise: default_kalman_noise(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    #[serde(default = "default_export_enabled")]
    pub enabled: bool,
    #[serde(default = "default_export_dir")]
    pub dir: PathBuf,
}

fn default_export_enabled() -> bool { true }
fn default_export_dir() -> PathBuf { PathBuf::from("json") }

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: default_export_enabled(),
            dir: default_export_dir(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// ファイルがなければデフォルト設定
    ///
    /// ファイルがあって読めない・不正な場合はエラー
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            log::info!("{} not found, using default configuration", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        let m = &self.model;
        if m.joints == 0 || m.joints > MAX_JOINTS {
            bail!("model.joints must be in 1..={}, got {}", MAX_JOINTS, m.joints);
        }
        if m.input_size == 0 || m.heatmap_size == 0 {
            bail!("model.input_size and model.heatmap_size must be non-zero");
        }
        if !(m.center_map_radius > 0.0) {
            bail!("model.center_map_radius must be positive");
        }
        if !(self.kalman.noise >= 0.0) {
            bail!("kalman.noise must be non-negative, got {}", self.kalman.noise);
        }
        if self.camera.hand_near > self.camera.hand_far {
            bail!(
                "camera.hand_near ({}) is beyond camera.hand_far ({})",
                self.camera.hand_near,
                self.camera.hand_far
            );
        }
        Ok(())
    }
}
