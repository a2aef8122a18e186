use anyhow::Result;
use ndarray::Array4;

use super::heatmap::Heatmap;

/// 手の姿勢推定モデル
///
/// 入力: [`preprocess_for_cpm`](super::preprocess::preprocess_for_cpm) の [1, S, S, 3] テンソルと
/// 固定の [1, S, S, 1] センターマップ
/// 出力: 最終ステージのヒートマップ
pub trait HandModel {
    fn infer(&mut self, image: &Array4<f32>, center_map: &Array4<f32>) -> Result<Heatmap>;
}

impl<M: HandModel + ?Sized> HandModel for Box<M> {
    fn infer(&mut self, image: &Array4<f32>, center_map: &Array4<f32>) -> Result<Heatmap> {
        (**self).infer(image, center_map)
    }
}

#[cfg(feature = "desktop")]
pub use onnx::CpmDetector;

#[cfg(feature = "desktop")]
mod onnx {
    use anyhow::{Context, Result};
    use ndarray::Array4;
    use ort::session::builder::GraphOptimizationLevel;
    use ort::session::Session;
    use ort::value::Tensor;
    use std::path::Path;

    use super::HandModel;
    use crate::config::ModelConfig;
    use crate::pose::heatmap::Heatmap;

    /// ONNX Runtime で動かす CPM (Convolutional Pose Machine) ハンドモデル
    pub struct CpmDetector {
        session: Session,
        joints: usize,
        heatmap_size: usize,
        image_input: String,
        center_map_input: String,
        heatmap_output: String,
    }

    fn build_session(model_path: &Path) -> Result<Session> {
        let builder = Session::builder()?.with_optimization_level(GraphOptimizationLevel::Level3)?;

        #[cfg(feature = "cuda")]
        let builder = {
            log::info!("[ort] attempting CUDA execution provider");
            builder.with_execution_providers([ort::execution_providers::CUDAExecutionProvider::default().build()])?
        };

        builder
            .commit_from_file(model_path)
            .with_context(|| format!("Failed to load ONNX model {}", model_path.display()))
    }

    impl CpmDetector {
        /// ONNXモデルを読み込んで初期化
        pub fn new(config: &ModelConfig) -> Result<Self> {
            let session = build_session(Path::new(&config.path))?;
            log::info!("model loaded from {}", config.path);
            Ok(Self {
                session,
                joints: config.joints,
                heatmap_size: config.heatmap_size,
                image_input: config.image_input_name.clone(),
                center_map_input: config.center_map_input_name.clone(),
                heatmap_output: config.heatmap_output_name.clone(),
            })
        }
    }

    impl HandModel for CpmDetector {
        fn infer(&mut self, image: &Array4<f32>, center_map: &Array4<f32>) -> Result<Heatmap> {
            let image_tensor = Tensor::from_array(image.clone())?;
            let center_tensor = Tensor::from_array(center_map.clone())?;
            let outputs = self
                .session
                .run(ort::inputs![
                    self.image_input.as_str() => image_tensor,
                    self.center_map_input.as_str() => center_tensor,
                ])
                .context("Inference failed")?;

            // CPM の出力は [1, H, W, J + 1] (最後は背景)
            let output: ndarray::ArrayViewD<f32> = outputs[self.heatmap_output.as_str()]
                .try_extract_array()
                .context("Failed to extract heatmap tensor")?;

            Ok(Heatmap::from_model_output(output, self.joints, self.heatmap_size)?)
        }
    }
}
