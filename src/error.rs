//! パイプラインのエラー分類

use std::path::PathBuf;

/// パイプラインを止めるエラー
///
/// 平坦なヒートマップ、範囲外の関節、長さが不自然な骨はその場で処理し、ここには来ない。
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// フレーム/深度の取得失敗、または不正なデータ
    #[error("frame acquisition failed: {0:#}")]
    Acquisition(anyhow::Error),

    /// 推論失敗
    #[error("inference failed: {0:#}")]
    Inference(anyhow::Error),

    /// ヒートマップのチャンネル数がトラッカーの関節数と合わない
    #[error("heatmap has {found} joint channels, expected {expected}")]
    JointCountMismatch { expected: usize, found: usize },

    /// モデル出力が設定どおりの [1, size, size, C] でない
    #[error("unexpected heatmap tensor shape {0:?}")]
    HeatmapShape(Vec<usize>),

    #[error("failed to write frame record {path}")]
    ExportIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode frame record")]
    ExportEncode(#[from] serde_json::Error),

    #[error("display failed: {0:#}")]
    Display(anyhow::Error),
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
