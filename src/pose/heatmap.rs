use ndarray::{s, Array3, ArrayView2, ArrayView3, ArrayViewD, Axis};

use super::joint::{Joint, JointSet};
use super::resize::resize_channels;
use crate::error::{PipelineError, PipelineResult};

/// 1フレーム分の関節ごとの信頼度マップ `[H, W, J]`
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    data: Array3<f32>,
}

impl Heatmap {
    pub fn new(data: Array3<f32>) -> Self {
        Self { data }
    }

    /// モデル出力 `[1, size, size, C]` から先頭 `joints` チャンネルを取り出す
    ///
    /// 末尾のチャンネル (CPM の背景マップ) は捨てる。
    pub fn from_model_output(output: ArrayViewD<f32>, joints: usize, size: usize) -> PipelineResult<Self> {
        let shape = output.shape().to_vec();
        if shape.len() != 4 || shape[0] != 1 || shape[1] != size || shape[2] != size {
            return Err(PipelineError::HeatmapShape(shape));
        }
        if shape[3] < joints {
            return Err(PipelineError::JointCountMismatch {
                expected: joints,
                found: shape[3],
            });
        }
        let batch = output
            .into_dimensionality::<ndarray::Ix4>()
            .map_err(|_| PipelineError::HeatmapShape(shape.clone()))?;
        let data = batch.slice(s![0, .., .., 0..joints]).to_owned();
        Ok(Self { data })
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn joint_count(&self) -> usize {
        self.data.dim().2
    }

    pub fn view(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    pub fn channel(&self, joint: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(2), joint)
    }

    /// 全チャンネルを `height x width` にリサイズ
    pub fn resized(&self, height: usize, width: usize) -> Heatmap {
        Heatmap::new(resize_channels(self.data.view(), height, width))
    }
}

/// 最大値の位置 (行優先で最初に現れたもの)
///
/// NaN は選ばれない。有限の最大値がなければ `(0, 0)`。
pub fn channel_argmax(channel: ArrayView2<f32>) -> (usize, usize) {
    let mut best = (0, 0);
    let mut best_val = f32::NEG_INFINITY;
    let mut found = false;

    for ((row, col), &v) in channel.indexed_iter() {
        if v.is_nan() {
            continue;
        }
        if !found || v > best_val {
            best = (row, col);
            best_val = v;
            found = true;
        }
    }

    best
}

/// 関節ごとに1点をデコード
///
/// 座標はヒートマップ自身の画素。フレーム座標が欲しい場合は先に
/// [`Heatmap::resized`] でフレーム解像度に合わせておく。
pub fn decode(heatmap: &Heatmap) -> JointSet {
    (0..heatmap.joint_count())
        .map(|j| {
            let (row, col) = channel_argmax(heatmap.channel(j));
            Joint::new(row as f32, col as f32)
        })
        .collect::<Vec<_>>()
        .into()
}
