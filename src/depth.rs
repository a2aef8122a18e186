//! 追跡関節の深度取得
//!
//! 既存の書き出しファイルと同じ参照方法を保つ:
//! - 関節は `x = row`, `y = col` として読み、範囲はモデル入力サイズ
//! - 深度は1画素左上の `[trunc(x) - 1, trunc(y) - 1]` から取る
//! - インデックス `-1` は最後の行/列に回り込む

use crate::frame::DepthMap;
use crate::pose::{Joint, JointSet};

pub struct DepthAnnotator {
    input_size: f32,
}

impl DepthAnnotator {
    pub fn new(input_size: usize) -> Self {
        Self {
            input_size: input_size as f32,
        }
    }

    /// 1関節の深度 (範囲外は 0)
    pub fn depth_at(&self, joint: &Joint, depth: &DepthMap) -> u16 {
        let (x, y) = (joint.row, joint.col);
        let in_bounds = |v: f32| v >= 0.0 && v <= self.input_size;
        if !in_bounds(x) || !in_bounds(y) {
            return 0;
        }

        let (rows, cols) = depth.dim();
        match (wrap_index(x, rows), wrap_index(y, cols)) {
            (Some(r), Some(c)) => depth[[r, c]],
            _ => 0,
        }
    }

    /// 全関節の深度 (インデックス順)
    pub fn annotate(&self, joints: &JointSet, depth: &DepthMap) -> Vec<u16> {
        joints.iter().map(|j| self.depth_at(j, depth)).collect()
    }
}

fn wrap_index(v: f32, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let i = v.trunc() as isize - 1;
    if i == -1 {
        Some(len - 1)
    } else if i >= 0 && (i as usize) < len {
        Some(i as usize)
    } else {
        None
    }
}
