use ndarray::Axis;

use crate::frame::Frame;
use crate::pose::Heatmap;

/// ヒートマップ表示用の画像
///
/// 画素ごとに全関節の最大応答を赤チャンネルに載せ、フレームと半々で合成する。
/// ヒートマップがフレームと同サイズでなければここでリサイズする。
pub fn heatmap_overlay(frame: &Frame, heatmap: &Heatmap) -> Frame {
    let (h, w, _) = frame.dim();
    let resized;
    let heatmap = if (heatmap.height(), heatmap.width()) == (h, w) {
        heatmap
    } else {
        resized = heatmap.resized(h, w);
        &resized
    };
    let peak = heatmap
        .view()
        .fold_axis(Axis(2), f32::NEG_INFINITY, |acc, &v| if v > *acc { v } else { *acc });

    let mut out = frame.clone();
    for ((y, x, c), px) in out.indexed_iter_mut() {
        let response = peak[[y, x]];
        let heat = if response.is_finite() {
            (response.clamp(0.0, 1.0) * 255.0) as u16
        } else {
            0
        };
        // BGR の最後 (赤) にだけ載せる
        let layer = if c == 2 { heat } else { 0 };
        *px = ((*px as u16 + layer) / 2) as u8;
    }
    out
}
