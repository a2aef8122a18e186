use ndarray::{Array2, Array3};

/// カラーフレーム [height, width, 3] (チャンネル順は取得元のまま、OpenCVならBGR)
pub type Frame = Array3<u8>;

/// 深度マップ [height, width] (センサー単位)
pub type DepthMap = Array2<u16>;

/// 取得元から1回分に得たデータ
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// カメラからのフレームそのまま
    pub original: Frame,
    /// モデル入力サイズの正方形フレーム (関節座標はこの画素)
    pub frame: Frame,
    pub depth: DepthMap,
    /// 手の距離帯だけ残した深度 (それ以外は 0)
    pub hand_depth: DepthMap,
}

/// `near..=far` 以外を 0 にする
pub fn mask_depth_band(depth: &DepthMap, near: u16, far: u16) -> DepthMap {
    depth.mapv(|d| if d >= near && d <= far { d } else { 0 })
}

/// 表示用に深度を8bitグレーへ変換 (最大値が 255)
pub fn depth_to_frame(depth: &DepthMap) -> Frame {
    let max = depth.iter().copied().max().unwrap_or(0).max(1) as u32;
    let (h, w) = depth.dim();
    Array3::from_shape_fn((h, w, 3), |(y, x, _)| (depth[[y, x]] as u32 * 255 / max) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_depth_band() {
        let depth = Array2::from_shape_vec((1, 5), vec![0u16, 1999, 2000, 8000, 8001]).unwrap();
        let masked = mask_depth_band(&depth, 2000, 8000);
        assert_eq!(masked.as_slice().unwrap(), &[0, 0, 2000, 8000, 0]);
    }

    #[test]
    fn test_depth_to_frame_scales_to_max() {
        let depth = Array2::from_shape_vec((1, 3), vec![0u16, 500, 1000]).unwrap();
        let frame = depth_to_frame(&depth);
        assert_eq!(frame.dim(), (1, 3, 3));
        assert_eq!(frame[[0, 0, 0]], 0);
        assert_eq!(frame[[0, 1, 1]], 127);
        assert_eq!(frame[[0, 2, 2]], 255);
    }

    #[test]
    fn test_depth_to_frame_all_zero() {
        let depth = Array2::<u16>::zeros((2, 2));
        assert!(depth_to_frame(&depth).iter().all(|&v| v == 0));
    }
}
