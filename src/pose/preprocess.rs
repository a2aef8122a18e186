use ndarray::{Array2, Array4, ArrayView3, Axis};

/// 処理フレームを CPM 用の入力テンソルに変換
///
/// - フレームは取得側で `input_size x input_size` にリサイズ済み
/// - `value / 256 - 0.5`
/// - [1, H, W, 3] の f32 テンソル (チャンネル順はそのまま)
pub fn preprocess_for_cpm(frame: ArrayView3<u8>) -> Array4<f32> {
    frame.mapv(|v| v as f32 / 256.0 - 0.5).insert_axis(Axis(0))
}

/// 入力画像の中心に置いたガウシアン `exp(-d^2 / (2 r^2))`
pub fn gaussian_center_map(size: usize, radius: f32) -> Array2<f32> {
    let c = size as f32 / 2.0;
    let denom = 2.0 * radius * radius;
    Array2::from_shape_fn((size, size), |(y, x)| {
        let dx = x as f32 - c;
        let dy = y as f32 - c;
        (-(dx * dx + dy * dy) / denom).exp()
    })
}

/// モデルに渡す [1, size, size, 1] のセンターマップ
pub fn center_map_tensor(size: usize, radius: f32) -> Array4<f32> {
    gaussian_center_map(size, radius)
        .insert_axis(Axis(0))
        .insert_axis(Axis(3))
}
