use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma};
use ndarray::{Array3, ArrayView3, Axis};

type Plane = ImageBuffer<Luma<f32>, Vec<f32>>;

/// `[H, W, C]` のヒートマップをチャンネルごとにバイリニア補間で `[height, width, C]` へリサイズ
///
/// `image` の Triangle フィルタを使用。拡大時は OpenCV の `INTER_LINEAR` と同じ
/// ハーフピクセル中心になる。同サイズならそのままコピー。
pub fn resize_channels(src: ArrayView3<f32>, height: usize, width: usize) -> Array3<f32> {
    let (src_h, src_w, channels) = src.dim();
    if (src_h, src_w) == (height, width) {
        return src.to_owned();
    }
    let mut dst = Array3::<f32>::zeros((height, width, channels));
    if src_h == 0 || src_w == 0 || height == 0 || width == 0 {
        return dst;
    }

    for (ch, mut out) in dst.axis_iter_mut(Axis(2)).enumerate() {
        let plane = src.index_axis(Axis(2), ch);

        // imageops は f32 を 0.0-1.0 にクランプするので、一旦その範囲に正規化する
        let (lo, hi) = plane
            .iter()
            .filter(|v| v.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        if !(hi > lo) {
            // 一定値 (または全NaN) のチャンネル
            let fill = if lo.is_finite() { lo } else { f32::NAN };
            out.fill(fill);
            continue;
        }
        let range = hi - lo;

        let buf = Plane::from_fn(src_w as u32, src_h as u32, |x, y| {
            Luma([(plane[[y as usize, x as usize]] - lo) / range])
        });
        let resized = imageops::resize(&buf, width as u32, height as u32, FilterType::Triangle);

        for (x, y, px) in resized.enumerate_pixels() {
            out[[y as usize, x as usize]] = px[0] * range + lo;
        }
    }

    dst
}
