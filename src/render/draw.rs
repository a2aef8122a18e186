//! [`Frame`] への描画プリミティブ
//!
//! 座標は画像の `(x, y)`。フレーム外はクリップする。

use crate::frame::Frame;

/// 飽和前の色 (フレームのチャンネル順)
pub type Color = [i32; 3];

/// 1ピクセル書き込み (各チャンネルを 0..=255 に飽和)
pub fn set_pixel(frame: &mut Frame, x: i32, y: i32, color: Color) {
    let (h, w, channels) = frame.dim();
    if x < 0 || y < 0 || x as usize >= w || y as usize >= h {
        return;
    }
    for (c, &v) in color.iter().enumerate().take(channels) {
        frame[[y as usize, x as usize, c]] = v.clamp(0, 255) as u8;
    }
}

/// 塗りつぶし円
pub fn fill_circle(frame: &mut Frame, cx: i32, cy: i32, radius: i32, color: Color) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                set_pixel(frame, cx + dx, cy + dy, color);
            }
        }
    }
}

/// 回転した楕円弧の輪郭を整数頂点列で返す
///
/// `axes`: 半軸長, `angle`: 回転角 (度), `arc_start`..`arc_end` を `delta` 度刻み。
/// 連続する重複頂点は除く。
pub fn ellipse_poly(
    center: (i32, i32),
    axes: (i32, i32),
    angle: i32,
    arc_start: i32,
    arc_end: i32,
    delta: i32,
) -> Vec<(i32, i32)> {
    let angle = angle.rem_euclid(360);
    let (mut start, mut end) = if arc_start > arc_end {
        (arc_end, arc_start)
    } else {
        (arc_start, arc_end)
    };
    while start < 0 {
        start += 360;
        end += 360;
    }
    while end > 360 {
        end -= 360;
        start -= 360;
    }
    if end - start > 360 {
        start = 0;
        end = 360;
    }

    let (beta, alpha) = (angle as f64).to_radians().sin_cos();
    let delta = delta.max(1);
    let mut pts: Vec<(i32, i32)> = Vec::new();

    let mut i = start;
    while i < end + delta {
        let a = i.min(end).rem_euclid(360);
        let (sin, cos) = (a as f64).to_radians().sin_cos();
        let x = axes.0 as f64 * cos;
        let y = axes.1 as f64 * sin;
        let pt = (
            (center.0 as f64 + x * alpha - y * beta).round() as i32,
            (center.1 as f64 + x * beta + y * alpha).round() as i32,
        );
        if pts.last() != Some(&pt) {
            pts.push(pt);
        }
        i += delta;
    }

    if pts.len() == 1 {
        pts.push(pts[0]);
    }
    pts
}

/// 凸多角形のスキャンライン塗りつぶし
pub fn fill_convex_poly(frame: &mut Frame, pts: &[(i32, i32)], color: Color) {
    if pts.is_empty() {
        return;
    }
    let (h, _, _) = frame.dim();
    let min_y = pts.iter().map(|p| p.1).min().unwrap_or(0).max(0);
    let max_y = pts.iter().map(|p| p.1).max().unwrap_or(0).min(h as i32 - 1);

    for y in min_y..=max_y {
        let mut x_min = f64::INFINITY;
        let mut x_max = f64::NEG_INFINITY;

        for (k, &(x0, y0)) in pts.iter().enumerate() {
            let (x1, y1) = pts[(k + 1) % pts.len()];
            if y < y0.min(y1) || y > y0.max(y1) {
                continue;
            }
            if y0 == y1 {
                x_min = x_min.min(x0.min(x1) as f64);
                x_max = x_max.max(x0.max(x1) as f64);
            } else {
                let x = x0 as f64 + (y - y0) as f64 * (x1 - x0) as f64 / (y1 - y0) as f64;
                x_min = x_min.min(x);
                x_max = x_max.max(x);
            }
        }

        if x_min <= x_max {
            for x in x_min.round() as i32..=x_max.round() as i32 {
                set_pixel(frame, x, y, color);
            }
        }
    }
}
