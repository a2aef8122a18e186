pub mod draw;
pub mod overlay;
pub mod skeleton;
#[cfg(feature = "desktop")]
pub mod window;

pub use overlay::heatmap_overlay;
pub use skeleton::{part_color, render_skeleton, LimbGeometry, COLOR_TABLE, LIMBS};
#[cfg(feature = "desktop")]
pub use window::MinifbDisplay;

use anyhow::Result;

use crate::frame::Frame;

/// 1フレーム分の表示画像
pub struct Surfaces<'a> {
    pub original: &'a Frame,
    /// 骨格を描画したフレーム
    pub processed: &'a Frame,
    pub depth: &'a Frame,
    pub hand_depth: &'a Frame,
    pub heatmap: &'a Frame,
}

/// 表示先 (終了要求の発生元も兼ねる)
pub trait Display {
    fn show(&mut self, surfaces: &Surfaces) -> Result<()>;

    /// 毎フレーム `show` の後に確認される
    fn quit_requested(&self) -> bool;
}
