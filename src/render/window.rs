use anyhow::Result;
use minifb::{Key, Window, WindowOptions};

use super::{Display, Surfaces};
use crate::frame::Frame;

/// BGRフレームを表示する minifb ウィンドウ1枚
struct FrameWindow {
    window: Window,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
}

impl FrameWindow {
    fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        Ok(Self {
            window,
            buffer: vec![0u32; width * height],
            width,
            height,
        })
    }

    /// フレームをバッファにコピー (サイズ違いはクロップ/パディング)
    fn draw_frame(&mut self, frame: &Frame) {
        let (frame_height, frame_width, _) = frame.dim();
        self.buffer.iter_mut().for_each(|p| *p = 0);

        for y in 0..self.height.min(frame_height) {
            for x in 0..self.width.min(frame_width) {
                // BGR -> RGB -> u32
                let r = frame[[y, x, 2]] as u32;
                let g = frame[[y, x, 1]] as u32;
                let b = frame[[y, x, 0]] as u32;
                self.buffer[y * self.width + x] = (r << 16) | (g << 8) | b;
            }
        }
    }

    fn update(&mut self) -> Result<()> {
        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)?;
        Ok(())
    }
}

/// minifbを使用した5画面表示
///
/// どれかのウィンドウを閉じるか `q` / Escape で終了要求
pub struct MinifbDisplay {
    windows: Vec<FrameWindow>,
}

const TITLES: [&str; 5] = [
    "org img",
    "processed img",
    "current depth",
    "hand depth only",
    "current heatmap",
];

impl MinifbDisplay {
    /// ウィンドウを作成
    ///
    /// `original`: カメラ解像度, `processed`: 残り4画面で共通の正方形サイズ
    pub fn new(original: (usize, usize), processed: usize) -> Result<Self> {
        let mut windows = Vec::with_capacity(TITLES.len());
        for (i, title) in TITLES.iter().enumerate() {
            let (w, h) = if i == 0 { original } else { (processed, processed) };
            windows.push(FrameWindow::new(title, w, h)?);
        }
        Ok(Self { windows })
    }
}

impl Display for MinifbDisplay {
    fn show(&mut self, surfaces: &Surfaces) -> Result<()> {
        let frames = [
            surfaces.original,
            surfaces.processed,
            surfaces.depth,
            surfaces.hand_depth,
            surfaces.heatmap,
        ];
        for (window, frame) in self.windows.iter_mut().zip(frames) {
            window.draw_frame(frame);
            window.update()?;
        }
        Ok(())
    }

    fn quit_requested(&self) -> bool {
        self.windows.iter().any(|w| {
            !w.window.is_open() || w.window.is_key_down(Key::Q) || w.window.is_key_down(Key::Escape)
        })
    }
}
