use anyhow::Result;

use crate::frame::CapturedFrame;

/// フレーム取得元 (パイプライン1フレームにつき1回、ブロッキングで呼ばれる)
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<CapturedFrame>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<CapturedFrame> {
        (**self).next_frame()
    }
}

#[cfg(feature = "desktop")]
pub use opencv_source::OpenCvCapture;

#[cfg(feature = "desktop")]
mod opencv_source {
    use anyhow::{bail, Context, Result};
    use ndarray::{Array2, Array3};
    use opencv::{
        core::{Mat, Rect, Size, Vec3b},
        imgproc,
        prelude::*,
        videoio::{self, VideoCapture},
    };

    use super::FrameSource;
    use crate::config::CameraConfig;
    use crate::frame::{mask_depth_band, CapturedFrame, DepthMap, Frame};

    /// OpenCVを使用したカメラキャプチャ (Webカメラ + OpenNI2 深度ストリーム)
    pub struct OpenCvCapture {
        color: VideoCapture,
        depth: Option<VideoCapture>,
        size: i32,
        hand_near: u16,
        hand_far: u16,
        width: u32,
        height: u32,
    }

    impl OpenCvCapture {
        /// カメラを開く
        ///
        /// `size` は処理フレーム (正方形) の一辺 = モデル入力サイズ
        pub fn open(config: &CameraConfig, size: usize) -> Result<Self> {
            let mut color = VideoCapture::new(config.index, videoio::CAP_ANY).context("Failed to open camera")?;
            if !color.is_opened()? {
                bail!("Camera {} is not available", config.index);
            }
            color.set(videoio::CAP_PROP_FRAME_WIDTH, config.width as f64)?;
            color.set(videoio::CAP_PROP_FRAME_HEIGHT, config.height as f64)?;
            color.set(videoio::CAP_PROP_BUFFERSIZE, 1.0)?;

            let width = color.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
            let height = color.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
            log::info!("camera {}: {}x{}", config.index, width, height);

            let depth = if config.depth {
                let cap = VideoCapture::new(0, videoio::CAP_OPENNI2).context("Failed to open OpenNI2 device")?;
                if !cap.is_opened()? {
                    bail!("OpenNI2 depth sensor is not available");
                }
                log::info!("OpenNI2 depth stream opened");
                Some(cap)
            } else {
                log::info!("depth stream disabled, depth reads as 0");
                None
            };

            Ok(Self {
                color,
                depth,
                size: size as i32,
                hand_near: config.hand_near,
                hand_far: config.hand_far,
                width,
                height,
            })
        }

        pub fn resolution(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        fn read_color(&mut self) -> Result<Mat> {
            let mut frame = Mat::default();
            self.color.read(&mut frame).context("Failed to read frame")?;
            if frame.empty() {
                bail!("Empty frame received");
            }
            Ok(frame)
        }

        fn read_depth(&mut self) -> Result<Option<Mat>> {
            let cap = match self.depth.as_mut() {
                Some(cap) => cap,
                None => return Ok(None),
            };
            if !cap.grab()? {
                bail!("Failed to grab depth frame");
            }
            let mut depth = Mat::default();
            cap.retrieve(&mut depth, videoio::CAP_OPENNI_DEPTH_MAP)
                .context("Failed to retrieve depth map")?;
            if depth.empty() {
                bail!("Empty depth map received");
            }
            Ok(Some(depth))
        }
    }

    /// 中央を正方形に切り出して `size x size` にリサイズ
    fn square(mat: &Mat, size: i32, interpolation: i32) -> Result<Mat> {
        let (w, h) = (mat.cols(), mat.rows());
        let side = w.min(h);
        let roi = Rect::new((w - side) / 2, (h - side) / 2, side, side);
        let cropped = Mat::roi(mat, roi)?.try_clone()?;
        let mut resized = Mat::default();
        imgproc::resize(&cropped, &mut resized, Size::new(size, size), 0.0, 0.0, interpolation)?;
        Ok(resized)
    }

    fn to_frame(mat: &Mat) -> Result<Frame> {
        let (h, w) = (mat.rows() as usize, mat.cols() as usize);
        let mut frame = Array3::<u8>::zeros((h, w, 3));
        for y in 0..h {
            for x in 0..w {
                let pixel = mat.at_2d::<Vec3b>(y as i32, x as i32)?;
                frame[[y, x, 0]] = pixel[0];
                frame[[y, x, 1]] = pixel[1];
                frame[[y, x, 2]] = pixel[2];
            }
        }
        Ok(frame)
    }

    fn to_depth(mat: &Mat) -> Result<DepthMap> {
        let (h, w) = (mat.rows() as usize, mat.cols() as usize);
        let mut depth = Array2::<u16>::zeros((h, w));
        for y in 0..h {
            for x in 0..w {
                depth[[y, x]] = *mat.at_2d::<u16>(y as i32, x as i32)?;
            }
        }
        Ok(depth)
    }

    impl FrameSource for OpenCvCapture {
        fn next_frame(&mut self) -> Result<CapturedFrame> {
            let original_mat = self.read_color()?;
            let processed_mat = square(&original_mat, self.size, imgproc::INTER_LINEAR)?;

            let depth = match self.read_depth()? {
                Some(mat) => to_depth(&square(&mat, self.size, imgproc::INTER_NEAREST)?)?,
                None => Array2::zeros((self.size as usize, self.size as usize)),
            };
            let hand_depth = mask_depth_band(&depth, self.hand_near, self.hand_far);

            Ok(CapturedFrame {
                original: to_frame(&original_mat)?,
                frame: to_frame(&processed_mat)?,
                depth,
                hand_depth,
            })
        }
    }
}
