//! フレーム単位のパイプライン
//!
//! 1フレームを最後まで処理してから次を取得する:
//! 取得 -> 前処理 -> 推論 -> デコード -> 追跡 -> 深度 -> 描画 -> 書き出し -> 表示 -> 終了確認
//! 取得と推論はタイムアウトなしでブロックする。

use anyhow::anyhow;
use ndarray::Array4;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::time::Instant;

use crate::camera::FrameSource;
use crate::config::Config;
use crate::depth::DepthAnnotator;
use crate::error::{PipelineError, PipelineResult};
use crate::export::{FrameExporter, FrameRecord};
use crate::frame::{depth_to_frame, CapturedFrame, Frame};
use crate::pose::{center_map_tensor, decode, preprocess_for_cpm, HandModel, Heatmap, JointSet};
use crate::render::{heatmap_overlay, render_skeleton, Display, Surfaces};
use crate::tracker::JointTracker;

/// 1フレームの処理結果
#[derive(Debug, Clone)]
pub struct FrameOutput {
    pub frame_index: u64,
    /// 追跡前のヒートマップ最大位置
    pub observations: JointSet,
    pub tracked: JointSet,
    pub depths: Vec<u16>,
    /// 骨格を描画した処理フレーム
    pub annotated: Frame,
    pub heatmap_view: Frame,
    pub export_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
}

pub struct PipelineDriver<S, M, D> {
    source: S,
    model: M,
    display: D,
    tracker: JointTracker,
    depth: DepthAnnotator,
    exporter: Option<FrameExporter>,
    center_map: Array4<f32>,
    input_size: usize,
    frame_counter: u64,
}

impl<S: FrameSource, M: HandModel, D: Display> PipelineDriver<S, M, D> {
    pub fn new(config: &Config, source: S, model: M, display: D) -> PipelineResult<Self> {
        let m = &config.model;
        let exporter = if config.export.enabled {
            Some(FrameExporter::new(&config.export.dir)?)
        } else {
            None
        };
        log::info!(
            "[pipeline] joints={}, input_size={}, kalman={} (noise {}), export={}",
            m.joints,
            m.input_size,
            config.kalman.enabled,
            config.kalman.noise,
            config.export.enabled
        );

        Ok(Self {
            source,
            model,
            display,
            tracker: JointTracker::from_config(m.joints, &config.kalman),
            depth: DepthAnnotator::new(m.input_size),
            exporter,
            center_map: center_map_tensor(m.input_size, m.center_map_radius),
            input_size: m.input_size,
            frame_counter: 0,
        })
    }

    /// 次に処理するフレームの番号
    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    pub fn tracker(&self) -> &JointTracker {
        &self.tracker
    }

    /// 取得済みの1フレームをデコード・追跡・深度付与・描画・書き出しする
    ///
    /// フレーム番号を1つ進める。
    pub fn process_frame(&mut self, captured: &CapturedFrame, heatmap: &Heatmap) -> PipelineResult<FrameOutput> {
        let expected = self.tracker.joint_count();
        if heatmap.joint_count() != expected {
            return Err(PipelineError::JointCountMismatch {
                expected,
                found: heatmap.joint_count(),
            });
        }

        // デコードと表示で同じリサイズ結果を使う
        let (height, width, _) = captured.frame.dim();
        let frame_heatmap = heatmap.resized(height, width);
        let observations = decode(&frame_heatmap);
        let tracked = self.tracker.update(&observations);
        let depths = self.depth.annotate(&tracked, &captured.depth);

        let mut annotated = captured.frame.clone();
        render_skeleton(&mut annotated, &tracked);

        let export_path = match &self.exporter {
            Some(exporter) => {
                let record = FrameRecord::new(&tracked, &depths);
                Some(exporter.write(self.frame_counter, &record)?)
            }
            None => None,
        };

        let heatmap_view = heatmap_overlay(&captured.frame, &frame_heatmap);

        let output = FrameOutput {
            frame_index: self.frame_counter,
            observations,
            tracked,
            depths,
            annotated,
            heatmap_view,
            export_path,
        };
        self.frame_counter += 1;
        Ok(output)
    }

    /// ループ1回分。表示側が終了を要求したら `Break`。
    pub fn step(&mut self) -> PipelineResult<ControlFlow<(), FrameOutput>> {
        let captured = self.source.next_frame().map_err(PipelineError::Acquisition)?;

        let (h, w, _) = captured.frame.dim();
        if (h, w) != (self.input_size, self.input_size) {
            return Err(PipelineError::Acquisition(anyhow!(
                "processed frame is {}x{}, expected {}x{}",
                w,
                h,
                self.input_size,
                self.input_size
            )));
        }

        let input = preprocess_for_cpm(captured.frame.view());
        let heatmap = self
            .model
            .infer(&input, &self.center_map)
            .map_err(PipelineError::Inference)?;

        let output = self.process_frame(&captured, &heatmap)?;

        let depth_view = depth_to_frame(&captured.depth);
        let hand_view = depth_to_frame(&captured.hand_depth);
        self.display
            .show(&Surfaces {
                original: &captured.original,
                processed: &output.annotated,
                depth: &depth_view,
                hand_depth: &hand_view,
                heatmap: &output.heatmap_view,
            })
            .map_err(PipelineError::Display)?;

        if self.display.quit_requested() {
            Ok(ControlFlow::Break(()))
        } else {
            Ok(ControlFlow::Continue(output))
        }
    }

    /// 終了要求かエラーまで回す
    pub fn run(&mut self) -> PipelineResult<RunSummary> {
        let mut fps_frames = 0u32;
        let mut fps_timer = Instant::now();

        loop {
            let frame_start = Instant::now();
            match self.step()? {
                ControlFlow::Break(()) => break,
                ControlFlow::Continue(output) => {
                    log::trace!(
                        "frame {} done in {:.1} ms",
                        output.frame_index,
                        frame_start.elapsed().as_secs_f32() * 1000.0
                    );
                }
            }

            fps_frames += 1;
            let elapsed = fps_timer.elapsed().as_secs_f32();
            if elapsed >= 1.0 {
                log::debug!("fps: {:.2}, frame {}", fps_frames as f32 / elapsed, self.frame_counter);
                fps_frames = 0;
                fps_timer = Instant::now();
            }
        }

        log::info!("[pipeline] stopped after {} frames", self.frame_counter);
        Ok(RunSummary {
            frames: self.frame_counter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Joint;
    use anyhow::{anyhow, Result};
    use ndarray::{Array2, Array3};
    use std::collections::VecDeque;
    use std::fs;

    const SIZE: usize = 64;

    fn captured() -> CapturedFrame {
        let depth = Array2::from_shape_fn((SIZE, SIZE), |(r, c)| (r * 100 + c) as u16);
        CapturedFrame {
            original: Array3::zeros((48, 80, 3)),
            frame: Array3::zeros((SIZE, SIZE, 3)),
            hand_depth: depth.clone(),
            depth,
        }
    }

    /// 決まった枚数を返した後、カメラが抜けたように失敗する
    struct ScriptedSource {
        remaining: usize,
    }

    impl FrameSource for ScriptedSource {
        fn next_frame(&mut self) -> Result<CapturedFrame> {
            if self.remaining == 0 {
                return Err(anyhow!("camera disconnected"));
            }
            self.remaining -= 1;
            Ok(captured())
        }
    }

    /// フレームごとのピーク位置 (関節ごとに `(row, col)`)
    struct ScriptedModel {
        frames: VecDeque<Vec<(usize, usize)>>,
        joints: usize,
    }

    impl ScriptedModel {
        fn still(joints: usize, frames: usize) -> Self {
            let peaks: Vec<(usize, usize)> = (0..joints).map(|j| (2 + j * 2, 60 - j * 2)).collect();
            Self {
                frames: (0..frames).map(|_| peaks.clone()).collect(),
                joints,
            }
        }
    }

    impl HandModel for ScriptedModel {
        fn infer(&mut self, image: &Array4<f32>, center_map: &Array4<f32>) -> Result<Heatmap> {
            assert_eq!(image.dim(), (1, SIZE, SIZE, 3));
            assert_eq!(center_map.dim(), (1, SIZE, SIZE, 1));
            let peaks = self.frames.pop_front().ok_or_else(|| anyhow!("model out of frames"))?;
            let mut data = Array3::<f32>::zeros((SIZE, SIZE, self.joints));
            for (j, (r, c)) in peaks.into_iter().enumerate() {
                data[[r, c, j]] = 1.0;
            }
            Ok(Heatmap::new(data))
        }
    }

    struct CountingDisplay {
        shown: usize,
        quit_after: usize,
    }

    impl Display for CountingDisplay {
        fn show(&mut self, surfaces: &Surfaces) -> Result<()> {
            assert_eq!(surfaces.processed.dim(), (SIZE, SIZE, 3));
            assert_eq!(surfaces.depth.dim(), (SIZE, SIZE, 3));
            self.shown += 1;
            Ok(())
        }

        fn quit_requested(&self) -> bool {
            self.shown >= self.quit_after
        }
    }

    fn config(dir: &std::path::Path, kalman: bool, export: bool) -> Config {
        let mut config = Config::default();
        config.model.input_size = SIZE;
        config.kalman.enabled = kalman;
        config.export.enabled = export;
        config.export.dir = dir.join("json");
        config
    }

    #[test]
    fn test_run_until_quit_exports_every_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = PipelineDriver::new(
            &config(dir.path(), false, true),
            ScriptedSource { remaining: 10 },
            ScriptedModel::still(21, 10),
            CountingDisplay { shown: 0, quit_after: 4 },
        )
        .unwrap();

        let summary = driver.run().unwrap();
        assert_eq!(summary, RunSummary { frames: 4 });

        let json_dir = dir.path().join("json");
        let mut names: Vec<String> = fs::read_dir(&json_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec!["test_00000000.json", "test_00000001.json", "test_00000002.json", "test_00000003.json"]
        );

        let text = fs::read_to_string(json_dir.join("test_00000003.json")).unwrap();
        let values: Vec<serde_json::Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(values.len(), 63);
        // 素通し: 関節1のピークは (4, 58)、深度は (3, 57) から読む
        assert_eq!(values[3].as_f64().unwrap(), 4.0);
        assert_eq!(values[4].as_f64().unwrap(), 58.0);
        assert_eq!(values[5].as_u64().unwrap(), 357);
    }

    #[test]
    fn test_kalman_disabled_passes_observations_through() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = PipelineDriver::new(
            &config(dir.path(), false, false),
            ScriptedSource { remaining: 0 },
            ScriptedModel::still(21, 0),
            CountingDisplay { shown: 0, quit_after: 1 },
        )
        .unwrap();

        let mut data = Array3::<f32>::zeros((SIZE, SIZE, 21));
        data[[10, 20, 0]] = 1.0;
        let output = driver.process_frame(&captured(), &Heatmap::new(data)).unwrap();
        assert_eq!(output.tracked, output.observations);
        assert_eq!(output.tracked[0], Joint::new(10.0, 20.0));
        assert_eq!(output.export_path, None);
        assert_eq!(driver.frame_counter(), 1);
    }

    #[test]
    fn test_kalman_enabled_converges() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = PipelineDriver::new(
            &config(dir.path(), true, false),
            ScriptedSource { remaining: 200 },
            ScriptedModel::still(21, 200),
            CountingDisplay { shown: 0, quit_after: usize::MAX },
        )
        .unwrap();
        assert!(driver.tracker().is_filtering());

        let mut last = None;
        for _ in 0..200 {
            match driver.step().unwrap() {
                ControlFlow::Continue(output) => last = Some(output),
                ControlFlow::Break(()) => unreachable!(),
            }
        }
        let last = last.unwrap();
        for (t, o) in last.tracked.iter().zip(last.observations.iter()) {
            assert!(t.distance(o) < 0.05, "{:?} vs {:?}", t, o);
        }
    }

    #[test]
    fn test_acquisition_failure_halts() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = PipelineDriver::new(
            &config(dir.path(), true, false),
            ScriptedSource { remaining: 2 },
            ScriptedModel::still(21, 10),
            CountingDisplay { shown: 0, quit_after: usize::MAX },
        )
        .unwrap();

        let err = driver.run().unwrap_err();
        assert!(matches!(err, PipelineError::Acquisition(_)));
        assert_eq!(driver.frame_counter(), 2);
    }

    #[test]
    fn test_inference_failure_halts() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = PipelineDriver::new(
            &config(dir.path(), true, false),
            ScriptedSource { remaining: 10 },
            ScriptedModel::still(21, 1),
            CountingDisplay { shown: 0, quit_after: usize::MAX },
        )
        .unwrap();

        assert!(matches!(driver.run(), Err(PipelineError::Inference(_))));
    }

    #[test]
    fn test_joint_count_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = PipelineDriver::new(
            &config(dir.path(), true, false),
            ScriptedSource { remaining: 1 },
            ScriptedModel::still(5, 1),
            CountingDisplay { shown: 0, quit_after: 1 },
        )
        .unwrap();

        assert!(matches!(
            driver.step(),
            Err(PipelineError::JointCountMismatch { expected: 21, found: 5 })
        ));
        assert_eq!(driver.frame_counter(), 0);
    }

    #[test]
    fn test_low_resolution_heatmap_is_decoded_in_frame_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = PipelineDriver::new(
            &config(dir.path(), false, false),
            ScriptedSource { remaining: 0 },
            ScriptedModel::still(21, 0),
            CountingDisplay { shown: 0, quit_after: 1 },
        )
        .unwrap();

        // 32 -> 64 は2倍: 画素 (5, 9) はフレームの (10..11, 18..19)
        let mut data = Array3::<f32>::zeros((SIZE / 2, SIZE / 2, 21));
        data[[5, 9, 0]] = 1.0;
        let output = driver.process_frame(&captured(), &Heatmap::new(data)).unwrap();
        assert!((output.tracked[0].row - 10.5).abs() <= 1.0, "{:?}", output.tracked[0]);
        assert!((output.tracked[0].col - 18.5).abs() <= 1.0, "{:?}", output.tracked[0]);
        assert_eq!(output.heatmap_view.dim(), (SIZE, SIZE, 3));
    }

    /// 入力サイズと違う処理フレームを返すカメラ
    struct WrongSizeSource;

    impl FrameSource for WrongSizeSource {
        fn next_frame(&mut self) -> Result<CapturedFrame> {
            let mut frame = captured();
            frame.frame = Array3::zeros((SIZE, SIZE + 8, 3));
            Ok(frame)
        }
    }

    #[test]
    fn test_wrong_size_frame_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = PipelineDriver::new(
            &config(dir.path(), true, false),
            WrongSizeSource,
            ScriptedModel::still(21, 1),
            CountingDisplay { shown: 0, quit_after: 1 },
        )
        .unwrap();

        assert!(matches!(driver.step(), Err(PipelineError::Acquisition(_))));
        assert_eq!(driver.frame_counter(), 0);
    }
}
