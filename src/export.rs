use serde::ser::{Serialize, SerializeSeq, Serializer};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::pose::JointSet;

/// 1関節分の書き出し値 (`x` = 行, `y` = 列)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointRecord {
    pub x: f32,
    pub y: f32,
    pub depth: u16,
}

/// 1フレーム分の書き出し: 関節順に `[x0, y0, d0, x1, y1, d1, ...]`
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    joints: Vec<JointRecord>,
}

impl FrameRecord {
    /// 関節と深度を組にする (どちらも関節インデックス順)
    pub fn new(joints: &JointSet, depths: &[u16]) -> Self {
        debug_assert_eq!(joints.len(), depths.len());
        let joints = joints
            .iter()
            .zip(depths)
            .map(|(j, &depth)| JointRecord {
                x: j.row,
                y: j.col,
                depth,
            })
            .collect();
        Self { joints }
    }

    /// タブインデントの JSON
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut ser)?;
        Ok(out)
    }
}

impl Serialize for FrameRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.joints.len() * 3))?;
        for j in &self.joints {
            // f64 に広げて f32 の値をそのまま文字列に残す
            seq.serialize_element(&(j.x as f64))?;
            seq.serialize_element(&(j.y as f64))?;
            seq.serialize_element(&j.depth)?;
        }
        seq.end()
    }
}

/// 1フレーム1ファイルで `dir/test_<frame:08>.json` に書き出す
pub struct FrameExporter {
    dir: PathBuf,
}

impl FrameExporter {
    /// 必要なら `dir` を作成
    pub fn new<P: AsRef<Path>>(dir: P) -> PipelineResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| PipelineError::ExportIo {
            path: dir.clone(),
            source,
        })?;
        log::info!("exporting frame records to {}", dir.display());
        Ok(Self { dir })
    }

    pub fn path_for(&self, frame: u64) -> PathBuf {
        self.dir.join(format!("test_{:08}.json", frame))
    }

    pub fn write(&self, frame: u64, record: &FrameRecord) -> PipelineResult<PathBuf> {
        let path = self.path_for(frame);
        let json = record.to_json()?;
        fs::write(&path, json).map_err(|source| PipelineError::ExportIo {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}
