use super::draw::{ellipse_poly, fill_circle, fill_convex_poly, Color};
use crate::frame::Frame;
use crate::pose::{HandJoint, JointSet};

/// 21関節ハンドの骨格接続 (開始関節, 終了関節)
///
/// 各指は手首から指先までの連鎖
pub const LIMBS: [(HandJoint, HandJoint); 20] = [
    // 親指
    (HandJoint::Wrist, HandJoint::ThumbCmc),
    (HandJoint::ThumbCmc, HandJoint::ThumbMcp),
    (HandJoint::ThumbMcp, HandJoint::ThumbIp),
    (HandJoint::ThumbIp, HandJoint::ThumbTip),
    // 人差し指
    (HandJoint::Wrist, HandJoint::IndexMcp),
    (HandJoint::IndexMcp, HandJoint::IndexPip),
    (HandJoint::IndexPip, HandJoint::IndexDip),
    (HandJoint::IndexDip, HandJoint::IndexTip),
    // 中指
    (HandJoint::Wrist, HandJoint::MiddleMcp),
    (HandJoint::MiddleMcp, HandJoint::MiddlePip),
    (HandJoint::MiddlePip, HandJoint::MiddleDip),
    (HandJoint::MiddleDip, HandJoint::MiddleTip),
    // 薬指
    (HandJoint::Wrist, HandJoint::RingMcp),
    (HandJoint::RingMcp, HandJoint::RingPip),
    (HandJoint::RingPip, HandJoint::RingDip),
    (HandJoint::RingDip, HandJoint::RingTip),
    // 小指
    (HandJoint::Wrist, HandJoint::PinkyMcp),
    (HandJoint::PinkyMcp, HandJoint::PinkyPip),
    (HandJoint::PinkyPip, HandJoint::PinkyDip),
    (HandJoint::PinkyDip, HandJoint::PinkyTip),
];

/// 4関節 (4本) ごとのグループの基本色
pub const COLOR_TABLE: [Color; 6] = [
    [139, 53, 255],
    [0, 56, 255],
    [43, 140, 237],
    [37, 168, 36],
    [147, 147, 0],
    [70, 17, 145],
];

/// グループ内で1つ進むごとの加算量
pub const COLOR_STEP: i32 = 35;

pub const JOINT_RADIUS: i32 = 3;
pub const LIMB_HALF_WIDTH: i32 = 3;

/// この範囲 (ピクセル、両端含まず) の長さの骨だけ描画する
pub const MIN_LIMB_LENGTH: f32 = 5.0;
pub const MAX_LIMB_LENGTH: f32 = 150.0;

/// 関節・骨 `index` の色
///
/// グループの基本色 + グループ内位置 x 35。クランプしない。テーブル外は `None`。
pub fn part_color(index: usize) -> Option<Color> {
    let base = COLOR_TABLE.get(index / 4)?;
    let bump = COLOR_STEP * (index % 4) as i32;
    Some([base[0] + bump, base[1] + bump, base[2] + bump])
}

pub fn limb_is_plausible(length: f32) -> bool {
    length > MIN_LIMB_LENGTH && length < MAX_LIMB_LENGTH
}

/// 描画する骨の画像上の配置
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimbGeometry {
    pub length: f32,
    /// `atan2(d_row, d_col)` (度)
    pub angle_deg: f32,
    /// 中点 `(x, y)`
    pub center: (f32, f32),
}

impl LimbGeometry {
    /// 関節 `start` - `end` 間の骨の配置
    ///
    /// 長さが範囲外、またはインデックスが範囲外なら `None`
    pub fn between(joints: &JointSet, start: usize, end: usize) -> Option<Self> {
        let a = joints.get(start)?;
        let b = joints.get(end)?;
        let length = a.distance(b);
        if !limb_is_plausible(length) {
            return None;
        }
        Some(Self {
            length,
            angle_deg: (a.row - b.row).atan2(a.col - b.col).to_degrees(),
            center: ((a.col + b.col) / 2.0, (a.row + b.row) / 2.0),
        })
    }

    /// 両端を結ぶ細い楕円 (凸多角形)
    pub fn polygon(&self) -> Vec<(i32, i32)> {
        ellipse_poly(
            (self.center.0 as i32, self.center.1 as i32),
            ((self.length / 2.0) as i32, LIMB_HALF_WIDTH),
            self.angle_deg as i32,
            0,
            360,
            1,
        )
    }
}

/// 関節を描いてから、その上に妥当な長さの骨を描く。同じフレームを返す。
pub fn render_skeleton<'a>(frame: &'a mut Frame, joints: &JointSet) -> &'a mut Frame {
    for (i, joint) in joints.iter().enumerate() {
        if let Some(color) = part_color(i) {
            let (x, y) = joint.to_pixel();
            fill_circle(frame, x, y, JOINT_RADIUS, color);
        }
    }

    for (i, (start, end)) in LIMBS.iter().enumerate() {
        let geometry = match LimbGeometry::between(joints, *start as usize, *end as usize) {
            Some(g) => g,
            None => continue,
        };
        if let Some(color) = part_color(i) {
            fill_convex_poly(frame, &geometry.polygon(), color);
        }
    }

    frame
}
