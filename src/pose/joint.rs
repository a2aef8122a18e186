/// CPM ハンドモデルの21キーポイント
///
/// 手首、続いて各指4関節 (手のひら側から指先へ)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum HandJoint {
    Wrist = 0,
    ThumbCmc = 1,
    ThumbMcp = 2,
    ThumbIp = 3,
    ThumbTip = 4,
    IndexMcp = 5,
    IndexPip = 6,
    IndexDip = 7,
    IndexTip = 8,
    MiddleMcp = 9,
    MiddlePip = 10,
    MiddleDip = 11,
    MiddleTip = 12,
    RingMcp = 13,
    RingPip = 14,
    RingDip = 15,
    RingTip = 16,
    PinkyMcp = 17,
    PinkyPip = 18,
    PinkyDip = 19,
    PinkyTip = 20,
}

impl HandJoint {
    pub const COUNT: usize = 21;

    /// インデックスから関節を取得
    pub fn from_index(index: usize) -> Option<Self> {
        use HandJoint::*;
        const ALL: [HandJoint; HandJoint::COUNT] = [
            Wrist, ThumbCmc, ThumbMcp, ThumbIp, ThumbTip, IndexMcp, IndexPip, IndexDip, IndexTip,
            MiddleMcp, MiddlePip, MiddleDip, MiddleTip, RingMcp, RingPip, RingDip, RingTip,
            PinkyMcp, PinkyPip, PinkyDip, PinkyTip,
        ];
        ALL.get(index).copied()
    }
}

/// 画像座標上の関節位置 (`row`: 縦, `col`: 横)
///
/// 各モジュール間は常にこの順で受け渡す。描画時だけ `(x = col, y = row)` に入れ替える。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Joint {
    pub row: f32,
    pub col: f32,
}

impl Joint {
    pub fn new(row: f32, col: f32) -> Self {
        Self { row, col }
    }

    /// ピクセル単位のユークリッド距離
    pub fn distance(&self, other: &Joint) -> f32 {
        let dr = self.row - other.row;
        let dc = self.col - other.col;
        (dr * dr + dc * dc).sqrt()
    }

    /// 描画用の `(x, y)` ピクセル座標 (切り捨て)
    pub fn to_pixel(&self) -> (i32, i32) {
        (self.col as i32, self.row as i32)
    }
}

/// 1フレーム分の関節 (インデックス順)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JointSet {
    joints: Vec<Joint>,
}

impl JointSet {
    pub fn new(joints: Vec<Joint>) -> Self {
        Self { joints }
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Joint> {
        self.joints.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Joint> {
        self.joints.iter()
    }
}

impl From<Vec<Joint>> for JointSet {
    fn from(joints: Vec<Joint>) -> Self {
        Self::new(joints)
    }
}

impl std::ops::Index<usize> for JointSet {
    type Output = Joint;

    fn index(&self, index: usize) -> &Joint {
        &self.joints[index]
    }
}

impl<'a> IntoIterator for &'a JointSet {
    type Item = &'a Joint;
    type IntoIter = std::slice::Iter<'a, Joint>;

    fn into_iter(self) -> Self::IntoIter {
        self.joints.iter()
    }
}
