use nalgebra::{Matrix2, Matrix2x4, Matrix4, Vector2, Vector4};

/// 1関節分の等速度モデル線形カルマンフィルタ
///
/// 状態: [row, col, d_row, d_col] (時間刻み 1)
/// 観測: 位置のみ、観測ノイズは単位行列
/// 初期状態・初期共分散はゼロ。共分散が育つまでは推定値が原点側に引っ張られる。
///
/// `correct` は事前推定 (`x_pre`, `p_pre`) から事後推定を作り、
/// `predict` は事後推定を進めて結果を両方に残す。
#[derive(Debug, Clone)]
pub struct JointKalman {
    x_pre: Vector4<f32>,
    p_pre: Matrix4<f32>,
    x_post: Vector4<f32>,
    p_post: Matrix4<f32>,
    process_noise: Matrix4<f32>,
}

fn transition() -> Matrix4<f32> {
    Matrix4::new(
        1.0, 0.0, 1.0, 0.0, //
        0.0, 1.0, 0.0, 1.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    )
}

fn measurement() -> Matrix2x4<f32> {
    Matrix2x4::new(
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0,
    )
}

impl JointKalman {
    pub fn new(noise: f32) -> Self {
        Self {
            x_pre: Vector4::zeros(),
            p_pre: Matrix4::zeros(),
            x_post: Vector4::zeros(),
            p_post: Matrix4::zeros(),
            process_noise: Matrix4::identity() * noise,
        }
    }

    /// `(row, col)` の観測で補正
    ///
    /// イノベーション共分散が特異なら観測を捨てて `false` を返す。
    pub fn correct(&mut self, observation: Vector2<f32>) -> bool {
        let h = measurement();
        let s = h * self.p_pre * h.transpose() + Matrix2::identity();
        let s_inv = match s.try_inverse() {
            Some(m) => m,
            None => {
                self.x_post = self.x_pre;
                self.p_post = self.p_pre;
                return false;
            }
        };

        let k = self.p_pre * h.transpose() * s_inv;
        let innovation = observation - h * self.x_pre;
        self.x_post = self.x_pre + k * innovation;
        self.p_post = (Matrix4::identity() - k * h) * self.p_pre;
        true
    }

    /// 1ステップ進めて予測位置 `(row, col)` を返す
    pub fn predict(&mut self) -> Vector2<f32> {
        let f = transition();
        self.x_pre = f * self.x_post;
        self.p_pre = f * self.p_post * f.transpose() + self.process_noise;
        // 次の predict までに補正がなければ事前推定から続ける
        self.x_post = self.x_pre;
        self.p_post = self.p_pre;
        Vector2::new(self.x_pre[0], self.x_pre[1])
    }

    /// 初期状態に戻す (プロセスノイズは保持)
    pub fn reset(&mut self) {
        let noise = self.process_noise;
        *self = Self::new(0.0);
        self.process_noise = noise;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_correct_keeps_zero_state() {
        // 事前共分散ゼロならゲインもゼロ
        let mut kf = JointKalman::new(0.03);
        assert!(kf.correct(Vector2::new(100.0, 50.0)));
        assert_eq!(kf.x_post, Vector4::zeros());
        assert_eq!(kf.predict(), Vector2::zeros());
    }

    #[test]
    fn test_converges_to_constant_observation() {
        let mut kf = JointKalman::new(0.03);
        let target = Vector2::new(120.0, 64.0);
        let mut pred = Vector2::zeros();
        for _ in 0..200 {
            kf.correct(target);
            pred = kf.predict();
        }
        assert!((pred - target).norm() < 0.01, "{:?}", pred);
        assert!(kf.x_post[2].abs() < 0.01);
        assert!(kf.x_post[3].abs() < 0.01);
    }

    #[test]
    fn test_predict_follows_velocity() {
        let mut kf = JointKalman::new(0.03);
        kf.x_post = Vector4::new(10.0, 20.0, 2.0, -1.0);
        let p = kf.predict();
        assert!((p[0] - 12.0).abs() < 1e-6);
        assert!((p[1] - 19.0).abs() < 1e-6);
    }

    #[test]
    fn test_tracks_linear_motion() {
        let mut kf = JointKalman::new(0.03);
        let mut pred = Vector2::zeros();
        let mut obs = Vector2::zeros();
        for t in 0..300 {
            obs = Vector2::new(50.0 + 0.5 * t as f32, 80.0 - 0.25 * t as f32);
            kf.correct(obs);
            pred = kf.predict();
        }
        // 最後の観測の1ステップ先
        let next = obs + Vector2::new(0.5, -0.25);
        assert!((pred - next).norm() < 0.05, "{:?} vs {:?}", pred, next);
    }

    #[test]
    fn test_reset_keeps_noise() {
        let mut kf = JointKalman::new(0.5);
        for _ in 0..10 {
            kf.correct(Vector2::new(5.0, 5.0));
            kf.predict();
        }
        kf.reset();
        assert_eq!(kf.x_post, Vector4::zeros());
        assert_eq!(kf.process_noise, Matrix4::identity() * 0.5);
    }
}
