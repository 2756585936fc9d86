// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 云台执行器接口
//!
//! 增量指令: 每次调用表示在当前位置基础上再转动 `delta` 度。

/// 云台执行器 (fire-and-forget)
pub trait Actuator {
    fn move_pan(&mut self, delta_degrees: f32);
    fn move_tilt(&mut self, delta_degrees: f32);
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn move_pan(&mut self, delta_degrees: f32) {
        (**self).move_pan(delta_degrees)
    }

    fn move_tilt(&mut self, delta_degrees: f32) {
        (**self).move_tilt(delta_degrees)
    }
}

/// 占位执行器: 只打印指令, 接入真实舵机时替换
#[derive(Debug, Default)]
pub struct LogActuator;

impl Actuator for LogActuator {
    fn move_pan(&mut self, delta_degrees: f32) {
        log::info!("Pan servo by {} degrees", delta_degrees);
    }

    fn move_tilt(&mut self, delta_degrees: f32) {
        log::info!("Tilt servo by {} degrees", delta_degrees);
    }
}

/// 单步限幅: 每条指令裁剪到 ±max_step 度
#[derive(Debug)]
pub struct SaturatingActuator<A> {
    inner: A,
    max_step: f32,
}

impl<A: Actuator> SaturatingActuator<A> {
    pub fn new(inner: A, max_step: f32) -> Self {
        Self {
            inner,
            max_step: max_step.abs(),
        }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

impl<A: Actuator> Actuator for SaturatingActuator<A> {
    fn move_pan(&mut self, delta_degrees: f32) {
        self.inner
            .move_pan(delta_degrees.clamp(-self.max_step, self.max_step));
    }

    fn move_tilt(&mut self, delta_degrees: f32) {
        self.inner
            .move_tilt(delta_degrees.clamp(-self.max_step, self.max_step));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        pans: Vec<f32>,
        tilts: Vec<f32>,
    }

    impl Actuator for Recorder {
        fn move_pan(&mut self, d: f32) {
            self.pans.push(d);
        }

        fn move_tilt(&mut self, d: f32) {
            self.tilts.push(d);
        }
    }

    #[test]
    fn saturating_clamps_both_axes() {
        let mut a = SaturatingActuator::new(Recorder::default(), 5.0);
        a.move_pan(12.5);
        a.move_pan(-3.0);
        a.move_tilt(-40.0);

        assert_eq!(a.inner().pans, vec![5.0, -3.0]);
        assert_eq!(a.inner().tilts, vec![-5.0]);
    }

    #[test]
    fn negative_limit_is_treated_as_magnitude() {
        let mut a = SaturatingActuator::new(Recorder::default(), -2.0);
        a.move_pan(10.0);
        assert_eq!(a.inner().pans, vec![2.0]);
    }
}
