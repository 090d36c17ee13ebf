use std::time::{Duration, Instant};

/// 帧计时
#[derive(Debug)]
pub struct Timer {
    last_tick: Instant,

    delta_time: Duration,
}

impl Default for Timer {
    fn default() -> Self {
        Self {
            last_tick: Instant::now(),
            delta_time: Duration::ZERO,
        }
    }
}

impl Timer {
    /// 每帧开始的时候调用
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// 初始化结束后调用，第一帧的 delta 不包含资源加载的时间
    pub fn reset(&mut self) {
        self.reset_at(Instant::now());
    }

    fn tick_at(&mut self, now: Instant) {
        self.delta_time = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;
    }

    fn reset_at(&mut self, now: Instant) {
        self.last_tick = now;
        self.delta_time = Duration::ZERO;
    }

    #[inline]
    pub fn delta_time(&self) -> Duration {
        self.delta_time
    }

    /// 上一帧的时间（秒）
    #[inline]
    pub fn delta_time_s(&self) -> f32 {
        self.delta_time.as_secs_f32()
    }
}

/// 每秒统计一次帧率
#[derive(Debug, Default)]
pub struct FpsCounter {
    frames: u32,
    elapsed: Duration,
    last_fps: Option<u32>,
}

impl FpsCounter {
    const WINDOW: Duration = Duration::from_secs(1);

    /// 记录一帧，满一秒时返回新的帧率
    pub fn frame(&mut self, delta: Duration) -> Option<u32> {
        self.frames += 1;
        self.elapsed += delta;
        if self.elapsed < Self::WINDOW {
            return None;
        }

        let fps = (self.frames as f64 / self.elapsed.as_secs_f64()).round() as u32;
        self.frames = 0;
        self.elapsed = Duration::ZERO;
        self.last_fps = Some(fps);
        Some(fps)
    }

    #[inline]
    pub fn last_fps(&self) -> Option<u32> {
        self.last_fps
    }
}

/// 动画时间，取值范围 [0, 1)
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationTimer {
    value: f32,
    speed: f32,
    paused: bool,
}

impl AnimationTimer {
    pub fn new(speed: f32, paused: bool) -> Self {
        Self {
            value: 0.0,
            speed,
            paused,
        }
    }

    /// 暂停时不前进
    pub fn advance(&mut self, frame_seconds: f32) {
        if self.paused {
            return;
        }
        self.value = (self.value + frame_seconds * self.speed).fract();
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    #[inline]
    pub fn paused(&self) -> bool {
        self.paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_animation_timer_wraps() {
        let mut timer = AnimationTimer::new(0.125, false);
        timer.advance(4.0);
        assert!((timer.value() - 0.5).abs() < 1e-6);
        timer.advance(6.0);
        assert!((timer.value() - 0.25).abs() < 1e-6);
        assert!(timer.value() < 1.0);
    }

    #[test]
    fn test_paused_timer_does_not_advance() {
        let mut timer = AnimationTimer::new(0.125, true);
        timer.advance(2.0);
        assert_eq!(timer.value(), 0.0);
        assert!(!timer.toggle_pause());
        timer.advance(2.0);
        assert!((timer.value() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_fps_counter_reports_once_per_second() {
        let mut counter = FpsCounter::default();
        let frame = Duration::from_millis(20);
        for _ in 0..49 {
            assert_eq!(counter.frame(frame), None);
        }
        assert_eq!(counter.frame(frame), Some(50));
        assert_eq!(counter.last_fps(), Some(50));
        assert_eq!(counter.frame(frame), None);
    }

    #[test]
    fn test_reset_excludes_startup_time() {
        let start = Instant::now();
        let mut timer = Timer::default();
        timer.reset_at(start + Duration::from_secs(5));
        assert_eq!(timer.delta_time(), Duration::ZERO);

        timer.tick_at(start + Duration::from_secs(5) + Duration::from_millis(16));
        assert_eq!(timer.delta_time(), Duration::from_millis(16));
    }
}
