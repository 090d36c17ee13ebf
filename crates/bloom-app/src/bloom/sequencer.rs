//! 每帧的提交顺序
//!
//! bloom 打开时：acquire -> offscreen -> onscreen -> present，
//! 关闭时：acquire -> onscreen -> present。
//! 整条链只依赖 semaphore，CPU 端只在复用 command buffer 之前等待 fence。

use ash::vk;

/// 帧驱动的状态，`Rendering` 之后不会再回退
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameState {
    #[default]
    Idle,
    /// 正在创建资源
    Preparing,
    Rendering,
}

#[derive(Debug, Default)]
pub struct FrameDriver {
    state: FrameState,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_prepare(&mut self) {
        debug_assert_eq!(self.state, FrameState::Idle, "prepare twice");
        self.state = FrameState::Preparing;
    }

    pub fn finish_prepare(&mut self) {
        debug_assert_eq!(self.state, FrameState::Preparing);
        self.state = FrameState::Rendering;
    }

    #[inline]
    pub fn state(&self) -> FrameState {
        self.state
    }

    #[inline]
    pub fn prepared(&self) -> bool {
        self.state == FrameState::Rendering
    }

    /// 窗口最小化时 extent 为 0，此时跳过渲染
    pub fn should_render(&self, window_extent: vk::Extent2D) -> bool {
        self.prepared() && window_extent.width > 0 && window_extent.height > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemaphoreRole {
    /// swapchain image 可以写入
    PresentComplete,
    /// B 已经写入完毕
    OffscreenComplete,
    /// 可以 present，每个 swapchain image 一个
    RenderComplete,
}

impl SemaphoreRole {
    /// 等待方在哪个 stage 之前阻塞
    pub fn wait_stage(self) -> vk::PipelineStageFlags2 {
        match self {
            Self::PresentComplete => vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
            Self::OffscreenComplete => {
                vk::PipelineStageFlags2::FRAGMENT_SHADER | vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT
            }
            Self::RenderComplete => vk::PipelineStageFlags2::ALL_COMMANDS,
        }
    }

    #[inline]
    pub fn signal_stage(self) -> vk::PipelineStageFlags2 {
        vk::PipelineStageFlags2::ALL_COMMANDS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTarget {
    Offscreen,
    Onscreen,
}

/// 一次 queue submit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitStep {
    pub target: SubmitTarget,
    pub wait: SemaphoreRole,
    pub signal: SemaphoreRole,
    /// 是否同时 signal 帧 fence
    pub signal_fence: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPlan {
    pub steps: Vec<SubmitStep>,
}

impl SubmissionPlan {
    pub fn contains(&self, target: SubmitTarget) -> bool {
        self.steps.iter().any(|step| step.target == target)
    }
}

/// 只有 on-screen 的提交带 fence，因为只有它的 command buffer 会被重新录制和反复提交
pub fn submission_plan(bloom: bool) -> SubmissionPlan {
    let onscreen = |wait| SubmitStep {
        target: SubmitTarget::Onscreen,
        wait,
        signal: SemaphoreRole::RenderComplete,
        signal_fence: true,
    };

    let steps = if bloom {
        vec![
            SubmitStep {
                target: SubmitTarget::Offscreen,
                wait: SemaphoreRole::PresentComplete,
                signal: SemaphoreRole::OffscreenComplete,
                signal_fence: false,
            },
            onscreen(SemaphoreRole::OffscreenComplete),
        ]
    } else {
        vec![onscreen(SemaphoreRole::PresentComplete)]
    };

    SubmissionPlan { steps }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_driver_transitions() {
        let mut driver = FrameDriver::new();
        assert_eq!(driver.state(), FrameState::Idle);
        assert!(!driver.prepared());

        driver.begin_prepare();
        assert_eq!(driver.state(), FrameState::Preparing);
        assert!(!driver.prepared());

        driver.finish_prepare();
        assert_eq!(driver.state(), FrameState::Rendering);
        assert!(driver.prepared());
    }

    #[test]
    fn test_should_render_skips_minimized() {
        let extent = |width, height| vk::Extent2D { width, height };

        let mut driver = FrameDriver::new();
        assert!(!driver.should_render(extent(1280, 720)));

        driver.begin_prepare();
        driver.finish_prepare();
        assert!(driver.should_render(extent(1280, 720)));
        assert!(!driver.should_render(extent(0, 0)));
        assert!(!driver.should_render(extent(1280, 0)));
    }

    #[test]
    fn test_bloom_plan_chains_offscreen_before_onscreen() {
        let plan = submission_plan(true);
        assert_eq!(plan.steps.len(), 2);

        let offscreen = plan.steps[0];
        assert_eq!(offscreen.target, SubmitTarget::Offscreen);
        assert_eq!(offscreen.wait, SemaphoreRole::PresentComplete);
        assert_eq!(offscreen.signal, SemaphoreRole::OffscreenComplete);
        assert!(!offscreen.signal_fence);

        let onscreen = plan.steps[1];
        assert_eq!(onscreen.target, SubmitTarget::Onscreen);
        assert_eq!(onscreen.wait, offscreen.signal);
        assert_eq!(onscreen.signal, SemaphoreRole::RenderComplete);
        assert!(onscreen.signal_fence);
    }

    #[test]
    fn test_plan_without_bloom_waits_on_acquire() {
        let plan = submission_plan(false);
        assert!(!plan.contains(SubmitTarget::Offscreen));
        assert_eq!(
            plan.steps,
            vec![SubmitStep {
                target: SubmitTarget::Onscreen,
                wait: SemaphoreRole::PresentComplete,
                signal: SemaphoreRole::RenderComplete,
                signal_fence: true,
            }]
        );
    }

    #[test]
    fn test_each_semaphore_signaled_once_per_frame() {
        for bloom in [true, false] {
            let plan = submission_plan(bloom);
            let signals: Vec<_> = plan.steps.iter().map(|s| s.signal).collect();
            let mut dedup = signals.clone();
            dedup.dedup();
            assert_eq!(signals, dedup);
            assert_eq!(plan.steps.iter().filter(|s| s.signal_fence).count(), 1);
            // 每个被等待的 semaphore 都恰好被等待一次
            let waits: Vec<_> = plan.steps.iter().map(|s| s.wait).collect();
            assert_eq!(waits.iter().filter(|w| **w == SemaphoreRole::PresentComplete).count(), 1);
        }
    }

    #[test]
    fn test_offscreen_wait_covers_fragment_reads() {
        assert!(SemaphoreRole::OffscreenComplete.wait_stage().contains(vk::PipelineStageFlags2::FRAGMENT_SHADER));
        assert!(
            SemaphoreRole::PresentComplete
                .wait_stage()
                .contains(vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT)
        );
    }
}
