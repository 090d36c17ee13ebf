use ash::vk;
use itertools::Itertools;

use crate::commands::{command_buffer::GfxCommandBuffer, semaphore::GfxSemaphore};

/// 一个 submit batch：command buffers + wait/signal semaphores
#[derive(Default)]
pub struct GfxSubmitInfo {
    command_buffers: Vec<vk::CommandBufferSubmitInfo<'static>>,
    wait_infos: Vec<vk::SemaphoreSubmitInfo<'static>>,
    signal_infos: Vec<vk::SemaphoreSubmitInfo<'static>>,
}

impl GfxSubmitInfo {
    pub fn new(commands: &[GfxCommandBuffer]) -> Self {
        let command_buffers = commands
            .iter()
            .map(|cmd| vk::CommandBufferSubmitInfo::default().command_buffer(cmd.vk_handle()))
            .collect_vec();

        Self {
            command_buffers,
            ..Default::default()
        }
    }

    /// 返回的结构体引用了 self 中的数组
    #[inline]
    pub fn submit_info(&self) -> vk::SubmitInfo2<'_> {
        vk::SubmitInfo2::default()
            .command_buffer_infos(&self.command_buffers)
            .wait_semaphore_infos(&self.wait_infos)
            .signal_semaphore_infos(&self.signal_infos)
    }

    /// 在 stage 之前等待 semaphore
    #[inline]
    pub fn wait(mut self, semaphore: &GfxSemaphore, stage: vk::PipelineStageFlags2) -> Self {
        self.wait_infos.push(vk::SemaphoreSubmitInfo::default().semaphore(semaphore.handle()).stage_mask(stage));
        self
    }

    /// stage 完成后 signal semaphore
    #[inline]
    pub fn signal(mut self, semaphore: &GfxSemaphore, stage: vk::PipelineStageFlags2) -> Self {
        self.signal_infos.push(vk::SemaphoreSubmitInfo::default().semaphore(semaphore.handle()).stage_mask(stage));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    #[test]
    fn test_submit_info_references_own_arrays() {
        let info = GfxSubmitInfo::default();
        let vk_info = info.submit_info();
        assert_eq!(vk_info.command_buffer_info_count, 0);
        assert_eq!(vk_info.wait_semaphore_info_count, 0);
        assert_eq!(vk_info.signal_semaphore_info_count, 0);
    }

    #[test]
    fn test_semaphore_handle_kept() {
        // semaphore 只作为 handle 记录，不需要 device
        let info = GfxSubmitInfo {
            wait_infos: vec![vk::SemaphoreSubmitInfo::default().semaphore(vk::Semaphore::from_raw(7))],
            ..Default::default()
        };
        let vk_info = info.submit_info();
        assert_eq!(vk_info.wait_semaphore_info_count, 1);
        assert_eq!(vk_info.signal_semaphore_info_count, 0);
    }
}
