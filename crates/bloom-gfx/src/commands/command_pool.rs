use std::rc::Rc;

use ash::vk;

use crate::{
    commands::{command_buffer::GfxCommandBuffer, command_queue::GfxQueueFamily},
    foundation::{debug_messenger::DebugType, device::GfxDevice},
    gfx::Gfx,
};

/// command pool 和 queue family 绑定
///
/// # Destroy
/// 需要手动调用 `destroy`，pool 内的 command buffer 随之释放
pub struct GfxCommandPool {
    handle: vk::CommandPool,
    _queue_family: GfxQueueFamily,

    debug_name: String,
    destroyed: bool,
}
// 创建与销毁
impl GfxCommandPool {
    #[inline]
    pub fn new(queue_family: GfxQueueFamily, flags: vk::CommandPoolCreateFlags, debug_name: &str) -> Self {
        Self::new_internal(Gfx::get().gfx_device().clone(), queue_family, flags, debug_name)
    }

    /// Gfx 单例初始化期间使用，此时只能显式传入 device
    pub(crate) fn new_internal(
        gfx_device: Rc<GfxDevice>,
        queue_family: GfxQueueFamily,
        flags: vk::CommandPoolCreateFlags,
        debug_name: &str,
    ) -> Self {
        let pool_ci = vk::CommandPoolCreateInfo::default()
            .queue_family_index(queue_family.queue_family_index)
            .flags(flags);
        let pool = unsafe { gfx_device.create_command_pool(&pool_ci, None).unwrap() };

        let command_pool = Self {
            handle: pool,
            _queue_family: queue_family,
            debug_name: debug_name.to_string(),
            destroyed: false,
        };
        gfx_device.set_debug_name(&command_pool, debug_name);
        command_pool
    }

    pub fn destroy(mut self) {
        self.destroy_internal_mut(Gfx::get().gfx_device());
    }

    pub(crate) fn destroy_internal(mut self, gfx_device: &GfxDevice) {
        self.destroy_internal_mut(gfx_device);
    }

    fn destroy_internal_mut(&mut self, gfx_device: &GfxDevice) {
        unsafe {
            gfx_device.destroy_command_pool(self.handle, None);
        }
        self.destroyed = true;
    }
}
// getters
impl GfxCommandPool {
    #[inline]
    pub fn handle(&self) -> vk::CommandPool {
        self.handle
    }
}
// tools
impl GfxCommandPool {
    /// 释放之后 command buffer 不能再被使用
    pub fn free_command_buffers(&self, command_buffers: Vec<GfxCommandBuffer>) {
        if command_buffers.is_empty() {
            return;
        }
        let handles: Vec<vk::CommandBuffer> = command_buffers.iter().map(|cmd| cmd.vk_handle()).collect();
        unsafe {
            Gfx::get().gfx_device().free_command_buffers(self.handle, &handles);
        }
    }
}
impl DebugType for GfxCommandPool {
    fn debug_type_name() -> &'static str {
        "GfxCommandPool"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
impl Drop for GfxCommandPool {
    fn drop(&mut self) {
        debug_assert!(self.destroyed, "GfxCommandPool {} must be destroyed manually.", self.debug_name);
    }
}
