use ash::vk;

use crate::{foundation::debug_messenger::DebugType, gfx::Gfx};

/// # Destroy
/// 可以 Clone，需要手动 `destroy`
#[derive(Clone)]
pub struct GfxFence {
    fence: vk::Fence,
}
// 创建与销毁
impl GfxFence {
    /// * signaled - 创建时是否处于 signaled 状态
    pub fn new(signaled: bool, debug_name: &str) -> Self {
        let gfx_device = Gfx::get().gfx_device();
        let fence_flags = if signaled { vk::FenceCreateFlags::SIGNALED } else { vk::FenceCreateFlags::empty() };
        let fence =
            unsafe { gfx_device.create_fence(&vk::FenceCreateInfo::default().flags(fence_flags), None).unwrap() };

        let fence = Self { fence };
        gfx_device.set_debug_name(&fence, debug_name);
        fence
    }

    #[inline]
    pub fn destroy(self) {
        unsafe {
            Gfx::get().gfx_device().destroy_fence(self.fence, None);
        }
    }
}
// getters
impl GfxFence {
    #[inline]
    pub fn handle(&self) -> vk::Fence {
        self.fence
    }
}
// tools
impl GfxFence {
    /// 阻塞等待
    #[inline]
    pub fn wait(&self) {
        unsafe {
            Gfx::get().gfx_device().wait_for_fences(std::slice::from_ref(&self.fence), true, u64::MAX).unwrap();
        }
    }

    #[inline]
    pub fn reset(&self) {
        unsafe {
            Gfx::get().gfx_device().reset_fences(std::slice::from_ref(&self.fence)).unwrap();
        }
    }
}
impl DebugType for GfxFence {
    fn debug_type_name() -> &'static str {
        "GfxFence"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.fence
    }
}
