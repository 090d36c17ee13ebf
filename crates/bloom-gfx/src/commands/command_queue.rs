use std::rc::Rc;

use ash::vk;
use itertools::Itertools;

use crate::{
    commands::{fence::GfxFence, submit_info::GfxSubmitInfo},
    foundation::{debug_messenger::DebugType, device::GfxDevice},
};

#[derive(Clone, Debug)]
pub struct GfxQueueFamily {
    pub name: String,
    pub queue_family_index: u32,
    pub queue_flags: vk::QueueFlags,
    pub queue_count: u32,
}

/// # Destroy
/// queue 随 device 一起销毁
pub struct GfxCommandQueue {
    pub(crate) vk_queue: vk::Queue,
    pub(crate) queue_family: GfxQueueFamily,
    pub(crate) gfx_device: Rc<GfxDevice>,
}
// getters
impl GfxCommandQueue {
    #[inline]
    pub fn queue_family(&self) -> &GfxQueueFamily {
        &self.queue_family
    }

    #[inline]
    pub fn handle(&self) -> vk::Queue {
        self.vk_queue
    }
}
// tools
impl GfxCommandQueue {
    /// 多个 batch 在一次 vkQueueSubmit2 中提交
    pub fn submit(&self, batches: Vec<GfxSubmitInfo>, fence: Option<&GfxFence>) {
        let _span = tracy_client::span!("GfxCommandQueue::submit");
        // submit_infos 引用了 batches 中的内存，batches 需要活到提交结束
        let submit_infos = batches.iter().map(|b| b.submit_info()).collect_vec();
        unsafe {
            self.gfx_device
                .queue_submit2(self.vk_queue, &submit_infos, fence.map_or(vk::Fence::null(), |f| f.handle()))
                .unwrap()
        }
    }

    #[inline]
    pub fn wait_idle(&self) {
        unsafe { self.gfx_device.queue_wait_idle(self.vk_queue).unwrap() }
    }
}
// debug label
impl GfxCommandQueue {
    #[inline]
    pub fn begin_label(&self, label_name: impl AsRef<str>, label_color: glam::Vec4) {
        let name = std::ffi::CString::new(label_name.as_ref()).unwrap();
        unsafe {
            self.gfx_device.debug_utils().queue_begin_debug_utils_label(
                self.vk_queue,
                &vk::DebugUtilsLabelEXT::default().label_name(name.as_c_str()).color(label_color.into()),
            );
        }
    }

    #[inline]
    pub fn end_label(&self) {
        unsafe {
            self.gfx_device.debug_utils().queue_end_debug_utils_label(self.vk_queue);
        }
    }
}
impl DebugType for GfxCommandQueue {
    fn debug_type_name() -> &'static str {
        "GfxCommandQueue"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.vk_queue
    }
}
