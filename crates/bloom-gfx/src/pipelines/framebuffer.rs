use ash::vk;

use crate::{foundation::debug_messenger::DebugType, gfx::Gfx, pipelines::render_pass::GfxRenderPass};

/// # Destroy
/// 在 Drop 中释放，引用的 image view 需要活得更久
pub struct GfxFramebuffer {
    handle: vk::Framebuffer,
    extent: vk::Extent2D,
}
impl GfxFramebuffer {
    /// attachments 的顺序需要和 render pass 的 attachment 下标一致
    pub fn new(render_pass: &GfxRenderPass, attachments: &[vk::ImageView], extent: vk::Extent2D, name: &str) -> Self {
        assert_eq!(
            attachments.len(),
            render_pass.desc().attachment_count(),
            "framebuffer {} attachment count mismatch",
            name
        );
        let framebuffer_ci = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass.handle())
            .attachments(attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let gfx_device = Gfx::get().gfx_device();
        let handle = unsafe { gfx_device.create_framebuffer(&framebuffer_ci, None).unwrap() };
        let framebuffer = Self { handle, extent };
        gfx_device.set_debug_name(&framebuffer, name);
        framebuffer
    }

    #[inline]
    pub fn handle(&self) -> vk::Framebuffer {
        self.handle
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}
impl Drop for GfxFramebuffer {
    fn drop(&mut self) {
        unsafe {
            Gfx::get().gfx_device().destroy_framebuffer(self.handle, None);
        }
    }
}
impl DebugType for GfxFramebuffer {
    fn debug_type_name() -> &'static str {
        "GfxFramebuffer"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
