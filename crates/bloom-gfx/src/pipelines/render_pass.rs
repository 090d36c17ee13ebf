use ash::vk;
use itertools::Itertools;

use crate::{foundation::debug_messenger::DebugType, gfx::Gfx};

/// 单个 attachment 的描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GfxAttachmentDesc {
    pub format: vk::Format,
    pub load_op: vk::AttachmentLoadOp,
    pub store_op: vk::AttachmentStoreOp,
    pub initial_layout: vk::ImageLayout,
    pub final_layout: vk::ImageLayout,
}

impl GfxAttachmentDesc {
    fn to_vk(self) -> vk::AttachmentDescription {
        vk::AttachmentDescription::default()
            .format(self.format)
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(self.load_op)
            .store_op(self.store_op)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(self.initial_layout)
            .final_layout(self.final_layout)
    }
}

/// 单 subpass 的 render pass 描述
///
/// attachment 的下标由位置决定：color 在前，depth 在后。
/// framebuffer 的 image view 也必须按照同样的顺序提供。
#[derive(Debug, Clone, Default)]
pub struct GfxRenderPassDesc {
    pub color: Option<GfxAttachmentDesc>,
    pub depth: Option<GfxAttachmentDesc>,
    pub dependencies: Vec<vk::SubpassDependency>,
}

impl GfxRenderPassDesc {
    /// 按照 attachment 下标排列的描述
    pub fn attachments(&self) -> Vec<vk::AttachmentDescription> {
        self.color.iter().chain(self.depth.iter()).map(|a| a.to_vk()).collect_vec()
    }

    /// subpass 中 color 以及 depth 的引用
    pub fn references(&self) -> (Option<vk::AttachmentReference>, Option<vk::AttachmentReference>) {
        let color_ref = self.color.map(|_| vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        });
        let depth_ref = self.depth.map(|_| vk::AttachmentReference {
            attachment: color_ref.map_or(0, |_| 1),
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        });
        (color_ref, depth_ref)
    }

    /// framebuffer 需要的 attachment 数量
    #[inline]
    pub fn attachment_count(&self) -> usize {
        self.color.iter().count() + self.depth.iter().count()
    }
}

/// # Destroy
/// 在 Drop 中释放
pub struct GfxRenderPass {
    handle: vk::RenderPass,
    desc: GfxRenderPassDesc,
}
impl GfxRenderPass {
    pub fn new(desc: GfxRenderPassDesc, debug_name: &str) -> Self {
        let attachments = desc.attachments();
        let (color_ref, depth_ref) = desc.references();
        let color_refs = color_ref.into_iter().collect_vec();

        let mut subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs);
        if let Some(depth_ref) = depth_ref.as_ref() {
            subpass = subpass.depth_stencil_attachment(depth_ref);
        }

        let render_pass_ci = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(std::slice::from_ref(&subpass))
            .dependencies(&desc.dependencies);

        let gfx_device = Gfx::get().gfx_device();
        let handle = unsafe { gfx_device.create_render_pass(&render_pass_ci, None).unwrap() };
        let render_pass = Self { handle, desc };
        gfx_device.set_debug_name(&render_pass, debug_name);
        render_pass
    }

    #[inline]
    pub fn handle(&self) -> vk::RenderPass {
        self.handle
    }

    #[inline]
    pub fn desc(&self) -> &GfxRenderPassDesc {
        &self.desc
    }
}
impl Drop for GfxRenderPass {
    fn drop(&mut self) {
        unsafe {
            Gfx::get().gfx_device().destroy_render_pass(self.handle, None);
        }
    }
}
impl DebugType for GfxRenderPass {
    fn debug_type_name() -> &'static str {
        "GfxRenderPass"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
