//! 离屏 render pass 以及两个 ping-pong framebuffer
//!
//! A：UFO 发光部分的渲染结果，被纵向 blur 读取；
//! B：纵向 blur 的结果，被主 pass 中的横向 blur 读取。
//! 两者尺寸固定为 `TEX_DIM`，与窗口大小无关。

use ash::vk;

use bloom_gfx::{
    descriptors::sampler::{GfxSampler, GfxSamplerDesc},
    pipelines::{
        framebuffer::GfxFramebuffer,
        render_pass::{GfxAttachmentDesc, GfxRenderPass, GfxRenderPassDesc},
    },
    resources::{
        image::{GfxImage, GfxImageCreateInfo},
        image_view::{GfxImageView, GfxImageViewDesc},
    },
};

use crate::bloom::teardown::{recreate, teardown_order};

/// 离屏纹理的边长
pub const TEX_DIM: u32 = 256;

#[inline]
pub fn offscreen_extent() -> vk::Extent2D {
    vk::Extent2D {
        width: TEX_DIM,
        height: TEX_DIM,
    }
}

/// depth format 带有 stencil 时，view 需要同时包含 stencil aspect
pub fn depth_aspect(format: vk::Format) -> vk::ImageAspectFlags {
    match format {
        vk::Format::D16_UNORM_S8_UINT | vk::Format::D24_UNORM_S8_UINT | vk::Format::D32_SFLOAT_S8_UINT => {
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        }
        _ => vk::ImageAspectFlags::DEPTH,
    }
}

/// 两个外部依赖：
/// - 本 pass 的 color 写入完成之后，外部的 fragment shader 才能读取
/// - 外部之前的 fragment shader 读取完成之后，本 pass 才能再次写入 color
pub fn offscreen_dependencies() -> Vec<vk::SubpassDependency> {
    vec![
        vk::SubpassDependency {
            src_subpass: 0,
            dst_subpass: vk::SUBPASS_EXTERNAL,
            src_stage_mask: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            dst_stage_mask: vk::PipelineStageFlags::FRAGMENT_SHADER,
            src_access_mask: vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            dst_access_mask: vk::AccessFlags::SHADER_READ,
            dependency_flags: vk::DependencyFlags::BY_REGION,
        },
        vk::SubpassDependency {
            src_subpass: vk::SUBPASS_EXTERNAL,
            dst_subpass: 0,
            src_stage_mask: vk::PipelineStageFlags::FRAGMENT_SHADER,
            dst_stage_mask: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            src_access_mask: vk::AccessFlags::SHADER_READ,
            dst_access_mask: vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            dependency_flags: vk::DependencyFlags::BY_REGION,
        },
    ]
}

/// color: clear -> SHADER_READ_ONLY；depth: clear -> DEPTH_STENCIL_ATTACHMENT
pub fn offscreen_render_pass_desc(color_format: vk::Format, depth_format: vk::Format) -> GfxRenderPassDesc {
    GfxRenderPassDesc {
        color: Some(GfxAttachmentDesc {
            format: color_format,
            load_op: vk::AttachmentLoadOp::CLEAR,
            store_op: vk::AttachmentStoreOp::STORE,
            initial_layout: vk::ImageLayout::UNDEFINED,
            final_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        }),
        depth: Some(GfxAttachmentDesc {
            format: depth_format,
            load_op: vk::AttachmentLoadOp::CLEAR,
            store_op: vk::AttachmentStoreOp::DONT_CARE,
            initial_layout: vk::ImageLayout::UNDEFINED,
            final_layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        }),
        dependencies: offscreen_dependencies(),
    }
}

/// image + view
///
/// # Destroy
/// 需要手动调用 `destroy`
pub struct AttachmentImage {
    image: GfxImage,
    view: GfxImageView,
}

impl AttachmentImage {
    /// 可以作为 color attachment 写入，也可以被采样
    pub fn new_color(extent: vk::Extent2D, format: vk::Format, name: &str) -> Self {
        let image = GfxImage::new(
            &GfxImageCreateInfo::new_image_2d_info(
                extent,
                format,
                vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::SAMPLED,
            ),
            name,
        );
        let view = GfxImageView::new(
            image.handle(),
            GfxImageViewDesc::new_2d(format, vk::ImageAspectFlags::COLOR),
            name,
        );
        Self { image, view }
    }

    pub fn new_depth(extent: vk::Extent2D, format: vk::Format, name: &str) -> Self {
        let image = GfxImage::new(
            &GfxImageCreateInfo::new_image_2d_info(extent, format, vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT),
            name,
        );
        let view = GfxImageView::new(image.handle(), GfxImageViewDesc::new_2d(format, depth_aspect(format)), name);
        Self { image, view }
    }

    #[inline]
    pub fn image(&self) -> &GfxImage {
        &self.image
    }

    #[inline]
    pub fn view(&self) -> &GfxImageView {
        &self.view
    }

    pub fn destroy(self) {
        self.view.destroy();
        self.image.destroy();
    }
}

/// [`OffscreenTarget`] 的组成部分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPart {
    Color,
    Depth,
    Framebuffer,
    Sampler,
}

impl TargetPart {
    /// framebuffer 引用了 color 与 depth 的 view
    pub const CREATION_ORDER: [Self; 4] = [Self::Color, Self::Depth, Self::Framebuffer, Self::Sampler];
}

/// 一个离屏 framebuffer：color + sampler + depth
///
/// # Destroy
/// 需要手动调用 `destroy`，按 [`TargetPart::CREATION_ORDER`] 的逆序释放。
/// framebuffer 与 sampler 由 Drop 释放，color 与 depth 由 [`AttachmentImage::destroy`] 释放
pub struct OffscreenTarget {
    framebuffer: GfxFramebuffer,
    color: AttachmentImage,
    depth: AttachmentImage,
    sampler: GfxSampler,
}

impl OffscreenTarget {
    pub fn new(render_pass: &GfxRenderPass, color_format: vk::Format, depth_format: vk::Format, name: &str) -> Self {
        let extent = offscreen_extent();
        let color = AttachmentImage::new_color(extent, color_format, &format!("{name}-color"));
        let depth = AttachmentImage::new_depth(extent, depth_format, &format!("{name}-depth"));
        let framebuffer = GfxFramebuffer::new(
            render_pass,
            &[color.view().handle(), depth.view().handle()],
            extent,
            &format!("{name}-framebuffer"),
        );
        let sampler = GfxSampler::new(GfxSamplerDesc::clamp_to_edge(), &format!("{name}-sampler"));

        Self {
            framebuffer,
            color,
            depth,
            sampler,
        }
    }

    #[inline]
    pub fn framebuffer(&self) -> &GfxFramebuffer {
        &self.framebuffer
    }

    #[inline]
    pub fn color_image(&self) -> vk::Image {
        self.color.image().handle()
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.framebuffer.extent()
    }

    /// render pass 结束后 color 处于 SHADER_READ_ONLY_OPTIMAL
    pub fn color_descriptor(&self) -> vk::DescriptorImageInfo {
        vk::DescriptorImageInfo {
            sampler: self.sampler.handle(),
            image_view: self.color.view().handle(),
            image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        }
    }

    pub fn destroy(self) {
        let Self {
            framebuffer,
            color,
            depth,
            sampler,
        } = self;
        let mut framebuffer = Some(framebuffer);
        let mut color = Some(color);
        let mut depth = Some(depth);
        let mut sampler = Some(sampler);

        // image 与 view 手动 destroy，其余在 Drop 中释放
        for part in teardown_order(&TargetPart::CREATION_ORDER) {
            match part {
                TargetPart::Framebuffer => drop(framebuffer.take()),
                TargetPart::Sampler => drop(sampler.take()),
                TargetPart::Color => {
                    if let Some(color) = color.take() {
                        color.destroy();
                    }
                }
                TargetPart::Depth => {
                    if let Some(depth) = depth.take() {
                        depth.destroy();
                    }
                }
            }
        }
    }
}

/// 共享的离屏 render pass 以及 A、B 两个 framebuffer
///
/// # Destroy
/// 需要手动调用 `destroy`，render pass 在 Drop 中释放
pub struct OffscreenTargets {
    pub a: OffscreenTarget,
    pub b: OffscreenTarget,
    render_pass: GfxRenderPass,
}

impl OffscreenTargets {
    /// 已有的 render pass 及 framebuffer 会先被销毁再重新创建
    pub fn prepare(previous: Option<Self>, color_format: vk::Format, depth_format: vk::Format) -> Self {
        let _span = tracy_client::span!("OffscreenTargets::prepare");
        recreate(
            previous,
            |previous| {
                log::info!("recreating offscreen render pass");
                previous.destroy();
            },
            || {
                let render_pass =
                    GfxRenderPass::new(offscreen_render_pass_desc(color_format, depth_format), "offscreen");
                let a = OffscreenTarget::new(&render_pass, color_format, depth_format, "offscreen-a");
                let b = OffscreenTarget::new(&render_pass, color_format, depth_format, "offscreen-b");
                log::info!("offscreen framebuffers created: {}x{}", TEX_DIM, TEX_DIM);

                Self { a, b, render_pass }
            },
        )
    }

    #[inline]
    pub fn render_pass(&self) -> &GfxRenderPass {
        &self.render_pass
    }

    /// framebuffer 先于 render pass 释放
    pub fn destroy(self) {
        self.b.destroy();
        self.a.destroy();
        drop(self.render_pass);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offscreen_extent_fixed() {
        let extent = offscreen_extent();
        assert_eq!((extent.width, extent.height), (256, 256));
    }

    #[test]
    fn test_offscreen_attachment_mapping() {
        let desc = offscreen_render_pass_desc(vk::Format::B8G8R8A8_UNORM, vk::Format::D32_SFLOAT);
        let attachments = desc.attachments();
        assert_eq!(attachments.len(), 2);

        assert_eq!(attachments[0].format, vk::Format::B8G8R8A8_UNORM);
        assert_eq!(attachments[0].load_op, vk::AttachmentLoadOp::CLEAR);
        assert_eq!(attachments[0].store_op, vk::AttachmentStoreOp::STORE);
        assert_eq!(attachments[0].final_layout, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);

        assert_eq!(attachments[1].format, vk::Format::D32_SFLOAT);
        assert_eq!(attachments[1].store_op, vk::AttachmentStoreOp::DONT_CARE);
        assert_eq!(attachments[1].final_layout, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

        let (color_ref, depth_ref) = desc.references();
        assert_eq!(color_ref.unwrap().attachment, 0);
        assert_eq!(depth_ref.unwrap().attachment, 1);
    }

    #[test]
    fn test_offscreen_dependencies() {
        let deps = offscreen_dependencies();
        assert_eq!(deps.len(), 2);

        assert_eq!((deps[0].src_subpass, deps[0].dst_subpass), (0, vk::SUBPASS_EXTERNAL));
        assert_eq!(deps[0].src_access_mask, vk::AccessFlags::COLOR_ATTACHMENT_WRITE);
        assert_eq!(deps[0].dst_access_mask, vk::AccessFlags::SHADER_READ);

        assert_eq!((deps[1].src_subpass, deps[1].dst_subpass), (vk::SUBPASS_EXTERNAL, 0));
        assert_eq!(deps[1].src_access_mask, vk::AccessFlags::SHADER_READ);
        assert_eq!(deps[1].dst_access_mask, vk::AccessFlags::COLOR_ATTACHMENT_WRITE);
    }

    #[test]
    fn test_depth_aspect() {
        assert_eq!(depth_aspect(vk::Format::D32_SFLOAT), vk::ImageAspectFlags::DEPTH);
        assert_eq!(
            depth_aspect(vk::Format::D24_UNORM_S8_UINT),
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        );
    }

    #[test]
    fn test_target_teardown_releases_framebuffer_before_views() {
        let order = teardown_order(&TargetPart::CREATION_ORDER).collect::<Vec<_>>();
        let position = |part| order.iter().position(|p| *p == part).unwrap();
        assert_eq!(order.len(), 4);
        assert!(position(TargetPart::Framebuffer) < position(TargetPart::Color));
        assert!(position(TargetPart::Framebuffer) < position(TargetPart::Depth));
    }
}
