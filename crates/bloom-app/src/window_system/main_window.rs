use anyhow::Context;
use ash::vk;
use itertools::Itertools;
use winit::{event_loop::ActiveEventLoop, window::Window};

use bloom_gfx::{
    commands::semaphore::GfxSemaphore,
    gfx::Gfx,
    pipelines::{
        framebuffer::GfxFramebuffer,
        render_pass::{GfxAttachmentDesc, GfxRenderPass, GfxRenderPassDesc},
    },
    swapchain::{
        render_swapchain::{GfxRenderSwapchain, GfxSwapchainStatus},
        surface::GfxSurface,
    },
};

use crate::{bloom::offscreen::AttachmentImage, config::WindowConfig};

/// 依次尝试的 depth format
const DEPTH_FORMAT_CANDIDATES: [vk::Format; 3] =
    [vk::Format::D32_SFLOAT, vk::Format::D32_SFLOAT_S8_UINT, vk::Format::D24_UNORM_S8_UINT];

/// 上一次 present 完成之前，不能写 color 和 depth
pub fn main_render_pass_dependency() -> vk::SubpassDependency {
    let stages = vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
        | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS
        | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS;
    vk::SubpassDependency {
        src_subpass: vk::SUBPASS_EXTERNAL,
        dst_subpass: 0,
        src_stage_mask: stages,
        dst_stage_mask: stages,
        src_access_mask: vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        dst_access_mask: vk::AccessFlags::COLOR_ATTACHMENT_WRITE | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        dependency_flags: vk::DependencyFlags::empty(),
    }
}

/// color: clear -> PRESENT_SRC；depth: clear -> DEPTH_STENCIL_ATTACHMENT
pub fn main_render_pass_desc(color_format: vk::Format, depth_format: vk::Format) -> GfxRenderPassDesc {
    GfxRenderPassDesc {
        color: Some(GfxAttachmentDesc {
            format: color_format,
            load_op: vk::AttachmentLoadOp::CLEAR,
            store_op: vk::AttachmentStoreOp::STORE,
            initial_layout: vk::ImageLayout::UNDEFINED,
            final_layout: vk::ImageLayout::PRESENT_SRC_KHR,
        }),
        depth: Some(GfxAttachmentDesc {
            format: depth_format,
            load_op: vk::AttachmentLoadOp::CLEAR,
            store_op: vk::AttachmentStoreOp::DONT_CARE,
            initial_layout: vk::ImageLayout::UNDEFINED,
            final_layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        }),
        dependencies: vec![main_render_pass_dependency()],
    }
}

/// 窗口以及向窗口输出所需的全部对象
///
/// # Destroy
/// 需要手动调用 `destroy`
pub struct MainWindow {
    winit_window: Window,

    surface: Option<GfxSurface>,
    swapchain: Option<GfxRenderSwapchain>,

    depth_format: vk::Format,
    depth: Option<AttachmentImage>,
    render_pass: GfxRenderPass,
    /// 和 swapchain image 一一对应
    framebuffers: Vec<GfxFramebuffer>,

    /// acquire 完成，同一时间只有一帧在执行
    present_complete_semaphore: GfxSemaphore,
    /// 数量和 swapchain image 相同，present 等待对应 image 的 semaphore
    render_complete_semaphores: Vec<GfxSemaphore>,
}

// 创建与销毁
impl MainWindow {
    pub fn new(event_loop: &ActiveEventLoop, config: &WindowConfig) -> anyhow::Result<Self> {
        let _span = tracy_client::span!("MainWindow::new");
        let window_attr = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(config.width as f64, config.height as f64));
        let window = event_loop.create_window(window_attr).context("failed to create window")?;

        let depth_format = Gfx::get()
            .find_supported_format(
                &DEPTH_FORMAT_CANDIDATES,
                vk::ImageTiling::OPTIMAL,
                vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
            )
            .first()
            .copied()
            .context("no supported depth format")?;

        let surface = GfxSurface::new(&window);
        let swapchain = GfxRenderSwapchain::new(&surface, Self::inner_extent(&window), config.vsync);
        let render_pass =
            GfxRenderPass::new(main_render_pass_desc(swapchain.color_format(), depth_format), "main");

        let depth = AttachmentImage::new_depth(swapchain.extent(), depth_format, "main-depth");
        let framebuffers = Self::create_framebuffers(&render_pass, &swapchain, &depth);
        let render_complete_semaphores = Self::create_render_complete_semaphores(swapchain.image_count());

        log::info!("main window created, depth format: {:?}", depth_format);

        Ok(Self {
            winit_window: window,
            surface: Some(surface),
            swapchain: Some(swapchain),
            depth_format,
            depth: Some(depth),
            render_pass,
            framebuffers,
            present_complete_semaphore: GfxSemaphore::new("window-present-complete"),
            render_complete_semaphores,
        })
    }

    fn create_framebuffers(
        render_pass: &GfxRenderPass,
        swapchain: &GfxRenderSwapchain,
        depth: &AttachmentImage,
    ) -> Vec<GfxFramebuffer> {
        swapchain
            .image_views()
            .iter()
            .enumerate()
            .map(|(idx, view)| {
                GfxFramebuffer::new(
                    render_pass,
                    &[view.handle(), depth.view().handle()],
                    swapchain.extent(),
                    &format!("main-{idx}"),
                )
            })
            .collect_vec()
    }

    fn create_render_complete_semaphores(count: usize) -> Vec<GfxSemaphore> {
        (0..count).map(|i| GfxSemaphore::new(&format!("window-render-complete-{}", i))).collect_vec()
    }

    /// framebuffer, depth, swapchain 必须按这个顺序释放
    fn destroy_swapchain_objects(&mut self) {
        self.framebuffers.clear();
        if let Some(depth) = self.depth.take() {
            depth.destroy();
        }
        if let Some(swapchain) = self.swapchain.take() {
            swapchain.destroy();
        }
    }

    pub fn destroy(mut self) {
        self.destroy_swapchain_objects();

        let Self {
            surface,
            render_pass,
            present_complete_semaphore,
            render_complete_semaphores,
            ..
        } = self;
        present_complete_semaphore.destroy();
        render_complete_semaphores.into_iter().for_each(|s| s.destroy());
        drop(render_pass);
        drop(surface);
    }
}

// getters
impl MainWindow {
    #[inline]
    pub fn window(&self) -> &Window {
        &self.winit_window
    }

    fn inner_extent(window: &Window) -> vk::Extent2D {
        let size = window.inner_size();
        vk::Extent2D {
            width: size.width,
            height: size.height,
        }
    }

    /// 窗口当前的大小，最小化时为 0
    #[inline]
    pub fn window_extent(&self) -> vk::Extent2D {
        Self::inner_extent(&self.winit_window)
    }

    fn swapchain(&self) -> &GfxRenderSwapchain {
        self.swapchain.as_ref().expect("swapchain destroyed")
    }

    /// swapchain 的大小，也是主 framebuffer 的大小
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain().extent()
    }

    #[inline]
    pub fn color_format(&self) -> vk::Format {
        self.swapchain().color_format()
    }

    #[inline]
    pub fn depth_format(&self) -> vk::Format {
        self.depth_format
    }

    #[inline]
    pub fn render_pass(&self) -> &GfxRenderPass {
        &self.render_pass
    }

    #[inline]
    pub fn image_count(&self) -> usize {
        self.framebuffers.len()
    }

    #[inline]
    pub fn framebuffer(&self, image_index: usize) -> vk::Framebuffer {
        self.framebuffers[image_index].handle()
    }

    #[inline]
    pub fn current_image_index(&self) -> usize {
        self.swapchain().current_image_index()
    }

    #[inline]
    pub fn present_complete_semaphore(&self) -> &GfxSemaphore {
        &self.present_complete_semaphore
    }

    #[inline]
    pub fn render_complete_semaphore(&self, image_index: usize) -> &GfxSemaphore {
        &self.render_complete_semaphores[image_index]
    }
}

// phase
impl MainWindow {
    pub fn acquire_image(&mut self) -> GfxSwapchainStatus {
        let _span = tracy_client::span!("acquire image");
        let swapchain = self.swapchain.as_mut().expect("swapchain destroyed");
        swapchain.acquire_next_image(&self.present_complete_semaphore)
    }

    pub fn present_image(&self) -> GfxSwapchainStatus {
        let _span = tracy_client::span!("present");
        let swapchain = self.swapchain();
        swapchain.present_image(
            Gfx::get().gfx_queue(),
            &[&self.render_complete_semaphores[swapchain.current_image_index()]],
        )
    }

    pub fn set_title(&self, title: &str) {
        self.winit_window.set_title(title);
    }

    /// 重建 swapchain、depth 以及 framebuffer，render pass 保持不变
    pub fn rebuild_after_resized(&mut self, vsync: bool) {
        let _span = tracy_client::span!("MainWindow::rebuild_after_resized");
        Gfx::get().wait_idel();

        let old_image_count = self.framebuffers.len();
        let old_color_format = self.swapchain.as_ref().map(|s| s.color_format());
        self.destroy_swapchain_objects();

        let surface = self.surface.as_ref().expect("surface destroyed");
        let swapchain = GfxRenderSwapchain::new(surface, self.window_extent(), vsync);
        debug_assert_eq!(old_color_format, Some(swapchain.color_format()), "swapchain format changed");

        let depth = AttachmentImage::new_depth(swapchain.extent(), self.depth_format, "main-depth");
        self.framebuffers = Self::create_framebuffers(&self.render_pass, &swapchain, &depth);

        if swapchain.image_count() != old_image_count {
            std::mem::take(&mut self.render_complete_semaphores).into_iter().for_each(|s| s.destroy());
            self.render_complete_semaphores = Self::create_render_complete_semaphores(swapchain.image_count());
        }

        let extent = swapchain.extent();
        log::info!("window resized: {}x{}", extent.width, extent.height);

        self.depth = Some(depth);
        self.swapchain = Some(swapchain);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_render_pass_mapping() {
        let desc = main_render_pass_desc(vk::Format::B8G8R8A8_UNORM, vk::Format::D32_SFLOAT);
        let attachments = desc.attachments();
        assert_eq!(attachments.len(), 2);
        assert_eq!(attachments[0].format, vk::Format::B8G8R8A8_UNORM);
        assert_eq!(attachments[0].final_layout, vk::ImageLayout::PRESENT_SRC_KHR);
        assert_eq!(attachments[0].store_op, vk::AttachmentStoreOp::STORE);
        assert_eq!(attachments[1].format, vk::Format::D32_SFLOAT);
        assert_eq!(attachments[1].final_layout, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

        let (color_ref, depth_ref) = desc.references();
        assert_eq!(color_ref.unwrap().attachment, 0);
        assert_eq!(depth_ref.unwrap().attachment, 1);
    }

    #[test]
    fn test_main_render_pass_dependency() {
        let dep = main_render_pass_dependency();
        assert_eq!((dep.src_subpass, dep.dst_subpass), (vk::SUBPASS_EXTERNAL, 0));
        assert!(dep.dst_stage_mask.contains(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT));
        assert!(dep.dst_access_mask.contains(vk::AccessFlags::COLOR_ATTACHMENT_WRITE));
    }

    #[test]
    fn test_depth_candidates_prefer_d32() {
        assert_eq!(DEPTH_FORMAT_CANDIDATES[0], vk::Format::D32_SFLOAT);
    }
}
