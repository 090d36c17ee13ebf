use ash::vk;
use itertools::Itertools;

use crate::{
    commands::{command_queue::GfxCommandQueue, semaphore::GfxSemaphore},
    gfx::Gfx,
    resources::image_view::{GfxImageView, GfxImageViewDesc},
    swapchain::surface::{self, GfxSurface},
};

/// acquire 和 present 的结果
///
/// 除了 OUT_OF_DATE 之外的错误都是致命的
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GfxSwapchainStatus {
    Optimal,
    Suboptimal,
    /// 需要重建 swapchain
    OutOfDate,
}

/// # Destroy
/// 需要手动调用 `destroy`，重建时先 destroy 旧的再创建新的
pub struct GfxRenderSwapchain {
    swapchain_handle: vk::SwapchainKHR,

    /// 不是由 VMA 分配的，因此不使用 GfxImage
    swapchain_images: Vec<vk::Image>,
    swapchain_image_views: Vec<GfxImageView>,
    swapchain_image_index: usize,

    surface_format: vk::SurfaceFormatKHR,
    swapchain_extent: vk::Extent2D,
}
// 创建与销毁
impl GfxRenderSwapchain {
    pub fn new(surface: &GfxSurface, window_extent: vk::Extent2D, vsync: bool) -> Self {
        let _span = tracy_client::span!("GfxRenderSwapchain::new");
        let capabilities = surface.capabilities();
        let surface_format = surface::choose_surface_format(&surface.formats());
        let present_mode = surface::choose_present_mode(&surface.present_modes(), vsync);
        let extent = surface::choose_extent(&capabilities, window_extent);

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface.handle)
            .min_image_count(surface::choose_image_count(&capabilities))
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .pre_transform(capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .clipped(true);

        let gfx_device = Gfx::get().gfx_device();
        let swapchain_handle = unsafe { gfx_device.swapchain().create_swapchain(&create_info, None).unwrap() };
        gfx_device.set_object_debug_name(swapchain_handle, "main");

        let images = unsafe { gfx_device.swapchain().get_swapchain_images(swapchain_handle).unwrap() };
        for (img_idx, img) in images.iter().enumerate() {
            gfx_device.set_object_debug_name(*img, format!("swapchain-image-{img_idx}"));
        }
        let image_views = images
            .iter()
            .enumerate()
            .map(|(idx, img)| {
                GfxImageView::new(
                    *img,
                    GfxImageViewDesc::new_2d(surface_format.format, vk::ImageAspectFlags::COLOR),
                    format!("swapchain-{}", idx),
                )
            })
            .collect_vec();

        log::info!(
            "swapchain created: {}x{}, {} images, {:?}, {:?}",
            extent.width,
            extent.height,
            images.len(),
            surface_format.format,
            present_mode
        );

        Self {
            swapchain_handle,
            swapchain_images: images,
            swapchain_image_views: image_views,
            swapchain_image_index: 0,
            surface_format,
            swapchain_extent: extent,
        }
    }

    pub fn destroy(mut self) {
        self.swapchain_image_views.drain(..).for_each(|view| view.destroy());
        unsafe {
            Gfx::get().gfx_device().swapchain().destroy_swapchain(self.swapchain_handle, None);
        }
        self.swapchain_handle = vk::SwapchainKHR::null();
    }
}
// getters
impl GfxRenderSwapchain {
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain_extent
    }

    #[inline]
    pub fn color_format(&self) -> vk::Format {
        self.surface_format.format
    }

    #[inline]
    pub fn image_count(&self) -> usize {
        self.swapchain_images.len()
    }

    #[inline]
    pub fn image_views(&self) -> &[GfxImageView] {
        &self.swapchain_image_views
    }

    #[inline]
    pub fn current_image_index(&self) -> usize {
        self.swapchain_image_index
    }
}
// tools
impl GfxRenderSwapchain {
    /// 获取下一张 image，完成后 signal semaphore
    pub fn acquire_next_image(&mut self, semaphore: &GfxSemaphore) -> GfxSwapchainStatus {
        let result = unsafe {
            Gfx::get().gfx_device().swapchain().acquire_next_image(
                self.swapchain_handle,
                u64::MAX,
                semaphore.handle(),
                vk::Fence::null(),
            )
        };

        match result {
            Ok((image_index, suboptimal)) => {
                self.swapchain_image_index = image_index as usize;
                if suboptimal { GfxSwapchainStatus::Suboptimal } else { GfxSwapchainStatus::Optimal }
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => GfxSwapchainStatus::OutOfDate,
            Err(e) => panic!("failed to acquire swapchain image: {:?}", e),
        }
    }

    /// 在 wait_semaphores 全部 signal 之后 present 当前 image
    pub fn present_image(&self, queue: &GfxCommandQueue, wait_semaphores: &[&GfxSemaphore]) -> GfxSwapchainStatus {
        let wait_semaphores = wait_semaphores.iter().map(|s| s.handle()).collect_vec();
        let image_indices = [self.swapchain_image_index as u32];
        let swapchains = [self.swapchain_handle];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .image_indices(&image_indices)
            .swapchains(&swapchains);

        let result = unsafe { Gfx::get().gfx_device().swapchain().queue_present(queue.handle(), &present_info) };
        match result {
            Ok(false) => GfxSwapchainStatus::Optimal,
            Ok(true) => GfxSwapchainStatus::Suboptimal,
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => GfxSwapchainStatus::OutOfDate,
            Err(e) => panic!("failed to present swapchain image: {:?}", e),
        }
    }
}
impl Drop for GfxRenderSwapchain {
    fn drop(&mut self) {
        debug_assert!(
            self.swapchain_handle == vk::SwapchainKHR::null(),
            "GfxRenderSwapchain must be destroyed manually."
        );
    }
}
