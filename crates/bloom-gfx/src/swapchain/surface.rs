use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::{foundation::debug_messenger::DebugType, gfx::Gfx};

/// 窗口对应的 vk surface
///
/// # Destroy
/// 在 Drop 中释放，需要在 swapchain 之后
pub struct GfxSurface {
    pub(crate) handle: vk::SurfaceKHR,
    pub(crate) pf: ash::khr::surface::Instance,
}
impl GfxSurface {
    pub fn new(window: &winit::window::Window) -> Self {
        let vk_core = Gfx::get().vk_core();
        let surface_pf = ash::khr::surface::Instance::new(vk_core.vk_entry(), vk_core.instance.ash_instance());

        let handle = unsafe {
            ash_window::create_surface(
                vk_core.vk_entry(),
                vk_core.instance.ash_instance(),
                window.display_handle().unwrap().as_raw(),
                window.window_handle().unwrap().as_raw(),
                None,
            )
            .unwrap()
        };

        let pdevice = vk_core.physical_device.vk_handle;
        let queue_family_index = vk_core.physical_device.gfx_queue_family.queue_family_index;
        let present_supported =
            unsafe { surface_pf.get_physical_device_surface_support(pdevice, queue_family_index, handle).unwrap() };
        assert!(present_supported, "gfx queue family can not present to the window surface");

        let surface = Self { handle, pf: surface_pf };
        vk_core.gfx_device.set_debug_name(&surface, "main");
        surface
    }
}
// 查询，resize 之后需要重新查询
impl GfxSurface {
    pub fn capabilities(&self) -> vk::SurfaceCapabilitiesKHR {
        let pdevice = Gfx::get().physical_device().vk_handle();
        unsafe { self.pf.get_physical_device_surface_capabilities(pdevice, self.handle).unwrap() }
    }

    pub fn formats(&self) -> Vec<vk::SurfaceFormatKHR> {
        let pdevice = Gfx::get().physical_device().vk_handle();
        unsafe { self.pf.get_physical_device_surface_formats(pdevice, self.handle).unwrap() }
    }

    pub fn present_modes(&self) -> Vec<vk::PresentModeKHR> {
        let pdevice = Gfx::get().physical_device().vk_handle();
        unsafe { self.pf.get_physical_device_surface_present_modes(pdevice, self.handle).unwrap() }
    }
}
impl Drop for GfxSurface {
    fn drop(&mut self) {
        unsafe { self.pf.destroy_surface(self.handle, None) }
    }
}
impl DebugType for GfxSurface {
    fn debug_type_name() -> &'static str {
        "GfxSurface"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}

/// 优先使用 B8G8R8A8_UNORM + SRGB_NONLINEAR
///
/// 只有一个 UNDEFINED 时表示 surface 没有偏好
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    let preferred = vk::SurfaceFormatKHR {
        format: vk::Format::B8G8R8A8_UNORM,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    };
    match formats {
        [] => panic!("surface reports no formats"),
        [only] if only.format == vk::Format::UNDEFINED => preferred,
        _ => formats.iter().copied().find(|f| *f == preferred).unwrap_or(formats[0]),
    }
}

/// vsync 时使用 FIFO；否则依次尝试 MAILBOX、IMMEDIATE，FIFO 一定可用
pub fn choose_present_mode(modes: &[vk::PresentModeKHR], vsync: bool) -> vk::PresentModeKHR {
    if vsync {
        return vk::PresentModeKHR::FIFO;
    }
    [vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::IMMEDIATE]
        .into_iter()
        .find(|m| modes.contains(m))
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

/// current_extent 为 u32::MAX 时由窗口大小决定
pub fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, window_extent: vk::Extent2D) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }
    vk::Extent2D {
        width: window_extent
            .width
            .clamp(capabilities.min_image_extent.width, capabilities.max_image_extent.width),
        height: window_extent
            .height
            .clamp(capabilities.min_image_extent.height, capabilities.max_image_extent.height),
    }
}

/// 比最小值多一张，max_image_count 为 0 表示没有上限
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let desired = capabilities.min_image_count + 1;
    if capabilities.max_image_count == 0 { desired } else { desired.min(capabilities.max_image_count) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_format_means_no_preference() {
        let formats = [vk::SurfaceFormatKHR {
            format: vk::Format::UNDEFINED,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }];
        assert_eq!(choose_surface_format(&formats).format, vk::Format::B8G8R8A8_UNORM);
    }

    #[test]
    fn test_fallback_to_first_format() {
        let formats = [
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::A2B10G10R10_UNORM_PACK32,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];
        assert_eq!(choose_surface_format(&formats).format, vk::Format::R8G8B8A8_SRGB);
    }

    #[test]
    fn test_present_mode() {
        let modes = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE];
        assert_eq!(choose_present_mode(&modes, true), vk::PresentModeKHR::FIFO);
        assert_eq!(choose_present_mode(&modes, false), vk::PresentModeKHR::IMMEDIATE);
        assert_eq!(choose_present_mode(&[vk::PresentModeKHR::FIFO], false), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn test_extent_follows_window_when_undefined() {
        let caps = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            min_image_extent: vk::Extent2D { width: 1, height: 1 },
            max_image_extent: vk::Extent2D {
                width: 4096,
                height: 4096,
            },
            ..Default::default()
        };
        let extent = choose_extent(&caps, vk::Extent2D {
            width: 8000,
            height: 720,
        });
        assert_eq!(extent.width, 4096);
        assert_eq!(extent.height, 720);
    }

    #[test]
    fn test_image_count() {
        let caps = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 0,
            ..Default::default()
        };
        assert_eq!(choose_image_count(&caps), 3);

        let caps = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 2,
            ..Default::default()
        };
        assert_eq!(choose_image_count(&caps), 2);
    }
}
