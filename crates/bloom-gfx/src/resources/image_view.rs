use ash::vk;
use ash::vk::Handle;

use crate::{foundation::debug_messenger::DebugType, gfx::Gfx};

/// # Destroy
/// 需要手动调用 `destroy`
pub struct GfxImageView {
    handle: vk::ImageView,
    desc: GfxImageViewDesc,
    name: String,
}
// 创建与销毁
impl GfxImageView {
    pub fn new(image: vk::Image, desc: GfxImageViewDesc, name: impl AsRef<str>) -> Self {
        let gfx_device = Gfx::get().gfx_device();

        let info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(desc.view_type)
            .format(desc.format)
            .subresource_range(desc.subresource_range());

        let handle = unsafe { gfx_device.create_image_view(&info, None).unwrap() };
        let image_view = Self {
            handle,
            desc,
            name: name.as_ref().to_string(),
        };
        gfx_device.set_debug_name(&image_view, name);
        image_view
    }

    pub fn destroy(mut self) {
        self.destroy_mut();
    }

    pub fn destroy_mut(&mut self) {
        unsafe {
            Gfx::get().gfx_device().destroy_image_view(self.handle, None);
        }
        self.handle = vk::ImageView::null();
    }
}
impl Drop for GfxImageView {
    fn drop(&mut self) {
        debug_assert!(self.handle.is_null(), "GfxImageView {} must be destroyed manually.", self.name);
    }
}
// getters
impl GfxImageView {
    #[inline]
    pub fn handle(&self) -> vk::ImageView {
        self.handle
    }

    #[inline]
    pub fn desc(&self) -> &GfxImageViewDesc {
        &self.desc
    }
}
impl DebugType for GfxImageView {
    fn debug_type_name() -> &'static str {
        "GfxImageView"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GfxImageViewDesc {
    pub format: vk::Format,
    pub view_type: vk::ImageViewType,
    pub aspect_mask: vk::ImageAspectFlags,
    /// base layer 和 layer count
    pub layer: (u32, u32),
}
impl GfxImageViewDesc {
    pub fn new_2d(format: vk::Format, aspect: vk::ImageAspectFlags) -> Self {
        Self {
            format,
            view_type: vk::ImageViewType::TYPE_2D,
            aspect_mask: aspect,
            layer: (0, 1),
        }
    }

    /// 覆盖 6 个 layer 的 cube view
    pub fn new_cube(format: vk::Format) -> Self {
        Self {
            format,
            view_type: vk::ImageViewType::CUBE,
            aspect_mask: vk::ImageAspectFlags::COLOR,
            layer: (0, 6),
        }
    }

    pub fn subresource_range(&self) -> vk::ImageSubresourceRange {
        vk::ImageSubresourceRange {
            aspect_mask: self.aspect_mask,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: self.layer.0,
            layer_count: self.layer.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_view_covers_six_layers() {
        let range = GfxImageViewDesc::new_cube(vk::Format::R8G8B8A8_UNORM).subresource_range();
        assert_eq!(range.base_array_layer, 0);
        assert_eq!(range.layer_count, 6);
        assert_eq!(range.aspect_mask, vk::ImageAspectFlags::COLOR);
    }

    #[test]
    fn test_2d_depth_view() {
        let desc = GfxImageViewDesc::new_2d(vk::Format::D32_SFLOAT, vk::ImageAspectFlags::DEPTH);
        assert_eq!(desc.view_type, vk::ImageViewType::TYPE_2D);
        assert_eq!(desc.subresource_range().layer_count, 1);
    }
}
