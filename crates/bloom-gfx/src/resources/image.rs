use ash::vk;
use ash::vk::Handle;
use vk_mem::Alloc;

use crate::{
    commands::{barrier::GfxImageBarrier, command_buffer::GfxCommandBuffer},
    foundation::debug_messenger::DebugType,
    gfx::Gfx,
    resources::buffer::GfxBuffer,
};

/// 每个像素的字节数，只覆盖会上传像素数据的格式
///
/// # Panic
/// 不支持的格式
pub fn pixel_size_in_bytes(format: vk::Format) -> usize {
    match format {
        vk::Format::R8G8B8A8_UNORM
        | vk::Format::R8G8B8A8_SRGB
        | vk::Format::B8G8R8A8_UNORM
        | vk::Format::B8G8R8A8_SRGB => 4,
        vk::Format::R16G16B16A16_SFLOAT => 8,
        vk::Format::R32G32B32A32_SFLOAT => 16,
        _ => panic!("unsupported format: {:?}", format),
    }
}

/// 由 VMA 分配的 image
///
/// # Destroy
/// 需要手动调用 `destroy`
pub struct GfxImage {
    handle: vk::Image,
    allocation: Option<vk_mem::Allocation>,

    extent: vk::Extent3D,
    format: vk::Format,
    layer_count: u32,

    name: String,
}
// 创建与销毁
impl GfxImage {
    pub fn new(image_info: &GfxImageCreateInfo, debug_name: &str) -> Self {
        let alloc_info = vk_mem::AllocationCreateInfo {
            usage: vk_mem::MemoryUsage::AutoPreferDevice,
            ..Default::default()
        };
        let (image, alloc) = unsafe { Gfx::get().allocator().create_image(&image_info.inner, &alloc_info).unwrap() };
        let image = Self {
            handle: image,
            allocation: Some(alloc),
            extent: image_info.inner.extent,
            format: image_info.inner.format,
            layer_count: image_info.inner.array_layers,

            name: debug_name.to_string(),
        };
        Gfx::get().gfx_device().set_debug_name(&image, debug_name);
        image
    }

    pub fn destroy(mut self) {
        self.destroy_mut();
    }

    pub fn destroy_mut(&mut self) {
        log::debug!("destroying image: {}", self.name);
        if let Some(mut allocation) = self.allocation.take() {
            unsafe { Gfx::get().allocator().destroy_image(self.handle, &mut allocation) };
        }
        self.handle = vk::Image::null();
    }
}
impl Drop for GfxImage {
    fn drop(&mut self) {
        debug_assert!(self.handle.is_null(), "GfxImage {} must be destroyed manually.", self.name);
    }
}
// getters
impl GfxImage {
    #[inline]
    pub fn width(&self) -> u32 {
        self.extent.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.extent.height
    }

    #[inline]
    pub fn handle(&self) -> vk::Image {
        self.handle
    }

    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }

    #[inline]
    pub fn layer_count(&self) -> u32 {
        self.layer_count
    }
}
// tools
impl GfxImage {
    /// 将所有 layer 的像素数据上传到 image，结束后 image 处于 SHADER_READ_ONLY_OPTIMAL
    ///
    /// data 按 layer 依次紧密排列。返回的 stage buffer 需要活到命令执行完成。
    pub fn transfer_data(&self, command_buffer: &GfxCommandBuffer, data: &[u8]) -> GfxBuffer {
        let layer_size = pixel_size_in_bytes(self.format) * (self.width() * self.height()) as usize;
        assert_eq!(data.len(), layer_size * self.layer_count as usize, "image {} data size mismatch", self.name);

        let stage_buffer =
            GfxBuffer::new_stage_buffer(data.len() as vk::DeviceSize, format!("{}-stage-buffer", self.name));
        stage_buffer.transfer_data_by_mmap(data);

        let to_transfer_dst = GfxImageBarrier::new()
            .image(self.handle)
            .src_mask(vk::PipelineStageFlags2::TOP_OF_PIPE, vk::AccessFlags2::empty())
            .dst_mask(vk::PipelineStageFlags2::TRANSFER, vk::AccessFlags2::TRANSFER_WRITE)
            .layout_transfer(vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .image_aspect_flag(vk::ImageAspectFlags::COLOR)
            .layers(0, self.layer_count);
        command_buffer.image_memory_barrier(vk::DependencyFlags::empty(), std::slice::from_ref(&to_transfer_dst));

        // layer 在 buffer 中连续存放，一个 region 即可覆盖所有 layer
        let buffer_image_copy = vk::BufferImageCopy2::default()
            .buffer_offset(0)
            .buffer_row_length(0)
            .buffer_image_height(0)
            .image_offset(vk::Offset3D::default())
            .image_extent(self.extent)
            .image_subresource(vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: self.layer_count,
            });
        command_buffer.cmd_copy_buffer_to_image(
            &vk::CopyBufferToImageInfo2::default()
                .src_buffer(stage_buffer.vk_buffer())
                .dst_image(self.handle)
                .dst_image_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .regions(std::slice::from_ref(&buffer_image_copy)),
        );

        let to_shader_read = GfxImageBarrier::new()
            .image(self.handle)
            .src_mask(vk::PipelineStageFlags2::TRANSFER, vk::AccessFlags2::TRANSFER_WRITE)
            .dst_mask(vk::PipelineStageFlags2::FRAGMENT_SHADER, vk::AccessFlags2::SHADER_READ)
            .layout_transfer(vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
            .image_aspect_flag(vk::ImageAspectFlags::COLOR)
            .layers(0, self.layer_count);
        command_buffer.image_memory_barrier(vk::DependencyFlags::empty(), std::slice::from_ref(&to_shader_read));

        stage_buffer
    }
}
impl DebugType for GfxImage {
    fn debug_type_name() -> &'static str {
        "GfxImage"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}

pub struct GfxImageCreateInfo {
    inner: vk::ImageCreateInfo<'static>,
}
impl GfxImageCreateInfo {
    #[inline]
    pub fn new_image_2d_info(extent: vk::Extent2D, format: vk::Format, usage: vk::ImageUsageFlags) -> Self {
        Self {
            inner: vk::ImageCreateInfo {
                image_type: vk::ImageType::TYPE_2D,
                format,
                extent: extent.into(),
                mip_levels: 1,
                array_layers: 1,
                samples: vk::SampleCountFlags::TYPE_1,
                tiling: vk::ImageTiling::OPTIMAL,
                usage,
                sharing_mode: vk::SharingMode::EXCLUSIVE,
                // 只能是 UNDEFINED 或者 PREINITIALIZED
                initial_layout: vk::ImageLayout::UNDEFINED,
                ..Default::default()
            },
        }
    }

    /// 6 个 layer 的 cube image，extent 是单个面的大小
    #[inline]
    pub fn new_cube_info(face_extent: vk::Extent2D, format: vk::Format, usage: vk::ImageUsageFlags) -> Self {
        let mut info = Self::new_image_2d_info(face_extent, format, usage);
        info.inner.array_layers = 6;
        info.inner.flags = vk::ImageCreateFlags::CUBE_COMPATIBLE;
        info
    }

    #[inline]
    pub fn array_layers(&self) -> u32 {
        self.inner.array_layers
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent3D {
        self.inner.extent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_size() {
        assert_eq!(pixel_size_in_bytes(vk::Format::R8G8B8A8_UNORM), 4);
        assert_eq!(pixel_size_in_bytes(vk::Format::B8G8R8A8_SRGB), 4);
        assert_eq!(pixel_size_in_bytes(vk::Format::R16G16B16A16_SFLOAT), 8);
    }

    #[test]
    #[should_panic]
    fn test_pixel_size_unsupported() {
        pixel_size_in_bytes(vk::Format::D32_SFLOAT);
    }

    #[test]
    fn test_cube_info() {
        let info = GfxImageCreateInfo::new_cube_info(
            vk::Extent2D { width: 64, height: 64 },
            vk::Format::R8G8B8A8_UNORM,
            vk::ImageUsageFlags::SAMPLED,
        );
        assert_eq!(info.array_layers(), 6);
        assert!(info.inner.flags.contains(vk::ImageCreateFlags::CUBE_COMPATIBLE));
        assert_eq!(info.extent().depth, 1);
    }
}
