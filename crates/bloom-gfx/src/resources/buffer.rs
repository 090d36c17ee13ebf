use std::ptr;

use ash::vk;
use vk_mem::Alloc;

use crate::{foundation::debug_messenger::DebugType, gfx::Gfx};

/// 由 VMA 分配的 buffer
///
/// # Destroy
/// 在 Drop 中释放
pub struct GfxBuffer {
    handle: vk::Buffer,
    allocation: vk_mem::Allocation,

    size: vk::DeviceSize,

    /// 创建时决定是否常驻映射
    map_ptr: Option<*mut u8>,

    debug_name: String,
}
// 创建与销毁
impl GfxBuffer {
    /// * mem_map - 是否需要 host 写入，需要时常驻映射
    pub fn new(
        buffer_size: vk::DeviceSize,
        buffer_usage: vk::BufferUsageFlags,
        mem_map: bool,
        name: impl AsRef<str>,
    ) -> Self {
        let buffer_ci = vk::BufferCreateInfo::default().size(buffer_size).usage(buffer_usage);
        let alloc_ci = if mem_map {
            vk_mem::AllocationCreateInfo {
                usage: vk_mem::MemoryUsage::AutoPreferHost,
                flags: vk_mem::AllocationCreateFlags::HOST_ACCESS_SEQUENTIAL_WRITE,
                ..Default::default()
            }
        } else {
            vk_mem::AllocationCreateInfo {
                usage: vk_mem::MemoryUsage::AutoPreferDevice,
                ..Default::default()
            }
        };

        let allocator = Gfx::get().allocator();
        let (buffer, mut alloc) = unsafe { allocator.create_buffer(&buffer_ci, &alloc_ci).unwrap() };

        let map_ptr = if mem_map { Some(unsafe { allocator.map_memory(&mut alloc).unwrap() }) } else { None };

        let buffer = Self {
            handle: buffer,
            allocation: alloc,
            size: buffer_size,
            map_ptr,
            debug_name: name.as_ref().to_string(),
        };
        Gfx::get().gfx_device().set_debug_name(&buffer, name);
        buffer
    }

    #[inline]
    pub fn new_stage_buffer(size: vk::DeviceSize, debug_name: impl AsRef<str>) -> Self {
        Self::new(size, vk::BufferUsageFlags::TRANSFER_SRC, true, debug_name)
    }

    /// host 可写的 uniform buffer
    #[inline]
    pub fn new_uniform_buffer(size: vk::DeviceSize, debug_name: impl AsRef<str>) -> Self {
        Self::new(size, vk::BufferUsageFlags::UNIFORM_BUFFER, true, debug_name)
    }

    /// 只能通过 transfer 写入的 buffer
    #[inline]
    pub fn new_device_local(size: vk::DeviceSize, usage: vk::BufferUsageFlags, debug_name: impl AsRef<str>) -> Self {
        Self::new(size, usage | vk::BufferUsageFlags::TRANSFER_DST, false, debug_name)
    }

    #[inline]
    pub fn destroy(self) {
        drop(self)
    }
}
impl Drop for GfxBuffer {
    fn drop(&mut self) {
        let allocator = Gfx::get().allocator();
        unsafe {
            if self.map_ptr.is_some() {
                allocator.unmap_memory(&mut self.allocation);
            }
            allocator.destroy_buffer(self.handle, &mut self.allocation);
        }
    }
}
// getters
impl GfxBuffer {
    #[inline]
    pub fn vk_buffer(&self) -> vk::Buffer {
        self.handle
    }

    #[inline]
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    /// 整个 buffer 作为 descriptor
    #[inline]
    pub fn descriptor_info(&self) -> vk::DescriptorBufferInfo {
        vk::DescriptorBufferInfo {
            buffer: self.handle,
            offset: 0,
            range: self.size,
        }
    }
}
// tools
impl GfxBuffer {
    #[inline]
    fn mapped_ptr(&self) -> *mut u8 {
        self.map_ptr.unwrap_or_else(|| panic!("buffer {} is not host mapped", self.debug_name))
    }

    /// 通过 mem map 写入 buffer 开头
    pub fn transfer_data_by_mmap<T: bytemuck::Pod>(&self, data: &[T]) {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        assert!(bytes.len() as vk::DeviceSize <= self.size, "buffer {} overflow", self.debug_name);
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), self.mapped_ptr(), bytes.len());
        }
        Gfx::get().allocator().flush_allocation(&self.allocation, 0, bytes.len() as vk::DeviceSize).unwrap();
    }

    /// 写入单个结构体，用于 uniform buffer
    #[inline]
    pub fn write_struct<T: bytemuck::Pod>(&self, value: &T) {
        self.transfer_data_by_mmap(std::slice::from_ref(value));
    }

    /// 经由临时 stage buffer 将数据拷贝到 self，阻塞等待完成
    ///
    /// 只用于初始化阶段的大块数据
    pub fn transfer_data_sync<T: bytemuck::Pod>(&self, data: &[T]) {
        let data_size = size_of_val(data) as vk::DeviceSize;
        let stage_buffer = Self::new_stage_buffer(data_size, format!("{}-stage-buffer", self.debug_name));
        stage_buffer.transfer_data_by_mmap(data);

        Gfx::get().one_time_exec(
            |cmd| {
                cmd.cmd_copy_buffer(
                    &stage_buffer,
                    self,
                    &[vk::BufferCopy {
                        size: data_size,
                        ..Default::default()
                    }],
                );
            },
            format!("{}-transfer-data", self.debug_name),
        );
    }
}
impl DebugType for GfxBuffer {
    fn debug_type_name() -> &'static str {
        "GfxBuffer"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
