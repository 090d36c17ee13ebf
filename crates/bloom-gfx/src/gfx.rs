use std::ffi::CStr;
use std::rc::Rc;

use ash::vk;

use crate::{
    commands::{
        command_buffer::GfxCommandBuffer,
        command_pool::GfxCommandPool,
        command_queue::{GfxCommandQueue, GfxQueueFamily},
        submit_info::GfxSubmitInfo,
    },
    foundation::{
        device::GfxDevice, instance::GfxInstance, mem_allocator::GfxMemAllocator, physical_device::GfxPhysicalDevice,
    },
    gfx_core::GfxCore,
};

/// Vulkan 图形上下文单例
///
/// 只在主线程使用。所有 Gfx 对象都通过 `Gfx::get()` 访问 device 和 allocator，
/// 因此这些对象必须在 `Gfx::destroy()` 之前释放。
///
/// ```ignore
/// Gfx::init("Bloom".to_string(), extra_exts);
/// let device = Gfx::get().gfx_device();
/// Gfx::destroy();
/// ```
pub struct Gfx {
    pub(crate) gfx_core: GfxCore,
    pub(crate) vm_allocator: GfxMemAllocator,

    /// 用于 one-time 命令（资源上传、layout 转换）
    pub(crate) temp_graphics_command_pool: GfxCommandPool,
}

// 创建与销毁
impl Gfx {
    const ENGINE_NAME: &'static str = "BloomGfx";

    fn new(app_name: String, instance_extra_exts: Vec<&'static CStr>) -> Self {
        let gfx_core = GfxCore::new(app_name, Self::ENGINE_NAME.to_string(), instance_extra_exts);

        // 单例尚未就绪，只能显式传入 device
        let temp_graphics_command_pool = GfxCommandPool::new_internal(
            gfx_core.gfx_device.clone(),
            gfx_core.physical_device.gfx_queue_family.clone(),
            vk::CommandPoolCreateFlags::TRANSIENT,
            "gfx-one-time",
        );

        let vm_allocator = GfxMemAllocator::new(
            gfx_core.instance.ash_instance(),
            gfx_core.physical_device.vk_handle,
            &gfx_core.gfx_device,
        );

        Self {
            gfx_core,
            vm_allocator,
            temp_graphics_command_pool,
        }
    }
}

// 仅在单线程环境使用
static mut G_GFX: Option<Gfx> = None;

// 单例
impl Gfx {
    /// # Panics
    /// 如果还未调用 `Gfx::init()`
    #[inline]
    pub fn get() -> &'static Gfx {
        unsafe {
            let ptr = std::ptr::addr_of!(G_GFX);
            (*ptr).as_ref().expect("Gfx not initialized. Call Gfx::init() first.")
        }
    }

    /// # Panics
    /// 重复初始化
    pub fn init(app_name: String, instance_extra_exts: Vec<&'static CStr>) {
        unsafe {
            let ptr = std::ptr::addr_of_mut!(G_GFX);
            assert!((*ptr).is_none(), "Gfx already initialized");
            *ptr = Some(Self::new(app_name, instance_extra_exts));
        }
    }

    /// 调用之后不能再使用 `Gfx::get()`
    pub fn destroy() {
        unsafe {
            let ptr = std::ptr::addr_of_mut!(G_GFX);
            let gfx = (*ptr).take().expect("Gfx not initialized");

            gfx.vm_allocator.destroy();
            gfx.temp_graphics_command_pool.destroy_internal(&gfx.gfx_core.gfx_device);
            gfx.gfx_core.destroy();
        }
    }
}

// getters
impl Gfx {
    #[inline]
    pub fn vk_core(&self) -> &GfxCore {
        &self.gfx_core
    }

    #[inline]
    pub fn instance(&self) -> &GfxInstance {
        &self.gfx_core.instance
    }

    #[inline]
    pub fn gfx_device(&self) -> &Rc<GfxDevice> {
        &self.gfx_core.gfx_device
    }

    #[inline]
    pub fn allocator(&self) -> &GfxMemAllocator {
        &self.vm_allocator
    }

    #[inline]
    pub fn physical_device(&self) -> &GfxPhysicalDevice {
        &self.gfx_core.physical_device
    }

    #[inline]
    pub fn gfx_queue_family(&self) -> GfxQueueFamily {
        self.gfx_core.physical_device.gfx_queue_family.clone()
    }

    #[inline]
    pub fn gfx_queue(&self) -> &GfxCommandQueue {
        &self.gfx_core.gfx_queue
    }
}

// tools
impl Gfx {
    /// 按照 candidates 的顺序，筛选出支持 features 的格式
    pub fn find_supported_format(
        &self,
        candidates: &[vk::Format],
        tiling: vk::ImageTiling,
        features: vk::FormatFeatureFlags,
    ) -> Vec<vk::Format> {
        candidates
            .iter()
            .filter(|f| {
                let props = unsafe {
                    self.instance()
                        .ash_instance()
                        .get_physical_device_format_properties(self.physical_device().vk_handle, **f)
                };
                match tiling {
                    vk::ImageTiling::LINEAR => props.linear_tiling_features.contains(features),
                    vk::ImageTiling::OPTIMAL => props.optimal_tiling_features.contains(features),
                    _ => panic!("not supported tiling."),
                }
            })
            .copied()
            .collect()
    }

    /// 录制并立即提交命令，阻塞等待执行完成
    pub fn one_time_exec<F, R>(&self, func: F, name: impl AsRef<str>) -> R
    where
        F: FnOnce(&GfxCommandBuffer) -> R,
    {
        let command_buffer =
            GfxCommandBuffer::new(&self.temp_graphics_command_pool, &format!("one-time-{}", name.as_ref()));

        command_buffer.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT, name.as_ref());
        let result = func(&command_buffer);
        command_buffer.end();

        self.gfx_queue().submit(vec![GfxSubmitInfo::new(std::slice::from_ref(&command_buffer))], None);
        self.gfx_queue().wait_idle();
        self.temp_graphics_command_pool.free_command_buffers(vec![command_buffer]);

        result
    }

    pub fn wait_idel(&self) {
        self.gfx_device().wait_idle();
    }
}
