use std::ffi::CStr;
use std::rc::Rc;

use ash::vk;

use crate::{
    commands::command_queue::GfxCommandQueue,
    foundation::{
        debug_messenger::GfxDebugMsger, device::GfxDevice, instance::GfxInstance, physical_device::GfxPhysicalDevice,
    },
};

/// instance、device 以及 queue 这些和 vulkan 实例生命周期一致的对象
pub struct GfxCore {
    /// 在 drop 之后会卸载 vulkan 动态库，必须最后释放
    pub(crate) vk_entry: ash::Entry,

    pub(crate) instance: GfxInstance,
    pub(crate) physical_device: GfxPhysicalDevice,

    /// queue、command pool 等对象需要共享 device 的函数指针
    pub(crate) gfx_device: Rc<GfxDevice>,

    pub(crate) debug_msger: GfxDebugMsger,

    pub(crate) gfx_queue: GfxCommandQueue,
}

// 创建与销毁
impl GfxCore {
    pub fn new(app_name: String, engine_name: String, instance_extra_exts: Vec<&'static CStr>) -> Self {
        let _span = tracy_client::span!("GfxCore::new");

        let vk_entry = unsafe { ash::Entry::load() }.expect("Failed to load vulkan entry");
        let instance = GfxInstance::new(&vk_entry, app_name, engine_name, instance_extra_exts);
        let physical_device = GfxPhysicalDevice::new_descrete_physical_device(instance.ash_instance());

        // 整个 demo 只使用一个 graphics queue，传输也走这个 queue
        let queue_priorities = [1.0];
        let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
            .queue_family_index(physical_device.gfx_queue_family.queue_family_index)
            .queue_priorities(&queue_priorities)];

        let gfx_device =
            Rc::new(GfxDevice::new(instance.ash_instance(), physical_device.vk_handle, &queue_create_infos));
        let gfx_queue = GfxCommandQueue {
            vk_queue: unsafe {
                gfx_device.get_device_queue(physical_device.gfx_queue_family.queue_family_index, 0)
            },
            queue_family: physical_device.gfx_queue_family.clone(),
            gfx_device: gfx_device.clone(),
        };

        let debug_msger = GfxDebugMsger::new(&vk_entry, instance.ash_instance());

        log::info!("gfx queue family:\n{:#?}", gfx_queue.queue_family);

        gfx_device.set_object_debug_name(instance.vk_instance(), "GfxInstance");
        gfx_device.set_object_debug_name(physical_device.vk_handle, "GfxPhysicalDevice");
        gfx_device.set_object_debug_name(gfx_device.vk_handle(), "GfxDevice");
        gfx_device.set_object_debug_name(gfx_queue.vk_queue, "GfxQueue-gfx");

        Self {
            vk_entry,
            instance,
            physical_device,
            gfx_device,
            debug_msger,
            gfx_queue,
        }
    }

    /// 逆序销毁：messenger -> device -> instance
    pub fn destroy(self) {
        self.debug_msger.destroy();
        self.gfx_device.destroy();
        self.physical_device.destroy();
        self.instance.destroy();
    }
}

// getters
impl GfxCore {
    #[inline]
    pub fn vk_entry(&self) -> &ash::Entry {
        &self.vk_entry
    }
}
