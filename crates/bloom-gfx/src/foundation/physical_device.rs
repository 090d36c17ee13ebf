use std::ffi::CStr;

use ash::vk;
use itertools::Itertools;

use crate::{commands::command_queue::GfxQueueFamily, foundation::debug_messenger::DebugType};

/// 表示一张物理显卡
pub struct GfxPhysicalDevice {
    pub(crate) vk_handle: vk::PhysicalDevice,

    /// 当前 gpu 的基础属性
    pub(crate) basic_props: vk::PhysicalDeviceProperties,

    pub(crate) gfx_queue_family: GfxQueueFamily,
}

impl GfxPhysicalDevice {
    /// 优先选择独立显卡，如果没有则选择第一个具有 graphics queue 的显卡
    pub fn new_descrete_physical_device(instance: &ash::Instance) -> Self {
        unsafe {
            instance
                .enumerate_physical_devices()
                .unwrap()
                .iter()
                .filter_map(|pdevice| GfxPhysicalDevice::new(*pdevice, instance))
                // 优先使用独立显卡
                .find_or_first(GfxPhysicalDevice::is_descrete_gpu)
                .expect("no physical device with a graphics queue")
        }
    }

    fn new(pdevice: vk::PhysicalDevice, instance: &ash::Instance) -> Option<Self> {
        unsafe {
            let basic_props = instance.get_physical_device_properties(pdevice);
            let physical_device_name = CStr::from_ptr(basic_props.device_name.as_ptr());
            log::info!("found gpu: {:?}", physical_device_name);

            let queue_familiy_props = instance.get_physical_device_queue_family_properties(pdevice);
            log::debug!("physical device: queue family props:\n{:#?}", queue_familiy_props);

            // graphics queue 隐含了 transfer 能力
            let gfx_queue_family = queue_familiy_props
                .iter()
                .enumerate()
                .find(|(_, props)| props.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                .map(|(family_idx, props)| GfxQueueFamily {
                    name: "gfx".to_string(),
                    queue_family_index: family_idx as u32,
                    queue_flags: props.queue_flags,
                    queue_count: props.queue_count,
                })?;

            Some(Self {
                vk_handle: pdevice,
                basic_props,
                gfx_queue_family,
            })
        }
    }

    pub fn destroy(self) {
        // 无需销毁
    }

    /// 当前 gpu 是否是独立显卡
    #[inline]
    pub fn is_descrete_gpu(&self) -> bool {
        self.basic_props.device_type == vk::PhysicalDeviceType::DISCRETE_GPU
    }

    #[inline]
    pub fn vk_handle(&self) -> vk::PhysicalDevice {
        self.vk_handle
    }
}

impl DebugType for GfxPhysicalDevice {
    fn debug_type_name() -> &'static str {
        "GfxPhysicalDevice"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.vk_handle
    }
}
