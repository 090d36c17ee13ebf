use ash::vk;

use crate::{foundation::debug_messenger::DebugType, gfx::Gfx};

/// descriptor pool 的容量
#[derive(Debug, Clone)]
pub struct GfxDescriptorPoolCreateInfo {
    pub flags: vk::DescriptorPoolCreateFlags,
    pub max_sets: u32,
    pub pool_sizes: Vec<vk::DescriptorPoolSize>,
}

impl GfxDescriptorPoolCreateInfo {
    #[inline]
    pub fn new(flags: vk::DescriptorPoolCreateFlags, max_sets: u32, pool_sizes: Vec<vk::DescriptorPoolSize>) -> Self {
        Self {
            flags,
            max_sets,
            pool_sizes,
        }
    }

    /// 某种 descriptor 的总容量
    pub fn capacity_of(&self, ty: vk::DescriptorType) -> u32 {
        self.pool_sizes.iter().filter(|s| s.ty == ty).map(|s| s.descriptor_count).sum()
    }
}

/// # Destroy
/// 在 Drop 中释放，从中分配的 set 一并失效
pub struct GfxDescriptorPool {
    handle: vk::DescriptorPool,
    info: GfxDescriptorPoolCreateInfo,
    name: String,
}
impl GfxDescriptorPool {
    pub fn new(info: GfxDescriptorPoolCreateInfo, name: &str) -> Self {
        let pool_ci = vk::DescriptorPoolCreateInfo::default()
            .flags(info.flags)
            .max_sets(info.max_sets)
            .pool_sizes(&info.pool_sizes);

        let gfx_device = Gfx::get().gfx_device();
        let handle = unsafe { gfx_device.create_descriptor_pool(&pool_ci, None).unwrap() };
        let pool = Self {
            handle,
            info,
            name: name.to_string(),
        };
        gfx_device.set_debug_name(&pool, name);
        pool
    }

    #[inline]
    pub fn handle(&self) -> vk::DescriptorPool {
        self.handle
    }

    #[inline]
    pub fn info(&self) -> &GfxDescriptorPoolCreateInfo {
        &self.info
    }
}
impl Drop for GfxDescriptorPool {
    fn drop(&mut self) {
        log::info!("destroying descriptor pool: {}", self.name);
        unsafe { Gfx::get().gfx_device().destroy_descriptor_pool(self.handle, None) };
    }
}
impl DebugType for GfxDescriptorPool {
    fn debug_type_name() -> &'static str {
        "GfxDescriptorPool"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_sums_same_type() {
        let info = GfxDescriptorPoolCreateInfo::new(
            vk::DescriptorPoolCreateFlags::empty(),
            5,
            vec![
                vk::DescriptorPoolSize {
                    ty: vk::DescriptorType::UNIFORM_BUFFER,
                    descriptor_count: 6,
                },
                vk::DescriptorPoolSize {
                    ty: vk::DescriptorType::UNIFORM_BUFFER,
                    descriptor_count: 2,
                },
            ],
        );
        assert_eq!(info.capacity_of(vk::DescriptorType::UNIFORM_BUFFER), 8);
        assert_eq!(info.capacity_of(vk::DescriptorType::COMBINED_IMAGE_SAMPLER), 0);
    }
}
