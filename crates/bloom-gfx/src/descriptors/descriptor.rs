use std::marker::PhantomData;

use ash::vk;

use crate::{
    descriptors::{binding_layout::GfxBindingLayout, descriptor_pool::GfxDescriptorPool},
    foundation::debug_messenger::DebugType,
    gfx::Gfx,
};

/// 由类型参数 T 描述 binding 的 set layout
///
/// # Destroy
/// 在 Drop 中释放
pub struct GfxDescriptorSetLayout<T: GfxBindingLayout> {
    layout: vk::DescriptorSetLayout,
    _phantom: PhantomData<T>,
}
impl<T: GfxBindingLayout> GfxDescriptorSetLayout<T> {
    pub fn new(debug_name: impl AsRef<str>) -> Self {
        let bindings = T::vk_bindings();
        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);

        let gfx_device = Gfx::get().gfx_device();
        let layout = unsafe { gfx_device.create_descriptor_set_layout(&create_info, None).unwrap() };
        let layout = Self {
            layout,
            _phantom: PhantomData,
        };
        gfx_device.set_debug_name(&layout, debug_name);
        layout
    }

    #[inline]
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }
}
impl<T: GfxBindingLayout> Drop for GfxDescriptorSetLayout<T> {
    fn drop(&mut self) {
        unsafe {
            Gfx::get().gfx_device().destroy_descriptor_set_layout(self.layout, None);
        }
    }
}
impl<T: GfxBindingLayout> DebugType for GfxDescriptorSetLayout<T> {
    fn debug_type_name() -> &'static str {
        "GfxDescriptorSetLayout"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.layout
    }
}

/// # Destroy
/// 随 descriptor pool 一起释放
pub struct GfxDescriptorSet<T: GfxBindingLayout> {
    handle: vk::DescriptorSet,
    _phantom: PhantomData<T>,
}
impl<T: GfxBindingLayout> GfxDescriptorSet<T> {
    pub fn new(
        descriptor_pool: &GfxDescriptorPool,
        layout: &GfxDescriptorSetLayout<T>,
        debug_name: impl AsRef<str>,
    ) -> Self {
        let set_layouts = [layout.handle()];
        let alloc_info =
            vk::DescriptorSetAllocateInfo::default().descriptor_pool(descriptor_pool.handle()).set_layouts(&set_layouts);

        let gfx_device = Gfx::get().gfx_device();
        // pool 容量不足属于配置错误
        let descriptor_set = unsafe { gfx_device.allocate_descriptor_sets(&alloc_info).unwrap()[0] };
        let set = Self {
            handle: descriptor_set,
            _phantom: PhantomData,
        };
        gfx_device.set_debug_name(&set, debug_name);
        set
    }

    #[inline]
    pub fn handle(&self) -> vk::DescriptorSet {
        self.handle
    }
}
impl<T: GfxBindingLayout> DebugType for GfxDescriptorSet<T> {
    fn debug_type_name() -> &'static str {
        "GfxDescriptorSet"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
