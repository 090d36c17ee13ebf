//! descriptor set layout 的静态描述
//!
//! 一个类型实现 [`GfxBindingLayout`] 之后，就可以作为 [`GfxDescriptorSetLayout`] 以及
//! [`GfxDescriptorSet`] 的类型参数，保证 set 与 layout 的对应关系。
//!
//! [`GfxDescriptorSetLayout`]: crate::descriptors::descriptor::GfxDescriptorSetLayout
//! [`GfxDescriptorSet`]: crate::descriptors::descriptor::GfxDescriptorSet

use ash::vk;

use crate::descriptors::descriptor_write::GfxWriteDescriptorSet;

/// 一个 binding 的详细信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GfxBindingItem {
    pub name: &'static str,
    pub binding: u32,
    pub descriptor_type: vk::DescriptorType,
    pub stage_flags: vk::ShaderStageFlags,
    pub count: u32,
}

impl GfxBindingItem {
    /// 生成写入 buffer 的 write
    pub fn write_buffer(&self, dst_set: vk::DescriptorSet, buffers: Vec<vk::DescriptorBufferInfo>) -> GfxWriteDescriptorSet {
        debug_assert!(
            matches!(
                self.descriptor_type,
                vk::DescriptorType::UNIFORM_BUFFER | vk::DescriptorType::STORAGE_BUFFER
            ),
            "binding {} is not a buffer",
            self.name
        );
        GfxWriteDescriptorSet {
            dst_set,
            dst_binding: self.binding,
            dst_array_element: 0,
            descriptor_type: self.descriptor_type,
            buffer_infos: buffers,
            image_infos: vec![],
        }
    }

    /// 生成写入 image 的 write
    pub fn write_image(&self, dst_set: vk::DescriptorSet, images: Vec<vk::DescriptorImageInfo>) -> GfxWriteDescriptorSet {
        debug_assert!(
            matches!(
                self.descriptor_type,
                vk::DescriptorType::COMBINED_IMAGE_SAMPLER
                    | vk::DescriptorType::SAMPLED_IMAGE
                    | vk::DescriptorType::STORAGE_IMAGE
            ),
            "binding {} is not an image",
            self.name
        );
        GfxWriteDescriptorSet {
            dst_set,
            dst_binding: self.binding,
            dst_array_element: 0,
            descriptor_type: self.descriptor_type,
            buffer_infos: vec![],
            image_infos: images,
        }
    }
}

pub trait GfxBindingLayout {
    fn bindings() -> Vec<GfxBindingItem>;

    /// 由 `bindings()` 生成，不应被覆盖
    fn vk_bindings() -> Vec<vk::DescriptorSetLayoutBinding<'static>> {
        Self::bindings()
            .iter()
            .map(|item| vk::DescriptorSetLayoutBinding {
                binding: item.binding,
                descriptor_type: item.descriptor_type,
                descriptor_count: item.count,
                stage_flags: item.stage_flags,
                ..Default::default()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TwoBindings;
    impl GfxBindingLayout for TwoBindings {
        fn bindings() -> Vec<GfxBindingItem> {
            vec![
                GfxBindingItem {
                    name: "ubo",
                    binding: 0,
                    descriptor_type: vk::DescriptorType::UNIFORM_BUFFER,
                    stage_flags: vk::ShaderStageFlags::VERTEX,
                    count: 1,
                },
                GfxBindingItem {
                    name: "tex",
                    binding: 3,
                    descriptor_type: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                    stage_flags: vk::ShaderStageFlags::FRAGMENT,
                    count: 1,
                },
            ]
        }
    }

    #[test]
    fn test_vk_bindings_follow_items() {
        let vk_bindings = TwoBindings::vk_bindings();
        assert_eq!(vk_bindings.len(), 2);
        assert_eq!(vk_bindings[1].binding, 3);
        assert_eq!(vk_bindings[1].descriptor_type, vk::DescriptorType::COMBINED_IMAGE_SAMPLER);
        assert_eq!(vk_bindings[0].stage_flags, vk::ShaderStageFlags::VERTEX);
    }

    #[test]
    fn test_write_image_uses_item_binding() {
        let item = TwoBindings::bindings()[1];
        let write = item.write_image(vk::DescriptorSet::null(), vec![vk::DescriptorImageInfo::default()]);
        assert_eq!(write.dst_binding, 3);
        assert_eq!(write.descriptor_type, vk::DescriptorType::COMBINED_IMAGE_SAMPLER);
        assert!(write.buffer_infos.is_empty());
    }
}
