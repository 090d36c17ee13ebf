use ash::vk;

/// 对 vk::WriteDescriptorSet 的封装，持有 buffer/image info 的内存
pub struct GfxWriteDescriptorSet {
    pub dst_set: vk::DescriptorSet,
    pub dst_binding: u32,
    pub dst_array_element: u32,
    pub descriptor_type: vk::DescriptorType,

    pub buffer_infos: Vec<vk::DescriptorBufferInfo>,
    pub image_infos: Vec<vk::DescriptorImageInfo>,
}

impl GfxWriteDescriptorSet {
    /// buffer_infos 和 image_infos 只能有一个非空
    pub fn to_vk_type(&self) -> vk::WriteDescriptorSet<'_> {
        assert!(
            self.buffer_infos.is_empty() ^ self.image_infos.is_empty(),
            "exactly one of buffer_infos or image_infos should be set in GfxWriteDescriptorSet"
        );
        let descriptor_count = self.buffer_infos.len().max(self.image_infos.len());

        vk::WriteDescriptorSet {
            dst_set: self.dst_set,
            dst_binding: self.dst_binding,
            dst_array_element: self.dst_array_element,
            descriptor_count: descriptor_count as u32,
            descriptor_type: self.descriptor_type,
            // 读取哪个指针由 descriptor type 决定
            p_buffer_info: self.buffer_infos.as_ptr(),
            p_image_info: self.image_infos.as_ptr(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_write_count() {
        let write = GfxWriteDescriptorSet {
            dst_set: vk::DescriptorSet::null(),
            dst_binding: 2,
            dst_array_element: 0,
            descriptor_type: vk::DescriptorType::UNIFORM_BUFFER,
            buffer_infos: vec![vk::DescriptorBufferInfo::default(); 1],
            image_infos: vec![],
        };
        let vk_write = write.to_vk_type();
        assert_eq!(vk_write.descriptor_count, 1);
        assert_eq!(vk_write.dst_binding, 2);
    }

    #[test]
    #[should_panic]
    fn test_empty_write_panics() {
        let write = GfxWriteDescriptorSet {
            dst_set: vk::DescriptorSet::null(),
            dst_binding: 0,
            dst_array_element: 0,
            descriptor_type: vk::DescriptorType::UNIFORM_BUFFER,
            buffer_infos: vec![],
            image_infos: vec![],
        };
        let _ = write.to_vk_type();
    }
}
