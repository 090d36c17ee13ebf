use std::mem::offset_of;

use ash::vk;

use bloom_gfx::resources::vertex_layout::GfxVertexLayout;

/// position + uv + color + normal，交错存放
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexPUCN {
    pub pos: glam::Vec3,
    pub uv: glam::Vec2,
    pub color: glam::Vec3,
    pub normal: glam::Vec3,
}

impl GfxVertexLayout for VertexPUCN {
    fn vertex_input_bindings() -> Vec<vk::VertexInputBindingDescription> {
        vec![vk::VertexInputBindingDescription {
            binding: 0,
            stride: Self::stride(),
            input_rate: vk::VertexInputRate::VERTEX,
        }]
    }

    fn vertex_input_attributes() -> Vec<vk::VertexInputAttributeDescription> {
        vec![
            vk::VertexInputAttributeDescription {
                location: 0,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: offset_of!(VertexPUCN, pos) as u32,
            },
            vk::VertexInputAttributeDescription {
                location: 1,
                binding: 0,
                format: vk::Format::R32G32_SFLOAT,
                offset: offset_of!(VertexPUCN, uv) as u32,
            },
            vk::VertexInputAttributeDescription {
                location: 2,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: offset_of!(VertexPUCN, color) as u32,
            },
            vk::VertexInputAttributeDescription {
                location: 3,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: offset_of!(VertexPUCN, normal) as u32,
            },
        ]
    }

    #[inline]
    fn stride() -> u32 {
        size_of::<VertexPUCN>() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_offsets() {
        let attributes = VertexPUCN::vertex_input_attributes();
        let offsets: Vec<u32> = attributes.iter().map(|a| a.offset).collect();
        let locations: Vec<u32> = attributes.iter().map(|a| a.location).collect();
        assert_eq!(offsets, vec![0, 12, 20, 32]);
        assert_eq!(locations, vec![0, 1, 2, 3]);
        assert_eq!(VertexPUCN::stride(), 44);
        assert_eq!(VertexPUCN::vertex_input_bindings()[0].stride, 44);
    }
}
