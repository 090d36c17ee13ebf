use ash::vk;

use bloom_gfx::{
    descriptors::{
        binding_layout::{GfxBindingItem, GfxBindingLayout},
        descriptor::{GfxDescriptorSet, GfxDescriptorSetLayout},
        descriptor_pool::{GfxDescriptorPool, GfxDescriptorPoolCreateInfo},
        descriptor_write::GfxWriteDescriptorSet,
    },
    gfx::Gfx,
};

/// 四个 descriptor set 共用的 layout
///
/// - 0: 顶点着色器的矩阵
/// - 1: 片元着色器采样的纹理
/// - 2: 片元着色器的 blur 参数
pub struct BloomBindingLayout;

impl BloomBindingLayout {
    pub const VERTEX_UBO: GfxBindingItem = GfxBindingItem {
        name: "ubo",
        binding: 0,
        descriptor_type: vk::DescriptorType::UNIFORM_BUFFER,
        stage_flags: vk::ShaderStageFlags::VERTEX,
        count: 1,
    };
    pub const SAMPLER: GfxBindingItem = GfxBindingItem {
        name: "samplerColor",
        binding: 1,
        descriptor_type: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
        stage_flags: vk::ShaderStageFlags::FRAGMENT,
        count: 1,
    };
    pub const FRAGMENT_UBO: GfxBindingItem = GfxBindingItem {
        name: "uboBlur",
        binding: 2,
        descriptor_type: vk::DescriptorType::UNIFORM_BUFFER,
        stage_flags: vk::ShaderStageFlags::FRAGMENT,
        count: 1,
    };
}

impl GfxBindingLayout for BloomBindingLayout {
    fn bindings() -> Vec<GfxBindingItem> {
        vec![Self::VERTEX_UBO, Self::SAMPLER, Self::FRAGMENT_UBO]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorRole {
    /// UFO 的透视矩阵
    Scene,
    /// 读取 A，写入 B
    VerticalBlur,
    /// 读取 B，叠加到屏幕
    HorizontalBlur,
    SkyBox,
}

impl DescriptorRole {
    pub const ALL: [Self; 4] = [Self::Scene, Self::VerticalBlur, Self::HorizontalBlur, Self::SkyBox];

    pub fn debug_name(self) -> &'static str {
        match self {
            Self::Scene => "scene",
            Self::VerticalBlur => "vertical-blur",
            Self::HorizontalBlur => "horizontal-blur",
            Self::SkyBox => "skybox",
        }
    }
}

/// 一个 set 需要写入的资源，未使用的 binding 为 None
#[derive(Debug, Clone, Copy)]
pub struct DescriptorSources {
    pub vertex_ubo: vk::DescriptorBufferInfo,
    pub sampler: Option<vk::DescriptorImageInfo>,
    pub fragment_ubo: Option<vk::DescriptorBufferInfo>,
}

impl DescriptorSources {
    pub fn writes(&self, dst_set: vk::DescriptorSet) -> Vec<GfxWriteDescriptorSet> {
        let mut writes = vec![BloomBindingLayout::VERTEX_UBO.write_buffer(dst_set, vec![self.vertex_ubo])];
        if let Some(image) = self.sampler {
            writes.push(BloomBindingLayout::SAMPLER.write_image(dst_set, vec![image]));
        }
        if let Some(buffer) = self.fragment_ubo {
            writes.push(BloomBindingLayout::FRAGMENT_UBO.write_buffer(dst_set, vec![buffer]));
        }
        writes
    }
}

/// 8 个 uniform buffer，6 个 sampler，最多 5 个 set
pub fn pool_create_info() -> GfxDescriptorPoolCreateInfo {
    GfxDescriptorPoolCreateInfo::new(
        vk::DescriptorPoolCreateFlags::empty(),
        5,
        vec![
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER,
                descriptor_count: 8,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                descriptor_count: 6,
            },
        ],
    )
}

/// pool 能否为 `roles` 中的每个 set 分配 layout 的全部 binding
pub fn pool_covers(info: &GfxDescriptorPoolCreateInfo, roles: &[DescriptorRole]) -> bool {
    let set_count = roles.len() as u32;
    let bindings = BloomBindingLayout::bindings();
    set_count <= info.max_sets
        && bindings.iter().all(|item| {
            let per_set: u32 =
                bindings.iter().filter(|b| b.descriptor_type == item.descriptor_type).map(|b| b.count).sum();
            per_set * set_count <= info.capacity_of(item.descriptor_type)
        })
}

/// # Destroy
/// 在 Drop 中释放，先 pool 后 layout
pub struct BloomDescriptors {
    scene: GfxDescriptorSet<BloomBindingLayout>,
    vertical_blur: GfxDescriptorSet<BloomBindingLayout>,
    horizontal_blur: GfxDescriptorSet<BloomBindingLayout>,
    skybox: GfxDescriptorSet<BloomBindingLayout>,

    pool: GfxDescriptorPool,
    layout: GfxDescriptorSetLayout<BloomBindingLayout>,
}

impl BloomDescriptors {
    /// `sources` 决定每个 set 写入什么
    pub fn new(sources: impl Fn(DescriptorRole) -> DescriptorSources) -> Self {
        let _span = tracy_client::span!("BloomDescriptors::new");
        let layout = GfxDescriptorSetLayout::<BloomBindingLayout>::new("bloom");
        let pool_info = pool_create_info();
        debug_assert!(pool_covers(&pool_info, &DescriptorRole::ALL));
        let pool = GfxDescriptorPool::new(pool_info, "bloom");

        let alloc = |role: DescriptorRole| {
            let set = GfxDescriptorSet::new(&pool, &layout, role.debug_name());
            Gfx::get().gfx_device().write_descriptor_sets(&sources(role).writes(set.handle()));
            set
        };

        Self {
            scene: alloc(DescriptorRole::Scene),
            vertical_blur: alloc(DescriptorRole::VerticalBlur),
            horizontal_blur: alloc(DescriptorRole::HorizontalBlur),
            skybox: alloc(DescriptorRole::SkyBox),
            pool,
            layout,
        }
    }

    pub fn set(&self, role: DescriptorRole) -> vk::DescriptorSet {
        match role {
            DescriptorRole::Scene => self.scene.handle(),
            DescriptorRole::VerticalBlur => self.vertical_blur.handle(),
            DescriptorRole::HorizontalBlur => self.horizontal_blur.handle(),
            DescriptorRole::SkyBox => self.skybox.handle(),
        }
    }

    #[inline]
    pub fn layout(&self) -> vk::DescriptorSetLayout {
        self.layout.handle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    fn buffer_info(raw: u64) -> vk::DescriptorBufferInfo {
        vk::DescriptorBufferInfo {
            buffer: vk::Buffer::from_raw(raw),
            offset: 0,
            range: vk::WHOLE_SIZE,
        }
    }

    #[test]
    fn test_binding_indices() {
        let bindings = BloomBindingLayout::vk_bindings();
        assert_eq!(bindings.len(), 3);
        assert_eq!(bindings[0].binding, 0);
        assert_eq!(bindings[0].descriptor_type, vk::DescriptorType::UNIFORM_BUFFER);
        assert_eq!(bindings[0].stage_flags, vk::ShaderStageFlags::VERTEX);
        assert_eq!(bindings[1].binding, 1);
        assert_eq!(bindings[1].descriptor_type, vk::DescriptorType::COMBINED_IMAGE_SAMPLER);
        assert_eq!(bindings[1].stage_flags, vk::ShaderStageFlags::FRAGMENT);
        assert_eq!(bindings[2].binding, 2);
        assert_eq!(bindings[2].descriptor_type, vk::DescriptorType::UNIFORM_BUFFER);
        assert_eq!(bindings[2].stage_flags, vk::ShaderStageFlags::FRAGMENT);
    }

    #[test]
    fn test_pool_capacity() {
        let info = pool_create_info();
        assert_eq!(info.max_sets, 5);
        assert_eq!(info.capacity_of(vk::DescriptorType::UNIFORM_BUFFER), 8);
        assert_eq!(info.capacity_of(vk::DescriptorType::COMBINED_IMAGE_SAMPLER), 6);
    }

    #[test]
    fn test_pool_covers_all_sets() {
        assert!(pool_covers(&pool_create_info(), &DescriptorRole::ALL));
    }

    #[test]
    fn test_pool_too_small_for_uniform_buffers() {
        let mut info = pool_create_info();
        // 每个 set 两个 uniform buffer，四个 set 需要 8 个
        info.pool_sizes[0].descriptor_count = 7;
        assert!(!pool_covers(&info, &DescriptorRole::ALL));
        assert!(pool_covers(&info, &DescriptorRole::ALL[..3]));

        let mut info = pool_create_info();
        info.max_sets = 3;
        assert!(!pool_covers(&info, &DescriptorRole::ALL));
    }

    #[test]
    fn test_scene_set_writes_only_vertex_ubo() {
        let sources = DescriptorSources {
            vertex_ubo: buffer_info(1),
            sampler: None,
            fragment_ubo: None,
        };
        let writes = sources.writes(vk::DescriptorSet::from_raw(9));
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].dst_binding, 0);
        assert_eq!(writes[0].dst_set, vk::DescriptorSet::from_raw(9));
    }

    #[test]
    fn test_blur_set_writes_all_bindings() {
        let image = vk::DescriptorImageInfo {
            sampler: vk::Sampler::from_raw(3),
            image_view: vk::ImageView::from_raw(4),
            image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        };
        let sources = DescriptorSources {
            vertex_ubo: buffer_info(1),
            sampler: Some(image),
            fragment_ubo: Some(buffer_info(2)),
        };
        let writes = sources.writes(vk::DescriptorSet::from_raw(9));
        let bindings: Vec<u32> = writes.iter().map(|w| w.dst_binding).collect();
        assert_eq!(bindings, vec![0, 1, 2]);
        assert_eq!(writes[1].image_infos[0].image_view, vk::ImageView::from_raw(4));
        assert_eq!(writes[2].buffer_infos[0].buffer, vk::Buffer::from_raw(2));
        assert_eq!(writes[2].descriptor_type, vk::DescriptorType::UNIFORM_BUFFER);
    }
}
