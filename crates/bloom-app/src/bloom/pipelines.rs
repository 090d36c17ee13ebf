use std::{path::PathBuf, rc::Rc};

use ash::vk;

use bloom_gfx::{
    pipelines::{
        graphics_pipeline::{GfxGraphicsPipeline, GfxGraphicsPipelineCreateInfo, GfxPipelineLayout},
        shader::GfxShaderModuleCache,
    },
    resources::vertex_layout::GfxVertexLayout,
};

use crate::{config::AssetsConfig, scene::vertex::VertexPUCN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BloomPipelineKind {
    /// 纵向和横向共用，方向由 UBO 决定
    Blur,
    ColorPass,
    PhongPass,
    SkyBox,
}

impl BloomPipelineKind {
    /// 着色器文件名，不含 stage 后缀
    pub fn shader_name(self) -> &'static str {
        match self {
            Self::Blur => "gaussblur",
            Self::ColorPass => "colorpass",
            Self::PhongPass => "phongpass",
            Self::SkyBox => "skybox",
        }
    }
}

/// 一条 pipeline 的完整描述，每条 pipeline 独立构造，互不共享可变状态
#[derive(Debug, Clone, PartialEq)]
pub struct BloomPipelineDesc {
    pub kind: BloomPipelineKind,
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    /// 叠加到已有颜色上
    pub additive_blend: bool,
    pub depth_write: bool,
}

impl BloomPipelineDesc {
    /// 只有 blur 使用加法混合，只有 phong pass 写入深度
    pub fn new(kind: BloomPipelineKind, assets: &AssetsConfig) -> Self {
        let name = kind.shader_name();
        Self {
            kind,
            vertex_shader: assets.shader_path(&format!("{name}.vert")),
            fragment_shader: assets.shader_path(&format!("{name}.frag")),
            additive_blend: kind == BloomPipelineKind::Blur,
            depth_write: kind == BloomPipelineKind::PhongPass,
        }
    }

    /// color: ONE + ONE；alpha: SRC_ALPHA + DST_ALPHA
    pub fn additive_blend_state() -> vk::PipelineColorBlendAttachmentState {
        vk::PipelineColorBlendAttachmentState::default()
            .blend_enable(true)
            .color_blend_op(vk::BlendOp::ADD)
            .src_color_blend_factor(vk::BlendFactor::ONE)
            .dst_color_blend_factor(vk::BlendFactor::ONE)
            .alpha_blend_op(vk::BlendOp::ADD)
            .src_alpha_blend_factor(vk::BlendFactor::SRC_ALPHA)
            .dst_alpha_blend_factor(vk::BlendFactor::DST_ALPHA)
            .color_write_mask(vk::ColorComponentFlags::RGBA)
    }

    pub fn opaque_blend_state() -> vk::PipelineColorBlendAttachmentState {
        vk::PipelineColorBlendAttachmentState::default()
            .blend_enable(false)
            .color_write_mask(vk::ColorComponentFlags::RGBA)
    }

    /// 每次都从默认值开始构造
    pub fn create_info(&self, render_pass: vk::RenderPass) -> GfxGraphicsPipelineCreateInfo {
        let blend_state =
            if self.additive_blend { Self::additive_blend_state() } else { Self::opaque_blend_state() };

        let mut ci = GfxGraphicsPipelineCreateInfo::default();
        ci.render_pass(render_pass, 0)
            .vertex_shader_stage(&self.vertex_shader, c"main")
            .fragment_shader_stage(&self.fragment_shader, c"main")
            .vertex_binding(VertexPUCN::vertex_input_bindings())
            .vertex_attribute(VertexPUCN::vertex_input_attributes())
            .cull_mode(vk::CullModeFlags::NONE, vk::FrontFace::COUNTER_CLOCKWISE)
            .depth_test(Some(vk::CompareOp::LESS_OR_EQUAL), self.depth_write)
            .color_blend(vec![blend_state]);
        ci
    }
}

/// 四条 pipeline 共用一个 layout
///
/// # Destroy
/// 在 Drop 中释放，先 pipeline 后 layout
pub struct BloomPipelines {
    blur: GfxGraphicsPipeline,
    color_pass: GfxGraphicsPipeline,
    phong_pass: GfxGraphicsPipeline,
    skybox: GfxGraphicsPipeline,

    layout: Rc<GfxPipelineLayout>,
}

impl BloomPipelines {
    /// 离屏和主 render pass 兼容，pipeline 只需要针对主 render pass 创建一次
    pub fn new(
        render_pass: vk::RenderPass,
        descriptor_set_layout: vk::DescriptorSetLayout,
        assets: &AssetsConfig,
    ) -> anyhow::Result<Self> {
        let _span = tracy_client::span!("BloomPipelines::new");
        let layout = Rc::new(GfxPipelineLayout::new(&[descriptor_set_layout], &[], "bloom"));

        let mut shader_cache = GfxShaderModuleCache::new();
        let mut create = |kind: BloomPipelineKind| {
            let desc = BloomPipelineDesc::new(kind, assets);
            GfxGraphicsPipeline::new(
                &desc.create_info(render_pass),
                layout.clone(),
                &mut shader_cache,
                kind.shader_name(),
            )
        };
        let pipelines = (|| {
            Ok::<_, anyhow::Error>((
                create(BloomPipelineKind::Blur)?,
                create(BloomPipelineKind::ColorPass)?,
                create(BloomPipelineKind::PhongPass)?,
                create(BloomPipelineKind::SkyBox)?,
            ))
        })();
        // 无论成功与否，shader module 都不再需要
        shader_cache.destroy();
        let (blur, color_pass, phong_pass, skybox) = pipelines?;

        Ok(Self {
            blur,
            color_pass,
            phong_pass,
            skybox,
            layout,
        })
    }

    pub fn get(&self, kind: BloomPipelineKind) -> &GfxGraphicsPipeline {
        match kind {
            BloomPipelineKind::Blur => &self.blur,
            BloomPipelineKind::ColorPass => &self.color_pass,
            BloomPipelineKind::PhongPass => &self.phong_pass,
            BloomPipelineKind::SkyBox => &self.skybox,
        }
    }

    #[inline]
    pub fn layout(&self) -> vk::PipelineLayout {
        self.layout.handle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [BloomPipelineKind; 4] = [
        BloomPipelineKind::Blur,
        BloomPipelineKind::ColorPass,
        BloomPipelineKind::PhongPass,
        BloomPipelineKind::SkyBox,
    ];

    fn desc(kind: BloomPipelineKind) -> BloomPipelineDesc {
        BloomPipelineDesc::new(kind, &AssetsConfig::default())
    }

    #[test]
    fn test_only_blur_is_additive() {
        for kind in KINDS {
            assert_eq!(desc(kind).additive_blend, kind == BloomPipelineKind::Blur, "{:?}", kind);
        }
    }

    #[test]
    fn test_only_phong_writes_depth() {
        for kind in KINDS {
            assert_eq!(desc(kind).depth_write, kind == BloomPipelineKind::PhongPass, "{:?}", kind);
        }
    }

    #[test]
    fn test_shader_paths() {
        let blur = desc(BloomPipelineKind::Blur);
        assert!(blur.vertex_shader.ends_with("shaders/bloom/gaussblur.vert.spv"));
        assert!(blur.fragment_shader.ends_with("shaders/bloom/gaussblur.frag.spv"));
        let skybox = desc(BloomPipelineKind::SkyBox);
        assert!(skybox.fragment_shader.ends_with("shaders/bloom/skybox.frag.spv"));
    }

    #[test]
    fn test_create_info_is_independent_per_pipeline() {
        let render_pass = <vk::RenderPass as vk::Handle>::from_raw(1);
        let blur = desc(BloomPipelineKind::Blur).create_info(render_pass);
        let phong = desc(BloomPipelineKind::PhongPass).create_info(render_pass);
        let skybox = desc(BloomPipelineKind::SkyBox).create_info(render_pass);

        assert_eq!(blur.color_attach_blend_states[0].blend_enable, vk::TRUE);
        assert_eq!(blur.color_attach_blend_states[0].src_color_blend_factor, vk::BlendFactor::ONE);
        assert_eq!(blur.color_attach_blend_states[0].dst_alpha_blend_factor, vk::BlendFactor::DST_ALPHA);
        assert_eq!(blur.depth_stencil_info.depth_write_enable, vk::FALSE);

        assert_eq!(phong.color_attach_blend_states[0].blend_enable, vk::FALSE);
        assert_eq!(phong.depth_stencil_info.depth_write_enable, vk::TRUE);
        assert_eq!(skybox.color_attach_blend_states[0].blend_enable, vk::FALSE);
        assert_eq!(skybox.depth_stencil_info.depth_write_enable, vk::FALSE);

        for ci in [&blur, &phong, &skybox] {
            assert_eq!(ci.render_pass, render_pass);
            assert_eq!(ci.depth_stencil_info.depth_compare_op, vk::CompareOp::LESS_OR_EQUAL);
            assert_eq!(ci.rasterize_state_info.cull_mode, vk::CullModeFlags::NONE);
            assert_eq!(ci.shader_stages.len(), 2);
        }
    }
}
