use std::{ffi::CStr, path::Path, rc::Rc};

use ash::vk;
use itertools::Itertools;

use crate::{
    foundation::debug_messenger::DebugType,
    gfx::Gfx,
    pipelines::shader::{GfxShaderModuleCache, GfxShaderStageInfo},
};

/// # Destroy
/// 在 Drop 中释放
pub struct GfxPipelineLayout {
    handle: vk::PipelineLayout,
}
impl GfxPipelineLayout {
    pub fn new(
        descriptor_set_layouts: &[vk::DescriptorSetLayout],
        push_constant_ranges: &[vk::PushConstantRange],
        debug_name: impl AsRef<str>,
    ) -> Self {
        let pipeline_layout_ci = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(descriptor_set_layouts)
            .push_constant_ranges(push_constant_ranges);
        let gfx_device = Gfx::get().gfx_device();
        let handle = unsafe { gfx_device.create_pipeline_layout(&pipeline_layout_ci, None).unwrap() };
        let layout = Self { handle };
        gfx_device.set_debug_name(&layout, debug_name);
        layout
    }

    #[inline]
    pub fn handle(&self) -> vk::PipelineLayout {
        self.handle
    }
}
impl Drop for GfxPipelineLayout {
    fn drop(&mut self) {
        unsafe {
            Gfx::get().gfx_device().destroy_pipeline_layout(self.handle, None);
        }
    }
}
impl DebugType for GfxPipelineLayout {
    fn debug_type_name() -> &'static str {
        "GfxPipelineLayout"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}

/// # Destroy
/// 在 Drop 中释放
pub struct GfxGraphicsPipeline {
    pipeline: vk::Pipeline,

    /// 多个 pipeline 共享同一个 layout
    pipeline_layout: Rc<GfxPipelineLayout>,
}
impl GfxGraphicsPipeline {
    /// shader module 从 cache 中加载，pipeline 创建完成后 cache 可以销毁
    pub fn new(
        create_info: &GfxGraphicsPipelineCreateInfo,
        pipeline_layout: Rc<GfxPipelineLayout>,
        shader_cache: &mut GfxShaderModuleCache,
        debug_name: &str,
    ) -> anyhow::Result<Self> {
        let _span = tracy_client::span!("GfxGraphicsPipeline::new");
        assert_ne!(create_info.render_pass, vk::RenderPass::null(), "pipeline {} has no render pass", debug_name);

        let mut modules = Vec::with_capacity(create_info.shader_stages.len());
        for stage in &create_info.shader_stages {
            modules.push(shader_cache.get_or_load(&stage.path)?.handle());
        }
        let shader_stages_info = create_info
            .shader_stages
            .iter()
            .zip(modules)
            .map(|(stage, module)| {
                vk::PipelineShaderStageCreateInfo::default().stage(stage.stage).module(module).name(stage.entry_point)
            })
            .collect_vec();

        let vertex_input_state_info = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&create_info.vertex_binding_desc)
            .vertex_attribute_descriptions(&create_info.vertex_attribute_desc);

        let input_assembly_info = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(create_info.primitive_topology)
            .primitive_restart_enable(false);

        // viewport 和 scissor 的值是动态的，数量在这里确定
        let viewport_info = vk::PipelineViewportStateCreateInfo::default().viewport_count(1).scissor_count(1);

        let msaa_info =
            vk::PipelineMultisampleStateCreateInfo::default().rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let color_blend_info = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&create_info.color_attach_blend_states);

        let dynamic_state_info =
            vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&create_info.dynamic_states);

        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages_info)
            .vertex_input_state(&vertex_input_state_info)
            .input_assembly_state(&input_assembly_info)
            .viewport_state(&viewport_info)
            .rasterization_state(&create_info.rasterize_state_info)
            .multisample_state(&msaa_info)
            .color_blend_state(&color_blend_info)
            .depth_stencil_state(&create_info.depth_stencil_info)
            .layout(pipeline_layout.handle())
            .dynamic_state(&dynamic_state_info)
            .render_pass(create_info.render_pass)
            .subpass(create_info.subpass);

        let gfx_device = Gfx::get().gfx_device();
        let pipeline = unsafe {
            gfx_device
                .create_graphics_pipelines(vk::PipelineCache::null(), std::slice::from_ref(&pipeline_info), None)
                .map_err(|(_, e)| e)
                .unwrap()[0]
        };
        let pipeline = Self {
            pipeline,
            pipeline_layout,
        };
        gfx_device.set_debug_name(&pipeline, debug_name);
        Ok(pipeline)
    }

    #[inline]
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    #[inline]
    pub fn layout(&self) -> vk::PipelineLayout {
        self.pipeline_layout.handle()
    }
}
impl Drop for GfxGraphicsPipeline {
    fn drop(&mut self) {
        unsafe {
            Gfx::get().gfx_device().destroy_pipeline(self.pipeline, None);
        }
    }
}
impl DebugType for GfxGraphicsPipeline {
    fn debug_type_name() -> &'static str {
        "GfxGraphicsPipeline"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.pipeline
    }
}

/// 图形管线的固定功能状态
///
/// 默认值：triangle list，不剔除，CCW 为正面，depth test LESS_OR_EQUAL 且写入深度，
/// viewport 和 scissor 为动态状态
#[derive(Clone)]
pub struct GfxGraphicsPipelineCreateInfo {
    pub render_pass: vk::RenderPass,
    pub subpass: u32,

    pub shader_stages: Vec<GfxShaderStageInfo>,

    pub vertex_binding_desc: Vec<vk::VertexInputBindingDescription>,
    pub vertex_attribute_desc: Vec<vk::VertexInputAttributeDescription>,

    pub primitive_topology: vk::PrimitiveTopology,
    pub rasterize_state_info: vk::PipelineRasterizationStateCreateInfo<'static>,

    /// 每个 color attachment 一个
    pub color_attach_blend_states: Vec<vk::PipelineColorBlendAttachmentState>,

    pub depth_stencil_info: vk::PipelineDepthStencilStateCreateInfo<'static>,
    pub dynamic_states: Vec<vk::DynamicState>,
}
impl Default for GfxGraphicsPipelineCreateInfo {
    fn default() -> Self {
        Self {
            render_pass: vk::RenderPass::null(),
            subpass: 0,

            shader_stages: vec![],

            vertex_binding_desc: vec![],
            vertex_attribute_desc: vec![],

            primitive_topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            rasterize_state_info: vk::PipelineRasterizationStateCreateInfo::default()
                .depth_clamp_enable(false)
                .rasterizer_discard_enable(false)
                .polygon_mode(vk::PolygonMode::FILL)
                .line_width(1.0)
                .cull_mode(vk::CullModeFlags::NONE)
                .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
                .depth_bias_enable(false),

            color_attach_blend_states: vec![
                vk::PipelineColorBlendAttachmentState::default()
                    .blend_enable(false)
                    .color_write_mask(vk::ColorComponentFlags::RGBA),
            ],

            depth_stencil_info: vk::PipelineDepthStencilStateCreateInfo::default()
                .depth_test_enable(true)
                .depth_write_enable(true)
                .depth_compare_op(vk::CompareOp::LESS_OR_EQUAL)
                .depth_bounds_test_enable(false)
                .stencil_test_enable(false),
            dynamic_states: vec![vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR],
        }
    }
}
// builder
impl GfxGraphicsPipelineCreateInfo {
    #[inline]
    pub fn render_pass(&mut self, render_pass: vk::RenderPass, subpass: u32) -> &mut Self {
        self.render_pass = render_pass;
        self.subpass = subpass;
        self
    }

    #[inline]
    pub fn vertex_shader_stage(&mut self, path: &Path, entry_point: &'static CStr) -> &mut Self {
        self.shader_stages.push(GfxShaderStageInfo {
            stage: vk::ShaderStageFlags::VERTEX,
            entry_point,
            path: path.to_path_buf(),
        });
        self
    }

    #[inline]
    pub fn fragment_shader_stage(&mut self, path: &Path, entry_point: &'static CStr) -> &mut Self {
        self.shader_stages.push(GfxShaderStageInfo {
            stage: vk::ShaderStageFlags::FRAGMENT,
            entry_point,
            path: path.to_path_buf(),
        });
        self
    }

    #[inline]
    pub fn vertex_binding(&mut self, bindings: Vec<vk::VertexInputBindingDescription>) -> &mut Self {
        self.vertex_binding_desc = bindings;
        self
    }

    #[inline]
    pub fn vertex_attribute(&mut self, attributes: Vec<vk::VertexInputAttributeDescription>) -> &mut Self {
        self.vertex_attribute_desc = attributes;
        self
    }

    #[inline]
    pub fn color_blend(&mut self, states: Vec<vk::PipelineColorBlendAttachmentState>) -> &mut Self {
        self.color_attach_blend_states = states;
        self
    }

    #[inline]
    pub fn cull_mode(&mut self, mode: vk::CullModeFlags, front_face: vk::FrontFace) -> &mut Self {
        self.rasterize_state_info.cull_mode = mode;
        self.rasterize_state_info.front_face = front_face;
        self
    }

    #[inline]
    pub fn depth_test(&mut self, depth_test_op: Option<vk::CompareOp>, depth_write: bool) -> &mut Self {
        self.depth_stencil_info.depth_test_enable = depth_test_op.map_or(vk::FALSE, |_| vk::TRUE);
        self.depth_stencil_info.depth_compare_op = depth_test_op.unwrap_or(vk::CompareOp::NEVER);
        self.depth_stencil_info.depth_write_enable = if depth_write { vk::TRUE } else { vk::FALSE };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let ci = GfxGraphicsPipelineCreateInfo::default();
        assert_eq!(ci.primitive_topology, vk::PrimitiveTopology::TRIANGLE_LIST);
        assert_eq!(ci.rasterize_state_info.cull_mode, vk::CullModeFlags::NONE);
        assert_eq!(ci.rasterize_state_info.front_face, vk::FrontFace::COUNTER_CLOCKWISE);
        assert_eq!(ci.depth_stencil_info.depth_compare_op, vk::CompareOp::LESS_OR_EQUAL);
        assert_eq!(ci.dynamic_states, vec![vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR]);
    }

    #[test]
    fn test_depth_test_builder() {
        let mut ci = GfxGraphicsPipelineCreateInfo::default();
        ci.depth_test(Some(vk::CompareOp::LESS_OR_EQUAL), false);
        assert_eq!(ci.depth_stencil_info.depth_test_enable, vk::TRUE);
        assert_eq!(ci.depth_stencil_info.depth_write_enable, vk::FALSE);

        ci.depth_test(None, false);
        assert_eq!(ci.depth_stencil_info.depth_test_enable, vk::FALSE);
    }

    #[test]
    fn test_shader_stage_builder_appends() {
        let mut ci = GfxGraphicsPipelineCreateInfo::default();
        ci.vertex_shader_stage(Path::new("a.vert.spv"), c"main").fragment_shader_stage(Path::new("a.frag.spv"), c"main");
        assert_eq!(ci.shader_stages.len(), 2);
        assert_eq!(ci.shader_stages[0].stage, vk::ShaderStageFlags::VERTEX);
        assert_eq!(ci.shader_stages[1].stage, vk::ShaderStageFlags::FRAGMENT);
        assert_eq!(ci.shader_stages[1].path, Path::new("a.frag.spv"));
    }
}
