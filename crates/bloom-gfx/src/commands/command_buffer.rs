use ash::vk;
use itertools::Itertools;

use crate::{
    basic::color::LabelColor,
    commands::{barrier::GfxImageBarrier, command_pool::GfxCommandPool},
    foundation::debug_messenger::DebugType,
    gfx::Gfx,
    resources::buffer::GfxBuffer,
};

/// 对 vk::CommandBuffer 的薄封装
///
/// 只提供传统 render pass 流程所需的命令：
/// ```ignore
/// let cmd = GfxCommandBuffer::new(&pool, "scene");
/// cmd.begin(vk::CommandBufferUsageFlags::empty(), "scene");
/// cmd.cmd_begin_render_pass(&begin_info, vk::SubpassContents::INLINE);
/// // ...
/// cmd.cmd_end_render_pass();
/// cmd.end();
/// ```
#[derive(Clone)]
pub struct GfxCommandBuffer {
    vk_handle: vk::CommandBuffer,
    _command_pool_handle: vk::CommandPool,

    #[cfg(debug_assertions)]
    _name: String,
}
// 创建
impl GfxCommandBuffer {
    pub fn new(command_pool: &GfxCommandPool, debug_name: &str) -> Self {
        let info = vk::CommandBufferAllocateInfo::default()
            .command_pool(command_pool.handle())
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let command_buffer = unsafe { Gfx::get().gfx_device().allocate_command_buffers(&info).unwrap()[0] };
        let cmd_buffer = GfxCommandBuffer {
            vk_handle: command_buffer,
            _command_pool_handle: command_pool.handle(),

            #[cfg(debug_assertions)]
            _name: debug_name.to_string(),
        };
        Gfx::get().gfx_device().set_debug_name(&cmd_buffer, debug_name);
        cmd_buffer
    }
}
// 录制
impl GfxCommandBuffer {
    /// 开始录制，同时开启 debug label
    #[inline]
    pub fn begin(&self, usage_flag: vk::CommandBufferUsageFlags, debug_label_name: &str) {
        unsafe {
            Gfx::get()
                .gfx_device()
                .begin_command_buffer(self.vk_handle, &vk::CommandBufferBeginInfo::default().flags(usage_flag))
                .unwrap();
        }
        self.begin_label(debug_label_name, LabelColor::COLOR_CMD);
    }

    /// 结束 debug label，结束录制
    #[inline]
    pub fn end(&self) {
        self.end_label();
        unsafe { Gfx::get().gfx_device().end_command_buffer(self.vk_handle).unwrap() }
    }

    /// 丢弃已经录制的内容，回到 initial 状态
    ///
    /// 要求 command pool 带有 RESET_COMMAND_BUFFER
    #[inline]
    pub fn reset(&self) {
        unsafe {
            Gfx::get()
                .gfx_device()
                .reset_command_buffer(self.vk_handle, vk::CommandBufferResetFlags::empty())
                .unwrap();
        }
    }
}
// getters
impl GfxCommandBuffer {
    #[inline]
    pub fn vk_handle(&self) -> vk::CommandBuffer {
        self.vk_handle
    }
}
// 数据传输
impl GfxCommandBuffer {
    /// - command type: action
    /// - 支持的 queue：transfer，graphics，compute
    #[inline]
    pub fn cmd_copy_buffer(&self, src: &GfxBuffer, dst: &GfxBuffer, regions: &[vk::BufferCopy]) {
        unsafe {
            Gfx::get().gfx_device().cmd_copy_buffer(self.vk_handle, src.vk_buffer(), dst.vk_buffer(), regions);
        }
    }

    /// - command type: action
    /// - 支持的 queue：transfer，graphics，compute
    #[inline]
    pub fn cmd_copy_buffer_to_image(&self, copy_info: &vk::CopyBufferToImageInfo2) {
        unsafe { Gfx::get().gfx_device().cmd_copy_buffer_to_image2(self.vk_handle, copy_info) }
    }
}
// render pass 以及绘制
impl GfxCommandBuffer {
    /// - command type: action, state
    /// - supported queue types: graphics
    #[inline]
    pub fn cmd_begin_render_pass(&self, begin_info: &vk::RenderPassBeginInfo, contents: vk::SubpassContents) {
        unsafe {
            Gfx::get().gfx_device().cmd_begin_render_pass(self.vk_handle, begin_info, contents);
        }
        self.begin_label("render-pass", LabelColor::COLOR_PASS);
    }

    /// - command type: action, state
    /// - supported queue types: graphics
    #[inline]
    pub fn cmd_end_render_pass(&self) {
        self.end_label();
        unsafe {
            Gfx::get().gfx_device().cmd_end_render_pass(self.vk_handle);
        }
    }

    /// - command type: action
    /// - supported queue types: graphics
    #[inline]
    pub fn cmd_draw_indexed(&self, index_cnt: u32, instance_cnt: u32, first_index: u32, vertex_offset: i32) {
        unsafe {
            Gfx::get().gfx_device().cmd_draw_indexed(
                self.vk_handle,
                index_cnt,
                instance_cnt,
                first_index,
                vertex_offset,
                0,
            );
        }
    }

    /// - command type: state
    /// - supported queue types: graphics, compute
    #[inline]
    pub fn cmd_bind_descriptor_sets(
        &self,
        bind_point: vk::PipelineBindPoint,
        pipeline_layout: vk::PipelineLayout,
        first_set: u32,
        descriptor_sets: &[vk::DescriptorSet],
    ) {
        unsafe {
            Gfx::get().gfx_device().cmd_bind_descriptor_sets(
                self.vk_handle,
                bind_point,
                pipeline_layout,
                first_set,
                descriptor_sets,
                &[],
            );
        }
    }

    /// - command type: state
    /// - supported queue types: graphics, compute
    #[inline]
    pub fn cmd_bind_pipeline(&self, bind_point: vk::PipelineBindPoint, pipeline: vk::Pipeline) {
        unsafe {
            Gfx::get().gfx_device().cmd_bind_pipeline(self.vk_handle, bind_point, pipeline);
        }
    }

    /// - command type: state
    /// - supported queue types: graphics
    #[inline]
    pub fn cmd_bind_vertex_buffers(&self, first_bind: u32, buffers: &[vk::Buffer], offsets: &[vk::DeviceSize]) {
        unsafe {
            Gfx::get().gfx_device().cmd_bind_vertex_buffers(self.vk_handle, first_bind, buffers, offsets);
        }
    }

    /// - command type: state
    /// - supported queue types: graphics
    #[inline]
    pub fn cmd_bind_index_buffer(&self, buffer: vk::Buffer, offset: vk::DeviceSize, index_type: vk::IndexType) {
        unsafe {
            Gfx::get().gfx_device().cmd_bind_index_buffer(self.vk_handle, buffer, offset, index_type);
        }
    }

    /// - command type: state
    /// - supported queue types: graphics
    #[inline]
    pub fn cmd_set_viewport(&self, first_viewport: u32, viewports: &[vk::Viewport]) {
        unsafe {
            Gfx::get().gfx_device().cmd_set_viewport(self.vk_handle, first_viewport, viewports);
        }
    }

    /// - command type: state
    /// - supported queue types: graphics
    #[inline]
    pub fn cmd_set_scissor(&self, first_scissor: u32, scissors: &[vk::Rect2D]) {
        unsafe {
            Gfx::get().gfx_device().cmd_set_scissor(self.vk_handle, first_scissor, scissors);
        }
    }
}
// 同步
impl GfxCommandBuffer {
    /// 不能在 render pass 内部调用（subpass 没有 self-dependency）
    ///
    /// - command type: synchronize
    /// - supported queue types: graphics, compute, transfer
    #[inline]
    pub fn image_memory_barrier(&self, dependency_flags: vk::DependencyFlags, barriers: &[GfxImageBarrier]) {
        let barriers = barriers.iter().map(|b| *b.inner()).collect_vec();
        let dependency_info =
            vk::DependencyInfo::default().image_memory_barriers(&barriers).dependency_flags(dependency_flags);
        unsafe {
            Gfx::get().gfx_device().cmd_pipeline_barrier2(self.vk_handle, &dependency_info);
        }
    }
}
// debug label
impl GfxCommandBuffer {
    #[inline]
    pub fn begin_label(&self, label_name: &str, label_color: glam::Vec4) {
        let name = std::ffi::CString::new(label_name).unwrap();
        unsafe {
            Gfx::get().gfx_device().debug_utils().cmd_begin_debug_utils_label(
                self.vk_handle,
                &vk::DebugUtilsLabelEXT::default().label_name(name.as_c_str()).color(label_color.into()),
            );
        }
    }

    #[inline]
    pub fn end_label(&self) {
        unsafe {
            Gfx::get().gfx_device().debug_utils().cmd_end_debug_utils_label(self.vk_handle);
        }
    }
}
impl DebugType for GfxCommandBuffer {
    fn debug_type_name() -> &'static str {
        "GfxCommandBuffer"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.vk_handle
    }
}
