//! 两类 command buffer 的录制顺序
//!
//! 录制逻辑只依赖 [`DrawRecorder`]，既可以写入真正的 command buffer，也可以在测试中记录下来检查。

use ash::vk;

use bloom_gfx::{
    basic::color::LabelColor,
    commands::{barrier::GfxImageBarrier, command_buffer::GfxCommandBuffer},
};

use crate::scene::mesh::MeshBinding;

const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
const CLEAR_DEPTH: f32 = 1.0;

/// 录制需要的全部 pipeline 句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineHandles {
    pub layout: vk::PipelineLayout,
    pub blur: vk::Pipeline,
    pub phong_pass: vk::Pipeline,
    pub skybox: vk::Pipeline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorSetHandles {
    pub scene: vk::DescriptorSet,
    pub vertical_blur: vk::DescriptorSet,
    pub horizontal_blur: vk::DescriptorSet,
    pub skybox: vk::DescriptorSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshHandles {
    pub ufo: MeshBinding,
    pub ufo_glow: MeshBinding,
    pub skybox: MeshBinding,
    pub quad: MeshBinding,
}

/// 离屏部分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffscreenHandles {
    pub render_pass: vk::RenderPass,
    pub framebuffer_a: vk::Framebuffer,
    pub framebuffer_b: vk::Framebuffer,
    pub color_b: vk::Image,
    pub extent: vk::Extent2D,
}

/// 一次录制需要的所有句柄，都不持有所有权
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BloomHandles {
    pub pipelines: PipelineHandles,
    pub sets: DescriptorSetHandles,
    pub meshes: MeshHandles,
    pub offscreen: OffscreenHandles,
}

/// 主 render pass 中的一个 framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnscreenTarget {
    pub render_pass: vk::RenderPass,
    pub framebuffer: vk::Framebuffer,
    pub extent: vk::Extent2D,
}

pub trait DrawRecorder {
    fn begin_label(&mut self, name: &str);
    fn end_label(&mut self);

    /// 清除为黑色，深度为 1
    fn begin_render_pass(&mut self, render_pass: vk::RenderPass, framebuffer: vk::Framebuffer, extent: vk::Extent2D);
    fn end_render_pass(&mut self);

    /// 覆盖整个 extent
    fn set_viewport_scissor(&mut self, extent: vk::Extent2D);

    fn bind_descriptor_set(&mut self, layout: vk::PipelineLayout, set: vk::DescriptorSet);
    fn bind_pipeline(&mut self, pipeline: vk::Pipeline);
    fn draw_mesh(&mut self, mesh: &MeshBinding);

    fn image_barrier(&mut self, barrier: GfxImageBarrier);
}

/// B 在离屏 pass 中的 color 写入，对主 pass 的 fragment shader 可见
///
/// render pass 的 final layout 已经是 SHADER_READ_ONLY，layout 不变，只负责可见性
pub fn offscreen_read_barrier(image: vk::Image) -> GfxImageBarrier {
    GfxImageBarrier::new()
        .image(image)
        .image_aspect_flag(vk::ImageAspectFlags::COLOR)
        .layout_transfer(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
        .src_mask(vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT, vk::AccessFlags2::COLOR_ATTACHMENT_WRITE)
        .dst_mask(vk::PipelineStageFlags2::FRAGMENT_SHADER, vk::AccessFlags2::SHADER_READ)
}

impl DrawRecorder for GfxCommandBuffer {
    fn begin_label(&mut self, name: &str) {
        GfxCommandBuffer::begin_label(self, name, LabelColor::COLOR_STAGE);
    }

    fn end_label(&mut self) {
        GfxCommandBuffer::end_label(self);
    }

    fn begin_render_pass(&mut self, render_pass: vk::RenderPass, framebuffer: vk::Framebuffer, extent: vk::Extent2D) {
        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue { float32: CLEAR_COLOR },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: CLEAR_DEPTH,
                    stencil: 0,
                },
            },
        ];
        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(render_pass)
            .framebuffer(framebuffer)
            .render_area(extent.into())
            .clear_values(&clear_values);
        self.cmd_begin_render_pass(&begin_info, vk::SubpassContents::INLINE);
    }

    fn end_render_pass(&mut self) {
        self.cmd_end_render_pass();
    }

    fn set_viewport_scissor(&mut self, extent: vk::Extent2D) {
        self.cmd_set_viewport(
            0,
            &[vk::Viewport {
                x: 0.0,
                y: 0.0,
                width: extent.width as f32,
                height: extent.height as f32,
                min_depth: 0.0,
                max_depth: 1.0,
            }],
        );
        self.cmd_set_scissor(0, &[extent.into()]);
    }

    fn bind_descriptor_set(&mut self, layout: vk::PipelineLayout, set: vk::DescriptorSet) {
        self.cmd_bind_descriptor_sets(vk::PipelineBindPoint::GRAPHICS, layout, 0, &[set]);
    }

    fn bind_pipeline(&mut self, pipeline: vk::Pipeline) {
        self.cmd_bind_pipeline(vk::PipelineBindPoint::GRAPHICS, pipeline);
    }

    fn draw_mesh(&mut self, mesh: &MeshBinding) {
        self.cmd_bind_vertex_buffers(0, &[mesh.vertex_buffer], &[0]);
        self.cmd_bind_index_buffer(mesh.index_buffer, 0, vk::IndexType::UINT32);
        self.cmd_draw_indexed(mesh.index_count, 1, 0, 0);
    }

    fn image_barrier(&mut self, barrier: GfxImageBarrier) {
        self.image_memory_barrier(vk::DependencyFlags::empty(), std::slice::from_ref(&barrier));
    }
}

/// 离屏：UFO 发光部分画到 A，然后纵向 blur A 画到 B
pub fn record_offscreen(recorder: &mut impl DrawRecorder, handles: &BloomHandles) {
    let BloomHandles {
        pipelines,
        sets,
        meshes,
        offscreen,
    } = handles;

    recorder.begin_label("glow-to-a");
    recorder.begin_render_pass(offscreen.render_pass, offscreen.framebuffer_a, offscreen.extent);
    recorder.set_viewport_scissor(offscreen.extent);
    recorder.bind_descriptor_set(pipelines.layout, sets.scene);
    recorder.bind_pipeline(pipelines.phong_pass);
    recorder.draw_mesh(&meshes.ufo_glow);
    recorder.end_render_pass();
    recorder.end_label();

    recorder.begin_label("vertical-blur-to-b");
    recorder.begin_render_pass(offscreen.render_pass, offscreen.framebuffer_b, offscreen.extent);
    recorder.set_viewport_scissor(offscreen.extent);
    recorder.bind_descriptor_set(pipelines.layout, sets.vertical_blur);
    recorder.bind_pipeline(pipelines.blur);
    recorder.draw_mesh(&meshes.quad);
    recorder.end_render_pass();
    recorder.end_label();
}

/// 主 pass：skybox，UFO，bloom 打开时再把 B 横向 blur 后叠加上去
///
/// B 的同步屏障不能放在 render pass 内部，因此在 render pass 开始之前录制
pub fn record_onscreen(recorder: &mut impl DrawRecorder, handles: &BloomHandles, target: &OnscreenTarget, bloom: bool) {
    let BloomHandles {
        pipelines,
        sets,
        meshes,
        offscreen,
    } = handles;

    if bloom {
        recorder.image_barrier(offscreen_read_barrier(offscreen.color_b));
    }

    recorder.begin_render_pass(target.render_pass, target.framebuffer, target.extent);
    recorder.set_viewport_scissor(target.extent);

    recorder.begin_label("skybox");
    recorder.bind_descriptor_set(pipelines.layout, sets.skybox);
    recorder.bind_pipeline(pipelines.skybox);
    recorder.draw_mesh(&meshes.skybox);
    recorder.end_label();

    recorder.begin_label("scene");
    recorder.bind_descriptor_set(pipelines.layout, sets.scene);
    recorder.bind_pipeline(pipelines.phong_pass);
    recorder.draw_mesh(&meshes.ufo);
    recorder.end_label();

    if bloom {
        recorder.begin_label("horizontal-blur");
        recorder.bind_descriptor_set(pipelines.layout, sets.horizontal_blur);
        recorder.bind_pipeline(pipelines.blur);
        recorder.draw_mesh(&meshes.quad);
        recorder.end_label();
    }

    recorder.end_render_pass();
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    #[derive(Debug, Clone, PartialEq)]
    enum DrawCommand {
        BeginRenderPass(vk::Framebuffer, vk::Extent2D),
        EndRenderPass,
        Viewport(vk::Extent2D),
        BindSet(vk::DescriptorSet),
        BindPipeline(vk::Pipeline),
        Draw(u32),
        Barrier(vk::Image),
    }

    #[derive(Default)]
    struct CommandLog {
        commands: Vec<DrawCommand>,
        barriers: Vec<GfxImageBarrier>,
        label_depth: i32,
    }

    impl DrawRecorder for CommandLog {
        fn begin_label(&mut self, _name: &str) {
            self.label_depth += 1;
        }

        fn end_label(&mut self) {
            self.label_depth -= 1;
        }

        fn begin_render_pass(&mut self, _: vk::RenderPass, framebuffer: vk::Framebuffer, extent: vk::Extent2D) {
            self.commands.push(DrawCommand::BeginRenderPass(framebuffer, extent));
        }

        fn end_render_pass(&mut self) {
            self.commands.push(DrawCommand::EndRenderPass);
        }

        fn set_viewport_scissor(&mut self, extent: vk::Extent2D) {
            self.commands.push(DrawCommand::Viewport(extent));
        }

        fn bind_descriptor_set(&mut self, _: vk::PipelineLayout, set: vk::DescriptorSet) {
            self.commands.push(DrawCommand::BindSet(set));
        }

        fn bind_pipeline(&mut self, pipeline: vk::Pipeline) {
            self.commands.push(DrawCommand::BindPipeline(pipeline));
        }

        fn draw_mesh(&mut self, mesh: &MeshBinding) {
            self.commands.push(DrawCommand::Draw(mesh.index_count));
        }

        fn image_barrier(&mut self, barrier: GfxImageBarrier) {
            self.commands.push(DrawCommand::Barrier(barrier.inner().image));
            self.barriers.push(barrier);
        }
    }

    fn mesh(index_count: u32) -> MeshBinding {
        MeshBinding {
            vertex_buffer: vk::Buffer::from_raw(index_count as u64),
            index_buffer: vk::Buffer::from_raw(index_count as u64 + 1000),
            index_count,
        }
    }

    const OFFSCREEN_EXTENT: vk::Extent2D = vk::Extent2D {
        width: 256,
        height: 256,
    };

    fn handles() -> BloomHandles {
        BloomHandles {
            pipelines: PipelineHandles {
                layout: vk::PipelineLayout::from_raw(1),
                blur: vk::Pipeline::from_raw(10),
                phong_pass: vk::Pipeline::from_raw(11),
                skybox: vk::Pipeline::from_raw(12),
            },
            sets: DescriptorSetHandles {
                scene: vk::DescriptorSet::from_raw(20),
                vertical_blur: vk::DescriptorSet::from_raw(21),
                horizontal_blur: vk::DescriptorSet::from_raw(22),
                skybox: vk::DescriptorSet::from_raw(23),
            },
            meshes: MeshHandles {
                ufo: mesh(300),
                ufo_glow: mesh(120),
                skybox: mesh(36),
                quad: mesh(6),
            },
            offscreen: OffscreenHandles {
                render_pass: vk::RenderPass::from_raw(30),
                framebuffer_a: vk::Framebuffer::from_raw(31),
                framebuffer_b: vk::Framebuffer::from_raw(32),
                color_b: vk::Image::from_raw(33),
                extent: OFFSCREEN_EXTENT,
            },
        }
    }

    fn target(width: u32, height: u32) -> OnscreenTarget {
        OnscreenTarget {
            render_pass: vk::RenderPass::from_raw(40),
            framebuffer: vk::Framebuffer::from_raw(41),
            extent: vk::Extent2D { width, height },
        }
    }

    #[test]
    fn test_offscreen_sequence() {
        let h = handles();
        let mut log = CommandLog::default();
        record_offscreen(&mut log, &h);

        assert_eq!(
            log.commands,
            vec![
                DrawCommand::BeginRenderPass(h.offscreen.framebuffer_a, OFFSCREEN_EXTENT),
                DrawCommand::Viewport(OFFSCREEN_EXTENT),
                DrawCommand::BindSet(h.sets.scene),
                DrawCommand::BindPipeline(h.pipelines.phong_pass),
                DrawCommand::Draw(120),
                DrawCommand::EndRenderPass,
                DrawCommand::BeginRenderPass(h.offscreen.framebuffer_b, OFFSCREEN_EXTENT),
                DrawCommand::Viewport(OFFSCREEN_EXTENT),
                DrawCommand::BindSet(h.sets.vertical_blur),
                DrawCommand::BindPipeline(h.pipelines.blur),
                DrawCommand::Draw(6),
                DrawCommand::EndRenderPass,
            ]
        );
        assert_eq!(log.label_depth, 0);
    }

    #[test]
    fn test_onscreen_with_bloom() {
        let h = handles();
        let mut log = CommandLog::default();
        record_onscreen(&mut log, &h, &target(1280, 720), true);

        let extent = vk::Extent2D {
            width: 1280,
            height: 720,
        };
        assert_eq!(
            log.commands,
            vec![
                DrawCommand::Barrier(h.offscreen.color_b),
                DrawCommand::BeginRenderPass(vk::Framebuffer::from_raw(41), extent),
                DrawCommand::Viewport(extent),
                DrawCommand::BindSet(h.sets.skybox),
                DrawCommand::BindPipeline(h.pipelines.skybox),
                DrawCommand::Draw(36),
                DrawCommand::BindSet(h.sets.scene),
                DrawCommand::BindPipeline(h.pipelines.phong_pass),
                DrawCommand::Draw(300),
                DrawCommand::BindSet(h.sets.horizontal_blur),
                DrawCommand::BindPipeline(h.pipelines.blur),
                DrawCommand::Draw(6),
                DrawCommand::EndRenderPass,
            ]
        );
        assert_eq!(log.label_depth, 0);
    }

    #[test]
    fn test_onscreen_without_bloom_skips_blur_and_barrier() {
        let h = handles();
        let mut log = CommandLog::default();
        record_onscreen(&mut log, &h, &target(1280, 720), false);

        assert!(!log.commands.contains(&DrawCommand::BindPipeline(h.pipelines.blur)));
        assert!(!log.commands.contains(&DrawCommand::BindSet(h.sets.horizontal_blur)));
        assert!(!log.commands.iter().any(|c| matches!(c, DrawCommand::Barrier(_))));
        assert_eq!(log.commands.iter().filter(|c| matches!(c, DrawCommand::Draw(_))).count(), 2);
    }

    #[test]
    fn test_offscreen_extent_independent_of_window() {
        let h = handles();
        for (width, height) in [(640, 480), (3840, 2160), (1, 1)] {
            let mut onscreen = CommandLog::default();
            record_onscreen(&mut onscreen, &h, &target(width, height), true);
            assert!(onscreen.commands.contains(&DrawCommand::Viewport(vk::Extent2D { width, height })));

            let mut offscreen = CommandLog::default();
            record_offscreen(&mut offscreen, &h);
            assert!(
                offscreen
                    .commands
                    .iter()
                    .filter_map(|c| match c {
                        DrawCommand::Viewport(extent) => Some(*extent),
                        _ => None,
                    })
                    .all(|extent| extent == OFFSCREEN_EXTENT)
            );
        }
    }

    #[test]
    fn test_offscreen_read_barrier_masks() {
        let image = vk::Image::from_raw(33);
        let barrier = offscreen_read_barrier(image);
        let inner = barrier.inner();

        assert_eq!(inner.image, image);
        assert_eq!(inner.src_stage_mask, vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT);
        assert_eq!(inner.src_access_mask, vk::AccessFlags2::COLOR_ATTACHMENT_WRITE);
        assert_eq!(inner.dst_stage_mask, vk::PipelineStageFlags2::FRAGMENT_SHADER);
        assert_eq!(inner.dst_access_mask, vk::AccessFlags2::SHADER_READ);
        assert_eq!(inner.old_layout, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
        assert_eq!(inner.new_layout, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
        assert_eq!(inner.subresource_range.aspect_mask, vk::ImageAspectFlags::COLOR);
        assert_eq!(inner.subresource_range.layer_count, 1);
        assert_eq!(inner.src_queue_family_index, inner.dst_queue_family_index);
    }

    #[test]
    fn test_onscreen_barrier_targets_b() {
        let h = handles();
        let mut log = CommandLog::default();
        record_onscreen(&mut log, &h, &target(800, 600), true);

        assert_eq!(log.barriers.len(), 1);
        let inner = log.barriers[0].inner();
        assert_eq!(inner.image, h.offscreen.color_b);
        assert_eq!(inner.dst_stage_mask, vk::PipelineStageFlags2::FRAGMENT_SHADER);
        assert_eq!(inner.dst_access_mask, vk::AccessFlags2::SHADER_READ);
    }
}
