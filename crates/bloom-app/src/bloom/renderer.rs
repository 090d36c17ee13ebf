//! bloom 的帧循环：录制、更新 uniform、按计划提交

use ash::vk;
use itertools::Itertools;

use bloom_gfx::{
    basic::color::LabelColor,
    commands::{
        command_buffer::GfxCommandBuffer, command_pool::GfxCommandPool, fence::GfxFence, semaphore::GfxSemaphore,
        submit_info::GfxSubmitInfo,
    },
    gfx::Gfx,
    swapchain::render_swapchain::GfxSwapchainStatus,
};

use crate::{
    bloom::{
        recorder::{self, OnscreenTarget},
        resources::BloomResources,
        sequencer::{FrameDriver, SemaphoreRole, SubmitTarget, submission_plan},
        state::BloomState,
        teardown::teardown_order,
        uniforms::SceneView,
    },
    config::BloomConfig,
    platform::{camera::OrbitCamera, timer::AnimationTimer},
    window_system::main_window::MainWindow,
};

/// 一帧的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Presented,
    /// 未准备好或者窗口最小化
    Skipped,
    /// 需要重建 swapchain
    SwapchainOutdated,
}

/// [`BloomRenderer`] 持有的各组 GPU 对象
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererPart {
    Resources,
    SyncObjects,
    CommandPool,
    CommandBuffers,
}

impl RendererPart {
    pub const CREATION_ORDER: [Self; 4] = [Self::Resources, Self::SyncObjects, Self::CommandPool, Self::CommandBuffers];
}

/// # Destroy
/// 需要手动调用 `destroy`，按 [`RendererPart::CREATION_ORDER`] 的逆序释放
pub struct BloomRenderer {
    command_pool: GfxCommandPool,
    offscreen_cmd: GfxCommandBuffer,
    /// 每个 swapchain image 一个
    draw_cmds: Vec<GfxCommandBuffer>,

    offscreen_complete: GfxSemaphore,
    /// on-screen command buffer 执行完毕
    frame_fence: GfxFence,

    resources: BloomResources,
    state: BloomState,
    scene_view: SceneView,
    anim_timer: AnimationTimer,
    driver: FrameDriver,

    blur_scale_step: f32,
}

// 创建与销毁
impl BloomRenderer {
    pub fn new(config: &BloomConfig, window: &MainWindow, camera: &OrbitCamera) -> anyhow::Result<Self> {
        let _span = tracy_client::span!("BloomRenderer::new");
        let mut driver = FrameDriver::new();
        driver.begin_prepare();

        let resources = BloomResources::new(
            &config.assets,
            window.render_pass().handle(),
            window.color_format(),
            window.depth_format(),
        )?;

        let offscreen_complete = GfxSemaphore::new("offscreen-complete");
        let frame_fence = GfxFence::new(true, "frame");

        let command_pool = GfxCommandPool::new(
            Gfx::get().gfx_queue_family(),
            vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
            "bloom",
        );
        let offscreen_cmd = GfxCommandBuffer::new(&command_pool, "offscreen");
        let draw_cmds = Self::alloc_draw_cmds(&command_pool, window.image_count());

        let mut scene_view = SceneView {
            zoom: camera.zoom,
            rotation: camera.rotation,
            camera_pos: camera.position,
            timer: 0.0,
            aspect: 1.0,
        };
        scene_view.set_extent(window.extent());

        let mut renderer = Self {
            command_pool,
            offscreen_cmd,
            draw_cmds,
            offscreen_complete,
            frame_fence,
            resources,
            state: BloomState::new(config.bloom.enabled, config.bloom.blur_scale, config.bloom.blur_strength),
            scene_view,
            anim_timer: AnimationTimer::new(config.scene.timer_speed, config.scene.paused),
            driver,
            blur_scale_step: config.bloom.blur_scale_step,
        };

        renderer.update_uniform_buffers_scene();
        renderer.update_uniform_buffers_screen();
        renderer.build_offscreen_command_buffer();
        renderer.update_draw_command_buffers(window);

        renderer.driver.finish_prepare();
        log::info!("bloom renderer prepared, bloom {}", if renderer.state.bloom() { "on" } else { "off" });
        Ok(renderer)
    }

    fn alloc_draw_cmds(command_pool: &GfxCommandPool, count: usize) -> Vec<GfxCommandBuffer> {
        (0..count).map(|i| GfxCommandBuffer::new(command_pool, &format!("draw-{}", i))).collect_vec()
    }

    pub fn destroy(self) {
        let _span = tracy_client::span!("BloomRenderer::destroy");
        Gfx::get().wait_idel();

        let Self {
            command_pool,
            offscreen_cmd,
            draw_cmds,
            offscreen_complete,
            frame_fence,
            resources,
            ..
        } = self;

        let mut command_buffers = Some(draw_cmds.into_iter().chain(std::iter::once(offscreen_cmd)).collect_vec());
        let mut command_pool = Some(command_pool);
        let mut sync_objects = Some((offscreen_complete, frame_fence));
        let mut resources = Some(resources);

        for part in teardown_order(&RendererPart::CREATION_ORDER) {
            match part {
                RendererPart::CommandBuffers => {
                    if let (Some(pool), Some(cmds)) = (&command_pool, command_buffers.take()) {
                        pool.free_command_buffers(cmds);
                    }
                }
                RendererPart::CommandPool => {
                    if let Some(pool) = command_pool.take() {
                        pool.destroy();
                    }
                }
                RendererPart::SyncObjects => {
                    if let Some((semaphore, fence)) = sync_objects.take() {
                        semaphore.destroy();
                        fence.destroy();
                    }
                }
                RendererPart::Resources => {
                    if let Some(resources) = resources.take() {
                        resources.destroy();
                    }
                }
            }
        }
    }
}

// getters
impl BloomRenderer {
    #[inline]
    pub fn state(&self) -> &BloomState {
        &self.state
    }
}

// 录制
impl BloomRenderer {
    /// 离屏的两个 pass，只在 bloom 打开时需要重新录制
    pub fn build_offscreen_command_buffer(&mut self) {
        let _span = tracy_client::span!("build_offscreen_command_buffer");
        let handles = self.resources.handles();

        self.offscreen_cmd.reset();
        self.offscreen_cmd.begin(vk::CommandBufferUsageFlags::empty(), "offscreen");
        recorder::record_offscreen(&mut self.offscreen_cmd, &handles);
        self.offscreen_cmd.end();
    }

    /// 每个 swapchain image 录制一个 on-screen command buffer
    pub fn update_draw_command_buffers(&mut self, window: &MainWindow) {
        let _span = tracy_client::span!("update_draw_command_buffers");
        let handles = self.resources.handles();
        let bloom = self.state.bloom();

        for (image_index, cmd) in self.draw_cmds.iter_mut().enumerate() {
            let target = OnscreenTarget {
                render_pass: window.render_pass().handle(),
                framebuffer: window.framebuffer(image_index),
                extent: window.extent(),
            };

            cmd.reset();
            cmd.begin(vk::CommandBufferUsageFlags::empty(), &format!("draw-{}", image_index));
            recorder::record_onscreen(cmd, &handles, &target, bloom);
            cmd.end();
        }
    }
}

// uniform
impl BloomRenderer {
    pub fn update_uniform_buffers_scene(&mut self) {
        self.scene_view.timer = self.anim_timer.value();
        self.resources.uniforms().write_scene(&self.scene_view);
    }

    pub fn update_uniform_buffers_screen(&self) {
        self.resources.uniforms().write_screen(self.state.vert_blur(), self.state.horz_blur());
    }

    /// 相机变化之后调用
    pub fn view_changed(&mut self, camera: &OrbitCamera) {
        self.scene_view.zoom = camera.zoom;
        self.scene_view.rotation = camera.rotation;
        self.scene_view.camera_pos = camera.position;

        self.frame_fence.wait();
        self.update_uniform_buffers_scene();
        self.update_uniform_buffers_screen();
    }
}

// 用户操作
impl BloomRenderer {
    /// `direction` 为 +1 或者 -1
    pub fn change_blur_scale(&mut self, direction: f32) {
        self.state.change_blur_scale(direction * self.blur_scale_step);
        self.frame_fence.wait();
        self.update_uniform_buffers_screen();
        log::info!("blur scale changed: {:.2}", self.state.blur_scale());
    }

    pub fn toggle_bloom(&mut self, window: &MainWindow) {
        Gfx::get().wait_idel();
        let rebuild = self.state.toggle_bloom();
        log::info!("bloom toggled: {}", if self.state.bloom() { "on" } else { "off" });

        if rebuild.offscreen {
            self.build_offscreen_command_buffer();
        }
        if rebuild.onscreen {
            self.update_draw_command_buffers(window);
        }
        log::info!("command buffers rebuilt: onscreen={}, offscreen={}", rebuild.onscreen, rebuild.offscreen);
    }

    pub fn toggle_pause(&mut self) {
        let paused = self.anim_timer.toggle_pause();
        log::info!("animation {}", if paused { "paused" } else { "resumed" });
    }
}

// 帧
impl BloomRenderer {
    /// 一帧：等待上一帧，更新动画，acquire，提交，present
    pub fn render(&mut self, window: &mut MainWindow, frame_seconds: f32) -> FrameStatus {
        if !self.driver.should_render(window.window_extent()) {
            return FrameStatus::Skipped;
        }

        self.frame_fence.wait();

        if !self.anim_timer.paused() {
            let _span = tracy_client::span!("update uniforms");
            self.anim_timer.advance(frame_seconds);
            self.update_uniform_buffers_scene();
        }

        let acquire_status = window.acquire_image();
        if acquire_status == GfxSwapchainStatus::OutOfDate {
            return FrameStatus::SwapchainOutdated;
        }

        self.draw(window);

        let present_status = window.present_image();
        if acquire_status == GfxSwapchainStatus::Suboptimal || present_status != GfxSwapchainStatus::Optimal {
            return FrameStatus::SwapchainOutdated;
        }
        FrameStatus::Presented
    }

    fn draw(&self, window: &MainWindow) {
        let image_index = window.current_image_index();
        let plan = submission_plan(self.state.bloom());

        let semaphore = |role: SemaphoreRole| match role {
            SemaphoreRole::PresentComplete => window.present_complete_semaphore(),
            SemaphoreRole::OffscreenComplete => &self.offscreen_complete,
            SemaphoreRole::RenderComplete => window.render_complete_semaphore(image_index),
        };

        let batches = plan
            .steps
            .iter()
            .map(|step| {
                let cmd = match step.target {
                    SubmitTarget::Offscreen => &self.offscreen_cmd,
                    SubmitTarget::Onscreen => &self.draw_cmds[image_index],
                };
                GfxSubmitInfo::new(std::slice::from_ref(cmd))
                    .wait(semaphore(step.wait), step.wait.wait_stage())
                    .signal(semaphore(step.signal), step.signal.signal_stage())
            })
            .collect_vec();
        let fence = plan.steps.iter().any(|step| step.signal_fence).then_some(&self.frame_fence);

        let _span = tracy_client::span!("submit");
        let queue = Gfx::get().gfx_queue();
        queue.begin_label(if self.state.bloom() { "bloom-frame" } else { "scene-frame" }, LabelColor::COLOR_PASS);
        self.frame_fence.reset();
        queue.submit(batches, fence);
        queue.end_label();
    }

    /// window 已经重建完成
    pub fn on_resized(&mut self, window: &MainWindow) {
        let _span = tracy_client::span!("BloomRenderer::on_resized");
        Gfx::get().wait_idel();

        if self.draw_cmds.len() != window.image_count() {
            self.command_pool.free_command_buffers(std::mem::take(&mut self.draw_cmds));
            self.draw_cmds = Self::alloc_draw_cmds(&self.command_pool, window.image_count());
        }

        // 离屏 framebuffer 与窗口大小无关，保持不变
        self.scene_view.set_extent(window.extent());
        self.update_uniform_buffers_scene();
        self.update_uniform_buffers_screen();
        self.update_draw_command_buffers(window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teardown_order() {
        let order = teardown_order(&RendererPart::CREATION_ORDER).collect_vec();
        assert_eq!(
            order,
            vec![
                RendererPart::CommandBuffers,
                RendererPart::CommandPool,
                RendererPart::SyncObjects,
                RendererPart::Resources,
            ]
        );
    }
}
