use std::{cell::OnceCell, ffi::CStr};

use anyhow::Context;
use raw_window_handle::HasDisplayHandle;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::WindowId,
};

use bloom_crate_tools::init_log::init_log;
use bloom_gfx::gfx::Gfx;

use crate::{
    bloom::renderer::{BloomRenderer, FrameStatus},
    config::BloomConfig,
    overlay,
    platform::{
        camera::OrbitCamera,
        input_manager::{InputManager, KeyAction},
        timer::{FpsCounter, Timer},
    },
    window_system::main_window::MainWindow,
};

pub fn panic_handler(info: &std::panic::PanicHookInfo) {
    log::error!("{}", info);
}

/// bloom 示例的应用主结构
///
/// 窗口在 `resumed` 中创建，renderer 依赖窗口的 render pass，因此同样延迟初始化
pub struct BloomApp {
    config: BloomConfig,

    /// 需要等待窗口事件初始化，因此 OnceCell
    window_system: OnceCell<MainWindow>,
    renderer: OnceCell<BloomRenderer>,

    input_manager: InputManager,
    camera: OrbitCamera,
    timer: Timer,
    fps_counter: FpsCounter,

    /// resumed 中的初始化错误，事件循环结束后返回
    init_error: Option<anyhow::Error>,
}

// 总的 main 函数
impl BloomApp {
    /// 整个程序的入口
    pub fn run() -> anyhow::Result<()> {
        std::panic::set_hook(Box::new(panic_handler));

        init_log();
        tracy_client::Client::start();
        tracy_client::set_thread_name!("BloomMainThread");

        let config = BloomConfig::load()?;
        let event_loop = EventLoop::new().context("failed to create event loop")?;

        // 追加 window system 需要的 extension
        let display_handle = event_loop.display_handle().context("failed to get display handle")?;
        let extra_instance_ext = ash_window::enumerate_required_extensions(display_handle.as_raw())
            .context("failed to enumerate surface extensions")?
            .iter()
            .map(|ext| unsafe { CStr::from_ptr(*ext) })
            .collect();
        Gfx::init(config.window.title.clone(), extra_instance_ext);

        let camera = OrbitCamera::new(config.scene.zoom, glam::Vec3::from(config.scene.rotation));
        let mut app = Self {
            config,
            window_system: OnceCell::new(),
            renderer: OnceCell::new(),
            input_manager: InputManager::new(),
            camera,
            timer: Timer::default(),
            fps_counter: FpsCounter::default(),
            init_error: None,
        };
        let run_result = event_loop.run_app(&mut app).context("event loop failed");

        log::info!("end run.");

        let init_error = app.init_error.take();
        app.destroy();
        Gfx::destroy();

        run_result?;
        init_error.map_or(Ok(()), Err)
    }
}

impl BloomApp {
    /// 在 window 创建之后调用
    fn init_after_window(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window = MainWindow::new(event_loop, &self.config.window)?;
        let renderer = match BloomRenderer::new(&self.config, &window, &self.camera) {
            Ok(renderer) => renderer,
            Err(e) => {
                window.destroy();
                return Err(e);
            }
        };

        overlay::log_help();
        Self::refresh_title(&self.config, &window, &renderer, None);

        self.window_system.set(window).map_err(|_| ()).unwrap();
        self.renderer.set(renderer).map_err(|_| ()).unwrap();
        Ok(())
    }

    fn refresh_title(config: &BloomConfig, window: &MainWindow, renderer: &BloomRenderer, fps: Option<u32>) {
        let state = renderer.state();
        window.set_title(&overlay::window_title(&config.window.title, fps, state.bloom(), state.blur_scale()));
    }

    fn update(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(renderer)) = (self.window_system.get_mut(), self.renderer.get_mut()) else {
            return;
        };

        self.timer.tick();
        self.input_manager.update();

        // 按键
        {
            let mut title_dirty = false;
            for action in self.input_manager.key_actions() {
                match action {
                    KeyAction::IncreaseBlurScale => renderer.change_blur_scale(1.0),
                    KeyAction::DecreaseBlurScale => renderer.change_blur_scale(-1.0),
                    KeyAction::ToggleBloom => {
                        renderer.toggle_bloom(window);
                        overlay::log_help();
                    }
                    KeyAction::TogglePause => renderer.toggle_pause(),
                    KeyAction::Exit => {
                        event_loop.exit();
                        return;
                    }
                }
                title_dirty = true;
            }
            if title_dirty {
                Self::refresh_title(&self.config, window, renderer, self.fps_counter.last_fps());
            }
        }

        // 相机
        if self.camera.update(self.input_manager.state()) {
            renderer.view_changed(&self.camera);
        }

        match renderer.render(window, self.timer.delta_time_s()) {
            FrameStatus::Presented => {
                if let Some(fps) = self.fps_counter.frame(self.timer.delta_time()) {
                    Self::refresh_title(&self.config, window, renderer, Some(fps));
                }
            }
            FrameStatus::SwapchainOutdated => {
                window.rebuild_after_resized(self.config.window.vsync);
                renderer.on_resized(window);
            }
            FrameStatus::Skipped => {}
        }

        tracy_client::frame_mark();
    }

    fn on_window_resized(&mut self, width: u32, height: u32) {
        // 最小化时不重建，恢复之后会再收到 Resized
        if width == 0 || height == 0 {
            return;
        }
        let (Some(window), Some(renderer)) = (self.window_system.get_mut(), self.renderer.get_mut()) else {
            return;
        };
        window.rebuild_after_resized(self.config.window.vsync);
        renderer.on_resized(window);
    }
}

// 手动 drop
impl BloomApp {
    fn destroy(mut self) {
        if let Some(renderer) = self.renderer.take() {
            renderer.destroy();
        }
        if let Some(window) = self.window_system.take() {
            window.destroy();
        }
    }
}

impl ApplicationHandler for BloomApp {
    // 建议在这里创建 window 和 renderer
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        log::info!("winit event: resumed");
        if self.window_system.get().is_some() {
            return;
        }

        match self.init_after_window(event_loop) {
            Ok(()) => self.timer.reset(),
            Err(e) => {
                log::error!("initialization failed: {:#}", e);
                self.init_error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        self.input_manager.handle_window_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                Gfx::get().wait_idel();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.on_window_resized(new_size.width, new_size.height);
            }
            WindowEvent::RedrawRequested => {
                self.update(event_loop);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window_system.get() {
            window.window().request_redraw();
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        log::warn!("winit event: suspended");
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        log::info!("loop exiting");
    }
}
