use std::collections::{HashMap, VecDeque};

use winit::{
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

/// 输入事件类型
#[derive(Debug, Clone)]
pub enum InputEvent {
    /// 键盘按键事件，不包含自动重复
    KeyboardInput { key_code: KeyCode, state: ElementState },
    /// 鼠标按键事件
    MouseButtonInput { button: MouseButton, state: ElementState },
    /// 鼠标移动事件
    MouseMoved { position: glam::DVec2 },
    /// 鼠标离开窗口
    CursorLeft,
    /// 鼠标滚轮事件，单位是滚轮格数
    MouseWheel { delta: f32 },
}

/// 按键对应的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    IncreaseBlurScale,
    DecreaseBlurScale,
    ToggleBloom,
    TogglePause,
    Exit,
}

impl KeyAction {
    pub fn from_key(key_code: KeyCode) -> Option<Self> {
        match key_code {
            KeyCode::NumpadAdd => Some(Self::IncreaseBlurScale),
            KeyCode::NumpadSubtract => Some(Self::DecreaseBlurScale),
            KeyCode::KeyB => Some(Self::ToggleBloom),
            KeyCode::KeyP => Some(Self::TogglePause),
            KeyCode::Escape => Some(Self::Exit),
            _ => None,
        }
    }
}

/// 输入管理器
///
/// 窗口事件先进入队列，每帧 `update` 时统一处理
pub struct InputManager {
    /// 输入状态
    state: InputState,
    /// 事件队列
    events: VecDeque<InputEvent>,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

// getter
impl InputManager {
    #[inline]
    pub fn state(&self) -> &InputState {
        &self.state
    }
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            state: InputState::default(),
            events: VecDeque::new(),
        }
    }

    /// 处理窗口事件
    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.events.push_back(InputEvent::MouseMoved {
                    position: glam::dvec2(position.x, position.y),
                });
            }
            WindowEvent::CursorLeft { .. } => {
                self.events.push_back(InputEvent::CursorLeft);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                // 仅考虑垂直滚动
                let delta_value = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 120.0,
                };
                self.events.push_back(InputEvent::MouseWheel { delta: delta_value });
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.events.push_back(InputEvent::MouseButtonInput {
                    button: *button,
                    state: *state,
                });
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                self.events.push_back(InputEvent::KeyboardInput {
                    key_code: *key_code,
                    state: *state,
                });
            }
            _ => {}
        }
    }

    /// 处理所有队列中的事件，更新输入状态
    pub fn update(&mut self) {
        self.state.last_mouse_pos = self.state.crt_mouse_pos;
        self.state.just_pressed.clear();
        self.state.wheel_delta = 0.0;

        while let Some(event) = self.events.pop_front() {
            self.apply(event);
        }
    }

    fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyboardInput { key_code, state } => {
                let pressed = state == ElementState::Pressed;
                let was_pressed = self.state.key_pressed.insert(key_code, pressed).unwrap_or(false);
                if pressed && !was_pressed {
                    self.state.just_pressed.push(key_code);
                }
            }
            InputEvent::MouseButtonInput { button, state } => {
                let pressed = state == ElementState::Pressed;
                match button {
                    MouseButton::Left => self.state.left_button_pressed = pressed,
                    MouseButton::Right => self.state.right_button_pressed = pressed,
                    _ => {}
                }
            }
            InputEvent::MouseMoved { position } => {
                // 进入窗口后的第一次移动只记录位置，不产生 delta
                if !self.state.cursor_tracked {
                    self.state.last_mouse_pos = position;
                    self.state.cursor_tracked = true;
                }
                self.state.crt_mouse_pos = position;
            }
            InputEvent::CursorLeft => {
                self.state.cursor_tracked = false;
            }
            InputEvent::MouseWheel { delta } => {
                self.state.wheel_delta += delta;
            }
        }
    }

    /// 本帧新按下的键对应的操作，按照按下的顺序
    pub fn key_actions(&self) -> Vec<KeyAction> {
        self.state.just_pressed.iter().filter_map(|key| KeyAction::from_key(*key)).collect()
    }
}

/// 记录输入信息
#[derive(Default, Clone)]
pub struct InputState {
    /// 当前帧的鼠标位置 pixel
    pub crt_mouse_pos: glam::DVec2,
    /// 上一帧的鼠标位置 pixel
    pub last_mouse_pos: glam::DVec2,
    /// 鼠标在窗口内，并且已经收到过位置
    pub cursor_tracked: bool,
    pub left_button_pressed: bool,
    pub right_button_pressed: bool,
    /// 本帧累计的滚轮格数
    pub wheel_delta: f32,
    pub key_pressed: HashMap<KeyCode, bool>,
    /// 本帧从松开变为按下的键
    pub just_pressed: Vec<KeyCode>,
}

impl InputState {
    /// 上一帧位置减去当前位置
    #[inline]
    pub fn mouse_delta(&self) -> glam::DVec2 {
        self.last_mouse_pos - self.crt_mouse_pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(manager: &mut InputManager, key_code: KeyCode, state: ElementState) {
        manager.events.push_back(InputEvent::KeyboardInput { key_code, state });
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(KeyAction::from_key(KeyCode::NumpadAdd), Some(KeyAction::IncreaseBlurScale));
        assert_eq!(KeyAction::from_key(KeyCode::NumpadSubtract), Some(KeyAction::DecreaseBlurScale));
        assert_eq!(KeyAction::from_key(KeyCode::KeyB), Some(KeyAction::ToggleBloom));
        assert_eq!(KeyAction::from_key(KeyCode::KeyP), Some(KeyAction::TogglePause));
        assert_eq!(KeyAction::from_key(KeyCode::Escape), Some(KeyAction::Exit));
        assert_eq!(KeyAction::from_key(KeyCode::KeyW), None);
    }

    #[test]
    fn test_just_pressed_is_edge_triggered() {
        let mut manager = InputManager::new();
        key(&mut manager, KeyCode::KeyB, ElementState::Pressed);
        manager.update();
        assert_eq!(manager.key_actions(), vec![KeyAction::ToggleBloom]);
        assert_eq!(manager.state().key_pressed.get(&KeyCode::KeyB), Some(&true));

        // 按住不放不会再次触发
        manager.update();
        assert!(manager.key_actions().is_empty());

        key(&mut manager, KeyCode::KeyB, ElementState::Released);
        key(&mut manager, KeyCode::KeyB, ElementState::Pressed);
        manager.update();
        assert_eq!(manager.key_actions(), vec![KeyAction::ToggleBloom]);
    }

    #[test]
    fn test_mouse_delta_and_wheel() {
        let mut manager = InputManager::new();
        manager.events.push_back(InputEvent::MouseMoved {
            position: glam::dvec2(10.0, 20.0),
        });
        manager.update();
        manager.events.push_back(InputEvent::MouseMoved {
            position: glam::dvec2(14.0, 17.0),
        });
        manager.events.push_back(InputEvent::MouseWheel { delta: 1.0 });
        manager.events.push_back(InputEvent::MouseWheel { delta: 1.0 });
        manager.update();

        assert_eq!(manager.state().mouse_delta(), glam::dvec2(-4.0, 3.0));
        assert_eq!(manager.state().wheel_delta, 2.0);

        manager.update();
        assert_eq!(manager.state().wheel_delta, 0.0);
        assert_eq!(manager.state().mouse_delta(), glam::DVec2::ZERO);
    }

    fn moved(manager: &mut InputManager, x: f64, y: f64) {
        manager.events.push_back(InputEvent::MouseMoved {
            position: glam::dvec2(x, y),
        });
    }

    #[test]
    fn test_first_move_after_enter_has_no_delta() {
        let mut manager = InputManager::new();
        moved(&mut manager, 640.0, 360.0);
        manager.update();
        assert_eq!(manager.state().mouse_delta(), glam::DVec2::ZERO);

        moved(&mut manager, 642.0, 361.0);
        manager.update();
        assert_eq!(manager.state().mouse_delta(), glam::dvec2(-2.0, -1.0));
    }

    #[test]
    fn test_reenter_reseeds_position() {
        let mut manager = InputManager::new();
        moved(&mut manager, 10.0, 10.0);
        manager.update();

        manager.events.push_back(InputEvent::CursorLeft);
        manager.update();
        assert!(!manager.state().cursor_tracked);

        moved(&mut manager, 900.0, 500.0);
        manager.update();
        assert_eq!(manager.state().mouse_delta(), glam::DVec2::ZERO);
        assert!(manager.state().cursor_tracked);
    }
}
