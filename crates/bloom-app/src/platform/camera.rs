use crate::platform::input_manager::InputState;

/// 围绕原点的相机：只有 zoom 和欧拉角旋转
///
/// 鼠标左键拖动旋转，右键拖动或者滚轮缩放
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    /// view 矩阵在 z 方向的平移
    pub zoom: f32,
    /// 角度制
    pub rotation: glam::Vec3,
    /// 额外的平移，叠加在模型的动画位移上
    pub position: glam::Vec3,

    pub rotation_speed: f32,
    pub zoom_speed: f32,
}

impl OrbitCamera {
    const ROTATE_FACTOR: f32 = 1.25;
    const ZOOM_FACTOR: f32 = 0.005;
    /// 一格滚轮等效的 delta
    const WHEEL_DELTA: f32 = 120.0;

    pub fn new(zoom: f32, rotation: glam::Vec3) -> Self {
        Self {
            zoom,
            rotation,
            position: glam::Vec3::ZERO,
            rotation_speed: 1.0,
            zoom_speed: 1.0,
        }
    }

    /// delta 为上一帧鼠标位置减去当前位置
    pub fn rotate_by_drag(&mut self, delta: glam::Vec2) {
        self.rotation.x += delta.y * Self::ROTATE_FACTOR * self.rotation_speed;
        self.rotation.y -= delta.x * Self::ROTATE_FACTOR * self.rotation_speed;
    }

    pub fn zoom_by_drag(&mut self, delta_y: f32) {
        self.zoom += delta_y * Self::ZOOM_FACTOR * self.zoom_speed;
    }

    pub fn zoom_by_wheel(&mut self, notches: f32) {
        self.zoom += notches * Self::WHEEL_DELTA * Self::ZOOM_FACTOR * self.zoom_speed;
    }

    /// 根据本帧输入更新，返回相机是否发生变化
    pub fn update(&mut self, input: &InputState) -> bool {
        let before = (self.zoom, self.rotation);
        let delta = input.mouse_delta().as_vec2();

        if input.left_button_pressed {
            self.rotate_by_drag(delta);
        }
        if input.right_button_pressed {
            self.zoom_by_drag(delta.y);
        }
        if input.wheel_delta != 0.0 {
            self.zoom_by_wheel(input.wheel_delta);
        }

        before != (self.zoom, self.rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_left_drag_rotates() {
        let mut camera = OrbitCamera::new(-10.25, glam::vec3(7.5, -343.0, 0.0));
        camera.rotate_by_drag(glam::vec2(2.0, 4.0));
        assert_eq!(camera.rotation, glam::vec3(12.5, -345.5, 0.0));
    }

    #[test]
    fn test_wheel_zoom_per_notch() {
        let mut camera = OrbitCamera::new(-10.0, glam::Vec3::ZERO);
        camera.zoom_by_wheel(1.0);
        assert!((camera.zoom - (-9.4)).abs() < 1e-5);
    }

    #[test]
    fn test_update_reports_change() {
        let mut camera = OrbitCamera::new(-10.0, glam::Vec3::ZERO);
        let mut input = InputState {
            crt_mouse_pos: glam::dvec2(100.0, 100.0),
            last_mouse_pos: glam::dvec2(100.0, 100.0),
            ..Default::default()
        };
        assert!(!camera.update(&input));

        input.right_button_pressed = true;
        input.last_mouse_pos = glam::dvec2(100.0, 120.0);
        assert!(camera.update(&input));
        assert!((camera.zoom - (-9.9)).abs() < 1e-5);
        assert_eq!(camera.rotation, glam::Vec3::ZERO);
    }
}
