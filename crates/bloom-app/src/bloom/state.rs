use crate::bloom::uniforms::{BlurDirection, BlurUbo};

/// toggle 之后需要重新录制的 command buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandRebuild {
    pub onscreen: bool,
    pub offscreen: bool,
}

/// bloom 开关以及两个 blur 的参数
///
/// 两个 blur UBO 的 `horizontal` 字段在创建时确定，之后只会修改 blur scale
#[derive(Debug, Clone, PartialEq)]
pub struct BloomState {
    bloom: bool,
    vert_blur: BlurUbo,
    horz_blur: BlurUbo,
}

impl BloomState {
    pub fn new(bloom: bool, blur_scale: f32, blur_strength: f32) -> Self {
        Self {
            bloom,
            vert_blur: BlurUbo::new(BlurDirection::Vertical, blur_scale, blur_strength),
            horz_blur: BlurUbo::new(BlurDirection::Horizontal, blur_scale, blur_strength),
        }
    }

    /// on-screen 每次都要重新录制；离屏只在打开时重新录制
    pub fn toggle_bloom(&mut self) -> CommandRebuild {
        self.bloom = !self.bloom;
        CommandRebuild {
            onscreen: true,
            offscreen: self.bloom,
        }
    }

    /// 两个方向同时累加，不做限制
    pub fn change_blur_scale(&mut self, delta: f32) {
        self.vert_blur.blur_scale += delta;
        self.horz_blur.blur_scale += delta;
    }

    #[inline]
    pub fn bloom(&self) -> bool {
        self.bloom
    }

    #[inline]
    pub fn blur_scale(&self) -> f32 {
        self.vert_blur.blur_scale
    }

    #[inline]
    pub fn vert_blur(&self) -> &BlurUbo {
        &self.vert_blur
    }

    #[inline]
    pub fn horz_blur(&self) -> &BlurUbo {
        &self.horz_blur
    }
}
