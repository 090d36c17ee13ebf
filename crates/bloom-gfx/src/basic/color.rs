/// debug label 使用的颜色
pub struct LabelColor;
impl LabelColor {
    const GREEN: glam::Vec4 = glam::Vec4::new(0.0, 1.0, 0.0, 1.0);
    const BLUE: glam::Vec4 = glam::Vec4::new(0.0, 0.0, 1.0, 1.0);
    const YELLOW: glam::Vec4 = glam::Vec4::new(1.0, 1.0, 0.0, 1.0);

    pub const COLOR_PASS: glam::Vec4 = Self::BLUE;
    pub const COLOR_STAGE: glam::Vec4 = Self::YELLOW;
    pub const COLOR_CMD: glam::Vec4 = Self::GREEN;
}
