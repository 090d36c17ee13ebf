//! 帮助文字
//!
//! 没有字体渲染，文字输出到日志，同时状态追加到窗口标题

/// 一行帮助文字以及它在 overlay 中的位置（像素，左对齐）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayText {
    pub text: &'static str,
    pub position: glam::Vec2,
}

#[cfg(not(target_os = "android"))]
const HELP_TEXTS: [&str; 2] = ["Press \"NUMPAD +/-\" to change blur scale", "Press \"B\" to toggle bloom"];
#[cfg(target_os = "android")]
const HELP_TEXTS: [&str; 2] = ["Press \"L1/R1\" to change blur scale", "Press \"Button A\" to toggle bloom"];

pub fn help_lines() -> [OverlayText; 2] {
    [
        OverlayText {
            text: HELP_TEXTS[0],
            position: glam::vec2(5.0, 85.0),
        },
        OverlayText {
            text: HELP_TEXTS[1],
            position: glam::vec2(5.0, 105.0),
        },
    ]
}

pub fn log_help() {
    for line in help_lines() {
        log::info!("{}", line.text);
    }
}

/// `[bloom on, blur scale 1.00]`
pub fn title_suffix(bloom: bool, blur_scale: f32) -> String {
    format!("[bloom {}, blur scale {:.2}]", if bloom { "on" } else { "off" }, blur_scale)
}

/// `<title> - <fps> fps [bloom on, blur scale 1.00]`，还没有 fps 时省略中间部分
pub fn window_title(title: &str, fps: Option<u32>, bloom: bool, blur_scale: f32) -> String {
    match fps {
        Some(fps) => format!("{} - {} fps {}", title, fps, title_suffix(bloom, blur_scale)),
        None => format!("{} {}", title, title_suffix(bloom, blur_scale)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(target_os = "android"))]
    #[test]
    fn test_desktop_wording() {
        let lines = help_lines();
        assert_eq!(lines[0].text, "Press \"NUMPAD +/-\" to change blur scale");
        assert_eq!(lines[1].text, "Press \"B\" to toggle bloom");
    }

    #[cfg(target_os = "android")]
    #[test]
    fn test_android_wording() {
        let lines = help_lines();
        assert_eq!(lines[0].text, "Press \"L1/R1\" to change blur scale");
        assert_eq!(lines[1].text, "Press \"Button A\" to toggle bloom");
    }

    #[test]
    fn test_positions() {
        let lines = help_lines();
        assert_eq!(lines[0].position, glam::vec2(5.0, 85.0));
        assert_eq!(lines[1].position, glam::vec2(5.0, 105.0));
    }

    #[test]
    fn test_window_title() {
        assert_eq!(title_suffix(false, 1.25), "[bloom off, blur scale 1.25]");
        assert_eq!(
            window_title("Vulkan Example - Bloom", Some(60), true, 1.0),
            "Vulkan Example - Bloom - 60 fps [bloom on, blur scale 1.00]"
        );
        assert_eq!(window_title("bloom", None, true, -0.5), "bloom [bloom on, blur scale -0.50]");
    }
}
