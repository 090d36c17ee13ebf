//! bloom 示例的应用层
//!
//! 与硬件无关的部分（uniform 计算、blur 参数、pipeline 描述、命令录制顺序、提交顺序、
//! 按键映射、配置）都可以脱离 Vulkan device 单独测试。

pub mod app;
pub mod bloom;
pub mod config;
pub mod overlay;
pub mod platform;
pub mod scene;
pub mod window_system;
