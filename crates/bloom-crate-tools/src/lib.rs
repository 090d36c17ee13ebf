//! 各个 crate 共享的工具
//!
//! - [`init_log`]：带颜色的 env_logger 初始化
//! - [`resource`]：基于工作区根目录的统一路径管理

pub mod init_log;
pub mod resource;
