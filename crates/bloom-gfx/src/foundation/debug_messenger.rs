use std::ffi::CStr;

use ash::vk;

/// VK_EXT_debug_utils 的 messenger，将 validation 消息转发到 log
pub struct GfxDebugMsger {
    pub vk_debug_utils_instance: ash::ext::debug_utils::Instance,
    pub vk_debug_utils_messenger: vk::DebugUtilsMessengerEXT,
}

impl GfxDebugMsger {
    pub fn new(vk_pf: &ash::Entry, instance: &ash::Instance) -> Self {
        let loader = ash::ext::debug_utils::Instance::new(vk_pf, instance);

        let create_info = Self::debug_utils_messenger_ci();
        let debug_messenger = unsafe { loader.create_debug_utils_messenger(&create_info, None).unwrap() };

        Self {
            vk_debug_utils_instance: loader,
            vk_debug_utils_messenger: debug_messenger,
        }
    }

    pub fn destroy(self) {
        // 触发 drop 进行销毁
    }

    /// 用于创建 debug messenger 的结构体
    ///
    /// 只关心 WARNING 和 ERROR
    pub fn debug_utils_messenger_ci() -> vk::DebugUtilsMessengerCreateInfoEXT<'static> {
        vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(vk_debug_callback))
    }
}

impl Drop for GfxDebugMsger {
    fn drop(&mut self) {
        unsafe {
            log::info!("destroying debug messenger");
            self.vk_debug_utils_instance.destroy_debug_utils_messenger(self.vk_debug_utils_messenger, None);
        }
    }
}

/// 格式化 validation 消息
///
/// 新版 validation layer 输出 json，其中 MainMessage 字段带有换行符，需要单独输出；
/// 非 json 消息原样保留
fn format_validation_message(msg_type: vk::DebugUtilsMessageTypeFlagsEXT, msg: &str) -> String {
    let mut json_value = serde_json::from_str::<serde_json::Value>(msg).ok();
    let json_obj = json_value.as_mut().and_then(|v| v.as_object_mut());

    match json_obj {
        Some(obj) => {
            let main_msg = obj.remove("MainMessage");
            let main_msg_str = main_msg.as_ref().and_then(|v| v.as_str()).unwrap_or_default();
            let rest = serde_json::to_string_pretty(obj).unwrap_or_default();
            format!("[{:?}]\n{}\n{}\n", msg_type, rest, main_msg_str)
        }
        None => format!("[{:?}]\n{}\n", msg_type, msg),
    }
}

/// debug messenger 的回调函数
///
/// # Safety
/// 由 validation layer 调用，p_callback_data 在回调期间有效
unsafe extern "system" fn vk_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    let callback_data = unsafe { *p_callback_data };

    let msg = if callback_data.p_message.is_null() {
        std::borrow::Cow::from("")
    } else {
        unsafe { CStr::from_ptr(callback_data.p_message).to_string_lossy() }
    };
    let format_msg = format_validation_message(message_type, msg.as_ref());

    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => log::error!("{}", format_msg),
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => log::warn!("{}", format_msg),
        _ => log::info!("{}", format_msg),
    };

    // 只有 layer developer 才需要返回 True
    vk::FALSE
}

/// 可以设置 debug name 的 vulkan 对象
pub trait DebugType {
    fn debug_type_name() -> &'static str;
    fn vk_handle(&self) -> impl vk::Handle;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_message_is_kept() {
        let msg = format_validation_message(vk::DebugUtilsMessageTypeFlagsEXT::GENERAL, "loader message");
        assert!(msg.contains("loader message"));
    }

    #[test]
    fn test_json_main_message_is_split_out() {
        let raw = r#"{"MainMessage": "line1\nline2", "MessageID": 42}"#;
        let msg = format_validation_message(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION, raw);
        assert!(msg.ends_with("line1\nline2\n"));
        assert!(msg.contains("\"MessageID\": 42"));
        assert!(!msg.contains("MainMessage"));
    }
}
