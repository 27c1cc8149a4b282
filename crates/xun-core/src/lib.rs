//! # xun-core
//!
//! Xun 媒体编解码会话框架核心库, 提供基础类型定义、错误处理和工具函数.
//!
//! 本 crate 为整个 Xun 框架提供底层基础设施: 统一错误类型、比特流读写
//! (AMR 带宽高效载荷布局所需)、硬件缓冲区队列的有界重试辅助等.

pub mod bitreader;
pub mod bitwriter;
pub mod error;
pub mod media_type;
pub mod retry;
pub mod timestamp;

// 重导出常用类型
pub use error::{XunError, XunResult};
pub use media_type::MediaType;
pub use retry::PollBudget;
