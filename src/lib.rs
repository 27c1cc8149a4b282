//! # Xun (迅)
//!
//! 纯 Rust 实现的 RTP 媒体编解码会话框架: 把平台硬件编解码器包装成
//! 可直接挂接 RTP 收发的音频/视频会话.
//!
//! 硬件编解码器 (及其软件回退) 负责压缩与解压; 本框架补齐网络侧需要
//! 而硬件不提供的缓冲区变换:
//! - **AMR/AMR-WB**: RFC 4867 载荷打包/解析, CMR 码率模式自适应;
//! - **H.264**: Annex B ↔ 长度前缀码流重组, SPS/PPS 参数集缓存与
//!   关键帧自描述.
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use xun::codec::{CodecId, SessionFactory};
//!
//! let factory = SessionFactory::new();
//! println!("已注册音频会话: {:?}", factory.list_audio());
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `xun-core` | 错误类型、位流读写、有界重试等核心工具 |
//! | `xun-codec` | 编解码会话框架与 AMR/H.264 缓冲区变换 |

/// 核心类型与工具
pub use xun_core as core;

/// 编解码会话框架
pub use xun_codec as codec;

/// 日志初始化
pub mod logging;

/// 获取 Xun 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
