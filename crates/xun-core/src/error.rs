//! 统一错误类型定义.
//!
//! 所有 Xun crate 共用的错误类型, 支持跨模块传播.
//!
//! 码流组帧相关的错误 (`MalformedPayload`, `MalformedBitstream` 等) 一律
//! 以失败结果的形式返回给调用方, 组帧逻辑内部不做任何重试; 重试只存在于
//! 硬件缓冲区队列的轮询中 (见 `retry` 模块).

use thiserror::Error;

/// Xun 框架统一错误类型
#[derive(Debug, Error)]
pub enum XunError {
    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 不支持的操作
    #[error("不支持的操作: {0}")]
    Unsupported(String),

    /// 不支持的打包模式 (SDP 协商出的 packetization-mode 未实现)
    #[error("不支持的打包模式: {0}")]
    UnsupportedMode(u8),

    /// RTP 载荷头部/ToC 与缓冲区长度不一致
    #[error("载荷格式错误: {0}")]
    MalformedPayload(String),

    /// 码流不满足重组所需的结构约束 (起始码缺失、零长度 NAL 等)
    #[error("码流格式错误: {0}")]
    MalformedBitstream(String),

    /// 调用方提供的输出缓冲区不足 (写入前检查, 而非写入后)
    #[error("输出缓冲区不足: 需要 {required} 字节, 可用 {available} 字节")]
    BufferTooSmall { required: usize, available: usize },

    /// 暂存缓冲区容量不足
    #[error("缓冲区溢出: 需要 {required} 字节, 容量 {capacity} 字节")]
    BufferOverflow { required: usize, capacity: usize },

    /// 编解码器错误
    #[error("编解码器错误: {0}")]
    Codec(String),

    /// 未找到指定的编解码器
    #[error("未找到编解码器: {0}")]
    CodecNotFound(String),

    /// 数据不足, 需要更多输入
    #[error("数据不足, 需要更多输入")]
    NeedMoreData,

    /// 已到达流末尾
    #[error("已到达流末尾")]
    Eof,

    /// 有界重试预算耗尽
    #[error("等待超时: {0}")]
    Timeout(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 内部错误 (不应发生)
    #[error("内部错误: {0}")]
    Internal(String),
}

/// Xun 框架统一 Result 类型
pub type XunResult<T> = Result<T, XunError>;
