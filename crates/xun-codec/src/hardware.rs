//! 硬件编解码器协作方接口.
//!
//! 平台硬件编解码器 (及其软件回退) 对会话框架完全不透明: 框架只通过
//! 这里定义的窄接口驱动其缓冲区队列协议 (取输入缓冲区 → 拷贝字节 →
//! 入队 → 取输出缓冲区 → 释放), 并依据标志/NAL 头做分类决策.
//!
//! 队列的"暂无可用缓冲区"状态通过 `Option`/`OutputEvent::Pending` 表达,
//! 由会话层用 `xun_core::retry` 的有界轮询驱动; 接口实现本身不阻塞.

use bitflags::bitflags;
use bytes::Bytes;
use xun_core::XunResult;

bitflags! {
    /// 压缩缓冲区标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CodedFlags: u32 {
        /// 配置数据 (H.264 的 SPS/PPS 参数集缓冲区)
        const CONFIG = 1 << 0;
        /// 关键帧 (IDR)
        const KEYFRAME = 1 << 1;
        /// 流结束
        const EOS = 1 << 2;
    }
}

/// 平台编解码器格式描述
///
/// 配置硬件编解码器实例时使用的键值集合, 对应平台媒体格式对象.
#[derive(Debug, Clone, Default)]
pub struct MediaFormat {
    /// MIME 类型 (如 "audio/3gpp", "video/avc")
    pub mime: String,
    /// 采样率 (音频)
    pub sample_rate: u32,
    /// 声道数 (音频)
    pub channel_count: u32,
    /// 码率 (bits/s)
    pub bit_rate: u32,
    /// 宽度 (视频)
    pub width: u32,
    /// 高度 (视频)
    pub height: u32,
    /// 帧率 (视频)
    pub frame_rate: u32,
    /// 颜色格式常量 (视频编码器, 部署配置)
    pub color_format: i32,
    /// 关键帧间隔 (秒, 视频编码器)
    pub keyframe_interval_sec: u32,
    /// 编解码器专有配置数据 (H.264 解码器的 SPS/PPS)
    pub csd: Vec<Vec<u8>>,
}

/// 从硬件编解码器取出的压缩/原始数据缓冲区
///
/// 缓冲区从属于编解码器的内部缓冲池, 借用期间只读; 消费完毕后必须
/// 通过 [`HardwareCodec::release_output`] 恰好释放一次, 否则缓冲池
/// 会耗尽并使编解码器停转.
#[derive(Debug, Clone)]
pub struct CodedBuffer {
    /// 缓冲区索引 (释放时回传)
    pub index: usize,
    /// 数据
    pub data: Bytes,
    /// 时间戳
    pub timestamp: i64,
    /// 标志
    pub flags: CodedFlags,
}

/// 输出队列事件
#[derive(Debug, Clone)]
pub enum OutputEvent {
    /// 取得一个输出缓冲区
    Buffer(CodedBuffer),
    /// 输出格式变化 (解码器检测到新的宽高)
    FormatChanged(MediaFormat),
    /// 暂无输出可用
    Pending,
}

/// 动态参数键: 请求编码器立即产生关键帧
pub const PARAM_REQUEST_KEYFRAME: &str = "request-sync";
/// 动态参数键: 调整编码码率 (bits/s)
pub const PARAM_BITRATE: &str = "video-bitrate";

/// 平台硬件编解码器实例 (单方向: 编码器或解码器)
pub trait HardwareCodec: Send {
    /// 配置实例
    fn configure(&mut self, format: &MediaFormat) -> XunResult<()>;

    /// 启动
    fn start(&mut self) -> XunResult<()>;

    /// 停止
    fn stop(&mut self) -> XunResult<()>;

    /// 尝试取一个输入缓冲区, 暂无可用时返回 `None`
    fn try_dequeue_input(&mut self) -> XunResult<Option<usize>>;

    /// 向输入缓冲区写入数据并入队
    fn queue_input(
        &mut self,
        index: usize,
        data: &[u8],
        timestamp: i64,
        flags: CodedFlags,
    ) -> XunResult<()>;

    /// 尝试取一个输出缓冲区或格式变化事件
    fn try_dequeue_output(&mut self) -> XunResult<OutputEvent>;

    /// 释放输出缓冲区 (每个缓冲区恰好一次)
    fn release_output(&mut self, index: usize) -> XunResult<()>;

    /// 设置动态参数 (码率调整、关键帧请求等)
    fn set_parameter(&mut self, key: &str, value: i32) -> XunResult<()>;
}

/// 解码器输出格式变化的事件接收方
///
/// 事件总线本身由上层框架提供, 会话只负责在硬件解码器报告格式变化时
/// 发出通知.
pub trait FormatChangeSink: Send {
    /// 解码输出的宽高发生变化
    fn on_format_change(&mut self, width: u32, height: u32);
}
