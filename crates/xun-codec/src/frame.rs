//! 帧类型定义.
//!
//! 会话框架中流动的数据单元: 压缩帧 (编码器输出/RTP 载荷解析结果) 与
//! 原始帧 (PCM 采样/像素数据). 压缩音频帧附带逐帧的码流元数据
//! (AMR 的帧类型/模式/质量位等), 供载荷打包与解码器消费.

use bytes::Bytes;

/// AMR 帧的码流元数据
///
/// 解析 RTP 载荷或编码器输出时逐帧构造, 不跨调用持久化.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmrBitInfo {
    /// 帧类型 (0-15, 按 3GPP 模式表编码语音/SID/无数据)
    pub frame_type: u8,
    /// 当前编码模式, -1 表示未知
    pub mode: i8,
    /// 质量位 (好帧/坏帧)
    pub good_quality: bool,
    /// SID 类型指示位 (STI)
    pub sti: bool,
}

/// 压缩帧附带的逐帧元数据
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameInfo {
    /// 无特定元数据
    None,
    /// AMR 码流元数据
    Amr(AmrBitInfo),
}

/// 压缩音频帧
///
/// 一个离散的码流帧: 载荷解析的产物 (逐帧交给解码器), 或编码器的
/// 输出 (累积后交给载荷打包).
#[derive(Debug, Clone)]
pub struct CodedAudioFrame {
    /// 码流数据 (不含任何 RTP 载荷头)
    pub data: Bytes,
    /// RTP 时间戳 (编解码器时钟单位)
    pub timestamp: i64,
    /// 逐帧元数据
    pub info: FrameInfo,
}

impl CodedAudioFrame {
    /// 获取 AMR 元数据 (如果有)
    pub fn amr_info(&self) -> Option<&AmrBitInfo> {
        match &self.info {
            FrameInfo::Amr(info) => Some(info),
            FrameInfo::None => None,
        }
    }
}

/// 原始音频帧 (16-bit PCM, 交错声道)
#[derive(Debug, Clone)]
pub struct RawAudioFrame {
    /// PCM 采样
    pub samples: Vec<i16>,
    /// RTP 时间戳
    pub timestamp: i64,
}

/// 原始视频帧 (送入硬件编码器的像素数据, 通常为 I420)
#[derive(Debug, Clone)]
pub struct RawVideoFrame {
    /// 像素数据
    pub data: Bytes,
    /// RTP 时间戳 (90 kHz)
    pub timestamp: i64,
    /// 是否强制产生关键帧
    pub force_keyframe: bool,
}

/// 解码后的视频帧
#[derive(Debug, Clone)]
pub struct DecodedVideoFrame {
    /// 像素数据 (硬件解码器输出格式)
    pub data: Bytes,
    /// 宽度 (像素)
    pub width: u32,
    /// 高度 (像素)
    pub height: u32,
    /// RTP 时间戳 (90 kHz)
    pub timestamp: i64,
}
