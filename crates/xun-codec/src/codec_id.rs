//! 编解码器标识.

use std::fmt;

use xun_core::MediaType;

/// 编解码器标识
///
/// 会话框架支持的编解码器集合. 实际的采样/像素变换由外部硬件编解码器
/// 完成, 这里只描述 RTP 侧需要区分的类型.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecId {
    /// AMR 窄带语音 (8 kHz, RFC 4867)
    AmrNb,
    /// AMR 宽带语音 (16 kHz, RFC 4867)
    AmrWb,
    /// H.264 / AVC
    H264,
}

impl CodecId {
    /// 编解码器名称 (SDP encoding name)
    pub fn name(&self) -> &'static str {
        match self {
            Self::AmrNb => "AMR",
            Self::AmrWb => "AMR-WB",
            Self::H264 => "H264",
        }
    }

    /// 平台编解码器的 MIME 类型
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::AmrNb => "audio/3gpp",
            Self::AmrWb => "audio/amr-wb",
            Self::H264 => "video/avc",
        }
    }

    /// 媒体类型
    pub fn media_type(&self) -> MediaType {
        match self {
            Self::AmrNb | Self::AmrWb => MediaType::Audio,
            Self::H264 => MediaType::Video,
        }
    }

    /// RTP 时钟频率 (Hz)
    pub fn clock_rate(&self) -> u32 {
        match self {
            Self::AmrNb => 8000,
            Self::AmrWb => 16000,
            Self::H264 => 90000,
        }
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
