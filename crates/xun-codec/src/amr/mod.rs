//! AMR/AMR-WB RTP 载荷编解码 (RFC 4867).
//!
//! 把一个 RTP 载荷 (CMR + ToC + 若干语音/SID 数据段) 与带元数据的离散
//! 码流帧序列互相转换. 两种布局都必须支持且由会话协商结果选定, 永不
//! 自动探测:
//!
//! - **octet-aligned**: 所有字段填充到字节边界;
//! - **bandwidth-efficient**: 所有字段按位连续打包, 仅末尾补齐.
//!
//! 本模块是纯缓冲区变换, 无硬件依赖; 语音编解码本身发生在平台编解码
//! 器内部 (见 `session` 子模块).

pub mod payload;
pub mod session;
pub mod tables;

pub use payload::{pack, parse};
pub use session::AmrMediaSession;

/// 每个 RTP 包的最大帧数 (最大帧时长 200ms ÷ 20ms)
pub const MAX_FRAMES_PER_PACKET: usize = 10;

/// 每帧时长 (毫秒)
pub const FRAME_DURATION_MS: u32 = 20;

/// "无模式请求"的 CMR 值
pub const CMR_NONE: u8 = 15;

/// AMR 变体 (窄带/宽带)
///
/// 会话协商时固定, 生命周期内不变.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmrVariant {
    /// 窄带 (8 kHz)
    Nb,
    /// 宽带 (16 kHz)
    Wb,
}

impl AmrVariant {
    /// 时钟频率 (Hz)
    pub fn clock_rate(&self) -> u32 {
        match self {
            Self::Nb => 8000,
            Self::Wb => 16000,
        }
    }

    /// 每帧采样数 (20ms)
    pub fn samples_per_frame(&self) -> usize {
        match self {
            Self::Nb => 160,
            Self::Wb => 320,
        }
    }

    /// 最大编码模式 (NB 0-7, WB 0-8)
    pub fn max_mode(&self) -> u8 {
        match self {
            Self::Nb => 7,
            Self::Wb => 8,
        }
    }

    /// SID 帧类型值 (NB 8, WB 9)
    pub fn sid_frame_type(&self) -> u8 {
        match self {
            Self::Nb => 8,
            Self::Wb => 9,
        }
    }

    /// 指定帧类型的核心帧字节数
    pub fn frame_len(&self, frame_type: u8) -> usize {
        match self {
            Self::Nb => tables::AMRNB_FRAME_LEN[frame_type as usize & 0x0F],
            Self::Wb => tables::AMRWB_FRAME_LEN[frame_type as usize & 0x0F],
        }
    }

    /// 指定帧类型的核心帧位数
    pub fn frame_bits(&self, frame_type: u8) -> usize {
        match self {
            Self::Nb => tables::AMRNB_FRAME_BITS[frame_type as usize & 0x0F],
            Self::Wb => tables::AMRWB_FRAME_BITS[frame_type as usize & 0x0F],
        }
    }

    /// 指定模式的码率 (bits/s)
    pub fn bitrate(&self, mode: u8) -> Option<u32> {
        match self {
            Self::Nb => tables::AMRNB_BITRATES.get(mode as usize).copied(),
            Self::Wb => tables::AMRWB_BITRATES.get(mode as usize).copied(),
        }
    }

    /// 按核心帧字节数反查帧类型
    ///
    /// 各模式长度互不相同, 硬件编码器的输出仅凭字节数即可归类.
    pub fn frame_type_for_len(&self, len: usize) -> Option<u8> {
        if len == 0 {
            return Some(tables::FT_NO_DATA);
        }
        let table = match self {
            Self::Nb => &tables::AMRNB_FRAME_LEN,
            Self::Wb => &tables::AMRWB_FRAME_LEN,
        };
        table
            .iter()
            .position(|&l| l == len && l > 0)
            .map(|ft| ft as u8)
    }
}

/// AMR 载荷打包/解析设置
///
/// 会话协商的逐会话状态; `octet_aligned` 在编码/解码两个子会话间必须
/// 一致 (RFC 4867 §8.3.1).
#[derive(Debug, Clone, Copy)]
pub struct AmrPackSetting {
    /// NB/WB 变体
    pub variant: AmrVariant,
    /// 是否使用 octet-aligned 布局
    pub octet_aligned: bool,
    /// 打包时写入的 CMR 字段值 (本端请求远端编码器使用的模式, 15 表示无请求)
    pub cmr: u8,
}

impl AmrPackSetting {
    /// 创建设置 (无 CMR 请求)
    pub fn new(variant: AmrVariant, octet_aligned: bool) -> Self {
        Self {
            variant,
            octet_aligned,
            cmr: CMR_NONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_变体属性() {
        assert_eq!(AmrVariant::Nb.max_mode(), 7);
        assert_eq!(AmrVariant::Wb.max_mode(), 8);
        assert_eq!(AmrVariant::Nb.sid_frame_type(), 8);
        assert_eq!(AmrVariant::Wb.sid_frame_type(), 9);
        assert_eq!(AmrVariant::Nb.samples_per_frame(), 160);
        assert_eq!(AmrVariant::Wb.samples_per_frame(), 320);
    }

    #[test]
    fn test_长度反查帧类型() {
        assert_eq!(AmrVariant::Nb.frame_type_for_len(31), Some(7));
        assert_eq!(AmrVariant::Nb.frame_type_for_len(5), Some(8));
        assert_eq!(AmrVariant::Nb.frame_type_for_len(0), Some(15));
        assert_eq!(AmrVariant::Nb.frame_type_for_len(99), None);
        assert_eq!(AmrVariant::Wb.frame_type_for_len(60), Some(8));
        assert_eq!(AmrVariant::Wb.frame_type_for_len(5), Some(9));
    }

    #[test]
    fn test_码率查表() {
        assert_eq!(AmrVariant::Nb.bitrate(7), Some(12200));
        assert_eq!(AmrVariant::Nb.bitrate(8), None);
        assert_eq!(AmrVariant::Wb.bitrate(8), Some(23850));
    }
}
