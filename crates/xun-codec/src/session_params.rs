//! 会话参数.
//!
//! 传递给编解码会话的配置信息, 来自 SDP/fmtp 协商结果与部署配置.
//! 会话框架不解析 SDP 语法, 只消费上层已解析好的字段.
//!
//! H.264 的 profile/level、颜色格式、关键帧间隔等在不同部署中取值不一,
//! 一律作为调用方提供的参数而非硬编码常量.

use crate::codec_id::CodecId;

/// 默认视频宽度 (像素)
pub const DEFAULT_WIDTH: u32 = 352;
/// 默认视频高度 (像素)
pub const DEFAULT_HEIGHT: u32 = 288;
/// 默认帧率
pub const DEFAULT_FPS: u32 = 15;
/// 默认平均码率 (bits/s)
pub const DEFAULT_AVG_BITRATE: u32 = 256_000;
/// 默认峰值码率 (bits/s)
pub const DEFAULT_MAX_BITRATE: u32 = 256_000;
/// 接收方向支持的最大宽度
pub const MAX_RX_WIDTH: u32 = 1200;
/// 接收方向支持的最大高度
pub const MAX_RX_HEIGHT: u32 = 800;
/// 默认 RTP 载荷 MTU (字节)
pub const DEFAULT_MTU: usize = 1400;

/// 音频会话参数
#[derive(Debug, Clone)]
pub struct AudioSessionParams {
    /// 编解码器标识
    pub codec_id: CodecId,
    /// 时钟频率 (Hz)
    pub clock_rate: u32,
    /// 声道数
    pub channel_count: u32,
    /// 帧时长 (毫秒)
    pub frame_duration_ms: u32,
    /// 是否使用 octet-aligned 载荷布局 (RFC 4867 §8.3.1 协商结果,
    /// 编码/解码子会话必须一致, 会话生命周期内不变)
    pub octet_aligned: bool,
    /// 初始编码模式 (0-7 NB / 0-8 WB)
    pub initial_mode: u8,
}

impl AudioSessionParams {
    /// AMR 窄带默认参数
    pub fn amr_nb(octet_aligned: bool) -> Self {
        Self {
            codec_id: CodecId::AmrNb,
            clock_rate: 8000,
            channel_count: 1,
            frame_duration_ms: 20,
            octet_aligned,
            initial_mode: 7,
        }
    }

    /// AMR 宽带默认参数
    pub fn amr_wb(octet_aligned: bool) -> Self {
        Self {
            codec_id: CodecId::AmrWb,
            clock_rate: 16000,
            channel_count: 1,
            frame_duration_ms: 20,
            octet_aligned,
            initial_mode: 8,
        }
    }
}

/// 视频会话参数
#[derive(Debug, Clone)]
pub struct VideoSessionParams {
    /// 编码宽度 (像素)
    pub width: u32,
    /// 编码高度 (像素)
    pub height: u32,
    /// 帧率
    pub fps: u32,
    /// 平均码率 (bits/s)
    pub avg_bit_rate: u32,
    /// 峰值码率 (bits/s)
    pub max_bit_rate: u32,
    /// RTP 载荷 MTU (字节)
    pub mtu: usize,
    /// SDP 协商的 packetization-mode (仅支持 0/1)
    pub packetization_mode: u8,
    /// 协商的 sprop-parameter-sets, 已由 SDP 层 base64 解码为
    /// Annex-B 字节流 (起始码分隔的 SPS/PPS); 为空表示带内获取
    pub sprop_parameter_sets: Vec<u8>,
    /// profile-level-id (如 0x42e01e), 部署配置
    pub profile_level_id: u32,
    /// 硬件编码器颜色格式常量, 部署配置
    pub color_format: i32,
    /// 关键帧间隔 (秒), 部署配置
    pub keyframe_interval_sec: u32,
    /// 接收方向重组缓冲区容量 (字节); 0 表示按最大接收分辨率推导
    pub dec_buf_size: usize,
}

impl VideoSessionParams {
    /// 实际使用的重组缓冲区容量
    ///
    /// 未显式指定时按最大接收分辨率的 I420 帧大小推导.
    pub fn effective_dec_buf_size(&self) -> usize {
        if self.dec_buf_size > 0 {
            self.dec_buf_size
        } else {
            (MAX_RX_WIDTH * MAX_RX_HEIGHT * 3 / 2) as usize
        }
    }
}

impl Default for VideoSessionParams {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fps: DEFAULT_FPS,
            avg_bit_rate: DEFAULT_AVG_BITRATE,
            max_bit_rate: DEFAULT_MAX_BITRATE,
            mtu: DEFAULT_MTU,
            packetization_mode: 1,
            sprop_parameter_sets: Vec::new(),
            profile_level_id: 0x42e01e,
            color_format: 0,
            keyframe_interval_sec: 2,
            dec_buf_size: 0,
        }
    }
}
