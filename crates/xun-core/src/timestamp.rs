//! 时间戳常量与工具.
//!
//! RTP 时间戳以编解码器时钟频率为单位 (音频为采样率, H.264 固定 90 kHz),
//! 这里只提供框架内共用的常量和换算工具.

/// 按时钟频率把毫秒时长换算为时间戳增量 (采样数)
///
/// ```
/// use xun_core::timestamp::samples_for_duration_ms;
///
/// // AMR-NB: 8kHz 时钟下 20ms 一帧 = 160 采样
/// assert_eq!(samples_for_duration_ms(8000, 20), 160);
/// ```
pub const fn samples_for_duration_ms(clock_rate: u32, duration_ms: u32) -> u32 {
    clock_rate / 1000 * duration_ms
}
