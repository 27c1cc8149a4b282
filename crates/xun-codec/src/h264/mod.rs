//! H.264 码流重组与组帧.
//!
//! RTP 侧流动的是 Annex B 字节流 (起始码分隔), 硬件解码器消费 4 字节
//! 大端长度前缀格式 (AVCC); 硬件编码器把 SPS/PPS 作为一次性的配置
//! 缓冲区输出, RTP 侧却要求关键帧自描述. 本模块的两个核心状态机分别
//! 消除这两处错配:
//!
//! - [`reframer::AnnexBReframer`]: 接收方向, 原地改写起始码为长度前缀,
//!   分流带内 SPS/PPS 并在配对完整时产生解码器配置事件;
//! - [`framer::EncodeFramer`]: 发送方向, 缓存编码器的配置输出并前置到
//!   每个关键帧, 再按打包器协议分片.

pub mod framer;
pub mod nal;
pub mod reframer;
pub mod session;

pub use framer::EncodeFramer;
pub use nal::NalUnitType;
pub use reframer::{AnnexBReframer, NalRecord, ParameterSetCache, ReframeOutcome};
pub use session::H264MediaSession;
