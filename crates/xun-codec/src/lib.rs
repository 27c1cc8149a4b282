//! # xun-codec
//!
//! Xun 媒体会话框架的编解码库: 把平台硬件编解码器包装成 RTP 就绪的
//! 音频/视频会话.
//!
//! 硬件编解码器只做压缩/解压, 对 RTP 一无所知; 网络侧的载荷格式与
//! 码流自描述要求由本 crate 的纯缓冲区变换层补齐:
//!
//! - **AMR/AMR-WB** ([`amr`]): RFC 4867 载荷打包/解析 (octet-aligned 与
//!   bandwidth-efficient 两种布局), CMR 码率模式自适应;
//! - **H.264** ([`h264`]): Annex B ↔ 长度前缀码流重组, SPS/PPS 参数集
//!   缓存与关键帧自描述.
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use xun_codec::{CodecId, SessionFactory};
//!
//! let mut factory = SessionFactory::new();
//! factory.register_audio(CodecId::AmrNb, "amr-mediacodec", Box::new(|| {
//!     Ok(Box::new(make_amr_session()?))
//! }));
//!
//! let mut session = factory.create_audio(CodecId::AmrNb)?;
//! session.open(&AudioSessionParams::amr_nb(true))?;
//! ```

pub mod amr;
pub mod codec_id;
pub mod factory;
pub mod frame;
pub mod h264;
pub mod hardware;
pub mod rtp;
pub mod session;
pub mod session_params;

// 重导出常用类型
pub use codec_id::CodecId;
pub use factory::{AudioSessionCtor, SessionFactory, VideoSessionCtor};
pub use frame::{
    AmrBitInfo, CodedAudioFrame, DecodedVideoFrame, FrameInfo, RawAudioFrame, RawVideoFrame,
};
pub use hardware::{
    CodedBuffer, CodedFlags, FormatChangeSink, HardwareCodec, MediaFormat, OutputEvent,
};
pub use rtp::{Depacketizer, Packetizer};
pub use session::{AudioCodecSession, VideoCodecSession};
pub use session_params::{AudioSessionParams, VideoSessionParams};
