//! 编解码会话 trait 定义.
//!
//! 会话是单线程同步使用的: 拥有会话的媒体线程依次发起调用, 同一会话
//! 不会并发执行编码和解码, 因此实现内部无需加锁. 除"已缓存参数集"与
//! "进行中的分片"这两处显式单槽状态外, 调用之间不缓冲不重排.

use bytes::Bytes;
use xun_core::XunResult;

use crate::codec_id::CodecId;
use crate::frame::{CodedAudioFrame, DecodedVideoFrame, RawAudioFrame, RawVideoFrame};
use crate::session_params::{AudioSessionParams, VideoSessionParams};

/// 音频编解码会话
///
/// 编码方向: `encode` (PCM → 码流帧) 后 `pack` (帧 → RTP 载荷);
/// 解码方向: `parse` (RTP 载荷 → 帧) 后逐帧 `decode` (帧 → PCM).
pub trait AudioCodecSession: Send {
    /// 编解码器标识
    fn codec_id(&self) -> CodecId;

    /// 会话名称
    fn name(&self) -> &str;

    /// 按协商参数打开会话
    fn open(&mut self, params: &AudioSessionParams) -> XunResult<()>;

    /// 关闭会话, 停止硬件实例
    fn close(&mut self) -> XunResult<()>;

    /// 把一个 RTP 载荷解析为按传输顺序排列的码流帧序列
    ///
    /// 副作用: 载荷中的 CMR 字段可能更新会话的当前编码模式
    /// (远端解码器请求本端编码器切换码率模式).
    fn parse(&mut self, payload: &[u8], timestamp: i64) -> XunResult<Vec<CodedAudioFrame>>;

    /// 把编码器产出的码流帧打包为一个 RTP 载荷
    ///
    /// 载荷超出 `max_payload_size` 时返回 `BufferTooSmall`.
    fn pack(&mut self, frames: &[CodedAudioFrame], max_payload_size: usize) -> XunResult<Bytes>;

    /// 编码 PCM 采样 (可含多个 20ms 帧)
    ///
    /// 组帧失败时返回 `Ok(None)` (等价于静音帧), 不向网络传播垃圾数据.
    fn encode(&mut self, input: &RawAudioFrame) -> XunResult<Option<Vec<CodedAudioFrame>>>;

    /// 解码单个码流帧为 PCM
    fn decode(&mut self, frame: &CodedAudioFrame) -> XunResult<RawAudioFrame>;
}

/// 视频编解码会话
///
/// 编码方向按"begin/more"协议产出 RTP 载荷分片: `encode_begin` 送入
/// 原始帧并返回第一个分片, 之后只要 `has_more` 为真就继续调用
/// `encode_more`, 直到当前编码帧 (含前置参数集) 全部打包完毕.
pub trait VideoCodecSession: Send {
    /// 编解码器标识
    fn codec_id(&self) -> CodecId;

    /// 会话名称
    fn name(&self) -> &str;

    /// 按协商参数打开会话
    ///
    /// 协商的 packetization-mode 未实现时返回 `UnsupportedMode`.
    fn open(&mut self, params: &VideoSessionParams) -> XunResult<()>;

    /// 关闭会话, 停止硬件实例
    fn close(&mut self) -> XunResult<()>;

    /// 编码一帧并取第一个 RTP 载荷分片
    ///
    /// 返回 `(分片, has_more)`; 分片为 `None` 表示本帧无输出
    /// (参数集缓冲区被缓存, 或组帧失败被吞为无输出帧).
    fn encode_begin(&mut self, input: &RawVideoFrame) -> XunResult<(Option<Bytes>, bool)>;

    /// 取当前编码帧的下一个 RTP 载荷分片
    fn encode_more(&mut self) -> XunResult<(Option<Bytes>, bool)>;

    /// 解码: 一组 RTP 载荷 (同一帧) → 解码帧
    ///
    /// 返回 `Ok(None)` 表示尚无输出 (解码器未配置、等待关键帧或
    /// 硬件输出未就绪); 组帧错误向上传播, 由上层决定请求关键帧还是
    /// 丢弃本帧.
    fn decode(&mut self, payloads: &[Bytes], timestamp: i64) -> XunResult<Option<DecodedVideoFrame>>;

    /// 请求本端编码器立即产生关键帧
    fn request_keyframe(&mut self) -> XunResult<()>;
}
