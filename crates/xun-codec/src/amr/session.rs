//! AMR 音频会话.
//!
//! 把 RFC 4867 载荷变换与平台硬件编解码器的缓冲区队列协议组合成一个
//! [`AudioCodecSession`] 实现. 编码/解码各持一个硬件实例, 队列的
//! "暂无缓冲区"状态用有界轮询消化, 预算耗尽的编码调用退化为无输出
//! (等价静音帧) 而不是向网络传播垃圾数据.

use bytes::Bytes;
use xun_core::retry::{poll_bounded, PollBudget};
use xun_core::timestamp::samples_for_duration_ms;
use xun_core::{XunError, XunResult};

use crate::codec_id::CodecId;
use crate::frame::{CodedAudioFrame, FrameInfo, RawAudioFrame};
use crate::hardware::{CodedFlags, HardwareCodec, MediaFormat, OutputEvent, PARAM_BITRATE};
use crate::session::AudioCodecSession;
use crate::session_params::AudioSessionParams;

use super::payload::{self, bit_info_for};
use super::{AmrPackSetting, AmrVariant, CMR_NONE};

/// AMR/AMR-WB 音频会话
///
/// `enc`/`dec` 是同一编解码器的两个单方向硬件实例. 会话由单个媒体线程
/// 依次调用, 内部不加锁.
pub struct AmrMediaSession<H: HardwareCodec> {
    variant: AmrVariant,
    enc: H,
    dec: H,
    /// 打包方向设置 (cmr 字段为本端向远端请求的模式)
    pack_setting: AmrPackSetting,
    /// 解析方向设置
    parse_setting: AmrPackSetting,
    /// 本端编码器当前模式 (远端 CMR 可随时调低/调高)
    enc_mode: u8,
    channel_count: u32,
    opened: bool,
    budget: PollBudget,
}

impl<H: HardwareCodec> AmrMediaSession<H> {
    /// 创建未打开的会话
    pub fn new(variant: AmrVariant, enc: H, dec: H) -> Self {
        Self {
            variant,
            enc,
            dec,
            pack_setting: AmrPackSetting::new(variant, true),
            parse_setting: AmrPackSetting::new(variant, true),
            enc_mode: variant.max_mode(),
            channel_count: 1,
            opened: false,
            budget: PollBudget::default(),
        }
    }

    /// 覆盖硬件队列的轮询预算
    pub fn with_poll_budget(mut self, budget: PollBudget) -> Self {
        self.budget = budget;
        self
    }

    /// 本端编码器当前模式
    pub fn current_encode_mode(&self) -> u8 {
        self.enc_mode
    }

    /// 向远端请求编码模式 (写入后续出方向载荷的 CMR 字段)
    pub fn request_remote_mode(&mut self, mode: u8) -> XunResult<()> {
        if mode != CMR_NONE && mode > self.variant.max_mode() {
            return Err(XunError::UnsupportedMode(mode));
        }
        self.pack_setting.cmr = mode;
        Ok(())
    }

    fn ensure_open(&self) -> XunResult<()> {
        if self.opened {
            Ok(())
        } else {
            Err(XunError::InvalidArgument("会话尚未打开".into()))
        }
    }

    /// 远端通过 CMR 请求本端编码器切换模式
    fn adapt_encode_mode(&mut self, cmr: u8) -> XunResult<()> {
        if cmr <= self.variant.max_mode() && cmr != self.enc_mode {
            let bitrate = self
                .variant
                .bitrate(cmr)
                .ok_or(XunError::UnsupportedMode(cmr))?;
            log::debug!(
                "CMR 请求切换编码模式: {} -> {} ({} bits/s)",
                self.enc_mode,
                cmr,
                bitrate
            );
            self.enc.set_parameter(PARAM_BITRATE, bitrate as i32)?;
            self.enc_mode = cmr;
        }
        Ok(())
    }

    /// 编码一个 20ms 采样块
    ///
    /// 返回 `Ok(None)` 表示本块无有效输出 (队列超时或编码器输出长度
    /// 无法归类), 调用方按静音帧处理.
    fn encode_one(&mut self, samples: &[i16], timestamp: i64) -> XunResult<Option<CodedAudioFrame>> {
        let mut pcm = Vec::with_capacity(samples.len() * 2);
        for s in samples {
            pcm.extend_from_slice(&s.to_le_bytes());
        }

        let enc = &mut self.enc;
        let index = match poll_bounded(self.budget, "编码器输入缓冲区", || enc.try_dequeue_input())
        {
            Ok(index) => index,
            Err(XunError::Timeout(what)) => {
                log::warn!("编码输入队列超时: {what}");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        enc.queue_input(index, &pcm, timestamp, CodedFlags::empty())?;

        let buffer = match poll_bounded(self.budget, "编码器输出缓冲区", || {
            match enc.try_dequeue_output()? {
                OutputEvent::Buffer(buf) => Ok(Some(buf)),
                // 音频编码器不产生格式变化, 有也直接跳过
                OutputEvent::FormatChanged(_) | OutputEvent::Pending => Ok(None),
            }
        }) {
            Ok(buffer) => buffer,
            Err(XunError::Timeout(what)) => {
                log::warn!("编码输出队列超时: {what}");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let data = Bytes::copy_from_slice(&buffer.data);
        enc.release_output(buffer.index)?;

        // 输出长度反查帧类型; 归类失败的输出一律不进入网络
        let Some(frame_type) = self.variant.frame_type_for_len(data.len()) else {
            log::warn!(
                "编码器输出 {} 字节, 不匹配任何帧类型, 丢弃",
                data.len()
            );
            return Ok(None);
        };

        let info = bit_info_for(self.variant, frame_type, true, &data)
            .map_err(|e| XunError::Codec(format!("编码器输出元数据无效: {e}")))?;
        Ok(Some(CodedAudioFrame {
            data,
            timestamp,
            info: FrameInfo::Amr(info),
        }))
    }

    /// 解码器输入格式: 1 字节 ToC (FT/Q) + 核心帧数据 (存储格式的单帧形态)
    fn decoder_input(frame: &CodedAudioFrame, info_ft: u8, good_quality: bool) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + frame.data.len());
        let quality = if good_quality { 0x04 } else { 0x00 };
        buf.push(((info_ft & 0x0F) << 3) | quality);
        buf.extend_from_slice(&frame.data);
        buf
    }

    fn silence(&self, timestamp: i64) -> RawAudioFrame {
        RawAudioFrame {
            samples: vec![0i16; self.variant.samples_per_frame() * self.channel_count as usize],
            timestamp,
        }
    }
}

impl<H: HardwareCodec> AudioCodecSession for AmrMediaSession<H> {
    fn codec_id(&self) -> CodecId {
        match self.variant {
            AmrVariant::Nb => CodecId::AmrNb,
            AmrVariant::Wb => CodecId::AmrWb,
        }
    }

    fn name(&self) -> &str {
        self.codec_id().name()
    }

    fn open(&mut self, params: &AudioSessionParams) -> XunResult<()> {
        if params.codec_id != self.codec_id() {
            return Err(XunError::InvalidArgument(format!(
                "会话参数的编解码器 {} 与会话 {} 不符",
                params.codec_id,
                self.codec_id()
            )));
        }
        if params.initial_mode > self.variant.max_mode() {
            return Err(XunError::UnsupportedMode(params.initial_mode));
        }
        let bitrate = self
            .variant
            .bitrate(params.initial_mode)
            .ok_or(XunError::UnsupportedMode(params.initial_mode))?;
        let spf = samples_for_duration_ms(params.clock_rate, params.frame_duration_ms) as usize;
        if spf != self.variant.samples_per_frame() {
            return Err(XunError::InvalidArgument(format!(
                "帧时长 {} ms 在 {} Hz 下为 {} 采样, 应为 {}",
                params.frame_duration_ms,
                params.clock_rate,
                spf,
                self.variant.samples_per_frame()
            )));
        }

        self.pack_setting.octet_aligned = params.octet_aligned;
        self.parse_setting.octet_aligned = params.octet_aligned;
        self.enc_mode = params.initial_mode;
        self.channel_count = params.channel_count;

        let format = MediaFormat {
            mime: self.codec_id().mime_type().to_string(),
            sample_rate: params.clock_rate,
            channel_count: params.channel_count,
            bit_rate: bitrate,
            ..Default::default()
        };
        self.enc.configure(&format)?;
        self.enc.start()?;
        self.dec.configure(&format)?;
        self.dec.start()?;

        self.opened = true;
        log::info!(
            "{} 会话已打开: {} Hz, octet_aligned={}, 初始模式 {}",
            self.name(),
            params.clock_rate,
            params.octet_aligned,
            params.initial_mode
        );
        Ok(())
    }

    fn close(&mut self) -> XunResult<()> {
        if !self.opened {
            return Ok(());
        }
        self.enc.stop()?;
        self.dec.stop()?;
        self.opened = false;
        Ok(())
    }

    fn parse(&mut self, payload: &[u8], timestamp: i64) -> XunResult<Vec<CodedAudioFrame>> {
        self.ensure_open()?;
        let (frames, cmr) = payload::parse(payload, timestamp, &self.parse_setting)?;
        self.adapt_encode_mode(cmr)?;
        Ok(frames)
    }

    fn pack(&mut self, frames: &[CodedAudioFrame], max_payload_size: usize) -> XunResult<Bytes> {
        self.ensure_open()?;
        let packed = payload::pack(frames, &self.pack_setting, max_payload_size)?;
        Ok(Bytes::from(packed))
    }

    fn encode(&mut self, input: &RawAudioFrame) -> XunResult<Option<Vec<CodedAudioFrame>>> {
        self.ensure_open()?;
        let spf = self.variant.samples_per_frame() * self.channel_count as usize;
        if input.samples.is_empty() || input.samples.len() % spf != 0 {
            return Err(XunError::InvalidArgument(format!(
                "采样数 {} 不是每帧采样数 {} 的整数倍",
                input.samples.len(),
                spf
            )));
        }

        let mut frames = Vec::with_capacity(input.samples.len() / spf);
        for (i, chunk) in input.samples.chunks_exact(spf).enumerate() {
            let ts = input.timestamp + (i * self.variant.samples_per_frame()) as i64;
            match self.encode_one(chunk, ts)? {
                Some(frame) => frames.push(frame),
                // 某块无输出时整次调用退化为无输出, 不产出残缺载荷
                None => return Ok(None),
            }
        }
        Ok(Some(frames))
    }

    fn decode(&mut self, frame: &CodedAudioFrame) -> XunResult<RawAudioFrame> {
        self.ensure_open()?;

        let info = frame
            .amr_info()
            .copied()
            .ok_or_else(|| XunError::InvalidArgument("帧缺少 AMR 元数据".into()))?;

        // 无数据帧直接产出静音, 不触碰硬件
        if frame.data.is_empty() {
            return Ok(self.silence(frame.timestamp));
        }

        let input = Self::decoder_input(frame, info.frame_type, info.good_quality);
        let dec = &mut self.dec;
        let index = poll_bounded(self.budget, "解码器输入缓冲区", || dec.try_dequeue_input())?;
        dec.queue_input(index, &input, frame.timestamp, CodedFlags::empty())?;

        let buffer = poll_bounded(self.budget, "解码器输出缓冲区", || {
            match dec.try_dequeue_output()? {
                OutputEvent::Buffer(buf) => Ok(Some(buf)),
                OutputEvent::FormatChanged(_) | OutputEvent::Pending => Ok(None),
            }
        })?;

        let mut samples = Vec::with_capacity(buffer.data.len() / 2);
        for pair in buffer.data.chunks_exact(2) {
            samples.push(i16::from_le_bytes([pair[0], pair[1]]));
        }
        dec.release_output(buffer.index)?;

        Ok(RawAudioFrame {
            samples,
            timestamp: frame.timestamp,
        })
    }
}
