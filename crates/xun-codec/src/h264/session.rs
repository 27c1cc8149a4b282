//! H.264 视频会话.
//!
//! 组合四个协作方: 硬件编码器/解码器 (缓冲区队列协议)、RTP 打包器/
//! 解包器 (分片算法)、发送方向组帧器 (参数集自描述) 与接收方向重组器
//! (Annex B → 长度前缀, 参数集分流). 会话只做缓冲区变换与分流决策,
//! 不实现任何压缩算法.

use bytes::Bytes;
use xun_core::retry::{poll_bounded, PollBudget};
use xun_core::{XunError, XunResult};

use crate::codec_id::CodecId;
use crate::frame::{DecodedVideoFrame, RawVideoFrame};
use crate::hardware::{
    CodedFlags, FormatChangeSink, HardwareCodec, MediaFormat, OutputEvent, PARAM_REQUEST_KEYFRAME,
};
use crate::rtp::{Depacketizer, Packetizer};
use crate::session::VideoCodecSession;
use crate::session_params::VideoSessionParams;

use super::framer::EncodeFramer;
use super::nal::split_annex_b;
use super::reframer::AnnexBReframer;

const START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// 连续格式变化事件的上限, 超过视为解码器异常
const MAX_FORMAT_EVENTS: u32 = 4;

/// H.264 视频会话
pub struct H264MediaSession<H: HardwareCodec> {
    enc: H,
    dec: H,
    packetizer: Box<dyn Packetizer>,
    depacketizer: Box<dyn Depacketizer>,
    sink: Option<Box<dyn FormatChangeSink>>,
    params: VideoSessionParams,
    framer: EncodeFramer,
    reframer: AnnexBReframer,
    /// 接收方向整帧重组缓冲区 (跨调用复用, 容量受协商参数约束)
    scratch: Vec<u8>,
    opened: bool,
    budget: PollBudget,
    /// 解码输出当前宽高 (格式变化事件更新)
    dec_width: u32,
    dec_height: u32,
}

impl<H: HardwareCodec> H264MediaSession<H> {
    /// 创建未打开的会话
    pub fn new(
        enc: H,
        dec: H,
        packetizer: Box<dyn Packetizer>,
        depacketizer: Box<dyn Depacketizer>,
    ) -> Self {
        Self {
            enc,
            dec,
            packetizer,
            depacketizer,
            sink: None,
            params: VideoSessionParams::default(),
            framer: EncodeFramer::new(),
            reframer: AnnexBReframer::new(0),
            scratch: Vec::new(),
            opened: false,
            budget: PollBudget::default(),
            dec_width: 0,
            dec_height: 0,
        }
    }

    /// 覆盖硬件队列的轮询预算
    pub fn with_poll_budget(mut self, budget: PollBudget) -> Self {
        self.budget = budget;
        self
    }

    /// 设置解码输出格式变化的接收方
    pub fn set_format_change_sink(&mut self, sink: Box<dyn FormatChangeSink>) {
        self.sink = Some(sink);
    }

    fn ensure_open(&self) -> XunResult<()> {
        if self.opened {
            Ok(())
        } else {
            Err(XunError::InvalidArgument("会话尚未打开".into()))
        }
    }

    /// 解码器格式 (参数集配对完整时附带配置数据)
    fn decoder_format(&self) -> MediaFormat {
        let mut format = MediaFormat {
            mime: CodecId::H264.mime_type().to_string(),
            width: self.params.width,
            height: self.params.height,
            ..Default::default()
        };
        if self.reframer.cache().has_pair() {
            let mut sps = START_CODE.to_vec();
            sps.extend_from_slice(self.reframer.cache().sps());
            let mut pps = START_CODE.to_vec();
            pps.extend_from_slice(self.reframer.cache().pps());
            format.csd = vec![sps, pps];
        }
        format
    }

    /// 带内参数集更新, 用新配置数据重启解码器
    fn reconfigure_decoder(&mut self) -> XunResult<()> {
        log::info!("带内参数集更新, 重新配置解码器");
        let format = self.decoder_format();
        self.dec.stop()?;
        self.dec.configure(&format)?;
        self.dec.start()?;
        Ok(())
    }
}

impl<H: HardwareCodec> VideoCodecSession for H264MediaSession<H> {
    fn codec_id(&self) -> CodecId {
        CodecId::H264
    }

    fn name(&self) -> &str {
        CodecId::H264.name()
    }

    fn open(&mut self, params: &VideoSessionParams) -> XunResult<()> {
        if params.packetization_mode > 1 {
            return Err(XunError::UnsupportedMode(params.packetization_mode));
        }

        self.reframer = AnnexBReframer::new(params.effective_dec_buf_size());
        if !params.sprop_parameter_sets.is_empty() {
            let units = split_annex_b(&params.sprop_parameter_sets);
            self.reframer.seed(&units)?;
        }

        let enc_format = MediaFormat {
            mime: CodecId::H264.mime_type().to_string(),
            width: params.width,
            height: params.height,
            frame_rate: params.fps,
            bit_rate: params.avg_bit_rate,
            color_format: params.color_format,
            keyframe_interval_sec: params.keyframe_interval_sec,
            ..Default::default()
        };
        self.enc.configure(&enc_format)?;
        self.enc.start()?;

        self.params = params.clone();
        self.dec_width = params.width;
        self.dec_height = params.height;

        let dec_format = self.decoder_format();
        self.dec.configure(&dec_format)?;
        self.dec.start()?;

        self.opened = true;
        log::info!(
            "H264 会话已打开: {}x{}@{}, {} bits/s, packetization-mode={}, 带外参数集={}",
            params.width,
            params.height,
            params.fps,
            params.avg_bit_rate,
            params.packetization_mode,
            self.reframer.is_configured()
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

    fn encode_begin(&mut self, input: &RawVideoFrame) -> XunResult<(Option<Bytes>, bool)> {
        self.ensure_open()?;

        if input.force_keyframe {
            self.enc.set_parameter(PARAM_REQUEST_KEYFRAME, 0)?;
        }

        let enc = &mut self.enc;
        let index = match poll_bounded(self.budget, "编码器输入缓冲区", || enc.try_dequeue_input())
        {
            Ok(index) => index,
            Err(XunError::Timeout(what)) => {
                log::warn!("编码输入队列超时, 本帧无输出: {what}");
                return Ok((None, false));
            }
            Err(e) => return Err(e),
        };
        enc.queue_input(index, &input.data, input.timestamp, CodedFlags::empty())?;

        let buffer = match poll_bounded(self.budget, "编码器输出缓冲区", || {
            match enc.try_dequeue_output()? {
                OutputEvent::Buffer(buf) => Ok(Some(buf)),
                OutputEvent::FormatChanged(_) | OutputEvent::Pending => Ok(None),
            }
        }) {
            Ok(buffer) => buffer,
            Err(XunError::Timeout(what)) => {
                log::warn!("编码输出队列超时, 本帧无输出: {what}");
                return Ok((None, false));
            }
            Err(e) => return Err(e),
        };

        // 配置缓冲区 (SPS/PPS) 进缓存, 不产生载荷
        if buffer.flags.contains(CodedFlags::CONFIG) {
            let result = self.framer.cache_config(&buffer.data);
            self.enc.release_output(buffer.index)?;
            result?;
            log::debug!("已缓存编码器参数集 ({} 字节)", buffer.data.len());
            return Ok((None, false));
        }

        let keyframe = buffer.flags.contains(CodedFlags::KEYFRAME);
        self.framer.begin(&buffer.data, keyframe);
        self.enc.release_output(buffer.index)?;

        self.encode_more()
    }

    fn encode_more(&mut self) -> XunResult<(Option<Bytes>, bool)> {
        self.ensure_open()?;
        match self.framer.next_fragment(self.packetizer.as_mut()) {
            Ok(Some((fragment, has_more))) => Ok((Some(fragment), has_more)),
            Ok(None) => Ok((None, false)),
            Err(e) => {
                // 打包失败只丢当前帧, 不终结会话
                log::warn!("分片失败, 丢弃当前帧: {e}");
                self.framer.begin(&[], false);
                Ok((None, false))
            }
        }
    }

    fn decode(
        &mut self,
        payloads: &[Bytes],
        timestamp: i64,
    ) -> XunResult<Option<DecodedVideoFrame>> {
        self.ensure_open()?;
        if payloads.is_empty() {
            return Ok(None);
        }

        // 整帧重组
        let capacity = self.params.effective_dec_buf_size();
        self.scratch.clear();
        for payload in payloads {
            self.depacketizer.depacketize(payload, &mut self.scratch)?;
            if self.scratch.len() > capacity {
                return Err(XunError::BufferOverflow {
                    required: self.scratch.len(),
                    capacity,
                });
            }
        }

        let outcome = self.reframer.reframe(&mut self.scratch)?;
        if outcome.configure.is_some() {
            self.reconfigure_decoder()?;
        }
        if outcome.slices.is_empty() {
            return Ok(None);
        }

        // 切片入队
        for record in &outcome.slices {
            let dec = &mut self.dec;
            let index =
                match poll_bounded(self.budget, "解码器输入缓冲区", || dec.try_dequeue_input()) {
                    Ok(index) => index,
                    Err(XunError::Timeout(what)) => {
                        log::warn!("解码输入队列超时, 丢弃本帧: {what}");
                        return Ok(None);
                    }
                    Err(e) => return Err(e),
                };
            let slice = &self.scratch[record.offset - 4..record.offset + record.len];
            let flags = if outcome.keyframe {
                CodedFlags::KEYFRAME
            } else {
                CodedFlags::empty()
            };
            dec.queue_input(index, slice, timestamp, flags)?;
        }

        // 取输出, 中途消化格式变化事件
        let mut format_events = 0;
        let buffer = loop {
            let dec = &mut self.dec;
            let event = match poll_bounded(self.budget, "解码器输出缓冲区", || {
                match dec.try_dequeue_output()? {
                    OutputEvent::Pending => Ok(None),
                    other => Ok(Some(other)),
                }
            }) {
                Ok(event) => event,
                Err(XunError::Timeout(_)) => {
                    // 解码器尚未产出 (B 帧延迟等), 无输出不是错误
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };
            match event {
                OutputEvent::Buffer(buffer) => break buffer,
                OutputEvent::FormatChanged(format) => {
                    log::info!("解码输出格式变化: {}x{}", format.width, format.height);
                    self.dec_width = format.width;
                    self.dec_height = format.height;
                    if let Some(sink) = self.sink.as_mut() {
                        sink.on_format_change(format.width, format.height);
                    }
                    format_events += 1;
                    if format_events > MAX_FORMAT_EVENTS {
                        return Err(XunError::Codec("解码器持续报告格式变化".into()));
                    }
                }
                OutputEvent::Pending => unreachable!("Pending 已在轮询中消化"),
            }
        };

        let data = Bytes::copy_from_slice(&buffer.data);
        let ts = buffer.timestamp;
        self.dec.release_output(buffer.index)?;

        Ok(Some(DecodedVideoFrame {
            data,
            width: self.dec_width,
            height: self.dec_height,
            timestamp: ts,
        }))
    }

    fn request_keyframe(&mut self) -> XunResult<()> {
        self.ensure_open()?;
        self.enc.set_parameter(PARAM_REQUEST_KEYFRAME, 0)
    }
}
