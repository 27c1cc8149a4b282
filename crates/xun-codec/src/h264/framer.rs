//! 发送方向的组帧: 参数集缓存与关键帧自描述.
//!
//! 硬件编码器把 SPS/PPS 作为独立的配置缓冲区 (CONFIG 标志) 输出一次,
//! 不随每个关键帧重复. RTP 侧却要求关键帧自描述 (接收端可能中途加入,
//! 或上一个参数集载荷丢包), 因此组帧器缓存配置缓冲区, 并在每个关键帧
//! 前原样前置, 再交给打包器分片.

use bytes::Bytes;
use xun_core::{XunError, XunResult};

use crate::rtp::Packetizer;

/// 缓存的编码器配置数据 (Annex B 的 SPS+PPS) 容量上限 (字节)
pub const CONFIG_CAPACITY: usize = 256;

/// 编码方向组帧器
///
/// 跨调用状态: 缓存的配置数据 + 进行中的待分片缓冲区 (单槽, begin 覆盖).
#[derive(Debug, Default)]
pub struct EncodeFramer {
    /// 编码器输出的配置数据 (含起始码的 SPS+PPS)
    config: Vec<u8>,
    /// 当前帧的完整待分片字节 (关键帧含前置参数集)
    pending: Vec<u8>,
    /// 分片消费游标
    pos: usize,
}

impl EncodeFramer {
    /// 创建组帧器
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否已缓存配置数据
    pub fn has_config(&self) -> bool {
        !self.config.is_empty()
    }

    /// 缓存编码器的配置输出 (CONFIG 缓冲区), 覆盖旧值
    pub fn cache_config(&mut self, data: &[u8]) -> XunResult<()> {
        if data.len() > CONFIG_CAPACITY {
            return Err(XunError::BufferOverflow {
                required: data.len(),
                capacity: CONFIG_CAPACITY,
            });
        }
        self.config.clear();
        self.config.extend_from_slice(data);
        Ok(())
    }

    /// 开始分片一个编码帧
    ///
    /// 关键帧前置缓存的参数集使其自描述; 覆盖上一帧未取完的分片.
    pub fn begin(&mut self, data: &[u8], keyframe: bool) {
        self.pending.clear();
        if keyframe && !self.config.is_empty() {
            self.pending.extend_from_slice(&self.config);
        }
        self.pending.extend_from_slice(data);
        self.pos = 0;
    }

    /// 当前帧待分片的总字节数
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// 取下一个 RTP 载荷分片
    ///
    /// 返回 `(分片, has_more)`; 当前帧已消费完毕时返回 `None`.
    pub fn next_fragment(
        &mut self,
        packetizer: &mut dyn Packetizer,
    ) -> XunResult<Option<(Bytes, bool)>> {
        if self.pos >= self.pending.len() {
            return Ok(None);
        }
        let fragment = packetizer.packetize(&self.pending, &mut self.pos)?;
        let has_more = self.pos < self.pending.len();
        Ok(Some((fragment, has_more)))
    }
}
