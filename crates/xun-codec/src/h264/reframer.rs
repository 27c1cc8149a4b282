//! 接收方向的码流重组: Annex B → 长度前缀 (AVCC).
//!
//! RTP 解包得到的一帧 Annex B 字节流在送入硬件解码器前需要改写为
//! 4 字节大端长度前缀格式. 改写在重组缓冲区内原地进行: 每个 4 字节
//! 起始码的位置直接覆写为其后 NAL 单元的长度, 不做二次拷贝.
//!
//! 扫描用"哨兵"终结: 在缓冲区尾部临时追加一个起始码, 使最后一个真实
//! NAL 单元的结束位置与中间单元走同一条路径, 扫描结束后移除.
//!
//! 同时承担参数集分流: 带内 SPS/PPS 不送入解码器, 而是存入有界缓存;
//! PPS 使参数集配对完整时产生一次配置事件, 此前到达的切片一律丢弃
//! (解码器尚无法消费).

use xun_core::{XunError, XunResult};

use super::nal::NalUnitType;

/// 单个参数集的缓存容量上限 (字节)
pub const PARAM_SET_CAPACITY: usize = 64;

const START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// SPS/PPS 参数集缓存
///
/// 存储不含起始码 (含 NAL 头部字节) 的参数集. 容量固定, 超限是显式
/// 错误而不是截断.
#[derive(Debug, Default)]
pub struct ParameterSetCache {
    sps: Vec<u8>,
    pps: Vec<u8>,
}

impl ParameterSetCache {
    /// 创建空缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 存入 SPS, 覆盖旧值
    pub fn set_sps(&mut self, nal: &[u8]) -> XunResult<()> {
        if nal.len() > PARAM_SET_CAPACITY {
            return Err(XunError::BufferOverflow {
                required: nal.len(),
                capacity: PARAM_SET_CAPACITY,
            });
        }
        self.sps.clear();
        self.sps.extend_from_slice(nal);
        Ok(())
    }

    /// 存入 PPS, 覆盖旧值
    pub fn set_pps(&mut self, nal: &[u8]) -> XunResult<()> {
        if nal.len() > PARAM_SET_CAPACITY {
            return Err(XunError::BufferOverflow {
                required: nal.len(),
                capacity: PARAM_SET_CAPACITY,
            });
        }
        self.pps.clear();
        self.pps.extend_from_slice(nal);
        Ok(())
    }

    /// SPS/PPS 是否都已就位
    pub fn has_pair(&self) -> bool {
        !self.sps.is_empty() && !self.pps.is_empty()
    }

    /// 当前 SPS (不含起始码)
    pub fn sps(&self) -> &[u8] {
        &self.sps
    }

    /// 当前 PPS (不含起始码)
    pub fn pps(&self) -> &[u8] {
        &self.pps
    }
}

/// 重组缓冲区中一个已改写的 NAL 单元
#[derive(Debug, Clone, Copy)]
pub struct NalRecord {
    /// NAL 数据 (含头部字节) 在缓冲区中的偏移; 偏移前 4 字节是长度前缀
    pub offset: usize,
    /// NAL 数据长度
    pub len: usize,
    /// NAL 类型
    pub nal_type: NalUnitType,
}

/// 一次重组的结果
#[derive(Debug, Default)]
pub struct ReframeOutcome {
    /// 应送入解码器的切片 (参数集已分流, 未配置前的切片已丢弃)
    pub slices: Vec<NalRecord>,
    /// 参数集配对完整时产生的配置事件: (SPS, PPS), 不含起始码
    pub configure: Option<(Vec<u8>, Vec<u8>)>,
    /// 切片中是否含 IDR
    pub keyframe: bool,
}

/// Annex B → 长度前缀重组器
///
/// 每个解码方向持有一个; 跨调用状态只有参数集缓存与"已配置"标记.
#[derive(Debug)]
pub struct AnnexBReframer {
    cache: ParameterSetCache,
    configured: bool,
    /// 重组缓冲区容量上限 (字节), 哨兵也计入
    capacity: usize,
}

impl AnnexBReframer {
    /// 创建重组器
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: ParameterSetCache::new(),
            configured: false,
            capacity,
        }
    }

    /// 参数集缓存
    pub fn cache(&self) -> &ParameterSetCache {
        &self.cache
    }

    /// 解码器是否已经 (或即将) 配置完成
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// 用带外参数集 (sprop-parameter-sets) 播种缓存
    ///
    /// `units` 为不含起始码的 NAL 单元; SPS/PPS 之外的单元忽略.
    /// 配对完整时直接进入已配置状态 (调用方把参数集作为解码器的
    /// 初始配置数据下发).
    pub fn seed(&mut self, units: &[&[u8]]) -> XunResult<()> {
        for unit in units {
            let Some(&header) = unit.first() else {
                continue;
            };
            match NalUnitType::from_header(header) {
                NalUnitType::Sps => self.cache.set_sps(unit)?,
                NalUnitType::Pps => self.cache.set_pps(unit)?,
                other => {
                    log::debug!("带外参数集中忽略 {} 单元", other);
                }
            }
        }
        if self.cache.has_pair() {
            self.configured = true;
        }
        Ok(())
    }

    /// 原地重组一帧 Annex B 字节流
    ///
    /// `buf` 必须以 4 字节起始码开头 (长度前缀需要完整的 4 字节可写
    /// 空间), 内部起始码也必须是 4 字节形式; 3 字节起始码无处容纳长度
    /// 前缀, 视为畸形码流.
    pub fn reframe(&mut self, buf: &mut Vec<u8>) -> XunResult<ReframeOutcome> {
        if buf.len() < START_CODE.len() + 1 || buf[..4] != START_CODE {
            return Err(XunError::MalformedBitstream(
                "码流未以 4 字节起始码开头".into(),
            ));
        }
        // 哨兵也要落在容量之内, 重组缓冲区不得超限
        if buf.len() + START_CODE.len() > self.capacity {
            return Err(XunError::BufferOverflow {
                required: buf.len() + START_CODE.len(),
                capacity: self.capacity,
            });
        }

        let orig_len = buf.len();
        buf.extend_from_slice(&START_CODE);

        // 逐字节扫描全部起始码位置 (最后一个是哨兵)
        let mut starts = Vec::new();
        let mut i = 0;
        while i + 4 <= buf.len() {
            if buf[i..i + 4] == START_CODE {
                starts.push(i);
                i += 4;
            } else {
                i += 1;
            }
        }

        let mut outcome = ReframeOutcome::default();
        for pair in starts.windows(2) {
            let offset = pair[0] + 4;
            let len = pair[1] - offset;
            if len == 0 {
                buf.truncate(orig_len);
                return Err(XunError::MalformedBitstream("零长度 NAL 单元".into()));
            }

            // 起始码原地覆写为长度前缀
            let prefix = (len as u32).to_be_bytes();
            buf[pair[0]..pair[0] + 4].copy_from_slice(&prefix);

            let nal_type = NalUnitType::from_header(buf[offset]);
            let record = NalRecord {
                offset,
                len,
                nal_type,
            };
            self.dispatch(buf, record, &mut outcome)?;
        }

        buf.truncate(orig_len);
        Ok(outcome)
    }

    fn dispatch(
        &mut self,
        buf: &[u8],
        record: NalRecord,
        outcome: &mut ReframeOutcome,
    ) -> XunResult<()> {
        let nal = &buf[record.offset..record.offset + record.len];
        match record.nal_type {
            NalUnitType::Sps => self.cache.set_sps(nal)?,
            NalUnitType::Pps => {
                self.cache.set_pps(nal)?;
                if self.cache.has_pair() {
                    // 每次带内 PPS 都重新下发配置, 覆盖旧参数集
                    outcome.configure =
                        Some((self.cache.sps().to_vec(), self.cache.pps().to_vec()));
                    self.configured = true;
                }
            }
            nal_type => {
                if !self.configured {
                    log::warn!("解码器未配置, 丢弃 {} 单元 ({} 字节)", nal_type, record.len);
                    return Ok(());
                }
                if nal_type.is_idr() {
                    outcome.keyframe = true;
                }
                outcome.slices.push(record);
            }
        }
        Ok(())
    }
}
