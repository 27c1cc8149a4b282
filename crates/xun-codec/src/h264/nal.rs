//! H.264 NAL (Network Abstraction Layer) 单元基础.
//!
//! # Annex B 格式
//!
//! Annex B 使用起始码 (start code) 分隔 NAL 单元:
//! - 3 字节起始码: `00 00 01`
//! - 4 字节起始码: `00 00 00 01`
//!
//! # NAL 头部 (1 字节)
//! ```text
//! ┌─────────────────────────────────────┐
//! │ forbidden(1) | ref_idc(2) | type(5) │
//! └─────────────────────────────────────┘
//! ```
//!
//! 重组/组帧只依赖头部字节的类型字段做分流决策, 不解析 RBSP.

/// NAL 单元类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum NalUnitType {
    /// 非 IDR 图像切片 (P/B slice)
    Slice,
    /// IDR 图像切片 (关键帧)
    SliceIdr,
    /// 增补增强信息 (SEI)
    Sei,
    /// 序列参数集 (SPS)
    Sps,
    /// 图像参数集 (PPS)
    Pps,
    /// 访问单元分隔符 (AUD)
    Aud,
    /// 其它类型
    Unknown(u8),
}

impl NalUnitType {
    /// 从 NAL 头部字节解析类型
    pub fn from_header(header: u8) -> Self {
        match header & 0x1F {
            1 => Self::Slice,
            5 => Self::SliceIdr,
            6 => Self::Sei,
            7 => Self::Sps,
            8 => Self::Pps,
            9 => Self::Aud,
            other => Self::Unknown(other),
        }
    }

    /// 获取类型编号
    pub fn type_id(&self) -> u8 {
        match self {
            Self::Slice => 1,
            Self::SliceIdr => 5,
            Self::Sei => 6,
            Self::Sps => 7,
            Self::Pps => 8,
            Self::Aud => 9,
            Self::Unknown(id) => *id,
        }
    }

    /// 是否为 VCL (Video Coding Layer) NAL
    pub fn is_vcl(&self) -> bool {
        matches!(self, Self::Slice | Self::SliceIdr) || matches!(self, Self::Unknown(2..=4))
    }

    /// 是否为关键帧 (IDR)
    pub fn is_idr(&self) -> bool {
        matches!(self, Self::SliceIdr)
    }

    /// 是否为参数集 (SPS/PPS)
    pub fn is_parameter_set(&self) -> bool {
        matches!(self, Self::Sps | Self::Pps)
    }
}

impl std::fmt::Display for NalUnitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Slice => write!(f, "Slice"),
            Self::SliceIdr => write!(f, "IDR"),
            Self::Sei => write!(f, "SEI"),
            Self::Sps => write!(f, "SPS"),
            Self::Pps => write!(f, "PPS"),
            Self::Aud => write!(f, "AUD"),
            Self::Unknown(id) => write!(f, "Unknown({id})"),
        }
    }
}

/// 从 Annex B 字节流中分割出所有 NAL 单元
///
/// 支持 3 字节和 4 字节起始码, 返回不含起始码 (含头部字节) 的切片,
/// 并去除每个单元尾部的填充 0 字节. 用于 sprop-parameter-sets 等
/// 带外参数集的播种.
pub fn split_annex_b(data: &[u8]) -> Vec<&[u8]> {
    let mut units = Vec::new();
    let mut i = 0;
    let mut nal_start: Option<usize> = None;

    while i + 2 < data.len() {
        if data[i] == 0x00 && data[i + 1] == 0x00 {
            let prefix = if data[i + 2] == 0x01 {
                Some(3)
            } else if i + 3 < data.len() && data[i + 2] == 0x00 && data[i + 3] == 0x01 {
                Some(4)
            } else {
                None
            };
            if let Some(prefix) = prefix {
                if let Some(start) = nal_start {
                    push_trimmed(&mut units, &data[start..i]);
                }
                i += prefix;
                nal_start = Some(i);
                continue;
            }
        }
        i += 1;
    }
    if let Some(start) = nal_start {
        push_trimmed(&mut units, &data[start..]);
    }

    units
}

fn push_trimmed<'a>(units: &mut Vec<&'a [u8]>, nal: &'a [u8]) {
    let mut end = nal.len();
    while end > 0 && nal[end - 1] == 0x00 {
        end -= 1;
    }
    if end > 0 {
        units.push(&nal[..end]);
    }
}
