//! AMR RTP 载荷打包/解析 (RFC 4867 §4.3/§4.4).
//!
//! 载荷结构: CMR 字段 + 每帧一个 ToC 条目 (F/FT/Q) + 按序排列的
//! 语音/SID 数据段. 数据段长度由帧类型静态表决定, 不依赖缓冲区探测.

use bytes::Bytes;
use xun_core::bitreader::BitReader;
use xun_core::bitwriter::BitWriter;
use xun_core::{XunError, XunResult};

use crate::frame::{AmrBitInfo, CodedAudioFrame, FrameInfo};

use super::{AmrPackSetting, AmrVariant, MAX_FRAMES_PER_PACKET};

/// ToC 条目 (解析中间态)
struct TocEntry {
    frame_type: u8,
    good_quality: bool,
}

/// 从核心帧数据中提取逐帧元数据
///
/// 语音帧的模式就是帧类型; SID 帧的 STI 位与模式编码在 SID 数据的
/// 第 35 位之后 (3GPP TS 26.101 / TS 26.201); 其余类型无数据, 模式未知.
pub(crate) fn bit_info_for(
    variant: AmrVariant,
    frame_type: u8,
    good_quality: bool,
    data: &[u8],
) -> XunResult<AmrBitInfo> {
    let (mode, sti) = if frame_type <= variant.max_mode() {
        (frame_type as i8, false)
    } else if frame_type == variant.sid_frame_type() {
        if data.len() < 5 {
            return Err(XunError::MalformedPayload(format!(
                "SID 帧数据不足: 需要 5 字节, 实际 {} 字节",
                data.len()
            )));
        }
        let sti = data[4] & 0x10 != 0;
        let mode = match variant {
            AmrVariant::Nb => ((data[4] >> 1) & 0x07) as i8,
            AmrVariant::Wb => (data[4] & 0x0F) as i8,
        };
        (mode, sti)
    } else {
        (-1, false)
    };

    Ok(AmrBitInfo {
        frame_type,
        mode,
        good_quality,
        sti,
    })
}

/// 解析一个 RTP 载荷为按传输顺序排列的码流帧序列
///
/// 返回 `(帧序列, CMR)`. CMR 的模式自适应副作用 (更新当前编码模式)
/// 由会话层处理, 本函数只负责字节布局.
///
/// 布局由 `setting.octet_aligned` 选定, 永不自动探测; 载荷与协商布局
/// 不一致时以 `MalformedPayload` 失败.
pub fn parse(
    payload: &[u8],
    timestamp: i64,
    setting: &AmrPackSetting,
) -> XunResult<(Vec<CodedAudioFrame>, u8)> {
    // 最小头部: CMR + 一个 ToC 条目, 两种布局下都至少 2 字节
    if payload.len() < 2 {
        return Err(XunError::MalformedPayload(format!(
            "载荷过短: {} 字节",
            payload.len()
        )));
    }

    if setting.octet_aligned {
        parse_octet_aligned(payload, timestamp, setting)
    } else {
        parse_bandwidth_efficient(payload, timestamp, setting)
    }
}

fn parse_octet_aligned(
    payload: &[u8],
    timestamp: i64,
    setting: &AmrPackSetting,
) -> XunResult<(Vec<CodedAudioFrame>, u8)> {
    let variant = setting.variant;
    let cmr = payload[0] >> 4;

    // ToC
    let mut toc = Vec::new();
    let mut pos = 1usize;
    loop {
        let Some(&entry) = payload.get(pos) else {
            return Err(XunError::MalformedPayload("ToC 超出载荷末尾".into()));
        };
        pos += 1;

        let follow = entry & 0x80 != 0;
        toc.push(TocEntry {
            frame_type: (entry >> 3) & 0x0F,
            good_quality: entry & 0x04 != 0,
        });
        if toc.len() > MAX_FRAMES_PER_PACKET {
            return Err(XunError::MalformedPayload(format!(
                "ToC 条目超过每包最大帧数 {}",
                MAX_FRAMES_PER_PACKET
            )));
        }
        if !follow {
            break;
        }
    }

    // 数据段
    let mut frames = Vec::with_capacity(toc.len());
    for (i, entry) in toc.iter().enumerate() {
        let len = variant.frame_len(entry.frame_type);
        let Some(data) = payload.get(pos..pos + len) else {
            return Err(XunError::MalformedPayload(format!(
                "frame_type={} 需要 {} 字节数据, 剩余 {} 字节",
                entry.frame_type,
                len,
                payload.len() - pos
            )));
        };
        pos += len;

        let info = bit_info_for(variant, entry.frame_type, entry.good_quality, data)?;
        frames.push(CodedAudioFrame {
            data: Bytes::copy_from_slice(data),
            timestamp: timestamp + (i * variant.samples_per_frame()) as i64,
            info: FrameInfo::Amr(info),
        });
    }

    Ok((frames, cmr))
}

fn parse_bandwidth_efficient(
    payload: &[u8],
    timestamp: i64,
    setting: &AmrPackSetting,
) -> XunResult<(Vec<CodedAudioFrame>, u8)> {
    let variant = setting.variant;
    let mut br = BitReader::new(payload);

    // BitReader 的 Eof 在这里意味着载荷被截断
    let truncated = |_: XunError| XunError::MalformedPayload("载荷在字段中间截断".into());

    let cmr = br.read_bits(4).map_err(truncated)? as u8;

    // ToC: 6 位一个条目 (F + FT×4 + Q)
    let mut toc = Vec::new();
    loop {
        let follow = br.read_bit().map_err(truncated)? != 0;
        let frame_type = br.read_bits(4).map_err(truncated)? as u8;
        let good_quality = br.read_bit().map_err(truncated)? != 0;
        toc.push(TocEntry {
            frame_type,
            good_quality,
        });
        if toc.len() > MAX_FRAMES_PER_PACKET {
            return Err(XunError::MalformedPayload(format!(
                "ToC 条目超过每包最大帧数 {}",
                MAX_FRAMES_PER_PACKET
            )));
        }
        if !follow {
            break;
        }
    }

    // 数据段: 按位连续, 逐帧取 frame_bits 位, 左对齐存入字节
    let mut frames = Vec::with_capacity(toc.len());
    for (i, entry) in toc.iter().enumerate() {
        let nbits = variant.frame_bits(entry.frame_type);
        if nbits > br.bits_left() {
            return Err(XunError::MalformedPayload(format!(
                "frame_type={} 需要 {} 位数据, 剩余 {} 位",
                entry.frame_type,
                nbits,
                br.bits_left()
            )));
        }

        let mut data = Vec::with_capacity(nbits.div_ceil(8));
        let mut rem = nbits;
        while rem >= 8 {
            data.push(br.read_bits(8).map_err(truncated)? as u8);
            rem -= 8;
        }
        if rem > 0 {
            let bits = br.read_bits(rem as u32).map_err(truncated)? as u8;
            data.push(bits << (8 - rem));
        }

        let info = bit_info_for(variant, entry.frame_type, entry.good_quality, &data)?;
        frames.push(CodedAudioFrame {
            data: Bytes::from(data),
            timestamp: timestamp + (i * variant.samples_per_frame()) as i64,
            info: FrameInfo::Amr(info),
        });
    }

    Ok((frames, cmr))
}

/// 把码流帧序列打包为一个 RTP 载荷
///
/// 所有帧共享一个 CMR+ToC 头部, 最后一个 ToC 条目的 F 位清零标记
/// 表结束. 打包结果超出 `max_payload_size` 时在写入前以
/// `BufferTooSmall` 失败.
pub fn pack(
    frames: &[CodedAudioFrame],
    setting: &AmrPackSetting,
    max_payload_size: usize,
) -> XunResult<Vec<u8>> {
    let variant = setting.variant;

    if frames.is_empty() {
        return Err(XunError::InvalidArgument("打包需要至少一帧".into()));
    }
    if frames.len() > MAX_FRAMES_PER_PACKET {
        return Err(XunError::InvalidArgument(format!(
            "帧数 {} 超过每包最大帧数 {}",
            frames.len(),
            MAX_FRAMES_PER_PACKET
        )));
    }

    // 校验元数据与数据段长度, 同时累计所需大小
    let mut data_bytes = 0usize;
    let mut data_bits = 0usize;
    for frame in frames {
        let Some(info) = frame.amr_info() else {
            return Err(XunError::InvalidArgument("帧缺少 AMR 元数据".into()));
        };
        let expected = variant.frame_len(info.frame_type);
        if frame.data.len() != expected {
            return Err(XunError::InvalidArgument(format!(
                "frame_type={} 的数据段应为 {} 字节, 实际 {} 字节",
                info.frame_type,
                expected,
                frame.data.len()
            )));
        }
        data_bytes += expected;
        data_bits += variant.frame_bits(info.frame_type);
    }

    let required = if setting.octet_aligned {
        1 + frames.len() + data_bytes
    } else {
        (4 + 6 * frames.len() + data_bits).div_ceil(8)
    };
    if required > max_payload_size {
        return Err(XunError::BufferTooSmall {
            required,
            available: max_payload_size,
        });
    }

    let payload = if setting.octet_aligned {
        pack_octet_aligned(frames, setting)
    } else {
        pack_bandwidth_efficient(frames, setting)
    };
    debug_assert_eq!(payload.len(), required);
    Ok(payload)
}

fn pack_octet_aligned(frames: &[CodedAudioFrame], setting: &AmrPackSetting) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + frames.len() * 2);
    out.push((setting.cmr & 0x0F) << 4);

    for (i, frame) in frames.iter().enumerate() {
        let info = frame.amr_info().expect("pack 已校验元数据");
        let follow = if i + 1 < frames.len() { 0x80 } else { 0x00 };
        let quality = if info.good_quality { 0x04 } else { 0x00 };
        out.push(follow | ((info.frame_type & 0x0F) << 3) | quality);
    }
    for frame in frames {
        out.extend_from_slice(&frame.data);
    }
    out
}

fn pack_bandwidth_efficient(frames: &[CodedAudioFrame], setting: &AmrPackSetting) -> Vec<u8> {
    let mut bw = BitWriter::with_capacity(2 + frames.len() * 32);
    bw.write_bits(u32::from(setting.cmr & 0x0F), 4);

    for (i, frame) in frames.iter().enumerate() {
        let info = frame.amr_info().expect("pack 已校验元数据");
        bw.write_bit(u32::from(i + 1 < frames.len()));
        bw.write_bits(u32::from(info.frame_type & 0x0F), 4);
        bw.write_bit(u32::from(info.good_quality));
    }
    for frame in frames {
        let info = frame.amr_info().expect("pack 已校验元数据");
        let nbits = setting.variant.frame_bits(info.frame_type);
        let full = nbits / 8;
        for &byte in &frame.data[..full] {
            bw.write_bits(u32::from(byte), 8);
        }
        let rem = nbits % 8;
        if rem > 0 {
            bw.write_bits(u32::from(frame.data[full] >> (8 - rem)), rem as u32);
        }
    }
    bw.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amr::CMR_NONE;

    /// 构造一帧带确定元数据的测试帧
    fn make_frame(variant: AmrVariant, frame_type: u8, seed: u8, ts: i64) -> CodedAudioFrame {
        let len = variant.frame_len(frame_type);
        let mut data: Vec<u8> = (0..len).map(|i| seed.wrapping_add(i as u8)).collect();

        // 带宽高效模式下末字节的填充位必须为 0, 构造时直接清零
        let bits = variant.frame_bits(frame_type);
        if bits % 8 != 0 {
            let mask = 0xFFu8 << (8 - bits % 8);
            if let Some(last) = data.last_mut() {
                *last &= mask;
            }
        }

        let info = bit_info_for(variant, frame_type, true, &data).unwrap();
        CodedAudioFrame {
            data: Bytes::from(data),
            timestamp: ts,
            info: FrameInfo::Amr(info),
        }
    }

    /// 构造 SID 帧, STI 与模式编码进数据位
    fn make_sid_frame(variant: AmrVariant, sti: bool, mode: u8, ts: i64) -> CodedAudioFrame {
        let ft = variant.sid_frame_type();
        let mut data = vec![0u8; variant.frame_len(ft)];
        let sti_bit = if sti { 0x10 } else { 0x00 };
        data[4] = match variant {
            AmrVariant::Nb => sti_bit | ((mode & 0x07) << 1),
            AmrVariant::Wb => sti_bit | (mode & 0x0F),
        };
        let info = bit_info_for(variant, ft, true, &data).unwrap();
        assert_eq!(info.sti, sti);
        assert_eq!(info.mode, mode as i8);
        CodedAudioFrame {
            data: Bytes::from(data),
            timestamp: ts,
            info: FrameInfo::Amr(info),
        }
    }

    fn assert_frames_eq(a: &[CodedAudioFrame], b: &[CodedAudioFrame]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.data, y.data, "数据段应逐字节一致");
            assert_eq!(x.amr_info(), y.amr_info(), "元数据应一致");
        }
    }

    #[test]
    fn test_octet_aligned_nb_往返() {
        let setting = AmrPackSetting::new(AmrVariant::Nb, true);
        let frames = vec![
            make_frame(AmrVariant::Nb, 7, 0x11, 0),
            make_sid_frame(AmrVariant::Nb, true, 3, 160),
            make_frame(AmrVariant::Nb, 15, 0, 320), // NO_DATA
        ];

        let payload = pack(&frames, &setting, 1500).unwrap();
        let (parsed, cmr) = parse(&payload, 0, &setting).unwrap();

        assert_eq!(cmr, CMR_NONE);
        assert_frames_eq(&frames, &parsed);
        // 时间戳按帧推进
        assert_eq!(parsed[1].timestamp, 160);
        assert_eq!(parsed[2].timestamp, 320);
    }

    #[test]
    fn test_bandwidth_efficient_nb_往返() {
        let setting = AmrPackSetting::new(AmrVariant::Nb, false);
        let frames = vec![
            make_frame(AmrVariant::Nb, 0, 0x42, 0),
            make_frame(AmrVariant::Nb, 5, 0x99, 160),
        ];

        let payload = pack(&frames, &setting, 1500).unwrap();
        // 带宽高效应严格小于 octet-aligned
        let oa = pack(
            &frames,
            &AmrPackSetting::new(AmrVariant::Nb, true),
            1500,
        )
        .unwrap();
        assert!(payload.len() < oa.len(), "带宽高效布局应更紧凑");

        let (parsed, _) = parse(&payload, 0, &setting).unwrap();
        assert_frames_eq(&frames, &parsed);
    }

    #[test]
    fn test_octet_aligned_wb_往返() {
        let setting = AmrPackSetting::new(AmrVariant::Wb, true);
        let frames = vec![
            make_frame(AmrVariant::Wb, 8, 0x21, 0),
            make_sid_frame(AmrVariant::Wb, false, 6, 320),
        ];

        let payload = pack(&frames, &setting, 1500).unwrap();
        let (parsed, _) = parse(&payload, 0, &setting).unwrap();
        assert_frames_eq(&frames, &parsed);
    }

    #[test]
    fn test_bandwidth_efficient_wb_往返() {
        let setting = AmrPackSetting::new(AmrVariant::Wb, false);
        let frames = vec![
            make_frame(AmrVariant::Wb, 0, 0x07, 0),
            make_frame(AmrVariant::Wb, 4, 0x55, 320),
            make_frame(AmrVariant::Wb, 8, 0xA0, 640),
        ];

        let payload = pack(&frames, &setting, 1500).unwrap();
        let (parsed, _) = parse(&payload, 0, &setting).unwrap();
        assert_frames_eq(&frames, &parsed);
    }

    #[test]
    fn test_全部帧类型长度符合静态表() {
        for variant in [AmrVariant::Nb, AmrVariant::Wb] {
            let setting = AmrPackSetting::new(variant, true);
            for ft in 0..15u8 {
                let frame = if ft == variant.sid_frame_type() {
                    make_sid_frame(variant, false, 0, 0)
                } else {
                    make_frame(variant, ft, 1, 0)
                };
                let payload = pack(std::slice::from_ref(&frame), &setting, 1500).unwrap();
                let (parsed, _) = parse(&payload, 0, &setting).unwrap();
                assert_eq!(parsed.len(), 1);
                assert_eq!(
                    parsed[0].data.len(),
                    variant.frame_len(ft),
                    "variant={:?} frame_type={} 的长度应与静态表一致",
                    variant,
                    ft
                );
                if ft > variant.sid_frame_type() {
                    assert!(parsed[0].data.is_empty(), "无数据类型应产生空数据段");
                }
            }
        }
    }

    #[test]
    fn test_cmr_字段写入与读出() {
        let mut setting = AmrPackSetting::new(AmrVariant::Nb, true);
        setting.cmr = 5;
        let frames = vec![make_frame(AmrVariant::Nb, 7, 0x11, 0)];
        let payload = pack(&frames, &setting, 1500).unwrap();
        let (_, cmr) = parse(&payload, 0, &setting).unwrap();
        assert_eq!(cmr, 5);

        // 带宽高效布局下同样
        let mut be = AmrPackSetting::new(AmrVariant::Nb, false);
        be.cmr = 2;
        let payload = pack(&frames, &be, 1500).unwrap();
        let (_, cmr) = parse(&payload, 0, &be).unwrap();
        assert_eq!(cmr, 2);
    }

    #[test]
    fn test_载荷过短() {
        let setting = AmrPackSetting::new(AmrVariant::Nb, true);
        assert!(matches!(
            parse(&[], 0, &setting),
            Err(XunError::MalformedPayload(_))
        ));
        assert!(matches!(
            parse(&[0xF0], 0, &setting),
            Err(XunError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_数据段截断() {
        let setting = AmrPackSetting::new(AmrVariant::Nb, true);
        // CMR + ToC (frame_type=7 需要 31 字节) + 仅 3 字节数据
        let payload = [0xF0, 7 << 3 | 0x04, 0x01, 0x02, 0x03];
        assert!(matches!(
            parse(&payload, 0, &setting),
            Err(XunError::MalformedPayload(_))
        ));

        // 带宽高效同样截断
        let be = AmrPackSetting::new(AmrVariant::Nb, false);
        let payload = [0xF0, 0x3C, 0x01];
        assert!(matches!(
            parse(&payload, 0, &be),
            Err(XunError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_toc_越界() {
        let setting = AmrPackSetting::new(AmrVariant::Nb, true);
        // F 位始终置位但载荷在 ToC 中间结束
        let payload = [0xF0, 0x80 | 15 << 3, 0x80 | 15 << 3];
        assert!(matches!(
            parse(&payload, 0, &setting),
            Err(XunError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_超过每包最大帧数() {
        let setting = AmrPackSetting::new(AmrVariant::Nb, true);
        let frames: Vec<_> = (0..MAX_FRAMES_PER_PACKET + 1)
            .map(|i| make_frame(AmrVariant::Nb, 15, 0, (i * 160) as i64))
            .collect();
        assert!(matches!(
            pack(&frames, &setting, 1500),
            Err(XunError::InvalidArgument(_))
        ));

        // 解析方向: 11 个 NO_DATA ToC 条目
        let mut payload = vec![0xF0];
        for _ in 0..MAX_FRAMES_PER_PACKET {
            payload.push(0x80 | 15 << 3);
        }
        payload.push(15 << 3);
        assert!(matches!(
            parse(&payload, 0, &setting),
            Err(XunError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_输出缓冲区不足() {
        let setting = AmrPackSetting::new(AmrVariant::Nb, true);
        let frames = vec![make_frame(AmrVariant::Nb, 7, 0x11, 0)];
        let err = pack(&frames, &setting, 10).unwrap_err();
        match err {
            XunError::BufferTooSmall {
                required,
                available,
            } => {
                assert_eq!(required, 1 + 1 + 31);
                assert_eq!(available, 10);
            }
            other => panic!("应为 BufferTooSmall, 实际 {other:?}"),
        }
    }

    #[test]
    fn test_坏帧质量位保留() {
        let setting = AmrPackSetting::new(AmrVariant::Nb, true);
        let mut frame = make_frame(AmrVariant::Nb, 4, 0x33, 0);
        if let FrameInfo::Amr(ref mut info) = frame.info {
            info.good_quality = false;
        }
        let payload = pack(std::slice::from_ref(&frame), &setting, 1500).unwrap();
        let (parsed, _) = parse(&payload, 0, &setting).unwrap();
        assert!(!parsed[0].amr_info().unwrap().good_quality);
    }
}
