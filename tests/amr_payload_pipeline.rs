//! AMR RTP 载荷打包/解析集成测试

use bytes::Bytes;
use xun_codec::amr::{
    pack, parse, AmrPackSetting, AmrVariant, CMR_NONE, MAX_FRAMES_PER_PACKET,
};
use xun_codec::{AmrBitInfo, CodedAudioFrame, FrameInfo};
use xun_core::XunError;

// ============================================================
// 测试帧构造
// ============================================================

/// 构造语音帧, 数据段按帧类型的静态表长度填充
///
/// 末字节的填充位清零, 使 octet-aligned 与 bandwidth-efficient
/// 两种布局产生相同的数据段.
fn speech_frame(variant: AmrVariant, mode: u8, seed: u8, timestamp: i64) -> CodedAudioFrame {
    let len = variant.frame_len(mode);
    let bits = variant.frame_bits(mode);
    let mut data: Vec<u8> = (0..len).map(|i| seed.wrapping_mul(31).wrapping_add(i as u8)).collect();
    if bits % 8 != 0 {
        if let Some(last) = data.last_mut() {
            *last &= 0xFFu8 << (8 - bits % 8);
        }
    }
    CodedAudioFrame {
        data: Bytes::from(data),
        timestamp,
        info: FrameInfo::Amr(AmrBitInfo {
            frame_type: mode,
            mode: mode as i8,
            good_quality: true,
            sti: false,
        }),
    }
}

/// 构造 SID 帧, STI 与模式编码进第 5 字节的数据位
fn sid_frame(variant: AmrVariant, sti: bool, mode: u8, timestamp: i64) -> CodedAudioFrame {
    let ft = variant.sid_frame_type();
    let mut data = vec![0u8; variant.frame_len(ft)];
    let sti_bit = if sti { 0x10 } else { 0x00 };
    data[4] = match variant {
        AmrVariant::Nb => sti_bit | ((mode & 0x07) << 1),
        AmrVariant::Wb => sti_bit | (mode & 0x0F),
    };
    CodedAudioFrame {
        data: Bytes::from(data),
        timestamp,
        info: FrameInfo::Amr(AmrBitInfo {
            frame_type: ft,
            mode: mode as i8,
            good_quality: true,
            sti,
        }),
    }
}

fn no_data_frame(timestamp: i64) -> CodedAudioFrame {
    CodedAudioFrame {
        data: Bytes::new(),
        timestamp,
        info: FrameInfo::Amr(AmrBitInfo {
            frame_type: 15,
            mode: -1,
            good_quality: true,
            sti: false,
        }),
    }
}

// ============================================================
// 往返与布局测试
// ============================================================

#[test]
fn test_nb_octet_aligned_混合帧往返() {
    let setting = AmrPackSetting::new(AmrVariant::Nb, true);
    let frames = vec![
        speech_frame(AmrVariant::Nb, 7, 1, 0),
        sid_frame(AmrVariant::Nb, true, 5, 160),
        no_data_frame(320),
        speech_frame(AmrVariant::Nb, 0, 2, 480),
    ];

    let payload = pack(&frames, &setting, 1500).unwrap();
    let (parsed, cmr) = parse(&payload, 0, &setting).unwrap();

    assert_eq!(cmr, CMR_NONE);
    assert_eq!(parsed.len(), 4);
    for (orig, got) in frames.iter().zip(parsed.iter()) {
        assert_eq!(orig.data, got.data);
        assert_eq!(orig.info, got.info);
    }
    // 时间戳按每帧 160 采样推进
    assert_eq!(parsed[3].timestamp, 480);

    // SID 元数据从数据位重建
    let sid = match parsed[1].info {
        FrameInfo::Amr(info) => info,
        FrameInfo::None => panic!("应有 AMR 元数据"),
    };
    assert!(sid.sti);
    assert_eq!(sid.mode, 5);
}

#[test]
fn test_wb_bandwidth_efficient_往返() {
    let setting = AmrPackSetting::new(AmrVariant::Wb, false);
    let frames = vec![
        speech_frame(AmrVariant::Wb, 8, 3, 0),
        speech_frame(AmrVariant::Wb, 2, 4, 320),
        sid_frame(AmrVariant::Wb, false, 8, 640),
    ];

    let payload = pack(&frames, &setting, 1500).unwrap();
    let oa_payload = pack(&frames, &AmrPackSetting::new(AmrVariant::Wb, true), 1500).unwrap();
    assert!(
        payload.len() < oa_payload.len(),
        "带宽高效布局应比 octet-aligned 紧凑: {} vs {}",
        payload.len(),
        oa_payload.len()
    );

    let (parsed, _) = parse(&payload, 0, &setting).unwrap();
    assert_eq!(parsed.len(), 3);
    for (orig, got) in frames.iter().zip(parsed.iter()) {
        assert_eq!(orig.data, got.data);
        assert_eq!(orig.info, got.info);
    }
}

#[test]
fn test_octet_aligned_字节级布局() {
    // 单个 NB 模式 0 帧: CMR 字节 + ToC 字节 + 12 字节数据
    let setting = AmrPackSetting::new(AmrVariant::Nb, true);
    let frame = speech_frame(AmrVariant::Nb, 0, 0, 0);
    let payload = pack(std::slice::from_ref(&frame), &setting, 1500).unwrap();

    assert_eq!(payload.len(), 1 + 1 + 12);
    assert_eq!(payload[0], 0xF0, "CMR=15 在高 4 位");
    assert_eq!(payload[1], 0x04, "F=0, FT=0, Q=1");
    assert_eq!(&payload[2..], &frame.data[..]);
}

#[test]
fn test_bandwidth_efficient_位级布局() {
    // CMR(4) + ToC(6) = 10 位头部: 1111 0000 0 1...
    let setting = AmrPackSetting::new(AmrVariant::Nb, false);
    let frame = speech_frame(AmrVariant::Nb, 0, 0, 0);
    let payload = pack(std::slice::from_ref(&frame), &setting, 1500).unwrap();

    // 4 + 6 + 95 位 = 105 位 → 14 字节
    assert_eq!(payload.len(), 14);
    assert_eq!(payload[0], 0xF0, "CMR=15, F=0, FT 高 3 位为 0");
    assert_eq!(payload[1] & 0xC0, 0x40, "FT 低 1 位为 0, Q=1");
}

#[test]
fn test_每包最大帧数边界() {
    let setting = AmrPackSetting::new(AmrVariant::Nb, true);

    let max: Vec<_> = (0..MAX_FRAMES_PER_PACKET)
        .map(|i| speech_frame(AmrVariant::Nb, 0, i as u8, (i * 160) as i64))
        .collect();
    let payload = pack(&max, &setting, 1500).unwrap();
    let (parsed, _) = parse(&payload, 0, &setting).unwrap();
    assert_eq!(parsed.len(), MAX_FRAMES_PER_PACKET);

    let over: Vec<_> = (0..MAX_FRAMES_PER_PACKET + 1)
        .map(|i| no_data_frame((i * 160) as i64))
        .collect();
    assert!(matches!(
        pack(&over, &setting, 1500),
        Err(XunError::InvalidArgument(_))
    ));
}

#[test]
fn test_载荷上限() {
    let setting = AmrPackSetting::new(AmrVariant::Wb, true);
    let frames = vec![
        speech_frame(AmrVariant::Wb, 8, 0, 0),
        speech_frame(AmrVariant::Wb, 8, 1, 320),
    ];
    // 1 + 2 + 120 = 123 字节
    let err = pack(&frames, &setting, 100).unwrap_err();
    match err {
        XunError::BufferTooSmall { required, available } => {
            assert_eq!(required, 123);
            assert_eq!(available, 100);
        }
        other => panic!("应为 BufferTooSmall, 实际 {other:?}"),
    }
    // 刚好够则成功
    assert!(pack(&frames, &setting, 123).is_ok());
}

#[test]
fn test_畸形载荷拒绝() {
    let setting = AmrPackSetting::new(AmrVariant::Nb, true);

    // 空载荷与只有 CMR
    assert!(matches!(parse(&[], 0, &setting), Err(XunError::MalformedPayload(_))));
    assert!(matches!(parse(&[0xF0], 0, &setting), Err(XunError::MalformedPayload(_))));

    // ToC 声明的数据段超出载荷
    let truncated = [0xF0, 7 << 3 | 0x04, 0x00, 0x00];
    assert!(matches!(
        parse(&truncated, 0, &setting),
        Err(XunError::MalformedPayload(_))
    ));

    // 带宽高效: 数据位不足
    let be = AmrPackSetting::new(AmrVariant::Nb, false);
    let short = [0xF0, 0x44, 0x00];
    assert!(matches!(
        parse(&short, 0, &be),
        Err(XunError::MalformedPayload(_))
    ));
}

#[test]
fn test_数据段长度与静态表不符拒绝打包() {
    let setting = AmrPackSetting::new(AmrVariant::Nb, true);
    let frame = CodedAudioFrame {
        data: Bytes::from(vec![0u8; 30]), // 模式 7 应为 31 字节
        timestamp: 0,
        info: FrameInfo::Amr(AmrBitInfo {
            frame_type: 7,
            mode: 7,
            good_quality: true,
            sti: false,
        }),
    };
    assert!(matches!(
        pack(std::slice::from_ref(&frame), &setting, 1500),
        Err(XunError::InvalidArgument(_))
    ));
}
