//! AMR 帧类型静态表.
//!
//! RFC 4867 / 3GPP TS 26.101 (NB) 与 TS 26.201 (WB) 定义的逐帧类型
//! 长度表: 语音帧按模式取固定长度, SID 帧固定 5 字节, 其余类型无数据.

/// AMR-NB 各帧类型的核心帧字节数 (索引为 frame_type 0-15)
pub const AMRNB_FRAME_LEN: [usize; 16] = [12, 13, 15, 17, 19, 20, 26, 31, 5, 0, 0, 0, 0, 0, 0, 0];

/// AMR-NB 各帧类型的核心帧位数
pub const AMRNB_FRAME_BITS: [usize; 16] =
    [95, 103, 118, 134, 148, 159, 204, 244, 39, 0, 0, 0, 0, 0, 0, 0];

/// AMR-NB 各模式的码率 (bits/s)
pub const AMRNB_BITRATES: [u32; 8] = [4750, 5150, 5900, 6700, 7400, 7950, 10200, 12200];

/// AMR-WB 各帧类型的核心帧字节数 (索引为 frame_type 0-15)
pub const AMRWB_FRAME_LEN: [usize; 16] = [17, 23, 32, 36, 40, 46, 50, 58, 60, 5, 0, 0, 0, 0, 0, 0];

/// AMR-WB 各帧类型的核心帧位数
pub const AMRWB_FRAME_BITS: [usize; 16] =
    [132, 177, 253, 285, 317, 365, 397, 461, 477, 40, 0, 0, 0, 0, 0, 0];

/// AMR-WB 各模式的码率 (bits/s)
pub const AMRWB_BITRATES: [u32; 9] =
    [6600, 8850, 12650, 14250, 15850, 18250, 19850, 23050, 23850];

/// "无数据"帧类型 (NO_DATA)
pub const FT_NO_DATA: u8 = 15;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_字节数与位数一致() {
        for ft in 0..16 {
            assert_eq!(
                AMRNB_FRAME_LEN[ft],
                AMRNB_FRAME_BITS[ft].div_ceil(8),
                "NB frame_type={} 的字节数应为位数向上取整",
                ft
            );
            assert_eq!(
                AMRWB_FRAME_LEN[ft],
                AMRWB_FRAME_BITS[ft].div_ceil(8),
                "WB frame_type={} 的字节数应为位数向上取整",
                ft
            );
        }
    }

    #[test]
    fn test_各模式长度互不相同() {
        // 编码器输出仅凭字节数即可反查帧类型, 依赖长度互异
        let nb: Vec<usize> = AMRNB_FRAME_LEN.iter().copied().filter(|&l| l > 0).collect();
        let mut nb_dedup = nb.clone();
        nb_dedup.sort_unstable();
        nb_dedup.dedup();
        assert_eq!(nb.len(), nb_dedup.len());

        let wb: Vec<usize> = AMRWB_FRAME_LEN.iter().copied().filter(|&l| l > 0).collect();
        let mut wb_dedup = wb.clone();
        wb_dedup.sort_unstable();
        wb_dedup.dedup();
        assert_eq!(wb.len(), wb_dedup.len());
    }
}
