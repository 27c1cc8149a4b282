//! RTP 打包/解包协作方接口.
//!
//! NAL 单元到 MTU 大小 RTP 载荷的分片 (FU-A 等) 与逆向重组由外部
//! 打包器实现; 会话框架只决定交给打包器"哪些字节"以及"何时前置参数集",
//! 不实现分片算法本身.

use bytes::Bytes;
use xun_core::XunResult;

/// RTP 打包器 (编码方向)
///
/// 有状态协作方: 反复调用 [`packetize`](Packetizer::packetize) 取分片,
/// 每次推进 `pos`, 直到 `pos` 到达 `data.len()` 表示整个码流缓冲区
/// (含前置的参数集字节) 已消费完毕.
pub trait Packetizer: Send {
    /// 取下一个分片
    ///
    /// `data` 是完整的 Annex-B 码流缓冲区, `pos` 是消费游标 (调用间由
    /// 调用方保存). 返回的分片不超过打包器内部配置的 MTU.
    fn packetize(&mut self, data: &[u8], pos: &mut usize) -> XunResult<Bytes>;
}

/// RTP 解包器 (解码方向)
///
/// 把单个 RTP 载荷重组追加进整帧缓冲区 (分片重组、起始码恢复).
pub trait Depacketizer: Send {
    /// 重组一个 RTP 载荷, 结果追加到 `whole`
    fn depacketize(&mut self, payload: &[u8], whole: &mut Vec<u8>) -> XunResult<()>;
}
