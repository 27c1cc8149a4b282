//! 会话工厂.
//!
//! 显式的工厂对象, 由嵌入方的媒体框架构造并持有, 按 CodecId 查找并
//! 创建会话实例. 不存在进程级单例; 多个端点可各持一个工厂.
//!
//! 构造器以闭包注册, 以便捕获硬件编解码器实例的构造方式 (真实平台
//! 编解码器或测试替身).

use std::collections::HashMap;

use xun_core::{XunError, XunResult};

use crate::codec_id::CodecId;
use crate::session::{AudioCodecSession, VideoCodecSession};

/// 音频会话构造器
pub type AudioSessionCtor = Box<dyn Fn() -> XunResult<Box<dyn AudioCodecSession>> + Send + Sync>;

/// 视频会话构造器
pub type VideoSessionCtor = Box<dyn Fn() -> XunResult<Box<dyn VideoCodecSession>> + Send + Sync>;

/// 会话工厂
pub struct SessionFactory {
    /// 音频会话构造器映射
    audio: HashMap<CodecId, Vec<AudioEntry>>,
    /// 视频会话构造器映射
    video: HashMap<CodecId, Vec<VideoEntry>>,
}

struct AudioEntry {
    name: String,
    ctor: AudioSessionCtor,
}

struct VideoEntry {
    name: String,
    ctor: VideoSessionCtor,
}

impl SessionFactory {
    /// 创建空的工厂
    pub fn new() -> Self {
        Self {
            audio: HashMap::new(),
            video: HashMap::new(),
        }
    }

    /// 注册一个音频会话构造器
    pub fn register_audio(
        &mut self,
        codec_id: CodecId,
        name: impl Into<String>,
        ctor: AudioSessionCtor,
    ) {
        self.audio.entry(codec_id).or_default().push(AudioEntry {
            name: name.into(),
            ctor,
        });
    }

    /// 注册一个视频会话构造器
    pub fn register_video(
        &mut self,
        codec_id: CodecId,
        name: impl Into<String>,
        ctor: VideoSessionCtor,
    ) {
        self.video.entry(codec_id).or_default().push(VideoEntry {
            name: name.into(),
            ctor,
        });
    }

    /// 创建指定编解码器的音频会话实例
    pub fn create_audio(&self, codec_id: CodecId) -> XunResult<Box<dyn AudioCodecSession>> {
        let entries = self
            .audio
            .get(&codec_id)
            .ok_or_else(|| XunError::CodecNotFound(format!("未找到 {} 的音频会话", codec_id)))?;
        // 使用第一个注册的构造器 (优先级最高)
        let entry = &entries[0];
        (entry.ctor)()
    }

    /// 创建指定编解码器的视频会话实例
    pub fn create_video(&self, codec_id: CodecId) -> XunResult<Box<dyn VideoCodecSession>> {
        let entries = self
            .video
            .get(&codec_id)
            .ok_or_else(|| XunError::CodecNotFound(format!("未找到 {} 的视频会话", codec_id)))?;
        let entry = &entries[0];
        (entry.ctor)()
    }

    /// 获取所有已注册的音频会话名称
    pub fn list_audio(&self) -> Vec<(CodecId, &str)> {
        let mut result = Vec::new();
        for (id, entries) in &self.audio {
            for entry in entries {
                result.push((*id, entry.name.as_str()));
            }
        }
        result
    }

    /// 获取所有已注册的视频会话名称
    pub fn list_video(&self) -> Vec<(CodecId, &str)> {
        let mut result = Vec::new();
        for (id, entries) in &self.video {
            for entry in entries {
                result.push((*id, entry.name.as_str()));
            }
        }
        result
    }
}

impl Default for SessionFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_未注册时创建失败() {
        let factory = SessionFactory::new();
        assert!(matches!(
            factory.create_audio(CodecId::AmrNb),
            Err(XunError::CodecNotFound(_))
        ));
        assert!(matches!(
            factory.create_video(CodecId::H264),
            Err(XunError::CodecNotFound(_))
        ));
    }
}
