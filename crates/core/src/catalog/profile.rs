//! Encode options shared by every rendition.

use serde::{Deserialize, Serialize};

/// Audio codecs the MP4 muxer accepts as-is.
const MP4_AUDIO_CODECS: &[&str] = &["aac", "mp3", "ac3", "eac3", "alac"];

/// What happens to the source audio track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioHandling {
    /// Outputs carry no audio.
    Drop,
    /// Source audio is muxed untouched.
    Copy,
    /// Source audio is re-encoded with the profile's audio encoder.
    Encode,
}

impl AudioHandling {
    /// Picks the handling for a source whose first audio stream uses
    /// `source_codec`.
    ///
    /// Retained audio is copied only when the rendition container can hold it.
    pub fn resolve(retain_audio: bool, source_codec: Option<&str>) -> Self {
        match source_codec {
            _ if !retain_audio => AudioHandling::Drop,
            Some(codec) if MP4_AUDIO_CODECS.contains(&codec) => AudioHandling::Copy,
            _ => AudioHandling::Encode,
        }
    }
}

/// Options common to all renditions of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeProfile {
    /// Video encoder.
    #[serde(default = "default_video_codec")]
    pub video_codec: String,
    /// Constant Rate Factor (quality, lower = better, 0-51 for x264).
    #[serde(default = "default_crf")]
    pub crf: u8,
    /// Encoder speed preset.
    #[serde(default = "default_preset")]
    pub preset: String,
    /// H.264 profile.
    #[serde(default = "default_profile")]
    pub profile: String,
    /// H.264 level.
    #[serde(default = "default_level")]
    pub level: String,
    /// MP4 muxer flags.
    #[serde(default = "default_movflags")]
    pub movflags: String,
    /// Audio encoder used when retained audio cannot be copied.
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,
    /// Audio bitrate in kbps when re-encoding.
    #[serde(default = "default_audio_bitrate_kbps")]
    pub audio_bitrate_kbps: u32,
    /// Additional options appended after the common set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_options: Vec<String>,
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_audio_bitrate_kbps() -> u32 {
    128
}

fn default_crf() -> u8 {
    23
}

fn default_preset() -> String {
    "veryslow".to_string()
}

fn default_profile() -> String {
    "high".to_string()
}

fn default_level() -> String {
    "4.1".to_string()
}

fn default_movflags() -> String {
    "faststart".to_string()
}

impl Default for EncodeProfile {
    fn default() -> Self {
        Self {
            video_codec: default_video_codec(),
            crf: default_crf(),
            preset: default_preset(),
            profile: default_profile(),
            level: default_level(),
            movflags: default_movflags(),
            audio_codec: default_audio_codec(),
            audio_bitrate_kbps: default_audio_bitrate_kbps(),
            extra_options: Vec::new(),
        }
    }
}

impl EncodeProfile {
    /// Convert to ffmpeg output arguments.
    pub fn to_ffmpeg_args(&self, audio: AudioHandling) -> Vec<String> {
        let mut args = vec![
            "-c:v".to_string(),
            self.video_codec.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-preset".to_string(),
            self.preset.clone(),
            "-profile:v".to_string(),
            self.profile.clone(),
            "-level:v".to_string(),
            self.level.clone(),
            "-movflags".to_string(),
            self.movflags.clone(),
        ];

        match audio {
            AudioHandling::Drop => args.push("-an".to_string()),
            AudioHandling::Copy => args.extend(["-c:a".to_string(), "copy".to_string()]),
            AudioHandling::Encode => args.extend([
                "-c:a".to_string(),
                self.audio_codec.clone(),
                "-b:a".to_string(),
                format!("{}k", self.audio_bitrate_kbps),
            ]),
        }

        args.extend(self.extra_options.iter().cloned());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = EncodeProfile::default().to_ffmpeg_args(AudioHandling::Drop);
        assert_eq!(
            args,
            vec![
                "-c:v", "libx264", "-crf", "23", "-preset", "veryslow", "-profile:v", "high",
                "-level:v", "4.1", "-movflags", "faststart", "-an",
            ]
        );
    }

    #[test]
    fn test_retain_audio_copies_stream() {
        let args = EncodeProfile::default().to_ffmpeg_args(AudioHandling::Copy);
        assert!(!args.contains(&"-an".to_string()));
        let pos = args.iter().position(|a| a == "-c:a").unwrap();
        assert_eq!(args[pos + 1], "copy");
        assert!(!args.contains(&"-b:a".to_string()));
    }

    #[test]
    fn test_retain_audio_reencodes_stream() {
        let args = EncodeProfile::default().to_ffmpeg_args(AudioHandling::Encode);
        assert!(!args.contains(&"-an".to_string()));
        let pos = args.iter().position(|a| a == "-c:a").unwrap();
        assert_eq!(&args[pos + 1..pos + 4], &["aac", "-b:a", "128k"]);
    }

    #[test]
    fn test_resolve_audio_handling() {
        assert_eq!(AudioHandling::resolve(false, Some("aac")), AudioHandling::Drop);
        assert_eq!(AudioHandling::resolve(true, Some("aac")), AudioHandling::Copy);
        assert_eq!(AudioHandling::resolve(true, Some("mp3")), AudioHandling::Copy);
        assert_eq!(
            AudioHandling::resolve(true, Some("pcm_s16le")),
            AudioHandling::Encode
        );
        assert_eq!(AudioHandling::resolve(true, Some("vorbis")), AudioHandling::Encode);
        assert_eq!(AudioHandling::resolve(true, None), AudioHandling::Encode);
    }

    #[test]
    fn test_partial_toml() {
        let profile: EncodeProfile = toml::from_str(r#"preset = "medium""#).unwrap();
        assert_eq!(profile.preset, "medium");
        assert_eq!(profile.crf, 23);
    }
}
