/// Audio encodings understood by the recognition service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEncoding {
    Linear16,
    Flac,
    Mp3,
    WebmOpus,
    OggOpus,
}

impl AudioEncoding {
    /// What browsers record by default.
    pub const DEFAULT: AudioEncoding = AudioEncoding::WebmOpus;

    pub fn sample_rate_hz(&self) -> u32 {
        match self {
            AudioEncoding::WebmOpus | AudioEncoding::OggOpus => 48_000,
            _ => 16_000,
        }
    }

    pub fn api_name(&self) -> &'static str {
        match self {
            AudioEncoding::Linear16 => "LINEAR16",
            AudioEncoding::Flac => "FLAC",
            AudioEncoding::Mp3 => "MP3",
            AudioEncoding::WebmOpus => "WEBM_OPUS",
            AudioEncoding::OggOpus => "OGG_OPUS",
        }
    }

    /// Maps a MIME type, ignoring parameters such as `;codecs=opus`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next()?.trim().to_ascii_lowercase();
        match essence.as_str() {
            "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/vnd.wave" | "audio/l16" => {
                Some(AudioEncoding::Linear16)
            }
            "audio/flac" | "audio/x-flac" => Some(AudioEncoding::Flac),
            "audio/mpeg" | "audio/mp3" => Some(AudioEncoding::Mp3),
            "audio/webm" | "video/webm" => Some(AudioEncoding::WebmOpus),
            "audio/ogg" | "audio/opus" | "application/ogg" => Some(AudioEncoding::OggOpus),
            _ => None,
        }
    }

    /// Maps the file extension at the end of a URL path.
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next()?;
        let file_name = path.rsplit('/').next()?;
        let (_, extension) = file_name.rsplit_once('.')?;
        match extension.to_ascii_lowercase().as_str() {
            "wav" => Some(AudioEncoding::Linear16),
            "flac" => Some(AudioEncoding::Flac),
            "mp3" => Some(AudioEncoding::Mp3),
            "webm" => Some(AudioEncoding::WebmOpus),
            "ogg" | "opus" | "oga" => Some(AudioEncoding::OggOpus),
            _ => None,
        }
    }

    /// Guesses from magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        infer::get(bytes).and_then(|kind| Self::from_mime(kind.mime_type()))
    }

    /// Detection order: URL suffix, HTTP content type, declared MIME, magic
    /// bytes, then the default.
    pub fn detect(
        url: Option<&str>,
        content_type: Option<&str>,
        declared_mime: Option<&str>,
        bytes: &[u8],
    ) -> Self {
        url.and_then(Self::from_url)
            .or_else(|| content_type.and_then(Self::from_mime))
            .or_else(|| declared_mime.and_then(Self::from_mime))
            .or_else(|| Self::sniff(bytes))
            .unwrap_or(Self::DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opus_uses_48khz_and_others_16khz() {
        assert_eq!(AudioEncoding::WebmOpus.sample_rate_hz(), 48_000);
        assert_eq!(AudioEncoding::OggOpus.sample_rate_hz(), 48_000);
        assert_eq!(AudioEncoding::Linear16.sample_rate_hz(), 16_000);
        assert_eq!(AudioEncoding::Mp3.sample_rate_hz(), 16_000);
    }

    #[test]
    fn url_suffix_takes_precedence() {
        let encoding = AudioEncoding::detect(
            Some("https://x.test/audio/clip.MP3?token=1"),
            Some("audio/webm"),
            None,
            &[],
        );
        assert_eq!(encoding, AudioEncoding::Mp3);
    }

    #[test]
    fn falls_back_through_content_type_and_mime() {
        assert_eq!(
            AudioEncoding::detect(Some("https://x.test/clip"), Some("audio/ogg"), None, &[]),
            AudioEncoding::OggOpus
        );
        assert_eq!(
            AudioEncoding::detect(None, None, Some("audio/webm;codecs=opus"), &[]),
            AudioEncoding::WebmOpus
        );
    }

    #[test]
    fn sniffs_wav_header() {
        let mut wav = b"RIFF".to_vec();
        wav.extend_from_slice(&36u32.to_le_bytes());
        wav.extend_from_slice(b"WAVEfmt ");
        wav.extend_from_slice(&[0u8; 24]);
        assert_eq!(
            AudioEncoding::detect(None, None, Some("application/octet-stream"), &wav),
            AudioEncoding::Linear16
        );
    }

    #[test]
    fn defaults_to_webm_opus() {
        assert_eq!(
            AudioEncoding::detect(None, None, None, &[0, 1, 2]),
            AudioEncoding::WebmOpus
        );
    }
}
