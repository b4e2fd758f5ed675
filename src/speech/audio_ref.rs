use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AudioRefError {
    #[error("audio reference must be an http(s) URL or a base64 data URI")]
    Unsupported,
    #[error("malformed data URI")]
    MalformedDataUri,
    #[error("data URI payload is not valid base64")]
    InvalidBase64,
    #[error("audio payload is empty")]
    Empty,
}

/// Where the audio of a spoken question lives.
#[derive(Clone, PartialEq)]
pub enum AudioRef {
    /// Remote file, downloaded before recognition.
    Url(String),
    /// Bytes already in hand: a decoded data URI or an uploaded file.
    Inline {
        mime_type: Option<String>,
        data: Vec<u8>,
    },
}

impl std::fmt::Debug for AudioRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioRef::Url(url) => f.debug_tuple("Url").field(url).finish(),
            AudioRef::Inline { mime_type, data } => f
                .debug_struct("Inline")
                .field("mime_type", mime_type)
                .field("len", &data.len())
                .finish(),
        }
    }
}

impl AudioRef {
    /// Parses a client-supplied reference string.
    pub fn parse(value: &str) -> Result<Self, AudioRefError> {
        let value = value.trim();
        if value.starts_with("http://") || value.starts_with("https://") {
            return Ok(AudioRef::Url(value.to_string()));
        }
        if let Some(rest) = value.strip_prefix("data:") {
            return Self::parse_data_uri(rest);
        }
        Err(AudioRefError::Unsupported)
    }

    pub fn from_upload(mime_type: Option<String>, data: Vec<u8>) -> Result<Self, AudioRefError> {
        if data.is_empty() {
            return Err(AudioRefError::Empty);
        }
        Ok(AudioRef::Inline {
            mime_type: mime_type.filter(|m| !m.is_empty()),
            data,
        })
    }

    fn parse_data_uri(rest: &str) -> Result<Self, AudioRefError> {
        let (header, payload) = rest.split_once(',').ok_or(AudioRefError::MalformedDataUri)?;
        let header = header
            .strip_suffix(";base64")
            .ok_or(AudioRefError::MalformedDataUri)?;
        let data = STANDARD
            .decode(payload.trim())
            .map_err(|_| AudioRefError::InvalidBase64)?;
        let mime_type = header
            .split(';')
            .next()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);
        Self::from_upload(mime_type, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_urls() {
        assert_eq!(
            AudioRef::parse(" https://cdn.example.com/q.webm ").unwrap(),
            AudioRef::Url("https://cdn.example.com/q.webm".to_string())
        );
    }

    #[test]
    fn parses_base64_data_uri_with_codec_parameter() {
        let audio = AudioRef::parse("data:audio/webm;codecs=opus;base64,AQID").unwrap();
        assert_eq!(
            audio,
            AudioRef::Inline {
                mime_type: Some("audio/webm".to_string()),
                data: vec![1, 2, 3],
            }
        );
    }

    #[test]
    fn rejects_unsupported_references() {
        assert_eq!(
            AudioRef::parse("ftp://host/file"),
            Err(AudioRefError::Unsupported)
        );
        assert_eq!(
            AudioRef::parse("data:audio/wav,plain"),
            Err(AudioRefError::MalformedDataUri)
        );
        assert_eq!(
            AudioRef::parse("data:audio/wav;base64,@@@"),
            Err(AudioRefError::InvalidBase64)
        );
        assert_eq!(AudioRef::parse("data:audio/wav;base64,"), Err(AudioRefError::Empty));
    }
}
