//! Log frames pushed by the live log channel

use std::borrow::Cow;
use std::sync::LazyLock;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use regex::Regex;
use serde_json::Value;

use crate::errors::CasperError;

/// Separator between two log panels of an HTML frame
const HTML_PANEL_SEPARATOR: &str = r#"</div><div class="panel panel-default">"#;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^<]+?>").expect("valid HTML tag pattern"));

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\x1b[^m]*m").expect("valid ANSI escape pattern"));

/// One `job` event of the log channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFrame {
    /// Base64 encoded log bytes
    Raw(String),
    /// Pre-rendered HTML fragment
    Html(String),
    /// Server-side failure, ends the stream
    Error(String),
}

impl LogFrame {
    /// Read the payload of a `job` event. An `error` key wins over the
    /// others, then `raw`, then `html`.
    pub fn from_payload(payload: &Value) -> Result<Self, CasperError> {
        let field = |key: &str| payload.get(key).and_then(Value::as_str).map(str::to_string);

        if let Some(error) = payload.get("error") {
            let message = error
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Ok(LogFrame::Error(message));
        }
        if let Some(raw) = field("raw") {
            return Ok(LogFrame::Raw(raw));
        }
        if let Some(html) = field("html") {
            return Ok(LogFrame::Html(html));
        }
        Err(CasperError::Stream(format!(
            "unexpected job frame: {}",
            payload
        )))
    }

    /// Text to display for this frame. Raw bytes go through `decoder`, so
    /// a character split across frames comes out whole. Error frames
    /// become a `Stream` error.
    pub fn into_chunk(self, decoder: &mut Utf8Decoder) -> Result<String, CasperError> {
        match self {
            LogFrame::Raw(encoded) => {
                let bytes = BASE64
                    .decode(encoded.trim())
                    .map_err(|e| CasperError::Stream(format!("undecodable raw frame: {}", e)))?;
                Ok(decoder.decode(&bytes))
            }
            LogFrame::Html(html) => {
                let mut text = decoder.finish().unwrap_or_default();
                text.push_str(&html_to_text(&html));
                Ok(text)
            }
            LogFrame::Error(message) => Err(CasperError::Stream(message)),
        }
    }
}

/// Incremental UTF-8 decoding of a byte stream cut at arbitrary points
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Decode what `bytes` completes. An incomplete trailing sequence is
    /// kept for the next call; invalid bytes become U+FFFD.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut text = String::new();

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(valid) => {
                    text.push_str(valid);
                    self.pending.clear();
                    return text;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    text.push_str(&String::from_utf8_lossy(&self.pending[..valid_up_to]));
                    match e.error_len() {
                        None => {
                            self.pending.drain(..valid_up_to);
                            return text;
                        }
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid_up_to + len);
                        }
                    }
                }
            }
        }
    }

    /// Bytes left over at the end of the stream, if any
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(rest)
    }
}

/// Panel separators become newlines, every tag is dropped and a newline
/// ends the chunk
pub fn html_to_text(html: &str) -> String {
    let joined = html.replace(HTML_PANEL_SEPARATOR, "\n");
    let mut text = HTML_TAG.replace_all(&joined, "").into_owned();
    text.push('\n');
    text
}

/// Remove ANSI color sequences
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    ANSI_ESCAPE.replace_all(text, "")
}
