// ABOUTME: Binary file signature detection for response payloads
// ABOUTME: Inspects raw byte buffers directly, with a best-effort check for already-decoded strings

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    Jpeg,
    Png,
    Gif,
    WebP,
    /// RIFF container that is not WebP (WAV, AVI, ...)
    Riff,
}

impl Signature {
    pub fn mime(&self) -> &'static str {
        match self {
            Signature::Jpeg => "image/jpeg",
            Signature::Png => "image/png",
            Signature::Gif => "image/gif",
            Signature::WebP => "image/webp",
            Signature::Riff => "application/octet-stream",
        }
    }

    pub fn is_image(&self) -> bool {
        !matches!(self, Signature::Riff)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Signature::Jpeg => "JPEG",
            Signature::Png => "PNG",
            Signature::Gif => "GIF",
            Signature::WebP => "WebP",
            Signature::Riff => "RIFF",
        };
        write!(f, "{}", name)
    }
}

/// Identify a raw buffer by its magic bytes.
pub fn sniff_bytes(bytes: &[u8]) -> Option<Signature> {
    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some(Signature::Png);
    }
    // JPEG: FF D8 FF
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(Signature::Jpeg);
    }
    // GIF: GIF87a or GIF89a
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some(Signature::Gif);
    }
    // WebP: RIFF....WEBP
    if bytes.starts_with(b"RIFF") {
        if bytes.len() >= 12 && &bytes[8..12] == b"WEBP" {
            return Some(Signature::WebP);
        }
        return Some(Signature::Riff);
    }
    None
}

/// Prefix check against a string whose bytes were already decoded one char
/// per byte. Only meaningful when no raw buffer is available.
pub fn sniff_legacy_str(text: &str) -> Option<Signature> {
    if text.starts_with("\u{FF}\u{D8}\u{FF}") {
        Some(Signature::Jpeg)
    } else if text.starts_with("\u{89}PNG") {
        Some(Signature::Png)
    } else if text.starts_with("GIF8") {
        Some(Signature::Gif)
    } else if text.starts_with("RIFF") {
        Some(Signature::Riff)
    } else {
        None
    }
}
