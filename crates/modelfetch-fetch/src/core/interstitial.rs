//! Detection of host-served warning pages that stand in for the real file.
//!
//! Consumer file-sharing hosts answer large downloads with a small HTML page
//! ("can't scan this file for viruses") whose download button points at the
//! same file plus a confirmation parameter. The fetch fails validation on
//! that page; the detector turns its body into the next locator to try.

use url::Url;

/// Bodies at or above this many bytes are never treated as interstitials.
pub const INTERSTITIAL_LIMIT: usize = 8192;

/// `true` when a body of `bytes_received` bytes may be a warning page.
pub fn is_interstitial_candidate(bytes_received: u64) -> bool {
    bytes_received > 0 && bytes_received < INTERSTITIAL_LIMIT as u64
}

/// Strategy that maps a small failed response body to a replacement locator.
pub trait ObstructionDetector: Send + Sync {
    /// Returns the locator to retry with, or `None` to retry `url` unchanged.
    fn detect(&self, url: &str, body: &[u8]) -> Option<String>;
}

/// Never rewrites the locator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDetector;

impl ObstructionDetector for NoDetector {
    fn detect(&self, _url: &str, _body: &[u8]) -> Option<String> { None }
}

/// Finds quoted attribute values that carry a confirmation marker.
///
/// The page text is split on `"`; every piece containing the marker is an
/// HTML-unescaped candidate link. Only a single unambiguous candidate is
/// followed.
#[derive(Debug, Clone)]
pub struct ConfirmLinkDetector {
    marker: String,
}

impl Default for ConfirmLinkDetector {
    fn default() -> Self { Self::new("confirm=t") }
}

impl ConfirmLinkDetector {
    pub fn new(marker: impl Into<String>) -> Self { Self { marker: marker.into() } }

    pub fn candidates(&self, text: &str) -> Vec<String> {
        text.split('"')
            .filter(|piece| piece.contains(&self.marker))
            .map(unescape_html)
            .collect()
    }
}

impl ObstructionDetector for ConfirmLinkDetector {
    fn detect(&self, url: &str, body: &[u8]) -> Option<String> {
        if !is_interstitial_candidate(body.len() as u64) {
            return None;
        }
        let text = std::str::from_utf8(body).ok()?;
        let candidates = self.candidates(text);
        let [link] = candidates.as_slice() else {
            tracing::debug!(count = candidates.len(), "no unambiguous confirmation link");
            return None;
        };
        let base = Url::parse(url).ok()?;
        base.join(link).ok().map(String::from)
    }
}

/// Decode the HTML character references that appear in attribute values.
///
/// Handles the five XML entities plus decimal and hex numeric references.
/// Anything unrecognised is kept verbatim.
pub fn unescape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let decoded = tail
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(|c| c == 'x' || c == 'X') {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
