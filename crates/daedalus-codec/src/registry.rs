//! Codec registration and lookup.

use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use serde_json::Value;

use crate::error::CodecError;

/// Pattern matching any media type.
pub const WILDCARD: &str = "*/*";

/// Decodes a request body into a payload value.
pub trait Decoder: Send + Sync {
    /// Reads the body from `reader` and stores the decoded value in
    /// `target`.
    fn decode(&self, reader: &mut dyn Read, target: &mut Value) -> Result<(), CodecError>;
}

/// Encodes a payload value into a response body.
pub trait Encoder: Send + Sync {
    /// Writes the encoded form of `value` to `writer`.
    fn encode(&self, writer: &mut dyn Write, value: &Value) -> Result<(), CodecError>;
}

/// The outcome of response encoder negotiation.
pub struct ResolvedEncoder {
    /// The encoder to use.
    pub encoder: Arc<dyn Encoder>,
    /// Media type to advertise in the response `Content-Type` header.
    pub content_type: String,
}

impl fmt::Debug for ResolvedEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedEncoder")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Maps media type patterns to decoders and encoders.
///
/// Registration replaces: registering a codec for a pattern that already
/// has one swaps the old codec out. Lookup prefers an exact pattern match
/// and falls back to [`WILDCARD`] when one is registered.
#[derive(Default)]
pub struct CodecRegistry {
    decoders: HashMap<String, Arc<dyn Decoder>>,
    encoders: HashMap<String, Arc<dyn Encoder>>,
}

impl CodecRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `decoder` for each of the given media type patterns.
    ///
    /// Patterns are normalized before storage, so `Application/JSON` and
    /// `application/json; charset=utf-8` register the same pattern.
    pub fn register_decoder(&mut self, decoder: Arc<dyn Decoder>, patterns: &[&str]) {
        for pattern in patterns {
            let pattern = normalize_media_type(pattern);
            if pattern.is_empty() {
                continue;
            }
            self.decoders.insert(pattern, Arc::clone(&decoder));
        }
    }

    /// Registers `encoder` for each of the given media type patterns.
    pub fn register_encoder(&mut self, encoder: Arc<dyn Encoder>, patterns: &[&str]) {
        for pattern in patterns {
            let pattern = normalize_media_type(pattern);
            if pattern.is_empty() {
                continue;
            }
            self.encoders.insert(pattern, Arc::clone(&encoder));
        }
    }

    /// Picks the decoder for a request `Content-Type` header.
    ///
    /// A missing or empty header falls back to `default_pattern`. Returns
    /// `None` when neither the named pattern nor [`WILDCARD`] has a
    /// decoder, in which case the dispatcher skips body decoding.
    #[must_use]
    pub fn resolve_decoder(
        &self,
        content_type: Option<&str>,
        default_pattern: &str,
    ) -> Option<Arc<dyn Decoder>> {
        let pattern = content_type
            .map(normalize_media_type)
            .filter(|pattern| !pattern.is_empty())
            .unwrap_or_else(|| normalize_media_type(default_pattern));

        self.decoders
            .get(&pattern)
            .or_else(|| self.decoders.get(WILDCARD))
            .cloned()
    }

    /// Picks the encoder for a request `Accept` header.
    ///
    /// Entries are tried in the order the client listed them; the first
    /// with a registered encoder wins and its media type is advertised in
    /// the response. A `*/*` entry, an unmatched list, and a missing
    /// header all resolve against `default_pattern`.
    #[must_use]
    pub fn resolve_encoder(
        &self,
        accept: Option<&str>,
        default_pattern: &str,
    ) -> Option<ResolvedEncoder> {
        let default_pattern = normalize_media_type(default_pattern);

        if let Some(accept) = accept {
            for entry in accept.split(',') {
                let media_type = normalize_media_type(entry);
                if media_type.is_empty() {
                    continue;
                }
                if media_type == WILDCARD {
                    if let Some(resolved) = self.default_encoder(&default_pattern) {
                        return Some(resolved);
                    }
                    continue;
                }
                if let Some(encoder) = self.encoders.get(&media_type) {
                    return Some(ResolvedEncoder {
                        encoder: Arc::clone(encoder),
                        content_type: media_type,
                    });
                }
            }
        }

        self.default_encoder(&default_pattern)
    }

    /// Media type patterns with a registered decoder.
    pub fn decoder_patterns(&self) -> impl Iterator<Item = &str> {
        self.decoders.keys().map(String::as_str)
    }

    /// Media type patterns with a registered encoder.
    pub fn encoder_patterns(&self) -> impl Iterator<Item = &str> {
        self.encoders.keys().map(String::as_str)
    }

    fn default_encoder(&self, default_pattern: &str) -> Option<ResolvedEncoder> {
        self.encoders
            .get(default_pattern)
            .or_else(|| self.encoders.get(WILDCARD))
            .map(|encoder| ResolvedEncoder {
                encoder: Arc::clone(encoder),
                content_type: default_pattern.to_owned(),
            })
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut decoders: Vec<&str> = self.decoder_patterns().collect();
        let mut encoders: Vec<&str> = self.encoder_patterns().collect();
        decoders.sort_unstable();
        encoders.sort_unstable();
        f.debug_struct("CodecRegistry")
            .field("decoders", &decoders)
            .field("encoders", &encoders)
            .finish()
    }
}

/// Strips parameters from a media type and lowercases it.
fn normalize_media_type(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or(media_type)
        .trim()
        .to_ascii_lowercase()
}
