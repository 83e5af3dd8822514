mod zlib;

pub use zlib::ZlibCodec;

use cmpz_core::Codec;
use std::sync::Arc;

/// The codec every CMP1 stream is written and read with.
pub fn default_codec() -> Arc<dyn Codec> {
    Arc::new(ZlibCodec::default())
}

/// The CMP1 codec at an explicit compression level (0–9).
pub fn codec_with_level(level: u32) -> Arc<dyn Codec> {
    Arc::new(ZlibCodec::new(level))
}
