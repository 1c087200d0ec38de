//! Binary encoding of module files.
//!
//! Layout: a 4-byte little-endian header length, a bincode-encoded
//! [`ModuleHeader`], then the bincode-encoded [`ModuleImage`] payload. The
//! header's checksum covers the payload so a truncated or torn file is
//! rejected on load.

use loom_common::ContentHash;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ModuleError;
use crate::image::ModuleImage;

/// File extension for compiled modules.
pub const MODULE_EXTENSION: &str = "lmod";

/// Magic bytes identifying a Loom module.
const MODULE_MAGIC: [u8; 4] = *b"LMOD";

/// Current module format version. Increment on breaking changes to
/// the header or payload format.
const MODULE_FORMAT_VERSION: u32 = 1;

/// Header prepended to every module file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModuleHeader {
    magic: [u8; 4],
    format_version: u32,
    checksum: ContentHash,
}

/// Encodes a module image into its on-disk byte form.
pub fn encode_module(image: &ModuleImage) -> Result<Vec<u8>, ModuleError> {
    let payload = bincode::serde::encode_to_vec(image, bincode::config::standard())
        .map_err(|e| ModuleError::Serialization {
            reason: e.to_string(),
        })?;

    let header = ModuleHeader {
        magic: MODULE_MAGIC,
        format_version: MODULE_FORMAT_VERSION,
        checksum: ContentHash::from_bytes(&payload),
    };
    let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
        .map_err(|e| ModuleError::Serialization {
            reason: e.to_string(),
        })?;

    let header_len = header_bytes.len() as u32;
    let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
    output.extend_from_slice(&header_len.to_le_bytes());
    output.extend_from_slice(&header_bytes);
    output.extend_from_slice(&payload);
    Ok(output)
}

/// Decodes module bytes read from `path`, validating the header.
///
/// `path` is only used for error messages.
pub fn decode_module(raw: &[u8], path: &Path) -> Result<ModuleImage, ModuleError> {
    let invalid = |reason: &str| ModuleError::InvalidHeader {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let Some(len_bytes) = raw.get(..4) else {
        return Err(invalid("file is shorter than the header length prefix"));
    };
    let mut len_buf = [0u8; 4];
    len_buf.copy_from_slice(len_bytes);
    let header_len = u32::from_le_bytes(len_buf) as usize;

    let Some(header_bytes) = raw.get(4..4 + header_len) else {
        return Err(invalid("header is truncated"));
    };
    let (header, _): (ModuleHeader, usize) =
        bincode::serde::decode_from_slice(header_bytes, bincode::config::standard())
            .map_err(|e| invalid(&e.to_string()))?;

    if header.magic != MODULE_MAGIC {
        return Err(invalid("bad magic bytes"));
    }
    if header.format_version != MODULE_FORMAT_VERSION {
        return Err(ModuleError::VersionMismatch {
            path: path.to_path_buf(),
            expected: MODULE_FORMAT_VERSION,
            actual: header.format_version,
        });
    }

    let payload = &raw[4 + header_len..];
    let actual = ContentHash::from_bytes(payload);
    if actual != header.checksum {
        return Err(ModuleError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: header.checksum.to_string(),
            actual: actual.to_string(),
        });
    }

    let (image, _): (ModuleImage, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard()).map_err(|e| {
            ModuleError::Serialization {
                reason: e.to_string(),
            }
        })?;
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{ModuleIdentity, Version};
    use crate::image::{ModuleRef, TypeDef, TypeRef};

    fn image() -> ModuleImage {
        let mut image = ModuleImage::library(ModuleIdentity::new("Codec", Version::new(2, 1, 0)));
        image.types.push(TypeDef::class(
            Some("App"),
            "Thing",
            Some(TypeRef::named(ModuleRef::Reference(0), "System.Object")),
        ));
        image
    }

    #[test]
    fn encoded_module_decodes() {
        let bytes = encode_module(&image()).unwrap();
        let decoded = decode_module(&bytes, Path::new("x.lmod")).unwrap();
        assert_eq!(decoded, image());
    }

    #[test]
    fn empty_input_is_invalid_header() {
        let err = decode_module(&[], Path::new("x.lmod")).unwrap_err();
        assert!(matches!(err, ModuleError::InvalidHeader { .. }));
    }

    #[test]
    fn header_length_past_end_is_invalid() {
        let err = decode_module(&[200, 0, 0, 0, 1, 2], Path::new("x.lmod")).unwrap_err();
        assert!(matches!(err, ModuleError::InvalidHeader { .. }));
    }

    #[test]
    fn truncated_payload_fails_checksum() {
        let mut bytes = encode_module(&image()).unwrap();
        bytes.truncate(bytes.len() - 3);
        let err = decode_module(&bytes, Path::new("x.lmod")).unwrap_err();
        assert!(matches!(err, ModuleError::ChecksumMismatch { .. }));
    }

    #[test]
    fn corrupted_magic_is_rejected() {
        let mut bytes = encode_module(&image()).unwrap();
        // First header byte after the length prefix is the first magic byte.
        bytes[4] = b'X';
        let err = decode_module(&bytes, Path::new("x.lmod")).unwrap_err();
        assert!(matches!(err, ModuleError::InvalidHeader { .. }));
    }

    #[test]
    fn arbitrary_text_is_rejected() {
        let err = decode_module(b"this is not a module", Path::new("notes.txt"));
        assert!(err.is_err());
    }
}
