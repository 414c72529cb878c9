//! EMV tag-length-value fields and the CRC-16 trailer.

use super::error::QrisError;

/// Tag and length of the checksum field.
const CRC_PREFIX: &str = "6304";
/// Longest value a two-digit length can describe.
const MAX_VALUE_LEN: usize = 99;

/// One decoded field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvField {
    /// Two-digit tag.
    pub tag: String,
    /// Raw value.
    pub value: String,
}

/// Encode one field.
///
/// # Errors
///
/// Returns `QrisError::Malformed` for a non-numeric tag or a value that is
/// not ASCII or longer than 99 characters.
pub fn encode_field(tag: &str, value: &str) -> Result<String, QrisError> {
    if tag.len() != 2 || !tag.bytes().all(|b| b.is_ascii_digit()) {
        return Err(QrisError::malformed(format!("bad tag '{tag}'")));
    }
    if !value.is_ascii() {
        return Err(QrisError::malformed(format!("tag {tag} is not ASCII")));
    }
    let len = value.len();
    if len > MAX_VALUE_LEN {
        return Err(QrisError::malformed(format!(
            "tag {tag} is longer than {MAX_VALUE_LEN} characters"
        )));
    }
    Ok(format!("{tag}{len:02}{value}"))
}

/// Split a string of concatenated fields.
///
/// # Errors
///
/// Returns `QrisError::Malformed` on a truncated or non-numeric header.
pub fn parse_fields(data: &str) -> Result<Vec<TlvField>, QrisError> {
    if !data.is_ascii() {
        return Err(QrisError::malformed("payload is not ASCII"));
    }

    let mut fields = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        let header = data
            .get(pos..pos + 4)
            .ok_or_else(|| QrisError::malformed("truncated field header"))?;
        if !header.bytes().all(|b| b.is_ascii_digit()) {
            return Err(QrisError::malformed(format!("bad field header '{header}'")));
        }
        let (tag, len) = header.split_at(2);
        let len: usize = len
            .parse()
            .map_err(|_| QrisError::malformed(format!("bad length for tag {tag}")))?;
        let value = data
            .get(pos + 4..pos + 4 + len)
            .ok_or_else(|| QrisError::malformed(format!("tag {tag} is truncated")))?;

        fields.push(TlvField {
            tag: tag.to_string(),
            value: value.to_string(),
        });
        pos += 4 + len;
    }
    Ok(fields)
}

/// CRC-16/CCITT-FALSE: poly 0x1021, init 0xFFFF, no reflection, no final xor.
#[must_use]
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 == 0 {
                crc << 1
            } else {
                (crc << 1) ^ 0x1021
            };
        }
    }
    crc
}

/// Append the checksum field to an encoded body.
#[must_use]
pub fn seal(body: &str) -> String {
    let signed = format!("{body}{CRC_PREFIX}");
    let crc = crc16(signed.as_bytes());
    format!("{signed}{crc:04X}")
}

/// Check the trailing checksum field and return the body before it.
///
/// # Errors
///
/// Returns `QrisError::Malformed` when the payload does not end in a
/// checksum field and `QrisError::Checksum` when the digits do not match.
pub fn unseal(payload: &str) -> Result<&str, QrisError> {
    if !payload.is_ascii() || payload.len() < CRC_PREFIX.len() + 4 {
        return Err(QrisError::malformed("payload too short"));
    }
    let (signed, presented) = payload.split_at(payload.len() - 4);
    let Some(body) = signed.strip_suffix(CRC_PREFIX) else {
        return Err(QrisError::malformed("missing checksum field"));
    };
    if presented != format!("{:04X}", crc16(signed.as_bytes())) {
        return Err(QrisError::Checksum);
    }
    Ok(body)
}
