//! QRIS payloads and merchant payments.
//!
//! QRIS is the Indonesian profile of the EMV QR code: a flat string of
//! `tag(2) length(2) value` fields closed by a CRC-16/CCITT-FALSE field
//! `6304XXXX` computed over everything before the four hex digits.
//!
//! This module provides:
//! - The TLV codec and checksum
//! - Customer-presented payloads for the account holder
//! - Merchant-presented payload decoding and payment

mod error;
mod payload;
mod service;
mod tlv;


pub use error::QrisError;
pub use payload::{CPM_VALIDITY_SECS, MerchantPayload, build_customer_payload};
pub use service::{CustomerPayload, PaymentLedger, QrisDebit, QrisPayment, QrisService};
pub use tlv::{TlvField, crc16, encode_field, parse_fields, seal, unseal};
