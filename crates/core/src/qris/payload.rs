//! Customer- and merchant-presented payload layouts.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::error::QrisError;
use super::tlv::{TlvField, encode_field, parse_fields, seal, unseal};
use crate::mutation::wib;
use crate::user::UserAccount;

/// How long a customer-presented payload stays valid.
pub const CPM_VALIDITY_SECS: i64 = 5 * 60;

const PAYLOAD_FORMAT: &str = "01";
const DYNAMIC_INITIATION: &str = "12";
const STATIC_INITIATION: &str = "11";
const GLOBAL_ID: &str = "ID.CO.RUPI.WWW";
const CURRENCY_IDR: &str = "360";
const COUNTRY: &str = "ID";
const MAX_NAME_LEN: usize = 25;
const MAX_CITY_LEN: usize = 15;

mod tag {
    pub const PAYLOAD_FORMAT: &str = "00";
    pub const INITIATION: &str = "01";
    pub const ACCOUNT_FIRST: u8 = 26;
    pub const ACCOUNT_LAST: u8 = 51;
    pub const CURRENCY: &str = "53";
    pub const AMOUNT: &str = "54";
    pub const COUNTRY: &str = "58";
    pub const NAME: &str = "59";
    pub const CITY: &str = "60";
    pub const ADDITIONAL: &str = "62";

    pub const SUB_GLOBAL_ID: &str = "00";
    pub const SUB_PAN: &str = "01";
    pub const SUB_MERCHANT_ID: &str = "02";
    pub const SUB_REFERENCE: &str = "05";
}

fn clip(value: &str, max: usize) -> String {
    value
        .chars()
        .filter(char::is_ascii)
        .take(max)
        .collect::<String>()
        .trim()
        .to_string()
}

fn find<'a>(fields: &'a [TlvField], tag: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|f| f.tag == tag)
        .map(|f| f.value.as_str())
}

fn require<'a>(fields: &'a [TlvField], tag: &str, name: &str) -> Result<&'a str, QrisError> {
    find(fields, tag)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| QrisError::malformed(format!("missing {name}")))
}

/// Build the payload the account holder shows to a merchant.
///
/// The additional data field carries the WIB issue timestamp as the
/// reference label so every payload is unique.
///
/// # Errors
///
/// Returns `QrisError::Malformed` if a field cannot be encoded.
pub fn build_customer_payload(
    user: &UserAccount,
    issued_at: DateTime<Utc>,
) -> Result<String, QrisError> {
    let account = [
        encode_field(tag::SUB_GLOBAL_ID, GLOBAL_ID)?,
        encode_field(tag::SUB_PAN, &user.account_number)?,
    ]
    .concat();
    let reference = issued_at
        .with_timezone(&wib())
        .format("%Y%m%d%H%M%S")
        .to_string();

    let body = [
        encode_field(tag::PAYLOAD_FORMAT, PAYLOAD_FORMAT)?,
        encode_field(tag::INITIATION, DYNAMIC_INITIATION)?,
        encode_field("26", &account)?,
        encode_field(tag::CURRENCY, CURRENCY_IDR)?,
        encode_field(tag::COUNTRY, COUNTRY)?,
        encode_field(tag::NAME, &clip(&user.full_name, MAX_NAME_LEN))?,
        encode_field(tag::ADDITIONAL, &encode_field(tag::SUB_REFERENCE, &reference)?)?,
    ]
    .concat();

    Ok(seal(&body))
}

/// The parts of a merchant-presented payload needed to pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerchantPayload {
    /// Merchant name, tag 59.
    pub name: String,
    /// Merchant city, tag 60.
    pub city: String,
    /// Merchant PAN or ID from the first account template (tags 26-51).
    pub account: Option<String>,
    /// Fixed amount, tag 54; `None` lets the payer enter one.
    pub amount: Option<Decimal>,
}

impl MerchantPayload {
    /// Decode and checksum-verify a merchant payload.
    ///
    /// # Errors
    ///
    /// Returns `QrisError::Checksum` for a CRC mismatch and
    /// `QrisError::Malformed` for anything else wrong with the payload.
    pub fn decode(payload: &str) -> Result<Self, QrisError> {
        let body = unseal(payload.trim())?;
        let fields = parse_fields(body)?;

        if find(&fields, tag::PAYLOAD_FORMAT) != Some(PAYLOAD_FORMAT) {
            return Err(QrisError::malformed("unsupported payload format"));
        }
        if let Some(currency) = find(&fields, tag::CURRENCY)
            && currency != CURRENCY_IDR
        {
            return Err(QrisError::malformed(format!("unsupported currency {currency}")));
        }

        let name = require(&fields, tag::NAME, "merchant name")?.to_string();
        let city = require(&fields, tag::CITY, "merchant city")?.to_string();

        let account = fields
            .iter()
            .filter(|f| {
                f.tag
                    .parse::<u8>()
                    .is_ok_and(|t| (tag::ACCOUNT_FIRST..=tag::ACCOUNT_LAST).contains(&t))
            })
            .find_map(|f| {
                let sub = parse_fields(&f.value).ok()?;
                find(&sub, tag::SUB_PAN)
                    .or_else(|| find(&sub, tag::SUB_MERCHANT_ID))
                    .map(str::to_string)
            });

        let amount = find(&fields, tag::AMOUNT)
            .map(|raw| {
                Decimal::from_str(raw)
                    .ok()
                    .filter(|a| a.is_sign_positive() && !a.is_zero())
                    .ok_or_else(|| QrisError::malformed(format!("bad amount '{raw}'")))
            })
            .transpose()?;

        Ok(Self {
            name,
            city,
            account,
            amount,
        })
    }

    /// Encode as a static (or, with an amount, dynamic) merchant payload.
    ///
    /// # Errors
    ///
    /// Returns `QrisError::Malformed` if a field cannot be encoded.
    pub fn encode(&self) -> Result<String, QrisError> {
        let mut account = encode_field(tag::SUB_GLOBAL_ID, GLOBAL_ID)?;
        if let Some(pan) = &self.account {
            account.push_str(&encode_field(tag::SUB_PAN, pan)?);
        }
        let initiation = if self.amount.is_some() {
            DYNAMIC_INITIATION
        } else {
            STATIC_INITIATION
        };

        let mut body = [
            encode_field(tag::PAYLOAD_FORMAT, PAYLOAD_FORMAT)?,
            encode_field(tag::INITIATION, initiation)?,
            encode_field("26", &account)?,
            encode_field(tag::CURRENCY, CURRENCY_IDR)?,
        ]
        .concat();
        if let Some(amount) = self.amount {
            body.push_str(&encode_field(tag::AMOUNT, &amount.normalize().to_string())?);
        }
        body.push_str(&encode_field(tag::COUNTRY, COUNTRY)?);
        body.push_str(&encode_field(tag::NAME, &clip(&self.name, MAX_NAME_LEN))?);
        body.push_str(&encode_field(tag::CITY, &clip(&self.city, MAX_CITY_LEN))?);

        Ok(seal(&body))
    }
}
