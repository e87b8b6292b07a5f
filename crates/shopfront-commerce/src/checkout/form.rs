//! Delivery form, delivery zones, payment methods and form validation.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::CommerceError;

/// Local mobile number: 11 digits starting with "01".
pub const PHONE_PATTERN: &str = r"^01[0-9]{9}$";

pub const MIN_NAME_LEN: usize = 3;
pub const MIN_ADDRESS_LEN: usize = 5;
pub const MIN_NOTE_LEN: usize = 5;

/// Delivery area; each maps to a configured fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryZone {
    InsideDhaka,
    SubDhaka,
    OutsideDhaka,
}

impl DeliveryZone {
    pub const ALL: [DeliveryZone; 3] = [
        DeliveryZone::InsideDhaka,
        DeliveryZone::SubDhaka,
        DeliveryZone::OutsideDhaka,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryZone::InsideDhaka => "inside_dhaka",
            DeliveryZone::SubDhaka => "sub_dhaka",
            DeliveryZone::OutsideDhaka => "outside_dhaka",
        }
    }
}

impl fmt::Display for DeliveryZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryZone {
    type Err = CommerceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeliveryZone::ALL
            .into_iter()
            .find(|z| z.as_str() == s)
            .ok_or_else(|| CommerceError::InvalidConfig(format!("unknown delivery zone: {s}")))
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum PaymentMethod {
    #[default]
    CashOnDelivery,
    Bkash,
    Nagad,
    Card,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::CashOnDelivery,
        PaymentMethod::Bkash,
        PaymentMethod::Nagad,
        PaymentMethod::Card,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "cashOnDelivery",
            PaymentMethod::Bkash => "bkash",
            PaymentMethod::Nagad => "nagad",
            PaymentMethod::Card => "card",
        }
    }

    /// Redirect-based methods that need a payment session.
    pub fn is_gateway(&self) -> bool {
        !matches!(self, PaymentMethod::CashOnDelivery)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = CommerceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CommerceError::InvalidConfig(format!("unknown payment method: {s}")))
    }
}

/// Customer input collected on the checkout page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutForm {
    pub name: String,
    pub phone: String,
    pub address: String,
    #[serde(default)]
    pub delivery_zone: Option<DeliveryZone>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

/// Form field a validation error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Name,
    Phone,
    Address,
    DeliveryZone,
    Note,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::Name => "name",
            FormField::Phone => "phone",
            FormField::Address => "address",
            FormField::DeliveryZone => "delivery_zone",
            FormField::Note => "note",
        }
    }
}

/// An inline error for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: FormField,
    pub message: &'static str,
}

/// Every problem with a submitted form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    pub errors: Vec<FieldError>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The view scrolls to the top so inline errors are visible.
    pub fn scroll_to_top(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn message_for(&self, field: FormField) -> Option<&'static str> {
        self.errors.iter().find(|e| e.field == field).map(|e| e.message)
    }

    fn push(&mut self, field: FormField, message: &'static str) {
        self.errors.push(FieldError { field, message });
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message).collect();
        f.write_str(&messages.join("; "))
    }
}

pub mod messages {
    pub const NAME_TOO_SHORT: &str = "নাম কমপক্ষে ৩ অক্ষরের হতে হবে";
    pub const PHONE_INVALID: &str = "সঠিক মোবাইল নম্বর দিন (যেমন: 01XXXXXXXXX)";
    pub const ADDRESS_REQUIRED: &str = "ঠিকানা দিন";
    pub const ADDRESS_TOO_SHORT: &str = "ঠিকানা কমপক্ষে ৫ অক্ষরের হতে হবে";
    pub const ZONE_REQUIRED: &str = "ডেলিভারি এলাকা নির্বাচন করুন";
    pub const NOTE_TOO_SHORT: &str = "নোট কমপক্ষে ৫ অক্ষরের হতে হবে";
}

fn phone_regex() -> Option<&'static Regex> {
    static PHONE: OnceLock<Option<Regex>> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(PHONE_PATTERN).ok()).as_ref()
}

/// Check a phone number against the local mobile pattern.
pub fn is_valid_phone(phone: &str) -> bool {
    phone_regex().is_some_and(|re| re.is_match(phone.trim()))
}

fn char_len(s: &str) -> usize {
    s.trim().chars().count()
}

impl CheckoutForm {
    /// Validate every field, collecting all failures.
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();

        if char_len(&self.name) < MIN_NAME_LEN {
            errors.push(FormField::Name, messages::NAME_TOO_SHORT);
        }
        if !is_valid_phone(&self.phone) {
            errors.push(FormField::Phone, messages::PHONE_INVALID);
        }
        match char_len(&self.address) {
            0 => errors.push(FormField::Address, messages::ADDRESS_REQUIRED),
            n if n < MIN_ADDRESS_LEN => errors.push(FormField::Address, messages::ADDRESS_TOO_SHORT),
            _ => {}
        }
        if self.delivery_zone.is_none() {
            errors.push(FormField::DeliveryZone, messages::ZONE_REQUIRED);
        }
        if let Some(note) = self.note.as_deref() {
            let len = char_len(note);
            if len > 0 && len < MIN_NOTE_LEN {
                errors.push(FormField::Note, messages::NOTE_TOO_SHORT);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// The note, if it carries any text.
    pub fn note_text(&self) -> Option<&str> {
        self.note.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

/// Mask a phone number for logs, keeping the last three digits.
pub fn mask_phone(phone: &str) -> String {
    let digits: Vec<char> = phone.trim().chars().collect();
    let keep = digits.len().min(3);
    let masked = digits.len() - keep;
    let tail: String = digits[masked..].iter().collect();
    format!("{}{}", "*".repeat(masked), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> CheckoutForm {
        CheckoutForm {
            name: "Rahim Uddin".to_string(),
            phone: "01712345678".to_string(),
            address: "House 12, Road 5, Dhanmondi".to_string(),
            delivery_zone: Some(DeliveryZone::InsideDhaka),
            note: None,
            payment_method: PaymentMethod::CashOnDelivery,
        }
    }

    #[test]
    fn test_valid_form_passes() {
        assert!(valid_form().validate().is_ok());
    }

    #[test]
    fn test_phone_pattern() {
        assert!(is_valid_phone("01712345678"));
        assert!(!is_valid_phone("123"));
        assert!(!is_valid_phone("02712345678"));
        assert!(!is_valid_phone("017123456789"));
        assert!(!is_valid_phone("0171234567a"));
    }

    #[test]
    fn test_phone_rejects_non_ascii_digits() {
        assert!(!is_valid_phone("01৭১২৩৪৫৬৭৮"));
        assert!(!is_valid_phone("01٧١٢٣٤٥٦٧٨"));
        assert!(!is_valid_phone("０１７１２３４５６７８"));
    }

    #[test]
    fn test_short_phone_gets_bengali_error() {
        let form = CheckoutForm {
            phone: "123".to_string(),
            ..valid_form()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.message_for(FormField::Phone), Some(messages::PHONE_INVALID));
        assert!(errors.scroll_to_top());
    }

    #[test]
    fn test_collects_all_failures() {
        let form = CheckoutForm {
            name: "Al".to_string(),
            phone: String::new(),
            address: String::new(),
            delivery_zone: None,
            note: Some("hey".to_string()),
            payment_method: PaymentMethod::Bkash,
        };
        let errors = form.validate().unwrap_err();
        let fields: Vec<FormField> = errors.errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                FormField::Name,
                FormField::Phone,
                FormField::Address,
                FormField::DeliveryZone,
                FormField::Note
            ]
        );
        assert_eq!(errors.message_for(FormField::Address), Some(messages::ADDRESS_REQUIRED));
    }

    #[test]
    fn test_lengths_count_characters_not_bytes() {
        let form = CheckoutForm {
            name: "রহিম".to_string(),
            address: "ঢাকা".to_string(),
            ..valid_form()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.message_for(FormField::Name).is_none());
        assert_eq!(errors.message_for(FormField::Address), Some(messages::ADDRESS_TOO_SHORT));
    }

    #[test]
    fn test_blank_note_is_treated_as_absent() {
        let form = CheckoutForm {
            note: Some("   ".to_string()),
            ..valid_form()
        };
        assert!(form.validate().is_ok());
        assert_eq!(form.note_text(), None);
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("sub_dhaka".parse::<DeliveryZone>().unwrap(), DeliveryZone::SubDhaka);
        assert_eq!("bkash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Bkash);
        assert_eq!(
            "cashondelivery".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::CashOnDelivery
        );
        assert!("rocket".parse::<PaymentMethod>().is_err());
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap(),
            "\"cashOnDelivery\""
        );
    }

    #[test]
    fn test_mask_phone() {
        assert_eq!(mask_phone("01712345678"), "********678");
        assert_eq!(mask_phone("12"), "12");
    }
}
