//! Communication channel domain model.
//!
//! # Responsibility
//! - Define the canonical channel record shared by all channel kinds.
//! - Provide factory constructors so kind/details consistency is enforced at
//!   a single choke point.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another channel.
//! - `kind` always agrees with the `details` variant; `PhoneOrFax` details are
//!   valid for both `PhoneNumber` and `FaxNumber` kinds.
//! - Ordering is total and stable: `(kind, uuid)`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a communication channel.
pub type ChannelId = Uuid;

/// Closed set of channel kinds.
///
/// Variant order is the canonical sort order for channel collections, so the
/// derived `Ord` is part of the contract.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    PostalAddress,
    PhoneNumber,
    FaxNumber,
    EmailAddress,
}

impl ChannelType {
    /// All kinds in canonical order.
    pub const fn all() -> [Self; 4] {
        [
            Self::PostalAddress,
            Self::PhoneNumber,
            Self::FaxNumber,
            Self::EmailAddress,
        ]
    }

    /// Stable string id used in storage and wire formats.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PostalAddress => "postal_address",
            Self::PhoneNumber => "phone_number",
            Self::FaxNumber => "fax_number",
            Self::EmailAddress => "email_address",
        }
    }

    /// Human-readable title for display and choice lists.
    pub const fn title(self) -> &'static str {
        match self {
            Self::PostalAddress => "Postal Address",
            Self::PhoneNumber => "Phone Number",
            Self::FaxNumber => "Fax Number",
            Self::EmailAddress => "Email Address",
        }
    }

    /// Parses the stable string id back into a kind.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "postal_address" => Some(Self::PostalAddress),
            "phone_number" => Some(Self::PhoneNumber),
            "fax_number" => Some(Self::FaxNumber),
            "email_address" => Some(Self::EmailAddress),
            _ => None,
        }
    }
}

/// Kind-specific channel data.
///
/// Stands in for the original subtype hierarchy: one variant per concrete
/// channel shape, with `PhoneOrFax` shared by phone and fax kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "subtype", rename_all = "snake_case")]
pub enum ChannelDetails {
    PostalAddress {
        line1: String,
        line2: Option<String>,
        line3: Option<String>,
        city: String,
        postcode: String,
        country: String,
        shipping: bool,
    },
    PhoneOrFax {
        number: String,
    },
    EmailAddress {
        address: String,
    },
}

impl ChannelDetails {
    /// Stable label for diagnostics and error messages.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::PostalAddress { .. } => "postal_address",
            Self::PhoneOrFax { .. } => "phone_or_fax",
            Self::EmailAddress { .. } => "email_address",
        }
    }

    /// Whether these details are valid for the given channel kind.
    pub const fn is_compatible_with(&self, kind: ChannelType) -> bool {
        matches!(
            (kind, self),
            (ChannelType::PostalAddress, Self::PostalAddress { .. })
                | (ChannelType::PhoneNumber, Self::PhoneOrFax { .. })
                | (ChannelType::FaxNumber, Self::PhoneOrFax { .. })
                | (ChannelType::EmailAddress, Self::EmailAddress { .. })
        )
    }
}

/// Geographic coordinate attached to a channel by an (external) geocoder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// Validation errors for channel construction and persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelValidationError {
    /// Nil uuid can never identify a channel.
    NilUuid,
    /// A mandatory scalar field is empty or blank.
    EmptyField(&'static str),
    /// Stored kind does not agree with the details variant.
    DetailsMismatch {
        kind: ChannelType,
        details: &'static str,
    },
}

impl Display for ChannelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilUuid => write!(f, "channel uuid must not be nil"),
            Self::EmptyField(field) => write!(f, "channel field `{field}` must not be empty"),
            Self::DetailsMismatch { kind, details } => write!(
                f,
                "channel type `{}` does not match details `{details}`",
                kind.as_str()
            ),
        }
    }
}

impl Error for ChannelValidationError {}

/// Canonical record for one communication channel.
///
/// Constructed through the `new_*` factories (or `with_id` for import/test
/// paths); repositories re-run `validate()` before every write and after
/// every read so a kind/details mismatch can never round-trip silently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Stable global id.
    pub uuid: ChannelId,
    /// Serialized as `type` to match external schema naming.
    #[serde(rename = "type")]
    pub kind: ChannelType,
    /// Mandatory free-text classification, e.g. "Home", "Work".
    pub purpose: String,
    /// Optional annotation, editable after creation.
    pub description: Option<String>,
    /// Optional multi-line notes.
    pub notes: Option<String>,
    /// Optimistic-concurrency token; starts at 0, bumped on every update.
    pub version: i64,
    /// Kind-specific fields.
    pub details: ChannelDetails,
}

impl Channel {
    /// Creates an email-address channel with a generated id.
    pub fn new_email_address(
        address: impl Into<String>,
        purpose: impl Into<String>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            kind: ChannelType::EmailAddress,
            purpose: purpose.into(),
            description: None,
            notes: None,
            version: 0,
            details: ChannelDetails::EmailAddress {
                address: address.into(),
            },
        }
    }

    /// Creates a phone or fax channel with a generated id.
    ///
    /// # Errors
    /// Rejects kinds outside `PhoneNumber`/`FaxNumber`.
    pub fn new_phone_or_fax(
        kind: ChannelType,
        number: impl Into<String>,
        purpose: impl Into<String>,
    ) -> Result<Self, ChannelValidationError> {
        let details = ChannelDetails::PhoneOrFax {
            number: number.into(),
        };
        if !details.is_compatible_with(kind) {
            return Err(ChannelValidationError::DetailsMismatch {
                kind,
                details: details.label(),
            });
        }
        Ok(Self {
            uuid: Uuid::new_v4(),
            kind,
            purpose: purpose.into(),
            description: None,
            notes: None,
            version: 0,
            details,
        })
    }

    /// Creates a postal-address channel with a generated id.
    #[allow(clippy::too_many_arguments)]
    pub fn new_postal_address(
        line1: impl Into<String>,
        line2: Option<String>,
        line3: Option<String>,
        city: impl Into<String>,
        postcode: impl Into<String>,
        country: impl Into<String>,
        purpose: impl Into<String>,
        shipping: bool,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            kind: ChannelType::PostalAddress,
            purpose: purpose.into(),
            description: None,
            notes: None,
            version: 0,
            details: ChannelDetails::PostalAddress {
                line1: line1.into(),
                line2,
                line3,
                city: city.into(),
                postcode: postcode.into(),
                country: country.into(),
                shipping,
            },
        }
    }

    /// Rebinds a channel to a caller-provided stable id.
    ///
    /// Used by import and test paths where identity already exists.
    pub fn with_id(mut self, uuid: ChannelId) -> Result<Self, ChannelValidationError> {
        if uuid.is_nil() {
            return Err(ChannelValidationError::NilUuid);
        }
        self.uuid = uuid;
        Ok(self)
    }

    /// Derived display name: the email address, the phone digits, or the
    /// leading postal lines.
    pub fn name(&self) -> String {
        match &self.details {
            ChannelDetails::EmailAddress { address } => address.clone(),
            ChannelDetails::PhoneOrFax { number } => number.clone(),
            ChannelDetails::PostalAddress {
                line1,
                city,
                postcode,
                ..
            } => format!("{line1}, {city}, {postcode}"),
        }
    }

    /// Geographic location of this channel. No geocoding is performed, so
    /// this is always `None` unless a host supplies coordinates out of band.
    pub fn location(&self) -> Option<GeoLocation> {
        None
    }

    /// Structural validation, run before writes and after reads.
    pub fn validate(&self) -> Result<(), ChannelValidationError> {
        if self.uuid.is_nil() {
            return Err(ChannelValidationError::NilUuid);
        }
        if self.purpose.trim().is_empty() {
            return Err(ChannelValidationError::EmptyField("purpose"));
        }
        if !self.details.is_compatible_with(self.kind) {
            return Err(ChannelValidationError::DetailsMismatch {
                kind: self.kind,
                details: self.details.label(),
            });
        }
        match &self.details {
            ChannelDetails::EmailAddress { address } => {
                require_non_blank("email_address", address)?;
            }
            ChannelDetails::PhoneOrFax { number } => {
                require_non_blank("phone_number", number)?;
            }
            ChannelDetails::PostalAddress {
                line1,
                city,
                postcode,
                country,
                ..
            } => {
                require_non_blank("address_line1", line1)?;
                require_non_blank("city", city)?;
                require_non_blank("postcode", postcode)?;
                require_non_blank("country", country)?;
            }
        }
        Ok(())
    }
}

fn require_non_blank(field: &'static str, value: &str) -> Result<(), ChannelValidationError> {
    if value.trim().is_empty() {
        Err(ChannelValidationError::EmptyField(field))
    } else {
        Ok(())
    }
}

// Ordering is by (kind, uuid) only; equality stays structural. The narrower
// ordering key is what makes repository result sets deterministic.
impl PartialOrd for Channel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Channel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind
            .cmp(&other.kind)
            .then_with(|| self.uuid.cmp(&other.uuid))
    }
}

#[cfg(test)]
mod tests {
    use super::{Channel, ChannelDetails, ChannelType, ChannelValidationError};
    use uuid::Uuid;

    #[test]
    fn factories_set_expected_defaults() {
        let email = Channel::new_email_address("fred@gmail.com", "Home");
        assert!(!email.uuid.is_nil());
        assert_eq!(email.kind, ChannelType::EmailAddress);
        assert_eq!(email.purpose, "Home");
        assert_eq!(email.version, 0);
        assert_eq!(email.description, None);
        assert_eq!(email.notes, None);
        email.validate().expect("factory output should validate");
    }

    #[test]
    fn phone_or_fax_factory_rejects_other_kinds() {
        let err = Channel::new_phone_or_fax(ChannelType::EmailAddress, "0207 999 8888", "Work")
            .expect_err("email kind must be rejected");
        assert!(matches!(
            err,
            ChannelValidationError::DetailsMismatch {
                kind: ChannelType::EmailAddress,
                ..
            }
        ));

        Channel::new_phone_or_fax(ChannelType::FaxNumber, "0207 999 8888", "Work")
            .expect("fax kind is valid");
    }

    #[test]
    fn validate_rejects_mismatched_details() {
        let mut channel = Channel::new_email_address("fred@gmail.com", "Home");
        channel.kind = ChannelType::PhoneNumber;
        let err = channel.validate().expect_err("mismatch must fail");
        assert_eq!(
            err,
            ChannelValidationError::DetailsMismatch {
                kind: ChannelType::PhoneNumber,
                details: "email_address",
            }
        );
    }

    #[test]
    fn validate_rejects_blank_mandatory_fields() {
        let channel = Channel::new_email_address("   ", "Home");
        assert_eq!(
            channel.validate().unwrap_err(),
            ChannelValidationError::EmptyField("email_address")
        );

        let channel = Channel::new_email_address("fred@gmail.com", "  ");
        assert_eq!(
            channel.validate().unwrap_err(),
            ChannelValidationError::EmptyField("purpose")
        );
    }

    #[test]
    fn with_id_rejects_nil_uuid() {
        let err = Channel::new_email_address("fred@gmail.com", "Home")
            .with_id(Uuid::nil())
            .expect_err("nil uuid must be rejected");
        assert_eq!(err, ChannelValidationError::NilUuid);
    }

    #[test]
    fn ordering_is_by_kind_then_uuid() {
        let id_low = Uuid::parse_str("00000000-0000-4000-8000-000000000001").unwrap();
        let id_high = Uuid::parse_str("00000000-0000-4000-8000-000000000002").unwrap();

        let phone = Channel::new_phone_or_fax(ChannelType::PhoneNumber, "0207 1", "Work")
            .unwrap()
            .with_id(id_high)
            .unwrap();
        let email = Channel::new_email_address("a@b.com", "Home")
            .with_id(id_low)
            .unwrap();
        let postal = Channel::new_postal_address(
            "Flat 2a", None, None, "Liverpool", "L39 5AA", "UK", "Home", false,
        )
        .with_id(id_high)
        .unwrap();

        let mut channels = vec![email.clone(), phone.clone(), postal.clone()];
        channels.sort();
        assert_eq!(channels, vec![postal, phone, email]);
    }

    #[test]
    fn name_is_derived_from_details() {
        assert_eq!(
            Channel::new_email_address("fred@gmail.com", "Home").name(),
            "fred@gmail.com"
        );
        assert_eq!(
            Channel::new_phone_or_fax(ChannelType::PhoneNumber, "0207 999 8888", "Work")
                .unwrap()
                .name(),
            "0207 999 8888"
        );
        assert_eq!(
            Channel::new_postal_address(
                "Flat 2a",
                Some("45 Penny Lane".to_string()),
                None,
                "Liverpool",
                "L39 5AA",
                "UK",
                "Home",
                false,
            )
            .name(),
            "Flat 2a, Liverpool, L39 5AA"
        );
    }

    #[test]
    fn location_is_absent_without_geocoding() {
        let channel = Channel::new_email_address("fred@gmail.com", "Home");
        assert!(channel.location().is_none());
    }

    #[test]
    fn channel_type_string_ids_round_trip() {
        for kind in ChannelType::all() {
            assert_eq!(ChannelType::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ChannelType::parse("telegraph"), None);
    }
}
