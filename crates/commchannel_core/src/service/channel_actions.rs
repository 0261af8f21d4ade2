//! Owner-contributed channel actions.
//!
//! # Responsibility
//! - Contribute add-email / add-phone-or-fax / add-postal-address behavior
//!   to any owner capability, with choice lists and defaults.
//! - Create the channel and its owner link atomically.
//!
//! # Invariants
//! - Parameter validation happens before any persistence; a failed action
//!   leaves no partial state behind.
//! - The phone-or-fax action only ever accepts `PhoneNumber` or `FaxNumber`.
//! - Each action returns the owner reference to enable call chaining.

use crate::config::ChannelConfig;
use crate::db::DbError;
use crate::model::channel::{Channel, ChannelType, ChannelValidationError};
use crate::model::owner::{CommunicationChannelOwner, OwnerKindRegistry, OwnerRef, OwnerRegistryError};
use crate::repo::channel_repo::{
    insert_channel_row, ChannelRepository, SqliteChannelRepository,
};
use crate::repo::owner_link_repo::insert_link_row;
use crate::repo::RepoError;
use crate::service::purpose_service::{PurposeService, SqlitePurposeService};
use log::{info, warn};
use regex::Regex;
use rusqlite::{Connection, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Valid kind choices for the phone-or-fax action, in choice order.
pub const PHONE_OR_FAX_CHOICES: [ChannelType; 2] =
    [ChannelType::PhoneNumber, ChannelType::FaxNumber];

/// Errors raised by the channel actions.
#[derive(Debug)]
pub enum ActionError {
    /// The requested kind is outside the action's valid subset.
    DisallowedChannelType(ChannelType),
    /// Email address does not match the configured pattern.
    InvalidEmailAddress(String),
    /// The configured email pattern itself does not compile.
    InvalidEmailPattern { pattern: String, reason: String },
    /// A mandatory parameter is empty or blank.
    EmptyField(&'static str),
    /// A parameter exceeds its configured maximum length.
    OverLength {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    /// Owner kind/identity could not be resolved.
    Owner(OwnerRegistryError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ActionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DisallowedChannelType(kind) => write!(
                f,
                "channel type `{}` is not valid for this action",
                kind.as_str()
            ),
            Self::InvalidEmailAddress(value) => {
                write!(f, "invalid email address: `{value}`")
            }
            Self::InvalidEmailPattern { pattern, reason } => {
                write!(f, "invalid email pattern `{pattern}`: {reason}")
            }
            Self::EmptyField(field) => write!(f, "parameter `{field}` must not be empty"),
            Self::OverLength { field, max, actual } => write!(
                f,
                "parameter `{field}` is too long: {actual} chars, maximum {max}"
            ),
            Self::Owner(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ActionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Owner(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<OwnerRegistryError> for ActionError {
    fn from(value: OwnerRegistryError) -> Self {
        Self::Owner(value)
    }
}

impl From<RepoError> for ActionError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ChannelValidationError> for ActionError {
    fn from(value: ChannelValidationError) -> Self {
        Self::Repo(RepoError::Validation(value))
    }
}

impl From<rusqlite::Error> for ActionError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::Db(DbError::Sqlite(value)))
    }
}

/// Channel actions contributed to owner capabilities.
///
/// Dependencies are passed explicitly: the storage connection, the owner-kind
/// registry used to resolve owners before persistence, and the validation
/// configuration.
pub struct ChannelActions<'conn, 'reg> {
    conn: &'conn mut Connection,
    registry: &'reg OwnerKindRegistry,
    config: ChannelConfig,
    email_re: Regex,
}

impl std::fmt::Debug for ChannelActions<'_, '_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelActions")
            .field("config", &self.config)
            .field("email_re", &self.email_re)
            .finish_non_exhaustive()
    }
}

impl<'conn, 'reg> ChannelActions<'conn, 'reg> {
    /// Builds the action service, compiling the configured email pattern.
    ///
    /// # Errors
    /// - `InvalidEmailPattern` when the configured pattern does not compile.
    /// - Repository readiness errors when the connection is not migrated.
    pub fn new(
        conn: &'conn mut Connection,
        registry: &'reg OwnerKindRegistry,
        config: ChannelConfig,
    ) -> Result<Self, ActionError> {
        let email_re = config
            .compile_email_regex()
            .map_err(|err| ActionError::InvalidEmailPattern {
                pattern: config.email_regex.clone(),
                reason: err.to_string(),
            })?;
        SqliteChannelRepository::try_new(conn)?;
        Ok(Self {
            conn,
            registry,
            config,
            email_re,
        })
    }

    /// Active validation configuration.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Adds an email-address channel to the owner.
    pub fn add_email_address(
        &mut self,
        owner: &dyn CommunicationChannelOwner,
        email: &str,
        purpose: &str,
        notes: Option<&str>,
    ) -> Result<OwnerRef, ActionError> {
        let result = self.create_email(owner, email, purpose, notes);
        finish("add_email_address", result)
    }

    /// Adds a phone or fax channel to the owner.
    ///
    /// `kind` must be one of [`PHONE_OR_FAX_CHOICES`]; anything else is
    /// rejected before any persistence occurs.
    pub fn add_phone_or_fax_number(
        &mut self,
        owner: &dyn CommunicationChannelOwner,
        kind: ChannelType,
        number: &str,
        purpose: &str,
        notes: Option<&str>,
    ) -> Result<OwnerRef, ActionError> {
        let result = self.create_phone_or_fax(owner, kind, number, purpose, notes);
        finish("add_phone_or_fax_number", result)
    }

    /// Adds a postal-address channel to the owner.
    #[allow(clippy::too_many_arguments)]
    pub fn add_postal_address(
        &mut self,
        owner: &dyn CommunicationChannelOwner,
        line1: &str,
        line2: Option<&str>,
        line3: Option<&str>,
        city: &str,
        postcode: &str,
        country: &str,
        purpose: &str,
        notes: Option<&str>,
        is_shipping: bool,
    ) -> Result<OwnerRef, ActionError> {
        let result = self.create_postal_address(
            owner, line1, line2, line3, city, postcode, country, purpose, notes, is_shipping,
        );
        finish("add_postal_address", result)
    }

    /// Kind choices presented by the phone-or-fax action.
    pub fn phone_or_fax_type_choices(&self) -> [ChannelType; 2] {
        PHONE_OR_FAX_CHOICES
    }

    /// Default kind for the phone-or-fax action: the first choice.
    pub fn default_phone_or_fax_type(&self) -> ChannelType {
        PHONE_OR_FAX_CHOICES[0]
    }

    /// Candidate purposes for the given kind and owner.
    pub fn purpose_choices(
        &self,
        kind: ChannelType,
        owner: &dyn CommunicationChannelOwner,
    ) -> Result<Vec<String>, ActionError> {
        let owner_ref = OwnerRef::of(owner)?;
        let purposes =
            SqlitePurposeService::new(&*self.conn).purposes_for(kind, &owner_ref)?;
        Ok(purposes)
    }

    /// Default purpose: the first candidate, or `None` when the owner has no
    /// purpose history for this kind.
    pub fn default_purpose(
        &self,
        kind: ChannelType,
        owner: &dyn CommunicationChannelOwner,
    ) -> Result<Option<String>, ActionError> {
        Ok(self.purpose_choices(kind, owner)?.into_iter().next())
    }

    /// The owner's communication channels, ordered by `(kind, uuid)`.
    pub fn channels(
        &self,
        owner: &dyn CommunicationChannelOwner,
    ) -> Result<Vec<Channel>, ActionError> {
        let owner_ref = OwnerRef::of(owner)?;
        let channels = SqliteChannelRepository::try_new(&*self.conn)?.find_by_owner(&owner_ref)?;
        Ok(channels)
    }

    /// The owner's channels of one kind, ordered by `(kind, uuid)`.
    pub fn channels_of_type(
        &self,
        owner: &dyn CommunicationChannelOwner,
        kind: ChannelType,
    ) -> Result<Vec<Channel>, ActionError> {
        let owner_ref = OwnerRef::of(owner)?;
        let channels = SqliteChannelRepository::try_new(&*self.conn)?
            .find_by_owner_and_type(&owner_ref, kind)?;
        Ok(channels)
    }

    fn create_email(
        &mut self,
        owner: &dyn CommunicationChannelOwner,
        email: &str,
        purpose: &str,
        notes: Option<&str>,
    ) -> Result<OwnerRef, ActionError> {
        require_non_blank("email_address", email)?;
        require_max_len("email_address", email, self.config.max_email_len)?;
        if !self.email_re.is_match(email) {
            return Err(ActionError::InvalidEmailAddress(email.to_string()));
        }
        self.require_purpose(purpose)?;
        let owner_ref = self.resolve_owner(owner)?;

        let mut channel = Channel::new_email_address(email, purpose);
        channel.notes = notes.map(str::to_string);
        self.persist(owner_ref, &channel)
    }

    fn create_phone_or_fax(
        &mut self,
        owner: &dyn CommunicationChannelOwner,
        kind: ChannelType,
        number: &str,
        purpose: &str,
        notes: Option<&str>,
    ) -> Result<OwnerRef, ActionError> {
        if !PHONE_OR_FAX_CHOICES.contains(&kind) {
            return Err(ActionError::DisallowedChannelType(kind));
        }
        require_non_blank("phone_number", number)?;
        require_max_len("phone_number", number, self.config.max_number_len)?;
        self.require_purpose(purpose)?;
        let owner_ref = self.resolve_owner(owner)?;

        let mut channel = Channel::new_phone_or_fax(kind, number, purpose)?;
        channel.notes = notes.map(str::to_string);
        self.persist(owner_ref, &channel)
    }

    #[allow(clippy::too_many_arguments)]
    fn create_postal_address(
        &mut self,
        owner: &dyn CommunicationChannelOwner,
        line1: &str,
        line2: Option<&str>,
        line3: Option<&str>,
        city: &str,
        postcode: &str,
        country: &str,
        purpose: &str,
        notes: Option<&str>,
        is_shipping: bool,
    ) -> Result<OwnerRef, ActionError> {
        let max = self.config.max_address_field_len;
        require_non_blank("address_line1", line1)?;
        require_max_len("address_line1", line1, max)?;
        if let Some(line2) = line2 {
            require_max_len("address_line2", line2, max)?;
        }
        if let Some(line3) = line3 {
            require_max_len("address_line3", line3, max)?;
        }
        require_non_blank("city", city)?;
        require_max_len("city", city, max)?;
        require_non_blank("postcode", postcode)?;
        require_max_len("postcode", postcode, max)?;
        require_non_blank("country", country)?;
        require_max_len("country", country, max)?;
        self.require_purpose(purpose)?;
        let owner_ref = self.resolve_owner(owner)?;

        let mut channel = Channel::new_postal_address(
            line1,
            line2.map(str::to_string),
            line3.map(str::to_string),
            city,
            postcode,
            country,
            purpose,
            is_shipping,
        );
        channel.notes = notes.map(str::to_string);
        self.persist(owner_ref, &channel)
    }

    fn require_purpose(&self, purpose: &str) -> Result<(), ActionError> {
        require_non_blank("purpose", purpose)?;
        require_max_len("purpose", purpose, self.config.max_purpose_len)
    }

    fn resolve_owner(
        &self,
        owner: &dyn CommunicationChannelOwner,
    ) -> Result<OwnerRef, ActionError> {
        let owner_ref = OwnerRef::of(owner)?;
        self.registry.require_owner(&owner_ref)?;
        Ok(owner_ref)
    }

    /// Writes the channel and its owner link in one immediate transaction.
    fn persist(
        &mut self,
        owner_ref: OwnerRef,
        channel: &Channel,
    ) -> Result<OwnerRef, ActionError> {
        channel.validate()?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        insert_channel_row(&tx, channel)?;
        insert_link_row(&tx, &owner_ref, channel.uuid)?;
        tx.commit()?;
        Ok(owner_ref)
    }
}

fn finish(
    action: &'static str,
    result: Result<OwnerRef, ActionError>,
) -> Result<OwnerRef, ActionError> {
    match &result {
        Ok(owner) => info!("event=channel_action module=service action={action} status=ok owner={owner}"),
        Err(err) => warn!(
            "event=channel_action module=service action={action} status=error error={err}"
        ),
    }
    result
}

fn require_non_blank(field: &'static str, value: &str) -> Result<(), ActionError> {
    if value.trim().is_empty() {
        Err(ActionError::EmptyField(field))
    } else {
        Ok(())
    }
}

fn require_max_len(field: &'static str, value: &str, max: usize) -> Result<(), ActionError> {
    let actual = value.chars().count();
    if actual > max {
        Err(ActionError::OverLength { field, max, actual })
    } else {
        Ok(())
    }
}
