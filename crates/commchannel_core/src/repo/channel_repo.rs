//! Channel repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide channel persistence and the by-owner query facade.
//! - Keep subtype column mapping inside the persistence boundary.
//!
//! # Invariants
//! - `create_channel` validates before SQL; reads re-validate after mapping.
//! - Result sets are de-duplicated and ordered by `(kind, uuid)`.
//! - `update_annotations` only succeeds when the caller's version token
//!   matches the stored one.

use crate::model::channel::{Channel, ChannelDetails, ChannelId, ChannelType};
use crate::model::owner::OwnerRef;
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const CHANNEL_SELECT_COLUMNS: &str = "
    uuid,
    type,
    purpose,
    description,
    notes,
    email_address,
    phone_number,
    address_line1,
    address_line2,
    address_line3,
    city,
    postcode,
    country,
    is_shipping,
    version";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "channels",
        &[
            "uuid",
            "type",
            "purpose",
            "description",
            "notes",
            "email_address",
            "phone_number",
            "address_line1",
            "address_line2",
            "address_line3",
            "city",
            "postcode",
            "country",
            "is_shipping",
            "version",
        ],
    ),
    (
        "channel_owner_links",
        &["owner_kind", "owner_id", "channel_uuid"],
    ),
];

/// Repository interface for channel persistence and owner-scoped queries.
pub trait ChannelRepository {
    /// Persists one validated channel and returns its stable id.
    fn create_channel(&self, channel: &Channel) -> RepoResult<ChannelId>;
    /// Gets one channel by id.
    fn get_channel(&self, id: ChannelId) -> RepoResult<Option<Channel>>;
    /// Replaces the editable annotations (description, notes).
    ///
    /// `expected_version` is the optimistic-concurrency token the caller last
    /// read; a stale token fails with `ConcurrencyConflict` and the caller
    /// may retry at will.
    fn update_annotations(
        &self,
        id: ChannelId,
        expected_version: i64,
        description: Option<&str>,
        notes: Option<&str>,
    ) -> RepoResult<()>;
    /// All channels linked to the owner, de-duplicated, ordered by
    /// `(kind, uuid)`.
    fn find_by_owner(&self, owner: &OwnerRef) -> RepoResult<Vec<Channel>>;
    /// Channels of one kind linked to the owner.
    fn find_by_owner_and_type(
        &self,
        owner: &OwnerRef,
        kind: ChannelType,
    ) -> RepoResult<Vec<Channel>>;
    /// Channels of one kind linked to the owner, minus one excluded channel.
    ///
    /// Excluding an id that is not in the result set is a no-op.
    fn find_other_by_owner_and_type(
        &self,
        owner: &OwnerRef,
        kind: ChannelType,
        exclude: ChannelId,
    ) -> RepoResult<Vec<Channel>>;
}

/// SQLite-backed channel repository.
pub struct SqliteChannelRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteChannelRepository<'conn> {
    /// Constructs a repository from a migrated, ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_SCHEMA)?;
        Ok(Self { conn })
    }
}

impl ChannelRepository for SqliteChannelRepository<'_> {
    fn create_channel(&self, channel: &Channel) -> RepoResult<ChannelId> {
        channel.validate()?;
        insert_channel_row(self.conn, channel)?;
        Ok(channel.uuid)
    }

    fn get_channel(&self, id: ChannelId) -> RepoResult<Option<Channel>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CHANNEL_SELECT_COLUMNS} FROM channels WHERE uuid = ?1;"
        ))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_channel_row(row)?));
        }
        Ok(None)
    }

    fn update_annotations(
        &self,
        id: ChannelId,
        expected_version: i64,
        description: Option<&str>,
        notes: Option<&str>,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE channels
             SET
                description = ?1,
                notes = ?2,
                version = version + 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?3
               AND version = ?4;",
            params![description, notes, id.to_string(), expected_version],
        )?;

        if changed == 0 {
            let actual: Option<i64> = self
                .conn
                .query_row(
                    "SELECT version FROM channels WHERE uuid = ?1;",
                    [id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            return Err(match actual {
                Some(actual) => RepoError::ConcurrencyConflict {
                    channel: id,
                    expected: expected_version,
                    actual,
                },
                None => RepoError::NotFound(id),
            });
        }

        Ok(())
    }

    fn find_by_owner(&self, owner: &OwnerRef) -> RepoResult<Vec<Channel>> {
        self.query_linked_channels(owner, None)
    }

    fn find_by_owner_and_type(
        &self,
        owner: &OwnerRef,
        kind: ChannelType,
    ) -> RepoResult<Vec<Channel>> {
        self.query_linked_channels(owner, Some(kind))
    }

    fn find_other_by_owner_and_type(
        &self,
        owner: &OwnerRef,
        kind: ChannelType,
        exclude: ChannelId,
    ) -> RepoResult<Vec<Channel>> {
        let mut channels = self.find_by_owner_and_type(owner, kind)?;
        channels.retain(|channel| channel.uuid != exclude);
        Ok(channels)
    }
}

impl SqliteChannelRepository<'_> {
    fn query_linked_channels(
        &self,
        owner: &OwnerRef,
        kind: Option<ChannelType>,
    ) -> RepoResult<Vec<Channel>> {
        let mut sql = format!(
            "SELECT DISTINCT {CHANNEL_SELECT_COLUMNS}
             FROM channels
             INNER JOIN channel_owner_links
                ON channel_owner_links.channel_uuid = channels.uuid
             WHERE channel_owner_links.owner_kind = ?1
               AND channel_owner_links.owner_id = ?2"
        );
        if kind.is_some() {
            sql.push_str(" AND channels.type = ?3");
        }
        sql.push(';');

        let mut stmt = self.conn.prepare(&sql)?;
        let owner_id = owner.id.to_string();
        let mut channels = Vec::new();
        let mut rows = match kind {
            Some(kind) => stmt.query(params![owner.kind, owner_id, kind.as_str()])?,
            None => stmt.query(params![owner.kind, owner_id])?,
        };
        while let Some(row) = rows.next()? {
            channels.push(parse_channel_row(row)?);
        }

        // Canonical (kind, uuid) order; the enum order differs from the
        // lexical order of the stored type strings.
        channels.sort();
        Ok(channels)
    }
}

/// Inserts one channel row. Shared with the transactional action path, which
/// must write the channel and its owner link atomically.
pub(crate) fn insert_channel_row(conn: &Connection, channel: &Channel) -> RepoResult<()> {
    let mut email_address = None;
    let mut phone_number = None;
    let mut address = (None, None, None, None, None, None, None::<i64>);
    match &channel.details {
        ChannelDetails::EmailAddress { address } => email_address = Some(address.as_str()),
        ChannelDetails::PhoneOrFax { number } => phone_number = Some(number.as_str()),
        ChannelDetails::PostalAddress {
            line1,
            line2,
            line3,
            city,
            postcode,
            country,
            shipping,
        } => {
            address = (
                Some(line1.as_str()),
                line2.as_deref(),
                line3.as_deref(),
                Some(city.as_str()),
                Some(postcode.as_str()),
                Some(country.as_str()),
                Some(i64::from(*shipping)),
            );
        }
    }
    let (line1, line2, line3, city, postcode, country, is_shipping) = address;

    conn.execute(
        "INSERT INTO channels (
            uuid,
            type,
            purpose,
            description,
            notes,
            email_address,
            phone_number,
            address_line1,
            address_line2,
            address_line3,
            city,
            postcode,
            country,
            is_shipping,
            version
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15);",
        params![
            channel.uuid.to_string(),
            channel.kind.as_str(),
            channel.purpose.as_str(),
            channel.description.as_deref(),
            channel.notes.as_deref(),
            email_address,
            phone_number,
            line1,
            line2,
            line3,
            city,
            postcode,
            country,
            is_shipping,
            channel.version,
        ],
    )?;

    Ok(())
}

pub(crate) fn parse_channel_row(row: &Row<'_>) -> RepoResult<Channel> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in channels.uuid"))
    })?;

    let type_text: String = row.get("type")?;
    let kind = ChannelType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid channel type `{type_text}` in channels.type"))
    })?;

    let details = match kind {
        ChannelType::EmailAddress => ChannelDetails::EmailAddress {
            address: require_column(row, "email_address", &uuid_text)?,
        },
        ChannelType::PhoneNumber | ChannelType::FaxNumber => ChannelDetails::PhoneOrFax {
            number: require_column(row, "phone_number", &uuid_text)?,
        },
        ChannelType::PostalAddress => {
            let shipping = match row.get::<_, Option<i64>>("is_shipping")? {
                Some(0) => false,
                Some(1) => true,
                other => {
                    return Err(RepoError::InvalidData(format!(
                        "invalid is_shipping value `{other:?}` for channel `{uuid_text}`"
                    )));
                }
            };
            ChannelDetails::PostalAddress {
                line1: require_column(row, "address_line1", &uuid_text)?,
                line2: row.get("address_line2")?,
                line3: row.get("address_line3")?,
                city: require_column(row, "city", &uuid_text)?,
                postcode: require_column(row, "postcode", &uuid_text)?,
                country: require_column(row, "country", &uuid_text)?,
                shipping,
            }
        }
    };

    let channel = Channel {
        uuid,
        kind,
        purpose: row.get("purpose")?,
        description: row.get("description")?,
        notes: row.get("notes")?,
        version: row.get("version")?,
        details,
    };
    channel.validate()?;
    Ok(channel)
}

fn require_column(row: &Row<'_>, column: &'static str, uuid_text: &str) -> RepoResult<String> {
    row.get::<_, Option<String>>(column)?.ok_or_else(|| {
        RepoError::InvalidData(format!(
            "missing `{column}` for channel `{uuid_text}`"
        ))
    })
}
