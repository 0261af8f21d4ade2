//! Owner-link repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist and query the association records binding channels to
//!   polymorphic owners.
//!
//! # Invariants
//! - The association key is the full `(owner_kind, owner_id, channel_uuid)`
//!   triple; duplicates are rejected.
//! - Query results are returned in a deterministic order.

use crate::model::channel::{ChannelId, ChannelType};
use crate::model::owner::OwnerRef;
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[(
    "channel_owner_links",
    &["owner_kind", "owner_id", "channel_uuid"],
)];

/// Association record between one channel and one owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerLink {
    pub owner: OwnerRef,
    pub channel_id: ChannelId,
}

/// Repository interface for owner-link records.
pub trait OwnerLinkRepository {
    /// Creates one association record.
    ///
    /// A second link for the same `(owner, channel)` pair fails with
    /// `DuplicateLink`; linking a channel to a second, different owner is
    /// permitted.
    fn create_link(&self, owner: &OwnerRef, channel_id: ChannelId) -> RepoResult<()>;
    /// All links held by the owner, ordered by channel id.
    fn find_by_owner(&self, owner: &OwnerRef) -> RepoResult<Vec<OwnerLink>>;
    /// Links held by the owner whose channel has the given kind.
    fn find_by_owner_and_type(
        &self,
        owner: &OwnerRef,
        kind: ChannelType,
    ) -> RepoResult<Vec<OwnerLink>>;
    /// All links referencing the channel, ordered by owner.
    fn find_by_channel(&self, channel_id: ChannelId) -> RepoResult<Vec<OwnerLink>>;
}

/// SQLite-backed owner-link repository.
pub struct SqliteOwnerLinkRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOwnerLinkRepository<'conn> {
    /// Constructs a repository from a migrated, ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_SCHEMA)?;
        Ok(Self { conn })
    }
}

impl OwnerLinkRepository for SqliteOwnerLinkRepository<'_> {
    fn create_link(&self, owner: &OwnerRef, channel_id: ChannelId) -> RepoResult<()> {
        insert_link_row(self.conn, owner, channel_id)
    }

    fn find_by_owner(&self, owner: &OwnerRef) -> RepoResult<Vec<OwnerLink>> {
        let mut stmt = self.conn.prepare(
            "SELECT owner_kind, owner_id, channel_uuid
             FROM channel_owner_links
             WHERE owner_kind = ?1
               AND owner_id = ?2
             ORDER BY channel_uuid ASC;",
        )?;
        let mut rows = stmt.query(params![owner.kind, owner.id.to_string()])?;
        collect_links(&mut rows)
    }

    fn find_by_owner_and_type(
        &self,
        owner: &OwnerRef,
        kind: ChannelType,
    ) -> RepoResult<Vec<OwnerLink>> {
        let mut stmt = self.conn.prepare(
            "SELECT owner_kind, owner_id, channel_uuid
             FROM channel_owner_links
             INNER JOIN channels ON channels.uuid = channel_owner_links.channel_uuid
             WHERE owner_kind = ?1
               AND owner_id = ?2
               AND channels.type = ?3
             ORDER BY channel_uuid ASC;",
        )?;
        let mut rows = stmt.query(params![owner.kind, owner.id.to_string(), kind.as_str()])?;
        collect_links(&mut rows)
    }

    fn find_by_channel(&self, channel_id: ChannelId) -> RepoResult<Vec<OwnerLink>> {
        let mut stmt = self.conn.prepare(
            "SELECT owner_kind, owner_id, channel_uuid
             FROM channel_owner_links
             WHERE channel_uuid = ?1
             ORDER BY owner_kind ASC, owner_id ASC;",
        )?;
        let mut rows = stmt.query([channel_id.to_string()])?;
        collect_links(&mut rows)
    }
}

/// Inserts one link row. Shared with the transactional action path.
pub(crate) fn insert_link_row(
    conn: &Connection,
    owner: &OwnerRef,
    channel_id: ChannelId,
) -> RepoResult<()> {
    let result = conn.execute(
        "INSERT INTO channel_owner_links (owner_kind, owner_id, channel_uuid)
         VALUES (?1, ?2, ?3);",
        params![owner.kind, owner.id.to_string(), channel_id.to_string()],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            Err(RepoError::DuplicateLink {
                owner: owner.clone(),
                channel: channel_id,
            })
        }
        Err(err) => Err(err.into()),
    }
}

fn collect_links(rows: &mut rusqlite::Rows<'_>) -> RepoResult<Vec<OwnerLink>> {
    let mut links = Vec::new();
    while let Some(row) = rows.next()? {
        links.push(parse_link_row(row)?);
    }
    Ok(links)
}

fn parse_link_row(row: &Row<'_>) -> RepoResult<OwnerLink> {
    let kind: String = row.get("owner_kind")?;
    let owner_id_text: String = row.get("owner_id")?;
    let channel_text: String = row.get("channel_uuid")?;

    let owner_id = Uuid::parse_str(&owner_id_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{owner_id_text}` in channel_owner_links.owner_id"
        ))
    })?;
    let channel_id = Uuid::parse_str(&channel_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{channel_text}` in channel_owner_links.channel_uuid"
        ))
    })?;
    let owner = OwnerRef::new(kind, owner_id).map_err(|err| {
        RepoError::InvalidData(format!("invalid owner kind in channel_owner_links: {err}"))
    })?;

    Ok(OwnerLink { owner, channel_id })
}
