//! Purpose choice-list service.
//!
//! # Responsibility
//! - Supply candidate purpose strings per channel type and owner.
//!
//! # Invariants
//! - The list is non-authoritative; an empty result is valid and callers
//!   fall back to free text with no default.

use crate::model::channel::ChannelType;
use crate::model::owner::OwnerRef;
use crate::repo::RepoResult;
use rusqlite::{params, Connection};

/// Source of candidate purpose strings for choice lists.
pub trait PurposeService {
    /// Candidate purposes for one channel type and owner.
    fn purposes_for(&self, kind: ChannelType, owner: &OwnerRef) -> RepoResult<Vec<String>>;
}

/// Purpose service backed by the owner's channel history.
///
/// Returns the distinct purposes the owner has already used for the given
/// channel type, most recently created first.
pub struct SqlitePurposeService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePurposeService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PurposeService for SqlitePurposeService<'_> {
    fn purposes_for(&self, kind: ChannelType, owner: &OwnerRef) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT channels.purpose
             FROM channels
             INNER JOIN channel_owner_links
                ON channel_owner_links.channel_uuid = channels.uuid
             WHERE channel_owner_links.owner_kind = ?1
               AND channel_owner_links.owner_id = ?2
               AND channels.type = ?3
             GROUP BY channels.purpose
             ORDER BY MAX(channels.created_at) DESC, MAX(channels.rowid) DESC;",
        )?;

        let mut rows = stmt.query(params![owner.kind, owner.id.to_string(), kind.as_str()])?;
        let mut purposes = Vec::new();
        while let Some(row) = rows.next()? {
            purposes.push(row.get("purpose")?);
        }
        Ok(purposes)
    }
}
