use commchannel_core::db::migrations::latest_version;
use commchannel_core::db::open_db_in_memory;
use commchannel_core::{
    Channel, ChannelRepository, ChannelType, OwnerLinkRepository, OwnerRef, RepoError,
    SqliteChannelRepository, SqliteOwnerLinkRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn owner(kind: &str) -> OwnerRef {
    OwnerRef::new(kind, Uuid::new_v4()).unwrap()
}

fn fixed_id(suffix: u32) -> Uuid {
    Uuid::parse_str(&format!("00000000-0000-4000-8000-{suffix:012}")).unwrap()
}

/// Creates a channel with a fixed id and links it to the owner.
fn create_linked(
    conn: &Connection,
    owner: &OwnerRef,
    channel: Channel,
    suffix: u32,
) -> Uuid {
    let channel = channel.with_id(fixed_id(suffix)).unwrap();
    let repo = SqliteChannelRepository::try_new(conn).unwrap();
    let links = SqliteOwnerLinkRepository::try_new(conn).unwrap();
    let id = repo.create_channel(&channel).unwrap();
    links.create_link(owner, id).unwrap();
    id
}

#[test]
fn create_and_get_round_trips_each_subtype() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteChannelRepository::try_new(&conn).unwrap();

    let mut email = Channel::new_email_address("fred@gmail.com", "Home");
    email.notes = Some("home email".to_string());
    let phone =
        Channel::new_phone_or_fax(ChannelType::FaxNumber, "0207 222 3333", "Work").unwrap();
    let postal = Channel::new_postal_address(
        "Flat 2a",
        Some("45 Penny Lane".to_string()),
        None,
        "Liverpool",
        "L39 5AA",
        "UK",
        "Shipping Address",
        true,
    );

    for channel in [&email, &phone, &postal] {
        let id = repo.create_channel(channel).unwrap();
        let loaded = repo.get_channel(id).unwrap().expect("channel should exist");
        assert_eq!(&loaded, channel);
    }

    assert_eq!(repo.get_channel(Uuid::new_v4()).unwrap(), None);
}

#[test]
fn create_channel_validates_before_sql() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteChannelRepository::try_new(&conn).unwrap();

    let mut invalid = Channel::new_email_address("fred@gmail.com", "Home");
    invalid.kind = ChannelType::PhoneNumber;

    let err = repo.create_channel(&invalid).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(repo.get_channel(invalid.uuid).unwrap(), None);
}

#[test]
fn find_by_owner_returns_sorted_deduplicated_set() {
    let conn = open_db_in_memory().unwrap();
    let fred = owner("customer");

    // Created out of order on purpose; ids chosen so (kind, uuid) order is
    // observable.
    create_linked(
        &conn,
        &fred,
        Channel::new_email_address("fred@gmail.com", "Home"),
        2,
    );
    create_linked(
        &conn,
        &fred,
        Channel::new_phone_or_fax(ChannelType::PhoneNumber, "0207 999 8888", "Work").unwrap(),
        9,
    );
    create_linked(
        &conn,
        &fred,
        Channel::new_phone_or_fax(ChannelType::PhoneNumber, "0208 111 1111", "Home").unwrap(),
        3,
    );
    create_linked(
        &conn,
        &fred,
        Channel::new_postal_address(
            "Flat 2a", None, None, "Liverpool", "L39 5AA", "UK", "Home", false,
        ),
        7,
    );

    let repo = SqliteChannelRepository::try_new(&conn).unwrap();
    let channels = repo.find_by_owner(&fred).unwrap();
    let keys: Vec<_> = channels.iter().map(|c| (c.kind, c.uuid)).collect();
    assert_eq!(
        keys,
        vec![
            (ChannelType::PostalAddress, fixed_id(7)),
            (ChannelType::PhoneNumber, fixed_id(3)),
            (ChannelType::PhoneNumber, fixed_id(9)),
            (ChannelType::EmailAddress, fixed_id(2)),
        ]
    );
}

#[test]
fn find_by_owner_for_unknown_owner_is_empty() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteChannelRepository::try_new(&conn).unwrap();

    let channels = repo.find_by_owner(&owner("customer")).unwrap();
    assert!(channels.is_empty());
}

#[test]
fn find_other_excludes_one_channel() {
    let conn = open_db_in_memory().unwrap();
    let fred = owner("customer");

    let first = create_linked(
        &conn,
        &fred,
        Channel::new_phone_or_fax(ChannelType::PhoneNumber, "0208 111 1111", "Home").unwrap(),
        1,
    );
    let second = create_linked(
        &conn,
        &fred,
        Channel::new_phone_or_fax(ChannelType::PhoneNumber, "0207 999 8888", "Work").unwrap(),
        2,
    );

    let repo = SqliteChannelRepository::try_new(&conn).unwrap();
    let others = repo
        .find_other_by_owner_and_type(&fred, ChannelType::PhoneNumber, first)
        .unwrap();
    assert_eq!(others.len(), 1);
    assert_eq!(others[0].uuid, second);
}

#[test]
fn excluding_an_absent_channel_is_a_no_op() {
    let conn = open_db_in_memory().unwrap();
    let fred = owner("customer");

    create_linked(
        &conn,
        &fred,
        Channel::new_phone_or_fax(ChannelType::PhoneNumber, "0208 111 1111", "Home").unwrap(),
        1,
    );
    create_linked(
        &conn,
        &fred,
        Channel::new_phone_or_fax(ChannelType::PhoneNumber, "0207 999 8888", "Work").unwrap(),
        2,
    );

    let repo = SqliteChannelRepository::try_new(&conn).unwrap();
    let all = repo
        .find_by_owner_and_type(&fred, ChannelType::PhoneNumber)
        .unwrap();
    let others = repo
        .find_other_by_owner_and_type(&fred, ChannelType::PhoneNumber, Uuid::new_v4())
        .unwrap();
    assert_eq!(others, all);
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let result = SqliteChannelRepository::try_new(&conn);
    match result {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_required_tables() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteChannelRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("channels"))
    ));
}

#[test]
fn repository_rejects_connection_missing_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE channels (
            uuid TEXT PRIMARY KEY NOT NULL,
            type TEXT NOT NULL,
            purpose TEXT NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteChannelRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "channels",
            column: "description"
        })
    ));
}

#[test]
fn read_path_surfaces_corrupted_rows_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let fred = owner("customer");
    let id = create_linked(
        &conn,
        &fred,
        Channel::new_email_address("fred@gmail.com", "Home"),
        1,
    );

    // Flip the stored discriminator behind the repository's back.
    conn.execute(
        "UPDATE channels SET type = 'phone_number' WHERE uuid = ?1;",
        [id.to_string()],
    )
    .unwrap();

    let repo = SqliteChannelRepository::try_new(&conn).unwrap();
    let err = repo.get_channel(id).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}
