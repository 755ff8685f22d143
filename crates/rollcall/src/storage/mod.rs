//! Storage layer for rollcall.
//!
//! This module provides `SQLite`-based persistent storage for member records.
//! Photo and signature images are kept inline as `data:` URIs so a record is
//! always self-contained.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::media::EncodedImage;
use crate::member::{Group, MaritalStatus, Member, MemberFilter};

/// Columns selected for every member query, in `row_to_member` order.
const MEMBER_COLUMNS: &str = "id, serial_number, photo, name, address, neighborhood, city, \
     department, cellphone, email, birth_date, marital_status, baptism_date, church, \
     time_in_church, member_group, signature, update_date, created_at";

/// Date format for `update_date`, `birth_date` and `baptism_date`.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// The member record store.
///
/// Identifiers are assigned by `SQLite` and never reused.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create the member database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Member database ready at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let path = PathBuf::from(":memory:");
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;
        migrations::initialize_schema(&conn)?;
        Ok(Self { path, conn })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store a new member and return its assigned ID.
    ///
    /// Any `id` already on the record is ignored. `created_at` is stamped
    /// with the current time when the record does not carry one.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn create(&self, member: &Member) -> Result<i64> {
        let created_at = member.created_at.unwrap_or_else(Utc::now);
        self.conn.execute(
            r"
            INSERT INTO members (
                serial_number, photo, name, address, neighborhood, city, department,
                cellphone, email, birth_date, marital_status, baptism_date, church,
                time_in_church, member_group, signature, update_date, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            ",
            params![
                member.serial_number,
                member.photo.as_ref().map(EncodedImage::to_data_uri),
                member.name,
                member.address,
                member.neighborhood,
                member.city,
                member.department,
                member.cellphone,
                member.email,
                member.birth_date.map(format_date),
                member.marital_status.map(MaritalStatus::as_str),
                member.baptism_date.map(format_date),
                member.church,
                member.time_in_church,
                member.group.map(Group::as_str),
                member.signature.as_ref().map(EncodedImage::to_data_uri),
                format_date(member.update_date),
                created_at.to_rfc3339(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        info!("Registered member {} ({})", id, member.name);
        Ok(id)
    }

    /// Overwrite an existing member in place.
    ///
    /// Returns `false` if no member has the record's ID. The original
    /// `created_at` is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the record has no ID, or an error if
    /// the database operation fails.
    pub fn update(&self, member: &Member) -> Result<bool> {
        let id = member
            .id
            .ok_or_else(|| Error::validation("id", "an update needs a stored member"))?;
        let affected = self.conn.execute(
            r"
            UPDATE members SET
                serial_number = ?2, photo = ?3, name = ?4, address = ?5, neighborhood = ?6,
                city = ?7, department = ?8, cellphone = ?9, email = ?10, birth_date = ?11,
                marital_status = ?12, baptism_date = ?13, church = ?14, time_in_church = ?15,
                member_group = ?16, signature = ?17, update_date = ?18
            WHERE id = ?1
            ",
            params![
                id,
                member.serial_number,
                member.photo.as_ref().map(EncodedImage::to_data_uri),
                member.name,
                member.address,
                member.neighborhood,
                member.city,
                member.department,
                member.cellphone,
                member.email,
                member.birth_date.map(format_date),
                member.marital_status.map(MaritalStatus::as_str),
                member.baptism_date.map(format_date),
                member.church,
                member.time_in_church,
                member.group.map(Group::as_str),
                member.signature.as_ref().map(EncodedImage::to_data_uri),
                format_date(member.update_date),
            ],
        )?;
        if affected > 0 {
            info!("Updated member {}", id);
        }
        Ok(affected > 0)
    }

    /// Get a member by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, id: i64) -> Result<Option<Member>> {
        let member = self
            .conn
            .query_row(
                &format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = ?1"),
                [id],
                Self::row_to_member,
            )
            .optional()?;
        Ok(member)
    }

    /// All members in ascending ID order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list(&self) -> Result<Vec<Member>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {MEMBER_COLUMNS} FROM members ORDER BY id ASC"))?;
        let members = stmt
            .query_map([], Self::row_to_member)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(members)
    }

    /// Members matching `filter`, in ascending ID order.
    ///
    /// The group is matched in SQL; the name search runs on decoded rows so
    /// that case folding covers non-ASCII names.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_filtered(&self, filter: &MemberFilter) -> Result<Vec<Member>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members \
             WHERE (?1 IS NULL OR member_group = ?1) ORDER BY id ASC"
        ))?;
        let members = stmt
            .query_map([filter.group.map(Group::as_str)], Self::row_to_member)?
            .filter(|row| row.as_ref().map_or(true, |member| filter.matches(member)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(members)
    }

    /// Count total members.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM members", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete a member by ID.
    ///
    /// Returns `true` if a member was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let affected = self.conn.execute("DELETE FROM members WHERE id = ?1", [id])?;
        if affected > 0 {
            info!("Deleted member {}", id);
        }
        Ok(affected > 0)
    }

    /// Members per group, over every group in declaration order.
    ///
    /// Groups without members count zero; members without a group are not
    /// counted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn group_counts(&self) -> Result<Vec<(Group, i64)>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT member_group, COUNT(*) FROM members
            WHERE member_group IS NOT NULL
            GROUP BY member_group
            ",
        )?;
        let stored = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let counts = Group::ALL
            .into_iter()
            .map(|group| {
                let count = stored
                    .iter()
                    .filter(|(label, _)| label == group.as_str())
                    .map(|(_, count)| count)
                    .sum();
                (group, count)
            })
            .collect();
        Ok(counts)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let (total_members, with_photo, with_signature): (i64, i64, i64) = self.conn.query_row(
            r"
            SELECT COUNT(*),
                   COUNT(photo),
                   COUNT(signature)
            FROM members
            ",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let (oldest, newest): (Option<String>, Option<String>) = self.conn.query_row(
            "SELECT MIN(created_at), MAX(created_at) FROM members",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let db_size_bytes = if self.path == Path::new(":memory:") {
            0
        } else {
            std::fs::metadata(&self.path).map_or(0, |m| m.len())
        };

        Ok(StorageStats {
            total_members,
            with_photo,
            with_signature,
            first_registration: oldest.as_deref().and_then(parse_timestamp),
            last_registration: newest.as_deref().and_then(parse_timestamp),
            db_size_bytes,
        })
    }

    /// Convert a database row to a Member.
    ///
    /// Unreadable optional values are logged and dropped rather than failing
    /// the whole listing.
    fn row_to_member(row: &rusqlite::Row) -> rusqlite::Result<Member> {
        let id: i64 = row.get(0)?;
        let update_date: String = row.get(17)?;
        let created_at: String = row.get(18)?;

        let update_date = NaiveDate::parse_from_str(&update_date, DATE_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(17, Type::Text, Box::new(e)))?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(18, Type::Text, Box::new(e)))?
            .with_timezone(&Utc);

        Ok(Member {
            id: Some(id),
            serial_number: row.get(1)?,
            photo: decode_image(id, "photo", row.get(2)?),
            name: row.get(3)?,
            address: row.get(4)?,
            neighborhood: row.get(5)?,
            city: row.get(6)?,
            department: row.get(7)?,
            cellphone: row.get(8)?,
            email: row.get(9)?,
            birth_date: decode_date(id, "birth_date", row.get(10)?),
            marital_status: decode_label(id, "marital_status", row.get(11)?),
            baptism_date: decode_date(id, "baptism_date", row.get(12)?),
            church: row.get(13)?,
            time_in_church: row.get(14)?,
            group: decode_label(id, "group", row.get(15)?),
            signature: decode_image(id, "signature", row.get(16)?),
            update_date,
            created_at: Some(created_at),
        })
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn decode_image(id: i64, column: &str, value: Option<String>) -> Option<EncodedImage> {
    let uri = value?;
    match EncodedImage::from_data_uri(&uri) {
        Ok(image) => Some(image),
        Err(e) => {
            warn!("Member {} has an unreadable {}: {}", id, column, e);
            None
        }
    }
}

fn decode_date(id: i64, column: &str, value: Option<String>) -> Option<NaiveDate> {
    let text = value?;
    match NaiveDate::parse_from_str(&text, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            warn!("Member {} has an invalid {}: {}", id, column, text);
            None
        }
    }
}

fn decode_label<T: std::str::FromStr>(id: i64, column: &str, value: Option<String>) -> Option<T> {
    let label = value?;
    if let Ok(parsed) = label.parse() {
        Some(parsed)
    } else {
        warn!("Member {} has an unknown {}: {}", id, column, label);
        None
    }
}

/// Statistics about the member store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Total number of members stored.
    pub total_members: i64,
    /// Members with a photo.
    pub with_photo: i64,
    /// Members with a signature.
    pub with_signature: i64,
    /// Creation time of the oldest record.
    pub first_registration: Option<DateTime<Utc>>,
    /// Creation time of the newest record.
    pub last_registration: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn member(name: &str, group: Option<Group>) -> Member {
        Member {
            name: name.to_string(),
            group,
            ..Member::draft(date(2024, 3, 15), "Universal")
        }
    }

    fn full_member() -> Member {
        Member {
            serial_number: "A-017".to_string(),
            photo: Some(EncodedImage::new("image/jpeg", vec![0xff, 0xd8, 0xff, 0xe0])),
            address: "Calle 10 # 4-21".to_string(),
            neighborhood: "Centro".to_string(),
            city: "Cali".to_string(),
            department: "Valle".to_string(),
            cellphone: "3001234567".to_string(),
            email: "ana@example.com".to_string(),
            birth_date: Some(date(1990, 6, 1)),
            marital_status: Some(MaritalStatus::CommonLaw),
            baptism_date: Some(date(2010, 12, 24)),
            time_in_church: "5 años".to_string(),
            signature: Some(EncodedImage::new("image/png", vec![0x89, b'P', b'N', b'G'])),
            created_at: Some(Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap()),
            ..member("Ana María Ruiz", Some(Group::Fju))
        }
    }

    #[test]
    fn test_open_in_memory() {
        let storage = create_test_storage();
        assert_eq!(storage.count().unwrap(), 0);
        assert_eq!(storage.path(), Path::new(":memory:"));
    }

    #[test]
    fn test_create_and_get_every_field() {
        let storage = create_test_storage();
        let original = full_member();

        let id = storage.create(&original).unwrap();
        let stored = storage.get(id).unwrap().unwrap();

        assert_eq!(stored.id, Some(id));
        assert_eq!(Member { id: None, ..stored }, original);
    }

    #[test]
    fn test_create_stamps_created_at() {
        let storage = create_test_storage();
        let before = Utc::now();
        let id = storage.create(&member("Luis", None)).unwrap();

        let created = storage.get(id).unwrap().unwrap().created_at.unwrap();
        assert!(created >= before - chrono::Duration::seconds(1));
    }

    #[test]
    fn test_ids_auto_increment() {
        let storage = create_test_storage();
        let first = storage.create(&member("A", None)).unwrap();
        let second = storage.create(&member("B", None)).unwrap();
        assert!(second > first);

        storage.delete(second).unwrap();
        let third = storage.create(&member("C", None)).unwrap();
        assert!(third > second);
    }

    #[test]
    fn test_get_nonexistent() {
        let storage = create_test_storage();
        assert!(storage.get(999).unwrap().is_none());
    }

    #[test]
    fn test_list_ascending() {
        let storage = create_test_storage();
        for name in ["Carla", "Andrés", "Beto"] {
            storage.create(&member(name, None)).unwrap();
        }

        let names: Vec<String> = storage.list().unwrap().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["Carla", "Andrés", "Beto"]);
    }

    #[test]
    fn test_list_filtered() {
        let storage = create_test_storage();
        storage.create(&member("Ana López", Some(Group::Ebi))).unwrap();
        storage.create(&member("ÁNGEL LÓPEZ", Some(Group::Fju))).unwrap();
        storage.create(&member("Pedro", Some(Group::Ebi))).unwrap();

        let by_name = storage
            .list_filtered(&MemberFilter::all().with_search("lópez"))
            .unwrap();
        assert_eq!(by_name.len(), 2);

        let by_group = storage
            .list_filtered(&MemberFilter::all().with_group(Group::Ebi))
            .unwrap();
        assert_eq!(by_group.len(), 2);

        let both = storage
            .list_filtered(&MemberFilter::all().with_search("ana").with_group(Group::Ebi))
            .unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].name, "Ana López");

        assert_eq!(storage.list_filtered(&MemberFilter::all()).unwrap().len(), 3);
    }

    #[test]
    fn test_delete() {
        let storage = create_test_storage();
        let id = storage.create(&member("Ana", None)).unwrap();

        assert!(storage.delete(id).unwrap());
        assert!(storage.get(id).unwrap().is_none());
        assert!(!storage.delete(id).unwrap());
    }

    #[test]
    fn test_update() {
        let storage = create_test_storage();
        let id = storage.create(&full_member()).unwrap();

        let mut edited = storage.get(id).unwrap().unwrap();
        edited.city = "Bogotá".to_string();
        edited.photo = None;
        assert!(storage.update(&edited).unwrap());

        let stored = storage.get(id).unwrap().unwrap();
        assert_eq!(stored.city, "Bogotá");
        assert!(stored.photo.is_none());
        assert_eq!(stored.created_at, full_member().created_at);
        assert_eq!(storage.count().unwrap(), 1);
    }

    #[test]
    fn test_update_requires_id() {
        let storage = create_test_storage();
        let err = storage.update(&member("Ana", None)).unwrap_err();
        assert!(matches!(err, Error::Validation { field: "id", .. }));

        let ghost = Member {
            id: Some(42),
            ..member("Ghost", None)
        };
        assert!(!storage.update(&ghost).unwrap());
    }

    #[test]
    fn test_group_counts_cover_every_group() {
        let storage = create_test_storage();
        storage.create(&member("A", Some(Group::Evg))).unwrap();
        storage.create(&member("B", Some(Group::Evg))).unwrap();
        storage.create(&member("C", Some(Group::Caleb))).unwrap();
        storage.create(&member("D", None)).unwrap();

        let counts = storage.group_counts().unwrap();
        assert_eq!(counts.len(), Group::ALL.len());
        assert_eq!(counts[0], (Group::Evg, 2));
        assert_eq!(counts[1], (Group::Ftu, 0));
        assert_eq!(counts[4], (Group::Caleb, 1));
        assert_eq!(counts[5], (Group::Ninguno, 0));
    }

    #[test]
    fn test_unknown_group_reads_as_none() {
        let storage = create_test_storage();
        let id = storage.create(&member("Ana", Some(Group::Evg))).unwrap();
        storage
            .conn
            .execute("UPDATE members SET member_group = 'CHOIR' WHERE id = ?1", [id])
            .unwrap();

        assert!(storage.get(id).unwrap().unwrap().group.is_none());
    }

    #[test]
    fn test_corrupt_image_reads_as_none() {
        let storage = create_test_storage();
        let id = storage.create(&full_member()).unwrap();
        storage
            .conn
            .execute("UPDATE members SET photo = 'garbage' WHERE id = ?1", [id])
            .unwrap();

        let stored = storage.get(id).unwrap().unwrap();
        assert!(stored.photo.is_none());
        assert!(stored.signature.is_some());
    }

    #[test]
    fn test_images_stored_as_data_uris() {
        let storage = create_test_storage();
        let id = storage.create(&full_member()).unwrap();

        let raw: String = storage
            .conn
            .query_row("SELECT signature FROM members WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .unwrap();
        assert!(raw.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_stats_empty() {
        let stats = create_test_storage().stats().unwrap();
        assert_eq!(stats.total_members, 0);
        assert!(stats.first_registration.is_none());
        assert_eq!(stats.db_size_bytes, 0);
    }

    #[test]
    fn test_stats_with_data() {
        let storage = create_test_storage();
        storage.create(&full_member()).unwrap();
        storage.create(&member("Luis", None)).unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_members, 2);
        assert_eq!(stats.with_photo, 1);
        assert_eq!(stats.with_signature, 1);
        assert_eq!(stats.first_registration, full_member().created_at);
        assert!(stats.last_registration.is_some());
    }

    #[test]
    fn test_open_file_based() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("members.db");

        let storage = Storage::open(&db_path).unwrap();
        let id = storage.create(&full_member()).unwrap();
        assert!(db_path.exists());
        drop(storage);

        let reopened = Storage::open(&db_path).unwrap();
        assert_eq!(reopened.get(id).unwrap().unwrap().name, "Ana María Ruiz");
        assert!(reopened.stats().unwrap().db_size_bytes > 0);
    }
}
