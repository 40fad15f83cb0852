//! SQLite implementation of the storage traits, backed by an sqlx pool.
//!
//! Timestamps are stored as RFC 3339 text and the children snapshots on a
//! visit are stored as JSON arrays, which keeps the schema down to plain
//! equality-filtered columns.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{migrate::MigrateDatabase, Row, Sqlite, SqlitePool};
use std::sync::Arc;

use crate::storage::traits::{
    ChildStore, GroupStore, MembershipStore, PlaygroundStore, VisitStore,
};
use shared::{Child, Group, GroupMembership, Playground, PlaygroundVisit};

// The database URL for the production database
const DATABASE_URL: &str = "sqlite:playground-tracker.db";

/// DbConnection manages database operations
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection
    pub async fn new(url: &str) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?
        }

        let pool = SqlitePool::connect(url).await?;

        Self::setup_schema(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Initialize the standard database
    pub async fn init() -> Result<Self> {
        Self::new(DATABASE_URL).await
    }

    /// Initialize a test database with a unique name
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        // Generate a unique database name for tests
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url).await
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS groups (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                join_code TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS group_memberships (
                id TEXT PRIMARY KEY,
                group_id TEXT NOT NULL,
                member_handle TEXT NOT NULL,
                member_name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (group_id) REFERENCES groups (id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_memberships_group_id
            ON group_memberships(group_id);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_memberships_member_handle
            ON group_memberships(member_handle);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS children (
                id TEXT PRIMARY KEY,
                parent_handle TEXT NOT NULL,
                name TEXT NOT NULL,
                age INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_children_parent_handle
            ON children(parent_handle);
            "#,
        )
        .execute(pool)
        .await?;

        // No uniqueness constraint on canonical_name: dedup happens at
        // resolution time, and the accepted concurrent-create race may
        // leave near-duplicate rows behind.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS playgrounds (
                id TEXT PRIMARY KEY,
                group_id TEXT NOT NULL,
                canonical_name TEXT NOT NULL,
                raw_text TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (group_id) REFERENCES groups (id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_playgrounds_group_id
            ON playgrounds(group_id);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS playground_visits (
                id TEXT PRIMARY KEY,
                group_id TEXT NOT NULL,
                parent_handle TEXT NOT NULL,
                parent_name TEXT NOT NULL,
                playground_name TEXT NOT NULL,
                children_names TEXT NOT NULL,
                children_ages TEXT NOT NULL,
                signal_time TEXT NOT NULL,
                ended BOOLEAN NOT NULL DEFAULT FALSE,
                FOREIGN KEY (group_id) REFERENCES groups (id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_visits_group_id
            ON playground_visits(group_id);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_visits_group_parent
            ON playground_visits(group_id, parent_handle);
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

fn row_to_group(row: &SqliteRow) -> Result<Group> {
    Ok(Group {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        join_code: row.get("join_code"),
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}

fn row_to_membership(row: &SqliteRow) -> Result<GroupMembership> {
    Ok(GroupMembership {
        id: row.get("id"),
        group_id: row.get("group_id"),
        member_handle: row.get("member_handle"),
        member_name: row.get("member_name"),
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}

fn row_to_child(row: &SqliteRow) -> Result<Child> {
    Ok(Child {
        id: row.get("id"),
        parent_handle: row.get("parent_handle"),
        name: row.get("name"),
        // Ages are validated at write time, but a corrupted row must
        // surface as an error rather than wrap around
        age: u32::try_from(row.get::<i64, _>("age"))?,
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}

fn row_to_playground(row: &SqliteRow) -> Result<Playground> {
    Ok(Playground {
        id: row.get("id"),
        group_id: row.get("group_id"),
        canonical_name: row.get("canonical_name"),
        raw_text: row.get("raw_text"),
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}

fn row_to_visit(row: &SqliteRow) -> Result<PlaygroundVisit> {
    let children_names: Vec<String> = serde_json::from_str(row.get("children_names"))?;
    let children_ages: Vec<u32> = serde_json::from_str(row.get("children_ages"))?;
    Ok(PlaygroundVisit {
        id: row.get("id"),
        group_id: row.get("group_id"),
        parent_handle: row.get("parent_handle"),
        parent_name: row.get("parent_name"),
        playground_name: row.get("playground_name"),
        children_names,
        children_ages,
        signal_time: parse_timestamp(row.get("signal_time"))?,
        ended: row.get("ended"),
    })
}

#[async_trait]
impl GroupStore for DbConnection {
    async fn store_group(&self, group: &Group) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO groups (id, name, description, join_code, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&group.id)
        .bind(&group.name)
        .bind(&group.description)
        .bind(&group.join_code)
        .bind(group.created_at.to_rfc3339())
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, join_code, created_at
            FROM groups
            WHERE id = ?
            "#,
        )
        .bind(group_id)
        .fetch_optional(&*self.pool)
        .await?;

        row.as_ref().map(row_to_group).transpose()
    }

    async fn find_group_by_join_code(&self, join_code: &str) -> Result<Option<Group>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, join_code, created_at
            FROM groups
            WHERE join_code = ?
            "#,
        )
        .bind(join_code)
        .fetch_optional(&*self.pool)
        .await?;

        row.as_ref().map(row_to_group).transpose()
    }
}

#[async_trait]
impl MembershipStore for DbConnection {
    async fn store_membership(&self, membership: &GroupMembership) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO group_memberships (id, group_id, member_handle, member_name, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&membership.id)
        .bind(&membership.group_id)
        .bind(&membership.member_handle)
        .bind(&membership.member_name)
        .bind(membership.created_at.to_rfc3339())
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn get_membership(
        &self,
        group_id: &str,
        member_handle: &str,
    ) -> Result<Option<GroupMembership>> {
        let row = sqlx::query(
            r#"
            SELECT id, group_id, member_handle, member_name, created_at
            FROM group_memberships
            WHERE group_id = ? AND member_handle = ?
            "#,
        )
        .bind(group_id)
        .bind(member_handle)
        .fetch_optional(&*self.pool)
        .await?;

        row.as_ref().map(row_to_membership).transpose()
    }

    async fn list_memberships_for_user(
        &self,
        member_handle: &str,
    ) -> Result<Vec<GroupMembership>> {
        let rows = sqlx::query(
            r#"
            SELECT id, group_id, member_handle, member_name, created_at
            FROM group_memberships
            WHERE member_handle = ?
            ORDER BY ROWID ASC
            "#,
        )
        .bind(member_handle)
        .fetch_all(&*self.pool)
        .await?;

        rows.iter().map(row_to_membership).collect()
    }

    async fn delete_membership(&self, membership_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM group_memberships WHERE id = ?")
            .bind(membership_id)
            .execute(&*self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ChildStore for DbConnection {
    async fn store_child(&self, child: &Child) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO children (id, parent_handle, name, age, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&child.id)
        .bind(&child.parent_handle)
        .bind(&child.name)
        .bind(child.age as i64)
        .bind(child.created_at.to_rfc3339())
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn get_child(&self, child_id: &str) -> Result<Option<Child>> {
        let row = sqlx::query(
            r#"
            SELECT id, parent_handle, name, age, created_at
            FROM children
            WHERE id = ?
            "#,
        )
        .bind(child_id)
        .fetch_optional(&*self.pool)
        .await?;

        row.as_ref().map(row_to_child).transpose()
    }

    async fn list_children_for_parent(&self, parent_handle: &str) -> Result<Vec<Child>> {
        let rows = sqlx::query(
            r#"
            SELECT id, parent_handle, name, age, created_at
            FROM children
            WHERE parent_handle = ?
            ORDER BY name ASC
            "#,
        )
        .bind(parent_handle)
        .fetch_all(&*self.pool)
        .await?;

        rows.iter().map(row_to_child).collect()
    }

    async fn delete_child(&self, child_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM children WHERE id = ?")
            .bind(child_id)
            .execute(&*self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl PlaygroundStore for DbConnection {
    async fn store_playground(&self, playground: &Playground) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO playgrounds (id, group_id, canonical_name, raw_text, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&playground.id)
        .bind(&playground.group_id)
        .bind(&playground.canonical_name)
        .bind(&playground.raw_text)
        .bind(playground.created_at.to_rfc3339())
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn list_playgrounds_for_group(&self, group_id: &str) -> Result<Vec<Playground>> {
        // ROWID order is insertion order; resolution tie-breaks depend on it
        let rows = sqlx::query(
            r#"
            SELECT id, group_id, canonical_name, raw_text, created_at
            FROM playgrounds
            WHERE group_id = ?
            ORDER BY ROWID ASC
            "#,
        )
        .bind(group_id)
        .fetch_all(&*self.pool)
        .await?;

        rows.iter().map(row_to_playground).collect()
    }
}

#[async_trait]
impl VisitStore for DbConnection {
    async fn store_visit(&self, visit: &PlaygroundVisit) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO playground_visits
                (id, group_id, parent_handle, parent_name, playground_name,
                 children_names, children_ages, signal_time, ended)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&visit.id)
        .bind(&visit.group_id)
        .bind(&visit.parent_handle)
        .bind(&visit.parent_name)
        .bind(&visit.playground_name)
        .bind(serde_json::to_string(&visit.children_names)?)
        .bind(serde_json::to_string(&visit.children_ages)?)
        .bind(visit.signal_time.to_rfc3339())
        .bind(visit.ended)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn list_visits_for_group(&self, group_id: &str) -> Result<Vec<PlaygroundVisit>> {
        let rows = sqlx::query(
            r#"
            SELECT id, group_id, parent_handle, parent_name, playground_name,
                   children_names, children_ages, signal_time, ended
            FROM playground_visits
            WHERE group_id = ?
            ORDER BY ROWID ASC
            "#,
        )
        .bind(group_id)
        .fetch_all(&*self.pool)
        .await?;

        rows.iter().map(row_to_visit).collect()
    }

    async fn list_visits_for_parent(
        &self,
        group_id: &str,
        parent_handle: &str,
    ) -> Result<Vec<PlaygroundVisit>> {
        let rows = sqlx::query(
            r#"
            SELECT id, group_id, parent_handle, parent_name, playground_name,
                   children_names, children_ages, signal_time, ended
            FROM playground_visits
            WHERE group_id = ? AND parent_handle = ?
            ORDER BY ROWID ASC
            "#,
        )
        .bind(group_id)
        .bind(parent_handle)
        .fetch_all(&*self.pool)
        .await?;

        rows.iter().map(row_to_visit).collect()
    }

    async fn mark_visit_ended(&self, visit_id: &str) -> Result<bool> {
        // The ended flag is the only mutable field on a visit
        let result = sqlx::query("UPDATE playground_visits SET ended = TRUE WHERE id = ?")
            .bind(visit_id)
            .execute(&*self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // Setup a new test database for each test
    async fn setup_test() -> DbConnection {
        DbConnection::init_test()
            .await
            .expect("Failed to create test database")
    }

    fn test_time(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 14, 10, minute, 0).unwrap()
    }

    fn test_group(id: &str, join_code: &str) -> Group {
        Group {
            id: id.to_string(),
            name: "שכונת הפרחים".to_string(),
            description: "".to_string(),
            join_code: join_code.to_string(),
            created_at: test_time(0),
        }
    }

    async fn seed_group(db: &DbConnection, id: &str, join_code: &str) {
        db.store_group(&test_group(id, join_code))
            .await
            .expect("Failed to store group");
    }

    fn test_visit(id: &str, group_id: &str, handle: &str, playground: &str) -> PlaygroundVisit {
        PlaygroundVisit {
            id: id.to_string(),
            group_id: group_id.to_string(),
            parent_handle: handle.to_string(),
            parent_name: "Dana".to_string(),
            playground_name: playground.to_string(),
            children_names: vec!["Noa".to_string()],
            children_ages: vec![4],
            signal_time: test_time(0),
            ended: false,
        }
    }

    #[tokio::test]
    async fn test_store_and_get_group() {
        let db = setup_test().await;

        let group = test_group("group::1", "ABC123");
        db.store_group(&group).await.expect("Failed to store group");

        let retrieved = db.get_group("group::1").await.expect("Failed to get group");
        assert_eq!(retrieved, Some(group));
    }

    #[tokio::test]
    async fn test_find_group_by_join_code() {
        let db = setup_test().await;

        let group = test_group("group::1", "XYZ789");
        db.store_group(&group).await.expect("Failed to store group");

        let found = db
            .find_group_by_join_code("XYZ789")
            .await
            .expect("Failed to query group");
        assert_eq!(found, Some(group));

        let missing = db
            .find_group_by_join_code("NOPE99")
            .await
            .expect("Failed to query group");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_join_code_unique() {
        let db = setup_test().await;

        db.store_group(&test_group("group::1", "SAME00"))
            .await
            .expect("Failed to store group");

        let result = db.store_group(&test_group("group::2", "SAME00")).await;
        assert!(result.is_err(), "Duplicate join code should be rejected");
    }

    #[tokio::test]
    async fn test_membership_lifecycle() {
        let db = setup_test().await;
        seed_group(&db, "group::1", "MEM001").await;

        let membership = GroupMembership {
            id: "membership::1".to_string(),
            group_id: "group::1".to_string(),
            member_handle: "dana@example.com".to_string(),
            member_name: "Dana".to_string(),
            created_at: test_time(0),
        };
        db.store_membership(&membership)
            .await
            .expect("Failed to store membership");

        let found = db
            .get_membership("group::1", "dana@example.com")
            .await
            .expect("Failed to query membership");
        assert_eq!(found, Some(membership.clone()));

        let mine = db
            .list_memberships_for_user("dana@example.com")
            .await
            .expect("Failed to list memberships");
        assert_eq!(mine.len(), 1);

        let deleted = db
            .delete_membership("membership::1")
            .await
            .expect("Failed to delete membership");
        assert!(deleted);

        let found = db
            .get_membership("group::1", "dana@example.com")
            .await
            .expect("Failed to query membership");
        assert!(found.is_none());

        // Deleting again is a no-op
        let deleted = db
            .delete_membership("membership::1")
            .await
            .expect("Failed to delete membership");
        assert!(!deleted);
    }

    #[tokio::test]
    async fn test_children_ordered_by_name() {
        let db = setup_test().await;

        let parent = "dana@example.com";
        for (id, name, age) in [("child::2", "Yoav", 6u32), ("child::1", "Noa", 4u32)] {
            db.store_child(&Child {
                id: id.to_string(),
                parent_handle: parent.to_string(),
                name: name.to_string(),
                age,
                created_at: test_time(0),
            })
            .await
            .expect("Failed to store child");
        }

        let children = db
            .list_children_for_parent(parent)
            .await
            .expect("Failed to list children");
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].name, "Noa");
        assert_eq!(children[1].name, "Yoav");

        // Another parent sees nothing
        let other = db
            .list_children_for_parent("someone@else.com")
            .await
            .expect("Failed to list children");
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_age_is_a_read_error() {
        let db = setup_test().await;

        // Bypass the typed store to plant a row no validated write could
        // produce
        sqlx::query(
            r#"
            INSERT INTO children (id, parent_handle, name, age, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind("child::bad")
        .bind("dana@example.com")
        .bind("Noa")
        .bind(-1_i64)
        .bind(test_time(0).to_rfc3339())
        .execute(&*db.pool)
        .await
        .expect("Failed to insert row");

        let result = db.list_children_for_parent("dana@example.com").await;
        assert!(result.is_err(), "negative age must not wrap around");
    }

    #[tokio::test]
    async fn test_playgrounds_insertion_order() {
        let db = setup_test().await;
        seed_group(&db, "group::1", "PLY001").await;

        for (id, name) in [
            ("playground::1", "גן השקד"),
            ("playground::2", "הגינה הגדולה"),
            ("playground::3", "פארק הירקון"),
        ] {
            db.store_playground(&Playground {
                id: id.to_string(),
                group_id: "group::1".to_string(),
                canonical_name: name.to_string(),
                raw_text: name.to_string(),
                created_at: test_time(0),
            })
            .await
            .expect("Failed to store playground");
        }

        let playgrounds = db
            .list_playgrounds_for_group("group::1")
            .await
            .expect("Failed to list playgrounds");
        assert_eq!(playgrounds.len(), 3);
        assert_eq!(playgrounds[0].canonical_name, "גן השקד");
        assert_eq!(playgrounds[1].canonical_name, "הגינה הגדולה");
        assert_eq!(playgrounds[2].canonical_name, "פארק הירקון");
    }

    #[tokio::test]
    async fn test_visit_roundtrip_and_mark_ended() {
        let db = setup_test().await;
        seed_group(&db, "group::1", "VIS001").await;

        let visit = test_visit("visit::1", "group::1", "dana@example.com", "גן השקד");
        db.store_visit(&visit).await.expect("Failed to store visit");

        let visits = db
            .list_visits_for_group("group::1")
            .await
            .expect("Failed to list visits");
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0], visit);
        assert_eq!(visits[0].children_names, vec!["Noa".to_string()]);
        assert_eq!(visits[0].children_ages, vec![4]);

        let updated = db
            .mark_visit_ended("visit::1")
            .await
            .expect("Failed to mark visit ended");
        assert!(updated);

        let visits = db
            .list_visits_for_group("group::1")
            .await
            .expect("Failed to list visits");
        assert!(visits[0].ended);
        // signal_time is untouched by the update
        assert_eq!(visits[0].signal_time, visit.signal_time);

        let updated = db
            .mark_visit_ended("visit::nonexistent")
            .await
            .expect("Failed to mark visit ended");
        assert!(!updated);
    }

    #[tokio::test]
    async fn test_list_visits_for_parent() {
        let db = setup_test().await;
        seed_group(&db, "group::1", "VIS002").await;
        seed_group(&db, "group::2", "VIS003").await;

        db.store_visit(&test_visit("visit::1", "group::1", "dana@example.com", "גן השקד"))
            .await
            .expect("Failed to store visit");
        db.store_visit(&test_visit("visit::2", "group::1", "amir@example.com", "גן השקד"))
            .await
            .expect("Failed to store visit");
        db.store_visit(&test_visit("visit::3", "group::2", "dana@example.com", "גן השקד"))
            .await
            .expect("Failed to store visit");

        let mine = db
            .list_visits_for_parent("group::1", "dana@example.com")
            .await
            .expect("Failed to list visits");
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, "visit::1");
    }
}
