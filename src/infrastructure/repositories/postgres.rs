use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Postgres, Row, postgres::PgPoolOptions};
use uuid::Uuid;

use crate::domain::{
    models::{DeliveryRecord, EntityType, Group, GroupMember, MemberPermission, User},
    repositories::{DeliveryRecordRepository, GroupRepository, UserRepository},
    value_objects::DeviceId,
};

use super::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

pub type PgPool = Pool<Postgres>;

pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get(&self, id: &Uuid) -> anyhow::Result<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"SELECT id, name, portrait, push_id, created_at, updated_at FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record.map(User::from))
    }

    async fn upsert(&self, user: &User) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, portrait, push_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                portrait = EXCLUDED.portrait,
                push_id = EXCLUDED.push_id,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.portrait)
        .bind(&user.push_id)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_device(
        &self,
        user_id: &Uuid,
        device_id: Option<&DeviceId>,
    ) -> anyhow::Result<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE users
            SET push_id = $2,
                updated_at = $3
            WHERE id = $1
            RETURNING id, name, portrait, push_id, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(device_id.map(DeviceId::as_str))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        Ok(record.map(User::from))
    }

    async fn release_device(&self, device_id: &DeviceId, keep: &Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET push_id = NULL,
                updated_at = $3
            WHERE lower(push_id) = lower($1)
              AND id <> $2
            "#,
        )
        .bind(device_id.as_str())
        .bind(keep)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Clone)]
pub struct PostgresGroupRepository {
    pool: PgPool,
}

impl PostgresGroupRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl GroupRepository for PostgresGroupRepository {
    async fn get(&self, id: &Uuid) -> anyhow::Result<Option<Group>> {
        let row = sqlx::query(
            r#"SELECT id, name, owner_id, created_at FROM groups WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Group {
            id: row.get("id"),
            name: row.get("name"),
            owner_id: row.get("owner_id"),
            created_at: row.get("created_at"),
        }))
    }

    async fn list_members(&self, group: &Group) -> anyhow::Result<Vec<GroupMember>> {
        let rows = sqlx::query(
            r#"
            SELECT m.id AS member_id,
                   m.group_id,
                   m.alias,
                   m.permission,
                   m.updated_at AS member_updated_at,
                   u.id, u.name, u.portrait, u.push_id, u.created_at, u.updated_at
            FROM group_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.group_id = $1
            ORDER BY m.updated_at ASC
            "#,
        )
        .bind(group.id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> anyhow::Result<GroupMember> {
                let permission: String = row.get("permission");
                let permission = permission.parse::<MemberPermission>()?;
                let user = User::from(UserRecord::from_row(&row)?);
                Ok(GroupMember {
                    id: row.get("member_id"),
                    group_id: row.get("group_id"),
                    user,
                    alias: row.get("alias"),
                    permission,
                    updated_at: row.get("member_updated_at"),
                })
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct PostgresDeliveryRecordRepository {
    pool: PgPool,
}

impl PostgresDeliveryRecordRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl DeliveryRecordRepository for PostgresDeliveryRecordRepository {
    async fn save_all(&self, records: &[DeliveryRecord]) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            sqlx::query(
                r#"
                INSERT INTO push_history (
                    id, entity_type, entity_content, sender_id, receiver_id,
                    receiver_push_id, created_at
                )
                VALUES ($1,$2,$3,$4,$5,$6,$7)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(record.id)
            .bind(record.entity_type.as_str())
            .bind(&record.entity_content)
            .bind(record.sender_id)
            .bind(record.receiver_id)
            .bind(&record.receiver_push_id)
            .bind(record.created_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn list_by_receiver(
        &self,
        receiver_id: Uuid,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> anyhow::Result<(Vec<DeliveryRecord>, bool)> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE) as i64;
        let offset = offset.unwrap_or(0) as i64;

        // One extra row tells whether another page exists.
        let rows = sqlx::query_as::<_, DeliveryRecordRow>(
            r#"
            SELECT id, entity_type, entity_content, sender_id, receiver_id,
                   receiver_push_id, created_at
            FROM push_history
            WHERE receiver_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(receiver_id)
        .bind(limit + 1)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let has_more = rows.len() as i64 > limit;
        let records = rows
            .into_iter()
            .take(limit as usize)
            .map(DeliveryRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((records, has_more))
    }
}

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    name: String,
    portrait: Option<String>,
    push_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(value: UserRecord) -> Self {
        Self {
            id: value.id,
            name: value.name,
            portrait: value.portrait,
            push_id: value.push_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(FromRow)]
struct DeliveryRecordRow {
    id: Uuid,
    entity_type: String,
    entity_content: String,
    sender_id: Option<Uuid>,
    receiver_id: Uuid,
    receiver_push_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<DeliveryRecordRow> for DeliveryRecord {
    type Error = anyhow::Error;

    fn try_from(value: DeliveryRecordRow) -> Result<Self, Self::Error> {
        let entity_type = value.entity_type.parse::<EntityType>()?;
        Ok(Self {
            id: value.id,
            entity_type,
            entity_content: value.entity_content,
            sender_id: value.sender_id,
            receiver_id: value.receiver_id,
            receiver_push_id: value.receiver_push_id,
            created_at: value.created_at,
        })
    }
}
