use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use roofline_core::domain::lead::{Lead, LeadId, LeadSource, LeadStatus};
use roofline_core::domain::tenant::TenantId;

use super::{LeadRepository, RepositoryError};
use crate::DbPool;

#[derive(Clone, Debug)]
pub struct NewLead {
    pub tenant_id: TenantId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: String,
    pub status: LeadStatus,
    pub source: LeadSource,
    pub notes: Option<String>,
}

pub struct SqlLeadRepository {
    pool: DbPool,
}

impl SqlLeadRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("bad timestamp `{text}`: {e}")))
}

fn row_to_lead(row: &SqliteRow) -> Result<Lead, RepositoryError> {
    let created_at_text: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let source: String =
        row.try_get("source").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Lead {
        id: LeadId(row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?),
        tenant_id: TenantId(
            row.try_get("contractor_id").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        ),
        name: row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        email: row.try_get("email").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        phone: row.try_get("phone").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        address: row.try_get("address").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        status: LeadStatus(status),
        source: LeadSource(source),
        notes: row.try_get("notes").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        created_at: parse_timestamp(&created_at_text)?,
    })
}

const LEAD_COLUMNS: &str =
    "id, contractor_id, name, email, phone, address, status, source, notes, created_at";

#[async_trait]
impl LeadRepository for SqlLeadRepository {
    async fn create(&self, new_lead: NewLead) -> Result<Lead, RepositoryError> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO lead (contractor_id, name, email, phone, address, status, source, notes, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(new_lead.tenant_id.0)
        .bind(&new_lead.name)
        .bind(&new_lead.email)
        .bind(&new_lead.phone)
        .bind(&new_lead.address)
        .bind(new_lead.status.as_str())
        .bind(new_lead.source.as_str())
        .bind(&new_lead.notes)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(Lead {
            id: LeadId(result.last_insert_rowid()),
            tenant_id: new_lead.tenant_id,
            name: new_lead.name,
            email: new_lead.email,
            phone: new_lead.phone,
            address: new_lead.address,
            status: new_lead.status,
            source: new_lead.source,
            notes: new_lead.notes,
            created_at,
        })
    }

    async fn find_by_id(&self, id: LeadId) -> Result<Option<Lead>, RepositoryError> {
        sqlx::query(&format!("SELECT {LEAD_COLUMNS} FROM lead WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| row_to_lead(&row))
            .transpose()
    }

    async fn list_for_tenant(&self, tenant_id: TenantId) -> Result<Vec<Lead>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {LEAD_COLUMNS} FROM lead WHERE contractor_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(tenant_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_lead).collect()
    }

    async fn update_status(
        &self,
        id: LeadId,
        status: &LeadStatus,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE lead SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: LeadId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM lead WHERE id = ?").bind(id.0).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use roofline_core::domain::lead::{LeadId, LeadSource, LeadStatus};
    use roofline_core::domain::tenant::TenantId;

    use super::{NewLead, SqlLeadRepository};
    use crate::repositories::LeadRepository;
    use crate::{connect_with_settings, migrations, seed_contractor};

    async fn setup() -> (crate::DbPool, TenantId) {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let tenant_id = seed_contractor(&pool, "Summit Roofing").await.expect("seed");
        (pool, tenant_id)
    }

    fn sample(tenant_id: TenantId, name: &str) -> NewLead {
        NewLead {
            tenant_id,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_ascii_lowercase().replace(' ', ".")),
            phone: None,
            address: "123 Oak St, Dallas TX".to_string(),
            status: LeadStatus::default(),
            source: LeadSource::default(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn create_then_find_round_trips() {
        let (pool, tenant_id) = setup().await;
        let repo = SqlLeadRepository::new(pool);

        let created = repo.create(sample(tenant_id, "Jordan Alvarez")).await.expect("create");
        let found = repo.find_by_id(created.id).await.expect("find").expect("some");

        assert_eq!(found, created);
        assert_eq!(found.status.as_str(), "new");
        assert_eq!(found.source.as_str(), "widget");
    }

    #[tokio::test]
    async fn status_updates_accept_free_form_labels() {
        let (pool, tenant_id) = setup().await;
        let repo = SqlLeadRepository::new(pool);

        let lead = repo.create(sample(tenant_id, "Sam Lee")).await.expect("create");
        let updated = repo
            .update_status(lead.id, &LeadStatus::from("waiting_on_insurance"))
            .await
            .expect("update");
        assert!(updated);

        let found = repo.find_by_id(lead.id).await.expect("find").expect("some");
        assert_eq!(found.status.as_str(), "waiting_on_insurance");
    }

    #[tokio::test]
    async fn missing_lead_is_none_and_updates_report_false() {
        let (pool, _) = setup().await;
        let repo = SqlLeadRepository::new(pool);

        assert!(repo.find_by_id(LeadId(404)).await.expect("find").is_none());
        assert!(!repo.update_status(LeadId(404), &LeadStatus::default()).await.expect("update"));
        assert!(!repo.delete(LeadId(404)).await.expect("delete"));
    }

    #[tokio::test]
    async fn listing_is_scoped_to_the_tenant() {
        let (pool, tenant_id) = setup().await;
        let other_tenant = seed_contractor(&pool, "Valley Roofing").await.expect("seed");
        let repo = SqlLeadRepository::new(pool);

        repo.create(sample(tenant_id, "Jordan Alvarez")).await.expect("create");
        repo.create(sample(other_tenant, "Casey Brook")).await.expect("create");

        let leads = repo.list_for_tenant(tenant_id).await.expect("list");
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].name, "Jordan Alvarez");
    }
}
