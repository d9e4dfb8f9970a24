//! Tenant repository: authoritative store for tenants and their invariants

use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::info;
use uuid::Uuid;

use crate::connection::DatabaseConnection;
use crate::entities::{tenants, Tenants};
use crate::repositories::map_db_err;
use vitrine_api_types::{ListResponse, PaginationInput, TenantPatch, TenantStatus, UnifiedTenant};
use vitrine_core::{check_tenant_transition, normalize_domain, validate_slug};
use vitrine_interfaces::database::CreateTenantInput;
use vitrine_interfaces::{DatabaseError, TenantFilters, TenantRepository};

#[derive(Clone)]
pub struct SeaOrmTenantRepository {
    db: DatabaseConnection,
}

impl SeaOrmTenantRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn fetch(&self, id: i32) -> Result<tenants::Model, DatabaseError> {
        Tenants::find_by_id(id)
            .one(self.db.get_connection())
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| DatabaseError::not_found("tenant", id))
    }

    /// Every domain must be unique across all tenants, alternates included.
    /// The primary-domain column has a unique key; alternates are checked
    /// here before any write.
    async fn assert_domains_free(&self, domains: &[String], exclude_id: Option<i32>) -> Result<(), DatabaseError> {
        for domain in domains {
            if let Some(existing) = self.lookup_domain(domain).await? {
                if Some(existing.id) != exclude_id {
                    return Err(DatabaseError::Constraint {
                        message: format!("domain {} is already taken", domain),
                    });
                }
            }
        }
        Ok(())
    }

    async fn lookup_domain(&self, domain: &str) -> Result<Option<tenants::Model>, DatabaseError> {
        let normalized = normalize_domain(domain);

        // Primary domains carry a unique index; hit it first
        let primary = Tenants::find()
            .filter(tenants::Column::Domain.eq(normalized.clone()))
            .one(self.db.get_connection())
            .await
            .map_err(map_db_err)?;
        if primary.is_some() {
            return Ok(primary);
        }

        // Alternate domains live in a JSON array; the resolver's domain cache
        // keeps this scan off the hot path
        let candidates = Tenants::find().all(self.db.get_connection()).await.map_err(map_db_err)?;
        Ok(candidates.into_iter().find(|t| {
            t.backoffice_domain.as_deref() == Some(normalized.as_str())
                || t.alternate_domain_list().iter().any(|d| d == &normalized)
        }))
    }
}

#[async_trait]
impl TenantRepository for SeaOrmTenantRepository {
    async fn create(&self, input: CreateTenantInput, default_domain: String) -> Result<UnifiedTenant, DatabaseError> {
        validate_slug(&input.code).map_err(|e| DatabaseError::Validation { message: e.to_string() })?;

        let mut declared: Vec<String> = vec![default_domain.clone()];
        declared.extend(input.alternate_domains.iter().map(|d| normalize_domain(d)));
        self.assert_domains_free(&declared, None).await?;

        let alternates: Vec<String> = input.alternate_domains.iter().map(|d| normalize_domain(d)).collect();

        let mut model = tenants::ActiveModel::new();
        model.code = Set(input.code.clone());
        model.name = Set(input.name);
        model.domain = Set(normalize_domain(&default_domain));
        model.alternate_domains = Set(serde_json::json!(alternates));
        model.email = Set(input.email);
        model.plan_code = Set(Some(input.plan_code));

        // The unique keys on code and domain close the race two concurrent
        // signups with the same slug would otherwise win together
        let created = model.insert(self.db.get_connection()).await.map_err(map_db_err)?;
        info!(tenant = %created.code, "tenant created in provisioning");
        Ok(created.into())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<UnifiedTenant>, DatabaseError> {
        let tenant = Tenants::find_by_id(id)
            .one(self.db.get_connection())
            .await
            .map_err(map_db_err)?;
        Ok(tenant.map(Into::into))
    }

    async fn find_by_uuid(&self, uuid: Uuid) -> Result<Option<UnifiedTenant>, DatabaseError> {
        let tenant = Tenants::find()
            .filter(tenants::Column::Uuid.eq(uuid))
            .one(self.db.get_connection())
            .await
            .map_err(map_db_err)?;
        Ok(tenant.map(Into::into))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<UnifiedTenant>, DatabaseError> {
        let tenant = Tenants::find()
            .filter(tenants::Column::Code.eq(code))
            .one(self.db.get_connection())
            .await
            .map_err(map_db_err)?;
        Ok(tenant.map(Into::into))
    }

    async fn find_by_domain(&self, domain: &str) -> Result<Option<UnifiedTenant>, DatabaseError> {
        Ok(self.lookup_domain(domain).await?.map(Into::into))
    }

    async fn find_by_company(&self, company_id: i32) -> Result<Option<UnifiedTenant>, DatabaseError> {
        let tenant = Tenants::find()
            .filter(tenants::Column::CompanyId.eq(company_id))
            .one(self.db.get_connection())
            .await
            .map_err(map_db_err)?;
        Ok(tenant.map(Into::into))
    }

    async fn list(
        &self,
        filters: TenantFilters,
        pagination: PaginationInput,
    ) -> Result<ListResponse<UnifiedTenant>, DatabaseError> {
        let mut query = Tenants::find();
        if let Some(active) = filters.active {
            query = query.filter(tenants::Column::Active.eq(active));
        }
        if let Some(status) = filters.status {
            let db_status: tenants::DbTenantStatus = status.into();
            query = query.filter(tenants::Column::Status.eq(db_status));
        }
        if let Some(search) = filters.search.as_deref() {
            let needle = search.trim().to_ascii_lowercase();
            query = query.filter(
                Condition::any()
                    .add(tenants::Column::Code.contains(&needle))
                    .add(tenants::Column::Domain.contains(&needle))
                    .add(tenants::Column::Name.contains(search.trim())),
            );
        }

        let paginator = query
            .order_by_asc(tenants::Column::Code)
            .paginate(self.db.get_connection(), pagination.limit.max(1));
        let total = paginator.num_items().await.map_err(map_db_err)?;
        let items = paginator
            .fetch_page(pagination.page.saturating_sub(1))
            .await
            .map_err(map_db_err)?;

        Ok(ListResponse::new(items.into_iter().map(Into::into).collect(), pagination, total))
    }

    async fn update(&self, id: i32, patch: TenantPatch) -> Result<UnifiedTenant, DatabaseError> {
        let current = self.fetch(id).await?;

        // Domain mutations re-check global uniqueness before the write
        let mut new_domains = Vec::new();
        if let Some(domain) = &patch.domain {
            new_domains.push(normalize_domain(domain));
        }
        if let Some(alternates) = &patch.alternate_domains {
            new_domains.extend(alternates.iter().map(|d| normalize_domain(d)));
        }
        if let Some(backoffice) = &patch.backoffice_domain {
            new_domains.push(normalize_domain(backoffice));
        }
        if !new_domains.is_empty() {
            self.assert_domains_free(&new_domains, Some(id)).await?;
        }

        if let Some(code) = &patch.code {
            validate_slug(code).map_err(|e| DatabaseError::Validation { message: e.to_string() })?;
        }
        if let Some(to) = patch.status {
            check_tenant_transition(current.status.into(), to)
                .map_err(|e| DatabaseError::StateTransition { message: e.to_string() })?;
        }

        let mut model: tenants::ActiveModel = current.into();
        if let Some(name) = patch.name {
            model.name = Set(name);
        }
        if let Some(primary_color) = patch.primary_color {
            model.primary_color = Set(Some(primary_color));
        }
        if let Some(logo_url) = patch.logo_url {
            model.logo_url = Set(Some(logo_url));
        }
        if let Some(favicon_url) = patch.favicon_url {
            model.favicon_url = Set(Some(favicon_url));
        }
        if let Some(email) = patch.email {
            model.email = Set(Some(email));
        }
        if let Some(phone) = patch.phone {
            model.phone = Set(Some(phone));
        }
        if let Some(flags) = patch.feature_flags {
            model.feature_flags = Set(serde_json::to_value(flags).unwrap_or_default());
        }
        if let Some(code) = patch.code {
            model.code = Set(code);
        }
        if let Some(domain) = patch.domain {
            model.domain = Set(normalize_domain(&domain));
        }
        if let Some(alternates) = patch.alternate_domains {
            let normalized: Vec<String> = alternates.iter().map(|d| normalize_domain(d)).collect();
            model.alternate_domains = Set(serde_json::json!(normalized));
        }
        if let Some(backoffice) = patch.backoffice_domain {
            model.backoffice_domain = Set(Some(normalize_domain(&backoffice)));
        }
        if let Some(company_id) = patch.company_id {
            model.company_id = Set(Some(company_id));
        }
        if let Some(active) = patch.active {
            model.active = Set(active);
        }
        if let Some(plan_code) = patch.plan_code {
            model.plan_code = Set(Some(plan_code));
        }
        if let Some(status) = patch.status {
            model.status = Set(status.into());
        }
        model.updated_at = Set(chrono::Utc::now());

        let updated = model.update(self.db.get_connection()).await.map_err(map_db_err)?;
        Ok(updated.into())
    }

    async fn transition_status(&self, id: i32, to: TenantStatus) -> Result<UnifiedTenant, DatabaseError> {
        let current = self.fetch(id).await?;
        check_tenant_transition(current.status.into(), to)
            .map_err(|e| DatabaseError::StateTransition { message: e.to_string() })?;

        let code = current.code.clone();
        let from: TenantStatus = current.status.into();
        let mut model: tenants::ActiveModel = current.into();
        model.status = Set(to.into());
        model.updated_at = Set(chrono::Utc::now());
        let updated = model.update(self.db.get_connection()).await.map_err(map_db_err)?;
        info!(tenant = %code, %from, %to, "tenant status transition");
        Ok(updated.into())
    }

    async fn ensure_company(&self, id: i32, name: &str, email: Option<&str>) -> Result<i32, DatabaseError> {
        use crate::entities::{companies, Companies};

        let existing = Companies::find()
            .filter(companies::Column::TenantId.eq(id))
            .one(self.db.get_connection())
            .await
            .map_err(map_db_err)?;
        if let Some(company) = existing {
            return Ok(company.id);
        }

        let mut model = companies::ActiveModel::new();
        model.name = Set(name.to_string());
        model.email = Set(email.map(str::to_string));
        model.tenant_id = Set(id);
        let company = match model.insert(self.db.get_connection()).await {
            Ok(company) => company,
            // A concurrent step already created it; the unique tenant_id key
            // makes the re-read authoritative
            Err(err) => Companies::find()
                .filter(companies::Column::TenantId.eq(id))
                .one(self.db.get_connection())
                .await
                .map_err(map_db_err)?
                .ok_or_else(|| map_db_err(err))?,
        };

        self.link_company(id, company.id).await?;
        Ok(company.id)
    }

    async fn link_company(&self, id: i32, company_id: i32) -> Result<(), DatabaseError> {
        let current = self.fetch(id).await?;
        let mut model: tenants::ActiveModel = current.into();
        model.company_id = Set(Some(company_id));
        model.updated_at = Set(chrono::Utc::now());
        model.update(self.db.get_connection()).await.map_err(map_db_err)?;
        Ok(())
    }

    async fn set_provider_customer(&self, id: i32, customer_id: &str) -> Result<(), DatabaseError> {
        let current = self.fetch(id).await?;
        let mut model: tenants::ActiveModel = current.into();
        model.provider_customer_id = Set(Some(customer_id.to_string()));
        model.updated_at = Set(chrono::Utc::now());
        model.update(self.db.get_connection()).await.map_err(map_db_err)?;
        Ok(())
    }

    async fn archive(&self, id: i32) -> Result<UnifiedTenant, DatabaseError> {
        let current = self.fetch(id).await?;
        let code = current.code.clone();
        let mut model: tenants::ActiveModel = current.into();
        model.active = Set(false);
        model.status = Set(tenants::DbTenantStatus::Archived);
        model.updated_at = Set(chrono::Utc::now());
        let updated = model.update(self.db.get_connection()).await.map_err(map_db_err)?;
        info!(tenant = %code, "tenant archived");
        Ok(updated.into())
    }

    async fn ensure_admin_tenant(
        &self,
        company_id: i32,
        default_domain: String,
    ) -> Result<UnifiedTenant, DatabaseError> {
        let code = format!("admin-{}", company_id);
        if let Some(existing) = self.find_by_code(&code).await? {
            return Ok(existing);
        }

        let mut model = tenants::ActiveModel::new();
        model.code = Set(code.clone());
        model.name = Set(format!("Admin {}", company_id));
        model.domain = Set(normalize_domain(&default_domain));
        model.company_id = Set(Some(company_id));
        model.status = Set(tenants::DbTenantStatus::Active);

        match model.insert(self.db.get_connection()).await {
            Ok(created) => Ok(created.into()),
            // A concurrent caller created it between the lookup and the
            // insert; the unique code key makes the re-read authoritative
            Err(err) => match self.find_by_code(&code).await? {
                Some(existing) => Ok(existing),
                None => Err(map_db_err(err)),
            },
        }
    }
}
