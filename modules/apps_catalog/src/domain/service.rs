use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use search_core::literal::{escape_value, ARRAY_SEPARATOR};
use search_core::{
    compile_search, CompiledSearch, LimitCfg, ListType, Page, PageInfo, QuerySpec, SearchCtx,
    SearchPlan,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::AppsCatalogConfig;
use crate::contract::model::{App, NewApp, NewAppVersion};
use crate::domain::error::DomainError;
use crate::domain::repo::AppsRepository;
use crate::domain::schema::APPS_SCHEMA;

/// Catalog service: compiles searches and enforces write-path rules.
/// Depends only on the repository port, not on infra types.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn AppsRepository>,
    config: ServiceConfig,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub default_page_size: u64,
    pub max_page_size: u64,
    pub max_id_length: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 1000,
            max_id_length: 80,
        }
    }
}

impl From<&AppsCatalogConfig> for ServiceConfig {
    fn from(cfg: &AppsCatalogConfig) -> Self {
        Self {
            default_page_size: cfg.default_page_size,
            max_page_size: cfg.max_page_size,
            ..Self::default()
        }
    }
}

impl ServiceConfig {
    pub fn limits(&self) -> LimitCfg {
        LimitCfg {
            default: self.default_page_size,
            max: self.max_page_size,
        }
    }
}

impl Service {
    pub fn new(repo: Arc<dyn AppsRepository>, config: ServiceConfig) -> Self {
        Self { repo, config }
    }

    /// Compile `spec` for `ctx` and run it.
    ///
    /// The whole spec is compiled before the store is touched. An
    /// authorization scope that can match nothing returns an empty page
    /// without a store call.
    #[instrument(
        name = "apps_catalog.service.search_apps",
        skip(self, spec),
        fields(tenant = %ctx.tenant, user = %ctx.user, list_type = %spec.list_type)
    )]
    pub async fn search_apps(
        &self,
        ctx: &SearchCtx,
        spec: &QuerySpec,
    ) -> Result<Page<App>, DomainError> {
        let plan = match compile_search(spec, ctx, &APPS_SCHEMA, self.config.limits())? {
            CompiledSearch::Empty { window } => {
                debug!("authorization scope is empty, skipping store");
                let mut page = Page::empty(window.limit, window.skip);
                if spec.compute_total {
                    page.page_info.total_count = Some(0);
                }
                return Ok(page);
            }
            CompiledSearch::Plan(plan) => plan,
        };

        let window = plan.window();
        let (items, next_start_after) = self.fetch_page(&plan).await?;

        let total_count = if spec.compute_total {
            Some(
                self.repo
                    .count_matching(&plan)
                    .await
                    .map_err(DomainError::store)?,
            )
        } else {
            None
        };

        let page = Page::new(
            items,
            PageInfo {
                limit: window.limit,
                skip: window.skip,
                total_count,
                next_start_after,
            },
        );

        debug!(rows = page.items.len(), ?total_count, "search finished");
        Ok(page)
    }

    /// Latest version of `id`, or the given `version`.
    #[instrument(
        name = "apps_catalog.service.get_app",
        skip(self, shared_ids),
        fields(tenant = %ctx.tenant, app_id = %id)
    )]
    pub async fn get_app(
        &self,
        ctx: &SearchCtx,
        id: &str,
        version: Option<&str>,
        shared_ids: &BTreeSet<String>,
    ) -> Result<App, DomainError> {
        let mut conditions = vec![format!("id.eq.{}", escape_value(id))];
        if let Some(v) = version {
            conditions.push(format!("version.eq.{}", escape_value(v)));
        }
        let spec = QuerySpec::new()
            .with_conditions(conditions)
            .with_version_specified(version.is_some())
            .with_list_type(ListType::Mine)
            .with_shared_ids(shared_ids.iter().cloned())
            .with_limit(1);

        self.search_apps(ctx, &spec)
            .await?
            .items
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::app_not_found(id))
    }

    #[instrument(
        name = "apps_catalog.service.create_app",
        skip(self, new_app),
        fields(tenant = %ctx.tenant, app_id = %new_app.id, version = %new_app.version.version)
    )]
    pub async fn create_app(&self, ctx: &SearchCtx, new_app: NewApp) -> Result<App, DomainError> {
        info!("Creating new app");
        self.validate_id(&new_app.id)?;
        validate_version(&new_app.version)?;

        if self
            .repo
            .app_exists(&ctx.tenant, &new_app.id)
            .await
            .map_err(DomainError::store)?
        {
            return Err(DomainError::app_already_exists(new_app.id));
        }

        let app = build_row(ctx, &new_app.id, &ctx.user, new_app.enabled, new_app.version);
        self.repo
            .insert_app(app.clone())
            .await
            .map_err(DomainError::store)?;

        info!("Successfully created app");
        Ok(app)
    }

    /// Add a version to an existing app and make it the latest.
    #[instrument(
        name = "apps_catalog.service.add_version",
        skip(self, new_version),
        fields(tenant = %ctx.tenant, app_id = %id, version = %new_version.version)
    )]
    pub async fn add_version(
        &self,
        ctx: &SearchCtx,
        id: &str,
        new_version: NewAppVersion,
    ) -> Result<App, DomainError> {
        info!("Adding app version");
        validate_version(&new_version)?;

        // Owner and enabled flag are carried by the identity row.
        let current = self.get_app(ctx, id, None, &BTreeSet::new()).await?;

        if self
            .repo
            .version_exists(&ctx.tenant, id, &new_version.version)
            .await
            .map_err(DomainError::store)?
        {
            return Err(DomainError::version_already_exists(id, new_version.version));
        }

        let app = build_row(ctx, id, &current.owner, current.enabled, new_version);
        let inserted = self
            .repo
            .insert_version(app.clone())
            .await
            .map_err(DomainError::store)?;
        if !inserted {
            return Err(DomainError::app_not_found(id));
        }

        info!("Successfully added app version");
        Ok(app)
    }

    /// Rows of the page plus the keyset continuation, if one is safe.
    ///
    /// With a keyset-capable major key and a bounded window, one extra row is
    /// read. A continuation is only returned when that row's major value
    /// differs from the last row's; otherwise `startAfter` would skip the
    /// rows still tied with it.
    async fn fetch_page(&self, plan: &SearchPlan) -> Result<(Vec<App>, Option<String>), DomainError> {
        let bounded = plan.window().limit.filter(|&n| n > 0);
        let (Some(major), Some(limit)) = (plan.keyset_major(), bounded) else {
            let items = self.repo.search_page(plan).await.map_err(DomainError::store)?;
            return Ok((items, None));
        };

        let mut items = self
            .repo
            .search_page(&plan.with_lookahead())
            .await
            .map_err(DomainError::store)?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        if items.len() <= limit {
            return Ok((items, None));
        }
        let following = items.split_off(limit);

        let last = items.last().and_then(|a| a.attribute_text(major.name));
        let next = following.first().and_then(|a| a.attribute_text(major.name));
        let cursor = match (last, next) {
            (Some(last), Some(next)) if last != next => Some(last),
            _ => {
                debug!(attribute = major.name, "major key ties across the page end, no continuation");
                None
            }
        };
        Ok((items, cursor))
    }

    fn validate_id(&self, id: &str) -> Result<(), DomainError> {
        if id.trim().is_empty() {
            return Err(DomainError::validation("id", "must not be empty"));
        }
        if id.len() > self.config.max_id_length {
            return Err(DomainError::validation(
                "id",
                format!("longer than {} characters", self.config.max_id_length),
            ));
        }
        if id.chars().any(|c| c.is_control() || c.is_whitespace()) {
            return Err(DomainError::validation(
                "id",
                "must not contain whitespace or control characters",
            ));
        }
        Ok(())
    }
}

fn validate_version(v: &NewAppVersion) -> Result<(), DomainError> {
    if v.version.trim().is_empty() {
        return Err(DomainError::validation("version", "must not be empty"));
    }
    if v.max_jobs < 0 || v.max_jobs_per_user < 0 {
        return Err(DomainError::validation(
            "max_jobs",
            "job limits must not be negative",
        ));
    }
    // Tags are stored between unit separators; control characters would
    // break containment matching.
    if let Some(tag) = v
        .tags
        .iter()
        .find(|t| t.is_empty() || t.contains(ARRAY_SEPARATOR) || t.chars().any(char::is_control))
    {
        return Err(DomainError::validation(
            "tags",
            format!("invalid tag {tag:?}"),
        ));
    }
    Ok(())
}

fn build_row(ctx: &SearchCtx, id: &str, owner: &str, enabled: bool, v: NewAppVersion) -> App {
    // Whole seconds keep stored text timestamps ordered like instants.
    let now = Utc::now().trunc_subsecs(0);
    App {
        tenant: ctx.tenant.clone(),
        id: id.to_string(),
        latest_version: v.version.clone(),
        version: v.version,
        owner: owner.to_string(),
        enabled,
        deleted: false,
        description: v.description,
        runtime: v.runtime,
        runtime_version: v.runtime_version,
        job_type: v.job_type,
        max_jobs: v.max_jobs,
        max_jobs_per_user: v.max_jobs_per_user,
        strict_file_inputs: v.strict_file_inputs,
        tags: v.tags,
        uuid: Uuid::new_v4(),
        created: now,
        updated: now,
    }
}
