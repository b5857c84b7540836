#![allow(dead_code)]

use std::sync::Arc;

use apps_catalog::config::AppsCatalogConfig;
use apps_catalog::contract::model::{JobType, NewApp, NewAppVersion, Runtime};
use apps_catalog::domain::service::Service;
use apps_catalog::AppsCatalog;
use modkit_db::{ConnectOpts, DbHandle};
use search_core::SearchCtx;

pub const TENANT: &str = "t1";

pub fn alice() -> SearchCtx {
    SearchCtx::new(TENANT, "alice")
}

pub fn bob() -> SearchCtx {
    SearchCtx::new(TENANT, "bob")
}

pub fn carol_other_tenant() -> SearchCtx {
    SearchCtx::new("t2", "carol")
}

pub struct Catalog {
    pub db: DbHandle,
    pub module: AppsCatalog,
}

impl Catalog {
    pub fn service(&self) -> Arc<Service> {
        self.module.service()
    }
}

/// Fresh in-memory database with migrations applied.
pub async fn empty_catalog() -> Catalog {
    let db = DbHandle::connect("sqlite::memory:", ConnectOpts::single_connection())
        .await
        .expect("Failed to connect to test database");
    let module = AppsCatalog::init(&db, &AppsCatalogConfig::default())
        .await
        .expect("Failed to init catalog");
    Catalog { db, module }
}

pub fn version(v: &str, runtime: Runtime, job_type: JobType, max_jobs: i64, tags: &[&str]) -> NewAppVersion {
    NewAppVersion {
        max_jobs,
        max_jobs_per_user: max_jobs / 2,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        ..NewAppVersion::new(v, runtime, job_type)
    }
}

pub fn new_app(id: &str, v: NewAppVersion) -> NewApp {
    NewApp {
        id: id.to_string(),
        enabled: true,
        version: v,
    }
}

/// Seed data, in insertion order:
///
/// | tenant | owner | id         | version | runtime     | job   | max_jobs | tags      |
/// |--------|-------|------------|---------|-------------|-------|----------|-----------|
/// | t1     | alice | sleep      | 1.0     | DOCKER      | BATCH | 2        | gpu       |
/// | t1     | alice | sleep      | 2.0 (*) | DOCKER      | BATCH | 4        | gpu, mpi  |
/// | t1     | alice | img_proc   | 1 (*)   | SINGULARITY | FORK  | 10       |           |
/// | t1     | bob   | bob.tool   | 1 (*)   | ZIP         | BATCH | 1        | mpi       |
/// | t1     | bob   | shared-one | 1 (*)   | DOCKER      | FORK  | 6        |           |
/// | t2     | carol | sleep      | 1 (*)   | DOCKER      | BATCH | 3        | gpu       |
///
/// (*) latest version. `img_proc` is disabled and described as "image 100% fast".
pub async fn seeded_catalog() -> Catalog {
    let catalog = empty_catalog().await;
    let svc = catalog.service();

    svc.create_app(
        &alice(),
        new_app("sleep", version("1.0", Runtime::Docker, JobType::Batch, 2, &["gpu"])),
    )
    .await
    .expect("seed sleep");
    svc.add_version(
        &alice(),
        "sleep",
        version("2.0", Runtime::Docker, JobType::Batch, 4, &["gpu", "mpi"]),
    )
    .await
    .expect("seed sleep 2.0");

    let mut img = new_app(
        "img_proc",
        version("1", Runtime::Singularity, JobType::Fork, 10, &[]),
    );
    img.enabled = false;
    img.version.description = Some("image 100% fast".into());
    svc.create_app(&alice(), img).await.expect("seed img_proc");

    svc.create_app(
        &bob(),
        new_app("bob.tool", version("1", Runtime::Zip, JobType::Batch, 1, &["mpi"])),
    )
    .await
    .expect("seed bob.tool");
    svc.create_app(
        &bob(),
        new_app("shared-one", version("1", Runtime::Docker, JobType::Fork, 6, &[])),
    )
    .await
    .expect("seed shared-one");

    svc.create_app(
        &carol_other_tenant(),
        new_app("sleep", version("1", Runtime::Docker, JobType::Batch, 3, &["gpu"])),
    )
    .await
    .expect("seed carol sleep");

    catalog
}
