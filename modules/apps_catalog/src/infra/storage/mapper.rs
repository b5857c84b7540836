use anyhow::{anyhow, Result};
use search_core::literal::decode_string_array;

use crate::contract::model::App;
use crate::infra::storage::entity::{app, app_version};

/// Join one version row with its identity row.
pub fn rows_to_contract(version: app_version::Model, identity: app::Model) -> Result<App> {
    let runtime = version.runtime.parse().map_err(|e: String| anyhow!(e))?;
    let job_type = version.job_type.parse().map_err(|e: String| anyhow!(e))?;
    Ok(App {
        tenant: identity.tenant,
        id: identity.id,
        version: version.version,
        latest_version: identity.latest_version,
        owner: identity.owner,
        enabled: identity.enabled,
        deleted: identity.deleted,
        description: version.description,
        runtime,
        runtime_version: version.runtime_version,
        job_type,
        max_jobs: version.max_jobs,
        max_jobs_per_user: version.max_jobs_per_user,
        strict_file_inputs: version.strict_file_inputs,
        tags: decode_string_array(&version.tags),
        uuid: version.uuid,
        created: version.created,
        updated: version.updated,
    })
}
