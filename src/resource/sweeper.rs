//! Sweepers
//!
//! Cleanup of leftover test resources: list each sweepable resource type,
//! keep entries carrying the sweep prefix that are older than the age
//! threshold, delete them, and wait until they are gone before moving on
//! to resource types that depend on them (instances before subnets before
//! VCNs).

use super::registry::Registry;
use super::{instances, network};
use crate::oci::client::{format_oci_error, OciClient};
use crate::oci::http::is_not_found;
use crate::resource::collect_pages;
use anyhow::Result;
use chrono::{DateTime, Utc};

/// Lifecycle states that mean a resource is already gone.
const GONE_STATES: &[&str] = &["TERMINATED", "DELETED"];

/// Lifecycle states the sweeper must not touch: either already gone or a
/// deletion is underway.
const SKIP_STATES: &[&str] = &["TERMINATING", "TERMINATED", "DELETED"];

#[derive(Debug, Clone)]
pub struct SweepOptions {
    /// Display-name prefix marking resources as sweepable leftovers.
    pub prefix: String,
    /// Only resources older than this are deleted, so a concurrently
    /// running test's fresh resources survive the sweep.
    pub min_age: chrono::Duration,
    /// Report what would be deleted without deleting.
    pub dry_run: bool,
    pub wait_attempts: u32,
    pub wait_interval: std::time::Duration,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            prefix: "ociprov-test-".to_string(),
            min_age: chrono::Duration::hours(4),
            dry_run: false,
            wait_attempts: 20,
            wait_interval: std::time::Duration::from_secs(3),
        }
    }
}

/// Outcome of sweeping one resource type.
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub resource: &'static str,
    /// Leftovers that matched prefix and age.
    pub matched: usize,
    pub deleted: usize,
    /// Per-resource failures; a failure never aborts the rest of the sweep.
    pub failures: Vec<String>,
}

/// A resource as the sweeper sees it, independent of type.
#[derive(Debug, Clone)]
struct Candidate {
    id: String,
    display_name: Option<String>,
    time_created: Option<String>,
    state: Option<String>,
}

/// Whether a candidate is a stale leftover.
///
/// Requires the prefix on the display name and a parseable creation time
/// older than the threshold; anything ambiguous is kept, never deleted.
fn is_stale(candidate: &Candidate, opts: &SweepOptions, now: DateTime<Utc>) -> bool {
    if let Some(state) = &candidate.state {
        if SKIP_STATES.contains(&state.as_str()) {
            return false;
        }
    }

    let Some(name) = &candidate.display_name else {
        return false;
    };
    if !name.starts_with(&opts.prefix) {
        return false;
    }

    let Some(created) = candidate
        .time_created
        .as_deref()
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
    else {
        return false;
    };

    now.signed_duration_since(created.with_timezone(&Utc)) >= opts.min_age
}

async fn list_candidates(
    client: &OciClient,
    key: &str,
    compartment: &str,
) -> Result<Vec<Candidate>> {
    match key {
        "core_instances" => {
            let records =
                collect_pages(|page| instances::list_instances_page(client, compartment, page))
                    .await?;
            Ok(records
                .into_iter()
                .map(|i| Candidate {
                    id: i.id,
                    display_name: i.display_name,
                    time_created: i.time_created,
                    state: i.lifecycle_state,
                })
                .collect())
        }
        "core_subnets" => {
            let records =
                collect_pages(|page| network::list_subnets_page(client, compartment, page))
                    .await?;
            Ok(records
                .into_iter()
                .map(|s| Candidate {
                    id: s.id,
                    display_name: s.display_name,
                    time_created: s.time_created,
                    state: s.lifecycle_state,
                })
                .collect())
        }
        "core_vcns" => {
            let records =
                collect_pages(|page| network::list_vcns_page(client, compartment, page)).await?;
            Ok(records
                .into_iter()
                .map(|v| Candidate {
                    id: v.id,
                    display_name: v.display_name,
                    time_created: v.time_created,
                    state: v.lifecycle_state,
                })
                .collect())
        }
        _ => Err(anyhow::anyhow!("Resource {} has no sweeper", key)),
    }
}

async fn delete_candidate(client: &OciClient, key: &str, id: &str) -> Result<()> {
    match key {
        "core_instances" => instances::terminate_instance(client, id).await,
        "core_subnets" => network::delete_subnet(client, id).await,
        "core_vcns" => network::delete_vcn(client, id).await,
        _ => Err(anyhow::anyhow!("Resource {} has no sweeper", key)),
    }
}

/// Check whether a deleted resource is gone. A 404 means it is; a record in
/// a terminal lifecycle state counts too.
async fn is_gone(client: &OciClient, key: &str, id: &str) -> Result<bool> {
    let state = match key {
        "core_instances" => match instances::get_instance(client, id).await {
            Ok(instance) => instance.lifecycle_state,
            Err(err) if is_not_found(&err) => return Ok(true),
            Err(err) => return Err(err),
        },
        "core_subnets" => match network::get_subnet(client, id).await {
            Ok(subnet) => subnet.lifecycle_state,
            Err(err) if is_not_found(&err) => return Ok(true),
            Err(err) => return Err(err),
        },
        "core_vcns" => match network::get_vcn(client, id).await {
            Ok(vcn) => vcn.lifecycle_state,
            Err(err) if is_not_found(&err) => return Ok(true),
            Err(err) => return Err(err),
        },
        _ => return Err(anyhow::anyhow!("Resource {} has no sweeper", key)),
    };

    Ok(state
        .map(|s| GONE_STATES.contains(&s.as_str()))
        .unwrap_or(false))
}

async fn wait_until_gone(
    client: &OciClient,
    key: &str,
    id: &str,
    opts: &SweepOptions,
) -> Result<()> {
    for attempt in 0..opts.wait_attempts {
        if is_gone(client, key, id).await? {
            return Ok(());
        }
        tracing::debug!(
            "{} {} still present (attempt {}/{})",
            key,
            id,
            attempt + 1,
            opts.wait_attempts
        );
        tokio::time::sleep(opts.wait_interval).await;
    }
    Err(anyhow::anyhow!(
        "{} {} did not reach a terminal state after {} attempts",
        key,
        id,
        opts.wait_attempts
    ))
}

/// Sweep every sweepable resource type in dependency order.
///
/// Failures are collected per resource and reported; the sweep continues
/// so a stuck instance doesn't leave every VCN behind as well.
pub async fn sweep_all(
    client: &OciClient,
    registry: &Registry,
    compartment: &str,
    opts: &SweepOptions,
) -> Result<Vec<SweepReport>> {
    let order = registry.sweep_order()?;
    let now = Utc::now();
    let mut reports = Vec::with_capacity(order.len());

    for key in order {
        let mut report = SweepReport {
            resource: key,
            matched: 0,
            deleted: 0,
            failures: Vec::new(),
        };

        let candidates = match list_candidates(client, key, compartment).await {
            Ok(candidates) => candidates,
            Err(err) => {
                tracing::warn!("Failed to list {} for sweeping: {}", key, err);
                report.failures.push(format_oci_error(&err));
                reports.push(report);
                continue;
            }
        };

        let stale: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| is_stale(c, opts, now))
            .collect();
        report.matched = stale.len();

        for candidate in stale {
            if opts.dry_run {
                tracing::info!("Would delete {} {}", key, candidate.id);
                continue;
            }

            tracing::info!("Deleting {} {}", key, candidate.id);
            let outcome = match delete_candidate(client, key, &candidate.id).await {
                Ok(()) => wait_until_gone(client, key, &candidate.id, opts).await,
                Err(err) => Err(err),
            };
            match outcome {
                Ok(()) => report.deleted += 1,
                Err(err) => {
                    tracing::warn!("Failed to delete {} {}: {}", key, candidate.id, err);
                    report.failures.push(format!(
                        "{}: {}",
                        candidate.id,
                        format_oci_error(&err)
                    ));
                }
            }
        }

        reports.push(report);
    }

    Ok(reports)
}
