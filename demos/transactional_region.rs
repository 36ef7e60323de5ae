//! Demonstrates regions and units of work
//!
//! This example shows how to:
//! - Load region settings from JSON and build the registry
//! - Read through a region inside a unit of work, filling misses
//! - Commit one unit of work and roll back another
//!
//! Usage:
//!   RUST_LOG=ouroboros_cache=debug cargo run --example transactional_region

use ouroboros_cache::decorators::LoggingCache;
use ouroboros_cache::{
    Cache, CacheKey, CacheSettings, CacheValue, RegionRegistry, RowBounds,
    TransactionalCacheManager, Value,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SETTINGS: &str = r#"{
    "regions": [
        { "id": "users", "eviction": "lru", "size": 128, "blocking": true, "lock_timeout_ms": 1000 },
        { "id": "orders", "eviction": "fifo", "size": 64, "read_only": false }
    ],
    "references": [
        { "namespace": "admin", "target": "users" }
    ]
}"#;

fn select_user(id: i64) -> CacheKey {
    CacheKey::for_statement(
        "users.select_by_id",
        RowBounds::default(),
        "select * from users where id = ?",
        &[Value::Int(id)],
        Some("development"),
    )
}

/// Stand-in for the database round trip a miss would cost
fn load_user(id: i64) -> CacheValue {
    CacheValue::object(vec![Value::Int(id), Value::from(format!("user-{}", id))])
}

fn run_unit_of_work(region: &Arc<dyn Cache>, ids: &[i64], commit: bool) -> anyhow::Result<()> {
    let mut tcm = TransactionalCacheManager::new();
    for &id in ids {
        let key = select_user(id);
        if tcm.get(region, &key)?.is_none() {
            tcm.put(region, key, Some(load_user(id)));
        }
    }

    if commit {
        tcm.commit()?;
        info!(unit_of_work = %tcm.id(), "Committed");
    } else {
        tcm.rollback();
        info!(unit_of_work = %tcm.id(), "Rolled back");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "ouroboros_cache=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = CacheSettings::from_json_str(SETTINGS)?;
    let registry = RegionRegistry::build(&settings)?;
    info!(regions = ?registry.region_ids(), "Registry ready");

    let admin = registry
        .get("admin")
        .ok_or_else(|| anyhow::anyhow!("namespace 'admin' is not configured"))?;
    let logged = Arc::new(LoggingCache::new(admin));
    let region: Arc<dyn Cache> = logged.clone();

    run_unit_of_work(&region, &[1, 2, 3], true)?;
    run_unit_of_work(&region, &[2, 3, 4], false)?;
    run_unit_of_work(&region, &[1, 4], true)?;

    println!("Region '{}' holds {} entries", region.id(), region.size()?);
    println!(
        "Hit ratio: {:.2} ({} of {} reads)",
        logged.hit_ratio(),
        logged.hits(),
        logged.requests()
    );
    Ok(())
}
