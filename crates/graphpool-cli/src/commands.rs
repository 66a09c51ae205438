//! Command implementations

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use comfy_table::{Table, presets::UTF8_FULL};
use graphpool_connection::{ConnectionPool, PooledConnection};
use graphpool_core::Params;
use graphpool_services::{ClassGraphService, ClassNode};

const PROBE: &str = "RETURN 1";

struct Probe {
    handle: String,
    database: String,
    outcome: Result<Duration, String>,
}

/// Borrow every pooled connection at once and run a trivial query on each
pub async fn check(pool: &ConnectionPool) -> anyhow::Result<()> {
    let size = pool.stats().size();
    let mut held = Vec::with_capacity(size);
    for _ in 0..size {
        held.push(pool.get().await.context("failed to borrow connection")?);
    }

    let probes = futures::future::join_all(held.iter().map(probe)).await;
    drop(held);

    println!("{}", probe_table(&probes));

    let failed = probes.iter().filter(|p| p.outcome.is_err()).count();
    if failed > 0 {
        bail!("{} of {} connections failed the probe", failed, probes.len());
    }
    tracing::info!(connections = probes.len(), "all connections healthy");
    Ok(())
}

async fn probe(conn: &PooledConnection<'_>) -> Probe {
    let started = Instant::now();
    let outcome = async {
        let mut session = conn.session().await?;
        session.run(PROBE, &Params::new()).await?;
        session.commit().await
    }
    .await
    .map(|()| started.elapsed())
    .map_err(|e| e.to_string());

    if let Err(error) = &outcome {
        tracing::warn!(handle = %conn.id(), %error, "connection probe failed");
    }

    Probe {
        handle: conn.id().to_string(),
        database: conn.database().to_string(),
        outcome,
    }
}

fn probe_table(probes: &[Probe]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Handle", "Database", "Status", "Latency"]);

    for probe in probes {
        let (status, latency) = match &probe.outcome {
            Ok(elapsed) => ("ok".to_string(), format!("{} ms", elapsed.as_millis())),
            Err(error) => (format!("failed: {}", error), "-".to_string()),
        };
        table.add_row(vec![probe.handle.clone(), probe.database.clone(), status, latency]);
    }
    table
}

/// Write the classes in `input` into the graph
pub async fn load(pool: Arc<ConnectionPool>, input: &Path, clean: bool) -> anyhow::Result<()> {
    let classes = read_classes(input)?;
    let service = ClassGraphService::new(pool);

    if clean {
        service.clear_graph().await.context("failed to clear graph")?;
    }

    let started = Instant::now();
    let summary = service
        .add_classes(&classes)
        .await
        .context("failed to write classes")?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Classes", "Properties", "Calls", "Elapsed"])
        .add_row(vec![
            summary.classes.to_string(),
            summary.properties.to_string(),
            summary.calls.to_string(),
            format!("{} ms", started.elapsed().as_millis()),
        ]);
    println!("{}", table);

    tracing::info!(
        classes = summary.classes,
        properties = summary.properties,
        calls = summary.calls,
        "load complete"
    );
    Ok(())
}

fn read_classes(path: &Path) -> anyhow::Result<Vec<ClassNode>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let classes: Vec<ClassNode> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of classes", path.display()))?;
    tracing::debug!(path = %path.display(), classes = classes.len(), "classes read");
    Ok(classes)
}
