//! CRUD scenario run by the driver
//!
//! Each step calls one repository operation and checks the outcome. The
//! first failed check aborts the scenario with a descriptive error.

use anyhow::{ensure, Context, Result};
use circulation_core::bson::doc;
use circulation_core::{CirculationRecord, CirculationRepo, Record, RecordId, ID_FIELD};
use tracing::info;

/// Index of the record used for the filter and lookup checks
const SAMPLE_INDEX: usize = 4;

const LIMIT: i64 = 3;

fn new_item(newspaper: &str) -> CirculationRecord {
    CirculationRecord {
        id: None,
        newspaper: newspaper.to_string(),
        daily_circulation_2004: 1000,
        daily_circulation_2013: 2000,
        change_2004_2013: 67,
        pulitzers_1990_2003: 0,
        pulitzers_2004_2014: 1,
        pulitzers_1990_2014: 2,
    }
}

pub async fn run(repo: &CirculationRepo, records: Vec<Record>) -> Result<()> {
    let expected = records.len();
    ensure!(
        expected > SAMPLE_INDEX,
        "dataset has {} records, need at least {}",
        expected,
        SAMPLE_INDEX + 1
    );

    // Bulk load
    let loaded = repo.load_data(records).await.context("bulk load failed")?;
    ensure!(
        loaded.inserted_count == expected,
        "bulk load inserted {} of {} records",
        loaded.inserted_count,
        expected
    );
    info!(inserted = loaded.inserted_count, "bulk load ok");

    // Everything comes back
    let all = repo.get(None, None).await.context("get all failed")?;
    ensure!(
        all.len() == expected,
        "get returned {} records, expected {}",
        all.len(),
        expected
    );
    info!(count = all.len(), "get all ok");

    // Filter on a unique field value
    let sample = all[SAMPLE_INDEX].clone();
    let newspaper = sample
        .get_str("Newspaper")
        .context("sample record has no Newspaper")?
        .to_string();
    let filtered = repo
        .get(Some(doc! { "Newspaper": newspaper.as_str() }), None)
        .await
        .context("filtered get failed")?;
    ensure!(
        filtered.first() == Some(&sample),
        "filter on Newspaper = {:?} did not return the sample record",
        newspaper
    );
    info!(%newspaper, "filtered get ok");

    // Flat limit
    let limited = repo
        .get(Some(doc! {}), Some(LIMIT))
        .await
        .context("limited get failed")?;
    ensure!(
        limited.len() == LIMIT as usize,
        "limit {} returned {} records",
        LIMIT,
        limited.len()
    );
    info!(limit = LIMIT, "limited get ok");

    // Point lookup
    let sample_id = RecordId::of(&sample)
        .context("sample record has no _id")?
        .to_string();
    let by_id = repo
        .get_by_id(&sample_id)
        .await
        .context("get by id failed")?;
    ensure!(
        by_id.as_ref() == Some(&sample),
        "get_by_id({}) did not return the sample record",
        sample_id
    );
    info!(id = %sample_id, "get by id ok");

    // Insert one
    let item = new_item("New Newspaper Item").to_record()?;
    let id = repo.add(item.clone()).await.context("add failed")?;
    let id_str = id.to_string();
    let added = repo
        .get_by_id(&id_str)
        .await?
        .with_context(|| format!("added record {} not found", id_str))?;
    let mut expected_added = item;
    expected_added.insert(ID_FIELD, id.as_bson().clone());
    ensure!(
        added == expected_added,
        "added record {} does not match what was inserted",
        id_str
    );
    info!(id = %id_str, "add ok");

    // Replace
    let replacement = new_item("Updated Newspaper Item").to_record()?;
    repo.update(&id_str, replacement)
        .await
        .context("update failed")?;
    let updated = repo
        .get_by_id(&id_str)
        .await?
        .with_context(|| format!("updated record {} not found", id_str))?;
    ensure!(
        updated.get_str("Newspaper").ok() == Some("Updated Newspaper Item"),
        "record {} was not replaced",
        id_str
    );
    info!(id = %id_str, "update ok");

    // Delete
    ensure!(
        repo.remove(&id_str).await.context("remove failed")?,
        "remove({}) reported nothing deleted",
        id_str
    );
    ensure!(
        repo.get_by_id(&id_str).await?.is_none(),
        "record {} still present after remove",
        id_str
    );
    ensure!(
        !repo.remove(&id_str).await?,
        "second remove({}) reported a deletion",
        id_str
    );
    info!(id = %id_str, "remove ok");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset;
    use circulation_core::MemoryStore;
    use std::sync::Arc;

    fn repo() -> CirculationRepo {
        CirculationRepo::new(Arc::new(MemoryStore::default()))
    }

    #[tokio::test]
    async fn scenario_passes_on_bundled_dataset() {
        let repo = repo();
        run(&repo, dataset::load(None).unwrap()).await.unwrap();

        // Only the bulk-loaded records remain
        assert_eq!(repo.get(None, None).await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn scenario_rejects_short_dataset() {
        let records = dataset::parse(r#"[{"Newspaper": "A"}, {"Newspaper": "B"}]"#).unwrap();

        let err = run(&repo(), records).await.unwrap_err();
        assert!(err.to_string().contains("need at least 5"));
    }

    #[tokio::test]
    async fn scenario_detects_ambiguous_filter() {
        // Sample newspaper appears twice, the filter's first hit is the other copy
        let records = dataset::parse(
            r#"[{"Newspaper": "Dup", "n": 0}, {"Newspaper": "B"}, {"Newspaper": "C"},
                {"Newspaper": "D"}, {"Newspaper": "Dup", "n": 4}]"#,
        )
        .unwrap();

        let err = run(&repo(), records).await.unwrap_err();
        assert!(err.to_string().contains("did not return the sample record"));
    }
}
