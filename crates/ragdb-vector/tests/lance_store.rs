use std::sync::Arc;

use ragdb_core::config::StoreSettings;
use ragdb_core::traits::VectorStore;
use ragdb_core::types::{Chunk, ChunkMetadata};
use ragdb_embed::HashEmbedder;
use ragdb_vector::LanceVectorStore;

const DIM: usize = 256;

fn contract_chunks() -> Vec<Chunk> {
    let meta = |section: &str| ChunkMetadata {
        filename: Some("msa.pdf".to_string()),
        section_number: Some(section.to_string()),
        extraction_method: Some("text".to_string()),
        ..ChunkMetadata::default()
    };
    vec![
        Chunk::new("msa:0", "3.2 Objectives of the services").with_metadata(meta("3.2")),
        Chunk::new("msa:1", "Payment is due within thirty days of invoice").with_metadata(meta("5.1")),
        Chunk::new("msa:2", "Either party may terminate for material breach"),
    ]
}

#[test]
fn lance_store_full_flow() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let settings = StoreSettings::default();
    let store = LanceVectorStore::open(tmp.path(), &settings, Box::new(HashEmbedder::new(DIM)))?;

    assert_eq!(store.count()?, 0);
    assert!(store.query("objectives", 5)?.is_empty(), "empty table yields no hits");

    store.add(&contract_chunks())?;
    // re-adding an existing id is ignored
    store.add(&[Chunk::new("msa:0", "overwritten?")])?;
    assert_eq!(store.count()?, 3);

    let got = store.get(Some(&["msa:0".to_string()]), None)?;
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].text, "3.2 Objectives of the services");
    assert_eq!(got[0].metadata.section_number.as_deref(), Some("3.2"));
    assert_eq!(got[0].metadata.section_title, None);

    let hits = store.query("Payment is due within thirty days of invoice", 2)?;
    assert_eq!(hits[0].chunk.id, "msa:1");
    assert!(hits.iter().all(|h| h.distance >= 0.0));

    let mut updated = got[0].clone();
    updated.metadata.section_title = Some("Objectives".to_string());
    store.update(&[updated])?;
    let got = store.get(Some(&["msa:0".to_string()]), None)?;
    assert_eq!(got[0].metadata.section_title.as_deref(), Some("Objectives"));

    store.delete(&["msa:2".to_string()])?;
    assert_eq!(store.count()?, 2);
    assert_eq!(store.get(None, Some(1))?.len(), 1);

    store.close();
    Ok(())
}

#[test]
fn reopening_with_different_dimension_fails() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let settings = StoreSettings::default();
    LanceVectorStore::open(tmp.path(), &settings, Box::new(HashEmbedder::new(DIM)))?.close();

    let reopened = LanceVectorStore::open(tmp.path(), &settings, Box::new(HashEmbedder::new(DIM)))?;
    reopened.close();

    assert!(LanceVectorStore::open(tmp.path(), &settings, Box::new(HashEmbedder::new(DIM * 2))).is_err());
    Ok(())
}

#[test]
fn shared_store_is_recovered_and_closed() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let settings = StoreSettings::default();
    let store = Arc::new(LanceVectorStore::open(tmp.path(), &settings, Box::new(HashEmbedder::new(DIM)))?);
    let shared: Arc<dyn VectorStore> = store.clone();
    shared.add(&contract_chunks())?;
    assert_eq!(shared.query("material breach", 1)?[0].chunk.id, "msa:2");
    drop(shared);

    let store = Arc::try_unwrap(store).map_err(|_| anyhow::anyhow!("store still shared"))?;
    store.close();

    let reopened = LanceVectorStore::open(tmp.path(), &settings, Box::new(HashEmbedder::new(DIM)))?;
    assert_eq!(reopened.count()?, 3);
    reopened.close();
    Ok(())
}
