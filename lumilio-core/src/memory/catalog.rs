//! In-memory [`CatalogLayer`]: a locked `HashMap` standing in for the
//! relational store. Backs the test suite and local runs; never durable.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use lumilio_model::ids::AssetID;
use lumilio_model::metadata::SpecificMetadata;
use lumilio_model::status::AssetStatus;
use lumilio_model::{Asset, EngineError, Result};
use tokio::sync::Mutex;

use crate::ports::{CatalogLayer, Embedding, NewAsset};

#[derive(Default)]
pub struct MemoryCatalog {
    assets: Mutex<HashMap<AssetID, Asset>>,
    embeddings: Mutex<Vec<Embedding>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn embeddings_for(&self, asset_id: AssetID) -> Vec<Embedding> {
        self.embeddings
            .lock()
            .await
            .iter()
            .filter(|e| e.asset_id == asset_id)
            .cloned()
            .collect()
    }
}

fn not_found(id: AssetID) -> EngineError {
    EngineError::NotFound(format!("asset {id} not found"))
}

#[async_trait]
impl CatalogLayer for MemoryCatalog {
    async fn create_asset_record(&self, input: NewAsset) -> Result<Asset> {
        let asset = Asset {
            id: AssetID::new(),
            repository_id: input.repository_id,
            owner_id: input.owner_id,
            kind: input.kind,
            mime_type: input.mime_type,
            hash: input.hash,
            file_size: input.file_size,
            original_filename: input.original_filename,
            upload_time: Utc::now(),
            taken_time: None,
            width: None,
            height: None,
            duration_secs: None,
            specific_metadata: None,
            storage_path: None,
            status: AssetStatus::processing("asset created, awaiting commit"),
        };
        self.assets.lock().await.insert(asset.id, asset.clone());
        Ok(asset)
    }

    async fn get_asset_by_id(&self, id: AssetID) -> Result<Asset> {
        self.assets.lock().await.get(&id).cloned().ok_or_else(|| not_found(id))
    }

    async fn update_asset_storage_path_and_status(
        &self,
        id: AssetID,
        storage_path: String,
        status: AssetStatus,
    ) -> Result<()> {
        let mut assets = self.assets.lock().await;
        let asset = assets.get_mut(&id).ok_or_else(|| not_found(id))?;
        asset.storage_path = Some(storage_path);
        asset.status = status;
        Ok(())
    }

    async fn update_asset_status(&self, id: AssetID, status: AssetStatus) -> Result<()> {
        let mut assets = self.assets.lock().await;
        let asset = assets.get_mut(&id).ok_or_else(|| not_found(id))?;
        asset.status = status;
        Ok(())
    }

    async fn update_asset_metadata(&self, id: AssetID, metadata: SpecificMetadata) -> Result<()> {
        let mut assets = self.assets.lock().await;
        let asset = assets.get_mut(&id).ok_or_else(|| not_found(id))?;
        asset.specific_metadata = Some(metadata);
        Ok(())
    }

    async fn update_asset_dimensions(
        &self,
        id: AssetID,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<()> {
        let mut assets = self.assets.lock().await;
        let asset = assets.get_mut(&id).ok_or_else(|| not_found(id))?;
        asset.width = width;
        asset.height = height;
        Ok(())
    }

    async fn update_asset_duration(&self, id: AssetID, duration_secs: f64) -> Result<()> {
        let mut assets = self.assets.lock().await;
        let asset = assets.get_mut(&id).ok_or_else(|| not_found(id))?;
        asset.duration_secs = Some(duration_secs);
        Ok(())
    }

    async fn save_new_embedding(&self, embedding: Embedding) -> Result<()> {
        self.embeddings.lock().await.push(embedding);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumilio_model::ids::RepoID;
    use lumilio_model::kind::AssetKind;

    fn new_asset_input() -> NewAsset {
        NewAsset {
            repository_id: RepoID::new(),
            owner_id: None,
            kind: AssetKind::Photo,
            mime_type: "image/jpeg".into(),
            hash: "abc123".into(),
            file_size: 1024,
            original_filename: "beach.jpg".into(),
        }
    }

    #[tokio::test]
    async fn create_then_fetch_round_trips() {
        let catalog = MemoryCatalog::new();
        let asset = catalog.create_asset_record(new_asset_input()).await.unwrap();
        let fetched = catalog.get_asset_by_id(asset.id).await.unwrap();
        assert_eq!(fetched.id, asset.id);
        assert_eq!(fetched.hash, "abc123");
    }

    #[tokio::test]
    async fn missing_asset_is_not_found() {
        let catalog = MemoryCatalog::new();
        let err = catalog.get_asset_by_id(AssetID::new()).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn status_update_replaces_phase_and_errors() {
        let catalog = MemoryCatalog::new();
        let asset = catalog.create_asset_record(new_asset_input()).await.unwrap();
        catalog
            .update_asset_status(asset.id, AssetStatus::complete("done"))
            .await
            .unwrap();
        let fetched = catalog.get_asset_by_id(asset.id).await.unwrap();
        assert!(matches!(fetched.status.phase, lumilio_model::Phase::Complete));
    }
}
