//! Catalog-layer port: the relational store the core mutates. Names here
//! are contracts, not SQL — a concrete Postgres adapter is out of scope for
//! this crate; [`crate::memory::MemoryCatalog`] backs the test suite.

use async_trait::async_trait;
use lumilio_model::ids::{AssetID, OwnerID, RepoID};
use lumilio_model::kind::AssetKind;
use lumilio_model::metadata::SpecificMetadata;
use lumilio_model::status::AssetStatus;
use lumilio_model::{Asset, Result};

/// Input to [`CatalogLayer::create_asset_record`]; the asset id is assigned
/// by the catalog and returned.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub repository_id: RepoID,
    pub owner_id: Option<OwnerID>,
    pub kind: AssetKind,
    pub mime_type: String,
    pub hash: String,
    pub file_size: u64,
    pub original_filename: String,
}

/// Per-asset ML embedding: a feature vector plus the model that produced it.
#[derive(Debug, Clone)]
pub struct Embedding {
    pub asset_id: AssetID,
    pub model: String,
    pub vector: Vec<f32>,
}

#[async_trait]
pub trait CatalogLayer: Send + Sync {
    async fn create_asset_record(&self, input: NewAsset) -> Result<Asset>;

    async fn get_asset_by_id(&self, id: AssetID) -> Result<Asset>;

    async fn update_asset_storage_path_and_status(
        &self,
        id: AssetID,
        storage_path: String,
        status: AssetStatus,
    ) -> Result<()>;

    async fn update_asset_status(&self, id: AssetID, status: AssetStatus) -> Result<()>;

    async fn update_asset_metadata(
        &self,
        id: AssetID,
        metadata: SpecificMetadata,
    ) -> Result<()>;

    async fn update_asset_dimensions(
        &self,
        id: AssetID,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<()>;

    async fn update_asset_duration(&self, id: AssetID, duration_secs: f64) -> Result<()>;

    async fn save_new_embedding(&self, embedding: Embedding) -> Result<()>;
}
