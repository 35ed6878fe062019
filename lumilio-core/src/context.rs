//! Wiring point: every stage function takes an `&EngineContext` rather than
//! threading four separate `Arc`s through each call.

use std::sync::Arc;

use lumilio_model::FeatureFlags;

use crate::ml::MlClient;
use crate::ports::{CatalogLayer, JobProducer, StorageLayer};

#[derive(Clone)]
pub struct EngineContext {
    pub storage: Arc<dyn StorageLayer>,
    pub catalog: Arc<dyn CatalogLayer>,
    pub queue: Arc<dyn JobProducer>,
    pub ml_client: Arc<MlClient>,
    pub feature_flags: FeatureFlags,
}
