pub mod client;

pub use client::{FaceRegion, MlClient, MlClientError};
