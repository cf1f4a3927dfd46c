//! The publish flow: packaged artifacts in, uploaded publications out

use std::sync::Arc;

use tracing::info;

use crate::configs::publishing::PublicationConfig;
use crate::packager::Artifact;
use crate::publication::{generate, generate_grouped, PublicationDescriptor, PublicationRequest};
use crate::resolver::ProjectSpec;
use crate::types::PublicationError;
use crate::upload::{UploadClient, UploadReceipt};

#[derive(Debug, Clone)]
pub struct PublishReport {
    pub descriptors: Vec<PublicationDescriptor>,
    pub receipts: Vec<UploadReceipt>,
}

pub struct Publisher {
    uploader: Arc<dyn UploadClient>,
}

impl Publisher {
    pub fn new(uploader: Arc<dyn UploadClient>) -> Self {
        Self { uploader }
    }

    /// Generate every publication first, then upload them in order. Nothing is
    /// uploaded when there are no artifacts or generation fails.
    pub fn publish(
        &self,
        spec: &ProjectSpec,
        artifacts: &[Artifact],
        publications: Option<&[PublicationConfig]>,
    ) -> Result<PublishReport, PublicationError> {
        if artifacts.is_empty() {
            return Err(PublicationError::NoArtifacts);
        }

        let descriptors = match publications {
            Some(configs) if !configs.is_empty() => {
                let requests: Vec<PublicationRequest> =
                    configs.iter().map(PublicationRequest::from).collect();
                generate_grouped(spec, artifacts, &requests)?
            }
            _ => generate(spec, artifacts)?,
        };

        let mut receipts = Vec::with_capacity(descriptors.len());
        for descriptor in &descriptors {
            info!(
                coordinate = %descriptor.coordinate,
                client = self.uploader.name(),
                artifacts = descriptor.artifacts.len(),
                "uploading publication"
            );
            let receipt = self
                .uploader
                .upload(descriptor)
                .map_err(|source| PublicationError::Upload {
                    coordinate: descriptor.coordinate.to_string(),
                    source,
                })?;
            receipts.push(receipt);
        }

        Ok(PublishReport {
            descriptors,
            receipts,
        })
    }
}
