//! The upload-then-register workflow
//!
//! A strictly sequential state machine: idle, uploading-image,
//! uploading-metadata, resolving-license, registering, then success or
//! error. Each state's entry action is one remote call, and the status is
//! published before the call starts so an observer sees work in progress,
//! not just terminal outcomes. A failed step carries its error into the
//! terminal state; later steps never run.

use crate::error::{RegistrarError, Result};
use crate::metadata::AssetMetadata;
use crate::record::RegistrationRecord;
use parking_lot::Mutex;
use pinata::Pinning;
use std::sync::Arc;
use story::{Address, IpGateway, LicenseTermsRequest, U256};
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Observable submission status, one value per workflow invocation
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowStatus {
    Idle,
    UploadingImage,
    UploadingMetadata,
    ResolvingLicense,
    Registering,
    Succeeded,
    Failed { step: &'static str, message: String },
}

impl WorkflowStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::UploadingImage => "uploading-image",
            Self::UploadingMetadata => "uploading-metadata",
            Self::ResolvingLicense => "resolving-license",
            Self::Registering => "registering",
            Self::Succeeded => "success",
            Self::Failed { .. } => "error",
        }
    }
}

/// Raw image bytes picked by the user
#[derive(Debug, Clone)]
pub struct ImageData {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: String,
}

/// One derivative work to register
#[derive(Debug, Clone)]
pub struct DerivativeSubmission {
    pub name: String,
    pub description: String,
    /// Parent IP asset this work derives from
    pub parent_asset: Address,
    /// Discovery-sourced posts carry no image; the image step is skipped
    pub image: Option<ImageData>,
    /// A license token already held by the submitter; when present the
    /// mint call is skipped entirely
    pub existing_license_token: Option<U256>,
    /// Timeline post this submission came from, if any
    pub source_post_id: Option<String>,
}

/// Per-deployment knobs the workflow needs beyond the submission itself
#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    /// Chain ID passed to the asset registry
    pub chain_id: u64,
    /// NFT contract the registration references
    pub token_contract: Address,
    /// Receiver of freshly minted license tokens (the operator wallet)
    pub receiver: Address,
    /// Terms registered during setup; fresh terms are registered when absent
    pub license_terms_id: Option<U256>,
    /// Revenue share percent for freshly registered terms
    pub rev_share_percent: u32,
    pub royalty_policy: Address,
    pub currency_token: Address,
}

/// One registration run over injected pinning and gateway clients
pub struct Workflow<P, G> {
    pinning: Arc<P>,
    gateway: Arc<G>,
    options: WorkflowOptions,
    status_tx: watch::Sender<WorkflowStatus>,
    history: Mutex<Vec<WorkflowStatus>>,
}

impl<P: Pinning, G: IpGateway> Workflow<P, G> {
    pub fn new(pinning: Arc<P>, gateway: Arc<G>, options: WorkflowOptions) -> Self {
        let (status_tx, _) = watch::channel(WorkflowStatus::Idle);
        Self {
            pinning,
            gateway,
            options,
            status_tx,
            history: Mutex::new(vec![WorkflowStatus::Idle]),
        }
    }

    /// Subscribe to status transitions
    pub fn status(&self) -> watch::Receiver<WorkflowStatus> {
        self.status_tx.subscribe()
    }

    /// Every status this run has visited, in order
    pub fn history(&self) -> Vec<WorkflowStatus> {
        self.history.lock().clone()
    }

    fn set_status(&self, status: WorkflowStatus) {
        info!("Workflow status: {}", status.label());
        self.history.lock().push(status.clone());
        let _ = self.status_tx.send(status);
    }

    fn fail(&self, step: &'static str, err: impl Into<RegistrarError>) -> RegistrarError {
        let err = err.into();
        error!("Workflow step {} failed: {}", step, err);
        self.set_status(WorkflowStatus::Failed {
            step,
            message: err.to_string(),
        });
        err
    }

    fn validate(&self, submission: &DerivativeSubmission) -> Result<()> {
        if submission.name.trim().is_empty() {
            return Err(RegistrarError::Validation("name must not be empty".to_string()));
        }
        if submission.description.trim().is_empty() {
            return Err(RegistrarError::Validation(
                "description must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn run(&self, submission: DerivativeSubmission) -> Result<RegistrationRecord> {
        self.validate(&submission)
            .map_err(|e| self.fail("validation", e))?;

        // Step 1: pin the image, when there is one
        let image_uri = match submission.image {
            Some(ref image) => {
                self.set_status(WorkflowStatus::UploadingImage);
                let uri = self
                    .pinning
                    .pin_file(image.bytes.clone(), &image.filename, &image.content_type)
                    .await
                    .map_err(|e| self.fail("uploading-image", e))?;
                Some(uri)
            }
            None => None,
        };

        // Step 2: pin the metadata document
        self.set_status(WorkflowStatus::UploadingMetadata);
        let metadata = AssetMetadata::for_submission(&submission, image_uri.clone());
        let metadata_value = metadata
            .to_value()
            .map_err(|e| self.fail("uploading-metadata", e))?;
        let metadata_uri = self
            .pinning
            .pin_json(metadata_value, &submission.name)
            .await
            .map_err(|e| self.fail("uploading-metadata", e))?;

        // Step 3: resolve a license token, minting only when the caller
        // does not already hold one
        self.set_status(WorkflowStatus::ResolvingLicense);
        let license_token = match submission.existing_license_token {
            Some(token) => {
                debug!("Reusing existing license token {}", token);
                token
            }
            None => self
                .mint_fresh_license(submission.parent_asset)
                .await
                .map_err(|e| self.fail("resolving-license", e))?,
        };

        // Step 4: register the asset, then the derivative relationship
        self.set_status(WorkflowStatus::Registering);
        let token_id = U256::from_be_bytes(rand::random::<[u8; 32]>());
        let asset_id = self
            .gateway
            .register_asset(self.options.chain_id, self.options.token_contract, token_id)
            .await
            .map_err(|e| self.fail("registering", e))?;
        self.gateway
            .register_derivative(asset_id, &[license_token])
            .await
            .map_err(|e| self.fail("registering", e))?;

        self.set_status(WorkflowStatus::Succeeded);
        info!(
            "Derivative {} registered under parent {}",
            asset_id, submission.parent_asset
        );

        Ok(RegistrationRecord {
            token_contract: self.options.token_contract.to_string(),
            token_id: token_id.to_string(),
            asset_id: asset_id.to_string(),
            parent_asset: submission.parent_asset.to_string(),
            license_token: license_token.to_string(),
            metadata_uri,
            image_uri,
        })
    }

    /// Register terms if setup didn't, attach them (already-attached is
    /// success), then mint one token against the parent
    async fn mint_fresh_license(&self, parent: Address) -> Result<U256> {
        let terms_id = match self.options.license_terms_id {
            Some(id) => id,
            None => {
                let terms = LicenseTermsRequest::commercial_remix(
                    self.options.rev_share_percent,
                    self.options.royalty_policy,
                    self.options.currency_token,
                );
                self.gateway.register_license_terms(terms).await?
            }
        };

        self.gateway
            .attach_license_terms(parent, terms_id)
            .await?;

        let token = self
            .gateway
            .mint_license(parent, terms_id, self.options.receiver)
            .await?;
        Ok(token)
    }
}
