//! Asset metadata documents pinned alongside each derivative work
//!
//! The document is immutable once pinned; it is identified by the content
//! address the pinning service returns and is never read back.

use crate::workflow::DerivativeSubmission;
use chrono::Utc;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct AssetMetadata {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub attributes: AssetAttributes,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetAttributes {
    /// Back-reference to the parent this work derives from
    pub parent_ip_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_token_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_post_id: Option<String>,
    pub created_at: String,
}

impl AssetMetadata {
    /// Build the metadata document for a submission whose image (if any)
    /// has already been pinned
    pub fn for_submission(submission: &DerivativeSubmission, image_uri: Option<String>) -> Self {
        Self {
            name: submission.name.clone(),
            description: submission.description.clone(),
            image: image_uri,
            attributes: AssetAttributes {
                parent_ip_id: submission.parent_asset.to_string(),
                license_token_id: submission
                    .existing_license_token
                    .map(|token| token.to_string()),
                source_post_id: submission.source_post_id.clone(),
                created_at: Utc::now().to_rfc3339(),
            },
        }
    }

    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use story::{Address, U256};

    fn submission() -> DerivativeSubmission {
        DerivativeSubmission {
            name: "To Da Moon, fan creation".to_string(),
            description: "Pixel art inspired by Ava".to_string(),
            parent_asset: Address::ZERO,
            image: None,
            existing_license_token: None,
            source_post_id: None,
        }
    }

    #[test]
    fn test_metadata_includes_parent_reference() {
        let metadata =
            AssetMetadata::for_submission(&submission(), Some("ipfs://QmImg".to_string()));
        let value = metadata.to_value().unwrap();

        assert_eq!(value["name"], "To Da Moon, fan creation");
        assert_eq!(value["image"], "ipfs://QmImg");
        assert_eq!(value["attributes"]["parent_ip_id"], Address::ZERO.to_string());
        assert!(value["attributes"].get("license_token_id").is_none());
    }

    #[test]
    fn test_metadata_omits_absent_image() {
        let metadata = AssetMetadata::for_submission(&submission(), None);
        let value = metadata.to_value().unwrap();
        assert!(value.get("image").is_none());
    }

    #[test]
    fn test_metadata_carries_license_and_post() {
        let mut sub = submission();
        sub.existing_license_token = Some(U256::from(7));
        sub.source_post_id = Some("1890".to_string());

        let value = AssetMetadata::for_submission(&sub, None).to_value().unwrap();
        assert_eq!(value["attributes"]["license_token_id"], "7");
        assert_eq!(value["attributes"]["source_post_id"], "1890");
    }
}
