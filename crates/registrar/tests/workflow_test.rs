//! End-to-end workflow and discovery tests against in-memory fakes

use async_trait::async_trait;
use parking_lot::Mutex;
use pinata::Pinning;
use registrar::asset_lock::AssetLockManager;
use registrar::discovery::{DiscoveryJob, DiscoverySettings};
use registrar::processed::ProcessedPostsStore;
use registrar::workflow::{
    DerivativeSubmission, ImageData, Workflow, WorkflowOptions, WorkflowStatus,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use story::{Address, IpGateway, LicenseTermsRequest, U256};
use timeline::{Post, Timeline};

#[derive(Default)]
struct FakePinning {
    calls: Mutex<Vec<String>>,
    json_payloads: Mutex<Vec<Value>>,
    fail_file: bool,
}

#[async_trait]
impl Pinning for FakePinning {
    async fn pin_file(
        &self,
        _data: Vec<u8>,
        filename: &str,
        _content_type: &str,
    ) -> pinata::Result<String> {
        if self.fail_file {
            return Err(pinata::PinningError::Upstream {
                status: 500,
                message: "pin failed".to_string(),
            });
        }
        self.calls.lock().push(format!("pin_file:{filename}"));
        Ok(format!("ipfs://file-{filename}"))
    }

    async fn pin_json(&self, content: Value, name: &str) -> pinata::Result<String> {
        self.calls.lock().push(format!("pin_json:{name}"));
        self.json_payloads.lock().push(content);
        Ok(format!("ipfs://meta-{name}"))
    }
}

#[derive(Default)]
struct FakeGateway {
    calls: Mutex<Vec<String>>,
    registered: Mutex<u8>,
}

#[async_trait]
impl IpGateway for FakeGateway {
    async fn register_asset(
        &self,
        _chain_id: u64,
        _token_contract: Address,
        _token_id: U256,
    ) -> story::Result<Address> {
        let mut count = self.registered.lock();
        *count += 1;
        let asset = Address::repeat_byte(*count);
        self.calls.lock().push(format!("register_asset:{asset}"));
        Ok(asset)
    }

    async fn asset_id(
        &self,
        _chain_id: u64,
        _token_contract: Address,
        token_id: U256,
    ) -> story::Result<Address> {
        // A pure function of its inputs, like the on-chain view
        let bytes = token_id.to_be_bytes::<32>();
        Ok(Address::repeat_byte(bytes[31]))
    }

    async fn register_license_terms(&self, terms: LicenseTermsRequest) -> story::Result<U256> {
        self.calls
            .lock()
            .push(format!("register_terms:{}", terms.commercial_rev_share));
        Ok(U256::from(42))
    }

    async fn attach_license_terms(&self, asset: Address, terms_id: U256) -> story::Result<()> {
        self.calls.lock().push(format!("attach:{asset}:{terms_id}"));
        Ok(())
    }

    async fn mint_license(
        &self,
        licensor: Address,
        terms_id: U256,
        _receiver: Address,
    ) -> story::Result<U256> {
        self.calls.lock().push(format!("mint:{licensor}:{terms_id}"));
        Ok(U256::from(7))
    }

    async fn register_derivative(&self, child: Address, tokens: &[U256]) -> story::Result<()> {
        self.calls
            .lock()
            .push(format!("derivative:{child}:{:?}", tokens));
        Ok(())
    }
}

struct FakeTimeline {
    posts: Vec<Post>,
}

#[async_trait]
impl Timeline for FakeTimeline {
    async fn user_id_by_handle(&self, _handle: &str) -> timeline::Result<String> {
        Ok("12345".to_string())
    }

    async fn recent_posts(&self, _user_id: &str, _max: u32) -> timeline::Result<Vec<Post>> {
        Ok(self.posts.clone())
    }
}

fn options() -> WorkflowOptions {
    WorkflowOptions {
        chain_id: 1315,
        token_contract: Address::repeat_byte(0x01),
        receiver: Address::repeat_byte(0x02),
        license_terms_id: None,
        rev_share_percent: 10,
        royalty_policy: Address::repeat_byte(0x03),
        currency_token: Address::repeat_byte(0x04),
    }
}

fn parent() -> Address {
    Address::repeat_byte(0x99)
}

fn submission(image: Option<ImageData>) -> DerivativeSubmission {
    DerivativeSubmission {
        name: "Fan Art".to_string(),
        description: "A derivative work".to_string(),
        parent_asset: parent(),
        image,
        existing_license_token: None,
        source_post_id: None,
    }
}

fn png() -> ImageData {
    ImageData {
        bytes: vec![0x89, 0x50, 0x4e, 0x47],
        filename: "art.png".to_string(),
        content_type: "image/png".to_string(),
    }
}

#[tokio::test]
async fn test_workflow_visits_stages_in_order() {
    let pinning = Arc::new(FakePinning::default());
    let gateway = Arc::new(FakeGateway::default());
    let workflow = Workflow::new(pinning.clone(), gateway.clone(), options());

    let record = workflow.run(submission(Some(png()))).await.unwrap();

    let labels: Vec<&str> = workflow.history().iter().map(|s| s.label()).collect();
    assert_eq!(
        labels,
        vec![
            "idle",
            "uploading-image",
            "uploading-metadata",
            "resolving-license",
            "registering",
            "success"
        ]
    );
    assert_eq!(record.metadata_uri, "ipfs://meta-Fan Art");
    assert_eq!(record.image_uri.as_deref(), Some("ipfs://file-art.png"));
    assert_eq!(record.license_token, "7");
}

#[tokio::test]
async fn test_fresh_license_registers_attaches_then_mints() {
    let pinning = Arc::new(FakePinning::default());
    let gateway = Arc::new(FakeGateway::default());
    let workflow = Workflow::new(pinning, gateway.clone(), options());

    workflow.run(submission(None)).await.unwrap();

    let calls = gateway.calls.lock().clone();
    assert_eq!(calls[0], "register_terms:10000000");
    assert_eq!(calls[1], format!("attach:{}:42", parent()));
    assert_eq!(calls[2], format!("mint:{}:42", parent()));
    assert!(calls[3].starts_with("register_asset:"));
    assert!(calls[4].starts_with("derivative:"));
    assert_eq!(calls.len(), 5);
}

#[tokio::test]
async fn test_preconfigured_terms_skip_registration() {
    let pinning = Arc::new(FakePinning::default());
    let gateway = Arc::new(FakeGateway::default());
    let opts = WorkflowOptions {
        license_terms_id: Some(U256::from(5)),
        ..options()
    };
    let workflow = Workflow::new(pinning, gateway.clone(), opts);

    workflow.run(submission(None)).await.unwrap();

    let calls = gateway.calls.lock().clone();
    assert_eq!(calls[0], format!("attach:{}:5", parent()));
    assert_eq!(calls[1], format!("mint:{}:5", parent()));
    assert!(!calls.iter().any(|c| c.starts_with("register_terms")));
}

#[tokio::test]
async fn test_existing_license_token_skips_minting() {
    let pinning = Arc::new(FakePinning::default());
    let gateway = Arc::new(FakeGateway::default());
    let workflow = Workflow::new(pinning, gateway.clone(), options());

    let mut sub = submission(None);
    sub.existing_license_token = Some(U256::from(99));
    let record = workflow.run(sub).await.unwrap();

    let calls = gateway.calls.lock().clone();
    assert!(!calls.iter().any(|c| c.starts_with("mint")));
    assert!(!calls.iter().any(|c| c.starts_with("attach")));
    assert!(calls.iter().any(|c| c.contains("[99]")));
    assert_eq!(record.license_token, "99");
}

#[tokio::test]
async fn test_image_failure_stops_before_any_chain_call() {
    let pinning = Arc::new(FakePinning {
        fail_file: true,
        ..FakePinning::default()
    });
    let gateway = Arc::new(FakeGateway::default());
    let workflow = Workflow::new(pinning.clone(), gateway.clone(), options());

    let err = workflow.run(submission(Some(png()))).await.unwrap_err();
    assert!(err.to_string().contains("pin failed"));

    assert!(gateway.calls.lock().is_empty());
    assert!(pinning.calls.lock().is_empty());
    match workflow.history().last() {
        Some(WorkflowStatus::Failed { step, .. }) => assert_eq!(*step, "uploading-image"),
        other => panic!("expected failed status, got {other:?}"),
    }
}

#[tokio::test]
async fn test_asset_id_lookup_is_idempotent() {
    let gateway = FakeGateway::default();
    let contract = Address::repeat_byte(0x01);

    let first = gateway.asset_id(1315, contract, U256::from(7)).await.unwrap();
    let second = gateway.asset_id(1315, contract, U256::from(7)).await.unwrap();
    assert_eq!(first, second);

    let other = gateway.asset_id(1315, contract, U256::from(8)).await.unwrap();
    assert_ne!(first, other);
}

#[tokio::test]
async fn test_empty_name_is_rejected_without_side_effects() {
    let pinning = Arc::new(FakePinning::default());
    let gateway = Arc::new(FakeGateway::default());
    let workflow = Workflow::new(pinning.clone(), gateway.clone(), options());

    let mut sub = submission(None);
    sub.name = "   ".to_string();
    assert!(workflow.run(sub).await.is_err());
    assert!(pinning.calls.lock().is_empty());
    assert!(gateway.calls.lock().is_empty());
}

fn discovery_posts() -> Vec<Post> {
    vec![
        Post {
            id: "1".to_string(),
            text: "gm everyone".to_string(),
            created_at: None,
        },
        Post {
            id: "2".to_string(),
            text: "New DeFi analysis dropping soon".to_string(),
            created_at: None,
        },
        Post {
            id: "3".to_string(),
            text: "lunch break".to_string(),
            created_at: None,
        },
        Post {
            id: "4".to_string(),
            text: "the crypto market looks wild".to_string(),
            created_at: None,
        },
        Post {
            id: "5".to_string(),
            text: "weekend plans".to_string(),
            created_at: None,
        },
    ]
}

fn discovery_settings() -> DiscoverySettings {
    DiscoverySettings {
        username: "markets_feed".to_string(),
        parent_asset: parent(),
        keywords: ["defi", "trading", "market", "analysis", "crypto"]
            .iter()
            .map(|k| k.to_string())
            .collect(),
        interval: Duration::from_secs(900),
        max_results: 10,
    }
}

#[tokio::test]
async fn test_discovery_registers_only_matching_posts() {
    let dir = tempfile::tempdir().unwrap();
    let store = ProcessedPostsStore::load(dir.path().join("processed.json")).unwrap();

    let pinning = Arc::new(FakePinning::default());
    let gateway = Arc::new(FakeGateway::default());
    let timeline = Arc::new(FakeTimeline {
        posts: discovery_posts(),
    });

    let job = DiscoveryJob::new(
        timeline,
        pinning.clone(),
        gateway.clone(),
        options(),
        discovery_settings(),
        store,
        AssetLockManager::new(Duration::from_secs(600)),
    );

    let registered = job.tick().await.unwrap();
    assert_eq!(registered, 2);

    // Each matching post's text lands in the pinned metadata
    let payloads = pinning.json_payloads.lock().clone();
    assert_eq!(payloads.len(), 2);
    let descriptions: Vec<&str> = payloads
        .iter()
        .filter_map(|v| v["description"].as_str())
        .collect();
    assert!(descriptions.contains(&"New DeFi analysis dropping soon"));
    assert!(descriptions.contains(&"the crypto market looks wild"));

    let derivatives = gateway
        .calls
        .lock()
        .iter()
        .filter(|c| c.starts_with("derivative"))
        .count();
    assert_eq!(derivatives, 2);
}

#[tokio::test]
async fn test_discovery_defers_when_parent_is_locked() {
    let dir = tempfile::tempdir().unwrap();
    let store = ProcessedPostsStore::load(dir.path().join("processed.json")).unwrap();

    let gateway = Arc::new(FakeGateway::default());
    let locks = AssetLockManager::new(Duration::from_secs(600));
    let _held = locks.try_lock(parent()).unwrap();

    let job = DiscoveryJob::new(
        Arc::new(FakeTimeline {
            posts: discovery_posts(),
        }),
        Arc::new(FakePinning::default()),
        gateway.clone(),
        options(),
        discovery_settings(),
        store,
        locks.clone(),
    );

    // Another registration holds the parent; nothing runs this tick
    assert_eq!(job.tick().await.unwrap(), 0);
    assert!(gateway.calls.lock().is_empty());

    drop(_held);
    assert_eq!(job.tick().await.unwrap(), 2);
}

#[tokio::test]
async fn test_discovery_skips_already_processed_posts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("processed.json");
    let store = ProcessedPostsStore::load(&path).unwrap();

    let pinning = Arc::new(FakePinning::default());
    let gateway = Arc::new(FakeGateway::default());
    let timeline = Arc::new(FakeTimeline {
        posts: discovery_posts(),
    });

    let job = DiscoveryJob::new(
        timeline,
        pinning,
        gateway,
        options(),
        discovery_settings(),
        store,
        AssetLockManager::new(Duration::from_secs(600)),
    );

    assert_eq!(job.tick().await.unwrap(), 2);
    assert_eq!(job.tick().await.unwrap(), 0);

    // The set survives a restart through the persisted file
    let reloaded = ProcessedPostsStore::load(&path).unwrap();
    assert!(reloaded.contains("2"));
    assert!(reloaded.contains("4"));
    assert_eq!(reloaded.len(), 2);
}
