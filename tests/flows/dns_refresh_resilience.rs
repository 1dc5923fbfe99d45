//! Two dynamic hostnames, one reliable and one flaky: a round where the
//! flaky hostname fails to resolve must not evict the reliable hostname's
//! addresses, and must keep the flaky hostname's own last-known addresses
//! rather than zeroing them out.

#[path = "../common/mod.rs"]
mod common;

use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use knockgate_application::ports::DnsLookup;
use knockgate_application::services::AllowlistService;
use knockgate_domain::DomainError;
use knockgate_jobs::DnsRefreshJob;

/// `reliable.example` always resolves. `flaky.example` resolves on its
/// first call only, then fails every round after.
struct ScriptedResolver {
    flaky_calls: AtomicU32,
}

#[async_trait]
impl DnsLookup for ScriptedResolver {
    async fn resolve(&self, hostname: &str) -> Result<HashSet<IpAddr>, DomainError> {
        match hostname {
            "reliable.example" => {
                let mut set = HashSet::new();
                set.insert(IpAddr::from([198, 51, 100, 10]));
                Ok(set)
            }
            "flaky.example" => {
                let call = self.flaky_calls.fetch_add(1, Ordering::SeqCst);
                if call == 0 {
                    let mut set = HashSet::new();
                    set.insert(IpAddr::from([198, 51, 100, 20]));
                    Ok(set)
                } else {
                    Err(DomainError::Internal("resolver timeout".into()))
                }
            }
            other => panic!("unexpected hostname {other}"),
        }
    }
}

#[tokio::test]
async fn a_failed_round_keeps_the_flaky_hostnames_last_known_address() {
    let reliable_addr: IpAddr = "198.51.100.10".parse().unwrap();
    let flaky_addr: IpAddr = "198.51.100.20".parse().unwrap();

    let allowlist = Arc::new(AllowlistService::new());
    let dns: Arc<dyn DnsLookup> = Arc::new(ScriptedResolver {
        flaky_calls: AtomicU32::new(0),
    });

    let job = Arc::new(DnsRefreshJob::new(
        dns,
        allowlist.clone(),
        vec!["reliable.example".to_string(), "flaky.example".to_string()],
        1,
    ));
    job.start().await;

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(allowlist.is_allowed(reliable_addr).allowed, "first round resolves both hostnames");
    assert!(allowlist.is_allowed(flaky_addr).allowed);

    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert!(
        allowlist.is_allowed(reliable_addr).allowed,
        "reliable hostname keeps resolving every round"
    );
    assert!(
        allowlist.is_allowed(flaky_addr).allowed,
        "flaky hostname's previous address must survive a failed refresh round"
    );
}
