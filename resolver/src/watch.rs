use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use config::ConfigRootEvent;
use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::resolver::ConfigResolver;

/// Tenant slug owning a changed path, if the path is inside `tenants/<slug>/`.
fn tenant_of(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut components = relative.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(first)), Some(Component::Normal(slug))) if first == "tenants" => {
            slug.to_str().map(String::from)
        }
        _ => None,
    }
}

/// Shortest interval between expiry sweeps.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(10);

fn apply_event(resolver: &ConfigResolver, root: &Path, event: ConfigRootEvent) {
    match event {
        ConfigRootEvent::Changed(path) | ConfigRootEvent::Removed(path) => {
            let path = std::fs::canonicalize(&path).unwrap_or(path);
            match tenant_of(root, &path) {
                Some(tenant) => {
                    resolver.invalidate_tenant(&tenant);
                }
                None => resolver.clear_cache(),
            }
            debug!(path = %path.display(), "Fragment change processed");
        }
        ConfigRootEvent::Ready => info!(root = %root.display(), "Cache invalidation active"),
    }
}

/// Drop cached resolutions as fragment files change.
///
/// Changes under `tenants/<slug>/` invalidate that tenant only; anything
/// else, platform fragments included, clears the whole cache. Between
/// events, expired entries are swept once per cache TTL. The task ends
/// when the event sender is dropped.
pub fn spawn_cache_invalidation(
    resolver: Arc<ConfigResolver>,
    mut events: Receiver<ConfigRootEvent>,
) -> JoinHandle<()> {
    let root: PathBuf =
        std::fs::canonicalize(resolver.root()).unwrap_or_else(|_| resolver.root().to_path_buf());
    let sweep_every = resolver.cache().ttl().max(MIN_SWEEP_INTERVAL);

    tokio::spawn(async move {
        let mut sweep = tokio::time::interval_at(Instant::now() + sweep_every, sweep_every);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        break;
                    };
                    apply_event(&resolver, &root, event);
                }
                _ = sweep.tick() => {
                    resolver.evict_expired();
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Viewer;
    use crate::request::ResolutionRequest;
    use hr_core::{Role, RoleClaim};
    use std::fs;

    #[test]
    fn test_tenant_of() {
        let root = Path::new("/cfg");
        assert_eq!(
            tenant_of(root, Path::new("/cfg/tenants/acme/base.env")).as_deref(),
            Some("acme")
        );
        assert_eq!(
            tenant_of(root, Path::new("/cfg/tenants/acme/organizations/x/a.env")).as_deref(),
            Some("acme")
        );
        assert_eq!(tenant_of(root, Path::new("/cfg/platform/base.env")), None);
        assert_eq!(tenant_of(root, Path::new("/elsewhere/tenants/acme")), None);
    }

    #[tokio::test]
    async fn test_events_invalidate_cache() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("platform")).unwrap();
        fs::write(dir.path().join("platform/base.env"), "PLATFORM_NAME=hr").unwrap();
        fs::create_dir_all(dir.path().join("tenants/acme")).unwrap();
        fs::write(dir.path().join("tenants/acme/base.env"), "TENANT_ID=acme").unwrap();

        let resolver = Arc::new(ConfigResolver::new(dir.path()));
        let viewer = Viewer::new(RoleClaim::Known(Role::SystemAdmin), false, false);
        resolver
            .resolve(&ResolutionRequest::platform().with_viewer(viewer.clone()))
            .await
            .unwrap();
        resolver
            .resolve(
                &ResolutionRequest::platform()
                    .with_tenant("acme")
                    .with_viewer(viewer),
            )
            .await
            .unwrap();
        assert_eq!(resolver.cache_stats().entries, 2);

        let (tx, rx) = tokio::sync::mpsc::channel(8);
        let handle = spawn_cache_invalidation(Arc::clone(&resolver), rx);

        tx.send(ConfigRootEvent::Changed(dir.path().join("tenants/acme/base.env")))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(resolver.cache_stats().entries, 1);

        tx.send(ConfigRootEvent::Removed(dir.path().join("platform/gone.env")))
            .await
            .unwrap();
        drop(tx);
        handle.await.unwrap();
        assert_eq!(resolver.cache_stats().entries, 0);
    }

    #[tokio::test]
    async fn test_expired_entries_swept_without_rerequest() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("platform")).unwrap();
        fs::write(dir.path().join("platform/base.env"), "PLATFORM_NAME=hr").unwrap();

        let resolver = Arc::new(
            ConfigResolver::new(dir.path()).with_cache_ttl(Duration::from_millis(20)),
        );
        let viewer = Viewer::new(RoleClaim::Known(Role::SystemAdmin), false, false);
        resolver
            .resolve(&ResolutionRequest::platform().with_viewer(viewer))
            .await
            .unwrap();
        assert_eq!(resolver.cache_stats().entries, 1);

        let (tx, rx) = tokio::sync::mpsc::channel(8);
        let handle = spawn_cache_invalidation(Arc::clone(&resolver), rx);

        tokio::time::sleep(Duration::from_millis(200)).await;
        let stats = resolver.cache_stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.expired, 1);

        drop(tx);
        handle.await.unwrap();
    }
}
