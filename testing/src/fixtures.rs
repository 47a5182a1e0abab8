use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use tempfile::TempDir;

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

pub fn unique_id(prefix: &str) -> String {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}", prefix, id)
}

/// Slug-safe tenant name, unique within the test process.
pub fn unique_tenant_slug() -> String {
    unique_id("test-tenant")
}

/// A configuration root in a temporary directory.
///
/// Level directories follow the resolver layout:
/// `platform/`, `tenants/<t>/`, `tenants/<t>/organizations/<o>/` and
/// `tenants/<t>/organizations/<o>/users/<role>/`.
pub struct FragmentTree {
    dir: TempDir,
}

impl FragmentTree {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `relative` under the root, creating directories.
    pub fn write(&self, relative: impl AsRef<Path>, contents: &str) -> io::Result<PathBuf> {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn remove(&self, relative: impl AsRef<Path>) -> io::Result<()> {
        fs::remove_file(self.dir.path().join(relative))
    }

    pub fn platform(&self, file: &str, contents: &str) -> io::Result<PathBuf> {
        self.write(Path::new("platform").join(file), contents)
    }

    pub fn tenant(&self, tenant: &str, file: &str, contents: &str) -> io::Result<PathBuf> {
        self.write(tenant_dir(tenant).join(file), contents)
    }

    pub fn organization(
        &self,
        tenant: &str,
        organization: &str,
        file: &str,
        contents: &str,
    ) -> io::Result<PathBuf> {
        self.write(org_dir(tenant, organization).join(file), contents)
    }

    pub fn role(
        &self,
        tenant: &str,
        organization: &str,
        role: &str,
        file: &str,
        contents: &str,
    ) -> io::Result<PathBuf> {
        self.write(
            org_dir(tenant, organization)
                .join("users")
                .join(role)
                .join(file),
            contents,
        )
    }

    /// Platform, tenant and organization fragments carrying the default
    /// required keys.
    pub fn with_required_keys(tenant: &str, organization: &str) -> io::Result<Self> {
        let tree = Self::new()?;
        tree.platform("00-base.env", "PLATFORM_NAME=hr-platform")?;
        tree.tenant(tenant, "00-base.env", &format!("TENANT_ID={tenant}"))?;
        tree.organization(
            tenant,
            organization,
            "00-base.env",
            &format!("ORGANIZATION_ID={organization}"),
        )?;
        Ok(tree)
    }
}

fn tenant_dir(tenant: &str) -> PathBuf {
    Path::new("tenants").join(tenant)
}

fn org_dir(tenant: &str, organization: &str) -> PathBuf {
    tenant_dir(tenant).join("organizations").join(organization)
}
