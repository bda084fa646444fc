//! Durable store over a directory tree.
//!
//! Layout:
//!
//! ```text
//! root/index.json            name -> chain directory stem
//! root/<stem>/manifest.json  ordered revision chain + next sequence
//! root/<stem>/<ver..12>.json one revision record, code held as base64
//! ```
//!
//! Every manifest/index mutation goes through a temp file and an atomic
//! rename; revision files are written and synced before the manifest that
//! references them. A crash can orphan a revision file but never publish a
//! torn chain. Loads re-derive the version from the stored bytes and
//! reject mismatches.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::function::{Function, FunctionRef};
use crate::store::{FunctionStore, StoreError};
use crate::types::identifiers::{FunctionName, FunctionVersion};

const INDEX_FILE: &str = "index.json";
const MANIFEST_FILE: &str = "manifest.json";
const STEM_LEN: usize = 12;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChainManifest {
    name: FunctionName,
    next_seq: u64,
    revisions: Vec<RevisionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RevisionEntry {
    seq: u64,
    version: FunctionVersion,
    file: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RevisionRecord {
    name: FunctionName,
    version: FunctionVersion,
    seq: u64,
    created_at: DateTime<Utc>,
    code: String,
}

/// Function store backed by the filesystem.
///
/// A single mutex serializes every operation; the per-name sequence in the
/// chain manifest is only advanced under it.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Open (or initialize) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;

        let index_path = root.join(INDEX_FILE);
        if !index_path.exists() {
            write_json_atomic(&index_path, &BTreeMap::<String, String>::new())?;
        }

        Ok(FileStore {
            root,
            lock: Mutex::new(()),
        })
    }

    fn read_index(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let f = fs::File::open(self.root.join(INDEX_FILE))?;
        Ok(serde_json::from_reader(f)?)
    }

    fn write_index(&self, index: &BTreeMap<String, String>) -> Result<(), StoreError> {
        write_json_atomic(&self.root.join(INDEX_FILE), index)
    }

    fn chain_dir(&self, stem: &str) -> PathBuf {
        self.root.join(stem)
    }

    fn read_manifest(&self, dir: &Path) -> Result<ChainManifest, StoreError> {
        let f = fs::File::open(dir.join(MANIFEST_FILE))?;
        Ok(serde_json::from_reader(f)?)
    }

    fn write_manifest(&self, dir: &Path, manifest: &ChainManifest) -> Result<(), StoreError> {
        write_json_atomic(&dir.join(MANIFEST_FILE), manifest)
    }

    fn load_revision(
        &self,
        dir: &Path,
        entry: &RevisionEntry,
        name: &FunctionName,
    ) -> Result<Function, StoreError> {
        let f = fs::File::open(dir.join(&entry.file))?;
        let record: RevisionRecord = serde_json::from_reader(f)?;

        if &record.name != name {
            return Err(StoreError::Corrupt(format!(
                "revision file {} belongs to {}, expected {}",
                entry.file, record.name, name
            )));
        }

        let code = STANDARD.decode(&record.code).map_err(|e| {
            StoreError::Corrupt(format!("undecodable code in {}: {e}", entry.file))
        })?;

        // Verify version matches the stored bytes (recompute from content).
        let expected = FunctionVersion::derive(name, record.seq, &code);
        if expected != entry.version {
            return Err(StoreError::Corrupt(format!(
                "version mismatch for {}: manifest says {}, content hashes to {}",
                name,
                entry.version.as_str(),
                expected.as_str(),
            )));
        }

        Ok(Function {
            name: record.name,
            version: record.version,
            code,
            created_at: record.created_at,
        })
    }

    /// Mint and persist the next revision of an already-loaded chain.
    ///
    /// The revision file lands on disk, synced, before the manifest rename
    /// publishes it.
    fn append_revision(
        &self,
        dir: &Path,
        manifest: &mut ChainManifest,
        name: &FunctionName,
        code: &[u8],
    ) -> Result<FunctionVersion, StoreError> {
        let seq = manifest.next_seq;
        manifest.next_seq += 1;

        let function = Function::revision(name.clone(), seq, code.to_vec());
        let stem = version_stem(&function.version)?;

        if manifest.revisions.iter().any(|r| r.file.starts_with(stem)) {
            return Err(StoreError::Corrupt(format!(
                "filename collision for hash fragment {stem}"
            )));
        }

        let filename = format!("{stem}.json");
        let record = RevisionRecord {
            name: function.name.clone(),
            version: function.version.clone(),
            seq,
            created_at: function.created_at,
            code: STANDARD.encode(code),
        };

        let f = fs::File::create(dir.join(&filename))?;
        serde_json::to_writer(&f, &record)?;
        f.sync_all()?;

        manifest.revisions.push(RevisionEntry {
            seq,
            version: function.version.clone(),
            file: filename,
            created_at: function.created_at,
        });
        self.write_manifest(dir, manifest)?;

        Ok(function.version)
    }
}

impl FunctionStore for FileStore {
    fn list(&self) -> Result<Vec<Function>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let index = self.read_index()?;
        let mut out = Vec::with_capacity(index.len());

        // BTreeMap keeps the listing in name order.
        for (raw_name, stem) in &index {
            let name = FunctionName::parse(raw_name)
                .map_err(|e| StoreError::Corrupt(format!("bad name in index: {e}")))?;
            let dir = self.chain_dir(stem);
            let manifest = self.read_manifest(&dir)?;

            if let Some(entry) = manifest.revisions.last() {
                out.push(self.load_revision(&dir, entry, &name)?);
            }
        }

        Ok(out)
    }

    fn create(&self, name: &FunctionName, code: &[u8]) -> Result<FunctionVersion, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut index = self.read_index()?;

        if let Some(stem) = index.get(name.as_str()).cloned() {
            // Name already known: creating just appends to its chain.
            let dir = self.chain_dir(&stem);
            let mut manifest = self.read_manifest(&dir)?;
            return self.append_revision(&dir, &mut manifest, name, code);
        }

        let stem = name_stem(name);
        if index.values().any(|s| s == &stem) {
            return Err(StoreError::Corrupt(format!(
                "filename collision for hash fragment {stem}"
            )));
        }

        let dir = self.chain_dir(&stem);
        fs::create_dir_all(&dir)?;

        let mut manifest = ChainManifest {
            name: name.clone(),
            next_seq: 0,
            revisions: Vec::new(),
        };
        let version = self.append_revision(&dir, &mut manifest, name, code)?;

        // Publish the name last so readers never see a chain without a
        // manifest behind it.
        index.insert(name.as_str().to_string(), stem);
        self.write_index(&index)?;

        Ok(version)
    }

    fn get(&self, target: &FunctionRef) -> Result<Function, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let index = self.read_index()?;
        let stem = index
            .get(target.name.as_str())
            .ok_or_else(|| StoreError::NotFound(target.to_string()))?;

        let dir = self.chain_dir(stem);
        let manifest = self.read_manifest(&dir)?;

        let entry = match &target.version {
            None => manifest.revisions.last(),
            Some(v) => manifest.revisions.iter().find(|r| &r.version == v),
        };
        let entry = entry.ok_or_else(|| StoreError::NotFound(target.to_string()))?;

        self.load_revision(&dir, entry, &target.name)
    }

    fn update(&self, name: &FunctionName, code: &[u8]) -> Result<FunctionVersion, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let index = self.read_index()?;
        let stem = index
            .get(name.as_str())
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;

        let dir = self.chain_dir(stem);
        let mut manifest = self.read_manifest(&dir)?;
        self.append_revision(&dir, &mut manifest, name, code)
    }

    fn delete(&self, target: &FunctionRef) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut index = self.read_index()?;
        let stem = index
            .get(target.name.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(target.to_string()))?;
        let dir = self.chain_dir(&stem);

        match &target.version {
            None => {
                // Unlink the name first; a crash mid-removal leaves only
                // unreferenced files behind.
                index.remove(target.name.as_str());
                self.write_index(&index)?;
                fs::remove_dir_all(&dir)?;
            }
            Some(v) => {
                let mut manifest = self.read_manifest(&dir)?;
                let idx = manifest
                    .revisions
                    .iter()
                    .position(|r| &r.version == v)
                    .ok_or_else(|| StoreError::NotFound(target.to_string()))?;
                let entry = manifest.revisions.remove(idx);

                if manifest.revisions.is_empty() {
                    index.remove(target.name.as_str());
                    self.write_index(&index)?;
                    fs::remove_dir_all(&dir)?;
                } else {
                    self.write_manifest(&dir, &manifest)?;
                    fs::remove_file(dir.join(&entry.file))?;
                }
            }
        }

        Ok(())
    }
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let tmp = path.with_extension("json.tmp");

    let f = fs::File::create(&tmp)?;
    serde_json::to_writer_pretty(&f, value)?;
    f.sync_all()?;

    fs::rename(&tmp, path)?;
    Ok(())
}

/// Directory stem for a name: first 12 hex chars of its sha256.
fn name_stem(name: &FunctionName) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_str().as_bytes());
    hex::encode(hasher.finalize())[..STEM_LEN].to_string()
}

/// Filename stem for a revision: first 12 chars of the version hash.
fn version_stem(version: &FunctionVersion) -> Result<&str, StoreError> {
    let full_hash = version
        .as_str()
        .strip_prefix("sha256:")
        .ok_or_else(|| StoreError::Corrupt(format!("bad version format: {version}")))?;

    if full_hash.len() < STEM_LEN {
        return Err(StoreError::Corrupt(format!("bad version format: {version}")));
    }
    Ok(&full_hash[..STEM_LEN])
}
