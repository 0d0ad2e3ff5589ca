use crate::cluster::{ClusterIndex, Insertion, MatchPolicy, Placement, Representative, RepresentativeId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown representative {0}")]
    UnknownRepresentative(RepresentativeId),
    #[error("representative out of creation order: expected {expected}, found {found}")]
    OutOfOrder { expected: RepresentativeId, found: RepresentativeId },
}

/// Durable home for representatives. Implementations must hand back
/// representatives in the order they were appended; matching depends on it.
pub trait RepresentativeStore<H> {
    fn load_all(&self) -> Result<Vec<Representative<H>>, StoreError>;
    fn append(&mut self, representative: &Representative<H>) -> Result<(), StoreError>;
    fn attach(&mut self, id: RepresentativeId, handle: &H) -> Result<(), StoreError>;
}

fn check_order<H>(representatives: &[Representative<H>]) -> Result<(), StoreError> {
    for (i, r) in representatives.iter().enumerate() {
        if r.id() != RepresentativeId(i) {
            return Err(StoreError::OutOfOrder { expected: RepresentativeId(i), found: r.id() });
        }
    }
    Ok(())
}

fn append_in_order<H: Clone>(records: &mut Vec<Representative<H>>, representative: &Representative<H>) -> Result<(), StoreError> {
    let expected = RepresentativeId(records.len());
    if representative.id() != expected {
        return Err(StoreError::OutOfOrder { expected, found: representative.id() });
    }
    records.push(representative.clone());
    Ok(())
}

fn attach_to<H: Clone + PartialEq>(records: &mut [Representative<H>], id: RepresentativeId, handle: &H) -> Result<(), StoreError> {
    let rep = records.get_mut(id.0).ok_or(StoreError::UnknownRepresentative(id))?;
    rep.attach(handle.clone());
    Ok(())
}

#[derive(Debug, Clone)]
pub struct MemoryStore<H> {
    records: Vec<Representative<H>>,
}

impl<H> Default for MemoryStore<H> {
    fn default() -> Self {
        Self { records: Vec::new() }
    }
}

impl<H> MemoryStore<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Representative<H>] {
        &self.records
    }
}

impl<H: Clone + PartialEq> RepresentativeStore<H> for MemoryStore<H> {
    fn load_all(&self) -> Result<Vec<Representative<H>>, StoreError> {
        Ok(self.records.clone())
    }

    fn append(&mut self, representative: &Representative<H>) -> Result<(), StoreError> {
        append_in_order(&mut self.records, representative)
    }

    fn attach(&mut self, id: RepresentativeId, handle: &H) -> Result<(), StoreError> {
        attach_to(&mut self.records, id, handle)
    }
}

/// A JSON array of representatives on disk, rewritten after every change.
///
/// Each rewrite goes to a sibling `.tmp` file that is then renamed over the
/// store. The in-memory copy is a snapshot taken at `open`, so two processes
/// writing the same file lose each other's updates.
#[derive(Debug)]
pub struct JsonFileStore<H> {
    path: PathBuf,
    records: Vec<Representative<H>>,
}

impl<H: Serialize + DeserializeOwned> JsonFileStore<H> {
    /// A missing file opens as an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let records: Vec<Representative<H>> = match fs::read_to_string(&path) {
            Ok(s) if s.trim().is_empty() => Vec::new(),
            Ok(s) => serde_json::from_str(&s)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        check_order(&records)?;
        log::debug!("opened store {} with {} representatives", path.display(), records.len());
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn flush(&self) -> Result<(), StoreError> {
        let s = serde_json::to_string_pretty(&self.records)?;
        let tmp = self.temp_path();
        fs::write(&tmp, s)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl<H: Serialize + DeserializeOwned + Clone + PartialEq> RepresentativeStore<H> for JsonFileStore<H> {
    fn load_all(&self) -> Result<Vec<Representative<H>>, StoreError> {
        Ok(self.records.clone())
    }

    fn append(&mut self, representative: &Representative<H>) -> Result<(), StoreError> {
        append_in_order(&mut self.records, representative)?;
        if let Err(e) = self.flush() {
            self.records.pop();
            return Err(e);
        }
        Ok(())
    }

    fn attach(&mut self, id: RepresentativeId, handle: &H) -> Result<(), StoreError> {
        let before = self.records.get(id.0).cloned().ok_or(StoreError::UnknownRepresentative(id))?;
        attach_to(&mut self.records, id, handle)?;
        if let Err(e) = self.flush() {
            self.records[id.0] = before;
            return Err(e);
        }
        Ok(())
    }
}

/// A cluster index whose changes are mirrored into a store. The store is
/// written first; the index only changes once the write succeeded.
pub struct PersistentIndex<S, H> {
    index: ClusterIndex<H>,
    store: S,
}

impl<S, H> PersistentIndex<S, H>
where
    S: RepresentativeStore<H>,
    H: Clone + PartialEq,
{
    pub fn load(store: S, threshold: f64, policy: MatchPolicy) -> Result<Self, StoreError> {
        let representatives = store.load_all()?;
        check_order(&representatives)?;
        let index = ClusterIndex::from_representatives(representatives, threshold).with_policy(policy);
        Ok(Self { index, store })
    }

    pub fn index(&self) -> &ClusterIndex<H> {
        &self.index
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn insert(&mut self, raw_text: &str, handle: H) -> Result<Insertion<'_, H>, StoreError> {
        let placement = self.index.place(raw_text, self.index.threshold());
        match &placement {
            Placement::New(representative) => {
                let mut pending = representative.clone();
                pending.attach(handle.clone());
                self.store.append(&pending)?;
            }
            Placement::Existing(id) => {
                if !self.is_attached(*id, &handle)? {
                    self.store.attach(*id, &handle)?;
                }
            }
        }
        Ok(self.index.commit(placement, handle))
    }

    /// Attaches another handle to an existing representative.
    pub fn attach(&mut self, id: RepresentativeId, handle: H) -> Result<bool, StoreError> {
        if self.is_attached(id, &handle)? {
            return Ok(false);
        }
        self.store.attach(id, &handle)?;
        Ok(self.index.attach(id, handle).unwrap_or(false))
    }

    fn is_attached(&self, id: RepresentativeId, handle: &H) -> Result<bool, StoreError> {
        let representative = self.index.get(id).ok_or(StoreError::UnknownRepresentative(id))?;
        Ok(representative.associations().contains(handle))
    }
}
