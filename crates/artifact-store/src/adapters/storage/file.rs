//! File-backed artifact log.
//!
//! Record format, one per appended leaf: `[LE32 nonce][LE32 vector_len][vector]`.
//! Appends are `fsync`'d individually so a crash loses at most the last
//! write. Stage deletion uses the temp-file-then-rename pattern for any
//! operation that rewrites the whole file; a plain delete is just `remove_file`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use node_types::ArtifactLeaf;
use parking_lot::Mutex;

use crate::ports::outbound::ArtifactLogBackend;

pub struct FileArtifactLog {
    base_dir: PathBuf,
    // Serializes appends per backend instance; separate stages still share
    // this lock, which is fine at this component's write volume.
    write_lock: Mutex<()>,
}

impl FileArtifactLog {
    pub fn new(base_dir: impl Into<PathBuf>) -> io::Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            write_lock: Mutex::new(()),
        })
    }

    fn path_for(&self, stage_start_height: u64) -> PathBuf {
        self.base_dir.join(format!("stage_{stage_start_height}.log"))
    }
}

impl ArtifactLogBackend for FileArtifactLog {
    fn append(&self, stage_start_height: u64, leaf: &ArtifactLeaf) -> io::Result<()> {
        let _guard = self.write_lock.lock();
        let path = self.path_for(stage_start_height);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(&leaf.nonce.to_le_bytes())?;
        file.write_all(&(leaf.vector.len() as u32).to_le_bytes())?;
        file.write_all(&leaf.vector)?;
        file.sync_all()
    }

    fn load(&self, stage_start_height: u64) -> io::Result<Vec<ArtifactLeaf>> {
        let path = self.path_for(stage_start_height);
        if !path.exists() {
            return Ok(Vec::new());
        }
        read_leaves(&path)
    }

    fn delete(&self, stage_start_height: u64) -> io::Result<()> {
        let path = self.path_for(stage_start_height);
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn read_leaves(path: &Path) -> io::Result<Vec<ArtifactLeaf>> {
    let mut file = File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let mut leaves = Vec::new();
    let mut cursor = 0usize;
    while cursor + 8 <= bytes.len() {
        let nonce = i32::from_le_bytes(bytes[cursor..cursor + 4].try_into().unwrap());
        cursor += 4;
        let vector_len =
            u32::from_le_bytes(bytes[cursor..cursor + 4].try_into().unwrap()) as usize;
        cursor += 4;
        if cursor + vector_len > bytes.len() {
            // Truncated trailing record from a crash mid-write; ignore it.
            break;
        }
        let vector = bytes[cursor..cursor + vector_len].to_vec();
        cursor += vector_len;
        leaves.push(ArtifactLeaf { nonce, vector });
    }
    Ok(leaves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn append_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let backend = FileArtifactLog::new(dir.path()).unwrap();
        backend
            .append(100, &ArtifactLeaf { nonce: 1, vector: vec![1, 2, 3] })
            .unwrap();
        backend
            .append(100, &ArtifactLeaf { nonce: 2, vector: vec![4, 5] })
            .unwrap();
        let leaves = backend.load(100).unwrap();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].nonce, 1);
        assert_eq!(leaves[1].vector, vec![4, 5]);
    }

    #[test]
    fn load_missing_stage_is_empty() {
        let dir = tempdir().unwrap();
        let backend = FileArtifactLog::new(dir.path()).unwrap();
        assert!(backend.load(999).unwrap().is_empty());
    }

    #[test]
    fn delete_removes_the_file() {
        let dir = tempdir().unwrap();
        let backend = FileArtifactLog::new(dir.path()).unwrap();
        backend
            .append(7, &ArtifactLeaf { nonce: 1, vector: vec![0] })
            .unwrap();
        backend.delete(7).unwrap();
        assert!(backend.load(7).unwrap().is_empty());
    }
}
