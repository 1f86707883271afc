//! Integrity-checked single-file app archive.
//!
//! Layout: an 8-byte size pickle holding the header pickle length, the header
//! pickle (payload length, JSON length, JSON, padding to 4 bytes), then the
//! file bodies concatenated in header order. Every file entry records a
//! SHA-256 of the whole file and of each 4 MiB block.

use crate::bundler::{
    error::{Context, Error, ErrorExt, Result},
    utils::fs::file_mode,
};
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};
use std::{
    fs::File,
    io::{BufWriter, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

/// Block size used for per-block integrity hashes.
pub const BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// What [`pack`] produced.
#[derive(Clone, Debug)]
pub struct ArchiveSummary {
    /// Archive path
    pub path: PathBuf,
    /// Number of files stored
    pub files: usize,
    /// SHA-256 of the header JSON, for embedded integrity records
    pub header_hash: String,
}

fn integrity(data: &[u8]) -> Value {
    let blocks: Vec<String> = data
        .chunks(BLOCK_SIZE)
        .map(|block| hex::encode(Sha256::digest(block)))
        .collect();
    json!({
        "algorithm": "SHA256",
        "hash": hex::encode(Sha256::digest(data)),
        "blockSize": BLOCK_SIZE,
        "blocks": blocks,
    })
}

/// Builds the header node for `dir`, appending file paths in body order.
fn build_node(dir: &Path, offset: &mut u64, bodies: &mut Vec<PathBuf>) -> Result<Value> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .fs_context("reading app directory", dir)?
        .collect::<std::io::Result<_>>()
        .fs_context("reading app directory", dir)?;
    entries.sort_by_key(|e| e.file_name());

    let mut files = Map::new();
    for entry in entries {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let file_type = entry.file_type().fs_context("reading file type", &path)?;

        let node = if file_type.is_symlink() {
            let target = std::fs::read_link(&path).fs_context("reading symlink", &path)?;
            json!({ "link": target.to_string_lossy().replace('\\', "/") })
        } else if file_type.is_dir() {
            build_node(&path, offset, bodies)?
        } else {
            let data = std::fs::read(&path).fs_context("reading app file", &path)?;
            let metadata = entry.metadata().fs_context("reading metadata", &path)?;
            let mut node = json!({
                "size": data.len(),
                "offset": offset.to_string(),
                "integrity": integrity(&data),
            });
            if file_mode(&metadata) & 0o100 != 0 {
                node["executable"] = Value::Bool(true);
            }
            *offset += data.len() as u64;
            bodies.push(path);
            node
        };
        files.insert(name, node);
    }
    Ok(json!({ "files": files }))
}

/// Packs the directory `src` into a single archive at `dest`.
pub fn pack(src: &Path, dest: &Path) -> Result<ArchiveSummary> {
    let mut offset = 0u64;
    let mut bodies = Vec::new();
    let header = build_node(src, &mut offset, &mut bodies)?;
    let json = serde_json::to_string(&header)?;

    let json_len = json.len();
    let padding = (4 - json_len % 4) % 4;
    let payload_len = 4 + json_len + padding;
    let header_pickle_len = 4 + payload_len;

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).fs_context("creating archive directory", parent)?;
    }
    let file = File::create(dest).fs_context("creating archive", dest)?;
    let mut out = BufWriter::new(file);

    let mut head = Vec::with_capacity(8 + header_pickle_len);
    head.extend_from_slice(&4u32.to_le_bytes());
    head.extend_from_slice(&(header_pickle_len as u32).to_le_bytes());
    head.extend_from_slice(&(payload_len as u32).to_le_bytes());
    head.extend_from_slice(&(json_len as u32).to_le_bytes());
    head.extend_from_slice(json.as_bytes());
    head.extend(std::iter::repeat_n(0u8, padding));
    out.write_all(&head).fs_context("writing archive header", dest)?;

    for body in &bodies {
        let mut input = File::open(body).fs_context("opening app file", body)?;
        std::io::copy(&mut input, &mut out).fs_context("writing archive body", dest)?;
    }
    out.flush().fs_context("flushing archive", dest)?;

    Ok(ArchiveSummary {
        path: dest.to_path_buf(),
        files: bodies.len(),
        header_hash: hex::encode(Sha256::digest(json.as_bytes())),
    })
}

/// Read access to a packed archive.
#[derive(Debug)]
pub struct Archive {
    path: PathBuf,
    header: Value,
    data_offset: u64,
}

impl Archive {
    /// Opens an archive and parses its header.
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path).fs_context("opening archive", path)?;
        let mut size_pickle = [0u8; 8];
        file.read_exact(&mut size_pickle)
            .fs_context("reading archive size pickle", path)?;
        let header_pickle_len =
            u32::from_le_bytes([size_pickle[4], size_pickle[5], size_pickle[6], size_pickle[7]])
                as usize;

        let mut header_pickle = vec![0u8; header_pickle_len];
        file.read_exact(&mut header_pickle)
            .fs_context("reading archive header", path)?;
        if header_pickle.len() < 8 {
            return Err(Error::GenericError(format!(
                "{} has a truncated archive header",
                path.display()
            )));
        }
        let json_len = u32::from_le_bytes([
            header_pickle[4],
            header_pickle[5],
            header_pickle[6],
            header_pickle[7],
        ]) as usize;
        let json = header_pickle.get(8..8 + json_len).ok_or_else(|| {
            Error::GenericError(format!("{} has a corrupt archive header", path.display()))
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            header: serde_json::from_slice(json)?,
            data_offset: 8 + header_pickle_len as u64,
        })
    }

    fn node(&self, name: &str) -> Option<&Value> {
        name.split('/')
            .filter(|part| !part.is_empty())
            .try_fold(&self.header, |node, part| node.get("files")?.get(part))
    }

    /// Paths of every stored file, `/`-separated, in header order.
    pub fn files(&self) -> Vec<String> {
        fn walk(node: &Value, prefix: &str, out: &mut Vec<String>) {
            if let Some(files) = node.get("files").and_then(Value::as_object) {
                for (name, child) in files {
                    let path = if prefix.is_empty() {
                        name.clone()
                    } else {
                        format!("{prefix}/{name}")
                    };
                    if child.get("files").is_some() {
                        walk(child, &path, out);
                    } else if child.get("offset").is_some() {
                        out.push(path);
                    }
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.header, "", &mut out);
        out
    }

    /// Reads one stored file.
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let node = self
            .node(name)
            .context(format!("{name} is not in the archive"))?;
        let size = node.get("size").and_then(Value::as_u64).unwrap_or(0) as usize;
        let offset = node
            .get("offset")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<u64>().ok())
            .context(format!("{name} has no data offset"))?;

        let mut file = File::open(&self.path).fs_context("opening archive", &self.path)?;
        file.seek(SeekFrom::Start(self.data_offset + offset))
            .fs_context("seeking archive", &self.path)?;
        let mut data = vec![0u8; size];
        file.read_exact(&mut data)
            .fs_context("reading archive body", &self.path)?;
        Ok(data)
    }

    /// Checks every stored file against its integrity record.
    pub fn verify(&self) -> Result<()> {
        for name in self.files() {
            let data = self.read(&name)?;
            let expected = self
                .node(&name)
                .and_then(|n| n.pointer("/integrity/hash"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            if hex::encode(Sha256::digest(&data)) != expected {
                return Err(Error::GenericError(format!(
                    "integrity check failed for {name} in {}",
                    self.path.display()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("package.json"), br#"{"main":".webpack/main/index.js"}"#).unwrap();
        std::fs::create_dir_all(root.join(".webpack/renderer/main_window")).unwrap();
        std::fs::create_dir_all(root.join(".webpack/main")).unwrap();
        std::fs::write(root.join(".webpack/main/index.js"), b"main()").unwrap();
        std::fs::write(
            root.join(".webpack/renderer/main_window/client.wasm"),
            [0x00, 0x61, 0x73, 0x6d],
        )
        .unwrap();
        std::fs::write(root.join(".webpack/renderer/main_window/empty.data"), b"").unwrap();
        dir
    }

    #[test]
    fn packed_files_read_back_and_verify() {
        let src = app_dir();
        let out = tempfile::tempdir().unwrap();
        let dest = out.path().join("resources/app.asar");

        let summary = pack(src.path(), &dest).unwrap();
        assert_eq!(summary.files, 4);
        assert_eq!(summary.header_hash.len(), 64);

        let archive = Archive::open(&dest).unwrap();
        assert_eq!(
            archive.read(".webpack/renderer/main_window/client.wasm").unwrap(),
            vec![0x00, 0x61, 0x73, 0x6d]
        );
        assert_eq!(archive.read("package.json").unwrap(), br#"{"main":".webpack/main/index.js"}"#);
        assert!(archive.read(".webpack/renderer/main_window/empty.data").unwrap().is_empty());
        archive.verify().unwrap();

        let mut files = archive.files();
        files.sort();
        assert_eq!(
            files,
            vec![
                ".webpack/main/index.js",
                ".webpack/renderer/main_window/client.wasm",
                ".webpack/renderer/main_window/empty.data",
                "package.json"
            ]
        );
    }

    #[test]
    fn header_is_four_byte_aligned() {
        let src = app_dir();
        let out = tempfile::tempdir().unwrap();
        let dest = out.path().join("app.asar");
        pack(src.path(), &dest).unwrap();

        let bytes = std::fs::read(&dest).unwrap();
        assert_eq!(&bytes[0..4], &4u32.to_le_bytes());
        let header_pickle_len = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        assert_eq!(header_pickle_len % 4, 0);
    }

    #[test]
    fn tampered_body_fails_verification() {
        let src = app_dir();
        let out = tempfile::tempdir().unwrap();
        let dest = out.path().join("app.asar");
        pack(src.path(), &dest).unwrap();

        let mut bytes = std::fs::read(&dest).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        std::fs::write(&dest, bytes).unwrap();

        assert!(Archive::open(&dest).unwrap().verify().is_err());
    }

    #[test]
    fn integrity_blocks_follow_block_size() {
        let record = integrity(&vec![7u8; BLOCK_SIZE + 1]);
        assert_eq!(record["blocks"].as_array().unwrap().len(), 2);
        assert_eq!(record["blockSize"], BLOCK_SIZE);
    }
}
