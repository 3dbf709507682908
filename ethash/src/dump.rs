//! On-disk dumps of caches and datasets.
//!
//! A dump is the two [`DUMP_MAGIC`] words followed by the raw buffer, in host
//! byte order. File names encode the algorithm revision, the epoch and the
//! first eight bytes of the seed: `cache-R23-195-a1b2c3d4e5f60718`, with a
//! `.be` suffix on big-endian hosts. Dumps are written to a temporary file
//! and renamed into place, so a mapped dump is never modified.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapMut};
use tracing::{debug, error, warn};

use crate::algorithm::ALGORITHM_REVISION;
use crate::EthashError;

/// Leading words of every dump file.
pub const DUMP_MAGIC: [u32; 2] = [0xbadd_cafe, 0xfee1_dead];
const MAGIC_BYTES: u64 = (DUMP_MAGIC.len() * 4) as u64;

/// Prefix of in-progress dumps, kept outside the `<kind>-R<rev>-` namespace.
const TEMP_PREFIX: &str = ".tmp-";

#[cfg(target_endian = "big")]
const ENDIAN_SUFFIX: &str = ".be";
#[cfg(target_endian = "little")]
const ENDIAN_SUFFIX: &str = "";

/// Which buffer a dump holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DumpKind {
    Cache,
    Dataset,
}

impl DumpKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            DumpKind::Cache => "cache",
            DumpKind::Dataset => "full",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            DumpKind::Cache => "cache",
            DumpKind::Dataset => "dataset",
        }
    }
}

pub fn dump_file_name(kind: DumpKind, epoch: u64, seed: &[u8; 32]) -> String {
    format!(
        "{}-R{}-{}-{}{}",
        kind.prefix(),
        ALGORITHM_REVISION,
        epoch,
        hex::encode(&seed[..8]),
        ENDIAN_SUFFIX
    )
}

// ---------------------------------------------------------------------------
// Resident memory
// ---------------------------------------------------------------------------

/// A generated buffer: owned in memory, or a read-only mapping of a dump.
///
/// Dropping a `Memory` releases the buffer or unmaps the file.
pub enum Memory {
    Owned(Vec<u32>),
    Mapped(MappedDump),
}

impl Memory {
    pub fn words(&self) -> &[u32] {
        match self {
            Memory::Owned(words) => words,
            Memory::Mapped(dump) => dump.words(),
        }
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self, Memory::Mapped(_))
    }

    /// Path of the backing dump, if mapped.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Memory::Owned(_) => None,
            Memory::Mapped(dump) => Some(&dump.path),
        }
    }
}

/// A validated, read-only mapping of a dump file.
pub struct MappedDump {
    mmap: Mmap,
    path: PathBuf,
}

impl MappedDump {
    /// Buffer words after the magic header.
    pub fn words(&self) -> &[u32] {
        // Length and alignment were checked when the dump was mapped.
        &bytemuck::cast_slice::<u8, u32>(&self.mmap[..])[DUMP_MAGIC.len()..]
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for MappedDump {
    fn drop(&mut self) {
        debug!(path = %self.path.display(), "Unmapping ethash dump");
    }
}

// ---------------------------------------------------------------------------
// Mapping and generation
// ---------------------------------------------------------------------------

/// Map an existing dump read-only, validating its magic header and that it
/// holds exactly `expected` buffer bytes.
pub fn memory_map(path: &Path, expected: u64, lock: bool) -> Result<MappedDump, EthashError> {
    let file = File::open(path)?;
    let size = file.metadata()?.len();
    if MAGIC_BYTES.checked_add(expected) != Some(size) || size % 4 != 0 {
        return Err(EthashError::InvalidDumpSize {
            path: path.to_path_buf(),
            size,
        });
    }

    // SAFETY: dumps are created by renaming a fully written temporary file
    // and are never modified in place afterwards.
    let mmap = unsafe { Mmap::map(&file)? };
    let words: &[u32] =
        bytemuck::try_cast_slice(&mmap[..]).map_err(|_| EthashError::InvalidDumpSize {
            path: path.to_path_buf(),
            size,
        })?;
    if words[..DUMP_MAGIC.len()] != DUMP_MAGIC {
        return Err(EthashError::InvalidDumpMagic {
            path: path.to_path_buf(),
        });
    }

    if lock {
        if let Err(err) = lock_pages(&mmap) {
            warn!(path = %path.display(), %err, "Failed to lock ethash dump in memory");
        }
    }

    Ok(MappedDump {
        mmap,
        path: path.to_path_buf(),
    })
}

/// Create a dump of `size` bytes at `path`, filled by `generator`, then map it.
pub fn memory_map_and_generate<F>(
    path: &Path,
    size: u64,
    lock: bool,
    generator: F,
) -> Result<MappedDump, EthashError>
where
    F: FnOnce(&mut [u32]),
{
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = tempfile::Builder::new()
        .prefix(&format!("{TEMP_PREFIX}{name}."))
        .tempfile_in(dir)?;
    temp.as_file().set_len(MAGIC_BYTES + size)?;

    {
        // SAFETY: the temporary file is private to this process until it is
        // persisted below.
        let mut mmap = unsafe { MmapMut::map_mut(temp.as_file())? };
        let words: &mut [u32] = bytemuck::try_cast_slice_mut(&mut mmap[..]).map_err(|_| {
            EthashError::InvalidDumpSize {
                path: path.to_path_buf(),
                size,
            }
        })?;
        let (magic, data) = words.split_at_mut(DUMP_MAGIC.len());
        magic.copy_from_slice(&DUMP_MAGIC);
        generator(data);
        mmap.flush()?;
    }

    temp.persist(path).map_err(|err| EthashError::Persist {
        path: path.to_path_buf(),
        reason: err.error.to_string(),
    })?;

    memory_map(path, size, lock)
}

#[cfg(unix)]
fn lock_pages(mmap: &Mmap) -> io::Result<()> {
    mmap.lock()
}

#[cfg(not(unix))]
fn lock_pages(_mmap: &Mmap) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "locking mapped memory is only supported on unix",
    ))
}

/// Where and how a generated buffer is persisted.
#[derive(Clone, Copy, Debug)]
pub struct DumpTarget<'a> {
    pub kind: DumpKind,
    /// Directory holding dumps; `None` keeps everything in memory.
    pub dir: Option<&'a Path>,
    pub epoch: u64,
    pub seed: &'a [u8; 32],
    /// Buffer size in bytes.
    pub size: u64,
    /// Number of past epochs whose dumps are kept.
    pub limit: u64,
    pub lock: bool,
}

/// How a buffer returned by [`load_or_generate`] came to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    /// An existing dump was mapped.
    Disk,
    /// The generator ran.
    Generated,
}

/// Map the dump for `target`, or generate it (persisting it when a directory
/// is configured) and evict stale dumps.
///
/// Disk failures are logged and fall back to an in-memory buffer.
pub fn load_or_generate<F>(target: DumpTarget<'_>, generator: F) -> (Memory, Source)
where
    F: Fn(&mut [u32]),
{
    let owned = |generator: &F| {
        let mut words = vec![0u32; (target.size / 4) as usize];
        generator(&mut words);
        Memory::Owned(words)
    };

    let Some(dir) = target.dir else {
        return (owned(&generator), Source::Generated);
    };

    let what = target.kind.describe();
    let path = dir.join(dump_file_name(target.kind, target.epoch, target.seed));
    match memory_map(&path, target.size, target.lock) {
        Ok(dump) => {
            debug!(epoch = target.epoch, path = %path.display(), "Loaded old ethash {what} from disk");
            return (Memory::Mapped(dump), Source::Disk);
        }
        Err(err) => {
            debug!(epoch = target.epoch, %err, "Failed to load old ethash {what}");
        }
    }

    let memory = match memory_map_and_generate(&path, target.size, target.lock, &generator) {
        Ok(dump) => Memory::Mapped(dump),
        Err(err) => {
            error!(epoch = target.epoch, %err, "Failed to generate mapped ethash {what}");
            owned(&generator)
        }
    };

    evict_stale_dumps(dir, target.kind, target.epoch, target.limit);
    (memory, Source::Generated)
}

// ---------------------------------------------------------------------------
// Eviction
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
enum DumpName {
    Epoch(u64),
    /// `<kind>-R<rev>-<seed>`: the naming scheme before epochs were recorded.
    Legacy,
    Unrecognized,
}

fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Classify the part of a dump name after `<kind>-R<rev>-`.
fn parse_dump_name(rest: &str) -> DumpName {
    let rest = rest.strip_suffix(".be").unwrap_or(rest);
    match rest.split_once('-') {
        Some((epoch, seed)) if is_hex(seed) => match epoch.parse() {
            Ok(epoch) => DumpName::Epoch(epoch),
            Err(_) => DumpName::Unrecognized,
        },
        Some(_) => DumpName::Unrecognized,
        None if is_hex(rest) => DumpName::Legacy,
        None => DumpName::Unrecognized,
    }
}

/// Delete same-revision dumps of `kind` outside `[epoch - limit, epoch + 1]`,
/// and legacy dumps without an epoch. Unrecognized files are left alone.
pub fn evict_stale_dumps(dir: &Path, kind: DumpKind, epoch: u64, limit: u64) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(dir = %dir.display(), %err, "Failed to scan ethash dump directory");
            return;
        }
    };

    let what = kind.describe();
    let prefix = format!("{}-R{}-", kind.prefix(), ALGORITHM_REVISION);
    let lower = epoch.saturating_sub(limit);
    let upper = epoch.saturating_add(1);

    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let Some(rest) = file_name.to_str().and_then(|n| n.strip_prefix(&prefix)) else {
            continue;
        };
        let path = entry.path();
        match parse_dump_name(rest) {
            DumpName::Epoch(found) if found < lower || found > upper => {
                match fs::remove_file(&path) {
                    Ok(()) => debug!(epoch = found, path = %path.display(), "Deleted ethash {what} file"),
                    Err(err) => error!(epoch = found, path = %path.display(), %err, "Failed to delete ethash {what} file"),
                }
            }
            DumpName::Legacy => match fs::remove_file(&path) {
                Ok(()) => warn!(path = %path.display(), "Deleted legacy ethash {what} file"),
                Err(err) => error!(path = %path.display(), %err, "Failed to remove legacy ethash {what} file"),
            },
            _ => {}
        }
    }
}
