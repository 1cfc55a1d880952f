//! File utilities behind the internal commands.
//!
//! Each operation takes file names, performs a single sequence of system calls
//! and reports failures as plain [`io::Error`]s. None of them touch interpreter
//! state.

use chrono::{DateTime, Local};
use std::ffi::CStr;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::os::unix::fs::{MetadataExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

/// Appended to the source name when `copy` is not given a destination.
pub const COPY_SUFFIX: &str = ".copia";

const BUFFER_SIZE: usize = 4096;
const LIST_COLUMN_WIDTH: usize = 30;
const CTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Stream the whole file to `out`. Returns the number of bytes written.
pub fn show_file(path: &Path, out: &mut dyn Write) -> io::Result<u64> {
    let mut file = File::open(path)?;
    io::copy(&mut file, out)
}

/// Copy `src` into `dest`, creating it with owner read/write permissions or
/// truncating it if it exists.
///
/// Refuses to copy a file onto itself, which would truncate the source.
pub fn copy_file(src: &Path, dest: &Path) -> io::Result<u64> {
    let mut input = File::open(src)?;
    match fs::metadata(dest) {
        Ok(existing) => ensure_distinct(&input.metadata()?, &existing)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    let mut output = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(dest)?;
    io::copy(&mut input, &mut output)
}

/// `<src>.copia`, next to the source.
pub fn default_copy_destination(src: &Path) -> PathBuf {
    let mut name = src.as_os_str().to_owned();
    name.push(COPY_SUFFIX);
    PathBuf::from(name)
}

/// Append the bytes of `src` to `dest`. The destination must already exist
/// and must not be the source.
pub fn append_file(src: &Path, dest: &Path) -> io::Result<u64> {
    let mut input = File::open(src)?;
    let mut output = OpenOptions::new().append(true).open(dest)?;
    ensure_distinct(&input.metadata()?, &output.metadata()?)?;
    io::copy(&mut input, &mut output)
}

/// Same device and inode means the same file, whatever names reach it.
fn ensure_distinct(src: &fs::Metadata, dest: &fs::Metadata) -> io::Result<()> {
    if src.dev() == dest.dev() && src.ino() == dest.ino() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "source and destination are the same file",
        ));
    }
    Ok(())
}

/// Number of newline bytes in the file. A final line without a terminator is
/// not counted.
pub fn count_lines(path: &Path) -> io::Result<usize> {
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, File::open(path)?);
    let mut buffer = [0u8; BUFFER_SIZE];
    let mut lines = 0;
    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            return Ok(lines);
        }
        lines += buffer[..read].iter().filter(|&&b| b == b'\n').count();
    }
}

/// Remove a directory entry. Directories themselves are refused.
pub fn delete_file(path: &Path) -> io::Result<()> {
    fs::remove_file(path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Regular,
    Directory,
    Symlink,
    Unknown,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileKind::Regular => "regular file",
            FileKind::Directory => "directory",
            FileKind::Symlink => "symbolic link",
            FileKind::Unknown => "unknown",
        })
    }
}

/// Metadata summary printed by `info`.
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub name: String,
    pub kind: FileKind,
    pub owner: String,
    pub inode: u64,
    /// Last status change (`st_ctime`).
    pub changed: DateTime<Local>,
    pub accessed: DateTime<Local>,
    pub modified: DateTime<Local>,
}

/// Collect [`FileInfo`] for `path` without following a trailing symlink.
/// `name` is the label shown in the report.
pub fn file_info(name: &str, path: &Path) -> io::Result<FileInfo> {
    let meta = fs::symlink_metadata(path)?;
    let file_type = meta.file_type();
    let kind = if file_type.is_symlink() {
        FileKind::Symlink
    } else if file_type.is_dir() {
        FileKind::Directory
    } else if file_type.is_file() {
        FileKind::Regular
    } else {
        FileKind::Unknown
    };

    Ok(FileInfo {
        name: name.to_string(),
        kind,
        owner: owner_name(meta.uid()),
        inode: meta.ino(),
        changed: local_time(meta.ctime(), meta.ctime_nsec()),
        accessed: local_time(meta.atime(), meta.atime_nsec()),
        modified: local_time(meta.mtime(), meta.mtime_nsec()),
    })
}

impl fmt::Display for FileInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "     File: {}", self.name)?;
        writeln!(f, "     Type: {}", self.kind)?;
        writeln!(f, "    Owner: {}", self.owner)?;
        writeln!(f, "    Inode: {}", self.inode)?;
        writeln!(f, " Creation: {}", self.changed.format(CTIME_FORMAT))?;
        writeln!(f, "   Access: {}", self.accessed.format(CTIME_FORMAT))?;
        writeln!(f, "   Change: {}", self.modified.format(CTIME_FORMAT))
    }
}

fn local_time(secs: i64, nsecs: i64) -> DateTime<Local> {
    let nsecs = u32::try_from(nsecs).unwrap_or(0);
    DateTime::from_timestamp(secs, nsecs)
        .unwrap_or_default()
        .with_timezone(&Local)
}

/// User name for `uid`, or the numeric id when the password database has no entry.
fn owner_name(uid: u32) -> String {
    let mut buf = vec![0 as libc::c_char; 1024];
    // SAFETY: zeroed `passwd` is a valid out-parameter; getpwuid_r only writes
    // into it and into `buf`, both of which outlive the call.
    let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
    let mut result: *mut libc::passwd = std::ptr::null_mut();
    let rc = unsafe {
        libc::getpwuid_r(uid, &mut pwd, buf.as_mut_ptr(), buf.len(), &mut result)
    };
    if rc != 0 || result.is_null() || pwd.pw_name.is_null() {
        return uid.to_string();
    }
    // SAFETY: on success pw_name points at a NUL-terminated string inside `buf`.
    unsafe { CStr::from_ptr(pwd.pw_name) }
        .to_string_lossy()
        .into_owned()
}

/// Print `dir` followed by each of its entries, tagged `[directory]` or `[file]`.
///
/// Entries are sorted by name. An entry that cannot be stat'ed is reported on
/// `err` and skipped; only failing to open the directory is an error.
pub fn list_dir(label: &str, dir: &Path, out: &mut dyn Write, err: &mut dyn Write) -> io::Result<()> {
    let mut entries = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    writeln!(out, "{label:<width$}\t[directory]", width = LIST_COLUMN_WIDTH)?;
    for entry in entries {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        // fs::metadata follows symlinks, so a link to a directory lists as one.
        match fs::metadata(entry.path()) {
            Ok(meta) => {
                let tag = if meta.is_dir() { "[directory]" } else { "[file]" };
                writeln!(out, "{name:<width$}\t{tag}", width = LIST_COLUMN_WIDTH)?;
            }
            Err(e) => {
                writeln!(err, "Error stating file '{}': {e}", entry.path().display())?;
            }
        }
    }
    Ok(())
}
