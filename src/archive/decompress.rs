//! # Solution file decompression
//!
//! IGS products come as Unix `compress` archives (`.snx.Z`), mirrors sometimes serve gzip
//! (`.snx.gz`), and a local copy may be plain text. [`prepare_solution`] turns any of these
//! into a [`SolutionReader`] over the SINEX text:
//!
//! | suffix | handling                                                        |
//! |--------|-----------------------------------------------------------------|
//! | `.Z`   | expanded next to the archive with `gzip -dc`, then read plain   |
//! | `.gz`  | decoded while reading ([`flate2::read::GzDecoder`])             |
//! | other  | read as is                                                      |
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};

use camino::{Utf8Path, Utf8PathBuf};
use flate2::read::GzDecoder;
use tracing::{debug, info};

use crate::snxroster_errors::SnxRosterError;

/// Buffered reader over a plain or gzip-compressed solution file.
#[derive(Debug)]
pub enum SolutionReader {
    Plain(BufReader<File>),
    Gzip(BufReader<GzDecoder<File>>),
}

impl SolutionReader {
    /// Open `path`, decoding gzip when the name ends with `.gz`.
    pub fn open(path: &Utf8Path) -> Result<Self, SnxRosterError> {
        let file = File::open(path)?;
        if path.as_str().ends_with(".gz") {
            Ok(SolutionReader::Gzip(BufReader::new(GzDecoder::new(file))))
        } else {
            Ok(SolutionReader::Plain(BufReader::new(file)))
        }
    }
}

impl Read for SolutionReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            SolutionReader::Plain(reader) => reader.read(buf),
            SolutionReader::Gzip(reader) => reader.read(buf),
        }
    }
}

impl BufRead for SolutionReader {
    fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
        match self {
            SolutionReader::Plain(reader) => reader.fill_buf(),
            SolutionReader::Gzip(reader) => reader.fill_buf(),
        }
    }

    fn consume(&mut self, amount: usize) {
        match self {
            SolutionReader::Plain(reader) => reader.consume(amount),
            SolutionReader::Gzip(reader) => reader.consume(amount),
        }
    }
}

/// Expand a `.Z` archive next to itself and return the path of the expanded file.
///
/// `gzip -d` understands the LZW format of `compress`; the archive is left in place.
pub fn uncompress_unix(path: &Utf8Path) -> Result<Utf8PathBuf, SnxRosterError> {
    let target = match path.as_str().strip_suffix(".Z") {
        Some(stem) => Utf8PathBuf::from(stem),
        None => {
            return Err(SnxRosterError::Decompression(format!(
                "{path}: not a .Z archive"
            )))
        }
    };

    let output = File::create(&target)?;
    let status = Command::new("gzip")
        .arg("-dc")
        .arg(path.as_str())
        .stdout(Stdio::from(output))
        .stderr(Stdio::null())
        .status()
        .map_err(|e| SnxRosterError::Decompression(format!("{path}: gzip unavailable: {e}")))?;

    if !status.success() {
        let _ = std::fs::remove_file(&target);
        return Err(SnxRosterError::Decompression(format!(
            "{path}: gzip exited with {status}"
        )));
    }

    debug!(archive = %path, expanded = %target, "archive expanded");
    Ok(target)
}

/// Open a retrieved solution file whatever its compression.
pub fn prepare_solution(path: &Utf8Path) -> Result<SolutionReader, SnxRosterError> {
    info!(%path, "opening solution file");
    if path.as_str().ends_with(".Z") {
        let expanded = uncompress_unix(path)?;
        SolutionReader::open(&expanded)
    } else {
        SolutionReader::open(path)
    }
}

#[cfg(test)]
mod decompress_test {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;

    const TEXT: &str = "%=SNX 2.02\n+SOLUTION/ESTIMATE\n-SOLUTION/ESTIMATE\n%ENDSNX\n";

    fn tmp_dir() -> (tempfile::TempDir, Utf8PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(tmp.path()).unwrap().to_path_buf();
        (tmp, dir)
    }

    fn gzip_bytes(text: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    fn read_all(mut reader: SolutionReader) -> String {
        let mut content = String::new();
        reader.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_plain_file() {
        let (_tmp, dir) = tmp_dir();
        let path = dir.join("igs24P23053.snx");
        std::fs::write(&path, TEXT).unwrap();
        assert_eq!(read_all(prepare_solution(&path).unwrap()), TEXT);
    }

    #[test]
    fn test_gzip_file() {
        let (_tmp, dir) = tmp_dir();
        let path = dir.join("igs24P23053.snx.gz");
        std::fs::write(&path, gzip_bytes(TEXT)).unwrap();

        let reader = prepare_solution(&path).unwrap();
        assert!(matches!(reader, SolutionReader::Gzip(_)));
        assert_eq!(read_all(reader).lines().count(), 4);
    }

    #[test]
    fn test_uncompress_rejects_other_suffix() {
        let (_tmp, dir) = tmp_dir();
        assert!(matches!(
            uncompress_unix(&dir.join("igs24P23053.snx")),
            Err(SnxRosterError::Decompression(_))
        ));
    }

    #[test]
    fn test_uncompress_unix() {
        if Command::new("gzip").arg("--version").output().is_err() {
            return;
        }

        let (_tmp, dir) = tmp_dir();
        // gzip -d detects the container format from its magic bytes
        let path = dir.join("igs24P23053.snx.Z");
        std::fs::write(&path, gzip_bytes(TEXT)).unwrap();

        let expanded = uncompress_unix(&path).unwrap();
        assert_eq!(expanded, dir.join("igs24P23053.snx"));
        assert_eq!(std::fs::read_to_string(&expanded).unwrap(), TEXT);
        assert!(path.exists());
    }
}
