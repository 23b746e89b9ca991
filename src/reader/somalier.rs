use indicatif::{ProgressBar, ProgressStyle};
use memmap2::Mmap;
use rayon::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{CustomError, Result};
use crate::model::{Sample, SiteRecord};

pub const SOMALIER_VERSION: u8 = 2;
const SITE_RECORD_BYTES: usize = 12;

// Layout (little-endian):
//   u8 version | u8 id_len | id bytes | u16 n | u16 nx | u16 ny
//   n * (u32 ref, u32 alt, u32 other) | nx * (...) | ny * (...)
pub fn decode(bytes: &[u8]) -> Result<Sample> {
    let mut cursor = Cursor::new(bytes);

    let version = cursor.take("format version", 1)?[0];
    if version != SOMALIER_VERSION {
        return Err(CustomError::SomalierVersion {
            found: version,
            expected: SOMALIER_VERSION,
        });
    }

    let id_len = cursor.take("sample id length", 1)?[0] as usize;
    let id = std::str::from_utf8(cursor.take("sample id", id_len)?)
        .map_err(|e| CustomError::SomalierSampleId { source: e })?
        .to_string();

    let n_autosomal = cursor.u16("autosomal site count")? as usize;
    let n_x = cursor.u16("X site count")? as usize;
    let n_y = cursor.u16("Y site count")? as usize;

    let autosomal = cursor.sites("autosomal sites", n_autosomal)?;
    let x = cursor.sites("X sites", n_x)?;
    let y = cursor.sites("Y sites", n_y)?;

    if cursor.remaining() > 0 {
        return Err(CustomError::SomalierTrailingBytes {
            extra: cursor.remaining(),
        });
    }

    Ok(Sample {
        id,
        autosomal,
        x,
        y,
    })
}

pub fn encode(sample: &Sample) -> Result<Vec<u8>> {
    check_len("sample id", sample.id.len(), u8::MAX as usize)?;
    check_len("autosomal sites", sample.autosomal.len(), u16::MAX as usize)?;
    check_len("X sites", sample.x.len(), u16::MAX as usize)?;
    check_len("Y sites", sample.y.len(), u16::MAX as usize)?;

    let n_records = sample.autosomal.len() + sample.x.len() + sample.y.len();
    let mut out = Vec::with_capacity(8 + sample.id.len() + n_records * SITE_RECORD_BYTES);
    out.push(SOMALIER_VERSION);
    out.push(sample.id.len() as u8);
    out.extend_from_slice(sample.id.as_bytes());
    for len in [sample.autosomal.len(), sample.x.len(), sample.y.len()] {
        out.extend_from_slice(&(len as u16).to_le_bytes());
    }
    for site in sample.autosomal.iter().chain(&sample.x).chain(&sample.y) {
        out.extend_from_slice(&site.reference.to_le_bytes());
        out.extend_from_slice(&site.alternate.to_le_bytes());
        out.extend_from_slice(&site.other.to_le_bytes());
    }
    Ok(out)
}

fn check_len(what: &'static str, len: usize, max: usize) -> Result<()> {
    if len > max {
        return Err(CustomError::SomalierEncodeLength { what, len, max });
    }
    Ok(())
}

pub fn read_sample(path: &impl AsRef<Path>) -> Result<Sample> {
    let path = path.as_ref();
    let f = File::open(path).map_err(|e| CustomError::ReadWithPath {
        source: e,
        path: path.to_path_buf(),
    })?;
    // Safety: the file is only read, and is not expected to change while mapped.
    let mmap = unsafe { Mmap::map(&f) }.map_err(|e| CustomError::ReadWithPath {
        source: e,
        path: path.to_path_buf(),
    })?;
    decode(&mmap).map_err(|e| CustomError::SampleFile {
        source: Box::new(e),
        path: path.to_path_buf(),
    })
}

/// Decode every file in parallel. Samples are returned in the order of `paths`.
pub fn read_samples(paths: &[PathBuf]) -> Result<Vec<Sample>> {
    let pb = ProgressBar::new(paths.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:30} {pos}/{len} files")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let samples = paths
        .par_iter()
        .map(|path| {
            let sample = read_sample(path);
            pb.inc(1);
            sample
        })
        .collect::<Result<Vec<_>>>();
    pb.abandon();
    samples
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, section: &'static str, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(CustomError::SomalierTruncated {
                section,
                needed: n,
                available: self.remaining(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u16(&mut self, section: &'static str) -> Result<u16> {
        let b = self.take(section, 2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn sites(&mut self, section: &'static str, n: usize) -> Result<Vec<SiteRecord>> {
        let block = self.take(section, n * SITE_RECORD_BYTES)?;
        Ok(block
            .chunks_exact(SITE_RECORD_BYTES)
            .map(|rec| {
                let field = |i: usize| {
                    u32::from_le_bytes([rec[4 * i], rec[4 * i + 1], rec[4 * i + 2], rec[4 * i + 3]])
                };
                SiteRecord::new(field(0), field(1), field(2))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Sample {
        Sample {
            id: "NA12878".to_string(),
            autosomal: vec![
                SiteRecord::new(10, 0, 0),
                SiteRecord::new(4, 6, 1),
                SiteRecord::new(0, 0, 0),
            ],
            x: vec![SiteRecord::new(7, 7, 0)],
            y: vec![],
        }
    }

    #[test]
    fn decodes_hand_built_bytes() {
        let mut bytes = vec![2u8, 2, b'S', b'1'];
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        for v in [3u32, 4, 5, 0xdead_beef, 1, 0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }

        let s = decode(&bytes).expect("valid file");
        assert_eq!(s.id, "S1");
        assert_eq!(s.autosomal, vec![SiteRecord::new(3, 4, 5)]);
        assert!(s.x.is_empty());
        assert_eq!(s.y, vec![SiteRecord::new(0xdead_beef, 1, 0)]);
    }

    #[test]
    fn encode_decode_round_trip() {
        let bytes = encode(&sample()).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, sample());
        assert_eq!(decoded.autosomal.len(), 3);
        assert_eq!(encode(&decoded).unwrap(), bytes);
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut bytes = encode(&sample()).unwrap();
        bytes[0] = 3;
        match decode(&bytes).unwrap_err() {
            CustomError::SomalierVersion { found, expected } => {
                assert_eq!(found, 3);
                assert_eq!(expected, SOMALIER_VERSION);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_truncated_records() {
        let bytes = encode(&sample()).unwrap();
        let err = decode(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(
            err,
            CustomError::SomalierTruncated {
                section: "X sites",
                ..
            }
        ));
    }

    #[test]
    fn rejects_truncated_header() {
        let err = decode(&[2u8, 5, b'a']).unwrap_err();
        assert!(matches!(
            err,
            CustomError::SomalierTruncated {
                section: "sample id",
                needed: 5,
                available: 1
            }
        ));
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut bytes = encode(&sample()).unwrap();
        bytes.extend_from_slice(&[0u8; 12]);
        assert!(matches!(
            decode(&bytes).unwrap_err(),
            CustomError::SomalierTrailingBytes { extra: 12 }
        ));
    }

    #[test]
    fn rejects_invalid_utf8_id() {
        let mut s = sample();
        s.id = "ab".to_string();
        let mut bytes = encode(&s).unwrap();
        bytes[2] = 0xff;
        assert!(matches!(
            decode(&bytes).unwrap_err(),
            CustomError::SomalierSampleId { .. }
        ));
    }

    #[test]
    fn encode_rejects_long_id() {
        let mut s = sample();
        s.id = "x".repeat(256);
        assert!(matches!(
            encode(&s).unwrap_err(),
            CustomError::SomalierEncodeLength { len: 256, .. }
        ));
    }

    #[test]
    fn reads_files_in_input_order() {
        let dir = std::env::temp_dir().join(format!("ancestry-somalier-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut paths = Vec::new();
        for i in 0..6 {
            let mut s = sample();
            s.id = format!("sample{i}");
            let path = dir.join(format!("sample{i}.somalier"));
            std::fs::write(&path, encode(&s).unwrap()).unwrap();
            paths.push(path);
        }

        let samples = read_samples(&paths).unwrap();
        let ids: Vec<_> = samples.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            ["sample0", "sample1", "sample2", "sample3", "sample4", "sample5"]
        );
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn read_error_names_the_file() {
        let dir = std::env::temp_dir().join(format!("ancestry-badfile-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.somalier");
        std::fs::write(&path, [1u8, 0]).unwrap();

        match read_sample(&path).unwrap_err() {
            CustomError::SampleFile { source, path: p } => {
                assert_eq!(p, path);
                assert!(matches!(*source, CustomError::SomalierVersion { found: 1, .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
