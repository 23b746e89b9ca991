use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

pub const N_SITES: usize = 10;
const DEPTH: u32 = 20;

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

// Reference-allele counts at depth 20; bg1 and bg2 are population A, bg3 is B.
const BG1: [u32; N_SITES] = [0, 10, 20, 10, 0, 20, 10, 10, 0, 20];
const BG2: [u32; N_SITES] = [2, 10, 18, 8, 0, 20, 12, 10, 2, 20];
const BG3: [u32; N_SITES] = [20, 10, 0, 10, 20, 0, 10, 0, 20, 0];

pub struct Dataset {
    pub labels: PathBuf,
    pub backgrounds: Vec<PathBuf>,
    pub samples: Vec<PathBuf>,
    pub output_dir: PathBuf,
}

pub fn base_dir(label: &str) -> io::Result<PathBuf> {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join("ancestry-predict-tests").join(format!(
        "{}-{}-{}",
        std::process::id(),
        id,
        label
    ));
    if dir.exists() {
        fs::remove_dir_all(&dir)?;
    }
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Three labelled background samples and two queries: `query_a` copies bg1,
/// `query_b` copies bg3.
pub fn create_dataset(label: &str) -> io::Result<Dataset> {
    let dir = base_dir(label)?;

    let labels = dir.join("panel.tsv");
    fs::write(
        &labels,
        "##panel written by the test suite\n\
         #sample_id\tpop\tsuperpop\n\
         bg1\tCEU\tA\n\
         bg2\tTSI\tA\n\
         bg3\tYRI\tB\n",
    )?;

    let backgrounds = vec![
        write_somalier(&dir, "bg1", &BG1)?,
        write_somalier(&dir, "bg2", &BG2)?,
        write_somalier(&dir, "bg3", &BG3)?,
    ];
    let samples = vec![
        write_somalier(&dir, "query_a", &BG1)?,
        write_somalier(&dir, "query_b", &BG3)?,
    ];

    Ok(Dataset {
        output_dir: dir.join("output"),
        labels,
        backgrounds,
        samples,
    })
}

pub fn write_somalier(dir: &Path, id: &str, refs: &[u32]) -> io::Result<PathBuf> {
    let path = dir.join(format!("{id}.somalier"));
    let mut f = File::create(&path)?;
    f.write_all(&somalier_bytes(2, id, refs))?;
    Ok(path)
}

pub fn somalier_bytes(version: u8, id: &str, refs: &[u32]) -> Vec<u8> {
    let mut bytes = vec![version, id.len() as u8];
    bytes.extend_from_slice(id.as_bytes());
    bytes.extend_from_slice(&(refs.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes()); // nx
    bytes.extend_from_slice(&0u16.to_le_bytes()); // ny
    for &r in refs {
        bytes.extend_from_slice(&r.to_le_bytes());
        bytes.extend_from_slice(&(DEPTH - r).to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
    }
    bytes
}

pub fn write_pairs(dir: &Path) -> io::Result<PathBuf> {
    let path = dir.join("somalier.pairs.tsv");
    fs::write(
        &path,
        "#sample_a\tsample_b\trelatedness\tibs0\tibs2\thom_concordance\texpected_relatedness\n\
         bg1\tbg2\t0.02\t4100\t9800\t0.1\t-1\n\
         bg1\tbg3\t0.48\t12\t15000\t0.8\t-1\n\
         bg1\tbg1_rep\t1.00\t0\t19000\t1.0\t1\n\
         bg2\tbg3\t0.01\t599\t9000\t0.0\t-1\n",
    )?;
    Ok(path)
}
