use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const PLAYLIST_HEADER: &str = "#EXTM3U";

/// Line-by-line M3U writer. UTF-8, LF endings, header written on create.
pub struct M3uWriter {
    path: PathBuf,
    out: BufWriter<File>,
    entries: usize,
}

impl M3uWriter {
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        out.write_all(PLAYLIST_HEADER.as_bytes())?;
        out.write_all(b"\n")?;
        Ok(Self {
            path: path.to_path_buf(),
            out,
            entries: 0,
        })
    }

    pub fn push(&mut self, entry: &str) -> io::Result<()> {
        self.out.write_all(entry.as_bytes())?;
        self.out.write_all(b"\n")?;
        self.entries += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn finish(mut self) -> io::Result<usize> {
        self.out.flush()?;
        Ok(self.entries)
    }
}
