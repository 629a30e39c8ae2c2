use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::info;

/// Error returned when an input file cannot be opened.
#[derive(Debug)]
pub struct OpenInputError {
    path: PathBuf,
    source: std::io::Error,
}

impl Display for OpenInputError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error opening file `{}`", self.path.display())
    }
}

impl Error for OpenInputError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

#[derive(Debug, Clone)]
pub struct InputFile {
    path: PathBuf,
}

impl Display for InputFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

pub fn input_file(path: &str) -> Result<InputFile, String> {
    let result = InputFile {
        path: PathBuf::from(path),
    };

    Ok(result)
}

impl InputFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_file(&self) -> Result<File, OpenInputError> {
        File::open(&self.path).map_err(|source| OpenInputError {
            path: self.path.clone(),
            source,
        })
    }

    /// Opens the file for buffered line reading.
    pub fn as_reader(&self) -> Result<BufReader<File>, OpenInputError> {
        info!("Input file: {}", self.path.display());
        Ok(BufReader::new(self.open_file()?))
    }

    /// Checks that the file can be opened, for inputs that are read by
    /// another library from their path.
    pub fn ensure_readable(&self) -> Result<(), OpenInputError> {
        self.open_file().map(drop)
    }

    pub fn length(&self) -> Result<u64, OpenInputError> {
        let file = self.open_file()?;
        let length = file
            .metadata()
            .map_err(|source| OpenInputError {
                path: self.path.clone(),
                source,
            })?
            .len();

        Ok(length)
    }
}
