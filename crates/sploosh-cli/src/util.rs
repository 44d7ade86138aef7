use std::{
    fs::File,
    io::{self, BufWriter, StdoutLock, Write as _},
    path::PathBuf,
    str::FromStr,
};

use anyhow::Context as _;
use sploosh_engine::Square;

/// Destination of a JSON report.
#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    /// Writes `value` as pretty JSON to `output_path`, or to stdout when `None`.
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = Output::from_output_path(output_path)?;
        output.write_json(value)
    }

    pub fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    pub fn write_json<T>(&mut self, value: T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, &value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(&mut *self).with_context(|| {
            format!(
                "Failed to write newline after JSON to {}",
                self.display_path()
            )
        })?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("expected a cell as `x,y` with both coordinates in 0..8, got `{input}`")]
pub struct ParseSquareError {
    input: String,
}

/// A grid cell given on the command line as `x,y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquareArg(pub Square);

impl FromStr for SquareArg {
    type Err = ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || ParseSquareError {
            input: s.to_owned(),
        };
        let (x, y) = s.split_once(',').ok_or_else(error)?;
        let x = x.trim().parse().map_err(|_| error())?;
        let y = y.trim().parse().map_err(|_| error())?;
        Square::new(x, y).map(SquareArg).ok_or_else(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_square() {
        let SquareArg(square) = "3,5".parse().unwrap();
        assert_eq!((square.x(), square.y()), (3, 5));
        let SquareArg(square) = " 0 , 7 ".parse().unwrap();
        assert_eq!((square.x(), square.y()), (0, 7));

        for input in ["", "3", "3;5", "8,0", "0,8", "-1,2", "a,b"] {
            assert!(input.parse::<SquareArg>().is_err(), "{input}");
        }
    }
}
