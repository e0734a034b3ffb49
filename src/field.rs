use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use glam::DVec2;

use crate::tensor::Tensor;
use crate::{Error, Result};

/// Per-component access for field element types. Scalar fields store `f64`,
/// vector fields `DVec2`; the text layout streams one component at a time.
pub trait Component: Copy + Default {
    const COUNT: usize;
    fn component(&self, k: usize) -> f64;
    fn set_component(&mut self, k: usize, v: f64);
}

impl Component for f64 {
    const COUNT: usize = 1;

    #[inline]
    fn component(&self, _k: usize) -> f64 {
        *self
    }

    #[inline]
    fn set_component(&mut self, _k: usize, v: f64) {
        *self = v;
    }
}

impl Component for DVec2 {
    const COUNT: usize = 2;

    #[inline]
    fn component(&self, k: usize) -> f64 {
        match k {
            0 => self.x,
            _ => self.y,
        }
    }

    #[inline]
    fn set_component(&mut self, k: usize, v: f64) {
        match k {
            0 => self.x = v,
            _ => self.y = v,
        }
    }
}

/// A time-stamped grid of values.
#[derive(Clone, Debug)]
pub struct Field<T> {
    pub data: Tensor<T>,
    pub time: f64,
}

impl<T: Component> Field<T> {
    pub fn new(nx: usize, ny: usize) -> Self {
        Self {
            data: Tensor::new(nx, ny),
            time: 0.0,
        }
    }

    #[inline]
    pub fn nx(&self) -> usize {
        self.data.nx
    }

    #[inline]
    pub fn ny(&self) -> usize {
        self.data.ny
    }

    /// Replace the backing data. The shape must match.
    pub fn set_all(&mut self, data: Tensor<T>) -> Result<()> {
        if data.nx != self.data.nx || data.ny != self.data.ny {
            return Err(Error::ShapeMismatch {
                expected_nx: self.data.nx,
                expected_ny: self.data.ny,
                found_nx: data.nx,
                found_ny: data.ny,
            });
        }
        self.data = data;
        Ok(())
    }

    pub fn update_time(&mut self, time: f64) {
        self.time = time;
    }

    /// Persist as flat text: nx, ny, time, then one value per line,
    /// component-major (all x components row-major, then all y components;
    /// a single column for scalar fields).
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut w = BufWriter::new(file);
        writeln!(w, "{}", self.data.nx)?;
        writeln!(w, "{}", self.data.ny)?;
        writeln!(w, "{}", self.time)?;
        for k in 0..T::COUNT {
            for v in &self.data.data {
                writeln!(w, "{}", v.component(k))?;
            }
        }
        w.flush()?;
        Ok(())
    }

    /// Read a field persisted by [`Field::write_to_file`]. Fails with an I/O
    /// error if the file cannot be opened and with a shape error if the
    /// declared nx/ny differ from this field's shape; existing data is left
    /// untouched on any failure.
    pub fn read_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut lines = BufReader::new(file).lines();

        let malformed = |reason: &str| Error::Malformed {
            path: path.display().to_string(),
            reason: reason.to_string(),
        };
        let mut next_line = move |reason: &'static str| -> Result<String> {
            match lines.next() {
                Some(line) => Ok(line?),
                None => Err(Error::Malformed {
                    path: path.display().to_string(),
                    reason: format!("unexpected end of file reading {reason}"),
                }),
            }
        };

        let nx: usize = next_line("nx")?
            .trim()
            .parse()
            .map_err(|_| malformed("nx is not an integer"))?;
        let ny: usize = next_line("ny")?
            .trim()
            .parse()
            .map_err(|_| malformed("ny is not an integer"))?;
        if nx != self.data.nx || ny != self.data.ny {
            return Err(Error::ShapeMismatch {
                expected_nx: self.data.nx,
                expected_ny: self.data.ny,
                found_nx: nx,
                found_ny: ny,
            });
        }
        let time: f64 = next_line("time stamp")?
            .trim()
            .parse()
            .map_err(|_| malformed("time stamp is not a number"))?;

        let mut data: Tensor<T> = Tensor::new(nx, ny);
        for k in 0..T::COUNT {
            for v in data.data.iter_mut() {
                let value: f64 = next_line("field values")?
                    .trim()
                    .parse()
                    .map_err(|_| malformed("field value is not a number"))?;
                v.set_component(k, value);
            }
        }

        self.data = data;
        self.time = time;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_all_rejects_wrong_shape() {
        let mut f: Field<f64> = Field::new(3, 2);
        let wrong: Tensor<f64> = Tensor::new(2, 3);
        assert!(matches!(f.set_all(wrong), Err(Error::ShapeMismatch { .. })));
        let right: Tensor<f64> = Tensor::new(3, 2);
        assert!(f.set_all(right).is_ok());
    }
}
