//! Suppliers of the particle sequence for each round.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::{config::InputHeader, error::Result, geometry::Point, tools::seeded_rng};

/// Supplies the full, ordered particle sequence of one round.
///
/// A source is only consulted on the root rank and is asked again at the
/// start of every round.
pub trait PointSource {
    /// Return the next `count` particles.
    fn next_round(&mut self, count: usize) -> Result<Vec<Point>>;
}

/// Particles read from a binary stream of native-endian `(f64, f64)` records.
///
/// Rounds consume the stream sequentially, so a stream for `n` rounds of `m`
/// particles holds `n * m` records after the header.
pub struct RecordStream<R> {
    reader: R,
}

impl<R: Read> RecordStream<R> {
    /// Wrap a reader positioned at the first record.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read the header from `reader` and return it with a stream over the records.
    pub fn with_header(mut reader: R) -> Result<(InputHeader, Self)> {
        let header = InputHeader::read(&mut reader)?;
        Ok((header, Self::new(reader)))
    }
}

impl RecordStream<BufReader<File>> {
    /// Open an input file and read its header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<(InputHeader, Self)> {
        Self::with_header(BufReader::new(File::open(path)?))
    }
}

impl<R: Read> PointSource for RecordStream<R> {
    fn next_round(&mut self, count: usize) -> Result<Vec<Point>> {
        let mut records = vec![[0.0_f64; 2]; count];
        self.reader
            .read_exact(bytemuck::cast_slice_mut(&mut records[..]))?;

        Ok(records.into_iter().map(|[x, y]| Point::new(x, y)).collect())
    }
}

/// Uniformly distributed particles in the unit square from a seeded generator.
pub struct SyntheticSource {
    rng: ChaCha8Rng,
}

impl SyntheticSource {
    /// Create a source from a seed. Equal seeds give equal sequences.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: seeded_rng(seed),
        }
    }
}

impl PointSource for SyntheticSource {
    fn next_round(&mut self, count: usize) -> Result<Vec<Point>> {
        Ok((0..count)
            .map(|_| Point::new(self.rng.gen(), self.rng.gen()))
            .collect())
    }
}

/// Encode particle coordinates as input records, the inverse of [RecordStream].
pub fn encode_records(points: &[Point]) -> Vec<u8> {
    let records: Vec<[f64; 2]> = points.iter().map(|p| [p.x, p.y]).collect();
    bytemuck::cast_slice(&records[..]).to_vec()
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::{encode_records, PointSource, RecordStream, SyntheticSource};
    use crate::{config::InputHeader, error::Error, geometry::Point};

    #[test]
    fn test_rounds_are_read_sequentially() {
        let header = InputHeader {
            num_x: 4,
            num_y: 4,
            total_points: 2,
            max_iterations: 2,
        };
        let points = [
            Point::new(0.1, 0.2),
            Point::new(0.3, 0.4),
            Point::new(0.5, 0.6),
            Point::new(0.7, 0.8),
        ];

        let mut bytes = header.to_bytes();
        bytes.extend(encode_records(&points));

        let (read_header, mut stream) = RecordStream::with_header(Cursor::new(bytes)).unwrap();
        assert_eq!(read_header, header);

        assert_eq!(stream.next_round(2).unwrap(), &points[..2]);
        assert_eq!(stream.next_round(2).unwrap(), &points[2..]);
        assert!(matches!(stream.next_round(2), Err(Error::Io(_))));
    }

    #[test]
    fn test_short_stream_is_an_error() {
        let bytes = encode_records(&[Point::new(0.5, 0.5)]);
        let mut stream = RecordStream::new(Cursor::new(bytes));

        assert!(matches!(stream.next_round(2), Err(Error::Io(_))));
    }

    #[test]
    fn test_missing_input_file() {
        let path = std::env::temp_dir().join("cic-deposit-no-such-input.bin");

        assert!(matches!(RecordStream::open(&path), Err(Error::Io(_))));
    }

    #[test]
    fn test_synthetic_source() {
        let first = SyntheticSource::new(3).next_round(500).unwrap();
        let second = SyntheticSource::new(3).next_round(500).unwrap();

        assert_eq!(first, second);
        assert!(first
            .iter()
            .all(|p| (0.0..1.0).contains(&p.x) && (0.0..1.0).contains(&p.y) && p.weight == 1.0));

        let mut source = SyntheticSource::new(3);
        let round_one = source.next_round(10).unwrap();
        let round_two = source.next_round(10).unwrap();
        assert_ne!(round_one, round_two);
    }
}
