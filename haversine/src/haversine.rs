//! On-disk formats shared by the generator and the app.
//!
//! Point sets travel as JSON, `{"left": [[lat, lon], ...], "right": [...]}`.
//! Answers are little-endian `f64` distances in pairing order, followed by
//! one more `f64` holding their mean.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{self, Read, Write};

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::error::InvalidInput;
use crate::point::{self, Point, Side};

#[derive(Debug, Serialize, Deserialize)]
pub struct PointSets {
    pub left: Vec<Vec<f64>>,
    pub right: Vec<Vec<f64>>,
}

impl PointSets {
    pub fn from_points(left: &[Point], right: &[Point]) -> PointSets {
        let rows = |points: &[Point]| -> Vec<Vec<f64>> {
            points
                .iter()
                .map(|p| vec![p.latitude, p.longitude])
                .collect()
        };
        PointSets {
            left: rows(left),
            right: rows(right),
        }
    }

    pub fn points(&self) -> Result<(Vec<Point>, Vec<Point>), InvalidInput> {
        Ok((
            point::parse_rows(Side::Left, &self.left)?,
            point::parse_rows(Side::Right, &self.right)?,
        ))
    }
}

#[derive(Debug, PartialEq)]
pub struct Answer {
    pub distances: Vec<f64>,
    pub mean: f64,
}

#[derive(Debug)]
pub enum AnswerReadError {
    Io(io::Error),
    /// The file size is not a whole number of `f64`s.
    Misaligned(usize),
    /// Not even the trailing mean is present.
    Empty,
}

impl From<io::Error> for AnswerReadError {
    fn from(value: io::Error) -> Self {
        AnswerReadError::Io(value)
    }
}

impl Display for AnswerReadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AnswerReadError::Io(e) => write!(f, "failed to read answer: {e}"),
            AnswerReadError::Misaligned(len) => {
                write!(f, "answer of {len} bytes is not a multiple of 8")
            }
            AnswerReadError::Empty => f.write_str("answer holds no values"),
        }
    }
}

impl Error for AnswerReadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AnswerReadError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl Answer {
    pub fn from_distances(distances: Vec<f64>) -> Answer {
        let mut mean: f64 = 0.0;
        for (count, distance) in distances.iter().enumerate() {
            let n = count as f64 + 1.0;
            mean = ((1.0 - (1.0 / n)) * mean) + (distance / n);
        }
        Answer { distances, mean }
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for &distance in &self.distances {
            writer.write_f64::<LittleEndian>(distance)?;
        }
        writer.write_f64::<LittleEndian>(self.mean)
    }

    pub fn read<R: Read>(reader: &mut R) -> Result<Answer, AnswerReadError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        if bytes.len() % 8 != 0 {
            return Err(AnswerReadError::Misaligned(bytes.len()));
        }
        if bytes.is_empty() {
            return Err(AnswerReadError::Empty);
        }

        let mut values = vec![0.0; bytes.len() / 8];
        LittleEndian::read_f64_into(&bytes, &mut values);
        let mean = values.pop().unwrap_or_default();
        Ok(Answer {
            distances: values,
            mean,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_layout_is_distances_then_mean() {
        let answer = Answer::from_distances(vec![2.0, 4.0]);
        assert_eq!(answer.mean, 3.0);

        let mut bytes = Vec::new();
        answer.write(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 24);
        assert_eq!(LittleEndian::read_f64(&bytes[16..]), 3.0);

        assert_eq!(Answer::read(&mut bytes.as_slice()).unwrap(), answer);
    }

    #[test]
    fn malformed_answers_are_rejected() {
        assert!(matches!(
            Answer::read(&mut [0u8; 12].as_slice()),
            Err(AnswerReadError::Misaligned(12))
        ));
        assert!(matches!(
            Answer::read(&mut [0u8; 0].as_slice()),
            Err(AnswerReadError::Empty)
        ));
    }

    #[test]
    fn point_sets_parse_from_json() {
        let json = r#"{"left": [[1.01, 1.01]], "right": [[2.01, 2.01], [3.01, 3.01]]}"#;
        let sets: PointSets = serde_json::from_str(json).unwrap();
        let (left, right) = sets.points().unwrap();
        assert_eq!(left, vec![Point::new(1.01, 1.01)]);
        assert_eq!(right.len(), 2);
    }

    #[test]
    fn ragged_json_rows_are_invalid() {
        let json = r#"{"left": [[1.0, 2.0]], "right": [[2.0]]}"#;
        let sets: PointSets = serde_json::from_str(json).unwrap();
        assert_eq!(
            sets.points(),
            Err(InvalidInput::Arity {
                side: Side::Right,
                index: 0,
                len: 1
            })
        );
    }

    #[test]
    fn non_numeric_json_does_not_deserialize() {
        let json = r#"{"left": [["north", 2.0]], "right": []}"#;
        assert!(serde_json::from_str::<PointSets>(json).is_err());
    }
}
