use std::fmt::{Debug, Display, Formatter};

use arbitrary::{Arbitrary, Unstructured};

use crate::error::InvalidInput;

/// A geographic coordinate in decimal degrees.
///
/// Ranges are not checked: a latitude of 100 is accepted and simply goes
/// through the trigonometry like any other angle.
#[derive(Clone, Copy, PartialEq)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

impl Point {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Point {
        Point {
            latitude,
            longitude,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Point::new(latitude, longitude)
    }
}

impl From<[f64; 2]> for Point {
    fn from([latitude, longitude]: [f64; 2]) -> Self {
        Point::new(latitude, longitude)
    }
}

impl Debug for Point {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "lat: {} ({:?}), lon: {} ({:?})",
            self.latitude,
            self.latitude.to_be_bytes(),
            self.longitude,
            self.longitude.to_be_bytes(),
        ))
    }
}

/// Points with finite coordinates inside the usual ranges, at micro-degree
/// resolution.
impl<'a> Arbitrary<'a> for Point {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let latitude = u.int_in_range(-90_000_000..=90_000_000_i32)?;
        let longitude = u.int_in_range(-180_000_000..=180_000_000_i32)?;
        Ok(Point::new(
            f64::from(latitude) / 1e6,
            f64::from(longitude) / 1e6,
        ))
    }
}

/// Which of the two point sets an input problem was found in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Side {
    Left,
    Right,
}

impl Display for Side {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// Builds points from raw `[latitude, longitude]` rows, such as lists read out
/// of a JSON document.
pub fn parse_rows<R>(side: Side, rows: &[R]) -> Result<Vec<Point>, InvalidInput>
where
    R: AsRef<[f64]>,
{
    rows.iter()
        .enumerate()
        .map(|(index, row)| match *row.as_ref() {
            [latitude, longitude] => {
                let point = Point::new(latitude, longitude);
                if point.is_finite() {
                    Ok(point)
                } else {
                    Err(InvalidInput::NonFinite { side, index })
                }
            }
            ref other => Err(InvalidInput::Arity {
                side,
                index,
                len: other.len(),
            }),
        })
        .collect()
}

/// Returns the index of the first point with a NaN or infinite component.
pub(crate) fn first_non_finite(points: &[Point]) -> Option<usize> {
    points.iter().position(|p| !p.is_finite())
}
