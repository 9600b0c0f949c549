/// Mean radius of the Earth in metres.
pub const RADIUS: f64 = 6_371_000.0;
