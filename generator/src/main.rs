use anyhow::{bail, Context, Result};
use clap::{builder::PossibleValue, Parser, ValueEnum};
use haversine::haversine::{Answer, PointSets};
use haversine::{distance, earth, Point};
use log::info;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufWriter, Write};

#[derive(Clone, Debug)]
enum SelectionAlgorithm {
    Cluster,
    Uniform,
}

impl Display for SelectionAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cluster => f.write_str("cluster"),
            Self::Uniform => f.write_str("uniform"),
        }
    }
}

impl ValueEnum for SelectionAlgorithm {
    fn value_variants<'a>() -> &'a [Self] {
        &[SelectionAlgorithm::Cluster, SelectionAlgorithm::Uniform]
    }
    fn to_possible_value(&self) -> Option<PossibleValue> {
        match self {
            SelectionAlgorithm::Cluster => Some(PossibleValue::new("cluster")),
            SelectionAlgorithm::Uniform => Some(PossibleValue::new("uniform")),
        }
    }
}

#[derive(Parser, Debug)]
struct Args {
    #[arg(value_name = "RANDOM_SEED", required = true)]
    seed: u64,
    #[arg(value_name = "LEFT_COUNT", required = true)]
    left_count: usize,
    #[arg(value_name = "RIGHT_COUNT", required = true)]
    right_count: usize,
    #[arg(default_value_t = SelectionAlgorithm::Cluster, long)]
    algorithm: SelectionAlgorithm,
}

fn write_json(data: &PointSets, json_filename: &str) -> Result<()> {
    let output_file =
        File::create(json_filename).with_context(|| format!("creating {json_filename}"))?;
    let mut writer = BufWriter::new(output_file);

    serde_json::to_writer(&mut writer, data)?;
    writer.flush()?;
    Ok(())
}

fn pair_count(left: usize, right: usize) -> Result<usize> {
    match left.checked_mul(right) {
        Some(pairs) => Ok(pairs),
        None => bail!("{left} x {right} pairs do not fit in memory"),
    }
}

/// Reference distances over the whole product, in pairing order.
fn answer(left: &[Point], right: &[Point]) -> Result<Answer> {
    let mut distances = Vec::new();
    distances
        .try_reserve_exact(pair_count(left.len(), right.len())?)
        .context("allocating reference distances")?;
    for p in left {
        for q in right {
            distances.push(distance::naive(p, q, earth::RADIUS));
        }
    }
    Ok(Answer::from_distances(distances))
}

fn write_answer(answer: &Answer, binary_filename: &str) -> Result<()> {
    let output_file =
        File::create(binary_filename).with_context(|| format!("creating {binary_filename}"))?;
    let mut writer = BufWriter::new(output_file);
    answer.write(&mut writer)?;
    writer.flush()?;
    Ok(())
}

const CLUSTER_COUNT: usize = 20;

/// Sub-range of one cluster. Both bounds are inclusive, so a cluster whose
/// two samples coincide collapses to a single value.
fn cluster_range(min: f64, max: f64) -> Uniform<f64> {
    Uniform::new_inclusive(min, max)
}

/// Returns the smaller one then the larger one.
fn sample_two<R, D>(range: D, rng: &mut R) -> (f64, f64)
where
    R: Rng,
    D: Distribution<f64>,
{
    let x1 = range.sample(rng);
    let x2 = range.sample(rng);

    if x1 < x2 {
        (x1, x2)
    } else {
        (x2, x1)
    }
}

fn sample_point<R, D1, D2>(rng: &mut R, lat_range: D1, lon_range: D2) -> Point
where
    R: Rng,
    D1: Distribution<f64>,
    D2: Distribution<f64>,
{
    Point::new(lat_range.sample(rng), lon_range.sample(rng))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    println!("Method: {}", args.algorithm);
    println!("Random seed: {}", args.seed);
    println!("Point counts: {} x {}", args.left_count, args.right_count);

    let mut left = Vec::with_capacity(args.left_count);
    let mut right = Vec::with_capacity(args.right_count);
    let mut rng = StdRng::seed_from_u64(args.seed);

    let lat_range = Uniform::from(-90.0..90.0);
    let lon_range = Uniform::from(-180.0..180.0);

    match args.algorithm {
        SelectionAlgorithm::Uniform => {
            for _ in 0..args.left_count {
                left.push(sample_point(&mut rng, lat_range, lon_range));
            }
            for _ in 0..args.right_count {
                right.push(sample_point(&mut rng, lat_range, lon_range));
            }
        }
        SelectionAlgorithm::Cluster => {
            for count in [args.left_count, args.right_count] {
                if count % CLUSTER_COUNT != 0 {
                    bail!(
                        "Number of points {} is not a multiple of cluster count {CLUSTER_COUNT}",
                        count
                    );
                }
            }

            for cluster in 0..CLUSTER_COUNT {
                let (min_lat, max_lat) = sample_two(lat_range, &mut rng);
                let (min_lon, max_lon) = sample_two(lon_range, &mut rng);
                info!(
                    "cluster {cluster}: lat {min_lat:.3}..{max_lat:.3}, lon {min_lon:.3}..{max_lon:.3}"
                );

                let lat_range = cluster_range(min_lat, max_lat);
                let lon_range = cluster_range(min_lon, max_lon);

                for _ in 0..args.left_count / CLUSTER_COUNT {
                    left.push(sample_point(&mut rng, lat_range, lon_range));
                }
                for _ in 0..args.right_count / CLUSTER_COUNT {
                    right.push(sample_point(&mut rng, lat_range, lon_range));
                }
            }
        }
    }

    let stem = format!("points_{}x{}", args.left_count, args.right_count);
    let json_filename = format!("{stem}.json");
    write_json(&PointSets::from_points(&left, &right), &json_filename)?;
    info!("wrote {json_filename}");

    let answer = answer(&left, &right)?;
    println!("Expected mean: {}", answer.mean);

    let answer_filename = format!("{stem}_answer.f64");
    write_answer(&answer, &answer_filename)?;
    info!("wrote {answer_filename}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_follows_the_pairing_order() {
        let left = [Point::new(0.0, 0.0), Point::new(10.0, 10.0)];
        let right = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(-5.0, 3.0),
        ];
        let answer = answer(&left, &right).unwrap();
        assert_eq!(answer.distances.len(), 6);
        assert_eq!(answer.distances[0], 0.0);
        assert_eq!(answer.distances[4], 0.0);
        assert_eq!(
            answer.distances[5],
            distance::naive(&left[1], &right[2], earth::RADIUS)
        );
    }

    #[test]
    fn overflowing_products_are_refused() {
        assert_eq!(pair_count(3, 4).unwrap(), 12);
        assert!(pair_count(usize::MAX, 2).is_err());
    }

    #[test]
    fn coinciding_cluster_bounds_do_not_panic() {
        let mut rng = StdRng::seed_from_u64(11);
        let range = cluster_range(12.5, 12.5);
        for _ in 0..10 {
            assert_eq!(range.sample(&mut rng), 12.5);
        }
    }

    #[test]
    fn algorithm_flag_parses_through_clap() {
        let args = Args::try_parse_from(["generator", "1", "4", "8", "--algorithm", "uniform"]);
        assert!(matches!(args.unwrap().algorithm, SelectionAlgorithm::Uniform));

        let args = Args::try_parse_from(["generator", "1", "4", "8"]);
        assert!(matches!(args.unwrap().algorithm, SelectionAlgorithm::Cluster));

        let args = Args::try_parse_from(["generator", "1", "4", "8", "--algorithm", "x"]);
        assert!(args.is_err());
    }

    #[test]
    fn sample_two_orders_its_output() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let (lo, hi) = sample_two(Uniform::from(-1.0..1.0), &mut rng);
            assert!(lo <= hi);
        }
    }
}
