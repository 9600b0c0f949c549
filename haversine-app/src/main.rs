use anyhow::{bail, Context, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use clap::{builder::PossibleValue, Parser, ValueEnum};
use haversine::haversine::{Answer, PointSets};
use haversine::options::DEFAULT_CHUNK_SIZE;
use haversine::{earth, evaluate, for_each_block, Backend, DistanceResult, Options, Point, Real};
use log::info;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Clone, Copy, Debug)]
struct BackendArg(Backend);

impl ValueEnum for BackendArg {
    fn value_variants<'a>() -> &'a [Self] {
        &[
            BackendArg(Backend::Auto),
            BackendArg(Backend::Cpu),
            BackendArg(Backend::Parallel),
        ]
    }
    fn to_possible_value(&self) -> Option<PossibleValue> {
        match self.0 {
            Backend::Auto => Some(PossibleValue::new("auto")),
            Backend::Cpu => Some(PossibleValue::new("cpu")),
            Backend::Parallel => Some(PossibleValue::new("parallel").alias("accelerated")),
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Precision {
    Single,
    Double,
}

#[derive(Parser, Debug)]
struct Args {
    #[arg(value_name = "INPUT_JSON", required = true)]
    input_json: PathBuf,
    #[arg(value_name = "ANSWER_F64")]
    answer: Option<PathBuf>,
    #[arg(long, value_enum, default_value = "auto")]
    backend: BackendArg,
    #[arg(long, value_enum, default_value = "single")]
    precision: Precision,
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
    #[arg(long, default_value_t = earth::RADIUS)]
    radius: f64,
    /// Produce the flat product instead of a matrix.
    #[arg(long)]
    flat: bool,
    /// Refuse to hold more than this many bytes of distances.
    #[arg(long)]
    memory_limit: Option<usize>,
    /// Compute block by block without holding the whole product.
    #[arg(long)]
    stream: bool,
    /// Write the distances here, little-endian, in the working precision.
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Args {
    fn options(&self) -> Options {
        Options::default()
            .with_matrix(!self.flat)
            .with_radius(self.radius)
            .with_backend(self.backend.0)
            .with_chunk_size(self.chunk_size)
            .with_memory_limit(self.memory_limit)
    }
}

/// A working precision that knows its little-endian encoding.
trait Sample: Real {
    fn write_le<W: Write>(self, writer: &mut W) -> io::Result<()>;
}

impl Sample for f32 {
    fn write_le<W: Write>(self, writer: &mut W) -> io::Result<()> {
        writer.write_f32::<LittleEndian>(self)
    }
}

impl Sample for f64 {
    fn write_le<W: Write>(self, writer: &mut W) -> io::Result<()> {
        writer.write_f64::<LittleEndian>(self)
    }
}

fn read_json(json_filename: &Path) -> Result<(Vec<Point>, Vec<Point>)> {
    let file = File::open(json_filename)
        .with_context(|| format!("opening {}", json_filename.display()))?;
    let sets: PointSets = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", json_filename.display()))?;
    Ok(sets.points()?)
}

fn read_answer(binary_filename: &Path) -> Result<Answer> {
    let file = File::open(binary_filename)
        .with_context(|| format!("opening {}", binary_filename.display()))?;
    Ok(Answer::read(&mut BufReader::new(file))?)
}

/// Running totals over the distances seen so far, in pairing order.
#[derive(Debug, Default)]
struct Summary {
    count: usize,
    sum: f64,
    max_difference: f64,
    total_difference: f64,
}

impl Summary {
    fn observe<T: Real>(&mut self, distances: &[T], answer: Option<&Answer>) {
        let expected = answer.map(|a| &a.distances[self.count..self.count + distances.len()]);
        for (k, d) in distances.iter().enumerate() {
            let d = d.to_f64();
            self.sum += d;
            if let Some(expected) = expected {
                let difference = (d - expected[k]).abs();
                self.max_difference = self.max_difference.max(difference);
                self.total_difference += difference;
            }
        }
        self.count += distances.len();
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    fn report(&self, answer: Option<&Answer>) {
        println!("Mean distance: {}", self.mean());
        if let Some(answer) = answer {
            println!("Validation:");
            println!("Reference mean: {}", answer.mean);
            println!("Difference: {}", f64::abs(answer.mean - self.mean()));
            println!("Max pair difference: {}", self.max_difference);
            if self.count > 0 {
                println!(
                    "Mean pair difference: {}",
                    self.total_difference / self.count as f64
                );
            }
        }
    }
}

fn create_output(path: &Option<PathBuf>) -> Result<Option<BufWriter<File>>> {
    path.as_ref()
        .map(|p| {
            File::create(p)
                .map(BufWriter::new)
                .with_context(|| format!("creating {}", p.display()))
        })
        .transpose()
}

fn write_values<T: Sample, W: Write>(writer: &mut W, values: &[T]) -> io::Result<()> {
    for &v in values {
        v.write_le(writer)?;
    }
    Ok(())
}

fn run<T: Sample>(
    args: &Args,
    left: &[Point],
    right: &[Point],
    answer: Option<&Answer>,
) -> Result<Summary> {
    let options = args.options();
    let mut output = create_output(&args.output)?;
    let mut summary = Summary::default();

    if args.stream {
        for_each_block::<T, io::Error, _>(left, right, &options, |block| {
            summary.observe(block.distances, answer);
            if let Some(writer) = output.as_mut() {
                write_values(writer, block.distances)?;
            }
            Ok(())
        })?;
        println!("Streamed: {} distances", summary.count);
    } else {
        let result = evaluate::<T>(left, right, &options)?;
        match &result {
            DistanceResult::Matrix(m) => println!("Shape: {} x {}", m.rows(), m.cols()),
            DistanceResult::Flat(v) => println!("Shape: {} (flat)", v.len()),
        }
        summary.observe(result.as_slice(), answer);
        if let Some(writer) = output.as_mut() {
            write_values(writer, result.as_slice())?;
        }
    }

    if let Some(mut writer) = output {
        writer.flush()?;
    }
    Ok(summary)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let (left, right) = read_json(&args.input_json)?;
    println!("Point counts: {} x {}", left.len(), right.len());

    let answer = args.answer.as_deref().map(read_answer).transpose()?;
    if let Some(answer) = &answer {
        let pairs = left.len() * right.len();
        if answer.distances.len() != pairs {
            bail!(
                "Answer holds {} distances but the input has {} pairs",
                answer.distances.len(),
                pairs
            );
        }
    }

    info!(
        "evaluating with backend {}, precision {:?}, chunk size {}",
        args.backend.0, args.precision, args.chunk_size
    );
    let start = Instant::now();
    let summary = match args.precision {
        Precision::Single => run::<f32>(&args, &left, &right, answer.as_ref())?,
        Precision::Double => run::<f64>(&args, &left, &right, answer.as_ref())?,
    };
    println!("Wall time: {:?}", start.elapsed());
    summary.report(answer.as_ref());
    Ok(())
}
