use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use lzac::{arithmetic::DEFAULT_TERMINATOR, lzw::DEFAULT_CODE_WIDTH};
use lzac_bench::{run_arithmetic, run_lzw, Codec, RunReport, SampleLayout};
use rand::{rngs::StdRng, SeedableRng};

#[derive(Parser, Debug)]
#[command(about = "Times the lzac codecs on random decimal readings", long_about = None)]
struct Args {
    /// Which codec to run.
    #[clap(short, long, value_enum, default_value_t = Codec::Both)]
    codec: Codec,
    /// Readings per stream. With 0, the stream grows by one reading per iteration.
    #[clap(short, long, default_value_t = 0)]
    samples: usize,
    #[clap(long, default_value_t = 2)]
    integer_digits: usize,
    #[clap(long, default_value_t = 2)]
    decimal_digits: usize,
    /// LZW code width, between 9 and 16.
    #[clap(short = 'w', long, default_value_t = DEFAULT_CODE_WIDTH)]
    code_width: u8,
    /// Seed of the reading generator, random if absent.
    #[clap(long)]
    seed: Option<u64>,
    /// Stop after that many iterations, even if every codec still succeeds.
    #[clap(short, long, default_value_t = 200)]
    iterations: usize,
}

pub fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let layout = SampleLayout {
        integer_digits: args.integer_digits,
        decimal_digits: args.decimal_digits,
    };
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let growing = args.samples == 0;
    let mut samples = args.samples;
    let mut last: Vec<RunReport> = vec![];

    for iteration in 0..args.iterations {
        if growing {
            samples += 1;
        }
        let text = layout.generate(&mut rng, samples);

        let mut reports = vec![];
        let mut failed = false;
        if args.codec.runs_arithmetic() {
            match run_arithmetic(&text, DEFAULT_TERMINATOR) {
                Ok(report) => reports.push(report),
                Err(error) => {
                    warn!("{samples} readings: {error:#}");
                    failed = true;
                }
            }
        }
        if args.codec.runs_lzw() {
            match run_lzw(&text, args.code_width) {
                Ok(report) => reports.push(report),
                Err(error) => {
                    warn!("{samples} readings: {error:#}");
                    failed = true;
                }
            }
        }

        for report in reports.iter() {
            info!("#{iteration} {samples} readings: {report}");
        }
        if failed {
            break;
        }
        last = reports;
    }

    println!();
    for report in last.iter() {
        println!("{report}");
    }

    Ok(())
}
