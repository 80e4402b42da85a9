use std::{fs::File, io::BufWriter, path::PathBuf, process, time::Instant};

use coo_spgemm::{
    multiply_with,
    utils::{format_duration, max_abs_diff, print_preview, print_sorted, random_coo, to_csr},
    Accumulation, MultiplyConfig, SparseMatrix, N_CPUS,
};
use rand::{rngs::StdRng, SeedableRng};
use structopt::StructOpt;

#[macro_use]
extern crate log;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "coo_spgemm",
    about = "Multiplies two random COO sparse matrices in parallel"
)]
struct Opt {
    /// Rows of A (and columns of B)
    #[structopt(long, default_value = "1000")]
    rows: usize,

    /// Columns of A (and rows of B)
    #[structopt(long, default_value = "1000")]
    cols: usize,

    /// Number of random entries in each operand
    #[structopt(long, default_value = "10000")]
    nnz: usize,

    /// Worker threads, defaults to the number of CPUs
    #[structopt(short, long)]
    threads: Option<usize>,

    /// How workers combine results. Options are:
    /// locked, sharded
    #[structopt(short, long, default_value = "locked")]
    accumulation: Accumulation,

    /// Seed for the random operands
    #[structopt(long)]
    seed: Option<u64>,

    /// Entries of A and B to show
    #[structopt(long, default_value = "5")]
    preview: usize,

    /// Print every entry of the product, ordered by row and column
    #[structopt(long)]
    print_all: bool,

    /// Check the product against a CSR reference
    #[structopt(long)]
    verify: bool,

    /// Write the product as JSON
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
}

fn main() {
    pretty_env_logger::init();
    let opt = Opt::from_args();

    if let Err(e) = run(&opt) {
        error!("{}", e);
        process::exit(1);
    }
}

fn run(opt: &Opt) -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = match opt.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    // B takes the transposed shape so the product is defined
    let a = random_coo(opt.rows, opt.cols, opt.nnz, &mut rng)?;
    let b = random_coo(opt.cols, opt.rows, opt.nnz, &mut rng)?;
    info!(
        "A: {}x{} with {} entries, B: {}x{} with {} entries",
        a.rows(),
        a.cols(),
        a.nnz(),
        b.rows(),
        b.cols(),
        b.nnz()
    );

    let config = MultiplyConfig {
        num_threads: opt.threads.unwrap_or(*N_CPUS),
        accumulation: opt.accumulation,
    };
    info!(
        "multiplying with {} threads, {} accumulation",
        config.num_threads, config.accumulation
    );
    let start = Instant::now();
    let c = multiply_with(&a, &b, &config)?;
    info!(
        "product has {} entries, took {}",
        c.nnz(),
        format_duration(&start.elapsed())
    );

    print_preview(&a, "A", opt.preview);
    print_preview(&b, "B", opt.preview);
    if opt.print_all {
        print_sorted(&c, "C");
    } else {
        print_preview(&c, "C", opt.preview);
    }

    if opt.verify {
        verify(&a, &b, &c);
    }

    if let Some(path) = &opt.output {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, &c)?;
        info!("wrote product to {}", path.display());
    }

    Ok(())
}

fn verify(a: &SparseMatrix, b: &SparseMatrix, c: &SparseMatrix) {
    let reference = &to_csr(a) * &to_csr(b);
    let diff = max_abs_diff(c, &reference);
    if diff < 1e-9 {
        info!("product matches CSR reference (max diff {:.2e})", diff);
    } else {
        warn!("product differs from CSR reference by {:.2e}", diff);
    }
}
