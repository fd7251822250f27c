//! Deposit the particles of a binary input file onto a grid across MPI ranks.
//!
//! Run with `mpirun -n <ranks> cic-deposit <input> <threads>`.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use cic_deposit::{
    config::{broadcast_header, BoundaryPolicy, RoundMode, RunConfig, ROOT_RANK},
    coordinator::run,
    mesh::MESH_FILE,
    source::{PointSource, RecordStream},
};
use clap::Parser;
use eyre::eyre;
use mpi::traits::Communicator;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Binary input file with header and particle records
    input: PathBuf,
    /// Worker threads per process
    threads: NonZeroUsize,
    /// Output file for the global mesh
    #[arg(short, long, default_value = MESH_FILE)]
    output: PathBuf,
    /// Clamp particles outside the grid onto its boundary instead of failing
    #[arg(long)]
    clamp: bool,
    /// Sum the meshes of all rounds instead of keeping the last round only
    #[arg(long)]
    accumulate: bool,
}

impl Args {
    fn run_config(&self) -> RunConfig {
        RunConfig {
            threads: self.threads.get(),
            policy: if self.clamp {
                BoundaryPolicy::Clamp
            } else {
                BoundaryPolicy::Reject
            },
            round_mode: if self.accumulate {
                RoundMode::Accumulate
            } else {
                RoundMode::Overwrite
            },
            output: self.output.clone(),
        }
    }
}

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let universe = mpi::initialize().ok_or_else(|| eyre!("MPI was already initialised"))?;
    let comm = universe.world();
    let rank = comm.rank();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            if rank == ROOT_RANK {
                let _ = err.print();
            }
            let code = if err.use_stderr() { 1 } else { 0 };
            drop(universe);
            std::process::exit(code);
        }
    };
    let config = args.run_config();

    let mut stream = None;
    let mut header = None;
    if rank == ROOT_RANK {
        match RecordStream::open(&args.input) {
            Ok((file_header, file_stream)) => {
                header = Some(file_header);
                stream = Some(file_stream);
            }
            Err(err) => {
                tracing::error!(input = %args.input.display(), %err, "unable to read input");
                eprintln!("Error: Unable to open file {}: {err}", args.input.display());
                comm.abort(1);
            }
        }
    }

    let header = broadcast_header(header, ROOT_RANK, &comm);

    let source = stream.as_mut().map(|stream| stream as &mut dyn PointSource);
    let report = match run(source, &header, &config, ROOT_RANK, &comm) {
        Ok(report) => report,
        Err(err) => {
            tracing::error!(rank, %err, "deposition failed");
            eprintln!("Error on rank {rank}: {err}");
            comm.abort(1);
        }
    };

    if let Some(report) = report {
        report.mesh.save(&config.output)?;
        tracing::info!(output = %config.output.display(), "wrote global mesh");
        println!(
            "Interpolation execution time = {:.6} seconds",
            report.elapsed.as_secs_f64()
        );
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use clap::Parser;

    use super::Args;
    use cic_deposit::config::{BoundaryPolicy, RoundMode, RunConfig};

    #[test]
    fn test_wrong_argument_count_is_a_usage_error() {
        let missing = Args::try_parse_from(["cic-deposit", "in.bin"]).unwrap_err();
        assert!(missing.use_stderr());

        let extra = Args::try_parse_from(["cic-deposit", "in.bin", "4", "extra"]).unwrap_err();
        assert!(extra.use_stderr());
    }

    #[test]
    fn test_zero_threads_is_rejected() {
        assert!(Args::try_parse_from(["cic-deposit", "in.bin", "0"]).is_err());
        assert!(Args::try_parse_from(["cic-deposit", "in.bin", "four"]).is_err());
    }

    #[test]
    fn test_default_run_config() {
        let args = Args::try_parse_from(["cic-deposit", "in.bin", "4"]).unwrap();

        assert_eq!(args.input, PathBuf::from("in.bin"));
        assert_eq!(
            args.run_config(),
            RunConfig {
                threads: 4,
                policy: BoundaryPolicy::Reject,
                round_mode: RoundMode::Overwrite,
                output: PathBuf::from("Mesh.out"),
            }
        );
    }

    #[test]
    fn test_flags_select_clamp_and_accumulate() {
        let args = Args::try_parse_from([
            "cic-deposit",
            "in.bin",
            "2",
            "--clamp",
            "--accumulate",
            "-o",
            "out.txt",
        ])
        .unwrap();
        let config = args.run_config();

        assert_eq!(config.threads, 2);
        assert_eq!(config.policy, BoundaryPolicy::Clamp);
        assert_eq!(config.round_mode, RoundMode::Accumulate);
        assert_eq!(config.output, PathBuf::from("out.txt"));
    }
}
