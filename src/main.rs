//! Main entry point for the dedupack CLI.

use clap::Parser;
use dedupack::cli::{Args, CodecArg, Commands};
use dedupack::workers::WorkerPool;
use dedupack::{codec, compress, extract};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // Help and version go to stdout and exit cleanly; usage errors
            // are failures.
            let code = if e.use_stderr() { ExitCode::FAILURE } else { ExitCode::SUCCESS };
            let _ = e.print();
            return code;
        }
    };

    if let Err(e) = run_app(args.command) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run_app(command: Commands) -> dedupack::error::Result<()> {
    let pool = WorkerPool::new();

    match command {
        Commands::Compress { dir, archive, compression } => {
            let codec_id =
                compression.map(CodecArg::to_codec_id).unwrap_or_else(codec::default_codec);
            compress::compress(&dir, &archive, codec_id, &pool)?;
            println!(
                "Successfully compressed folder: {} to archive file: {}",
                dir.display(),
                archive.display()
            );
        }
        Commands::Decompress { dir, archive } => {
            extract::decompress(&archive, &dir, &pool)?;
            println!(
                "Successfully decompressed archive file: {} to folder: {}",
                archive.display(),
                dir.display()
            );
        }
    }
    Ok(())
}
