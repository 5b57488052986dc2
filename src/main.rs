// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;

mod cli;
use cli::commands::{run_batch_file, run_build, run_inspect, run_query, BuildArgs};
use cli::display::error_label;
use cli::logging::{self, Verbosity};
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logging::init(Verbosity::from_flags(cli.verbose, cli.quiet));

    let result = match cli.command {
        Commands::Build {
            words,
            output,
            block_volume,
            boundaries,
            max_block_volume,
            config,
            json,
            mode,
        } => run_build(BuildArgs {
            words,
            output,
            block_volume,
            boundaries,
            max_block_volume,
            config,
            json,
            mode,
        }),
        Commands::Inspect {
            file,
            blocks,
            verify,
            vocabulary,
            mode,
        } => run_inspect(&file, blocks, verify, vocabulary.as_deref(), &mode),
        Commands::Query {
            file,
            terms,
            search,
            custom_scores,
            json,
        } => run_query(&file, &terms, &search, custom_scores.as_deref(), json),
        Commands::Batch {
            file,
            queries,
            search,
            json,
        } => run_batch_file(&file, &queries, &search, json).map(|failures| {
            if failures > 0 {
                eprintln!("{} {} of the queries failed", error_label("warning:"), failures);
            }
        }),
    };

    if let Err(e) = result {
        eprintln!("{} {}", error_label("error:"), e);
        std::process::exit(1);
    }
}
