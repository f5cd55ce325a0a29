//! Command-line front end for the KCL grammar conformance suite.

mod events;

use anyhow::Result;
use clap::Parser;
use kcl_grammar_test_harness::{TestOptions, TestRunner};

fn apply_color_choice(choice: clap::ColorChoice) {
    match choice {
        clap::ColorChoice::Always => colored::control::set_override(true),
        clap::ColorChoice::Never => colored::control::set_override(false),
        clap::ColorChoice::Auto => (),
    }
}

async fn run_grammar_tests(options: TestOptions) -> Result<bool> {
    let config = options.runner_config();

    tracing::debug!(
        target: "discovery",
        "running test cases under {} (category: {:?})",
        config.test_cases_dir.display(),
        config.category
    );

    let runner = TestRunner::new(config, options);
    runner.run().await
}

fn main() -> Result<()> {
    let options = TestOptions::parse();

    apply_color_choice(options.color);

    let trace_config = events::TraceEventConfig::init(&options.trace_events);
    tracing::debug!("enabled trace events: {:?}", trace_config.enabled_events());

    let success = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run_grammar_tests(options))?;

    if !success {
        std::process::exit(1);
    }

    Ok(())
}
