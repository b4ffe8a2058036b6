//! flowgate CLI
//!
//! Loads a rule document and an optional blocklist, classifies one flow
//! described on the command line, and reports the verdict. Exit code 0
//! means allow, 1 means block.

mod args;
mod config;
mod logging;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use flowgate_core::{
    Action, FlowDescriptor, MaliciousDomainFilter, MatchEngine, RuleSetManager, VerdictReason,
};
use tracing::{error, warn};

use args::Args;
use config::RuleDocument;

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = logging::init(&args) {
        eprintln!("failed to initialize logging: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(&args) {
        Ok(action) => match action {
            Action::Allow => ExitCode::SUCCESS,
            Action::Block => ExitCode::from(1),
        },
        Err(e) => {
            error!("fatal: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(args: &Args) -> Result<Action> {
    let doc = RuleDocument::load(&args.rules)?;
    let engine = MatchEngine::from_config(Some(doc.default_action()?))?;

    let manager = RuleSetManager::new();
    let result = manager.load(doc.rules);
    for rejected in &result.rejected {
        warn!(index = rejected.index, error = %rejected.error, "rule excluded");
    }

    let domains = match &args.blocklist {
        Some(path) => config::load_blocklist(path)?,
        None => Vec::new(),
    };
    let capacity = args.filter_capacity.unwrap_or(domains.len()).max(1);
    let filter = MaliciousDomainFilter::build(&domains, args.filter_fp_rate, capacity)?;

    let flow = FlowDescriptor {
        direction: args.direction.into(),
        protocol: args.protocol.into(),
        src_addr: args.src_ip,
        src_port: args.src_port,
        dst_addr: args.dst_ip,
        dst_port: args.dst_port,
        resolved_host: args.dst_host.clone(),
    };

    let verdict = engine.classify(&flow, &manager.current(), &filter);
    match verdict.reason {
        VerdictReason::MaliciousDomain => {
            println!("{} (malicious-domain filter hit)", verdict.action);
        }
        VerdictReason::RuleMatch => match &verdict.matched_rule {
            Some(rule) => {
                println!("{} (rule match, priority {})", verdict.action, rule.priority);
            }
            None => println!("{} (rule match)", verdict.action),
        },
        VerdictReason::DefaultPolicy => {
            println!("{} (default policy)", verdict.action);
        }
    }

    Ok(verdict.action)
}
