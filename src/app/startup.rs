//! Process startup: arguments, logging, queues and the run itself

use super::cli::{Args, ParseFailure};
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::{flush_logging, init_logging};
use crate::core::shutdown::ShutdownCoordinator;
use crate::dedup::api::Deduplicator;
use crate::queue::{JsonMessageParser, MessageParser, Queue, QueueResult, SqsQueue};
use std::sync::Arc;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// Entry point used by the binary; never returns
pub fn startup() {
    let code = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime.block_on(run_application(std::env::args().collect())),
        Err(e) => {
            eprintln!("Error starting async runtime: {}", e);
            EXIT_FAILURE
        }
    };
    flush_logging();
    std::process::exit(code);
}

/// Run the application for the given argument vector and return the exit code
pub async fn run_application(argv: Vec<String>) -> i32 {
    // Stage 1: command line and config file
    let args = match Args::parse_with_config(&argv).await {
        Ok(args) => args,
        Err(ParseFailure::Cli(e)) => {
            let _ = e.print();
            // --help and --version are reported through clap as well
            return if e.use_stderr() {
                EXIT_FAILURE
            } else {
                EXIT_SUCCESS
            };
        }
        Err(ParseFailure::Config(e)) => {
            eprintln!("Error: {}", e);
            return EXIT_FAILURE;
        }
    };

    // Stage 2: logging
    let log_file = args.log_file.as_ref().map(|p| p.to_string_lossy().to_string());
    if let Err(e) = init_logging(
        args.log_level.as_deref(),
        args.log_format(),
        log_file.as_deref(),
        args.use_color(),
    ) {
        eprintln!("Error initialising logging: {}", e);
        return EXIT_FAILURE;
    }
    log::info!("sqs-dedup {} starting", env!("CARGO_PKG_VERSION"));
    log::debug!("Effective arguments: {:?}", args);

    // Stage 3: validation and wiring
    if let Err(e) = args.validate() {
        log_error_with_context(&e, "Argument validation");
        return EXIT_FAILURE;
    }
    let (queue, storage) = match build_queues(&args).await {
        Ok(queues) => queues,
        Err(e) => {
            log_error_with_context(&e, "Queue setup");
            return EXIT_FAILURE;
        }
    };
    let mut dedup = match Deduplicator::new(queue, storage, args.deduplicator_config()) {
        Ok(dedup) => dedup,
        Err(e) => {
            log_error_with_context(&e, "Deduplicator setup");
            return EXIT_FAILURE;
        }
    };

    let (coordinator, shutdown_rx) = ShutdownCoordinator::new();
    let coordinator = Arc::new(coordinator);
    coordinator.install_signal_handlers();

    // Stage 4: run
    let result = if args.run_forever {
        dedup
            .run_forever(args.sleep_between_runs(), shutdown_rx)
            .await
            .map(|runs| log::info!("Stopped after {} runs", runs))
    } else {
        dedup.run().await.map(|summary| {
            log::debug!("Run summary: {:?}", summary);
        })
    };

    match result {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            log_error_with_context(&e, "Deduplication");
            EXIT_FAILURE
        }
    }
}

async fn build_queues(args: &Args) -> QueueResult<(Arc<dyn Queue>, Arc<dyn Queue>)> {
    let parser: Arc<dyn MessageParser> = Arc::new(JsonMessageParser::new(args.unique_id_pointer()));
    let queue_url = args.queue_url.as_deref().unwrap_or_default();
    let storage_url = args.storage_queue_url.as_deref().unwrap_or_default();

    let queue = SqsQueue::connect(args.sqs_config(queue_url), parser.clone()).await?;
    let storage = SqsQueue::connect(args.sqs_config(storage_url), parser).await?;
    log::info!(
        "Deduplicating '{}' with overflow queue '{}'",
        queue.name(),
        storage.name()
    );
    Ok((Arc::new(queue), Arc::new(storage)))
}
