mod arg_parser;
mod browser;
mod jobs;
mod logging;

use arg_parser::{ArgParser, BatchArgs, GenerateArgs, SubCommand};
use jobrunner::{ChannelSink, Invocation, JobError, JobRunner, JobStatus, RunnerConfig};

use clap::Parser;
use std::{error, path::Path, process::ExitCode, time::Duration};
use tokio::select;
use tracing::{error, info, warn};

/// Exit code after the user stopped the job with Ctrl-C.
const EXIT_STOPPED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init_logging();
    let args = ArgParser::parse();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            match e.downcast_ref::<JobError>() {
                Some(job_error) if job_error.is_program_missing() => {
                    error!("Node.js not found. Please install Node.js and try again ({})", e)
                }
                _ => error!("{}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: ArgParser) -> Result<ExitCode, Box<dyn error::Error>> {
    let runner = JobRunner::with_config(RunnerConfig {
        drain_grace: Duration::from_millis(args.drain_grace_ms),
        envs: args.envs,
    });

    match args.sub_command {
        SubCommand::Generate(generate) => {
            generate_video(runner, &args.node, &args.scripts_dir, generate).await
        }
        SubCommand::Batch(batch) => run_batch(runner, &args.node, &args.scripts_dir, batch).await,
        SubCommand::Storyboard { output, no_open } => {
            let storyboard = jobs::storyboard_path(&output);
            if !storyboard.exists() {
                warn!(
                    "no storyboard at {}, run a batch first",
                    storyboard.display()
                );
                return Ok(ExitCode::FAILURE);
            }
            println!("{}", storyboard.display());
            if !no_open {
                browser::open_with_desktop(&storyboard)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        SubCommand::Downloads { no_open } => {
            let (downloads, created) = jobs::ensure_downloads(&args.scripts_dir).await?;
            if created {
                info!("created downloads folder: {}", downloads.display());
            }
            println!("{}", downloads.display());
            if !no_open {
                browser::open_with_desktop(&downloads)?;
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn generate_video(
    runner: JobRunner,
    node: &str,
    scripts_dir: &Path,
    args: GenerateArgs,
) -> Result<ExitCode, Box<dyn error::Error>> {
    let request = args.request();
    request.validate()?;

    if !args.no_browser_check {
        ensure_browser(&args).await?;
    }

    // the config file must outlive the job
    let (invocation, _config_file) = request.invocation(node, scripts_dir)?;
    let prompt: String = request.prompt.trim().chars().take(50).collect();
    info!("starting automation with prompt: {}", prompt);
    info!(
        "parameters: {} | {} | {}",
        request.aspect_ratio, request.duration, request.resolution
    );

    let status = run_job(runner, invocation).await?;
    Ok(report(status))
}

async fn ensure_browser(args: &GenerateArgs) -> Result<(), Box<dyn error::Error>> {
    if browser::debugger_listening(args.debug_port).await {
        return Ok(());
    }
    info!(
        "browser debugger not detected on port {}, launching Chrome",
        args.debug_port
    );
    let chrome = browser::find_chrome(args.chrome.as_deref())
        .ok_or("could not find Chrome, open it with remote debugging or pass --chrome")?;
    browser::launch_chrome(&chrome, args.debug_port, &args.chrome_profile)?;
    tokio::time::sleep(browser::STARTUP_DELAY).await;
    Ok(())
}

async fn run_batch(
    runner: JobRunner,
    node: &str,
    scripts_dir: &Path,
    args: BatchArgs,
) -> Result<ExitCode, Box<dyn error::Error>> {
    let request = args.request();
    request.validate()?;

    info!("starting batch processing");
    for line in request.summary() {
        info!("{}", line);
    }

    let status = run_job(runner, request.invocation(node, scripts_dir)).await?;
    let code = report(status);
    if status.is_success() {
        info!(
            "storyboard: {} (or run `videogen storyboard --output {}`)",
            request.storyboard().display(),
            request.output.display()
        );
    }
    Ok(code)
}

/// Relay the job's output until it ends. The first Ctrl-C stops the job; its
/// remaining output is still printed.
///
/// The job's stdout and stderr arrive as one stream and are all printed to
/// stdout, our own logs go to stderr.
async fn run_job(mut runner: JobRunner, invocation: Invocation) -> Result<JobStatus, JobError> {
    let (sink, mut lines) = ChannelSink::new();
    let job = runner.launch(invocation, sink)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut stop_requested = false;
    loop {
        select! {
            maybe_line = lines.recv() => {
                match maybe_line {
                    Some(line) => println!("{}", line),
                    None => break,
                }
            }
            _ = &mut ctrl_c, if !stop_requested => {
                stop_requested = true;
                if job.cancel() {
                    info!("stopping job");
                }
            }
        }
    }

    Ok(job.wait().await)
}

fn report(status: JobStatus) -> ExitCode {
    match status.into_result() {
        Ok(()) => {
            info!("automation completed successfully");
            ExitCode::SUCCESS
        }
        Err(JobError::Terminated) => {
            warn!("automation stopped by user");
            ExitCode::from(EXIT_STOPPED)
        }
        Err(e) => {
            error!("automation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
