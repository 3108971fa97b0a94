use crate::jobs::{AspectRatio, BatchRequest, ClipDuration, Resolution, VideoRequest};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Generate videos by driving the browser automation scripts
#[derive(Debug, Parser)]
#[clap(name = "videogen", version)]
pub struct ArgParser {
    /// Node.js executable that runs the automation scripts
    #[clap(long, env = "VIDEOGEN_NODE", default_value = "node")]
    pub node: String,

    /// Directory holding the automation scripts, jobs run from here
    #[clap(long, env = "VIDEOGEN_SCRIPTS_DIR", default_value = ".", parse(from_os_str))]
    pub scripts_dir: PathBuf,

    /// Extra environment variables for the job, as VAR=VAL
    #[clap(long = "env", multiple_occurrences = true, parse(try_from_str = var_eq_val))]
    pub envs: Vec<(String, String)>,

    /// Milliseconds to keep reading output after the script has exited
    #[clap(long, default_value = "500")]
    pub drain_grace_ms: u64,

    /// The sub-command to use
    #[clap(subcommand)]
    pub sub_command: SubCommand,
}

#[derive(Debug, Subcommand)]
pub enum SubCommand {
    /// generate a single video from a prompt
    Generate(GenerateArgs),
    /// generate every scene of a script
    Batch(BatchArgs),
    /// open the storyboard report of a batch run
    Storyboard {
        /// output folder of the batch run
        #[clap(long, parse(from_os_str))]
        output: PathBuf,

        /// only print the report's path
        #[clap(long)]
        no_open: bool,
    },
    /// open the folder the videos are downloaded to, creating it if needed
    Downloads {
        /// only print the folder's path
        #[clap(long)]
        no_open: bool,
    },
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// what the video should show
    #[clap(long)]
    pub prompt: String,

    /// optional source image
    #[clap(long, parse(from_os_str))]
    pub image: Option<PathBuf>,

    /// 16:9, 9:16, 1:1, 2:3 or 3:2
    #[clap(long, arg_enum, default_value = "16:9")]
    pub aspect_ratio: AspectRatio,

    /// 6s or 10s
    #[clap(long, arg_enum, default_value = "6s")]
    pub duration: ClipDuration,

    /// 480p or 720p
    #[clap(long, arg_enum, default_value = "720p")]
    pub resolution: Resolution,

    /// optional CDN url of the source image
    #[clap(long)]
    pub cdn_url: Option<String>,

    /// port of the browser's remote debugger
    #[clap(long, default_value = "9222")]
    pub debug_port: u16,

    /// do not check for, or start, a browser with remote debugging
    #[clap(long)]
    pub no_browser_check: bool,

    /// browser executable to start when no debugger is listening
    #[clap(long, env = "VIDEOGEN_CHROME", parse(from_os_str))]
    pub chrome: Option<PathBuf>,

    /// browser profile directory used for the debugging session
    #[clap(
        long,
        env = "VIDEOGEN_CHROME_PROFILE",
        default_value = "chrome-debug-profile",
        parse(from_os_str)
    )]
    pub chrome_profile: PathBuf,
}

impl GenerateArgs {
    pub fn request(&self) -> VideoRequest {
        VideoRequest {
            prompt: self.prompt.clone(),
            image: self.image.clone(),
            aspect_ratio: self.aspect_ratio,
            duration: self.duration,
            resolution: self.resolution,
            cdn_url: self.cdn_url.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// script file listing the scenes
    #[clap(parse(from_os_str))]
    pub script: PathBuf,

    /// folder with the scene images
    #[clap(parse(from_os_str))]
    pub images: PathBuf,

    /// folder for videos, progress and the storyboard
    #[clap(parse(from_os_str))]
    pub output: PathBuf,

    /// 6s or 10s
    #[clap(long, arg_enum, default_value = "6s")]
    pub duration: ClipDuration,

    /// 480p or 720p
    #[clap(long, arg_enum, default_value = "720p")]
    pub resolution: Resolution,

    /// regenerate scenes that already completed in an earlier run
    #[clap(long)]
    pub include_completed: bool,
}

impl BatchArgs {
    pub fn request(&self) -> BatchRequest {
        BatchRequest {
            script: self.script.clone(),
            images: self.images.clone(),
            output: self.output.clone(),
            duration: self.duration,
            resolution: self.resolution,
            skip_completed: !self.include_completed,
        }
    }
}

/// try_from_str parse function for job env variables
fn var_eq_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((var, val)) if !var.is_empty() => Ok((var.to_string(), val.to_string())),
        _ => Err("Required format is VAR=VAL".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_pairs() {
        assert_eq!(
            var_eq_val("NODE_PATH=/opt/node_modules"),
            Ok(("NODE_PATH".to_string(), "/opt/node_modules".to_string()))
        );
        assert_eq!(
            var_eq_val("QUERY=a=b"),
            Ok(("QUERY".to_string(), "a=b".to_string()))
        );
        assert!(var_eq_val("NO_VALUE").is_err());
        assert!(var_eq_val("=value").is_err());
    }

    #[test]
    fn generate_defaults() {
        let args = ArgParser::try_parse_from(["videogen", "generate", "--prompt", "a red fox"])
            .expect("valid args");
        assert_eq!(args.node, "node");
        assert_eq!(args.drain_grace_ms, 500);
        match args.sub_command {
            SubCommand::Generate(generate) => {
                let request = generate.request();
                assert_eq!(request.prompt, "a red fox");
                assert_eq!(request.aspect_ratio, AspectRatio::Landscape);
                assert_eq!(request.duration, ClipDuration::Short);
                assert_eq!(request.resolution, Resolution::Hd);
                assert_eq!(generate.debug_port, 9222);
                assert!(!generate.no_browser_check);
            }
            other => panic!("unexpected sub-command {:?}", other),
        }
    }

    #[test]
    fn batch_flags() {
        let args = ArgParser::try_parse_from([
            "videogen",
            "--env",
            "NODE_PATH=/opt/node_modules",
            "batch",
            "script.txt",
            "images",
            "out",
            "--duration",
            "10s",
            "--include-completed",
        ])
        .expect("valid args");
        assert_eq!(
            args.envs,
            vec![("NODE_PATH".to_string(), "/opt/node_modules".to_string())]
        );
        match args.sub_command {
            SubCommand::Batch(batch) => {
                let request = batch.request();
                assert_eq!(request.duration, ClipDuration::Long);
                assert_eq!(request.resolution, Resolution::Hd);
                assert!(!request.skip_completed);
            }
            other => panic!("unexpected sub-command {:?}", other),
        }
    }

    #[test]
    fn viewer_commands() {
        let args = ArgParser::try_parse_from([
            "videogen",
            "storyboard",
            "--output",
            "out",
            "--no-open",
        ])
        .expect("valid args");
        match args.sub_command {
            SubCommand::Storyboard { output, no_open } => {
                assert_eq!(output, PathBuf::from("out"));
                assert!(no_open);
            }
            other => panic!("unexpected sub-command {:?}", other),
        }

        let args = ArgParser::try_parse_from([
            "videogen",
            "--scripts-dir",
            "/opt/videogen",
            "downloads",
        ])
        .expect("valid args");
        assert_eq!(args.scripts_dir, PathBuf::from("/opt/videogen"));
        assert!(matches!(args.sub_command, SubCommand::Downloads { no_open: false }));
    }

    #[test]
    fn rejects_unknown_resolution() {
        let result = ArgParser::try_parse_from([
            "videogen",
            "generate",
            "--prompt",
            "x",
            "--resolution",
            "4k",
        ]);
        assert!(result.is_err());
    }
}
