use crate::config::{ConfigFile, JobConfig};
use crate::error::Result;
use crate::types::{Args, Dir, Envs, Program};
use std::path::Path;

/// What to run: the program, its ordered arguments, where, and with which
/// extra environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: Program,
    pub args: Args,
    pub dir: Dir,
    pub envs: Envs,
}

impl Invocation {
    pub fn new(program: impl Into<Program>) -> Self {
        Self {
            program: program.into(),
            args: Args::new(),
            dir: Dir::from("."),
            envs: Envs::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn envs(mut self, envs: Envs) -> Self {
        self.envs.extend(envs);
        self
    }

    /// Append the config as `--key value` flags.
    pub fn config_flags(self, config: &JobConfig) -> Self {
        let flags = config.to_cli_flags();
        self.args(flags)
    }

    /// Write the config to a JSON file in `dir` and append its path as one
    /// argument. Keep the returned file alive until the job has finished.
    pub fn config_file(self, config: &JobConfig, dir: &Path) -> Result<(Self, ConfigFile)> {
        let file = config.write_json(dir)?;
        let invocation = self.arg(file.to_arg());
        Ok((invocation, file))
    }
}
