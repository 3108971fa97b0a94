use clap::ArgEnum;
use jobrunner::{ConfigFile, Invocation, JobConfig};
use std::{
    fmt, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::fs;

/// Script that generates one video; reads a JSON config path as its argument.
pub const SINGLE_SCRIPT: &str = "grok-automation.js";
/// Script that processes a whole storyboard; takes positional paths and flags.
pub const BATCH_SCRIPT: &str = "batch-process.js";
/// Report written by the batch script into its output folder.
pub const STORYBOARD_FILE: &str = "storyboard.html";
/// Folder next to the scripts where generated videos are saved.
pub const DOWNLOADS_DIR: &str = "downloads";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RequestError {
    #[error("please enter a prompt for the video")]
    MissingPrompt,
    #[error("please choose a script file")]
    MissingScript,
    #[error("please choose an images folder")]
    MissingImages,
    #[error("please choose an output folder")]
    MissingOutput,
}

#[derive(ArgEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AspectRatio {
    #[clap(name = "16:9")]
    Landscape,
    #[clap(name = "9:16")]
    Portrait,
    #[clap(name = "1:1")]
    Square,
    #[clap(name = "2:3")]
    Tall,
    #[clap(name = "3:2")]
    Wide,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Square => "1:1",
            AspectRatio::Tall => "2:3",
            AspectRatio::Wide => "3:2",
        }
    }
}

#[derive(ArgEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipDuration {
    #[clap(name = "6s")]
    Short,
    #[clap(name = "10s")]
    Long,
}

impl ClipDuration {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipDuration::Short => "6s",
            ClipDuration::Long => "10s",
        }
    }
}

#[derive(ArgEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    #[clap(name = "480p")]
    Sd,
    #[clap(name = "720p")]
    Hd,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Sd => "480p",
            Resolution::Hd => "720p",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ClipDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a single generated video.
#[derive(Clone, Debug)]
pub struct VideoRequest {
    pub prompt: String,
    pub image: Option<PathBuf>,
    pub aspect_ratio: AspectRatio,
    pub duration: ClipDuration,
    pub resolution: Resolution,
    pub cdn_url: Option<String>,
}

impl VideoRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.prompt.trim().is_empty() {
            return Err(RequestError::MissingPrompt);
        }
        Ok(())
    }

    /// The JSON config consumed by the single-video script.
    pub fn to_config(&self) -> JobConfig {
        let image = self
            .image
            .as_ref()
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut config = JobConfig::new()
            .with("prompt", self.prompt.trim())
            .with("imagePath", image)
            .with("aspectRatio", self.aspect_ratio.as_str())
            .with("duration", self.duration.as_str())
            .with("resolution", self.resolution.as_str());
        if let Some(cdn_url) = self.cdn_url.as_deref().map(str::trim) {
            if !cdn_url.is_empty() {
                config.insert("cdnUrl", cdn_url);
            }
        }
        config
    }

    /// `node grok-automation.js <config.json>`, run from `scripts_dir`.
    ///
    /// The config file is written next to the scripts; keep the returned
    /// guard alive until the job is done.
    pub fn invocation(
        &self,
        node: &str,
        scripts_dir: &Path,
    ) -> jobrunner::Result<(Invocation, ConfigFile)> {
        Invocation::new(node)
            .arg(SINGLE_SCRIPT)
            .current_dir(scripts_dir)
            .config_file(&self.to_config(), scripts_dir)
    }
}

/// Parameters of a batch run over a storyboard script.
#[derive(Clone, Debug)]
pub struct BatchRequest {
    pub script: PathBuf,
    pub images: PathBuf,
    pub output: PathBuf,
    pub duration: ClipDuration,
    pub resolution: Resolution,
    pub skip_completed: bool,
}

impl BatchRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.script.as_os_str().is_empty() {
            return Err(RequestError::MissingScript);
        }
        if self.images.as_os_str().is_empty() {
            return Err(RequestError::MissingImages);
        }
        if self.output.as_os_str().is_empty() {
            return Err(RequestError::MissingOutput);
        }
        Ok(())
    }

    pub fn to_config(&self) -> JobConfig {
        JobConfig::new()
            .with("duration", self.duration.as_str())
            .with("resolution", self.resolution.as_str())
            .with("include-completed", !self.skip_completed)
    }

    /// `node batch-process.js <script> <images> <output> --duration .. --resolution .. [--include-completed]`
    pub fn invocation(&self, node: &str, scripts_dir: &Path) -> Invocation {
        Invocation::new(node)
            .arg(BATCH_SCRIPT)
            .args(
                [&self.script, &self.images, &self.output]
                    .map(|path| path.to_string_lossy().into_owned()),
            )
            .config_flags(&self.to_config())
            .current_dir(scripts_dir)
    }

    pub fn summary(&self) -> Vec<String> {
        let script_name = self
            .script
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.script.display().to_string());
        vec![
            format!("script: {}", script_name),
            format!("images: {}", self.images.display()),
            format!("output: {}", self.output.display()),
            format!("config: {}, {}", self.duration, self.resolution),
        ]
    }

    pub fn storyboard(&self) -> PathBuf {
        storyboard_path(&self.output)
    }
}

pub fn storyboard_path(output: &Path) -> PathBuf {
    output.join(STORYBOARD_FILE)
}

/// The downloads folder under `scripts_dir`, created if missing. The flag is
/// true when this call created it.
pub async fn ensure_downloads(scripts_dir: &Path) -> io::Result<(PathBuf, bool)> {
    let downloads = scripts_dir.join(DOWNLOADS_DIR);
    if fs::metadata(&downloads).await.map_or(false, |meta| meta.is_dir()) {
        return Ok((downloads, false));
    }
    fs::create_dir_all(&downloads).await?;
    Ok((downloads, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::ArgEnum;
    use jobrunner::ConfigValue;

    fn video() -> VideoRequest {
        VideoRequest {
            prompt: "  a cat playing with a butterfly  ".into(),
            image: None,
            aspect_ratio: AspectRatio::Landscape,
            duration: ClipDuration::Short,
            resolution: Resolution::Hd,
            cdn_url: None,
        }
    }

    fn batch() -> BatchRequest {
        BatchRequest {
            script: PathBuf::from("/stories/episode-1.txt"),
            images: PathBuf::from("/stories/images"),
            output: PathBuf::from("/stories/out"),
            duration: ClipDuration::Long,
            resolution: Resolution::Sd,
            skip_completed: true,
        }
    }

    #[test]
    fn choice_labels_match_config_values() {
        for ratio in AspectRatio::value_variants() {
            assert_eq!(AspectRatio::from_str(ratio.as_str(), false), Ok(*ratio));
        }
        for duration in ClipDuration::value_variants() {
            assert_eq!(ClipDuration::from_str(duration.as_str(), false), Ok(*duration));
        }
        for resolution in Resolution::value_variants() {
            assert_eq!(Resolution::from_str(resolution.as_str(), false), Ok(*resolution));
        }
        assert_eq!(AspectRatio::Portrait.to_string(), "9:16");
        assert!(Resolution::from_str("1080p", false).is_err());
    }

    #[test]
    fn blank_prompt_is_rejected() {
        let mut request = video();
        request.prompt = "   ".into();
        assert_eq!(request.validate(), Err(RequestError::MissingPrompt));
        assert_eq!(video().validate(), Ok(()));
    }

    #[test]
    fn video_config_keys() {
        let config = video().to_config();
        let keys: Vec<_> = config.iter().map(|(key, _)| key).collect();
        assert_eq!(
            keys,
            vec!["prompt", "imagePath", "aspectRatio", "duration", "resolution"]
        );
        assert_eq!(
            config.get("prompt"),
            Some(&ConfigValue::from("a cat playing with a butterfly"))
        );
        assert_eq!(config.get("imagePath"), Some(&ConfigValue::from("")));
    }

    #[test]
    fn cdn_url_only_when_given() {
        let mut request = video();
        request.cdn_url = Some("   ".into());
        assert!(request.to_config().get("cdnUrl").is_none());

        request.cdn_url = Some("https://cdn.example.com/img.png".into());
        request.image = Some(PathBuf::from("/pictures/cat.png"));
        let config = request.to_config();
        assert_eq!(
            config.get("cdnUrl"),
            Some(&ConfigValue::from("https://cdn.example.com/img.png"))
        );
        assert_eq!(
            config.get("imagePath"),
            Some(&ConfigValue::from("/pictures/cat.png"))
        );
    }

    #[test]
    fn video_invocation_passes_config_path() {
        let dir = std::env::temp_dir();
        let (invocation, file) = video().invocation("node", &dir).expect("write config");
        assert_eq!(invocation.program, "node");
        assert_eq!(invocation.args, vec![SINGLE_SCRIPT.to_string(), file.to_arg()]);
        assert_eq!(invocation.dir, dir);
        assert!(file.path().starts_with(&dir));
    }

    #[test]
    fn batch_invocation_skips_completed_by_default() {
        let invocation = batch().invocation("node", Path::new("/opt/videogen"));
        assert_eq!(
            invocation.args,
            vec![
                BATCH_SCRIPT,
                "/stories/episode-1.txt",
                "/stories/images",
                "/stories/out",
                "--duration",
                "10s",
                "--resolution",
                "480p",
            ]
        );
        assert_eq!(invocation.dir, PathBuf::from("/opt/videogen"));
    }

    #[test]
    fn batch_invocation_can_include_completed() {
        let mut request = batch();
        request.skip_completed = false;
        let invocation = request.invocation("node", Path::new("."));
        assert_eq!(invocation.args.last().map(String::as_str), Some("--include-completed"));
    }

    #[test]
    fn batch_requires_every_path() {
        let mut request = batch();
        request.images = PathBuf::new();
        assert_eq!(request.validate(), Err(RequestError::MissingImages));
        request.script = PathBuf::new();
        assert_eq!(request.validate(), Err(RequestError::MissingScript));
        assert_eq!(batch().validate(), Ok(()));
    }

    #[test]
    fn batch_summary_and_storyboard() {
        let request = batch();
        assert_eq!(
            request.summary(),
            vec![
                "script: episode-1.txt",
                "images: /stories/images",
                "output: /stories/out",
                "config: 10s, 480p",
            ]
        );
        assert_eq!(
            request.storyboard(),
            PathBuf::from("/stories/out/storyboard.html")
        );
    }

    #[tokio::test]
    async fn downloads_folder_is_created_once() {
        let scripts_dir =
            std::env::temp_dir().join(format!("videogen-scripts-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&scripts_dir);

        let (downloads, created) = ensure_downloads(&scripts_dir).await.expect("create");
        assert!(created);
        assert_eq!(downloads, scripts_dir.join("downloads"));
        assert!(downloads.is_dir());

        let (again, created) = ensure_downloads(&scripts_dir).await.expect("reuse");
        assert!(!created);
        assert_eq!(again, downloads);

        std::fs::remove_dir_all(&scripts_dir).expect("clean up");
    }
}
