use std::path::PathBuf;
use uuid::Uuid;

pub type Program = String;
pub type Args = Vec<String>;
pub type Dir = PathBuf;
pub type Envs = Vec<(String, String)>;
pub type JobId = Uuid;
pub type Pid = u32;
