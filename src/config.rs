use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub storage: StorageSettings,
    #[serde(default)]
    pub detection: DetectionSettings,
    #[serde(default)]
    pub renderer: RendererSettings,
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.try_into().map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    pub bucket: String,
    pub image_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DetectionSettings {
    #[serde(default = "default_max_labels")]
    pub max_labels: i32,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            max_labels: default_max_labels(),
        }
    }
}

fn default_max_labels() -> i32 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct RendererSettings {
    #[serde(default)]
    pub mode: RendererMode,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            mode: RendererMode::default(),
            output_path: default_output_path(),
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("annotated.png")
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RendererMode {
    #[default]
    Window,
    File,
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .expect("Failed to parse APP_ENVIRONMENT");

    let settings = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(config::File::from(
            configuration_directory.join(format!("{}.yaml", environment.as_str())),
        ))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let mut settings = settings.try_deserialize::<Settings>()?;
    apply_named_overrides(&mut settings, |name| std::env::var(name).ok())?;

    Ok(settings)
}

// The short variable names promised by the external interface, applied on top
// of the layered sources.
fn apply_named_overrides(
    settings: &mut Settings,
    var: impl Fn(&str) -> Option<String>,
) -> Result<(), config::ConfigError> {
    if let Some(bucket) = var("BUCKET_NAME") {
        settings.storage.bucket = bucket;
    }
    if let Some(image_key) = var("IMAGE_KEY") {
        settings.storage.image_key = image_key;
    }
    if let Some(max_labels) = var("MAX_LABELS") {
        settings.detection.max_labels = max_labels.parse().map_err(|_| {
            config::ConfigError::Message(format!("MAX_LABELS is not an integer: {}", max_labels))
        })?;
    }
    Ok(())
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub enum LogLevel {
    Debug,
    Info,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            other => Err(format!(
                "{} is not a supported minimum log level. Use either `debug` or `info`.",
                other
            )),
        }
    }
}
