use config::{Config, ConfigError, Environment as ConfigEnvironment, File};
use secrecy::Secret;
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub llm: LlmSettings,
    pub places: PlacesSettings,
    pub stocks: StocksSettings,
    pub shopping: ShoppingSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

/// Router + commentary collaborator (Gemini-compatible endpoint). The key is
/// injected here and nowhere else; services never read ambient credentials.
#[derive(serde::Deserialize, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    #[serde(default = "empty_secret")]
    pub api_key: Secret<String>,
}

#[derive(serde::Deserialize, Clone)]
pub struct PlacesSettings {
    pub base_url: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default = "empty_secret")]
    pub client_secret: Secret<String>,
}

#[derive(serde::Deserialize, Clone)]
pub struct StocksSettings {
    pub base_url: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct ShoppingSettings {
    pub base_url: String,
}

fn empty_secret() -> Secret<String> {
    Secret::new(String::new())
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let base_path = std::env::current_dir()
        .expect("Failed to determine current directory")
        .join("configuration");

    let environment: AppEnvironment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .expect("Failed to parse APP_ENVIRONMENT");

    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = Config::builder()
        .add_source(File::from(base_path.join("base.yaml")))
        .add_source(File::from(base_path.join(&environment_filename)))
        .add_source(
            ConfigEnvironment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

pub enum AppEnvironment {
    Local,
    Production,
}

impl AppEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppEnvironment::Local => "local",
            AppEnvironment::Production => "production",
        }
    }
}

impl TryFrom<String> for AppEnvironment {
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
