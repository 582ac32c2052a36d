pub mod provider;

pub use provider::{
    ProviderKind, ProviderSettings, DEFAULT_PROVIDER_CONFIG_PATH, ENV_PROVIDER_CONFIG_PATH,
};
