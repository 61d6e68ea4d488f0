use serde::Serialize;
use yieldline_core::cache::{
    CACHE_BACKEND_PROPERTY, CACHE_DIR_PROPERTY, DOCUMENT_AUTH_PROPERTY, DOCUMENT_URL_PROPERTY,
};
use yieldline_core::{mask_property, Credential, CredentialSet, PropertySource, Provider};

use crate::error::CliError;

use super::CommandResult;

const SETTINGS: [&str; 4] = [
    CACHE_BACKEND_PROPERTY,
    CACHE_DIR_PROPERTY,
    DOCUMENT_URL_PROPERTY,
    DOCUMENT_AUTH_PROPERTY,
];

#[derive(Debug, Serialize)]
struct ProviderCredentials {
    provider: Provider,
    property: String,
    count: usize,
    keys: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Setting {
    property: &'static str,
    value: Option<String>,
}

#[derive(Debug, Serialize)]
struct CredentialsData {
    providers: Vec<ProviderCredentials>,
    settings: Vec<Setting>,
}

pub fn run(properties: &dyn PropertySource) -> Result<CommandResult, CliError> {
    let mut warnings = Vec::new();

    let providers = Provider::ALL
        .into_iter()
        .map(|provider| {
            let set = CredentialSet::resolve(properties, provider.credential_property());
            if set.is_empty() {
                warnings.push(format!(
                    "{} is not set; {provider} requests will fail",
                    set.property()
                ));
            }
            ProviderCredentials {
                provider,
                property: set.property().to_owned(),
                count: set.len(),
                keys: set.iter().map(Credential::masked).collect(),
            }
        })
        .collect();

    let settings = SETTINGS
        .into_iter()
        .map(|property| Setting {
            property,
            value: properties
                .get_property(property)
                .map(|value| mask_property(property, &value)),
        })
        .collect();

    let data = serde_json::to_value(CredentialsData {
        providers,
        settings,
    })?;

    Ok(CommandResult::ok(data, Provider::ALL.to_vec()).with_warnings(warnings))
}
