//! License command handlers.

use std::sync::Arc;

use siteline_api::{LicensingClient, TransportConfig};
use siteline_core::{JsonFileStore, LicenseCheck, LicenseValidator};

use crate::cli::{GlobalOpts, LicenseArgs, LicenseCommand};
use crate::config::Settings;
use crate::error::CliError;
use crate::output;

fn build_validator(settings: &Settings) -> Result<LicenseValidator, CliError> {
    let site_url = settings.require_site_url()?;
    let endpoint = settings.require_license_endpoint()?;

    // The licensing endpoint itself is unauthenticated; no token here.
    let transport = TransportConfig {
        timeout: settings.timeout,
        bearer_token: None,
    };
    let licensing = LicensingClient::new(endpoint.clone(), settings.product.clone(), &transport)?;
    let store = Arc::new(JsonFileStore::open(&settings.cache_path));

    Ok(LicenseValidator::new(licensing, store, site_url))
}

pub async fn handle(
    args: LicenseArgs,
    global: &GlobalOpts,
    settings: &Settings,
) -> Result<(), CliError> {
    let validator = build_validator(settings)?;
    let color = output::should_color(global.color);

    match args.command {
        LicenseCommand::Status { refresh, quick } => {
            let check = if quick {
                match validator.quick_cache_status() {
                    Some(status) => LicenseCheck {
                        status,
                        cached: true,
                    },
                    None => {
                        output::print_output("no usable cached license status", global.quiet);
                        return Ok(());
                    }
                }
            } else {
                validator.status(refresh).await
            };

            let out = output::render_license(global.output, &check, color);
            output::print_output(&out, global.quiet);
            Ok(())
        }

        LicenseCommand::ClearCache => {
            validator.clear_cache();
            if !global.quiet {
                eprintln!("License cache cleared");
            }
            Ok(())
        }
    }
}
