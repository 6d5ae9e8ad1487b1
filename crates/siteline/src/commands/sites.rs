//! Site command handlers.

use siteline_api::{SearchClient, TransportConfig};
use siteline_core::{SiteDirectory, SiteDirectoryConfig};

use crate::cli::{GlobalOpts, SitesArgs, SitesCommand};
use crate::config::Settings;
use crate::error::CliError;
use crate::output;

pub async fn handle(
    args: SitesArgs,
    global: &GlobalOpts,
    settings: &Settings,
) -> Result<(), CliError> {
    match args.command {
        SitesCommand::List { limit } => {
            let site_url = settings.require_site_url()?;

            let transport = TransportConfig {
                timeout: settings.timeout,
                bearer_token: settings.token.clone(),
            };
            let search = SearchClient::new(site_url.clone(), &transport)?;
            let directory = SiteDirectory::with_config(
                search,
                SiteDirectoryConfig {
                    row_limit: limit,
                    timeout: settings.timeout,
                    ..SiteDirectoryConfig::default()
                },
            );

            let records = directory.sites().await?;
            let out = output::render_sites(global.output, &records);
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
