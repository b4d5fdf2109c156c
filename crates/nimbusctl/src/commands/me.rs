//! The `me` command: print the authenticated user.

use crate::output::{write_out, OutputFormat};
use nimbusctl_api::{Api, IdentityApi};

pub async fn handle_me(api: &Api, format: OutputFormat) -> anyhow::Result<()> {
    let user = api.get_current_user_info().await?;
    write_out(&user, format)
}
