//! Creates an admin account, or resets its password.
//!
//! Usage: `create_admin <username> <password>`

use anyhow::{bail, Context};
use env_logger::Env;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let username = args.next().context("usage: create_admin <username> <password>")?;
    let password = args.next().context("usage: create_admin <username> <password>")?;

    let config = polls::app_config::database();
    if config.is_memory() {
        bail!("The in-memory repository does not outlive this process; configure a database URL");
    }

    let repo = polls::db::open_repository(&config)
        .await
        .context("Failed to open the poll repository")?;

    let id = polls::auth::create_admin(repo.as_ref(), &username, &password).await?;
    println!("Admin '{}' saved with id {}", username, id);
    Ok(())
}
