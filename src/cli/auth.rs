use super::ui;
use crate::core::backend::Backend;
use crate::core::model::Credentials;
use crate::core::session::{Session, sign_in, sign_up};
use anyhow::Result;

pub async fn login(
    backend: &dyn Backend,
    session: &mut Session,
    credentials: &Credentials,
) -> Result<()> {
    let spinner = ui::new_spinner("Signing in...");
    let result = sign_in(backend, session, credentials).await;
    spinner.finish_and_clear();

    let user = result?;
    println!(
        "Signed in as {}",
        ui::style_text(user.display_name(), ui::StyleType::TotalValue)
    );
    Ok(())
}

pub async fn register(
    backend: &dyn Backend,
    session: &mut Session,
    credentials: &Credentials,
) -> Result<()> {
    let spinner = ui::new_spinner("Creating account...");
    let result = sign_up(backend, session, credentials).await;
    spinner.finish_and_clear();

    let user = result?;
    println!(
        "Welcome, {}! Your account is ready.",
        ui::style_text(user.display_name(), ui::StyleType::TotalValue)
    );
    Ok(())
}

pub fn logout(session: &mut Session) -> Result<()> {
    if session.user().is_none() {
        println!("{}", ui::style_text("Not signed in.", ui::StyleType::Subtle));
        return Ok(());
    }
    session.clear()?;
    println!("Signed out.");
    Ok(())
}
