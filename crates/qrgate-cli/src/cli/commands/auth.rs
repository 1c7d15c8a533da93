//! Account command handlers.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use qrgate_core::config::Config;
use qrgate_core::notify::Notifications;
use qrgate_core::session::{AuthForm, AuthMode, Route, form};

use super::{open_gate, report};

pub async fn status(config: &Config) -> Result<()> {
    let gate = open_gate(config).await?;
    match gate.session() {
        Some(session) => println!(
            "Signed in as {} (token {})",
            session.display_identity(),
            session.masked_token()
        ),
        None => println!("Not signed in"),
    }
    gate.shutdown();
    Ok(())
}

pub async fn login(config: &Config, email: String, password: Option<String>) -> Result<()> {
    let mut gate = open_gate(config).await?;
    if gate.route(Route::Auth).is_redirect() {
        if let Some(session) = gate.session() {
            println!("Already signed in as {}", session.display_identity());
        }
        gate.shutdown();
        return Ok(());
    }

    let mut form = AuthForm::new(AuthMode::SignIn);
    form.email = email;
    form.password = password_or_prompt(password)?;

    let mut notices = Notifications::new();
    form.submit(&mut gate, &mut notices).await;
    gate.shutdown();
    report(&mut notices)
}

pub async fn signup(config: &Config, email: String, password: Option<String>) -> Result<()> {
    let mut gate = open_gate(config).await?;
    let mut form = AuthForm::new(AuthMode::SignUp);
    form.email = email;
    form.password = password_or_prompt(password)?;

    let mut notices = Notifications::new();
    form.submit(&mut gate, &mut notices).await;
    gate.shutdown();
    report(&mut notices)
}

pub async fn reset_password(config: &Config, email: String) -> Result<()> {
    let mut gate = open_gate(config).await?;
    let mut form = AuthForm::new(AuthMode::Reset);
    form.email = email;

    let mut notices = Notifications::new();
    form.submit(&mut gate, &mut notices).await;
    gate.shutdown();
    report(&mut notices)
}

pub async fn logout(config: &Config) -> Result<()> {
    let mut gate = open_gate(config).await?;
    if gate.session().is_none() {
        println!("Not signed in");
        gate.shutdown();
        return Ok(());
    }

    let mut notices = Notifications::new();
    form::sign_out(&mut gate, &mut notices).await;
    gate.shutdown();
    report(&mut notices)
}

fn password_or_prompt(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    eprint!("Password: ");
    io::stderr()
        .flush()
        .context("Failed to write password prompt")?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
