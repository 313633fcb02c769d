//! Small console client for quick inspection against a live backend:
//! signs in and dumps the enrollment listing, optionally filtered by
//! status.

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{ApiClient, Session};
use shared::domain::EnrollmentStatus;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "reinserta-console")]
struct Args {
    #[arg(long, env = "REINSERTA_API_URL")]
    api_url: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    /// Restrict the listing to one status (INSCRITO or FINALIZADO).
    #[arg(long)]
    estado: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let estado = args
        .estado
        .as_deref()
        .map(parse_estado)
        .transpose()
        .context("invalid --estado value")?;

    let client = ApiClient::new(args.api_url);
    let principal = client
        .login(&args.email, &args.password)
        .await
        .context("login failed")?;
    println!(
        "Sesión iniciada como {} ({})",
        principal.user.full_name(),
        principal.user.rol.label()
    );
    let session = Session::new(principal);

    let enrollments = client
        .list_enrollments(&session)
        .await
        .context("failed to list enrollments")?;
    info!(total = enrollments.len(), "enrollment listing received");
    let mut shown = 0;
    for row in &enrollments {
        if estado.is_some_and(|wanted| row.estado != wanted) {
            continue;
        }
        let who = row
            .usuario
            .as_ref()
            .map(|u| u.full_name())
            .unwrap_or_else(|| row.usuario_id.0.clone());
        let nota = row
            .nota_final
            .map(|n| format!("{n:.1}"))
            .unwrap_or_else(|| "—".to_string());
        println!(
            "{}\t{}\t{}\t{}\t{}",
            row.id,
            who,
            row.nombre_programa,
            row.estado.label(),
            nota
        );
        shown += 1;
    }
    println!("{shown} de {} inscripciones", enrollments.len());

    Ok(())
}

fn parse_estado(raw: &str) -> Result<EnrollmentStatus> {
    match raw.to_ascii_uppercase().as_str() {
        "INSCRITO" => Ok(EnrollmentStatus::Inscrito),
        "FINALIZADO" => Ok(EnrollmentStatus::Finalizado),
        other => anyhow::bail!("unknown status {other}"),
    }
}
