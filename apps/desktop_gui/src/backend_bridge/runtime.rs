//! Backend worker: a dedicated thread hosting a tokio runtime that drains
//! the command queue, talks to the gateways, and reports back as UI events.
//! The UI thread never blocks on the network.

use std::thread;

use client_core::{ApiClient, GatewayError, Session, SessionService};
use crossbeam_channel::{Receiver, Sender};
use shared::domain::UserId;
use tracing::{error, info, warn};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(base_url: String, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                error!(error = %err, "failed to build backend runtime");
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("no se pudo iniciar el proceso de red: {err}"),
                )));
                return;
            }
        };

        runtime.block_on(async move {
            let client = ApiClient::new(base_url);
            let mut sessions = SessionService::at_default_path();
            if let Some(session) = sessions.restore() {
                info!(user = %session.principal.user.email, "resuming persisted session");
                let _ = ui_tx.try_send(UiEvent::SessionRestored(session.principal.clone()));
            }

            while let Ok(command) = cmd_rx.recv() {
                handle_command(command, &client, &mut sessions, &ui_tx).await;
            }
        });
    });
}

fn emit(ui_tx: &Sender<UiEvent>, event: UiEvent) {
    if ui_tx.try_send(event).is_err() {
        warn!("ui event queue full, dropping event");
    }
}

fn emit_error(ui_tx: &Sender<UiEvent>, context: UiErrorContext, err: &GatewayError) {
    emit(ui_tx, UiEvent::Error(UiError::from_gateway(context, err)));
}

/// Clones the session out of the service so the borrow does not extend over
/// the whole command future.
fn require_session(
    sessions: &SessionService,
    ui_tx: &Sender<UiEvent>,
    context: UiErrorContext,
) -> Option<Session> {
    match sessions.current() {
        Some(session) => Some(session.clone()),
        None => {
            emit(
                ui_tx,
                UiEvent::Error(UiError::from_message(
                    context,
                    "No hay una sesión activa. Inicie sesión nuevamente.",
                )),
            );
            None
        }
    }
}

async fn handle_command(
    command: BackendCommand,
    client: &ApiClient,
    sessions: &mut SessionService,
    ui_tx: &Sender<UiEvent>,
) {
    match command {
        BackendCommand::Login { email, password } => {
            match client.login(&email, &password).await {
                Ok(principal) => {
                    if let Err(err) = sessions.login(principal.clone()) {
                        warn!(error = %err, "failed to persist session");
                    }
                    emit(ui_tx, UiEvent::LoggedIn(principal));
                }
                Err(err) => emit_error(ui_tx, UiErrorContext::Login, &err),
            }
        }
        BackendCommand::Logout => {
            if let Err(err) = sessions.logout() {
                warn!(error = %err, "failed to remove persisted session");
            }
            emit(ui_tx, UiEvent::LoggedOut);
        }
        BackendCommand::LoadEnrollmentWorkspace => {
            let Some(session) =
                require_session(sessions, ui_tx, UiErrorContext::LoadEnrollments)
            else {
                return;
            };
            // All three settle before anything is committed; one failure
            // aborts the whole load.
            let (enrollments, programas, usuarios) = tokio::join!(
                client.list_enrollments(&session),
                client.list_programs(&session),
                client.list_users(&session),
            );
            match (enrollments, programas, usuarios) {
                (Ok(enrollments), Ok(programas), Ok(usuarios)) => emit(
                    ui_tx,
                    UiEvent::EnrollmentWorkspaceLoaded {
                        enrollments,
                        programas,
                        usuarios,
                    },
                ),
                (enrollments, programas, usuarios) => {
                    let err = [
                        enrollments.err(),
                        programas.err(),
                        usuarios.err(),
                    ]
                    .into_iter()
                    .flatten()
                    .next();
                    if let Some(err) = err {
                        emit_error(ui_tx, UiErrorContext::LoadEnrollments, &err);
                    }
                }
            }
        }
        BackendCommand::CreateEnrollment(request) => {
            let Some(session) =
                require_session(sessions, ui_tx, UiErrorContext::CreateEnrollment)
            else {
                return;
            };
            match client.create_enrollment(&session, &request).await {
                Ok(server_id) => emit(ui_tx, UiEvent::EnrollmentCreated { request, server_id }),
                Err(err) => emit_error(ui_tx, UiErrorContext::CreateEnrollment, &err),
            }
        }
        BackendCommand::UpdateEnrollment { id, update } => {
            let Some(session) =
                require_session(sessions, ui_tx, UiErrorContext::SaveEnrollment)
            else {
                return;
            };
            match client.update_enrollment(&session, &id, &update).await {
                Ok(()) => emit(ui_tx, UiEvent::EnrollmentUpdated { id, update }),
                Err(err) => emit_error(ui_tx, UiErrorContext::SaveEnrollment, &err),
            }
        }
        BackendCommand::DeleteEnrollment { id } => {
            let Some(session) =
                require_session(sessions, ui_tx, UiErrorContext::DeleteEnrollment)
            else {
                return;
            };
            match client.delete_enrollment(&session, &id).await {
                Ok(()) => emit(ui_tx, UiEvent::EnrollmentDeleted { id }),
                Err(err) => emit_error(ui_tx, UiErrorContext::DeleteEnrollment, &err),
            }
        }
        BackendCommand::LoadUsers => {
            let Some(session) = require_session(sessions, ui_tx, UiErrorContext::LoadUsers)
            else {
                return;
            };
            match client.list_users(&session).await {
                Ok(users) => emit(ui_tx, UiEvent::UsersLoaded(users)),
                Err(err) => emit_error(ui_tx, UiErrorContext::LoadUsers, &err),
            }
        }
        BackendCommand::CreateUser { user, profile } => {
            if let Err(err) = client.create_user(&user).await {
                emit_error(ui_tx, UiErrorContext::SaveUser, &err);
                return;
            }
            // The insert does not echo an id, so the profile is linked by
            // looking the new account up by DNI. A profile failure does not
            // roll the account back; it is reported and the account stands.
            if let Some(profile) = profile {
                let Some(session) = require_session(sessions, ui_tx, UiErrorContext::SaveUser)
                else {
                    return;
                };
                match resolve_user_id_by_dni(client, &session, &user.dni).await {
                    Ok(usuario_id) => {
                        let profile = shared::protocol::NewProfile {
                            usuario_id,
                            ..profile
                        };
                        if let Err(err) = client.create_profile(&session, &profile).await {
                            warn!(error = %err, dni = %user.dni, "profile creation failed after user insert");
                            emit_error(ui_tx, UiErrorContext::SaveUser, &err);
                            return;
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, dni = %user.dni, "could not resolve new user for profile");
                        emit_error(ui_tx, UiErrorContext::SaveUser, &err);
                        return;
                    }
                }
            }
            emit(ui_tx, UiEvent::UserSaved);
        }
        BackendCommand::UpdateUser { id, update } => {
            let Some(session) = require_session(sessions, ui_tx, UiErrorContext::SaveUser)
            else {
                return;
            };
            match client.update_user(&session, &id, &update).await {
                Ok(()) => emit(ui_tx, UiEvent::UserSaved),
                Err(err) => emit_error(ui_tx, UiErrorContext::SaveUser, &err),
            }
        }
        BackendCommand::LoadPrograms => {
            let Some(session) =
                require_session(sessions, ui_tx, UiErrorContext::LoadPrograms)
            else {
                return;
            };
            match client.list_programs(&session).await {
                Ok(programs) => emit(ui_tx, UiEvent::ProgramsLoaded(programs)),
                Err(err) => emit_error(ui_tx, UiErrorContext::LoadPrograms, &err),
            }
        }
        BackendCommand::CreateProgram(program) => {
            let Some(session) =
                require_session(sessions, ui_tx, UiErrorContext::SaveProgram)
            else {
                return;
            };
            match client.create_program(&session, &program).await {
                Ok(()) => emit(ui_tx, UiEvent::ProgramSaved),
                Err(err) => emit_error(ui_tx, UiErrorContext::SaveProgram, &err),
            }
        }
        BackendCommand::UpdateProgram { id, program } => {
            let Some(session) =
                require_session(sessions, ui_tx, UiErrorContext::SaveProgram)
            else {
                return;
            };
            match client.update_program(&session, &id, &program).await {
                Ok(()) => emit(ui_tx, UiEvent::ProgramSaved),
                Err(err) => emit_error(ui_tx, UiErrorContext::SaveProgram, &err),
            }
        }
        BackendCommand::DeleteProgram { id } => {
            let Some(session) =
                require_session(sessions, ui_tx, UiErrorContext::DeleteProgram)
            else {
                return;
            };
            match client.delete_program(&session, &id).await {
                Ok(()) => emit(ui_tx, UiEvent::ProgramDeleted { id }),
                Err(err) => emit_error(ui_tx, UiErrorContext::DeleteProgram, &err),
            }
        }
        BackendCommand::FetchProfile { usuario_id } => {
            let Some(session) =
                require_session(sessions, ui_tx, UiErrorContext::FetchProfile)
            else {
                return;
            };
            match client.profile_for_user(&session, &usuario_id).await {
                Ok(profile) => emit(ui_tx, UiEvent::ProfileLoaded(profile)),
                Err(err) => emit_error(ui_tx, UiErrorContext::FetchProfile, &err),
            }
        }
    }
}

async fn resolve_user_id_by_dni(
    client: &ApiClient,
    session: &Session,
    dni: &str,
) -> Result<UserId, GatewayError> {
    let users = client.list_users(session).await?;
    users
        .into_iter()
        .find(|user| user.dni == dni)
        .map(|user| user.id)
        .ok_or_else(|| {
            GatewayError::Envelope(format!("usuario recién creado con DNI {dni} no encontrado"))
        })
}
