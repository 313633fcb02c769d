//! Events flowing from the backend worker to the UI, and error modeling.

use client_core::GatewayError;
use shared::{
    domain::{Enrollment, EnrollmentId, Profile, Program, ProgramId, User},
    protocol::{AuthenticatedUser, EnrollmentUpdate, NewEnrollment},
};

pub enum UiEvent {
    LoggedIn(AuthenticatedUser),
    SessionRestored(AuthenticatedUser),
    LoggedOut,
    Info(String),
    Error(UiError),
    // All three collections arrive together or not at all.
    EnrollmentWorkspaceLoaded {
        enrollments: Vec<Enrollment>,
        programas: Vec<Program>,
        usuarios: Vec<User>,
    },
    EnrollmentCreated {
        request: NewEnrollment,
        server_id: Option<EnrollmentId>,
    },
    EnrollmentUpdated {
        id: EnrollmentId,
        update: EnrollmentUpdate,
    },
    EnrollmentDeleted {
        id: EnrollmentId,
    },
    UsersLoaded(Vec<User>),
    UserSaved,
    ProgramsLoaded(Vec<Program>),
    ProgramSaved,
    ProgramDeleted {
        id: ProgramId,
    },
    ProfileLoaded(Profile),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Auth,
    Transport,
    Validation,
    NotFound,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Login,
    LoadEnrollments,
    SaveEnrollment,
    CreateEnrollment,
    DeleteEnrollment,
    LoadUsers,
    SaveUser,
    LoadPrograms,
    SaveProgram,
    DeleteProgram,
    FetchProfile,
    General,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_gateway(context: UiErrorContext, err: &GatewayError) -> Self {
        let category = match err {
            GatewayError::Transport(_) => UiErrorCategory::Transport,
            GatewayError::Api { status, .. } => match status {
                401 | 403 => UiErrorCategory::Auth,
                404 => UiErrorCategory::NotFound,
                400 | 422 => UiErrorCategory::Validation,
                _ => UiErrorCategory::Unknown,
            },
            GatewayError::Envelope(_) => UiErrorCategory::Unknown,
        };
        Self {
            category,
            context,
            message: err.to_string(),
        }
    }

    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        Self {
            category: UiErrorCategory::Unknown,
            context,
            message: message.into(),
        }
    }

    pub fn requires_reauth(&self) -> bool {
        self.category == UiErrorCategory::Auth
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub fn category_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Auth => "Sesión",
        UiErrorCategory::Transport => "Conexión",
        UiErrorCategory::Validation => "Validación",
        UiErrorCategory::NotFound => "No encontrado",
        UiErrorCategory::Unknown => "Error",
    }
}
