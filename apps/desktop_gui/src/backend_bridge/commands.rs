//! Backend commands queued from UI to backend worker.

use shared::{
    domain::{EnrollmentId, ProgramId, UserId},
    protocol::{
        EnrollmentUpdate, NewEnrollment, NewProfile, NewProgram, NewUser, UserUpdate,
    },
};

pub enum BackendCommand {
    Login {
        email: String,
        password: String,
    },
    Logout,
    // One load for the whole enrollment screen: the three collections are
    // fetched together and committed together.
    LoadEnrollmentWorkspace,
    CreateEnrollment(NewEnrollment),
    UpdateEnrollment {
        id: EnrollmentId,
        update: EnrollmentUpdate,
    },
    DeleteEnrollment {
        id: EnrollmentId,
    },
    LoadUsers,
    CreateUser {
        user: NewUser,
        profile: Option<NewProfile>,
    },
    UpdateUser {
        id: UserId,
        update: UserUpdate,
    },
    LoadPrograms,
    CreateProgram(NewProgram),
    UpdateProgram {
        id: ProgramId,
        program: NewProgram,
    },
    DeleteProgram {
        id: ProgramId,
    },
    FetchProfile {
        usuario_id: UserId,
    },
}
