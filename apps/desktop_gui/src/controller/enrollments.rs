//! State and transitions for the enrollment screen. The UI only echoes this
//! state and forwards user intent; every rule about filtering, the single
//! edit slot, optimistic merges, and the delete confirmation lives here.

use chrono::{Local, NaiveDate, Utc};
use shared::{
    domain::{Enrollment, EnrollmentId, EnrollmentStatus, Program, User},
    protocol::{EnrollmentUpdate, NewEnrollment},
};
use tracing::warn;

pub const GRADE_MIN: f64 = 0.0;
pub const GRADE_MAX: f64 = 20.0;

const CREATE_VALIDATION_MESSAGE: &str = "Debe seleccionar un interno y un programa.";
const GRADE_VALIDATION_MESSAGE: &str = "La nota debe ser un número entre 0 y 20.";
const UNKNOWN_PROGRAM_NAME: &str = "Desconocido";

/// Buffer for the row under inline edit. The grade is kept as raw text so
/// the operator can clear it or type freely; parsing happens on commit.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrollmentDraft {
    pub estado: EnrollmentStatus,
    pub nota_final: String,
}

impl EnrollmentDraft {
    fn seeded_from(row: &Enrollment) -> Self {
        Self {
            estado: row.estado,
            nota_final: row.nota_final.map(format_grade).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateForm {
    pub usuario_id: String,
    pub programa_id: String,
}

/// What happens to the confirmation dialog when a delete fails server-side.
/// Closing it regardless of outcome mirrors the historical behavior; keeping
/// it open lets the operator retry without re-selecting the row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeleteDialogPolicy {
    #[default]
    AlwaysClose,
    StayOpenOnFailure,
}

pub struct EnrollmentWorkspace {
    pub enrollments: Vec<Enrollment>,
    pub programas: Vec<Program>,
    /// Only inmates and former inmates; everyone else cannot be enrolled.
    pub usuarios: Vec<User>,
    pub search: String,
    pub estado_filter: Option<EnrollmentStatus>,
    edit_slot: Option<(EnrollmentId, EnrollmentDraft)>,
    pending_delete: Option<EnrollmentId>,
    pub create_open: bool,
    pub create_form: CreateForm,
    pub banner: Option<String>,
    pub loading: bool,
    pub creating: bool,
    pub deleting: bool,
    pub delete_policy: DeleteDialogPolicy,
}

impl EnrollmentWorkspace {
    pub fn new() -> Self {
        Self {
            enrollments: Vec::new(),
            programas: Vec::new(),
            usuarios: Vec::new(),
            search: String::new(),
            estado_filter: None,
            edit_slot: None,
            pending_delete: None,
            create_open: false,
            create_form: CreateForm::default(),
            banner: None,
            loading: false,
            creating: false,
            deleting: false,
            delete_policy: DeleteDialogPolicy::default(),
        }
    }

    // ---- load ----

    pub fn begin_load(&mut self) {
        self.loading = true;
    }

    /// Commits one consistent snapshot of all three collections. Users are
    /// narrowed to enrollable roles here so the creation picker never offers
    /// staff accounts.
    pub fn apply_loaded(
        &mut self,
        enrollments: Vec<Enrollment>,
        programas: Vec<Program>,
        usuarios: Vec<User>,
    ) {
        self.enrollments = enrollments;
        self.programas = programas;
        self.usuarios = usuarios
            .into_iter()
            .filter(|u| u.rol.is_eligible())
            .collect();
        self.loading = false;
        self.banner = None;
    }

    /// A failed load leaves whatever was on screen untouched.
    pub fn apply_load_failed(&mut self, message: &str) {
        warn!(error = message, "enrollment load failed");
        self.loading = false;
        self.banner = Some(format!("No se pudieron cargar las inscripciones: {message}"));
    }

    // ---- filtering ----

    /// Recomputed on every call; the search matches case-insensitively
    /// against the enrolled user's full name plus the program name, and the
    /// status filter is exact-match or pass-through when unset.
    pub fn visible_rows(&self) -> Vec<&Enrollment> {
        let needle = self.search.trim().to_lowercase();
        self.enrollments
            .iter()
            .filter(|row| {
                needle.is_empty() || row.search_text().to_lowercase().contains(&needle)
            })
            .filter(|row| {
                self.estado_filter
                    .map(|estado| row.estado == estado)
                    .unwrap_or(true)
            })
            .collect()
    }

    // ---- inline edit ----

    /// One slot for the whole table; starting an edit while another is open
    /// silently replaces it.
    pub fn begin_edit(&mut self, id: &EnrollmentId) {
        if let Some(row) = self.enrollments.iter().find(|row| &row.id == id) {
            self.edit_slot = Some((row.id.clone(), EnrollmentDraft::seeded_from(row)));
        }
    }

    pub fn edit_slot(&self) -> Option<&(EnrollmentId, EnrollmentDraft)> {
        self.edit_slot.as_ref()
    }

    pub fn draft_mut(&mut self, id: &EnrollmentId) -> Option<&mut EnrollmentDraft> {
        match &mut self.edit_slot {
            Some((slot_id, draft)) if slot_id == id => Some(draft),
            _ => None,
        }
    }

    pub fn cancel_edit(&mut self) {
        self.edit_slot = None;
    }

    /// Validates the open draft and, when valid, returns the update payload
    /// to send. An empty grade field means "not yet graded". The slot stays
    /// open until the commit is confirmed.
    pub fn commit_request(&mut self) -> Option<(EnrollmentId, EnrollmentUpdate)> {
        let (id, draft) = self.edit_slot.as_ref()?;
        let nota_final = match parse_grade(&draft.nota_final) {
            Ok(nota) => nota,
            Err(()) => {
                self.banner = Some(GRADE_VALIDATION_MESSAGE.to_string());
                return None;
            }
        };
        Some((
            id.clone(),
            EnrollmentUpdate {
                estado: draft.estado,
                nota_final,
            },
        ))
    }

    /// Merges the confirmed values into the one edited row; no other row is
    /// touched and no re-fetch happens.
    pub fn apply_edit_committed(&mut self, id: &EnrollmentId, update: &EnrollmentUpdate) {
        if let Some(row) = self.enrollments.iter_mut().find(|row| &row.id == id) {
            row.estado = update.estado;
            row.nota_final = update.nota_final;
        }
        self.edit_slot = None;
        self.banner = None;
    }

    /// The slot keeps the attempted values so the operator can retry.
    pub fn apply_edit_failed(&mut self, message: &str) {
        warn!(error = message, "enrollment update failed");
        self.banner = Some(format!("No se pudo actualizar la inscripción: {message}"));
    }

    // ---- delete ----

    /// Selecting a row only opens the confirmation; nothing is sent yet.
    pub fn request_delete(&mut self, id: EnrollmentId) {
        self.pending_delete = Some(id);
    }

    pub fn pending_delete(&self) -> Option<&EnrollmentId> {
        self.pending_delete.as_ref()
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Explicit confirmation hands back the id to delete and marks the
    /// operation in flight; the dialog stays up until the result arrives.
    pub fn confirm_delete(&mut self) -> Option<EnrollmentId> {
        let id = self.pending_delete.clone()?;
        self.deleting = true;
        Some(id)
    }

    pub fn apply_delete_result(&mut self, id: &EnrollmentId, result: Result<(), String>) {
        match result {
            Ok(()) => {
                self.deleting = false;
                self.enrollments.retain(|row| &row.id != id);
                self.pending_delete = None;
                self.banner = None;
            }
            Err(message) => self.apply_delete_failed(&message),
        }
    }

    /// Failure path for an in-flight delete. The dialog may already have
    /// been cancelled by the time the error arrives, so this does not need a
    /// pending id to clear the busy flag.
    pub fn apply_delete_failed(&mut self, message: &str) {
        warn!(error = message, "enrollment delete failed");
        self.deleting = false;
        self.banner = Some(format!("No se pudo eliminar la inscripción: {message}"));
        if self.delete_policy == DeleteDialogPolicy::AlwaysClose {
            self.pending_delete = None;
        }
    }

    // ---- create ----

    pub fn open_create(&mut self) {
        self.create_open = true;
        self.create_form = CreateForm::default();
    }

    pub fn close_create(&mut self) {
        self.create_open = false;
        self.creating = false;
    }

    /// Local validation only; an invalid form never reaches the network.
    pub fn create_request(&mut self) -> Option<NewEnrollment> {
        if self.create_form.usuario_id.trim().is_empty()
            || self.create_form.programa_id.trim().is_empty()
        {
            self.banner = Some(CREATE_VALIDATION_MESSAGE.to_string());
            return None;
        }
        self.creating = true;
        Some(NewEnrollment {
            usuario_id: self.create_form.usuario_id.trim().into(),
            programa_id: self.create_form.programa_id.trim().into(),
            estado: EnrollmentStatus::Inscrito,
        })
    }

    /// Synthesizes the new row from the submitted ids and the collections
    /// already on screen, so it appears without a reload. Divergence from
    /// server-side normalization is accepted until the next full load.
    pub fn apply_created(&mut self, request: &NewEnrollment, server_id: Option<EnrollmentId>) {
        let row = self.synthesize_row(request, server_id, Local::now().date_naive());
        self.enrollments.push(row);
        self.creating = false;
        self.create_open = false;
        self.create_form = CreateForm::default();
        self.banner = None;
    }

    pub fn apply_create_failed(&mut self, message: &str) {
        warn!(error = message, "enrollment create failed");
        self.creating = false;
        self.banner = Some(format!("No se pudo crear la inscripción: {message}"));
    }

    fn synthesize_row(
        &self,
        request: &NewEnrollment,
        server_id: Option<EnrollmentId>,
        today: NaiveDate,
    ) -> Enrollment {
        let usuario = self
            .usuarios
            .iter()
            .find(|u| u.id == request.usuario_id)
            .cloned();
        let nombre_programa = self
            .programas
            .iter()
            .find(|p| p.id == request.programa_id)
            .map(|p| p.nombre.clone())
            .unwrap_or_else(|| UNKNOWN_PROGRAM_NAME.to_string());
        Enrollment {
            id: server_id.unwrap_or_else(placeholder_id),
            usuario_id: request.usuario_id.clone(),
            usuario,
            programa_id: Some(request.programa_id.clone()),
            nombre_programa,
            estado: request.estado,
            fecha_inscripcion: today,
            nota_final: None,
        }
    }
}

impl Default for EnrollmentWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Placeholder id for an optimistic row the server did not identify; it is
/// replaced by the real id on the next full load.
fn placeholder_id() -> EnrollmentId {
    EnrollmentId(format!("local-{}", Utc::now().timestamp_millis()))
}

/// Empty means not yet graded; anything else must parse into [0, 20].
fn parse_grade(raw: &str) -> Result<Option<f64>, ()> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(nota) if (GRADE_MIN..=GRADE_MAX).contains(&nota) => Ok(Some(nota)),
        _ => Err(()),
    }
}

/// One fractional digit, or an em-dash for a missing grade.
pub fn format_grade(nota: f64) -> String {
    format!("{nota:.1}")
}

pub fn grade_cell(nota: Option<f64>) -> String {
    nota.map(format_grade).unwrap_or_else(|| "—".to_string())
}

#[cfg(test)]
mod tests {
    use shared::domain::{ProgramId, ProgramKind, Role, UserId};

    use super::*;

    fn user(id: &str, nombre: &str, apellido: &str, rol: Role) -> User {
        User {
            id: UserId::from(id),
            nombre: nombre.to_string(),
            apellido: apellido.to_string(),
            dni: "12345678".to_string(),
            email: format!("{nombre}@correo.gov").to_lowercase(),
            telefono: None,
            rol,
        }
    }

    fn program(id: &str, nombre: &str) -> Program {
        Program {
            id: ProgramId::from(id),
            nombre: nombre.to_string(),
            descripcion: String::new(),
            tipo: ProgramKind::Educativo,
        }
    }

    fn enrollment(id: &str, who: Option<User>, programa: &str, estado: EnrollmentStatus) -> Enrollment {
        Enrollment {
            id: EnrollmentId::from(id),
            usuario_id: who
                .as_ref()
                .map(|u| u.id.clone())
                .unwrap_or_else(|| UserId::from("0")),
            usuario: who,
            programa_id: None,
            nombre_programa: programa.to_string(),
            estado,
            fecha_inscripcion: NaiveDate::from_ymd_opt(2024, 3, 1).expect("date"),
            nota_final: None,
        }
    }

    fn loaded_workspace() -> EnrollmentWorkspace {
        let mut ws = EnrollmentWorkspace::new();
        ws.apply_loaded(
            vec![
                enrollment(
                    "1",
                    Some(user("10", "Luis", "Paredes", Role::Interno)),
                    "Carpintería",
                    EnrollmentStatus::Inscrito,
                ),
                enrollment(
                    "2",
                    Some(user("11", "Marta", "Quispe", Role::ExInterno)),
                    "Alfabetización",
                    EnrollmentStatus::Finalizado,
                ),
            ],
            vec![program("3", "Carpintería"), program("4", "Alfabetización")],
            vec![
                user("10", "Luis", "Paredes", Role::Interno),
                user("11", "Marta", "Quispe", Role::ExInterno),
                user("12", "Elena", "Ríos", Role::Docente),
            ],
        );
        ws
    }

    #[test]
    fn load_keeps_only_enrollable_users_for_the_picker() {
        let ws = loaded_workspace();
        let ids: Vec<&str> = ws.usuarios.iter().map(|u| u.id.0.as_str()).collect();
        assert_eq!(ids, vec!["10", "11"]);
    }

    #[test]
    fn failed_load_retains_prior_state_and_sets_the_banner() {
        let mut ws = loaded_workspace();
        ws.begin_load();
        ws.apply_load_failed("server error 500: boom");

        assert!(!ws.loading);
        assert_eq!(ws.enrollments.len(), 2);
        assert_eq!(ws.programas.len(), 2);
        assert!(ws.banner.as_deref().is_some_and(|b| b.contains("boom")));
    }

    #[test]
    fn empty_search_shows_the_full_collection() {
        let ws = loaded_workspace();
        assert_eq!(ws.visible_rows().len(), 2);
    }

    #[test]
    fn search_matches_name_and_program_case_insensitively() {
        let mut ws = loaded_workspace();

        ws.search = "PAREDES".to_string();
        let rows = ws.visible_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, EnrollmentId::from("1"));

        ws.search = "alfabet".to_string();
        let rows = ws.visible_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, EnrollmentId::from("2"));

        ws.search = "no-such".to_string();
        assert!(ws.visible_rows().is_empty());
    }

    #[test]
    fn status_filter_is_exact_match_or_pass_through() {
        let mut ws = loaded_workspace();

        ws.estado_filter = Some(EnrollmentStatus::Finalizado);
        let rows = ws.visible_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, EnrollmentId::from("2"));

        ws.estado_filter = None;
        assert_eq!(ws.visible_rows().len(), 2);
    }

    #[test]
    fn search_and_status_filter_compose() {
        let mut ws = loaded_workspace();
        ws.search = "luis".to_string();
        ws.estado_filter = Some(EnrollmentStatus::Finalizado);
        assert!(ws.visible_rows().is_empty());
    }

    #[test]
    fn begin_edit_seeds_the_draft_from_the_row() {
        let mut ws = loaded_workspace();
        ws.enrollments[1].nota_final = Some(12.0);
        ws.begin_edit(&EnrollmentId::from("2"));

        let (id, draft) = ws.edit_slot().expect("slot open");
        assert_eq!(id, &EnrollmentId::from("2"));
        assert_eq!(draft.estado, EnrollmentStatus::Finalizado);
        assert_eq!(draft.nota_final, "12.0");
    }

    #[test]
    fn starting_a_second_edit_silently_replaces_the_first() {
        let mut ws = loaded_workspace();
        ws.begin_edit(&EnrollmentId::from("1"));
        ws.draft_mut(&EnrollmentId::from("1"))
            .expect("draft")
            .nota_final = "18".to_string();

        ws.begin_edit(&EnrollmentId::from("2"));
        let (id, draft) = ws.edit_slot().expect("slot open");
        assert_eq!(id, &EnrollmentId::from("2"));
        assert_ne!(draft.nota_final, "18");
    }

    #[test]
    fn committed_edit_updates_exactly_one_row_and_clears_the_slot() {
        let mut ws = loaded_workspace();
        ws.begin_edit(&EnrollmentId::from("1"));
        {
            let draft = ws.draft_mut(&EnrollmentId::from("1")).expect("draft");
            draft.estado = EnrollmentStatus::Finalizado;
            draft.nota_final = "15.5".to_string();
        }

        let (id, update) = ws.commit_request().expect("valid draft");
        assert_eq!(update.nota_final, Some(15.5));
        ws.apply_edit_committed(&id, &update);

        assert_eq!(ws.enrollments[0].estado, EnrollmentStatus::Finalizado);
        assert_eq!(ws.enrollments[0].nota_final, Some(15.5));
        assert_eq!(grade_cell(ws.enrollments[0].nota_final), "15.5");
        // the other row is untouched
        assert_eq!(ws.enrollments[1].estado, EnrollmentStatus::Finalizado);
        assert_eq!(ws.enrollments[1].nota_final, None);
        assert!(ws.edit_slot().is_none());
    }

    #[test]
    fn failed_commit_keeps_the_attempted_values_in_the_slot() {
        let mut ws = loaded_workspace();
        ws.begin_edit(&EnrollmentId::from("1"));
        ws.draft_mut(&EnrollmentId::from("1"))
            .expect("draft")
            .nota_final = "9.5".to_string();

        let (_, _) = ws.commit_request().expect("valid draft");
        ws.apply_edit_failed("server error 500: boom");

        assert_eq!(ws.enrollments[0].nota_final, None);
        let (_, draft) = ws.edit_slot().expect("slot still open");
        assert_eq!(draft.nota_final, "9.5");
        assert!(ws.banner.is_some());
    }

    #[test]
    fn out_of_range_grade_blocks_the_commit_with_a_banner() {
        let mut ws = loaded_workspace();
        ws.begin_edit(&EnrollmentId::from("1"));
        ws.draft_mut(&EnrollmentId::from("1"))
            .expect("draft")
            .nota_final = "25".to_string();

        assert!(ws.commit_request().is_none());
        assert_eq!(
            ws.banner.as_deref(),
            Some("La nota debe ser un número entre 0 y 20.")
        );

        ws.draft_mut(&EnrollmentId::from("1"))
            .expect("draft")
            .nota_final = "abc".to_string();
        assert!(ws.commit_request().is_none());
    }

    #[test]
    fn empty_grade_commits_as_not_yet_graded() {
        let mut ws = loaded_workspace();
        ws.enrollments[0].nota_final = Some(10.0);
        ws.begin_edit(&EnrollmentId::from("1"));
        ws.draft_mut(&EnrollmentId::from("1"))
            .expect("draft")
            .nota_final = String::new();

        let (id, update) = ws.commit_request().expect("valid draft");
        assert_eq!(update.nota_final, None);
        ws.apply_edit_committed(&id, &update);
        assert_eq!(grade_cell(ws.enrollments[0].nota_final), "—");
    }

    #[test]
    fn cancel_edit_discards_the_draft_without_touching_rows() {
        let mut ws = loaded_workspace();
        ws.begin_edit(&EnrollmentId::from("1"));
        ws.cancel_edit();
        assert!(ws.edit_slot().is_none());
        assert_eq!(ws.enrollments[0].estado, EnrollmentStatus::Inscrito);
    }

    #[test]
    fn delete_needs_explicit_confirmation() {
        let mut ws = loaded_workspace();
        ws.request_delete(EnrollmentId::from("1"));
        // selection alone has not removed anything
        assert_eq!(ws.enrollments.len(), 2);
        assert_eq!(ws.pending_delete(), Some(&EnrollmentId::from("1")));

        let id = ws.confirm_delete().expect("pending id");
        ws.apply_delete_result(&id, Ok(()));
        assert_eq!(ws.enrollments.len(), 1);
        assert!(ws.enrollments.iter().all(|row| row.id != EnrollmentId::from("1")));
        assert!(ws.pending_delete().is_none());
    }

    #[test]
    fn cancelled_delete_leaves_the_collection_alone() {
        let mut ws = loaded_workspace();
        ws.request_delete(EnrollmentId::from("1"));
        ws.cancel_delete();
        assert_eq!(ws.enrollments.len(), 2);
        assert!(ws.pending_delete().is_none());
    }

    #[test]
    fn failed_delete_closes_the_dialog_under_the_default_policy() {
        let mut ws = loaded_workspace();
        ws.request_delete(EnrollmentId::from("1"));
        let id = ws.confirm_delete().expect("pending id");
        ws.apply_delete_result(&id, Err("server error 500: boom".to_string()));

        assert_eq!(ws.enrollments.len(), 2);
        assert!(ws.pending_delete().is_none());
        assert!(ws.banner.is_some());
    }

    #[test]
    fn failed_delete_can_keep_the_dialog_open() {
        let mut ws = loaded_workspace();
        ws.delete_policy = DeleteDialogPolicy::StayOpenOnFailure;
        ws.request_delete(EnrollmentId::from("1"));
        let id = ws.confirm_delete().expect("pending id");
        ws.apply_delete_result(&id, Err("server error 500: boom".to_string()));

        assert_eq!(ws.pending_delete(), Some(&EnrollmentId::from("1")));
    }

    #[test]
    fn delete_failure_after_cancelling_the_dialog_still_resets_the_busy_flag() {
        let mut ws = loaded_workspace();
        ws.request_delete(EnrollmentId::from("1"));
        ws.confirm_delete().expect("pending id");
        // operator closes the dialog while the request is in flight
        ws.cancel_delete();

        ws.apply_delete_failed("server error 500: boom");

        assert!(!ws.deleting);
        assert!(ws.pending_delete().is_none());
        assert_eq!(ws.enrollments.len(), 2);
        assert!(ws.banner.is_some());
    }

    #[test]
    fn create_with_missing_selection_never_builds_a_request() {
        let mut ws = loaded_workspace();
        ws.open_create();
        ws.create_form.programa_id = "3".to_string();

        assert!(ws.create_request().is_none());
        assert!(!ws.creating);
        assert_eq!(
            ws.banner.as_deref(),
            Some("Debe seleccionar un interno y un programa.")
        );
    }

    #[test]
    fn successful_create_joins_the_loaded_collections() {
        let mut ws = loaded_workspace();
        ws.open_create();
        ws.create_form.usuario_id = "10".to_string();
        ws.create_form.programa_id = "3".to_string();

        let request = ws.create_request().expect("valid form");
        ws.apply_created(&request, Some(EnrollmentId::from("99")));

        assert_eq!(ws.enrollments.len(), 3);
        let row = ws.enrollments.last().expect("new row");
        assert_eq!(row.id, EnrollmentId::from("99"));
        assert_eq!(row.nombre_programa, "Carpintería");
        assert_eq!(
            row.usuario.as_ref().map(|u| u.full_name()),
            Some("Luis Paredes".to_string())
        );
        assert_eq!(row.estado, EnrollmentStatus::Inscrito);
        assert_eq!(row.nota_final, None);
        assert!(!ws.create_open);
    }

    #[test]
    fn create_without_a_server_id_uses_a_local_placeholder() {
        let mut ws = loaded_workspace();
        ws.open_create();
        ws.create_form.usuario_id = "11".to_string();
        ws.create_form.programa_id = "no-such-program".to_string();

        let request = ws.create_request().expect("valid form");
        ws.apply_created(&request, None);

        let row = ws.enrollments.last().expect("new row");
        assert!(row.id.0.starts_with("local-"));
        assert_eq!(row.nombre_programa, "Desconocido");
    }

    #[test]
    fn grade_cell_renders_one_fractional_digit() {
        assert_eq!(grade_cell(Some(15.5)), "15.5");
        assert_eq!(grade_cell(Some(12.0)), "12.0");
        assert_eq!(grade_cell(None), "—");
    }
}
